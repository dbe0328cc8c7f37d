//! Partitioning of record collections into duplicate groups.
//!
//! Both modes are greedy and first-match: a record joins the group of the
//! first anchor that classifies it as a duplicate and is never reconsidered.
//! Grouping is not transitive. With A~B, B~C and A!~C, scanning
//! in order A, B, C yields the group {A, B} and leaves C alone, because C is
//! only ever compared against unclaimed anchors. Changing this would change
//! output cardinality relative to earlier exports.

use crate::classify::{classify_prepared, PreparedRecord};
use crate::config::Thresholds;
use crate::model::{DuplicateGroup, GroupMember, MatchCriterion, MatchOutcome, Record};

/// Chooses which pool entries are worth classifying against a probe.
///
/// Returned indices must be ascending; the engine relies on scan order for
/// its first-match semantics.
pub trait CandidateGenerator {
    fn candidates(&self, probe: &PreparedRecord, pool: &[PreparedRecord]) -> Vec<usize>;
}

/// Full cross product. Exact, O(n²) classifications.
#[derive(Debug, Clone, Copy, Default)]
pub struct AllPairs;

impl CandidateGenerator for AllPairs {
    fn candidates(&self, _probe: &PreparedRecord, pool: &[PreparedRecord]) -> Vec<usize> {
        (0..pool.len()).collect()
    }
}

/// Only compares records whose normalized names share a prefix, or whose
/// emails are identical. Misses matches that rely on representative or
/// moderate-name evidence across blocks.
#[derive(Debug, Clone, Copy)]
pub struct NamePrefixBlocking {
    pub prefix_len: usize,
}

impl Default for NamePrefixBlocking {
    fn default() -> Self {
        Self { prefix_len: 3 }
    }
}

impl NamePrefixBlocking {
    fn block<'a>(&self, name: &'a str) -> &'a str {
        match name.char_indices().nth(self.prefix_len) {
            Some((end, _)) => &name[..end],
            None => name,
        }
    }
}

impl CandidateGenerator for NamePrefixBlocking {
    fn candidates(&self, probe: &PreparedRecord, pool: &[PreparedRecord]) -> Vec<usize> {
        let probe_block = self.block(&probe.name);
        pool.iter()
            .enumerate()
            .filter(|(_, other)| {
                (!probe_block.is_empty() && self.block(&other.name) == probe_block)
                    || (!probe.email.is_empty() && other.email == probe.email)
            })
            .map(|(j, _)| j)
            .collect()
    }
}

pub fn prepare_all(records: &[Record]) -> Vec<PreparedRecord> {
    records.iter().map(PreparedRecord::new).collect()
}

/// Self-collection mode. Single pass over `records`; each unclaimed record
/// becomes an anchor and absorbs every later unclaimed record it matches.
/// Singleton groups are never materialized.
pub fn cluster_self(
    records: &[Record],
    prepared: &[PreparedRecord],
    thresholds: &Thresholds,
    generator: &dyn CandidateGenerator,
) -> Vec<DuplicateGroup> {
    let n = records.len().min(prepared.len());
    let mut claimed = vec![false; n];
    let mut groups = Vec::new();

    for i in 0..n {
        if claimed[i] {
            continue;
        }

        let mut members = vec![anchor_member(records, i)];

        for j in generator.candidates(&prepared[i], &prepared[..n]) {
            if j <= i || j >= n || claimed[j] {
                continue;
            }
            let outcome = classify_prepared(&prepared[i], &prepared[j], thresholds);
            if outcome.is_duplicate() {
                log::debug!(
                    "{} ~ {}: {} ({:.3})",
                    records[i].reference(),
                    records[j].reference(),
                    outcome.criterion,
                    outcome.score
                );
                claimed[j] = true;
                members.push(matched_member(records, j, outcome));
            }
        }

        if members.len() > 1 {
            claimed[i] = true;
            groups.push(DuplicateGroup {
                id: groups.len() + 1,
                members,
                survivor: None,
                failure: None,
            });
        }
    }

    groups
}

/// A primary record paired with the secondary record it duplicates.
#[derive(Debug, Clone, PartialEq)]
pub struct CrossMatch {
    pub primary: usize,
    pub secondary: usize,
    pub outcome: MatchOutcome,
}

/// Cross-collection mode. Each primary record is paired with the first
/// secondary record that matches it (first match, not best match).
/// Secondary records stay available after a match, so several primary
/// records can pair with the same secondary record. Unmatched primary
/// records produce no entry.
pub fn cluster_cross(
    primary: &[PreparedRecord],
    secondary: &[PreparedRecord],
    thresholds: &Thresholds,
    generator: &dyn CandidateGenerator,
) -> Vec<CrossMatch> {
    let mut matches = Vec::new();

    for (i, probe) in primary.iter().enumerate() {
        for j in generator.candidates(probe, secondary) {
            if j >= secondary.len() {
                continue;
            }
            let outcome = classify_prepared(probe, &secondary[j], thresholds);
            if outcome.is_duplicate() {
                matches.push(CrossMatch {
                    primary: i,
                    secondary: j,
                    outcome,
                });
                break;
            }
        }
    }

    matches
}

fn anchor_member(records: &[Record], position: usize) -> GroupMember {
    GroupMember {
        position,
        record: records[position].reference(),
        criterion: MatchCriterion::None,
        score: 1.0,
    }
}

fn matched_member(records: &[Record], position: usize, outcome: MatchOutcome) -> GroupMember {
    GroupMember {
        position,
        record: records[position].reference(),
        criterion: outcome.criterion,
        score: outcome.score,
    }
}
