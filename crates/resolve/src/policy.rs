//! Merge policies: how a duplicate group collapses into output records.
//!
//! Each policy is a [`Resolver`]. Resolvers never touch records outside the
//! group they are given and never mutate their input; survivors are new
//! records.

use std::cmp::Reverse;
use std::collections::BTreeSet;

use crate::completeness::{completeness, parse_date};
use crate::config::{CompletenessWeights, Strategy};
use crate::error::GroupError;
use crate::model::{
    ActionKind, DuplicateGroup, Field, MatchCriterion, MergeAction, Record, ReviewFlag,
};
use crate::normalize::JOIN_SEPARATOR;

/// Records that stay in the output, keyed by their position in the working
/// collection, plus the audit trail. Group positions without a survivor
/// are dropped.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Resolution {
    pub survivors: Vec<(usize, Record)>,
    pub actions: Vec<MergeAction>,
}

pub trait Resolver {
    fn resolve(&self, group: &DuplicateGroup, records: &[Record]) -> Result<Resolution, GroupError>;
}

/// Resolver for a configured strategy.
pub fn resolver_for(strategy: Strategy, weights: CompletenessWeights) -> Box<dyn Resolver> {
    match strategy {
        Strategy::Review => Box::new(Review { weights }),
        Strategy::RemoveOldest => Box::new(KeepByDate { keep: DateEnd::Newest }),
        Strategy::RemoveNewest => Box::new(KeepByDate { keep: DateEnd::Oldest }),
        Strategy::Merge => Box::new(Merge { weights }),
    }
}

/// Group members as `(position, record)`, in group order.
fn members<'a>(
    group: &DuplicateGroup,
    records: &'a [Record],
) -> Result<Vec<(usize, &'a Record)>, GroupError> {
    if group.len() < 2 {
        return Err(GroupError::TooSmall { group_id: group.id });
    }
    group
        .positions()
        .map(|position| {
            records
                .get(position)
                .map(|r| (position, r))
                .ok_or(GroupError::MemberOutOfRange {
                    group_id: group.id,
                    position,
                })
        })
        .collect()
}

/// Distinct criteria of the non-anchor members, in rule priority order.
fn criteria_label(group: &DuplicateGroup) -> String {
    let criteria: BTreeSet<MatchCriterion> = group.members.iter().skip(1).map(|m| m.criterion).collect();
    criteria
        .iter()
        .map(|c| c.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

/// Flag every member of a group for manual review.
pub fn flag_for_review(
    group: &DuplicateGroup,
    records: &[Record],
    weights: &CompletenessWeights,
    note: Option<String>,
) -> Vec<(usize, Record)> {
    group
        .positions()
        .filter_map(|position| records.get(position).map(|r| (position, r)))
        .map(|(position, record)| {
            let mut flagged = record.clone();
            flagged.review = Some(ReviewFlag {
                group_id: group.id,
                duplicate_count: group.len(),
                completeness_score: completeness(record, weights),
                note: note.clone(),
            });
            (position, flagged)
        })
        .collect()
}

// ---------------------------------------------------------------------------
// review
// ---------------------------------------------------------------------------

/// Keep everything, annotate every member.
#[derive(Debug, Clone, Copy)]
pub struct Review {
    pub weights: CompletenessWeights,
}

impl Resolver for Review {
    fn resolve(&self, group: &DuplicateGroup, records: &[Record]) -> Result<Resolution, GroupError> {
        let members = members(group, records)?;
        Ok(Resolution {
            survivors: flag_for_review(group, records, &self.weights, None),
            actions: vec![MergeAction {
                group_id: group.id,
                kind: ActionKind::Mark,
                reason: format!(
                    "{} records flagged for review ({})",
                    members.len(),
                    criteria_label(group)
                ),
                affected: members.iter().map(|(_, r)| r.reference()).collect(),
                kept: None,
                result: None,
            }],
        })
    }
}

// ---------------------------------------------------------------------------
// remove_oldest / remove_newest
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DateEnd {
    Newest,
    Oldest,
}

/// Keep the single newest (or oldest) member by parsed date, drop the rest.
/// Ties keep group order.
#[derive(Debug, Clone, Copy)]
pub struct KeepByDate {
    pub keep: DateEnd,
}

impl Resolver for KeepByDate {
    fn resolve(&self, group: &DuplicateGroup, records: &[Record]) -> Result<Resolution, GroupError> {
        let mut ranked = members(group, records)?;
        match self.keep {
            DateEnd::Newest => ranked.sort_by_key(|(_, r)| Reverse(parse_date(&r.date))),
            DateEnd::Oldest => ranked.sort_by_key(|(_, r)| parse_date(&r.date)),
        }

        let (kept_position, kept) = ranked[0];
        let label = match self.keep {
            DateEnd::Newest => "older",
            DateEnd::Oldest => "newer",
        };

        let actions = ranked[1..]
            .iter()
            .map(|(_, dropped)| MergeAction {
                group_id: group.id,
                kind: ActionKind::Remove,
                reason: format!(
                    "{label} duplicate of {} (dated '{}' vs '{}')",
                    kept.reference(),
                    dropped.date,
                    kept.date
                ),
                affected: vec![dropped.reference()],
                kept: Some(kept.reference()),
                result: Some(kept.clone()),
            })
            .collect();

        Ok(Resolution {
            survivors: vec![(kept_position, kept.clone())],
            actions,
        })
    }
}

// ---------------------------------------------------------------------------
// merge
// ---------------------------------------------------------------------------

/// Fold the whole group into its most complete, most recent member.
#[derive(Debug, Clone, Copy)]
pub struct Merge {
    pub weights: CompletenessWeights,
}

impl Resolver for Merge {
    fn resolve(&self, group: &DuplicateGroup, records: &[Record]) -> Result<Resolution, GroupError> {
        let mut ranked = members(group, records)?;
        ranked.sort_by_key(|(_, r)| {
            (
                Reverse(completeness(r, &self.weights)),
                Reverse(parse_date(&r.date)),
            )
        });

        let (base_position, base) = ranked[0];
        let absorbed: Vec<&Record> = ranked[1..].iter().map(|(_, r)| *r).collect();
        let merged = merge_records(base, &absorbed);

        Ok(Resolution {
            survivors: vec![(base_position, merged.clone())],
            actions: vec![MergeAction {
                group_id: group.id,
                kind: ActionKind::Merge,
                reason: format!(
                    "merged {} duplicate(s) into {} ({})",
                    absorbed.len(),
                    base.reference(),
                    criteria_label(group)
                ),
                affected: absorbed.iter().map(|r| r.reference()).collect(),
                kept: Some(base.reference()),
                result: Some(merged),
            }],
        })
    }
}

/// Fill the base's empty fields from the other records (first writer wins,
/// in the given order), union `commitments` tokens and concatenate distinct
/// `additional` notes. Never replaces a non-empty value with an empty one.
pub fn merge_records(base: &Record, others: &[&Record]) -> Record {
    let mut merged = base.clone();
    merged.review = None;

    for other in others {
        for field in Field::ALL {
            if matches!(field, Field::Commitments | Field::Additional) {
                continue;
            }
            if !merged.has(field) && other.has(field) {
                *merged.field_mut(field) = other.get(field).to_string();
            }
        }
    }

    let commitments = std::iter::once(base)
        .chain(others.iter().copied())
        .map(|r| r.commitments.as_str());
    merged.commitments = union_tokens(commitments);

    let notes = std::iter::once(base)
        .chain(others.iter().copied())
        .map(|r| r.additional.as_str());
    merged.additional = join_distinct(notes);

    merged
}

/// Union of comma-separated tokens, case-insensitive, first spelling kept.
fn union_tokens<'a>(values: impl Iterator<Item = &'a str>) -> String {
    let mut seen: Vec<String> = Vec::new();
    let mut tokens: Vec<&str> = Vec::new();
    for token in values.flat_map(|v| v.split(',')).map(str::trim) {
        if token.is_empty() {
            continue;
        }
        let key = token.to_lowercase();
        if !seen.contains(&key) {
            seen.push(key);
            tokens.push(token);
        }
    }
    tokens.join(", ")
}

fn join_distinct<'a>(values: impl Iterator<Item = &'a str>) -> String {
    let mut parts: Vec<&str> = Vec::new();
    for value in values.map(str::trim) {
        if !value.is_empty() && !parts.contains(&value) {
            parts.push(value);
        }
    }
    parts.join(JOIN_SEPARATOR)
}

// ---------------------------------------------------------------------------
// cross-collection
// ---------------------------------------------------------------------------

/// Keep the group anchor and drop every other member. Used in
/// cross-collection mode, where the anchor is the reference collection's
/// record.
#[derive(Debug, Clone, Copy, Default)]
pub struct KeepAnchor;

impl Resolver for KeepAnchor {
    fn resolve(&self, group: &DuplicateGroup, records: &[Record]) -> Result<Resolution, GroupError> {
        let members = members(group, records)?;
        let (anchor_position, anchor) = members[0];

        let actions = group
            .members
            .iter()
            .zip(&members)
            .skip(1)
            .map(|(member, (_, dropped))| MergeAction {
                group_id: group.id,
                kind: ActionKind::Remove,
                reason: format!(
                    "already present as {} ({})",
                    anchor.reference(),
                    member.criterion
                ),
                affected: vec![dropped.reference()],
                kept: Some(anchor.reference()),
                result: Some(anchor.clone()),
            })
            .collect();

        Ok(Resolution {
            survivors: vec![(anchor_position, anchor.clone())],
            actions,
        })
    }
}
