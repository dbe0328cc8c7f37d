use std::collections::BTreeMap;

use crate::classify::PreparedRecord;
use crate::cluster::{cluster_cross, cluster_self, prepare_all, AllPairs, CandidateGenerator};
use crate::config::{CompletenessWeights, DedupConfig};
use crate::error::DedupError;
use crate::model::{
    ActionKind, DedupMeta, DedupResult, DedupSummary, DuplicateGroup, GroupMember,
    MatchCriterion, MergeAction, Record, RunMode,
};
use crate::policy::{flag_for_review, resolver_for, KeepAnchor, Resolver};

/// Deduplicate one collection against itself, comparing every pair.
pub fn run(config: &DedupConfig, records: &[Record]) -> Result<DedupResult, DedupError> {
    run_with(config, records, &AllPairs)
}

/// Deduplicate one collection against itself with an explicit candidate
/// generator.
pub fn run_with(
    config: &DedupConfig,
    records: &[Record],
    generator: &dyn CandidateGenerator,
) -> Result<DedupResult, DedupError> {
    config.validate()?;
    if records.is_empty() {
        return Err(DedupError::EmptyInput);
    }

    let prepared = prepare_all(records);
    let groups = cluster_self(records, &prepared, &config.thresholds, generator);
    let resolver = resolver_for(config.strategy, config.completeness);
    let applied = apply_resolver(records, groups, resolver.as_ref(), &config.completeness);

    Ok(finish(config, RunMode::SelfCollection, records.len(), applied))
}

/// Check `primary` against an existing `secondary` collection, comparing
/// every pair. Matching primary records are dropped in favour of the
/// secondary version; the output is the secondary collection followed by the
/// unmatched primary records, both in input order.
pub fn run_cross(
    config: &DedupConfig,
    primary: &[Record],
    secondary: &[Record],
) -> Result<DedupResult, DedupError> {
    run_cross_with(config, primary, secondary, &AllPairs)
}

/// [`run_cross`] with an explicit candidate generator.
pub fn run_cross_with(
    config: &DedupConfig,
    primary: &[Record],
    secondary: &[Record],
    generator: &dyn CandidateGenerator,
) -> Result<DedupResult, DedupError> {
    config.validate()?;
    if primary.is_empty() && secondary.is_empty() {
        return Err(DedupError::EmptyInput);
    }

    let primary_keys: Vec<PreparedRecord> = prepare_all(primary);
    let secondary_keys: Vec<PreparedRecord> = prepare_all(secondary);
    let matches = cluster_cross(&primary_keys, &secondary_keys, &config.thresholds, generator);

    // Working collection: secondary records first, then primary records.
    let offset = secondary.len();
    let working: Vec<Record> = secondary.iter().chain(primary).cloned().collect();

    // One group per matched secondary record, numbered in order of first match.
    let mut groups: Vec<DuplicateGroup> = Vec::new();
    let mut group_of: BTreeMap<usize, usize> = BTreeMap::new();
    for m in &matches {
        log::debug!(
            "{} ~ {}: {} ({:.3})",
            primary[m.primary].reference(),
            secondary[m.secondary].reference(),
            m.outcome.criterion,
            m.outcome.score
        );
        let k = *group_of.entry(m.secondary).or_insert_with(|| {
            groups.push(DuplicateGroup {
                id: groups.len() + 1,
                members: vec![GroupMember {
                    position: m.secondary,
                    record: secondary[m.secondary].reference(),
                    criterion: MatchCriterion::None,
                    score: 1.0,
                }],
                survivor: None,
                failure: None,
            });
            groups.len() - 1
        });
        groups[k].members.push(GroupMember {
            position: offset + m.primary,
            record: primary[m.primary].reference(),
            criterion: m.outcome.criterion,
            score: m.outcome.score,
        });
    }

    let applied = apply_resolver(&working, groups, &KeepAnchor, &config.completeness);
    Ok(finish(config, RunMode::CrossCollection, working.len(), applied))
}

/// Output of applying a resolver to every group of a collection.
#[derive(Debug, Clone, Default)]
pub struct Applied {
    pub processed: Vec<Record>,
    pub groups: Vec<DuplicateGroup>,
    pub actions: Vec<MergeAction>,
    pub degraded: usize,
}

/// Resolve each group and assemble the output collection. Survivors take
/// the position of the record they were kept or merged into; ungrouped
/// records pass through untouched. A group whose resolution fails keeps
/// all its records, flagged for review with the failure as note.
pub fn apply_resolver(
    records: &[Record],
    mut groups: Vec<DuplicateGroup>,
    resolver: &dyn Resolver,
    weights: &CompletenessWeights,
) -> Applied {
    let mut slots: Vec<Option<Record>> = records.iter().cloned().map(Some).collect();
    let mut actions = Vec::new();
    let mut degraded = 0;

    for group in &mut groups {
        match resolver.resolve(group, records) {
            Ok(resolution) => {
                for position in group.positions() {
                    if let Some(slot) = slots.get_mut(position) {
                        *slot = None;
                    }
                }
                if let [(_, survivor)] = resolution.survivors.as_slice() {
                    group.survivor = Some(survivor.clone());
                }
                for (position, record) in resolution.survivors {
                    if let Some(slot) = slots.get_mut(position) {
                        *slot = Some(record);
                    }
                }
                actions.extend(resolution.actions);
            }
            Err(e) => {
                log::warn!("{e}; keeping its records for manual review");
                degraded += 1;
                let note = e.to_string();
                for (position, flagged) in flag_for_review(group, records, weights, Some(note.clone())) {
                    slots[position] = Some(flagged);
                }
                actions.push(MergeAction {
                    group_id: group.id,
                    kind: ActionKind::Mark,
                    reason: format!("resolution failed: {note}"),
                    affected: group.members.iter().map(|m| m.record.clone()).collect(),
                    kept: None,
                    result: None,
                });
                group.failure = Some(note);
            }
        }
    }

    Applied {
        processed: slots.into_iter().flatten().collect(),
        groups,
        actions,
        degraded,
    }
}

pub fn compute_summary(input_records: usize, applied: &Applied) -> DedupSummary {
    let mut criterion_counts: BTreeMap<String, usize> = BTreeMap::new();
    for member in applied.groups.iter().flat_map(|g| g.members.iter().skip(1)) {
        *criterion_counts.entry(member.criterion.to_string()).or_default() += 1;
    }

    DedupSummary {
        input_records,
        output_records: applied.processed.len(),
        groups: applied.groups.len(),
        duplicates: applied.groups.iter().map(|g| g.len().saturating_sub(1)).sum(),
        degraded_groups: applied.degraded,
        criterion_counts,
    }
}

fn finish(config: &DedupConfig, mode: RunMode, input_records: usize, applied: Applied) -> DedupResult {
    let summary = compute_summary(input_records, &applied);
    log::info!(
        "{} ({}, {}): {} -> {} records, {} group(s), {} degraded",
        if config.name.is_empty() { "dedup" } else { config.name.as_str() },
        config.strategy,
        match mode {
            RunMode::SelfCollection => "self",
            RunMode::CrossCollection => "cross",
        },
        summary.input_records,
        summary.output_records,
        summary.groups,
        summary.degraded_groups
    );

    DedupResult {
        meta: DedupMeta {
            config_name: config.name.clone(),
            strategy: config.strategy,
            mode,
            engine_version: env!("CARGO_PKG_VERSION").to_string(),
            run_at: chrono::Utc::now().to_rfc3339(),
        },
        summary,
        processed_records: applied.processed,
        duplicate_groups: applied.groups,
        actions: applied.actions,
    }
}
