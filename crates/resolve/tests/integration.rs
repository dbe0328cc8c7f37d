use std::path::PathBuf;

use recordmerge_resolve::config::{DedupConfig, SourceConfig, Strategy};
use recordmerge_resolve::engine::{run, run_cross};
use recordmerge_resolve::ingest::load_csv_records;
use recordmerge_resolve::model::{ActionKind, DedupResult, Field, MatchCriterion, Record, RunMode};
use recordmerge_resolve::DedupError;

fn fixtures_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures")
}

fn load_source(source: &SourceConfig) -> Vec<Record> {
    let path = fixtures_dir().join(&source.file);
    let csv_data = std::fs::read_to_string(&path)
        .unwrap_or_else(|e| panic!("cannot read {}: {e}", path.display()));
    load_csv_records(&csv_data, source.tag(), &source.columns).unwrap()
}

fn load_config(file: &str) -> DedupConfig {
    let toml = std::fs::read_to_string(fixtures_dir().join(file)).unwrap();
    DedupConfig::from_toml(&toml).unwrap()
}

fn run_fixture(strategy: Strategy) -> DedupResult {
    let config = load_config("dedup.toml").with_strategy(strategy);
    let records = load_source(config.input.as_ref().unwrap());
    run(&config, &records).unwrap()
}

fn output_indices(result: &DedupResult) -> Vec<usize> {
    result.processed_records.iter().map(|r| r.original_index).collect()
}

fn rec(i: usize) -> Record {
    Record::new("t", i)
}

// -------------------------------------------------------------------------
// Fixture runs
// -------------------------------------------------------------------------

#[test]
fn review_flags_groups_and_keeps_everything() {
    let result = run_fixture(Strategy::Review);

    assert_eq!(result.meta.config_name, "Centros 2024");
    assert_eq!(result.meta.mode, RunMode::SelfCollection);
    assert_eq!(result.summary.input_records, 5);
    assert_eq!(result.summary.output_records, 5);
    assert_eq!(result.summary.groups, 2);
    assert_eq!(result.summary.criterion_counts.get("name_match"), Some(&1));
    assert_eq!(result.summary.criterion_counts.get("email_exact"), Some(&1));

    let flags: Vec<Option<usize>> = result
        .processed_records
        .iter()
        .map(|r| r.review.as_ref().map(|f| f.group_id))
        .collect();
    assert_eq!(flags, vec![Some(1), Some(1), Some(2), Some(2), None]);
    assert!(result.actions.iter().all(|a| a.kind == ActionKind::Mark));
}

#[test]
fn remove_oldest_reads_slash_dates_day_first() {
    // 01/03/2024 is 1 March, newer than 15/01/2024
    let result = run_fixture(Strategy::RemoveOldest);
    assert_eq!(output_indices(&result), vec![0, 3, 4]);
    assert_eq!(result.processed_records[0].date, "01/03/2024");

    assert_eq!(result.actions.len(), 2);
    let first = &result.actions[0];
    assert_eq!(first.kind, ActionKind::Remove);
    assert_eq!(first.affected[0].to_string(), "form#1");
    assert_eq!(first.kept.as_ref().unwrap().to_string(), "form#0");
}

#[test]
fn remove_newest_keeps_oldest() {
    let result = run_fixture(Strategy::RemoveNewest);
    assert_eq!(output_indices(&result), vec![1, 2, 4]);
}

#[test]
fn merge_folds_groups_into_richest_record() {
    let result = run_fixture(Strategy::Merge);
    assert_eq!(output_indices(&result), vec![0, 3, 4]);

    let lope = &result.processed_records[0];
    assert_eq!(lope.center, "IES Lope de Vega");
    assert_eq!(lope.email, "secretaria@lopedevega.es");
    assert_eq!(lope.representative, "Ana Ruiz");
    assert_eq!(lope.commitments, "reciclaje, huerto");
    assert_eq!(lope.additional, "llamar por la tarde");

    // equal completeness: the newer record is the base
    assert_eq!(result.processed_records[1].center, "Academia Politécnica Norte");

    assert_eq!(result.actions.len(), 2);
    assert!(result.actions.iter().all(|a| a.kind == ActionKind::Merge));
    assert_eq!(result.actions[0].result.as_ref(), Some(lope));
}

#[test]
fn cross_mode_keeps_registry_versions() {
    let config = load_config("cross.toml");
    let primary = load_source(config.input.as_ref().unwrap());
    let secondary = load_source(config.against.as_ref().unwrap());
    let result = run_cross(&config, &primary, &secondary).unwrap();

    assert_eq!(result.meta.mode, RunMode::CrossCollection);
    let refs: Vec<String> = result
        .processed_records
        .iter()
        .map(|r| r.reference().to_string())
        .collect();
    // form#0 and form#1 both resemble registry#0
    assert_eq!(
        refs,
        vec!["registry#0", "registry#1", "form#2", "form#3", "form#4"]
    );
    assert_eq!(result.processed_records[0].email, "info@lopedevega.es");
    assert_eq!(result.summary.groups, 1);
    assert_eq!(result.summary.duplicates, 2);
    assert_eq!(result.summary.input_records, 7);
}

#[test]
fn cross_mode_drops_every_copy_of_a_registry_record() {
    let config = load_config("cross.toml");
    let primary = load_source(config.input.as_ref().unwrap());
    let secondary = load_source(config.against.as_ref().unwrap());
    let result = run_cross(&config, &primary, &secondary).unwrap();

    let group = &result.duplicate_groups[0];
    let members: Vec<String> = group.members.iter().map(|m| m.record.to_string()).collect();
    assert_eq!(members, vec!["registry#0", "form#0", "form#1"]);
    assert_eq!(group.survivor.as_ref().map(|r| r.reference().to_string()).as_deref(), Some("registry#0"));

    let removed: Vec<String> = result
        .actions
        .iter()
        .filter(|a| a.kind == ActionKind::Remove)
        .flat_map(|a| a.affected.iter().map(|r| r.to_string()))
        .collect();
    assert_eq!(removed, vec!["form#0", "form#1"]);
    assert!(result
        .processed_records
        .iter()
        .all(|r| r.source == "registry" || r.original_index >= 2));
}

#[test]
fn header_only_csv_is_empty_input() {
    let config = load_config("dedup.toml");
    let columns = &config.input.as_ref().unwrap().columns;
    let records = load_csv_records(
        "Centro,Representante,Correo,Localidad,Provincia,Compromisos,Observaciones,Fecha\n",
        "form",
        columns,
    )
    .unwrap();
    assert!(records.is_empty());
    assert!(matches!(run(&config, &records), Err(DedupError::EmptyInput)));
}

#[test]
fn report_serializes() {
    let json = run_fixture(Strategy::Merge).to_json_pretty().unwrap();
    let value: serde_json::Value = serde_json::from_str(&json).unwrap();
    assert_eq!(value["meta"]["mode"], "self_collection");
    assert_eq!(value["meta"]["strategy"], "merge");
    assert_eq!(value["summary"]["groups"], 2);
    assert_eq!(value["duplicate_groups"][0]["members"][1]["criterion"], "name_match");
}

// -------------------------------------------------------------------------
// Matching scenarios
// -------------------------------------------------------------------------

#[test]
fn boilerplate_prefix_is_a_name_match() {
    let records = vec![
        rec(0).with(Field::Center, "IES Lope de Vega").with(Field::Locality, "Madrid"),
        rec(1).with(Field::Center, "Lope de Vega").with(Field::Locality, "Madrid"),
    ];
    let result = run(&DedupConfig::default(), &records).unwrap();
    assert_eq!(result.duplicate_groups.len(), 1);
    assert_eq!(
        result.duplicate_groups[0].members[1].criterion,
        MatchCriterion::NameMatch
    );
}

#[test]
fn shared_email_matches_regardless_of_name() {
    let records = vec![
        rec(0).with(Field::Center, "Colegio Santa Ana").with(Field::Email, "a@x.com"),
        rec(1).with(Field::Center, "Academia Politécnica Norte").with(Field::Email, "a@x.com"),
    ];
    let result = run(&DedupConfig::default(), &records).unwrap();
    assert_eq!(
        result.duplicate_groups[0].members[1].criterion,
        MatchCriterion::EmailExact
    );
}

#[test]
fn chained_matches_are_not_closed_transitively() {
    // A~B and B~C but not A~C
    let records = vec![
        rec(0).with(Field::Center, "abcdefgh"),
        rec(1).with(Field::Center, "abcdefxh"),
        rec(2).with(Field::Center, "abcdexxh"),
    ];
    let result = run(&DedupConfig::default(), &records).unwrap();
    let groups: Vec<Vec<usize>> = result
        .duplicate_groups
        .iter()
        .map(|g| g.positions().collect())
        .collect();
    assert_eq!(groups, vec![vec![0, 1]]);
    assert_eq!(result.processed_records.len(), 3);
}

// -------------------------------------------------------------------------
// Laws
// -------------------------------------------------------------------------

#[test]
fn output_cardinality_per_policy() {
    for strategy in [
        Strategy::Review,
        Strategy::RemoveOldest,
        Strategy::RemoveNewest,
        Strategy::Merge,
    ] {
        let result = run_fixture(strategy);
        let expected = match strategy {
            Strategy::Review => result.summary.input_records,
            _ => result.summary.input_records - result.summary.duplicates,
        };
        assert_eq!(result.processed_records.len(), expected, "{strategy}");
    }
}

#[test]
fn ungrouped_records_pass_through_unchanged() {
    let config = load_config("dedup.toml");
    let records = load_source(config.input.as_ref().unwrap());
    let result = run(&config.with_strategy(Strategy::Merge), &records).unwrap();
    let quevedo = result.processed_records.last().unwrap();
    assert_eq!(quevedo, &records[4]);
}

#[test]
fn runs_are_deterministic() {
    let a = run_fixture(Strategy::Merge);
    let b = run_fixture(Strategy::Merge);
    assert_eq!(a.processed_records, b.processed_records);
    assert_eq!(a.duplicate_groups, b.duplicate_groups);
    assert_eq!(a.actions, b.actions);
    assert_eq!(a.summary, b.summary);
}
