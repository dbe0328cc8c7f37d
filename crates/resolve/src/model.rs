use serde::{Deserialize, Serialize};

use crate::config::Strategy;

// ---------------------------------------------------------------------------
// Input
// ---------------------------------------------------------------------------

/// Content fields of a [`Record`], in canonical column order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Field {
    Representative,
    Center,
    Email,
    Department,
    Locality,
    Province,
    Region,
    Commitments,
    Additional,
    Date,
}

impl Field {
    pub const ALL: [Field; 10] = [
        Field::Representative,
        Field::Center,
        Field::Email,
        Field::Department,
        Field::Locality,
        Field::Province,
        Field::Region,
        Field::Commitments,
        Field::Additional,
        Field::Date,
    ];

    /// Canonical column header.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Representative => "representative",
            Self::Center => "center",
            Self::Email => "email",
            Self::Department => "department",
            Self::Locality => "locality",
            Self::Province => "province",
            Self::Region => "region",
            Self::Commitments => "commitments",
            Self::Additional => "additional",
            Self::Date => "date",
        }
    }
}

impl std::fmt::Display for Field {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// One organization/contact row. Empty string means absent.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Record {
    pub representative: String,
    pub center: String,
    pub email: String,
    pub department: String,
    pub locality: String,
    pub province: String,
    pub region: String,
    pub commitments: String,
    pub additional: String,
    pub date: String,
    /// Tag of the collection this record was read from.
    pub source: String,
    /// Row position in the source collection. Never rewritten.
    pub original_index: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub review: Option<ReviewFlag>,
}

impl Record {
    pub fn new(source: impl Into<String>, original_index: usize) -> Self {
        Self {
            source: source.into(),
            original_index,
            ..Self::default()
        }
    }

    /// Builder-style setter, mostly for ingest and tests.
    pub fn with(mut self, field: Field, value: impl Into<String>) -> Self {
        *self.field_mut(field) = value.into();
        self
    }

    pub fn get(&self, field: Field) -> &str {
        match field {
            Field::Representative => &self.representative,
            Field::Center => &self.center,
            Field::Email => &self.email,
            Field::Department => &self.department,
            Field::Locality => &self.locality,
            Field::Province => &self.province,
            Field::Region => &self.region,
            Field::Commitments => &self.commitments,
            Field::Additional => &self.additional,
            Field::Date => &self.date,
        }
    }

    pub(crate) fn field_mut(&mut self, field: Field) -> &mut String {
        match field {
            Field::Representative => &mut self.representative,
            Field::Center => &mut self.center,
            Field::Email => &mut self.email,
            Field::Department => &mut self.department,
            Field::Locality => &mut self.locality,
            Field::Province => &mut self.province,
            Field::Region => &mut self.region,
            Field::Commitments => &mut self.commitments,
            Field::Additional => &mut self.additional,
            Field::Date => &mut self.date,
        }
    }

    pub fn has(&self, field: Field) -> bool {
        !self.get(field).trim().is_empty()
    }

    /// Number of content fields that are non-empty after trimming.
    pub fn filled_fields(&self) -> usize {
        Field::ALL.iter().filter(|f| self.has(**f)).count()
    }

    pub fn reference(&self) -> RecordRef {
        RecordRef {
            source: self.source.clone(),
            index: self.original_index,
        }
    }
}

/// Traceable pointer back to a row of a source collection.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RecordRef {
    pub source: String,
    pub index: usize,
}

impl std::fmt::Display for RecordRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.source.is_empty() {
            write!(f, "#{}", self.index)
        } else {
            write!(f, "{}#{}", self.source, self.index)
        }
    }
}

/// Annotations attached to a record left in place for manual review.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReviewFlag {
    pub group_id: usize,
    pub duplicate_count: usize,
    pub completeness_score: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

// ---------------------------------------------------------------------------
// Classification
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchCriterion {
    EmailExact,
    NameMatch,
    NameLocationMatch,
    RepresentativeLocationMatch,
    None,
}

impl std::fmt::Display for MatchCriterion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmailExact => write!(f, "email_exact"),
            Self::NameMatch => write!(f, "name_match"),
            Self::NameLocationMatch => write!(f, "name_location_match"),
            Self::RepresentativeLocationMatch => write!(f, "representative_location_match"),
            Self::None => write!(f, "none"),
        }
    }
}

/// Outcome of classifying one record pair.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MatchOutcome {
    pub criterion: MatchCriterion,
    /// Similarity of the signal that decided the pair.
    pub score: f64,
}

impl MatchOutcome {
    pub fn no_match() -> Self {
        Self {
            criterion: MatchCriterion::None,
            score: 0.0,
        }
    }

    pub fn is_duplicate(&self) -> bool {
        self.criterion != MatchCriterion::None
    }
}

// ---------------------------------------------------------------------------
// Groups + actions
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GroupMember {
    /// Position in the working collection of the run.
    pub position: usize,
    pub record: RecordRef,
    /// Criterion linking this member to the group anchor; `none` for the anchor.
    pub criterion: MatchCriterion,
    pub score: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DuplicateGroup {
    /// 1-based, in discovery order.
    pub id: usize,
    pub members: Vec<GroupMember>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub survivor: Option<Record>,
    /// Set when resolution failed and the group was left flagged.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failure: Option<String>,
}

impl DuplicateGroup {
    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    pub fn positions(&self) -> impl Iterator<Item = usize> + '_ {
        self.members.iter().map(|m| m.position)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionKind {
    Mark,
    Remove,
    Merge,
}

impl std::fmt::Display for ActionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Mark => write!(f, "mark"),
            Self::Remove => write!(f, "remove"),
            Self::Merge => write!(f, "merge"),
        }
    }
}

/// Audit entry describing what a policy did to a group.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MergeAction {
    pub group_id: usize,
    pub kind: ActionKind,
    pub reason: String,
    pub affected: Vec<RecordRef>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kept: Option<RecordRef>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<Record>,
}

// ---------------------------------------------------------------------------
// Summary + Output
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RunMode {
    SelfCollection,
    CrossCollection,
}

#[derive(Debug, Clone, Serialize)]
pub struct DedupMeta {
    pub config_name: String,
    pub strategy: Strategy,
    pub mode: RunMode,
    pub engine_version: String,
    pub run_at: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DedupSummary {
    pub input_records: usize,
    pub output_records: usize,
    pub groups: usize,
    pub duplicates: usize,
    pub degraded_groups: usize,
    pub criterion_counts: std::collections::BTreeMap<String, usize>,
}

#[derive(Debug, Clone, Serialize)]
pub struct DedupResult {
    pub meta: DedupMeta,
    pub summary: DedupSummary,
    pub processed_records: Vec<Record>,
    pub duplicate_groups: Vec<DuplicateGroup>,
    pub actions: Vec<MergeAction>,
}

impl DedupResult {
    pub fn to_json_pretty(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}
