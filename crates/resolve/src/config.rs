use std::collections::BTreeMap;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::DedupError;
use crate::model::Field;

/// Lower bound of the name-similarity band that needs location evidence.
pub const NAME_LOCATION_FLOOR: f64 = 0.70;

/// Location similarity required to corroborate a representative match.
pub const REPRESENTATIVE_LOCATION_FLOOR: f64 = 0.60;

// ---------------------------------------------------------------------------
// Top-level config
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, Deserialize)]
pub struct DedupConfig {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub strategy: Strategy,
    #[serde(default)]
    pub thresholds: Thresholds,
    #[serde(default)]
    pub completeness: CompletenessWeights,
    /// Collection to deduplicate (CLI only).
    #[serde(default)]
    pub input: Option<SourceConfig>,
    /// Reference collection; its presence selects cross-collection mode (CLI only).
    #[serde(default)]
    pub against: Option<SourceConfig>,
}

// ---------------------------------------------------------------------------
// Strategy
// ---------------------------------------------------------------------------

/// Merge policy applied to every duplicate group of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Strategy {
    #[default]
    Review,
    RemoveOldest,
    RemoveNewest,
    Merge,
}

impl Strategy {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Review => "review",
            Self::RemoveOldest => "remove_oldest",
            Self::RemoveNewest => "remove_newest",
            Self::Merge => "merge",
        }
    }
}

impl std::fmt::Display for Strategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Strategy {
    type Err = DedupError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "review" => Ok(Self::Review),
            "remove_oldest" => Ok(Self::RemoveOldest),
            "remove_newest" => Ok(Self::RemoveNewest),
            "merge" => Ok(Self::Merge),
            other => Err(DedupError::UnknownStrategy(other.to_string())),
        }
    }
}

// ---------------------------------------------------------------------------
// Thresholds
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Thresholds {
    pub center_name: f64,
    pub location: f64,
    pub email: f64,
    pub representative: f64,
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            center_name: 0.85,
            location: 0.80,
            email: 0.95,
            representative: 0.85,
        }
    }
}

impl Thresholds {
    fn entries(&self) -> [(&'static str, f64); 4] {
        [
            ("center_name", self.center_name),
            ("location", self.location),
            ("email", self.email),
            ("representative", self.representative),
        ]
    }
}

// ---------------------------------------------------------------------------
// Completeness weights
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CompletenessWeights {
    pub email: u32,
    pub commitments: u32,
    /// Weight of every other content field.
    pub other: u32,
}

impl Default for CompletenessWeights {
    fn default() -> Self {
        Self {
            email: 3,
            commitments: 3,
            other: 1,
        }
    }
}

impl CompletenessWeights {
    pub fn weight(&self, field: Field) -> u32 {
        match field {
            Field::Email => self.email,
            Field::Commitments => self.commitments,
            _ => self.other,
        }
    }
}

// ---------------------------------------------------------------------------
// Sources (ingest boundary)
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
pub struct SourceConfig {
    pub file: String,
    /// Tag stamped on every record; defaults to the file name.
    #[serde(default)]
    pub source: Option<String>,
    #[serde(default)]
    pub columns: ColumnMapping,
}

impl SourceConfig {
    pub fn tag(&self) -> &str {
        self.source.as_deref().unwrap_or(&self.file)
    }
}

/// Header overrides, field -> CSV header. Unmapped fields use [`Field::name`].
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(transparent)]
pub struct ColumnMapping(pub BTreeMap<Field, String>);

impl ColumnMapping {
    pub fn header(&self, field: Field) -> &str {
        self.0.get(&field).map(String::as_str).unwrap_or(field.name())
    }
}

// ---------------------------------------------------------------------------
// Parse + Validate
// ---------------------------------------------------------------------------

impl DedupConfig {
    pub fn from_toml(input: &str) -> Result<Self, DedupError> {
        let config: DedupConfig =
            toml::from_str(input).map_err(|e| DedupError::ConfigParse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn with_strategy(mut self, strategy: Strategy) -> Self {
        self.strategy = strategy;
        self
    }

    pub fn validate(&self) -> Result<(), DedupError> {
        for (name, value) in self.thresholds.entries() {
            if !value.is_finite() || !(0.0..=1.0).contains(&value) {
                return Err(DedupError::ThresholdOutOfRange {
                    name: name.to_string(),
                    value,
                });
            }
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
