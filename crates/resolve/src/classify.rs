use crate::config::{Thresholds, NAME_LOCATION_FLOOR, REPRESENTATIVE_LOCATION_FLOOR};
use crate::model::{MatchCriterion, MatchOutcome, Record};
use crate::normalize::{clean, location_key, normalize_email, normalize_org_name};
use crate::similarity::similarity;

/// Comparison keys of one record, computed once per run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreparedRecord {
    pub name: String,
    pub email: String,
    pub representative: String,
    pub location: String,
}

impl PreparedRecord {
    pub fn new(record: &Record) -> Self {
        Self {
            name: normalize_org_name(&record.center),
            email: normalize_email(&record.email),
            representative: clean(&record.representative).to_lowercase(),
            location: location_key(record),
        }
    }
}

/// Classify a pair of records. Rules are tried in priority order and the
/// first satisfied one wins:
///
/// 1. `email_exact`: both emails present and similar enough.
/// 2. `name_match`: normalized names at or above the name threshold.
/// 3. `name_location_match`: names in the moderate band, corroborated by location.
/// 4. `representative_location_match`: same representative at a similar location.
pub fn classify_pair(a: &Record, b: &Record, thresholds: &Thresholds) -> MatchOutcome {
    classify_prepared(&PreparedRecord::new(a), &PreparedRecord::new(b), thresholds)
}

pub fn classify_prepared(
    a: &PreparedRecord,
    b: &PreparedRecord,
    thresholds: &Thresholds,
) -> MatchOutcome {
    if !a.email.is_empty() && !b.email.is_empty() {
        let score = similarity(&a.email, &b.email);
        if score >= thresholds.email {
            return MatchOutcome {
                criterion: MatchCriterion::EmailExact,
                score,
            };
        }
    }

    // Empty location keys never count as agreement.
    let location_score = if a.location.is_empty() || b.location.is_empty() {
        None
    } else {
        Some(similarity(&a.location, &b.location))
    };

    if !a.name.is_empty() && !b.name.is_empty() {
        let name_score = similarity(&a.name, &b.name);
        if name_score >= thresholds.center_name {
            return MatchOutcome {
                criterion: MatchCriterion::NameMatch,
                score: name_score,
            };
        }
        if name_score >= NAME_LOCATION_FLOOR
            && location_score.is_some_and(|s| s >= thresholds.location)
        {
            return MatchOutcome {
                criterion: MatchCriterion::NameLocationMatch,
                score: name_score,
            };
        }
    }

    if !a.representative.is_empty() && !b.representative.is_empty() {
        let rep_score = similarity(&a.representative, &b.representative);
        if rep_score >= thresholds.representative
            && location_score.is_some_and(|s| s >= REPRESENTATIVE_LOCATION_FLOOR)
        {
            return MatchOutcome {
                criterion: MatchCriterion::RepresentativeLocationMatch,
                score: rep_score,
            };
        }
    }

    MatchOutcome::no_match()
}
