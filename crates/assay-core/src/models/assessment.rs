use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// An assessment instrument: a titled set of question fields, optionally
/// grouped into dimensions, with per-user subsetting rules.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Assessment {
    pub id: String,
    pub title: String,
    /// 360 assessments show every question to every respondent.
    pub is_360: bool,
    /// Flat per-user question count, used when no per-dimension counts exist.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub number_of_questions: Option<i64>,
    /// Per-dimension question counts keyed by dimension id. The empty string
    /// or `"null"` key addresses fields with no dimension.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dimension_question_counts: Option<BTreeMap<String, i64>>,
    pub created_at: DateTime<Utc>,
}

/// A named sub-category of questions within an assessment.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Dimension {
    pub id: String,
    pub assessment_id: String,
    pub name: String,
}

/// Field types. Only questions participate in per-user sampling.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum FieldKind {
    Question,
    Instructions,
    PageBreak,
}

/// A single field of an assessment, in authored display order.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Field {
    pub id: String,
    pub assessment_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dimension_id: Option<String>,
    pub kind: FieldKind,
    pub prompt: String,
    pub display_order: i64,
}

/// How many question fields each user sees, resolved once from the
/// assessment's loosely-typed count columns.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QuestionSelectionPolicy {
    /// Draw `count` questions per dimension; the `None` key addresses
    /// fields that belong to no dimension.
    PerDimension(BTreeMap<Option<String>, usize>),
    /// Draw a flat count across all question fields.
    FlatCount(usize),
    /// No subsetting: the user sees the full field list.
    Full,
}

impl QuestionSelectionPolicy {
    /// Resolve the policy for an assessment. Per-dimension counts win over
    /// the flat count; non-positive entries are dropped.
    pub fn from_assessment(assessment: &Assessment) -> Self {
        if let Some(counts) = &assessment.dimension_question_counts {
            let per: BTreeMap<Option<String>, usize> = counts
                .iter()
                .filter(|(_, count)| **count > 0)
                .map(|(key, count)| {
                    let dimension = if key.is_empty() || key == "null" {
                        None
                    } else {
                        Some(key.clone())
                    };
                    (dimension, *count as usize)
                })
                .collect();
            if !per.is_empty() {
                return QuestionSelectionPolicy::PerDimension(per);
            }
        }
        match assessment.number_of_questions {
            Some(n) if n > 0 => QuestionSelectionPolicy::FlatCount(n as usize),
            _ => QuestionSelectionPolicy::Full,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn sample_assessment() -> Assessment {
        Assessment {
            id: "asmt-001".to_string(),
            title: "Leadership Styles".to_string(),
            is_360: false,
            number_of_questions: None,
            dimension_question_counts: None,
            created_at: Utc.with_ymd_and_hms(2026, 2, 1, 9, 0, 0).unwrap(),
        }
    }

    #[test]
    fn assessment_round_trip() {
        let mut assessment = sample_assessment();
        assessment.dimension_question_counts =
            Some(BTreeMap::from([("d1".to_string(), 2), ("d2".to_string(), 1)]));
        let json = serde_json::to_string(&assessment).unwrap();
        let back: Assessment = serde_json::from_str(&json).unwrap();
        assert_eq!(back, assessment);
    }

    #[test]
    fn field_kind_serialization() {
        assert_eq!(
            serde_json::to_string(&FieldKind::Question).unwrap(),
            "\"question\""
        );
        assert_eq!(
            serde_json::to_string(&FieldKind::PageBreak).unwrap(),
            "\"page_break\""
        );
    }

    #[test]
    fn policy_prefers_dimension_counts() {
        let mut assessment = sample_assessment();
        assessment.number_of_questions = Some(5);
        assessment.dimension_question_counts =
            Some(BTreeMap::from([("d1".to_string(), 2)]));
        let policy = QuestionSelectionPolicy::from_assessment(&assessment);
        assert_eq!(
            policy,
            QuestionSelectionPolicy::PerDimension(BTreeMap::from([(
                Some("d1".to_string()),
                2
            )]))
        );
    }

    #[test]
    fn policy_flat_count() {
        let mut assessment = sample_assessment();
        assessment.number_of_questions = Some(3);
        assert_eq!(
            QuestionSelectionPolicy::from_assessment(&assessment),
            QuestionSelectionPolicy::FlatCount(3)
        );
    }

    #[test]
    fn policy_full_when_nothing_configured() {
        assert_eq!(
            QuestionSelectionPolicy::from_assessment(&sample_assessment()),
            QuestionSelectionPolicy::Full
        );
    }

    #[test]
    fn policy_ignores_non_positive_counts() {
        let mut assessment = sample_assessment();
        assessment.dimension_question_counts = Some(BTreeMap::from([
            ("d1".to_string(), 0),
            ("d2".to_string(), -1),
        ]));
        assert_eq!(
            QuestionSelectionPolicy::from_assessment(&assessment),
            QuestionSelectionPolicy::Full
        );
    }

    #[test]
    fn policy_sentinel_keys_map_to_no_dimension() {
        for sentinel in ["", "null"] {
            let mut assessment = sample_assessment();
            assessment.dimension_question_counts =
                Some(BTreeMap::from([(sentinel.to_string(), 2)]));
            let policy = QuestionSelectionPolicy::from_assessment(&assessment);
            assert_eq!(
                policy,
                QuestionSelectionPolicy::PerDimension(BTreeMap::from([(None, 2)]))
            );
        }
    }

    #[test]
    fn policy_zero_flat_count_is_full() {
        let mut assessment = sample_assessment();
        assessment.number_of_questions = Some(0);
        assert_eq!(
            QuestionSelectionPolicy::from_assessment(&assessment),
            QuestionSelectionPolicy::Full
        );
    }
}
