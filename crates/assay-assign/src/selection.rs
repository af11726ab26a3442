//! Per-user question sampling.

use std::collections::BTreeMap;

use rand::seq::SliceRandom;
use rand::Rng;

use assay_core::models::assessment::{Field, FieldKind, QuestionSelectionPolicy};

/// Draw this user's question subset from an assessment's field list.
///
/// Only `Question` fields participate. Within each sampling bucket the draw
/// is uniform without replacement; a count larger than the bucket takes the
/// whole bucket. The result is re-sorted by authored display order, so the
/// user sees a subset of the assessment, never a reshuffle of it. `Full`
/// returns an empty selection: no per-assignment rows are stored and the
/// assessment is rendered in full from its own field list.
pub fn select_question_fields<R: Rng + ?Sized>(
    fields: &[Field],
    policy: &QuestionSelectionPolicy,
    rng: &mut R,
) -> Vec<Field> {
    let questions: Vec<&Field> = fields
        .iter()
        .filter(|f| f.kind == FieldKind::Question)
        .collect();

    let mut selected: Vec<Field> = match policy {
        QuestionSelectionPolicy::Full => return Vec::new(),
        QuestionSelectionPolicy::FlatCount(count) => {
            sample(questions, *count, rng)
        }
        QuestionSelectionPolicy::PerDimension(counts) => {
            let mut buckets: BTreeMap<Option<&str>, Vec<&Field>> = BTreeMap::new();
            for field in questions {
                buckets
                    .entry(field.dimension_id.as_deref())
                    .or_default()
                    .push(field);
            }
            let mut picked = Vec::new();
            for (dimension, count) in counts {
                if let Some(bucket) = buckets.remove(&dimension.as_deref()) {
                    picked.extend(sample(bucket, *count, rng));
                }
            }
            picked
        }
    };

    selected.sort_by_key(|f| f.display_order);
    selected
}

fn sample<R: Rng + ?Sized>(mut pool: Vec<&Field>, count: usize, rng: &mut R) -> Vec<Field> {
    pool.shuffle(rng);
    pool.truncate(count);
    pool.into_iter().cloned().collect()
}
