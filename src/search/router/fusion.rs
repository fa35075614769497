

use std::cmp::Ordering;

use super::models::{dedupe_by_id, Origin, RetrievalResult};


/// Merge both strategies into one ranked list.
///
/// Structured results go first and win duplicates. The sort is stable:
/// structured origin, then (when models were asked about) compatibility with
/// one of them, then descending score with a missing score lowest.
pub fn fuse(
    structured: &[RetrievalResult],
    semantic: &[RetrievalResult],
    model_numbers: &[String],
) -> Vec<RetrievalResult> {
    let merged: Vec<RetrievalResult> = structured.iter().chain(semantic).cloned().collect();
    let mut combined = dedupe_by_id(merged, false);

    combined.sort_by(|a, b| rank(a, b, model_numbers));
    combined
}


fn rank(a: &RetrievalResult, b: &RetrievalResult, model_numbers: &[String]) -> Ordering {
    let by_origin = origin_rank(a.origin).cmp(&origin_rank(b.origin));
    if by_origin != Ordering::Equal {
        return by_origin;
    }

    if a.origin == Origin::Semantic && !model_numbers.is_empty() {
        let by_compat = compatible(b, model_numbers).cmp(&compatible(a, model_numbers));
        if by_compat != Ordering::Equal {
            return by_compat;
        }
    }

    match (a.relevance_score, b.relevance_score) {
        (Some(x), Some(y)) => y.total_cmp(&x),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}


fn origin_rank(origin: Origin) -> u8 {
    match origin {
        Origin::Structured => 0,
        Origin::Semantic => 1,
    }
}


fn compatible(result: &RetrievalResult, model_numbers: &[String]) -> bool {
    model_numbers.iter().any(|m| result.record.is_compatible_with(m))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::ProductRecord;
    use crate::search::router::models::MatchReason;

    fn record(id: &str, models: &[&str]) -> ProductRecord {
        ProductRecord {
            part_number: id.to_string(),
            compatible_models: models.iter().map(|s| s.to_string()).collect(),
            ..Default::default()
        }
    }

    fn structured(id: &str) -> RetrievalResult {
        RetrievalResult::structured(record(id, &[]), MatchReason::PartNumber(id.to_string()))
    }

    fn semantic(id: &str, score: Option<f32>, models: &[&str]) -> RetrievalResult {
        RetrievalResult::semantic(record(id, models), score, MatchReason::Similarity)
    }

    fn ids(results: &[RetrievalResult]) -> Vec<&str> {
        results.iter().map(|r| r.id()).collect()
    }

    #[test]
    fn test_structured_always_first() {
        let combined = fuse(
            &[structured("PS1")],
            &[semantic("PS2", Some(0.99), &[]), semantic("PS3", Some(0.5), &[])],
            &[],
        );
        assert_eq!(ids(&combined), vec!["PS1", "PS2", "PS3"]);
    }

    #[test]
    fn test_duplicate_keeps_structured_entry() {
        let combined = fuse(&[structured("PS1")], &[semantic("PS1", Some(0.9), &[])], &[]);
        assert_eq!(combined.len(), 1);
        assert_eq!(combined[0].origin, Origin::Structured);
        assert_eq!(combined[0].relevance_score, None);
        assert_eq!(
            combined[0].match_reasons,
            vec![MatchReason::PartNumber("PS1".into()), MatchReason::Similarity]
        );
    }

    #[test]
    fn test_compatible_semantic_results_promoted() {
        let models = vec!["WDT780SAEM1".to_string()];
        let combined = fuse(
            &[],
            &[
                semantic("PS2", Some(0.95), &[]),
                semantic("PS3", Some(0.40), &["WDT780SAEM1"]),
                semantic("PS4", None, &["wdt780saem1"]),
            ],
            &models,
        );
        assert_eq!(ids(&combined), vec!["PS3", "PS4", "PS2"]);
    }

    #[test]
    fn test_compatibility_ignored_without_models() {
        let combined = fuse(
            &[],
            &[semantic("PS3", Some(0.40), &["WDT780SAEM1"]), semantic("PS2", Some(0.95), &[])],
            &[],
        );
        assert_eq!(ids(&combined), vec!["PS2", "PS3"]);
    }

    #[test]
    fn test_missing_score_sorts_last_and_order_is_stable() {
        let combined = fuse(
            &[structured("PS1"), structured("PS0")],
            &[
                semantic("PS5", None, &[]),
                semantic("PS6", Some(0.1), &[]),
                semantic("PS7", None, &[]),
            ],
            &[],
        );
        assert_eq!(ids(&combined), vec!["PS1", "PS0", "PS6", "PS5", "PS7"]);
    }

    #[test]
    fn test_nan_score_still_gives_a_total_order() {
        let forward = fuse(
            &[structured("PS1")],
            &[
                semantic("PS2", Some(0.5), &[]),
                semantic("PS3", Some(f32::NAN), &[]),
                semantic("PS4", Some(0.9), &[]),
            ],
            &[],
        );
        let backward = fuse(
            &[structured("PS1")],
            &[
                semantic("PS4", Some(0.9), &[]),
                semantic("PS3", Some(f32::NAN), &[]),
                semantic("PS2", Some(0.5), &[]),
            ],
            &[],
        );

        assert_eq!(forward[0].id(), "PS1");
        assert_eq!(ids(&forward), ids(&backward));
        let pos = |id: &str| ids(&forward).iter().position(|x| *x == id).unwrap();
        assert!(pos("PS4") < pos("PS2"));
    }

    #[test]
    fn test_empty_inputs() {
        assert!(fuse(&[], &[], &[]).is_empty());
    }
}
