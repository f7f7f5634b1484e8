//! Greedy overlap resolution.

use clipsift_models::ClipCandidate;

/// Intersection length divided by the shorter clip's duration.
///
/// A short clip nested inside a long one has ratio 1.
pub fn overlap_ratio(a: &ClipCandidate, b: &ClipCandidate) -> f64 {
    let shorter = a.duration.min(b.duration);
    if shorter <= 0.0 {
        return 0.0;
    }
    a.intersection_secs(b) / shorter
}

/// Drop candidates overlapping a better-scored one by more than `threshold`.
///
/// Candidates are visited by descending score; equal scores keep their
/// generation order. A candidate is accepted when its overlap ratio with
/// every accepted candidate is at most `threshold`. The result is in
/// acceptance order.
pub fn resolve_overlaps(candidates: Vec<ClipCandidate>, threshold: f64) -> Vec<ClipCandidate> {
    let mut ordered = candidates;
    ordered.sort_by(|a, b| b.score.total_cmp(&a.score));

    let mut accepted: Vec<ClipCandidate> = Vec::with_capacity(ordered.len());
    for candidate in ordered {
        if accepted
            .iter()
            .all(|kept| overlap_ratio(kept, &candidate) <= threshold)
        {
            accepted.push(candidate);
        }
    }
    accepted
}

#[cfg(test)]
mod tests {
    use super::*;
    use clipsift_models::ClipType;

    fn clip(start: f64, end: f64, score: f64) -> ClipCandidate {
        ClipCandidate::new("t", start, end, score, ClipType::Combined).unwrap()
    }

    #[test]
    fn test_nested_clip_fully_overlaps() {
        let a = clip(0.0, 10.0, 0.9);
        let b = clip(2.0, 8.0, 0.95);
        assert_eq!(overlap_ratio(&a, &b), 1.0);

        let kept = resolve_overlaps(vec![a, b], 0.3);
        assert_eq!(kept.len(), 1);
        assert_eq!((kept[0].start, kept[0].end), (2.0, 8.0));
    }

    #[test]
    fn test_accepted_pairs_within_threshold() {
        let candidates = vec![
            clip(0.0, 10.0, 0.5),
            clip(8.0, 18.0, 0.7),
            clip(17.0, 27.0, 0.6),
            clip(30.0, 40.0, 0.1),
            clip(5.0, 15.0, 0.8),
        ];
        let input_len = candidates.len();
        let kept = resolve_overlaps(candidates, 0.3);

        assert!(kept.len() <= input_len);
        assert_eq!(kept[0].score, 0.8);
        for (i, a) in kept.iter().enumerate() {
            for b in &kept[i + 1..] {
                assert!(overlap_ratio(a, b) <= 0.3);
            }
        }
    }

    #[test]
    fn test_ties_keep_generation_order() {
        let first = ClipCandidate::new("first", 0.0, 10.0, 0.5, ClipType::Segment).unwrap();
        let second = ClipCandidate::new("second", 1.0, 11.0, 0.5, ClipType::Combined).unwrap();
        let kept = resolve_overlaps(vec![first, second], 0.3);
        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].text, "first");
    }

    #[test]
    fn test_threshold_one_keeps_everything() {
        let kept = resolve_overlaps(vec![clip(0.0, 10.0, 0.1), clip(0.0, 10.0, 0.2)], 1.0);
        assert_eq!(kept.len(), 2);
    }

    #[test]
    fn test_empty_input() {
        assert!(resolve_overlaps(Vec::new(), 0.3).is_empty());
    }
}
