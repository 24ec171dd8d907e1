/// Rounds to `places` decimals, halves away from zero.
pub fn round_to(value: f64, places: i32) -> f64 {
    let factor = 10f64.powi(places);
    (value * factor).round() / factor
}

/// Dense ranking, highest value first: equal values share a rank and ranks
/// run 1, 2, 3, … without gaps.
///
/// NaN values share the rank after every real value.
pub fn dense_rank(values: &[f64]) -> Vec<u32> {
    let mut distinct: Vec<f64> = values.iter().copied().filter(|v| !v.is_nan()).collect();
    distinct.sort_by(|a, b| b.total_cmp(a));
    distinct.dedup_by(|a, b| a == b);

    values
        .iter()
        .map(|v| {
            if v.is_nan() {
                distinct.len() as u32 + 1
            } else {
                distinct.partition_point(|d| d > v) as u32 + 1
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_round_to_two_places() {
        assert_eq!(round_to(87.5, 2), 87.5);
        assert_eq!(round_to(66.666_666, 2), 66.67);
        assert_eq!(round_to(0.125, 2), 0.13);
        assert_eq!(round_to(33.333_333, 2), 33.33);
    }

    #[test]
    fn test_dense_rank_ties_share_rank() {
        assert_eq!(dense_rank(&[87.5, 37.5, 40.0]), vec![1, 3, 2]);
        assert_eq!(dense_rank(&[50.0, 70.0, 50.0, 10.0]), vec![2, 1, 2, 3]);
        assert_eq!(dense_rank(&[5.0, 5.0, 5.0]), vec![1, 1, 1]);
        assert!(dense_rank(&[]).is_empty());
    }

    #[test]
    fn test_dense_rank_puts_nan_last() {
        assert_eq!(dense_rank(&[f64::NAN, 50.0, f64::NAN, 10.0]), vec![3, 1, 3, 2]);
        assert_eq!(dense_rank(&[f64::NAN]), vec![1]);
        assert_eq!(dense_rank(&[f64::INFINITY, f64::NAN, 0.0]), vec![1, 3, 2]);
    }

    proptest! {
        #[test]
        fn prop_dense_rank_has_no_gaps(values in proptest::collection::vec(0u32..20, 1..40)) {
            let values: Vec<f64> = values.into_iter().map(f64::from).collect();
            let ranks = dense_rank(&values);

            let mut used: Vec<u32> = ranks.clone();
            used.sort_unstable();
            used.dedup();
            let expected: Vec<u32> = (1..=used.len() as u32).collect();
            prop_assert_eq!(used, expected);

            for i in 0..values.len() {
                for j in 0..values.len() {
                    if values[i] == values[j] {
                        prop_assert_eq!(ranks[i], ranks[j]);
                    } else if values[i] > values[j] {
                        prop_assert!(ranks[i] < ranks[j]);
                    }
                }
            }
        }
    }
}
