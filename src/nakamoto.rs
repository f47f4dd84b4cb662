//! Stake-based Nakamoto coefficient
//!
//! The smallest number of validators whose combined stake exceeds one third
//! of the total, i.e. enough to break BFT safety by colluding.

/// A colluding set must hold more than `total / SAFETY_DIVISOR`
pub const SAFETY_DIVISOR: f64 = 3.0;

/// Compute the Nakamoto coefficient over a stake distribution
///
/// Returns 0 when there is no stake to capture (empty set or total <= 0).
pub fn stake_coefficient(stakes: &[f64]) -> u32 {
    let mut sorted: Vec<f64> = stakes.to_vec();
    sorted.sort_by(|a, b| b.total_cmp(a));

    // Sum in the same order we accumulate so the threshold is always reachable
    let total: f64 = sorted.iter().sum();
    if total.is_nan() || total <= 0.0 {
        return 0;
    }

    let threshold = total / SAFETY_DIVISOR;
    let mut accumulated = 0.0;

    for (i, stake) in sorted.iter().enumerate() {
        accumulated += stake;
        if accumulated > threshold {
            return (i + 1) as u32;
        }
    }

    sorted.len() as u32
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_equal_stakes() {
        // 9 equal validators: 3 hold exactly 1/3, a 4th is needed to exceed it
        assert_eq!(stake_coefficient(&[1.0; 9]), 4);
        assert_eq!(stake_coefficient(&[1.0; 108]), 37);
    }

    #[test]
    fn test_whale() {
        assert_eq!(stake_coefficient(&[100.0, 1.0, 1.0, 1.0]), 1);
    }

    #[test]
    fn test_order_independent() {
        assert_eq!(
            stake_coefficient(&[1.0, 5.0, 2.0, 8.0, 3.0]),
            stake_coefficient(&[8.0, 5.0, 3.0, 2.0, 1.0]),
        );
    }

    #[test]
    fn test_empty_and_zero_stake() {
        assert_eq!(stake_coefficient(&[]), 0);
        assert_eq!(stake_coefficient(&[0.0, 0.0, 0.0]), 0);
    }

    #[test]
    fn test_single_validator() {
        assert_eq!(stake_coefficient(&[42.0]), 1);
    }

    proptest! {
        #[test]
        fn prop_coefficient_is_minimal_prefix(stakes in prop::collection::vec(0.0f64..20_000_000.0, 1..200)) {
            let total: f64 = {
                let mut s = stakes.clone();
                s.sort_by(|a, b| b.total_cmp(a));
                s.iter().sum()
            };
            prop_assume!(total > 0.0);

            let n = stake_coefficient(&stakes) as usize;
            prop_assert!(n >= 1 && n <= stakes.len());

            let mut sorted = stakes.clone();
            sorted.sort_by(|a, b| b.total_cmp(a));
            let prefix = |k: usize| sorted[..k].iter().fold(0.0, |acc, s| acc + s);

            prop_assert!(prefix(n) > total / 3.0);
            prop_assert!(prefix(n - 1) <= total / 3.0);
        }
    }
}
