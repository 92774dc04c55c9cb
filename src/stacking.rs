//! Stacking penalties.
//!
//! Multiplicative modifiers in the same stacking group lose strength the
//! more of them there are: sorted strongest first, the i-th one (0-indexed)
//! is scaled by `exp(-(i / 2.67)^2)`. Unpenalized modifiers sit outside the
//! chain and always apply in full.

use crate::config::EngineConfig;
use std::cmp::Ordering;

/// Diminishing-returns multiplier for the `index`-th modifier of a chain.
///
/// # Examples
///
/// ```rust
/// use fitcalc::stacking::penalty_factor;
///
/// assert_eq!(penalty_factor(0, 2.67), 1.0);
/// assert!((penalty_factor(1, 2.67) - 0.8691199808).abs() < 1e-9);
/// assert!((penalty_factor(2, 2.67) - 0.5705831435).abs() < 1e-9);
/// ```
pub fn penalty_factor(index: usize, denominator: f64) -> f64 {
    if index == 0 {
        return 1.0;
    }
    let x = index as f64 / denominator;
    (-(x * x)).exp()
}

/// One multiplicative modifier, reduced to its fractional strength.
///
/// A +10% bonus and a `x1.10` multiplier both have strength `0.10`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StackEntry {
    pub strength: f64,
    pub penalized: bool,
    /// Registration order, for stable tie-breaks.
    pub order: u32,
}

/// How one entry ended up being applied.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AppliedFactor {
    /// Index into the slice given to [`stack_group`].
    pub entry: usize,
    pub penalty: f64,
    /// `1 + strength * penalty`.
    pub factor: f64,
}

/// Apply stacking penalties to one stacking group.
///
/// Unpenalized entries come first, in registration order. Penalized
/// entries follow, strongest first, each carrying its chain position's
/// penalty. With `split_penalty_by_sign`, bonuses and maluses run as two
/// independent chains.
pub fn stack_group(entries: &[StackEntry], config: &EngineConfig) -> Vec<AppliedFactor> {
    let mut applied = Vec::with_capacity(entries.len());

    let mut free: Vec<usize> = (0..entries.len()).filter(|&i| !entries[i].penalized).collect();
    free.sort_by_key(|&i| entries[i].order);
    for i in free {
        applied.push(AppliedFactor {
            entry: i,
            penalty: 1.0,
            factor: 1.0 + entries[i].strength,
        });
    }

    let penalized: Vec<usize> = (0..entries.len()).filter(|&i| entries[i].penalized).collect();
    let chains: Vec<Vec<usize>> = if config.split_penalty_by_sign {
        let (pos, neg): (Vec<usize>, Vec<usize>) =
            penalized.into_iter().partition(|&i| entries[i].strength >= 0.0);
        vec![pos, neg]
    } else {
        vec![penalized]
    };

    for mut chain in chains {
        chain.sort_by(|&a, &b| strongest_first(&entries[a], &entries[b]));
        for (position, i) in chain.into_iter().enumerate() {
            let penalty = penalty_factor(position, config.stacking_denominator);
            applied.push(AppliedFactor {
                entry: i,
                penalty,
                factor: 1.0 + entries[i].strength * penalty,
            });
        }
    }

    applied
}

fn strongest_first(a: &StackEntry, b: &StackEntry) -> Ordering {
    b.strength
        .abs()
        .partial_cmp(&a.strength.abs())
        .unwrap_or(Ordering::Equal)
        .then(a.order.cmp(&b.order))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(strength: f64, penalized: bool, order: u32) -> StackEntry {
        StackEntry {
            strength,
            penalized,
            order,
        }
    }

    fn product(applied: &[AppliedFactor]) -> f64 {
        applied.iter().map(|a| a.factor).product()
    }

    #[test]
    fn test_three_penalized_modifiers() {
        let config = EngineConfig::default();
        // Registered weakest first; the chain must still sort them.
        let entries = [entry(0.05, true, 0), entry(0.08, true, 1), entry(0.10, true, 2)];
        let applied = stack_group(&entries, &config);

        assert_eq!(applied[0].entry, 2);
        assert_eq!(applied[0].penalty, 1.0);
        assert_eq!(applied[1].entry, 1);
        assert!((applied[1].penalty - penalty_factor(1, 2.67)).abs() < 1e-12);
        assert_eq!(applied[2].entry, 0);
        assert!((applied[2].penalty - penalty_factor(2, 2.67)).abs() < 1e-12);

        let expected = 1.10
            * (1.0 + 0.08 * (-(1.0f64 / 2.67).powi(2)).exp())
            * (1.0 + 0.05 * (-(2.0f64 / 2.67).powi(2)).exp());
        assert!((product(&applied) - expected).abs() < 1e-12);
    }

    #[test]
    fn test_unpenalized_do_not_take_chain_positions() {
        let config = EngineConfig::default();
        let entries = [entry(0.50, false, 0), entry(0.10, true, 1)];
        let applied = stack_group(&entries, &config);

        assert_eq!(applied.len(), 2);
        assert!(applied.iter().all(|a| a.penalty == 1.0));
        assert!((product(&applied) - 1.5 * 1.1).abs() < 1e-12);
    }

    #[test]
    fn test_negative_strength_sorted_by_magnitude() {
        let config = EngineConfig::default();
        let entries = [entry(0.05, true, 0), entry(-0.20, true, 1)];
        let applied = stack_group(&entries, &config);
        assert_eq!(applied[0].entry, 1);
        assert_eq!(applied[1].entry, 0);
    }

    #[test]
    fn test_split_by_sign_runs_two_chains() {
        let config = EngineConfig {
            split_penalty_by_sign: true,
            ..EngineConfig::default()
        };
        let entries = [entry(0.10, true, 0), entry(-0.10, true, 1)];
        let applied = stack_group(&entries, &config);
        assert!(applied.iter().all(|a| a.penalty == 1.0));
    }

    #[test]
    fn test_equal_strength_keeps_registration_order() {
        let config = EngineConfig::default();
        let entries = [entry(0.10, true, 4), entry(0.10, true, 2)];
        let applied = stack_group(&entries, &config);
        assert_eq!(applied[0].entry, 1);
    }
}
