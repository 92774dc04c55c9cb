//! Resolved attribute breakdowns.
//!
//! A `ResolvedAttribute` is what the calculator produced for one
//! `(item, attribute)` pair: the base it started from, the final value,
//! and every modifier in the order it was applied.

use crate::item::AttrKey;
use crate::modifier::Operation;
use serde::{Deserialize, Serialize};

/// One applied modifier in a breakdown.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AppliedModifier {
    pub description: String,
    pub operation: Operation,
    /// The modifier's size after level scaling, before any penalty.
    pub magnitude: f64,
    /// Stacking penalty multiplier; 1.0 when unpenalized.
    pub penalty: f64,
    /// Running value after this modifier.
    pub value_after: f64,
}

/// A fully calculated attribute with its breakdown.
///
/// # Examples
///
/// ```rust
/// use fitcalc::ResolvedAttribute;
/// use fitcalc::item::{AttrKey, ItemKey};
/// use fitcalc::modifier::Operation;
///
/// let key = AttrKey::new(ItemKey(0), "maxVelocity");
/// let mut resolved = ResolvedAttribute::new(key, Some(300.0));
/// resolved.push("+5.00% from velocityBonus (skill(L1))", Operation::PercentAdd, 5.0, 1.0, 315.0);
///
/// assert_eq!(resolved.value, 315.0);
/// assert_eq!(resolved.modifiers.len(), 1);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ResolvedAttribute {
    pub key: AttrKey,
    /// Base value before modifiers. `None` when the item has no such
    /// attribute and an assign supplied the value.
    pub base: Option<f64>,
    pub value: f64,
    pub modifiers: Vec<AppliedModifier>,
}

impl ResolvedAttribute {
    /// Start a breakdown at `base` (0 when absent).
    pub fn new(key: AttrKey, base: Option<f64>) -> Self {
        Self {
            key,
            base,
            value: base.unwrap_or(0.0),
            modifiers: Vec::new(),
        }
    }

    /// Record a modifier and move the running value to `value_after`.
    pub fn push(
        &mut self,
        description: impl Into<String>,
        operation: Operation,
        magnitude: f64,
        penalty: f64,
        value_after: f64,
    ) {
        self.modifiers.push(AppliedModifier {
            description: description.into(),
            operation,
            magnitude,
            penalty,
            value_after,
        });
        self.value = value_after;
    }

    /// Whether any modifier in the breakdown was stacking penalized.
    pub fn is_penalized(&self) -> bool {
        self.modifiers.iter().any(|m| m.penalty < 1.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::item::ItemKey;

    #[test]
    fn test_new_without_base_starts_at_zero() {
        let resolved = ResolvedAttribute::new(AttrKey::new(ItemKey(1), "hp"), None);
        assert_eq!(resolved.value, 0.0);
        assert!(resolved.modifiers.is_empty());
    }

    #[test]
    fn test_breakdown_tracks_running_value() {
        let mut resolved = ResolvedAttribute::new(AttrKey::new(ItemKey(1), "hp"), Some(100.0));
        resolved.push("+10.0000", Operation::FlatAdd, 10.0, 1.0, 110.0);
        resolved.push("+10.00%", Operation::PercentAdd, 10.0, 0.869, 119.56);

        assert_eq!(resolved.modifiers[0].value_after, 110.0);
        assert_eq!(resolved.value, 119.56);
        assert!(resolved.is_penalized());
    }

    #[test]
    fn test_serializes_to_json() {
        let resolved = ResolvedAttribute::new(AttrKey::new(ItemKey(2), "agility"), Some(3.2));
        let json = serde_json::to_value(&resolved).unwrap();
        assert_eq!(json["base"], 3.2);
        assert_eq!(json["key"]["attribute"], "agility");
    }
}
