//! Modifiers: the resolved output of an effect.
//!
//! A modifier is one directed operation against one attribute of one
//! fitted item. Modifiers are produced by the effect runner on every pass
//! and thrown away with the cache; nothing here is persisted.

use crate::context::{EffectContext, SourceClass};
use crate::item::{AttrKey, ItemKey};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;

/// How a modifier combines with the attribute value.
///
/// Operations are applied in a fixed order: assign, then flat additions,
/// then the multiplicative operations (percentage and raw multiply), which
/// share stacking groups.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Operation {
    /// Replace the base value; the highest priority assign wins.
    Assign,
    /// Add a raw amount.
    FlatAdd,
    /// Scale by `1 + magnitude / 100`.
    PercentAdd,
    /// Scale by `magnitude`.
    Multiply,
}

impl Operation {
    /// Whether the operation belongs to the stacked multiplicative phase.
    pub fn is_multiplicative(self) -> bool {
        matches!(self, Operation::PercentAdd | Operation::Multiply)
    }
}

/// Size of a modifier.
///
/// Most effects read their size from an attribute of the item carrying
/// them (`shipBonusAF`, `damageMultiplierBonus`, ...). That attribute may
/// itself be modified, so the read is deferred to the calculator, which
/// resolves it through the dependency graph.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Magnitude {
    Fixed(f64),
    /// `effective(source) * scale`.
    Attribute { source: AttrKey, scale: f64 },
}

impl Magnitude {
    /// The attribute this magnitude reads, if any.
    pub fn dependency(&self) -> Option<&AttrKey> {
        match self {
            Magnitude::Fixed(_) => None,
            Magnitude::Attribute { source, .. } => Some(source),
        }
    }
}

/// Where a modifier came from.
///
/// The effect name is shared with every other modifier the same action
/// emitted in a pass.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModifierSource {
    pub item: ItemKey,
    pub effect: Arc<str>,
    pub class: SourceClass,
    pub context: EffectContext,
}

/// One operation against one attribute of one fitted item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Modifier {
    pub target: AttrKey,
    pub operation: Operation,
    pub magnitude: Magnitude,
    /// `None` is the attribute's default group.
    pub stacking_group: Option<String>,
    pub penalized: bool,
    pub source: ModifierSource,
    /// Registration order within the runner pass.
    pub order: u32,
}

impl Modifier {
    /// Short human-readable form for breakdowns.
    pub fn description(&self, magnitude: f64) -> String {
        let op = match self.operation {
            Operation::Assign => format!("={magnitude:.4}"),
            Operation::FlatAdd => format!("{magnitude:+.4}"),
            Operation::PercentAdd => format!("{magnitude:+.2}%"),
            Operation::Multiply => format!("x{magnitude:.4}"),
        };
        format!("{op} from {} ({})", self.source.effect, self.source.context)
    }
}

/// All modifiers produced by one runner pass, indexed by target.
#[derive(Debug, Clone, Default)]
pub struct ModifierSet {
    by_target: HashMap<AttrKey, Vec<Modifier>>,
    count: u32,
}

impl ModifierSet {
    /// Create an empty set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a modifier, stamping its registration order.
    pub fn push(&mut self, mut modifier: Modifier) {
        modifier.order = self.count;
        self.count += 1;
        self.by_target
            .entry(modifier.target.clone())
            .or_default()
            .push(modifier);
    }

    /// Modifiers aimed at `target`, in registration order.
    pub fn for_target(&self, target: &AttrKey) -> &[Modifier] {
        self.by_target.get(target).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Every attribute at least one modifier aims at, in no particular order.
    pub fn targets(&self) -> impl Iterator<Item = &AttrKey> {
        self.by_target.keys()
    }

    /// All modifiers, grouped by target. Use `order` to recover
    /// registration order.
    pub fn iter(&self) -> impl Iterator<Item = &Modifier> {
        self.by_target.values().flatten()
    }

    /// Number of modifiers registered in the pass.
    pub fn len(&self) -> usize {
        self.count as usize
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    /// Modifiers aimed at any attribute of `item`.
    pub fn on_item(&self, item: ItemKey) -> impl Iterator<Item = &Modifier> {
        self.iter().filter(move |m| m.target.item == item)
    }

    /// Every modifier that came from `item`, in registration order.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use fitcalc::modifier::ModifierSet;
    /// use fitcalc::item::ItemKey;
    ///
    /// let set = ModifierSet::new();
    /// assert!(set.from_source(ItemKey(0)).is_empty());
    /// ```
    pub fn from_source(&self, item: ItemKey) -> Vec<&Modifier> {
        let mut found: Vec<&Modifier> = self.iter().filter(|m| m.source.item == item).collect();
        found.sort_by_key(|m| m.order);
        found
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn modifier(target: AttrKey, value: f64) -> Modifier {
        Modifier {
            target,
            operation: Operation::PercentAdd,
            magnitude: Magnitude::Fixed(value),
            stacking_group: None,
            penalized: true,
            source: ModifierSource {
                item: ItemKey(9),
                effect: Arc::from("test"),
                class: SourceClass::Module,
                context: EffectContext::SelfItem,
            },
            order: 0,
        }
    }

    #[test]
    fn test_push_stamps_order() {
        let key = AttrKey::new(ItemKey(1), "maxVelocity");
        let mut set = ModifierSet::new();
        set.push(modifier(key.clone(), 5.0));
        set.push(modifier(key.clone(), 10.0));

        let mods = set.for_target(&key);
        assert_eq!(mods.len(), 2);
        assert_eq!(mods[0].order, 0);
        assert_eq!(mods[1].order, 1);
        assert_eq!(set.len(), 2);
    }

    #[test]
    fn test_unknown_target_is_empty() {
        let set = ModifierSet::new();
        assert!(set.for_target(&AttrKey::new(ItemKey(1), "hp")).is_empty());
        assert!(set.is_empty());
    }

    #[test]
    fn test_multiplicative_operations() {
        assert!(!Operation::Assign.is_multiplicative());
        assert!(!Operation::FlatAdd.is_multiplicative());
        assert!(Operation::PercentAdd.is_multiplicative());
        assert!(Operation::Multiply.is_multiplicative());
    }

    #[test]
    fn test_modifier_serializes_with_source() {
        let m = modifier(AttrKey::new(ItemKey(1), "maxVelocity"), 10.0);
        let json = serde_json::to_value(&m).unwrap();
        assert_eq!(json["source"]["effect"], "test");
        assert_eq!(json["operation"], "percent_add");

        let back: Modifier = serde_json::from_value(json).unwrap();
        assert_eq!(back, m);
    }

    #[test]
    fn test_description() {
        let m = modifier(AttrKey::new(ItemKey(1), "hp"), 5.0);
        assert_eq!(m.description(5.0), "+5.00% from test (self)");
    }
}
