//! Engine configuration.
//!
//! Stacking penalty policy is data, not code: the penalty curve, the
//! per-origin penalization defaults and the assign priority all live in
//! `EngineConfig`, which is injected into each fit.

use crate::context::SourceClass;
use crate::error::DataIntegrityError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Tunables for the attribute calculator.
///
/// Every field has a default, so a partial JSON document is valid:
///
/// ```rust
/// use fitcalc::EngineConfig;
///
/// let config = EngineConfig::from_json(r#"{ "split_penalty_by_sign": true }"#).unwrap();
/// assert!(config.split_penalty_by_sign);
/// assert_eq!(config.stacking_denominator, 2.67);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// `penalty(i) = exp(-(i / stacking_denominator)^2)`.
    pub stacking_denominator: f64,

    /// Run positive and negative modifiers of a stacking group as
    /// separate penalty chains.
    pub split_penalty_by_sign: bool,

    /// Whether `StackingPolicy::Auto` modifiers are penalized, per origin.
    pub penalize_by_default: BTreeMap<SourceClass, bool>,

    /// Assign modifiers from earlier entries beat later ones.
    pub assign_priority: Vec<SourceClass>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        let penalize_by_default = BTreeMap::from([
            (SourceClass::ShipTrait, false),
            (SourceClass::Skill, false),
            (SourceClass::Module, true),
            (SourceClass::Implant, false),
            (SourceClass::Projected, true),
            (SourceClass::Gang, true),
        ]);
        Self {
            stacking_denominator: 2.67,
            split_penalty_by_sign: false,
            penalize_by_default,
            assign_priority: vec![
                SourceClass::ShipTrait,
                SourceClass::Skill,
                SourceClass::Module,
                SourceClass::Implant,
                SourceClass::Gang,
                SourceClass::Projected,
            ],
        }
    }
}

impl EngineConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_json(json: &str) -> Result<Self, DataIntegrityError> {
        serde_json::from_str(json).map_err(|e| DataIntegrityError::Parse(e.to_string()))
    }

    /// Default penalization for an origin; unlisted origins are penalized.
    pub fn penalized_by_default(&self, class: SourceClass) -> bool {
        self.penalize_by_default.get(&class).copied().unwrap_or(true)
    }

    /// Rank for assign tie-breaking. Higher wins; unlisted origins rank lowest.
    pub fn assign_rank(&self, class: SourceClass) -> usize {
        self.assign_priority
            .iter()
            .position(|c| *c == class)
            .map(|pos| self.assign_priority.len() - pos)
            .unwrap_or(0)
    }
}
