//! Execution context for effects.
//!
//! The `EffectContext` says why an effect is running: an item acting on its
//! own fit, a trained skill, or something arriving from outside the fit.
//! It drives how magnitudes scale with skill level and, through
//! [`SourceClass`], which modifiers are stacking penalized by default.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Why an effect is executing.
///
/// # Examples
///
/// ```rust
/// use fitcalc::EffectContext;
///
/// let skill = EffectContext::Skill { level: 4 };
/// assert!(skill.is_skill());
/// assert_eq!(skill.container_level(), 4);
///
/// // Outside a skill context the container acts as a single unit.
/// assert_eq!(EffectContext::SelfItem.container_level(), 1);
/// assert!(EffectContext::Gang.is_external());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EffectContext {
    /// An item of this fit acting on the fit it belongs to.
    SelfItem,
    /// A trained skill on the character. Level 0 never reaches an effect.
    Skill { level: u8 },
    /// An item projected from another fit.
    Projected,
    /// A fleet bonus; resolved like `Projected` but gated by a ship filter.
    Gang,
}

impl EffectContext {
    pub fn is_skill(self) -> bool {
        matches!(self, EffectContext::Skill { .. })
    }

    /// Projected and gang sources come from another fit.
    pub fn is_external(self) -> bool {
        matches!(self, EffectContext::Projected | EffectContext::Gang)
    }

    /// Level of the container: the trained level for skills, 1 otherwise.
    pub fn container_level(self) -> u8 {
        match self {
            EffectContext::Skill { level } => level,
            _ => 1,
        }
    }
}

impl fmt::Display for EffectContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EffectContext::SelfItem => f.write_str("self"),
            EffectContext::Skill { level } => write!(f, "skill(L{level})"),
            EffectContext::Projected => f.write_str("projected"),
            EffectContext::Gang => f.write_str("gang"),
        }
    }
}

/// Broad origin of a modifier, used for assign priority and the
/// default stacking penalty policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceClass {
    /// Effects bound to the hull itself.
    ShipTrait,
    Skill,
    /// Modules plus what they carry: charges, and drones.
    Module,
    /// Implants and boosters.
    Implant,
    Projected,
    Gang,
}

impl fmt::Display for SourceClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SourceClass::ShipTrait => "ship trait",
            SourceClass::Skill => "skill",
            SourceClass::Module => "module",
            SourceClass::Implant => "implant",
            SourceClass::Projected => "projected",
            SourceClass::Gang => "gang",
        };
        f.write_str(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_container_level() {
        assert_eq!(EffectContext::Skill { level: 5 }.container_level(), 5);
        assert_eq!(EffectContext::Projected.container_level(), 1);
    }

    #[test]
    fn test_context_serde() {
        let json = serde_json::to_string(&EffectContext::Skill { level: 3 }).unwrap();
        assert_eq!(json, r#"{"skill":{"level":3}}"#);
        let ctx: EffectContext = serde_json::from_str(r#""projected""#).unwrap();
        assert_eq!(ctx, EffectContext::Projected);
    }
}
