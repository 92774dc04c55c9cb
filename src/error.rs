//! Error types for fit calculation.
//!
//! Two families exist: `DataIntegrityError` means the static dataset is
//! corrupt or incomplete and aborts the calculation that hit it, while
//! `InvalidMutation` rejects a caller's change before it touches the fit.
//! An absent attribute is not an error; it surfaces as `Ok(None)`.

use crate::attr_id::AttrId;
use crate::item::{AttrKey, ItemKey, ItemTypeId};
use thiserror::Error;

/// Result type alias using [`FitError`].
pub type Result<T> = std::result::Result<T, FitError>;

/// Format a cycle path as a readable string.
fn format_cycle_path(path: &[AttrKey]) -> String {
    if path.is_empty() {
        return String::from("(empty cycle)");
    }
    path.iter()
        .map(|key| key.to_string())
        .collect::<Vec<_>>()
        .join(" -> ")
}

/// Top-level error type for fit operations.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum FitError {
    /// The static data is inconsistent with what an effect needs.
    #[error("Data integrity error: {0}")]
    DataIntegrity(#[from] DataIntegrityError),

    /// A mutation was rejected; the fit is unchanged.
    #[error("Invalid mutation: {0}")]
    InvalidMutation(#[from] InvalidMutation),

    /// A query named an item key that is not in the fit.
    #[error("Unknown item: {0}")]
    UnknownItem(ItemKey),
}

/// The static dataset is missing something an effect or item refers to.
///
/// Fatal for the calculation pass that raised it and never retried.
///
/// # Examples
///
/// ```rust
/// use fitcalc::DataIntegrityError;
///
/// let err = DataIntegrityError::UnknownSkill("Amarr Frigate".into());
/// assert_eq!(err.to_string(), "Unknown skill: Amarr Frigate");
/// ```
#[derive(Debug, Error, Clone, PartialEq)]
pub enum DataIntegrityError {
    /// An item type id is not present in the static data.
    #[error("Unknown item type: {0}")]
    UnknownItemType(ItemTypeId),

    /// A skill referenced by name is not present in the static data.
    #[error("Unknown skill: {0}")]
    UnknownSkill(String),

    /// An item group referenced by a predicate is not present in the static data.
    #[error("Unknown item group: {0}")]
    UnknownGroup(String),

    /// An item or group binding names an effect that was never defined.
    #[error("Unknown effect: {0}")]
    UnknownEffect(String),

    /// An effect reads an attribute the source item does not have.
    #[error("Attribute {attribute} missing on {item}")]
    MissingAttribute {
        /// The item that was expected to carry the attribute.
        item: ItemKey,
        /// The missing attribute.
        attribute: AttrId,
    },

    /// Attribute dependencies form a cycle.
    ///
    /// If A's magnitude reads B and B's magnitude reads A, the path is
    /// `[A, B, A]`.
    #[error("Cycle detected: {}", format_cycle_path(.path))]
    Cycle { path: Vec<AttrKey> },

    /// A dependency was not resolved before its dependent.
    #[error("Missing dependency: {0}")]
    MissingDependency(AttrKey),

    /// The static data document could not be decoded.
    #[error("Failed to parse static data: {0}")]
    Parse(String),
}

/// A rejected fit mutation.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum InvalidMutation {
    /// The key does not refer to an item currently in the fit.
    #[error("Item not fitted: {0}")]
    ItemNotFitted(ItemKey),

    /// Skill levels are limited to `0..=5`.
    #[error("Skill level {level} out of range for {skill} (expected 0..=5)")]
    SkillLevelOutOfRange {
        /// The skill being set.
        skill: String,
        /// The rejected level.
        level: u8,
    },

    /// The skill name does not exist in the static data.
    #[error("Unknown skill: {0}")]
    UnknownSkill(String),

    /// The item is not a module (state toggles and charges need one).
    #[error("Item {0} is not a module")]
    NotAModule(ItemKey),

    /// The item's category cannot be placed in the requested scope.
    #[error("{item} cannot be fitted as {scope}")]
    WrongCategory {
        /// Name of the offending item type.
        item: String,
        /// The scope it was offered to.
        scope: String,
    },

    /// The item type id is not in the static data.
    #[error("Unknown item type: {0}")]
    UnknownItemType(ItemTypeId),

    /// A gang bonus ship filter refers to unknown static data.
    #[error("Invalid ship filter: {0}")]
    InvalidShipFilter(DataIntegrityError),

    /// A fit always has exactly one ship; replace it instead.
    #[error("The ship cannot be removed from a fit")]
    CannotRemoveShip,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = FitError::from(DataIntegrityError::UnknownGroup("ECM Burst".into()));
        assert!(err.to_string().contains("ECM Burst"));
    }

    #[test]
    fn test_cycle_error_display() {
        let a = AttrKey::new(ItemKey(1), "a");
        let b = AttrKey::new(ItemKey(2), "b");
        let err = DataIntegrityError::Cycle {
            path: vec![a.clone(), b, a],
        };
        let display = err.to_string();
        assert!(display.contains("Cycle detected"));
        assert!(display.contains("#1.a -> #2.b -> #1.a"));
    }

    #[test]
    fn test_skill_level_error_display() {
        let err = InvalidMutation::SkillLevelOutOfRange {
            skill: "Navigation".into(),
            level: 6,
        };
        assert_eq!(
            err.to_string(),
            "Skill level 6 out of range for Navigation (expected 0..=5)"
        );
    }
}
