//! Static item definitions and the keys used to address fitted items.
//!
//! An `Item` is immutable reference data shared by every fit. Once an item
//! is placed in a fit it gets an `ItemKey`, and a single attribute of a
//! single fitted item is addressed by an `AttrKey`.

use crate::attr_id::AttrId;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Static-data identifier of an item type.
#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ItemTypeId(pub u32);

impl fmt::Display for ItemTypeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "type {}", self.0)
    }
}

/// Stable handle of an item instance inside one fit.
///
/// Keys are never reused within a fit, so a key held by the caller goes
/// stale (rather than silently pointing at another item) once the item is
/// removed.
#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ItemKey(pub u32);

impl fmt::Display for ItemKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// One attribute of one fitted item; the unit of caching and of the
/// dependency graph.
#[derive(Debug, Clone, Hash, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct AttrKey {
    pub item: ItemKey,
    pub attribute: AttrId,
}

impl AttrKey {
    pub fn new(item: ItemKey, attribute: impl Into<AttrId>) -> Self {
        Self {
            item,
            attribute: attribute.into(),
        }
    }
}

impl fmt::Display for AttrKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.item, self.attribute)
    }
}

/// Item category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    Ship,
    Module,
    Drone,
    Charge,
    Skill,
    Implant,
    Booster,
    Subsystem,
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Category::Ship => "ship",
            Category::Module => "module",
            Category::Drone => "drone",
            Category::Charge => "charge",
            Category::Skill => "skill",
            Category::Implant => "implant",
            Category::Booster => "booster",
            Category::Subsystem => "subsystem",
        };
        f.write_str(name)
    }
}

/// Immutable item definition.
///
/// # Examples
///
/// ```rust
/// use fitcalc::item::{Category, Item, ItemTypeId};
///
/// let warrior = Item::new(ItemTypeId(2486), "Warrior I", "Combat Drone", Category::Drone)
///     .with_attribute("damageMultiplier", 1.0)
///     .with_required_skill("Drones", 1)
///     .with_required_skill("Scout Drone Operation", 1);
///
/// assert!(warrior.requires_skill("Scout Drone Operation"));
/// assert!(!warrior.requires_skill("Heavy Drone Operation"));
/// assert_eq!(warrior.base_attribute("damageMultiplier"), Some(1.0));
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Item {
    pub type_id: ItemTypeId,
    pub name: String,
    pub group: String,
    pub category: Category,
    #[serde(default)]
    pub attributes: BTreeMap<AttrId, f64>,
    /// Skill name to minimum level.
    #[serde(default)]
    pub required_skills: BTreeMap<String, u8>,
    /// Names of effects bound to this item type.
    #[serde(default)]
    pub effects: Vec<String>,
}

impl Item {
    pub fn new(
        type_id: ItemTypeId,
        name: impl Into<String>,
        group: impl Into<String>,
        category: Category,
    ) -> Self {
        Self {
            type_id,
            name: name.into(),
            group: group.into(),
            category,
            attributes: BTreeMap::new(),
            required_skills: BTreeMap::new(),
            effects: Vec::new(),
        }
    }

    pub fn with_attribute(mut self, attribute: impl Into<AttrId>, value: f64) -> Self {
        self.attributes.insert(attribute.into(), value);
        self
    }

    pub fn with_required_skill(mut self, skill: impl Into<String>, level: u8) -> Self {
        self.required_skills.insert(skill.into(), level);
        self
    }

    pub fn with_effect(mut self, effect: impl Into<String>) -> Self {
        self.effects.push(effect.into());
        self
    }

    /// Base value straight from static data, without defaults.
    pub fn base_attribute(&self, attribute: &str) -> Option<f64> {
        self.attributes.get(&AttrId::new(attribute)).copied()
    }

    /// Whether the item lists `skill` among its direct requirements.
    pub fn requires_skill(&self, skill: &str) -> bool {
        self.required_skills.contains_key(skill)
    }
}

/// Static metadata about an attribute.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttributeDef {
    pub name: AttrId,
    /// Natural value when an item does not define the attribute.
    #[serde(default)]
    pub default_value: Option<f64>,
    /// Stackable attributes are never stacking penalized.
    #[serde(default)]
    pub stackable: bool,
}
