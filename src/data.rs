//! Static reference data.
//!
//! `StaticData` holds every item definition, attribute definition and
//! effect, indexed for the lookups the runner needs. It is loaded once,
//! wrapped in an `Arc`, and shared read-only by every fit.

use crate::attr_id::AttrId;
use crate::effect::Effect;
use crate::error::DataIntegrityError;
use crate::item::{AttributeDef, Category, Item, ItemTypeId};
use serde::Deserialize;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::path::PathBuf;
use std::sync::Arc;

/// Supplies static data at startup.
///
/// The engine only depends on this trait; where the data actually lives
/// (a JSON dump, an SQL export, generated code) is the loader's business.
pub trait StaticDataLoader {
    fn load(&self) -> Result<StaticData, DataIntegrityError>;
}

/// Loads static data from a JSON document.
///
/// ```json
/// {
///   "attributes": [{ "name": "agility", "default_value": 1.0 }],
///   "items": [{ "type_id": 1, "name": "Rifter", "group": "Frigate",
///               "category": "ship", "attributes": { "agility": 3.2 } }],
///   "effects": [],
///   "group_effects": {}
/// }
/// ```
#[derive(Debug, Clone)]
pub enum JsonLoader {
    Text(String),
    File(PathBuf),
}

impl StaticDataLoader for JsonLoader {
    fn load(&self) -> Result<StaticData, DataIntegrityError> {
        match self {
            JsonLoader::Text(text) => StaticData::from_json(text),
            JsonLoader::File(path) => {
                let text = std::fs::read_to_string(path)
                    .map_err(|e| DataIntegrityError::Parse(format!("{}: {e}", path.display())))?;
                StaticData::from_json(&text)
            }
        }
    }
}

#[derive(Debug, Deserialize)]
struct StaticDataDocument {
    items: Vec<Item>,
    #[serde(default)]
    effects: Vec<Effect>,
    #[serde(default)]
    attributes: Vec<AttributeDef>,
    #[serde(default)]
    group_effects: BTreeMap<String, Vec<String>>,
}

/// Indexed, immutable static data.
#[derive(Debug, Clone, Default)]
pub struct StaticData {
    items: HashMap<ItemTypeId, Arc<Item>>,
    by_name: HashMap<String, ItemTypeId>,
    skills: BTreeMap<String, ItemTypeId>,
    groups: HashSet<String>,
    effects: HashMap<String, Arc<Effect>>,
    group_effects: HashMap<String, Vec<String>>,
    attributes: HashMap<AttrId, AttributeDef>,
}

impl StaticData {
    /// Create an empty dataset, to be filled with the `add_*` methods.
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse and validate a JSON static-data document.
    pub fn from_json(json: &str) -> Result<Self, DataIntegrityError> {
        let doc: StaticDataDocument =
            serde_json::from_str(json).map_err(|e| DataIntegrityError::Parse(e.to_string()))?;

        let mut data = StaticData::new();
        for def in doc.attributes {
            data.add_attribute(def);
        }
        for effect in doc.effects {
            data.add_effect(effect);
        }
        for item in doc.items {
            data.add_item(item);
        }
        for (group, effects) in doc.group_effects {
            for effect in effects {
                data.bind_group_effect(group.clone(), effect);
            }
        }
        data.validate()?;
        Ok(data)
    }

    /// Register an item type.
    ///
    /// Skills are also indexed by name, and the item's group becomes
    /// known to predicate validation. A later item with the same type id
    /// or name replaces the earlier one.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use fitcalc::StaticData;
    /// use fitcalc::item::{Category, Item, ItemTypeId};
    ///
    /// let mut data = StaticData::new();
    /// data.add_item(Item::new(ItemTypeId(3449), "Navigation", "Navigation", Category::Skill))
    ///     .add_item(Item::new(ItemTypeId(587), "Rifter", "Frigate", Category::Ship));
    ///
    /// assert!(data.skill("Navigation").is_ok());
    /// assert!(data.has_group("Frigate"));
    /// ```
    pub fn add_item(&mut self, item: Item) -> &mut Self {
        if item.category == Category::Skill {
            self.skills.insert(item.name.clone(), item.type_id);
        }
        self.groups.insert(item.group.clone());
        self.by_name.insert(item.name.clone(), item.type_id);
        self.items.insert(item.type_id, Arc::new(item));
        self
    }

    /// Register an effect under its name. Items refer to it by that name.
    pub fn add_effect(&mut self, effect: Effect) -> &mut Self {
        self.effects.insert(effect.name.clone(), Arc::new(effect));
        self
    }

    /// Register an attribute definition: its default value and whether it
    /// is exempt from stacking penalties.
    pub fn add_attribute(&mut self, def: AttributeDef) -> &mut Self {
        self.attributes.insert(def.name.clone(), def);
        self
    }

    /// Bind an effect to every item of a group.
    pub fn bind_group_effect(
        &mut self,
        group: impl Into<String>,
        effect: impl Into<String>,
    ) -> &mut Self {
        self.group_effects
            .entry(group.into())
            .or_default()
            .push(effect.into());
        self
    }

    /// Every effect named by an item or group binding must exist.
    pub fn validate(&self) -> Result<(), DataIntegrityError> {
        let bound = self
            .items
            .values()
            .flat_map(|item| item.effects.iter())
            .chain(self.group_effects.values().flatten());
        for name in bound {
            if !self.effects.contains_key(name) {
                return Err(DataIntegrityError::UnknownEffect(name.clone()));
            }
        }
        Ok(())
    }

    /// Look up an item type.
    pub fn item(&self, type_id: ItemTypeId) -> Result<&Arc<Item>, DataIntegrityError> {
        self.items
            .get(&type_id)
            .ok_or(DataIntegrityError::UnknownItemType(type_id))
    }

    /// Look up an item type by its display name.
    pub fn item_by_name(&self, name: &str) -> Option<&Arc<Item>> {
        self.by_name.get(name).and_then(|id| self.items.get(id))
    }

    /// Look up a skill by name.
    ///
    /// # Errors
    ///
    /// Returns `DataIntegrityError::UnknownSkill` when no skill has that name.
    pub fn skill(&self, name: &str) -> Result<&Arc<Item>, DataIntegrityError> {
        self.skills
            .get(name)
            .and_then(|id| self.items.get(id))
            .ok_or_else(|| DataIntegrityError::UnknownSkill(name.to_string()))
    }

    /// Skill names in sorted order.
    pub fn skill_names(&self) -> impl Iterator<Item = &str> {
        self.skills.keys().map(String::as_str)
    }

    pub fn has_group(&self, group: &str) -> bool {
        self.groups.contains(group)
    }

    pub fn attribute_def(&self, attribute: &AttrId) -> Option<&AttributeDef> {
        self.attributes.get(attribute)
    }

    /// Static-data-declared default for an absent attribute.
    pub fn default_value(&self, attribute: &AttrId) -> Option<f64> {
        self.attribute_def(attribute).and_then(|def| def.default_value)
    }

    pub fn is_stackable(&self, attribute: &AttrId) -> bool {
        self.attribute_def(attribute).is_some_and(|def| def.stackable)
    }

    /// Effects bound to an item: its own, then its group's.
    pub fn effects_for(&self, item: &Item) -> Result<Vec<Arc<Effect>>, DataIntegrityError> {
        let group = self
            .group_effects
            .get(&item.group)
            .map(Vec::as_slice)
            .unwrap_or(&[]);
        item.effects
            .iter()
            .chain(group.iter())
            .map(|name| {
                self.effects
                    .get(name)
                    .cloned()
                    .ok_or_else(|| DataIntegrityError::UnknownEffect(name.clone()))
            })
            .collect()
    }
}
