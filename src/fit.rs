//! The fit aggregate.
//!
//! A `Fit` owns one ship plus everything fitted to or acting on it, and
//! the cache of calculated values. Every mutation clears the cache
//! wholesale; queries rebuild what they need on demand.

use crate::attr_id::AttrId;
use crate::calculator::AttributeCalculator;
use crate::config::EngineConfig;
use crate::data::StaticData;
use crate::effect::Scope;
use crate::error::{DataIntegrityError, FitError, InvalidMutation, Result};
use crate::item::{AttrKey, Category, Item, ItemKey, ItemTypeId};
use crate::predicate::Predicate;
use crate::resolved::ResolvedAttribute;
use crate::runner::{EffectRunner, RunnerPass};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard};
use tracing::debug;

/// Module activation state, ordered from least to most active.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModuleState {
    Offline,
    Online,
    Active,
    Overloaded,
}

/// Where `Fit::add_item` places an item.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Slot {
    /// Replaces the current ship.
    Ship,
    Module,
    Drone,
    /// Loads a charge into a fitted module, replacing any previous charge.
    Charge { module: ItemKey },
    Implant,
    Booster,
}

impl Slot {
    fn accepts(self, category: Category) -> bool {
        match self {
            Slot::Ship => category == Category::Ship,
            Slot::Module => matches!(category, Category::Module | Category::Subsystem),
            Slot::Drone => category == Category::Drone,
            Slot::Charge { .. } => category == Category::Charge,
            Slot::Implant => category == Category::Implant,
            Slot::Booster => category == Category::Booster,
        }
    }
}

impl fmt::Display for Slot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Slot::Ship => "ship",
            Slot::Module => "module",
            Slot::Drone => "drone",
            Slot::Charge { .. } => "charge",
            Slot::Implant => "implant",
            Slot::Booster => "booster",
        };
        f.write_str(name)
    }
}

/// An item instance inside a fit.
#[derive(Debug, Clone)]
pub struct FittedItem {
    pub key: ItemKey,
    pub item: Arc<Item>,
    /// Values that replace static base values. Used for projected and
    /// gang sources, whose attributes were already resolved by their own fit.
    pub overrides: BTreeMap<AttrId, f64>,
}

impl FittedItem {
    fn new(key: ItemKey, item: Arc<Item>) -> Self {
        Self {
            key,
            item,
            overrides: BTreeMap::new(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct FittedModule {
    pub fitted: FittedItem,
    pub state: ModuleState,
    pub charge: Option<FittedItem>,
}

#[derive(Debug, Clone)]
pub struct TrainedSkill {
    pub fitted: FittedItem,
    pub level: u8,
}

/// The pilot: trained skills by name.
#[derive(Debug, Clone, Default)]
pub struct Character {
    skills: BTreeMap<String, TrainedSkill>,
}

impl Character {
    /// Trained level; absent skills are level 0.
    pub fn skill_level(&self, name: &str) -> u8 {
        self.skills.get(name).map(|s| s.level).unwrap_or(0)
    }

    /// Skills in name order.
    pub fn skills(&self) -> impl Iterator<Item = &TrainedSkill> {
        self.skills.values()
    }
}

/// An item projected onto this fit from another one.
#[derive(Debug, Clone)]
pub struct ProjectedItem {
    pub fitted: FittedItem,
    pub state: ModuleState,
}

/// A fleet bonus source, applied only when `ship_filter` matches the ship.
#[derive(Debug, Clone)]
pub struct GangBonus {
    pub fitted: FittedItem,
    pub ship_filter: Predicate,
}

#[derive(Debug, Default)]
struct CalcCache {
    pass: Option<Arc<RunnerPass>>,
    values: HashMap<AttrKey, Option<f64>>,
}

/// A ship loadout and its calculated attributes.
///
/// # Examples
///
/// ```rust
/// use fitcalc::{Fit, StaticData};
/// use fitcalc::item::{Category, Item, ItemTypeId};
/// use std::sync::Arc;
///
/// let mut data = StaticData::new();
/// data.add_item(Item::new(ItemTypeId(587), "Rifter", "Frigate", Category::Ship)
///     .with_attribute("maxVelocity", 365.0));
///
/// let fit = Fit::new(Arc::new(data), ItemTypeId(587)).unwrap();
/// let ship = fit.ship().key;
/// assert_eq!(fit.effective_attribute(ship, "maxVelocity").unwrap(), Some(365.0));
/// assert_eq!(fit.effective_attribute(ship, "cpuOutput").unwrap(), None);
/// ```
#[derive(Debug)]
pub struct Fit {
    data: Arc<StaticData>,
    config: Arc<EngineConfig>,
    ship: FittedItem,
    modules: Vec<FittedModule>,
    drones: Vec<FittedItem>,
    implants: Vec<FittedItem>,
    boosters: Vec<FittedItem>,
    character: Character,
    projected: Vec<ProjectedItem>,
    gang: Vec<GangBonus>,
    next_key: u32,
    cache: RwLock<CalcCache>,
}

impl Fit {
    /// Create a fit around a ship with the default engine configuration.
    pub fn new(data: Arc<StaticData>, ship: ItemTypeId) -> Result<Self> {
        Self::with_config(data, Arc::new(EngineConfig::default()), ship)
    }

    /// Create a fit with an explicit engine configuration.
    ///
    /// The configuration is shared, not global: several fits may use
    /// different penalty or assign rules side by side.
    ///
    /// # Arguments
    ///
    /// * `data` - Static data shared by every fit
    /// * `config` - Penalty and assign-priority rules for this fit
    /// * `ship` - Type id of the hull; must be in the ship category
    ///
    /// # Errors
    ///
    /// Returns `InvalidMutation::UnknownItemType` or
    /// `InvalidMutation::WrongCategory` when `ship` is not a known hull.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use fitcalc::{EngineConfig, Fit, StaticData};
    /// use fitcalc::item::{Category, Item, ItemTypeId};
    /// use std::sync::Arc;
    ///
    /// let mut data = StaticData::new();
    /// data.add_item(Item::new(ItemTypeId(1), "Rifter", "Frigate", Category::Ship));
    /// let config = EngineConfig { split_penalty_by_sign: true, ..EngineConfig::default() };
    ///
    /// let fit = Fit::with_config(Arc::new(data), Arc::new(config), ItemTypeId(1)).unwrap();
    /// assert!(fit.config().split_penalty_by_sign);
    /// ```
    pub fn with_config(
        data: Arc<StaticData>,
        config: Arc<EngineConfig>,
        ship: ItemTypeId,
    ) -> Result<Self> {
        let hull = checked_item(&data, ship, Slot::Ship)?;
        Ok(Self {
            data,
            config,
            ship: FittedItem::new(ItemKey(0), hull),
            modules: Vec::new(),
            drones: Vec::new(),
            implants: Vec::new(),
            boosters: Vec::new(),
            character: Character::default(),
            projected: Vec::new(),
            gang: Vec::new(),
            next_key: 1,
            cache: RwLock::new(CalcCache::default()),
        })
    }

    /// Static data this fit was built against.
    pub fn data(&self) -> &StaticData {
        &self.data
    }

    /// Engine configuration in effect for this fit.
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    // ------------------------------------------------------------------
    // Scopes
    // ------------------------------------------------------------------

    /// The hull. A fit always has exactly one.
    pub fn ship(&self) -> &FittedItem {
        &self.ship
    }

    /// Fitted modules in fitting order, with their states and charges.
    pub fn modules(&self) -> &[FittedModule] {
        &self.modules
    }

    /// Drones in the drone bay.
    pub fn drones(&self) -> &[FittedItem] {
        &self.drones
    }

    /// Loaded charges, in module order.
    pub fn charges(&self) -> impl Iterator<Item = &FittedItem> {
        self.modules.iter().filter_map(|m| m.charge.as_ref())
    }

    pub fn implants(&self) -> &[FittedItem] {
        &self.implants
    }

    /// Boosters. They run as implants, after them.
    pub fn boosters(&self) -> &[FittedItem] {
        &self.boosters
    }

    /// The pilot and their trained skills.
    pub fn character(&self) -> &Character {
        &self.character
    }

    /// Items projected onto this fit from other fits.
    pub fn projected(&self) -> &[ProjectedItem] {
        &self.projected
    }

    /// Fleet bonus sources, including those the ship filter currently
    /// excludes.
    pub fn gang_bonuses(&self) -> &[GangBonus] {
        &self.gang
    }

    /// Items an effect scope covers, in deterministic order.
    pub fn scope_items(&self, scope: Scope) -> Vec<&FittedItem> {
        match scope {
            Scope::Ship => vec![&self.ship],
            Scope::Modules => self.modules.iter().map(|m| &m.fitted).collect(),
            Scope::Drones => self.drones.iter().collect(),
            Scope::Charges => self.charges().collect(),
            Scope::Implants => self.implants.iter().collect(),
            Scope::Boosters => self.boosters.iter().collect(),
            Scope::Skills => self.character.skills().map(|s| &s.fitted).collect(),
        }
    }

    /// Find any item of the fit by key.
    pub fn get(&self, key: ItemKey) -> Option<&FittedItem> {
        if self.ship.key == key {
            return Some(&self.ship);
        }
        self.modules
            .iter()
            .flat_map(|m| std::iter::once(&m.fitted).chain(m.charge.as_ref()))
            .chain(self.drones.iter())
            .chain(self.implants.iter())
            .chain(self.boosters.iter())
            .chain(self.character.skills().map(|s| &s.fitted))
            .chain(self.projected.iter().map(|p| &p.fitted))
            .chain(self.gang.iter().map(|g| &g.fitted))
            .find(|f| f.key == key)
    }

    /// The module a charge is loaded into.
    pub fn carrier_of(&self, charge: ItemKey) -> Option<&FittedModule> {
        self.modules
            .iter()
            .find(|m| m.charge.as_ref().is_some_and(|c| c.key == charge))
    }

    /// Look up a fitted module by key.
    pub fn module(&self, key: ItemKey) -> Option<&FittedModule> {
        self.modules.iter().find(|m| m.fitted.key == key)
    }

    /// Trained level of `name`; 0 when untrained.
    pub fn skill_level(&self, name: &str) -> u8 {
        self.character.skill_level(name)
    }

    /// Base value of an attribute: overrides, then static data, then the
    /// attribute's declared default.
    pub fn base_value(&self, key: &AttrKey) -> Result<Option<f64>> {
        let fitted = self.get(key.item).ok_or(FitError::UnknownItem(key.item))?;
        Ok(fitted
            .overrides
            .get(&key.attribute)
            .or_else(|| fitted.item.attributes.get(&key.attribute))
            .copied()
            .or_else(|| self.data.default_value(&key.attribute)))
    }

    // ------------------------------------------------------------------
    // Mutations
    // ------------------------------------------------------------------

    /// Place an item in the fit and return its key.
    ///
    /// Modules are fitted online. A charge replaces whatever the target
    /// module had loaded. `Slot::Ship` swaps the hull and gives the new
    /// one a fresh key.
    ///
    /// # Arguments
    ///
    /// * `type_id` - Static data type of the item
    /// * `slot` - Where to place it; must accept the item's category
    ///
    /// # Errors
    ///
    /// * `InvalidMutation::UnknownItemType` - `type_id` is not in static data
    /// * `InvalidMutation::WrongCategory` - e.g. a drone offered as a module
    /// * `InvalidMutation::NotAModule` / `ItemNotFitted` - a charge's module
    ///   key does not name a fitted module
    ///
    /// The fit is unchanged on error.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use fitcalc::{Fit, Slot, StaticData};
    /// use fitcalc::item::{Category, Item, ItemTypeId};
    /// use std::sync::Arc;
    ///
    /// let mut data = StaticData::new();
    /// data.add_item(Item::new(ItemTypeId(1), "Rifter", "Frigate", Category::Ship));
    /// data.add_item(Item::new(ItemTypeId(2), "Warrior I", "Combat Drone", Category::Drone));
    ///
    /// let mut fit = Fit::new(Arc::new(data), ItemTypeId(1)).unwrap();
    /// assert!(fit.add_item(ItemTypeId(2), Slot::Module).is_err());
    /// let drone = fit.add_item(ItemTypeId(2), Slot::Drone).unwrap();
    /// assert_eq!(fit.drones()[0].key, drone);
    /// ```
    pub fn add_item(&mut self, type_id: ItemTypeId, slot: Slot) -> Result<ItemKey> {
        let item = checked_item(&self.data, type_id, slot)?;
        if let Slot::Charge { module } = slot {
            if self.module(module).is_none() {
                return Err(self.not_a_module(module).into());
            }
        }

        let key = self.allocate_key();
        let fitted = FittedItem::new(key, item);
        match slot {
            Slot::Ship => self.ship = fitted,
            Slot::Module => self.modules.push(FittedModule {
                fitted,
                state: ModuleState::Online,
                charge: None,
            }),
            Slot::Drone => self.drones.push(fitted),
            Slot::Charge { module } => {
                if let Some(m) = self.modules.iter_mut().find(|m| m.fitted.key == module) {
                    m.charge = Some(fitted);
                }
            }
            Slot::Implant => self.implants.push(fitted),
            Slot::Booster => self.boosters.push(fitted),
        }
        self.invalidate("add_item");
        Ok(key)
    }

    /// Fit a module in the given state.
    pub fn add_module(&mut self, type_id: ItemTypeId, state: ModuleState) -> Result<ItemKey> {
        let key = self.add_item(type_id, Slot::Module)?;
        self.toggle_module_state(key, state)?;
        Ok(key)
    }

    /// Project an item from another fit onto this one.
    ///
    /// `resolved` carries the item's attribute values as calculated in its
    /// own fit; they replace the static base values here.
    pub fn add_projected(
        &mut self,
        type_id: ItemTypeId,
        state: ModuleState,
        resolved: BTreeMap<AttrId, f64>,
    ) -> Result<ItemKey> {
        let item = self
            .data
            .item(type_id)
            .map_err(|_| InvalidMutation::UnknownItemType(type_id))?
            .clone();
        let key = self.allocate_key();
        let mut fitted = FittedItem::new(key, item);
        fitted.overrides = resolved;
        self.projected.push(ProjectedItem { fitted, state });
        self.invalidate("add_projected");
        Ok(key)
    }

    /// Add a fleet bonus source that applies when `ship_filter` matches.
    ///
    /// # Arguments
    ///
    /// * `type_id` - The bonus source, usually a command burst module
    /// * `ship_filter` - Ships the bonus reaches; checked against static data
    /// * `resolved` - The source's attribute values from the booster's own fit
    ///
    /// # Errors
    ///
    /// Returns `InvalidMutation::InvalidShipFilter` when the filter names a
    /// skill or group static data does not know, since such a filter could
    /// never match.
    pub fn add_gang_bonus(
        &mut self,
        type_id: ItemTypeId,
        ship_filter: Predicate,
        resolved: BTreeMap<AttrId, f64>,
    ) -> Result<ItemKey> {
        let item = self
            .data
            .item(type_id)
            .map_err(|_| InvalidMutation::UnknownItemType(type_id))?
            .clone();
        ship_filter
            .validate(&self.data)
            .map_err(InvalidMutation::InvalidShipFilter)?;
        let key = self.allocate_key();
        let mut fitted = FittedItem::new(key, item);
        fitted.overrides = resolved;
        self.gang.push(GangBonus {
            fitted,
            ship_filter,
        });
        self.invalidate("add_gang_bonus");
        Ok(key)
    }

    /// Remove an item. Removing a module also removes its charge;
    /// removing a skill untrains it.
    pub fn remove_item(&mut self, key: ItemKey) -> Result<()> {
        if self.ship.key == key {
            return Err(InvalidMutation::CannotRemoveShip.into());
        }

        let removed = remove_where(&mut self.modules, |m| m.fitted.key == key)
            || self
                .modules
                .iter_mut()
                .find(|m| m.charge.as_ref().is_some_and(|c| c.key == key))
                .map(|m| m.charge = None)
                .is_some()
            || remove_where(&mut self.drones, |d| d.key == key)
            || remove_where(&mut self.implants, |i| i.key == key)
            || remove_where(&mut self.boosters, |b| b.key == key)
            || remove_where(&mut self.projected, |p| p.fitted.key == key)
            || remove_where(&mut self.gang, |g| g.fitted.key == key)
            || {
                let before = self.character.skills.len();
                self.character.skills.retain(|_, s| s.fitted.key != key);
                self.character.skills.len() != before
            };

        if !removed {
            return Err(InvalidMutation::ItemNotFitted(key).into());
        }
        self.invalidate("remove_item");
        Ok(())
    }

    /// Set a skill's trained level (0 untrains it).
    ///
    /// # Errors
    ///
    /// Rejects levels above 5 and skills static data does not know.
    pub fn set_skill_level(&mut self, name: &str, level: u8) -> Result<()> {
        if level > 5 {
            return Err(InvalidMutation::SkillLevelOutOfRange {
                skill: name.to_string(),
                level,
            }
            .into());
        }
        let skill = self
            .data
            .skill(name)
            .map_err(|_| InvalidMutation::UnknownSkill(name.to_string()))?
            .clone();

        if level == 0 {
            self.character.skills.remove(name);
        } else if let Some(trained) = self.character.skills.get_mut(name) {
            trained.level = level;
        } else {
            let key = self.allocate_key();
            self.character.skills.insert(
                name.to_string(),
                TrainedSkill {
                    fitted: FittedItem::new(key, skill),
                    level,
                },
            );
        }
        self.invalidate("set_skill_level");
        Ok(())
    }

    /// Train every skill in the static data to `level`.
    pub fn train_all_skills(&mut self, level: u8) -> Result<()> {
        let names: Vec<String> = self.data.skill_names().map(str::to_string).collect();
        for name in names {
            self.set_skill_level(&name, level)?;
        }
        Ok(())
    }

    /// Change the state of a module or projected item.
    pub fn toggle_module_state(&mut self, key: ItemKey, state: ModuleState) -> Result<()> {
        if let Some(module) = self.modules.iter_mut().find(|m| m.fitted.key == key) {
            module.state = state;
        } else if let Some(projected) = self.projected.iter_mut().find(|p| p.fitted.key == key) {
            projected.state = state;
        } else {
            return Err(self.not_a_module(key).into());
        }
        self.invalidate("toggle_module_state");
        Ok(())
    }

    fn not_a_module(&self, key: ItemKey) -> InvalidMutation {
        if self.get(key).is_some() {
            InvalidMutation::NotAModule(key)
        } else {
            InvalidMutation::ItemNotFitted(key)
        }
    }

    fn allocate_key(&mut self) -> ItemKey {
        let key = ItemKey(self.next_key);
        self.next_key += 1;
        key
    }

    fn invalidate(&mut self, reason: &'static str) {
        let cache = self.cache.get_mut().unwrap_or_else(PoisonError::into_inner);
        debug!(reason, cached = cache.values.len(), "invalidating fit cache");
        *cache = CalcCache::default();
    }

    // ------------------------------------------------------------------
    // Calculation
    // ------------------------------------------------------------------

    /// Effective value of an attribute, or `None` if the item has no such
    /// attribute. Cached until the next mutation.
    ///
    /// The first query after a mutation runs the effect runner; later
    /// queries reuse its modifiers and any values already calculated.
    /// Safe to call from several threads at once.
    ///
    /// # Errors
    ///
    /// * `FitError::UnknownItem` - `item` is not in the fit
    /// * `FitError::DataIntegrity` - static data is broken for this query,
    ///   for instance a dependency cycle or a magnitude attribute the
    ///   source item lacks. Nothing is cached for a failed query.
    pub fn effective_attribute(
        &self,
        item: ItemKey,
        attribute: impl Into<AttrId>,
    ) -> Result<Option<f64>> {
        let key = AttrKey::new(item, attribute);
        if self.get(item).is_none() {
            return Err(FitError::UnknownItem(item));
        }
        if let Some(value) = self.read_cache().values.get(&key) {
            return Ok(*value);
        }

        let pass = self.pass()?;
        let (value, computed) = {
            let cache = self.read_cache();
            let mut calculator = AttributeCalculator::new(self, &pass, &cache.values);
            let value = calculator.resolve(&key)?.map(|r| r.value);
            (value, calculator.into_values())
        };

        let mut cache = self.cache.write().unwrap_or_else(PoisonError::into_inner);
        if cache.pass.as_ref().is_some_and(|p| Arc::ptr_eq(p, &pass)) {
            cache.values.extend(computed);
        }
        Ok(value)
    }

    /// Like [`Fit::effective_attribute`], but absence is a data error.
    pub fn require_attribute(&self, item: ItemKey, attribute: impl Into<AttrId>) -> Result<f64> {
        let attribute = attribute.into();
        self.effective_attribute(item, attribute.clone())?
            .ok_or_else(|| DataIntegrityError::MissingAttribute { item, attribute }.into())
    }

    /// Full breakdown of how an attribute was calculated.
    ///
    /// Every applied modifier is listed in application order with its
    /// magnitude, stacking penalty and the running value after it.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use fitcalc::{Fit, StaticData};
    /// use fitcalc::item::{Category, Item, ItemTypeId};
    /// use std::sync::Arc;
    ///
    /// let mut data = StaticData::new();
    /// data.add_item(Item::new(ItemTypeId(1), "Rifter", "Frigate", Category::Ship)
    ///     .with_attribute("agility", 3.2));
    /// let fit = Fit::new(Arc::new(data), ItemTypeId(1)).unwrap();
    ///
    /// let resolved = fit.resolve_attribute(fit.ship().key, "agility").unwrap().unwrap();
    /// assert_eq!(resolved.base, Some(3.2));
    /// assert!(resolved.modifiers.is_empty());
    /// ```
    pub fn resolve_attribute(
        &self,
        item: ItemKey,
        attribute: impl Into<AttrId>,
    ) -> Result<Option<ResolvedAttribute>> {
        let key = AttrKey::new(item, attribute);
        if self.get(item).is_none() {
            return Err(FitError::UnknownItem(item));
        }
        let pass = self.pass()?;
        let cache = self.read_cache();
        let mut calculator = AttributeCalculator::new(self, &pass, &cache.values);
        Ok(calculator.resolve(&key)?)
    }

    /// Modifiers from the current effect runner pass.
    pub fn modifiers(&self) -> Result<Arc<RunnerPass>> {
        self.pass()
    }

    /// Convenience accessor for the modifier set of the current pass.
    pub fn modifier_count(&self) -> Result<usize> {
        Ok(self.pass()?.modifiers.len())
    }

    fn pass(&self) -> Result<Arc<RunnerPass>> {
        if let Some(pass) = &self.read_cache().pass {
            return Ok(Arc::clone(pass));
        }
        let pass = Arc::new(EffectRunner::new(self).run()?);
        let mut cache = self.cache.write().unwrap_or_else(PoisonError::into_inner);
        // Another reader may have finished first; keep theirs so cached
        // values stay consistent with the stored pass.
        Ok(Arc::clone(cache.pass.get_or_insert(pass)))
    }

    fn read_cache(&self) -> RwLockReadGuard<'_, CalcCache> {
        self.cache.read().unwrap_or_else(PoisonError::into_inner)
    }
}

fn checked_item(data: &StaticData, type_id: ItemTypeId, slot: Slot) -> Result<Arc<Item>> {
    let item = data
        .item(type_id)
        .map_err(|_| InvalidMutation::UnknownItemType(type_id))?;
    if !slot.accepts(item.category) {
        return Err(InvalidMutation::WrongCategory {
            item: item.name.clone(),
            scope: slot.to_string(),
        }
        .into());
    }
    Ok(Arc::clone(item))
}

fn remove_where<T>(items: &mut Vec<T>, pred: impl Fn(&T) -> bool) -> bool {
    match items.iter().position(pred) {
        Some(pos) => {
            items.remove(pos);
            true
        }
        None => false,
    }
}
