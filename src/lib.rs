//! # fitcalc - Ship Fitting Attribute Engine
//!
//! Computes the effective attributes of a ship and everything fitted to it
//! after every skill, module, ship trait, implant, projected and fleet
//! bonus has been applied:
//! - **Declarative** effects: static data binds effects to item types and
//!   groups; effects are plain data, not callbacks
//! - **Deterministic** ordering: one forward pass in a fixed order
//! - **Stacking penalties** with diminishing returns per stacking group
//! - **Dependency-ordered** resolution over a petgraph DAG
//! - **Cached** until the next fit mutation
//!
//! ## Pipeline
//!
//! ```text
//! [StaticData] → [EffectRunner] → [Modifier]s + [AttrGraph]
//! → [AttributeCalculator] → value
//! ```
//!
//! 1. The **runner** executes every effect of every present item and emits
//!    modifiers against `(item, attribute)` pairs
//! 2. Modifiers whose size reads another attribute become graph edges
//! 3. The **calculator** resolves the requested attribute and its
//!    dependencies in topological order
//!
//! ## Example
//!
//! ```rust
//! use fitcalc::*;
//! use fitcalc::item::{Category, Item, ItemTypeId};
//! use std::sync::Arc;
//!
//! let mut data = StaticData::new();
//! data.add_effect(Effect::passive("navigationVelocity")
//!     .with_action(EffectAction::boost("maxVelocity")
//!         .on_ship()
//!         .by_attribute("velocityBonus")
//!         .per_container_level()));
//! data.add_item(Item::new(ItemTypeId(587), "Rifter", "Frigate", Category::Ship)
//!     .with_attribute("maxVelocity", 400.0));
//! data.add_item(Item::new(ItemTypeId(3449), "Navigation", "Navigation", Category::Skill)
//!     .with_attribute("velocityBonus", 5.0)
//!     .with_effect("navigationVelocity"));
//!
//! let mut fit = Fit::new(Arc::new(data), ItemTypeId(587)).unwrap();
//! fit.set_skill_level("Navigation", 4).unwrap();
//!
//! let ship = fit.ship().key;
//! let velocity = fit.effective_attribute(ship, "maxVelocity").unwrap().unwrap();
//! assert!((velocity - 480.0).abs() < 1e-9); // 400 * (1 + 4 * 5%)
//! ```
//!
//! ## Modules
//!
//! - [`data`] - Static data and loaders
//! - [`effect`] - Effect definitions
//! - [`predicate`] - Item filters for filtered boosts
//! - [`fit`] - The fit aggregate and its mutations
//! - [`runner`] - Effect runner
//! - [`calculator`] - Attribute calculator
//! - [`stacking`] - Stacking penalties
//! - [`graph`] - Attribute dependency graph
//! - [`shared`] - Cross-thread access and parallel recomputation
//! - [`error`] - Error types

pub mod attr_id;
pub mod calculator;
pub mod config;
pub mod context;
pub mod data;
pub mod effect;
pub mod error;
pub mod fit;
pub mod graph;
pub mod item;
pub mod modifier;
pub mod predicate;
pub mod resolved;
pub mod runner;
pub mod shared;
pub mod stacking;

// Re-export main types for convenience
pub use attr_id::AttrId;
pub use config::EngineConfig;
pub use context::{EffectContext, SourceClass};
pub use data::{JsonLoader, StaticData, StaticDataLoader};
pub use error::{DataIntegrityError, FitError, InvalidMutation};
pub use fit::{Fit, ModuleState, Slot};
pub use predicate::Predicate;
pub use resolved::{AppliedModifier, ResolvedAttribute};
pub use shared::{par_map_fits, recompute_fits, SharedFit};

// Re-export effect definitions
pub use effect::{
    Effect, EffectAction, EffectKind, LevelScaling, MagnitudeSpec, Scope, StackingPolicy, Target,
};
pub use modifier::{Magnitude, Modifier, Operation};
