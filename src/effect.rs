//! Effect definitions.
//!
//! An effect is a named, declarative unit bound to an item type or group.
//! Each `EffectAction` says which items it hits, which attributes, with what
//! operation and how large; the runner turns actions into `Modifier`s.
//! Actions are a closed set of data, so static data can carry them as JSON.

use crate::attr_id::AttrId;
use crate::modifier::Operation;
use crate::predicate::Predicate;
use serde::{Deserialize, Serialize};

/// When an effect is allowed to run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EffectKind {
    /// Always on while the item is present (modules: online or better).
    Passive,
    /// Modules in the active state.
    Active,
    /// Modules that are overloaded.
    Overload,
    /// Only when the carrying item is projected from another fit.
    Projected,
    /// Only when the carrying item is a fleet bonus source.
    Gang,
}

/// Item collections a filtered boost can sweep over.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Scope {
    Ship,
    Modules,
    Drones,
    Charges,
    Implants,
    Boosters,
    Skills,
}

/// Which items an action modifies.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Target {
    /// The item carrying the effect.
    Holder,
    /// The fit's ship.
    Ship,
    /// The module a charge is loaded into.
    Carrier,
    /// Every item in `scope` matching `predicate`.
    Filtered { scope: Scope, predicate: Predicate },
}

/// Where the size of a modifier comes from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MagnitudeSpec {
    /// The carrying item's effective value of this attribute.
    Attribute(AttrId),
    Constant(f64),
}

/// How the magnitude scales with skill levels.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LevelScaling {
    #[default]
    None,
    /// The skill's own level in skill context, 1 elsewhere.
    ContainerLevel,
    /// The character's trained level in the named skill.
    Skill(String),
}

/// Whether modifiers from an action take part in stacking penalties.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StackingPolicy {
    /// Decided by the source's origin and the engine configuration.
    #[default]
    Auto,
    Penalized,
    Exempt,
}

/// One declarative modification.
///
/// # Examples
///
/// The Coercer's destroyer bonus to small energy turret tracking:
///
/// ```rust
/// use fitcalc::effect::{EffectAction, Scope};
/// use fitcalc::Predicate;
///
/// let action = EffectAction::boost("trackingSpeed")
///     .filtered(Scope::Modules, Predicate::requires_skill("Small Energy Turret"))
///     .by_attribute("shipBonusAD2")
///     .per_level_of("Amarr Destroyer");
///
/// assert_eq!(action.attributes.len(), 1);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EffectAction {
    pub target: Target,
    pub attributes: Vec<AttrId>,
    pub operation: Operation,
    pub magnitude: MagnitudeSpec,
    #[serde(default)]
    pub scaling: LevelScaling,
    #[serde(default)]
    pub stacking: StackingPolicy,
    /// Explicit stacking group; defaults to the attribute's own group.
    #[serde(default)]
    pub group: Option<String>,
}

impl EffectAction {
    /// Start a percentage boost of `attribute` on the holder, sized 0.
    pub fn boost(attribute: impl Into<AttrId>) -> Self {
        Self {
            target: Target::Holder,
            attributes: vec![attribute.into()],
            operation: Operation::PercentAdd,
            magnitude: MagnitudeSpec::Constant(0.0),
            scaling: LevelScaling::None,
            stacking: StackingPolicy::Auto,
            group: None,
        }
    }

    /// Apply the same modification to another attribute as well.
    pub fn and(mut self, attribute: impl Into<AttrId>) -> Self {
        self.attributes.push(attribute.into());
        self
    }

    /// Set which items the action modifies.
    pub fn on(mut self, target: Target) -> Self {
        self.target = target;
        self
    }

    /// Modify the fit's ship.
    pub fn on_ship(self) -> Self {
        self.on(Target::Ship)
    }

    /// Modify every item in `scope` that `predicate` accepts.
    ///
    /// The predicate is checked against static data each time the action
    /// runs; naming an unknown group or skill fails the pass.
    pub fn filtered(self, scope: Scope, predicate: Predicate) -> Self {
        self.on(Target::Filtered { scope, predicate })
    }

    /// Replace the default `PercentAdd` operation.
    pub fn with_operation(mut self, operation: Operation) -> Self {
        self.operation = operation;
        self
    }

    /// Constant magnitude.
    pub fn by(mut self, value: f64) -> Self {
        self.magnitude = MagnitudeSpec::Constant(value);
        self
    }

    /// Read the magnitude from the carrying item's effective value of
    /// `attribute`. The carrying item must define it.
    pub fn by_attribute(mut self, attribute: impl Into<AttrId>) -> Self {
        self.magnitude = MagnitudeSpec::Attribute(attribute.into());
        self
    }

    /// Scale by the carrying skill's level.
    ///
    /// Outside skill context the scale is 1, so the same effect can be
    /// bound to a skill and to a module.
    pub fn per_container_level(mut self) -> Self {
        self.scaling = LevelScaling::ContainerLevel;
        self
    }

    /// Scale by the character's level in `skill` (ship hull bonuses).
    pub fn per_level_of(mut self, skill: impl Into<String>) -> Self {
        self.scaling = LevelScaling::Skill(skill.into());
        self
    }

    /// Force the stacking policy instead of deriving it from the source.
    pub fn penalized(mut self, penalized: bool) -> Self {
        self.stacking = if penalized {
            StackingPolicy::Penalized
        } else {
            StackingPolicy::Exempt
        };
        self
    }

    /// Put the action's modifiers in a named stacking group.
    ///
    /// Penalty chains form per group; different groups compose without
    /// penalizing each other.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use fitcalc::effect::EffectAction;
    ///
    /// let action = EffectAction::boost("maxVelocity").on_ship().by(10.0).in_group("propulsion");
    /// assert_eq!(action.group.as_deref(), Some("propulsion"));
    /// ```
    pub fn in_group(mut self, group: impl Into<String>) -> Self {
        self.group = Some(group.into());
        self
    }
}

/// A named effect.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Effect {
    pub name: String,
    pub kind: EffectKind,
    pub actions: Vec<EffectAction>,
}

impl Effect {
    /// Create an effect with no actions.
    pub fn new(name: impl Into<String>, kind: EffectKind) -> Self {
        Self {
            name: name.into(),
            kind,
            actions: Vec::new(),
        }
    }

    /// Shorthand for a `Passive` effect.
    pub fn passive(name: impl Into<String>) -> Self {
        Self::new(name, EffectKind::Passive)
    }

    /// Append an action; actions run in the order added.
    pub fn with_action(mut self, action: EffectAction) -> Self {
        self.actions.push(action);
        self
    }
}
