//! The effect runner.
//!
//! One forward pass over the fit: every effect bound to every present item
//! runs once, in a fixed order, and emits modifiers. Magnitudes that read
//! attributes are left as references; the pass records those reads as
//! edges of an [`AttrGraph`] so the calculator can order its work.
//!
//! Order of execution:
//!
//! 1. ship traits
//! 2. character skills, by name
//! 3. modules, in fitting order
//! 4. drones
//! 5. charges
//! 6. implants, then boosters
//! 7. projected items
//! 8. gang bonuses

use crate::attr_id::AttrId;
use crate::context::{EffectContext, SourceClass};
use crate::effect::{
    Effect, EffectAction, EffectKind, LevelScaling, MagnitudeSpec, Scope, StackingPolicy, Target,
};
use crate::error::{DataIntegrityError, Result};
use crate::fit::{Fit, FittedItem, ModuleState};
use crate::graph::AttrGraph;
use crate::item::{AttrKey, ItemKey};
use crate::modifier::{Magnitude, Modifier, ModifierSet, ModifierSource, Operation};
use crate::predicate::Predicate;
use std::sync::Arc;
use tracing::{debug, trace};

/// Output of one runner pass.
#[derive(Debug, Default)]
pub struct RunnerPass {
    pub modifiers: ModifierSet,
    /// Edges from each modified attribute to the attributes its
    /// magnitudes read.
    pub graph: AttrGraph,
}

/// Everything a single action stamps onto each modifier it emits.
#[derive(Debug, Clone)]
pub struct Boost {
    pub source: ModifierSource,
    pub operation: Operation,
    pub magnitude: Magnitude,
    pub group: Option<String>,
    /// Penalty policy of the source; stackable attributes override it.
    pub penalized: bool,
}

/// Effect kinds a module runs in each state.
fn kinds_for_state(state: ModuleState) -> &'static [EffectKind] {
    match state {
        ModuleState::Offline => &[],
        ModuleState::Online => &[EffectKind::Passive],
        ModuleState::Active => &[EffectKind::Passive, EffectKind::Active],
        ModuleState::Overloaded => &[EffectKind::Passive, EffectKind::Active, EffectKind::Overload],
    }
}

const PASSIVE: &[EffectKind] = &[EffectKind::Passive];

/// Runs every effect of a fit and collects the modifiers.
///
/// # Examples
///
/// ```rust
/// use fitcalc::{Fit, StaticData};
/// use fitcalc::effect::{Effect, EffectAction};
/// use fitcalc::item::{Category, Item, ItemTypeId};
/// use fitcalc::runner::EffectRunner;
/// use std::sync::Arc;
///
/// let mut data = StaticData::new();
/// data.add_effect(Effect::passive("velocityBonus")
///     .with_action(EffectAction::boost("maxVelocity").on_ship().by(5.0).per_container_level()));
/// data.add_item(Item::new(ItemTypeId(1), "Rifter", "Frigate", Category::Ship)
///     .with_attribute("maxVelocity", 365.0));
/// data.add_item(Item::new(ItemTypeId(2), "Navigation", "Navigation", Category::Skill)
///     .with_effect("velocityBonus"));
///
/// let mut fit = Fit::new(Arc::new(data), ItemTypeId(1)).unwrap();
/// fit.set_skill_level("Navigation", 3).unwrap();
///
/// let pass = EffectRunner::new(&fit).run().unwrap();
/// assert_eq!(pass.modifiers.len(), 1);
/// ```
pub struct EffectRunner<'a> {
    fit: &'a Fit,
    out: ModifierSet,
}

impl<'a> EffectRunner<'a> {
    /// Prepare a pass over `fit`. Nothing runs until [`run`](Self::run).
    pub fn new(fit: &'a Fit) -> Self {
        Self {
            fit,
            out: ModifierSet::new(),
        }
    }

    /// Execute the pass.
    pub fn run(mut self) -> Result<RunnerPass> {
        let fit = self.fit;

        self.run_item(fit.ship(), SourceClass::ShipTrait, EffectContext::SelfItem, PASSIVE)?;

        for skill in fit.character().skills() {
            if skill.level == 0 {
                continue;
            }
            let context = EffectContext::Skill { level: skill.level };
            self.run_item(&skill.fitted, SourceClass::Skill, context, PASSIVE)?;
        }

        for module in fit.modules() {
            let kinds = kinds_for_state(module.state);
            self.run_item(&module.fitted, SourceClass::Module, EffectContext::SelfItem, kinds)?;
        }

        for drone in fit.drones() {
            self.run_item(drone, SourceClass::Module, EffectContext::SelfItem, PASSIVE)?;
        }

        for module in fit.modules() {
            if module.state < ModuleState::Online {
                continue;
            }
            if let Some(charge) = &module.charge {
                self.run_item(charge, SourceClass::Module, EffectContext::SelfItem, PASSIVE)?;
            }
        }

        for implant in fit.implants().iter().chain(fit.boosters()) {
            self.run_item(implant, SourceClass::Implant, EffectContext::SelfItem, PASSIVE)?;
        }

        for projected in fit.projected() {
            if projected.state < ModuleState::Active {
                continue;
            }
            self.run_item(
                &projected.fitted,
                SourceClass::Projected,
                EffectContext::Projected,
                &[EffectKind::Projected],
            )?;
        }

        let ship = &fit.ship().item;
        for gang in fit.gang_bonuses() {
            if !gang.ship_filter.matches(ship) {
                trace!(source = %gang.fitted.key, "gang bonus filtered out by ship");
                continue;
            }
            self.run_item(
                &gang.fitted,
                SourceClass::Gang,
                EffectContext::Gang,
                &[EffectKind::Gang],
            )?;
        }

        let mut graph = AttrGraph::new();
        for modifier in self.out.iter() {
            graph.add_node(modifier.target.clone());
            if let Some(dependency) = modifier.magnitude.dependency() {
                graph.add_edge(modifier.target.clone(), dependency.clone());
            }
        }

        debug!(
            ship = %fit.ship().item.name,
            modifiers = self.out.len(),
            attributes = graph.len(),
            "effect runner pass complete"
        );
        Ok(RunnerPass {
            modifiers: self.out,
            graph,
        })
    }

    fn run_item(
        &mut self,
        fitted: &FittedItem,
        class: SourceClass,
        context: EffectContext,
        kinds: &[EffectKind],
    ) -> Result<()> {
        for effect in self.fit.data().effects_for(&fitted.item)? {
            if !kinds.contains(&effect.kind) {
                continue;
            }
            trace!(effect = %effect.name, item = %fitted.key, %context, "running effect");
            for action in &effect.actions {
                self.run_action(fitted, &effect, action, class, context)?;
            }
        }
        Ok(())
    }

    fn run_action(
        &mut self,
        fitted: &FittedItem,
        effect: &Effect,
        action: &EffectAction,
        class: SourceClass,
        context: EffectContext,
    ) -> Result<()> {
        let level = self.level(&action.scaling, context)?;
        if level == 0 {
            return Ok(());
        }
        let scale = f64::from(level);

        let magnitude = match &action.magnitude {
            MagnitudeSpec::Constant(value) => Magnitude::Fixed(value * scale),
            MagnitudeSpec::Attribute(attribute) => {
                let source = AttrKey::new(fitted.key, attribute.clone());
                if self.fit.base_value(&source)?.is_none() {
                    return Err(DataIntegrityError::MissingAttribute {
                        item: fitted.key,
                        attribute: attribute.clone(),
                    }
                    .into());
                }
                Magnitude::Attribute { source, scale }
            }
        };

        let config = self.fit.config();
        let boost = Boost {
            source: ModifierSource {
                item: fitted.key,
                effect: Arc::from(effect.name.as_str()),
                class,
                context,
            },
            operation: action.operation,
            magnitude,
            group: action.group.clone(),
            penalized: match action.stacking {
                StackingPolicy::Penalized => true,
                StackingPolicy::Exempt => false,
                StackingPolicy::Auto => config.penalized_by_default(class),
            },
        };

        for attribute in &action.attributes {
            match &action.target {
                Target::Holder => self.boost_item(fitted.key, attribute, &boost),
                Target::Ship => self.boost_item(self.fit.ship().key, attribute, &boost),
                Target::Carrier => match self.fit.carrier_of(fitted.key) {
                    Some(module) => self.boost_item(module.fitted.key, attribute, &boost),
                    None => trace!(effect = %effect.name, item = %fitted.key, "no carrier module"),
                },
                Target::Filtered { scope, predicate } => {
                    self.filtered_boost(*scope, predicate, attribute, &boost)?;
                }
            }
        }
        Ok(())
    }

    /// Skill level that scales an action in `context`.
    fn level(&self, scaling: &LevelScaling, context: EffectContext) -> Result<u8> {
        Ok(match scaling {
            LevelScaling::None => 1,
            LevelScaling::ContainerLevel => context.container_level(),
            LevelScaling::Skill(name) => {
                self.fit.data().skill(name)?;
                if context.is_external() {
                    1
                } else {
                    self.fit.skill_level(name)
                }
            }
        })
    }

    /// Apply `boost` to `attribute` of every item in `scope` matching
    /// `predicate`. Returns how many items were hit; zero is not an error.
    pub fn filtered_boost(
        &mut self,
        scope: Scope,
        predicate: &Predicate,
        attribute: &AttrId,
        boost: &Boost,
    ) -> Result<usize> {
        predicate.validate(self.fit.data())?;

        let targets: Vec<ItemKey> = self
            .fit
            .scope_items(scope)
            .into_iter()
            .filter(|fitted| predicate.matches(&fitted.item))
            .map(|fitted| fitted.key)
            .collect();
        for &key in &targets {
            self.boost_item(key, attribute, boost);
        }
        trace!(?scope, %attribute, hits = targets.len(), "filtered boost");
        Ok(targets.len())
    }

    /// Emit one modifier against `attribute` of `item`.
    pub fn boost_item(&mut self, item: ItemKey, attribute: &AttrId, boost: &Boost) {
        let penalized = boost.penalized && !self.fit.data().is_stackable(attribute);
        self.out.push(Modifier {
            target: AttrKey::new(item, attribute.clone()),
            operation: boost.operation,
            magnitude: boost.magnitude.clone(),
            stacking_group: boost.group.clone(),
            penalized,
            source: boost.source.clone(),
            order: 0,
        });
    }
}
