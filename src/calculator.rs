//! Attribute calculator.
//!
//! Resolves `(item, attribute)` pairs against a runner pass. Dependencies
//! named by attribute-sized magnitudes are resolved first, in topological
//! order of the pass graph restricted to what the query needs.
//!
//! Per attribute:
//!
//! 1. start from the base value (override, static value, declared default);
//! 2. the highest ranked `Assign` replaces it;
//! 3. `FlatAdd` modifiers are summed in;
//! 4. `PercentAdd` and `Multiply` modifiers are grouped by stacking group,
//!    penalized within each group, and composed multiplicatively.

use crate::error::{DataIntegrityError, Result};
use crate::fit::Fit;
use crate::item::AttrKey;
use crate::modifier::{Magnitude, Modifier, Operation};
use crate::resolved::ResolvedAttribute;
use crate::runner::RunnerPass;
use crate::stacking::{stack_group, StackEntry};
use std::collections::{BTreeMap, HashMap};
use tracing::{trace, warn};

/// Fractional strength of a multiplicative modifier.
fn strength(operation: Operation, magnitude: f64) -> f64 {
    match operation {
        Operation::PercentAdd => magnitude / 100.0,
        Operation::Multiply => magnitude - 1.0,
        Operation::Assign | Operation::FlatAdd => 0.0,
    }
}

/// Resolves attributes for one fit against one runner pass.
///
/// `seed` holds values already calculated for the same pass; new results
/// collect separately and are handed back by [`into_values`](Self::into_values).
pub struct AttributeCalculator<'a> {
    fit: &'a Fit,
    pass: &'a RunnerPass,
    seed: &'a HashMap<AttrKey, Option<f64>>,
    values: HashMap<AttrKey, Option<f64>>,
}

impl<'a> AttributeCalculator<'a> {
    pub fn new(
        fit: &'a Fit,
        pass: &'a RunnerPass,
        seed: &'a HashMap<AttrKey, Option<f64>>,
    ) -> Self {
        Self {
            fit,
            pass,
            seed,
            values: HashMap::new(),
        }
    }

    /// Resolve `key` and everything it depends on.
    ///
    /// Returns `Ok(None)` when the item has no such attribute.
    pub fn resolve(&mut self, key: &AttrKey) -> Result<Option<ResolvedAttribute>> {
        let subgraph = self.pass.graph.subgraph_for_targets(std::slice::from_ref(key));
        let order = subgraph.topological_sort()?;

        for dependency in order.iter().filter(|k| *k != key) {
            if self.lookup(dependency).is_some() {
                continue;
            }
            let value = self.calculate(dependency)?.map(|r| r.value);
            self.values.insert(dependency.clone(), value);
        }

        let resolved = self.calculate(key)?;
        self.values
            .insert(key.clone(), resolved.as_ref().map(|r| r.value));
        Ok(resolved)
    }

    /// Values calculated by this calculator, excluding the seed.
    pub fn into_values(self) -> HashMap<AttrKey, Option<f64>> {
        self.values
    }

    fn lookup(&self, key: &AttrKey) -> Option<Option<f64>> {
        self.values.get(key).or_else(|| self.seed.get(key)).copied()
    }

    fn magnitude(&self, modifier: &Modifier) -> Result<f64> {
        match &modifier.magnitude {
            Magnitude::Fixed(value) => Ok(*value),
            Magnitude::Attribute { source, scale } => match self.lookup(source) {
                Some(Some(value)) => Ok(value * scale),
                Some(None) => Err(DataIntegrityError::MissingAttribute {
                    item: source.item,
                    attribute: source.attribute.clone(),
                }
                .into()),
                None => Err(DataIntegrityError::MissingDependency(source.clone()).into()),
            },
        }
    }

    fn calculate(&self, key: &AttrKey) -> Result<Option<ResolvedAttribute>> {
        let base = self.fit.base_value(key)?;
        let modifiers = self.pass.modifiers.for_target(key);
        trace!(attribute = %key, ?base, modifiers = modifiers.len(), "calculating attribute");

        let config = self.fit.config();
        let assign = modifiers
            .iter()
            .filter(|m| m.operation == Operation::Assign)
            .max_by(|a, b| {
                config
                    .assign_rank(a.source.class)
                    .cmp(&config.assign_rank(b.source.class))
                    .then(a.order.cmp(&b.order))
            });

        if base.is_none() && assign.is_none() {
            if !modifiers.is_empty() {
                warn!(
                    attribute = %key,
                    dropped = modifiers.len(),
                    "modifiers target an attribute the item does not have"
                );
            }
            return Ok(None);
        }

        let mut resolved = ResolvedAttribute::new(key.clone(), base);
        let mut value = resolved.value;

        if let Some(modifier) = assign {
            let magnitude = self.magnitude(modifier)?;
            value = magnitude;
            let description = modifier.description(magnitude);
            resolved.push(description, Operation::Assign, magnitude, 1.0, value);
        }

        for modifier in modifiers.iter().filter(|m| m.operation == Operation::FlatAdd) {
            let magnitude = self.magnitude(modifier)?;
            value += magnitude;
            let description = modifier.description(magnitude);
            resolved.push(description, Operation::FlatAdd, magnitude, 1.0, value);
        }

        let mut groups: BTreeMap<Option<&str>, Vec<(&Modifier, f64)>> = BTreeMap::new();
        for modifier in modifiers.iter().filter(|m| m.operation.is_multiplicative()) {
            let magnitude = self.magnitude(modifier)?;
            groups
                .entry(modifier.stacking_group.as_deref())
                .or_default()
                .push((modifier, magnitude));
        }

        for members in groups.values() {
            let entries: Vec<StackEntry> = members
                .iter()
                .map(|(modifier, magnitude)| StackEntry {
                    strength: strength(modifier.operation, *magnitude),
                    penalized: modifier.penalized,
                    order: modifier.order,
                })
                .collect();

            for applied in stack_group(&entries, config) {
                let (modifier, magnitude) = members[applied.entry];
                value *= applied.factor;
                resolved.push(
                    modifier.description(magnitude),
                    modifier.operation,
                    magnitude,
                    applied.penalty,
                    value,
                );
            }
        }

        Ok(Some(resolved))
    }
}
