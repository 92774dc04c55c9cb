mod common;

use common::{approx_eq, fit, type_id};
use fitcalc::item::{Category, Item, ItemTypeId};
use fitcalc::stacking::{stack_group, StackEntry};
use fitcalc::*;
use proptest::prelude::*;
use std::sync::Arc;

const ODI: [&str; 3] = [
    "Overdrive Injector System I",
    "Limited Overdrive Injector System I",
    "Basic Overdrive Injector System",
];

proptest! {
    /// With no effects anywhere, the effective value is the base value.
    #[test]
    fn prop_no_modifiers_is_identity(base in -1.0e6f64..1.0e6) {
        let mut data = StaticData::new();
        data.add_item(
            Item::new(ItemTypeId(1), "Hull", "Frigate", Category::Ship)
                .with_attribute("mass", base),
        );
        let fit = Fit::new(Arc::new(data), ItemTypeId(1)).unwrap();
        prop_assert_eq!(fit.effective_attribute(fit.ship().key, "mass").unwrap(), Some(base));
    }

    /// Penalties never grow along a chain, and stronger entries take
    /// earlier positions.
    #[test]
    fn prop_penalty_chain_is_monotonic(strengths in prop::collection::vec(-0.9f64..2.0, 1..8)) {
        let entries: Vec<StackEntry> = strengths
            .iter()
            .enumerate()
            .map(|(i, s)| StackEntry { strength: *s, penalized: true, order: i as u32 })
            .collect();
        let applied = stack_group(&entries, &EngineConfig::default());

        prop_assert_eq!(applied.len(), entries.len());
        prop_assert_eq!(applied[0].penalty, 1.0);
        for pair in applied.windows(2) {
            prop_assert!(pair[0].penalty >= pair[1].penalty);
            prop_assert!(
                entries[pair[0].entry].strength.abs() >= entries[pair[1].entry].strength.abs()
            );
        }
    }

    /// The composed factor does not depend on registration order.
    #[test]
    fn prop_stacking_ignores_registration_order(
        strengths in prop::collection::vec(0.0f64..1.0, 1..6),
    ) {
        let config = EngineConfig::default();
        let product = |values: &[f64]| -> f64 {
            let entries: Vec<StackEntry> = values
                .iter()
                .enumerate()
                .map(|(i, s)| StackEntry { strength: *s, penalized: true, order: i as u32 })
                .collect();
            stack_group(&entries, &config).iter().map(|a| a.factor).product()
        };
        let mut reversed = strengths.clone();
        reversed.reverse();
        prop_assert!(approx_eq(product(&strengths), product(&reversed)));
    }

    /// Two queries without a mutation in between give identical results.
    #[test]
    fn prop_queries_are_idempotent(
        navigation in 0u8..=5,
        command in 0u8..=5,
        modules in prop::collection::vec(0usize..3, 0..5),
    ) {
        let mut fit = fit("Rifter");
        fit.set_skill_level("Navigation", navigation).unwrap();
        fit.set_skill_level("Spaceship Command", command).unwrap();
        for m in modules {
            fit.add_item(type_id(ODI[m]), Slot::Module).unwrap();
        }
        let ship = fit.ship().key;

        let first = fit.effective_attribute(ship, "maxVelocity").unwrap();
        let second = fit.effective_attribute(ship, "maxVelocity").unwrap();
        prop_assert_eq!(first.map(f64::to_bits), second.map(f64::to_bits));

        let agility = fit.resolve_attribute(ship, "agility").unwrap().unwrap();
        prop_assert_eq!(Some(agility.value), fit.effective_attribute(ship, "agility").unwrap());
    }
}
