#![allow(dead_code)]

use fitcalc::item::{Category, ItemTypeId};
use fitcalc::{Fit, Slot, StaticData};
use std::sync::{Arc, OnceLock};

/// The shared static data fixture.
pub fn data() -> Arc<StaticData> {
    static DATA: OnceLock<Arc<StaticData>> = OnceLock::new();
    let data = DATA.get_or_init(|| {
        let json = include_str!("../fixtures/static_data.json");
        Arc::new(StaticData::from_json(json).expect("fixture static data is valid"))
    });
    Arc::clone(data)
}

pub fn type_id(name: &str) -> ItemTypeId {
    data()
        .item_by_name(name)
        .unwrap_or_else(|| panic!("{name} missing from fixture"))
        .type_id
}

pub fn fit(ship: &str) -> Fit {
    Fit::new(data(), type_id(ship)).unwrap()
}

pub fn approx_eq(a: f64, b: f64) -> bool {
    (a - b).abs() < 1e-9
}

#[track_caller]
pub fn assert_approx(actual: f64, expected: f64) {
    assert!(
        approx_eq(actual, expected),
        "expected {expected}, got {actual}"
    );
}

/// Effective ship attribute with one skill trained.
pub fn ship_attr(attribute: &str, skill: (&str, u8)) -> f64 {
    let mut fit = fit("Rifter");
    fit.set_skill_level(skill.0, skill.1).unwrap();
    fit.require_attribute(fit.ship().key, attribute).unwrap()
}

/// Effective attribute of an item fitted to a Rifter with one skill trained.
pub fn item_attr(attribute: &str, item: &str, skill: (&str, u8)) -> f64 {
    let mut fit = fit("Rifter");
    let id = type_id(item);
    let slot = match data().item(id).unwrap().category {
        Category::Drone => Slot::Drone,
        Category::Implant => Slot::Implant,
        Category::Booster => Slot::Booster,
        _ => Slot::Module,
    };
    let key = fit.add_item(id, slot).unwrap();
    fit.set_skill_level(skill.0, skill.1).unwrap();
    fit.require_attribute(key, attribute).unwrap()
}
