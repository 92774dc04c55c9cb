mod common;

use common::{assert_approx, data, fit, type_id};
use fitcalc::*;
use std::sync::Arc;
use std::thread;

/// Test concurrent readers of one fit share the cache and agree.
#[test]
fn test_concurrent_reads_agree() {
    let mut fit = fit("Rifter");
    fit.train_all_skills(4).unwrap();
    fit.add_item(type_id("Overdrive Injector System I"), Slot::Module).unwrap();
    let fit = Arc::new(fit);
    let ship = fit.ship().key;

    let handles: Vec<_> = (0..8)
        .map(|_| {
            let fit = Arc::clone(&fit);
            thread::spawn(move || fit.require_attribute(ship, "maxVelocity").unwrap())
        })
        .collect();
    let values: Vec<f64> = handles.into_iter().map(|h| h.join().unwrap()).collect();

    assert!(values.windows(2).all(|w| w[0].to_bits() == w[1].to_bits()));
    assert_approx(values[0], 365.0 * 1.2 * 1.1);
}

/// Test a writer and readers on a shared fit: every read sees a whole state.
#[test]
fn test_shared_fit_reads_during_mutation() {
    let shared = SharedFit::new(fit("Rifter"));
    let ship = shared.read().ship().key;

    let writer = {
        let shared = shared.clone();
        thread::spawn(move || {
            for level in [1, 2, 3, 4, 5] {
                shared
                    .mutate(|fit| fit.set_skill_level("Navigation", level))
                    .unwrap();
            }
        })
    };
    let readers: Vec<_> = (0..4)
        .map(|_| {
            let shared = shared.clone();
            thread::spawn(move || {
                (0..50)
                    .map(|_| shared.effective_attribute(ship, "maxVelocity").unwrap().unwrap())
                    .collect::<Vec<f64>>()
            })
        })
        .collect();

    writer.join().unwrap();
    let allowed: Vec<f64> = (0..=5u8).map(|l| 365.0 * (1.0 + 0.05 * f64::from(l))).collect();
    for reader in readers {
        for value in reader.join().unwrap() {
            assert!(
                allowed.iter().any(|a| common::approx_eq(*a, value)),
                "torn read: {value}"
            );
        }
    }
    assert_approx(
        shared.effective_attribute(ship, "maxVelocity").unwrap().unwrap(),
        365.0 * 1.25,
    );
}

/// Test parallel recomputation of independent fits.
#[test]
fn test_recompute_fits_in_parallel() {
    let fits: Vec<SharedFit> = ["Rifter", "Punisher", "Navitas", "Velator"]
        .into_iter()
        .map(|ship| {
            let mut fit = Fit::new(data(), type_id(ship)).unwrap();
            fit.train_all_skills(5).unwrap();
            SharedFit::new(fit)
        })
        .collect();

    let results = recompute_fits(&fits, &[AttrId::new("maxVelocity"), AttrId::new("agility")]);
    assert_eq!(results.len(), 4);
    let rifter = results[0].as_ref().unwrap();
    assert_approx(rifter[0].unwrap(), 365.0 * 1.25);
    assert_approx(rifter[1].unwrap(), 3.2 * 0.9);

    let punisher = results[1].as_ref().unwrap();
    assert_approx(punisher[0].unwrap(), 325.0 * 1.25);

    let names = par_map_fits(&fits, |fit| fit.ship().item.name.clone());
    assert_eq!(names, vec!["Rifter", "Punisher", "Navitas", "Velator"]);
}
