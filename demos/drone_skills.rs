//! Drone skills example: a Velator with light drones, trained level by level
//!
//! This example demonstrates:
//! - Loading static data through a `StaticDataLoader`
//! - Skill-scaled filtered boosts on drones
//! - Ship trait bonuses that only hit some drones
//! - Attribute breakdowns
//!
//! Run with `RUST_LOG=fitcalc=trace` to watch the effect runner.

use fitcalc::*;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

fn main() -> Result<(), FitError> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    println!("=== Drone Skills Demo ===\n");

    let path = concat!(env!("CARGO_MANIFEST_DIR"), "/tests/fixtures/static_data.json");
    let data = Arc::new(JsonLoader::File(path.into()).load()?);

    let type_of = |name: &str| {
        data.item_by_name(name)
            .map(|item| item.type_id)
            .ok_or_else(|| FitError::from(DataIntegrityError::Parse(format!("{name} missing"))))
    };

    let mut fit = Fit::new(Arc::clone(&data), type_of("Velator")?)?;
    let warrior = fit.add_item(type_of("Warrior I")?, Slot::Drone)?;
    let bouncer = fit.add_item(type_of("Bouncer I")?, Slot::Drone)?;
    let salvager = fit.add_item(type_of("Salvage Drone I")?, Slot::Drone)?;

    // ===== Skill scaling =====
    println!("1. Combat Drone Operation, level by level\n");
    for level in 0..=5 {
        fit.set_skill_level("Combat Drone Operation", level)?;
        let w = fit.require_attribute(warrior, "damageMultiplier")?;
        let b = fit.require_attribute(bouncer, "damageMultiplier")?;
        println!("  L{level}: Warrior I x{w:.3}   Bouncer I x{b:.3}");
    }
    println!("  ✓ Only light and medium drones scale\n");

    // ===== Ship trait =====
    println!("2. Velator rookie drone bonus (drones requiring Drones)\n");
    for (name, key) in [("Warrior I", warrior), ("Salvage Drone I", salvager)] {
        let armor = fit.require_attribute(key, "armorHP")?;
        println!("  {name}: armorHP {armor:.1}");
    }
    println!();

    // ===== Breakdown =====
    println!("3. Breakdown of Warrior I damageMultiplier\n");
    if let Some(resolved) = fit.resolve_attribute(warrior, "damageMultiplier")? {
        println!("  base: {:?}", resolved.base);
        for applied in &resolved.modifiers {
            println!(
                "  {} (penalty {:.4}) -> {:.4}",
                applied.description, applied.penalty, applied.value_after
            );
        }
        println!("  final: {:.4} (penalized: {})", resolved.value, resolved.is_penalized());
    }

    println!("\n  modifiers in pass: {}", fit.modifier_count()?);
    Ok(())
}
