//! Sharing fits across threads.
//!
//! A `Fit` is `Send + Sync`: queries go through its internal cache lock.
//! `SharedFit` adds the outer reader/writer discipline so one thread can
//! mutate a fit while others read it. Independent fits have no shared
//! mutable state and are recomputed in parallel with rayon.

use crate::attr_id::AttrId;
use crate::error::Result;
use crate::fit::Fit;
use crate::item::ItemKey;
use rayon::prelude::*;
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use tracing::debug;

/// A fit behind a reader/writer lock.
///
/// # Examples
///
/// ```rust
/// use fitcalc::{Fit, SharedFit, StaticData};
/// use fitcalc::item::{Category, Item, ItemTypeId};
/// use std::sync::Arc;
///
/// let mut data = StaticData::new();
/// data.add_item(Item::new(ItemTypeId(1), "Rifter", "Frigate", Category::Ship)
///     .with_attribute("maxVelocity", 365.0));
///
/// let shared = SharedFit::new(Fit::new(Arc::new(data), ItemTypeId(1)).unwrap());
/// let reader = shared.clone();
/// let handle = std::thread::spawn(move || {
///     let ship = reader.read().ship().key;
///     reader.effective_attribute(ship, "maxVelocity").unwrap()
/// });
/// assert_eq!(handle.join().unwrap(), Some(365.0));
/// ```
#[derive(Debug, Clone)]
pub struct SharedFit(Arc<RwLock<Fit>>);

impl SharedFit {
    pub fn new(fit: Fit) -> Self {
        Self(Arc::new(RwLock::new(fit)))
    }

    pub fn read(&self) -> RwLockReadGuard<'_, Fit> {
        self.0.read().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn write(&self) -> RwLockWriteGuard<'_, Fit> {
        self.0.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Query under the read lock.
    pub fn effective_attribute(
        &self,
        item: ItemKey,
        attribute: impl Into<AttrId>,
    ) -> Result<Option<f64>> {
        self.read().effective_attribute(item, attribute)
    }

    /// Run a mutation under the write lock.
    pub fn mutate<T>(&self, f: impl FnOnce(&mut Fit) -> Result<T>) -> Result<T> {
        f(&mut self.write())
    }
}

/// Apply `f` to every fit in parallel, preserving input order.
pub fn par_map_fits<T, F>(fits: &[SharedFit], f: F) -> Vec<T>
where
    T: Send,
    F: Fn(&Fit) -> T + Sync,
{
    fits.par_iter().map(|shared| f(&shared.read())).collect()
}

/// Recompute the given ship attributes of every fit in parallel.
///
/// The outer vector follows `fits`; each inner vector follows `attributes`.
pub fn recompute_fits(fits: &[SharedFit], attributes: &[AttrId]) -> Vec<Result<Vec<Option<f64>>>> {
    let _span = tracing::debug_span!("recompute_fits", fits = fits.len()).entered();
    let results = par_map_fits(fits, |fit| {
        let ship = fit.ship().key;
        attributes
            .iter()
            .map(|attribute| fit.effective_attribute(ship, attribute.clone()))
            .collect::<Result<Vec<_>>>()
    });
    debug!(
        failed = results.iter().filter(|r| r.is_err()).count(),
        "recomputed fits"
    );
    results
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::StaticData;
    use crate::item::{Category, Item, ItemTypeId};

    fn assert_send_sync<T: Send + Sync>() {}

    #[test]
    fn test_fit_is_send_sync() {
        assert_send_sync::<Fit>();
        assert_send_sync::<SharedFit>();
    }

    #[test]
    fn test_recompute_preserves_order() {
        let mut data = StaticData::new();
        for (id, velocity) in [(1, 365.0), (2, 412.0), (3, 300.0)] {
            data.add_item(
                Item::new(ItemTypeId(id), format!("Hull {id}"), "Frigate", Category::Ship)
                    .with_attribute("maxVelocity", velocity),
            );
        }
        let data = Arc::new(data);
        let fits: Vec<SharedFit> = (1..=3)
            .map(|id| SharedFit::new(Fit::new(Arc::clone(&data), ItemTypeId(id)).unwrap()))
            .collect();

        let results = recompute_fits(&fits, &[AttrId::new("maxVelocity"), AttrId::new("mass")]);
        let velocities: Vec<Option<f64>> = results.iter().map(|r| r.as_ref().unwrap()[0]).collect();
        assert_eq!(velocities, vec![Some(365.0), Some(412.0), Some(300.0)]);
        assert!(results.iter().all(|r| r.as_ref().unwrap()[1].is_none()));
    }
}
