use std::{
    collections::HashMap,
    sync::{Arc, Mutex, MutexGuard, PoisonError},
};

use super::{GridCell, IrradianceProfile};

type Slot = Arc<Mutex<Option<IrradianceProfile>>>;

/// Process-lifetime cache of irradiance profiles, one slot per grid cell.
///
/// The outer map lock is held only long enough to find or create a slot.
/// The slot lock is held while a profile is computed, so concurrent first
/// lookups of a cell wait for a single computation. A failed computation
/// drops its slot unless another caller is already waiting on it, in which
/// case that caller retries.
#[derive(Debug, Default)]
pub(super) struct ProfileCache {
    slots: Mutex<HashMap<GridCell, Slot>>,
}

impl ProfileCache {
    pub(super) fn get_or_try_insert_with<E>(
        &self,
        cell: GridCell,
        compute: impl FnOnce() -> Result<IrradianceProfile, E>,
    ) -> Result<IrradianceProfile, E> {
        let slot = Arc::clone(lock(&self.slots).entry(cell).or_default());

        let mut entry = lock(&slot);
        if let Some(profile) = *entry {
            return Ok(profile);
        }

        match compute() {
            Ok(profile) => {
                *entry = Some(profile);
                Ok(profile)
            }
            Err(error) => {
                drop(entry);
                self.evict_if_empty(cell, &slot);
                Err(error)
            }
        }
    }

    /// Removes `cell` if it still maps to the empty `slot` and only the map
    /// and the caller hold it.
    fn evict_if_empty(&self, cell: GridCell, slot: &Slot) {
        let mut slots = lock(&self.slots);
        let unused = slots.get(&cell).is_some_and(|current| {
            Arc::ptr_eq(current, slot) && Arc::strong_count(slot) == 2 && lock(slot).is_none()
        });
        if unused {
            slots.remove(&cell);
        }
    }

    /// Number of slots, filled or not.
    #[cfg(test)]
    fn slot_count(&self) -> usize {
        lock(&self.slots).len()
    }

    pub(super) fn get(&self, cell: GridCell) -> Option<IrradianceProfile> {
        let slot = lock(&self.slots).get(&cell).map(Arc::clone)?;
        let profile = *lock(&slot);
        profile
    }

    pub(super) fn len(&self) -> usize {
        let slots: Vec<Slot> = lock(&self.slots).values().map(Arc::clone).collect();
        slots.iter().filter(|slot| lock(slot).is_some()).count()
    }
}

/// A panic while computing a profile leaves the slot empty, which is a valid state.
fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

#[cfg(test)]
mod tests {
    use std::{sync::Barrier, thread, time::Duration};

    use super::*;
    use crate::irradiance::{ProfileOrigin, SolarResource};

    fn profile(cell: GridCell) -> IrradianceProfile {
        let resource = SolarResource {
            peak_sun_hours: 4.0,
            derating: 0.8,
        };
        IrradianceProfile::new(cell, cell.center(0.1), resource, ProfileOrigin::Table).unwrap()
    }

    #[test]
    fn failures_leave_no_slots_behind() {
        let cache = ProfileCache::default();
        for i in 0..1000 {
            let cell = GridCell::containing(-60.0 + f64::from(i) * 0.1, 10.0, 0.1);
            let result = cache.get_or_try_insert_with(cell, || Err::<IrradianceProfile, _>(()));
            assert!(result.is_err());
        }
        assert_eq!(cache.len(), 0);
        assert_eq!(cache.slot_count(), 0);

        let cell = GridCell::containing(40.7, -74.0, 0.1);
        let stored = cache
            .get_or_try_insert_with(cell, || Ok::<_, ()>(profile(cell)))
            .unwrap();
        assert_eq!(cache.get(cell), Some(stored));
        assert_eq!(cache.slot_count(), 1);
    }

    #[test]
    fn waiting_caller_retries_after_a_failure() {
        let cache = ProfileCache::default();
        let cell = GridCell::containing(40.7, -74.0, 0.1);
        let barrier = Barrier::new(2);

        thread::scope(|scope| {
            let failing = scope.spawn(|| {
                cache.get_or_try_insert_with(cell, || {
                    barrier.wait();
                    thread::sleep(Duration::from_millis(50));
                    Err::<IrradianceProfile, _>(())
                })
            });
            let waiting = scope.spawn(|| {
                barrier.wait();
                cache.get_or_try_insert_with(cell, || Ok::<_, ()>(profile(cell)))
            });

            assert!(failing.join().unwrap().is_err());
            assert!(waiting.join().unwrap().is_ok());
        });

        assert_eq!(cache.len(), 1);
        assert_eq!(cache.slot_count(), 1);
    }
}
