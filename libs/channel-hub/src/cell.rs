//! Deferred, construct-once slot for an expensive value.

use std::fmt;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, OnceLock};

use parking_lot::Mutex;

use crate::error::ChannelError;

type Recipe<T> = Box<dyn Fn() -> Result<T, ChannelError> + Send + Sync>;

/// Holds a recipe and, after the first successful run, its result.
///
/// Concurrent first callers serialize on an init lock, so the recipe runs at
/// most once per success. A failed run is not memoized: the next caller runs
/// the recipe again.
pub struct FactoryCell<T> {
    recipe: Recipe<T>,
    value: OnceLock<Arc<T>>,
    init: Mutex<()>,
    attempts: AtomicUsize,
}

impl<T> FactoryCell<T> {
    #[must_use]
    pub fn new<F>(recipe: F) -> Self
    where
        F: Fn() -> Result<T, ChannelError> + Send + Sync + 'static,
    {
        Self {
            recipe: Box::new(recipe),
            value: OnceLock::new(),
            init: Mutex::new(()),
            attempts: AtomicUsize::new(0),
        }
    }

    /// The constructed value, if construction has succeeded.
    #[must_use]
    pub fn get(&self) -> Option<Arc<T>> {
        self.value.get().cloned()
    }

    #[must_use]
    pub fn is_constructed(&self) -> bool {
        self.value.get().is_some()
    }

    /// Number of times the recipe has run, successful or not.
    #[must_use]
    pub fn attempts(&self) -> usize {
        self.attempts.load(Ordering::Acquire)
    }

    /// Return the value, running the recipe first if nothing is cached.
    ///
    /// # Errors
    /// Propagates the recipe's error; the cell stays empty.
    pub fn get_or_construct(&self) -> Result<Arc<T>, ChannelError> {
        if let Some(v) = self.value.get() {
            return Ok(Arc::clone(v));
        }

        let _guard = self.init.lock();
        if let Some(v) = self.value.get() {
            return Ok(Arc::clone(v));
        }

        self.attempts.fetch_add(1, Ordering::AcqRel);
        let value = Arc::new((self.recipe)()?);
        Ok(Arc::clone(self.value.get_or_init(|| value)))
    }
}

impl<T> fmt::Debug for FactoryCell<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FactoryCell")
            .field("constructed", &self.is_constructed())
            .field("attempts", &self.attempts())
            .finish_non_exhaustive()
    }
}

/// Type-erased view of a cell's construction state.
pub(crate) trait CellState: Send + Sync {
    fn is_constructed(&self) -> bool;
    fn attempts(&self) -> usize;
}

impl<T: Send + Sync> CellState for FactoryCell<T> {
    fn is_constructed(&self) -> bool {
        FactoryCell::is_constructed(self)
    }

    fn attempts(&self) -> usize {
        FactoryCell::attempts(self)
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;
    use std::sync::Barrier;
    use std::sync::atomic::AtomicBool;
    use std::thread;
    use std::time::Duration;

    #[test]
    fn recipe_is_deferred_until_first_get() {
        let ran = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&ran);
        let cell = FactoryCell::new(move || {
            flag.store(true, Ordering::SeqCst);
            Ok(7_u32)
        });

        assert!(!ran.load(Ordering::SeqCst));
        assert!(cell.get().is_none());

        assert_eq!(*cell.get_or_construct().unwrap(), 7);
        assert!(ran.load(Ordering::SeqCst));
        assert!(cell.is_constructed());
    }

    #[test]
    fn value_is_shared_between_calls() {
        let cell = FactoryCell::new(|| Ok(String::from("factory")));
        let a = cell.get_or_construct().unwrap();
        let b = cell.get_or_construct().unwrap();
        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(cell.attempts(), 1);
    }

    #[test]
    fn concurrent_first_callers_construct_once() {
        const THREADS: usize = 16;
        let cell = Arc::new(FactoryCell::new(|| {
            thread::sleep(Duration::from_millis(20));
            Ok(vec![1_u8, 2, 3])
        }));
        let barrier = Arc::new(Barrier::new(THREADS));

        let handles: Vec<_> = (0..THREADS)
            .map(|_| {
                let cell = Arc::clone(&cell);
                let barrier = Arc::clone(&barrier);
                thread::spawn(move || {
                    barrier.wait();
                    cell.get_or_construct().unwrap()
                })
            })
            .collect();

        let values: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();
        assert_eq!(cell.attempts(), 1);
        assert!(values.iter().all(|v| Arc::ptr_eq(v, &values[0])));
    }

    #[test]
    fn failure_is_not_memoized() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        let cell = FactoryCell::new(move || {
            if counter.fetch_add(1, Ordering::SeqCst) == 0 {
                Err(ChannelError::EndpointNotConfigured {
                    name: "TestEndpoint2".to_owned(),
                    contract: "IMockInterface1",
                })
            } else {
                Ok(1_u32)
            }
        });

        assert!(cell.get_or_construct().unwrap_err().is_configuration_not_found());
        assert!(!cell.is_constructed());

        assert_eq!(*cell.get_or_construct().unwrap(), 1);
        assert_eq!(cell.attempts(), 2);
    }

    #[test]
    #[allow(clippy::use_debug)]
    fn debug_reports_state() {
        let cell = FactoryCell::new(|| Ok(()));
        assert!(format!("{cell:?}").contains("constructed: false"));
        cell.get_or_construct().unwrap();
        assert!(format!("{cell:?}").contains("constructed: true"));
    }
}
