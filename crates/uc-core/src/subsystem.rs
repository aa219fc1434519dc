//! Process-scoped engine lifecycle.
//!
//! Some engines need an explicit start and stop for the whole process (the
//! image toolkit's genesis/terminus pair). A [`Subsystem`] tracks that
//! state, and a [`Guarded`] resource remembers which start it was created
//! under so that its teardown can be skipped once the engine has been
//! stopped (or stopped and started again).

use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};

use tracing::{debug, warn};

use crate::{CoreError, CoreResult, NativeResource};

/// Init/shutdown state of one process-wide engine.
pub struct Subsystem {
    name: &'static str,
    live: AtomicBool,
    generation: AtomicU64,
    resources: AtomicUsize,
}

impl Subsystem {
    /// Creates a stopped subsystem. Usable in `static` items.
    pub const fn new(name: &'static str) -> Self {
        Self {
            name,
            live: AtomicBool::new(false),
            generation: AtomicU64::new(0),
            resources: AtomicUsize::new(0),
        }
    }

    /// Subsystem name, used in errors and logs.
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Starts the engine. Repeated calls while live do nothing.
    ///
    /// Returns `true` if this call performed the start.
    pub fn genesis(&self) -> bool {
        if self
            .live
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return false;
        }
        let generation = self.generation.fetch_add(1, Ordering::AcqRel) + 1;
        debug!(subsystem = self.name, generation, "genesis");
        true
    }

    /// Stops the engine. Repeated calls while stopped do nothing.
    ///
    /// Returns `true` if this call performed the stop.
    pub fn terminus(&self) -> bool {
        if self
            .live
            .compare_exchange(true, false, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return false;
        }
        let orphaned = self.resources.swap(0, Ordering::AcqRel);
        if orphaned > 0 {
            warn!(subsystem = self.name, orphaned, "terminus with live resources");
        } else {
            debug!(subsystem = self.name, "terminus");
        }
        true
    }

    /// Whether the engine is currently started.
    pub fn is_instantiated(&self) -> bool {
        self.live.load(Ordering::Acquire)
    }

    /// Number of genesis calls that actually started the engine.
    pub fn generation(&self) -> u64 {
        self.generation.load(Ordering::Acquire)
    }

    /// Resources created in the current generation and not yet released.
    pub fn live_resources(&self) -> usize {
        self.resources.load(Ordering::Acquire)
    }

    /// Fails with [`CoreError::NotInitialized`] unless started.
    pub fn ensure_live(&self) -> CoreResult<()> {
        if self.is_instantiated() {
            Ok(())
        } else {
            Err(CoreError::NotInitialized {
                subsystem: self.name,
            })
        }
    }

    /// Wraps a resource created under the current generation.
    pub fn guard<R: NativeResource>(&'static self, resource: R) -> CoreResult<Guarded<R>> {
        Guarded::new(self, resource)
    }

    fn current(&self, generation: u64) -> bool {
        self.is_instantiated() && self.generation() == generation
    }
}

impl fmt::Debug for Subsystem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subsystem")
            .field("name", &self.name)
            .field("live", &self.is_instantiated())
            .field("generation", &self.generation())
            .finish()
    }
}

/// A resource whose teardown depends on a live [`Subsystem`].
pub struct Guarded<R: NativeResource> {
    inner: Option<R>,
    subsystem: &'static Subsystem,
    generation: u64,
}

impl<R: NativeResource> Guarded<R> {
    /// Wraps `resource`. The subsystem must be started.
    pub fn new(subsystem: &'static Subsystem, resource: R) -> CoreResult<Self> {
        subsystem.ensure_live()?;
        subsystem.resources.fetch_add(1, Ordering::AcqRel);
        Ok(Self {
            inner: Some(resource),
            subsystem,
            generation: subsystem.generation(),
        })
    }

    /// Whether the owning subsystem is still the one that created this.
    pub fn is_valid(&self) -> bool {
        self.subsystem.current(self.generation)
    }

    /// Borrows the resource, failing if its subsystem has gone away.
    pub fn get(&self) -> CoreResult<&R> {
        self.check()?;
        self.inner.as_ref().ok_or(CoreError::StaleResource {
            kind: R::KIND,
            subsystem: self.subsystem.name,
        })
    }

    /// Mutably borrows the resource, failing if its subsystem has gone away.
    pub fn get_mut(&mut self) -> CoreResult<&mut R> {
        self.check()?;
        let subsystem = self.subsystem.name;
        self.inner.as_mut().ok_or(CoreError::StaleResource {
            kind: R::KIND,
            subsystem,
        })
    }

    /// Resource type tag.
    pub fn kind(&self) -> &'static str {
        R::KIND
    }

    fn check(&self) -> CoreResult<()> {
        self.subsystem.ensure_live()?;
        if self.generation != self.subsystem.generation() {
            return Err(CoreError::StaleResource {
                kind: R::KIND,
                subsystem: self.subsystem.name,
            });
        }
        Ok(())
    }
}

impl<R: NativeResource> Drop for Guarded<R> {
    fn drop(&mut self) {
        let Some(resource) = self.inner.take() else {
            return;
        };
        if self.is_valid() {
            self.subsystem.resources.fetch_sub(1, Ordering::AcqRel);
            debug!(kind = R::KIND, subsystem = self.subsystem.name, "releasing native resource");
            resource.release();
        } else {
            warn!(
                kind = R::KIND,
                subsystem = self.subsystem.name,
                "skipping teardown after terminus"
            );
            // The engine already reclaimed it; only the Rust-side memory goes.
            drop(resource);
        }
    }
}

impl<R: NativeResource> fmt::Debug for Guarded<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Guarded")
            .field("kind", &R::KIND)
            .field("subsystem", &self.subsystem.name)
            .field("generation", &self.generation)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::AtomicU32;

    struct Probe(Arc<AtomicU32>);

    impl NativeResource for Probe {
        const KIND: &'static str = "Probe";

        fn release(self) {
            self.0.fetch_add(1, Ordering::SeqCst);
        }
    }

    // Each test owns its subsystem so they can run in parallel.
    fn leak(name: &'static str) -> &'static Subsystem {
        Box::leak(Box::new(Subsystem::new(name)))
    }

    #[test]
    fn test_genesis_idempotent() {
        let sys = leak("idempotent");
        assert!(!sys.is_instantiated());
        assert!(sys.genesis());
        assert!(!sys.genesis());
        assert_eq!(sys.generation(), 1);
        assert!(sys.terminus());
        assert!(!sys.terminus());
        assert!(!sys.is_instantiated());
    }

    #[test]
    fn test_guard_requires_live() {
        let sys = leak("cold");
        let calls = Arc::new(AtomicU32::new(0));
        let err = sys.guard(Probe(calls.clone())).unwrap_err();
        assert!(matches!(err, CoreError::NotInitialized { subsystem: "cold" }));
    }

    #[test]
    fn test_release_while_live() {
        let sys = leak("live");
        sys.genesis();
        let calls = Arc::new(AtomicU32::new(0));
        {
            let guarded = sys.guard(Probe(calls.clone())).unwrap();
            assert!(guarded.is_valid());
            assert_eq!(sys.live_resources(), 1);
        }
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(sys.live_resources(), 0);
    }

    #[test]
    fn test_teardown_skipped_after_terminus() {
        let sys = leak("stopped");
        sys.genesis();
        let calls = Arc::new(AtomicU32::new(0));
        let guarded = sys.guard(Probe(calls.clone())).unwrap();
        sys.terminus();
        assert!(guarded.get().is_err());
        drop(guarded);
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_teardown_skipped_across_generations() {
        let sys = leak("restarted");
        sys.genesis();
        let calls = Arc::new(AtomicU32::new(0));
        let guarded = sys.guard(Probe(calls.clone())).unwrap();
        sys.terminus();
        sys.genesis();
        assert!(!guarded.is_valid());
        assert!(matches!(guarded.get(), Err(CoreError::StaleResource { .. })));
        drop(guarded);
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }
}
