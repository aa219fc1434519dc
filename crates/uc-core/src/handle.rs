//! Unique-ownership containers for native engine resources.
//!
//! Every resource an engine hands back (profile, transform, wand, layout,
//! font description) is moved into a [`Handle`] right after creation. The
//! handle lends the resource out through [`Handle::get`] and runs the
//! resource's teardown exactly once when it is dropped.
//!
//! ```rust
//! use uc_core::{Handle, NativeResource};
//!
//! struct Profile(u32);
//!
//! impl NativeResource for Profile {
//!     const KIND: &'static str = "cmsHPROFILE";
//! }
//!
//! let handle = Handle::new(Profile(7));
//! assert_eq!(handle.get().0, 7);
//! assert_eq!(handle.kind(), "cmsHPROFILE");
//! ```

use std::fmt;

use tracing::debug;

use crate::{CoreError, CoreResult};

/// A resource owned by a native engine.
///
/// `release` is the single teardown call for the resource. The default
/// drops the value, which is correct for engine wrappers that already tear
/// down in their own `Drop` (the `lcms2` types do).
pub trait NativeResource: Sized {
    /// Type tag, matching the engine's handle type name.
    const KIND: &'static str;

    /// Tears the resource down.
    fn release(self) {
        drop(self);
    }
}

/// Owning container for one native resource.
pub struct Handle<R: NativeResource> {
    inner: Option<R>,
}

impl<R: NativeResource> Handle<R> {
    /// Wraps a freshly created resource.
    pub fn new(resource: R) -> Self {
        Self {
            inner: Some(resource),
        }
    }

    /// Wraps the outcome of an engine creation call.
    ///
    /// `None` means the engine produced nothing; no teardown is scheduled.
    pub fn try_new(resource: Option<R>) -> CoreResult<Self> {
        resource
            .map(Self::new)
            .ok_or(CoreError::CreateFailed { kind: R::KIND })
    }

    /// Borrows the resource for a forwarding call.
    pub fn get(&self) -> &R {
        self.inner
            .as_ref()
            .unwrap_or_else(|| unreachable!("{} handle emptied before drop", R::KIND))
    }

    /// Mutably borrows the resource.
    pub fn get_mut(&mut self) -> &mut R {
        self.inner
            .as_mut()
            .unwrap_or_else(|| unreachable!("{} handle emptied before drop", R::KIND))
    }

    /// Resource type tag.
    pub fn kind(&self) -> &'static str {
        R::KIND
    }

    /// Takes the resource back, cancelling the scheduled teardown.
    pub fn into_inner(mut self) -> R {
        self.inner
            .take()
            .unwrap_or_else(|| unreachable!("{} handle emptied before drop", R::KIND))
    }
}

impl<R: NativeResource> Drop for Handle<R> {
    fn drop(&mut self) {
        if let Some(resource) = self.inner.take() {
            debug!(kind = R::KIND, "releasing native resource");
            resource.release();
        }
    }
}

impl<R: NativeResource> fmt::Debug for Handle<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Handle").field("kind", &R::KIND).finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;
    use std::rc::Rc;

    struct Counted(Rc<Cell<u32>>);

    impl NativeResource for Counted {
        const KIND: &'static str = "Counted";

        fn release(self) {
            self.0.set(self.0.get() + 1);
        }
    }

    #[test]
    fn test_teardown_runs_once() {
        let calls = Rc::new(Cell::new(0));
        {
            let handle = Handle::new(Counted(calls.clone()));
            assert_eq!(handle.kind(), "Counted");
            let _ = handle.get();
        }
        assert_eq!(calls.get(), 1);
    }

    #[test]
    fn test_failed_creation_never_tears_down() {
        let result: CoreResult<Handle<Counted>> = Handle::try_new(None);
        match result {
            Err(CoreError::CreateFailed { kind }) => assert_eq!(kind, "Counted"),
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn test_into_inner_disarms() {
        let calls = Rc::new(Cell::new(0));
        let handle = Handle::new(Counted(calls.clone()));
        let raw = handle.into_inner();
        assert_eq!(calls.get(), 0);
        raw.release();
        assert_eq!(calls.get(), 1);
    }
}
