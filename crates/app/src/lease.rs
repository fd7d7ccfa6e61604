//! Device lease — scoped ownership of an opened hardware handle.
//!
//! A [`DeviceLease`] stops and closes its handle exactly once: explicitly via
//! [`release`](DeviceLease::release), or on drop for every other exit path
//! (early `?` return, panic unwinding through the trigger).

use std::ops::{Deref, DerefMut};

use crate::ports::Releasable;

/// An opened handle that is released when the lease ends.
pub struct DeviceLease<H: Releasable> {
    device: String,
    handle: H,
    released: bool,
}

impl<H: Releasable> DeviceLease<H> {
    pub fn new(device: impl Into<String>, handle: H) -> Self {
        let device = device.into();
        tracing::debug!(%device, "device acquired");
        Self {
            device,
            handle,
            released: false,
        }
    }

    #[must_use]
    pub fn device(&self) -> &str {
        &self.device
    }

    /// Stop and close the handle now.
    pub fn release(mut self) {
        self.release_once();
    }

    fn release_once(&mut self) {
        if self.released {
            return;
        }
        self.released = true;
        self.handle.stop();
        self.handle.close();
        tracing::debug!(device = %self.device, "device released");
    }
}

impl<H: Releasable> Deref for DeviceLease<H> {
    type Target = H;

    fn deref(&self) -> &H {
        &self.handle
    }
}

impl<H: Releasable> DerefMut for DeviceLease<H> {
    fn deref_mut(&mut self) -> &mut H {
        &mut self.handle
    }
}

impl<H: Releasable> Drop for DeviceLease<H> {
    fn drop(&mut self) {
        self.release_once();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

    #[derive(Default)]
    struct Counts {
        stops: usize,
        closes: usize,
        order: Vec<&'static str>,
    }

    struct SpyHandle(Arc<Mutex<Counts>>);

    // stop/close run during unwinding in the panic test, which poisons the lock
    fn lock(counts: &Mutex<Counts>) -> MutexGuard<'_, Counts> {
        counts.lock().unwrap_or_else(PoisonError::into_inner)
    }

    impl Releasable for SpyHandle {
        fn stop(&mut self) {
            let mut c = lock(&self.0);
            c.stops += 1;
            c.order.push("stop");
        }
        fn close(&mut self) {
            let mut c = lock(&self.0);
            c.closes += 1;
            c.order.push("close");
        }
    }

    fn lease() -> (DeviceLease<SpyHandle>, Arc<Mutex<Counts>>) {
        let counts = Arc::new(Mutex::new(Counts::default()));
        (
            DeviceLease::new("USB Speaker", SpyHandle(Arc::clone(&counts))),
            counts,
        )
    }

    #[test]
    fn should_stop_then_close_on_release() {
        let (lease, counts) = lease();
        lease.release();
        let c = lock(&counts);
        assert_eq!(c.order, ["stop", "close"]);
    }

    #[test]
    fn should_release_once_on_drop() {
        let (lease, counts) = lease();
        drop(lease);
        let c = lock(&counts);
        assert_eq!((c.stops, c.closes), (1, 1));
    }

    #[test]
    fn should_not_release_twice_after_explicit_release() {
        let (lease, counts) = lease();
        lease.release();
        let c = lock(&counts);
        assert_eq!((c.stops, c.closes), (1, 1));
    }

    #[test]
    fn should_release_when_panic_unwinds() {
        let (lease, counts) = lease();
        let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(move || {
            let _held = lease;
            panic!("driver exploded");
        }));
        assert!(result.is_err());
        let c = lock(&counts);
        assert_eq!((c.stops, c.closes), (1, 1));
    }

    #[test]
    fn should_expose_device_name() {
        let (lease, _) = lease();
        assert_eq!(lease.device(), "USB Speaker");
    }
}
