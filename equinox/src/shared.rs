//! The one mutable characteristic value of an accessory
//!
//! A [`SharedCharacteristic`] is created while building the configuration and handed, by
//! reference, to both the server's write path and the hardware control code. The value itself is
//! an atomic, so neither side can observe a torn write. Changes are announced on a broadcast
//! channel tagged with their [`Origin`]: the server listens for [`Origin::Local`] changes to
//! notify paired controllers, the hardware follows every change to actuate.

use core::{
    fmt::Debug,
    sync::atomic::{AtomicBool, Ordering},
};
use std::sync::Arc;

use equinox_common::characteristic::{CharacteristicKind, Format};
use tokio::sync::broadcast::{self, error::RecvError};

const CHANGE_CAPACITY: usize = 16;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Origin {
    /// Written by a paired controller
    Remote,
    /// Changed on the device itself, eg. by a physical button
    Local,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ValueChange {
    pub value: bool,
    pub origin: Origin,
}

#[derive(Clone)]
pub struct SharedCharacteristic {
    inner: Arc<Inner>,
}

struct Inner {
    kind: CharacteristicKind,
    value: AtomicBool,
    changes: broadcast::Sender<ValueChange>,
}

impl SharedCharacteristic {
    pub fn new(kind: CharacteristicKind, initial: bool) -> Self {
        debug_assert_eq!(kind.format(), Format::Bool, "{kind:?} does not hold a bool");

        let (changes, _) = broadcast::channel(CHANGE_CAPACITY);

        Self {
            inner: Arc::new(Inner { kind, value: AtomicBool::new(initial), changes }),
        }
    }

    pub fn kind(&self) -> CharacteristicKind {
        self.inner.kind
    }

    pub fn get_value(&self) -> bool {
        self.inner.value.load(Ordering::Acquire)
    }

    /// Store a new value without telling anyone. Follow up with [`notify`](Self::notify) once
    /// the hardware has settled.
    pub fn set_value(&self, value: bool) {
        self.inner.value.store(value, Ordering::Release);
    }

    /// Flip the value in one step and return the new value. Does not notify.
    pub fn toggle(&self) -> bool {
        !self.inner.value.fetch_not(Ordering::AcqRel)
    }

    /// Store a value written by a controller and wake the hardware side.
    pub fn write_remote(&self, value: bool) {
        self.set_value(value);
        self.emit(ValueChange { value, origin: Origin::Remote });
    }

    /// Announce the current value to paired controllers after a local change.
    pub fn notify(&self) {
        let value = self.get_value();
        self.emit(ValueChange { value, origin: Origin::Local });
    }

    pub fn subscribe(&self) -> Changes {
        Changes { rx: self.inner.changes.subscribe() }
    }

    /// Whether both handles refer to the same instance.
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    fn emit(&self, change: ValueChange) {
        tracing::debug!(
            kind = ?self.inner.kind,
            value = change.value,
            origin = ?change.origin,
            "Characteristic changed",
        );

        // no subscribers is fine, the value is still stored
        let _ = self.inner.changes.send(change);
    }
}

impl Debug for SharedCharacteristic {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("SharedCharacteristic")
            .field("kind", &self.inner.kind)
            .field("value", &self.get_value())
            .finish()
    }
}

/// Receiving end of a characteristic's change announcements.
pub struct Changes {
    rx: broadcast::Receiver<ValueChange>,
}

impl Changes {
    /// Next change, or `None` once the characteristic is gone.
    pub async fn next(&mut self) -> Option<ValueChange> {
        loop {
            match self.rx.recv().await {
                Ok(change) => return Some(change),
                Err(RecvError::Lagged(skipped)) => {
                    tracing::warn!(skipped, "Characteristic subscriber lagged behind");
                }
                Err(RecvError::Closed) => return None,
            }
        }
    }

    pub async fn next_from(&mut self, origin: Origin) -> Option<bool> {
        loop {
            let change = self.next().await?;
            if change.origin == origin {
                return Some(change.value);
            }
        }
    }

    pub async fn next_remote(&mut self) -> Option<bool> {
        self.next_from(Origin::Remote).await
    }

    pub async fn next_local(&mut self) -> Option<bool> {
        self.next_from(Origin::Local).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn read_after_write() {
        let on = SharedCharacteristic::new(CharacteristicKind::On, true);
        assert!(on.get_value());

        on.set_value(false);
        assert!(!on.get_value());

        on.set_value(true);
        assert!(on.get_value());

        on.set_value(true);
        assert!(on.get_value());
    }

    #[test]
    fn toggle_flips() {
        let on = SharedCharacteristic::new(CharacteristicKind::On, true);
        assert!(!on.toggle());
        assert!(!on.get_value());
        assert!(on.toggle());
        assert!(on.get_value());
    }

    #[test]
    fn clones_share_value() {
        let on = SharedCharacteristic::new(CharacteristicKind::On, false);
        let other = on.clone();

        other.set_value(true);
        assert!(on.get_value());
        assert!(on.ptr_eq(&other));
        assert!(!on.ptr_eq(&SharedCharacteristic::new(CharacteristicKind::On, false)));
    }

    #[tokio::test]
    async fn remote_and_local_changes() {
        let on = SharedCharacteristic::new(CharacteristicKind::On, true);
        let mut changes = on.subscribe();

        on.write_remote(false);
        on.set_value(true);
        on.notify();

        assert_eq!(changes.next().await, Some(ValueChange { value: false, origin: Origin::Remote }));
        assert_eq!(changes.next().await, Some(ValueChange { value: true, origin: Origin::Local }));
        assert!(on.get_value());
    }

    #[tokio::test]
    async fn filter_by_origin() {
        let on = SharedCharacteristic::new(CharacteristicKind::On, false);
        let mut hardware = on.subscribe();
        let mut server = on.subscribe();

        on.set_value(true);
        on.notify();
        on.write_remote(false);

        assert_eq!(hardware.next_remote().await, Some(false));
        assert_eq!(server.next_local().await, Some(true));
    }

    #[tokio::test]
    async fn lagged_subscriber_recovers() {
        let on = SharedCharacteristic::new(CharacteristicKind::On, false);
        let mut changes = on.subscribe();

        for i in 0..CHANGE_CAPACITY + 4 {
            on.write_remote(i % 2 == 0);
        }

        // oldest changes were dropped, the most recent ones are still delivered
        let mut last = None;
        for _ in 0..CHANGE_CAPACITY {
            last = changes.next().await;
        }
        assert_eq!(last, Some(ValueChange { value: on.get_value(), origin: Origin::Remote }));
    }

    #[tokio::test]
    async fn closed_when_dropped() {
        let on = SharedCharacteristic::new(CharacteristicKind::On, false);
        let mut changes = on.subscribe();
        drop(on);

        assert_eq!(changes.next().await, None);
    }
}
