//! Hardware side of the lights: a relay that follows the lights value, and the physical button

use crate::shared::SharedCharacteristic;

pub trait Relay: Send {
    fn set(&mut self, on: bool);
}

/// Relay stand-in for hosts without GPIO; reports every switch to the log.
#[derive(Debug, Default)]
pub struct LogRelay {
    state: Option<bool>,
}

impl LogRelay {
    pub fn state(&self) -> Option<bool> {
        self.state
    }
}

impl Relay for LogRelay {
    fn set(&mut self, on: bool) {
        if self.state != Some(on) {
            tracing::info!(on, "Relay switched");
        }
        self.state = Some(on);
    }
}

/// Keep `relay` in step with the lights until the characteristic goes away.
///
/// Follows controller writes and local changes alike. Subscribes before returning, so no change
/// made after this call is missed.
pub fn drive_relay(
    mut relay: impl Relay,
    lights: SharedCharacteristic,
) -> impl Future<Output = ()> + Send {
    let mut changes = lights.subscribe();
    relay.set(lights.get_value());

    async move {
        while let Some(change) = changes.next().await {
            relay.set(change.value);
        }

        tracing::debug!("Lights characteristic dropped, relay task done");
    }
}

/// A press of the physical button: flip the lights and tell paired controllers.
pub fn press_button(lights: &SharedCharacteristic) -> bool {
    let on = lights.toggle();
    lights.notify();
    on
}
