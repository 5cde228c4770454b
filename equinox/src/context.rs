use std::sync::Arc;

use equinox_common::{characteristic::CharacteristicKind, service::ServiceKind};

use crate::{
    accessory::ServerConfiguration, clock, shared::SharedCharacteristic, validate::ConfigError,
};

/// A HomeKit server backend. It takes over the configuration for good: pairing, sessions,
/// persistence and discovery are its business.
pub trait AccessoryServer {
    type Error: std::error::Error + Send + Sync + 'static;

    fn register(
        &self,
        config: Arc<ServerConfiguration>,
    ) -> impl Future<Output = Result<(), Self::Error>> + Send;
}

/// Owns the validated configuration and the lights handle, for threading through startup.
#[derive(Debug, Clone)]
pub struct Context {
    config: Arc<ServerConfiguration>,
    lights: SharedCharacteristic,
}

impl Context {
    pub fn new(config: ServerConfiguration) -> Result<Self, ConfigError> {
        config.validate()?;

        let lights = clock::lights(&config)
            .cloned()
            .ok_or(ConfigError::MissingCharacteristic {
                aid: clock::LIGHTS.0,
                service: ServiceKind::Lightbulb,
                characteristic: CharacteristicKind::On,
            })?;

        if config.setup_code().is_trivial() {
            tracing::warn!(
                setup_code = %config.setup_code(),
                "Setup code is trivial, controllers may refuse to pair",
            );
        }

        tracing::info!(
            accessories = config.accessories().len(),
            lights = lights.get_value(),
            "Accessory configuration ready",
        );

        Ok(Self { config: Arc::new(config), lights })
    }

    pub fn configuration(&self) -> &Arc<ServerConfiguration> {
        &self.config
    }

    pub fn lights(&self) -> &SharedCharacteristic {
        &self.lights
    }

    pub async fn serve<S: AccessoryServer>(&self, server: &S) -> Result<(), S::Error> {
        tracing::info!("Registering accessories with server");
        server.register(self.config.clone()).await
    }
}
