pub mod accessory;
pub mod clock;
pub mod context;
pub mod database;
pub mod hardware;
pub mod log;
pub mod shared;
mod validate;

pub use equinox_common as common;

pub use self::{
    accessory::{Accessory, Characteristic, ServerConfiguration, Service},
    context::{AccessoryServer, Context},
    database::{AttributeDatabase, AttributeError, LocalServer},
    shared::{Changes, Origin, SharedCharacteristic, ValueChange},
    validate::ConfigError,
};

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),
    #[error("attribute error: {0}")]
    Attribute(#[from] AttributeError),
    #[error("serde json error: {0}")]
    SerdeJson(#[from] serde_json::Error),
    #[error("accessories were already registered with this server")]
    AlreadyRegistered,
}
