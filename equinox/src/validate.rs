use std::collections::{BTreeSet, HashSet};

use equinox_common::{
    category::Category,
    characteristic::{CharacteristicKind, Format},
    service::ServiceKind,
};

use crate::accessory::{Accessory, Characteristic, ServerConfiguration, Service};

/// A structural problem in the descriptor tree. These are programming errors and are fatal at
/// startup.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("no accessories configured")]
    NoAccessories,
    #[error("accessory id 1 is reserved for the primary accessory but is missing")]
    MissingPrimaryAccessory,
    #[error("accessory id 0 is not valid")]
    InvalidAccessoryId,
    #[error("accessory id {0} is used more than once")]
    DuplicateAccessoryId(u64),
    #[error("accessory {0} is bridged, but accessory 1 is not a bridge")]
    BridgeRequired(u64),
    #[error("accessory {aid} has {count} primary services, expected exactly one")]
    PrimaryServiceCount { aid: u64, count: usize },
    #[error("accessory {aid} must start with the accessory information service")]
    MissingAccessoryInformation { aid: u64 },
    #[error("{service:?} service of accessory {aid} has no characteristics")]
    EmptyService { aid: u64, service: ServiceKind },
    #[error("{service:?} service of accessory {aid} is missing {characteristic:?}")]
    MissingCharacteristic {
        aid: u64,
        service: ServiceKind,
        characteristic: CharacteristicKind,
    },
    #[error("{service:?} service of accessory {aid} has {characteristic:?} more than once")]
    DuplicateCharacteristic {
        aid: u64,
        service: ServiceKind,
        characteristic: CharacteristicKind,
    },
    #[error("{characteristic:?} of accessory {aid} holds a {found:?} value, expected {expected:?}")]
    FormatMismatch {
        aid: u64,
        characteristic: CharacteristicKind,
        expected: Format,
        found: Format,
    },
}

impl ServerConfiguration {
    pub fn validate(&self) -> Result<(), ConfigError> {
        let accessories = self.accessories();

        if accessories.is_empty() {
            return Err(ConfigError::NoAccessories);
        }

        let mut seen = BTreeSet::new();
        for accessory in accessories {
            if accessory.id() == 0 {
                return Err(ConfigError::InvalidAccessoryId);
            }
            if !seen.insert(accessory.id()) {
                return Err(ConfigError::DuplicateAccessoryId(accessory.id()));
            }
        }

        let primary = self
            .accessory(Accessory::PRIMARY_ID)
            .ok_or(ConfigError::MissingPrimaryAccessory)?;

        if let Some(bridged) = accessories.iter().find(|a| a.id() != Accessory::PRIMARY_ID)
            && primary.category() != Category::Bridge
        {
            return Err(ConfigError::BridgeRequired(bridged.id()));
        }

        accessories.iter().try_for_each(validate_accessory)
    }
}

fn validate_accessory(accessory: &Accessory) -> Result<(), ConfigError> {
    let aid = accessory.id();

    match accessory.services().first() {
        Some(first) if first.kind() == ServiceKind::AccessoryInformation => {}
        _ => return Err(ConfigError::MissingAccessoryInformation { aid }),
    }

    // a bridge may expose nothing but its information service
    let count = accessory.services().iter().filter(|s| s.is_primary()).count();
    let allowed = match accessory.category() {
        Category::Bridge => 0..=1,
        _ => 1..=1,
    };
    if !allowed.contains(&count) {
        return Err(ConfigError::PrimaryServiceCount { aid, count });
    }

    accessory
        .services()
        .iter()
        .try_for_each(|service| validate_service(aid, service))
}

fn validate_service(aid: u64, service: &Service) -> Result<(), ConfigError> {
    if service.characteristics().is_empty() {
        return Err(ConfigError::EmptyService { aid, service: service.kind() });
    }

    let mut seen = HashSet::new();
    for characteristic in service.characteristics() {
        let kind = characteristic.kind();

        if !seen.insert(kind) {
            return Err(ConfigError::DuplicateCharacteristic {
                aid,
                service: service.kind(),
                characteristic: kind,
            });
        }

        if let Characteristic::Fixed { value, .. } = characteristic
            && value.format() != kind.format()
        {
            return Err(ConfigError::FormatMismatch {
                aid,
                characteristic: kind,
                expected: kind.format(),
                found: value.format(),
            });
        }
    }

    for &required in service.kind().required() {
        if service.characteristic(required).is_none() {
            return Err(ConfigError::MissingCharacteristic {
                aid,
                service: service.kind(),
                characteristic: required,
            });
        }
    }

    Ok(())
}
