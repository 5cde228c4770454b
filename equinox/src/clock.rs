//! The Equinox Clock: one lightbulb accessory whose lights can be switched on and off

use equinox_common::{
    SetupCode,
    category::Category,
    characteristic::CharacteristicKind::{self, *},
    service::ServiceKind,
};

use crate::{
    accessory::{Accessory, Characteristic, ServerConfiguration, Service},
    shared::SharedCharacteristic,
};

pub const DEVICE_NAME: &str = "Equinox Clock";
pub const MANUFACTURER: &str = "Arduino HomeKit";
pub const SERIAL_NUMBER: &str = "0123456";
pub const MODEL: &str = "ESP8266";
pub const FIRMWARE_REVISION: &str = "1.0";
pub const LIGHTS_NAME: &str = "Lights";
pub const LIGHTS_INITIALLY_ON: bool = true;

pub const SETUP_CODE: SetupCode = SetupCode::const_new("111-11-111");

/// Where the lights' on/off state lives in the tree built by [`build_configuration`].
pub const LIGHTS: (u64, CharacteristicKind) = (Accessory::PRIMARY_ID, On);

pub fn build_configuration() -> ServerConfiguration {
    let lights = SharedCharacteristic::new(On, LIGHTS_INITIALLY_ON);

    ServerConfiguration::new(SETUP_CODE).with(
        Accessory::new(Accessory::PRIMARY_ID, Category::Lightbulb)
            .with(
                Service::new(ServiceKind::AccessoryInformation)
                    .with(Characteristic::fixed(Name, DEVICE_NAME))
                    .with(Characteristic::fixed(Manufacturer, MANUFACTURER))
                    .with(Characteristic::fixed(SerialNumber, SERIAL_NUMBER))
                    .with(Characteristic::fixed(Model, MODEL))
                    .with(Characteristic::fixed(FirmwareRevision, FIRMWARE_REVISION))
                    .with(Characteristic::trigger(Identify)),
            )
            .with(
                Service::new(ServiceKind::Lightbulb)
                    .primary()
                    .with(lights)
                    .with(Characteristic::fixed(Name, LIGHTS_NAME)),
            ),
    )
}

/// The lights handle of a configuration built by [`build_configuration`].
pub fn lights(config: &ServerConfiguration) -> Option<&SharedCharacteristic> {
    let (aid, kind) = LIGHTS;
    config.shared(aid, kind)
}
