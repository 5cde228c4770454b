//! Services: functional groupings of characteristics

use crate::{characteristic::CharacteristicKind, hap_type};

hap_type! {
    pub enum ServiceKind {
        /// Metadata every accessory must expose first
        AccessoryInformation = 0x3E,
        Lightbulb = 0x43,
        Switch = 0x49,
    }
}

impl ServiceKind {
    /// Characteristics a service of this kind must contain
    pub const fn required(self) -> &'static [CharacteristicKind] {
        use CharacteristicKind::*;

        match self {
            Self::AccessoryInformation => {
                &[Identify, Manufacturer, Model, Name, SerialNumber, FirmwareRevision]
            }
            Self::Lightbulb | Self::Switch => &[On],
        }
    }
}
