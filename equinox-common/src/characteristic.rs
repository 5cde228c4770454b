//! Characteristics: typed properties of a service
//!
//! Every characteristic kind has a fixed value format and a fixed set of permissions, as
//! assigned by HAP. The accessory database lists them alongside the value.
//!
//! # Example Characteristic
//!
//! ```plain
//! { "iid": 9, "type": "25", "perms": ["pr", "pw", "ev"], "format": "bool", "value": true }
//! ```

use compact_str::CompactString;
use serde::{Deserialize, Serialize};

use crate::hap_type;

hap_type! {
    pub enum CharacteristicKind {
        /// Asks the accessory to identify itself, eg. by blinking
        Identify = 0x14,
        Manufacturer = 0x20,
        Model = 0x21,
        Name = 0x23,
        /// Power state of a lightbulb, switch or outlet
        On = 0x25,
        SerialNumber = 0x30,
        FirmwareRevision = 0x52,
    }
}

impl CharacteristicKind {
    pub const fn format(self) -> Format {
        match self {
            Self::Identify | Self::On => Format::Bool,
            Self::Manufacturer
            | Self::Model
            | Self::Name
            | Self::SerialNumber
            | Self::FirmwareRevision => Format::String,
        }
    }

    pub const fn permissions(self) -> &'static [Permission] {
        match self {
            Self::Identify => &[Permission::PairedWrite],
            Self::On => &[Permission::PairedRead, Permission::PairedWrite, Permission::Events],
            Self::Manufacturer
            | Self::Model
            | Self::Name
            | Self::SerialNumber
            | Self::FirmwareRevision => &[Permission::PairedRead],
        }
    }

    pub fn is_readable(self) -> bool {
        self.permissions().contains(&Permission::PairedRead)
    }

    pub fn is_writable(self) -> bool {
        self.permissions().contains(&Permission::PairedWrite)
    }

    pub fn supports_events(self) -> bool {
        self.permissions().contains(&Permission::Events)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Format {
    Bool,
    String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Permission {
    #[serde(rename = "pr")]
    PairedRead,
    #[serde(rename = "pw")]
    PairedWrite,
    #[serde(rename = "ev")]
    Events,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    Bool(bool),
    String(CompactString),
}

impl Value {
    pub const fn const_str(s: &'static str) -> Self {
        Value::String(CompactString::const_new(s))
    }

    pub fn format(&self) -> Format {
        match self {
            Value::Bool(_) => Format::Bool,
            Value::String(_) => Format::String,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match *self {
            Value::Bool(b) => Some(b),
            Value::String(_) => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            Value::Bool(_) => None,
        }
    }

    /// Interpret a value written by a controller.
    ///
    /// Controllers may send booleans as `0` or `1`.
    pub fn from_json(format: Format, json: &serde_json::Value) -> Option<Self> {
        match (format, json) {
            (Format::Bool, serde_json::Value::Bool(b)) => Some(Value::Bool(*b)),
            (Format::Bool, serde_json::Value::Number(n)) => match n.as_u64() {
                Some(0) => Some(Value::Bool(false)),
                Some(1) => Some(Value::Bool(true)),
                _ => None,
            },
            (Format::String, serde_json::Value::String(s)) => Some(Value::String(s.as_str().into())),
            _ => None,
        }
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Bool(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::String(value.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{HapType, ShortUuid};

    #[test]
    fn kind_uuids() {
        assert_eq!(CharacteristicKind::On.short_uuid(), ShortUuid(0x25));
        assert_eq!(CharacteristicKind::Name.short_uuid(), ShortUuid(0x23));
        assert_eq!(CharacteristicKind::FirmwareRevision.short_uuid(), ShortUuid(0x52));
        assert_eq!(serde_json::to_value(CharacteristicKind::Identify).unwrap(), serde_json::json!("14"));
    }

    #[test]
    fn kind_permissions() {
        assert!(CharacteristicKind::On.is_readable());
        assert!(CharacteristicKind::On.is_writable());
        assert!(CharacteristicKind::On.supports_events());

        assert!(!CharacteristicKind::Identify.is_readable());
        assert!(CharacteristicKind::Identify.is_writable());

        assert!(CharacteristicKind::Model.is_readable());
        assert!(!CharacteristicKind::Model.is_writable());

        assert_eq!(
            serde_json::to_value(CharacteristicKind::On.permissions()).unwrap(),
            serde_json::json!(["pr", "pw", "ev"])
        );
    }

    #[test]
    fn value_format() {
        assert_eq!(serde_json::to_value(Value::Bool(true)).unwrap(), serde_json::json!(true));
        assert_eq!(serde_json::to_value(Value::from("Lights")).unwrap(), serde_json::json!("Lights"));
        assert_eq!(serde_json::to_value(Format::Bool).unwrap(), serde_json::json!("bool"));
        assert_eq!(Value::const_str("1.0").format(), Format::String);
    }

    #[test]
    fn value_from_json() {
        use serde_json::json;

        assert_eq!(Value::from_json(Format::Bool, &json!(false)), Some(Value::Bool(false)));
        assert_eq!(Value::from_json(Format::Bool, &json!(1)), Some(Value::Bool(true)));
        assert_eq!(Value::from_json(Format::Bool, &json!(0)), Some(Value::Bool(false)));
        assert_eq!(Value::from_json(Format::Bool, &json!(2)), None);
        assert_eq!(Value::from_json(Format::Bool, &json!("true")), None);
        assert_eq!(Value::from_json(Format::String, &json!("x")), Some(Value::from("x")));
        assert_eq!(Value::from_json(Format::String, &json!(true)), None);
    }
}
