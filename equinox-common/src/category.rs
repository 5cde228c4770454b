//! Accessory categories, as advertised to controllers during discovery

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "u8", try_from = "u8")]
#[repr(u8)]
pub enum Category {
    Other = 1,
    Bridge = 2,
    Fan = 3,
    GarageDoorOpener = 4,
    Lightbulb = 5,
    DoorLock = 6,
    Outlet = 7,
    Switch = 8,
    Thermostat = 9,
    Sensor = 10,
}

impl Category {
    pub const fn id(self) -> u8 {
        self as u8
    }
}

impl From<Category> for u8 {
    fn from(category: Category) -> Self {
        category.id()
    }
}

impl TryFrom<u8> for Category {
    type Error = &'static str;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Ok(match value {
            1 => Category::Other,
            2 => Category::Bridge,
            3 => Category::Fan,
            4 => Category::GarageDoorOpener,
            5 => Category::Lightbulb,
            6 => Category::DoorLock,
            7 => Category::Outlet,
            8 => Category::Switch,
            9 => Category::Thermostat,
            10 => Category::Sensor,
            _ => return Err("unknown accessory category"),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn category_format() {
        assert_eq!(Category::Lightbulb.id(), 5);
        assert_eq!(serde_json::to_value(Category::Lightbulb).unwrap(), serde_json::json!(5));
        assert_eq!(serde_json::from_value::<Category>(serde_json::json!(2)).unwrap(), Category::Bridge);
        assert!(serde_json::from_value::<Category>(serde_json::json!(0)).is_err());
    }
}
