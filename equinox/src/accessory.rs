//! Accessory descriptors: accessories own services, services own characteristics
//!
//! Collections are plain ordered vectors. Order matters: controllers are shown services and
//! characteristics in the order they were declared, and the accessory information service must
//! come first.

use equinox_common::{
    SetupCode,
    category::Category,
    characteristic::{CharacteristicKind, Value},
    service::ServiceKind,
};

use crate::shared::SharedCharacteristic;

#[derive(Debug, Clone)]
pub enum Characteristic {
    /// Descriptive value, created once and never changed
    Fixed { kind: CharacteristicKind, value: Value },
    /// Write-only, holds no value (eg. identify)
    Trigger { kind: CharacteristicKind },
    /// Mutable value shared with runtime code
    Shared(SharedCharacteristic),
}

impl Characteristic {
    pub fn fixed(kind: CharacteristicKind, value: impl Into<Value>) -> Self {
        Characteristic::Fixed { kind, value: value.into() }
    }

    pub const fn trigger(kind: CharacteristicKind) -> Self {
        Characteristic::Trigger { kind }
    }

    pub fn kind(&self) -> CharacteristicKind {
        match self {
            Characteristic::Fixed { kind, .. } | Characteristic::Trigger { kind } => *kind,
            Characteristic::Shared(shared) => shared.kind(),
        }
    }

    /// Current value; `None` for triggers.
    pub fn value(&self) -> Option<Value> {
        match self {
            Characteristic::Fixed { value, .. } => Some(value.clone()),
            Characteristic::Trigger { .. } => None,
            Characteristic::Shared(shared) => Some(Value::Bool(shared.get_value())),
        }
    }

    pub fn as_shared(&self) -> Option<&SharedCharacteristic> {
        match self {
            Characteristic::Shared(shared) => Some(shared),
            _ => None,
        }
    }
}

impl From<SharedCharacteristic> for Characteristic {
    fn from(shared: SharedCharacteristic) -> Self {
        Characteristic::Shared(shared)
    }
}

#[derive(Debug, Clone)]
pub struct Service {
    kind: ServiceKind,
    primary: bool,
    characteristics: Vec<Characteristic>,
}

impl Service {
    pub fn new(kind: ServiceKind) -> Self {
        Self { kind, primary: false, characteristics: Vec::new() }
    }

    /// Mark this as the accessory's principal function.
    pub fn primary(mut self) -> Self {
        self.primary = true;
        self
    }

    pub fn with(mut self, characteristic: impl Into<Characteristic>) -> Self {
        self.characteristics.push(characteristic.into());
        self
    }

    pub fn kind(&self) -> ServiceKind {
        self.kind
    }

    pub fn is_primary(&self) -> bool {
        self.primary
    }

    pub fn characteristics(&self) -> &[Characteristic] {
        &self.characteristics
    }

    pub fn characteristic(&self, kind: CharacteristicKind) -> Option<&Characteristic> {
        self.characteristics.iter().find(|c| c.kind() == kind)
    }
}

#[derive(Debug, Clone)]
pub struct Accessory {
    id: u64,
    category: Category,
    services: Vec<Service>,
}

impl Accessory {
    /// Id 1 is the accessory a controller pairs with; bridged accessories use higher ids.
    pub const PRIMARY_ID: u64 = 1;

    pub fn new(id: u64, category: Category) -> Self {
        Self { id, category, services: Vec::new() }
    }

    pub fn with(mut self, service: Service) -> Self {
        self.services.push(service);
        self
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn category(&self) -> Category {
        self.category
    }

    pub fn services(&self) -> &[Service] {
        &self.services
    }

    pub fn service(&self, kind: ServiceKind) -> Option<&Service> {
        self.services.iter().find(|s| s.kind == kind)
    }

    pub fn primary_service(&self) -> Option<&Service> {
        self.services.iter().find(|s| s.primary)
    }
}

/// Root of the descriptor tree, handed to the server once at startup.
#[derive(Debug)]
pub struct ServerConfiguration {
    accessories: Vec<Accessory>,
    setup_code: SetupCode,
}

impl ServerConfiguration {
    pub fn new(setup_code: SetupCode) -> Self {
        Self { accessories: Vec::new(), setup_code }
    }

    pub fn with(mut self, accessory: Accessory) -> Self {
        self.accessories.push(accessory);
        self
    }

    pub fn accessories(&self) -> &[Accessory] {
        &self.accessories
    }

    pub fn accessory(&self, id: u64) -> Option<&Accessory> {
        self.accessories.iter().find(|a| a.id == id)
    }

    pub fn setup_code(&self) -> &SetupCode {
        &self.setup_code
    }

    /// The first shared characteristic of `kind` on accessory `aid`.
    pub fn shared(&self, aid: u64, kind: CharacteristicKind) -> Option<&SharedCharacteristic> {
        self.accessory(aid)?
            .services
            .iter()
            .flat_map(|s| &s.characteristics)
            .filter(|c| c.kind() == kind)
            .find_map(Characteristic::as_shared)
    }
}
