//! Attribute database: the accessory tree as a HAP controller sees it
//!
//! Every service and characteristic gets an instance id (iid), numbered from 1 per accessory in
//! declaration order. Controllers address characteristics by `(aid, iid)`.
//!
//! # Example Document
//!
//! ```plain
//! {"accessories": [{"aid": 1, "services": [
//!     {"iid": 1, "type": "3E", "characteristics": [
//!         {"iid": 2, "type": "23", "perms": ["pr"], "format": "string", "value": "Equinox Clock"},
//!         ...
//!     ]},
//!     {"iid": 8, "type": "43", "primary": true, "characteristics": [
//!         {"iid": 9, "type": "25", "perms": ["pr", "pw", "ev"], "format": "bool", "value": true},
//!         ...
//!     ]}
//! ]}]}
//! ```

use std::{
    collections::BTreeMap,
    sync::{Arc, OnceLock},
};

use equinox_common::{
    characteristic::{CharacteristicKind, Format, Permission, Value},
    service::ServiceKind,
};
use futures::{Stream, StreamExt as _, stream};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

use crate::{
    Error,
    accessory::{Characteristic, ServerConfiguration},
    context::AccessoryServer,
};

/// Failure of a single characteristic read or write, as reported back to the controller.
#[derive(thiserror::Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttributeError {
    #[error("characteristic is read-only")]
    ReadOnly,
    #[error("characteristic is write-only")]
    WriteOnly,
    #[error("characteristic does not support notifications")]
    NotificationNotSupported,
    #[error("no characteristic at this aid and iid")]
    ResourceDoesNotExist,
    #[error("value does not fit the characteristic")]
    InvalidValue,
}

impl AttributeError {
    /// HAP status code
    pub const fn status(self) -> i32 {
        match self {
            AttributeError::ReadOnly => -70404,
            AttributeError::WriteOnly => -70405,
            AttributeError::NotificationNotSupported => -70406,
            AttributeError::ResourceDoesNotExist => -70409,
            AttributeError::InvalidValue => -70410,
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct Slot {
    accessory: usize,
    service: usize,
    characteristic: usize,
}

pub struct AttributeDatabase {
    config: Arc<ServerConfiguration>,
    /// iid of every service, then of every characteristic, per accessory
    iids: Vec<Vec<(u64, Vec<u64>)>>,
    slots: BTreeMap<(u64, u64), Slot>,
    identify: broadcast::Sender<u64>,
}

impl AttributeDatabase {
    pub fn new(config: Arc<ServerConfiguration>) -> Self {
        let mut iids = Vec::new();
        let mut slots = BTreeMap::new();

        for (a, accessory) in config.accessories().iter().enumerate() {
            let mut next_iid = 1..;
            let mut services = Vec::new();

            for (s, service) in accessory.services().iter().enumerate() {
                let service_iid = next_iid.next().unwrap_or_default();
                let mut characteristics = Vec::new();

                for c in 0..service.characteristics().len() {
                    let iid = next_iid.next().unwrap_or_default();
                    characteristics.push(iid);
                    slots.insert((accessory.id(), iid), Slot {
                        accessory: a,
                        service: s,
                        characteristic: c,
                    });
                }

                services.push((service_iid, characteristics));
            }

            iids.push(services);
        }

        tracing::debug!(attributes = slots.len(), "Built attribute database");

        let (identify, _) = broadcast::channel(4);

        Self { config, iids, slots, identify }
    }

    pub fn configuration(&self) -> &Arc<ServerConfiguration> {
        &self.config
    }

    pub fn characteristic(&self, aid: u64, iid: u64) -> Result<&Characteristic, AttributeError> {
        let slot = self
            .slots
            .get(&(aid, iid))
            .ok_or(AttributeError::ResourceDoesNotExist)?;

        Ok(&self.config.accessories()[slot.accessory].services()[slot.service].characteristics()
            [slot.characteristic])
    }

    /// iid of the first characteristic of `kind` in the first service of `service` kind.
    pub fn iid_of(&self, aid: u64, service: ServiceKind, kind: CharacteristicKind) -> Option<u64> {
        self.slots.iter().find_map(|(&(slot_aid, iid), slot)| {
            let accessory = &self.config.accessories()[slot.accessory];
            let found = &accessory.services()[slot.service];

            (slot_aid == aid
                && found.kind() == service
                && found.characteristics()[slot.characteristic].kind() == kind)
                .then_some(iid)
        })
    }

    pub fn read(&self, aid: u64, iid: u64) -> Result<Value, AttributeError> {
        let characteristic = self.characteristic(aid, iid)?;

        if !characteristic.kind().is_readable() {
            return Err(AttributeError::WriteOnly);
        }

        characteristic.value().ok_or(AttributeError::WriteOnly)
    }

    pub fn write(&self, aid: u64, iid: u64, value: &serde_json::Value) -> Result<(), AttributeError> {
        let characteristic = self.characteristic(aid, iid)?;
        let kind = characteristic.kind();

        if !kind.is_writable() {
            return Err(AttributeError::ReadOnly);
        }

        let value = Value::from_json(kind.format(), value).ok_or(AttributeError::InvalidValue)?;

        match (characteristic, value) {
            (Characteristic::Shared(shared), Value::Bool(value)) => {
                tracing::info!(aid, iid, ?kind, value, "Controller wrote characteristic");
                shared.write_remote(value);
                Ok(())
            }
            (Characteristic::Trigger { kind: CharacteristicKind::Identify }, Value::Bool(go)) => {
                if go {
                    tracing::info!(aid, "Identify requested");
                    let _ = self.identify.send(aid);
                }
                Ok(())
            }
            (Characteristic::Trigger { .. }, _) => Ok(()),
            // writable kinds are never stored as fixed values
            (Characteristic::Fixed { .. }, _) => Err(AttributeError::ReadOnly),
            (Characteristic::Shared(_), Value::String(_)) => Err(AttributeError::InvalidValue),
        }
    }

    /// Handle a `GET /characteristics` for the given `(aid, iid)` pairs.
    pub fn read_request(&self, ids: &[(u64, u64)]) -> ReadResponse {
        let results = ids
            .iter()
            .map(|&(aid, iid)| (aid, iid, self.read(aid, iid)))
            .collect::<Vec<_>>();

        let failed = results.iter().any(|(.., r)| r.is_err());

        ReadResponse {
            characteristics: results
                .into_iter()
                .map(|(aid, iid, result)| match result {
                    Ok(value) => CharacteristicStatus {
                        aid,
                        iid,
                        value: Some(value),
                        status: failed.then_some(0),
                    },
                    Err(e) => {
                        CharacteristicStatus { aid, iid, value: None, status: Some(e.status()) }
                    }
                })
                .collect(),
        }
    }

    /// Handle a `PUT /characteristics`. `None` means every write succeeded.
    pub fn write_request(&self, request: &WriteRequest) -> Option<WriteResponse> {
        let statuses = request
            .characteristics
            .iter()
            .map(|w| {
                let result = self.apply_write(w);
                if let Err(e) = result {
                    tracing::warn!(aid = w.aid, iid = w.iid, "Rejected write: {e}");
                }
                (w.aid, w.iid, result)
            })
            .collect::<Vec<_>>();

        statuses.iter().any(|(.., r)| r.is_err()).then(|| WriteResponse {
            characteristics: statuses
                .into_iter()
                .map(|(aid, iid, result)| WriteStatus {
                    aid,
                    iid,
                    status: result.err().map_or(0, AttributeError::status),
                })
                .collect(),
        })
    }

    /// `ev` is checked against the characteristic's permissions only. No per-controller
    /// subscription is kept; [`events`](Self::events) goes to every listener.
    fn apply_write(&self, write: &WriteEntry) -> Result<(), AttributeError> {
        if let Some(ev) = write.ev {
            let kind = self.characteristic(write.aid, write.iid)?.kind();
            if ev && !kind.supports_events() {
                return Err(AttributeError::NotificationNotSupported);
            }
        }

        match &write.value {
            Some(value) => self.write(write.aid, write.iid, value),
            None => self.characteristic(write.aid, write.iid).map(|_| ()),
        }
    }

    /// The `/accessories` document.
    pub fn accessories_json(&self) -> serde_json::Value {
        let accessories = self
            .config
            .accessories()
            .iter()
            .zip(&self.iids)
            .map(|(accessory, iids)| AccessoryJson {
                aid: accessory.id(),
                services: accessory
                    .services()
                    .iter()
                    .zip(iids)
                    .map(|(service, (service_iid, characteristic_iids))| ServiceJson {
                        iid: *service_iid,
                        kind: service.kind(),
                        primary: service.is_primary(),
                        characteristics: service
                            .characteristics()
                            .iter()
                            .zip(characteristic_iids)
                            .map(|(c, &iid)| CharacteristicJson {
                                iid,
                                kind: c.kind(),
                                perms: c.kind().permissions(),
                                format: c.kind().format(),
                                value: c.kind().is_readable().then(|| c.value()).flatten(),
                            })
                            .collect(),
                    })
                    .collect(),
            })
            .collect::<Vec<_>>();

        serde_json::json!({ "accessories": accessories })
    }

    /// Event payloads for paired controllers, one per local change of an event-capable
    /// characteristic.
    pub fn events(&self) -> impl Stream<Item = EventPayload> + Send + Unpin + use<> {
        let streams = self
            .slots
            .keys()
            .filter_map(|&(aid, iid)| {
                let characteristic = self.characteristic(aid, iid).ok()?;
                let shared = characteristic.as_shared()?;
                characteristic.kind().supports_events().then(|| (aid, iid, shared.subscribe()))
            })
            .map(|(aid, iid, changes)| {
                stream::unfold(changes, move |mut changes| async move {
                    let value = changes.next_local().await?;
                    let event = CharacteristicStatus {
                        aid,
                        iid,
                        value: Some(Value::Bool(value)),
                        status: None,
                    };
                    Some((event, changes))
                })
                .boxed()
            })
            .collect::<Vec<_>>();

        stream::select_all(streams).map(|event| EventPayload { characteristics: vec![event] })
    }

    pub fn identify_requests(&self) -> broadcast::Receiver<u64> {
        self.identify.subscribe()
    }
}

#[derive(Debug, Serialize)]
struct AccessoryJson {
    aid: u64,
    services: Vec<ServiceJson>,
}

#[derive(Debug, Serialize)]
struct ServiceJson {
    iid: u64,
    #[serde(rename = "type")]
    kind: ServiceKind,
    #[serde(skip_serializing_if = "core::ops::Not::not")]
    primary: bool,
    characteristics: Vec<CharacteristicJson>,
}

#[derive(Debug, Serialize)]
struct CharacteristicJson {
    iid: u64,
    #[serde(rename = "type")]
    kind: CharacteristicKind,
    perms: &'static [Permission],
    format: Format,
    #[serde(skip_serializing_if = "Option::is_none")]
    value: Option<Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CharacteristicStatus {
    pub aid: u64,
    pub iid: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<i32>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReadResponse {
    pub characteristics: Vec<CharacteristicStatus>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventPayload {
    pub characteristics: Vec<CharacteristicStatus>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WriteRequest {
    pub characteristics: Vec<WriteEntry>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WriteEntry {
    pub aid: u64,
    pub iid: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<serde_json::Value>,
    /// Event subscription flag. Validated against `ev` permissions, otherwise ignored
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ev: Option<bool>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WriteResponse {
    pub characteristics: Vec<WriteStatus>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WriteStatus {
    pub aid: u64,
    pub iid: u64,
    pub status: i32,
}

/// Server that keeps the attribute database in-process, for callers that drive reads and writes
/// themselves.
#[derive(Default)]
pub struct LocalServer {
    database: OnceLock<AttributeDatabase>,
}

impl LocalServer {
    pub fn database(&self) -> Option<&AttributeDatabase> {
        self.database.get()
    }
}

impl AccessoryServer for LocalServer {
    type Error = Error;

    async fn register(&self, config: Arc<ServerConfiguration>) -> Result<(), Self::Error> {
        self.database
            .set(AttributeDatabase::new(config))
            .map_err(|_| Error::AlreadyRegistered)
    }
}

#[cfg(test)]
mod tests {
    use futures::StreamExt as _;
    use serde_json::json;

    use super::*;
    use crate::clock::build_configuration;

    fn database() -> AttributeDatabase {
        AttributeDatabase::new(Arc::new(build_configuration()))
    }

    #[test]
    fn accessories_document() {
        assert_eq!(
            database().accessories_json(),
            json!({
                "accessories": [{
                    "aid": 1,
                    "services": [
                        {
                            "iid": 1,
                            "type": "3E",
                            "characteristics": [
                                { "iid": 2, "type": "23", "perms": ["pr"], "format": "string", "value": "Equinox Clock" },
                                { "iid": 3, "type": "20", "perms": ["pr"], "format": "string", "value": "Arduino HomeKit" },
                                { "iid": 4, "type": "30", "perms": ["pr"], "format": "string", "value": "0123456" },
                                { "iid": 5, "type": "21", "perms": ["pr"], "format": "string", "value": "ESP8266" },
                                { "iid": 6, "type": "52", "perms": ["pr"], "format": "string", "value": "1.0" },
                                { "iid": 7, "type": "14", "perms": ["pw"], "format": "bool" },
                            ],
                        },
                        {
                            "iid": 8,
                            "type": "43",
                            "primary": true,
                            "characteristics": [
                                { "iid": 9, "type": "25", "perms": ["pr", "pw", "ev"], "format": "bool", "value": true },
                                { "iid": 10, "type": "23", "perms": ["pr"], "format": "string", "value": "Lights" },
                            ],
                        },
                    ],
                }],
            })
        );
    }

    #[test]
    fn lookup_iids() {
        let db = database();
        assert_eq!(db.iid_of(1, ServiceKind::Lightbulb, CharacteristicKind::On), Some(9));
        assert_eq!(db.iid_of(1, ServiceKind::Lightbulb, CharacteristicKind::Name), Some(10));
        assert_eq!(db.iid_of(1, ServiceKind::AccessoryInformation, CharacteristicKind::Name), Some(2));
        assert_eq!(db.iid_of(2, ServiceKind::Lightbulb, CharacteristicKind::On), None);
    }

    #[test]
    fn read_characteristics() {
        let db = database();

        assert_eq!(db.read(1, 9), Ok(Value::Bool(true)));
        assert_eq!(db.read(1, 10), Ok(Value::from("Lights")));
        assert_eq!(db.read(1, 7), Err(AttributeError::WriteOnly));
        assert_eq!(db.read(1, 1), Err(AttributeError::ResourceDoesNotExist));
        assert_eq!(db.read(2, 9), Err(AttributeError::ResourceDoesNotExist));
    }

    #[test]
    fn read_request_statuses() {
        let db = database();

        assert_eq!(
            serde_json::to_value(db.read_request(&[(1, 9), (1, 2)])).unwrap(),
            json!({ "characteristics": [
                { "aid": 1, "iid": 9, "value": true },
                { "aid": 1, "iid": 2, "value": "Equinox Clock" },
            ]})
        );

        assert_eq!(
            serde_json::to_value(db.read_request(&[(1, 9), (1, 7)])).unwrap(),
            json!({ "characteristics": [
                { "aid": 1, "iid": 9, "value": true, "status": 0 },
                { "aid": 1, "iid": 7, "status": -70405 },
            ]})
        );
    }

    #[test]
    fn write_characteristics() {
        let db = database();
        let on = db.configuration().shared(1, CharacteristicKind::On).unwrap().clone();

        assert_eq!(db.write(1, 9, &json!(false)), Ok(()));
        assert!(!on.get_value());
        assert_eq!(db.write(1, 9, &json!(1)), Ok(()));
        assert!(on.get_value());

        assert_eq!(db.write(1, 9, &json!("off")), Err(AttributeError::InvalidValue));
        assert_eq!(db.write(1, 10, &json!("Lamp")), Err(AttributeError::ReadOnly));
        assert_eq!(db.write(1, 42, &json!(true)), Err(AttributeError::ResourceDoesNotExist));
        assert_eq!(db.read(1, 10), Ok(Value::from("Lights")));
    }

    #[test]
    fn write_request_statuses() {
        let db = database();

        let request: WriteRequest = serde_json::from_value(json!({ "characteristics": [
            { "aid": 1, "iid": 9, "value": false },
            { "aid": 1, "iid": 9, "ev": true },
        ]}))
        .unwrap();
        assert_eq!(db.write_request(&request), None);

        let request: WriteRequest = serde_json::from_value(json!({ "characteristics": [
            { "aid": 1, "iid": 9, "value": true },
            { "aid": 1, "iid": 10, "ev": true },
            { "aid": 1, "iid": 4, "value": "1" },
        ]}))
        .unwrap();
        assert_eq!(
            serde_json::to_value(db.write_request(&request)).unwrap(),
            json!({ "characteristics": [
                { "aid": 1, "iid": 9, "status": 0 },
                { "aid": 1, "iid": 10, "status": -70406 },
                { "aid": 1, "iid": 4, "status": -70404 },
            ]})
        );
        assert_eq!(db.read(1, 9), Ok(Value::Bool(true)));
    }

    #[tokio::test]
    async fn ev_flag_keeps_no_subscription() {
        let db = database();
        let mut events = db.events();

        let request: WriteRequest = serde_json::from_value(json!({ "characteristics": [
            { "aid": 1, "iid": 9, "ev": false },
            { "aid": 1, "iid": 10, "ev": false },
        ]}))
        .unwrap();
        assert_eq!(db.write_request(&request), None);

        // events still flow after an unsubscribe
        let lights = db.configuration().shared(1, CharacteristicKind::On).unwrap();
        lights.set_value(false);
        lights.notify();
        assert_eq!(
            serde_json::to_value(events.next().await.unwrap()).unwrap(),
            json!({ "characteristics": [{ "aid": 1, "iid": 9, "value": false }] })
        );
    }

    #[tokio::test]
    async fn identify() {
        let db = database();
        let mut requests = db.identify_requests();

        assert_eq!(db.write(1, 7, &json!(false)), Ok(()));
        assert_eq!(db.write(1, 7, &json!(true)), Ok(()));
        assert_eq!(requests.recv().await.unwrap(), 1);
        assert!(requests.try_recv().is_err());
    }

    #[tokio::test]
    async fn remote_writes_reach_hardware() {
        let db = database();
        let on = db.configuration().shared(1, CharacteristicKind::On).unwrap().clone();
        let mut hardware = on.subscribe();

        db.write(1, 9, &json!(false)).unwrap();

        assert_eq!(hardware.next_remote().await, Some(false));
    }

    #[tokio::test]
    async fn local_changes_become_events() {
        let db = database();
        let on = db.configuration().shared(1, CharacteristicKind::On).unwrap().clone();
        let mut events = db.events();

        // remote writes are not echoed back as events
        db.write(1, 9, &json!(true)).unwrap();
        on.set_value(false);
        on.notify();

        assert_eq!(
            serde_json::to_value(events.next().await.unwrap()).unwrap(),
            json!({ "characteristics": [{ "aid": 1, "iid": 9, "value": false }] })
        );
    }

    #[tokio::test]
    async fn register_once() {
        let server = LocalServer::default();
        assert!(server.database().is_none());

        server.register(Arc::new(build_configuration())).await.unwrap();
        assert!(server.database().is_some());

        assert!(matches!(
            server.register(Arc::new(build_configuration())).await,
            Err(Error::AlreadyRegistered)
        ));
    }
}
