//! Event Reconciler
//!
//! Turns the hub's event stream into registry mutations.
//!
//! ```text
//!   WebSocket text ──parse──▶ HubEvent ──apply──▶ DeviceRegistry
//!                                 │                     │
//!                                 ▼                     ▼
//!                            Reconciled ──────▶ caller logs / re-renders
//! ```
//!
//! Events arrive one JSON object per message, tagged by their `name` field:
//!
//! | kind      | payload                                   |
//! |-----------|-------------------------------------------|
//! | `add`     | `rotator` (full record) or `rotator_name` |
//! | `remove`  | `rotator_name`                            |
//! | `heading` | `rotator_name`, partial `heading`         |
//!
//! The reconciler never performs I/O. When an event only names a rotator,
//! or a fresh stream needs a snapshot, the returned [`Reconciled`] tells the
//! caller what to fetch; the caller feeds the result back in.

use serde_json::{Map, Value};

use crate::axis::Axis;
use crate::connection::ConnectionManager;
use crate::error::{EventError, RegistryError};
use crate::registry::DeviceRegistry;
use crate::rotator::{HeadingUpdate, RotatorObject, RotatorRecord};

// =============================================================================
// Hub events
// =============================================================================

/// One decoded message from the hub
#[derive(Debug, Clone, PartialEq)]
pub enum HubEvent {
    /// A new rotator with its full record
    Add(RotatorRecord),
    /// A new rotator known only by name; its record must be fetched
    Announce(String),
    Remove(String),
    Heading { name: String, heading: HeadingUpdate },
    /// Well-formed event of a kind this client does not handle
    Unknown(String),
}

impl HubEvent {
    pub fn parse(text: &str) -> Result<Self, EventError> {
        let value: Value = serde_json::from_str(text)?;
        let obj = value
            .as_object()
            .ok_or_else(|| EventError::Malformed("expected a JSON object".into()))?;
        let kind = obj
            .get("name")
            .and_then(Value::as_str)
            .ok_or(EventError::MissingKind)?;

        match kind {
            "add" => {
                if let Some(rotator) = obj.get("rotator") {
                    Ok(HubEvent::Add(parse_record(rotator.clone())?))
                } else {
                    let name = str_field(obj, "add", "rotator_name")?;
                    Ok(HubEvent::Announce(name))
                }
            }
            "remove" => Ok(HubEvent::Remove(str_field(obj, "remove", "rotator_name")?)),
            "heading" => {
                let name = str_field(obj, "heading", "rotator_name")?;
                let heading = obj.get("heading").ok_or(EventError::MissingField {
                    kind: "heading",
                    field: "heading",
                })?;
                let heading: HeadingUpdate = serde_json::from_value(heading.clone())?;
                Ok(HubEvent::Heading { name, heading })
            }
            other => Ok(HubEvent::Unknown(other.to_string())),
        }
    }
}

fn str_field(
    obj: &Map<String, Value>,
    kind: &'static str,
    field: &'static str,
) -> Result<String, EventError> {
    obj.get(field)
        .and_then(Value::as_str)
        .map(str::to_string)
        .ok_or(EventError::MissingField { kind, field })
}

/// Decode one record in hub wire format
pub fn parse_record(value: Value) -> Result<RotatorRecord, EventError> {
    let object: RotatorObject = serde_json::from_value(value)?;
    RotatorRecord::try_from(object)
}

/// Decode the `/rotators` snapshot.
///
/// The hub returns a map of name to record; a plain array is accepted too.
/// Entries that fail to decode are returned alongside the good ones so one
/// bad device does not hide the rest.
pub fn parse_snapshot(text: &str) -> Result<(Vec<RotatorRecord>, Vec<EventError>), EventError> {
    let value: Value = serde_json::from_str(text)?;
    let entries: Vec<Value> = match value {
        Value::Object(map) => map.into_iter().map(|(_, v)| v).collect(),
        Value::Array(list) => list,
        Value::Null => Vec::new(),
        _ => return Err(EventError::Malformed("expected a map of rotators".into())),
    };

    let mut records = Vec::new();
    let mut errors = Vec::new();
    for entry in entries {
        match parse_record(entry) {
            Ok(r) => records.push(r),
            Err(e) => errors.push(e),
        }
    }
    Ok((records, errors))
}

// =============================================================================
// Outcomes
// =============================================================================

/// Why an event left the registry untouched
#[derive(Debug, Clone, PartialEq)]
pub enum Ignored {
    Malformed(EventError),
    UnknownKind(String),
    /// `remove` or `heading` for a rotator not in the registry
    UnknownRotator(String),
}

impl std::fmt::Display for Ignored {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Ignored::Malformed(e) => write!(f, "{}", e),
            Ignored::UnknownKind(kind) => write!(f, "unknown event kind '{}'", kind),
            Ignored::UnknownRotator(name) => write!(f, "unknown rotator '{}'", name),
        }
    }
}

/// What a reconciler call did
#[derive(Debug, Clone, PartialEq)]
pub enum Reconciled {
    Added(String),
    /// `add` for a name already present
    AlreadyPresent(String),
    Removed(String),
    HeadingChanged(String),
    /// Heading event that repeated the stored values
    HeadingUnchanged(String),
    /// Caller must fetch this record and pass it to [`EventReconciler::add`]
    FetchRequired(String),
    /// Caller must fetch the full device list and pass it to
    /// [`EventReconciler::apply_snapshot`]
    SnapshotRequired,
    /// Transport closed, every record dropped
    Reset { dropped: usize },
    Ignored(Ignored),
}

impl Reconciled {
    /// Whether the visible state may have changed
    pub fn needs_render(&self) -> bool {
        matches!(
            self,
            Reconciled::Added(_)
                | Reconciled::Removed(_)
                | Reconciled::HeadingChanged(_)
                | Reconciled::Reset { .. }
        )
    }
}

// =============================================================================
// Reconciler
// =============================================================================

/// Owner of the registry and the transport state.
///
/// All mutations of the registry go through here, in event order.
#[derive(Debug, Clone, Default)]
pub struct EventReconciler {
    registry: DeviceRegistry,
    connection: ConnectionManager,
}

impl EventReconciler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn registry(&self) -> &DeviceRegistry {
        &self.registry
    }

    pub fn connection(&self) -> &ConnectionManager {
        &self.connection
    }

    /// Change which rotator a compass shows
    pub fn select(&mut self, axis: Axis, name: &str) -> Result<(), RegistryError> {
        self.registry.select(axis, name)
    }

    /// Decode and apply one message
    pub fn handle_message(&mut self, text: &str, current_time_ms: u64) -> Reconciled {
        self.connection.message_received(current_time_ms);
        match HubEvent::parse(text) {
            Ok(event) => self.apply(event),
            Err(e) => Reconciled::Ignored(Ignored::Malformed(e)),
        }
    }

    pub fn apply(&mut self, event: HubEvent) -> Reconciled {
        match event {
            HubEvent::Add(record) => self.add(record),
            HubEvent::Announce(name) => {
                if self.registry.contains(&name) {
                    Reconciled::AlreadyPresent(name)
                } else {
                    Reconciled::FetchRequired(name)
                }
            }
            HubEvent::Remove(name) => match self.registry.remove(&name) {
                Some(_) => Reconciled::Removed(name),
                None => Reconciled::Ignored(Ignored::UnknownRotator(name)),
            },
            HubEvent::Heading { name, heading } => {
                if !self.registry.contains(&name) {
                    Reconciled::Ignored(Ignored::UnknownRotator(name))
                } else if self.registry.update_heading(&name, &heading) {
                    Reconciled::HeadingChanged(name)
                } else {
                    Reconciled::HeadingUnchanged(name)
                }
            }
            HubEvent::Unknown(kind) => Reconciled::Ignored(Ignored::UnknownKind(kind)),
        }
    }

    /// Idempotent insert of a full record
    pub fn add(&mut self, record: RotatorRecord) -> Reconciled {
        let name = record.name.clone();
        if self.registry.add(record) {
            Reconciled::Added(name)
        } else {
            Reconciled::AlreadyPresent(name)
        }
    }

    /// Apply each snapshot entry as an `add`
    pub fn apply_snapshot<I>(&mut self, records: I) -> Vec<Reconciled>
    where
        I: IntoIterator<Item = RotatorRecord>,
    {
        records.into_iter().map(|r| self.add(r)).collect()
    }

    // -------------------------------------------------------------------------
    // Transport
    // -------------------------------------------------------------------------

    pub fn transport_connecting(&mut self, current_time_ms: u64) {
        self.connection.start_connecting(current_time_ms);
    }

    /// Stream is open; the caller should now load a snapshot
    pub fn transport_opened(&mut self, current_time_ms: u64) -> Reconciled {
        self.connection.connected(current_time_ms);
        Reconciled::SnapshotRequired
    }

    /// Stream or attempt failed. Drops every record, since events may have
    /// been missed while disconnected.
    pub fn transport_closed(&mut self, current_time_ms: u64) -> Reconciled {
        self.connection.error(current_time_ms);
        Reconciled::Reset {
            dropped: self.registry.reset(),
        }
    }

    /// Backoff elapsed
    pub fn transport_ready(&mut self, current_time_ms: u64) {
        self.connection.disconnected(current_time_ms);
    }

    pub fn shutdown(&mut self, current_time_ms: u64) {
        self.connection.shutdown(current_time_ms);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::connection::ConnectionState;

    const TOWER: &str = r#"{"name":"add","rotator":{"name":"tower",
        "heading":{"azimuth":10,"az_preset":10,"elevation":0,"el_preset":0},
        "config":{"has_azimuth":true,"azimuth_min":0,"azimuth_max":360,
                  "azimuth_stop":0,"has_elevation":false}}}"#;

    fn connected() -> EventReconciler {
        let mut rec = EventReconciler::new();
        rec.transport_connecting(0);
        assert_eq!(rec.transport_opened(1), Reconciled::SnapshotRequired);
        rec
    }

    #[test]
    fn test_parse_events() {
        assert!(matches!(HubEvent::parse(TOWER), Ok(HubEvent::Add(r)) if r.name == "tower"));
        assert_eq!(
            HubEvent::parse(r#"{"name":"add","rotator_name":"x"}"#),
            Ok(HubEvent::Announce("x".into()))
        );
        assert_eq!(
            HubEvent::parse(r#"{"name":"remove","rotator_name":"x"}"#),
            Ok(HubEvent::Remove("x".into()))
        );
        assert_eq!(
            HubEvent::parse(r#"{"name":"heading","rotator_name":"x","heading":{"azimuth":5}}"#),
            Ok(HubEvent::Heading {
                name: "x".into(),
                heading: HeadingUpdate {
                    azimuth: Some(5.0),
                    ..Default::default()
                }
            })
        );
        assert_eq!(
            HubEvent::parse(r#"{"name":"rename"}"#),
            Ok(HubEvent::Unknown("rename".into()))
        );
    }

    #[test]
    fn test_parse_errors() {
        assert!(matches!(HubEvent::parse("not json"), Err(EventError::Malformed(_))));
        assert!(matches!(HubEvent::parse("[1,2]"), Err(EventError::Malformed(_))));
        assert_eq!(HubEvent::parse(r#"{"x":1}"#), Err(EventError::MissingKind));
        assert_eq!(
            HubEvent::parse(r#"{"name":"remove"}"#),
            Err(EventError::MissingField {
                kind: "remove",
                field: "rotator_name"
            })
        );
        assert_eq!(
            HubEvent::parse(r#"{"name":"heading","rotator_name":"x"}"#),
            Err(EventError::MissingField {
                kind: "heading",
                field: "heading"
            })
        );
        assert_eq!(
            HubEvent::parse(r#"{"name":"add","rotator":{"name":"n","config":{}}}"#),
            Err(EventError::NoCapability("n".into()))
        );
    }

    #[test]
    fn test_add_twice_is_idempotent() {
        let mut rec = connected();
        assert_eq!(rec.handle_message(TOWER, 2), Reconciled::Added("tower".into()));
        assert_eq!(
            rec.handle_message(TOWER, 3),
            Reconciled::AlreadyPresent("tower".into())
        );
        assert_eq!(rec.registry().len(), 1);
    }

    #[test]
    fn test_announce_requires_fetch() {
        let mut rec = connected();
        let out = rec.handle_message(r#"{"name":"add","rotator_name":"tower"}"#, 2);
        assert_eq!(out, Reconciled::FetchRequired("tower".into()));
        assert!(!out.needs_render());
        assert!(rec.registry().is_empty());

        rec.handle_message(TOWER, 3);
        let out = rec.handle_message(r#"{"name":"add","rotator_name":"tower"}"#, 4);
        assert_eq!(out, Reconciled::AlreadyPresent("tower".into()));
    }

    #[test]
    fn test_unknown_rotator_is_ignored() {
        let mut rec = connected();
        let out = rec.handle_message(
            r#"{"name":"heading","rotator_name":"ghost","heading":{"azimuth":1}}"#,
            2,
        );
        assert_eq!(out, Reconciled::Ignored(Ignored::UnknownRotator("ghost".into())));
        let out = rec.handle_message(r#"{"name":"remove","rotator_name":"ghost"}"#, 3);
        assert!(!out.needs_render());
        assert!(rec.registry().is_empty());
    }

    #[test]
    fn test_malformed_leaves_state_untouched() {
        let mut rec = connected();
        rec.handle_message(TOWER, 2);
        let out = rec.handle_message("{oops", 3);
        assert!(matches!(out, Reconciled::Ignored(Ignored::Malformed(_))));
        let out = rec.handle_message(r#"{"name":"teleport"}"#, 4);
        assert_eq!(out, Reconciled::Ignored(Ignored::UnknownKind("teleport".into())));
        assert_eq!(rec.registry().len(), 1);
    }

    #[test]
    fn test_heading_event_scenario() {
        let mut rec = connected();
        let add = r#"{"name":"add","rotator":{"name":"A",
            "heading":{"azimuth":10,"az_preset":10},
            "config":{"has_azimuth":true,"azimuth_min":0,"azimuth_max":360}}}"#;
        assert_eq!(rec.handle_message(add, 2), Reconciled::Added("A".into()));
        assert_eq!(rec.registry().selected(Axis::Azimuth), Some("A"));

        let heading = r#"{"name":"heading","rotator_name":"A",
            "heading":{"azimuth":50,"az_preset":90}}"#;
        let out = rec.handle_message(heading, 3);
        assert_eq!(out, Reconciled::HeadingChanged("A".into()));
        assert!(out.needs_render());
        let a = rec.registry().get("A").unwrap();
        assert_eq!(a.azimuth, 50.0);
        assert_eq!(a.az_preset, 90.0);
        assert!(a.is_turning(Axis::Azimuth));

        assert_eq!(
            rec.handle_message(heading, 4),
            Reconciled::HeadingUnchanged("A".into())
        );
    }

    #[test]
    fn test_transport_close_resets() {
        let mut rec = connected();
        rec.handle_message(TOWER, 2);
        rec.handle_message(
            r#"{"name":"add","rotator":{"name":"mast","config":{"has_elevation":true}}}"#,
            2,
        );
        assert_eq!(rec.registry().selected(Axis::Azimuth), Some("tower"));
        assert_eq!(rec.registry().selected(Axis::Elevation), Some("mast"));

        let out = rec.transport_closed(3);
        assert_eq!(out, Reconciled::Reset { dropped: 2 });
        assert!(out.needs_render());
        assert!(rec.registry().is_empty());
        assert_eq!(rec.registry().selected(Axis::Azimuth), None);
        assert_eq!(rec.registry().selected(Axis::Elevation), None);
        assert_eq!(rec.connection().state(), ConnectionState::Error);

        rec.transport_ready(1000);
        assert!(rec.connection().should_reconnect());
    }

    #[test]
    fn test_snapshot_map() {
        let text = r#"{
            "b": {"name":"b","config":{"has_azimuth":true}},
            "a": {"name":"a","config":{"has_elevation":true}},
            "bad": {"name":"bad","config":{}}
        }"#;
        let (records, errors) = parse_snapshot(text).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(errors, vec![EventError::NoCapability("bad".into())]);

        let mut rec = connected();
        rec.handle_message(r#"{"name":"add","rotator":{"name":"a","config":{"has_elevation":true}}}"#, 2);
        let outcomes = rec.apply_snapshot(records);
        assert!(outcomes.contains(&Reconciled::Added("b".into())));
        assert!(outcomes.contains(&Reconciled::AlreadyPresent("a".into())));
        assert_eq!(rec.registry().len(), 2);
    }

    #[test]
    fn test_snapshot_array_and_null() {
        let (records, _) = parse_snapshot(r#"[{"name":"x","config":{"has_azimuth":true}}]"#).unwrap();
        assert_eq!(records[0].name, "x");
        let (records, _) = parse_snapshot("null").unwrap();
        assert!(records.is_empty());
        assert!(parse_snapshot("42").is_err());
    }

    #[test]
    fn test_select_through_reconciler() {
        let mut rec = connected();
        rec.handle_message(TOWER, 2);
        assert!(rec.select(Axis::Azimuth, "tower").is_ok());
        assert!(rec.select(Axis::Elevation, "tower").is_err());
    }
}
