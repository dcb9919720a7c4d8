use crate::format::to_date_time;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// Identifier of a resident registration, as used in the delete route.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ResidentId(pub i64);

impl fmt::Display for ResidentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Row of the household access log. Event ids come from the device API
/// unchanged and may be text, so they are kept as display strings.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EventRecord {
    pub id: String,
    pub device_id: String,
    pub images_dir: String,
    pub event_time: String,
}

/// Row of the visitor QR log.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QrEventRecord {
    pub id: String,
    pub phone: String,
    pub purpose: String,
    pub status: String,
    pub device_id: String,
    pub event_time: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResidentRecord {
    pub id: Option<ResidentId>,
    pub name: String,
    pub phone: String,
    pub unit: String,
    pub created_at: String,
}

/// Event row as the backend sends it. Field names vary between devices and
/// API versions, so everything is optional and loosely typed.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawEvent {
    pub id: Option<Value>,
    pub device_id: Option<Value>,
    pub images_dir: Option<Value>,
    pub requested_at: Option<Value>,
    pub event_time: Option<Value>,
    pub timestamp: Option<Value>,
    pub phone: Option<Value>,
    pub purpose: Option<Value>,
    pub status: Option<Value>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawResident {
    pub id: Option<Value>,
    pub name: Option<Value>,
    pub phone: Option<Value>,
    pub tel: Option<Value>,
    pub unit: Option<Value>,
    pub unit_number: Option<Value>,
    pub dong: Option<Value>,
    pub ho: Option<Value>,
    pub created_at: Option<Value>,
    pub requested_at: Option<Value>,
    pub approved_at: Option<Value>,
}

/// Display text of a JSON scalar. `null` and absent fields read as empty.
fn text(v: Option<&Value>) -> String {
    match v {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
    }
}

/// Resident id, accepting both `12` and `"12"`.
fn resident_id(v: Option<&Value>) -> Option<ResidentId> {
    match v? {
        Value::Number(n) => n.as_i64().map(ResidentId),
        Value::String(s) => s.trim().parse().ok().map(ResidentId),
        _ => None,
    }
}

impl RawEvent {
    fn event_time(&self) -> String {
        let raw = self
            .requested_at
            .as_ref()
            .or(self.event_time.as_ref())
            .or(self.timestamp.as_ref());
        to_date_time(&text(raw))
    }
}

impl From<RawEvent> for EventRecord {
    fn from(raw: RawEvent) -> Self {
        Self {
            id: text(raw.id.as_ref()),
            device_id: text(raw.device_id.as_ref()),
            images_dir: text(raw.images_dir.as_ref()),
            event_time: raw.event_time(),
        }
    }
}

impl From<RawEvent> for QrEventRecord {
    fn from(raw: RawEvent) -> Self {
        Self {
            id: text(raw.id.as_ref()),
            phone: text(raw.phone.as_ref()),
            purpose: text(raw.purpose.as_ref()),
            status: text(raw.status.as_ref()),
            device_id: text(raw.device_id.as_ref()),
            event_time: raw.event_time(),
        }
    }
}

/// `unit`, else `unit_number`, else `dong-ho`, with one leading and one
/// trailing hyphen removed so a missing half does not leave a dangling dash.
pub fn derive_unit(
    unit: Option<&Value>,
    unit_number: Option<&Value>,
    dong: Option<&Value>,
    ho: Option<&Value>,
) -> String {
    let joined = match unit.or(unit_number) {
        Some(v) => text(Some(v)),
        None => format!("{}-{}", text(dong), text(ho)),
    };
    let trimmed = joined.strip_prefix('-').unwrap_or(&joined);
    trimmed.strip_suffix('-').unwrap_or(trimmed).to_string()
}

impl From<RawResident> for ResidentRecord {
    fn from(raw: RawResident) -> Self {
        let created_at = [&raw.created_at, &raw.requested_at, &raw.approved_at]
            .into_iter()
            .map(|v| text(v.as_ref()))
            .find(|s| !s.is_empty())
            .unwrap_or_default()
            .replacen('T', " ", 1);

        Self {
            id: resident_id(raw.id.as_ref()),
            name: text(raw.name.as_ref()),
            phone: text(raw.phone.as_ref().or(raw.tel.as_ref())),
            unit: derive_unit(
                raw.unit.as_ref(),
                raw.unit_number.as_ref(),
                raw.dong.as_ref(),
                raw.ho.as_ref(),
            ),
            created_at,
        }
    }
}

pub fn normalize_access(rows: Vec<RawEvent>) -> Vec<EventRecord> {
    rows.into_iter().map(EventRecord::from).collect()
}

pub fn normalize_qr(rows: Vec<RawEvent>) -> Vec<QrEventRecord> {
    rows.into_iter().map(QrEventRecord::from).collect()
}

pub fn normalize_residents(rows: Vec<RawResident>) -> Vec<ResidentRecord> {
    rows.into_iter().map(ResidentRecord::from).collect()
}
