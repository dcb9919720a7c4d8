//! Adapters from backend response bodies to normalized records.
//!
//! Every endpoint has answered in more than one shape over time. Each shape
//! we accept is a variant of an untagged enum below; anything else is an
//! [`AdminError::UnexpectedShape`] rather than a silently empty table.

use super::records::{
    normalize_access, normalize_qr, normalize_residents, EventRecord, QrEventRecord, RawEvent,
    RawResident, ResidentRecord,
};
use crate::error::AdminError;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;

/// Status and body of a finished HTTP exchange.
#[derive(Debug, Clone)]
pub struct HttpReply {
    pub status: u16,
    pub body: String,
}

impl HttpReply {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// `{ok, rows}` wrapper of the event endpoints.
#[derive(Debug, Deserialize)]
struct EventEnvelope<R> {
    ok: Option<bool>,
    error: Option<String>,
    rows: Option<R>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum AccessRows {
    Bare(Vec<RawEvent>),
    Nested { access_events: Vec<RawEvent> },
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum QrRows {
    Bare(Vec<RawEvent>),
    Nested { qr_events: Vec<RawEvent> },
}

/// Field order is the lookup precedence when several keys are present.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ResidentList {
    Bare(Vec<RawResident>),
    Registrations { registrations: Vec<RawResident> },
    Items { items: Vec<RawResident> },
    Data { data: Vec<RawResident> },
}

#[derive(Debug, Deserialize)]
struct DeleteReply {
    #[serde(default)]
    ok: bool,
    error: Option<String>,
}

impl AccessRows {
    fn into_rows(self) -> Vec<RawEvent> {
        match self {
            AccessRows::Bare(rows) => rows,
            AccessRows::Nested { access_events } => access_events,
        }
    }
}

impl QrRows {
    fn into_rows(self) -> Vec<RawEvent> {
        match self {
            QrRows::Bare(rows) => rows,
            QrRows::Nested { qr_events } => qr_events,
        }
    }
}

impl ResidentList {
    fn into_rows(self) -> Vec<RawResident> {
        match self {
            ResidentList::Bare(rows) => rows,
            ResidentList::Registrations { registrations } => registrations,
            ResidentList::Items { items } => items,
            ResidentList::Data { data } => data,
        }
    }
}

/// A login redirect that was followed ends in an HTML page, not JSON.
fn check_html_response(body: &str) -> Result<(), AdminError> {
    let head = body.trim_start();
    if head.starts_with("<!DOCTYPE") || head.starts_with("<!doctype") || head.starts_with("<html") {
        return Err(AdminError::Parse(
            "server returned an HTML page instead of JSON; the session may have expired".to_string(),
        ));
    }
    Ok(())
}

fn check_status(reply: &HttpReply) -> Result<(), AdminError> {
    if reply.is_success() {
        return Ok(());
    }
    Err(AdminError::Server {
        status: reply.status,
        body: reply.body.clone(),
    })
}

fn parse_json(body: &str) -> Result<Value, AdminError> {
    check_html_response(body)?;
    Ok(serde_json::from_str(body)?)
}

fn parse_shape<T: DeserializeOwned>(value: Value, what: &str) -> Result<T, AdminError> {
    serde_json::from_value(value).map_err(|e| AdminError::UnexpectedShape(format!("{}: {}", what, e)))
}

fn parse_event_rows<R: DeserializeOwned>(reply: &HttpReply, what: &str) -> Result<Option<R>, AdminError> {
    check_status(reply)?;
    let value = parse_json(&reply.body)?;
    let envelope: EventEnvelope<R> = parse_shape(value, what)?;
    if envelope.ok == Some(false) {
        return Err(AdminError::Rejected(
            envelope.error.unwrap_or_else(|| format!("{} request was rejected", what)),
        ));
    }
    Ok(envelope.rows)
}

pub fn parse_access_events(reply: &HttpReply) -> Result<Vec<EventRecord>, AdminError> {
    let rows = parse_event_rows::<AccessRows>(reply, "access events")?
        .map(AccessRows::into_rows)
        .unwrap_or_default();
    Ok(normalize_access(rows))
}

pub fn parse_qr_events(reply: &HttpReply) -> Result<Vec<QrEventRecord>, AdminError> {
    let rows = parse_event_rows::<QrRows>(reply, "qr events")?
        .map(QrRows::into_rows)
        .unwrap_or_default();
    Ok(normalize_qr(rows))
}

pub fn parse_residents(reply: &HttpReply) -> Result<Vec<ResidentRecord>, AdminError> {
    check_status(reply)?;
    let value = parse_json(&reply.body)?;
    let list: ResidentList = parse_shape(value, "residents")?;
    Ok(normalize_residents(list.into_rows()))
}

/// Generic message used when a failed delete carries no `error` field.
pub const DELETE_FALLBACK_ERROR: &str = "server error";

/// Outcome of `DELETE /admin/residents/{id}`. Success needs both a 2xx status
/// and `ok: true`.
pub fn parse_delete(reply: &HttpReply) -> Result<(), AdminError> {
    let parsed: Result<DeleteReply, AdminError> = parse_json(&reply.body)
        .and_then(|value| parse_shape(value, "delete"));

    match parsed {
        Ok(DeleteReply { ok: true, .. }) if reply.is_success() => Ok(()),
        Ok(DeleteReply { error, .. }) => Err(AdminError::Rejected(
            error.unwrap_or_else(|| DELETE_FALLBACK_ERROR.to_string()),
        )),
        Err(_) if !reply.is_success() => Err(AdminError::Server {
            status: reply.status,
            body: reply.body.clone(),
        }),
        Err(e) => Err(e),
    }
}
