use super::records::{EventRecord, QrEventRecord, ResidentId, ResidentRecord};
use super::response::{self, HttpReply};
use super::state::{
    AdminSettings, ACCESS_EVENTS_PATH, QR_EVENTS_PATH, RESIDENTS_PATH, RESIDENT_ITEM_PATH,
};
use crate::error::AdminError;
#[cfg(not(target_arch = "wasm32"))]
use super::http as transport;
#[cfg(all(target_arch = "wasm32", feature = "web-gui"))]
use super::wasm_api as transport;
use log::info;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Delete,
}

impl Method {
    pub fn as_str(&self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Delete => "DELETE",
        }
    }
}

async fn send(method: Method, url: &str) -> Result<HttpReply, AdminError> {
    transport::send(method, url).await
}

/// Fetch the household access log
pub async fn fetch_access_events(settings: &AdminSettings) -> Result<Vec<EventRecord>, AdminError> {
    let url = settings.endpoint(ACCESS_EVENTS_PATH);
    info!("Fetching access events from: {}", url);

    let reply = send(Method::Get, &url).await?;
    let rows = response::parse_access_events(&reply)?;

    info!("Fetched {} access events", rows.len());
    Ok(rows)
}

/// Fetch the visitor QR log
pub async fn fetch_qr_events(settings: &AdminSettings) -> Result<Vec<QrEventRecord>, AdminError> {
    let url = settings.endpoint(QR_EVENTS_PATH);
    info!("Fetching visitor QR events from: {}", url);

    let reply = send(Method::Get, &url).await?;
    let rows = response::parse_qr_events(&reply)?;

    info!("Fetched {} visitor QR events", rows.len());
    Ok(rows)
}

pub async fn fetch_residents(settings: &AdminSettings) -> Result<Vec<ResidentRecord>, AdminError> {
    let url = settings.endpoint(RESIDENTS_PATH);
    info!("Fetching residents from: {}", url);

    let reply = send(Method::Get, &url).await?;
    let rows = response::parse_residents(&reply)?;

    info!("Fetched {} residents", rows.len());
    Ok(rows)
}

/// Delete one resident registration. Succeeds only on a 2xx `{ok: true}`.
pub async fn delete_resident(settings: &AdminSettings, id: ResidentId) -> Result<(), AdminError> {
    let url = settings.endpoint(&format!("{}/{}", RESIDENT_ITEM_PATH, id));
    info!("Deleting resident {} at: {}", id, url);

    let reply = send(Method::Delete, &url).await?;
    response::parse_delete(&reply)?;

    info!("Deleted resident {}", id);
    Ok(())
}
