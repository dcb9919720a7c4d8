use super::api::Method;
use super::response::HttpReply;
use crate::error::AdminError;
use log::debug;
use reqwest::Client;

/// Create HTTP client for API requests.
///
/// Redirects are not followed: the backend answers an expired session with
/// a redirect to its login form, which should surface as a status error.
fn create_http_client() -> Result<Client, AdminError> {
    Client::builder()
        .redirect(reqwest::redirect::Policy::none())
        .build()
        .map_err(|e| AdminError::Network(format!("Failed to create HTTP client: {}", e)))
}

pub async fn send(method: Method, url: &str) -> Result<HttpReply, AdminError> {
    let client = create_http_client()?;
    let request = match method {
        Method::Get => client.get(url),
        Method::Delete => client.delete(url),
    };

    let response = request
        .send()
        .await
        .map_err(|e| AdminError::Network(e.to_string()))?;

    let status = response.status().as_u16();
    let body = response
        .text()
        .await
        .map_err(|e| AdminError::Network(format!("Failed to read response: {}", e)))?;

    debug!("{} {} -> {} ({} bytes)", method.as_str(), url, status, body.len());
    Ok(HttpReply { status, body })
}
