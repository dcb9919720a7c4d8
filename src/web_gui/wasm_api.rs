use super::api::Method;
use super::response::HttpReply;
use crate::error::AdminError;
use wasm_bindgen::JsCast;
use wasm_bindgen_futures::JsFuture;
use web_sys::{Request, RequestInit, RequestMode, Response};

/// Make an HTTP request using the browser's fetch API.
///
/// A rejected fetch promise is a network failure; any status, including
/// errors, comes back as an [`HttpReply`] for the caller to judge.
pub async fn send(method: Method, url: &str) -> Result<HttpReply, AdminError> {
    let window = web_sys::window().ok_or_else(|| AdminError::Network("No window object".to_string()))?;

    let opts = RequestInit::new();
    opts.set_method(method.as_str());
    opts.set_mode(RequestMode::Cors);

    let request = Request::new_with_str_and_init(url, &opts)
        .map_err(|e| AdminError::Network(format!("Failed to create request: {:?}", e)))?;

    let resp_value = JsFuture::from(window.fetch_with_request(&request))
        .await
        .map_err(|e| AdminError::Network(format!("{:?}", e)))?;

    let resp: Response = resp_value
        .dyn_into()
        .map_err(|e| AdminError::Network(format!("Failed to cast response: {:?}", e)))?;

    let text_promise = resp
        .text()
        .map_err(|e| AdminError::Network(format!("Failed to get text promise: {:?}", e)))?;

    let text_value = JsFuture::from(text_promise)
        .await
        .map_err(|e| AdminError::Network(format!("Failed to get text: {:?}", e)))?;

    let body = text_value
        .as_string()
        .ok_or_else(|| AdminError::Parse("Response is not a string".to_string()))?;

    Ok(HttpReply {
        status: resp.status(),
        body,
    })
}
