//! Geometry download from the review backend

use provenance_core::{parse_layout, DocumentGeometry, DocumentId, ProvenanceError};
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use wasm_bindgen_futures::JsFuture;
use web_sys::{Request, RequestInit, RequestMode, Response};

/// GET `url` and parse the layout payload for `document_id`
pub async fn fetch_geometry(
    url: &str,
    document_id: &DocumentId,
) -> Result<DocumentGeometry, ProvenanceError> {
    let json = fetch_text(url)
        .await
        .map_err(|e| ProvenanceError::geometry_unavailable(document_id, js_error_text(&e)))?;
    parse_layout(document_id.clone(), &json)
}

async fn fetch_text(url: &str) -> Result<String, JsValue> {
    let window = web_sys::window().ok_or_else(|| JsValue::from_str("No window object"))?;

    let opts = RequestInit::new();
    opts.set_method("GET");
    opts.set_mode(RequestMode::Cors);

    let request = Request::new_with_str_and_init(url, &opts)?;
    request.headers().set("Accept", "application/json")?;

    let response = JsFuture::from(window.fetch_with_request(&request)).await?;
    let response: Response = response.dyn_into()?;

    if !response.ok() {
        return Err(JsValue::from_str(&format!(
            "Layout request failed: {}",
            response.status()
        )));
    }

    let text = JsFuture::from(response.text()?).await?;
    text.as_string()
        .ok_or_else(|| JsValue::from_str("Layout response was not text"))
}

/// Best-effort message from a thrown JS value
pub fn js_error_text(value: &JsValue) -> String {
    value
        .as_string()
        .or_else(|| {
            value
                .dyn_ref::<js_sys::Error>()
                .map(|e| String::from(e.message()))
        })
        .unwrap_or_else(|| format!("{:?}", value))
}
