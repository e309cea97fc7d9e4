//! pdf.js viewer driven through the JS bridge module

use provenance_core::{NavigationOutcome, NavigationStep, PdfNavigationBridge, PdfSurface};
use std::time::Duration;
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::JsFuture;

// External JavaScript functions from provenance-bridge.js
#[wasm_bindgen(module = "/www/js/provenance-bridge.js")]
extern "C" {
    #[wasm_bindgen(js_name = isViewerReady)]
    fn is_viewer_ready() -> bool;

    #[wasm_bindgen(js_name = goToPage)]
    fn go_to_page_internal(page: u32);

    #[wasm_bindgen(js_name = highlightText)]
    fn highlight_text_internal(text: &str) -> bool;
}

/// The embedded pdf.js viewer
#[derive(Debug, Default, Clone, Copy)]
pub struct PdfJsSurface;

impl PdfSurface for PdfJsSurface {
    fn is_ready(&self) -> bool {
        is_viewer_ready()
    }

    fn go_to_page(&self, page: u32) {
        go_to_page_internal(page);
    }

    fn highlight_text(&self, text: &str) -> bool {
        highlight_text_internal(text)
    }
}

/// Resolve after `delay` using `setTimeout`
pub async fn sleep(delay: Duration) -> Result<(), JsValue> {
    let window = web_sys::window().ok_or_else(|| JsValue::from_str("No window object"))?;
    let millis = i32::try_from(delay.as_millis()).unwrap_or(i32::MAX);

    let mut scheduled = Ok(0);
    let promise = js_sys::Promise::new(&mut |resolve, _reject| {
        scheduled = window.set_timeout_with_callback_and_timeout_and_arguments_0(&resolve, millis);
    });
    scheduled?;

    JsFuture::from(promise).await?;
    Ok(())
}

/// Navigate the viewer to `page` and highlight `search_text`, polling for
/// readiness with browser timers
pub async fn go_to_and_highlight(
    bridge: &PdfNavigationBridge,
    surface: &PdfJsSurface,
    page: u32,
    search_text: Option<&str>,
) -> NavigationOutcome {
    let mut task = bridge.begin(page, search_text);
    loop {
        match bridge.advance(&mut task, surface) {
            NavigationStep::Wait(delay) => {
                if sleep(delay).await.is_err() {
                    return NavigationOutcome::Abandoned {
                        page,
                        checks: task.ready_checks(),
                    };
                }
            }
            NavigationStep::Done(outcome) => return outcome,
        }
    }
}
