//! Browser bindings for evidence provenance review
//!
//! `ReviewSession` is the only class JS needs. Geometry is fetched from the
//! review backend and the PDF surface is the pdf.js viewer, reached through
//! `www/js/provenance-bridge.js`.

use wasm_bindgen::prelude::*;

pub mod geometry_fetch;
pub mod pdf_bridge;
pub mod session;
pub mod state;

pub use session::WasmReviewSession;
pub use state::{Effects, NavigationRequest, SessionState};

#[wasm_bindgen(start)]
pub fn init() {
    console_error_panic_hook::set_once();
    web_sys::console::log_1(&"Provenance review WASM initialized".into());
}

/// Default tab for a document with the given sources
#[wasm_bindgen(js_name = defaultTab)]
pub fn default_tab(has_pdf: bool, has_image: bool) -> String {
    match provenance_core::default_tab(has_pdf, has_image) {
        provenance_core::ViewerTab::Pdf => "pdf",
        provenance_core::ViewerTab::Image => "image",
        provenance_core::ViewerTab::Text => "text",
    }
    .to_string()
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_tab_names() {
        assert_eq!(default_tab(true, true), "pdf");
        assert_eq!(default_tab(false, true), "image");
        assert_eq!(default_tab(false, false), "text");
    }
}
