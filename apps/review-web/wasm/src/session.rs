//! JS-facing review session
//!
//! Holds the highlight state in Rust. JS reports user actions (open a
//! document, show evidence for a field, switch tabs) and renders whatever
//! `directive()` returns after each change callback.

use crate::geometry_fetch::{fetch_geometry, js_error_text};
use crate::pdf_bridge::{go_to_and_highlight, PdfJsSurface};
use crate::state::{Effects, SessionState};
use provenance_core::{DocumentId, EvidenceTarget, FetchTicket, ProvenanceConfig, SourceSet, ViewerTab};
use serde::Serialize;
use std::cell::RefCell;
use std::rc::Rc;
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::spawn_local;

#[wasm_bindgen(js_name = ReviewSession)]
pub struct WasmReviewSession {
    state: Rc<RefCell<SessionState>>,
    config: Rc<ProvenanceConfig>,
    on_change: Rc<RefCell<Option<js_sys::Function>>>,
}

#[wasm_bindgen(js_class = ReviewSession)]
impl WasmReviewSession {
    /// Create a session. `config` is optional and mirrors the TOML layout:
    /// `{ navigation: { retry_interval_ms, ... }, geometry: { url_template }, viewer: {...} }`
    #[wasm_bindgen(constructor)]
    pub fn new(config: JsValue) -> Result<WasmReviewSession, JsValue> {
        let config: ProvenanceConfig = if config.is_undefined() || config.is_null() {
            ProvenanceConfig::default()
        } else {
            serde_wasm_bindgen::from_value(config)
                .map_err(|e| JsValue::from_str(&format!("Invalid config: {}", e)))?
        };

        Ok(Self {
            state: Rc::new(RefCell::new(SessionState::new(
                config.viewer,
                config.navigation,
            ))),
            config: Rc::new(config),
            on_change: Rc::new(RefCell::new(None)),
        })
    }

    /// Callback signature: (snapshot: object) => void
    #[wasm_bindgen(js_name = setOnChange)]
    pub fn set_on_change(&mut self, callback: js_sys::Function) {
        *self.on_change.borrow_mut() = Some(callback);
    }

    #[wasm_bindgen(js_name = openDocument)]
    pub fn open_document(&self, document_id: &str, has_pdf: bool, has_image: bool) {
        self.state
            .borrow_mut()
            .open_document(DocumentId::new(document_id), SourceSet::new(has_pdf, has_image));
        self.notify();
    }

    #[wasm_bindgen(js_name = closeDocument)]
    pub fn close_document(&self) {
        self.state.borrow_mut().close_document();
        self.notify();
    }

    #[wasm_bindgen(js_name = setSources)]
    pub fn set_sources(&self, has_pdf: bool, has_image: bool) {
        self.state
            .borrow_mut()
            .set_sources(SourceSet::new(has_pdf, has_image));
        self.notify();
    }

    /// Per-page plain text (`string[]`, page 1 first) for the text surface
    #[wasm_bindgen(js_name = setPageTexts)]
    pub fn set_page_texts(&self, texts: JsValue) -> Result<(), JsValue> {
        let texts: Vec<String> = serde_wasm_bindgen::from_value(texts)
            .map_err(|e| JsValue::from_str(&format!("Invalid page texts: {}", e)))?;
        self.state.borrow_mut().set_page_texts(texts);
        self.notify();
        Ok(())
    }

    /// Show evidence `{ page, char_start?, char_end?, quote?, value? }`.
    /// Returns the snapshot right after adoption.
    pub fn adopt(&self, target: JsValue) -> Result<JsValue, JsValue> {
        let target: EvidenceTarget = serde_wasm_bindgen::from_value(target)
            .map_err(|e| JsValue::from_str(&format!("Invalid evidence target: {}", e)))?;
        let effects = self
            .state
            .borrow_mut()
            .adopt(target)
            .map_err(|e| JsValue::from_str(&e.to_string()))?;
        self.run(effects);
        self.notify();
        self.snapshot()
    }

    /// Returns `false` when the surface is not available for this document
    #[wasm_bindgen(js_name = selectTab)]
    pub fn select_tab(&self, tab: &str) -> Result<bool, JsValue> {
        let tab = parse_tab(tab)?;
        let effects = self.state.borrow_mut().select_tab(tab);
        let Some(effects) = effects else {
            return Ok(false);
        };
        self.run(effects);
        self.notify();
        Ok(true)
    }

    #[wasm_bindgen(js_name = activeTab)]
    pub fn active_tab(&self) -> Result<JsValue, JsValue> {
        to_js(&self.state.borrow().active_tab())
    }

    #[wasm_bindgen(js_name = availableTabs)]
    pub fn available_tabs(&self) -> Result<JsValue, JsValue> {
        to_js(&self.state.borrow().available_tabs())
    }

    pub fn snapshot(&self) -> Result<JsValue, JsValue> {
        to_js(&self.state.borrow().snapshot())
    }

    /// What the active surface should draw, or `null`
    pub fn directive(&self) -> Result<JsValue, JsValue> {
        to_js(&self.state.borrow().directive())
    }

    /// Highlight rectangles in pixels for an image rendered at `width` x `height`
    #[wasm_bindgen(js_name = surfaceRects)]
    pub fn surface_rects(&self, width: f64, height: f64) -> Result<JsValue, JsValue> {
        to_js(&self.state.borrow().surface_rects(width, height))
    }
}

impl WasmReviewSession {
    fn run(&self, effects: Effects) {
        if let Some(ticket) = effects.fetch {
            self.spawn_fetch(ticket);
        }
        if let Some(request) = effects.navigate {
            let bridge = self.state.borrow().navigation_bridge();
            spawn_local(async move {
                let outcome = go_to_and_highlight(
                    &bridge,
                    &PdfJsSurface,
                    request.page,
                    request.search_text.as_deref(),
                )
                .await;
                if let Some(degradation) = outcome.degradation() {
                    web_sys::console::log_1(
                        &format!("Evidence navigation degraded: {:?}", degradation).into(),
                    );
                }
            });
        }
    }

    fn spawn_fetch(&self, ticket: FetchTicket) {
        let state = Rc::clone(&self.state);
        let on_change = Rc::clone(&self.on_change);
        let url = self.config.geometry.url_for(&ticket.document_id);

        spawn_local(async move {
            let result = fetch_geometry(&url, &ticket.document_id).await;
            if let Err(e) = &result {
                web_sys::console::warn_1(&format!("Geometry unavailable: {}", e).into());
            }
            let applied = state.borrow_mut().geometry_arrived(&ticket, result);
            if applied {
                notify(&state, &on_change);
            }
        });
    }

    fn notify(&self) {
        notify(&self.state, &self.on_change);
    }
}

fn notify(state: &Rc<RefCell<SessionState>>, on_change: &Rc<RefCell<Option<js_sys::Function>>>) {
    let Some(callback) = on_change.borrow().clone() else {
        return;
    };
    // Release the borrow before calling into JS, which may call back in
    let snapshot = state.borrow().snapshot();
    match serde_wasm_bindgen::to_value(&snapshot) {
        Ok(value) => {
            if let Err(e) = callback.call1(&JsValue::NULL, &value) {
                web_sys::console::warn_1(
                    &format!("onChange callback failed: {}", js_error_text(&e)).into(),
                );
            }
        }
        Err(e) => web_sys::console::warn_1(&format!("Snapshot serialization failed: {}", e).into()),
    }
}

fn to_js<T: Serialize>(value: &T) -> Result<JsValue, JsValue> {
    serde_wasm_bindgen::to_value(value)
        .map_err(|e| JsValue::from_str(&format!("Serialization error: {}", e)))
}

fn parse_tab(tab: &str) -> Result<ViewerTab, JsValue> {
    match tab {
        "text" => Ok(ViewerTab::Text),
        "pdf" => Ok(ViewerTab::Pdf),
        "image" => Ok(ViewerTab::Image),
        other => Err(JsValue::from_str(&format!("Unknown tab: {}", other))),
    }
}
