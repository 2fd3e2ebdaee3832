//! WASM bindings for the fieldcap capture session.
//!
//! A host camera loop builds one frame per detector pass, either as JSON or
//! through [`FrameBuilder`], and feeds it to a [`CaptureSession`].

use wasm_bindgen::prelude::*;

use fieldcap_core::{BoundingBox, ExtractionSession, FieldcapConfig, Frame, TextBlock, TextUnit};

fn to_js<T: serde::Serialize>(value: &T) -> Result<JsValue, JsValue> {
    serde_wasm_bindgen::to_value(value).map_err(|e| JsValue::from_str(&e.to_string()))
}

/// Initialize panic hook for better error messages in console.
#[wasm_bindgen(start)]
pub fn init() {
    #[cfg(feature = "console_error_panic_hook")]
    console_error_panic_hook::set_once();
}

/// Version information.
#[wasm_bindgen]
pub fn version() -> String {
    env!("CARGO_PKG_VERSION").to_string()
}

/// Detector output assembled unit by unit from the host.
#[wasm_bindgen]
#[derive(Default)]
pub struct FrameBuilder {
    blocks: Vec<Vec<TextUnit>>,
}

#[wasm_bindgen]
impl FrameBuilder {
    #[wasm_bindgen(constructor)]
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a new text block; following units belong to it.
    #[wasm_bindgen]
    pub fn begin_block(&mut self) {
        self.blocks.push(Vec::new());
    }

    /// Add a recognised unit to the current block.
    #[wasm_bindgen]
    pub fn add_unit(&mut self, text: &str, left: f32, top: f32, right: f32, bottom: f32) {
        if self.blocks.is_empty() {
            self.begin_block();
        }
        if let Some(block) = self.blocks.last_mut() {
            block.push(TextUnit::new(text, BoundingBox::new(left, top, right, bottom)));
        }
    }

    #[wasm_bindgen]
    pub fn unit_count(&self) -> usize {
        self.blocks.iter().map(Vec::len).sum()
    }

    fn build(&self) -> Frame {
        Frame::new(
            self.blocks
                .iter()
                .filter(|units| !units.is_empty())
                .map(|units| TextBlock::new(units.clone()))
                .collect(),
        )
    }
}

/// A capture session for one document.
#[wasm_bindgen]
pub struct CaptureSession {
    session: ExtractionSession,
}

#[wasm_bindgen]
impl CaptureSession {
    /// Create a session from the host's options JSON.
    #[wasm_bindgen(constructor)]
    pub fn new(options_json: &str) -> Result<CaptureSession, JsValue> {
        let config =
            FieldcapConfig::from_json(options_json).map_err(|e| JsValue::from_str(&e.to_string()))?;
        let session =
            ExtractionSession::new(&config).map_err(|e| JsValue::from_str(&e.to_string()))?;
        Ok(Self { session })
    }

    /// Process one frame given as JSON; returns the overlay report.
    #[wasm_bindgen]
    pub fn process_frame(&mut self, frame_json: &str) -> Result<JsValue, JsValue> {
        let frame: Frame =
            serde_json::from_str(frame_json).map_err(|e| JsValue::from_str(&e.to_string()))?;
        to_js(&self.session.process_frame(&frame))
    }

    /// Process a frame assembled with [`FrameBuilder`]; returns the overlay report.
    #[wasm_bindgen]
    pub fn process_built(&mut self, builder: &FrameBuilder) -> Result<JsValue, JsValue> {
        to_js(&self.session.process_frame(&builder.build()))
    }

    /// Current state of every field.
    #[wasm_bindgen]
    pub fn snapshot(&self) -> Result<JsValue, JsValue> {
        to_js(&self.session.snapshot())
    }

    /// Final `name -> value` object; unresolved fields carry the placeholder.
    #[wasm_bindgen]
    pub fn confirm(&self) -> Result<JsValue, JsValue> {
        to_js(&self.session.confirm())
    }

    #[wasm_bindgen]
    pub fn missing_mandatory(&self) -> Vec<String> {
        self.session
            .missing_mandatory()
            .into_iter()
            .map(str::to_string)
            .collect()
    }

    #[wasm_bindgen]
    pub fn is_complete(&self) -> bool {
        self.session.is_complete()
    }

    #[wasm_bindgen]
    pub fn display_lines(&self) -> Vec<String> {
        self.session.display_lines()
    }

    #[wasm_bindgen]
    pub fn frames_processed(&self) -> u32 {
        self.session.frames_processed() as u32
    }
}
