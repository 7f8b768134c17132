//! Browser facade
//!
//! The page owns the DOM, the canvas and the frame loop. Each frame it hands
//! in held keys and the pointer, advances the session, and gets back the
//! render events of that frame as JSON.

use glam::Vec2;
use wasm_bindgen::prelude::*;

use crate::platform::RenderEvent;
use crate::settings::Settings;
use crate::sim::{MoveInput, Session, Variant};

#[wasm_bindgen(start)]
pub fn start() {
    console_error_panic_hook::set_once();
    if let Err(e) = console_log::init_with_level(log::Level::Info) {
        web_sys::console::warn_1(&format!("Logger already set: {}", e).into());
    }
    log::info!("Star Relay starting...");
}

fn to_js<T: serde::Serialize>(value: &T) -> Result<String, JsValue> {
    serde_json::to_string(value).map_err(|e| JsValue::from_str(&e.to_string()))
}

#[wasm_bindgen]
pub struct WebSession {
    session: Session,
    input: MoveInput,
    events: Vec<RenderEvent>,
}

#[wasm_bindgen]
impl WebSession {
    /// Session with settings from LocalStorage, seeded from the clock
    #[wasm_bindgen(constructor)]
    pub fn new() -> WebSession {
        let seed = js_sys::Date::now() as u64;
        log::info!("New session with seed: {}", seed);
        WebSession {
            session: Session::new(Settings::load(), seed),
            input: MoveInput::default(),
            events: Vec::new(),
        }
    }

    pub fn start_single(&mut self) -> bool {
        self.session.start(Variant::Single, &mut self.events)
    }

    pub fn start_relay(&mut self) -> bool {
        self.session.start(Variant::Relay, &mut self.events)
    }

    /// Held direction keys and pointer (arena coordinates) for the next frames
    pub fn set_input(
        &mut self,
        up: bool,
        down: bool,
        left: bool,
        right: bool,
        pointer_x: f64,
        pointer_y: f64,
    ) {
        let pointer = (pointer_x.is_finite() && pointer_y.is_finite())
            .then(|| Vec2::new(pointer_x as f32, pointer_y as f32));
        self.input = MoveInput {
            up,
            down,
            left,
            right,
            pointer,
        };
    }

    /// Advance by `elapsed_ms` and drain this frame's render events as JSON
    pub fn advance(&mut self, elapsed_ms: f64) -> Result<String, JsValue> {
        let elapsed = elapsed_ms.max(0.0) as u64;
        self.session.update(elapsed, &self.input, &mut self.events);
        let json = to_js(&self.events)?;
        self.events.clear();
        Ok(json)
    }

    /// Marker position and aim as JSON
    pub fn marker(&self) -> Result<String, JsValue> {
        to_js(self.session.marker())
    }

    /// Debug readout of the single reflection as JSON
    pub fn preview(&self) -> Result<String, JsValue> {
        to_js(&self.session.preview())
    }

    /// Current settings as JSON
    pub fn settings(&self) -> Result<String, JsValue> {
        self.session
            .settings()
            .to_json()
            .map_err(|e| JsValue::from_str(&e.to_string()))
    }
}

impl Default for WebSession {
    fn default() -> Self {
        Self::new()
    }
}

/// Validate and persist settings JSON; they apply to the next session
#[wasm_bindgen]
pub fn save_settings(json: &str) -> Result<(), JsValue> {
    let settings = Settings::from_json(json).map_err(|e| JsValue::from_str(&e.to_string()))?;
    settings
        .save()
        .map_err(|e| JsValue::from_str(&e.to_string()))
}
