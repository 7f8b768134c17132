//! Game settings
//!
//! Arena geometry, hit tolerances and timings. Stored as JSON: in
//! LocalStorage on the web, in a file for native runs.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::consts::*;
use crate::sim::arena::Arena;
use crate::sim::reflection::Tolerances;

/// Problems loading or validating settings
#[derive(Error, Debug)]
pub enum SettingsError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Settings JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid setting: {0}")]
    Invalid(String),

    #[error("Storage error: {0}")]
    Storage(String),
}

/// Delays for the single-reflection game
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SingleTimings {
    /// Beam on screen before the result shows
    pub resolve_delay_ms: u32,
    /// Result on screen before cleanup
    pub cleanup_delay_ms: u32,
}

impl Default for SingleTimings {
    fn default() -> Self {
        Self {
            resolve_delay_ms: 500,
            cleanup_delay_ms: 1000,
        }
    }
}

/// Delays for the relay game
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RelayTimings {
    /// "Starting" status before the beam fires
    pub launch_delay_ms: u32,
    /// Rays on screen before the result shows
    pub resolve_delay_ms: u32,
    /// Result on screen before cleanup
    pub cleanup_delay_ms: u32,
}

impl Default for RelayTimings {
    fn default() -> Self {
        Self {
            launch_delay_ms: 1000,
            resolve_delay_ms: 1500,
            cleanup_delay_ms: 3000,
        }
    }
}

/// Game settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    // === Arena ===
    pub arena_radius: f32,
    /// Clearance between a marker centre and the wall
    pub marker_margin: f32,
    /// Radius of the numbered portal ring
    pub portal_ring_radius: f32,

    // === Tolerances ===
    pub aim_tolerance_deg: f32,
    pub pass_through_tolerance: f32,

    // === Countdown ===
    pub countdown_ticks: u32,
    pub countdown_interval_ms: u32,

    // === Marker ===
    /// Units per frame per held key
    pub marker_speed: f32,

    // === Variant timings ===
    pub single: SingleTimings,
    pub relay: RelayTimings,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            arena_radius: ARENA_RADIUS,
            marker_margin: MARKER_MARGIN,
            portal_ring_radius: PORTAL_RING_RADIUS,

            aim_tolerance_deg: AIM_TOLERANCE_DEG,
            pass_through_tolerance: PASS_THROUGH_TOLERANCE,

            countdown_ticks: COUNTDOWN_TICKS,
            countdown_interval_ms: COUNTDOWN_INTERVAL_MS,

            marker_speed: MARKER_SPEED,

            single: SingleTimings::default(),
            relay: RelayTimings::default(),
        }
    }
}

impl Settings {
    pub fn arena(&self) -> Arena {
        Arena::new(self.arena_radius, self.marker_margin)
    }

    pub fn tolerances(&self) -> Tolerances {
        Tolerances {
            aim_deg: self.aim_tolerance_deg,
            pass_through: self.pass_through_tolerance,
        }
    }

    /// Reject settings the game cannot run with
    pub fn validate(&self) -> Result<(), SettingsError> {
        if !(self.arena_radius > 0.0) {
            return Err(SettingsError::Invalid(format!(
                "arena_radius must be positive, got {}",
                self.arena_radius
            )));
        }
        if !(self.marker_margin >= 0.0 && self.marker_margin < self.arena_radius) {
            return Err(SettingsError::Invalid(format!(
                "marker_margin must be in [0, {}), got {}",
                self.arena_radius, self.marker_margin
            )));
        }
        if !(self.portal_ring_radius > 0.0) {
            return Err(SettingsError::Invalid(format!(
                "portal_ring_radius must be positive, got {}",
                self.portal_ring_radius
            )));
        }
        if !(self.aim_tolerance_deg > 0.0 && self.aim_tolerance_deg <= 180.0) {
            return Err(SettingsError::Invalid(format!(
                "aim_tolerance_deg must be in (0, 180], got {}",
                self.aim_tolerance_deg
            )));
        }
        if !(self.pass_through_tolerance > 0.0) {
            return Err(SettingsError::Invalid(format!(
                "pass_through_tolerance must be positive, got {}",
                self.pass_through_tolerance
            )));
        }
        if self.countdown_ticks == 0 {
            return Err(SettingsError::Invalid("countdown_ticks must be at least 1".into()));
        }
        if !(self.marker_speed >= 0.0) {
            return Err(SettingsError::Invalid(format!(
                "marker_speed must not be negative, got {}",
                self.marker_speed
            )));
        }
        Ok(())
    }

    /// Parse and validate settings JSON; missing fields take defaults
    pub fn from_json(json: &str) -> Result<Self, SettingsError> {
        let settings: Self = serde_json::from_str(json)?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn to_json(&self) -> Result<String, SettingsError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// LocalStorage key (used only in wasm32)
    #[allow(dead_code)]
    const STORAGE_KEY: &'static str = "star_relay_settings";

    /// Load settings from LocalStorage (WASM only)
    #[cfg(target_arch = "wasm32")]
    pub fn load() -> Self {
        let storage = web_sys::window()
            .and_then(|w| w.local_storage().ok())
            .flatten();

        if let Some(storage) = storage {
            if let Ok(Some(json)) = storage.get_item(Self::STORAGE_KEY) {
                match Self::from_json(&json) {
                    Ok(settings) => {
                        log::info!("Loaded settings from LocalStorage");
                        return settings;
                    }
                    Err(e) => log::warn!("Ignoring stored settings: {}", e),
                }
            }
        }

        log::info!("Using default settings");
        Self::default()
    }

    /// Save settings to LocalStorage (WASM only)
    #[cfg(target_arch = "wasm32")]
    pub fn save(&self) -> Result<(), SettingsError> {
        let storage = web_sys::window()
            .and_then(|w| w.local_storage().ok())
            .flatten()
            .ok_or_else(|| SettingsError::Storage("LocalStorage unavailable".into()))?;

        let json = self.to_json()?;
        if let Err(e) = storage.set_item(Self::STORAGE_KEY, &json) {
            let err = SettingsError::Storage(format!("{:?}", e));
            log::warn!("Settings not saved: {}", err);
            return Err(err);
        }
        log::info!("Settings saved");
        Ok(())
    }

    /// Load settings from a JSON file (native)
    #[cfg(not(target_arch = "wasm32"))]
    pub fn load_from(path: &std::path::Path) -> Result<Self, SettingsError> {
        let json = std::fs::read_to_string(path)?;
        let settings = Self::from_json(&json)?;
        log::info!("Loaded settings from {}", path.display());
        Ok(settings)
    }

    /// Save settings to a JSON file (native)
    #[cfg(not(target_arch = "wasm32"))]
    pub fn save_to(&self, path: &std::path::Path) -> Result<(), SettingsError> {
        std::fs::write(path, self.to_json()?)?;
        log::info!("Settings saved to {}", path.display());
        Ok(())
    }
}
