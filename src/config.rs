// src/config.rs

//! Defines the configuration structures for the window subsystem.
//!
//! This module provides a set of structs that can be deserialized from a
//! configuration file to customize the initial window: geometry, title,
//! decoration, and input behavior. Default values are provided for every
//! option so a missing or partial file still yields a usable window.

// Serde is used for deserializing the configuration from a file.
// The `Serialize` trait is also derived for convenience, allowing the current
// configuration to be exported if needed.
use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::geometry::Rect;

/// Represents the complete configuration for a window.
///
/// This struct is the root of the configuration and is intended to be
/// deserialized from a configuration file. It groups settings into logical
/// categories.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)] // Apply default values for the entire struct if a field is missing.
pub struct WindowConfig {
    /// Window identity: title and WM_CLASS hint.
    pub identity: IdentityConfig,
    /// Initial client-area geometry.
    pub geometry: GeometryConfig,
    /// Decoration and input behavior.
    pub behavior: BehaviorConfig,
}

/// Title and class hints the window manager reads at creation.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct IdentityConfig {
    /// Window title, also written to `_NET_WM_NAME`.
    pub title: String,
    /// WM_CLASS instance/class hint; used by window managers for grouping
    /// and per-application rules.
    pub class_name: String,
}

impl Default for IdentityConfig {
    fn default() -> Self {
        IdentityConfig {
            title: "casement".to_string(),
            class_name: "casement".to_string(),
        }
    }
}

/// Initial client-area geometry in screen coordinates.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeometryConfig {
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
}

impl Default for GeometryConfig {
    fn default() -> Self {
        GeometryConfig {
            x: 0,
            y: 0,
            width: 800,
            height: 600,
        }
    }
}

impl GeometryConfig {
    pub fn rect(&self) -> Rect {
        Rect::new(self.x, self.y, self.width, self.height)
    }
}

/// Decoration and input behavior applied when the window opens.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BehaviorConfig {
    /// Whether the window starts visible. A hidden window still exists and
    /// can be shown later.
    pub visible: bool,
    /// Create without window-manager decorations.
    pub borderless: bool,
    /// Allow the user to resize the window.
    pub resizable: bool,
    /// Request fullscreen once the window is mapped.
    pub fullscreen: bool,
    /// Request maximize once the window is mapped.
    pub maximized: bool,
    /// Emit repeated `KeyDown`/`Text` events while a key is held.
    pub key_repeat: bool,
    /// Show the cursor while it is over the client area.
    pub cursor_visible: bool,
}

impl Default for BehaviorConfig {
    fn default() -> Self {
        BehaviorConfig {
            visible: true,
            borderless: false,
            resizable: true,
            fullscreen: false,
            maximized: false,
            key_repeat: true,
            cursor_visible: true,
        }
    }
}

impl WindowConfig {
    /// Loads a configuration from a JSON file.
    pub fn load_from_file(path: &Path) -> anyhow::Result<Self> {
        let file = std::fs::File::open(path)
            .with_context(|| format!("failed to open config file {}", path.display()))?;
        let config: WindowConfig = serde_json::from_reader(std::io::BufReader::new(file))
            .with_context(|| format!("failed to parse config file {}", path.display()))?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_usable() {
        let config = WindowConfig::default();
        assert_eq!(config.identity.title, "casement");
        assert_eq!(config.geometry.rect(), Rect::new(0, 0, 800, 600));
        assert!(config.behavior.visible);
        assert!(config.behavior.resizable);
        assert!(config.behavior.key_repeat);
    }

    #[test]
    fn test_partial_json_fills_defaults() {
        let json = r#"{ "identity": { "title": "game" }, "geometry": { "width": 1280, "height": 720 } }"#;
        let config: WindowConfig = serde_json::from_str(json).unwrap();
        assert_eq!(config.identity.title, "game");
        // Missing fields come from the defaults.
        assert_eq!(config.identity.class_name, "casement");
        assert_eq!(config.geometry.rect(), Rect::new(0, 0, 1280, 720));
        assert!(!config.behavior.borderless);
    }

    #[test]
    fn test_config_round_trips_through_json() {
        let mut config = WindowConfig::default();
        config.behavior.borderless = true;
        config.geometry.x = 64;
        let json = serde_json::to_string(&config).unwrap();
        let back: WindowConfig = serde_json::from_str(&json).unwrap();
        assert!(back.behavior.borderless);
        assert_eq!(back.geometry.x, 64);
    }
}
