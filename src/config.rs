// Copyright 2025 Chris Custine
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Application configuration management.
//!
//! Settings are stored in TOML via `confy`. Every field has a serde default,
//! so a partial or missing file loads cleanly. The configuration covers the
//! map surface (tiles, marker icon, initial view) and view fitting; records
//! themselves are never persisted.

use plotter_core::{LatLon, MarkerIcon, SurfaceOptions, TileLayer, ViewOptions};
use serde::{Deserialize, Serialize};

const APP_NAME: &str = "coordinate-plotter";
const CONFIG_NAME: &str = "config";

/// Marker icon geometry in pixels
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct MarkerIconConfig {
    /// Icon image identifier
    #[serde(default = "default_icon_image")]
    pub image: String,

    /// Icon width and height
    #[serde(default = "default_icon_size")]
    pub size: [u32; 2],

    /// Point of the icon placed on the coordinate
    #[serde(default = "default_icon_anchor")]
    pub anchor: [i32; 2],

    /// Caption popup position relative to the anchor
    #[serde(default = "default_popup_anchor")]
    pub popup_anchor: [i32; 2],
}

/// Application configuration stored in TOML format
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct AppConfig {
    /// Tile URL with {z}, {x} and {y} placeholders
    #[serde(default = "default_tile_url_template")]
    pub tile_url_template: String,

    /// Attribution text drawn on the map
    #[serde(default = "default_tile_attribution")]
    pub tile_attribution: String,

    /// Highest zoom level the tile server provides
    #[serde(default = "default_max_zoom")]
    pub max_zoom: u8,

    /// Initial map center latitude
    #[serde(default)]
    pub initial_latitude: f64,

    /// Initial map center longitude
    #[serde(default)]
    pub initial_longitude: f64,

    /// Initial map zoom level (0 = world)
    #[serde(default = "default_initial_zoom")]
    pub initial_zoom: u8,

    /// Padding kept around fitted markers, in pixels
    #[serde(default = "default_fit_padding")]
    pub fit_padding_px: f32,

    /// Zoom level used when jumping to the first imported coordinate
    #[serde(default = "default_focus_zoom")]
    pub focus_zoom: u8,

    /// Marker icon geometry
    #[serde(default)]
    pub marker_icon: MarkerIconConfig,

    /// Start with the map expanded
    #[serde(default)]
    pub start_expanded: bool,

    /// Days before cached tiles are removed
    #[serde(default = "default_tile_cache_days")]
    pub tile_cache_days: u64,
}

// Default value functions for serde
fn default_tile_url_template() -> String {
    TileLayer::default().url_template
}

fn default_tile_attribution() -> String {
    TileLayer::default().attribution
}

fn default_max_zoom() -> u8 {
    18
}

fn default_initial_zoom() -> u8 {
    2
}

fn default_fit_padding() -> f32 {
    plotter_core::sync::DEFAULT_FIT_PADDING_PX
}

fn default_focus_zoom() -> u8 {
    plotter_core::sync::DEFAULT_FOCUS_ZOOM
}

fn default_tile_cache_days() -> u64 {
    7
}

fn default_icon_image() -> String {
    MarkerIcon::default().image
}

fn default_icon_size() -> [u32; 2] {
    MarkerIcon::default().size
}

fn default_icon_anchor() -> [i32; 2] {
    MarkerIcon::default().anchor
}

fn default_popup_anchor() -> [i32; 2] {
    MarkerIcon::default().popup_anchor
}

impl Default for MarkerIconConfig {
    fn default() -> Self {
        Self {
            image: default_icon_image(),
            size: default_icon_size(),
            anchor: default_icon_anchor(),
            popup_anchor: default_popup_anchor(),
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            tile_url_template: default_tile_url_template(),
            tile_attribution: default_tile_attribution(),
            max_zoom: default_max_zoom(),
            initial_latitude: 0.0,
            initial_longitude: 0.0,
            initial_zoom: default_initial_zoom(),
            fit_padding_px: default_fit_padding(),
            focus_zoom: default_focus_zoom(),
            marker_icon: MarkerIconConfig::default(),
            start_expanded: false,
            tile_cache_days: default_tile_cache_days(),
        }
    }
}

impl AppConfig {
    /// Load configuration from disk
    pub fn load() -> Result<Self, confy::ConfyError> {
        confy::load(APP_NAME, CONFIG_NAME)
    }

    /// Load configuration, falling back to defaults if the file is unreadable
    pub fn load_or_default() -> Self {
        Self::load().unwrap_or_else(|e| {
            log::warn!("Failed to load configuration, using defaults: {}", e);
            Self::default()
        })
    }

    /// Save configuration to disk
    pub fn save(&self) -> Result<(), confy::ConfyError> {
        confy::store(APP_NAME, CONFIG_NAME, self)
    }

    /// Get the config file path for display to user
    pub fn get_config_path() -> Result<std::path::PathBuf, confy::ConfyError> {
        confy::get_configuration_file_path(APP_NAME, CONFIG_NAME)
    }

    /// Options handed once to the map surface at construction
    pub fn surface_options(&self) -> SurfaceOptions {
        SurfaceOptions {
            initial_center: LatLon::new(self.initial_latitude, self.initial_longitude),
            initial_zoom: self.initial_zoom.min(self.max_zoom),
            marker_icon: MarkerIcon {
                image: self.marker_icon.image.clone(),
                size: self.marker_icon.size,
                anchor: self.marker_icon.anchor,
                popup_anchor: self.marker_icon.popup_anchor,
            },
            base_layer: TileLayer {
                url_template: self.tile_url_template.clone(),
                attribution: self.tile_attribution.clone(),
                max_zoom: self.max_zoom,
            },
        }
    }

    /// Fit and focus settings for the view synchronizer
    pub fn view_options(&self) -> ViewOptions {
        ViewOptions {
            fit_padding_px: self.fit_padding_px,
            focus_zoom: self.focus_zoom.min(self.max_zoom),
        }
    }
}
