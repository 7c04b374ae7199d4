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

//! Slippy-map tile fetching and disk caching.

use egui::{ColorImage, TextureHandle};
use log::{debug, warn};
use plotter_core::{LatLon, TileLayer, WebMercator};
use sha2::{Digest, Sha256};
use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::{Duration, SystemTime};

pub const TILE_SIZE: f32 = 256.0;

const USER_AGENT: &str = concat!("coordinate-plotter/", env!("CARGO_PKG_VERSION"));

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct TileCoord {
    pub x: u32,
    pub y: u32,
    pub zoom: u8,
}

impl TileCoord {
    pub fn new(x: u32, y: u32, zoom: u8) -> Self {
        Self { x, y, zoom }
    }

    /// Cache filename based on hash of the tile URL
    fn cache_filename(url: &str) -> String {
        let mut hasher = Sha256::new();
        hasher.update(url.as_bytes());
        format!("{:x}.png", hasher.finalize())
    }
}

pub enum TileState {
    Loading,
    Loaded(TextureHandle),
    Failed,
}

/// Tile cache backed by memory and disk, downloading on background threads
pub struct TileManager {
    layer: TileLayer,
    cache_dir: PathBuf,
    client: reqwest::blocking::Client,
    tiles: Arc<Mutex<HashMap<TileCoord, TileState>>>,
    download_queue: Arc<Mutex<HashSet<TileCoord>>>,
}

impl std::fmt::Debug for TileManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TileManager")
            .field("layer", &self.layer)
            .field("cache_dir", &self.cache_dir)
            .finish_non_exhaustive()
    }
}

impl TileManager {
    pub fn new(layer: TileLayer, cache_days: u64) -> Self {
        let cache_dir = Self::get_cache_dir();

        if let Err(e) = fs::create_dir_all(&cache_dir) {
            warn!("Failed to create tile cache directory: {}", e);
        }

        Self::cleanup_old_tiles(&cache_dir, cache_days);

        let client = reqwest::blocking::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(Duration::from_secs(15))
            .build()
            .unwrap_or_else(|e| {
                warn!("Failed to configure tile client, using defaults: {}", e);
                reqwest::blocking::Client::new()
            });

        Self {
            layer,
            cache_dir,
            client,
            tiles: Arc::new(Mutex::new(HashMap::new())),
            download_queue: Arc::new(Mutex::new(HashSet::new())),
        }
    }

    pub fn layer(&self) -> &TileLayer {
        &self.layer
    }

    fn get_cache_dir() -> PathBuf {
        let mut path = dirs::cache_dir().unwrap_or_else(|| PathBuf::from(".cache"));
        path.push("coordinate-plotter");
        path.push("tiles");
        path
    }

    fn cleanup_old_tiles(cache_dir: &Path, cache_days: u64) {
        let now = SystemTime::now();
        let max_age = Duration::from_secs(cache_days * 24 * 60 * 60);

        let Ok(entries) = fs::read_dir(cache_dir) else {
            return;
        };
        for entry in entries.flatten() {
            let age = entry
                .metadata()
                .and_then(|m| m.modified())
                .ok()
                .and_then(|modified| now.duration_since(modified).ok());
            if age.is_some_and(|age| age > max_age) && fs::remove_file(entry.path()).is_ok() {
                debug!("Removed old tile cache: {:?}", entry.path());
            }
        }
    }

    /// Get tile from cache or queue it for download
    pub fn get_tile(&self, coord: TileCoord, ctx: &egui::Context) -> Option<TextureHandle> {
        let Ok(mut tiles) = self.tiles.lock() else {
            return None;
        };

        match tiles.get(&coord) {
            Some(TileState::Loaded(texture)) => Some(texture.clone()),
            Some(TileState::Loading | TileState::Failed) => None,
            None => {
                let url = self.layer.tile_url(coord.zoom, coord.x, coord.y);
                let cache_path = self.cache_dir.join(TileCoord::cache_filename(&url));

                if let Some(texture) = fs::read(&cache_path)
                    .ok()
                    .and_then(|bytes| load_texture(ctx, coord, &bytes).ok())
                {
                    tiles.insert(coord, TileState::Loaded(texture.clone()));
                    return Some(texture);
                }

                tiles.insert(coord, TileState::Loading);
                drop(tiles);
                self.queue_download(coord, url, cache_path, ctx.clone());
                None
            }
        }
    }

    fn queue_download(&self, coord: TileCoord, url: String, cache_path: PathBuf, ctx: egui::Context) {
        let Ok(mut queued) = self.download_queue.lock() else {
            return;
        };
        if !queued.insert(coord) {
            return;
        }
        drop(queued);

        let tiles = Arc::clone(&self.tiles);
        let queue = Arc::clone(&self.download_queue);
        let client = self.client.clone();

        std::thread::spawn(move || {
            let state = match download_tile(&client, &url, &cache_path)
                .and_then(|bytes| load_texture(&ctx, coord, &bytes))
            {
                Ok(texture) => TileState::Loaded(texture),
                Err(e) => {
                    warn!("Tile {} failed: {}", url, e);
                    TileState::Failed
                }
            };

            if let Ok(mut tiles) = tiles.lock() {
                tiles.insert(coord, state);
            }
            if let Ok(mut queue) = queue.lock() {
                queue.remove(&coord);
            }
            ctx.request_repaint();
        });
    }

    /// Get all tiles needed for a viewport, with their pixel offset from the viewport center
    pub fn get_visible_tiles(
        &self,
        center: LatLon,
        zoom: u8,
        viewport_width: f32,
        viewport_height: f32,
    ) -> Vec<(TileCoord, f32, f32)> {
        visible_tiles(center, zoom, viewport_width, viewport_height)
    }

    pub fn has_loading_tiles(&self) -> bool {
        self.tiles
            .lock()
            .map(|tiles| tiles.values().any(|state| matches!(state, TileState::Loading)))
            .unwrap_or(false)
    }

    pub fn get_error_count(&self) -> usize {
        self.tiles
            .lock()
            .map(|tiles| {
                tiles
                    .values()
                    .filter(|state| matches!(state, TileState::Failed))
                    .count()
            })
            .unwrap_or(0)
    }
}

fn download_tile(client: &reqwest::blocking::Client, url: &str, cache_path: &Path) -> Result<Vec<u8>, String> {
    debug!("Downloading tile: {}", url);

    let response = client.get(url).send().map_err(|e| e.to_string())?;
    if !response.status().is_success() {
        return Err(format!("HTTP {}", response.status()));
    }
    let bytes = response.bytes().map_err(|e| e.to_string())?.to_vec();

    if let Err(e) = fs::write(cache_path, &bytes) {
        warn!("Failed to save tile to cache: {}", e);
    }
    Ok(bytes)
}

fn load_texture(ctx: &egui::Context, coord: TileCoord, bytes: &[u8]) -> Result<TextureHandle, String> {
    let img = image::load_from_memory(bytes).map_err(|e| e.to_string())?;
    let rgba = img.to_rgba8();
    let size = [rgba.width() as usize, rgba.height() as usize];
    let color_image = ColorImage::from_rgba_unmultiplied(size, &rgba.into_raw());

    Ok(ctx.load_texture(
        format!("tile_{}_{}/{}", coord.zoom, coord.x, coord.y),
        color_image,
        egui::TextureOptions::default(),
    ))
}

/// Tiles covering a viewport centered on `center`, with offsets in pixels
pub fn visible_tiles(center: LatLon, zoom: u8, viewport_width: f32, viewport_height: f32) -> Vec<(TileCoord, f32, f32)> {
    let mut tiles = Vec::new();

    let center_tile_x = WebMercator::lon_to_x(center.lon, zoom);
    let center_tile_y = WebMercator::lat_to_y(center.lat, zoom);

    // Cover the viewport plus one tile on each side
    let tiles_wide = (viewport_width / TILE_SIZE).ceil() as i32 + 2;
    let tiles_high = (viewport_height / TILE_SIZE).ceil() as i32 + 2;

    let start_x = center_tile_x.floor() as i32 - tiles_wide / 2;
    let start_y = center_tile_y.floor() as i32 - tiles_high / 2;

    let max_tile = 2_i32.pow(u32::from(zoom));

    for dy in 0..tiles_high {
        for dx in 0..tiles_wide {
            let tile_x = start_x + dx;
            let tile_y = start_y + dy;

            // Longitude wraps, latitude does not
            let wrapped_x = tile_x.rem_euclid(max_tile);

            if tile_y >= 0 && tile_y < max_tile {
                let coord = TileCoord::new(wrapped_x as u32, tile_y as u32, zoom);

                let offset_x = (f64::from(tile_x) - center_tile_x) * f64::from(TILE_SIZE);
                let offset_y = (f64::from(tile_y) - center_tile_y) * f64::from(TILE_SIZE);

                tiles.push((coord, offset_x as f32, offset_y as f32));
            }
        }
    }

    tiles
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zoom_zero_is_single_tile() {
        let tiles = visible_tiles(LatLon::new(0.0, 0.0), 0, 800.0, 500.0);
        assert!(!tiles.is_empty());
        assert!(tiles.iter().all(|(coord, _, _)| coord.x == 0 && coord.y == 0));
    }

    #[test]
    fn test_tiles_wrap_longitude() {
        let tiles = visible_tiles(LatLon::new(0.0, 179.9), 3, 800.0, 500.0);
        assert!(tiles.iter().any(|(coord, _, _)| coord.x == 0));
        assert!(tiles.iter().any(|(coord, _, _)| coord.x == 7));
        assert!(tiles.iter().all(|(coord, _, _)| coord.x < 8 && coord.y < 8));
    }

    #[test]
    fn test_center_tile_offset() {
        let tiles = visible_tiles(LatLon::new(0.0, 0.0), 1, 256.0, 256.0);
        // The world center sits on the corner shared by the four tiles at zoom 1
        let (_, offset_x, offset_y) = tiles
            .iter()
            .find(|(coord, _, _)| coord.x == 1 && coord.y == 1)
            .copied()
            .unwrap();
        assert!(offset_x.abs() < 0.01);
        assert!(offset_y.abs() < 0.01);
    }

    #[test]
    fn test_cache_filename_is_stable() {
        let a = TileCoord::cache_filename("https://tile.example/1/2/3.png");
        let b = TileCoord::cache_filename("https://tile.example/1/2/3.png");
        assert_eq!(a, b);
        assert!(a.ends_with(".png"));
        assert_ne!(a, TileCoord::cache_filename("https://tile.example/1/2/4.png"));
    }
}
