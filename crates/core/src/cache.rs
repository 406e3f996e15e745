//! Session-lifetime caches for fetched bytes and decoded bitmaps.
//!
//! Both maps only ever gain whole, immutable values. Concurrent loads of the
//! same key may both fetch; the later insert replaces an equal value.

use cardsheet_traits::SharedBody;
use image::DynamicImage;
use log::trace;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

/// A decoded bitmap shared by every slot that shows it.
pub type SharedBitmap = Arc<DynamicImage>;

/// Cache key of a decoded bitmap: `"name:"` plus the lower-cased requested name.
pub fn name_key(name: &str) -> String {
    format!("name:{}", name.to_lowercase())
}

#[derive(Debug, Default)]
pub struct ImageCache {
    raw: RwLock<HashMap<String, SharedBody>>,
    bitmaps: RwLock<HashMap<String, SharedBitmap>>,
}

impl ImageCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Raw response bytes previously fetched from exactly `url`.
    pub fn raw(&self, url: &str) -> Option<SharedBody> {
        self.raw.read().ok()?.get(url).cloned()
    }

    pub fn insert_raw(&self, url: impl Into<String>, body: SharedBody) {
        if let Ok(mut raw) = self.raw.write() {
            let url = url.into();
            trace!("[CACHE] raw <- {} ({} bytes)", url, body.len());
            raw.insert(url, body);
        }
    }

    /// The decoded bitmap for a requested card name, matched case-insensitively.
    pub fn bitmap(&self, name: &str) -> Option<SharedBitmap> {
        self.bitmaps.read().ok()?.get(&name_key(name)).cloned()
    }

    pub fn insert_bitmap(&self, name: &str, bitmap: SharedBitmap) {
        if let Ok(mut bitmaps) = self.bitmaps.write() {
            trace!("[CACHE] bitmap <- {:?}", name);
            bitmaps.insert(name_key(name), bitmap);
        }
    }

    pub fn raw_len(&self) -> usize {
        self.raw.read().map(|r| r.len()).unwrap_or(0)
    }

    pub fn bitmap_len(&self) -> usize {
        self.bitmaps.read().map(|b| b.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.raw_len() == 0 && self.bitmap_len() == 0
    }
}
