use image::{DynamicImage, ImageFormat, Rgba, RgbaImage};
use serde_json::json;
use std::io::Cursor;

/// A tiny solid-color PNG.
pub fn png_bytes(rgb: [u8; 3]) -> Vec<u8> {
    let image = RgbaImage::from_pixel(5, 7, Rgba([rgb[0], rgb[1], rgb[2], 255]));
    let mut buffer = Cursor::new(Vec::new());
    DynamicImage::ImageRgba8(image)
        .write_to(&mut buffer, ImageFormat::Png)
        .expect("encode png");
    buffer.into_inner()
}

/// A search response with a single printing, in the `{ data: [...] }` envelope.
pub fn search_hit(name: &str, set: &str, number: &str) -> String {
    json!({ "data": [{ "Name": name, "Set": set, "Number": number }] }).to_string()
}

/// A search response carrying only a direct image URL.
pub fn search_direct(name: &str, url: &str) -> String {
    json!([{ "name": name, "imageUrl": url }]).to_string()
}

pub fn catalog(names: &[&str]) -> String {
    json!({ "values": names }).to_string()
}

pub const SAMPLE_LIST: &str = "Luke Skywalker x2\nDarth Vader";
