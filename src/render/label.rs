//! Failure marker labels: system font lookup, word wrapping and glyph
//! outlines filled straight into the page pixmap.

use log::debug;
use std::fmt;
use std::sync::{Arc, OnceLock};
use tiny_skia::{FillRule, Paint, Path, PathBuilder, Pixmap, Transform};
use ttf_parser::{Face, OutlineBuilder};

/// Families tried before the database's generic sans-serif.
const PREFERRED_FAMILIES: &[&str] = &["DejaVu Sans", "Liberation Sans", "Arial", "Helvetica"];

/// Advance used for characters the face has no glyph for, in ems.
const MISSING_ADVANCE_EM: f32 = 0.5;

/// A parsed-once font face used for failure labels.
#[derive(Clone)]
pub struct LabelFont {
    data: Arc<Vec<u8>>,
    index: u32,
}

impl fmt::Debug for LabelFont {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LabelFont")
            .field("bytes", &self.data.len())
            .field("index", &self.index)
            .finish()
    }
}

impl LabelFont {
    /// Wraps TrueType/OpenType data. Returns `None` when face `index` does not parse.
    pub fn from_bytes(data: Vec<u8>, index: u32) -> Option<Self> {
        Face::parse(&data, index).ok()?;
        Some(Self {
            data: Arc::new(data),
            index,
        })
    }

    /// A sans-serif face from the installed system fonts, looked up once per
    /// process. `None` when the system has no usable font.
    pub fn system() -> Option<Self> {
        static SYSTEM: OnceLock<Option<LabelFont>> = OnceLock::new();
        SYSTEM.get_or_init(load_system_font).clone()
    }

    fn face(&self) -> Option<Face<'_>> {
        Face::parse(&self.data, self.index).ok()
    }

    /// Horizontal extent of `text` at `size` pixels per em.
    pub fn measure(&self, text: &str, size: f32) -> f32 {
        let Some(face) = self.face() else {
            return 0.0;
        };
        let scale = size / f32::from(face.units_per_em().max(1));
        text.chars().map(|ch| advance(&face, ch, scale, size)).sum()
    }

    /// Fills `text` with its baseline starting at `(x, baseline)`.
    pub fn draw(&self, pixmap: &mut Pixmap, text: &str, x: f32, baseline: f32, size: f32, paint: &Paint) {
        let Some(face) = self.face() else {
            return;
        };
        let scale = size / f32::from(face.units_per_em().max(1));
        let mut pen_x = x;
        for ch in text.chars() {
            if let Some(gid) = face.glyph_index(ch) {
                let mut builder = GlyphPathBuilder::new(pen_x, baseline, scale);
                if face.outline_glyph(gid, &mut builder).is_some()
                    && let Some(path) = builder.finish()
                {
                    pixmap.fill_path(&path, paint, FillRule::Winding, Transform::identity(), None);
                }
            }
            pen_x += advance(&face, ch, scale, size);
        }
    }
}

fn advance(face: &Face<'_>, ch: char, scale: f32, size: f32) -> f32 {
    face.glyph_index(ch)
        .and_then(|gid| face.glyph_hor_advance(gid))
        .map_or(size * MISSING_ADVANCE_EM, |units| f32::from(units) * scale)
}

fn load_system_font() -> Option<LabelFont> {
    let mut db = fontdb::Database::new();
    db.load_system_fonts();

    let mut families: Vec<fontdb::Family<'_>> =
        PREFERRED_FAMILIES.iter().map(|&name| fontdb::Family::Name(name)).collect();
    families.push(fontdb::Family::SansSerif);
    let query = fontdb::Query {
        families: &families,
        ..fontdb::Query::default()
    };

    let Some(id) = db.query(&query).or_else(|| db.faces().next().map(|face| face.id)) else {
        debug!("No system fonts found.");
        return None;
    };
    let font = db.with_face_data(id, |data, index| LabelFont::from_bytes(data.to_vec(), index))??;
    if let Some(face) = db.face(id) {
        debug!("Failure labels use {:?}.", face.post_script_name);
    }
    Some(font)
}

/// Greedy word wrap. Explicit newlines always break; a word wider than
/// `max_width` gets a line of its own.
pub fn wrap_lines<F>(text: &str, max_width: f32, measure: F) -> Vec<String>
where
    F: Fn(&str) -> f32,
{
    let mut lines = Vec::new();
    for paragraph in text.split('\n') {
        let mut line = String::new();
        for word in paragraph.split_whitespace() {
            let candidate = if line.is_empty() {
                word.to_string()
            } else {
                format!("{line} {word}")
            };
            if !line.is_empty() && measure(&candidate) > max_width {
                lines.push(std::mem::replace(&mut line, word.to_string()));
            } else {
                line = candidate;
            }
        }
        lines.push(line);
    }
    lines
}

/// Collects glyph outlines into a tiny-skia path. Font units grow upwards,
/// pixmap rows grow downwards, hence the flipped y.
struct GlyphPathBuilder {
    builder: PathBuilder,
    origin_x: f32,
    origin_y: f32,
    scale: f32,
}

impl GlyphPathBuilder {
    fn new(origin_x: f32, origin_y: f32, scale: f32) -> Self {
        Self {
            builder: PathBuilder::new(),
            origin_x,
            origin_y,
            scale,
        }
    }

    fn point(&self, x: f32, y: f32) -> (f32, f32) {
        (self.origin_x + x * self.scale, self.origin_y - y * self.scale)
    }

    fn finish(self) -> Option<Path> {
        self.builder.finish()
    }
}

impl OutlineBuilder for GlyphPathBuilder {
    fn move_to(&mut self, x: f32, y: f32) {
        let (x, y) = self.point(x, y);
        self.builder.move_to(x, y);
    }

    fn line_to(&mut self, x: f32, y: f32) {
        let (x, y) = self.point(x, y);
        self.builder.line_to(x, y);
    }

    fn quad_to(&mut self, x1: f32, y1: f32, x: f32, y: f32) {
        let (x1, y1) = self.point(x1, y1);
        let (x, y) = self.point(x, y);
        self.builder.quad_to(x1, y1, x, y);
    }

    fn curve_to(&mut self, x1: f32, y1: f32, x2: f32, y2: f32, x: f32, y: f32) {
        let (x1, y1) = self.point(x1, y1);
        let (x2, y2) = self.point(x2, y2);
        let (x, y) = self.point(x, y);
        self.builder.cubic_to(x1, y1, x2, y2, x, y);
    }

    fn close(&mut self) {
        self.builder.close();
    }
}
