// src/render/mod.rs
//! Rasterizes a built sheet into a page-sized RGBA bitmap.
//!
//! Drawing order: page fill, underlay template, bleed, card art and failure
//! markers, cut guides, overlay template. Everything is clipped to the page,
//! so overflowing layouts lose their rightmost or bottom content instead of
//! failing.

mod label;

pub use label::{LabelFont, wrap_lines};

use crate::error::PipelineError;
use crate::pipeline::{Failure, Sheet, SheetBatch, SlotContent};
use cardsheet_types::{Color, PixelRect};
use image::imageops::FilterType;
use image::{DynamicImage, RgbaImage};
use log::debug;
use std::path::Path;
use tiny_skia::{FilterQuality, Paint, PathBuilder, Pixmap, PixmapPaint, Rect, Stroke, Transform};

/// Label metrics are given for a 300 DPI page and scaled with the sheet.
const LABEL_REFERENCE_DPI: f32 = 300.0;
const LABEL_FONT_PX: f32 = 26.0;
const LABEL_LINE_PX: f32 = 34.0;
const LABEL_PAD_X_PX: f32 = 16.0;
const LABEL_FIRST_BASELINE_PX: f32 = 40.0;

/// A full-page image drawn under or over the sheet, stretched to the page.
#[derive(Debug, Clone)]
pub struct Template {
    pixmap: Pixmap,
    opacity: f32,
}

impl Template {
    /// `opacity` is clamped to `0.0..=1.0`; NaN counts as fully transparent.
    pub fn new(image: &DynamicImage, opacity: f32) -> Result<Self, PipelineError> {
        let pixmap = to_pixmap(&image.to_rgba8())?;
        let opacity = if opacity.is_nan() { 0.0 } else { opacity.clamp(0.0, 1.0) };
        Ok(Self { pixmap, opacity })
    }

    pub fn open(path: impl AsRef<Path>, opacity: f32) -> Result<Self, PipelineError> {
        Self::new(&image::open(path)?, opacity)
    }

    pub fn opacity(&self) -> f32 {
        self.opacity
    }

    fn draw(&self, canvas: &mut Pixmap) {
        if self.opacity <= 0.0 {
            return;
        }
        let sx = canvas.width() as f32 / self.pixmap.width() as f32;
        let sy = canvas.height() as f32 / self.pixmap.height() as f32;
        let paint = PixmapPaint {
            opacity: self.opacity,
            quality: FilterQuality::Bilinear,
            ..PixmapPaint::default()
        };
        canvas.draw_pixmap(0, 0, self.pixmap.as_ref(), &paint, Transform::from_scale(sx, sy), None);
    }
}

/// Draws sheets: page fill, bleed margins, card art and failure markers,
/// with optional cut guides and page templates.
#[derive(Debug, Clone)]
pub struct SheetRenderer {
    pub background: Color,
    pub failure_fill: Color,
    pub failure_stroke: Color,
    pub failure_text: Color,
    pub stroke_width: f32,
    /// Distance from the slot edge to the center of the failure border.
    pub stroke_inset: f32,
    pub filter: FilterType,
    /// Outline every slot so sheets can be cut by hand.
    pub guides: bool,
    pub guide_color: Color,
    pub guide_width: f32,
    pub underlay: Option<Template>,
    pub overlay: Option<Template>,
    label_font: Option<LabelFont>,
}

impl Default for SheetRenderer {
    fn default() -> Self {
        Self {
            background: Color::WHITE,
            failure_fill: Color::rgb(0xff, 0xed, 0xed),
            failure_stroke: Color::rgb(0xdd, 0x33, 0x33),
            failure_text: Color::rgb(0x99, 0x00, 0x00),
            stroke_width: 6.0,
            stroke_inset: 3.0,
            filter: FilterType::Triangle,
            guides: false,
            guide_color: Color::rgb(0x4a, 0xa3, 0xff),
            guide_width: 3.0,
            underlay: None,
            overlay: None,
            label_font: LabelFont::system(),
        }
    }
}

impl SheetRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Font for failure labels; `None` draws markers without text.
    pub fn with_label_font(mut self, font: Option<LabelFont>) -> Self {
        self.label_font = font;
        self
    }

    pub fn with_guides(mut self, guides: bool) -> Self {
        self.guides = guides;
        self
    }

    pub fn with_underlay(mut self, template: Template) -> Self {
        self.underlay = Some(template);
        self
    }

    pub fn with_overlay(mut self, template: Template) -> Self {
        self.overlay = Some(template);
        self
    }

    pub fn label_font(&self) -> Option<&LabelFont> {
        self.label_font.as_ref()
    }

    /// Renders one sheet of `batch` at page resolution.
    pub fn render(&self, batch: &SheetBatch, sheet: &Sheet) -> Result<RgbaImage, PipelineError> {
        let geometry = &batch.geometry;
        let page = geometry.page;
        let mut canvas = Pixmap::new(page.width, page.height)
            .ok_or_else(|| PipelineError::Render(format!("cannot allocate a {}x{} page", page.width, page.height)))?;
        canvas.fill(skia_color(self.background));

        if let Some(underlay) = &self.underlay {
            underlay.draw(&mut canvas);
        }

        let bleed_paint = solid(geometry.bleed_color);
        for assignment in &sheet.slots {
            if let Some(rect) = geometry.bleed_rect(&assignment.slot).and_then(|r| skia_rect(&r)) {
                canvas.fill_rect(rect, &bleed_paint, Transform::identity(), None);
            }
        }

        let scale = geometry.dpi as f32 / LABEL_REFERENCE_DPI;
        for assignment in &sheet.slots {
            let slot = &assignment.slot;
            match &assignment.content {
                SlotContent::Empty => {}
                SlotContent::Card { bitmap, .. } => self.draw_card(&mut canvas, slot, bitmap)?,
                SlotContent::Failure(failure) => {
                    debug!("Drawing failure marker for {:?}.", failure.name);
                    self.draw_failure(&mut canvas, slot, failure, scale);
                }
            }
        }

        if self.guides {
            let paint = solid(self.guide_color);
            let stroke = Stroke {
                width: self.guide_width,
                ..Stroke::default()
            };
            for assignment in &sheet.slots {
                if let Some(rect) = skia_rect(&assignment.slot) {
                    canvas.stroke_path(&PathBuilder::from_rect(rect), &paint, &stroke, Transform::identity(), None);
                }
            }
        }

        if let Some(overlay) = &self.overlay {
            overlay.draw(&mut canvas);
        }

        to_rgba_image(&canvas)
    }

    /// Renders every sheet in order.
    pub fn render_batch(&self, batch: &SheetBatch) -> Result<Vec<RgbaImage>, PipelineError> {
        batch.sheets.iter().map(|sheet| self.render(batch, sheet)).collect()
    }

    fn draw_card(&self, canvas: &mut Pixmap, slot: &PixelRect, bitmap: &DynamicImage) -> Result<(), PipelineError> {
        let (Ok(x), Ok(y)) = (i32::try_from(slot.x), i32::try_from(slot.y)) else {
            return Ok(());
        };
        let art = if bitmap.width() == slot.width && bitmap.height() == slot.height {
            bitmap.to_rgba8()
        } else {
            bitmap.resize_exact(slot.width, slot.height, self.filter).to_rgba8()
        };
        let art = to_pixmap(&art)?;
        canvas.draw_pixmap(x, y, art.as_ref(), &PixmapPaint::default(), Transform::identity(), None);
        Ok(())
    }

    fn draw_failure(&self, canvas: &mut Pixmap, slot: &PixelRect, failure: &Failure, scale: f32) {
        let Some(area) = skia_rect(slot) else {
            return;
        };
        canvas.fill_rect(area, &solid(self.failure_fill), Transform::identity(), None);

        let inset = self.stroke_inset;
        if let Some(border) = Rect::from_xywh(
            area.x() + inset,
            area.y() + inset,
            area.width() - 2.0 * inset,
            area.height() - 2.0 * inset,
        ) {
            let stroke = Stroke {
                width: self.stroke_width,
                ..Stroke::default()
            };
            canvas.stroke_path(
                &PathBuilder::from_rect(border),
                &solid(self.failure_stroke),
                &stroke,
                Transform::identity(),
                None,
            );
        }

        let Some(font) = &self.label_font else {
            return;
        };
        let size = LABEL_FONT_PX * scale;
        let pad = LABEL_PAD_X_PX * scale;
        let text = format!("Failed:\n{}", failure.name);
        let lines = wrap_lines(&text, area.width() - 2.0 * pad, |line| font.measure(line, size));

        let mut paint = solid(self.failure_text);
        paint.anti_alias = true;
        let mut baseline = area.y() + LABEL_FIRST_BASELINE_PX * scale;
        for line in &lines {
            if baseline > area.bottom() {
                break;
            }
            font.draw(canvas, line, area.x() + pad, baseline, size, &paint);
            baseline += LABEL_LINE_PX * scale;
        }
    }
}

fn skia_color(color: Color) -> tiny_skia::Color {
    tiny_skia::Color::from_rgba8(color.r, color.g, color.b, 255)
}

/// Aliasing off: every rect the sheet draws sits on whole pixels.
fn solid(color: Color) -> Paint<'static> {
    let mut paint = Paint::default();
    paint.set_color(skia_color(color));
    paint.anti_alias = false;
    paint
}

fn skia_rect(rect: &PixelRect) -> Option<Rect> {
    Rect::from_xywh(rect.x as f32, rect.y as f32, rect.width as f32, rect.height as f32)
}

fn to_pixmap(image: &RgbaImage) -> Result<Pixmap, PipelineError> {
    let (width, height) = image.dimensions();
    let mut pixmap = Pixmap::new(width, height)
        .ok_or_else(|| PipelineError::Render(format!("cannot allocate a {width}x{height} bitmap")))?;
    for (src, dst) in image.as_raw().chunks_exact(4).zip(pixmap.data_mut().chunks_exact_mut(4)) {
        let alpha = src[3];
        dst[0] = premultiply(src[0], alpha);
        dst[1] = premultiply(src[1], alpha);
        dst[2] = premultiply(src[2], alpha);
        dst[3] = alpha;
    }
    Ok(pixmap)
}

fn premultiply(channel: u8, alpha: u8) -> u8 {
    let product = u16::from(channel) * u16::from(alpha) + 127;
    ((product + (product >> 8)) >> 8) as u8
}

fn to_rgba_image(pixmap: &Pixmap) -> Result<RgbaImage, PipelineError> {
    let data = pixmap
        .pixels()
        .iter()
        .flat_map(|pixel| {
            let color = pixel.demultiply();
            [color.red(), color.green(), color.blue(), color.alpha()]
        })
        .collect();
    RgbaImage::from_raw(pixmap.width(), pixmap.height(), data)
        .ok_or_else(|| PipelineError::Render("pixel buffer does not match page size".to_string()))
}
