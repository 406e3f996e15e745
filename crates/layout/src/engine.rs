use crate::{ConfigError, SheetConfig, SlotSpacing};
use cardsheet_types::{Color, Orientation, PixelRect, PixelSize, Slot};
use log::debug;
use serde::Serialize;
use std::fmt;

const MM_PER_INCH: f64 = 25.4;

/// The requested grid does not fit on either orientation of the page.
///
/// Non-fatal: the sheet is laid out in landscape anyway and anything past the
/// page edge is clipped when rendered.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GeometryOverflow {
    pub required_width_in: f64,
    pub required_height_in: f64,
    pub page_width_in: f64,
    pub page_height_in: f64,
}

impl fmt::Display for GeometryOverflow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "grid needs {:.2}x{:.2} in but the page is {:.2}x{:.2} in",
            self.required_width_in, self.required_height_in, self.page_width_in, self.page_height_in
        )
    }
}

/// Fully resolved print geometry. Identical for every sheet of a build.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Geometry {
    pub dpi: u32,
    pub card_width_in: f64,
    pub card_height_in: f64,
    pub rows: u32,
    pub cols: u32,
    pub margin_left_in: f64,
    pub margin_top_in: f64,
    pub bleed_mm: f64,
    pub orientation: Orientation,
    /// Page size in device pixels.
    pub page: PixelSize,
    /// Card size in device pixels.
    pub card: PixelSize,
    pub bleed_px: u32,
    pub bleed_color: Color,
    pub gap_x: u32,
    pub gap_y: u32,
    /// Slots in row-major order.
    pub slots: Vec<Slot>,
    pub overflow: Option<GeometryOverflow>,
}

impl Geometry {
    pub fn slots(&self) -> &[Slot] {
        &self.slots
    }

    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    /// The filled bleed border around a slot, or `None` when bleed is zero.
    pub fn bleed_rect(&self, slot: &Slot) -> Option<PixelRect> {
        (self.bleed_px > 0).then(|| slot.inflate(self.bleed_px))
    }

    pub fn fits_page(&self) -> bool {
        self.overflow.is_none()
    }
}

fn inches_to_px(inches: f64, dpi: u32) -> u32 {
    // `as` saturates; inputs are validated finite and non-negative.
    (inches * f64::from(dpi)).round() as u32
}

fn mm_to_px(mm: f64, dpi: u32) -> u32 {
    inches_to_px(mm / MM_PER_INCH, dpi)
}

/// Picks portrait when the grid fits, otherwise landscape. When neither
/// fits, landscape is returned together with the overflow advisory.
///
/// The fit test runs on the rounded device pixels that slots are placed
/// with, so a grid that fits in inches but rounds past the page edge is
/// still reported as overflowing.
pub fn choose_orientation(config: &SheetConfig) -> (Orientation, Option<GeometryOverflow>) {
    let dpi = config.dpi;
    let span = |count: u32, cell_in: f64, margin_in: f64| {
        u64::from(count) * u64::from(inches_to_px(cell_in, dpi)) + 2 * u64::from(inches_to_px(margin_in, dpi))
    };
    let required_w = span(config.cols, config.card_width_in, config.margin_left_in);
    let required_h = span(config.rows, config.card_height_in, config.margin_top_in);

    let fits = |orientation: Orientation| {
        let (page_w, page_h) = orientation.page_inches();
        required_w <= u64::from(inches_to_px(page_w, dpi)) && required_h <= u64::from(inches_to_px(page_h, dpi))
    };

    if fits(Orientation::Portrait) {
        (Orientation::Portrait, None)
    } else if fits(Orientation::Landscape) {
        (Orientation::Landscape, None)
    } else {
        let (page_width_in, page_height_in) = Orientation::Landscape.page_inches();
        let to_inches = |px: u64| px as f64 / f64::from(dpi);
        (
            Orientation::Landscape,
            Some(GeometryOverflow {
                required_width_in: to_inches(required_w),
                required_height_in: to_inches(required_h),
                page_width_in,
                page_height_in,
            }),
        )
    }
}

/// Even split of the leftover span between `count` cells, floored, never negative.
fn distributed_gap(page: u32, margin: u32, cell: u32, count: u32) -> u32 {
    if count < 2 {
        return 0;
    }
    let leftover =
        i64::from(page) - 2 * i64::from(margin) - i64::from(count) * i64::from(cell);
    (leftover.max(0) / i64::from(count - 1)) as u32
}

/// Computes the page and slot geometry for a configuration.
///
/// Deterministic: the same config always yields the same geometry. Fails
/// only on malformed configuration.
pub fn compute_geometry(config: &SheetConfig) -> Result<Geometry, ConfigError> {
    config.validate()?;

    let dpi = config.dpi;
    let (orientation, overflow) = choose_orientation(config);
    let (page_w_in, page_h_in) = orientation.page_inches();

    let page = PixelSize::new(inches_to_px(page_w_in, dpi), inches_to_px(page_h_in, dpi));
    let card = PixelSize::new(
        inches_to_px(config.card_width_in, dpi),
        inches_to_px(config.card_height_in, dpi),
    );
    let start_x = inches_to_px(config.margin_left_in, dpi);
    let start_y = inches_to_px(config.margin_top_in, dpi);
    let bleed_px = mm_to_px(config.bleed_mm, dpi);

    let (gap_x, gap_y) = match config.spacing {
        SlotSpacing::Packed => (0, 0),
        SlotSpacing::Distribute => (
            distributed_gap(page.width, start_x, card.width, config.cols),
            distributed_gap(page.height, start_y, card.height, config.rows),
        ),
    };

    let step_x = i64::from(card.width) + i64::from(gap_x);
    let step_y = i64::from(card.height) + i64::from(gap_y);
    let mut slots = Vec::with_capacity(config.capacity());
    for row in 0..i64::from(config.rows) {
        for col in 0..i64::from(config.cols) {
            slots.push(PixelRect::new(
                i64::from(start_x) + col * step_x,
                i64::from(start_y) + row * step_y,
                card.width,
                card.height,
            ));
        }
    }

    debug!(
        "Geometry: {}x{} grid on {}x{} px ({}), card {}x{} px, bleed {} px, gap {}x{} px",
        config.rows,
        config.cols,
        page.width,
        page.height,
        orientation,
        card.width,
        card.height,
        bleed_px,
        gap_x,
        gap_y
    );

    Ok(Geometry {
        dpi,
        card_width_in: config.card_width_in,
        card_height_in: config.card_height_in,
        rows: config.rows,
        cols: config.cols,
        margin_left_in: config.margin_left_in,
        margin_top_in: config.margin_top_in,
        bleed_mm: config.bleed_mm,
        orientation,
        page,
        card,
        bleed_px,
        bleed_color: config.bleed_color,
        gap_x,
        gap_y,
        slots,
        overflow,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn grid(rows: u32, cols: u32, margin_left_in: f64, margin_top_in: f64) -> SheetConfig {
        SheetConfig {
            rows,
            cols,
            margin_left_in,
            margin_top_in,
            ..Default::default()
        }
    }

    #[test]
    fn test_default_grid_is_landscape_and_fits() {
        // 4 x 2.5 + 1.0 = 11.0 wide, 2 x 3.5 + 1.5 = 8.5 tall: landscape exactly.
        let geometry = compute_geometry(&SheetConfig::default()).unwrap();
        assert_eq!(geometry.orientation, Orientation::Landscape);
        assert!(geometry.fits_page());
        assert_eq!(geometry.page, PixelSize::new(3300, 2550));
        assert_eq!(geometry.card, PixelSize::new(750, 1050));
        assert_eq!(geometry.bleed_px, 6);
        assert_eq!(geometry.slots.len(), 8);
        assert_eq!(geometry.slots[0], PixelRect::new(150, 225, 750, 1050));
        assert_eq!(geometry.slots[7], PixelRect::new(150 + 3 * 750, 225 + 1050, 750, 1050));
    }

    #[test]
    fn test_small_grid_prefers_portrait() {
        let geometry = compute_geometry(&grid(3, 3, 0.25, 0.0)).unwrap();
        assert_eq!(geometry.orientation, Orientation::Portrait);
        assert_eq!(geometry.page, PixelSize::new(2550, 3300));
        assert!(geometry.overflow.is_none());
    }

    #[test]
    fn test_falls_back_to_landscape_then_flags_overflow() {
        // Portrait: 4 x 2.5 + 1 = 11 > 8.5. Landscape: 3 x 3.5 + 1 = 11.5 > 8.5.
        let config = grid(3, 4, 0.5, 0.5);
        let (orientation, overflow) = choose_orientation(&config);
        assert_eq!(orientation, Orientation::Landscape);
        let overflow = overflow.expect("3x4 poker cards cannot fit on Letter");
        assert!((overflow.required_width_in - 11.0).abs() < 1e-9);
        assert!((overflow.required_height_in - 11.5).abs() < 1e-9);
        assert_eq!(overflow.page_width_in, 11.0);
        assert_eq!(overflow.page_height_in, 8.5);

        let geometry = compute_geometry(&config).unwrap();
        assert_eq!(geometry.orientation, Orientation::Landscape);
        assert!(!geometry.fits_page());
        assert_eq!(geometry.slots.len(), 12);
    }

    #[test]
    fn test_landscape_when_only_landscape_fits() {
        let (orientation, overflow) = choose_orientation(&grid(2, 4, 0.5, 0.5));
        assert_eq!(orientation, Orientation::Landscape);
        assert!(overflow.is_none());
    }

    #[test]
    fn test_rounded_card_width_moves_grid_to_landscape() {
        // 2.125 in rounds to 638 px at 300 DPI; four of them need 2552 px > 2550.
        let config = SheetConfig {
            card_width_in: 2.125,
            ..grid(2, 4, 0.0, 0.0)
        };
        let geometry = compute_geometry(&config).unwrap();
        assert_eq!(geometry.card.width, 638);
        assert_eq!(geometry.orientation, Orientation::Landscape);
        assert!(geometry.fits_page());
        let page = geometry.page.bounds();
        assert!(geometry.slots.iter().all(|slot| page.contains_rect(slot)));
    }

    #[test]
    fn test_grid_that_only_fits_in_inches_overflows() {
        // 4 x 2.75 in is exactly 11 in, but 2.75 in rounds to 413 px at 150 DPI.
        let config = SheetConfig {
            dpi: 150,
            card_width_in: 2.75,
            ..grid(1, 4, 0.0, 0.0)
        };
        let (orientation, overflow) = choose_orientation(&config);
        assert_eq!(orientation, Orientation::Landscape);
        let overflow = overflow.expect("1652 px of cards on a 1650 px page");
        assert!(overflow.required_width_in > overflow.page_width_in);
        assert!((overflow.required_width_in - 1652.0 / 150.0).abs() < 1e-9);
    }

    #[test]
    fn test_zero_grid_is_a_config_error() {
        assert!(matches!(
            compute_geometry(&grid(0, 4, 0.5, 0.5)),
            Err(ConfigError::EmptyGrid { .. })
        ));
    }

    #[test]
    fn test_distribute_spreads_leftover_space() {
        let config = SheetConfig {
            rows: 2,
            cols: 3,
            margin_left_in: 0.5,
            margin_top_in: 0.5,
            spacing: SlotSpacing::Distribute,
            ..Default::default()
        };
        let geometry = compute_geometry(&config).unwrap();
        // Portrait 2550 px wide: 2550 - 300 - 3 x 750 = 0 left over.
        assert_eq!(geometry.orientation, Orientation::Portrait);
        assert_eq!(geometry.gap_x, 0);
        // 3300 - 300 - 2 x 1050 = 900 left over, one gap.
        assert_eq!(geometry.gap_y, 900);
        assert_eq!(geometry.slots[3].y, 150 + 1050 + 900);
    }

    #[test]
    fn test_distribute_never_goes_negative() {
        let config = SheetConfig {
            spacing: SlotSpacing::Distribute,
            ..grid(3, 4, 0.5, 0.5)
        };
        let geometry = compute_geometry(&config).unwrap();
        assert_eq!(geometry.gap_y, 0);
    }

    #[test]
    fn test_bleed_rect_surrounds_slot() {
        let geometry = compute_geometry(&SheetConfig::default()).unwrap();
        let slot = geometry.slots[0];
        let bleed = geometry.bleed_rect(&slot).unwrap();
        assert_eq!(bleed, PixelRect::new(144, 219, 762, 1062));

        let no_bleed = compute_geometry(&SheetConfig { bleed_mm: 0.0, ..Default::default() }).unwrap();
        assert!(no_bleed.bleed_rect(&slot).is_none());
    }

    #[test]
    fn test_geometry_is_deterministic() {
        let config = grid(3, 3, 0.25, 0.1);
        assert_eq!(compute_geometry(&config).unwrap(), compute_geometry(&config).unwrap());
    }

    fn fitting_config() -> impl Strategy<Value = SheetConfig> {
        (
            50u32..=600,
            1u32..=5,
            1u32..=5,
            0.0f64..1.0,
            0.0f64..1.0,
            1.0f64..3.0,
            1.5f64..4.0,
            prop::bool::ANY,
        )
            .prop_map(|(dpi, rows, cols, ml, mt, cw, ch, distribute)| SheetConfig {
                dpi,
                rows,
                cols,
                margin_left_in: ml,
                margin_top_in: mt,
                card_width_in: cw,
                card_height_in: ch,
                spacing: if distribute { SlotSpacing::Distribute } else { SlotSpacing::Packed },
                ..Default::default()
            })
    }

    proptest! {
        #[test]
        fn slots_never_overlap(config in fitting_config()) {
            let geometry = compute_geometry(&config).unwrap();
            prop_assert_eq!(geometry.slots.len(), config.capacity());
            for (i, a) in geometry.slots.iter().enumerate() {
                for b in &geometry.slots[i + 1..] {
                    prop_assert!(!a.intersects(b), "{:?} overlaps {:?}", a, b);
                }
            }
        }

        #[test]
        fn slots_stay_on_fitting_pages(config in fitting_config()) {
            let geometry = compute_geometry(&config).unwrap();
            if geometry.fits_page() {
                let page = geometry.page.bounds();
                for slot in &geometry.slots {
                    prop_assert!(page.contains_rect(slot), "{:?} leaves page {:?}", slot, page);
                }
            }
        }

        #[test]
        fn card_pixels_follow_dpi(config in fitting_config()) {
            let geometry = compute_geometry(&config).unwrap();
            let expected = (config.card_width_in * f64::from(config.dpi)).round() as u32;
            prop_assert_eq!(geometry.card.width, expected);
        }
    }
}
