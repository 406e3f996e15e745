use crate::ConfigError;
use cardsheet_types::Color;
use serde::{Deserialize, Serialize};

/// How leftover page space is treated between slots.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SlotSpacing {
    /// Cards butt against each other; leftover space stays at the right and bottom.
    #[default]
    Packed,
    /// Leftover space is split evenly between columns and rows, floored to
    /// whole pixels. A grid that does not fit gets no gap rather than a negative one.
    Distribute,
}

/// User-facing sheet settings, in physical units.
///
/// Every field is optional in JSON; missing fields take the defaults of a
/// 2x4 grid of poker-size cards on US Letter at 300 DPI.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SheetConfig {
    pub dpi: u32,
    pub card_width_in: f64,
    pub card_height_in: f64,
    pub rows: u32,
    pub cols: u32,
    pub margin_left_in: f64,
    pub margin_top_in: f64,
    pub bleed_mm: f64,
    pub spacing: SlotSpacing,
    /// Fill color of the bleed border around each card.
    pub bleed_color: Color,
}

impl Default for SheetConfig {
    fn default() -> Self {
        Self {
            dpi: 300,
            card_width_in: 2.5,
            card_height_in: 3.5,
            rows: 2,
            cols: 4,
            margin_left_in: 0.5,
            margin_top_in: 0.75,
            bleed_mm: 0.5,
            spacing: SlotSpacing::Packed,
            bleed_color: Color::BLACK,
        }
    }
}

impl SheetConfig {
    /// Number of slots on every sheet.
    pub fn capacity(&self) -> usize {
        self.rows as usize * self.cols as usize
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.rows == 0 || self.cols == 0 {
            return Err(ConfigError::EmptyGrid {
                rows: self.rows,
                cols: self.cols,
            });
        }
        if self.dpi == 0 {
            return Err(ConfigError::ZeroDpi);
        }
        for (field, value) in [
            ("cardWidthIn", self.card_width_in),
            ("cardHeightIn", self.card_height_in),
        ] {
            if !value.is_finite() || value <= 0.0 {
                return Err(ConfigError::InvalidCardSize { field, value });
            }
        }
        for (field, value) in [
            ("marginLeftIn", self.margin_left_in),
            ("marginTopIn", self.margin_top_in),
            ("bleedMm", self.bleed_mm),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(ConfigError::InvalidLength { field, value });
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = SheetConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.capacity(), 8);
    }

    #[test]
    fn test_zero_rows_or_cols_rejected() {
        let config = SheetConfig { rows: 0, ..Default::default() };
        assert_eq!(config.validate(), Err(ConfigError::EmptyGrid { rows: 0, cols: 4 }));

        let config = SheetConfig { cols: 0, ..Default::default() };
        assert!(matches!(config.validate(), Err(ConfigError::EmptyGrid { .. })));
    }

    #[test]
    fn test_bad_lengths_rejected() {
        let config = SheetConfig { card_width_in: 0.0, ..Default::default() };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidCardSize { field: "cardWidthIn", .. })
        ));

        let config = SheetConfig { margin_top_in: -0.1, ..Default::default() };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidLength { field: "marginTopIn", .. })
        ));

        let config = SheetConfig { bleed_mm: f64::NAN, ..Default::default() };
        assert!(config.validate().is_err());

        let config = SheetConfig { dpi: 0, ..Default::default() };
        assert_eq!(config.validate(), Err(ConfigError::ZeroDpi));
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config: SheetConfig =
            serde_json::from_str(r##"{"rows": 3, "spacing": "distribute", "bleedColor": "#222"}"##)
                .unwrap();
        assert_eq!(config.rows, 3);
        assert_eq!(config.cols, 4);
        assert_eq!(config.spacing, SlotSpacing::Distribute);
        assert_eq!(config.bleed_color, Color::gray(0x22));
        assert_eq!(config.dpi, 300);
    }
}
