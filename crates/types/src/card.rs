use serde::{Deserialize, Serialize};

/// Upper bound on copies of a single card. Larger requests are clamped.
pub const MAX_QUANTITY: u32 = 999;

/// One normalized line of the user's list: a card name and how many copies to place.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CardRequest {
    /// The cleaned card name, exactly as it will be searched for.
    pub name: String,
    /// Number of placements, between 1 and [`MAX_QUANTITY`].
    pub quantity: u32,
}

impl CardRequest {
    /// Returns `None` for a zero quantity or a blank name. Quantities above
    /// [`MAX_QUANTITY`] are clamped to it.
    pub fn new(name: impl Into<String>, quantity: u32) -> Option<Self> {
        let name = name.into();
        if quantity == 0 || name.trim().is_empty() {
            return None;
        }
        Some(Self {
            name,
            quantity: quantity.min(MAX_QUANTITY),
        })
    }
}

/// Where the artwork for a resolved card comes from.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum CardImage {
    /// A printing identified by set code and number; the image path is derived from them.
    Printing { set_code: String, number: String },
    /// A direct image URL taken from the card record.
    Direct(String),
}

/// The outcome of name resolution: enough to fetch exactly one image.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolvedCard {
    /// The name the caller asked for. Bitmap cache entries are keyed by this.
    pub requested_name: String,
    /// The card's own name as reported upstream, or the requested name.
    pub display_name: String,
    pub image: CardImage,
}

impl ResolvedCard {
    pub fn set_code(&self) -> Option<&str> {
        match &self.image {
            CardImage::Printing { set_code, .. } => Some(set_code),
            CardImage::Direct(_) => None,
        }
    }

    pub fn number(&self) -> Option<&str> {
        match &self.image {
            CardImage::Printing { number, .. } => Some(number),
            CardImage::Direct(_) => None,
        }
    }

    pub fn image_ref(&self) -> Option<&str> {
        match &self.image {
            CardImage::Direct(url) => Some(url),
            CardImage::Printing { .. } => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_rejects_zero_quantity_and_blank_name() {
        assert!(CardRequest::new("Darth Vader", 0).is_none());
        assert!(CardRequest::new("   ", 2).is_none());
        assert_eq!(
            CardRequest::new("Darth Vader", 2),
            Some(CardRequest { name: "Darth Vader".to_string(), quantity: 2 })
        );
    }

    #[test]
    fn test_request_quantity_is_clamped() {
        let request = CardRequest::new("Grogu", u32::MAX).unwrap();
        assert_eq!(request.quantity, MAX_QUANTITY);
    }

    #[test]
    fn test_resolved_card_accessors() {
        let printing = ResolvedCard {
            requested_name: "luke skywalker".to_string(),
            display_name: "Luke Skywalker".to_string(),
            image: CardImage::Printing { set_code: "SOR".to_string(), number: "5".to_string() },
        };
        assert_eq!(printing.set_code(), Some("SOR"));
        assert_eq!(printing.number(), Some("5"));
        assert_eq!(printing.image_ref(), None);

        let direct = ResolvedCard {
            image: CardImage::Direct("https://cdn.example.com/a.png".to_string()),
            ..printing
        };
        assert_eq!(direct.set_code(), None);
        assert_eq!(direct.image_ref(), Some("https://cdn.example.com/a.png"));
    }
}
