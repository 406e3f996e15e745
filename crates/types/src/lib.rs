pub mod card;
pub mod color;
pub mod geometry;

pub use card::{CardImage, CardRequest, MAX_QUANTITY, ResolvedCard};
pub use color::Color;
pub use geometry::{Orientation, PixelRect, PixelSize, Slot};
