//! Infrastructure layer providing external service integrations.
//!
//! The advice endpoint, IP geolocation, image encoding, CSV export and
//! the system clipboard live here behind small, synchronous interfaces.

pub mod advice;
pub mod clipboard;
pub mod export;
pub mod image;
pub mod location;

pub use advice::*;
pub use clipboard::*;
pub use export::*;
pub use self::image::*;
pub use location::*;
