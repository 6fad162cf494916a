//! PE Container (§4.1): reading, digesting, and rewriting the Certificate
//! Table of a PE image.

pub mod checksum;
pub mod image;
pub mod layout;

pub use image::PeImage;
pub use layout::CERTIFICATE_TABLE_INDEX;
