//! Binary layout of ROI records.
//!
//! Every offset, field type and code of the format is declared in this module
//! and nowhere else. The decoder and encoder go through [`PrimaryHeader`],
//! [`SecondaryHeader`] and the descriptors in [`layout`].

pub mod codes;
pub mod color;
pub mod field;
pub mod header;
pub mod layout;
pub mod select;

pub use codes::{RoiOptions, RoiType, Subtype};
pub use color::Color;
pub use field::{Field, FieldType};
pub use header::{PrimaryHeader, SecondaryHeader};
pub use select::{SelectField, SelectParams};

/// Size of the primary header.
pub const HEADER_SIZE: usize = 64;

/// Size of the secondary header.
pub const HEADER2_SIZE: usize = 52;

/// Zero bytes between the geometry payload and the secondary header.
pub const PAD_LEN: usize = 4;

/// Tag at the start of every record.
pub const MAGIC: [u8; 4] = *b"Iout";

/// First format version that honors the subpixel option bit.
pub const SUBPIXEL_MIN_VERSION: i16 = 222;

/// Version written for programmatically built shapes.
pub const DEFAULT_VERSION: i16 = 227;
