//! Writer for the proprietary GDSII stream records understood by Raith
//! electron-beam lithography tools: curved elements (ellipses, circles,
//! elliptical arcs) and FBMS fixed-dose elements (dots, curved paths).
//!
//! Each element type encodes itself into any [`std::io::Write`] sink as a
//! self-contained run of big-endian, length-prefixed records, ready to be
//! spliced into a GDSII structure between the surrounding library's own
//! records.

pub mod element;
pub mod record;


#[doc(inline)]
pub use {
    element::Arc,
    element::Couple,
    element::Curvature,
    element::CurvedPath,
    element::Dot,
    element::Element,
    element::ElementError,
    element::Ellipse,
    element::Encodable,
    element::EncodeOutcome,
    element::Float,
    record::eight_byte_real,
};
