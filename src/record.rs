//! Low-level record grammar shared by every element encoder.
//!
//! A GDSII stream is a flat concatenation of records, each one
//! `length:u16-be, tag:u16-be, payload` where `length` counts the 4-byte
//! header too. There is no resynchronization mechanism, so a wrong length
//! corrupts everything that follows; [`Record`] computes the length from the
//! payload it actually accumulated instead of trusting the caller.

use crate::element::Float;

use std::io::Error;
use std::io::ErrorKind;
use std::io::Result as IoResult;
use std::io::Write;

/// Start of a Raith curved element (ellipse or arc).
pub const TAG_CURVED: u16 = 0x5600;
/// Start of a Raith FBMS element (dot or curved path).
pub const TAG_FBMS: u16 = 0x5800;
/// Layer number, one i16.
pub const TAG_LAYER: u16 = 0x0D02;
/// Datatype (dose factor × 1000 on Raith tools), one i16.
pub const TAG_DATATYPE: u16 = 0x0E02;
/// Line or path width, one i32 in database units.
pub const TAG_WIDTH: u16 = 0x0F03;
/// Rotation angle, one 8-byte extended real in degrees.
pub const TAG_ANGLE: u16 = 0x1C05;
/// Element geometry, layout depends on the element family.
pub const TAG_XY: u16 = 0x1003;
/// End of element, no payload.
pub const TAG_ENDEL: u16 = 0x1100;

/// Database units per micrometer for curved elements; the Raith importer
/// reads their coordinates as nanometers no matter what grid the rest of
/// the file uses.
pub const CURVED_UNITS_PER_UM: Float = 1000.0;

/// Scale a user-unit value to database units, rounding to nearest.
pub fn scale_round(value: Float, multiplier: Float) -> i32 {
    (value * multiplier).round() as i32
}

/// Scale a user-unit value to database units, truncating toward zero.
/// Curved-element centers and radii use this, not rounding.
pub fn scale_trunc(value: Float, multiplier: Float) -> i32 {
    (value * multiplier) as i32
}

/// One record under construction: a tag plus big-endian payload fields
/// appended in declared order.
#[derive(Debug, Clone)]
pub struct Record {
    tag: u16,
    payload: Vec<u8>,
}

impl Record {
    pub fn new(tag: u16) -> Self {
        Self {
            tag,
            payload: Vec::new(),
        }
    }

    pub fn i16(mut self, value: i16) -> Self {
        self.payload.extend_from_slice(&value.to_be_bytes());
        self
    }

    pub fn i32(mut self, value: i32) -> Self {
        self.payload.extend_from_slice(&value.to_be_bytes());
        self
    }

    pub fn i32s(mut self, values: &[i32]) -> Self {
        for value in values {
            self.payload.extend_from_slice(&value.to_be_bytes());
        }
        self
    }

    pub fn real(mut self, value: Float) -> Self {
        self.payload.extend_from_slice(&eight_byte_real(value));
        self
    }

    /// Write `length, tag, payload` to the sink. The length is derived from
    /// the accumulated payload; a payload too large for the 16-bit length
    /// field fails with `InvalidInput` instead of wrapping, since a wrong
    /// length corrupts every record after it.
    pub fn write<W: Write>(self, sink: &mut W) -> IoResult<()> {
        let length = self.payload.len() + 4;
        if length > u16::MAX as usize {
            return Err(Error::new(
                ErrorKind::InvalidInput,
                "record payload does not fit a 16-bit length field",
            ));
        }
        sink.write_all(&(length as u16).to_be_bytes())?;
        sink.write_all(&self.tag.to_be_bytes())?;
        sink.write_all(&self.payload)
    }
}

/// Encode a float as a GDSII 8-byte real: sign bit, excess-64 base-16
/// exponent, 56-bit mantissa. Zero maps to all-zero bytes.
pub fn eight_byte_real(value: Float) -> [u8; 8] {
    if value == 0.0 {
        return [0; 8];
    }
    let mut sign = 0u8;
    let mut value = value;
    if value < 0.0 {
        sign = 0x80;
        value = -value;
    }
    let fexp = value.log2() / 4.0;
    let mut exponent = fexp.ceil() as i32;
    if fexp == fexp.ceil() {
        // exact powers of 16 keep the mantissa below 1
        exponent += 1;
    }
    let mantissa = (value * 16.0f64.powi(14 - exponent)) as u64;
    let mut bytes = mantissa.to_be_bytes();
    bytes[0] = sign | (exponent + 64) as u8;
    bytes
}
