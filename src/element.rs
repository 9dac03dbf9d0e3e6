//! The four Raith element types and their encoders.
//!
//! Every element is a plain value object: build it once (the two constructor
//! guards are the only validation anywhere), then encode it any number of
//! times. Encoding borrows the element and the sink for the duration of one
//! call and writes a complete start-to-terminator run, so elements can be
//! emitted back to back into the same stream in any order.

use crate::record::scale_round;
use crate::record::scale_trunc;
use crate::record::Record;
use crate::record::CURVED_UNITS_PER_UM;
use crate::record::TAG_ANGLE;
use crate::record::TAG_CURVED;
use crate::record::TAG_DATATYPE;
use crate::record::TAG_ENDEL;
use crate::record::TAG_FBMS;
use crate::record::TAG_LAYER;
use crate::record::TAG_WIDTH;
use crate::record::TAG_XY;

use std::io::Result as IoResult;
use std::io::Write;

use thiserror::Error;

pub type Float = f64;
pub type Couple = vek::vec::repr_c::vec2::Vec2<Float>;

/// Hard limit of the Raith curve renderer.
pub const MAX_VERTICES: u16 = 1024;

/// Angle-bound fixed point: degrees × 785398/45, i.e. one full turn is
/// 2π × 10⁶ units.
const ANGLE_UNITS_PER_DEGREE: Float = 785398.0 / 45.0;

#[derive(Debug, Copy, Clone, Error)]
pub enum ElementError {
    #[error("curved elements support at most 1024 vertices, got {0}")]
    TooManyVertices(u16),
    #[error("expected {expected} curvature distances for {points} points, got {got}")]
    CurvatureMismatch {
        points: usize,
        expected: usize,
        got: usize,
    },
}

pub type ElementResult<T> = Result<T, ElementError>;

/// What an [`Encodable::encode`] call did to the sink.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum EncodeOutcome {
    /// A complete element was written.
    Written,
    /// The element was degenerate and not a single byte was written.
    Skipped,
}

/// Capability to append oneself to a GDSII stream.
///
/// `multiplier` converts user units to database units for the FBMS family;
/// curved elements ([`Ellipse`], [`Arc`]) are always written in nanometers
/// and ignore it.
pub trait Encodable {
    fn encode<W: Write>(&self, sink: &mut W, multiplier: Float) -> IoResult<EncodeOutcome>;
}

/// Closed ellipse or circle, drawn filled unless an outline width is set.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Ellipse {
    pub center: Couple,
    /// Major and minor radius in µm; equal radii make a circle.
    pub radii: [Float; 2],
    /// Outline width in µm; `None` means filled.
    pub linewidth: Option<Float>,
    /// Vertex count the tool uses to approximate the curve, at most 1024.
    pub vertices: u16,
    /// Rotation of the major axis in degrees from the u-axis; only
    /// meaningful when the radii differ.
    pub angle: Option<Float>,
    pub layer: i16,
    pub datatype: i16,
}

impl Ellipse {
    pub fn new(
        center: Couple,
        radii: [Float; 2],
        linewidth: Option<Float>,
        vertices: u16,
        angle: Option<Float>,
        layer: i16,
        datatype: i16,
    ) -> ElementResult<Self> {
        if vertices > MAX_VERTICES {
            return Err(ElementError::TooManyVertices(vertices));
        }
        Ok(Self {
            center,
            radii,
            linewidth,
            vertices,
            angle,
            layer,
            datatype,
        })
    }
}

impl Encodable for Ellipse {
    fn encode<W: Write>(&self, sink: &mut W, _multiplier: Float) -> IoResult<EncodeOutcome> {
        write_curved(
            sink,
            self.layer,
            self.datatype,
            self.linewidth,
            self.angle,
            self.center,
            self.radii,
            [0, 0],
            self.vertices,
            false,
        )?;
        Ok(EncodeOutcome::Written)
    }
}

/// Elliptical or circular arc swept between two angles.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Arc {
    pub center: Couple,
    pub radii: [Float; 2],
    /// Start and end angle in degrees, counter-clockwise from the u-axis.
    pub start_end: [Float; 2],
    pub linewidth: Option<Float>,
    pub vertices: u16,
    pub angle: Option<Float>,
    pub layer: i16,
    pub datatype: i16,
}

impl Arc {
    pub fn new(
        center: Couple,
        radii: [Float; 2],
        start_end: [Float; 2],
        linewidth: Option<Float>,
        vertices: u16,
        angle: Option<Float>,
        layer: i16,
        datatype: i16,
    ) -> ElementResult<Self> {
        if vertices > MAX_VERTICES {
            return Err(ElementError::TooManyVertices(vertices));
        }
        Ok(Self {
            center,
            radii,
            start_end,
            linewidth,
            vertices,
            angle,
            layer,
            datatype,
        })
    }
}

impl Encodable for Arc {
    fn encode<W: Write>(&self, sink: &mut W, _multiplier: Float) -> IoResult<EncodeOutcome> {
        let bounds = [
            (ANGLE_UNITS_PER_DEGREE * self.start_end[0]).round() as i32,
            (ANGLE_UNITS_PER_DEGREE * self.start_end[1]).round() as i32,
        ];
        write_curved(
            sink,
            self.layer,
            self.datatype,
            self.linewidth,
            self.angle,
            self.center,
            self.radii,
            bounds,
            self.vertices,
            true,
        )?;
        Ok(EncodeOutcome::Written)
    }
}

/// Shared layout of the curved-element family. Always in nanometers,
/// whatever the rest of the stream uses.
fn write_curved<W: Write>(
    sink: &mut W,
    layer: i16,
    datatype: i16,
    linewidth: Option<Float>,
    angle: Option<Float>,
    center: Couple,
    radii: [Float; 2],
    bounds: [i32; 2],
    vertices: u16,
    arc: bool,
) -> IoResult<()> {
    let elliptical = radii[0] != radii[1];
    let mut flags = 0i32;
    if elliptical {
        flags += 1;
    }
    if arc {
        flags += 4;
    }

    Record::new(TAG_CURVED).write(sink)?;
    Record::new(TAG_LAYER).i16(layer).write(sink)?;
    Record::new(TAG_DATATYPE).i16(datatype).write(sink)?;
    match linewidth {
        Some(width) => Record::new(TAG_WIDTH)
            .i32(scale_round(width, CURVED_UNITS_PER_UM))
            .write(sink)?,
        None => flags += 2,
    }
    if elliptical {
        if let Some(degrees) = angle {
            Record::new(TAG_ANGLE).real(degrees).write(sink)?;
        }
    }
    Record::new(TAG_XY)
        .i32(scale_trunc(center.x, CURVED_UNITS_PER_UM))
        .i32(scale_trunc(center.y, CURVED_UNITS_PER_UM))
        .i32(scale_trunc(radii[0], CURVED_UNITS_PER_UM))
        .i32(scale_trunc(radii[1], CURVED_UNITS_PER_UM))
        .i32(bounds[0])
        .i32(bounds[1])
        .i32(vertices as i32)
        .i32(flags)
        .write(sink)?;
    Record::new(TAG_ENDEL).write(sink)
}

/// Single-point circular exposure marker (FBMS family).
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Dot {
    pub center: Couple,
    /// Dot radius in user units.
    pub radius: Float,
    /// Outline width; zero means single pixel line.
    pub linewidth: Float,
    pub layer: i16,
    pub datatype: i16,
}

impl Dot {
    pub fn new(center: Couple, radius: Float, linewidth: Float, layer: i16, datatype: i16) -> Self {
        Self {
            center,
            radius,
            linewidth,
            layer,
            datatype,
        }
    }
}

impl Encodable for Dot {
    fn encode<W: Write>(&self, sink: &mut W, multiplier: Float) -> IoResult<EncodeOutcome> {
        write_fbms_prelude(
            sink,
            self.layer,
            self.datatype,
            scale_round(self.linewidth, multiplier),
        )?;
        // single-vertex FBMS layout, first five words reserved
        let mut uv = [0i32; 8];
        uv[5] = scale_round(self.center.x, multiplier);
        uv[6] = scale_round(self.center.y, multiplier);
        uv[7] = scale_round(self.radius, multiplier);
        Record::new(TAG_XY).i32s(&uv).write(sink)?;
        Record::new(TAG_ENDEL).write(sink)?;
        Ok(EncodeOutcome::Written)
    }
}

/// Per-segment curvature of a [`CurvedPath`].
#[derive(Debug, Clone, PartialEq)]
pub enum Curvature {
    /// Same chord-to-center distance for every segment; 0 is an
    /// all-straight path.
    Uniform(Float),
    /// One distance per segment, so one fewer than the point count.
    PerSegment(Vec<Float>),
}

/// Multi-vertex FBMS path whose segments bulge toward a curvature center.
///
/// Point order is significant: it fixes the travel direction, and a positive
/// curvature distance bulges the segment to the right of travel.
#[derive(Debug, Clone, PartialEq)]
pub struct CurvedPath {
    pub points: Vec<Couple>,
    /// Path width in user units, applied to the whole path.
    pub width: Float,
    /// Resolved to exactly one distance per segment by the constructor.
    pub curvature: Vec<Float>,
    /// Flattening hint for the surrounding path protocol, not encoded.
    pub tolerance: Float,
    /// Snapping hint for the surrounding path protocol, not encoded.
    pub precision: Float,
    /// Flattening hint for the surrounding path protocol, not encoded.
    pub max_points: usize,
    /// Sub-path count; the encoder only understands single sub-path
    /// elements and skips anything else.
    pub subpaths: usize,
    pub layer: i16,
    pub datatype: i16,
}

impl CurvedPath {
    pub fn new(
        points: Vec<Couple>,
        width: Float,
        curvature: Curvature,
        layer: i16,
        datatype: i16,
    ) -> ElementResult<Self> {
        let segments = points.len().saturating_sub(1);
        let curvature = match curvature {
            Curvature::Uniform(distance) => vec![distance; segments],
            Curvature::PerSegment(distances) => {
                if distances.len() != segments {
                    return Err(ElementError::CurvatureMismatch {
                        points: points.len(),
                        expected: segments,
                        got: distances.len(),
                    });
                }
                distances
            }
        };
        Ok(Self {
            points,
            width,
            curvature,
            tolerance: 0.01,
            precision: 1e-3,
            max_points: 199,
            subpaths: 1,
            layer,
            datatype,
        })
    }
}

impl Encodable for CurvedPath {
    fn encode<W: Write>(&self, sink: &mut W, multiplier: Float) -> IoResult<EncodeOutcome> {
        if self.points.len() < 2 || self.subpaths != 1 {
            log::debug!(
                "skipping degenerate curved path: {} points, {} sub-paths",
                self.points.len(),
                self.subpaths,
            );
            return Ok(EncodeOutcome::Skipped);
        }
        write_fbms_prelude(
            sink,
            self.layer,
            self.datatype,
            scale_round(self.width, multiplier),
        )?;

        // four reserved words, then [type, x, y, curvature] per vertex; the
        // curvature word of vertex i belongs to the segment ending there
        let mut uv = vec![0i32; 4 + 4 * self.points.len()];
        for (i, point) in self.points.iter().enumerate() {
            let block = 4 + 4 * i;
            if i > 0 {
                let distance = self.curvature[i - 1];
                uv[block] = if distance != 0.0 { 2 } else { 1 };
                uv[block + 3] = scale_round(distance, multiplier);
            }
            uv[block + 1] = scale_round(point.x, multiplier);
            uv[block + 2] = scale_round(point.y, multiplier);
        }
        Record::new(TAG_XY).i32s(&uv).write(sink)?;
        Record::new(TAG_ENDEL).write(sink)?;
        Ok(EncodeOutcome::Written)
    }
}

fn write_fbms_prelude<W: Write>(
    sink: &mut W,
    layer: i16,
    datatype: i16,
    width: i32,
) -> IoResult<()> {
    Record::new(TAG_FBMS).write(sink)?;
    Record::new(TAG_LAYER).i16(layer).write(sink)?;
    Record::new(TAG_DATATYPE).i16(datatype).write(sink)?;
    Record::new(TAG_WIDTH).i32(width).write(sink)
}

/// Any of the four Raith elements, for callers that keep mixed lists.
#[derive(Debug, Clone, PartialEq)]
pub enum Element {
    Ellipse(Ellipse),
    Arc(Arc),
    Dot(Dot),
    Path(CurvedPath),
}

impl Encodable for Element {
    fn encode<W: Write>(&self, sink: &mut W, multiplier: Float) -> IoResult<EncodeOutcome> {
        match self {
            Element::Ellipse(ellipse) => ellipse.encode(sink, multiplier),
            Element::Arc(arc) => arc.encode(sink, multiplier),
            Element::Dot(dot) => dot.encode(sink, multiplier),
            Element::Path(path) => path.encode(sink, multiplier),
        }
    }
}

impl From<Ellipse> for Element {
    fn from(ellipse: Ellipse) -> Self {
        Element::Ellipse(ellipse)
    }
}

impl From<Arc> for Element {
    fn from(arc: Arc) -> Self {
        Element::Arc(arc)
    }
}

impl From<Dot> for Element {
    fn from(dot: Dot) -> Self {
        Element::Dot(dot)
    }
}

impl From<CurvedPath> for Element {
    fn from(path: CurvedPath) -> Self {
        Element::Path(path)
    }
}
