#![deny(missing_docs)]

//! `gvar` Glyph Variations Table
//!
//! <https://learn.microsoft.com/en-us/typography/opentype/spec/gvar>

mod iup;

use crate::binary::read::{ReadArray, ReadBinary, ReadCtxt, ReadScope, ReadUnchecked};
use crate::binary::{U16Be, U32Be};
use crate::error::ParseError;
use crate::tables::variable_fonts::{PointNumbers, Tuple, TupleVariationHeader, TupleVariationStore};
use crate::tables::F2Dot14;
use crate::SafeFrom;

use pathfinder_geometry::vector::{vec2f, Vector2F};

/// The number of phantom points appended to the points of every glyph.
pub const PHANTOM_POINT_COUNT: usize = 4;

/// `gvar` Glyph Variations Table
///
/// <https://learn.microsoft.com/en-us/typography/opentype/spec/gvar#gvar-header>
pub struct GvarTable<'a> {
    /// Major version number of the glyph variations table.
    pub major_version: u16,
    /// Minor version number of the glyph variations table.
    pub minor_version: u16,
    /// The number of variation axes for this font.
    ///
    /// This must be the same number as axisCount in
    /// the 'fvar' table.
    axis_count: u16,
    /// The number of shared tuple records.
    ///
    /// Shared tuple records can be referenced within glyph
    /// variation data tables for multiple glyphs, as opposed to other tuple records stored
    /// directly within a glyph variation data table.
    shared_tuple_count: u16,
    /// Scope containing data for the shared tuple records.
    shared_tuples_scope: ReadScope<'a>,
    /// The number of glyphs in this font.
    ///
    /// This must match the number of glyphs stored elsewhere in
    /// the font.
    glyph_count: u16,
    /// Bit-field that gives the format of the offset array that follows.
    ///
    /// If bit 0 is clear, the
    /// offsets are u16; if bit 0 is set, the offsets are uint32.
    flags: u16,
    /// Scope containing the data for the array of GlyphVariationData tables.
    glyph_variation_data_array_scope: ReadScope<'a>,
    /// Offsets from the start of the GlyphVariationData array to each GlyphVariationData table.
    glyph_variation_data_offsets: GlyphVariationDataOffsets<'a>,
}

enum GlyphVariationDataOffsets<'a> {
    /// The offset divided by 2 is stored.
    Short(ReadArray<'a, U16Be>),
    Long(ReadArray<'a, U32Be>),
}

/// A point of a glyph outline in font units.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub struct Point(pub i16, pub i16);

/// The points of a glyph that deltas are calculated for.
///
/// Supplied by the outline reader. Phantom points are not included, they are appended when
/// deltas are calculated.
#[derive(Debug, Copy, Clone)]
pub enum GlyphPoints<'a> {
    /// A glyph with no outline.
    Empty,
    /// A glyph with contours.
    Simple {
        /// The default (un-varied) point coordinates.
        points: &'a [Point],
        /// The index of the last point of each contour.
        end_points: &'a [u16],
    },
    /// A composite glyph. Each component has one point, representing its offset.
    Composite {
        /// The number of components in the glyph.
        component_count: u16,
    },
}

/// Calculated deltas for the points of a glyph at a particular instance.
///
/// Holds one delta per point followed by the deltas of the four phantom points.
#[derive(Debug, Clone, PartialEq)]
pub struct GlyphDeltas {
    deltas: Vec<Vector2F>,
}

impl<'a> GvarTable<'a> {
    /// The number of axes the tuples of this table have.
    pub fn axis_count(&self) -> u16 {
        self.axis_count
    }

    /// The number of glyphs with variation data offsets.
    pub fn glyph_count(&self) -> u16 {
        self.glyph_count
    }

    /// The number of shared tuple records.
    pub fn shared_tuple_count(&self) -> u16 {
        self.shared_tuple_count
    }

    /// Retrieve the shared tuple at `index`.
    pub fn shared_tuple(&self, index: u16) -> Result<Tuple<'a>, ParseError> {
        if index >= self.shared_tuple_count {
            return Err(ParseError::BadIndex);
        }
        let axis_count = usize::from(self.axis_count);
        let offset = usize::from(index) * axis_count * F2Dot14::SIZE;
        self.shared_tuples_scope
            .offset(offset)
            .ctxt()
            .read_array::<F2Dot14>(axis_count)
    }

    /// Retrieve the tuple variation store for the glyph.
    ///
    /// `num_points` must include the four phantom points. Returns `None` if the glyph has no
    /// variation data.
    pub fn glyph_variation_data(
        &self,
        glyph_index: u16,
        num_points: u32,
    ) -> Result<Option<TupleVariationStore<'a>>, ParseError> {
        if glyph_index >= self.glyph_count {
            return Err(ParseError::BadIndex);
        }
        let index = usize::from(glyph_index);
        let start = self
            .glyph_variation_data_offsets
            .get(index)
            .ok_or(ParseError::BadIndex)?;
        let end = self
            .glyph_variation_data_offsets
            .get(index + 1)
            .ok_or(ParseError::BadIndex)?;
        if end < start {
            return Err(ParseError::BadOffset);
        } else if start == end {
            return Ok(None);
        }
        let length = usize::safe_from(end - start);
        self.glyph_variation_data_array_scope
            .offset_length(usize::safe_from(start), length)?
            .read_dep::<TupleVariationStore<'_>>((self.axis_count, num_points))
            .map(Some)
    }

    /// Calculate the deltas for every point of a glyph at `instance`.
    ///
    /// Points that a tuple variation doesn't reference have their deltas inferred from the
    /// points around them on the same contour. A glyph without variation data gets all-zero
    /// deltas.
    pub fn glyph_deltas(
        &self,
        glyph_index: u16,
        points: GlyphPoints<'_>,
        instance: &[F2Dot14],
    ) -> Result<GlyphDeltas, ParseError> {
        let num_points = points.len() + PHANTOM_POINT_COUNT;
        let mut deltas = GlyphDeltas::zero(num_points);
        let Some(store) = self.glyph_variation_data(glyph_index, u32::try_from(num_points)?)?
        else {
            return Ok(deltas);
        };

        for header in store.headers() {
            let peak = self.peak_tuple(header)?;
            let scalar = header.scalar(&peak, instance);
            if scalar == 0. {
                continue;
            }
            let data = header.variation_data(store.num_points(), store.shared_point_numbers())?;

            match points {
                GlyphPoints::Simple { points, end_points }
                    if !matches!(data.point_numbers(), PointNumbers::All(_)) =>
                {
                    let mut tuple_deltas = vec![None; num_points];
                    for (point_number, (x, y)) in data.iter() {
                        if let Some(delta) = tuple_deltas.get_mut(usize::safe_from(point_number)) {
                            *delta = Some(vec2f(f32::from(x), f32::from(y)) * scalar);
                        }
                    }
                    iup::interpolate_untouched(points, end_points, &mut tuple_deltas);
                    for (delta, tuple_delta) in deltas.deltas.iter_mut().zip(tuple_deltas) {
                        if let Some(tuple_delta) = tuple_delta {
                            *delta = *delta + tuple_delta;
                        }
                    }
                }
                _ => {
                    for (point_number, (x, y)) in data.iter() {
                        if let Some(delta) = deltas.deltas.get_mut(usize::safe_from(point_number))
                        {
                            *delta = *delta + vec2f(f32::from(x), f32::from(y)) * scalar;
                        }
                    }
                }
            }
        }

        Ok(deltas)
    }

    fn peak_tuple(&self, header: &TupleVariationHeader<'a>) -> Result<Tuple<'a>, ParseError> {
        match header.peak_tuple() {
            Some(peak) => Ok(peak.clone()),
            None => header
                .tuple_index()
                .ok_or(ParseError::MissingValue)
                .and_then(|index| self.shared_tuple(index)),
        }
    }
}

impl ReadBinary for GvarTable<'_> {
    type HostType<'a> = GvarTable<'a>;

    fn read<'a>(ctxt: &mut ReadCtxt<'a>) -> Result<Self::HostType<'a>, ParseError> {
        let scope = ctxt.scope();
        let major_version = ctxt.read_u16be()?;
        ctxt.check_version(major_version == 1)?;
        let minor_version = ctxt.read_u16be()?;
        let axis_count = ctxt.read_u16be()?;
        let shared_tuple_count = ctxt.read_u16be()?;
        let shared_tuples_offset = ctxt.read_u32be()?;
        let glyph_count = ctxt.read_u16be()?;
        let flags = ctxt.read_u16be()?;
        let glyph_variation_data_array_offset = ctxt.read_u32be()?;
        // If bit 0 is clear, the offsets are uint16; if bit 0 is set, the offsets are uint32.
        let glyph_variation_data_offsets = if flags & 1 == 1 {
            // The actual local offset is stored. The value of n is numGlyphs + 1.
            GlyphVariationDataOffsets::Long(
                ctxt.read_array::<U32Be>(usize::from(glyph_count) + 1)?,
            )
        } else {
            // The actual local offset divided by 2 is stored. The value of n is numGlyphs + 1.
            GlyphVariationDataOffsets::Short(
                ctxt.read_array::<U16Be>(usize::from(glyph_count) + 1)?,
            )
        };

        // Store the shared tuples
        let shared_tuples_len =
            usize::from(shared_tuple_count) * usize::from(axis_count) * F2Dot14::SIZE;
        let shared_tuples_scope =
            scope.offset_length(usize::safe_from(shared_tuples_offset), shared_tuples_len)?;

        let glyph_variation_data_len = glyph_variation_data_offsets
            .last()
            .ok_or(ParseError::BadIndex)?;
        let glyph_variation_data_array_scope = scope.offset_length(
            usize::safe_from(glyph_variation_data_array_offset),
            usize::safe_from(glyph_variation_data_len),
        )?;

        Ok(GvarTable {
            major_version,
            minor_version,
            axis_count,
            shared_tuple_count,
            shared_tuples_scope,
            glyph_count,
            flags,
            glyph_variation_data_array_scope,
            glyph_variation_data_offsets,
        })
    }
}

impl GlyphVariationDataOffsets<'_> {
    fn get(&self, index: usize) -> Option<u32> {
        match self {
            GlyphVariationDataOffsets::Short(offsets) => {
                offsets.get_item(index).map(|offset| u32::from(offset) * 2)
            }
            GlyphVariationDataOffsets::Long(offsets) => offsets.get_item(index),
        }
    }

    fn last(&self) -> Option<u32> {
        let len = match self {
            GlyphVariationDataOffsets::Short(offsets) => offsets.len(),
            GlyphVariationDataOffsets::Long(offsets) => offsets.len(),
        };
        self.get(len.checked_sub(1)?)
    }
}

impl GlyphPoints<'_> {
    /// The number of points, excluding phantom points.
    pub fn len(&self) -> usize {
        match self {
            GlyphPoints::Empty => 0,
            GlyphPoints::Simple { points, .. } => points.len(),
            GlyphPoints::Composite { component_count } => usize::from(*component_count),
        }
    }

    /// Returns `true` if there are no points, excluding phantom points.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl GlyphDeltas {
    /// All-zero deltas for `num_points` points (including phantom points).
    pub fn zero(num_points: usize) -> GlyphDeltas {
        GlyphDeltas {
            deltas: vec![Vector2F::zero(); num_points],
        }
    }

    /// Deltas of the glyph's own points (or components), excluding phantom points.
    pub fn point_deltas(&self) -> &[Vector2F] {
        let len = self.deltas.len().saturating_sub(PHANTOM_POINT_COUNT);
        &self.deltas[..len]
    }

    /// Deltas of the four phantom points: horizontal origin, advance width, top origin, and
    /// advance height.
    pub fn phantom_deltas(&self) -> [Vector2F; PHANTOM_POINT_COUNT] {
        let mut phantom = [Vector2F::zero(); PHANTOM_POINT_COUNT];
        let start = self.deltas.len().saturating_sub(PHANTOM_POINT_COUNT);
        for (dst, src) in phantom.iter_mut().zip(&self.deltas[start..]) {
            *dst = *src;
        }
        phantom
    }

    /// Change to the advance width.
    pub fn advance_width_delta(&self) -> f32 {
        let [origin, advance, ..] = self.phantom_deltas();
        advance.x() - origin.x()
    }

    /// Change to the left side bearing due to the movement of the horizontal origin.
    pub fn left_side_bearing_delta(&self) -> f32 {
        let [origin, ..] = self.phantom_deltas();
        -origin.x()
    }

    /// Change to the advance height.
    pub fn advance_height_delta(&self) -> f32 {
        let [_, _, top, bottom] = self.phantom_deltas();
        top.y() - bottom.y()
    }

    /// Change to the top side bearing due to the movement of the top origin.
    pub fn top_side_bearing_delta(&self) -> f32 {
        let [_, _, top, _] = self.phantom_deltas();
        top.y()
    }
}
