#![deny(missing_docs)]

//! Common tables pertaining to variable fonts.

use crate::binary::read::{
    ReadArray, ReadBinary, ReadBinaryDep, ReadCtxt, ReadFrom, ReadScope, ReadUnchecked,
};
use crate::binary::write::{WriteBinary, WriteContext};
use crate::binary::{I16Be, I32Be, U16Be, U32Be, I8, U8};
use crate::error::{ParseError, WriteError};
use crate::tables::F2Dot14;
use crate::SafeFrom;
use std::borrow::Cow;
use std::iter;

use log::debug;
use tinyvec::TinyVec;

pub mod fvar;
pub mod gvar;
pub mod hvar;
pub mod mvar;
pub mod stat;

/// Flag indicating that some or all tuple variation tables reference a shared set of “point”
/// numbers.
///
/// These shared numbers are represented as packed point number data at the start of the serialized
/// data.
const SHARED_POINT_NUMBERS: u16 = 0x8000;
/// Mask for the low bits to give the number of tuple variation tables.
const COUNT_MASK: u16 = 0x0FFF;
/// Flag indicating the data type used for point numbers in this run.
///
/// If set, the point numbers are stored as unsigned 16-bit values (uint16); if clear, the point
/// numbers are stored as unsigned bytes (uint8).
const POINTS_ARE_WORDS: u8 = 0x80;
/// Mask for the low 7 bits of the control byte to give the number of point number elements, minus
/// 1.
const POINT_RUN_COUNT_MASK: u8 = 0x7F;

/// Flag indicating that this tuple variation header includes an embedded peak tuple record,
/// immediately after the tupleIndex field.
///
/// If set, the low 12 bits of the tupleIndex value are ignored.
const EMBEDDED_PEAK_TUPLE: u16 = 0x8000;
/// Flag indicating that this tuple variation table applies to an intermediate region within the
/// variation space.
///
/// If set, the header includes the two intermediate-region, start and end tuple records,
/// immediately after the peak tuple record (if present).
const INTERMEDIATE_REGION: u16 = 0x4000;
/// Flag indicating that the serialized data for this tuple variation table includes packed “point”
/// number data.
///
/// If set, this tuple variation table uses that number data; if clear, this tuple variation table
/// uses shared number data found at the start of the serialized data for this glyph variation data.
const PRIVATE_POINT_NUMBERS: u16 = 0x2000;
/// Mask for the low 12 bits to give the shared tuple records index.
const TUPLE_INDEX_MASK: u16 = 0x0FFF;

/// Flag indicating that this run contains no data (no explicit delta values are stored), and that
/// the deltas for this run are all zero.
const DELTAS_ARE_ZERO: u8 = 0x80;
/// Flag indicating the data type for delta values in the run.
///
/// If set, the run contains 16-bit signed deltas (int16); if clear, the run contains 8-bit signed
/// deltas (int8).
const DELTAS_ARE_WORDS: u8 = 0x40;
/// Mask for the low 6 bits to provide the number of delta values in the run, minus one.
const DELTA_RUN_COUNT_MASK: u8 = 0x3F;

/// Flag in `word_delta_count` indicating that word deltas are 32-bit and the remaining deltas are
/// 16-bit.
const LONG_WORDS: u16 = 0x8000;
/// Mask for the count of word deltas in `word_delta_count`.
const WORD_DELTA_COUNT_MASK: u16 = 0x7FFF;

/// Mask for the number of bits used for the inner index in a delta-set index map entry, minus 1.
const INNER_INDEX_BIT_COUNT_MASK: u8 = 0x0F;
/// Mask for the size in bytes of each delta-set index map entry, minus 1.
const MAP_ENTRY_SIZE_MASK: u8 = 0x30;

/// Coordinate array specifying a position within the font’s variation space.
///
/// The number of elements must match the axisCount specified in the `fvar` table.
///
/// <https://learn.microsoft.com/en-us/typography/opentype/spec/otvarcommonformats#tuple-records>
pub type Tuple<'a> = ReadArray<'a, F2Dot14>;

// Most variable fonts have one or two axes. The minimum size of a TinyVec is 24 bytes due to the
// Vec it can also hold, so 4 inline values doesn't use any more space than 2.

/// Coordinate array specifying a normalized position within the font’s variation space
/// (owned version).
///
/// Values are in axis order (the order of the `fvar` axis records) and are clamped to the
/// normalized range [-1, 1].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct OwnedTuple(TinyVec<[F2Dot14; 4]>);

/// A variation region axis: start, peak, and end coordinates for one axis.
///
/// <https://learn.microsoft.com/en-us/typography/opentype/spec/otvarcommonformats#variation-regions>
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct RegionAxisCoordinates {
    /// The region start coordinate value for the current axis.
    pub start_coord: F2Dot14,
    /// The region peak coordinate value for the current axis.
    pub peak_coord: F2Dot14,
    /// The region end coordinate value for the current axis.
    pub end_coord: F2Dot14,
}

/// A region of the variation space: one set of axis coordinates per axis.
#[derive(Debug, Clone)]
pub struct VariationRegion<'a> {
    region_axes: ReadArray<'a, RegionAxisCoordinates>,
}

/// List of the variation regions referenced by an item variation store.
#[derive(Debug, Clone)]
pub struct VariationRegionList<'a> {
    axis_count: u16,
    region_count: u16,
    /// Region axes of all regions, `axis_count` per region.
    variation_regions: ReadArray<'a, RegionAxisCoordinates>,
    variation_regions_scope: ReadScope<'a>,
}

/// Item variation store.
///
/// Holds the shared region list and the delta-set subtables. An (outer, inner) index pair
/// selects a subtable and a row within it.
///
/// <https://learn.microsoft.com/en-us/typography/opentype/spec/otvarcommonformats#item-variation-store>
#[derive(Debug, Clone)]
pub struct ItemVariationStore<'a> {
    /// Format, set to 1
    pub format: u16,
    /// The variation region list.
    variation_region_list: VariationRegionList<'a>,
    /// The item variation data subtables.
    item_variation_data: Vec<ItemVariationData<'a>>,
}

/// Item variation data subtable: rows of deltas, one delta per referenced region.
#[derive(Debug, Clone)]
pub struct ItemVariationData<'a> {
    /// The number of delta sets for distinct items.
    item_count: u16,
    /// A packed field: the high bit is the `LONG_WORDS` flag, and the low 15 bits are the count
    /// of "word" deltas at the start of each row.
    word_delta_count: u16,
    /// Array of indices into the variation region list for the regions referenced by this item
    /// variation data table.
    region_indexes: ReadArray<'a, U16Be>,
    /// The delta-set rows.
    delta_sets: &'a [u8],
}

/// A row of deltas from an [ItemVariationData] subtable.
#[derive(Debug, Clone, Copy)]
pub struct DeltaSet<'a> {
    data: &'a [u8],
    word_delta_count: u16,
    region_index_count: u16,
}

/// Index into an [ItemVariationStore]: the outer index selects an item variation data
/// subtable, the inner index a delta-set row within it.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct DeltaSetIndexMapEntry {
    /// Index into the item variation data subtables.
    pub outer_index: u16,
    /// Index of the delta-set row within the subtable.
    pub inner_index: u16,
}

/// Delta-set index map: maps item indices (usually glyph ids) to delta-set indices.
///
/// <https://learn.microsoft.com/en-us/typography/opentype/spec/otvarcommonformats#associating-target-items-to-variation-data>
#[derive(Debug, Clone)]
pub struct DeltaSetIndexMap<'a> {
    /// A packed field that describes the compressed representation of delta-set indices.
    entry_format: u8,
    /// The number of mapping entries.
    map_count: u32,
    /// The delta-set index mapping data.
    map_data: &'a [u8],
}

/// Tuple Variation Store Header.
///
/// Holds the tuple variation headers for one glyph along with any shared point numbers.
///
/// <https://learn.microsoft.com/en-us/typography/opentype/spec/otvarcommonformats#tuple-variation-store-header>
pub struct TupleVariationStore<'a> {
    /// The number of points in the glyph this store is for, including phantom points.
    num_points: u32,
    /// Point numbers shared by tuple variation tables that don't have private ones.
    shared_point_numbers: Option<PointNumbers>,
    /// Array of tuple variation headers.
    tuple_variation_headers: Vec<TupleVariationHeader<'a>>,
}

/// Tuple variation header.
///
/// <https://learn.microsoft.com/en-us/typography/opentype/spec/otvarcommonformats#tuplevariationheader>
pub struct TupleVariationHeader<'a> {
    /// The size in bytes of the serialized data for this tuple variation table.
    variation_data_size: u16,
    /// A packed field. The high 4 bits are flags. The low 12 bits are an index into a
    /// shared tuple records array.
    tuple_flags_and_index: u16,
    /// Embedded peak tuple record, if present.
    peak_tuple: Option<Tuple<'a>>,
    /// The start and end tuples for the intermediate region, if present.
    intermediate_region: Option<(Tuple<'a>, Tuple<'a>)>,
    /// The serialized data for this tuple variation.
    data: &'a [u8],
}

/// Glyph variation data.
///
/// (x, y) deltas for numbered points.
pub struct GvarVariationData<'a> {
    point_numbers: Cow<'a, PointNumbers>,
    x_coord_deltas: Vec<i16>,
    y_coord_deltas: Vec<i16>,
}

/// The points a tuple variation supplies deltas for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PointNumbers {
    /// Every point of the glyph, including phantom points.
    All(u32),
    /// An explicit, ordered set of point numbers.
    Specific(Vec<u16>),
}

/// Iterator over the point numbers of a [PointNumbers] value.
pub struct PointNumbersIter<'a> {
    numbers: &'a PointNumbers,
    index: usize,
}

impl OwnedTuple {
    /// Construct a tuple from normalized values, clamping each to [-1, 1].
    pub fn new(values: &[F2Dot14]) -> OwnedTuple {
        OwnedTuple(values.iter().map(|value| value.clamp_normalized()).collect())
    }

    /// Construct a tuple from normalized `f32` values, rounding each to the nearest 2.14 value.
    pub fn from_f32(values: &[f32]) -> OwnedTuple {
        OwnedTuple(
            values
                .iter()
                .map(|&value| F2Dot14::from(value).clamp_normalized())
                .collect(),
        )
    }

    /// Returns `true` if every coordinate is at the default location (zero).
    pub fn is_default(&self) -> bool {
        self.0.iter().all(|&coord| coord == F2Dot14::ZERO)
    }
}

impl std::ops::Deref for OwnedTuple {
    type Target = [F2Dot14];

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

/// Calculate the scalar for a single axis of a region.
///
/// The result is in the range [0, 1]. Degenerate regions contribute 0 rather than failing.
///
/// <https://learn.microsoft.com/en-us/typography/opentype/spec/otvaroverview#algorithm-for-interpolation-of-instance-values>
pub fn axis_scalar(coord: F2Dot14, start: F2Dot14, peak: F2Dot14, end: F2Dot14) -> f32 {
    if peak == F2Dot14::ZERO {
        // If the peak is zero for some axis, then ignore the axis.
        1.
    } else if coord == peak {
        1.
    } else if coord < start || coord > end {
        // If the instance coordinate is out of range for some axis, then the
        // region and its associated deltas are not applicable.
        0.
    } else if start > peak || peak > end {
        0.
    } else if coord < peak {
        if peak == start {
            0.
        } else {
            (f32::from(coord) - f32::from(start)) / (f32::from(peak) - f32::from(start))
        }
    } else {
        // coord > peak
        if peak == end {
            0.
        } else {
            (f32::from(end) - f32::from(coord)) / (f32::from(end) - f32::from(peak))
        }
    }
}

/// Calculate the scalar for a tuple variation's region.
///
/// When no intermediate region is supplied the region is implied by the peak: for each axis
/// `start = min(peak, 0)` and `end = max(peak, 0)`.
pub fn tuple_scalar(
    peak: impl Iterator<Item = F2Dot14>,
    intermediate: Option<(&Tuple<'_>, &Tuple<'_>)>,
    instance: &[F2Dot14],
) -> f32 {
    let mut scalar = 1.;
    for (axis, (peak, &coord)) in peak.zip(instance.iter()).enumerate() {
        let (start, end) = match intermediate {
            Some((start, end)) => match (start.get_item(axis), end.get_item(axis)) {
                (Some(start), Some(end)) => (start, end),
                _ => return 0.,
            },
            None => (peak.min(F2Dot14::ZERO), peak.max(F2Dot14::ZERO)),
        };
        let axis_scalar = axis_scalar(coord, start, peak, end);
        if axis_scalar == 0. {
            return 0.;
        }
        scalar *= axis_scalar;
    }
    scalar
}

impl<'a> VariationRegion<'a> {
    /// Calculate the scalar for this region at `instance`.
    ///
    /// The region scalar is the product of the per-axis scalars.
    pub fn scalar(&self, instance: impl Iterator<Item = F2Dot14>) -> f32 {
        let mut scalar = 1.;
        for (region, coord) in self.region_axes.iter().zip(instance) {
            let RegionAxisCoordinates {
                start_coord,
                peak_coord,
                end_coord,
            } = region;
            let axis_scalar = axis_scalar(coord, start_coord, peak_coord, end_coord);
            if axis_scalar == 0. {
                return 0.;
            }
            scalar *= axis_scalar;
        }
        scalar
    }

    /// Iterate over the axis coordinates of this region.
    pub fn region_axes(&self) -> impl Iterator<Item = RegionAxisCoordinates> + 'a {
        self.region_axes.iter()
    }
}

impl<'a> VariationRegionList<'a> {
    /// The number of axes in each region.
    pub fn axis_count(&self) -> u16 {
        self.axis_count
    }

    /// The number of regions in the list.
    pub fn region_count(&self) -> u16 {
        self.region_count
    }

    /// Retrieve the region at `index`.
    pub fn region(&self, index: u16) -> Result<VariationRegion<'a>, ParseError> {
        if index >= self.region_count {
            return Err(ParseError::BadIndex);
        }
        let axis_count = usize::from(self.axis_count);
        let size = axis_count * <RegionAxisCoordinates as ReadUnchecked>::SIZE;
        let region_axes = self
            .variation_regions_scope
            .offset_length(usize::from(index) * size, size)?
            .ctxt()
            .read_array(axis_count)?;
        Ok(VariationRegion { region_axes })
    }
}

impl ReadBinary for VariationRegionList<'_> {
    type HostType<'a> = VariationRegionList<'a>;

    fn read<'a>(ctxt: &mut ReadCtxt<'a>) -> Result<Self::HostType<'a>, ParseError> {
        let axis_count = ctxt.read_u16be()?;
        let region_count = ctxt.read_u16be()?;
        let variation_regions_scope = ctxt.scope();
        let variation_regions =
            ctxt.read_array(usize::from(region_count) * usize::from(axis_count))?;
        Ok(VariationRegionList {
            axis_count,
            region_count,
            variation_regions,
            variation_regions_scope,
        })
    }
}

impl<'a> ItemVariationStore<'a> {
    /// Calculate the adjustment for the item identified by `entry` at `instance`.
    ///
    /// Returns `ParseError::BadIndex` if the outer or inner index is out of range. Callers that
    /// query metrics treat that as "no adjustment".
    pub fn adjustment(
        &self,
        entry: DeltaSetIndexMapEntry,
        instance: &[F2Dot14],
    ) -> Result<f32, ParseError> {
        let item_variation_data = self
            .item_variation_data
            .get(usize::from(entry.outer_index))
            .ok_or(ParseError::BadIndex)?;
        let delta_set = item_variation_data
            .delta_set(entry.inner_index)
            .ok_or(ParseError::BadIndex)?;

        let mut adjustment = 0.;
        for (delta, region_index) in delta_set.iter().zip(item_variation_data.region_indexes.iter())
        {
            if delta == 0 {
                continue;
            }
            let region = self.variation_region_list.region(region_index)?;
            let scalar = region.scalar(instance.iter().copied());
            if scalar != 0. {
                adjustment += scalar * delta as f32;
            }
        }
        Ok(adjustment)
    }

    /// Like [adjustment](Self::adjustment) but degrades to zero when the lookup fails.
    pub fn adjustment_or_zero(&self, entry: DeltaSetIndexMapEntry, instance: &[F2Dot14]) -> f32 {
        match self.adjustment(entry, instance) {
            Ok(adjustment) => adjustment,
            Err(err) => {
                debug!(
                    "no adjustment for delta-set ({}, {}): {}",
                    entry.outer_index, entry.inner_index, err
                );
                0.
            }
        }
    }

    /// Iterate over the regions referenced by the item variation data at `index`.
    pub fn regions(
        &self,
        index: u16,
    ) -> Result<impl Iterator<Item = Result<VariationRegion<'a>, ParseError>> + '_, ParseError>
    {
        let item_variation_data = self
            .item_variation_data
            .get(usize::from(index))
            .ok_or(ParseError::BadIndex)?;
        Ok(item_variation_data
            .region_indexes
            .iter()
            .map(move |region_index| self.variation_region_list.region(region_index)))
    }

    /// The number of regions referenced by the item variation data at `index`.
    pub fn region_index_count(&self, index: u16) -> Result<usize, ParseError> {
        self.item_variation_data
            .get(usize::from(index))
            .map(|data| data.region_indexes.len())
            .ok_or(ParseError::BadIndex)
    }

    /// The number of item variation data subtables.
    pub fn item_variation_data_count(&self) -> u16 {
        // NOTE(cast): Safe as item_variation_data was constructed from a u16 count.
        self.item_variation_data.len() as u16
    }

    /// Retrieve the item variation data subtable at `index`.
    pub fn item_variation_data(&self, index: u16) -> Option<&ItemVariationData<'a>> {
        self.item_variation_data.get(usize::from(index))
    }

    /// The variation region list.
    pub fn variation_region_list(&self) -> &VariationRegionList<'a> {
        &self.variation_region_list
    }
}

impl ReadBinary for ItemVariationStore<'_> {
    type HostType<'a> = ItemVariationStore<'a>;

    fn read<'a>(ctxt: &mut ReadCtxt<'a>) -> Result<Self::HostType<'a>, ParseError> {
        let scope = ctxt.scope();
        let format = ctxt.read_u16be()?;
        ctxt.check_version(format == 1)?;
        let variation_region_list_offset = ctxt.read_u32be()?;
        let item_variation_data_count = ctxt.read_u16be()?;
        let item_variation_data_offsets =
            ctxt.read_array::<U32Be>(usize::from(item_variation_data_count))?;
        let variation_region_list = scope
            .offset(usize::safe_from(variation_region_list_offset))
            .read::<VariationRegionList<'_>>()?;
        let item_variation_data = item_variation_data_offsets
            .iter()
            .map(|offset| {
                scope
                    .offset(usize::safe_from(offset))
                    .read::<ItemVariationData<'_>>()
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(ItemVariationStore {
            format,
            variation_region_list,
            item_variation_data,
        })
    }
}

// Written in a canonical layout: header, region list, then each item variation data subtable in
// order.
impl WriteBinary<&Self> for ItemVariationStore<'_> {
    type Output = ();

    fn write<C: WriteContext>(ctxt: &mut C, store: &Self) -> Result<(), WriteError> {
        let start = ctxt.bytes_written();
        U16Be::write(ctxt, store.format)?;
        let region_list_offset = ctxt.placeholder::<U32Be, _>()?;
        let count = u16::try_from(store.item_variation_data.len())?;
        U16Be::write(ctxt, count)?;
        let data_offsets = ctxt.placeholder_array::<U32Be, _>(usize::from(count))?;

        ctxt.write_placeholder(
            region_list_offset,
            u32::try_from(ctxt.bytes_written() - start)?,
        )?;
        let regions = &store.variation_region_list;
        U16Be::write(ctxt, regions.axis_count)?;
        U16Be::write(ctxt, regions.region_count)?;
        ctxt.write_array(&regions.variation_regions)?;

        for (placeholder, data) in data_offsets.into_iter().zip(&store.item_variation_data) {
            ctxt.write_placeholder(placeholder, u32::try_from(ctxt.bytes_written() - start)?)?;
            U16Be::write(ctxt, data.item_count)?;
            U16Be::write(ctxt, data.word_delta_count)?;
            U16Be::write(ctxt, u16::try_from(data.region_indexes.len())?)?;
            ctxt.write_array(&data.region_indexes)?;
            ctxt.write_bytes(data.delta_sets)?;
        }

        Ok(())
    }
}

impl<'a> ItemVariationData<'a> {
    /// The number of delta-set rows.
    pub fn item_count(&self) -> u16 {
        self.item_count
    }

    /// Iterate over the indices of the regions referenced by this subtable.
    pub fn region_indexes(&self) -> impl Iterator<Item = u16> + 'a {
        self.region_indexes.iter()
    }

    /// Retrieve the delta-set row at `index`.
    pub fn delta_set(&self, index: u16) -> Option<DeltaSet<'a>> {
        if index >= self.item_count {
            return None;
        }
        let row_length = self.row_length();
        let offset = usize::from(index) * row_length;
        let data = self.delta_sets.get(offset..offset + row_length)?;
        Some(DeltaSet {
            data,
            word_delta_count: self.word_delta_count,
            region_index_count: self.region_index_count(),
        })
    }

    fn region_index_count(&self) -> u16 {
        // NOTE(cast): Safe as region_indexes was constructed from a u16 count.
        self.region_indexes.len() as u16
    }

    fn row_length(&self) -> usize {
        row_length(self.word_delta_count, self.region_index_count())
    }
}

fn row_length(word_delta_count: u16, region_index_count: u16) -> usize {
    let long_words = word_delta_count & LONG_WORDS == LONG_WORDS;
    let word_count = usize::from(word_delta_count & WORD_DELTA_COUNT_MASK);
    let region_index_count = usize::from(region_index_count);
    let short_count = region_index_count.saturating_sub(word_count);
    let word_count = word_count.min(region_index_count);
    if long_words {
        word_count * 4 + short_count * 2
    } else {
        word_count * 2 + short_count
    }
}

impl ReadBinary for ItemVariationData<'_> {
    type HostType<'a> = ItemVariationData<'a>;

    fn read<'a>(ctxt: &mut ReadCtxt<'a>) -> Result<Self::HostType<'a>, ParseError> {
        let item_count = ctxt.read_u16be()?;
        let word_delta_count = ctxt.read_u16be()?;
        let region_index_count = ctxt.read_u16be()?;
        ctxt.check(word_delta_count & WORD_DELTA_COUNT_MASK <= region_index_count)?;
        let region_indexes = ctxt.read_array::<U16Be>(usize::from(region_index_count))?;
        let delta_sets = ctxt.read_slice(
            usize::from(item_count) * row_length(word_delta_count, region_index_count),
        )?;

        Ok(ItemVariationData {
            item_count,
            word_delta_count,
            region_indexes,
            delta_sets,
        })
    }
}

impl<'a> DeltaSet<'a> {
    /// Iterate over the deltas in this row, one per referenced region.
    pub fn iter(&self) -> impl Iterator<Item = i32> + 'a {
        let long_words = self.word_delta_count & LONG_WORDS == LONG_WORDS;
        let word_count = usize::from(self.word_delta_count & WORD_DELTA_COUNT_MASK);
        let (word_size, short_size) = if long_words { (4, 2) } else { (2, 1) };
        let count = usize::from(self.region_index_count);
        let mut ctxt = ReadScope::new(self.data).ctxt();
        (0..count).map_while(move |index| {
            let size = if index < word_count {
                word_size
            } else {
                short_size
            };
            let delta = match size {
                4 => ctxt.read::<I32Be>().ok()?,
                2 => i32::from(ctxt.read::<I16Be>().ok()?),
                _ => i32::from(ctxt.read::<I8>().ok()?),
            };
            Some(delta)
        })
    }
}

impl ReadFrom for RegionAxisCoordinates {
    type ReadType = (F2Dot14, F2Dot14, F2Dot14);

    fn read_from((start_coord, peak_coord, end_coord): (F2Dot14, F2Dot14, F2Dot14)) -> Self {
        RegionAxisCoordinates {
            start_coord,
            peak_coord,
            end_coord,
        }
    }
}

impl WriteBinary for RegionAxisCoordinates {
    type Output = ();

    fn write<C: WriteContext>(ctxt: &mut C, coords: Self) -> Result<(), WriteError> {
        F2Dot14::write(ctxt, coords.start_coord)?;
        F2Dot14::write(ctxt, coords.peak_coord)?;
        F2Dot14::write(ctxt, coords.end_coord)
    }
}

impl DeltaSetIndexMap<'_> {
    /// Returns the delta-set index for the supplied item (usually a glyph id).
    ///
    /// Items beyond the end of the map use the last entry of the map.
    pub fn entry(&self, index: u32) -> Result<DeltaSetIndexMapEntry, ParseError> {
        let last = self.map_count.checked_sub(1).ok_or(ParseError::BadIndex)?;
        let index = index.min(last);

        let entry_size = usize::from(self.entry_size());
        let offset = usize::safe_from(index) * entry_size;
        let bytes = self
            .map_data
            .get(offset..offset + entry_size)
            .ok_or(ParseError::BadEof)?;
        let entry = bytes
            .iter()
            .fold(0u32, |entry, &byte| (entry << 8) | u32::from(byte));

        let inner_bit_count = u32::from(self.entry_format & INNER_INDEX_BIT_COUNT_MASK) + 1;
        // NOTE(cast): Safe as inner_bit_count is at most 16 and entry is at most 32 bits.
        let outer_index = (entry >> inner_bit_count) as u16;
        let inner_index = (entry & ((1 << inner_bit_count) - 1)) as u16;

        Ok(DeltaSetIndexMapEntry {
            outer_index,
            inner_index,
        })
    }

    /// The number of entries in the map.
    pub fn len(&self) -> u32 {
        self.map_count
    }

    /// Returns `true` if the map has no entries.
    pub fn is_empty(&self) -> bool {
        self.map_count == 0
    }

    /// The size in bytes of each entry.
    fn entry_size(&self) -> u8 {
        ((self.entry_format & MAP_ENTRY_SIZE_MASK) >> 4) + 1
    }
}

impl ReadBinary for DeltaSetIndexMap<'_> {
    type HostType<'a> = DeltaSetIndexMap<'a>;

    fn read<'a>(ctxt: &mut ReadCtxt<'a>) -> Result<Self::HostType<'a>, ParseError> {
        let format = ctxt.read_u8()?;
        let entry_format = ctxt.read_u8()?;
        let map_count = match format {
            0 => u32::from(ctxt.read_u16be()?),
            1 => ctxt.read_u32be()?,
            _ => return Err(ParseError::BadVersion),
        };
        let entry_size = usize::from(((entry_format & MAP_ENTRY_SIZE_MASK) >> 4) + 1);
        let map_data = ctxt.read_slice(usize::safe_from(map_count) * entry_size)?;

        Ok(DeltaSetIndexMap {
            entry_format,
            map_count,
            map_data,
        })
    }
}

impl<'a> TupleVariationStore<'a> {
    /// Iterate over the tuple variation headers.
    pub fn headers(&self) -> impl Iterator<Item = &TupleVariationHeader<'a>> + '_ {
        self.tuple_variation_headers.iter()
    }

    /// The number of tuple variation headers.
    pub fn len(&self) -> usize {
        self.tuple_variation_headers.len()
    }

    /// Returns `true` if there are no tuple variations.
    pub fn is_empty(&self) -> bool {
        self.tuple_variation_headers.is_empty()
    }

    /// Retrieve the variation data for the variation tuple at the given index.
    pub fn variation_data(&self, index: u16) -> Result<GvarVariationData<'_>, ParseError> {
        let header = self
            .tuple_variation_headers
            .get(usize::from(index))
            .ok_or(ParseError::BadIndex)?;
        header.variation_data(self.num_points, self.shared_point_numbers.as_ref())
    }

    /// The number of points the deltas of this store apply to, including phantom points.
    pub fn num_points(&self) -> u32 {
        self.num_points
    }

    pub(crate) fn shared_point_numbers(&self) -> Option<&PointNumbers> {
        self.shared_point_numbers.as_ref()
    }
}

impl ReadBinaryDep for TupleVariationStore<'_> {
    type Args<'a> = (u16, u32);
    type HostType<'a> = TupleVariationStore<'a>;

    fn read_dep<'a>(
        ctxt: &mut ReadCtxt<'a>,
        (axis_count, num_points): (u16, u32),
    ) -> Result<Self::HostType<'a>, ParseError> {
        let axis_count = usize::from(axis_count);

        let scope = ctxt.scope();
        let tuple_variation_flags_and_count = ctxt.read_u16be()?;
        let tuple_variation_count = usize::from(tuple_variation_flags_and_count & COUNT_MASK);
        let data_offset = ctxt.read_u16be()?;

        // Now read the TupleVariationHeaders
        let mut tuple_variation_headers = (0..tuple_variation_count)
            .map(|_| ctxt.read_dep::<TupleVariationHeader<'_>>(axis_count))
            .collect::<Result<Vec<_>, _>>()?;

        // Read the serialized data for each tuple variation header
        let mut data_ctxt = scope.offset(usize::from(data_offset)).ctxt();

        // Read shared point numbers if the flag indicates they are present
        let shared_point_numbers = ((tuple_variation_flags_and_count & SHARED_POINT_NUMBERS)
            == SHARED_POINT_NUMBERS)
            .then(|| read_packed_point_numbers(&mut data_ctxt, num_points))
            .transpose()?;

        // Populate the data slices on the headers
        for header in tuple_variation_headers.iter_mut() {
            header.data = data_ctxt.read_slice(header.variation_data_size.into())?;
        }

        Ok(TupleVariationStore {
            num_points,
            shared_point_numbers,
            tuple_variation_headers,
        })
    }
}

impl PointNumbers {
    /// Returns the number of point numbers contained by this value
    pub fn len(&self) -> usize {
        match self {
            PointNumbers::All(n) => usize::safe_from(*n),
            PointNumbers::Specific(vec) => vec.len(),
        }
    }

    /// Returns `true` if there are no point numbers.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Iterate over the point numbers contained by this value.
    pub fn iter(&self) -> PointNumbersIter<'_> {
        PointNumbersIter {
            numbers: self,
            index: 0,
        }
    }
}

impl Iterator for PointNumbersIter<'_> {
    type Item = u32;

    fn next(&mut self) -> Option<Self::Item> {
        if self.index >= self.numbers.len() {
            return None;
        }

        let index = self.index;
        self.index += 1;
        match self.numbers {
            PointNumbers::All(_n) => u32::try_from(index).ok(),
            PointNumbers::Specific(numbers) => numbers.get(index).copied().map(u32::from),
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.numbers.len() - self.index;
        (remaining, Some(remaining))
    }
}

/// Read packed point numbers for a glyph with `num_points` points.
///
/// `num_points` is expected to already have the four "phantom points" added to it.
///
/// Point numbers are stored as differences from the previous point number, across all runs.
///
/// <https://learn.microsoft.com/en-us/typography/opentype/spec/otvarcommonformats#packed-point-numbers>
fn read_packed_point_numbers(
    ctxt: &mut ReadCtxt<'_>,
    num_points: u32,
) -> Result<PointNumbers, ParseError> {
    let count = read_count(ctxt)?;
    // If the first byte is 0, then a second count byte is not used. This value has a special
    // meaning: the tuple variation data provides deltas for all glyph points (including the
    // “phantom” points).
    if count == 0 {
        return Ok(PointNumbers::All(num_points));
    }

    let mut num_read = 0;
    let mut point_numbers = Vec::with_capacity(usize::from(count));
    let mut prev = 0u16;
    while num_read < count {
        let control_byte = ctxt.read_u8()?;
        let point_run_count = u16::from(control_byte & POINT_RUN_COUNT_MASK) + 1;
        let point_run_count = point_run_count.min(count - num_read);
        if (control_byte & POINTS_ARE_WORDS) == POINTS_ARE_WORDS {
            // Points are words (2 bytes)
            let array = ctxt.read_array::<U16Be>(point_run_count.into())?;
            point_numbers.extend(array.iter().map(|diff| {
                prev = prev.wrapping_add(diff);
                prev
            }));
        } else {
            // Points are single bytes
            let array = ctxt.read_array::<U8>(point_run_count.into())?;
            point_numbers.extend(array.iter().map(|diff| {
                prev = prev.wrapping_add(u16::from(diff));
                prev
            }));
        }
        num_read += point_run_count;
    }
    Ok(PointNumbers::Specific(point_numbers))
}

// The count may be stored in one or two bytes:
//
// * If the first byte is 0, then a second count byte is not used. This value has a special
//   meaning: the tuple variation data provides deltas for all glyph points (including the “phantom”
//   points).
// * If the first byte is non-zero and the high bit is clear (value is 1 to 127), then a second
//   count byte is not used. The point count is equal to the value of the first byte.
// * If the high bit of the first byte is set, then a second byte is used. The count is read from
//   interpreting the two bytes as a big-endian uint16 value with the high-order bit masked out.
fn read_count(ctxt: &mut ReadCtxt<'_>) -> Result<u16, ParseError> {
    let count1 = u16::from(ctxt.read_u8()?);
    let count = match count1 {
        0 => 0,
        1..=127 => count1,
        128.. => {
            let count2 = ctxt.read_u8()?;
            ((count1 & 0x7F) << 8) | u16::from(count2)
        }
    };
    Ok(count)
}

/// Read `num_deltas` packed deltas.
///
/// <https://learn.microsoft.com/en-us/typography/opentype/spec/otvarcommonformats#packed-deltas>
fn read_packed_deltas(ctxt: &mut ReadCtxt<'_>, num_deltas: u32) -> Result<Vec<i16>, ParseError> {
    let num_deltas = usize::safe_from(num_deltas);
    let mut deltas = Vec::with_capacity(num_deltas);

    while deltas.len() < num_deltas {
        let control_byte = ctxt.read_u8()?;
        let count = usize::from(control_byte & DELTA_RUN_COUNT_MASK) + 1; // value is stored - 1

        if (control_byte & DELTAS_ARE_ZERO) == DELTAS_ARE_ZERO {
            deltas.extend(iter::repeat(0).take(count));
        } else if (control_byte & DELTAS_ARE_WORDS) == DELTAS_ARE_WORDS {
            // Deltas are words (2 bytes)
            let array = ctxt.read_array::<I16Be>(count)?;
            deltas.extend(array.iter())
        } else {
            // Deltas are single bytes
            let array = ctxt.read_array::<I8>(count)?;
            deltas.extend(array.iter().map(i16::from));
        };
    }
    deltas.truncate(num_deltas);

    Ok(deltas)
}

impl GvarVariationData<'_> {
    /// Iterates over the point numbers and (x, y) deltas.
    pub fn iter(&self) -> impl Iterator<Item = (u32, (i16, i16))> + '_ {
        let deltas = self
            .x_coord_deltas
            .iter()
            .copied()
            .zip(self.y_coord_deltas.iter().copied());
        self.point_numbers.iter().zip(deltas)
    }

    /// The point numbers the deltas apply to.
    pub fn point_numbers(&self) -> &PointNumbers {
        &self.point_numbers
    }
}

impl<'data> TupleVariationHeader<'data> {
    /// Read the variation data for `gvar`.
    ///
    /// `num_points` is the number of points in the glyph this variation relates to.
    pub(crate) fn variation_data<'a>(
        &'a self,
        num_points: u32,
        shared_point_numbers: Option<&'a PointNumbers>,
    ) -> Result<GvarVariationData<'a>, ParseError> {
        let mut ctxt = ReadScope::new(self.data).ctxt();

        let point_numbers = self.read_point_numbers(&mut ctxt, num_points, shared_point_numbers)?;
        let num_deltas = u32::try_from(point_numbers.len())?;

        // The deltas are stored X, followed by Y but the delta runs can span the boundary of the
        // two so they need to be read as a single span of packed deltas and then split.
        let mut x_coord_deltas = read_packed_deltas(&mut ctxt, 2 * num_deltas)?;
        let y_coord_deltas = x_coord_deltas.split_off(usize::safe_from(num_deltas));

        Ok(GvarVariationData {
            point_numbers,
            x_coord_deltas,
            y_coord_deltas,
        })
    }

    /// Returns the index of the shared tuple that this header relates to.
    ///
    /// The value returned from this method will be `None` if the header has an embedded
    /// peak tuple.
    pub fn tuple_index(&self) -> Option<u16> {
        self.peak_tuple
            .is_none()
            .then_some(self.tuple_flags_and_index & TUPLE_INDEX_MASK)
    }

    /// Returns the embedded peak tuple if present.
    pub fn peak_tuple(&self) -> Option<&Tuple<'data>> {
        self.peak_tuple.as_ref()
    }

    /// Returns the start and end tuples of the intermediate region if present.
    pub fn intermediate_region(&self) -> Option<(&Tuple<'data>, &Tuple<'data>)> {
        self.intermediate_region
            .as_ref()
            .map(|(start, end)| (start, end))
    }

    /// Calculate the scalar of this tuple variation at `instance`.
    ///
    /// `peak` is the embedded peak tuple or the shared tuple referenced by
    /// [tuple_index](Self::tuple_index).
    pub fn scalar(&self, peak: &Tuple<'data>, instance: &[F2Dot14]) -> f32 {
        tuple_scalar(peak.iter(), self.intermediate_region(), instance)
    }

    /// Read the point numbers for this tuple.
    ///
    /// This method will return either the embedded private point numbers or the shared numbers
    /// if private points are not present.
    fn read_point_numbers<'a>(
        &'a self,
        ctxt: &mut ReadCtxt<'data>,
        num_points: u32,
        shared_point_numbers: Option<&'a PointNumbers>,
    ) -> Result<Cow<'a, PointNumbers>, ParseError> {
        // Read private point numbers if the flag indicates they are present
        let private_point_numbers =
            if (self.tuple_flags_and_index & PRIVATE_POINT_NUMBERS) == PRIVATE_POINT_NUMBERS {
                read_packed_point_numbers(ctxt, num_points).map(Some)?
            } else {
                None
            };

        // Either private or shared point numbers should be present. If both are missing that's
        // invalid.
        private_point_numbers
            .map(Cow::Owned)
            .or_else(|| shared_point_numbers.map(Cow::Borrowed))
            .ok_or(ParseError::MissingValue)
    }
}

impl ReadBinaryDep for TupleVariationHeader<'_> {
    type Args<'a> = usize;
    type HostType<'a> = TupleVariationHeader<'a>;

    fn read_dep<'a>(
        ctxt: &mut ReadCtxt<'a>,
        axis_count: usize,
    ) -> Result<Self::HostType<'a>, ParseError> {
        let variation_data_size = ctxt.read_u16be()?;
        let tuple_flags_and_index = ctxt.read_u16be()?;
        // If this is absent then `tuple_flags_and_index` contains the index to one of the shared
        // tuple records to use instead.
        let peak_tuple = ((tuple_flags_and_index & EMBEDDED_PEAK_TUPLE) == EMBEDDED_PEAK_TUPLE)
            .then(|| ctxt.read_array(axis_count))
            .transpose()?;
        let intermediate_region =
            if (tuple_flags_and_index & INTERMEDIATE_REGION) == INTERMEDIATE_REGION {
                let start = ctxt.read_array(axis_count)?;
                let end = ctxt.read_array(axis_count)?;
                Some((start, end))
            } else {
                None
            };
        Ok(TupleVariationHeader {
            variation_data_size,
            tuple_flags_and_index,
            peak_tuple,
            intermediate_region,
            data: &[], // filled in later
        })
    }
}
