//! `STAT` Style Attributes Table
//!
//! The style attributes table describes design attributes that distinguish font-style variants
//! within a font family. It also provides associations between those attributes and name elements
//! that may be used to present font options within application user interfaces.
//!
//! The table is decoded into an owned model that can be written back out. Tables laid out as
//! header, design axes, then the axis value offsets array followed by the axis value tables
//! round-trip byte for byte.
//!
//! <https://learn.microsoft.com/en-us/typography/opentype/spec/stat>

use std::fmt;

use bitflags::bitflags;

use crate::binary::read::{ReadBinary, ReadBinaryDep, ReadCtxt, ReadFrom};
use crate::binary::write::{WriteBinary, WriteBuffer, WriteContext};
use crate::binary::{U16Be, U32Be};
use crate::error::{ParseError, WriteError};
use crate::size;
use crate::tables::Fixed;
use crate::tag::DisplayTag;
use crate::SafeFrom;

/// Name ID used when a version 1.0 table has no elided fallback name.
const DEFAULT_ELIDED_FALLBACK_NAME_ID: u16 = 2;

/// Size of the fields of an [AxisRecord] that are interpreted.
const AXIS_RECORD_SIZE: usize = size::U32 + 2 * size::U16;

/// `STAT` Style Attributes Table
///
/// <https://learn.microsoft.com/en-us/typography/opentype/spec/stat#style-attributes-header>
#[derive(Debug, Clone, PartialEq)]
pub struct StatTable {
    /// Major version number of the style attributes table.
    pub major_version: u16,
    /// Minor version number of the style attributes table.
    pub minor_version: u16,
    /// The size in bytes of each axis record.
    pub design_axis_size: u16,
    /// The design axes records.
    pub design_axes: Vec<AxisRecord>,
    /// The axis value tables, in the order of the offsets array.
    pub axis_values: Vec<AxisValueTable>,
    /// Name ID used as fallback when projection of names into a particular font model produces a
    /// subfamily name containing only elidable elements.
    ///
    /// Present in version 1.1 and later.
    pub elided_fallback_name_id: Option<u16>,
}

/// Information about a single design axis.
///
/// <https://learn.microsoft.com/en-us/typography/opentype/spec/stat#axis-records>
#[derive(Eq, PartialEq, Clone)]
pub struct AxisRecord {
    /// A tag identifying the axis of design variation.
    pub axis_tag: u32,
    /// The name ID for entries in the `name` table that provide a display string for this axis.
    pub axis_name_id: u16,
    /// A value that applications can use to determine primary sorting of face names, or for
    /// ordering of labels when composing family or face names.
    pub axis_ordering: u16,
    /// Trailing bytes when `design_axis_size` is larger than the defined record.
    extra: Vec<u8>,
}

/// Axis value table.
///
/// <https://learn.microsoft.com/en-us/typography/opentype/spec/stat#axis-value-tables>
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AxisValueTable {
    /// Format 1 axis value table: name associated with a value.
    Format1(AxisValueTableFormat1),
    /// Format 2 axis value table: name associated with a range of values.
    Format2(AxisValueTableFormat2),
    /// Format 3 axis value table: name associated with a value and style-linked mapping.
    Format3(AxisValueTableFormat3),
    /// Format 4 axis value table: name associated with a value for each design axis.
    Format4(AxisValueTableFormat4),
}

/// Format 1 axis value table: name associated with a value.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct AxisValueTableFormat1 {
    /// Zero-base index into the axis record array.
    pub axis_index: u16,
    /// Flags.
    pub flags: AxisValueTableFlags,
    /// The name ID for the display string of this attribute value.
    pub value_name_id: u16,
    /// A numeric value for this attribute value.
    pub value: Fixed,
}

/// Format 2 axis value table: name associated with a range of values.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct AxisValueTableFormat2 {
    /// Zero-base index into the axis record array.
    pub axis_index: u16,
    /// Flags.
    pub flags: AxisValueTableFlags,
    /// The name ID for the display string of this attribute value.
    pub value_name_id: u16,
    /// A nominal numeric value for this attribute value.
    pub nominal_value: Fixed,
    /// The minimum value for a range associated with the specified name ID.
    pub range_min_value: Fixed,
    /// The maximum value for a range associated with the specified name ID.
    pub range_max_value: Fixed,
}

/// Format 3 axis value table: name associated with a value and style-linked mapping.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct AxisValueTableFormat3 {
    /// Zero-base index into the axis record array.
    pub axis_index: u16,
    /// Flags.
    pub flags: AxisValueTableFlags,
    /// The name ID for the display string of this attribute value.
    pub value_name_id: u16,
    /// A numeric value for this attribute value.
    pub value: Fixed,
    /// The numeric value for a style-linked mapping from this value.
    pub linked_value: Fixed,
}

/// Format 4 axis value table: name associated with a value for each design axis.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct AxisValueTableFormat4 {
    /// Flags.
    pub flags: AxisValueTableFlags,
    /// The name ID for the display string of this combination of axis values.
    pub value_name_id: u16,
    /// One value for each contributing axis.
    ///
    /// Axis indices are not checked against the design axis count.
    pub axis_values: Vec<AxisValue>,
}

/// An axis value record from a format 4 axis value table.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct AxisValue {
    /// Zero-base index into the axis record array.
    pub axis_index: u16,
    /// A numeric value for this attribute value.
    pub value: Fixed,
}

bitflags! {
    /// Flags for axis value tables.
    ///
    /// Reserved bits are retained so that they are written back unchanged.
    ///
    /// <https://learn.microsoft.com/en-us/typography/opentype/spec/stat#flags>
    #[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
    pub struct AxisValueTableFlags: u16 {
        /// This axis value table provides axis value information that is applicable to other
        /// fonts within the same font family.
        const OLDER_SIBLING_FONT_ATTRIBUTE = 0x0001;
        /// The axis value represents the “normal” value for the axis and may be omitted when
        /// composing name strings.
        const ELIDABLE_AXIS_VALUE_NAME = 0x0002;
    }
}

/// The array of offsets to axis value tables.
///
/// The offsets are relative to the start of the array, so it is read and written as a unit
/// with its own base, independent of the enclosing table.
struct AxisValueArray;

impl StatTable {
    /// The name ID to use when all elements of a subfamily name are elidable.
    pub fn fallback_name_id(&self) -> u16 {
        self.elided_fallback_name_id
            .unwrap_or(DEFAULT_ELIDED_FALLBACK_NAME_ID)
    }

    /// Find the design axis with the supplied tag.
    pub fn design_axis_index(&self, axis_tag: u32) -> Option<u16> {
        self.design_axes
            .iter()
            .position(|axis| axis.axis_tag == axis_tag)
            .and_then(|index| u16::try_from(index).ok())
    }

    /// Find the name ID that describes `value` on the axis at `axis_index`.
    ///
    /// Format 1 and 3 tables match exactly, format 2 tables match when the value lies in their
    /// range. Format 4 tables are not consulted, see
    /// [combination_name_id](Self::combination_name_id).
    pub fn axis_value_name_id(&self, axis_index: u16, value: Fixed) -> Option<u16> {
        self.axis_values.iter().find_map(|table| match table {
            AxisValueTable::Format1(t) if t.axis_index == axis_index && t.value == value => {
                Some(t.value_name_id)
            }
            AxisValueTable::Format2(t)
                if t.axis_index == axis_index
                    && (t.range_min_value..=t.range_max_value).contains(&value) =>
            {
                Some(t.value_name_id)
            }
            AxisValueTable::Format3(t) if t.axis_index == axis_index && t.value == value => {
                Some(t.value_name_id)
            }
            _ => None,
        })
    }

    /// Find the name ID of a format 4 table whose axis values are all present in `values`.
    ///
    /// `values` are (axis index, value) pairs.
    pub fn combination_name_id(&self, values: &[(u16, Fixed)]) -> Option<u16> {
        self.axis_values.iter().find_map(|table| match table {
            AxisValueTable::Format4(t)
                if !t.axis_values.is_empty()
                    && t.axis_values.iter().all(|axis_value| {
                        values.contains(&(axis_value.axis_index, axis_value.value))
                    }) =>
            {
                Some(t.value_name_id)
            }
            _ => None,
        })
    }

    fn header_size(&self) -> usize {
        let size = 4 * size::U16 + size::U32 + size::U16 + size::U32;
        if self.minor_version > 0 {
            size + size::U16
        } else {
            size
        }
    }
}

impl ReadBinary for StatTable {
    type HostType<'a> = StatTable;

    fn read<'a>(ctxt: &mut ReadCtxt<'a>) -> Result<StatTable, ParseError> {
        let scope = ctxt.scope();
        let major_version = ctxt.read_u16be()?;
        ctxt.check_version(major_version == 1)?;
        let minor_version = ctxt.read_u16be()?;
        let design_axis_size = ctxt.read_u16be()?;
        let design_axis_count = ctxt.read_u16be()?;
        let design_axes_offset = ctxt.read_u32be()?;
        let design_axes = if design_axis_count > 0 {
            ctxt.check(usize::from(design_axis_size) >= AXIS_RECORD_SIZE)?;
            let mut axes_ctxt = scope.offset(usize::safe_from(design_axes_offset)).ctxt();
            (0..design_axis_count)
                .map(|_| {
                    axes_ctxt
                        .read_scope(usize::from(design_axis_size))
                        .map_err(ParseError::from)
                        .and_then(|record| record.read::<AxisRecord>())
                })
                .collect::<Result<Vec<_>, _>>()?
        } else {
            Vec::new()
        };

        let axis_value_count = ctxt.read_u16be()?;
        let offset_to_axis_value_offsets = ctxt.read_u32be()?;
        let axis_values = if axis_value_count > 0 {
            scope
                .offset(usize::safe_from(offset_to_axis_value_offsets))
                .read_dep::<AxisValueArray>(axis_value_count)?
        } else {
            Vec::new()
        };
        let elided_fallback_name_id = (minor_version > 0).then(|| ctxt.read_u16be()).transpose()?;

        Ok(StatTable {
            major_version,
            minor_version,
            design_axis_size,
            design_axes,
            axis_values,
            elided_fallback_name_id,
        })
    }
}

impl WriteBinary<&Self> for StatTable {
    type Output = ();

    fn write<C: WriteContext>(ctxt: &mut C, table: &StatTable) -> Result<(), WriteError> {
        let header_size = table.header_size();
        let design_axes_size = table.design_axes.len() * usize::from(table.design_axis_size);
        let has_elided_fallback = table.minor_version > 0;
        if has_elided_fallback != table.elided_fallback_name_id.is_some() {
            return Err(WriteError::BadValue);
        }

        // The axis value array is self-contained: encode it first then point at it.
        let mut axis_values = WriteBuffer::new();
        if !table.axis_values.is_empty() {
            AxisValueArray::write(&mut axis_values, &table.axis_values)?;
        }

        U16Be::write(ctxt, table.major_version)?;
        U16Be::write(ctxt, table.minor_version)?;
        U16Be::write(ctxt, table.design_axis_size)?;
        U16Be::write(ctxt, u16::try_from(table.design_axes.len())?)?;
        U32Be::write(ctxt, u32::try_from(header_size)?)?;
        U16Be::write(ctxt, u16::try_from(table.axis_values.len())?)?;
        if table.axis_values.is_empty() {
            U32Be::write(ctxt, 0u32)?;
        } else {
            U32Be::write(ctxt, u32::try_from(header_size + design_axes_size)?)?;
        }
        if let Some(name_id) = table.elided_fallback_name_id {
            U16Be::write(ctxt, name_id)?;
        }

        for axis in &table.design_axes {
            if AXIS_RECORD_SIZE + axis.extra.len() != usize::from(table.design_axis_size) {
                return Err(WriteError::BadValue);
            }
            AxisRecord::write(ctxt, axis)?;
        }
        ctxt.write_bytes(axis_values.bytes())
    }
}

impl AxisRecord {
    /// Construct a new axis record of the minimum size.
    pub fn new(axis_tag: u32, axis_name_id: u16, axis_ordering: u16) -> AxisRecord {
        AxisRecord {
            axis_tag,
            axis_name_id,
            axis_ordering,
            extra: Vec::new(),
        }
    }
}

impl ReadBinary for AxisRecord {
    type HostType<'a> = AxisRecord;

    fn read<'a>(ctxt: &mut ReadCtxt<'a>) -> Result<AxisRecord, ParseError> {
        let axis_tag = ctxt.read_u32be()?;
        let axis_name_id = ctxt.read_u16be()?;
        let axis_ordering = ctxt.read_u16be()?;
        let extra = ctxt.scope().data().to_vec();

        Ok(AxisRecord {
            axis_tag,
            axis_name_id,
            axis_ordering,
            extra,
        })
    }
}

impl WriteBinary<&Self> for AxisRecord {
    type Output = ();

    fn write<C: WriteContext>(ctxt: &mut C, record: &AxisRecord) -> Result<(), WriteError> {
        U32Be::write(ctxt, record.axis_tag)?;
        U16Be::write(ctxt, record.axis_name_id)?;
        U16Be::write(ctxt, record.axis_ordering)?;
        ctxt.write_bytes(&record.extra)
    }
}

impl fmt::Debug for AxisRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let tag = format!("{:?} ({})", self.axis_tag, DisplayTag(self.axis_tag));
        f.debug_struct("AxisRecord")
            .field("axis_tag", &tag)
            .field("axis_name_id", &self.axis_name_id)
            .field("axis_ordering", &self.axis_ordering)
            .field("extra", &self.extra)
            .finish()
    }
}

impl ReadBinaryDep for AxisValueArray {
    type Args<'a> = u16;
    type HostType<'a> = Vec<AxisValueTable>;

    fn read_dep<'a>(
        ctxt: &mut ReadCtxt<'a>,
        axis_value_count: u16,
    ) -> Result<Vec<AxisValueTable>, ParseError> {
        let scope = ctxt.scope();
        let offsets = ctxt.read_array::<U16Be>(usize::from(axis_value_count))?;
        offsets
            .iter()
            .map(|offset| scope.offset(usize::from(offset)).read::<AxisValueTable>())
            .collect()
    }
}

impl WriteBinary<&[AxisValueTable]> for AxisValueArray {
    type Output = ();

    fn write<C: WriteContext>(ctxt: &mut C, tables: &[AxisValueTable]) -> Result<(), WriteError> {
        let start = ctxt.bytes_written();
        let offsets = ctxt.placeholder_array::<U16Be, _>(tables.len())?;
        for (placeholder, table) in offsets.into_iter().zip(tables) {
            ctxt.write_placeholder(placeholder, u16::try_from(ctxt.bytes_written() - start)?)?;
            AxisValueTable::write(ctxt, table)?;
        }
        Ok(())
    }
}

impl AxisValueTable {
    /// The format number of this axis value table.
    pub fn format(&self) -> u16 {
        match self {
            AxisValueTable::Format1(_) => 1,
            AxisValueTable::Format2(_) => 2,
            AxisValueTable::Format3(_) => 3,
            AxisValueTable::Format4(_) => 4,
        }
    }

    /// Retrieve the flags for this axis value table.
    pub fn flags(&self) -> AxisValueTableFlags {
        match self {
            AxisValueTable::Format1(AxisValueTableFormat1 { flags, .. })
            | AxisValueTable::Format2(AxisValueTableFormat2 { flags, .. })
            | AxisValueTable::Format3(AxisValueTableFormat3 { flags, .. })
            | AxisValueTable::Format4(AxisValueTableFormat4 { flags, .. }) => *flags,
        }
    }

    /// Retrieve the name id in the `name` table for this value.
    pub fn value_name_id(&self) -> u16 {
        match self {
            AxisValueTable::Format1(AxisValueTableFormat1 { value_name_id, .. })
            | AxisValueTable::Format2(AxisValueTableFormat2 { value_name_id, .. })
            | AxisValueTable::Format3(AxisValueTableFormat3 { value_name_id, .. })
            | AxisValueTable::Format4(AxisValueTableFormat4 { value_name_id, .. }) => {
                *value_name_id
            }
        }
    }
}

impl ReadBinary for AxisValueTable {
    type HostType<'a> = AxisValueTable;

    fn read<'a>(ctxt: &mut ReadCtxt<'a>) -> Result<AxisValueTable, ParseError> {
        let format = ctxt.read_u16be()?;
        match format {
            1 => {
                let axis_index = ctxt.read_u16be()?;
                let flags = ctxt.read::<AxisValueTableFlags>()?;
                let value_name_id = ctxt.read_u16be()?;
                let value = ctxt.read::<Fixed>()?;
                Ok(AxisValueTable::Format1(AxisValueTableFormat1 {
                    axis_index,
                    flags,
                    value_name_id,
                    value,
                }))
            }
            2 => {
                let axis_index = ctxt.read_u16be()?;
                let flags = ctxt.read::<AxisValueTableFlags>()?;
                let value_name_id = ctxt.read_u16be()?;
                let nominal_value = ctxt.read::<Fixed>()?;
                let range_min_value = ctxt.read::<Fixed>()?;
                let range_max_value = ctxt.read::<Fixed>()?;
                Ok(AxisValueTable::Format2(AxisValueTableFormat2 {
                    axis_index,
                    flags,
                    value_name_id,
                    nominal_value,
                    range_min_value,
                    range_max_value,
                }))
            }
            3 => {
                let axis_index = ctxt.read_u16be()?;
                let flags = ctxt.read::<AxisValueTableFlags>()?;
                let value_name_id = ctxt.read_u16be()?;
                let value = ctxt.read::<Fixed>()?;
                let linked_value = ctxt.read::<Fixed>()?;
                Ok(AxisValueTable::Format3(AxisValueTableFormat3 {
                    axis_index,
                    flags,
                    value_name_id,
                    value,
                    linked_value,
                }))
            }
            4 => {
                let axis_count = ctxt.read_u16be()?;
                let flags = ctxt.read::<AxisValueTableFlags>()?;
                let value_name_id = ctxt.read_u16be()?;
                let axis_values = ctxt
                    .read_array::<AxisValue>(usize::from(axis_count))?
                    .to_vec();
                Ok(AxisValueTable::Format4(AxisValueTableFormat4 {
                    flags,
                    value_name_id,
                    axis_values,
                }))
            }
            _ => Err(ParseError::BadVersion),
        }
    }
}

impl WriteBinary<&Self> for AxisValueTable {
    type Output = ();

    fn write<C: WriteContext>(ctxt: &mut C, table: &AxisValueTable) -> Result<(), WriteError> {
        U16Be::write(ctxt, table.format())?;
        match table {
            AxisValueTable::Format1(t) => {
                U16Be::write(ctxt, t.axis_index)?;
                AxisValueTableFlags::write(ctxt, t.flags)?;
                U16Be::write(ctxt, t.value_name_id)?;
                Fixed::write(ctxt, t.value)
            }
            AxisValueTable::Format2(t) => {
                U16Be::write(ctxt, t.axis_index)?;
                AxisValueTableFlags::write(ctxt, t.flags)?;
                U16Be::write(ctxt, t.value_name_id)?;
                Fixed::write(ctxt, t.nominal_value)?;
                Fixed::write(ctxt, t.range_min_value)?;
                Fixed::write(ctxt, t.range_max_value)
            }
            AxisValueTable::Format3(t) => {
                U16Be::write(ctxt, t.axis_index)?;
                AxisValueTableFlags::write(ctxt, t.flags)?;
                U16Be::write(ctxt, t.value_name_id)?;
                Fixed::write(ctxt, t.value)?;
                Fixed::write(ctxt, t.linked_value)
            }
            AxisValueTable::Format4(t) => {
                U16Be::write(ctxt, u16::try_from(t.axis_values.len())?)?;
                AxisValueTableFlags::write(ctxt, t.flags)?;
                U16Be::write(ctxt, t.value_name_id)?;
                ctxt.write_iter::<AxisValue, _>(t.axis_values.iter().copied())
            }
        }
    }
}

impl ReadFrom for AxisValueTableFlags {
    type ReadType = U16Be;

    fn read_from(flags: u16) -> Self {
        AxisValueTableFlags::from_bits_retain(flags)
    }
}

impl WriteBinary for AxisValueTableFlags {
    type Output = ();

    fn write<C: WriteContext>(ctxt: &mut C, flags: AxisValueTableFlags) -> Result<(), WriteError> {
        U16Be::write(ctxt, flags.bits())
    }
}

impl ReadFrom for AxisValue {
    type ReadType = (U16Be, Fixed);

    fn read_from((axis_index, value): (u16, Fixed)) -> Self {
        AxisValue { axis_index, value }
    }
}

impl WriteBinary for AxisValue {
    type Output = ();

    fn write<C: WriteContext>(ctxt: &mut C, axis_value: AxisValue) -> Result<(), WriteError> {
        U16Be::write(ctxt, axis_value.axis_index)?;
        Fixed::write(ctxt, axis_value.value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::binary::read::ReadScope;
    use crate::tag;
    use crate::tests::writer::{self, TtfType::*};

    fn fixed(value: f32) -> Fixed {
        Fixed::from(value)
    }

    fn axis_value_data(tables: &[Vec<u8>]) -> Vec<u8> {
        let mut offset = 2 * tables.len();
        let mut data = Vec::new();
        for table in tables {
            data.extend(writer::convert(&[UInt16(offset as u16)]));
            offset += table.len();
        }
        tables.iter().for_each(|table| data.extend(table));
        data
    }

    /// Build a `STAT` table with the canonical layout.
    fn stat_data(
        minor_version: u16,
        design_axis_size: u16,
        axes: &[(u32, u16, u16)],
        axis_values: &[Vec<u8>],
    ) -> Vec<u8> {
        let header_size = if minor_version > 0 { 20 } else { 18 };
        let axes_size = axes.len() * usize::from(design_axis_size);
        let mut w = writer::Writer::new();
        w.write(UInt16(1));
        w.write(UInt16(minor_version));
        w.write(UInt16(design_axis_size));
        w.write(UInt16(axes.len() as u16));
        w.write(UInt32(header_size));
        w.write(UInt16(axis_values.len() as u16));
        if axis_values.is_empty() {
            w.write(UInt32(0));
        } else {
            w.write(UInt32(header_size + axes_size as u32));
        }
        if minor_version > 0 {
            w.write(UInt16(256));
        }
        for &(axis_tag, name_id, ordering) in axes {
            w.write(UInt32(axis_tag));
            w.write(UInt16(name_id));
            w.write(UInt16(ordering));
            for i in 8..design_axis_size {
                w.write(UInt8(i as u8));
            }
        }
        let mut data = w.data;
        data.extend(axis_value_data(axis_values));
        data
    }

    fn format1(axis_index: u16, flags: u16, name_id: u16, value: i32) -> Vec<u8> {
        writer::convert(&[
            UInt16(1),
            UInt16(axis_index),
            UInt16(flags),
            UInt16(name_id),
            Int32(value << 16),
        ])
    }

    fn format2(axis_index: u16, flags: u16, name_id: u16, values: [i32; 3]) -> Vec<u8> {
        writer::convert(&[
            UInt16(2),
            UInt16(axis_index),
            UInt16(flags),
            UInt16(name_id),
            Int32(values[0] << 16),
            Int32(values[1] << 16),
            Int32(values[2] << 16),
        ])
    }

    fn format3(axis_index: u16, flags: u16, name_id: u16, value: i32, linked: i32) -> Vec<u8> {
        writer::convert(&[
            UInt16(3),
            UInt16(axis_index),
            UInt16(flags),
            UInt16(name_id),
            Int32(value << 16),
            Int32(linked << 16),
        ])
    }

    fn format4(flags: u16, name_id: u16, values: &[(u16, i32)]) -> Vec<u8> {
        let mut data = writer::convert(&[
            UInt16(4),
            UInt16(values.len() as u16),
            UInt16(flags),
            UInt16(name_id),
        ]);
        for &(axis_index, value) in values {
            data.extend(writer::convert(&[UInt16(axis_index), Int32(value << 16)]));
        }
        data
    }

    fn assert_round_trip(data: &[u8]) -> StatTable {
        let stat = ReadScope::new(data).read::<StatTable>().unwrap();
        let mut buffer = WriteBuffer::new();
        StatTable::write(&mut buffer, &stat).unwrap();
        assert_eq!(buffer.bytes(), data);
        stat
    }

    const AXES: [(u32, u16, u16); 4] = [
        (tag::OPSZ, 257, 0),
        (tag::WDTH, 261, 1),
        (tag::WGHT, 266, 2),
        (tag::ITAL, 273, 3),
    ];

    #[test]
    fn read_version_1_2() {
        let data = stat_data(
            2,
            8,
            &AXES,
            &[
                format4(0, 275, &[(0, 8), (1, 400)]),
                format2(0, 3, 258, [11, 9, 12]),
                format2(2, 2, 268, [400, 350, 449]),
                format1(3, 2, 274, 0),
            ],
        );
        let stat = assert_round_trip(&data);
        assert_eq!(stat.minor_version, 2);
        assert_eq!(stat.elided_fallback_name_id, Some(256));
        assert_eq!(stat.fallback_name_id(), 256);
        assert_eq!(
            stat.design_axes,
            AXES.iter()
                .map(|&(axis_tag, name_id, ordering)| AxisRecord::new(axis_tag, name_id, ordering))
                .collect::<Vec<_>>()
        );
        assert_eq!(stat.axis_values.len(), 4);
        assert_eq!(
            stat.axis_values[0],
            AxisValueTable::Format4(AxisValueTableFormat4 {
                flags: AxisValueTableFlags::empty(),
                value_name_id: 275,
                axis_values: vec![
                    AxisValue {
                        axis_index: 0,
                        value: fixed(8.)
                    },
                    AxisValue {
                        axis_index: 1,
                        value: fixed(400.)
                    },
                ],
            })
        );
        assert_eq!(
            stat.axis_values[1],
            AxisValueTable::Format2(AxisValueTableFormat2 {
                axis_index: 0,
                flags: AxisValueTableFlags::OLDER_SIBLING_FONT_ATTRIBUTE
                    | AxisValueTableFlags::ELIDABLE_AXIS_VALUE_NAME,
                value_name_id: 258,
                nominal_value: fixed(11.),
                range_min_value: fixed(9.),
                range_max_value: fixed(12.),
            })
        );
        assert_eq!(stat.axis_values[3].format(), 1);
        assert_eq!(stat.axis_values[3].value_name_id(), 274);
    }

    #[test]
    fn round_trip_version_1_0() {
        let data = stat_data(0, 8, &AXES[2..3], &[format1(0, 0, 262, 100)]);
        let stat = assert_round_trip(&data);
        assert_eq!(stat.elided_fallback_name_id, None);
        assert_eq!(stat.fallback_name_id(), 2);
    }

    #[test]
    fn round_trip_version_1_1_all_formats() {
        let data = stat_data(
            1,
            8,
            &AXES[1..3],
            &[
                format1(1, 0, 262, 100),
                format2(0, 0, 263, [100, 97, 101]),
                format3(1, 2, 268, 400, 700),
                format1(1, 0, 270, 700),
            ],
        );
        let stat = assert_round_trip(&data);
        assert_eq!(
            stat.axis_values[2],
            AxisValueTable::Format3(AxisValueTableFormat3 {
                axis_index: 1,
                flags: AxisValueTableFlags::ELIDABLE_AXIS_VALUE_NAME,
                value_name_id: 268,
                value: fixed(400.),
                linked_value: fixed(700.),
            })
        );
    }

    #[test]
    fn round_trip_format4_beyond_axis_count() {
        // Axis indices and counts in format 4 are not validated
        let data = stat_data(2, 8, &AXES[..1], &[format4(0, 300, &[(0, 8), (5, 1), (9, 2)])]);
        let stat = assert_round_trip(&data);
        let AxisValueTable::Format4(table) = &stat.axis_values[0] else {
            panic!("expected AxisValueTableFormat4")
        };
        assert_eq!(table.axis_values.len(), 3);
    }

    #[test]
    fn round_trip_preserves_reserved_bits_and_extra_axis_bytes() {
        let data = stat_data(1, 12, &AXES[..2], &[format1(1, 0xFFFF, 262, 100)]);
        let stat = assert_round_trip(&data);
        assert_eq!(stat.axis_values[0].flags().bits(), 0xFFFF);
        assert_eq!(stat.design_axes[1].extra, [8, 9, 10, 11]);
    }

    #[test]
    fn round_trip_without_axis_values() {
        let data = stat_data(1, 8, &AXES, &[]);
        let stat = assert_round_trip(&data);
        assert!(stat.axis_values.is_empty());
    }

    #[test]
    fn invalid_format() {
        let data = stat_data(1, 8, &AXES, &[writer::convert(&[UInt16(5), UInt16(0)])]);
        assert_eq!(
            ReadScope::new(&data).read::<StatTable>(),
            Err(ParseError::BadVersion)
        );
    }

    #[test]
    fn design_axis_size_too_small() {
        let data = stat_data(1, 6, &AXES[..1], &[]);
        assert!(ReadScope::new(&data).read::<StatTable>().is_err());
    }

    #[test]
    fn write_mismatched_version() {
        let data = stat_data(1, 8, &AXES, &[]);
        let mut stat = ReadScope::new(&data).read::<StatTable>().unwrap();
        stat.elided_fallback_name_id = None;
        let mut buffer = WriteBuffer::new();
        assert!(StatTable::write(&mut buffer, &stat).is_err());
    }

    #[test]
    fn name_id_lookup() {
        let data = stat_data(
            2,
            8,
            &AXES,
            &[
                format4(0, 275, &[(0, 8), (1, 400)]),
                format2(2, 0, 267, [300, 300, 349]),
                format2(2, 2, 268, [400, 350, 449]),
                format1(3, 2, 274, 0),
                format3(2, 0, 271, 700, 400),
            ],
        );
        let stat = ReadScope::new(&data).read::<StatTable>().unwrap();
        assert_eq!(stat.design_axis_index(tag::WGHT), Some(2));
        assert_eq!(stat.axis_value_name_id(2, fixed(420.)), Some(268));
        assert_eq!(stat.axis_value_name_id(2, fixed(700.)), Some(271));
        assert_eq!(stat.axis_value_name_id(3, fixed(0.)), Some(274));
        assert_eq!(stat.axis_value_name_id(2, fixed(950.)), None);
        assert_eq!(
            stat.combination_name_id(&[(1, fixed(400.)), (0, fixed(8.)), (2, fixed(300.))]),
            Some(275)
        );
        assert_eq!(stat.combination_name_id(&[(0, fixed(8.))]), None);
    }
}
