//! `MVAR` Metrics Variations Table
//!
//! <https://learn.microsoft.com/en-us/typography/opentype/spec/mvar>

use crate::binary::read::{ReadArray, ReadBinary, ReadCtxt, ReadFrom, ReadUnchecked};
use crate::binary::write::{WriteBinary, WriteContext};
use crate::binary::{U16Be, U32Be};
use crate::error::{ParseError, WriteError};
use crate::tables::variable_fonts::{DeltaSetIndexMapEntry, ItemVariationStore};
use crate::tables::F2Dot14;
use crate::tag::{self, DisplayTag};

use log::debug;

/// The value tags defined for `MVAR`.
pub const KNOWN_VALUE_TAGS: [u32; 38] = [
    tag::HASC,
    tag::HDSC,
    tag::HLGP,
    tag::HCLA,
    tag::HCLD,
    tag::VASC,
    tag::VDSC,
    tag::VLGP,
    tag::HCRS,
    tag::HCRN,
    tag::HCOF,
    tag::VCRS,
    tag::VCRN,
    tag::VCOF,
    tag::XHGT,
    tag::CPHT,
    tag::SBXS,
    tag::SBYS,
    tag::SBXO,
    tag::SBYO,
    tag::SPXS,
    tag::SPYS,
    tag::SPXO,
    tag::SPYO,
    tag::STRS,
    tag::STRO,
    tag::UNDS,
    tag::UNDO,
    tag::GSP0,
    tag::GSP1,
    tag::GSP2,
    tag::GSP3,
    tag::GSP4,
    tag::GSP5,
    tag::GSP6,
    tag::GSP7,
    tag::GSP8,
    tag::GSP9,
];

/// `MVAR` Metrics Variations Table
pub struct MvarTable<'a> {
    /// Major version number of the metrics variations table.
    pub major_version: u16,
    /// Minor version number of the metrics variations table.
    pub minor_version: u16,
    /// Not used, written back as read.
    reserved: u16,
    /// The size in bytes of each value record.
    value_record_size: u16,
    /// The item variation data, `None` if `value_records.len()` is zero.
    item_variation_store: Option<ItemVariationStore<'a>>,
    /// Array of value records that identify target items and the associated
    /// delta-set index for each.
    ///
    /// The valueTag records must be in binary order of their valueTag field.
    value_records: ReadArray<'a, ValueRecord>,
}

/// Identifies target items by tag their associated delta-set index.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct ValueRecord {
    /// Four-byte tag identifying a font-wide measure.
    pub value_tag: u32,
    /// A delta-set outer index.
    ///
    /// Used to select an item variation data sub-table within the item
    /// variation store.
    delta_set_outer_index: u16,
    /// A delta-set inner index.
    ///
    /// Used to select a delta-set row within an item variation data sub-table.
    delta_set_inner_index: u16,
}

/// Returns `true` if `value_tag` is one of the value tags defined for `MVAR`.
pub fn is_known_value_tag(value_tag: u32) -> bool {
    KNOWN_VALUE_TAGS.contains(&value_tag)
}

impl<'a> MvarTable<'a> {
    /// Retrieve the delta for the supplied
    /// [value tag](https://learn.microsoft.com/en-us/typography/opentype/spec/mvar#value-tags).
    ///
    /// Returns `None` if the tag is not present or its delta-set index is invalid.
    pub fn lookup(&self, tag: u32, instance: &[F2Dot14]) -> Option<f32> {
        let item_variation_store = self.item_variation_store.as_ref()?;
        let value_record = self.value_record(tag)?;
        // The outer index selects an item variation data sub-table, the inner index a delta-set
        // row within it. The row has one delta per region referenced by the sub-table.
        match item_variation_store.adjustment(value_record.into(), instance) {
            Ok(delta) => Some(delta),
            Err(err) => {
                debug!("invalid MVAR delta-set for '{}': {}", DisplayTag(tag), err);
                None
            }
        }
    }

    /// The delta for the supplied value tag, zero when the metric doesn't vary.
    pub fn metric_delta(&self, tag: u32, instance: &[F2Dot14]) -> f32 {
        self.lookup(tag, instance).unwrap_or(0.)
    }

    /// Find the value record for the supplied value tag.
    pub fn value_record(&self, tag: u32) -> Option<ValueRecord> {
        self.value_records
            .binary_search_by(|record| record.value_tag.cmp(&tag))
            .ok()
            .and_then(|index| self.value_records.get_item(index))
    }

    /// Iterator over the [ValueRecords][ValueRecord] in this `MVAR` table.
    pub fn value_records(&self) -> impl Iterator<Item = ValueRecord> + 'a {
        self.value_records.iter()
    }

    /// The number of [ValueRecords][ValueRecord] in this `MVAR` table.
    pub fn value_records_len(&self) -> u16 {
        // NOTE(cast): Safe as value_records was contructed from u16 value_record_count.
        self.value_records.len() as u16
    }

    /// The item variation store of this table, if present.
    pub fn item_variation_store(&self) -> Option<&ItemVariationStore<'a>> {
        self.item_variation_store.as_ref()
    }
}

impl ReadBinary for MvarTable<'_> {
    type HostType<'a> = MvarTable<'a>;

    fn read<'a>(ctxt: &mut ReadCtxt<'a>) -> Result<Self::HostType<'a>, ParseError> {
        let scope = ctxt.scope();
        let major_version = ctxt.read_u16be()?;
        ctxt.check_version(major_version == 1)?;
        let minor_version = ctxt.read_u16be()?;
        let reserved = ctxt.read_u16be()?;
        let value_record_size = ctxt.read_u16be()?;
        let value_record_count = ctxt.read_u16be()?;
        let item_variation_store_offset = ctxt.read_u16be()?;
        let value_records = if value_record_count > 0 {
            // The value record size must be greater than zero but a font was encountered
            // (DecovarAlpha) where it was zero. However the count was also zero so we accept
            // this.
            ctxt.check(usize::from(value_record_size) >= ValueRecord::SIZE)?;
            ctxt.read_array_stride::<ValueRecord>(
                usize::from(value_record_count),
                usize::from(value_record_size),
            )?
        } else {
            ReadArray::empty()
        };
        let item_variation_store = (item_variation_store_offset > 0)
            .then(|| {
                scope
                    .offset(usize::from(item_variation_store_offset))
                    .read::<ItemVariationStore<'_>>()
            })
            .transpose()?;

        Ok(MvarTable {
            major_version,
            minor_version,
            reserved,
            value_record_size,
            item_variation_store,
            value_records,
        })
    }
}

impl WriteBinary<&Self> for MvarTable<'_> {
    type Output = ();

    fn write<C: WriteContext>(ctxt: &mut C, table: &MvarTable<'_>) -> Result<(), WriteError> {
        let start = ctxt.bytes_written();
        U16Be::write(ctxt, table.major_version)?;
        U16Be::write(ctxt, table.minor_version)?;
        U16Be::write(ctxt, table.reserved)?;
        U16Be::write(ctxt, table.value_record_size)?;
        U16Be::write(ctxt, table.value_records_len())?;
        let item_variation_store_offset = ctxt.placeholder::<U16Be, _>()?;
        let padding = usize::from(table.value_record_size).saturating_sub(ValueRecord::SIZE);
        for record in table.value_records() {
            ValueRecord::write(ctxt, record)?;
            ctxt.write_zeros(padding)?;
        }
        match &table.item_variation_store {
            Some(item_variation_store) => {
                ctxt.write_placeholder(
                    item_variation_store_offset,
                    u16::try_from(ctxt.bytes_written() - start)?,
                )?;
                ItemVariationStore::write(ctxt, item_variation_store)?;
            }
            None => ctxt.write_placeholder(item_variation_store_offset, 0)?,
        }

        Ok(())
    }
}

impl ReadFrom for ValueRecord {
    type ReadType = (U32Be, U16Be, U16Be);

    fn read_from(
        (value_tag, delta_set_outer_index, delta_set_inner_index): (u32, u16, u16),
    ) -> Self {
        ValueRecord {
            value_tag,
            delta_set_outer_index,
            delta_set_inner_index,
        }
    }
}

impl WriteBinary for ValueRecord {
    type Output = ();

    fn write<C: WriteContext>(ctxt: &mut C, record: ValueRecord) -> Result<(), WriteError> {
        U32Be::write(ctxt, record.value_tag)?;
        U16Be::write(ctxt, record.delta_set_outer_index)?;
        U16Be::write(ctxt, record.delta_set_inner_index)
    }
}

impl From<ValueRecord> for DeltaSetIndexMapEntry {
    fn from(record: ValueRecord) -> DeltaSetIndexMapEntry {
        DeltaSetIndexMapEntry {
            outer_index: record.delta_set_outer_index,
            inner_index: record.delta_set_inner_index,
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::binary::read::ReadScope;
    use crate::binary::write::WriteBuffer;
    use crate::tables::variable_fonts::tests::ivs_data;
    use crate::tables::variable_fonts::OwnedTuple;
    use crate::tests::assert_close;
    use crate::tests::writer::{self, TtfType::*};

    /// Build an `MVAR` table from (tag, outer, inner) records and serialized item variation
    /// store data.
    pub(crate) fn mvar_data(records: &[(u32, u16, u16)], ivs: &[u8]) -> Vec<u8> {
        let mut data = writer::convert(&[
            UInt16(1),
            UInt16(0),
            UInt16(0),
            UInt16(8),
            UInt16(records.len() as u16),
            UInt16(12 + 8 * records.len() as u16),
        ]);
        for &(value_tag, outer, inner) in records {
            data.extend(writer::convert(&[UInt32(value_tag), UInt16(outer), UInt16(inner)]));
        }
        data.extend_from_slice(ivs);
        data
    }

    fn sample() -> Vec<u8> {
        let ivs = ivs_data(&[(0., 1., 1.), (-1., -1., 0.)], &[(&[0, 1], &[&[20, -4], &[-10, 6]])]);
        mvar_data(&[(tag::CPHT, 0, 0), (tag::HDSC, 0, 1), (tag::XHGT, 0, 7)], &ivs)
    }

    #[test]
    fn lookup_value() {
        let data = sample();
        let mvar = ReadScope::new(&data).read::<MvarTable<'_>>().unwrap();
        assert_eq!(mvar.value_records_len(), 3);
        let instance = OwnedTuple::from_f32(&[0.5]);
        assert_close(mvar.lookup(tag::CPHT, &instance).unwrap(), 10.);
        assert_close(mvar.lookup(tag::HDSC, &instance).unwrap(), -5.);
        let instance = OwnedTuple::from_f32(&[-1.0]);
        assert_close(mvar.lookup(tag::CPHT, &instance).unwrap(), -4.);
    }

    #[test]
    fn lookup_missing_or_invalid() {
        let data = sample();
        let mvar = ReadScope::new(&data).read::<MvarTable<'_>>().unwrap();
        let instance = OwnedTuple::from_f32(&[1.0]);
        // Not present
        assert_eq!(mvar.lookup(tag::HASC, &instance), None);
        assert_eq!(mvar.metric_delta(tag::HASC, &instance), 0.);
        // Present with an inner index out of range
        assert_eq!(mvar.lookup(tag::XHGT, &instance), None);
        assert_eq!(mvar.metric_delta(tag::XHGT, &instance), 0.);
    }

    #[test]
    fn empty_table() {
        // Value record size of zero is accepted when there are no records
        let data = writer::convert(&[
            UInt16(1),
            UInt16(0),
            UInt16(0),
            UInt16(0),
            UInt16(0),
            UInt16(0),
        ]);
        let mvar = ReadScope::new(&data).read::<MvarTable<'_>>().unwrap();
        assert_eq!(mvar.value_records_len(), 0);
        assert!(mvar.item_variation_store().is_none());
        assert_eq!(mvar.lookup(tag::HASC, &OwnedTuple::from_f32(&[1.0])), None);
    }

    #[test]
    fn value_record_size_too_small() {
        let data = writer::convert(&[
            UInt16(1),
            UInt16(0),
            UInt16(0),
            UInt16(6),
            UInt16(1),
            UInt16(0),
            UInt32(tag::HASC),
            UInt16(0),
        ]);
        assert!(ReadScope::new(&data).read::<MvarTable<'_>>().is_err());
    }

    #[test]
    fn round_trip() {
        let mut data = sample();
        // A non-zero reserved field is preserved
        data[4..6].copy_from_slice(&[0xAB, 0xCD]);
        let mvar = ReadScope::new(&data).read::<MvarTable<'_>>().unwrap();
        let mut buffer = WriteBuffer::new();
        MvarTable::write(&mut buffer, &mvar).unwrap();
        assert_eq!(buffer.bytes(), data.as_slice());
    }

    #[test]
    fn known_value_tags() {
        assert!(is_known_value_tag(tag::UNDO));
        assert!(is_known_value_tag(tag::GSP9));
        assert!(!is_known_value_tag(tag::WGHT));
    }
}
