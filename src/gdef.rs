//! `GDEF` variation data.
//!
//! Only the parts of `GDEF` that relate to variations are read: the item variation store added in
//! version 1.3 and the device tables that index into it. The layout engine uses these to adjust
//! anchor points and value records.
//!
//! <https://learn.microsoft.com/en-us/typography/opentype/spec/gdef>

use crate::binary::read::{ReadBinary, ReadCtxt};
use crate::error::ParseError;
use crate::size;
use crate::tables::variable_fonts::{DeltaSetIndexMapEntry, ItemVariationStore};
use crate::tables::F2Dot14;
use crate::SafeFrom;

/// `deltaFormat` of a device table that holds a variation index.
pub const VARIATION_INDEX_FORMAT: u16 = 0x8000;

pub struct GdefTable<'a> {
    pub major_version: u16,
    pub minor_version: u16,
    item_variation_store: Option<ItemVariationStore<'a>>,
}

/// Device or VariationIndex table.
///
/// <https://learn.microsoft.com/en-us/typography/opentype/spec/chapter2#device-and-variationindex-tables>
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Device {
    /// Hinting deltas for a range of ppem sizes. The packed deltas are not decoded.
    Hinting {
        start_size: u16,
        end_size: u16,
        delta_format: u16,
    },
    /// Index of a delta-set in the `GDEF` item variation store.
    VariationIndex(DeltaSetIndexMapEntry),
}

impl<'a> GdefTable<'a> {
    pub fn item_variation_store(&self) -> Option<&ItemVariationStore<'a>> {
        self.item_variation_store.as_ref()
    }

    /// The adjustment for a delta-set in the item variation store.
    ///
    /// Zero when there is no item variation store or the entry is out of range.
    pub fn adjustment(&self, entry: DeltaSetIndexMapEntry, instance: &[F2Dot14]) -> f32 {
        self.item_variation_store
            .as_ref()
            .map_or(0., |store| store.adjustment_or_zero(entry, instance))
    }

    /// The adjustment described by a device table. Hinting devices never vary.
    pub fn device_adjustment(&self, device: &Device, instance: &[F2Dot14]) -> f32 {
        match *device {
            Device::VariationIndex(entry) => self.adjustment(entry, instance),
            Device::Hinting { .. } => 0.,
        }
    }
}

impl ReadBinary for GdefTable<'_> {
    type HostType<'a> = GdefTable<'a>;

    fn read<'a>(ctxt: &mut ReadCtxt<'a>) -> Result<Self::HostType<'a>, ParseError> {
        let table = ctxt.scope();

        let major_version = ctxt.read_u16be()?;
        ctxt.check_version(major_version == 1)?;
        let minor_version = ctxt.read_u16be()?;
        let _glyph_classdef_offset = ctxt.read_u16be()?;
        let _attach_list_offset = ctxt.read_u16be()?;
        let _lig_caret_list_offset = ctxt.read_u16be()?;
        let _mark_attach_classdef_offset = ctxt.read_u16be()?;
        if minor_version >= 2 {
            let _mark_glyph_sets_def_offset = ctxt.read_u16be()?;
        }
        let item_var_store_offset = if minor_version >= 3 {
            ctxt.read_u32be()?
        } else {
            0
        };

        let gdef_header_size = 7 * size::U16 + size::U32;
        let item_variation_store = if item_var_store_offset == 0 {
            None
        } else if usize::safe_from(item_var_store_offset) < gdef_header_size {
            return Err(ParseError::BadOffset);
        } else {
            Some(
                table
                    .offset(usize::safe_from(item_var_store_offset))
                    .read::<ItemVariationStore<'_>>()?,
            )
        };

        Ok(GdefTable {
            major_version,
            minor_version,
            item_variation_store,
        })
    }
}

impl ReadBinary for Device {
    type HostType<'a> = Device;

    fn read<'a>(ctxt: &mut ReadCtxt<'a>) -> Result<Device, ParseError> {
        let first = ctxt.read_u16be()?;
        let second = ctxt.read_u16be()?;
        let delta_format = ctxt.read_u16be()?;
        match delta_format {
            VARIATION_INDEX_FORMAT => Ok(Device::VariationIndex(DeltaSetIndexMapEntry {
                outer_index: first,
                inner_index: second,
            })),
            1..=3 => Ok(Device::Hinting {
                start_size: first,
                end_size: second,
                delta_format,
            }),
            _ => Err(ParseError::BadValue),
        }
    }
}
