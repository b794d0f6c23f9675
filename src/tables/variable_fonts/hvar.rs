//! `HVAR` (Horizontal Metrics Variations) and `VVAR` (Vertical Metrics Variations) tables.
//!
//! Optional tables in variable fonts to provide glyph metrics variations. If absent then
//! `gvar` phantom point deltas must be used to determine adjustments to metrics.
//!
//! <https://learn.microsoft.com/en-us/typography/opentype/spec/hvar>
//!
//! <https://learn.microsoft.com/en-us/typography/opentype/spec/vvar>

use crate::binary::read::{ReadBinaryDep, ReadCtxt, ReadScope};
use crate::error::ParseError;
use crate::tables::variable_fonts::{DeltaSetIndexMap, DeltaSetIndexMapEntry, ItemVariationStore};
use crate::tables::F2Dot14;
use crate::SafeFrom;

/// Which metrics a [MetricsVariationsTable] varies.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum MetricsDirection {
    /// `HVAR`: advance widths, left and right side bearings.
    Horizontal,
    /// `VVAR`: advance heights, top and bottom side bearings, and vertical origins.
    Vertical,
}

/// `HVAR` or `VVAR` table.
pub struct MetricsVariationsTable<'a> {
    /// Major version number of the metrics variations table.
    pub major_version: u16,
    /// Minor version number of the metrics variations table.
    pub minor_version: u16,
    /// Whether this is an `HVAR` or `VVAR` table.
    pub direction: MetricsDirection,
    item_variation_store: ItemVariationStore<'a>,
    /// Delta-set index mapping for advance widths/heights.
    advance_mapping: Option<DeltaSetIndexMap<'a>>,
    /// Delta-set index mapping for left/top side bearings.
    start_side_bearing_mapping: Option<DeltaSetIndexMap<'a>>,
    /// Delta-set index mapping for right/bottom side bearings.
    end_side_bearing_mapping: Option<DeltaSetIndexMap<'a>>,
    /// Delta-set index mapping for vertical origin y coordinates (`VVAR` only).
    vorg_mapping: Option<DeltaSetIndexMap<'a>>,
}

/// `HVAR`, the Horizontal Metrics Variations table.
pub type HvarTable<'a> = MetricsVariationsTable<'a>;

/// `VVAR`, the Vertical Metrics Variations table.
pub type VvarTable<'a> = MetricsVariationsTable<'a>;

impl<'a> MetricsVariationsTable<'a> {
    /// Calculate the delta for the advance of the supplied `glyph_id`.
    ///
    /// Without an advance mapping the glyph id is used directly as the inner index into the
    /// first item variation data subtable.
    pub fn advance_delta(&self, instance: &[F2Dot14], glyph_id: u16) -> Result<f32, ParseError> {
        let delta_set_entry =
            Self::delta_set_entry_for_glyph(glyph_id, self.advance_mapping.as_ref())?
                .unwrap_or(DeltaSetIndexMapEntry {
                    outer_index: 0,
                    inner_index: glyph_id,
                });
        self.item_variation_store
            .adjustment(delta_set_entry, instance)
    }

    /// Calculate the delta for the left (`HVAR`) or top (`VVAR`) side bearing of the supplied
    /// `glyph_id`.
    ///
    /// Returns `None` if the table has no mapping for this metric.
    pub fn start_side_bearing_delta(
        &self,
        instance: &[F2Dot14],
        glyph_id: u16,
    ) -> Result<Option<f32>, ParseError> {
        self.mapped_delta(self.start_side_bearing_mapping.as_ref(), instance, glyph_id)
    }

    /// Calculate the delta for the right (`HVAR`) or bottom (`VVAR`) side bearing of the
    /// supplied `glyph_id`.
    ///
    /// Returns `None` if the table has no mapping for this metric.
    pub fn end_side_bearing_delta(
        &self,
        instance: &[F2Dot14],
        glyph_id: u16,
    ) -> Result<Option<f32>, ParseError> {
        self.mapped_delta(self.end_side_bearing_mapping.as_ref(), instance, glyph_id)
    }

    /// Calculate the delta for the vertical origin of the supplied `glyph_id`.
    ///
    /// Returns `None` for `HVAR` tables and `VVAR` tables without a vertical origin mapping.
    pub fn vertical_origin_delta(
        &self,
        instance: &[F2Dot14],
        glyph_id: u16,
    ) -> Result<Option<f32>, ParseError> {
        self.mapped_delta(self.vorg_mapping.as_ref(), instance, glyph_id)
    }

    /// The item variation store of this table.
    pub fn item_variation_store(&self) -> &ItemVariationStore<'a> {
        &self.item_variation_store
    }

    fn mapped_delta(
        &self,
        mapping: Option<&DeltaSetIndexMap<'_>>,
        instance: &[F2Dot14],
        glyph_id: u16,
    ) -> Result<Option<f32>, ParseError> {
        Self::delta_set_entry_for_glyph(glyph_id, mapping)?
            .map(|delta_set_entry| {
                self.item_variation_store
                    .adjustment(delta_set_entry, instance)
            })
            .transpose()
    }

    fn delta_set_entry_for_glyph(
        glyph_id: u16,
        delta_set_index_map: Option<&DeltaSetIndexMap<'_>>,
    ) -> Result<Option<DeltaSetIndexMapEntry>, ParseError> {
        delta_set_index_map
            .map(|mapping| mapping.entry(u32::from(glyph_id)))
            .transpose()
    }
}

impl ReadBinaryDep for MetricsVariationsTable<'_> {
    type Args<'a> = MetricsDirection;
    type HostType<'a> = MetricsVariationsTable<'a>;

    fn read_dep<'a>(
        ctxt: &mut ReadCtxt<'a>,
        direction: MetricsDirection,
    ) -> Result<Self::HostType<'a>, ParseError> {
        let scope = ctxt.scope();
        let major_version = ctxt.read_u16be()?;
        ctxt.check_version(major_version == 1)?;
        let minor_version = ctxt.read_u16be()?;
        let item_variation_store_offset = ctxt.read_u32be()?;
        let advance_mapping_offset = ctxt.read_u32be()?;
        let start_side_bearing_mapping_offset = ctxt.read_u32be()?;
        let end_side_bearing_mapping_offset = ctxt.read_u32be()?;
        let vorg_mapping_offset = match direction {
            MetricsDirection::Horizontal => 0,
            MetricsDirection::Vertical => ctxt.read_u32be()?,
        };

        let item_variation_store = scope
            .offset(usize::safe_from(item_variation_store_offset))
            .read::<ItemVariationStore<'_>>()?;
        let advance_mapping = read_optional_index_map(scope, advance_mapping_offset)?;
        let start_side_bearing_mapping =
            read_optional_index_map(scope, start_side_bearing_mapping_offset)?;
        let end_side_bearing_mapping =
            read_optional_index_map(scope, end_side_bearing_mapping_offset)?;
        let vorg_mapping = read_optional_index_map(scope, vorg_mapping_offset)?;

        Ok(MetricsVariationsTable {
            major_version,
            minor_version,
            direction,
            item_variation_store,
            advance_mapping,
            start_side_bearing_mapping,
            end_side_bearing_mapping,
            vorg_mapping,
        })
    }
}

fn read_optional_index_map(
    scope: ReadScope<'_>,
    offset: u32,
) -> Result<Option<DeltaSetIndexMap<'_>>, ParseError> {
    (offset > 0)
        .then(|| {
            scope
                .offset(usize::safe_from(offset))
                .read::<DeltaSetIndexMap<'_>>()
        })
        .transpose()
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::tables::variable_fonts::tests::ivs_data;
    use crate::tables::variable_fonts::OwnedTuple;
    use crate::tests::assert_close;
    use crate::tests::writer::{self, TtfType::*};

    /// Build an `HVAR` (or `VVAR` when `vorg` is supplied) table.
    ///
    /// The item variation store has a single region peaking at wght = 1 and one subtable with
    /// one delta per row. `advance_map` entries are inner indices with an outer index of 0.
    pub(crate) fn hvar_data(
        deltas: &[i16],
        advance_map: Option<&[u8]>,
        lsb_map: Option<&[u8]>,
        vorg: Option<&[u8]>,
    ) -> Vec<u8> {
        let rows = deltas.iter().map(std::slice::from_ref).collect::<Vec<_>>();
        let ivs = ivs_data(&[(0., 1., 1.)], &[(&[0], &rows)]);
        let map_data = |map: &[u8]| {
            let mut data = writer::convert(&[UInt8(0), UInt8(0x07), UInt16(map.len() as u16)]);
            data.extend_from_slice(map);
            data
        };

        let header_size = if vorg.is_some() { 24 } else { 20 };
        let mut tail = ivs;
        let mut offsets = [0u32; 4];
        for (offset, map) in offsets.iter_mut().zip([advance_map, lsb_map, None, vorg]) {
            if let Some(map) = map {
                *offset = (header_size + tail.len()) as u32;
                tail.extend(map_data(map));
            }
        }

        let mut data = writer::convert(&[
            UInt16(1),
            UInt16(0),
            UInt32(header_size as u32),
            UInt32(offsets[0]),
            UInt32(offsets[1]),
            UInt32(offsets[2]),
        ]);
        if vorg.is_some() {
            data.extend(writer::convert(&[UInt32(offsets[3])]));
        }
        data.extend(tail);
        data
    }

    #[test]
    fn advance_delta_without_mapping() {
        let data = hvar_data(&[10, -20, 30], None, None, None);
        let hvar = ReadScope::new(&data)
            .read_dep::<HvarTable<'_>>(MetricsDirection::Horizontal)
            .unwrap();
        let instance = OwnedTuple::from_f32(&[0.5]);
        assert_close(hvar.advance_delta(&instance, 1).unwrap(), -10.);
        assert!(hvar.advance_delta(&instance, 3).is_err());
        assert_eq!(hvar.start_side_bearing_delta(&instance, 1).unwrap(), None);
        assert_eq!(hvar.end_side_bearing_delta(&instance, 1).unwrap(), None);
        assert_eq!(hvar.vertical_origin_delta(&instance, 1).unwrap(), None);
    }

    #[test]
    fn advance_delta_beyond_mapping_uses_last_entry() {
        let data = hvar_data(&[10, -20, 224], Some(&[0, 2]), Some(&[1]), None);
        let hvar = ReadScope::new(&data)
            .read_dep::<HvarTable<'_>>(MetricsDirection::Horizontal)
            .unwrap();
        let instance = OwnedTuple::from_f32(&[0.375]);
        assert_close(hvar.advance_delta(&instance, 0).unwrap(), 3.75);
        assert_close(hvar.advance_delta(&instance, 1).unwrap(), 84.);
        assert_close(hvar.advance_delta(&instance, 500).unwrap(), 84.);
        assert_close(
            hvar.start_side_bearing_delta(&instance, 7).unwrap().unwrap(),
            -7.5,
        );
    }

    #[test]
    fn vvar_vertical_origin() {
        let data = hvar_data(&[40, 8], None, None, Some(&[1]));
        let vvar = ReadScope::new(&data)
            .read_dep::<VvarTable<'_>>(MetricsDirection::Vertical)
            .unwrap();
        assert_eq!(vvar.direction, MetricsDirection::Vertical);
        let instance = OwnedTuple::from_f32(&[1.0]);
        assert_close(vvar.advance_delta(&instance, 0).unwrap(), 40.);
        assert_close(vvar.vertical_origin_delta(&instance, 0).unwrap().unwrap(), 8.);
    }
}
