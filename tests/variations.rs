mod common;

use std::borrow::Cow;
use std::collections::HashMap;

use allsorts_variations::binary::read::ReadScope;
use allsorts_variations::binary::write::{WriteBinary, WriteBuffer};
use allsorts_variations::error::ParseError;
use allsorts_variations::metrics::FontMetrics;
use allsorts_variations::tables::variable_fonts::gvar::GlyphPoints;
use allsorts_variations::tables::variable_fonts::stat::StatTable;
use allsorts_variations::tables::variable_fonts::OwnedTuple;
use allsorts_variations::tables::{F2Dot14, Fixed, FontTableProvider};
use allsorts_variations::tag;
use allsorts_variations::variations::VariableFont;

use crate::common::assert_close_within;

struct TableProvider {
    tables: HashMap<u32, Vec<u8>>,
}

impl FontTableProvider for TableProvider {
    fn table_data(&self, tag: u32) -> Result<Option<Cow<'_, [u8]>>, ParseError> {
        Ok(self
            .tables
            .get(&tag)
            .map(|data| Cow::Borrowed(data.as_slice())))
    }

    fn has_table(&self, tag: u32) -> bool {
        self.tables.contains_key(&tag)
    }
}

#[derive(Default)]
struct Data(Vec<u8>);

impl Data {
    fn u16(mut self, value: u16) -> Self {
        self.0.extend_from_slice(&value.to_be_bytes());
        self
    }

    fn i16(mut self, value: i16) -> Self {
        self.0.extend_from_slice(&value.to_be_bytes());
        self
    }

    fn u32(mut self, value: u32) -> Self {
        self.0.extend_from_slice(&value.to_be_bytes());
        self
    }

    fn fixed(self, value: i32) -> Self {
        self.u32((value << 16) as u32)
    }

    fn bytes(mut self, bytes: &[u8]) -> Self {
        self.0.extend_from_slice(bytes);
        self
    }
}

fn fvar() -> Vec<u8> {
    Data::default()
        .u16(1)
        .u16(0)
        .u16(16) // axesArrayOffset
        .u16(2)
        .u16(1) // axisCount
        .u16(20)
        .u16(0)
        .u16(8)
        .u32(tag::WGHT)
        .fixed(100)
        .fixed(400)
        .fixed(900)
        .u16(0)
        .u16(256)
        .0
}

/// Item variation store with one region (0, 1, 1) and one subtable of word deltas.
fn item_variation_store(deltas: &[i16]) -> Vec<u8> {
    let mut data = Data::default()
        .u16(1)
        .u32(12) // variationRegionListOffset
        .u16(1)
        .u32(22) // itemVariationDataOffset
        // region list
        .u16(1)
        .u16(1)
        .i16(0)
        .i16(0x4000)
        .i16(0x4000)
        // item variation data
        .u16(deltas.len() as u16)
        .u16(1) // wordDeltaCount
        .u16(1)
        .u16(0);
    for &delta in deltas {
        data = data.i16(delta);
    }
    data.0
}

fn mvar() -> Vec<u8> {
    let records = [
        (b"cpht", 0),
        (b"hasc", 0),
        (b"hdsc", 1),
        (b"xhgt", 2),
    ];
    let mut data = Data::default()
        .u16(1)
        .u16(0)
        .u16(0)
        .u16(8)
        .u16(records.len() as u16)
        .u16((12 + 8 * records.len()) as u16);
    for (value_tag, inner) in records {
        data = data.bytes(value_tag).u16(0).u16(inner);
    }
    data.bytes(&item_variation_store(&[20677, -13371, 23621])).0
}

fn hhea() -> Vec<u8> {
    let mut data = vec![0; 36];
    data[0..2].copy_from_slice(&1u16.to_be_bytes());
    data[4..6].copy_from_slice(&996i16.to_be_bytes());
    data[6..8].copy_from_slice(&(-204i16).to_be_bytes());
    data[34..36].copy_from_slice(&1u16.to_be_bytes());
    data
}

fn os2() -> Vec<u8> {
    let mut data = vec![0; 96];
    data[0..2].copy_from_slice(&4u16.to_be_bytes());
    data[26..28].copy_from_slice(&50i16.to_be_bytes());
    data[28..30].copy_from_slice(&300i16.to_be_bytes());
    data[86..88].copy_from_slice(&628i16.to_be_bytes());
    data[88..90].copy_from_slice(&792i16.to_be_bytes());
    data
}

fn hvar() -> Vec<u8> {
    let ivs = item_variation_store(&[0, 224]);
    let advance_map_offset = 20 + ivs.len() as u32;
    Data::default()
        .u16(1)
        .u16(0)
        .u32(20)
        .u32(advance_map_offset)
        .u32(0)
        .u32(0)
        .bytes(&ivs)
        // DeltaSetIndexMap format 0, 1 byte entries, 8 inner index bits
        .bytes(&[0, 0x07])
        .u16(2)
        .bytes(&[0, 1])
        .0
}

fn provider() -> TableProvider {
    let tables = [
        (tag::FVAR, fvar()),
        (tag::MVAR, mvar()),
        (tag::HHEA, hhea()),
        (tag::OS_2, os2()),
        (tag::HVAR, hvar()),
    ];
    TableProvider {
        tables: tables.into_iter().collect(),
    }
}

fn round2(value: f32) -> f32 {
    (value * 100.).round() / 100.
}

#[test]
fn mvar_metrics() {
    let provider = provider();
    let font = VariableFont::new(&provider).unwrap();
    let default_metrics = FontMetrics::read(&provider).unwrap();
    assert_eq!(default_metrics.ascent, 996.);
    assert_eq!(default_metrics.cap_height, 792.);

    // wght at a raw normalized value of 128
    let instance = font
        .instance(OwnedTuple::new(&[F2Dot14::from(0.0078125)]))
        .unwrap();
    let metrics = instance.metrics(&default_metrics);
    assert_eq!(round2(metrics.ascent), 1157.54);
    assert_eq!(round2(metrics.descent), -308.46);
    assert_eq!(round2(metrics.cap_height), 953.54);
    assert_eq!(round2(metrics.x_height), 812.54);
    assert_eq!(round2(metrics.line_gap), 0.);
    assert_eq!(round2(metrics.line_height()), 1466.);
    assert_eq!(metrics.strikeout_position, 300.);

    // Metrics are unchanged at the default location
    let instance = font.instance(font.tuple(&[]).unwrap()).unwrap();
    assert_eq!(instance.metrics(&default_metrics), default_metrics);
}

#[test]
fn hvar_advance() {
    let font = VariableFont::new(&provider()).unwrap();
    let instance = font.instance(font.tuple(&[(tag::WGHT, 0.375)]).unwrap()).unwrap();
    let delta = instance.advance_width_delta(1, GlyphPoints::Empty);
    assert_close_within(500. + delta, 584., 1e-3);
    assert_eq!(instance.advance_width_delta(0, GlyphPoints::Empty), 0.);
}

#[test]
fn stat_round_trip() {
    let axis_values: [Vec<u8>; 4] = [
        // Format 1: wght 400, elidable
        Data::default()
            .u16(1)
            .u16(0)
            .u16(2)
            .u16(261)
            .fixed(400)
            .0,
        // Format 2: wght 100 in 100..=150
        Data::default()
            .u16(2)
            .u16(0)
            .u16(0)
            .u16(262)
            .fixed(100)
            .fixed(100)
            .fixed(150)
            .0,
        // Format 3: wght 400 linked to 700
        Data::default()
            .u16(3)
            .u16(0)
            .u16(0)
            .u16(263)
            .fixed(400)
            .fixed(700)
            .0,
        // Format 4: wght 700, ital 1
        Data::default()
            .u16(4)
            .u16(2)
            .u16(0)
            .u16(264)
            .u16(0)
            .fixed(700)
            .u16(1)
            .fixed(1)
            .0,
    ];

    let header_size = 20;
    let axes_size = 2 * 8;
    let mut data = Data::default()
        .u16(1)
        .u16(2)
        .u16(8)
        .u16(2)
        .u32(header_size)
        .u16(axis_values.len() as u16)
        .u32(header_size + axes_size)
        .u16(2)
        .u32(tag::WGHT)
        .u16(256)
        .u16(0)
        .bytes(b"ital")
        .u16(257)
        .u16(1);
    let mut offset = 2 * axis_values.len();
    for value in &axis_values {
        data = data.u16(offset as u16);
        offset += value.len();
    }
    for value in &axis_values {
        data = data.bytes(value);
    }
    let data = data.0;

    let stat = ReadScope::new(&data).read::<StatTable>().unwrap();
    assert_eq!(stat.design_axes.len(), 2);
    assert_eq!(stat.axis_values.len(), 4);
    assert_eq!(stat.fallback_name_id(), 2);
    assert_eq!(stat.axis_value_name_id(0, Fixed::from(400i16)), Some(261));
    assert_eq!(stat.axis_value_name_id(0, Fixed::from(120i16)), Some(262));
    assert_eq!(
        stat.combination_name_id(&[(0, Fixed::from(700i16)), (1, Fixed::from(1i16))]),
        Some(264)
    );

    let mut buffer = WriteBuffer::new();
    StatTable::write(&mut buffer, &stat).unwrap();
    assert_eq!(buffer.bytes(), data.as_slice());
}
