//! Variable font design instances.
//!
//! A [VariableFont] decodes the variation tables of a font once. An [Instance] binds it to one
//! normalized location in the design space and answers metric, advance, outline, and CFF2 blend
//! queries for that location.

#![deny(missing_docs)]

use std::borrow::Cow;
use std::fmt;

use log::{debug, warn};
use once_cell::race::OnceBox;
use ouroboros::self_referencing;
use rustc_hash::FxHashMap;

use crate::binary::read::ReadScope;
use crate::cff::cff2::{BlendContext, CFF2};
use crate::cff::CFFError;
use crate::error::ParseError;
use crate::gdef::GdefTable;
use crate::metrics::FontMetrics;
use crate::tables::variable_fonts::fvar::{FvarTable, VariationAxisRecord};
use crate::tables::variable_fonts::gvar::{GlyphDeltas, GlyphPoints, GvarTable, PHANTOM_POINT_COUNT};
use crate::tables::variable_fonts::hvar::{HvarTable, MetricsDirection, VvarTable};
use crate::tables::variable_fonts::mvar::MvarTable;
use crate::tables::variable_fonts::{DeltaSetIndexMapEntry, OwnedTuple};
use crate::tables::FontTableProvider;
use crate::tag::{self, DisplayTag};

/// Error type returned when opening a variable font or creating an instance of it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VariationError {
    /// An error occurred reading or parsing data.
    Parse(ParseError),
    /// The font is not a variable font.
    NotVariableFont,
    /// The number of coordinates does not match the number of axes in `fvar`.
    AxisCountMismatch,
    /// An axis tag that is not present in `fvar` was supplied.
    UnknownAxis(u32),
}

/// The raw data of the tables used for variations.
struct TableData {
    fvar: Box<[u8]>,
    gvar: Option<Box<[u8]>>,
    hvar: Option<Box<[u8]>>,
    vvar: Option<Box<[u8]>>,
    mvar: Option<Box<[u8]>>,
    gdef: Option<Box<[u8]>>,
    cff2: Option<Box<[u8]>>,
}

struct Tables<'a> {
    fvar: FvarTable<'a>,
    gvar: Option<GvarTable<'a>>,
    hvar: Option<HvarTable<'a>>,
    vvar: Option<VvarTable<'a>>,
    mvar: Option<MvarTable<'a>>,
    gdef: Option<GdefTable<'a>>,
    cff2: Option<CFF2<'a>>,
}

#[self_referencing]
struct OwnedTables {
    data: TableData,
    #[borrows(data)]
    #[not_covariant]
    tables: Tables<'this>,
}

/// The decoded variation tables of a font.
///
/// Only `fvar` is required. The other tables are optional and a table that fails to decode is
/// logged and treated as absent.
pub struct VariableFont {
    tables: OwnedTables,
}

/// A variable font bound to one location in its design space.
///
/// Results are computed on first use and cached. An `Instance` is `Send + Sync` so it can be
/// shared between threads. If two threads compute the same value at once one result is kept.
pub struct Instance<'f> {
    font: &'f VariableFont,
    tuple: OwnedTuple,
    metric_deltas: OnceBox<FxHashMap<u32, f32>>,
    glyph_deltas: Box<[OnceBox<GlyphDeltas>]>,
    blend_context: OnceBox<BlendContext>,
}

impl VariableFont {
    /// Read the variation tables of the font supplied by `provider`.
    pub fn new<F: FontTableProvider>(provider: &F) -> Result<VariableFont, VariationError> {
        let fvar = provider
            .table_data(tag::FVAR)?
            .ok_or(VariationError::NotVariableFont)?;
        let table = |table_tag| -> Result<Option<Box<[u8]>>, ParseError> {
            Ok(provider.table_data(table_tag)?.map(Box::from))
        };
        let data = TableData {
            fvar: Box::from(fvar),
            gvar: table(tag::GVAR)?,
            hvar: table(tag::HVAR)?,
            vvar: table(tag::VVAR)?,
            mvar: table(tag::MVAR)?,
            gdef: table(tag::GDEF)?,
            cff2: table(tag::CFF2)?,
        };
        let tables = OwnedTablesTryBuilder {
            data,
            tables_builder: |data| Tables::read(data),
        }
        .try_build()?;
        Ok(VariableFont { tables })
    }

    /// The number of variation axes.
    pub fn axis_count(&self) -> u16 {
        self.tables.with_tables(|tables| tables.fvar.axis_count())
    }

    /// The variation axes in the order used by tuples.
    pub fn axes(&self) -> Vec<VariationAxisRecord> {
        self.tables
            .with_tables(|tables| tables.fvar.axes().collect())
    }

    /// Build a tuple from normalized (axis tag, value) pairs.
    ///
    /// Axes that are not mentioned are at their default (0). Values are clamped to [-1, 1].
    pub fn tuple(&self, values: &[(u32, f32)]) -> Result<OwnedTuple, VariationError> {
        self.tables.with_tables(|tables| {
            let mut coordinates = vec![0.; usize::from(tables.fvar.axis_count())];
            for &(axis_tag, value) in values {
                let index = tables
                    .fvar
                    .axis_index(axis_tag)
                    .ok_or(VariationError::UnknownAxis(axis_tag))?;
                coordinates[index] = value;
            }
            Ok(OwnedTuple::from_f32(&coordinates))
        })
    }

    /// Bind this font to the location `tuple`.
    pub fn instance(&self, tuple: OwnedTuple) -> Result<Instance<'_>, VariationError> {
        if tuple.len() != usize::from(self.axis_count()) {
            return Err(VariationError::AxisCountMismatch);
        }
        let glyph_count = self.tables.with_tables(|tables| {
            tables
                .gvar
                .as_ref()
                .map_or(0, |gvar| usize::from(gvar.glyph_count()))
        });
        Ok(Instance {
            font: self,
            tuple,
            metric_deltas: OnceBox::new(),
            glyph_deltas: (0..glyph_count).map(|_| OnceBox::new()).collect(),
            blend_context: OnceBox::new(),
        })
    }

    /// Returns `true` if the font has CFF2 outlines.
    pub fn is_cff2(&self) -> bool {
        self.tables.with_tables(|tables| tables.cff2.is_some())
    }
}

impl<'a> Tables<'a> {
    fn read(data: &'a TableData) -> Result<Tables<'a>, ParseError> {
        let fvar = ReadScope::new(&data.fvar).read::<FvarTable<'_>>()?;
        let gvar = read_optional(tag::GVAR, data.gvar.as_deref(), |scope| {
            scope.read::<GvarTable<'_>>()
        });
        if let Some(gvar) = &gvar {
            if gvar.axis_count() != fvar.axis_count() {
                warn!(
                    "gvar has {} axes but fvar has {}",
                    gvar.axis_count(),
                    fvar.axis_count()
                );
            }
        }
        let hvar = read_optional(tag::HVAR, data.hvar.as_deref(), |scope| {
            scope.read_dep::<HvarTable<'_>>(MetricsDirection::Horizontal)
        });
        let vvar = read_optional(tag::VVAR, data.vvar.as_deref(), |scope| {
            scope.read_dep::<VvarTable<'_>>(MetricsDirection::Vertical)
        });
        let mvar = read_optional(tag::MVAR, data.mvar.as_deref(), |scope| {
            scope.read::<MvarTable<'_>>()
        });
        let gdef = read_optional(tag::GDEF, data.gdef.as_deref(), |scope| {
            scope.read::<GdefTable<'_>>()
        });
        let cff2 = read_optional(tag::CFF2, data.cff2.as_deref(), |scope| {
            scope.read::<CFF2<'_>>()
        });

        Ok(Tables {
            fvar,
            gvar,
            hvar,
            vvar,
            mvar,
            gdef,
            cff2,
        })
    }
}

fn read_optional<'a, T>(
    table_tag: u32,
    data: Option<&'a [u8]>,
    read: impl FnOnce(ReadScope<'a>) -> Result<T, ParseError>,
) -> Option<T> {
    let data = data?;
    match read(ReadScope::new(data)) {
        Ok(table) => Some(table),
        Err(err) => {
            warn!("ignoring {} table: {}", DisplayTag(table_tag), err);
            None
        }
    }
}

impl<'f> Instance<'f> {
    /// The location of this instance.
    pub fn tuple(&self) -> &OwnedTuple {
        &self.tuple
    }

    /// The `MVAR` delta for the metric identified by `value_tag`.
    ///
    /// Zero for metrics that do not vary.
    pub fn metric_delta(&self, value_tag: u32) -> f32 {
        self.metric_deltas()
            .get(&value_tag)
            .copied()
            .unwrap_or(0.)
    }

    /// Apply the `MVAR` deltas of this instance to `metrics`.
    pub fn metrics(&self, metrics: &FontMetrics) -> FontMetrics {
        metrics.apply_deltas(|value_tag| self.metric_delta(value_tag))
    }

    fn metric_deltas(&self) -> &FxHashMap<u32, f32> {
        self.metric_deltas.get_or_init(|| {
            let deltas: FxHashMap<u32, f32> = self.font.tables.with_tables(|tables| {
                tables
                    .mvar
                    .as_ref()
                    .map(|mvar| {
                        mvar.value_records()
                            .map(|record| {
                                (record.value_tag, mvar.metric_delta(record.value_tag, &self.tuple))
                            })
                            .collect()
                    })
                    .unwrap_or_default()
            });
            Box::new(deltas)
        })
    }

    /// The change to the advance width of `glyph_id`.
    ///
    /// Uses `HVAR` when present, otherwise the phantom point deltas from `gvar`, in which case
    /// `points` must describe the glyph's outline.
    pub fn advance_width_delta(&self, glyph_id: u16, points: GlyphPoints<'_>) -> f32 {
        let hvar_delta = self.font.tables.with_tables(|tables| {
            tables
                .hvar
                .as_ref()
                .map(|hvar| hvar.advance_delta(&self.tuple, glyph_id))
        });
        match hvar_delta {
            Some(Ok(delta)) => delta,
            Some(Err(err)) => {
                debug!("HVAR: no advance delta for glyph {}: {}", glyph_id, err);
                0.
            }
            None => self.glyph_deltas(glyph_id, points).advance_width_delta(),
        }
    }

    /// The change to the advance height of `glyph_id`.
    ///
    /// Uses `VVAR` when present, otherwise the phantom point deltas from `gvar`.
    pub fn vertical_advance_delta(&self, glyph_id: u16, points: GlyphPoints<'_>) -> f32 {
        let vvar_delta = self.font.tables.with_tables(|tables| {
            tables
                .vvar
                .as_ref()
                .map(|vvar| vvar.advance_delta(&self.tuple, glyph_id))
        });
        match vvar_delta {
            Some(Ok(delta)) => delta,
            Some(Err(err)) => {
                debug!("VVAR: no advance delta for glyph {}: {}", glyph_id, err);
                0.
            }
            None => self.glyph_deltas(glyph_id, points).advance_height_delta(),
        }
    }

    /// The deltas for the points of `glyph_id`, including the four phantom points.
    ///
    /// The result is cached per glyph so `points` must be the same each time a glyph is
    /// queried. If the glyph's variation data is invalid it is discarded and the deltas are
    /// zero.
    pub fn glyph_deltas(&self, glyph_id: u16, points: GlyphPoints<'_>) -> Cow<'_, GlyphDeltas> {
        match self.glyph_deltas.get(usize::from(glyph_id)) {
            Some(cached) => Cow::Borrowed(
                cached.get_or_init(|| Box::new(self.calculate_glyph_deltas(glyph_id, points))),
            ),
            None => Cow::Owned(GlyphDeltas::zero(points.len() + PHANTOM_POINT_COUNT)),
        }
    }

    fn calculate_glyph_deltas(&self, glyph_id: u16, points: GlyphPoints<'_>) -> GlyphDeltas {
        let deltas = self.font.tables.with_tables(|tables| {
            tables
                .gvar
                .as_ref()
                .map(|gvar| gvar.glyph_deltas(glyph_id, points, &self.tuple))
        });
        match deltas {
            Some(Ok(deltas)) => deltas,
            Some(Err(err)) => {
                warn!(
                    "gvar: discarding variation data of glyph {}: {}",
                    glyph_id, err
                );
                GlyphDeltas::zero(points.len() + PHANTOM_POINT_COUNT)
            }
            None => GlyphDeltas::zero(points.len() + PHANTOM_POINT_COUNT),
        }
    }

    /// The CFF2 blend scalars for this instance.
    pub fn blend_context(&self) -> Result<&BlendContext, CFFError> {
        self.blend_context.get_or_try_init(|| {
            self.font.tables.with_tables(|tables| {
                tables
                    .cff2
                    .as_ref()
                    .ok_or(CFFError::MissingVariationStore)?
                    .blend_context(&self.tuple)
                    .map(Box::new)
            })
        })
    }

    /// The CharString of `glyph_id` with its `blend` operators evaluated for this instance.
    pub fn instance_char_string(&self, glyph_id: u16) -> Result<Vec<u8>, CFFError> {
        let context = self.blend_context()?;
        self.font.tables.with_tables(|tables| {
            tables
                .cff2
                .as_ref()
                .ok_or(CFFError::MissingVariationStore)?
                .instance_char_string(context, glyph_id)
        })
    }

    /// The adjustment for a `GDEF` variation index, as used by anchors and value records.
    ///
    /// Zero when the font has no `GDEF` variation store or the index is out of range.
    pub fn gdef_adjustment(&self, entry: DeltaSetIndexMapEntry) -> f32 {
        self.font.tables.with_tables(|tables| {
            tables
                .gdef
                .as_ref()
                .map_or(0., |gdef| gdef.adjustment(entry, &self.tuple))
        })
    }
}

impl From<ParseError> for VariationError {
    fn from(err: ParseError) -> VariationError {
        VariationError::Parse(err)
    }
}

impl fmt::Display for VariationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VariationError::Parse(err) => write!(f, "variation: parse error: {}", err),
            VariationError::NotVariableFont => write!(f, "variation: not a variable font"),
            VariationError::AxisCountMismatch => {
                write!(f, "variation: tuple does not match the number of axes")
            }
            VariationError::UnknownAxis(axis_tag) => {
                write!(f, "variation: unknown axis '{}'", DisplayTag(*axis_tag))
            }
        }
    }
}

impl std::error::Error for VariationError {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gdef::tests::gdef_data;
    use crate::tables::variable_fonts::fvar::tests::fvar_data;
    use crate::tables::variable_fonts::gvar::tests::{all_points_glyph_data, gvar_data};
    use crate::tables::variable_fonts::gvar::Point;
    use crate::tables::variable_fonts::hvar::tests::hvar_data;
    use crate::tables::variable_fonts::mvar::tests::mvar_data;
    use crate::tables::variable_fonts::tests::ivs_data;
    use crate::tables::F2Dot14;
    use crate::tests::assert_close;

    use std::collections::HashMap;

    struct TestProvider(HashMap<u32, Vec<u8>>);

    impl FontTableProvider for TestProvider {
        fn table_data(&self, tag: u32) -> Result<Option<Cow<'_, [u8]>>, ParseError> {
            Ok(self.0.get(&tag).map(|data| Cow::Borrowed(data.as_slice())))
        }

        fn has_table(&self, tag: u32) -> bool {
            self.0.contains_key(&tag)
        }
    }

    fn provider(tables: Vec<(u32, Vec<u8>)>) -> TestProvider {
        TestProvider(tables.into_iter().collect())
    }

    fn weight_axis() -> (u32, Vec<u8>) {
        (tag::FVAR, fvar_data(&[(tag::WGHT, 100, 400, 900)]))
    }

    #[test]
    fn not_variable_font() {
        let provider = provider(vec![(tag::HVAR, hvar_data(&[1], None, None, None))]);
        assert!(matches!(
            VariableFont::new(&provider),
            Err(VariationError::NotVariableFont)
        ));
    }

    #[test]
    fn build_tuple() {
        let provider = provider(vec![(
            tag::FVAR,
            fvar_data(&[(tag::WGHT, 100, 400, 900), (tag::WDTH, 62, 100, 100)]),
        )]);
        let font = VariableFont::new(&provider).unwrap();
        assert_eq!(font.axis_count(), 2);
        assert_eq!(font.axes()[1].axis_tag, tag::WDTH);

        let tuple = font.tuple(&[(tag::WDTH, -0.5)]).unwrap();
        assert_eq!(&*tuple, &[F2Dot14::from(0.), F2Dot14::from(-0.5)]);
        let tuple = font.tuple(&[(tag::WGHT, 3.0)]).unwrap();
        assert_eq!(tuple[0], F2Dot14::ONE);
        let ital = tag::from_string("ital").unwrap();
        assert_eq!(
            font.tuple(&[(ital, 1.0)]),
            Err(VariationError::UnknownAxis(ital))
        );
        assert!(matches!(
            font.instance(OwnedTuple::from_f32(&[0.5])),
            Err(VariationError::AxisCountMismatch)
        ));
    }

    #[test]
    fn invalid_optional_table_is_ignored() {
        let provider = provider(vec![weight_axis(), (tag::MVAR, vec![0, 1, 0])]);
        let font = VariableFont::new(&provider).unwrap();
        let instance = font.instance(OwnedTuple::from_f32(&[1.0])).unwrap();
        assert_eq!(instance.metric_delta(tag::HASC), 0.);
    }

    #[test]
    fn metric_deltas() {
        let ivs = ivs_data(&[(0., 1., 1.)], &[(&[0], &[&[100], &[-40]])]);
        let provider = provider(vec![
            weight_axis(),
            (tag::MVAR, mvar_data(&[(tag::HASC, 0, 0), (tag::HDSC, 0, 1)], &ivs)),
        ]);
        let font = VariableFont::new(&provider).unwrap();
        let instance = font.instance(font.tuple(&[(tag::WGHT, 0.5)]).unwrap()).unwrap();
        assert_close(instance.metric_delta(tag::HASC), 50.);
        assert_close(instance.metric_delta(tag::HDSC), -20.);
        assert_eq!(instance.metric_delta(tag::XHGT), 0.);

        let metrics = instance.metrics(&FontMetrics {
            ascent: 800.,
            descent: -200.,
            ..FontMetrics::default()
        });
        assert_close(metrics.ascent, 850.);
        assert_close(metrics.line_height(), 1070.);
    }

    #[test]
    fn advance_from_hvar() {
        let provider = provider(vec![
            weight_axis(),
            (tag::HVAR, hvar_data(&[0, 224], Some(&[0, 1]), None, None)),
        ]);
        let font = VariableFont::new(&provider).unwrap();
        let instance = font.instance(OwnedTuple::from_f32(&[0.375])).unwrap();
        assert_close(instance.advance_width_delta(1, GlyphPoints::Empty), 84.);
        // Glyphs beyond the end of the map use its last entry
        assert_close(instance.advance_width_delta(7, GlyphPoints::Empty), 84.);
        assert_eq!(instance.vertical_advance_delta(1, GlyphPoints::Empty), 0.);
    }

    #[test]
    fn advance_from_phantom_points() {
        let provider = provider(vec![
            weight_axis(),
            (tag::GVAR, gvar_data(&[], &[all_points_glyph_data(4)])),
        ]);
        let font = VariableFont::new(&provider).unwrap();
        let instance = font.instance(OwnedTuple::from_f32(&[-1.0])).unwrap();
        // Phantom point x deltas are 1, 2, 3, 4
        assert_close(instance.advance_width_delta(0, GlyphPoints::Empty), 1.);
        let deltas = instance.glyph_deltas(0, GlyphPoints::Empty);
        assert!(matches!(deltas, Cow::Borrowed(_)));
        assert_eq!(deltas.point_deltas().len(), 0);

        // No variation data for glyphs past the end of gvar
        let deltas = instance.glyph_deltas(5, GlyphPoints::Empty);
        assert_eq!(deltas.advance_width_delta(), 0.);
    }

    #[test]
    fn invalid_glyph_data_is_discarded() {
        // Deltas for 3 points but the glyph has 7 including phantom points
        let provider = provider(vec![
            weight_axis(),
            (tag::GVAR, gvar_data(&[], &[all_points_glyph_data(3)])),
        ]);
        let font = VariableFont::new(&provider).unwrap();
        let instance = font.instance(OwnedTuple::from_f32(&[-1.0])).unwrap();
        let points = [Point(0, 0), Point(10, 0), Point(10, 10)];
        let deltas = instance.glyph_deltas(
            0,
            GlyphPoints::Simple {
                points: &points,
                end_points: &[2],
            },
        );
        assert!(deltas
            .point_deltas()
            .iter()
            .all(|delta| delta.x() == 0. && delta.y() == 0.));
        assert_eq!(deltas.point_deltas().len(), 3);
    }

    #[test]
    fn gdef_adjustment() {
        let ivs = ivs_data(&[(0., 1., 1.)], &[(&[0], &[&[-30]])]);
        let provider = provider(vec![weight_axis(), (tag::GDEF, gdef_data(&ivs))]);
        let font = VariableFont::new(&provider).unwrap();
        let instance = font.instance(OwnedTuple::from_f32(&[1.0])).unwrap();
        let entry = DeltaSetIndexMapEntry {
            outer_index: 0,
            inner_index: 0,
        };
        assert_close(instance.gdef_adjustment(entry), -30.);
        assert!(matches!(
            instance.blend_context(),
            Err(CFFError::MissingVariationStore)
        ));
    }

    #[test]
    fn instance_is_shared_between_threads() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<Instance<'_>>();

        let ivs = ivs_data(&[(0., 1., 1.)], &[(&[0], &[&[100]])]);
        let provider = provider(vec![
            weight_axis(),
            (tag::MVAR, mvar_data(&[(tag::CPHT, 0, 0)], &ivs)),
            (tag::GVAR, gvar_data(&[], &[all_points_glyph_data(4)])),
        ]);
        let font = VariableFont::new(&provider).unwrap();
        let instance = font.instance(OwnedTuple::from_f32(&[-1.0])).unwrap();
        std::thread::scope(|scope| {
            for _ in 0..4 {
                scope.spawn(|| {
                    assert_eq!(instance.metric_delta(tag::CPHT), 0.);
                    assert_close(instance.advance_width_delta(0, GlyphPoints::Empty), 1.);
                });
            }
        });
    }
}
