//! Font-wide metrics and their variation through `MVAR`.

use crate::binary::read::ReadScope;
use crate::error::ParseError;
use crate::tables::os2::Os2Metrics;
use crate::tables::variable_fonts::mvar::MvarTable;
use crate::tables::{F2Dot14, FontTableProvider, HheaTable, PostMetrics};
use crate::tag;

/// Font-wide metrics in font design units.
///
/// Values are `f32` so that varied metrics keep their fractional part.
#[derive(Debug, Copy, Clone, PartialEq, Default)]
pub struct FontMetrics {
    /// Distance from the baseline to the top of the line (`hhea.ascender`).
    pub ascent: f32,
    /// Distance from the baseline to the bottom of the line, usually negative
    /// (`hhea.descender`).
    pub descent: f32,
    /// Additional space between lines (`hhea.lineGap`).
    pub line_gap: f32,
    /// Height of capital letters (`OS/2.sCapHeight`).
    pub cap_height: f32,
    /// Height of lowercase letters (`OS/2.sxHeight`).
    pub x_height: f32,
    pub underline_position: f32,
    pub underline_thickness: f32,
    pub strikeout_position: f32,
    pub strikeout_size: f32,
    /// Rise of the caret slope, 1 for vertical carets (`hhea.caretSlopeRise`).
    pub caret_slope_rise: f32,
    pub caret_slope_run: f32,
    /// Horizontal shift of the caret for slanted glyphs (`hhea.caretOffset`).
    pub caret_offset: f32,
}

impl FontMetrics {
    /// Read the default metrics of a font.
    ///
    /// `hhea` is required. When `OS/2` or `post` are absent the metrics they supply are zero.
    pub fn read<F: FontTableProvider>(provider: &F) -> Result<FontMetrics, ParseError> {
        let hhea_data = provider.read_table_data(tag::HHEA)?;
        let hhea = ReadScope::new(&hhea_data).read::<HheaTable>()?;
        let os2 = match provider.table_data(tag::OS_2)? {
            Some(data) => Some(ReadScope::new(&data).read::<Os2Metrics>()?),
            None => None,
        };
        let post = match provider.table_data(tag::POST)? {
            Some(data) => Some(ReadScope::new(&data).read::<PostMetrics>()?),
            None => None,
        };
        Ok(FontMetrics::new(&hhea, os2.as_ref(), post.as_ref()))
    }

    pub fn new(hhea: &HheaTable, os2: Option<&Os2Metrics>, post: Option<&PostMetrics>) -> Self {
        let os2_value = |f: fn(&Os2Metrics) -> Option<i16>| {
            os2.and_then(f).map_or(0., f32::from)
        };
        FontMetrics {
            ascent: f32::from(hhea.ascender),
            descent: f32::from(hhea.descender),
            line_gap: f32::from(hhea.line_gap),
            cap_height: os2_value(|os2| os2.s_cap_height),
            x_height: os2_value(|os2| os2.sx_height),
            underline_position: post.map_or(0., |post| f32::from(post.underline_position)),
            underline_thickness: post.map_or(0., |post| f32::from(post.underline_thickness)),
            strikeout_position: os2_value(|os2| Some(os2.y_strikeout_position)),
            strikeout_size: os2_value(|os2| Some(os2.y_strikeout_size)),
            caret_slope_rise: f32::from(hhea.caret_slope_rise),
            caret_slope_run: f32::from(hhea.caret_slope_run),
            caret_offset: f32::from(hhea.caret_offset),
        }
    }

    /// The distance between consecutive baselines.
    pub fn line_height(&self) -> f32 {
        self.ascent - self.descent + self.line_gap
    }

    /// Apply the `MVAR` deltas for `instance` to these metrics.
    pub fn apply_mvar(&self, mvar: &MvarTable<'_>, instance: &[F2Dot14]) -> FontMetrics {
        self.apply_deltas(|value_tag| mvar.metric_delta(value_tag, instance))
    }

    /// Add the delta for each metric's `MVAR` value tag, as returned by `delta`.
    pub fn apply_deltas(&self, delta: impl Fn(u32) -> f32) -> FontMetrics {
        FontMetrics {
            ascent: self.ascent + delta(tag::HASC),
            descent: self.descent + delta(tag::HDSC),
            line_gap: self.line_gap + delta(tag::HLGP),
            cap_height: self.cap_height + delta(tag::CPHT),
            x_height: self.x_height + delta(tag::XHGT),
            underline_position: self.underline_position + delta(tag::UNDO),
            underline_thickness: self.underline_thickness + delta(tag::UNDS),
            strikeout_position: self.strikeout_position + delta(tag::STRO),
            strikeout_size: self.strikeout_size + delta(tag::STRS),
            caret_slope_rise: self.caret_slope_rise + delta(tag::HCRS),
            caret_slope_run: self.caret_slope_run + delta(tag::HCRN),
            caret_offset: self.caret_offset + delta(tag::HCOF),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tables::os2::tests::os2_data;
    use crate::tables::variable_fonts::mvar::tests::mvar_data;
    use crate::tables::variable_fonts::tests::ivs_data;
    use crate::tables::variable_fonts::OwnedTuple;
    use crate::tests::assert_close;

    fn hhea() -> HheaTable {
        HheaTable {
            ascender: 996,
            descender: -204,
            line_gap: 0,
            caret_slope_rise: 1,
            caret_slope_run: 0,
            caret_offset: 0,
        }
    }

    #[test]
    fn default_metrics() {
        let os2_data = os2_data(4, 792, 628);
        let os2 = ReadScope::new(&os2_data).read::<Os2Metrics>().unwrap();
        let metrics = FontMetrics::new(&hhea(), Some(&os2), None);
        assert_eq!(metrics.ascent, 996.);
        assert_eq!(metrics.descent, -204.);
        assert_eq!(metrics.cap_height, 792.);
        assert_eq!(metrics.x_height, 628.);
        assert_eq!(metrics.strikeout_position, 322.);
        assert_eq!(metrics.underline_position, 0.);
        assert_eq!(metrics.line_height(), 1200.);
        assert_eq!(metrics.caret_slope_rise, 1.);
    }

    #[test]
    fn old_os2_has_no_cap_height() {
        let os2_data = os2_data(1, 792, 628);
        let os2 = ReadScope::new(&os2_data).read::<Os2Metrics>().unwrap();
        let metrics = FontMetrics::new(&hhea(), Some(&os2), None);
        assert_eq!(metrics.cap_height, 0.);
        assert_eq!(metrics.x_height, 0.);
    }

    #[test]
    fn apply_mvar() {
        let ivs = ivs_data(&[(0., 1., 1.)], &[(&[0], &[&[100], &[-40], &[8]])]);
        let data = mvar_data(
            &[
                (tag::CPHT, 0, 0),
                (tag::HASC, 0, 0),
                (tag::HCRN, 0, 2),
                (tag::HDSC, 0, 1),
                (tag::UNDS, 0, 2),
            ],
            &ivs,
        );
        let mvar = ReadScope::new(&data).read::<MvarTable<'_>>().unwrap();
        let metrics = FontMetrics {
            ascent: 800.,
            descent: -200.,
            line_gap: 90.,
            cap_height: 700.,
            x_height: 500.,
            underline_position: -100.,
            underline_thickness: 50.,
            strikeout_position: 300.,
            strikeout_size: 50.,
            caret_slope_rise: 1000.,
            caret_slope_run: 0.,
            caret_offset: 0.,
        };
        let varied = metrics.apply_mvar(&mvar, &OwnedTuple::from_f32(&[0.25]));
        assert_close(varied.ascent, 825.);
        assert_close(varied.descent, -210.);
        assert_close(varied.cap_height, 725.);
        assert_close(varied.underline_thickness, 52.);
        assert_eq!(varied.line_gap, 90.);
        assert_eq!(varied.x_height, 500.);
        assert_eq!(varied.strikeout_position, 300.);
        assert_close(varied.line_height(), 1125.);
        assert_close(varied.caret_slope_run, 2.);
        assert_eq!(varied.caret_slope_rise, 1000.);
    }
}
