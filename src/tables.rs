//! OpenType font table parsing and writing.

pub mod os2;
pub mod variable_fonts;

use crate::binary::read::{ReadBinary, ReadCtxt, ReadFrom};
use crate::binary::write::{WriteBinary, WriteContext};
use crate::binary::{I16Be, I32Be};
use crate::error::{ParseError, WriteError};

use std::borrow::Cow;
use std::fmt;

/// 32-bit signed fixed-point number (16.16)
#[derive(Copy, Clone, Debug, Eq, PartialEq, Ord, PartialOrd, Hash, Default)]
pub struct Fixed(i32);

/// Source of font table data.
///
/// This is the seam to the font container: implementors locate tables in a font file (or any
/// other store) and return their bytes.
pub trait FontTableProvider {
    /// Return data for the specified table if present
    fn table_data<'a>(&'a self, tag: u32) -> Result<Option<Cow<'a, [u8]>>, ParseError>;

    fn has_table<'a>(&'a self, tag: u32) -> bool;

    fn read_table_data<'a>(&'a self, tag: u32) -> Result<Cow<'a, [u8]>, ParseError> {
        self.table_data(tag)?.ok_or(ParseError::MissingTable(tag))
    }
}

/// The F2DOT14 format consists of a signed, 2’s complement integer and an unsigned fraction.
///
/// To compute the actual value, take the integer and add the fraction. Normalized variation
/// coordinates and region axis coordinates are stored in this format, so comparisons between
/// them are done on the raw value to stay exact.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Ord, PartialOrd, Hash, Default)]
pub struct F2Dot14(i16);

/// `hhea` horizontal header table
///
/// <https://docs.microsoft.com/en-us/typography/opentype/spec/hhea>
#[derive(Debug, Clone, PartialEq, Hash)]
pub struct HheaTable {
    pub ascender: i16,
    pub descender: i16,
    pub line_gap: i16,
    pub caret_slope_rise: i16,
    pub caret_slope_run: i16,
    pub caret_offset: i16,
}

/// `post` header fields that carry metrics.
///
/// <https://docs.microsoft.com/en-us/typography/opentype/spec/post>
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct PostMetrics {
    pub italic_angle: Fixed,
    pub underline_position: i16,
    pub underline_thickness: i16,
}

impl ReadBinary for HheaTable {
    type HostType<'a> = Self;

    fn read(ctxt: &mut ReadCtxt<'_>) -> Result<Self, ParseError> {
        let major_version = ctxt.read_u16be()?;
        let _minor_version = ctxt.read_u16be()?;
        ctxt.check_version(major_version == 1)?;
        let ascender = ctxt.read_i16be()?;
        let descender = ctxt.read_i16be()?;
        let line_gap = ctxt.read_i16be()?;
        let _advance_width_max = ctxt.read_u16be()?;
        let _min_left_side_bearing = ctxt.read_i16be()?;
        let _min_right_side_bearing = ctxt.read_i16be()?;
        let _x_max_extent = ctxt.read_i16be()?;
        let caret_slope_rise = ctxt.read_i16be()?;
        let caret_slope_run = ctxt.read_i16be()?;
        let caret_offset = ctxt.read_i16be()?;
        let _reserved = ctxt.read_slice(4 * 2)?;
        let metric_data_format = ctxt.read_i16be()?;
        ctxt.check(metric_data_format == 0)?;
        let _num_h_metrics = ctxt.read_u16be()?;

        Ok(HheaTable {
            ascender,
            descender,
            line_gap,
            caret_slope_rise,
            caret_slope_run,
            caret_offset,
        })
    }
}

impl ReadBinary for PostMetrics {
    type HostType<'a> = Self;

    fn read(ctxt: &mut ReadCtxt<'_>) -> Result<Self, ParseError> {
        let _version = ctxt.read::<Fixed>()?;
        let italic_angle = ctxt.read::<Fixed>()?;
        let underline_position = ctxt.read_i16be()?;
        let underline_thickness = ctxt.read_i16be()?;

        Ok(PostMetrics {
            italic_angle,
            underline_position,
            underline_thickness,
        })
    }
}

impl ReadFrom for F2Dot14 {
    type ReadType = I16Be;

    fn read_from(value: i16) -> Self {
        F2Dot14(value)
    }
}

impl WriteBinary for F2Dot14 {
    type Output = ();

    fn write<C: WriteContext>(ctxt: &mut C, val: Self) -> Result<(), WriteError> {
        I16Be::write(ctxt, val.0)
    }
}

impl Fixed {
    pub const fn new(value: i32) -> Fixed {
        Fixed(value)
    }

    /// The raw 16.16 value.
    pub fn raw_value(self) -> i32 {
        self.0
    }
}

impl ReadFrom for Fixed {
    type ReadType = I32Be;

    fn read_from(value: i32) -> Self {
        Fixed(value)
    }
}

impl WriteBinary for Fixed {
    type Output = ();

    fn write<C: WriteContext>(ctxt: &mut C, val: Self) -> Result<(), WriteError> {
        I32Be::write(ctxt, val.0)
    }
}

impl From<Fixed> for f32 {
    fn from(value: Fixed) -> f32 {
        (f64::from(value.0) / 65536.0) as f32
    }
}

impl From<f32> for Fixed {
    fn from(value: f32) -> Fixed {
        Fixed((f64::from(value) * 65536.0).round() as i32)
    }
}

impl From<i16> for Fixed {
    fn from(value: i16) -> Fixed {
        Fixed(i32::from(value) << 16)
    }
}

impl F2Dot14 {
    pub const ZERO: F2Dot14 = F2Dot14(0);
    pub const ONE: F2Dot14 = F2Dot14(0x4000);
    pub const MINUS_ONE: F2Dot14 = F2Dot14(-0x4000);

    pub const fn new(value: i16) -> Self {
        F2Dot14(value)
    }

    /// The raw 2.14 value.
    pub fn raw_value(self) -> i16 {
        self.0
    }

    /// Clamp to the normalized coordinate range [-1, 1].
    pub fn clamp_normalized(self) -> F2Dot14 {
        self.clamp(F2Dot14::MINUS_ONE, F2Dot14::ONE)
    }
}

impl From<F2Dot14> for f32 {
    fn from(value: F2Dot14) -> Self {
        f32::from(value.0) / 16384.
    }
}

impl From<f32> for F2Dot14 {
    /// Convert to the nearest representable 2.14 value, saturating at the range limits.
    fn from(value: f32) -> Self {
        let raw = (value * 16384.).round().clamp(f32::from(i16::MIN), f32::from(i16::MAX));
        F2Dot14(raw as i16)
    }
}

impl fmt::Display for F2Dot14 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f32::from(*self).fmt(f)
    }
}

impl<T: FontTableProvider> FontTableProvider for Box<T> {
    fn table_data<'a>(&'a self, tag: u32) -> Result<Option<Cow<'a, [u8]>>, ParseError> {
        self.as_ref().table_data(tag)
    }

    fn has_table<'a>(&'a self, tag: u32) -> bool {
        self.as_ref().has_table(tag)
    }
}

impl<T: FontTableProvider> FontTableProvider for &T {
    fn table_data<'a>(&'a self, tag: u32) -> Result<Option<Cow<'a, [u8]>>, ParseError> {
        (*self).table_data(tag)
    }

    fn has_table<'a>(&'a self, tag: u32) -> bool {
        (*self).has_table(tag)
    }
}

#[cfg(test)]
mod tests {
    use super::{F2Dot14, Fixed, HheaTable, PostMetrics};
    use crate::binary::read::ReadScope;
    use crate::tests::assert_close;
    use crate::tests::writer::{self, TtfType::*};

    #[test]
    fn f32_from_f2dot14() {
        // Examples from https://docs.microsoft.com/en-us/typography/opentype/spec/otff#data-types
        assert_close(f32::from(F2Dot14(0x7fff)), 1.999939);
        assert_close(f32::from(F2Dot14(0x7000)), 1.75);
        assert_close(f32::from(F2Dot14(0x0001)), 0.000061);
        assert_close(f32::from(F2Dot14(0x0000)), 0.0);
        assert_close(f32::from(F2Dot14(0xffffu16 as i16)), -0.000061);
        assert_close(f32::from(F2Dot14(0x8000u16 as i16)), -2.0);
    }

    #[test]
    fn f2dot14_from_f32() {
        assert_eq!(F2Dot14::from(1.0), F2Dot14::ONE);
        assert_eq!(F2Dot14::from(-1.0), F2Dot14::MINUS_ONE);
        assert_eq!(F2Dot14::from(0.5), F2Dot14(0x2000));
        assert_eq!(F2Dot14::from(-0.25), F2Dot14(-0x1000));
        assert_eq!(F2Dot14::from(4.0), F2Dot14(i16::MAX));
    }

    #[test]
    fn f2dot14_ordering_is_signed() {
        assert!(F2Dot14::MINUS_ONE < F2Dot14::ZERO);
        assert!(F2Dot14::ZERO < F2Dot14::ONE);
        assert_eq!(F2Dot14::from(1.5).clamp_normalized(), F2Dot14::ONE);
    }

    #[test]
    fn f32_from_fixed() {
        assert_close(f32::from(Fixed(0x7fff_0000)), 32767.);
        assert_close(f32::from(Fixed(0x7000_0001)), 28672.0001);
        assert_close(f32::from(Fixed(0x0001_0000)), 1.0);
        assert_close(f32::from(Fixed(0x0000_0000)), 0.0);
        assert_close(
            f32::from(Fixed(i32::from_be_bytes([0xff; 4]))),
            -0.000015259,
        );
        assert_close(f32::from(Fixed(0x7fff_ffff)), 32768.0);
    }

    #[test]
    fn fixed_from_f32() {
        assert_eq!(Fixed::from(1.0), Fixed(0x0001_0000));
        assert_eq!(Fixed::from(-0.5), Fixed(-0x8000));
        assert_eq!(Fixed::from(100i16), Fixed(100 << 16));
    }

    #[test]
    fn read_hhea() {
        let data = writer::convert(&[
            UInt16(1),
            UInt16(0),
            Int16(996),
            Int16(-204),
            Int16(0),
            UInt16(1200),
            Int16(-50),
            Int16(-60),
            Int16(1100),
            Int16(1),
            Int16(0),
            Int16(0),
            Int16(0),
            Int16(0),
            Int16(0),
            Int16(0),
            Int16(0),
            UInt16(4),
        ]);
        let hhea = ReadScope::new(&data).read::<HheaTable>().unwrap();
        assert_eq!(hhea.ascender, 996);
        assert_eq!(hhea.descender, -204);
        assert_eq!(hhea.line_gap, 0);
        assert_eq!(hhea.caret_slope_rise, 1);
        assert_eq!(hhea.caret_slope_run, 0);
    }

    #[test]
    fn read_post_metrics() {
        let data = writer::convert(&[
            UInt32(0x0003_0000),
            Int32(-12 << 16),
            Int16(-100),
            Int16(50),
        ]);
        let post = ReadScope::new(&data).read::<PostMetrics>().unwrap();
        assert_eq!(post.italic_angle, Fixed::from(-12i16));
        assert_eq!(post.underline_position, -100);
        assert_eq!(post.underline_thickness, 50);
    }
}
