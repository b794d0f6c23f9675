//! `OS/2` table metrics.
//!
//! Only the fields that have a corresponding `MVAR` value tag are decoded.

use crate::binary::read::{ReadBinary, ReadCtxt};
use crate::error::ParseError;

/// Metric fields of the `OS/2` table
///
/// <https://docs.microsoft.com/en-us/typography/opentype/spec/os2>
#[derive(Debug, Clone, PartialEq)]
pub struct Os2Metrics {
    pub version: u16,
    pub y_subscript_x_size: i16,
    pub y_subscript_y_size: i16,
    pub y_subscript_x_offset: i16,
    pub y_subscript_y_offset: i16,
    pub y_superscript_x_size: i16,
    pub y_superscript_y_size: i16,
    pub y_superscript_x_offset: i16,
    pub y_superscript_y_offset: i16,
    pub y_strikeout_size: i16,
    pub y_strikeout_position: i16,

    // Some legacy TrueType fonts were built with a shortened version 0 OS/2 table that stops at
    // usLastCharIndex, so these are only present when the table is long enough.
    pub s_typo_ascender: Option<i16>,
    pub s_typo_descender: Option<i16>,
    pub s_typo_line_gap: Option<i16>,
    pub us_win_ascent: Option<u16>,
    pub us_win_descent: Option<u16>,

    /// Version 2 and later.
    pub sx_height: Option<i16>,
    /// Version 2 and later.
    pub s_cap_height: Option<i16>,
}

impl ReadBinary for Os2Metrics {
    type HostType<'a> = Self;

    fn read(ctxt: &mut ReadCtxt<'_>) -> Result<Self, ParseError> {
        let version = ctxt.read_u16be()?;
        let _x_avg_char_width = ctxt.read_i16be()?;
        let _us_weight_class = ctxt.read_u16be()?;
        let _us_width_class = ctxt.read_u16be()?;
        let _fs_type = ctxt.read_u16be()?;
        let y_subscript_x_size = ctxt.read_i16be()?;
        let y_subscript_y_size = ctxt.read_i16be()?;
        let y_subscript_x_offset = ctxt.read_i16be()?;
        let y_subscript_y_offset = ctxt.read_i16be()?;
        let y_superscript_x_size = ctxt.read_i16be()?;
        let y_superscript_y_size = ctxt.read_i16be()?;
        let y_superscript_x_offset = ctxt.read_i16be()?;
        let y_superscript_y_offset = ctxt.read_i16be()?;
        let y_strikeout_size = ctxt.read_i16be()?;
        let y_strikeout_position = ctxt.read_i16be()?;
        // sFamilyClass, panose, ulUnicodeRange1-4, achVendID, fsSelection, usFirstCharIndex,
        // usLastCharIndex
        let _skipped = ctxt.read_slice(2 + 10 + 4 * 4 + 4 + 2 + 2 + 2)?;

        let (s_typo_ascender, s_typo_descender, s_typo_line_gap, us_win_ascent, us_win_descent) =
            if ctxt.bytes_available() {
                (
                    Some(ctxt.read_i16be()?),
                    Some(ctxt.read_i16be()?),
                    Some(ctxt.read_i16be()?),
                    Some(ctxt.read_u16be()?),
                    Some(ctxt.read_u16be()?),
                )
            } else {
                (None, None, None, None, None)
            };

        let (sx_height, s_cap_height) = if version >= 2 {
            let _code_page_ranges = ctxt.read_slice(8)?;
            (Some(ctxt.read_i16be()?), Some(ctxt.read_i16be()?))
        } else {
            (None, None)
        };

        Ok(Os2Metrics {
            version,
            y_subscript_x_size,
            y_subscript_y_size,
            y_subscript_x_offset,
            y_subscript_y_offset,
            y_superscript_x_size,
            y_superscript_y_size,
            y_superscript_x_offset,
            y_superscript_y_offset,
            y_strikeout_size,
            y_strikeout_position,
            s_typo_ascender,
            s_typo_descender,
            s_typo_line_gap,
            us_win_ascent,
            us_win_descent,
            sx_height,
            s_cap_height,
        })
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::binary::read::ReadScope;
    use crate::tests::writer::{self, TtfType::*};

    /// Build an `OS/2` table of the given version with distinctive metric values.
    pub(crate) fn os2_data(version: u16, cap_height: i16, x_height: i16) -> Vec<u8> {
        let mut data = writer::convert(&[
            UInt16(version),
            Int16(500),
            UInt16(400),
            UInt16(5),
            UInt16(0),
            Int16(650),
            Int16(600),
            Int16(0),
            Int16(75),
            Int16(650),
            Int16(600),
            Int16(0),
            Int16(350),
            Int16(50),
            Int16(322),
            Int16(0),
        ]);
        data.extend_from_slice(&[0; 10]); // panose
        data.extend_from_slice(&[0; 16]); // ulUnicodeRange1-4
        data.extend_from_slice(b"NONE");
        data.extend(writer::convert(&[
            UInt16(0x40),
            UInt16(0x20),
            UInt16(0xFFFF),
            Int16(1069),
            Int16(-293),
            Int16(0),
            UInt16(1069),
            UInt16(293),
        ]));
        if version >= 1 {
            data.extend_from_slice(&[0; 8]);
        }
        if version >= 2 {
            data.extend(writer::convert(&[
                Int16(x_height),
                Int16(cap_height),
                UInt16(0),
                UInt16(32),
                UInt16(3),
            ]));
        }
        data
    }

    #[test]
    fn read_version_4() {
        let data = os2_data(4, 792, 628);
        let os2 = ReadScope::new(&data).read::<Os2Metrics>().unwrap();
        assert_eq!(os2.version, 4);
        assert_eq!(os2.y_strikeout_size, 50);
        assert_eq!(os2.y_strikeout_position, 322);
        assert_eq!(os2.s_typo_ascender, Some(1069));
        assert_eq!(os2.us_win_descent, Some(293));
        assert_eq!(os2.s_cap_height, Some(792));
        assert_eq!(os2.sx_height, Some(628));
    }

    #[test]
    fn read_version_1_has_no_cap_height() {
        let data = os2_data(1, 0, 0);
        let os2 = ReadScope::new(&data).read::<Os2Metrics>().unwrap();
        assert_eq!(os2.s_typo_line_gap, Some(0));
        assert_eq!(os2.s_cap_height, None);
        assert_eq!(os2.sx_height, None);
    }

    #[test]
    fn read_short_version_0() {
        let data = os2_data(0, 0, 0);
        let short = &data[..68];
        let os2 = ReadScope::new(short).read::<Os2Metrics>().unwrap();
        assert_eq!(os2.s_typo_ascender, None);
        assert_eq!(os2.us_win_ascent, None);
    }
}
