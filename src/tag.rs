use crate::error::ParseError;
use std::fmt;

/// Generate a 4-byte font table tag from byte string
///
/// Example:
///
/// ```ignore
/// assert_eq!(tag!(b"gvar"), 0x67766172);
/// ```
macro_rules! tag {
    ($w:expr) => {
        tag(*$w)
    };
}

#[derive(PartialEq, Eq, Clone, Copy)]
pub struct DisplayTag(pub u32);

const fn tag(chars: [u8; 4]) -> u32 {
    ((chars[3] as u32) << 0)
        | ((chars[2] as u32) << 8)
        | ((chars[1] as u32) << 16)
        | ((chars[0] as u32) << 24)
}

pub fn from_string(s: &str) -> Result<u32, ParseError> {
    if s.len() > 4 {
        return Err(ParseError::BadValue);
    }

    let mut tag: u32 = 0;
    let mut count = 0;

    for c in s.chars() {
        if !c.is_ascii() || c.is_ascii_control() {
            return Err(ParseError::BadValue);
        }

        tag = (tag << 8) | (c as u32);
        count += 1;
    }

    while count < 4 {
        tag = (tag << 8) | (' ' as u32);
        count += 1;
    }

    Ok(tag)
}

impl fmt::Display for DisplayTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let tag = self.0;
        let mut s = String::with_capacity(4);
        s.push(char::from((tag >> 24) as u8));
        s.push(char::from(((tag >> 16) & 255) as u8));
        s.push(char::from(((tag >> 8) & 255) as u8));
        s.push(char::from((tag & 255) as u8));
        if s.chars().any(|c| !c.is_ascii() || c.is_ascii_control()) {
            write!(f, "0x{:08x}", tag)
        } else {
            s.fmt(f)
        }
    }
}

impl fmt::Debug for DisplayTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.to_string().fmt(f)
    }
}

/// `CFF2` table tag
pub const CFF2: u32 = tag!(b"CFF2");
/// `fvar` table tag
pub const FVAR: u32 = tag!(b"fvar");
/// `GDEF` table tag
pub const GDEF: u32 = tag!(b"GDEF");
/// `gvar` table tag
pub const GVAR: u32 = tag!(b"gvar");
/// `hhea` table tag
pub const HHEA: u32 = tag!(b"hhea");
/// `HVAR` table tag
pub const HVAR: u32 = tag!(b"HVAR");
/// `MVAR` table tag
pub const MVAR: u32 = tag!(b"MVAR");
/// `OS/2` table tag
pub const OS_2: u32 = tag!(b"OS/2");
/// `post` table tag
pub const POST: u32 = tag!(b"post");
/// `STAT` table tag
pub const STAT: u32 = tag!(b"STAT");
/// `VVAR` table tag
pub const VVAR: u32 = tag!(b"VVAR");

// Axis tags of the registered design axes.
pub const ITAL: u32 = tag!(b"ital");
pub const OPSZ: u32 = tag!(b"opsz");
pub const SLNT: u32 = tag!(b"slnt");
pub const WDTH: u32 = tag!(b"wdth");
pub const WGHT: u32 = tag!(b"wght");

// `MVAR` value tags.
//
// <https://learn.microsoft.com/en-us/typography/opentype/spec/mvar#value-tags>

/// Horizontal ascender, `OS/2.sTypoAscender`
pub const HASC: u32 = tag!(b"hasc");
/// Horizontal descender, `OS/2.sTypoDescender`
pub const HDSC: u32 = tag!(b"hdsc");
/// Horizontal line gap, `OS/2.sTypoLineGap`
pub const HLGP: u32 = tag!(b"hlgp");
/// Horizontal clipping ascent, `OS/2.usWinAscent`
pub const HCLA: u32 = tag!(b"hcla");
/// Horizontal clipping descent, `OS/2.usWinDescent`
pub const HCLD: u32 = tag!(b"hcld");
/// Vertical ascender, `vhea.ascent`
pub const VASC: u32 = tag!(b"vasc");
/// Vertical descender, `vhea.descent`
pub const VDSC: u32 = tag!(b"vdsc");
/// Vertical line gap, `vhea.lineGap`
pub const VLGP: u32 = tag!(b"vlgp");
/// Horizontal caret rise, `hhea.caretSlopeRise`
pub const HCRS: u32 = tag!(b"hcrs");
/// Horizontal caret run, `hhea.caretSlopeRun`
pub const HCRN: u32 = tag!(b"hcrn");
/// Horizontal caret offset, `hhea.caretOffset`
pub const HCOF: u32 = tag!(b"hcof");
/// Vertical caret rise, `vhea.caretSlopeRise`
pub const VCRS: u32 = tag!(b"vcrs");
/// Vertical caret run, `vhea.caretSlopeRun`
pub const VCRN: u32 = tag!(b"vcrn");
/// Vertical caret offset, `vhea.caretOffset`
pub const VCOF: u32 = tag!(b"vcof");
/// X height, `OS/2.sxHeight`
pub const XHGT: u32 = tag!(b"xhgt");
/// Cap height, `OS/2.sCapHeight`
pub const CPHT: u32 = tag!(b"cpht");
/// Subscript em x size, `OS/2.ySubscriptXSize`
pub const SBXS: u32 = tag!(b"sbxs");
/// Subscript em y size, `OS/2.ySubscriptYSize`
pub const SBYS: u32 = tag!(b"sbys");
/// Subscript em x offset, `OS/2.ySubscriptXOffset`
pub const SBXO: u32 = tag!(b"sbxo");
/// Subscript em y offset, `OS/2.ySubscriptYOffset`
pub const SBYO: u32 = tag!(b"sbyo");
/// Superscript em x size, `OS/2.ySuperscriptXSize`
pub const SPXS: u32 = tag!(b"spxs");
/// Superscript em y size, `OS/2.ySuperscriptYSize`
pub const SPYS: u32 = tag!(b"spys");
/// Superscript em x offset, `OS/2.ySuperscriptXOffset`
pub const SPXO: u32 = tag!(b"spxo");
/// Superscript em y offset, `OS/2.ySuperscriptYOffset`
pub const SPYO: u32 = tag!(b"spyo");
/// Strikeout size, `OS/2.yStrikeoutSize`
pub const STRS: u32 = tag!(b"strs");
/// Strikeout offset, `OS/2.yStrikeoutPosition`
pub const STRO: u32 = tag!(b"stro");
/// Underline size, `post.underlineThickness`
pub const UNDS: u32 = tag!(b"unds");
/// Underline offset, `post.underlinePosition`
pub const UNDO: u32 = tag!(b"undo");
/// Gasp range 0, `gasp.gaspRange[0]`
pub const GSP0: u32 = tag!(b"gsp0");
/// Gasp range 1, `gasp.gaspRange[1]`
pub const GSP1: u32 = tag!(b"gsp1");
/// Gasp range 2, `gasp.gaspRange[2]`
pub const GSP2: u32 = tag!(b"gsp2");
/// Gasp range 3, `gasp.gaspRange[3]`
pub const GSP3: u32 = tag!(b"gsp3");
/// Gasp range 4, `gasp.gaspRange[4]`
pub const GSP4: u32 = tag!(b"gsp4");
/// Gasp range 5, `gasp.gaspRange[5]`
pub const GSP5: u32 = tag!(b"gsp5");
/// Gasp range 6, `gasp.gaspRange[6]`
pub const GSP6: u32 = tag!(b"gsp6");
/// Gasp range 7, `gasp.gaspRange[7]`
pub const GSP7: u32 = tag!(b"gsp7");
/// Gasp range 8, `gasp.gaspRange[8]`
pub const GSP8: u32 = tag!(b"gsp8");
/// Gasp range 9, `gasp.gaspRange[9]`
pub const GSP9: u32 = tag!(b"gsp9");

#[cfg(test)]
mod tests {
    use super::*;

    mod from_string {
        use super::*;

        #[test]
        fn test_four_chars() {
            let tag = from_string("wght").expect("invalid tag");

            assert_eq!(tag, WGHT);
        }

        #[test]
        fn test_three_chars() {
            let tag = from_string("BEN").expect("invalid tag");

            assert_eq!(tag, 1111838240);
        }

        #[test]
        fn test_mvar_value_tag() {
            assert_eq!(from_string("cpht").unwrap(), super::CPHT);
        }
    }

    mod display_tag {
        use crate::tag::{DisplayTag, GVAR, OS_2};

        #[test]
        fn test_ascii() {
            assert_eq!(DisplayTag(GVAR).to_string(), "gvar".to_string());
            assert_eq!(DisplayTag(OS_2).to_string(), "OS/2".to_string());
        }

        #[test]
        fn test_non_ascii() {
            assert_eq!(DisplayTag(0x12345678).to_string(), "0x12345678".to_string());
        }
    }
}
