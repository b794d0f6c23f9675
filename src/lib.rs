#![warn(rust_2018_idioms)]

//! # Variable font data
//!
//! Decoding and evaluation of the OpenType font variation tables. Given a normalized location in
//! a font's design space this crate computes the adjusted global metrics (`MVAR`), glyph advances
//! (`HVAR`/`VVAR`), glyph outline point deltas (`gvar`), and CFF2 blended operands. The style
//! attributes table (`STAT`) can be decoded and encoded again without loss.
//!
//! Locating tables in a font file is left to a [FontTableProvider](tables::FontTableProvider)
//! implementation.

/// Reading and writing of binary data.
pub mod binary;
pub mod cff;
pub mod error;
pub mod gdef;
pub mod metrics;
pub mod size;
pub mod tables;
pub mod tag;
pub mod variations;


/// Infallible conversion between numeric types.
///
/// Used to widen font file offsets and counts to `usize`.
pub trait SafeFrom<T>: Sized {
    /// Perform the conversion.
    fn safe_from(t: T) -> Self;
}

impl SafeFrom<u8> for usize {
    fn safe_from(v: u8) -> Self {
        usize::from(v)
    }
}

impl SafeFrom<u16> for usize {
    fn safe_from(v: u16) -> Self {
        usize::from(v)
    }
}

#[cfg(any(target_pointer_width = "32", target_pointer_width = "64"))]
impl SafeFrom<u32> for usize {
    fn safe_from(v: u32) -> Self {
        v as usize
    }
}
