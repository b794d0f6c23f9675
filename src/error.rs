//! Error types

use std::fmt;

use crate::binary::read::ReadEof;
use crate::tag::DisplayTag;

/// Errors that originate when parsing binary data
#[derive(Clone, Eq, PartialEq, Debug)]
pub enum ParseError {
    /// The data ended before a complete value could be read.
    BadEof,
    BadValue,
    BadVersion,
    BadOffset,
    /// An index, such as a glyph id or an (outer, inner) pair, is out of range.
    BadIndex,
    LimitExceeded,
    MissingValue,
    /// The font has no table with this tag.
    MissingTable(u32),
}

impl From<ReadEof> for ParseError {
    fn from(_error: ReadEof) -> Self {
        ParseError::BadEof
    }
}

impl From<std::num::TryFromIntError> for ParseError {
    fn from(_error: std::num::TryFromIntError) -> Self {
        ParseError::BadValue
    }
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParseError::BadEof => f.write_str("unexpected end of data"),
            ParseError::BadValue => f.write_str("invalid value"),
            ParseError::BadVersion => f.write_str("unsupported version"),
            ParseError::BadOffset => f.write_str("offset out of bounds"),
            ParseError::BadIndex => f.write_str("index out of range"),
            ParseError::LimitExceeded => f.write_str("size limit exceeded"),
            ParseError::MissingValue => f.write_str("required value missing"),
            ParseError::MissingTable(tag) => {
                write!(f, "font is missing '{}' table", DisplayTag(*tag))
            }
        }
    }
}

impl std::error::Error for ParseError {}

/// Errors that originate when writing binary data
#[derive(Clone, Eq, PartialEq, Debug)]
pub enum WriteError {
    /// A value does not fit the field it is written to.
    BadValue,
    NotImplemented,
    /// The value written to a placeholder was not the size that was reserved for it.
    PlaceholderMismatch,
}

impl From<std::num::TryFromIntError> for WriteError {
    fn from(_error: std::num::TryFromIntError) -> Self {
        WriteError::BadValue
    }
}

impl fmt::Display for WriteError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WriteError::BadValue => f.write_str("value out of range for field"),
            WriteError::NotImplemented => f.write_str("unsupported write"),
            WriteError::PlaceholderMismatch => f.write_str("placeholder size mismatch"),
        }
    }
}

impl std::error::Error for WriteError {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tag;

    #[test]
    fn display_missing_table() {
        assert_eq!(
            ParseError::MissingTable(tag::HVAR).to_string(),
            "font is missing 'HVAR' table"
        );
    }

    #[test]
    fn out_of_range_write() {
        let err = WriteError::from(u16::try_from(70_000u32).unwrap_err());
        assert_eq!(err, WriteError::BadValue);
        assert_eq!(err.to_string(), "value out of range for field");
    }
}
