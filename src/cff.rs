//! CFF2 variation support.
//!
//! Only what is needed to vary CFF2 outlines is read: DICT data is scanned for the operators that
//! locate the variation store and select the item variation data, and CharStrings have their
//! `blend` operators evaluated.
//!
//! Refer to [Technical Note #5176](http://wwwimages.adobe.com/content/dam/Adobe/en/devnet/font/pdfs/5176.CFF.pdf)
//! and the [CFF2 spec](https://learn.microsoft.com/en-us/typography/opentype/spec/cff2) for more
//! information.

use std::fmt;

use tinyvec::TinyVec;

use crate::binary::read::{ReadBinaryDep, ReadCtxt};
use crate::error::ParseError;

pub mod cff2;
mod charstring;

pub use charstring::ArgumentsStack;

const END_OF_FLOAT_FLAG: u8 = 0xf;

/// A list of errors that can occur when interpreting CFF2 CharStrings.
#[derive(Clone, Eq, PartialEq, Debug)]
pub enum CFFError {
    ParseError(ParseError),
    InvalidOperator,
    InvalidOperand,
    InvalidArgumentsStackLength,
    ArgumentsStackLimitReached,
    MissingVariationStore,
}

/// DICT operators used by CFF2 variations.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
#[repr(u16)]
pub enum Operator {
    CharStrings = 17,
    Private = 18,
    VSIndex = 22,
    VStore = 24,
    FDArray = op2(36),
    FDSelect = op2(37),
}

const fn op2(value: u8) -> u16 {
    (12 << 8) | (value as u16)
}

/// A DICT operand.
#[derive(Debug, PartialEq, Clone)]
pub enum Operand {
    Integer(i32),
    /// The packed BCD bytes of a real number, including the terminating nibble.
    Real(Real),
}

#[derive(Debug, PartialEq, Clone)]
pub struct Real(TinyVec<[u8; 7]>);

/// A DICT read as (operator, operands) pairs in the order they appear.
///
/// Operators are kept as their raw one or two byte value (two byte operators are `12 << 8 | b1`)
/// so that DICTs containing operators this crate has no use for can still be read.
#[derive(Debug, PartialEq, Clone, Default)]
pub struct Dict {
    entries: Vec<(u16, Vec<Operand>)>,
}

enum Op {
    Operator(u16),
    Operand(Operand),
}

impl Dict {
    pub fn get(&self, operator: Operator) -> Option<&[Operand]> {
        let key = operator as u16;
        self.entries
            .iter()
            .find(|(op, _)| *op == key)
            .map(|(_, operands)| operands.as_slice())
    }

    /// Returns the single integer operand of `operator`.
    ///
    /// `None` if the operator is absent, an error if it does not have exactly one integer operand.
    pub fn get_i32(&self, operator: Operator) -> Option<Result<i32, ParseError>> {
        self.get(operator).map(|operands| match operands {
            [Operand::Integer(value)] => Ok(*value),
            _ => Err(ParseError::BadValue),
        })
    }

    /// Returns the (size, offset) operands of the `Private` operator.
    pub fn private_dict_location(&self) -> Option<Result<(usize, usize), ParseError>> {
        self.get(Operator::Private).map(|operands| match operands {
            [Operand::Integer(size), Operand::Integer(offset)] => {
                Ok((usize::try_from(*size)?, usize::try_from(*offset)?))
            }
            _ => Err(ParseError::BadValue),
        })
    }

    pub fn iter(&self) -> impl Iterator<Item = &(u16, Vec<Operand>)> {
        self.entries.iter()
    }
}

impl ReadBinaryDep for Dict {
    type Args<'a> = usize;
    type HostType<'a> = Self;

    fn read_dep<'a>(ctxt: &mut ReadCtxt<'a>, max_operands: usize) -> Result<Self, ParseError> {
        let mut entries = Vec::new();
        let mut operands = Vec::new();

        while ctxt.bytes_available() {
            match read_op(ctxt)? {
                Op::Operator(operator) => {
                    entries.push((operator, std::mem::take(&mut operands)));
                }
                Op::Operand(operand) => {
                    if operands.len() == max_operands {
                        return Err(ParseError::LimitExceeded);
                    }
                    operands.push(operand);
                }
            }
        }

        // Trailing operands without an operator are invalid
        if !operands.is_empty() {
            return Err(ParseError::BadValue);
        }

        Ok(Dict { entries })
    }
}

fn read_op(ctxt: &mut ReadCtxt<'_>) -> Result<Op, ParseError> {
    let b0 = ctxt.read_u8()?;

    match b0 {
        0..=11 | 13..=24 => Ok(Op::Operator(u16::from(b0))),
        12 => Ok(Op::Operator(op2(ctxt.read_u8()?))),
        28 => {
            let num = ctxt.read_i16be()?;
            ok_int(i32::from(num))
        }
        29 => ok_int(ctxt.read_i32be()?),
        30 => read_real(ctxt).map(|real| Op::Operand(Operand::Real(real))),
        32..=246 => ok_int(i32::from(b0) - 139),
        247..=250 => {
            let b1 = ctxt.read_u8()?;
            ok_int((i32::from(b0) - 247) * 256 + i32::from(b1) + 108)
        }
        251..=254 => {
            let b1 = ctxt.read_u8()?;
            ok_int(-(i32::from(b0) - 251) * 256 - i32::from(b1) - 108)
        }
        25..=27 | 31 | 255 => Err(ParseError::BadValue), // reserved
    }
}

fn ok_int(num: i32) -> Result<Op, ParseError> {
    Ok(Op::Operand(Operand::Integer(num)))
}

fn read_real(ctxt: &mut ReadCtxt<'_>) -> Result<Real, ParseError> {
    let mut bytes = TinyVec::new();
    loop {
        let byte = ctxt.read_u8()?;
        bytes.push(byte);
        if byte >> 4 == END_OF_FLOAT_FLAG || byte & 0xf == END_OF_FLOAT_FLAG {
            return Ok(Real(bytes));
        }
    }
}

impl From<ParseError> for CFFError {
    fn from(error: ParseError) -> CFFError {
        CFFError::ParseError(error)
    }
}

impl fmt::Display for CFFError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CFFError::ParseError(parse_error) => write!(f, "CFF: parse error: {}", parse_error),
            CFFError::InvalidOperator => write!(f, "CFF: invalid operator"),
            CFFError::InvalidOperand => write!(f, "CFF: invalid operand"),
            CFFError::InvalidArgumentsStackLength => write!(f, "CFF: invalid arguments stack length"),
            CFFError::ArgumentsStackLimitReached => write!(f, "CFF: arguments stack limit reached"),
            CFFError::MissingVariationStore => write!(f, "CFF: missing variation store"),
        }
    }
}

impl std::error::Error for CFFError {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::binary::read::ReadScope;
    use crate::tests::writer::{self, TtfType::*};

    #[test]
    fn read_dict() {
        // 2 CharStrings, 1.5 0 Private, 1 vsindex, 256 FDArray
        let data = [
            0x8d, 17, 0x1e, 0x1a, 0x5f, 0x8b, 18, 0x8c, 22, 0x1d, 0, 0, 0x01, 0, 12, 36,
        ];
        let dict = ReadScope::new(&data).ctxt().read_dep::<Dict>(48).unwrap();
        assert_eq!(dict.get_i32(Operator::CharStrings), Some(Ok(2)));
        assert_eq!(
            dict.get(Operator::Private),
            Some(
                &[
                    Operand::Real(Real(TinyVec::from(&[0x1a, 0x5f][..]))),
                    Operand::Integer(0)
                ][..]
            )
        );
        assert_eq!(
            dict.private_dict_location(),
            Some(Err(ParseError::BadValue))
        );
        assert_eq!(dict.get_i32(Operator::VSIndex), Some(Ok(1)));
        assert_eq!(dict.get_i32(Operator::FDArray), Some(Ok(256)));
        assert_eq!(dict.get_i32(Operator::VStore), None);
    }

    #[test]
    fn read_dict_integers() {
        let mut data = writer::convert(&[CFFInt(100), CFFInt(-200), CFFInt(1000), CFFInt(-40000)]);
        data.push(18);
        let dict = ReadScope::new(&data).ctxt().read_dep::<Dict>(48).unwrap();
        assert_eq!(
            dict.get(Operator::Private),
            Some(
                &[
                    Operand::Integer(100),
                    Operand::Integer(-200),
                    Operand::Integer(1000),
                    Operand::Integer(-40000)
                ][..]
            )
        );
    }

    #[test]
    fn read_dict_operand_limit() {
        let data = [0x8b, 0x8b, 0x8b, 24];
        assert_eq!(
            ReadScope::new(&data).ctxt().read_dep::<Dict>(2),
            Err(ParseError::LimitExceeded)
        );
    }

    #[test]
    fn read_dict_trailing_operand() {
        let data = [0x8b, 24, 0x8b];
        assert_eq!(
            ReadScope::new(&data).ctxt().read_dep::<Dict>(48),
            Err(ParseError::BadValue)
        );
    }
}
