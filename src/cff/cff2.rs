//! CFF2 variation handling.
//!
//! Refer to [OpenType CFF2 spec](https://learn.microsoft.com/en-us/typography/opentype/spec/cff2)
//! for more information.

use std::convert::TryFrom;
use std::fmt::Debug;

use super::{charstring, ArgumentsStack, CFFError, Dict, Operator};
use crate::binary::read::{ReadBinary, ReadBinaryDep, ReadCtxt, ReadScope};
use crate::binary::write::{WriteBinary, WriteContext};
use crate::binary::{I16Be, U16Be, U8};
use crate::error::{ParseError, WriteError};
use crate::tables::variable_fonts::ItemVariationStore;
use crate::tables::{F2Dot14, Fixed};
use crate::SafeFrom;

/// Maximum number of operands in Top DICT, Font DICTs, Private DICTs and CharStrings.
///
/// > Operators in Top DICT, Font DICTs, Private DICTs and CharStrings may be preceded by up to a
/// > maximum of 513 operands.
pub const MAX_OPERANDS: usize = 513;

/// The parts of a CFF2 table needed to instance its CharStrings.
///
/// [OpenType CFF2 spec](https://learn.microsoft.com/en-us/typography/opentype/spec/cff2)
pub struct CFF2<'a> {
    /// CFF2 Header.
    pub header: Header,
    /// Top DICT with top-level properties of the font.
    pub top_dict: Dict,
    /// INDEX of global subroutines.
    pub global_subr_index: Index<'a>,
    /// INDEX of char strings (glyphs).
    pub char_strings_index: Index<'a>,
    /// Item variation store. Required/present for variable fonts.
    pub vstore: Option<ItemVariationStore<'a>>,
    /// Font dict select. Maps glyph ids to Font DICTs.
    pub fd_select: Option<FDSelect<'a>>,
    /// The `vsindex` of the Private DICT of each Font DICT.
    vs_indices: Vec<u16>,
}

/// CFF2 Font Header
///
/// <https://learn.microsoft.com/en-us/typography/opentype/spec/cff2#6-header>
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Header {
    /// Major version (2).
    pub major: u8,
    /// Minor version.
    pub minor: u8,
    /// Size of the header in the font (maybe larger than this structure).
    pub header_size: u8,
    /// Length of the Top DICT
    pub top_dict_length: u16,
}

/// A CFF2 INDEX: an array of variable sized objects.
#[derive(Clone)]
pub struct Index<'a> {
    count: usize,
    off_size: u8,
    offset_array: &'a [u8],
    data_array: &'a [u8],
}

/// Maps glyph ids to Font DICT indices.
#[derive(Clone)]
pub enum FDSelect<'a> {
    Format0 {
        glyph_font_dict_indices: &'a [u8],
    },
    Format3 {
        ranges: Vec<(u32, u16)>,
        sentinel: u32,
    },
    Format4 {
        ranges: Vec<(u32, u16)>,
        sentinel: u32,
    },
}

/// A CharString operand in its original form (int/fixed point).
#[derive(Debug, Copy, Clone, PartialEq)]
pub enum StackValue {
    Int(i16),
    Fixed(Fixed),
}

/// Trait for values that can be used to implement the `blend` operator.
pub trait BlendOperand: Debug + Copy + Into<f32> + From<f32> + From<i16> + From<Fixed> {
    /// Try to convert `self` into a `u16`.
    fn try_as_u16(self) -> Option<u16>;
}

/// The region scalars of every item variation data subtable at one instance.
///
/// The scalars only depend on the `vsindex` so they are calculated once up front and shared by
/// every CharString.
#[derive(Debug, Clone, PartialEq)]
pub struct BlendContext {
    scalars: Vec<Vec<f32>>,
}

impl<'a> CFF2<'a> {
    /// The `vsindex` that applies to CharStrings using Font DICT `font_dict_index`.
    pub fn vs_index(&self, font_dict_index: usize) -> Option<u16> {
        self.vs_indices.get(font_dict_index).copied()
    }

    /// The Font DICT index of `glyph_id`.
    pub fn font_dict_index(&self, glyph_id: u16) -> Option<usize> {
        match &self.fd_select {
            Some(fd_select) => fd_select.font_dict_index(glyph_id),
            None => Some(0),
        }
    }

    /// Calculate the blend scalars of `instance`.
    pub fn blend_context(&self, instance: &[F2Dot14]) -> Result<BlendContext, CFFError> {
        let vstore = self
            .vstore
            .as_ref()
            .ok_or(CFFError::MissingVariationStore)?;
        BlendContext::new(vstore, instance).map_err(CFFError::from)
    }

    /// Instance the CharString of `glyph_id`, evaluating its `blend` operators.
    pub fn instance_char_string(
        &self,
        context: &BlendContext,
        glyph_id: u16,
    ) -> Result<Vec<u8>, CFFError> {
        let char_string = self
            .char_strings_index
            .read_object(usize::from(glyph_id))
            .ok_or(ParseError::BadIndex)?;
        let vs_index = self
            .font_dict_index(glyph_id)
            .and_then(|index| self.vs_index(index))
            .ok_or(ParseError::BadIndex)?;
        context.instance_char_string(char_string, vs_index)
    }
}

impl ReadBinary for CFF2<'_> {
    type HostType<'a> = CFF2<'a>;

    fn read<'a>(ctxt: &mut ReadCtxt<'a>) -> Result<Self::HostType<'a>, ParseError> {
        // Get a scope that starts at the beginning of the CFF data. This is needed for reading
        // data that is specified as an offset from the start of the data later.
        let scope = ctxt.scope();

        let header = ctxt.read::<Header>()?;
        let top_dict_data = ctxt.read_slice(usize::from(header.top_dict_length))?;
        let top_dict = ReadScope::new(top_dict_data)
            .ctxt()
            .read_dep::<Dict>(MAX_OPERANDS)?;
        let global_subr_index = ctxt.read::<Index<'_>>()?;

        let char_strings_offset = top_dict
            .get_i32(Operator::CharStrings)
            .ok_or(ParseError::MissingValue)??;
        let char_strings_index = scope
            .offset(usize::try_from(char_strings_offset)?)
            .read::<Index<'_>>()?;

        let vstore = match top_dict.get_i32(Operator::VStore).transpose()? {
            Some(offset) => {
                let mut vstore_ctxt = scope.offset(usize::try_from(offset)?).ctxt();
                // The store is preceded by its length, which is not needed
                let _length = vstore_ctxt.read_u16be()?;
                Some(vstore_ctxt.read::<ItemVariationStore<'_>>()?)
            }
            None => None,
        };

        // FDArray is required in CFF2
        let fd_array_offset = top_dict
            .get_i32(Operator::FDArray)
            .ok_or(ParseError::MissingValue)??;
        let fd_array = scope
            .offset(usize::try_from(fd_array_offset)?)
            .read::<Index<'_>>()?;
        let vs_indices = fd_array
            .iter()
            .map(|font_dict_data| {
                let font_dict = ReadScope::new(font_dict_data)
                    .ctxt()
                    .read_dep::<Dict>(MAX_OPERANDS)?;
                read_private_dict_vs_index(&scope, &font_dict)
            })
            .collect::<Result<Vec<_>, _>>()?;

        let fd_select = match top_dict.get_i32(Operator::FDSelect).transpose()? {
            Some(offset) => Some(
                scope
                    .offset(usize::try_from(offset)?)
                    .read_dep::<FDSelect<'_>>(char_strings_index.count)?,
            ),
            None if fd_array.count > 1 => return Err(ParseError::MissingValue),
            None => None,
        };

        Ok(CFF2 {
            header,
            top_dict,
            global_subr_index,
            char_strings_index,
            vstore,
            fd_select,
            vs_indices,
        })
    }
}

fn read_private_dict_vs_index(scope: &ReadScope<'_>, font_dict: &Dict) -> Result<u16, ParseError> {
    let (size, offset) = font_dict
        .private_dict_location()
        .ok_or(ParseError::MissingValue)??;
    let private_dict = scope
        .offset_length(offset, size)?
        .ctxt()
        .read_dep::<Dict>(MAX_OPERANDS)?;
    match private_dict.get_i32(Operator::VSIndex).transpose()? {
        Some(vs_index) => Ok(u16::try_from(vs_index)?),
        None => Ok(0),
    }
}

impl Header {
    // Sum of size of the four fields in the header
    const SIZE: u8 = 1 + 1 + 1 + 2;
}

impl ReadBinary for Header {
    type HostType<'b> = Self;

    fn read(ctxt: &mut ReadCtxt<'_>) -> Result<Self, ParseError> {
        let major = ctxt.read_u8()?;
        ctxt.check_version(major == 2)?;
        let minor = ctxt.read_u8()?;
        let header_size = ctxt.read_u8()?;
        let top_dict_length = ctxt.read_u16be()?;

        if header_size < Header::SIZE {
            return Err(ParseError::BadValue);
        }

        // Skip any unknown data
        let _unknown = ctxt.read_slice(usize::from(header_size - Header::SIZE))?;

        Ok(Header {
            major,
            minor,
            header_size,
            top_dict_length,
        })
    }
}

impl<'a> Index<'a> {
    pub fn len(&self) -> usize {
        self.count
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    /// Returns the data of object `index`.
    pub fn read_object(&self, index: usize) -> Option<&'a [u8]> {
        if index >= self.count {
            return None;
        }
        let start = self.offset(index)?;
        let end = self.offset(index + 1)?;
        self.data_array.get(start..end)
    }

    pub fn iter(&self) -> impl Iterator<Item = &'a [u8]> + '_ {
        (0..self.count).filter_map(move |index| self.read_object(index))
    }

    // Offsets are 1 based, the returned value is 0 based
    fn offset(&self, index: usize) -> Option<usize> {
        let off_size = usize::from(self.off_size);
        let start = index * off_size;
        let bytes = self.offset_array.get(start..start + off_size)?;
        let offset = bytes
            .iter()
            .fold(0usize, |acc, &byte| (acc << 8) | usize::from(byte));
        offset.checked_sub(1)
    }
}

impl ReadBinary for Index<'_> {
    type HostType<'a> = Index<'a>;

    fn read<'a>(ctxt: &mut ReadCtxt<'a>) -> Result<Self::HostType<'a>, ParseError> {
        let count = usize::safe_from(ctxt.read_u32be()?);
        if count == 0 {
            return Ok(Index {
                count,
                off_size: 1,
                offset_array: &[],
                data_array: &[],
            });
        }

        let off_size = ctxt.read_u8()?;
        ctxt.check((1..=4).contains(&off_size))?;
        let offset_array_len = count
            .checked_add(1)
            .and_then(|len| len.checked_mul(usize::from(off_size)))
            .ok_or(ParseError::LimitExceeded)?;
        let offset_array = ctxt.read_slice(offset_array_len)?;
        let mut index = Index {
            count,
            off_size,
            offset_array,
            data_array: &[],
        };
        let data_len = index.offset(count).ok_or(ParseError::BadOffset)?;
        index.data_array = ctxt.read_slice(data_len)?;
        Ok(index)
    }
}

impl<'a> FDSelect<'a> {
    pub fn font_dict_index(&self, glyph_id: u16) -> Option<usize> {
        match self {
            FDSelect::Format0 {
                glyph_font_dict_indices,
            } => glyph_font_dict_indices
                .get(usize::from(glyph_id))
                .map(|&index| usize::from(index)),
            FDSelect::Format3 { ranges, sentinel } | FDSelect::Format4 { ranges, sentinel } => {
                let glyph_id = u32::from(glyph_id);
                if glyph_id >= *sentinel {
                    return None;
                }
                // Find the last range that starts at or before glyph_id
                let range_index = ranges.partition_point(|&(first, _)| first <= glyph_id);
                range_index
                    .checked_sub(1)
                    .map(|i| usize::from(ranges[i].1))
            }
        }
    }
}

impl ReadBinaryDep for FDSelect<'_> {
    type Args<'a> = usize;
    type HostType<'a> = FDSelect<'a>;

    fn read_dep<'a>(
        ctxt: &mut ReadCtxt<'a>,
        n_glyphs: usize,
    ) -> Result<Self::HostType<'a>, ParseError> {
        match ctxt.read_u8()? {
            0 => Ok(FDSelect::Format0 {
                glyph_font_dict_indices: ctxt.read_slice(n_glyphs)?,
            }),
            3 => {
                let n_ranges = ctxt.read_u16be()?;
                let ranges = (0..n_ranges)
                    .map(|_| Ok((u32::from(ctxt.read_u16be()?), u16::from(ctxt.read_u8()?))))
                    .collect::<Result<Vec<_>, ParseError>>()?;
                let sentinel = u32::from(ctxt.read_u16be()?);
                FDSelect::check_ranges(&ranges)?;
                Ok(FDSelect::Format3 { ranges, sentinel })
            }
            4 => {
                let n_ranges = ctxt.read_u32be()?;
                let ranges = (0..n_ranges)
                    .map(|_| Ok((ctxt.read_u32be()?, ctxt.read_u16be()?)))
                    .collect::<Result<Vec<_>, ParseError>>()?;
                let sentinel = ctxt.read_u32be()?;
                FDSelect::check_ranges(&ranges)?;
                Ok(FDSelect::Format4 { ranges, sentinel })
            }
            _ => Err(ParseError::BadValue),
        }
    }
}

impl FDSelect<'_> {
    // The first range must start at glyph 0 and the ranges must be in increasing order
    fn check_ranges(ranges: &[(u32, u16)]) -> Result<(), ParseError> {
        match ranges.first() {
            Some((0, _)) if ranges.windows(2).all(|pair| pair[0].0 < pair[1].0) => Ok(()),
            _ => Err(ParseError::BadValue),
        }
    }
}

impl BlendContext {
    /// Calculate the scalar of every region referenced by each item variation data subtable of
    /// `vstore` at `instance`.
    pub fn new(vstore: &ItemVariationStore<'_>, instance: &[F2Dot14]) -> Result<Self, ParseError> {
        let scalars = (0..vstore.item_variation_data_count())
            .map(|vs_index| {
                vstore
                    .regions(vs_index)?
                    .map(|region| Ok(region?.scalar(instance.iter().copied())))
                    .collect::<Result<Vec<_>, ParseError>>()
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(BlendContext { scalars })
    }

    /// The region scalars for item variation data subtable `vs_index`.
    pub fn scalars(&self, vs_index: u16) -> Option<&[f32]> {
        self.scalars.get(usize::from(vs_index)).map(Vec::as_slice)
    }

    /// The number of regions, `k`, that `blend` operands are supplied for.
    pub fn region_count(&self, vs_index: u16) -> Option<usize> {
        self.scalars(vs_index).map(<[f32]>::len)
    }

    /// Apply the `blend` operator to `stack`.
    ///
    /// > For k regions, produces n interpolated result value(s) from n*(k + 1) operands.
    ///
    /// The last operand on the stack is `n`. It is followed by the `n` default values, then `k`
    /// deltas for each of them. Only the `n` blended values are left on the stack.
    pub fn blend<T: BlendOperand>(
        &self,
        vs_index: u16,
        stack: &mut ArgumentsStack<'_, T>,
    ) -> Result<(), CFFError> {
        let scalars = self.scalars(vs_index).ok_or(ParseError::BadIndex)?;
        let k = scalars.len();
        let n = stack
            .pop()
            .ok_or(CFFError::InvalidArgumentsStackLength)?
            .try_as_u16()
            .map(usize::from)
            .ok_or(CFFError::InvalidOperand)?;

        let num_operands = n * (k + 1);
        if stack.len() < num_operands {
            return Err(CFFError::InvalidArgumentsStackLength);
        }

        let operands = stack.pop_n(num_operands)?;
        let (defaults, deltas) = operands.split_at(n);
        let mut blended = defaults
            .iter()
            .copied()
            .map(Into::<f32>::into)
            .collect::<Vec<_>>();
        if k > 0 {
            for (value, deltas) in blended.iter_mut().zip(deltas.chunks(k)) {
                for (&delta, &scalar) in deltas.iter().zip(scalars) {
                    let delta: f32 = delta.into();
                    *value += scalar * delta;
                }
            }
        }

        blended
            .into_iter()
            .try_for_each(|value| stack.push(T::from(value)))
    }

    /// Create a static version of `char_string` by evaluating its `vsindex` and `blend` operators.
    ///
    /// `vs_index` is the `vsindex` from the Private DICT used by the CharString.
    pub fn instance_char_string(
        &self,
        char_string: &[u8],
        vs_index: u16,
    ) -> Result<Vec<u8>, CFFError> {
        charstring::instance_char_string(self, char_string, vs_index)
    }
}

fn f32_to_u16(value: f32) -> Option<u16> {
    (value.fract() == 0. && (0. ..=f32::from(u16::MAX)).contains(&value)).then(|| value as u16)
}

impl BlendOperand for StackValue {
    fn try_as_u16(self) -> Option<u16> {
        match self {
            StackValue::Int(int) => u16::try_from(int).ok(),
            StackValue::Fixed(fixed) => f32_to_u16(f32::from(fixed)),
        }
    }
}

impl BlendOperand for f32 {
    fn try_as_u16(self) -> Option<u16> {
        f32_to_u16(self)
    }
}

impl WriteBinary for StackValue {
    type Output = ();

    fn write<C: WriteContext>(ctxt: &mut C, val: Self) -> Result<Self::Output, WriteError> {
        match val {
            // Refer to Table 3 Operand Encoding in section 4 of Technical Note #5176 for details on
            // the integer encoding scheme.
            StackValue::Int(int) => {
                match int {
                    // NOTE: Casts are safe due to patterns limiting range
                    -107..=107 => U8::write(ctxt, (int + 139) as u8),
                    108..=1131 => {
                        let int = int - 108;
                        U8::write(ctxt, ((int >> 8) + 247) as u8)?;
                        U8::write(ctxt, int as u8)
                    }
                    -1131..=-108 => {
                        let int = -int - 108;
                        U8::write(ctxt, ((int >> 8) + 251) as u8)?;
                        U8::write(ctxt, int as u8)
                    }
                    _ => {
                        U8::write(ctxt, charstring::operator::SHORT_INT)?;
                        I16Be::write(ctxt, int)
                    }
                }
            }
            StackValue::Fixed(fixed) => {
                U8::write(ctxt, charstring::operator::FIXED_16_16)?;
                Fixed::write(ctxt, fixed)
            }
        }
    }
}

impl From<StackValue> for f32 {
    fn from(value: StackValue) -> Self {
        match value {
            StackValue::Int(int) => f32::from(int),
            StackValue::Fixed(fixed) => f32::from(fixed),
        }
    }
}

impl From<f32> for StackValue {
    fn from(value: f32) -> Self {
        if value.fract() == 0.0 && (f32::from(i16::MIN)..=f32::from(i16::MAX)).contains(&value) {
            StackValue::Int(value as i16)
        } else {
            StackValue::Fixed(Fixed::from(value))
        }
    }
}

impl From<i16> for StackValue {
    fn from(value: i16) -> Self {
        StackValue::Int(value)
    }
}

impl From<Fixed> for StackValue {
    fn from(value: Fixed) -> Self {
        StackValue::Fixed(value)
    }
}

impl WriteBinary for Header {
    type Output = ();

    fn write<C: WriteContext>(ctxt: &mut C, header: Self) -> Result<Self::Output, WriteError> {
        U8::write(ctxt, header.major)?;
        U8::write(ctxt, header.minor)?;
        U8::write(ctxt, Header::SIZE)?;
        U16Be::write(ctxt, header.top_dict_length)?;
        Ok(())
    }
}
