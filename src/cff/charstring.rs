//! CFF2 CharString instancing.
//!
//! Walks a CharString evaluating `vsindex` and `blend`, and writes every other operator back out
//! with its (now static) operands.

use crate::binary::read::{ReadCtxt, ReadScope};
use crate::binary::write::{WriteBinary, WriteBuffer, WriteContext};
use crate::binary::{I16Be, U8};
use crate::error::ParseError;
use crate::tables::Fixed;

use super::cff2::{BlendContext, BlendOperand, StackValue, MAX_OPERANDS};
use super::CFFError;

mod argstack;

pub use argstack::ArgumentsStack;

pub(crate) const TWO_BYTE_OPERATOR_MARK: u8 = 12;

struct CharStringInstancer<'a> {
    blend_context: &'a BlendContext,
    vs_index: u16,
    stems_len: u32,
    seen_blend: bool,
    new_char_string: WriteBuffer,
}

/// Evaluate the `blend` operators of `char_string` at the instance of `blend_context`.
///
/// `vs_index` is the `vsindex` of the glyph's Private DICT. It is replaced if the CharString has
/// its own `vsindex` operator. Subroutine calls are copied unchanged, so the subroutines need to
/// be instanced as well.
pub(crate) fn instance_char_string(
    blend_context: &BlendContext,
    char_string: &[u8],
    vs_index: u16,
) -> Result<Vec<u8>, CFFError> {
    let mut instancer = CharStringInstancer {
        blend_context,
        vs_index,
        stems_len: 0,
        seen_blend: false,
        new_char_string: WriteBuffer::new(),
    };
    let mut data = [StackValue::Int(0); MAX_OPERANDS];
    let mut stack = ArgumentsStack::new(&mut data);
    instancer.visit(char_string, &mut stack)?;
    if !stack.is_empty() {
        // Operands left without an operator
        return Err(CFFError::InvalidArgumentsStackLength);
    }
    Ok(instancer.new_char_string.into_inner())
}

impl CharStringInstancer<'_> {
    fn visit(
        &mut self,
        char_string: &[u8],
        stack: &mut ArgumentsStack<'_, StackValue>,
    ) -> Result<(), CFFError> {
        let mut s = ReadScope::new(char_string).ctxt();
        while s.bytes_available() {
            let op = s.read::<U8>()?;
            match op {
                0 | 2 | 9 | 13 | 17 => {
                    // Reserved.
                    return Err(CFFError::InvalidOperator);
                }
                operator::RETURN | operator::ENDCHAR => {
                    // Removed in CFF2
                    return Err(CFFError::InvalidOperator);
                }
                operator::HORIZONTAL_STEM
                | operator::VERTICAL_STEM
                | operator::HORIZONTAL_STEM_HINT_MASK
                | operator::VERTICAL_STEM_HINT_MASK => {
                    // CFF2 CharStrings have no width so every pair of operands is a stem
                    self.stems_len += (stack.len() >> 1) as u32;
                    self.write_operator(stack, &[op])?;
                }
                operator::HINT_MASK | operator::COUNTER_MASK => {
                    // Operands before the first mask are implied vstem hints
                    self.stems_len += (stack.len() >> 1) as u32;
                    self.write_operator(stack, &[op])?;
                    let hints = s
                        .read_slice(
                            usize::try_from((self.stems_len + 7) >> 3)
                                .map_err(|_| ParseError::BadValue)?,
                        )
                        .map_err(|_| ParseError::BadOffset)?;
                    self.new_char_string
                        .write_bytes(hints)
                        .map_err(|_| ParseError::BadValue)?;
                }
                operator::VS_INDEX => {
                    if self.seen_blend {
                        // vsindex must precede the first blend
                        return Err(CFFError::InvalidOperator);
                    }
                    let vs_index = stack.pop().ok_or(CFFError::InvalidArgumentsStackLength)?;
                    self.vs_index = vs_index.try_as_u16().ok_or(CFFError::InvalidOperand)?;
                    stack.clear();
                }
                operator::BLEND => {
                    self.seen_blend = true;
                    self.blend_context.blend(self.vs_index, stack)?;
                }
                operator::VERTICAL_MOVE_TO
                | operator::LINE_TO
                | operator::HORIZONTAL_LINE_TO
                | operator::VERTICAL_LINE_TO
                | operator::CURVE_TO
                | operator::CALL_LOCAL_SUBROUTINE
                | operator::MOVE_TO
                | operator::HORIZONTAL_MOVE_TO
                | operator::CURVE_LINE
                | operator::LINE_CURVE
                | operator::VV_CURVE_TO
                | operator::HH_CURVE_TO
                | operator::CALL_GLOBAL_SUBROUTINE
                | operator::VH_CURVE_TO
                | operator::HV_CURVE_TO => {
                    self.write_operator(stack, &[op])?;
                }
                TWO_BYTE_OPERATOR_MARK => {
                    let op2 = s.read::<U8>()?;
                    match op2 {
                        operator::HFLEX | operator::FLEX | operator::HFLEX1 | operator::FLEX1 => {
                            self.write_operator(stack, &[op, op2])?;
                        }
                        _ => return Err(CFFError::InvalidOperator),
                    }
                }
                operator::SHORT_INT => {
                    let n = s.read::<I16Be>()?;
                    stack.push(StackValue::Int(n))?;
                }
                32..=246 => {
                    stack.push(parse_int1(op))?;
                }
                247..=250 => {
                    stack.push(parse_int2(op, &mut s)?)?;
                }
                251..=254 => {
                    stack.push(parse_int3(op, &mut s)?)?;
                }
                operator::FIXED_16_16 => {
                    stack.push(StackValue::Fixed(s.read::<Fixed>()?))?;
                }
            }
        }

        Ok(())
    }

    fn write_operator(
        &mut self,
        stack: &mut ArgumentsStack<'_, StackValue>,
        op: &[u8],
    ) -> Result<(), CFFError> {
        for value in stack.all() {
            StackValue::write(&mut self.new_char_string, *value)
                .map_err(|_| ParseError::BadValue)?;
        }
        self.new_char_string
            .write_bytes(op)
            .map_err(|_| ParseError::BadValue)?;
        stack.clear();
        Ok(())
    }
}

// CharString number parsing functions
fn parse_int1(op: u8) -> StackValue {
    StackValue::Int(i16::from(op) - 139)
}

fn parse_int2(op: u8, s: &mut ReadCtxt<'_>) -> Result<StackValue, CFFError> {
    let b1 = s.read::<U8>()?;
    let n = (i16::from(op) - 247) * 256 + i16::from(b1) + 108;
    Ok(StackValue::Int(n))
}

fn parse_int3(op: u8, s: &mut ReadCtxt<'_>) -> Result<StackValue, CFFError> {
    let b1 = s.read::<U8>()?;
    let n = -(i16::from(op) - 251) * 256 - i16::from(b1) - 108;
    Ok(StackValue::Int(n))
}

/// Operators from Adobe Technical Note #5177, The Type 2 Charstring Format, and the CFF2
/// CharString additions.
pub(crate) mod operator {
    pub const HORIZONTAL_STEM: u8 = 1;
    pub const VERTICAL_STEM: u8 = 3;
    pub const VERTICAL_MOVE_TO: u8 = 4;
    pub const LINE_TO: u8 = 5;
    pub const HORIZONTAL_LINE_TO: u8 = 6;
    pub const VERTICAL_LINE_TO: u8 = 7;
    pub const CURVE_TO: u8 = 8;
    pub const CALL_LOCAL_SUBROUTINE: u8 = 10;
    pub const RETURN: u8 = 11;
    pub const ENDCHAR: u8 = 14;
    pub const VS_INDEX: u8 = 15; // CFF2
    pub const BLEND: u8 = 16; // CFF2
    pub const HORIZONTAL_STEM_HINT_MASK: u8 = 18;
    pub const HINT_MASK: u8 = 19;
    pub const COUNTER_MASK: u8 = 20;
    pub const MOVE_TO: u8 = 21;
    pub const HORIZONTAL_MOVE_TO: u8 = 22;
    pub const VERTICAL_STEM_HINT_MASK: u8 = 23;
    pub const CURVE_LINE: u8 = 24;
    pub const LINE_CURVE: u8 = 25;
    pub const VV_CURVE_TO: u8 = 26;
    pub const HH_CURVE_TO: u8 = 27;
    pub const SHORT_INT: u8 = 28;
    pub const CALL_GLOBAL_SUBROUTINE: u8 = 29;
    pub const VH_CURVE_TO: u8 = 30;
    pub const HV_CURVE_TO: u8 = 31;
    pub const HFLEX: u8 = 34;
    pub const FLEX: u8 = 35;
    pub const HFLEX1: u8 = 36;
    pub const FLEX1: u8 = 37;
    pub const FIXED_16_16: u8 = 255;
}
