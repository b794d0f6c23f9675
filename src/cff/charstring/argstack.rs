// This file is derived from ttf-parser, licenced under Apache-2.0.
// https://github.com/RazrFalcon/ttf-parser/blob/439aaaebd50eb8aed66302e3c1b51fae047f85b2/src/tables/cff/argstack.rs

use std::fmt::Debug;

use crate::cff::CFFError;

/// Storage for the CFF operand stack when processing CharStrings.
pub struct ArgumentsStack<'a, T>
where
    T: Debug,
{
    data: &'a mut [T],
    len: usize,
}

impl<'a, T> ArgumentsStack<'a, T>
where
    T: Copy + Debug,
{
    /// Create an empty stack that can hold up to `data.len()` values.
    pub fn new(data: &'a mut [T]) -> Self {
        ArgumentsStack { data, len: 0 }
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn push(&mut self, n: T) -> Result<(), CFFError> {
        match self.data.get_mut(self.len) {
            Some(slot) => {
                *slot = n;
                self.len += 1;
                Ok(())
            }
            None => Err(CFFError::ArgumentsStackLimitReached),
        }
    }

    pub fn pop(&mut self) -> Option<T> {
        self.len = self.len.checked_sub(1)?;
        Some(self.data[self.len])
    }

    /// Pop `n` values from the stack, returned in the order they were pushed.
    pub fn pop_n(&mut self, n: usize) -> Result<&[T], CFFError> {
        self.len = self
            .len
            .checked_sub(n)
            .ok_or(CFFError::InvalidArgumentsStackLength)?;
        Ok(&self.data[self.len..self.len + n])
    }

    pub fn all(&self) -> &[T] {
        &self.data[..self.len]
    }

    pub fn clear(&mut self) {
        self.len = 0;
    }
}

impl<T: Debug> Debug for ArgumentsStack<'_, T> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_list().entries(&self.data[..self.len]).finish()
    }
}
