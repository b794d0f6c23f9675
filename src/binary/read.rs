#![allow(missing_docs)]

//! Reading big-endian font data.
//!
//! A `ReadScope` is a window onto some bytes and a `ReadCtxt` is a cursor over a scope. Table
//! types implement `ReadBinary` (or `ReadBinaryDep` when they need arguments such as a glyph
//! count) and fixed size records implement `ReadUnchecked` so they can be read lazily from a
//! `ReadArray`.

use std::cmp::Ordering;
use std::fmt;
use std::marker::PhantomData;

use crate::binary::{I16Be, I32Be, U16Be, U32Be, I8, U8};
use crate::error::ParseError;
use crate::size;

#[derive(Debug, Copy, Clone)]
pub struct ReadEof {}

#[derive(Copy, Clone, Debug, PartialEq)]
pub struct ReadScope<'a> {
    data: &'a [u8],
}

#[derive(Clone)]
pub struct ReadCtxt<'a> {
    scope: ReadScope<'a>,
    offset: usize,
}

pub trait ReadBinary {
    type HostType<'a>: Sized;

    fn read<'a>(ctxt: &mut ReadCtxt<'a>) -> Result<Self::HostType<'a>, ParseError>;
}

pub trait ReadBinaryDep {
    type Args<'a>: Copy;
    type HostType<'a>: Sized;

    fn read_dep<'a>(
        ctxt: &mut ReadCtxt<'a>,
        args: Self::Args<'a>,
    ) -> Result<Self::HostType<'a>, ParseError>;
}

/// A fixed size record that can be read without bounds checks once `SIZE` bytes are known to be
/// available.
pub trait ReadUnchecked {
    type HostType: Sized;

    const SIZE: usize;

    /// Must read exactly `SIZE` bytes.
    ///
    /// # Safety
    ///
    /// The caller must ensure `SIZE` bytes are available in `ctxt`.
    unsafe fn read_unchecked(ctxt: &mut ReadCtxt<'_>) -> Self::HostType;
}

/// Build a value from a fixed size record read with `ReadType`.
pub trait ReadFrom {
    type ReadType: ReadUnchecked;
    fn read_from(value: <Self::ReadType as ReadUnchecked>::HostType) -> Self;
}

impl<T> ReadUnchecked for T
where
    T: ReadFrom,
{
    type HostType = T;

    const SIZE: usize = T::ReadType::SIZE;

    unsafe fn read_unchecked(ctxt: &mut ReadCtxt<'_>) -> Self::HostType {
        T::read_from(T::ReadType::read_unchecked(ctxt))
    }
}

impl<T> ReadBinary for T
where
    T: ReadUnchecked,
{
    type HostType<'a> = T::HostType;

    fn read<'a>(ctxt: &mut ReadCtxt<'a>) -> Result<Self::HostType<'a>, ParseError> {
        ctxt.check_avail(T::SIZE)?;
        // SAFETY: `SIZE` bytes are available.
        Ok(unsafe { T::read_unchecked(ctxt) })
    }
}

impl<T> ReadBinaryDep for T
where
    T: ReadBinary,
{
    type Args<'a> = ();
    type HostType<'a> = T::HostType<'a>;

    fn read_dep<'a>(
        ctxt: &mut ReadCtxt<'a>,
        (): Self::Args<'_>,
    ) -> Result<Self::HostType<'a>, ParseError> {
        T::read(ctxt)
    }
}

/// A lazily decoded array of fixed size records.
pub struct ReadArray<'a, T: ReadUnchecked> {
    scope: ReadScope<'a>,
    length: usize,
    stride: usize,
    phantom: PhantomData<T>,
}

pub struct ReadArrayIter<'a, T: ReadUnchecked> {
    scope: ReadScope<'a>,
    index: usize,
    length: usize,
    stride: usize,
    phantom: PhantomData<T>,
}

impl<'a> ReadScope<'a> {
    pub fn new(data: &'a [u8]) -> ReadScope<'a> {
        ReadScope { data }
    }

    pub fn data(&self) -> &'a [u8] {
        self.data
    }

    /// The scope starting `offset` bytes in. Empty if `offset` is past the end.
    pub fn offset(&self, offset: usize) -> ReadScope<'a> {
        let data = self.data.get(offset..).unwrap_or(&[]);
        ReadScope { data }
    }

    pub fn offset_length(&self, offset: usize, length: usize) -> Result<ReadScope<'a>, ParseError> {
        if offset >= self.data.len() && length != 0 {
            return Err(ParseError::BadOffset);
        }
        let data = self.data.get(offset..).unwrap_or(&[]);
        match data.get(..length) {
            Some(data) => Ok(ReadScope { data }),
            None => Err(ParseError::BadEof),
        }
    }

    pub fn ctxt(&self) -> ReadCtxt<'a> {
        ReadCtxt {
            scope: *self,
            offset: 0,
        }
    }

    pub fn read<T: ReadBinaryDep<Args<'a> = ()>>(&self) -> Result<T::HostType<'a>, ParseError> {
        self.ctxt().read::<T>()
    }

    pub fn read_dep<T: ReadBinaryDep>(
        &self,
        args: T::Args<'a>,
    ) -> Result<T::HostType<'a>, ParseError> {
        self.ctxt().read_dep::<T>(args)
    }
}

impl<'a> ReadCtxt<'a> {
    /// Check a condition, returning `ParseError::BadValue` if `false`.
    pub fn check(&self, cond: bool) -> Result<(), ParseError> {
        cond.then_some(()).ok_or(ParseError::BadValue)
    }

    /// Check a condition, returning `ParseError::BadIndex` if `false`.
    pub fn check_index(&self, cond: bool) -> Result<(), ParseError> {
        cond.then_some(()).ok_or(ParseError::BadIndex)
    }

    /// Check a condition, returning `ParseError::BadVersion` if `false`.
    ///
    /// ```
    /// use allsorts_variations::binary::read::ReadScope;
    /// use allsorts_variations::error::ParseError;
    ///
    /// let mut ctxt = ReadScope::new(&[0, 2]).ctxt();
    /// let major_version = ctxt.read_u16be().unwrap();
    ///
    /// assert!(ctxt.check_version(major_version == 2).is_ok());
    /// assert_eq!(ctxt.check_version(major_version == 1), Err(ParseError::BadVersion));
    /// ```
    pub fn check_version(&self, cond: bool) -> Result<(), ParseError> {
        cond.then_some(()).ok_or(ParseError::BadVersion)
    }

    /// The unread remainder of the data.
    pub fn scope(&self) -> ReadScope<'a> {
        self.scope.offset(self.offset)
    }

    pub fn read<T: ReadBinaryDep<Args<'a> = ()>>(&mut self) -> Result<T::HostType<'a>, ParseError> {
        T::read_dep(self, ())
    }

    pub fn read_dep<T: ReadBinaryDep>(
        &mut self,
        args: T::Args<'a>,
    ) -> Result<T::HostType<'a>, ParseError> {
        T::read_dep(self, args)
    }

    pub fn bytes_available(&self) -> bool {
        self.offset < self.scope.data.len()
    }

    fn check_avail(&self, length: usize) -> Result<(), ReadEof> {
        match self.offset.checked_add(length) {
            Some(end) if end <= self.scope.data.len() => Ok(()),
            _ => Err(ReadEof {}),
        }
    }

    /// # Safety
    ///
    /// `N` bytes must be available.
    unsafe fn read_unchecked_bytes<const N: usize>(&mut self) -> [u8; N] {
        let mut bytes = [0; N];
        bytes.copy_from_slice(
            self.scope
                .data
                .get_unchecked(self.offset..self.offset + N),
        );
        self.offset += N;
        bytes
    }

    pub fn read_u8(&mut self) -> Result<u8, ReadEof> {
        self.check_avail(size::U8)?;
        // SAFETY: checked above.
        Ok(unsafe { U8::read_unchecked(self) })
    }

    pub fn read_u16be(&mut self) -> Result<u16, ReadEof> {
        self.check_avail(size::U16)?;
        // SAFETY: checked above.
        Ok(unsafe { U16Be::read_unchecked(self) })
    }

    pub fn read_i16be(&mut self) -> Result<i16, ReadEof> {
        self.check_avail(size::I16)?;
        // SAFETY: checked above.
        Ok(unsafe { I16Be::read_unchecked(self) })
    }

    pub fn read_u32be(&mut self) -> Result<u32, ReadEof> {
        self.check_avail(size::U32)?;
        // SAFETY: checked above.
        Ok(unsafe { U32Be::read_unchecked(self) })
    }

    pub fn read_i32be(&mut self) -> Result<i32, ReadEof> {
        self.check_avail(size::I32)?;
        // SAFETY: checked above.
        Ok(unsafe { I32Be::read_unchecked(self) })
    }

    pub fn read_array<T: ReadUnchecked>(
        &mut self,
        length: usize,
    ) -> Result<ReadArray<'a, T>, ParseError> {
        self.read_array_stride(length, T::SIZE)
    }

    /// Read `length` records of `T` that are `stride` bytes apart.
    ///
    /// Bytes past `T::SIZE` in each record are skipped, which allows newer, longer, versions of
    /// a record to be read.
    pub fn read_array_stride<T: ReadUnchecked>(
        &mut self,
        length: usize,
        stride: usize,
    ) -> Result<ReadArray<'a, T>, ParseError> {
        if T::SIZE > stride {
            return Err(ParseError::BadValue);
        }
        let byte_len = length.checked_mul(stride).ok_or(ParseError::BadEof)?;
        let scope = self.read_scope(byte_len)?;
        Ok(ReadArray {
            scope,
            length,
            stride,
            phantom: PhantomData,
        })
    }

    pub fn read_scope(&mut self, length: usize) -> Result<ReadScope<'a>, ReadEof> {
        let scope = self
            .scope
            .offset_length(self.offset, length)
            .map_err(|_| ReadEof {})?;
        self.offset += length;
        Ok(scope)
    }

    pub fn read_slice(&mut self, length: usize) -> Result<&'a [u8], ReadEof> {
        self.read_scope(length).map(|scope| scope.data)
    }
}

impl<'a, T: ReadUnchecked> ReadArray<'a, T> {
    pub fn empty() -> ReadArray<'a, T> {
        ReadArray {
            scope: ReadScope::new(&[]),
            length: 0,
            stride: T::SIZE,
            phantom: PhantomData,
        }
    }

    pub fn len(&self) -> usize {
        self.length
    }

    pub fn is_empty(&self) -> bool {
        self.length == 0
    }

    pub fn get_item(&self, index: usize) -> Option<T::HostType> {
        if index >= self.length {
            return None;
        }
        let mut ctxt = self
            .scope
            .offset_length(index * self.stride, self.stride)
            .ok()?
            .ctxt();
        // SAFETY: the record scope holds `stride >= SIZE` bytes.
        Some(unsafe { T::read_unchecked(&mut ctxt) })
    }

    pub fn last(&self) -> Option<T::HostType> {
        self.get_item(self.length.checked_sub(1)?)
    }

    pub fn to_vec(&self) -> Vec<T::HostType> {
        self.iter().collect()
    }

    pub fn iter(&self) -> ReadArrayIter<'a, T> {
        ReadArrayIter {
            scope: self.scope,
            index: 0,
            length: self.length,
            stride: self.stride,
            phantom: PhantomData,
        }
    }

    /// Binary search the records with the comparator `f`, as `slice::binary_search_by` does.
    pub fn binary_search_by<F>(&self, mut f: F) -> Result<usize, usize>
    where
        F: FnMut(T::HostType) -> Ordering,
    {
        let mut left = 0;
        let mut right = self.length;
        while left < right {
            let mid = left + (right - left) / 2;
            let Some(item) = self.get_item(mid) else {
                return Err(left);
            };
            match f(item) {
                Ordering::Less => left = mid + 1,
                Ordering::Greater => right = mid,
                Ordering::Equal => return Ok(mid),
            }
        }
        Err(left)
    }
}

impl<T: ReadUnchecked> Clone for ReadArray<'_, T> {
    fn clone(&self) -> Self {
        ReadArray {
            scope: self.scope,
            length: self.length,
            stride: self.stride,
            phantom: PhantomData,
        }
    }
}

impl<'a, T: ReadUnchecked> IntoIterator for &ReadArray<'a, T> {
    type Item = T::HostType;
    type IntoIter = ReadArrayIter<'a, T>;

    fn into_iter(self) -> ReadArrayIter<'a, T> {
        self.iter()
    }
}

impl<T: ReadUnchecked> Iterator for ReadArrayIter<'_, T> {
    type Item = T::HostType;

    fn next(&mut self) -> Option<T::HostType> {
        if self.index >= self.length {
            return None;
        }
        let mut ctxt = self.scope.offset(self.index * self.stride).ctxt();
        ctxt.check_avail(self.stride).ok()?;
        self.index += 1;
        // SAFETY: `stride >= SIZE` bytes are available.
        Some(unsafe { T::read_unchecked(&mut ctxt) })
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.length - self.index;
        (remaining, Some(remaining))
    }
}

impl<T: ReadUnchecked> ExactSizeIterator for ReadArrayIter<'_, T> {}

impl<T> fmt::Debug for ReadArray<'_, T>
where
    T: ReadUnchecked,
    T::HostType: fmt::Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.iter()).finish()
    }
}

macro_rules! read_unchecked_be {
    ($($binary:ty => $host:ty, $size:expr;)*) => {
        $(
            impl ReadUnchecked for $binary {
                type HostType = $host;

                const SIZE: usize = $size;

                unsafe fn read_unchecked(ctxt: &mut ReadCtxt<'_>) -> $host {
                    <$host>::from_be_bytes(ctxt.read_unchecked_bytes::<{ $size }>())
                }
            }
        )*
    };
}

read_unchecked_be! {
    U8 => u8, size::U8;
    I8 => i8, size::I8;
    U16Be => u16, size::U16;
    I16Be => i16, size::I16;
    U32Be => u32, size::U32;
    I32Be => i32, size::I32;
}

// Records are read as tuples of their fields.
macro_rules! read_unchecked_tuple {
    ($($t:ident),+) => {
        impl<$($t: ReadUnchecked),+> ReadUnchecked for ($($t,)+) {
            type HostType = ($($t::HostType,)+);

            const SIZE: usize = 0 $(+ $t::SIZE)+;

            unsafe fn read_unchecked(ctxt: &mut ReadCtxt<'_>) -> Self::HostType {
                ($($t::read_unchecked(ctxt),)+)
            }
        }
    };
}

read_unchecked_tuple!(T1, T2);
read_unchecked_tuple!(T1, T2, T3);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn read_big_endian() {
        let scope = ReadScope::new(&[0xFF, 0xFE, 0, 1, 0x80, 0, 0, 0]);
        let mut ctxt = scope.ctxt();
        assert_eq!(ctxt.read_i16be().unwrap(), -2);
        assert_eq!(ctxt.read_u16be().unwrap(), 1);
        assert_eq!(ctxt.read_i32be().unwrap(), i32::MIN);
        assert!(!ctxt.bytes_available());
        assert!(ctxt.read_u8().is_err());
    }

    #[test]
    fn zero_length_scope_past_end() {
        let scope = ReadScope::new(&[1, 2, 3]);
        assert!(scope.offset_length(99, 0).is_ok());
        assert_eq!(scope.offset_length(99, 1), Err(ParseError::BadOffset));
        assert_eq!(scope.offset_length(2, 2), Err(ParseError::BadEof));
    }

    #[test]
    fn strided_array() {
        let data = [0, 1, 0xAA, 0, 2, 0xBB, 0, 3, 0xCC];
        let array = ReadScope::new(&data)
            .ctxt()
            .read_array_stride::<U16Be>(3, 3)
            .unwrap();
        assert_eq!(array.to_vec(), vec![1, 2, 3]);
        assert_eq!(array.last(), Some(3));
        assert_eq!(array.get_item(3), None);
        assert_eq!(array.binary_search_by(|value| value.cmp(&2)), Ok(1));
        assert_eq!(array.binary_search_by(|value| value.cmp(&4)), Err(3));
    }

    #[test]
    fn tuple_records() {
        let data = [0, 1, 0xFF, 0xFF, 0, 0, 0, 2];
        let mut ctxt = ReadScope::new(&data).ctxt();
        let record = ctxt.read::<(U16Be, I16Be, U32Be)>().unwrap();
        assert_eq!(record, (1, -1, 2));
        assert_eq!(<(U16Be, I16Be, U32Be)>::SIZE, 8);
    }

    #[test]
    fn array_longer_than_data() {
        let mut ctxt = ReadScope::new(&[0, 1, 0]).ctxt();
        assert!(ctxt.read_array::<U16Be>(2).is_err());
        assert!(ctxt.read_array::<U16Be>(usize::MAX).is_err());
    }
}
