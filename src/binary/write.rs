#![deny(missing_docs)]

//! Writing big-endian font data.

use std::marker::PhantomData;

use crate::binary::read::{ReadArray, ReadUnchecked};
use crate::binary::{I16Be, I32Be, U16Be, U32Be, U8};
use crate::error::WriteError;

/// An in-memory buffer that implements `WriteContext`.
#[derive(Debug, Default)]
pub struct WriteBuffer {
    data: Vec<u8>,
}

/// A fixed size window of a `WriteBuffer` that a placeholder is written through.
struct WriteSlice<'a> {
    offset: usize,
    data: &'a mut [u8],
}

/// Space for a `T` reserved by `WriteContext::placeholder`, usually an offset that is only known
/// once the data it points at has been written.
#[must_use]
pub struct Placeholder<T, HostType>
where
    T: WriteBinary<HostType>,
{
    offset: usize,
    length: usize,
    marker: PhantomData<(T, HostType)>,
}

/// Trait that describes a type that can be written to a `WriteContext` in binary form.
pub trait WriteBinary<HostType = Self> {
    /// The type of the value returned by `write`.
    type Output;

    /// Write the binary representation of `val` to `ctxt`.
    fn write<C: WriteContext>(ctxt: &mut C, val: HostType) -> Result<Self::Output, WriteError>;
}

/// Trait for types that can have binary data written to them.
pub trait WriteContext {
    /// Write every record of a `ReadArray`.
    fn write_array<T>(&mut self, array: &ReadArray<'_, T>) -> Result<(), WriteError>
    where
        Self: Sized,
        T: ReadUnchecked + WriteBinary<<T as ReadUnchecked>::HostType>,
    {
        self.write_iter::<T, _>(array.iter())
    }

    /// Write each value produced by `iter` as a `T`.
    fn write_iter<T, HostType>(
        &mut self,
        iter: impl Iterator<Item = HostType>,
    ) -> Result<(), WriteError>
    where
        Self: Sized,
        T: WriteBinary<HostType>,
    {
        for val in iter {
            T::write(self, val)?;
        }
        Ok(())
    }

    /// Write a slice of bytes.
    fn write_bytes(&mut self, data: &[u8]) -> Result<(), WriteError>;

    /// Write `count` zero bytes.
    fn write_zeros(&mut self, count: usize) -> Result<(), WriteError>;

    /// The total number of bytes written so far.
    fn bytes_written(&self) -> usize;

    /// Reserve space for a `T` to be filled in later with `write_placeholder`.
    fn placeholder<T, HostType>(&mut self) -> Result<Placeholder<T, HostType>, WriteError>
    where
        T: WriteBinary<HostType> + ReadUnchecked,
    {
        let offset = self.bytes_written();
        self.write_zeros(T::SIZE)?;
        Ok(Placeholder {
            offset,
            length: T::SIZE,
            marker: PhantomData,
        })
    }

    /// Reserve space for `count` consecutive `T`s.
    fn placeholder_array<T, HostType>(
        &mut self,
        count: usize,
    ) -> Result<Vec<Placeholder<T, HostType>>, WriteError>
    where
        T: WriteBinary<HostType> + ReadUnchecked,
    {
        (0..count)
            .map(|_| self.placeholder::<T, HostType>())
            .collect()
    }

    /// Consume `placeholder`, writing `val` into the space it reserved.
    fn write_placeholder<T, HostType>(
        &mut self,
        placeholder: Placeholder<T, HostType>,
        val: HostType,
    ) -> Result<T::Output, WriteError>
    where
        T: WriteBinary<HostType>;
}

macro_rules! write_be {
    ($($binary:ty => $host:ty;)*) => {
        $(
            impl<T> WriteBinary<T> for $binary
            where
                T: Into<$host>,
            {
                type Output = ();

                fn write<C: WriteContext>(ctxt: &mut C, t: T) -> Result<(), WriteError> {
                    let val: $host = t.into();
                    ctxt.write_bytes(&val.to_be_bytes())
                }
            }
        )*
    };
}

write_be! {
    U8 => u8;
    U16Be => u16;
    I16Be => i16;
    U32Be => u32;
    I32Be => i32;
}

impl WriteContext for WriteBuffer {
    fn write_bytes(&mut self, data: &[u8]) -> Result<(), WriteError> {
        self.data.extend_from_slice(data);
        Ok(())
    }

    fn write_zeros(&mut self, count: usize) -> Result<(), WriteError> {
        self.data.resize(self.data.len() + count, 0);
        Ok(())
    }

    fn bytes_written(&self) -> usize {
        self.data.len()
    }

    fn write_placeholder<T, HostType>(
        &mut self,
        placeholder: Placeholder<T, HostType>,
        val: HostType,
    ) -> Result<T::Output, WriteError>
    where
        T: WriteBinary<HostType>,
    {
        let data = self
            .data
            .get_mut(placeholder.offset..)
            .and_then(|data| data.get_mut(..placeholder.length))
            .ok_or(WriteError::PlaceholderMismatch)?;
        let mut slice = WriteSlice { offset: 0, data };
        let output = T::write(&mut slice, val)?;
        if slice.offset != slice.data.len() {
            return Err(WriteError::PlaceholderMismatch);
        }
        Ok(output)
    }
}

impl WriteContext for WriteSlice<'_> {
    fn write_bytes(&mut self, data: &[u8]) -> Result<(), WriteError> {
        let end = self.offset + data.len();
        let dest = self
            .data
            .get_mut(self.offset..end)
            .ok_or(WriteError::PlaceholderMismatch)?;
        dest.copy_from_slice(data);
        self.offset = end;
        Ok(())
    }

    fn write_zeros(&mut self, count: usize) -> Result<(), WriteError> {
        let end = self.offset + count;
        let dest = self
            .data
            .get_mut(self.offset..end)
            .ok_or(WriteError::PlaceholderMismatch)?;
        dest.fill(0);
        self.offset = end;
        Ok(())
    }

    fn bytes_written(&self) -> usize {
        self.offset
    }

    fn write_placeholder<T, HostType>(
        &mut self,
        _placeholder: Placeholder<T, HostType>,
        _val: HostType,
    ) -> Result<T::Output, WriteError>
    where
        T: WriteBinary<HostType>,
    {
        // Placeholders are only resolved against the whole buffer
        Err(WriteError::NotImplemented)
    }
}

impl WriteBuffer {
    /// Create a new, empty `WriteBuffer`.
    pub fn new() -> Self {
        WriteBuffer::default()
    }

    /// The data written so far.
    pub fn bytes(&self) -> &[u8] {
        &self.data
    }

    /// The number of bytes written so far.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Returns `true` if nothing has been written.
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Consume `self` and return the written data.
    pub fn into_inner(self) -> Vec<u8> {
        self.data
    }
}
