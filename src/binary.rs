//! Big-endian primitive types and the traits for reading and writing them.

/// Read binary data
pub mod read;

/// Write binary data
pub mod write;

/// Marker types naming the encoding of a value. They are used as `T` in `ReadArray<T>`,
/// `ctxt.read::<T>()` and `T::write(ctxt, value)`.
#[derive(Copy, Clone)]
pub enum U8 {}

#[derive(Copy, Clone)]
pub enum I8 {}

#[derive(Copy, Clone)]
pub enum U16Be {}

#[derive(Copy, Clone)]
pub enum I16Be {}

#[derive(Copy, Clone)]
pub enum U32Be {}

#[derive(Copy, Clone)]
pub enum I32Be {}
