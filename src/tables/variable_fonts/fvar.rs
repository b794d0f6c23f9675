#![deny(missing_docs)]

//! `fvar` Font Variations Table
//!
//! Only the axis records are decoded. They define the order of the coordinates in every tuple
//! used by the other variation tables.
//!
//! <https://learn.microsoft.com/en-us/typography/opentype/spec/fvar>

use crate::binary::read::{ReadArray, ReadBinary, ReadCtxt, ReadFrom};
use crate::binary::{U16Be, U32Be};
use crate::error::ParseError;
use crate::tables::variable_fonts::OwnedTuple;
use crate::tables::{F2Dot14, Fixed};

/// The axes of a variable font.
pub struct FvarTable<'a> {
    /// Minor version of the table. Only major version 1 is read.
    pub minor_version: u16,
    axes: ReadArray<'a, VariationAxisRecord>,
    /// Number of named instances. The instance records themselves are not read.
    pub instance_count: u16,
}

/// One design axis, with its range in user units.
#[derive(Eq, PartialEq, Debug, Copy, Clone)]
pub struct VariationAxisRecord {
    /// Axis tag, such as `wght`.
    pub axis_tag: u32,
    /// Minimum user value.
    pub min_value: Fixed,
    /// User value at the default location, where the normalized coordinate is 0.
    pub default_value: Fixed,
    /// Maximum user value.
    pub max_value: Fixed,
    /// Axis flags. Bit 0 marks an axis that should be hidden from users.
    pub flags: u16,
    /// `name` table id of the axis name.
    pub axis_name_id: u16,
}

impl FvarTable<'_> {
    /// The axes in coordinate order.
    pub fn axes(&self) -> impl Iterator<Item = VariationAxisRecord> + '_ {
        self.axes.iter()
    }

    /// The number of coordinates in a tuple for this font.
    pub fn axis_count(&self) -> u16 {
        // The array was read with a u16 length
        self.axes.len() as u16
    }

    /// The coordinate index of `axis_tag`, if the font has that axis.
    pub fn axis_index(&self, axis_tag: u32) -> Option<usize> {
        self.axes().position(|axis| axis.axis_tag == axis_tag)
    }

    /// Build a tuple from normalized coordinates in axis order.
    ///
    /// Returns `None` unless there is exactly one value per axis.
    pub fn owned_tuple(&self, values: &[F2Dot14]) -> Option<OwnedTuple> {
        (values.len() == usize::from(self.axis_count())).then(|| OwnedTuple::new(values))
    }
}

impl ReadBinary for FvarTable<'_> {
    type HostType<'a> = FvarTable<'a>;

    fn read<'a>(ctxt: &mut ReadCtxt<'a>) -> Result<Self::HostType<'a>, ParseError> {
        let table = ctxt.scope();
        let major_version = ctxt.read_u16be()?;
        ctxt.check_version(major_version == 1)?;
        let minor_version = ctxt.read_u16be()?;
        let axes_offset = ctxt.read_u16be()?;
        ctxt.read_u16be()?; // reserved
        let axis_count = ctxt.read_u16be()?;
        let axis_size = ctxt.read_u16be()?;
        let instance_count = ctxt.read_u16be()?;
        // Axis records may be longer in later minor versions
        let axes = table
            .offset(usize::from(axes_offset))
            .ctxt()
            .read_array_stride(usize::from(axis_count), usize::from(axis_size))?;

        Ok(FvarTable {
            minor_version,
            axes,
            instance_count,
        })
    }
}

impl ReadFrom for VariationAxisRecord {
    type ReadType = ((U32Be, Fixed, Fixed), (Fixed, U16Be, U16Be));

    fn read_from(
        ((axis_tag, min_value, default_value), (max_value, flags, axis_name_id)): (
            (u32, Fixed, Fixed),
            (Fixed, u16, u16),
        ),
    ) -> Self {
        VariationAxisRecord {
            axis_tag,
            min_value,
            default_value,
            max_value,
            flags,
            axis_name_id,
        }
    }
}
