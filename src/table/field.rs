//! Typed views over one field of every cell.
//!
//! Cells are packed without padding, so field values are generally
//! unaligned. Reads and writes go through zerocopy's copying
//! `read_from_bytes` / `write_to`, which have no alignment requirement.

use std::marker::PhantomData;
use std::mem::size_of;

use zerocopy::{FromBytes, Immutable, IntoBytes};

use super::Table;

/// A plain scalar that can be stored in a table field. `TYPE_NAME` is the
/// field type name stored in files (`eos::real32`, `eos::nat16`, ...).
pub trait FieldType: FromBytes + IntoBytes + Immutable + Copy + 'static {
    const TYPE_NAME: &'static str;
}

macro_rules! field_types {
    ($($ty:ty => $name:literal),* $(,)?) => {
        $(
            impl FieldType for $ty {
                const TYPE_NAME: &'static str = $name;
            }
        )*
    };
}

field_types! {
    i8 => "eos::int8",
    i16 => "eos::int16",
    i32 => "eos::int32",
    i64 => "eos::int64",
    u8 => "eos::nat8",
    u16 => "eos::nat16",
    u32 => "eos::nat32",
    u64 => "eos::nat64",
    f32 => "eos::real32",
    f64 => "eos::real64",
}

/// Byte offset of `pos` in a grid, or `None` if any coordinate is out of
/// range. Missing trailing coordinates are zero.
fn locate(shape: &[usize], strides: &[usize], pos: &[usize]) -> Option<usize> {
    if pos.len() > shape.len() {
        return None;
    }
    pos.iter()
        .zip(shape)
        .zip(strides)
        .try_fold(0, |acc, ((&p, &size), &stride)| {
            (p < size).then_some(acc + p * stride)
        })
}

pub struct Field<'a, T> {
    data: &'a [u8],
    shape: &'a [usize],
    strides: &'a [usize],
    offset: usize,
    width: usize,
    _marker: PhantomData<T>,
}

impl<'a, T: FieldType> Field<'a, T> {
    pub fn get(&self, pos: &[usize]) -> Option<T> {
        let start = locate(self.shape, self.strides, pos)? + self.offset;
        T::read_from_bytes(self.data.get(start..start + size_of::<T>())?).ok()
    }

    /// Number of cells.
    pub fn len(&self) -> usize {
        self.shape.iter().product()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Values of every cell in storage order.
    pub fn iter(&self) -> impl Iterator<Item = T> + 'a {
        let (data, offset, cell) = (self.data, self.offset, self.strides[0]);
        (0..self.len()).filter_map(move |i| {
            let start = i * cell + offset;
            T::read_from_bytes(data.get(start..start + size_of::<T>())?).ok()
        })
    }

    /// A view of a `U` that sits `offset` bytes into this field, e.g. one
    /// component of a vector-valued field.
    pub fn sub_field<U: FieldType>(&self, offset: usize) -> Option<Field<'a, U>> {
        (offset + size_of::<U>() <= self.width).then(|| Field {
            data: self.data,
            shape: self.shape,
            strides: self.strides,
            offset: self.offset + offset,
            width: self.width - offset,
            _marker: PhantomData,
        })
    }
}

pub struct FieldMut<'a, T> {
    data: &'a mut [u8],
    shape: &'a [usize],
    strides: &'a [usize],
    offset: usize,
    width: usize,
    _marker: PhantomData<T>,
}

impl<'a, T: FieldType> FieldMut<'a, T> {
    pub fn as_field(&self) -> Field<'_, T> {
        Field {
            data: &*self.data,
            shape: self.shape,
            strides: self.strides,
            offset: self.offset,
            width: self.width,
            _marker: PhantomData,
        }
    }

    pub fn get(&self, pos: &[usize]) -> Option<T> {
        self.as_field().get(pos)
    }

    pub fn set(&mut self, pos: &[usize], value: T) -> bool {
        let Some(start) = locate(self.shape, self.strides, pos) else {
            return false;
        };
        let start = start + self.offset;
        match self.data.get_mut(start..start + size_of::<T>()) {
            Some(dst) => value.write_to(dst).is_ok(),
            None => false,
        }
    }

    /// Writes `value` into every cell.
    pub fn fill(&mut self, value: T) {
        let cell = self.strides[0];
        if cell == 0 {
            return;
        }
        for chunk in self.data.chunks_exact_mut(cell) {
            let dst = &mut chunk[self.offset..self.offset + size_of::<T>()];
            let _ = value.write_to(dst);
        }
    }

    pub fn sub_field_mut<U: FieldType>(self, offset: usize) -> Option<FieldMut<'a, U>> {
        (offset + size_of::<U>() <= self.width).then(|| FieldMut {
            data: self.data,
            shape: self.shape,
            strides: self.strides,
            offset: self.offset + offset,
            width: self.width - offset,
            _marker: PhantomData,
        })
    }
}

impl Table {
    /// Typed view of field `index`. `None` if the field is narrower than `T`.
    pub fn field_at<T: FieldType>(&self, index: usize) -> Option<Field<'_, T>> {
        let def = self.field_def(index)?;
        (size_of::<T>() <= def.size).then(|| Field {
            data: &self.data,
            shape: &self.shape,
            strides: &self.strides,
            offset: def.offset,
            width: def.size,
            _marker: PhantomData,
        })
    }

    pub fn field<T: FieldType>(&self, name: &str) -> Option<Field<'_, T>> {
        self.field_at(self.index_of(name)?)
    }

    pub fn field_at_mut<T: FieldType>(&mut self, index: usize) -> Option<FieldMut<'_, T>> {
        let def = self.field_def(index)?;
        let (offset, width) = (def.offset, def.size);
        (size_of::<T>() <= width).then(|| FieldMut {
            data: &mut self.data,
            shape: &self.shape,
            strides: &self.strides,
            offset,
            width,
            _marker: PhantomData,
        })
    }

    pub fn field_mut<T: FieldType>(&mut self, name: &str) -> Option<FieldMut<'_, T>> {
        let index = self.index_of(name)?;
        self.field_at_mut(index)
    }
}
