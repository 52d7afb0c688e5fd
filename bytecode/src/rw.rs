/*
 *     This file is part of Classpatch.
 *
 *     Classpatch is free software: you can redistribute it and/or modify
 *     it under the terms of the GNU Lesser General Public License as published by
 *     the Free Software Foundation, either version 3 of the License, or
 *     (at your option) any later version.
 *
 *     Classpatch is distributed in the hope that it will be useful,
 *     but WITHOUT ANY WARRANTY; without even the implied warranty of
 *     MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
 *     GNU General Public License for more details.
 *
 *     You should have received a copy of the GNU Lesser General Public License
 *     along with Classpatch. (LICENSE.md)  If not, see <https://www.gnu.org/licenses/>.
 */

use std::convert::TryFrom;

use crate::constant_pool::ConstantPool;
use crate::cursor::{ByteCursor, WriteBytes};
use crate::error::{Error, Result};

/// The generic read and write trait. This indicates a structure can be read without additional contextual information.
///
/// This trait can be derived with #[derive(ReadWrite)] if all the types it can hold are also `ReadWrite`.
/// Furthermore, all integer types implement `ReadWrite`.
pub trait ReadWrite
where
    Self: Sized,
{
    fn read_from(reader: &mut ByteCursor<'_>) -> Result<Self>;
    fn write_to(&self, writer: &mut Vec<u8>) -> Result<()>;
}

/// The read and write trait where the structure must be read with constant pool information.
///
/// Attributes are the main users: their variant is chosen by resolving a name index through the pool.
/// Writing never consults the pool because every index is kept as-is in the model.
pub trait ConstantPoolReadWrite
where
    Self: Sized,
{
    fn read_from(cp: &ConstantPool, reader: &mut ByteCursor<'_>) -> Result<Self>;
    fn write_to(&self, writer: &mut Vec<u8>) -> Result<()>;
}

/// Helper macro to disambigurate if a type implements both [`ConstantPoolReadWrite`] and [`ReadWrite`].
///
/// [`ConstantPoolReadWrite`]: ConstantPoolReadWrite
/// [`ReadWrite`]: ReadWrite
#[macro_export]
macro_rules! read_from {
    ($reader: expr) => {
        $crate::ReadWrite::read_from($reader)
    };
    ($cp: expr, $reader: expr) => {
        $crate::ConstantPoolReadWrite::read_from($cp, $reader)
    };
}

/// Helper macro to disambigurate if a type implements both [`ConstantPoolReadWrite`] and [`ReadWrite`].
///
/// [`ConstantPoolReadWrite`]: ConstantPoolReadWrite
/// [`ReadWrite`]: ReadWrite
#[macro_export]
macro_rules! write_to {
    (cp $self: expr, $writer: expr) => {
        $crate::ConstantPoolReadWrite::write_to($self, $writer)
    };
    ($self: expr, $writer: expr) => {
        $crate::ReadWrite::write_to($self, $writer)
    };
}

macro_rules! impl_readwrite_nums {
    ($(($i:ty, $s:literal)),*) => {
        $(
            impl ReadWrite for $i {
                #[inline]
                fn read_from(reader: &mut ByteCursor<'_>) -> Result<Self> {
                    Ok(<$i>::from_be_bytes(reader.read_array::<$s>()?))
                }
                #[inline]
                fn write_to(&self, writer: &mut Vec<u8>) -> Result<()> {
                    writer.write_bytes(&self.to_be_bytes());
                    Ok(())
                }
            }
        )*
    };
}

impl_readwrite_nums! { (u8, 1), (i8, 1), (u16, 2), (i16, 2), (u32, 4), (i32, 4), (f32, 4), (u64, 8), (i64, 8), (f64, 8) }

/// Writes `len` as a u16 count field.
pub(crate) fn write_u16_len(len: usize, writer: &mut Vec<u8>) -> Result<()> {
    let len = u16::try_from(len).map_err(|_| Error::ArithmeticOverflow)?;
    writer.write_u16(len);
    Ok(())
}

/// Writes `len` as a u32 length field.
pub(crate) fn write_u32_len(len: usize, writer: &mut Vec<u8>) -> Result<()> {
    let len = u32::try_from(len).map_err(|_| Error::ArithmeticOverflow)?;
    writer.write_u32(len);
    Ok(())
}

/// Reads a sequence prefixed by a one-byte count.
pub(crate) fn read_u8_counted<T: ReadWrite>(reader: &mut ByteCursor<'_>) -> Result<Vec<T>> {
    let count = reader.read_u8()?;
    let mut vec = Vec::with_capacity(count as usize);
    for _ in 0..count {
        vec.push(T::read_from(reader)?);
    }
    Ok(vec)
}

/// Writes a sequence prefixed by a one-byte count; `what` names it in the error.
pub(crate) fn write_u8_counted<T: ReadWrite>(items: &[T], writer: &mut Vec<u8>, what: &'static str) -> Result<()> {
    if items.len() > u8::MAX as usize {
        return Err(Error::Invalid(what, format!("{} entries do not fit a one-byte count", items.len()).into()));
    }
    writer.write_u8(items.len() as u8);
    for item in items {
        item.write_to(writer)?;
    }
    Ok(())
}

/// Count-prefixed (u16) sequences.
impl<T: ReadWrite> ReadWrite for Vec<T> {
    fn read_from(reader: &mut ByteCursor<'_>) -> Result<Self> {
        let count = reader.read_u16()?;
        let mut vec = Vec::with_capacity(count as usize);
        for _ in 0..count {
            vec.push(T::read_from(reader)?);
        }
        Ok(vec)
    }

    fn write_to(&self, writer: &mut Vec<u8>) -> Result<()> {
        write_u16_len(self.len(), writer)?;
        for t in self {
            t.write_to(writer)?;
        }
        Ok(())
    }
}

/// Count-prefixed (u16) sequences of pool-dependent items.
impl<T: ConstantPoolReadWrite> ConstantPoolReadWrite for Vec<T> {
    fn read_from(cp: &ConstantPool, reader: &mut ByteCursor<'_>) -> Result<Self> {
        let count = reader.read_u16()?;
        let mut vec = Vec::with_capacity(count as usize);
        for _ in 0..count {
            vec.push(T::read_from(cp, reader)?);
        }
        Ok(vec)
    }

    fn write_to(&self, writer: &mut Vec<u8>) -> Result<()> {
        write_u16_len(self.len(), writer)?;
        for t in self {
            t.write_to(writer)?;
        }
        Ok(())
    }
}
