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
//! This module contains the constant pool entry model.

use std::fmt;
use std::ops::Deref;

use crate::cursor::{ByteCursor, WriteBytes};
use crate::error::Result;
use crate::mod_utf8::{modified_utf8_to_string, string_to_modified_utf8, MUTFError};
use crate::rw::{write_u16_len, ReadWrite};

/// The raw content of a Utf8 entry.
///
/// The bytes are kept exactly as read; they are not required to be valid modified UTF-8.
#[derive(Clone, PartialEq, Eq, Hash, Default)]
pub struct Utf8Bytes(pub Vec<u8>);

impl Utf8Bytes {
    /// Decodes the bytes as modified UTF-8.
    pub fn decode(&self) -> Result<String, MUTFError> {
        modified_utf8_to_string(&self.0)
    }
}

impl Deref for Utf8Bytes {
    type Target = [u8];

    #[inline]
    fn deref(&self) -> &[u8] {
        &self.0
    }
}

impl From<&str> for Utf8Bytes {
    fn from(s: &str) -> Self {
        Utf8Bytes(string_to_modified_utf8(s))
    }
}

impl From<Vec<u8>> for Utf8Bytes {
    #[inline]
    fn from(v: Vec<u8>) -> Self {
        Utf8Bytes(v)
    }
}

impl fmt::Debug for Utf8Bytes {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.decode() {
            Ok(s) => write!(f, "{:?}", s),
            Err(_) => write!(f, "{:02X?}", self.0),
        }
    }
}

impl ReadWrite for Utf8Bytes {
    fn read_from(reader: &mut ByteCursor<'_>) -> Result<Self> {
        let len = reader.read_u16()?;
        Ok(Utf8Bytes(reader.read_bytes(len as usize)?.to_vec()))
    }

    fn write_to(&self, writer: &mut Vec<u8>) -> Result<()> {
        write_u16_len(self.0.len(), writer)?;
        writer.write_bytes(&self.0);
        Ok(())
    }
}

/// One constant pool entry, holding unresolved indices to other entries.
///
/// Floating point values compare by their bit patterns when diffing, so `NaN` payloads survive.
#[derive(ReadWrite, Remap, Debug, Clone, PartialEq)]
#[tag_type(u8)]
pub enum Constant {
    #[tag(1)]
    Utf8(Utf8Bytes),
    #[tag(3)]
    Integer(i32),
    Float(f32),
    Long(i64),
    Double(f64),
    ClassRef {
        #[index]
        name_index: u16,
    },
    StringRef {
        #[index]
        string_index: u16,
    },
    FieldRef {
        #[index]
        class_index: u16,
        #[index]
        name_and_type_index: u16,
    },
    MethodRef {
        #[index]
        class_index: u16,
        #[index]
        name_and_type_index: u16,
    },
    InterfaceMethodRef {
        #[index]
        class_index: u16,
        #[index]
        name_and_type_index: u16,
    },
    NameAndType {
        #[index]
        name_index: u16,
        #[index]
        descriptor_index: u16,
    },
    #[tag(15)]
    MethodHandle {
        reference_kind: u8,
        #[index]
        reference_index: u16,
    },
    MethodType {
        #[index]
        descriptor_index: u16,
    },
    /// `bootstrap_method_attr_index` points into the BootstrapMethods attribute, not the pool.
    Dynamic {
        bootstrap_method_attr_index: u16,
        #[index]
        name_and_type_index: u16,
    },
    InvokeDynamic {
        bootstrap_method_attr_index: u16,
        #[index]
        name_and_type_index: u16,
    },
    Module {
        #[index]
        name_index: u16,
    },
    Package {
        #[index]
        name_index: u16,
    },
}

impl Constant {
    /// Shorthand for a Utf8 entry holding the modified UTF-8 encoding of `s`.
    #[inline]
    pub fn utf8(s: &str) -> Self {
        Constant::Utf8(s.into())
    }

    /// returns the number of pool slots that this entry takes.
    #[inline]
    pub const fn size(&self) -> u16 {
        match self {
            Constant::Long(_) | Constant::Double(_) => 2,
            _ => 1,
        }
    }

    /// Returns `true` if this entry is a Long/Double constant, which takes 2 indices.
    #[inline]
    pub const fn is_wide(&self) -> bool {
        matches!(self, Constant::Long(_) | Constant::Double(_))
    }

    /// The tag byte this entry is encoded with.
    pub const fn tag(&self) -> u8 {
        match self {
            Constant::Utf8(_) => 1,
            Constant::Integer(_) => 3,
            Constant::Float(_) => 4,
            Constant::Long(_) => 5,
            Constant::Double(_) => 6,
            Constant::ClassRef { .. } => 7,
            Constant::StringRef { .. } => 8,
            Constant::FieldRef { .. } => 9,
            Constant::MethodRef { .. } => 10,
            Constant::InterfaceMethodRef { .. } => 11,
            Constant::NameAndType { .. } => 12,
            Constant::MethodHandle { .. } => 15,
            Constant::MethodType { .. } => 16,
            Constant::Dynamic { .. } => 17,
            Constant::InvokeDynamic { .. } => 18,
            Constant::Module { .. } => 19,
            Constant::Package { .. } => 20,
        }
    }

    /// Encodes this entry, tag byte included.
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        let mut buf = Vec::with_capacity(self.encoded_len());
        self.write_to(&mut buf)?;
        Ok(buf)
    }

    /// The size of the encoded entry in bytes, tag byte included.
    pub fn encoded_len(&self) -> usize {
        1 + match self {
            Constant::Utf8(b) => 2 + b.len(),
            Constant::Integer(_)
            | Constant::Float(_)
            | Constant::FieldRef { .. }
            | Constant::MethodRef { .. }
            | Constant::InterfaceMethodRef { .. }
            | Constant::NameAndType { .. }
            | Constant::Dynamic { .. }
            | Constant::InvokeDynamic { .. } => 4,
            Constant::Long(_) | Constant::Double(_) => 8,
            Constant::ClassRef { .. }
            | Constant::StringRef { .. }
            | Constant::MethodType { .. }
            | Constant::Module { .. }
            | Constant::Package { .. } => 2,
            Constant::MethodHandle { .. } => 3,
        }
    }
}
