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
//! Fields and methods.

use crate::access::AccessFlags;
use crate::attr::Attribute;
use crate::constant_pool::ConstantPool;
use crate::cursor::ByteCursor;
use crate::error::Result;
use crate::rw::ConstantPoolReadWrite;
use crate::{read_from, write_to};

macro_rules! member {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Remap)]
        pub struct $name {
            pub access_flags: AccessFlags,
            #[index]
            pub name_index: u16,
            #[index]
            pub descriptor_index: u16,
            #[remap]
            pub attributes: Vec<Attribute>,
        }

        impl $name {
            pub fn new(access_flags: AccessFlags, name_index: u16, descriptor_index: u16) -> Self {
                Self {
                    access_flags,
                    name_index,
                    descriptor_index,
                    attributes: vec![],
                }
            }
        }

        impl ConstantPoolReadWrite for $name {
            fn read_from(cp: &ConstantPool, reader: &mut ByteCursor<'_>) -> Result<Self> {
                Ok(Self {
                    access_flags: read_from!(reader)?,
                    name_index: reader.read_u16()?,
                    descriptor_index: reader.read_u16()?,
                    attributes: read_from!(cp, reader)?,
                })
            }

            fn write_to(&self, writer: &mut Vec<u8>) -> Result<()> {
                write_to!(&self.access_flags, writer)?;
                write_to!(&self.name_index, writer)?;
                write_to!(&self.descriptor_index, writer)?;
                write_to!(cp &self.attributes, writer)
            }
        }
    };
}

member! {
    /// A field declared by a class.
    Field
}

member! {
    /// A method declared by a class. Its bytecode lives in a `Code` attribute.
    Method
}
