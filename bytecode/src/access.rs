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
//! Access flags of classes, fields, methods and inner classes.

use crate::cursor::ByteCursor;
use crate::rw::ReadWrite;
use crate::Result;

bitflags::bitflags! {
    /// The union of every access flag the class file format defines.
    ///
    /// Several flags share a bit and are told apart by where they appear.
    /// Bits this crate does not name are retained so that flags round-trip unchanged.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct AccessFlags: u16 {
        // @formatter:off
        const ACC_PUBLIC       = 0b0000_0000_0000_0001;
        const ACC_PRIVATE      = 0b0000_0000_0000_0010;
        const ACC_PROTECTED    = 0b0000_0000_0000_0100;
        const ACC_STATIC       = 0b0000_0000_0000_1000;
        const ACC_FINAL        = 0b0000_0000_0001_0000;
        const ACC_SUPER        = 0b0000_0000_0010_0000;
        const ACC_SYNCHRONIZED = 0b0000_0000_0010_0000;
        const ACC_VOLATILE     = 0b0000_0000_0100_0000;
        const ACC_BRIDGE       = 0b0000_0000_0100_0000;
        const ACC_VARARGS      = 0b0000_0000_1000_0000;
        const ACC_TRANSIENT    = 0b0000_0000_1000_0000;
        const ACC_NATIVE       = 0b0000_0001_0000_0000;
        const ACC_INTERFACE    = 0b0000_0010_0000_0000;
        const ACC_ABSTRACT     = 0b0000_0100_0000_0000;
        const ACC_STRICT       = 0b0000_1000_0000_0000;
        const ACC_SYNTHETIC    = 0b0001_0000_0000_0000;
        const ACC_ANNOTATION   = 0b0010_0000_0000_0000;
        const ACC_ENUM         = 0b0100_0000_0000_0000;
        const ACC_MODULE       = 0b1000_0000_0000_0000;
        // @formatter:on
    }
}

impl Default for AccessFlags {
    fn default() -> Self {
        AccessFlags::empty()
    }
}

impl ReadWrite for AccessFlags {
    fn read_from(reader: &mut ByteCursor<'_>) -> Result<AccessFlags> {
        Ok(AccessFlags::from_bits_retain(u16::read_from(reader)?))
    }

    fn write_to(&self, writer: &mut Vec<u8>) -> Result<()> {
        self.bits().write_to(writer)
    }
}
