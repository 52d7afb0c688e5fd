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
use std::borrow::Cow;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Bad magic: expected 0xCAFEBABE, found {0:#010X}")]
    BadMagic(u32),
    #[error("Unexpected end of input: needed {needed} byte(s) but only {remaining} remain")]
    UnexpectedEof { needed: usize, remaining: usize },
    #[error("Constant pool entry #{index} is truncated")]
    TruncatedConstant { index: u16 },
    #[error("Invalid constant pool index: {0}")]
    InvalidPoolIndex(u16),
    /// A remapping lookup found no entry for an index.
    ///
    /// This is never caused by valid input: it means the mapping or the model it is applied to is inconsistent.
    #[error("Index {0} has no entry in the remapping")]
    DanglingIndex(u16),
    #[error("Unsupported opcode {opcode:#04X} at bytecode offset {offset}")]
    UnsupportedOpcode { opcode: u8, offset: usize },
    #[error("Unrecognized {0}: {1}")]
    Unrecognized(&'static str, String),
    #[error("Invalid {0}: {1}")]
    Invalid(&'static str, Cow<'static, str>),
    #[error("Attribute length mismatch in {name}: declared {declared} bytes but {consumed} bytes were consumed")]
    AttributeLength {
        name: Cow<'static, str>,
        declared: u32,
        consumed: u32,
    },
    #[error("Conversion overflows")]
    ArithmeticOverflow,
    #[error(transparent)]
    Mutf(#[from] crate::mod_utf8::MUTFError),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
