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
//! Useful re-exports that can be reused.

pub use crate::access::AccessFlags;
pub use crate::annotation::*;
pub use crate::attr::*;
pub use crate::clazz::ClassFile;
pub use crate::code::stack_map::*;
pub use crate::code::*;
pub use crate::constant_pool::{ConstantPool, ResolvedConstant};
pub use crate::cp::{Constant, Utf8Bytes};
pub use crate::cursor::{ByteCursor, WriteBytes};
pub use crate::diff::{DiffOptions, PoolDiff, PoolDiffer};
pub use crate::member::*;
pub use crate::module::*;
pub use crate::patch::{Patch, PoolEdit};
pub use crate::remap::{IndexMapper, ReferenceCollector, Remap, Remapping};
pub use crate::version::JavaVersion;
pub use crate::{read_from, write_to, ConstantPoolReadWrite, Error, ReadWrite, Result};
