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
//! Parsing, re-encoding and constant pool patching of JVM class files.
//!
//! A [`ClassFile`] is parsed from bytes into a model that keeps every constant pool index as
//! read, so that encoding it again reproduces the input exactly. Two parsed classes can be
//! diffed: the constants the reference has and the source lacks are inserted into the source,
//! and every index reachable from the source, down to bytecode operands, is renumbered.

#[macro_use]
extern crate classpatch_macros;

pub mod access;
pub mod annotation;
pub mod attr;
pub mod clazz;
pub mod code;
pub mod constant_pool;
pub mod constants;
pub mod cp;
pub mod cursor;
pub mod diff;
pub mod error;
pub mod insn;
pub mod member;
pub mod mod_utf8;
pub mod module;
pub mod patch;
pub mod prelude;
pub mod remap;
pub mod rw;
pub mod version;

#[cfg(test)]
mod tests;

pub use crate::clazz::ClassFile;
pub use crate::error::{Error, Result};
pub use crate::rw::{ConstantPoolReadWrite, ReadWrite};
