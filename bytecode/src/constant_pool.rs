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
//! The constant pool: a 1-indexed table where Long and Double entries take two slots.

use std::convert::TryFrom;

use crate::attr::BootstrapMethod;
use crate::cp::{Constant, Utf8Bytes};
use crate::cursor::{ByteCursor, WriteBytes};
use crate::error::{Error, Result};
use crate::remap::{IndexMapper, Remap};
use crate::rw::ReadWrite;

/// Without bootstrap methods the deepest legal chain is MethodHandle -> MethodRef -> NameAndType -> Utf8.
/// Dynamic constants used as bootstrap arguments nest further.
const MAX_RESOLVE_DEPTH: u8 = 16;

/// A constant pool.
///
/// `slots[i]` holds pool index `i + 1`. The slot following a Long or Double is `None`: it is counted
/// in the pool size but cannot be addressed.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConstantPool {
    slots: Vec<Option<Constant>>,
}

/// The value a constant denotes once every index inside it is followed to its leaves.
///
/// Two constants from different pools are structurally equal iff their resolved values are equal.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ResolvedConstant {
    Utf8(Utf8Bytes),
    Integer(i32),
    Float(u32),
    Long(i64),
    Double(u64),
    /// Every reference kind: the tag, plus non-index operands and the resolved targets.
    Ref {
        tag: u8,
        extra: u16,
        targets: Vec<ResolvedConstant>,
    },
}

impl ConstantPool {
    #[inline]
    pub const fn new() -> Self {
        Self { slots: Vec::new() }
    }

    /// Reads entries until `declared_count - 1` slots are filled.
    ///
    /// `declared_count` is the raw count field of the class file, one greater than the number of slots.
    pub fn parse(reader: &mut ByteCursor<'_>, declared_count: u16) -> Result<Self> {
        let mut cp = ConstantPool {
            slots: Vec::with_capacity(declared_count as usize),
        };
        let mut i: u16 = 1;
        while i < declared_count {
            let entry = Constant::read_from(reader).map_err(|e| match e {
                Error::UnexpectedEof { .. } => Error::TruncatedConstant { index: i },
                e => e,
            })?;
            i = i.checked_add(entry.size()).ok_or(Error::ArithmeticOverflow)?;
            cp.push(entry)?;
        }
        if i != declared_count {
            return Err(Error::Invalid(
                "constant pool count",
                format!("wide entry at the end overruns the declared count {}", declared_count).into(),
            ));
        }
        Ok(cp)
    }

    /// The number of slots, wide entries counting twice.
    #[inline]
    pub fn size(&self) -> u16 {
        self.slots.len() as u16
    }

    /// The value of the constant-pool-count field for this pool.
    #[inline]
    pub fn count_field(&self) -> u16 {
        self.size() + 1
    }

    /// The number of entries, wide entries counting once.
    pub fn len(&self) -> usize {
        self.slots.iter().filter(|s| s.is_some()).count()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Fails if adding `entry` would leave a pool whose count field does not fit in a u16.
    fn reserve(&self, entry: &Constant) -> Result<()> {
        if self.slots.len() + entry.size() as usize >= u16::MAX as usize {
            return Err(Error::ArithmeticOverflow);
        }
        Ok(())
    }

    /// Appends an entry and returns its index.
    pub fn push(&mut self, entry: Constant) -> Result<u16> {
        self.reserve(&entry)?;
        let idx = self.size() + 1;
        let wide = entry.is_wide();
        self.slots.push(Some(entry));
        if wide {
            self.slots.push(None);
        }
        Ok(idx)
    }

    /// Inserts an entry at `index`, shifting the entry at that slot and every later one up.
    pub fn insert(&mut self, index: u16, entry: Constant) -> Result<()> {
        if index == 0 || index as usize > self.slots.len() + 1 {
            return Err(Error::InvalidPoolIndex(index));
        }
        self.reserve(&entry)?;
        let at = index as usize - 1;
        if let Some(None) = self.slots.get(at) {
            // would split a wide entry from its reserved slot
            return Err(Error::InvalidPoolIndex(index));
        }
        if entry.is_wide() {
            self.slots.insert(at, None);
        }
        self.slots.insert(at, Some(entry));
        Ok(())
    }

    /// Removes the entry at `index` together with its reserved slot if it is wide.
    pub fn remove(&mut self, index: u16) -> Result<Constant> {
        let at = index.checked_sub(1).ok_or(Error::InvalidPoolIndex(index))? as usize;
        match self.slots.get_mut(at).map(Option::take) {
            Some(Some(entry)) => {
                self.slots.remove(at);
                if entry.is_wide() {
                    self.slots.remove(at);
                }
                Ok(entry)
            }
            _ => Err(Error::InvalidPoolIndex(index)),
        }
    }

    /// Returns the entry at `index`.
    ///
    /// Fails if `index` is zero, past the end, or the reserved half of a wide entry.
    pub fn resolve(&self, index: u16) -> Result<&Constant> {
        index
            .checked_sub(1)
            .and_then(|i| self.slots.get(i as usize))
            .and_then(Option::as_ref)
            .ok_or(Error::InvalidPoolIndex(index))
    }

    /// Resolves `index` to the bytes of a Utf8 entry.
    pub fn resolve_utf8(&self, index: u16) -> Result<&Utf8Bytes> {
        match self.resolve(index)? {
            Constant::Utf8(b) => Ok(b),
            _ => Err(Error::InvalidPoolIndex(index)),
        }
    }

    /// Resolves `index` to a class reference and returns the index of its name.
    pub fn resolve_class(&self, index: u16) -> Result<u16> {
        match self.resolve(index)? {
            Constant::ClassRef { name_index } => Ok(*name_index),
            _ => Err(Error::InvalidPoolIndex(index)),
        }
    }

    /// Iterates over `(index, entry)` pairs in index order, skipping reserved slots.
    pub fn iter(&self) -> impl Iterator<Item = (u16, &Constant)> + '_ {
        self.slots
            .iter()
            .enumerate()
            .filter_map(|(i, s)| s.as_ref().map(|c| (i as u16 + 1, c)))
    }

    /// Whether `index` names a slot that holds an entry.
    #[inline]
    pub fn is_addressable(&self, index: u16) -> bool {
        self.resolve(index).is_ok()
    }

    /// Whether slot `index` is the reserved half of a wide entry.
    #[inline]
    pub fn is_reserved(&self, index: u16) -> bool {
        index
            .checked_sub(1)
            .and_then(|i| self.slots.get(i as usize))
            .map_or(false, Option::is_none)
    }

    /// Follows every index inside the entry at `index` down to its leaves.
    ///
    /// The bootstrap method index of a Dynamic or InvokeDynamic entry is taken as a plain number.
    pub fn resolve_value(&self, index: u16) -> Result<ResolvedConstant> {
        self.resolve_value_depth(index, 0, None)
    }

    /// Like [`resolve_value`](Self::resolve_value), but follows the bootstrap method index of
    /// Dynamic and InvokeDynamic entries into `bootstrap_methods` when it is in range.
    pub fn resolve_value_in(&self, index: u16, bootstrap_methods: &[BootstrapMethod]) -> Result<ResolvedConstant> {
        self.resolve_value_depth(index, 0, Some(bootstrap_methods))
    }

    fn resolve_value_depth(
        &self,
        index: u16,
        depth: u8,
        bootstrap_methods: Option<&[BootstrapMethod]>,
    ) -> Result<ResolvedConstant> {
        if depth > MAX_RESOLVE_DEPTH {
            return Err(Error::Invalid(
                "constant reference chain",
                format!("too deep at index {}", index).into(),
            ));
        }
        let follow = |tag: u8, extra: u16, targets: &[u16]| -> Result<ResolvedConstant> {
            let targets = targets
                .iter()
                .map(|&t| self.resolve_value_depth(t, depth + 1, bootstrap_methods))
                .collect::<Result<Vec<_>>>()?;
            Ok(ResolvedConstant::Ref { tag, extra, targets })
        };
        let entry = self.resolve(index)?;
        let tag = entry.tag();
        Ok(match *entry {
            Constant::Utf8(ref b) => ResolvedConstant::Utf8(b.clone()),
            Constant::Integer(i) => ResolvedConstant::Integer(i),
            Constant::Float(f) => ResolvedConstant::Float(f.to_bits()),
            Constant::Long(l) => ResolvedConstant::Long(l),
            Constant::Double(d) => ResolvedConstant::Double(d.to_bits()),
            Constant::ClassRef { name_index }
            | Constant::Module { name_index }
            | Constant::Package { name_index } => follow(tag, 0, &[name_index])?,
            Constant::StringRef { string_index } => follow(tag, 0, &[string_index])?,
            Constant::MethodType { descriptor_index } => follow(tag, 0, &[descriptor_index])?,
            Constant::FieldRef {
                class_index,
                name_and_type_index,
            }
            | Constant::MethodRef {
                class_index,
                name_and_type_index,
            }
            | Constant::InterfaceMethodRef {
                class_index,
                name_and_type_index,
            } => follow(tag, 0, &[class_index, name_and_type_index])?,
            Constant::NameAndType {
                name_index,
                descriptor_index,
            } => follow(tag, 0, &[name_index, descriptor_index])?,
            Constant::MethodHandle {
                reference_kind,
                reference_index,
            } => follow(tag, reference_kind as u16, &[reference_index])?,
            Constant::Dynamic {
                bootstrap_method_attr_index,
                name_and_type_index,
            }
            | Constant::InvokeDynamic {
                bootstrap_method_attr_index,
                name_and_type_index,
            } => match bootstrap_methods.and_then(|b| b.get(bootstrap_method_attr_index as usize)) {
                Some(method) => {
                    let mut targets = vec![name_and_type_index, method.method_ref];
                    targets.extend_from_slice(&method.arguments);
                    follow(tag, 0, &targets)?
                }
                None => follow(tag, bootstrap_method_attr_index, &[name_and_type_index])?,
            },
        })
    }

    /// Compares the entry at `a_index` of this pool with the entry at `b_index` of `other` by value.
    ///
    /// Indices that do not resolve make the entries unequal.
    pub fn structural_equals(&self, a_index: u16, other: &ConstantPool, b_index: u16) -> bool {
        match (self.resolve_value(a_index), other.resolve_value(b_index)) {
            (Ok(a), Ok(b)) => a == b,
            _ => false,
        }
    }

    /// Writes the count field followed by every entry.
    pub fn write_to(&self, writer: &mut Vec<u8>) -> Result<()> {
        let count = u16::try_from(self.slots.len() + 1).map_err(|_| Error::ArithmeticOverflow)?;
        writer.write_u16(count);
        for (_, entry) in self.iter() {
            entry.write_to(writer)?;
        }
        Ok(())
    }
}

/// Updates the index fields of every entry.
impl Remap for ConstantPool {
    fn update<M: IndexMapper>(&mut self, mapping: &mut M) -> Result<()> {
        for entry in self.slots.iter_mut().flatten() {
            entry.update(mapping)?;
        }
        Ok(())
    }
}

impl TryFrom<Vec<Constant>> for ConstantPool {
    type Error = Error;

    fn try_from(entries: Vec<Constant>) -> Result<Self> {
        let mut cp = ConstantPool::new();
        for e in entries {
            cp.push(e)?;
        }
        Ok(cp)
    }
}
