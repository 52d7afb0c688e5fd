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
//! Renumbering of constant pool indices.
//!
//! Every structure that stores a pool index implements [`Remap`], which routes each index through an
//! [`IndexMapper`]. The same traversal serves two purposes: [`Remapping`] rewrites indices after the
//! pool changed, and [`ReferenceCollector`] records them without changing anything.

use std::collections::BTreeSet;

use indexmap::IndexMap;

use crate::error::{Error, Result};

/// A visitor over constant pool indices.
pub trait IndexMapper {
    /// Returns the replacement for `index`.
    fn map_index(&mut self, index: u16) -> Result<u16>;

    /// Called for a structure whose payload may hold pool indices that cannot be located.
    fn opaque_payload(&mut self, _name_index: u16) {}

    /// Called when the bytecode walker stopped at `offset` and passed the rest through unchanged.
    fn coverage_gap(&mut self, _opcode: u8, _offset: usize) {}
}

/// Structures that hold constant pool indices.
///
/// This trait can be derived with #[derive(Remap)]. Fields are opted in with `#[index]` (a `u16` or `Vec<u16>` of
/// indices), `#[index(optional)]` (a `u16` where zero means absent), or `#[remap]` (a nested `Remap` value).
pub trait Remap {
    fn update<M: IndexMapper>(&mut self, mapping: &mut M) -> Result<()>;
}

impl<T: Remap> Remap for Vec<T> {
    fn update<M: IndexMapper>(&mut self, mapping: &mut M) -> Result<()> {
        for t in self {
            t.update(mapping)?;
        }
        Ok(())
    }
}

/// Fields that are pool indices themselves.
pub trait PoolIndex {
    fn update_index<M: IndexMapper>(&mut self, mapping: &mut M) -> Result<()>;
}

impl PoolIndex for u16 {
    #[inline]
    fn update_index<M: IndexMapper>(&mut self, mapping: &mut M) -> Result<()> {
        *self = mapping.map_index(*self)?;
        Ok(())
    }
}

impl PoolIndex for Vec<u16> {
    fn update_index<M: IndexMapper>(&mut self, mapping: &mut M) -> Result<()> {
        for idx in self {
            idx.update_index(mapping)?;
        }
        Ok(())
    }
}

/// Updates an index where `0` stands for "no entry".
#[inline]
pub fn update_optional_index<M: IndexMapper>(index: &mut u16, mapping: &mut M) -> Result<()> {
    if *index != 0 {
        index.update_index(mapping)?;
    }
    Ok(())
}

/// An old-to-new index table.
///
/// Indices without an entry are deleted slots; looking one up is a [`DanglingIndex`](Error::DanglingIndex).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Remapping {
    table: IndexMap<u16, u16>,
}

impl Remapping {
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    /// The identity mapping over slots `1..=size`.
    pub fn identity(size: u16) -> Self {
        Self {
            table: (1..=size).map(|i| (i, i)).collect(),
        }
    }

    #[inline]
    pub fn insert(&mut self, old: u16, new: u16) -> Option<u16> {
        self.table.insert(old, new)
    }

    #[inline]
    pub fn get(&self, index: u16) -> Result<u16> {
        self.table
            .get(&index)
            .copied()
            .ok_or(Error::DanglingIndex(index))
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.table.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }

    pub fn is_identity(&self) -> bool {
        self.table.iter().all(|(old, new)| old == new)
    }

    /// Pairs of `(old, new)` in the order they were inserted.
    pub fn iter(&self) -> impl Iterator<Item = (u16, u16)> + '_ {
        self.table.iter().map(|(&old, &new)| (old, new))
    }
}

impl IndexMapper for Remapping {
    #[inline]
    fn map_index(&mut self, index: u16) -> Result<u16> {
        self.get(index)
    }

    fn opaque_payload(&mut self, name_index: u16) {
        if !self.is_identity() {
            log::warn!(
                "attribute with name index {} is kept verbatim; pool indices inside it are not renumbered",
                name_index
            );
        }
    }

    fn coverage_gap(&mut self, opcode: u8, offset: usize) {
        log::warn!(
            "unsupported opcode {:#04X} at offset {}: remaining bytecode copied without renumbering",
            opcode,
            offset
        );
    }
}

/// Records every index it is shown and maps each one to itself.
#[derive(Debug, Clone, Default)]
pub struct ReferenceCollector {
    indices: BTreeSet<u16>,
    opaque: bool,
}

impl ReferenceCollector {
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    /// The distinct indices seen, ascending.
    #[inline]
    pub fn indices(&self) -> &BTreeSet<u16> {
        &self.indices
    }

    #[inline]
    pub fn contains(&self, index: u16) -> bool {
        self.indices.contains(&index)
    }

    /// Whether some visited structure may reference the pool in a way that was not reported.
    #[inline]
    pub fn saw_opaque(&self) -> bool {
        self.opaque
    }
}

impl IndexMapper for ReferenceCollector {
    #[inline]
    fn map_index(&mut self, index: u16) -> Result<u16> {
        self.indices.insert(index);
        Ok(index)
    }

    fn opaque_payload(&mut self, _name_index: u16) {
        self.opaque = true;
    }

    fn coverage_gap(&mut self, _opcode: u8, _offset: usize) {
        self.opaque = true;
    }
}
