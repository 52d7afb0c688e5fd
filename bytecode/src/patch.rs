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
//! Patch records: an ordered list of constant pool edits.
//!
//! A patch is replayed against the class it was computed from. Replaying renumbers every index
//! reachable from the class, bytecode operands included. Bootstrap methods needed by inserted
//! Dynamic and InvokeDynamic constants travel with the patch as their own edits.

use std::collections::BTreeSet;

use log::debug;

use crate::attr::{Attribute, AttributeInfo, BootstrapMethod};
use crate::clazz::ClassFile;
use crate::constant_pool::ConstantPool;
use crate::cp::Constant;
use crate::cursor::ByteCursor;
use crate::error::{Error, Result};
use crate::remap::{ReferenceCollector, Remap, Remapping};
use crate::rw::ReadWrite;

/// One primitive edit. Positions are 1-based pool slots at the time the edit is applied.
#[derive(Debug, Clone, PartialEq, ReadWrite)]
#[tag_type(u8)]
pub enum PoolEdit {
    /// Inserts `constant` at `position`, shifting that slot and every later one up.
    /// Indices inside `constant` are in the numbering of the finished pool.
    #[tag(0)]
    Insert { position: u16, constant: Constant },
    /// Removes the constant at `position`, together with its reserved slot if it is wide.
    Delete { position: u16 },
    /// Appends `method` to the `BootstrapMethods` attribute, which is created under the Utf8 name at
    /// `name_index` if the class has none. Indices are in the numbering of the finished pool.
    Bootstrap {
        name_index: u16,
        method: BootstrapMethod,
    },
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Patch {
    pub edits: Vec<PoolEdit>,
}

impl Patch {
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn push(&mut self, edit: PoolEdit) {
        self.edits.push(edit)
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.edits.is_empty()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.edits.len()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, PoolEdit> {
        self.edits.iter()
    }

    /// Encodes the edits back to back: a kind byte followed by the fields of the edit.
    pub fn encode(&self) -> Result<Vec<u8>> {
        let mut buf = Vec::new();
        for edit in &self.edits {
            edit.write_to(&mut buf)?;
        }
        Ok(buf)
    }

    pub fn decode(bytes: &[u8]) -> Result<Self> {
        let mut reader = ByteCursor::new(bytes);
        let mut edits = vec![];
        while !reader.is_empty() {
            edits.push(PoolEdit::read_from(&mut reader)?);
        }
        Ok(Patch { edits })
    }

    /// Replays the edits against `pool` without touching it, returning the resulting slot layout.
    pub(crate) fn layout(&self, pool: &ConstantPool) -> Result<Layout> {
        let mut layout = Layout::new(pool);
        for (n, edit) in self.edits.iter().enumerate() {
            match edit {
                PoolEdit::Insert { position, constant } => {
                    layout.insert(*position, n, constant.is_wide())?
                }
                PoolEdit::Delete { position } => layout.delete(*position)?,
                PoolEdit::Bootstrap { .. } => {}
            }
        }
        Ok(layout)
    }

    /// The old-to-new index mapping for the constants of `pool` that survive this patch.
    pub fn remapping(&self, pool: &ConstantPool) -> Result<Remapping> {
        Ok(self.layout(pool)?.remapping())
    }

    /// Applies this patch to `class`.
    ///
    /// On failure `class` is left unchanged.
    pub fn apply_to(&self, class: &mut ClassFile) -> Result<()> {
        if self.is_empty() {
            class.constant_change = 0;
            return Ok(());
        }
        let layout = self.layout(&class.constant_pool)?;
        let mut mapping = layout.remapping();

        let mut pool = ConstantPool::new();
        let mut inserted = ReferenceCollector::new();
        for slot in layout.slots() {
            match *slot {
                Slot::Original(old) => {
                    let mut entry = class.constant_pool.resolve(old)?.clone();
                    entry.update(&mut mapping)?;
                    pool.push(entry)?;
                }
                Slot::Inserted(n) => {
                    if let Some(PoolEdit::Insert { constant, .. }) = self.edits.get(n) {
                        constant.clone().update(&mut inserted)?;
                        pool.push(constant.clone())?;
                    }
                }
                Slot::Reserved => {}
            }
        }
        let mut bootstraps = vec![];
        for edit in &self.edits {
            if let PoolEdit::Bootstrap { name_index, method } = edit {
                method.clone().update(&mut inserted)?;
                bootstraps.push((*name_index, method.clone()));
            }
        }
        for &index in inserted.indices() {
            if !pool.is_addressable(index) {
                return Err(Error::InvalidPoolIndex(index));
            }
        }

        let mut updated = class.clone();
        updated.update(&mut mapping)?;
        for (name_index, method) in bootstraps {
            append_bootstrap_method(&mut updated, &pool, name_index, method)?;
        }
        updated.constant_change = pool.size() as i32 - class.constant_pool.size() as i32;
        updated.constant_pool = pool;
        debug!(
            "applied {} pool edit(s): {} -> {} slots",
            self.len(),
            class.constant_pool.size(),
            updated.constant_pool.size()
        );
        *class = updated;
        Ok(())
    }
}

fn append_bootstrap_method(
    class: &mut ClassFile,
    pool: &ConstantPool,
    name_index: u16,
    method: BootstrapMethod,
) -> Result<()> {
    let existing = class
        .attributes
        .iter()
        .position(|a| matches!(a.info, AttributeInfo::BootstrapMethods(_)));
    match existing {
        Some(i) => {
            if let AttributeInfo::BootstrapMethods(methods) = &mut class.attributes[i].info {
                methods.push(method);
            }
        }
        None => {
            if **pool.resolve_utf8(name_index)? != *b"BootstrapMethods" {
                return Err(Error::InvalidPoolIndex(name_index));
            }
            class.attributes.push(Attribute::new(
                name_index,
                AttributeInfo::BootstrapMethods(vec![method]),
            ));
        }
    }
    Ok(())
}

impl<'a> IntoIterator for &'a Patch {
    type Item = &'a PoolEdit;
    type IntoIter = std::slice::Iter<'a, PoolEdit>;

    fn into_iter(self) -> Self::IntoIter {
        self.edits.iter()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Slot {
    /// A constant of the original pool, by its original index.
    Original(u16),
    /// A constant inserted by the edit with this number.
    Inserted(usize),
    /// The second half of the wide constant before it.
    Reserved,
}

/// A pool being edited, tracking where every slot came from.
#[derive(Debug, Clone)]
pub(crate) struct Layout {
    slots: Vec<Slot>,
}

impl Layout {
    pub(crate) fn new(pool: &ConstantPool) -> Self {
        let slots = (1..=pool.size())
            .map(|i| {
                if pool.is_reserved(i) {
                    Slot::Reserved
                } else {
                    Slot::Original(i)
                }
            })
            .collect();
        Layout { slots }
    }

    #[inline]
    pub(crate) fn slots(&self) -> &[Slot] {
        &self.slots
    }

    #[inline]
    pub(crate) fn len(&self) -> u16 {
        self.slots.len() as u16
    }

    fn is_reserved(&self, position: u16) -> bool {
        position
            .checked_sub(1)
            .and_then(|i| self.slots.get(i as usize))
            .map_or(false, |s| *s == Slot::Reserved)
    }

    pub(crate) fn insert(&mut self, position: u16, edit: usize, wide: bool) -> Result<()> {
        if position == 0 || position > self.len() + 1 || self.is_reserved(position) {
            return Err(Error::InvalidPoolIndex(position));
        }
        // the count field is one more than the number of slots
        let added = if wide { 2 } else { 1 };
        if self.slots.len() + added >= u16::MAX as usize {
            return Err(Error::ArithmeticOverflow);
        }
        let at = position as usize - 1;
        if wide {
            self.slots.insert(at, Slot::Reserved);
        }
        self.slots.insert(at, Slot::Inserted(edit));
        Ok(())
    }

    pub(crate) fn delete(&mut self, position: u16) -> Result<()> {
        if position == 0 || position > self.len() || self.is_reserved(position) {
            return Err(Error::InvalidPoolIndex(position));
        }
        let at = position as usize - 1;
        self.slots.remove(at);
        if self.slots.get(at) == Some(&Slot::Reserved) {
            self.slots.remove(at);
        }
        Ok(())
    }

    /// Where a constant that wants to be at `position` can be inserted: no further than one past
    /// the end, and never between a wide constant and its reserved slot.
    pub(crate) fn placement(&self, position: u16) -> u16 {
        let position = position.clamp(1, self.len() + 1);
        if self.is_reserved(position) {
            position + 1
        } else {
            position
        }
    }

    /// Whether inserting at `position` would move any of the `pinned` original constants past
    /// `limit`.
    pub(crate) fn pushes_past(&self, position: u16, wide: bool, pinned: &BTreeSet<u16>, limit: u16) -> bool {
        let added = if wide { 2 } else { 1 };
        let start = position.saturating_sub(1) as usize;
        self.slots.iter().enumerate().skip(start).any(|(i, slot)| match *slot {
            Slot::Original(old) => pinned.contains(&old) && i + 1 + added > limit as usize,
            _ => false,
        })
    }

    /// The current position of the constant inserted by `edit`.
    pub(crate) fn position_of(&self, edit: usize) -> Option<u16> {
        self.slots
            .iter()
            .position(|s| *s == Slot::Inserted(edit))
            .map(|i| i as u16 + 1)
    }

    pub(crate) fn remapping(&self) -> Remapping {
        let mut mapping = Remapping::new();
        for (i, slot) in self.slots.iter().enumerate() {
            if let Slot::Original(old) = *slot {
                mapping.insert(old, i as u16 + 1);
            }
        }
        mapping
    }
}
