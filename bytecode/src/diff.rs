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
//! Computing the pool edits that bring one class's constants into another.
//!
//! Constants are matched across pools by value (see [`ResolvedConstant`]), never by index.
//! Dynamic and InvokeDynamic constants are compared together with the bootstrap method they
//! name, and an inserted one brings its bootstrap method along.

use std::collections::{BTreeSet, HashSet};
use std::convert::TryFrom;

use indexmap::IndexMap;
use log::debug;

use crate::attr::{AttributeInfo, BootstrapMethod};
use crate::clazz::ClassFile;
use crate::constant_pool::{ConstantPool, ResolvedConstant};
use crate::cp::Constant;
use crate::error::{Error, Result};
use crate::patch::{Layout, Patch, PoolEdit};
use crate::remap::{ReferenceCollector, Remap, Remapping};

/// Options for [`PoolDiffer`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DiffOptions {
    prune_unreferenced: bool,
}

impl Default for DiffOptions {
    fn default() -> Self {
        DiffOptions {
            prune_unreferenced: true,
        }
    }
}

impl DiffOptions {
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether source constants with no match in the reference are removed when nothing in the
    /// source class refers to them.
    #[inline]
    pub fn prune_unreferenced(mut self, prune: bool) -> Self {
        self.prune_unreferenced = prune;
        self
    }

    #[inline]
    pub fn prunes_unreferenced(&self) -> bool {
        self.prune_unreferenced
    }
}

/// The outcome of a diff.
#[derive(Debug, Clone, PartialEq)]
pub struct PoolDiff {
    /// Reference indices whose constant has no match in the source, ascending.
    pub new_indices: Vec<u16>,
    /// Source indices whose constant has no match in the reference, ascending.
    pub del_indices: Vec<u16>,
    /// The subset of `del_indices` that is actually removed.
    pub removed: Vec<u16>,
    /// Old-to-new indices of every source constant that is kept.
    pub mapping: Remapping,
    pub patch: Patch,
    /// Net number of slots added to the source pool.
    pub constant_change: i32,
    /// Bootstrap methods appended to the source for inserted dynamic constants, in final
    /// numbering.
    pub bootstrap_methods: Vec<BootstrapMethod>,
}

/// Compares a source class with a reference class.
pub struct PoolDiffer<'a> {
    source: &'a ClassFile,
    reference: &'a ClassFile,
    options: DiffOptions,
}

impl<'a> PoolDiffer<'a> {
    pub fn new(source: &'a ClassFile, reference: &'a ClassFile) -> Self {
        PoolDiffer {
            source,
            reference,
            options: DiffOptions::default(),
        }
    }

    pub fn with_options(mut self, options: DiffOptions) -> Self {
        self.options = options;
        self
    }

    /// Computes the diff without changing either class.
    pub fn compute(&self) -> Result<PoolDiff> {
        let source_pool = &self.source.constant_pool;
        let reference_pool = &self.reference.constant_pool;

        let source_entries = resolve_all(source_pool, self.source.bootstrap_methods())?;
        let reference_entries = resolve_all(reference_pool, self.reference.bootstrap_methods())?;
        // first index of every distinct value
        let mut source_values = IndexMap::with_capacity(source_entries.len());
        for (i, value) in &source_entries {
            source_values.entry(value).or_insert(*i);
        }
        let reference_values: HashSet<&ResolvedConstant> = reference_entries.iter().map(|(_, v)| v).collect();

        let new_indices: Vec<u16> = reference_entries
            .iter()
            .filter(|(_, v)| !source_values.contains_key(v))
            .map(|&(i, _)| i)
            .collect();
        let del_indices: Vec<u16> = source_entries
            .iter()
            .filter(|(_, v)| !reference_values.contains(v))
            .map(|&(i, _)| i)
            .collect();

        let removed = if self.options.prune_unreferenced && !del_indices.is_empty() {
            self.removable(&del_indices)?
        } else {
            vec![]
        };

        let mut layout = Layout::new(source_pool);
        let mut patch = Patch::new();
        let mut shift = 0u16;
        for &index in &removed {
            let position = index - shift;
            layout.delete(position)?;
            shift += source_pool.resolve(index)?.size();
            debug!("delete #{} at {}", index, position);
            patch.push(PoolEdit::Delete { position });
        }

        // one-byte ldc operands cannot follow their constant past 255
        let narrow = narrow_indices(self.source);
        let mut inserted = Vec::with_capacity(new_indices.len());
        for &index in &new_indices {
            let constant = reference_pool.resolve(index)?.clone();
            let mut position = layout.placement(index);
            if layout.pushes_past(position, constant.is_wide(), &narrow, u8::MAX as u16) {
                debug!("reference #{} goes to the end: {} would move an ldc target", index, position);
                position = layout.len() + 1;
            }
            layout.insert(position, patch.len(), constant.is_wide())?;
            debug!("insert reference #{} at {}: {:?}", index, position, constant);
            inserted.push((patch.len(), index));
            patch.push(PoolEdit::Insert { position, constant });
        }

        let mut mapping = layout.remapping();

        // reference numbering to final numbering, for the indices inside inserted constants
        let mut translate = Remapping::new();
        for (i, value) in &reference_entries {
            if let Some(&s) = source_values.get(value) {
                translate.insert(*i, mapping.get(s)?);
            }
        }
        for &(edit, index) in &inserted {
            let position = layout.position_of(edit).ok_or(Error::DanglingIndex(index))?;
            translate.insert(index, position);
        }
        for &(edit, _) in &inserted {
            if let Some(PoolEdit::Insert { constant, .. }) = patch.edits.get_mut(edit) {
                constant.update(&mut translate)?;
            }
        }
        let bootstrap_methods = self.carry_bootstrap_methods(&mut patch, &inserted, &mut mapping, &mut translate)?;

        let constant_change = layout.len() as i32 - source_pool.size() as i32;
        debug!(
            "pool diff: {} new, {} unmatched, {} removed, {:+} slot(s)",
            new_indices.len(),
            del_indices.len(),
            removed.len(),
            constant_change
        );
        Ok(PoolDiff {
            new_indices,
            del_indices,
            removed,
            mapping,
            patch,
            constant_change,
            bootstrap_methods,
        })
    }

    /// Points every inserted dynamic constant at a bootstrap method of the source, appending the
    /// reference's method when the source has no equal one.
    fn carry_bootstrap_methods(
        &self,
        patch: &mut Patch,
        inserted: &[(usize, u16)],
        mapping: &mut Remapping,
        translate: &mut Remapping,
    ) -> Result<Vec<BootstrapMethod>> {
        let mut known = self.source.bootstrap_methods().to_vec();
        for method in &mut known {
            method.update(mapping)?;
        }
        let existing = known.len();
        let mut name_index = None;

        for &(edit, index) in inserted {
            let bsm = match patch.edits.get(edit) {
                Some(PoolEdit::Insert {
                    constant: Constant::Dynamic {
                        bootstrap_method_attr_index,
                        ..
                    },
                    ..
                })
                | Some(PoolEdit::Insert {
                    constant: Constant::InvokeDynamic {
                        bootstrap_method_attr_index,
                        ..
                    },
                    ..
                }) => *bootstrap_method_attr_index,
                _ => continue,
            };
            let mut method = self
                .reference
                .bootstrap_methods()
                .get(bsm as usize)
                .cloned()
                .ok_or_else(|| {
                    Error::Invalid(
                        "bootstrap method index",
                        format!("reference #{} names bootstrap method {}, which does not exist", index, bsm).into(),
                    )
                })?;
            method.update(translate)?;
            let slot = match known.iter().position(|m| *m == method) {
                Some(slot) => slot,
                None => {
                    let name_index = match name_index {
                        Some(n) => n,
                        None => {
                            let n = self.bootstrap_name_index(mapping, translate)?;
                            name_index = Some(n);
                            n
                        }
                    };
                    debug!("append bootstrap method {} for reference #{}", known.len(), index);
                    patch.push(PoolEdit::Bootstrap {
                        name_index,
                        method: method.clone(),
                    });
                    known.push(method);
                    known.len() - 1
                }
            };
            let slot = u16::try_from(slot).map_err(|_| Error::ArithmeticOverflow)?;
            if let Some(PoolEdit::Insert {
                constant:
                    Constant::Dynamic {
                        bootstrap_method_attr_index,
                        ..
                    }
                    | Constant::InvokeDynamic {
                        bootstrap_method_attr_index,
                        ..
                    },
                ..
            }) = patch.edits.get_mut(edit)
            {
                *bootstrap_method_attr_index = slot;
            }
        }
        Ok(known.split_off(existing))
    }

    /// The final index of a `BootstrapMethods` name: the source's own if it has the attribute,
    /// otherwise the reference's.
    fn bootstrap_name_index(&self, mapping: &Remapping, translate: &Remapping) -> Result<u16> {
        if let Some(attr) = self.source.bootstrap_attribute() {
            return mapping.get(attr.name_index);
        }
        match self.reference.bootstrap_attribute() {
            Some(attr) => translate.get(attr.name_index),
            None => Err(Error::Invalid(
                "BootstrapMethods",
                "the reference has dynamic constants but no bootstrap methods".into(),
            )),
        }
    }

    /// The candidates that nothing kept in the source refers to, ascending.
    ///
    /// Returns none at all when the source holds references that cannot be seen.
    fn removable(&self, candidates: &[u16]) -> Result<Vec<u16>> {
        let pool = &self.source.constant_pool;
        let candidates: BTreeSet<u16> = candidates.iter().copied().collect();

        let mut roots = ReferenceCollector::new();
        self.source.clone().update(&mut roots)?;
        if roots.saw_opaque() {
            debug!(
                "keeping {} unmatched constant(s): the class has references that cannot be renumbered",
                candidates.len()
            );
            return Ok(vec![]);
        }
        let mut referenced: BTreeSet<u16> = roots.indices().clone();
        for (i, entry) in pool.iter() {
            if !candidates.contains(&i) {
                referenced.extend(references_of(entry)?);
            }
        }

        // candidates reached from kept structures are kept too, and so is what they reach
        let mut queue: Vec<u16> = referenced.intersection(&candidates).copied().collect();
        while let Some(i) = queue.pop() {
            if let Ok(entry) = pool.resolve(i) {
                for r in references_of(entry)? {
                    if referenced.insert(r) && candidates.contains(&r) {
                        queue.push(r);
                    }
                }
            }
        }
        Ok(candidates.difference(&referenced).copied().collect())
    }
}

fn resolve_all(pool: &ConstantPool, bootstrap_methods: &[BootstrapMethod]) -> Result<Vec<(u16, ResolvedConstant)>> {
    pool.iter()
        .map(|(i, _)| Ok((i, pool.resolve_value_in(i, bootstrap_methods)?)))
        .collect()
}

fn narrow_indices(class: &ClassFile) -> BTreeSet<u16> {
    class
        .methods
        .iter()
        .flat_map(|m| &m.attributes)
        .filter_map(|a| match &a.info {
            AttributeInfo::Code(code) => Some(code.narrow_indices()),
            _ => None,
        })
        .flatten()
        .collect()
}

fn references_of(entry: &Constant) -> Result<BTreeSet<u16>> {
    let mut collector = ReferenceCollector::new();
    entry.clone().update(&mut collector)?;
    Ok(collector.indices().clone())
}

impl ClassFile {
    /// Brings every constant of `reference` that this class lacks into this class's pool, and
    /// renumbers everything here to match. Returns what was done.
    pub fn diff(&mut self, reference: &ClassFile) -> Result<PoolDiff> {
        self.diff_with(reference, DiffOptions::default())
    }

    pub fn diff_with(&mut self, reference: &ClassFile, options: DiffOptions) -> Result<PoolDiff> {
        let diff = PoolDiffer::new(self, reference).with_options(options).compute()?;
        diff.patch.apply_to(self)?;
        Ok(diff)
    }

    /// Every index reachable from this class, its pool entries included.
    pub fn referenced_indices(&self) -> Result<ReferenceCollector> {
        let mut collector = ReferenceCollector::new();
        let mut scratch = self.clone();
        scratch.update(&mut collector)?;
        scratch.constant_pool.update(&mut collector)?;
        Ok(collector)
    }
}
