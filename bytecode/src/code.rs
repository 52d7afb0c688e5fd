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
//! The `Code` attribute and renumbering of pool operands inside bytecode.

use std::convert::TryFrom;

use crate::attr::Attribute;
use crate::constant_pool::ConstantPool;
use crate::cursor::{ByteCursor, WriteBytes};
use crate::error::{Error, Result};
use crate::insn::{PoolOperand, INSTRUCTIONS};
use crate::remap::{IndexMapper, Remap};
use crate::rw::{write_u32_len, ConstantPoolReadWrite};
use crate::{read_from, write_to};

pub mod stack_map;

/// An entry of the exception table.
#[derive(Debug, Clone, PartialEq, Eq, ReadWrite, Remap)]
pub struct ExceptionHandler {
    pub start_pc: u16,
    pub end_pc: u16,
    pub handler_pc: u16,
    /// Zero catches everything.
    #[index(optional)]
    pub catch_type: u16,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Code {
    pub max_stack: u16,
    pub max_locals: u16,
    /// The raw instruction stream.
    pub code: Vec<u8>,
    pub exception_table: Vec<ExceptionHandler>,
    pub attributes: Vec<Attribute>,
}

impl Code {
    /// Rewrites every pool index operand in the bytecode through `mapping`.
    ///
    /// Walking stops at the first opcode without a table entry; the bytes from there on are
    /// left untouched and `mapping` is told about the gap.
    pub fn update_bytecode<M: IndexMapper>(&mut self, mapping: &mut M) -> Result<()> {
        let mut operands = vec![];
        for step in INSTRUCTIONS.walk(&self.code) {
            match step {
                Ok(step) => operands.extend(step.pool_operand),
                Err(Error::UnsupportedOpcode { opcode, offset }) => {
                    mapping.coverage_gap(opcode, offset);
                    break;
                }
                Err(e) => return Err(e),
            }
        }
        for (at, width) in operands {
            match width {
                PoolOperand::Narrow => {
                    let old = self.code[at];
                    let new = mapping.map_index(old as u16)?;
                    self.code[at] = u8::try_from(new).map_err(|_| {
                        Error::Invalid(
                            "ldc operand",
                            format!("index {} moved to {}, which does not fit in one byte", old, new).into(),
                        )
                    })?;
                }
                PoolOperand::Wide => {
                    let old = u16::from_be_bytes([self.code[at], self.code[at + 1]]);
                    let new = mapping.map_index(old)?;
                    self.code[at..at + 2].copy_from_slice(&new.to_be_bytes());
                }
            }
        }
        Ok(())
    }

    /// The pool indices named by one-byte operands, in instruction order. Only the instructions
    /// before the first unknown opcode are seen.
    pub fn narrow_indices(&self) -> Vec<u16> {
        INSTRUCTIONS
            .walk(&self.code)
            .map_while(Result::ok)
            .filter_map(|step| match step.pool_operand {
                Some((at, PoolOperand::Narrow)) => Some(self.code[at] as u16),
                _ => None,
            })
            .collect()
    }
}

impl ConstantPoolReadWrite for Code {
    fn read_from(cp: &ConstantPool, reader: &mut ByteCursor<'_>) -> Result<Self> {
        let max_stack = reader.read_u16()?;
        let max_locals = reader.read_u16()?;
        let code_length = reader.read_u32()?;
        let code = reader.read_bytes(code_length as usize)?.to_vec();
        let exception_table = read_from!(reader)?;
        let attributes = read_from!(cp, reader)?;
        Ok(Code {
            max_stack,
            max_locals,
            code,
            exception_table,
            attributes,
        })
    }

    fn write_to(&self, writer: &mut Vec<u8>) -> Result<()> {
        writer.write_u16(self.max_stack);
        writer.write_u16(self.max_locals);
        write_u32_len(self.code.len(), writer)?;
        writer.write_bytes(&self.code);
        write_to!(&self.exception_table, writer)?;
        write_to!(cp &self.attributes, writer)
    }
}

impl Remap for Code {
    fn update<M: IndexMapper>(&mut self, mapping: &mut M) -> Result<()> {
        self.update_bytecode(mapping)?;
        self.exception_table.update(mapping)?;
        self.attributes.update(mapping)
    }
}
