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
//! The instruction table.
//!
//! Only as much of each instruction is described as is needed to step over it and to find
//! operands that index the constant pool. Bytecode is never decoded into an instruction model.

use std::convert::TryFrom;

use crate::constants::insn::*;
use crate::error::{Error, Result};

/// Width of a constant pool index operand.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum PoolOperand {
    /// One byte, as used by `ldc`.
    Narrow,
    /// Two bytes, big-endian.
    Wide,
}

impl PoolOperand {
    #[inline]
    pub const fn width(self) -> usize {
        match self {
            PoolOperand::Narrow => 1,
            PoolOperand::Wide => 2,
        }
    }
}

/// How the operands following an opcode are laid out.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Operands {
    /// `len` operand bytes. A pool index, when present, is always the first operand.
    Fixed { len: u8, pool: Option<PoolOperand> },
    /// Padding to a 4-byte boundary, then default, low, high and `high - low + 1` jump offsets.
    TableSwitch,
    /// Padding to a 4-byte boundary, then default, npairs and `npairs` match/offset pairs.
    LookupSwitch,
    /// Widens the local variable index of the following instruction.
    Wide,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct OpcodeInfo {
    pub opcode: u8,
    pub mnemonic: &'static str,
    pub operands: Operands,
}

const fn op(opcode: u8, mnemonic: &'static str, operands: Operands) -> OpcodeInfo {
    OpcodeInfo {
        opcode,
        mnemonic,
        operands,
    }
}

const fn fixed(len: u8) -> Operands {
    Operands::Fixed { len, pool: None }
}

const fn narrow(len: u8) -> Operands {
    Operands::Fixed {
        len,
        pool: Some(PoolOperand::Narrow),
    }
}

const fn wide(len: u8) -> Operands {
    Operands::Fixed {
        len,
        pool: Some(PoolOperand::Wide),
    }
}

const OPCODES: [OpcodeInfo; 0xCA] = [
    op(NOP, "nop", fixed(0)),
    op(ACONST_NULL, "aconst_null", fixed(0)),
    op(ICONST_M1, "iconst_m1", fixed(0)),
    op(ICONST_0, "iconst_0", fixed(0)),
    op(ICONST_1, "iconst_1", fixed(0)),
    op(ICONST_2, "iconst_2", fixed(0)),
    op(ICONST_3, "iconst_3", fixed(0)),
    op(ICONST_4, "iconst_4", fixed(0)),
    op(ICONST_5, "iconst_5", fixed(0)),
    op(LCONST_0, "lconst_0", fixed(0)),
    op(LCONST_1, "lconst_1", fixed(0)),
    op(FCONST_0, "fconst_0", fixed(0)),
    op(FCONST_1, "fconst_1", fixed(0)),
    op(FCONST_2, "fconst_2", fixed(0)),
    op(DCONST_0, "dconst_0", fixed(0)),
    op(DCONST_1, "dconst_1", fixed(0)),
    op(BIPUSH, "bipush", fixed(1)),
    op(SIPUSH, "sipush", fixed(2)),
    op(LDC, "ldc", narrow(1)),
    op(LDC_W, "ldc_w", wide(2)),
    op(LDC2_W, "ldc2_w", wide(2)),
    op(ILOAD, "iload", fixed(1)),
    op(LLOAD, "lload", fixed(1)),
    op(FLOAD, "fload", fixed(1)),
    op(DLOAD, "dload", fixed(1)),
    op(ALOAD, "aload", fixed(1)),
    op(ILOAD_0, "iload_0", fixed(0)),
    op(ILOAD_1, "iload_1", fixed(0)),
    op(ILOAD_2, "iload_2", fixed(0)),
    op(ILOAD_3, "iload_3", fixed(0)),
    op(LLOAD_0, "lload_0", fixed(0)),
    op(LLOAD_1, "lload_1", fixed(0)),
    op(LLOAD_2, "lload_2", fixed(0)),
    op(LLOAD_3, "lload_3", fixed(0)),
    op(FLOAD_0, "fload_0", fixed(0)),
    op(FLOAD_1, "fload_1", fixed(0)),
    op(FLOAD_2, "fload_2", fixed(0)),
    op(FLOAD_3, "fload_3", fixed(0)),
    op(DLOAD_0, "dload_0", fixed(0)),
    op(DLOAD_1, "dload_1", fixed(0)),
    op(DLOAD_2, "dload_2", fixed(0)),
    op(DLOAD_3, "dload_3", fixed(0)),
    op(ALOAD_0, "aload_0", fixed(0)),
    op(ALOAD_1, "aload_1", fixed(0)),
    op(ALOAD_2, "aload_2", fixed(0)),
    op(ALOAD_3, "aload_3", fixed(0)),
    op(IALOAD, "iaload", fixed(0)),
    op(LALOAD, "laload", fixed(0)),
    op(FALOAD, "faload", fixed(0)),
    op(DALOAD, "daload", fixed(0)),
    op(AALOAD, "aaload", fixed(0)),
    op(BALOAD, "baload", fixed(0)),
    op(CALOAD, "caload", fixed(0)),
    op(SALOAD, "saload", fixed(0)),
    op(ISTORE, "istore", fixed(1)),
    op(LSTORE, "lstore", fixed(1)),
    op(FSTORE, "fstore", fixed(1)),
    op(DSTORE, "dstore", fixed(1)),
    op(ASTORE, "astore", fixed(1)),
    op(ISTORE_0, "istore_0", fixed(0)),
    op(ISTORE_1, "istore_1", fixed(0)),
    op(ISTORE_2, "istore_2", fixed(0)),
    op(ISTORE_3, "istore_3", fixed(0)),
    op(LSTORE_0, "lstore_0", fixed(0)),
    op(LSTORE_1, "lstore_1", fixed(0)),
    op(LSTORE_2, "lstore_2", fixed(0)),
    op(LSTORE_3, "lstore_3", fixed(0)),
    op(FSTORE_0, "fstore_0", fixed(0)),
    op(FSTORE_1, "fstore_1", fixed(0)),
    op(FSTORE_2, "fstore_2", fixed(0)),
    op(FSTORE_3, "fstore_3", fixed(0)),
    op(DSTORE_0, "dstore_0", fixed(0)),
    op(DSTORE_1, "dstore_1", fixed(0)),
    op(DSTORE_2, "dstore_2", fixed(0)),
    op(DSTORE_3, "dstore_3", fixed(0)),
    op(ASTORE_0, "astore_0", fixed(0)),
    op(ASTORE_1, "astore_1", fixed(0)),
    op(ASTORE_2, "astore_2", fixed(0)),
    op(ASTORE_3, "astore_3", fixed(0)),
    op(IASTORE, "iastore", fixed(0)),
    op(LASTORE, "lastore", fixed(0)),
    op(FASTORE, "fastore", fixed(0)),
    op(DASTORE, "dastore", fixed(0)),
    op(AASTORE, "aastore", fixed(0)),
    op(BASTORE, "bastore", fixed(0)),
    op(CASTORE, "castore", fixed(0)),
    op(SASTORE, "sastore", fixed(0)),
    op(POP, "pop", fixed(0)),
    op(POP2, "pop2", fixed(0)),
    op(DUP, "dup", fixed(0)),
    op(DUP_X1, "dup_x1", fixed(0)),
    op(DUP_X2, "dup_x2", fixed(0)),
    op(DUP2, "dup2", fixed(0)),
    op(DUP2_X1, "dup2_x1", fixed(0)),
    op(DUP2_X2, "dup2_x2", fixed(0)),
    op(SWAP, "swap", fixed(0)),
    op(IADD, "iadd", fixed(0)),
    op(LADD, "ladd", fixed(0)),
    op(FADD, "fadd", fixed(0)),
    op(DADD, "dadd", fixed(0)),
    op(ISUB, "isub", fixed(0)),
    op(LSUB, "lsub", fixed(0)),
    op(FSUB, "fsub", fixed(0)),
    op(DSUB, "dsub", fixed(0)),
    op(IMUL, "imul", fixed(0)),
    op(LMUL, "lmul", fixed(0)),
    op(FMUL, "fmul", fixed(0)),
    op(DMUL, "dmul", fixed(0)),
    op(IDIV, "idiv", fixed(0)),
    op(LDIV, "ldiv", fixed(0)),
    op(FDIV, "fdiv", fixed(0)),
    op(DDIV, "ddiv", fixed(0)),
    op(IREM, "irem", fixed(0)),
    op(LREM, "lrem", fixed(0)),
    op(FREM, "frem", fixed(0)),
    op(DREM, "drem", fixed(0)),
    op(INEG, "ineg", fixed(0)),
    op(LNEG, "lneg", fixed(0)),
    op(FNEG, "fneg", fixed(0)),
    op(DNEG, "dneg", fixed(0)),
    op(ISHL, "ishl", fixed(0)),
    op(LSHL, "lshl", fixed(0)),
    op(ISHR, "ishr", fixed(0)),
    op(LSHR, "lshr", fixed(0)),
    op(IUSHR, "iushr", fixed(0)),
    op(LUSHR, "lushr", fixed(0)),
    op(IAND, "iand", fixed(0)),
    op(LAND, "land", fixed(0)),
    op(IOR, "ior", fixed(0)),
    op(LOR, "lor", fixed(0)),
    op(IXOR, "ixor", fixed(0)),
    op(LXOR, "lxor", fixed(0)),
    op(IINC, "iinc", fixed(2)),
    op(I2L, "i2l", fixed(0)),
    op(I2F, "i2f", fixed(0)),
    op(I2D, "i2d", fixed(0)),
    op(L2I, "l2i", fixed(0)),
    op(L2F, "l2f", fixed(0)),
    op(L2D, "l2d", fixed(0)),
    op(F2I, "f2i", fixed(0)),
    op(F2L, "f2l", fixed(0)),
    op(F2D, "f2d", fixed(0)),
    op(D2I, "d2i", fixed(0)),
    op(D2L, "d2l", fixed(0)),
    op(D2F, "d2f", fixed(0)),
    op(I2B, "i2b", fixed(0)),
    op(I2C, "i2c", fixed(0)),
    op(I2S, "i2s", fixed(0)),
    op(LCMP, "lcmp", fixed(0)),
    op(FCMPL, "fcmpl", fixed(0)),
    op(FCMPG, "fcmpg", fixed(0)),
    op(DCMPL, "dcmpl", fixed(0)),
    op(DCMPG, "dcmpg", fixed(0)),
    op(IFEQ, "ifeq", fixed(2)),
    op(IFNE, "ifne", fixed(2)),
    op(IFLT, "iflt", fixed(2)),
    op(IFGE, "ifge", fixed(2)),
    op(IFGT, "ifgt", fixed(2)),
    op(IFLE, "ifle", fixed(2)),
    op(IF_ICMPEQ, "if_icmpeq", fixed(2)),
    op(IF_ICMPNE, "if_icmpne", fixed(2)),
    op(IF_ICMPLT, "if_icmplt", fixed(2)),
    op(IF_ICMPGE, "if_icmpge", fixed(2)),
    op(IF_ICMPGT, "if_icmpgt", fixed(2)),
    op(IF_ICMPLE, "if_icmple", fixed(2)),
    op(IF_ACMPEQ, "if_acmpeq", fixed(2)),
    op(IF_ACMPNE, "if_acmpne", fixed(2)),
    op(GOTO, "goto", fixed(2)),
    op(JSR, "jsr", fixed(2)),
    op(RET, "ret", fixed(1)),
    op(TABLESWITCH, "tableswitch", Operands::TableSwitch),
    op(LOOKUPSWITCH, "lookupswitch", Operands::LookupSwitch),
    op(IRETURN, "ireturn", fixed(0)),
    op(LRETURN, "lreturn", fixed(0)),
    op(FRETURN, "freturn", fixed(0)),
    op(DRETURN, "dreturn", fixed(0)),
    op(ARETURN, "areturn", fixed(0)),
    op(RETURN, "return", fixed(0)),
    op(GETSTATIC, "getstatic", wide(2)),
    op(PUTSTATIC, "putstatic", wide(2)),
    op(GETFIELD, "getfield", wide(2)),
    op(PUTFIELD, "putfield", wide(2)),
    op(INVOKEVIRTUAL, "invokevirtual", wide(2)),
    op(INVOKESPECIAL, "invokespecial", wide(2)),
    op(INVOKESTATIC, "invokestatic", wide(2)),
    op(INVOKEINTERFACE, "invokeinterface", wide(4)),
    op(INVOKEDYNAMIC, "invokedynamic", wide(4)),
    op(NEW, "new", wide(2)),
    op(NEWARRAY, "newarray", fixed(1)),
    op(ANEWARRAY, "anewarray", wide(2)),
    op(ARRAYLENGTH, "arraylength", fixed(0)),
    op(ATHROW, "athrow", fixed(0)),
    op(CHECKCAST, "checkcast", wide(2)),
    op(INSTANCEOF, "instanceof", wide(2)),
    op(MONITORENTER, "monitorenter", fixed(0)),
    op(MONITOREXIT, "monitorexit", fixed(0)),
    op(WIDE, "wide", Operands::Wide),
    op(MULTIANEWARRAY, "multianewarray", wide(3)),
    op(IFNULL, "ifnull", fixed(2)),
    op(IFNONNULL, "ifnonnull", fixed(2)),
    op(GOTO_W, "goto_w", fixed(4)),
    op(JSR_W, "jsr_w", fixed(4)),
];

/// One instruction located by [`InstructionTable::step`].
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Step {
    pub opcode: u8,
    /// Offset of the opcode in the code array.
    pub offset: usize,
    /// Total length, opcode included.
    pub len: usize,
    /// Absolute offset and width of the pool index operand.
    pub pool_operand: Option<(usize, PoolOperand)>,
}

/// A static map from opcode to operand layout.
///
/// Opcodes without an entry are reserved or undefined.
pub struct InstructionTable {
    entries: [Option<OpcodeInfo>; 256],
}

/// The table for every opcode defined by the class file format.
pub static INSTRUCTIONS: InstructionTable = InstructionTable::new();

impl InstructionTable {
    const fn new() -> Self {
        let mut entries = [None; 256];
        let mut i = 0;
        while i < OPCODES.len() {
            entries[OPCODES[i].opcode as usize] = Some(OPCODES[i]);
            i += 1;
        }
        InstructionTable { entries }
    }

    #[inline]
    pub fn get(&self, opcode: u8) -> Option<&OpcodeInfo> {
        self.entries[opcode as usize].as_ref()
    }

    /// Locates the instruction starting at `offset`.
    ///
    /// Returns [`Error::UnsupportedOpcode`] if the opcode has no entry, and [`Error::Invalid`]
    /// if the instruction is cut off by the end of `code`.
    pub fn step(&self, code: &[u8], offset: usize) -> Result<Step> {
        let opcode = *code.get(offset).ok_or_else(|| truncated(offset))?;
        let info = self
            .get(opcode)
            .ok_or(Error::UnsupportedOpcode { opcode, offset })?;
        let (len, pool_operand) = match info.operands {
            Operands::Fixed { len, pool } => (1 + len as usize, pool.map(|p| (offset + 1, p))),
            Operands::TableSwitch => {
                let base = offset + 1 + switch_padding(offset);
                let low = read_i32(code, base + 4, offset)?;
                let high = read_i32(code, base + 8, offset)?;
                if high < low {
                    return Err(Error::Invalid(
                        "tableswitch",
                        format!("high {} is below low {} at offset {}", high, low, offset).into(),
                    ));
                }
                let jumps = (high as i64 - low as i64 + 1) as usize;
                (base - offset + 12 + jumps * 4, None)
            }
            Operands::LookupSwitch => {
                let base = offset + 1 + switch_padding(offset);
                let npairs = read_i32(code, base + 4, offset)?;
                let npairs = usize::try_from(npairs).map_err(|_| {
                    Error::Invalid(
                        "lookupswitch",
                        format!("negative pair count {} at offset {}", npairs, offset).into(),
                    )
                })?;
                (base - offset + 8 + npairs * 8, None)
            }
            Operands::Wide => {
                let widened = *code.get(offset + 1).ok_or_else(|| truncated(offset))?;
                match widened {
                    IINC => (6, None),
                    ILOAD..=ALOAD | ISTORE..=ASTORE | RET => (4, None),
                    _ => {
                        return Err(Error::UnsupportedOpcode {
                            opcode: widened,
                            offset: offset + 1,
                        })
                    }
                }
            }
        };
        if offset + len > code.len() {
            return Err(truncated(offset));
        }
        Ok(Step {
            opcode,
            offset,
            len,
            pool_operand,
        })
    }

    /// Iterates over the instructions of `code` from the start.
    ///
    /// The iterator ends after the first error.
    pub fn walk<'a>(&'a self, code: &'a [u8]) -> Instructions<'a> {
        Instructions {
            table: self,
            code,
            offset: 0,
            done: false,
        }
    }
}

/// Iterator returned by [`InstructionTable::walk`].
pub struct Instructions<'a> {
    table: &'a InstructionTable,
    code: &'a [u8],
    offset: usize,
    done: bool,
}

impl<'a> Iterator for Instructions<'a> {
    type Item = Result<Step>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done || self.offset >= self.code.len() {
            return None;
        }
        let step = self.table.step(self.code, self.offset);
        match &step {
            Ok(s) => self.offset += s.len,
            Err(_) => self.done = true,
        }
        Some(step)
    }
}

/// Switch operands start at the next multiple of four, counted from the start of the code array.
#[inline]
pub const fn switch_padding(offset: usize) -> usize {
    (4 - (offset + 1) % 4) % 4
}

fn read_i32(code: &[u8], at: usize, offset: usize) -> Result<i32> {
    code.get(at..at + 4)
        .map(|b| i32::from_be_bytes([b[0], b[1], b[2], b[3]]))
        .ok_or_else(|| truncated(offset))
}

fn truncated(offset: usize) -> Error {
    Error::Invalid(
        "bytecode",
        format!("instruction at offset {} runs past the end of the code array", offset).into(),
    )
}
