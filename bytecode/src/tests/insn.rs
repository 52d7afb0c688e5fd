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

use crate::code::Code;
use crate::constants::insn::*;
use crate::error::Error;
use crate::insn::{switch_padding, PoolOperand, Step, INSTRUCTIONS};
use crate::remap::{ReferenceCollector, Remap, Remapping};

fn code(bytes: Vec<u8>) -> Code {
    Code {
        code: bytes,
        ..Code::default()
    }
}

#[test]
fn test_table_coverage() {
    for opcode in 0..=JSR_W {
        let info = INSTRUCTIONS.get(opcode).unwrap_or_else(|| panic!("{:#04X} missing", opcode));
        assert_eq!(info.opcode, opcode);
    }
    for opcode in BREAKPOINT..=IMPDEP2 {
        assert!(INSTRUCTIONS.get(opcode).is_none(), "{:#04X} present", opcode);
    }
    assert_eq!(INSTRUCTIONS.get(LDC).unwrap().mnemonic, "ldc");
    assert_eq!(INSTRUCTIONS.get(INVOKEDYNAMIC).unwrap().mnemonic, "invokedynamic");
    assert_eq!(INSTRUCTIONS.get(JSR_W).unwrap().mnemonic, "jsr_w");
}

#[test]
fn test_fixed_lengths() {
    let step = |bytes: &[u8]| INSTRUCTIONS.step(bytes, 0).unwrap();
    assert_eq!(
        step(&[LDC, 5]),
        Step {
            opcode: LDC,
            offset: 0,
            len: 2,
            pool_operand: Some((1, PoolOperand::Narrow)),
        }
    );
    assert_eq!(step(&[INVOKEINTERFACE, 0, 1, 1, 0]).len, 5);
    assert_eq!(step(&[INVOKEDYNAMIC, 0, 1, 0, 0]).pool_operand, Some((1, PoolOperand::Wide)));
    assert_eq!(step(&[MULTIANEWARRAY, 0, 1, 2]).len, 4);
    assert_eq!(step(&[IINC, 1, 0xFF]).len, 3);
    assert_eq!(step(&[GOTO_W, 0, 0, 0, 0]).len, 5);
    assert_eq!(step(&[BIPUSH, 1]).pool_operand, None);
    assert_eq!(step(&[NEWARRAY, 10]).pool_operand, None);
}

#[test]
fn test_tableswitch() {
    assert_eq!(switch_padding(0), 3);
    assert_eq!(switch_padding(3), 0);
    let buf = [
        TABLESWITCH,
        0, 0, 0, // padding
        0, 0, 0, 20, // default
        0, 0, 0, 1, // low
        0, 0, 0, 2, // high
        0, 0, 0, 24,
        0, 0, 0, 28,
        RETURN,
    ];
    let step = INSTRUCTIONS.step(&buf, 0).unwrap();
    assert_eq!(step.len, 24);
    assert_eq!(INSTRUCTIONS.step(&buf, step.len).unwrap().opcode, RETURN);

    let mut shifted = vec![NOP, TABLESWITCH, 0, 0];
    shifted.extend_from_slice(&buf[4..]);
    assert_eq!(INSTRUCTIONS.step(&shifted, 1).unwrap().len, 23);

    let backwards = [
        TABLESWITCH, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 2, 0, 0, 0, 1,
    ];
    assert!(matches!(INSTRUCTIONS.step(&backwards, 0), Err(Error::Invalid(..))));
}

#[test]
fn test_lookupswitch() {
    let buf = [
        NOP,
        NOP,
        LOOKUPSWITCH,
        0, // padding
        0, 0, 0, 20, // default
        0, 0, 0, 1, // npairs
        0, 0, 0, 7, 0, 0, 0, 30,
    ];
    let step = INSTRUCTIONS.step(&buf, 2).unwrap();
    assert_eq!(step.len, 18);
    assert_eq!(step.offset + step.len, buf.len());
}

#[test]
fn test_wide() {
    assert_eq!(INSTRUCTIONS.step(&[WIDE, IINC, 1, 0, 0, 5], 0).unwrap().len, 6);
    assert_eq!(INSTRUCTIONS.step(&[WIDE, ALOAD, 1, 0], 0).unwrap().len, 4);
    assert_eq!(INSTRUCTIONS.step(&[WIDE, RET, 1, 0], 0).unwrap().len, 4);
    assert!(matches!(
        INSTRUCTIONS.step(&[WIDE, NOP, 0, 0], 0),
        Err(Error::UnsupportedOpcode { opcode: NOP, offset: 1 })
    ));
}

#[test]
fn test_truncated_instruction() {
    assert!(matches!(INSTRUCTIONS.step(&[SIPUSH, 0], 0), Err(Error::Invalid(..))));
    assert!(matches!(
        INSTRUCTIONS.step(&[LOOKUPSWITCH, 0, 0, 0, 0, 0], 0),
        Err(Error::Invalid(..))
    ));
}

#[test]
fn test_walk() {
    let bytes = [ALOAD_0, INVOKESPECIAL, 0, 9, RETURN];
    let steps = INSTRUCTIONS.walk(&bytes).collect::<Result<Vec<_>, _>>().unwrap();
    assert_eq!(steps.iter().map(|s| s.offset).collect::<Vec<_>>(), vec![0, 1, 4]);
    assert_eq!(steps[1].pool_operand, Some((2, PoolOperand::Wide)));

    let gap = [NOP, 0xCB, NOP];
    let steps = INSTRUCTIONS.walk(&gap).collect::<Vec<_>>();
    assert_eq!(steps.len(), 2);
    assert!(matches!(steps[1], Err(Error::UnsupportedOpcode { opcode: 0xCB, offset: 1 })));
}

#[test]
fn test_rewrite_ldc() {
    let mut c = code(vec![LDC, 5]);
    let mut mapping = Remapping::new();
    mapping.insert(5, 7);
    c.update_bytecode(&mut mapping).unwrap();
    assert_eq!(c.code, vec![LDC, 0x07]);
}

#[test]
fn test_rewrite_preserves_other_bytes() {
    let before = vec![
        BIPUSH, 5,
        SIPUSH, 0, 5,
        GETSTATIC, 0, 5,
        IFEQ, 0, 5,
        INVOKEINTERFACE, 0, 6, 1, 0,
        MULTIANEWARRAY, 0, 6, 2,
        ILOAD, 5,
        GOTO, 0xFF, 0xF0,
        LDC_W, 0, 5,
        RETURN,
    ];
    let operands = [6, 7, 12, 13, 17, 18, 26, 27];
    let mut mapping = Remapping::identity(10);
    mapping.insert(5, 0x0105);
    mapping.insert(6, 0x0206);
    let mut c = code(before.clone());
    c.update_bytecode(&mut mapping).unwrap();
    assert_eq!(c.code.len(), before.len());
    for (i, (old, new)) in before.iter().zip(c.code.iter()).enumerate() {
        if !operands.contains(&i) {
            assert_eq!(old, new, "byte {} changed", i);
        }
    }
    assert_eq!(&c.code[5..8], &[GETSTATIC, 0x01, 0x05]);
    assert_eq!(&c.code[11..16], &[INVOKEINTERFACE, 0x02, 0x06, 1, 0]);
    assert_eq!(&c.code[16..20], &[MULTIANEWARRAY, 0x02, 0x06, 2]);
    assert_eq!(&c.code[25..28], &[LDC_W, 0x01, 0x05]);
}

#[test]
fn test_unsupported_opcode_passthrough() {
    let mut c = code(vec![LDC, 5, 0xCA, LDC, 5]);
    let mut mapping = Remapping::new();
    mapping.insert(5, 7);
    c.update_bytecode(&mut mapping).unwrap();
    assert_eq!(c.code, vec![LDC, 7, 0xCA, LDC, 5]);

    let mut collector = ReferenceCollector::new();
    c.update(&mut collector).unwrap();
    assert!(collector.saw_opaque());
    assert_eq!(collector.indices().iter().copied().collect::<Vec<_>>(), vec![7]);
}

#[test]
fn test_rewrite_errors() {
    let mut mapping = Remapping::new();
    mapping.insert(5, 300);
    assert!(matches!(
        code(vec![LDC, 5]).update_bytecode(&mut mapping),
        Err(Error::Invalid("ldc operand", _))
    ));
    assert!(matches!(
        code(vec![LDC, 6]).update_bytecode(&mut mapping),
        Err(Error::DanglingIndex(6))
    ));
}
