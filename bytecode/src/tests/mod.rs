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

mod attr;
mod fixtures;
mod insn;

use lazy_static::lazy_static;

use std::convert::TryFrom;

use crate::access::AccessFlags;
use crate::attr::{Attribute, AttributeInfo, LineNumber};
use crate::clazz::ClassFile;
use crate::code::{Code, ExceptionHandler};
use crate::constant_pool::ConstantPool;
use crate::constants::insn::*;
use crate::cp::Constant;
use crate::member::{Field, Method};
use crate::version::JavaVersion;

lazy_static! {
    /// The encoded form of `build_class(&[])`.
    pub(crate) static ref SAMPLE: Vec<u8> = build_class(&[]).serialize().unwrap();
}

#[derive(Default)]
pub(crate) struct PoolBuilder {
    pub pool: ConstantPool,
}

impl PoolBuilder {
    pub fn push(&mut self, c: Constant) -> u16 {
        self.pool.push(c).unwrap()
    }

    pub fn utf8(&mut self, s: &str) -> u16 {
        self.push(Constant::utf8(s))
    }

    pub fn class(&mut self, name: &str) -> u16 {
        let name_index = self.utf8(name);
        self.push(Constant::ClassRef { name_index })
    }
}

fn hi(index: u16) -> u8 {
    (index >> 8) as u8
}

fn lo(index: u16) -> u8 {
    index as u8
}

/// A class with a field, two methods with bytecode, and a source file attribute.
///
/// Each name in `extra` adds a Utf8 and a ClassRef right after the class's own name,
/// pushing every later constant two slots up.
pub(crate) fn build_class(extra: &[&str]) -> ClassFile {
    let mut cp = PoolBuilder::default();
    let this_class = cp.class("Sample");
    for name in extra {
        cp.class(name);
    }
    let object = cp.class("java/lang/Object");
    let code = cp.utf8("Code");
    let init = cp.utf8("<init>");
    let void = cp.utf8("()V");
    let init_nat = cp.push(Constant::NameAndType {
        name_index: init,
        descriptor_index: void,
    });
    let object_init = cp.push(Constant::MethodRef {
        class_index: object,
        name_and_type_index: init_nat,
    });
    let value = cp.utf8("value");
    let long_descriptor = cp.utf8("J");
    let answer = cp.push(Constant::Long(42));
    let constant_value = cp.utf8("ConstantValue");
    let hello = cp.utf8("hello");
    let hello_ref = cp.push(Constant::StringRef { string_index: hello });
    let source_file = cp.utf8("SourceFile");
    let source_name = cp.utf8("Sample.java");
    let line_numbers = cp.utf8("LineNumberTable");
    let run = cp.utf8("run");
    let half = cp.push(Constant::Double(1.5));
    let exceptions = cp.utf8("Exceptions");
    let throwable = cp.class("java/lang/Throwable");

    let mut field = Field::new(
        AccessFlags::ACC_PRIVATE | AccessFlags::ACC_STATIC | AccessFlags::ACC_FINAL,
        value,
        long_descriptor,
    );
    field
        .attributes
        .push(Attribute::new(constant_value, AttributeInfo::ConstantValue(answer)));

    let mut constructor = Method::new(AccessFlags::ACC_PUBLIC, init, void);
    constructor.attributes.push(Attribute::new(
        code,
        AttributeInfo::Code(Code {
            max_stack: 1,
            max_locals: 1,
            code: vec![ALOAD_0, INVOKESPECIAL, hi(object_init), lo(object_init), RETURN],
            exception_table: vec![],
            attributes: vec![Attribute::new(
                line_numbers,
                AttributeInfo::LineNumberTable(vec![LineNumber {
                    start_pc: 0,
                    line_number: 1,
                }]),
            )],
        }),
    ));

    let mut runner = Method::new(AccessFlags::ACC_PUBLIC | AccessFlags::ACC_STATIC, run, void);
    runner.attributes.push(Attribute::new(
        code,
        AttributeInfo::Code(Code {
            max_stack: 2,
            max_locals: 0,
            code: vec![
                LDC,
                lo(hello_ref),
                POP,
                LDC2_W,
                hi(answer),
                lo(answer),
                POP2,
                LDC2_W,
                hi(half),
                lo(half),
                POP2,
                RETURN,
            ],
            exception_table: vec![ExceptionHandler {
                start_pc: 0,
                end_pc: 3,
                handler_pc: 11,
                catch_type: throwable,
            }],
            attributes: vec![],
        }),
    ));
    runner
        .attributes
        .push(Attribute::new(exceptions, AttributeInfo::Exceptions(vec![throwable])));

    ClassFile {
        version: JavaVersion::J8,
        constant_pool: cp.pool,
        access_flags: AccessFlags::ACC_PUBLIC | AccessFlags::ACC_SUPER,
        this_class,
        super_class: object,
        interfaces: vec![],
        fields: vec![field],
        methods: vec![constructor, runner],
        attributes: vec![Attribute::new(source_file, AttributeInfo::SourceFile(source_name))],
        constant_change: 0,
    }
}

/// A class without members over the given pool.
pub(crate) fn bare_class(entries: Vec<Constant>, this_class: u16) -> ClassFile {
    ClassFile {
        version: JavaVersion::J8,
        constant_pool: ConstantPool::try_from(entries).unwrap(),
        access_flags: AccessFlags::ACC_PUBLIC,
        this_class,
        super_class: 0,
        interfaces: vec![],
        fields: vec![],
        methods: vec![],
        attributes: vec![],
        constant_change: 0,
    }
}
