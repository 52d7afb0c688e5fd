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

use std::convert::TryFrom;

use crate::access::AccessFlags;
use crate::annotation::*;
use crate::attr::{Attribute, AttributeInfo, LineNumber, MethodParameter, RecordComponent};
use crate::code::stack_map::{StackMapFrame, VerificationType};
use crate::constant_pool::ConstantPool;
use crate::cp::Constant;
use crate::cursor::ByteCursor;
use crate::error::Error;
use crate::module::{Export, Module, Require};
use crate::remap::{ReferenceCollector, Remap, Remapping};
use crate::{read_from, write_to, Result};

fn pool() -> ConstantPool {
    ConstantPool::try_from(vec![
        Constant::utf8("SourceFile"),
        Constant::utf8("X.java"),
        Constant::utf8("Custom"),
        Constant::utf8("Code"),
        Constant::utf8("LineNumberTable"),
        Constant::utf8("StackMapTable"),
        Constant::ClassRef { name_index: 2 },
    ])
    .unwrap()
}

fn parse(bytes: &[u8]) -> Result<Attribute> {
    parse_in(&pool(), bytes)
}

fn parse_in(pool: &ConstantPool, bytes: &[u8]) -> Result<Attribute> {
    let mut reader = ByteCursor::new(bytes);
    let attr = read_from!(pool, &mut reader)?;
    assert!(reader.is_empty());
    Ok(attr)
}

fn annotation_pool() -> ConstantPool {
    ConstantPool::try_from(vec![
        Constant::utf8("RuntimeVisibleAnnotations"),
        Constant::utf8("LTag;"),
        Constant::utf8("value"),
        Constant::Integer(5),
        Constant::utf8("names"),
        Constant::utf8("a"),
        Constant::utf8("LKind;"),
        Constant::utf8("FAST"),
        Constant::utf8("RuntimeInvisibleParameterAnnotations"),
        Constant::utf8("RuntimeVisibleTypeAnnotations"),
        Constant::utf8("Record"),
        Constant::utf8("Signature"),
        Constant::utf8("MethodParameters"),
        Constant::utf8("AnnotationDefault"),
    ])
    .unwrap()
}

fn referenced(attr: &Attribute) -> Vec<u16> {
    let mut collector = ReferenceCollector::new();
    attr.clone().update(&mut collector).unwrap();
    assert!(!collector.saw_opaque());
    collector.indices().iter().copied().collect()
}

fn tag(type_index: u16) -> Annotation {
    Annotation {
        type_index,
        element_value_pairs: vec![],
    }
}

fn encode(attr: &Attribute) -> Vec<u8> {
    let mut buf = vec![];
    write_to!(cp attr, &mut buf).unwrap();
    buf
}

#[test]
fn test_source_file() {
    let bytes = [0, 1, 0, 0, 0, 2, 0, 2];
    let attr = parse(&bytes).unwrap();
    assert_eq!(attr, Attribute::new(1, AttributeInfo::SourceFile(2)));
    assert_eq!(encode(&attr), bytes.to_vec());
}

#[test]
fn test_unknown_is_verbatim() {
    let bytes = [0, 3, 0, 0, 0, 4, 0xDE, 0xAD, 0xBE, 0xEF];
    let attr = parse(&bytes).unwrap();
    assert!(attr.is_unknown());
    assert_eq!(attr.info, AttributeInfo::Unknown(vec![0xDE, 0xAD, 0xBE, 0xEF]));
    assert_eq!(encode(&attr), bytes.to_vec());

    let mut collector = ReferenceCollector::new();
    attr.clone().update(&mut collector).unwrap();
    assert!(collector.saw_opaque());
}

#[test]
fn test_declared_length_must_be_consumed() {
    match parse(&[0, 1, 0, 0, 0, 3, 0, 2, 0xFF]) {
        Err(Error::AttributeLength {
            name,
            declared,
            consumed,
        }) => {
            assert_eq!(name, "SourceFile");
            assert_eq!(declared, 3);
            assert_eq!(consumed, 2);
        }
        r => panic!("{:?}", r),
    }
    assert!(matches!(
        parse(&[0, 1, 0, 0, 0, 1, 0]),
        Err(Error::UnexpectedEof { needed: 2, remaining: 1 })
    ));
}

#[test]
fn test_name_must_be_utf8() {
    assert!(matches!(
        parse(&[0, 7, 0, 0, 0, 0]),
        Err(Error::InvalidPoolIndex(7))
    ));
}

#[test]
fn test_length_is_recomputed() {
    let attr = Attribute::new(
        5,
        AttributeInfo::LineNumberTable(vec![
            LineNumber {
                start_pc: 0,
                line_number: 7,
            },
            LineNumber {
                start_pc: 4,
                line_number: 8,
            },
        ]),
    );
    assert_eq!(
        encode(&attr),
        vec![0, 5, 0, 0, 0, 10, 0, 2, 0, 0, 0, 7, 0, 4, 0, 8]
    );
}

#[test]
fn test_code() {
    let bytes = [
        0, 4, 0, 0, 0, 25, // Code
        0, 2, 0, 1, // max stack, max locals
        0, 0, 0, 1, 0xB1, // return
        0, 0, // exception table
        0, 1, // attributes
        0, 5, 0, 0, 0, 6, 0, 1, 0, 0, 0, 7,
    ];
    let attr = parse(&bytes).unwrap();
    match &attr.info {
        AttributeInfo::Code(code) => {
            assert_eq!(code.max_stack, 2);
            assert_eq!(code.code, vec![0xB1]);
            assert_eq!(
                code.attributes,
                vec![Attribute::new(
                    5,
                    AttributeInfo::LineNumberTable(vec![LineNumber {
                        start_pc: 0,
                        line_number: 7
                    }])
                )]
            );
        }
        info => panic!("{:?}", info),
    }
    assert_eq!(encode(&attr), bytes.to_vec());
}

#[test]
fn test_stack_map_table() {
    let bytes = [
        0, 6, 0, 0, 0, 18,
        0, 4,
        5, // same
        65, 1, // same locals, one integer on the stack
        248, 0, 3, // chop 3
        255, 0, 10, 0, 1, 7, 0, 7, 0, 0, // full, one object local
    ];
    let attr = parse(&bytes).unwrap();
    assert_eq!(
        attr.info,
        AttributeInfo::StackMapTable(vec![
            StackMapFrame::Same { offset_delta: 5 },
            StackMapFrame::SameLocals1StackItem {
                offset_delta: 1,
                stack: VerificationType::Integer
            },
            StackMapFrame::Chop {
                chopped: 3,
                offset_delta: 3
            },
            StackMapFrame::Full {
                offset_delta: 10,
                locals: vec![VerificationType::Object(7)],
                stack: vec![]
            },
        ])
    );
    assert_eq!(encode(&attr), bytes.to_vec());

    let mut collector = ReferenceCollector::new();
    attr.clone().update(&mut collector).unwrap();
    assert_eq!(collector.indices().iter().copied().collect::<Vec<_>>(), vec![6, 7]);
    assert!(!collector.saw_opaque());
}

#[test]
fn test_reserved_frame_type() {
    assert!(matches!(
        parse(&[0, 6, 0, 0, 0, 3, 0, 1, 128]),
        Err(Error::Unrecognized(..))
    ));
}

#[test]
fn test_annotations() {
    let bytes = [
        0, 1, 0, 0, 0, 24,
        0, 1, // one annotation
        0, 2, 0, 2, // @Tag, two elements
        0, 3, b'I', 0, 4, // value = 5
        0, 5, b'[', 0, 2, b's', 0, 6, b'e', 0, 7, 0, 8, // names = {"a", Kind.FAST}
    ];
    let attr = parse_in(&annotation_pool(), &bytes).unwrap();
    assert_eq!(
        attr.info,
        AttributeInfo::RuntimeVisibleAnnotations(vec![Annotation {
            type_index: 2,
            element_value_pairs: vec![
                ElementValuePair {
                    element_name_index: 3,
                    value: ElementValue::Int(4)
                },
                ElementValuePair {
                    element_name_index: 5,
                    value: ElementValue::Array(vec![
                        ElementValue::String(6),
                        ElementValue::Enum {
                            type_name_index: 7,
                            const_name_index: 8
                        },
                    ])
                },
            ]
        }])
    );
    assert_eq!(encode(&attr), bytes.to_vec());
    assert_eq!(referenced(&attr), vec![1, 2, 3, 4, 5, 6, 7, 8]);

    let mut moved = attr.clone();
    let mut mapping = Remapping::new();
    for i in 1..=8 {
        mapping.insert(i, i + 100);
    }
    moved.update(&mut mapping).unwrap();
    match &moved.info {
        AttributeInfo::RuntimeVisibleAnnotations(annotations) => {
            assert_eq!(annotations[0].type_index, 102);
            assert_eq!(
                annotations[0].element_value_pairs[1].value,
                ElementValue::Array(vec![
                    ElementValue::String(106),
                    ElementValue::Enum {
                        type_name_index: 107,
                        const_name_index: 108
                    },
                ])
            );
        }
        info => panic!("{:?}", info),
    }

    assert!(matches!(
        parse_in(&annotation_pool(), &[0, 1, 0, 0, 0, 9, 0, 1, 0, 2, 0, 1, 0, 3, b'x']),
        Err(Error::Unrecognized(..))
    ));
}

#[test]
fn test_parameter_and_type_annotations() {
    let pool = annotation_pool();
    let bytes = [
        0, 9, 0, 0, 0, 9,
        2, // parameters
        0, 0, // none on the first
        0, 1, 0, 2, 0, 0, // @Tag on the second
    ];
    let attr = parse_in(&pool, &bytes).unwrap();
    assert_eq!(
        attr.info,
        AttributeInfo::RuntimeInvisibleParameterAnnotations(ParameterAnnotations(vec![vec![], vec![tag(2)]]))
    );
    assert_eq!(encode(&attr), bytes.to_vec());

    let bytes = [
        0, 10, 0, 0, 0, 18,
        0, 1,
        0x40, 0, 1, 0, 0, 0, 5, 0, 1, // a local variable in slot 1 for five bytes
        1, 3, 0, // one step into a type argument
        0, 7, 0, 0, // @Kind
    ];
    let attr = parse_in(&pool, &bytes).unwrap();
    assert_eq!(
        attr.info,
        AttributeInfo::RuntimeVisibleTypeAnnotations(vec![TypeAnnotation {
            target_type: 0x40,
            target_info: TargetInfo::LocalVar(vec![LocalVarTarget {
                start_pc: 0,
                length: 5,
                index: 1
            }]),
            type_path: vec![TypePathEntry {
                type_path_kind: 3,
                type_argument_index: 0
            }],
            annotation: tag(7),
        }])
    );
    assert_eq!(encode(&attr), bytes.to_vec());
    assert_eq!(referenced(&attr), vec![7, 10]);

    assert!(matches!(
        parse_in(&pool, &[0, 10, 0, 0, 0, 7, 0, 1, 0x30, 0, 0, 7, 0]),
        Err(Error::Unrecognized(..))
    ));
}

#[test]
fn test_records_and_method_parameters() {
    let pool = annotation_pool();
    let bytes = [
        0, 11, 0, 0, 0, 16,
        0, 1, 0, 3, 0, 7, // value, LKind;
        0, 1, 0, 12, 0, 0, 0, 2, 0, 8, // Signature
    ];
    let attr = parse_in(&pool, &bytes).unwrap();
    assert_eq!(
        attr.info,
        AttributeInfo::Record(vec![RecordComponent {
            name_index: 3,
            descriptor_index: 7,
            attributes: vec![Attribute::new(12, AttributeInfo::Signature(8))],
        }])
    );
    assert_eq!(encode(&attr), bytes.to_vec());
    assert_eq!(referenced(&attr), vec![3, 7, 8, 11, 12]);

    // a nameless parameter has index zero
    let bytes = [0, 13, 0, 0, 0, 9, 2, 0, 6, 0, 0x10, 0, 0, 0x80, 0x00];
    let attr = parse_in(&pool, &bytes).unwrap();
    assert_eq!(
        attr.info,
        AttributeInfo::MethodParameters(vec![
            MethodParameter {
                name_index: 6,
                access_flags: AccessFlags::ACC_FINAL
            },
            MethodParameter {
                name_index: 0,
                access_flags: AccessFlags::from_bits_retain(0x8000)
            },
        ])
    );
    assert_eq!(encode(&attr), bytes.to_vec());
    assert_eq!(referenced(&attr), vec![6, 13]);

    let bytes = [0, 14, 0, 0, 0, 3, b'c', 0, 7];
    let attr = parse_in(&pool, &bytes).unwrap();
    assert_eq!(attr.info, AttributeInfo::AnnotationDefault(ElementValue::Class(7)));
    assert_eq!(encode(&attr), bytes.to_vec());
}

#[test]
fn test_module_renumbering() {
    let mut module = Module {
        module_name_index: 3,
        module_flags: AccessFlags::empty(),
        module_version_index: 0,
        requires: vec![Require {
            requires_index: 4,
            requires_flags: AccessFlags::from_bits_retain(0x8000),
            requires_version_index: 0,
        }],
        exports: vec![Export {
            package_index: 5,
            flags: AccessFlags::empty(),
            to: vec![],
        }],
        opens: vec![Export {
            package_index: 5,
            flags: AccessFlags::empty(),
            to: vec![4],
        }],
        uses: vec![6],
        provides: vec![],
    };
    let mut mapping = Remapping::new();
    for i in 3..=6 {
        mapping.insert(i, i + 10);
    }
    module.update(&mut mapping).unwrap();
    assert_eq!(module.module_name_index, 13);
    assert_eq!(module.module_version_index, 0);
    assert_eq!(module.requires[0].requires_index, 14);
    assert_eq!(module.requires[0].requires_version_index, 0);
    assert_eq!(module.opens[0].to, vec![14]);
    assert_eq!(module.uses, vec![16]);

    let mut mapping = Remapping::new();
    mapping.insert(3, 3);
    assert!(matches!(
        module.clone().update(&mut mapping),
        Err(Error::DanglingIndex(13))
    ));
}
