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
//! Classes compiled by javac 17 from `fixtures/java`; `fixtures/build.sh` rebuilds them.

use crate::annotation::Annotation;
use crate::attr::{Attribute, AttributeInfo};
use crate::clazz::ClassFile;
use crate::code::Code;
use crate::constants::insn::*;
use crate::cp::Constant;
use crate::insn::{PoolOperand, INSTRUCTIONS};
use crate::member::Method;
use crate::patch::PoolEdit;

macro_rules! fixture {
    ($path:literal) => {{
        let bytes: &'static [u8] = include_bytes!(concat!(env!("CARGO_MANIFEST_DIR"), "/fixtures/classes/", $path));
        bytes
    }};
}

const FIXTURES: &[(&str, &[u8])] = &[
    ("Tag", fixture!("Tag.class")),
    ("Tag$Kind", fixture!("Tag$Kind.class")),
    ("Use", fixture!("Use.class")),
    ("Shape", fixture!("Shape.class")),
    ("Shape$Circle", fixture!("Shape$Circle.class")),
    ("Shape$Square", fixture!("Shape$Square.class")),
    ("module-info", fixture!("module-info.class")),
    ("Greeter", fixture!("v1/Greeter.class")),
    ("Greeter", fixture!("v2/Greeter.class")),
    ("Strings", fixture!("v1/Strings.class")),
    ("Strings", fixture!("v2/Strings.class")),
];

fn load(bytes: &[u8]) -> ClassFile {
    ClassFile::parse(bytes).unwrap()
}

fn utf8(class: &ClassFile, index: u16) -> String {
    class.constant_pool.resolve_utf8(index).unwrap().decode().unwrap()
}

fn class_name(class: &ClassFile, index: u16) -> String {
    utf8(class, class.constant_pool.resolve_class(index).unwrap())
}

/// Every attribute of the class, nested ones included.
fn all_attributes(class: &ClassFile) -> Vec<&Attribute> {
    fn visit<'a>(attributes: &'a [Attribute], out: &mut Vec<&'a Attribute>) {
        for attr in attributes {
            out.push(attr);
            match &attr.info {
                AttributeInfo::Code(code) => visit(&code.attributes, out),
                AttributeInfo::Record(components) => {
                    for component in components {
                        visit(&component.attributes, out);
                    }
                }
                _ => {}
            }
        }
    }
    let mut out = vec![];
    visit(&class.attributes, &mut out);
    for field in &class.fields {
        visit(&field.attributes, &mut out);
    }
    for method in &class.methods {
        visit(&method.attributes, &mut out);
    }
    out
}

fn method<'a>(class: &'a ClassFile, name: &str) -> &'a Method {
    class
        .methods
        .iter()
        .find(|m| utf8(class, m.name_index) == name)
        .unwrap_or_else(|| panic!("no method {}", name))
}

fn code_of(method: &Method) -> Option<&Code> {
    method.attributes.iter().find_map(|a| match &a.info {
        AttributeInfo::Code(code) => Some(code),
        _ => None,
    })
}

fn pool_operands(code: &Code) -> Vec<(usize, u16)> {
    INSTRUCTIONS
        .walk(&code.code)
        .map(|step| step.unwrap())
        .filter_map(|step| step.pool_operand)
        .map(|(at, width)| match width {
            PoolOperand::Narrow => (at, code.code[at] as u16),
            PoolOperand::Wide => (at, u16::from_be_bytes([code.code[at], code.code[at + 1]])),
        })
        .collect()
}

/// Asserts that every instruction of `after` names a constant equal to the one `before` names
/// at the same offset.
fn assert_same_operands(before: &ClassFile, after: &ClassFile) {
    assert_eq!(before.methods.len(), after.methods.len());
    for (old_method, new_method) in before.methods.iter().zip(&after.methods) {
        let (old_code, new_code) = match (code_of(old_method), code_of(new_method)) {
            (Some(old), Some(new)) => (old, new),
            (None, None) => continue,
            _ => panic!("code appeared or vanished"),
        };
        assert_eq!(old_code.code.len(), new_code.code.len());
        let old_operands = pool_operands(old_code);
        let new_operands = pool_operands(new_code);
        assert_eq!(old_operands.len(), new_operands.len());
        for (&(at, old), &(new_at, new)) in old_operands.iter().zip(&new_operands) {
            assert_eq!(at, new_at);
            assert_eq!(
                before.constant_pool.resolve_value_in(old, before.bootstrap_methods()).unwrap(),
                after.constant_pool.resolve_value_in(new, after.bootstrap_methods()).unwrap(),
                "operand at {} in {}",
                at,
                utf8(after, new_method.name_index)
            );
        }
    }
}

fn annotation_types(class: &ClassFile) -> Vec<String> {
    let mut types = vec![];
    let mut push = |annotations: &[Annotation]| {
        types.extend(annotations.iter().map(|a| utf8(class, a.type_index)));
    };
    for attr in all_attributes(class) {
        match &attr.info {
            AttributeInfo::RuntimeVisibleAnnotations(annotations) => push(annotations),
            AttributeInfo::RuntimeVisibleParameterAnnotations(parameters) => {
                for annotations in &parameters.0 {
                    push(annotations);
                }
            }
            AttributeInfo::RuntimeVisibleTypeAnnotations(annotations) => {
                for annotation in annotations {
                    push(std::slice::from_ref(&annotation.annotation));
                }
            }
            _ => {}
        }
    }
    types
}

fn assert_bootstraps_resolve(class: &ClassFile) {
    for (i, entry) in class.constant_pool.iter() {
        if let Constant::Dynamic {
            bootstrap_method_attr_index,
            ..
        }
        | Constant::InvokeDynamic {
            bootstrap_method_attr_index,
            ..
        } = entry
        {
            assert!(
                (*bootstrap_method_attr_index as usize) < class.bootstrap_methods().len(),
                "#{} names a missing bootstrap method",
                i
            );
        }
    }
}

#[test]
fn test_fixtures_round_trip() {
    for &(name, bytes) in FIXTURES {
        let class = load(bytes);
        assert_eq!(class.name().unwrap(), name);
        assert_eq!(class.serialize().unwrap(), bytes, "{}", name);
        for attr in all_attributes(&class) {
            assert!(!attr.is_unknown(), "{}: {}", name, utf8(&class, attr.name_index));
        }
        let references = class.referenced_indices().unwrap();
        assert!(!references.saw_opaque(), "{}", name);
        for &index in references.indices() {
            assert!(class.constant_pool.is_addressable(index), "{}: #{}", name, index);
        }
        assert_bootstraps_resolve(&class);
    }
}

#[test]
fn test_fixture_attributes() {
    let tag = load(fixture!("Tag.class"));
    let defaults = tag
        .methods
        .iter()
        .filter(|m| {
            m.attributes
                .iter()
                .any(|a| matches!(a.info, AttributeInfo::AnnotationDefault(_)))
        })
        .count();
    assert_eq!(defaults, 3);

    let shape = load(fixture!("Shape.class"));
    let permitted = shape
        .attributes
        .iter()
        .find_map(|a| match &a.info {
            AttributeInfo::PermittedSubclasses(classes) => Some(classes.clone()),
            _ => None,
        })
        .unwrap();
    let permitted: Vec<String> = permitted.iter().map(|&c| class_name(&shape, c)).collect();
    assert_eq!(permitted, vec!["Shape$Circle", "Shape$Square"]);

    let circle = load(fixture!("Shape$Circle.class"));
    let components = circle
        .attributes
        .iter()
        .find_map(|a| match &a.info {
            AttributeInfo::Record(components) => Some(components),
            _ => None,
        })
        .unwrap();
    assert_eq!(components.len(), 1);
    assert_eq!(utf8(&circle, components[0].name_index), "radius");
    assert_eq!(utf8(&circle, components[0].descriptor_index), "D");

    let class = load(fixture!("module-info.class"));
    let module = class
        .attributes
        .iter()
        .find_map(|a| match &a.info {
            AttributeInfo::Module(module) => Some(module),
            _ => None,
        })
        .unwrap();
    let module_name = |index: u16| match class.constant_pool.resolve(index).unwrap() {
        Constant::Module { name_index } => utf8(&class, *name_index),
        other => panic!("not a module: {:?}", other),
    };
    assert_eq!(module_name(module.module_name_index), "fixtures");
    let requires: Vec<String> = module.requires.iter().map(|r| module_name(r.requires_index)).collect();
    assert!(requires.contains(&"java.base".to_owned()));
    assert!(requires.contains(&"java.logging".to_owned()));
    assert_eq!(class_name(&class, module.uses[0]), "java/util/spi/ToolProvider");

    let greeter = load(fixture!("v1/Greeter.class"));
    assert_eq!(annotation_types(&greeter), vec!["LTag;", "LUse;", "LTag;", "LUse;", "LUse;"]);
}

#[test]
fn test_greeter_diff() {
    let before = load(fixture!("v1/Greeter.class"));
    let reference = load(fixture!("v2/Greeter.class"));
    let mut source = before.clone();
    let diff = source.diff(&reference).unwrap();
    assert!(!diff.new_indices.is_empty());
    // the renamed lambda needs its own bootstrap method
    assert!(!diff.bootstrap_methods.is_empty());
    assert!(diff
        .patch
        .iter()
        .any(|edit| matches!(edit, PoolEdit::Bootstrap { .. })));

    let reparsed = load(&source.serialize().unwrap());
    assert_eq!(
        reparsed.bootstrap_methods().len(),
        before.bootstrap_methods().len() + diff.bootstrap_methods.len()
    );
    assert_eq!(&reparsed.bootstrap_methods()[before.bootstrap_methods().len()..], &diff.bootstrap_methods[..]);
    assert_same_operands(&before, &reparsed);
    assert_eq!(annotation_types(&reparsed), annotation_types(&before));
    assert_bootstraps_resolve(&reparsed);
    assert_eq!(
        reparsed.constant_pool.size() as i32,
        before.constant_pool.size() as i32 + diff.constant_change
    );

    // every constant of the reference now has an equal one in the source
    let mut source = reparsed;
    assert!(source.diff(&reference).unwrap().patch.is_empty());
}

#[test]
fn test_strings_diff_keeps_ldc_targets() {
    let before = load(fixture!("v1/Strings.class"));
    let reference = load(fixture!("v2/Strings.class"));
    // "tail" is loaded with a one-byte operand and sits close to the limit
    let last = code_of(method(&before, "last")).unwrap().code.clone();
    assert_eq!(last, vec![LDC, 249, ARETURN]);

    let mut source = before.clone();
    let diff = source.diff(&reference).unwrap();
    assert!(!diff.new_indices.is_empty());
    // the reference has the new constants far below 249; they all went after it
    assert!(diff.new_indices.iter().any(|&i| i < 249));
    for edit in &diff.patch {
        if let PoolEdit::Insert { position, .. } = edit {
            assert!(*position > 249, "inserted at {}", position);
        }
    }

    let reparsed = load(&source.serialize().unwrap());
    assert_eq!(code_of(method(&reparsed, "last")).unwrap().code, last);
    assert_same_operands(&before, &reparsed);
    let mut source = reparsed;
    assert!(source.diff(&reference).unwrap().patch.is_empty());
}
