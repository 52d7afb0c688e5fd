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
//! Attributes of classes, fields, methods and `Code`.
//!
//! The variant of an attribute is chosen by resolving its name through the constant pool. Names
//! that are not recognized keep their payload verbatim in [`AttributeInfo::Unknown`].

use std::borrow::Cow;

use crate::access::AccessFlags;
use crate::annotation::{Annotation, ElementValue, ParameterAnnotations, TypeAnnotation};
use crate::code::stack_map::StackMapFrame;
use crate::code::Code;
use crate::constant_pool::ConstantPool;
use crate::cursor::{ByteCursor, WriteBytes};
use crate::error::{Error, Result};
use crate::module::Module;
use crate::remap::{IndexMapper, PoolIndex, Remap};
use crate::rw::{read_u8_counted, write_u32_len, write_u8_counted, ConstantPoolReadWrite};
use crate::{read_from, write_to};

#[derive(Debug, Clone, PartialEq, Eq, ReadWrite)]
pub struct LineNumber {
    pub start_pc: u16,
    pub line_number: u16,
}

/// An entry of `LocalVariableTable`, or of `LocalVariableTypeTable` where `descriptor_index` is a signature.
#[derive(Debug, Clone, PartialEq, Eq, ReadWrite, Remap)]
pub struct LocalVariable {
    pub start_pc: u16,
    pub length: u16,
    #[index]
    pub name_index: u16,
    #[index]
    pub descriptor_index: u16,
    pub index: u16,
}

#[derive(Debug, Clone, PartialEq, Eq, ReadWrite, Remap)]
pub struct InnerClass {
    #[index]
    pub inner_class_info_index: u16,
    #[index(optional)]
    pub outer_class_info_index: u16,
    /// Zero for anonymous classes.
    #[index(optional)]
    pub inner_name_index: u16,
    pub inner_class_access_flags: AccessFlags,
}

#[derive(Debug, Clone, PartialEq, Eq, ReadWrite, Remap)]
pub struct BootstrapMethod {
    #[index]
    pub method_ref: u16,
    #[index]
    pub arguments: Vec<u16>,
}

#[derive(Debug, Clone, PartialEq, Eq, ReadWrite, Remap)]
pub struct MethodParameter {
    /// Zero for a parameter without a name.
    #[index(optional)]
    pub name_index: u16,
    pub access_flags: AccessFlags,
}

/// A component of a record class.
#[derive(Debug, Clone, PartialEq, Remap)]
pub struct RecordComponent {
    #[index]
    pub name_index: u16,
    #[index]
    pub descriptor_index: u16,
    #[remap]
    pub attributes: Vec<Attribute>,
}

impl ConstantPoolReadWrite for RecordComponent {
    fn read_from(cp: &ConstantPool, reader: &mut ByteCursor<'_>) -> Result<Self> {
        Ok(RecordComponent {
            name_index: reader.read_u16()?,
            descriptor_index: reader.read_u16()?,
            attributes: read_from!(cp, reader)?,
        })
    }

    fn write_to(&self, writer: &mut Vec<u8>) -> Result<()> {
        writer.write_u16(self.name_index);
        writer.write_u16(self.descriptor_index);
        write_to!(cp &self.attributes, writer)
    }
}

#[derive(Debug, Clone, PartialEq, Remap)]
pub enum AttributeInfo {
    Code(#[remap] Code),
    LocalVariableTable(#[remap] Vec<LocalVariable>),
    LocalVariableTypeTable(#[remap] Vec<LocalVariable>),
    LineNumberTable(Vec<LineNumber>),
    Signature(#[index] u16),
    SourceFile(#[index] u16),
    Exceptions(#[index] Vec<u16>),
    InnerClasses(#[remap] Vec<InnerClass>),
    ConstantValue(#[index] u16),
    EnclosingMethod {
        #[index]
        class_index: u16,
        #[index(optional)]
        method_index: u16,
    },
    NestHost(#[index] u16),
    NestMembers(#[index] Vec<u16>),
    BootstrapMethods(#[remap] Vec<BootstrapMethod>),
    StackMapTable(#[remap] Vec<StackMapFrame>),
    RuntimeVisibleAnnotations(#[remap] Vec<Annotation>),
    RuntimeInvisibleAnnotations(#[remap] Vec<Annotation>),
    RuntimeVisibleParameterAnnotations(#[remap] ParameterAnnotations),
    RuntimeInvisibleParameterAnnotations(#[remap] ParameterAnnotations),
    RuntimeVisibleTypeAnnotations(#[remap] Vec<TypeAnnotation>),
    RuntimeInvisibleTypeAnnotations(#[remap] Vec<TypeAnnotation>),
    AnnotationDefault(#[remap] ElementValue),
    MethodParameters(#[remap] Vec<MethodParameter>),
    Module(#[remap] Module),
    ModulePackages(#[index] Vec<u16>),
    ModuleMainClass(#[index] u16),
    PermittedSubclasses(#[index] Vec<u16>),
    Record(#[remap] Vec<RecordComponent>),
    SourceDebugExtension(Vec<u8>),
    Deprecated,
    Synthetic,
    Unknown(Vec<u8>),
}

impl AttributeInfo {
    /// Parses the payload of an attribute called `name`.
    fn parse(name: &[u8], cp: &ConstantPool, reader: &mut ByteCursor<'_>) -> Result<Self> {
        use AttributeInfo::*;
        Ok(match name {
            b"Code" => Code(read_from!(cp, reader)?),
            b"LocalVariableTable" => LocalVariableTable(read_from!(reader)?),
            b"LocalVariableTypeTable" => LocalVariableTypeTable(read_from!(reader)?),
            b"LineNumberTable" => LineNumberTable(read_from!(reader)?),
            b"Signature" => Signature(reader.read_u16()?),
            b"SourceFile" => SourceFile(reader.read_u16()?),
            b"Exceptions" => Exceptions(read_from!(reader)?),
            b"InnerClasses" => InnerClasses(read_from!(reader)?),
            b"ConstantValue" => ConstantValue(reader.read_u16()?),
            b"EnclosingMethod" => EnclosingMethod {
                class_index: reader.read_u16()?,
                method_index: reader.read_u16()?,
            },
            b"NestHost" => NestHost(reader.read_u16()?),
            b"NestMembers" => NestMembers(read_from!(reader)?),
            b"BootstrapMethods" => BootstrapMethods(read_from!(reader)?),
            b"StackMapTable" => StackMapTable(read_from!(reader)?),
            b"RuntimeVisibleAnnotations" => RuntimeVisibleAnnotations(read_from!(reader)?),
            b"RuntimeInvisibleAnnotations" => RuntimeInvisibleAnnotations(read_from!(reader)?),
            b"RuntimeVisibleParameterAnnotations" => RuntimeVisibleParameterAnnotations(read_from!(reader)?),
            b"RuntimeInvisibleParameterAnnotations" => RuntimeInvisibleParameterAnnotations(read_from!(reader)?),
            b"RuntimeVisibleTypeAnnotations" => RuntimeVisibleTypeAnnotations(read_from!(reader)?),
            b"RuntimeInvisibleTypeAnnotations" => RuntimeInvisibleTypeAnnotations(read_from!(reader)?),
            b"AnnotationDefault" => AnnotationDefault(read_from!(reader)?),
            b"MethodParameters" => MethodParameters(read_u8_counted(reader)?),
            b"Module" => Module(read_from!(reader)?),
            b"ModulePackages" => ModulePackages(read_from!(reader)?),
            b"ModuleMainClass" => ModuleMainClass(reader.read_u16()?),
            b"PermittedSubclasses" => PermittedSubclasses(read_from!(reader)?),
            b"Record" => Record(read_from!(cp, reader)?),
            b"SourceDebugExtension" => SourceDebugExtension(reader.read_to_end().to_vec()),
            b"Deprecated" => Deprecated,
            b"Synthetic" => Synthetic,
            _ => Unknown(reader.read_to_end().to_vec()),
        })
    }

    fn write_payload(&self, writer: &mut Vec<u8>) -> Result<()> {
        use AttributeInfo::*;
        match self {
            Code(code) => write_to!(cp code, writer),
            LocalVariableTable(table) | LocalVariableTypeTable(table) => write_to!(table, writer),
            LineNumberTable(table) => write_to!(table, writer),
            Signature(idx) | SourceFile(idx) | ConstantValue(idx) | NestHost(idx) | ModuleMainClass(idx) => {
                writer.write_u16(*idx);
                Ok(())
            }
            Exceptions(indices) | NestMembers(indices) | ModulePackages(indices) | PermittedSubclasses(indices) => {
                write_to!(indices, writer)
            }
            InnerClasses(classes) => write_to!(classes, writer),
            EnclosingMethod {
                class_index,
                method_index,
            } => {
                writer.write_u16(*class_index);
                writer.write_u16(*method_index);
                Ok(())
            }
            BootstrapMethods(methods) => write_to!(methods, writer),
            StackMapTable(frames) => write_to!(frames, writer),
            RuntimeVisibleAnnotations(annotations) | RuntimeInvisibleAnnotations(annotations) => {
                write_to!(annotations, writer)
            }
            RuntimeVisibleParameterAnnotations(parameters) | RuntimeInvisibleParameterAnnotations(parameters) => {
                write_to!(parameters, writer)
            }
            RuntimeVisibleTypeAnnotations(annotations) | RuntimeInvisibleTypeAnnotations(annotations) => {
                write_to!(annotations, writer)
            }
            AnnotationDefault(value) => write_to!(value, writer),
            MethodParameters(parameters) => write_u8_counted(parameters, writer, "method parameters"),
            Module(module) => write_to!(module, writer),
            Record(components) => write_to!(cp components, writer),
            Deprecated | Synthetic => Ok(()),
            SourceDebugExtension(bytes) | Unknown(bytes) => {
                writer.write_bytes(bytes);
                Ok(())
            }
        }
    }
}

/// An attribute record: a name index and a payload whose length is recomputed on write.
#[derive(Debug, Clone, PartialEq)]
pub struct Attribute {
    pub name_index: u16,
    pub info: AttributeInfo,
}

impl Attribute {
    #[inline]
    pub fn new(name_index: u16, info: AttributeInfo) -> Self {
        Attribute { name_index, info }
    }

    /// Whether the payload is kept verbatim because the name was not recognized.
    #[inline]
    pub fn is_unknown(&self) -> bool {
        matches!(self.info, AttributeInfo::Unknown(_))
    }
}

impl ConstantPoolReadWrite for Attribute {
    fn read_from(cp: &ConstantPool, reader: &mut ByteCursor<'_>) -> Result<Self> {
        let name_index = reader.read_u16()?;
        let declared = reader.read_u32()?;
        let mut payload = reader.sub_cursor(declared as usize)?;
        let name = cp.resolve_utf8(name_index)?;
        let info = AttributeInfo::parse(name, cp, &mut payload)?;
        if !payload.is_empty() {
            return Err(Error::AttributeLength {
                name: Cow::Owned(String::from_utf8_lossy(name).into_owned()),
                declared,
                consumed: payload.position() as u32,
            });
        }
        Ok(Attribute { name_index, info })
    }

    fn write_to(&self, writer: &mut Vec<u8>) -> Result<()> {
        let mut payload = Vec::new();
        self.info.write_payload(&mut payload)?;
        writer.write_u16(self.name_index);
        write_u32_len(payload.len(), writer)?;
        writer.write_bytes(&payload);
        Ok(())
    }
}

impl Remap for Attribute {
    fn update<M: IndexMapper>(&mut self, mapping: &mut M) -> Result<()> {
        if self.is_unknown() {
            mapping.opaque_payload(self.name_index);
        }
        self.name_index.update_index(mapping)?;
        self.info.update(mapping)
    }
}
