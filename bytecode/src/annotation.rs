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
//! Annotations, as stored in the `Runtime*Annotations` and `AnnotationDefault` attributes.
//!
//! Element values are kept as pool indices; a constant value is only looked at through the pool.

use crate::cursor::{ByteCursor, WriteBytes};
use crate::error::{Error, Result};
use crate::remap::{IndexMapper, Remap};
use crate::rw::{read_u8_counted, write_u8_counted, ReadWrite};

/// The value of an annotation element. Tags are the ASCII characters of the class file format.
#[derive(Debug, Clone, PartialEq, Eq, ReadWrite, Remap)]
#[tag_type(u8)]
pub enum ElementValue {
    /// `B`
    #[tag(66)]
    Byte(#[index] u16),
    /// `C`
    Char(#[index] u16),
    /// `D`
    Double(#[index] u16),
    /// `F`
    #[tag(70)]
    Float(#[index] u16),
    /// `I`
    #[tag(73)]
    Int(#[index] u16),
    /// `J`
    Long(#[index] u16),
    /// `S`
    #[tag(83)]
    Short(#[index] u16),
    /// `Z`
    #[tag(90)]
    Boolean(#[index] u16),
    /// `s`, a Utf8 constant rather than a String constant.
    #[tag(115)]
    String(#[index] u16),
    /// `e`
    #[tag(101)]
    Enum {
        #[index]
        type_name_index: u16,
        #[index]
        const_name_index: u16,
    },
    /// `c`, the return descriptor of a class literal.
    #[tag(99)]
    Class(#[index] u16),
    /// `@`
    #[tag(64)]
    Annotation(#[remap] Annotation),
    /// `[`
    #[tag(91)]
    Array(#[remap] Vec<ElementValue>),
}

#[derive(Debug, Clone, PartialEq, Eq, ReadWrite, Remap)]
pub struct ElementValuePair {
    #[index]
    pub element_name_index: u16,
    #[remap]
    pub value: ElementValue,
}

#[derive(Debug, Clone, PartialEq, Eq, ReadWrite, Remap)]
pub struct Annotation {
    /// A field descriptor naming the annotation interface.
    #[index]
    pub type_index: u16,
    #[remap]
    pub element_value_pairs: Vec<ElementValuePair>,
}

/// The annotations of each formal parameter, in declaration order.
///
/// The parameter count is a single byte and may be smaller than the descriptor's.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ParameterAnnotations(pub Vec<Vec<Annotation>>);

impl ReadWrite for ParameterAnnotations {
    fn read_from(reader: &mut ByteCursor<'_>) -> Result<Self> {
        read_u8_counted(reader).map(ParameterAnnotations)
    }

    fn write_to(&self, writer: &mut Vec<u8>) -> Result<()> {
        write_u8_counted(&self.0, writer, "parameter annotations")
    }
}

impl Remap for ParameterAnnotations {
    fn update<M: IndexMapper>(&mut self, mapping: &mut M) -> Result<()> {
        for annotations in &mut self.0 {
            annotations.update(mapping)?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ReadWrite)]
pub struct LocalVarTarget {
    pub start_pc: u16,
    pub length: u16,
    pub index: u16,
}

/// What a type annotation is attached to. None of these hold pool indices.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TargetInfo {
    /// 0x00, 0x01
    TypeParameter(u8),
    /// 0x10; 65535 is the superclass, anything else an index into `interfaces`.
    SuperType(u16),
    /// 0x11, 0x12
    TypeParameterBound {
        type_parameter_index: u8,
        bound_index: u8,
    },
    /// 0x13 to 0x15
    Empty,
    /// 0x16
    FormalParameter(u8),
    /// 0x17, an index into the `Exceptions` attribute.
    Throws(u16),
    /// 0x40, 0x41
    LocalVar(Vec<LocalVarTarget>),
    /// 0x42, an index into the exception table.
    Catch(u16),
    /// 0x43 to 0x46
    Offset(u16),
    /// 0x47 to 0x4B
    TypeArgument { offset: u16, type_argument_index: u8 },
}

impl TargetInfo {
    fn read_from(target_type: u8, reader: &mut ByteCursor<'_>) -> Result<Self> {
        Ok(match target_type {
            0x00 | 0x01 => TargetInfo::TypeParameter(reader.read_u8()?),
            0x10 => TargetInfo::SuperType(reader.read_u16()?),
            0x11 | 0x12 => TargetInfo::TypeParameterBound {
                type_parameter_index: reader.read_u8()?,
                bound_index: reader.read_u8()?,
            },
            0x13..=0x15 => TargetInfo::Empty,
            0x16 => TargetInfo::FormalParameter(reader.read_u8()?),
            0x17 => TargetInfo::Throws(reader.read_u16()?),
            0x40 | 0x41 => TargetInfo::LocalVar(Vec::read_from(reader)?),
            0x42 => TargetInfo::Catch(reader.read_u16()?),
            0x43..=0x46 => TargetInfo::Offset(reader.read_u16()?),
            0x47..=0x4B => TargetInfo::TypeArgument {
                offset: reader.read_u16()?,
                type_argument_index: reader.read_u8()?,
            },
            _ => {
                return Err(Error::Unrecognized(
                    "type annotation target type",
                    format!("{:#04X}", target_type),
                ))
            }
        })
    }

    fn write_to(&self, writer: &mut Vec<u8>) -> Result<()> {
        match self {
            TargetInfo::TypeParameter(i) | TargetInfo::FormalParameter(i) => writer.write_u8(*i),
            TargetInfo::SuperType(i) | TargetInfo::Throws(i) | TargetInfo::Catch(i) | TargetInfo::Offset(i) => {
                writer.write_u16(*i)
            }
            TargetInfo::TypeParameterBound {
                type_parameter_index,
                bound_index,
            } => {
                writer.write_u8(*type_parameter_index);
                writer.write_u8(*bound_index);
            }
            TargetInfo::Empty => {}
            TargetInfo::LocalVar(table) => table.write_to(writer)?,
            TargetInfo::TypeArgument {
                offset,
                type_argument_index,
            } => {
                writer.write_u16(*offset);
                writer.write_u8(*type_argument_index);
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ReadWrite)]
pub struct TypePathEntry {
    pub type_path_kind: u8,
    pub type_argument_index: u8,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeAnnotation {
    /// The raw target type, kept alongside `target_info` because several types share a layout.
    pub target_type: u8,
    pub target_info: TargetInfo,
    pub type_path: Vec<TypePathEntry>,
    pub annotation: Annotation,
}

impl ReadWrite for TypeAnnotation {
    fn read_from(reader: &mut ByteCursor<'_>) -> Result<Self> {
        let target_type = reader.read_u8()?;
        Ok(TypeAnnotation {
            target_type,
            target_info: TargetInfo::read_from(target_type, reader)?,
            type_path: read_u8_counted(reader)?,
            annotation: Annotation::read_from(reader)?,
        })
    }

    fn write_to(&self, writer: &mut Vec<u8>) -> Result<()> {
        writer.write_u8(self.target_type);
        self.target_info.write_to(writer)?;
        write_u8_counted(&self.type_path, writer, "type path")?;
        self.annotation.write_to(writer)
    }
}

impl Remap for TypeAnnotation {
    #[inline]
    fn update<M: IndexMapper>(&mut self, mapping: &mut M) -> Result<()> {
        self.annotation.update(mapping)
    }
}
