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
//! Stack map frames of the `StackMapTable` attribute.
//!
//! Frames are kept in the exact form they were read in, so that a table that is only renumbered
//! encodes back to the same bytes.

use crate::cursor::{ByteCursor, WriteBytes};
use crate::error::{Error, Result};
use crate::remap::{IndexMapper, Remap};
use crate::rw::write_u16_len;
use crate::ReadWrite;

#[derive(Debug, Eq, PartialEq, Hash, Clone, ReadWrite, Remap)]
#[tag_type(u8)]
pub enum VerificationType {
    Top,
    Integer,
    Float,
    Double,
    Long,
    Null,
    UninitializedThis,
    Object(#[index] u16),
    /// Offset of the `new` instruction that created the object.
    Uninitialized(u16),
}

#[derive(Debug, Eq, PartialEq, Clone)]
pub enum StackMapFrame {
    /// Frame types 0 to 63; the type is the offset delta.
    Same { offset_delta: u8 },
    /// Frame types 64 to 127.
    SameLocals1StackItem {
        offset_delta: u8,
        stack: VerificationType,
    },
    /// Frame type 247.
    SameLocals1StackItemExtended {
        offset_delta: u16,
        stack: VerificationType,
    },
    /// Frame types 248 to 250, removing `chopped` locals.
    Chop { chopped: u8, offset_delta: u16 },
    /// Frame type 251.
    SameExtended { offset_delta: u16 },
    /// Frame types 252 to 254, one to three additional locals.
    Append {
        offset_delta: u16,
        locals: Vec<VerificationType>,
    },
    /// Frame type 255.
    Full {
        offset_delta: u16,
        locals: Vec<VerificationType>,
        stack: Vec<VerificationType>,
    },
}

impl ReadWrite for StackMapFrame {
    fn read_from(reader: &mut ByteCursor<'_>) -> Result<Self> {
        let frame_type = reader.read_u8()?;
        Ok(match frame_type {
            0..=63 => StackMapFrame::Same {
                offset_delta: frame_type,
            },
            64..=127 => StackMapFrame::SameLocals1StackItem {
                offset_delta: frame_type - 64,
                stack: VerificationType::read_from(reader)?,
            },
            128..=246 => {
                return Err(Error::Unrecognized(
                    "stack map frame type (reserved for future use)",
                    frame_type.to_string(),
                ))
            }
            247 => StackMapFrame::SameLocals1StackItemExtended {
                offset_delta: reader.read_u16()?,
                stack: VerificationType::read_from(reader)?,
            },
            248..=250 => StackMapFrame::Chop {
                chopped: 251 - frame_type,
                offset_delta: reader.read_u16()?,
            },
            251 => StackMapFrame::SameExtended {
                offset_delta: reader.read_u16()?,
            },
            252..=254 => {
                let offset_delta = reader.read_u16()?;
                let mut locals = Vec::with_capacity((frame_type - 251) as usize);
                for _ in 251..frame_type {
                    locals.push(VerificationType::read_from(reader)?);
                }
                StackMapFrame::Append {
                    offset_delta,
                    locals,
                }
            }
            255 => StackMapFrame::Full {
                offset_delta: reader.read_u16()?,
                locals: Vec::read_from(reader)?,
                stack: Vec::read_from(reader)?,
            },
        })
    }

    fn write_to(&self, writer: &mut Vec<u8>) -> Result<()> {
        match self {
            StackMapFrame::Same { offset_delta: off @ 0..=63 } => writer.write_u8(*off),
            StackMapFrame::SameLocals1StackItem {
                offset_delta: off @ 0..=63,
                stack,
            } => {
                writer.write_u8(*off + 64);
                stack.write_to(writer)?;
            }
            StackMapFrame::Same { offset_delta } | StackMapFrame::SameLocals1StackItem { offset_delta, .. } => {
                return Err(Error::Invalid(
                    "stack map frame offset",
                    format!("{} does not fit a compact frame", offset_delta).into(),
                ))
            }
            StackMapFrame::SameLocals1StackItemExtended { offset_delta, stack } => {
                writer.write_u8(247);
                writer.write_u16(*offset_delta);
                stack.write_to(writer)?;
            }
            StackMapFrame::Chop {
                chopped: chopped @ 1..=3,
                offset_delta,
            } => {
                writer.write_u8(251 - *chopped);
                writer.write_u16(*offset_delta);
            }
            StackMapFrame::Chop { chopped, .. } => {
                return Err(Error::Invalid("chop frame", chopped.to_string().into()))
            }
            StackMapFrame::SameExtended { offset_delta } => {
                writer.write_u8(251);
                writer.write_u16(*offset_delta);
            }
            StackMapFrame::Append { offset_delta, locals } if (1..=3).contains(&locals.len()) => {
                writer.write_u8(251 + locals.len() as u8);
                writer.write_u16(*offset_delta);
                for local in locals {
                    local.write_to(writer)?;
                }
            }
            StackMapFrame::Append { locals, .. } => {
                return Err(Error::Invalid(
                    "append frame",
                    format!("{} locals", locals.len()).into(),
                ))
            }
            StackMapFrame::Full {
                offset_delta,
                locals,
                stack,
            } => {
                writer.write_u8(255);
                writer.write_u16(*offset_delta);
                write_u16_len(locals.len(), writer)?;
                for local in locals {
                    local.write_to(writer)?;
                }
                stack.write_to(writer)?;
            }
        }
        Ok(())
    }
}

impl Remap for StackMapFrame {
    fn update<M: IndexMapper>(&mut self, mapping: &mut M) -> Result<()> {
        match self {
            StackMapFrame::SameLocals1StackItem { stack, .. }
            | StackMapFrame::SameLocals1StackItemExtended { stack, .. } => stack.update(mapping),
            StackMapFrame::Append { locals, .. } => locals.update(mapping),
            StackMapFrame::Full { locals, stack, .. } => {
                locals.update(mapping)?;
                stack.update(mapping)
            }
            StackMapFrame::Same { .. }
            | StackMapFrame::Chop { .. }
            | StackMapFrame::SameExtended { .. } => Ok(()),
        }
    }
}
