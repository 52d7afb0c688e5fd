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
//! Conversion between Java's Modified UTF-8 and Rust strings.
//!
//! Utf8 constants are stored as raw bytes and never validated while parsing; these helpers
//! are only used when text is wanted, such as building a pool or printing a name.
//!
//! Compared with UTF-8, NUL is encoded in two bytes and supplementary characters
//! are encoded as a surrogate pair of three bytes each.

use std::convert::TryFrom;

use thiserror::Error;

/// An error encountered during conversion.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum MUTFError {
    /// A multi-byte sequence was cut off by the end of the buffer.
    #[error("Malformed Input: Partial character at end")]
    PartialCharacterAtEnd,

    /// The sequence starting at this byte offset is not valid.
    #[error("Malformed Input around byte: {0}")]
    AroundByte(usize),
}

#[inline]
fn continuation(buf: &[u8], at: usize) -> Result<u32, MUTFError> {
    match buf.get(at) {
        Some(&b) if b & 0xC0 == 0x80 => Ok((b & 0x3F) as u32),
        Some(_) => Err(MUTFError::AroundByte(at)),
        None => Err(MUTFError::PartialCharacterAtEnd),
    }
}

/// Decodes a modified UTF-8 buffer into an owned string.
pub fn modified_utf8_to_string(buf: &[u8]) -> Result<String, MUTFError> {
    let mut out = String::with_capacity(buf.len());
    let mut i = 0;
    while i < buf.len() {
        let b = buf[i];
        let (code, width) = match b >> 4 {
            0..=7 => (b as u32, 1),
            12 | 13 => (((b & 0x1F) as u32) << 6 | continuation(buf, i + 1)?, 2),
            14 => {
                let unit = ((b & 0x0F) as u32) << 12
                    | continuation(buf, i + 1)? << 6
                    | continuation(buf, i + 2)?;
                if (0xD800..0xDC00).contains(&unit) && buf.get(i + 3) == Some(&0xED) {
                    let low = ((buf[i + 3] & 0x0F) as u32) << 12
                        | continuation(buf, i + 4)? << 6
                        | continuation(buf, i + 5)?;
                    if (0xDC00..0xE000).contains(&low) {
                        (0x10000 + ((unit - 0xD800) << 10) + (low - 0xDC00), 6)
                    } else {
                        return Err(MUTFError::AroundByte(i + 3));
                    }
                } else {
                    (unit, 3)
                }
            }
            _ => return Err(MUTFError::AroundByte(i)),
        };
        out.push(char::try_from(code).map_err(|_| MUTFError::AroundByte(i))?);
        i += width;
    }
    Ok(out)
}

/// Encodes a string as modified UTF-8.
///
/// This will never error because every `&str` is representable.
pub fn string_to_modified_utf8(s: &str) -> Vec<u8> {
    let mut vec = Vec::with_capacity(s.len());
    let mut units = [0u16; 2];
    for c in s.chars() {
        for &unit in c.encode_utf16(&mut units).iter() {
            let unit = unit as u32;
            match unit {
                0x01..=0x7F => vec.push(unit as u8),
                0x00 | 0x80..=0x7FF => {
                    vec.push(0xC0 | (unit >> 6) as u8);
                    vec.push(0x80 | (unit & 0x3F) as u8);
                }
                _ => {
                    vec.push(0xE0 | (unit >> 12) as u8);
                    vec.push(0x80 | ((unit >> 6) & 0x3F) as u8);
                    vec.push(0x80 | (unit & 0x3F) as u8);
                }
            }
        }
    }
    vec
}
