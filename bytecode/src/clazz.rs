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
//! The class file as a whole.

use log::debug;

use crate::access::AccessFlags;
use crate::attr::{Attribute, AttributeInfo, BootstrapMethod};
use crate::constant_pool::ConstantPool;
use crate::constants::JVM_MAGIC;
use crate::cursor::{ByteCursor, WriteBytes};
use crate::error::{Error, Result};
use crate::member::{Field, Method};
use crate::version::JavaVersion;
use crate::{read_from, write_to};

/// A parsed class file.
///
/// Every index in the structure is kept as read. The derived [`Remap`](crate::remap::Remap)
/// visits everything except `constant_pool`, whose entries are renumbered separately.
#[derive(Debug, Clone, PartialEq, Remap)]
pub struct ClassFile {
    pub version: JavaVersion,
    pub constant_pool: ConstantPool,
    pub access_flags: AccessFlags,
    #[index]
    pub this_class: u16,
    /// Zero for `java/lang/Object`.
    #[index(optional)]
    pub super_class: u16,
    #[index]
    pub interfaces: Vec<u16>,
    #[remap]
    pub fields: Vec<Field>,
    #[remap]
    pub methods: Vec<Method>,
    #[remap]
    pub attributes: Vec<Attribute>,
    /// The net number of pool slots added by the last patch applied to this class.
    pub constant_change: i32,
}

impl ClassFile {
    pub fn parse(bytes: &[u8]) -> Result<Self> {
        let mut reader = ByteCursor::new(bytes);
        let magic = reader.read_u32()?;
        if magic != JVM_MAGIC {
            return Err(Error::BadMagic(magic));
        }
        let version = read_from!(&mut reader)?;
        let count = reader.read_u16()?;
        let constant_pool = ConstantPool::parse(&mut reader, count)?;
        let access_flags = read_from!(&mut reader)?;
        let this_class = reader.read_u16()?;
        let super_class = reader.read_u16()?;
        constant_pool.resolve_class(this_class)?;
        if super_class != 0 {
            constant_pool.resolve_class(super_class)?;
        }
        let interfaces: Vec<u16> = read_from!(&mut reader)?;
        if !interfaces.is_empty() {
            debug!("class implements {} interface(s)", interfaces.len());
        }
        let fields: Vec<Field> = read_from!(&constant_pool, &mut reader)?;
        let methods: Vec<Method> = read_from!(&constant_pool, &mut reader)?;
        let attributes: Vec<Attribute> = read_from!(&constant_pool, &mut reader)?;
        if !reader.is_empty() {
            return Err(Error::Invalid(
                "class file",
                format!("{} trailing byte(s) after the attributes", reader.remaining()).into(),
            ));
        }
        debug!(
            "parsed class ({}): {} pool slots, {} field(s), {} method(s), {} attribute(s)",
            version,
            constant_pool.size(),
            fields.len(),
            methods.len(),
            attributes.len()
        );
        Ok(ClassFile {
            version,
            constant_pool,
            access_flags,
            this_class,
            super_class,
            interfaces,
            fields,
            methods,
            attributes,
            constant_change: 0,
        })
    }

    /// Encodes the class. Every count and length field is recomputed from the model.
    pub fn serialize(&self) -> Result<Vec<u8>> {
        let mut out = Vec::new();
        out.write_u32(JVM_MAGIC);
        write_to!(&self.version, &mut out)?;
        self.constant_pool.write_to(&mut out)?;
        write_to!(&self.access_flags, &mut out)?;
        out.write_u16(self.this_class);
        out.write_u16(self.super_class);
        write_to!(&self.interfaces, &mut out)?;
        write_to!(cp &self.fields, &mut out)?;
        write_to!(cp &self.methods, &mut out)?;
        write_to!(cp &self.attributes, &mut out)?;
        Ok(out)
    }

    /// The `BootstrapMethods` attribute, if the class has one.
    pub fn bootstrap_attribute(&self) -> Option<&Attribute> {
        self.attributes
            .iter()
            .find(|a| matches!(a.info, AttributeInfo::BootstrapMethods(_)))
    }

    /// The entries that Dynamic and InvokeDynamic constants index; empty without the attribute.
    pub fn bootstrap_methods(&self) -> &[BootstrapMethod] {
        match self.bootstrap_attribute().map(|a| &a.info) {
            Some(AttributeInfo::BootstrapMethods(methods)) => methods,
            _ => &[],
        }
    }

    /// The internal name of this class, decoded from modified UTF-8.
    pub fn name(&self) -> Result<String> {
        let name_index = self.constant_pool.resolve_class(self.this_class)?;
        Ok(self.constant_pool.resolve_utf8(name_index)?.decode()?)
    }
}
