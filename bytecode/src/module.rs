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
//! The `Module` attribute of a `module-info` class.

use crate::access::AccessFlags;

#[derive(Debug, Clone, PartialEq, Eq, ReadWrite, Remap)]
pub struct Require {
    /// A Module constant.
    #[index]
    pub requires_index: u16,
    pub requires_flags: AccessFlags,
    #[index(optional)]
    pub requires_version_index: u16,
}

/// An `exports` or `opens` directive.
#[derive(Debug, Clone, PartialEq, Eq, ReadWrite, Remap)]
pub struct Export {
    /// A Package constant.
    #[index]
    pub package_index: u16,
    pub flags: AccessFlags,
    /// Module constants; empty when the package is exported to everyone.
    #[index]
    pub to: Vec<u16>,
}

#[derive(Debug, Clone, PartialEq, Eq, ReadWrite, Remap)]
pub struct Provide {
    #[index]
    pub provides_index: u16,
    #[index]
    pub with: Vec<u16>,
}

#[derive(Debug, Clone, PartialEq, Eq, ReadWrite, Remap)]
pub struct Module {
    #[index]
    pub module_name_index: u16,
    pub module_flags: AccessFlags,
    #[index(optional)]
    pub module_version_index: u16,
    #[remap]
    pub requires: Vec<Require>,
    #[remap]
    pub exports: Vec<Export>,
    #[remap]
    pub opens: Vec<Export>,
    /// ClassRef constants of the services used.
    #[index]
    pub uses: Vec<u16>,
    #[remap]
    pub provides: Vec<Provide>,
}
