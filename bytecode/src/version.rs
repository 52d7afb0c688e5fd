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
//! this module defines the class file version.

use std::fmt::{Display, Formatter, Result};

/// the version of a java class.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug, Default, ReadWrite)]
pub struct JavaVersion {
    /// The minor version.
    pub minor: u16,
    /// The major version.
    pub major: u16,
}

impl JavaVersion {
    pub const J8: JavaVersion = JavaVersion {
        minor: 0,
        major: 52,
    };

    #[inline]
    pub const fn new(major: u16, minor: u16) -> Self {
        JavaVersion { minor, major }
    }
}

impl Display for JavaVersion {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result {
        match self.major {
            45 if self.minor <= 3 => write!(f, "JDK 1.0.2 minor version {}", self.minor),
            45 => write!(f, "JDK 1.1 minor version {}", self.minor),
            46..=48 => write!(f, "JDK 1.{} minor version {}", self.major - 44, self.minor),
            49 | 50 => write!(f, "Java SE {}.0 minor version {}", self.major - 44, self.minor),
            51..=255 => write!(f, "Java SE {} minor version {}", self.major - 44, self.minor),
            _ => write!(f, "unknown major version {} minor version {}", self.major, self.minor),
        }
    }
}
