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
//! Derives used by classpatch. The generated code refers to `crate::` paths and only compiles inside classpatch.

use proc_macro::TokenStream;
use syn::DeriveInput;

mod derive;

/// Derives `ReadWrite`.
///
/// Structs read and write their fields in declaration order.
/// Enums are prefixed by a tag of the type given in `#[tag_type(..)]`; a variant's tag is the value
/// in `#[tag(..)]`, its discriminant, or one more than the previous variant's tag.
#[proc_macro_derive(ReadWrite, attributes(tag_type, tag))]
pub fn derive_readwrite(item: TokenStream) -> TokenStream {
    let input = syn::parse_macro_input!(item as DeriveInput);
    derive::readwrite(input)
        .unwrap_or_else(|e| e.to_compile_error())
        .into()
}

/// Derives `Remap` from fields annotated with `#[index]`, `#[index(optional)]` or `#[remap]`.
#[proc_macro_derive(Remap, attributes(index, remap))]
pub fn derive_remap(item: TokenStream) -> TokenStream {
    let input = syn::parse_macro_input!(item as DeriveInput);
    derive::remap(input)
        .unwrap_or_else(|e| e.to_compile_error())
        .into()
}
