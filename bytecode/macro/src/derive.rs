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

use proc_macro2::{Ident, Span, TokenStream as TokenStream2};
use quote::{format_ident, quote, quote_spanned, ToTokens};
use syn::spanned::Spanned;
use syn::*;

fn assert_readwrite<T: ToTokens + Spanned>(ty: &T) -> TokenStream2 {
    let span = ty.span();
    quote_spanned! { span =>
        <#ty as crate::ReadWrite>
    }
}

/// Names used to bind the fields of a variant or struct.
///
/// Unnamed fields get `__field{n}` so they cannot clash with keywords.
fn field_idents(fields: &Fields) -> Vec<Ident> {
    fields
        .iter()
        .enumerate()
        .map(|(i, f)| f.ident.clone().unwrap_or_else(|| format_ident!("__field{}", i)))
        .collect()
}

fn construct(path: TokenStream2, fields: &Fields, idents: &[Ident]) -> TokenStream2 {
    match fields {
        Fields::Named(_) => quote! { #path { #(#idents),* } },
        Fields::Unnamed(_) => quote! { #path( #(#idents),* ) },
        Fields::Unit => quote! { #path },
    }
}

fn variant_tags(e: &DataEnum) -> Result<Vec<LitInt>> {
    let mut next: u64 = 0;
    let mut tags = Vec::with_capacity(e.variants.len());
    for v in &e.variants {
        let explicit = match v.attrs.iter().find(|a| a.path.is_ident("tag")) {
            Some(a) => Some(a.parse_args::<LitInt>()?.base10_parse::<u64>()?),
            None => match &v.discriminant {
                Some((_, Expr::Lit(ExprLit { lit: Lit::Int(l), .. }))) => Some(l.base10_parse::<u64>()?),
                Some((_, e)) => return Err(Error::new(e.span(), "discriminant must be an integer literal")),
                None => None,
            },
        };
        let tag = explicit.unwrap_or(next);
        next = tag + 1;
        tags.push(LitInt::new(&tag.to_string(), v.span()));
    }
    Ok(tags)
}

pub(crate) fn readwrite(input: DeriveInput) -> Result<TokenStream2> {
    let name = &input.ident;
    let (impl_generics, ty_generics, where_clause) = input.generics.split_for_impl();
    match &input.data {
        Data::Struct(s) => {
            let idents = field_idents(&s.fields);
            let types = s.fields.iter().map(|f| assert_readwrite(&f.ty)).collect::<Vec<_>>();
            let members = s
                .fields
                .iter()
                .enumerate()
                .map(|(i, f)| match &f.ident {
                    Some(id) => quote! { #id },
                    None => Index::from(i).into_token_stream(),
                })
                .collect::<Vec<_>>();
            let construct = construct(quote! { Self }, &s.fields, &idents);
            Ok(quote! {
                impl #impl_generics crate::ReadWrite for #name #ty_generics #where_clause {
                    fn read_from(reader: &mut crate::cursor::ByteCursor<'_>) -> crate::error::Result<Self> {
                        #(
                            let #idents = #types::read_from(reader)?;
                        )*
                        Ok(#construct)
                    }
                    fn write_to(&self, writer: &mut Vec<u8>) -> crate::error::Result<()> {
                        #(
                            #types::write_to(&self.#members, writer)?;
                        )*
                        Ok(())
                    }
                }
            })
        }
        Data::Enum(e) => {
            let tag_type: Type = input
                .attrs
                .iter()
                .find(|a| a.path.is_ident("tag_type"))
                .ok_or_else(|| Error::new(input.span(), "Couldn't find tag_type attribute"))?
                .parse_args()?;
            let tag_ty = assert_readwrite(&tag_type);
            let tags = variant_tags(e)?;
            let kind = LitStr::new(&format!("{} tag", name), Span::call_site());

            let mut read_arms = Vec::with_capacity(e.variants.len());
            let mut write_arms = Vec::with_capacity(e.variants.len());
            for (v, tag) in e.variants.iter().zip(tags.iter()) {
                let variant = &v.ident;
                let idents = field_idents(&v.fields);
                let types = v.fields.iter().map(|f| assert_readwrite(&f.ty)).collect::<Vec<_>>();
                let construct = construct(quote! { Self::#variant }, &v.fields, &idents);
                read_arms.push(quote! {
                    #tag => {
                        #(
                            let #idents = #types::read_from(reader)?;
                        )*
                        Ok(#construct)
                    }
                });
                write_arms.push(quote! {
                    #construct => {
                        let tag: #tag_type = #tag;
                        #tag_ty::write_to(&tag, writer)?;
                        #(
                            #types::write_to(#idents, writer)?;
                        )*
                        Ok(())
                    }
                });
            }
            Ok(quote! {
                impl #impl_generics crate::ReadWrite for #name #ty_generics #where_clause {
                    fn read_from(reader: &mut crate::cursor::ByteCursor<'_>) -> crate::error::Result<Self> {
                        let tag = #tag_ty::read_from(reader)?;
                        match tag {
                            #(#read_arms)*
                            _ => Err(crate::error::Error::Unrecognized(#kind, tag.to_string())),
                        }
                    }
                    fn write_to(&self, writer: &mut Vec<u8>) -> crate::error::Result<()> {
                        match self {
                            #(#write_arms)*
                        }
                    }
                }
            })
        }
        Data::Union(_) => Err(Error::new(
            input.span(),
            "This macro should not be used on a union type",
        )),
    }
}

enum IndexKind {
    Index,
    Optional,
    Nested,
}

fn index_kind(field: &Field) -> Result<Option<IndexKind>> {
    for a in &field.attrs {
        if a.path.is_ident("remap") {
            return Ok(Some(IndexKind::Nested));
        }
        if a.path.is_ident("index") {
            if a.tokens.is_empty() {
                return Ok(Some(IndexKind::Index));
            }
            let arg: Ident = a.parse_args()?;
            return if arg == "optional" {
                Ok(Some(IndexKind::Optional))
            } else {
                Err(Error::new(arg.span(), "expected `optional`"))
            };
        }
    }
    Ok(None)
}

/// A statement that updates the place `target`, which must evaluate to `&mut FieldType`.
fn update_stmt(kind: &IndexKind, target: TokenStream2) -> TokenStream2 {
    match kind {
        IndexKind::Index => quote! { crate::remap::PoolIndex::update_index(#target, mapping)?; },
        IndexKind::Optional => quote! { crate::remap::update_optional_index(#target, mapping)?; },
        IndexKind::Nested => quote! { crate::remap::Remap::update(#target, mapping)?; },
    }
}

pub(crate) fn remap(input: DeriveInput) -> Result<TokenStream2> {
    let name = &input.ident;
    let (impl_generics, ty_generics, where_clause) = input.generics.split_for_impl();
    let body = match &input.data {
        Data::Struct(s) => {
            let mut stmts = vec![];
            for (i, f) in s.fields.iter().enumerate() {
                if let Some(kind) = index_kind(f)? {
                    let member = match &f.ident {
                        Some(id) => quote! { #id },
                        None => Index::from(i).into_token_stream(),
                    };
                    stmts.push(update_stmt(&kind, quote! { &mut self.#member }));
                }
            }
            quote! { #(#stmts)* }
        }
        Data::Enum(e) => {
            let mut arms = vec![];
            for v in &e.variants {
                let variant = &v.ident;
                let idents = field_idents(&v.fields);
                let mut stmts = vec![];
                let mut bindings = vec![];
                for (f, id) in v.fields.iter().zip(idents.iter()) {
                    match index_kind(f)? {
                        Some(kind) => {
                            stmts.push(update_stmt(&kind, quote! { #id }));
                            bindings.push(quote! { #id });
                        }
                        None if f.ident.is_none() => bindings.push(quote! { _ }),
                        None => {}
                    }
                }
                let pattern = match &v.fields {
                    Fields::Named(_) => quote! { Self::#variant { #(#bindings,)* .. } },
                    Fields::Unnamed(_) => quote! { Self::#variant( #(#bindings),* ) },
                    Fields::Unit => quote! { Self::#variant },
                };
                arms.push(quote! { #pattern => { #(#stmts)* } });
            }
            quote! {
                match self {
                    #(#arms)*
                }
            }
        }
        Data::Union(_) => {
            return Err(Error::new(
                input.span(),
                "This macro should not be used on a union type",
            ))
        }
    };
    Ok(quote! {
        impl #impl_generics crate::remap::Remap for #name #ty_generics #where_clause {
            #[allow(unused_variables)]
            fn update<M: crate::remap::IndexMapper>(&mut self, mapping: &mut M) -> crate::error::Result<()> {
                #body
                Ok(())
            }
        }
    })
}
