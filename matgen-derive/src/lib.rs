//! Derive macros for [matgen].
//!
//! The only macro exported so far is [`NodeTable`], which turns a closed enumeration of node kinds into the lookup
//! table mapping each variant to its `(group, op code)` pair, as stored in material graphs.
//!
//! [matgen]: https://crates.io/crates/matgen

use std::collections::HashMap;

use proc_macro::TokenStream;
use quote::quote;
use syn::{
  parse_macro_input, spanned::Spanned as _, Data, DeriveInput, Fields, Ident, Lit, LitStr, Meta, NestedMeta,
};

/// A parsed `#[node(group = …, op = …, name = …)]` variant.
#[derive(Debug)]
struct NodeVariant {
  ident: Ident,
  group: u16,
  op: u16,
  name: String,
}

impl NodeVariant {
  fn parse(variant: &syn::Variant) -> syn::Result<Self> {
    if !matches!(variant.fields, Fields::Unit) {
      return Err(syn::Error::new_spanned(
        &variant.fields,
        "node kinds cannot carry fields",
      ));
    }

    let mut group = None;
    let mut op = None;
    let mut name = None;

    for attr in variant.attrs.iter().filter(|attr| attr.path.is_ident("node")) {
      let list = match attr.parse_meta()? {
        Meta::List(list) => list,
        meta => return Err(syn::Error::new_spanned(meta, "expected #[node(group = …, op = …)]")),
      };

      for nested in list.nested {
        let nv = match nested {
          NestedMeta::Meta(Meta::NameValue(nv)) => nv,
          nested => return Err(syn::Error::new_spanned(nested, "expected `key = value`")),
        };

        match (&nv.lit, nv.path.get_ident().map(ToString::to_string).as_deref()) {
          (Lit::Int(lit), Some("group")) => group = Some(lit.base10_parse::<u16>()?),
          (Lit::Int(lit), Some("op")) => op = Some(lit.base10_parse::<u16>()?),
          (Lit::Str(lit), Some("name")) => name = Some(lit.value()),
          _ => return Err(syn::Error::new_spanned(&nv, "unknown node attribute")),
        }
      }
    }

    let group = group.ok_or_else(|| syn::Error::new(variant.span(), "missing `group` in #[node(…)]"))?;
    let op = op.ok_or_else(|| syn::Error::new(variant.span(), "missing `op` in #[node(…)]"))?;
    let name = name.unwrap_or_else(|| split_camel_case(&variant.ident.to_string()));

    Ok(NodeVariant {
      ident: variant.ident.clone(),
      group,
      op,
      name,
    })
  }
}

/// Turn `WorldPosition` into `World Position`.
fn split_camel_case(ident: &str) -> String {
  let mut name = String::with_capacity(ident.len() + 4);

  for (i, c) in ident.chars().enumerate() {
    if i > 0 && c.is_uppercase() {
      name.push(' ');
    }

    name.push(c);
  }

  name
}

fn expand(input: DeriveInput) -> syn::Result<proc_macro2::TokenStream> {
  let enum_data = match &input.data {
    Data::Enum(data) => data,
    _ => {
      return Err(syn::Error::new_spanned(
        &input.ident,
        "NodeTable can only be derived for enums",
      ))
    }
  };

  let variants = enum_data
    .variants
    .iter()
    .map(NodeVariant::parse)
    .collect::<syn::Result<Vec<_>>>()?;

  // two variants sharing the same type would make the table ambiguous
  let mut seen = HashMap::new();
  for variant in &variants {
    if let Some(previous) = seen.insert((variant.group, variant.op), &variant.ident) {
      return Err(syn::Error::new_spanned(
        &variant.ident,
        format!(
          "node type ({}, {}) is already used by `{}`",
          variant.group, variant.op, previous
        ),
      ));
    }
  }

  let ty = &input.ident;
  let idents = variants.iter().map(|v| &v.ident).collect::<Vec<_>>();
  let groups = variants.iter().map(|v| v.group).collect::<Vec<_>>();
  let ops = variants.iter().map(|v| v.op).collect::<Vec<_>>();
  let names = variants
    .iter()
    .map(|v| LitStr::new(&v.name, v.ident.span()))
    .collect::<Vec<_>>();

  let q = quote! {
    impl #ty {
      /// Every node kind, in declaration order.
      pub const ALL: &'static [#ty] = &[#(#ty::#idents),*];

      /// Type identifier, as stored in serialized graphs.
      pub const fn type_id(self) -> crate::node::NodeTypeId {
        match self {
          #(#ty::#idents => crate::node::NodeTypeId::new(#groups, #ops),)*
        }
      }

      /// Find the node kind registered for the given type identifier.
      pub fn from_type_id(id: crate::node::NodeTypeId) -> Option<Self> {
        match (id.group, id.op) {
          #((#groups, #ops) => Some(#ty::#idents),)*
          _ => None,
        }
      }

      /// Human-readable name of the node kind.
      pub const fn name(self) -> &'static str {
        match self {
          #(#ty::#idents => #names,)*
        }
      }
    }
  };

  Ok(q)
}

/// Derive the `(group, op code)` table of a node kind enumeration.
///
/// Every variant must be a unit variant annotated with `#[node(group = G, op = O)]`, and optionally
/// `name = "…"` to override the name derived from the variant identifier. The generated code refers to
/// `crate::node::NodeTypeId`, which must provide a `const fn new(group: u16, op: u16)` constructor and `group` / `op`
/// fields.
///
/// The following items are generated:
///
/// - `ALL`, the list of every variant.
/// - `type_id(self)`, mapping a variant to its type identifier.
/// - `from_type_id(id)`, the reverse mapping.
/// - `name(self)`, the human-readable name.
#[proc_macro_derive(NodeTable, attributes(node))]
pub fn derive_node_table(tokens: TokenStream) -> TokenStream {
  let input = parse_macro_input!(tokens as DeriveInput);

  match expand(input) {
    Ok(q) => q.into(),
    Err(e) => e.to_compile_error().into(),
  }
}
