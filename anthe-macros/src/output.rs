use proc_macro2::TokenStream;
use quote::quote;
use syn::{Data, DeriveInput, Error, Fields, Ident, LitStr, Result, Variant};

pub(crate) fn generate_tagged(input: DeriveInput) -> Result<TokenStream> {
    let name = &input.ident;
    let mut prefix = name.to_string();
    for attr in &input.attrs {
        if attr.path().is_ident("tag") {
            attr.parse_nested_meta(|meta| {
                if meta.path.is_ident("prefix") {
                    prefix = meta.value()?.parse::<LitStr>()?.value();
                    Ok(())
                } else {
                    Err(meta.error("expected `prefix = \"...\"`"))
                }
            })?;
        }
    }

    let arms = enum_variants(&input)?.into_iter().map(|v| {
        let vname = &v.ident;
        let tag = format!("{prefix}.{vname}");
        match &v.fields {
            Fields::Unit => quote! { Self::#vname => #tag, },
            Fields::Named(_) => quote! { Self::#vname { .. } => #tag, },
            Fields::Unnamed(_) => quote! { Self::#vname(..) => #tag, },
        }
    });

    Ok(quote! {
        impl #name {
            pub fn tag(&self) -> &'static str {
                match self {
                    #(#arms)*
                }
            }
        }
    })
}

pub(crate) fn generate_operands(input: DeriveInput) -> Result<TokenStream> {
    let name = &input.ident;
    let mut src_arms = Vec::new();
    let mut dst_arms = Vec::new();

    for v in enum_variants(&input)? {
        let mut src_scalars = Vec::new();
        let mut src_lists = Vec::new();
        let mut dst_scalars = Vec::new();
        let mut dst_lists = Vec::new();
        if let Fields::Named(fields) = &v.fields {
            for field in &fields.named {
                let ident = field.ident.clone().expect("named field");
                match classify(&ident.to_string()) {
                    Some(Operand::Src) => src_scalars.push(ident),
                    Some(Operand::SrcList) => src_lists.push(ident),
                    Some(Operand::Dst) => dst_scalars.push(ident),
                    Some(Operand::DstList) => dst_lists.push(ident),
                    None => {}
                }
            }
        }
        src_arms.push(operand_arm(v, &src_scalars, &src_lists, Slot::Srcs));
        dst_arms.push(operand_arm(v, &dst_scalars, &dst_lists, Slot::Dsts));
    }

    Ok(quote! {
        impl #name {
            pub fn get_srcs(&self) -> ::std::vec::Vec<&crate::ir::Value> {
                match self {
                    #(#src_arms)*
                }
            }
            pub fn get_dsts(&self) -> ::std::vec::Vec<crate::ir::LocalId> {
                match self {
                    #(#dst_arms)*
                }
            }
        }
    })
}

/// Operand role recovered from a field name. `_typ` fields are type
/// handles and never operands, whatever their prefix.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Operand {
    Src,
    SrcList,
    Dst,
    DstList,
}

fn classify(name: &str) -> Option<Operand> {
    if name.ends_with("_typ") {
        None
    } else if name.starts_with("srcs") {
        Some(Operand::SrcList)
    } else if name.starts_with("src") {
        Some(Operand::Src)
    } else if name.starts_with("dsts") {
        Some(Operand::DstList)
    } else if name.starts_with("dst") {
        Some(Operand::Dst)
    } else {
        None
    }
}

#[derive(Clone, Copy)]
enum Slot {
    Srcs,
    Dsts,
}

fn operand_arm(v: &Variant, scalars: &[Ident], lists: &[Ident], slot: Slot) -> TokenStream {
    let vname = &v.ident;

    if scalars.is_empty() && lists.is_empty() {
        let pattern = match &v.fields {
            Fields::Unit => quote! { Self::#vname },
            Fields::Named(_) => quote! { Self::#vname { .. } },
            Fields::Unnamed(_) => quote! { Self::#vname(..) },
        };
        return quote! { #pattern => ::std::vec::Vec::new(), };
    }

    let pattern = quote! { Self::#vname { #(#scalars,)* #(#lists,)* .. } };
    let scalar_exprs: Vec<TokenStream> = scalars
        .iter()
        .map(|id| match slot {
            Slot::Srcs => quote!(#id),
            Slot::Dsts => quote!(*#id),
        })
        .collect();

    match (scalars.is_empty(), lists.len()) {
        (false, 0) => quote! { #pattern => ::std::vec![#(#scalar_exprs),*], },
        (true, 1) => {
            let list = &lists[0];
            match slot {
                Slot::Srcs => quote! { #pattern => #list.iter().collect(), },
                Slot::Dsts => {
                    quote! { #pattern => #list.iter().copied().flatten().collect(), }
                }
            }
        }
        _ => {
            let out_ty = match slot {
                Slot::Srcs => quote!(::std::vec::Vec<&crate::ir::Value>),
                Slot::Dsts => quote!(::std::vec::Vec<crate::ir::LocalId>),
            };
            let extends = lists.iter().map(|list| match slot {
                Slot::Srcs => quote! { out.extend(#list.iter()); },
                Slot::Dsts => quote! { out.extend(#list.iter().copied().flatten()); },
            });
            quote! {
                #pattern => {
                    let mut out: #out_ty = ::std::vec![#(#scalar_exprs),*];
                    #(#extends)*
                    out
                }
            }
        }
    }
}

fn enum_variants(input: &DeriveInput) -> Result<Vec<&Variant>> {
    match &input.data {
        Data::Enum(data) => Ok(data.variants.iter().collect()),
        _ => Err(Error::new_spanned(
            &input.ident,
            "tagged-union derives only apply to enums",
        )),
    }
}
