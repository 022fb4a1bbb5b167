extern crate proc_macro;

use proc_macro::TokenStream;
use quote::quote;

/// Derives `CerealType` for a struct with named fields.
///
/// Every field must implement `CerealRepresentable` (and `Clone`); each is
/// encoded under its own name and required on decode. Enums, unions, and
/// tuple structs are not supported.
#[proc_macro_derive(CerealType)]
pub fn cereal_type_derive(input: TokenStream) -> TokenStream {
    let ast = syn::parse(input).unwrap();

    impl_cereal_type(&ast)
}

fn impl_cereal_type(ast: &syn::DeriveInput) -> TokenStream {
    let cereal_trait = quote! { cereal::conv::CerealType };
    let encoder_type = quote! { cereal::encode::Encoder };
    let decoder_type = quote! { cereal::decode::Decoder };
    let result_type = quote! { cereal::error::CerealResult };

    let name = &ast.ident;
    let gen = match &ast.data {
        syn::Data::Enum(_) => {
            unimplemented!("Derive macro `CerealType` not implemented for enums")
        }
        syn::Data::Union(_) => {
            unimplemented!("Derive macro `CerealType` not implemented for unions")
        }
        syn::Data::Struct(syn::DataStruct { fields, .. }) => match fields {
            syn::Fields::Named(syn::FieldsNamed { named, .. }) => {
                let (ident, key): (Vec<&syn::Ident>, Vec<String>) = named
                    .iter()
                    .map(|field| {
                        let ident = field.ident.as_ref().unwrap();
                        (ident, ident.to_string())
                    })
                    .unzip();
                quote! {
                    impl #cereal_trait for #name {
                        fn encode(&self, enc: &mut #encoder_type) -> #result_type<()> {
                            #( enc.encode(self.#ident.clone(), #key); )*
                            Ok(())
                        }

                        fn decode(dec: &#decoder_type<'_>) -> #result_type<Self> {
                            Ok(Self { #( #ident: dec.require(#key)? ),* })
                        }
                    }
                }
            }
            _ => unimplemented!("Derive macro `CerealType` requires named fields"),
        },
    };
    gen.into()
}

/// Derives `IdentifiedCerealType` for a type that also implements (or
/// derives) `CerealType`.
///
/// The identifier defaults to the type's name and can be overridden with
/// `#[cereal(identifier = "...")]`.
#[proc_macro_derive(IdentifiedCerealType, attributes(cereal))]
pub fn identified_cereal_type_derive(input: TokenStream) -> TokenStream {
    let ast: syn::DeriveInput = syn::parse(input).unwrap();

    let name = &ast.ident;
    let mut identifier = name.to_string();
    for attr in &ast.attrs {
        if attr.path().is_ident("cereal") {
            attr.parse_nested_meta(|meta| {
                if meta.path.is_ident("identifier") {
                    let lit: syn::LitStr = meta.value()?.parse()?;
                    identifier = lit.value();
                    Ok(())
                } else {
                    Err(meta.error("unsupported cereal attribute"))
                }
            })
            .unwrap();
        }
    }

    let gen = quote! {
        impl cereal::conv::IdentifiedCerealType for #name {
            const IDENTIFIER: &'static str = #identifier;
        }
    };
    gen.into()
}
