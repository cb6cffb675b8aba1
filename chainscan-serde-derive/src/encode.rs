use proc_macro::TokenStream;
use quote::quote;

pub fn impl_encode(ast: &syn::DeriveInput) -> TokenStream {
    let name = &ast.ident;
    match &ast.data {
        syn::Data::Struct(data) => {
            let statements: Vec<_> = data
                .fields
                .iter()
                .enumerate()
                .map(|(index, field)| encode_field(field, index))
                .collect();

            let expanded = quote! {
                impl BtcEncode for #name {
                    fn btc_encode<W: std::io::Write>(&self, mut target: W) -> Result<(), std::io::Error> {
                        #(#statements)*
                        Ok(())
                    }
                }
            };
            TokenStream::from(expanded)
        }
        syn::Data::Enum(data) => {
            let variants: Vec<_> = data
                .variants
                .iter()
                .map(|variant| encode_variant(variant, name))
                .collect();

            let expanded = quote! {
                impl BtcEncode for #name {
                    fn btc_encode<W: std::io::Write>(&self, mut target: W) -> Result<(), std::io::Error> {
                        match self {
                            #(#variants)*
                        }
                        Ok(())
                    }
                }
            };
            TokenStream::from(expanded)
        }
        syn::Data::Union(_) => panic!("#[derive(BtcEncode)] does not support unions"),
    }
}

fn encode_field(field: &syn::Field, index: usize) -> proc_macro2::TokenStream {
    match &field.ident {
        Some(id) => quote! { self.#id.btc_encode(&mut target)?; },
        None => {
            let index = syn::Index::from(index);
            quote! { self.#index.btc_encode(&mut target)?; }
        }
    }
}

fn encode_variant(variant: &syn::Variant, name: &syn::Ident) -> proc_macro2::TokenStream {
    let ident = &variant.ident;

    let bindings: Vec<_> = variant
        .fields
        .iter()
        .enumerate()
        .map(|(index, field)| match &field.ident {
            Some(id) => id.clone(),
            None => syn::Ident::new(&format!("field_{}", index), ident.span()),
        })
        .collect();

    let statements: Vec<_> = bindings
        .iter()
        .map(|id| quote! { #id.btc_encode(&mut target)?; })
        .collect();

    match &variant.fields {
        syn::Fields::Named(_) => quote! {
            #name::#ident { #(#bindings),* } => {
                #(#statements)*
            }
        },
        syn::Fields::Unnamed(_) => quote! {
            #name::#ident ( #(#bindings),* ) => {
                #(#statements)*
            }
        },
        syn::Fields::Unit => quote! {
            #name::#ident => {}
        },
    }
}
