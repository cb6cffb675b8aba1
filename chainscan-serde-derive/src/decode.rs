use proc_macro::TokenStream;
use quote::quote;

pub fn impl_decode(ast: &syn::DeriveInput) -> TokenStream {
    let name = &ast.ident;
    let data = match &ast.data {
        syn::Data::Struct(data) => data,
        _ => panic!("#[derive(BtcDecode)] only supports structs; write enum decoding by hand"),
    };

    let is_tuple_struct = matches!(data.fields, syn::Fields::Unnamed(_));

    let statements: Vec<_> = data
        .fields
        .iter()
        .map(|field| decode_field(field))
        .collect();

    let expanded = if is_tuple_struct {
        quote! {
            impl BtcDecode for #name {
                fn btc_decode<R: std::io::Read>(mut target: R) -> Result<Self, ParseError> {
                    Ok(#name ( #(#statements)* ))
                }
            }
        }
    } else {
        quote! {
            impl BtcDecode for #name {
                fn btc_decode<R: std::io::Read>(mut target: R) -> Result<Self, ParseError> {
                    Ok(#name { #(#statements)* })
                }
            }
        }
    };

    TokenStream::from(expanded)
}

fn decode_field(field: &syn::Field) -> proc_macro2::TokenStream {
    let ty = &field.ty;
    match &field.ident {
        Some(name) => quote! { #name: <#ty as BtcDecode>::btc_decode(&mut target)?, },
        None => quote! { <#ty as BtcDecode>::btc_decode(&mut target)?, },
    }
}
