extern crate proc_macro;
use proc_macro::TokenStream;

mod decode;
mod encode;

/// Derives the `BtcEncode` trait by serializing each field (or enum
/// variant's fields) in declaration order.
#[proc_macro_derive(BtcSerialize)]
pub fn derive_encode(input: TokenStream) -> TokenStream {
    let ast = syn::parse(input).expect("invalid input to #[derive(BtcSerialize)]");
    encode::impl_encode(&ast)
}

/// Derives the `BtcDecode` trait by deserializing each field in declaration
/// order. Only supported for structs; `chainscan-chain`'s enum types
/// (`TxInput`) are hand-written because the wire format does not carry an
/// explicit variant tag (coinbase-ness is detected after parsing).
#[proc_macro_derive(BtcDeserialize)]
pub fn derive_decode(input: TokenStream) -> TokenStream {
    let ast = syn::parse(input).expect("invalid input to #[derive(BtcDeserialize)]");
    decode::impl_decode(&ast)
}
