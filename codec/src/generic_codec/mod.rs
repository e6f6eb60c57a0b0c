mod decode;
mod encode;

pub use decode::{decode_integer, decode_n, decode_to_bits, decode_unsigned};
pub use encode::{encode_from_bits, encode_integer, encode_unsigned};
