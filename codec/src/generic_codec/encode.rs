use std::collections::{BTreeMap, BTreeSet};

use jam_types::{BoundedVec, SizeBound};
use crate::{Encode, EncodeLen, EncodeSize};

/// General natural number encoding: a prefix byte whose leading ones give the number of trailing octets.
pub fn encode_unsigned(x: usize) -> Vec<u8> {

    let x = x as u64;

    if x < 128 {
        return vec![x as u8];
    }

    for l in 1..8u32 {
        if x < 1u64 << (7 * (l + 1)) {
            let prefix = (256u64 - (1u64 << (8 - l)) + (x >> (8 * l))) as u8;
            let mut result = vec![prefix];
            result.extend_from_slice(&encode_integer(x as usize, l as usize));
            return result;
        }
    }

    let mut result = vec![255u8];
    result.extend_from_slice(&x.to_le_bytes());
    result
}

pub fn encode_integer(x: usize, l: usize) -> Vec<u8> {

    let mut result = Vec::with_capacity(l);
    let mut value = x as u64;

    for _ in 0..l {
        result.push((value & 0xFF) as u8);
        value >>= 8;
    }

    result
}

pub fn encode_from_bits(v: &[bool]) -> Vec<u8> {
    v.chunks(8)
        .map(|chunk| {
            chunk.iter()
                .enumerate()
                .fold(0u8, |acc, (i, &bit)| acc | ((bit as u8) << i))
        })
        .collect()
}

macro_rules! impl_encode_int {
    ($($t:ty),*) => {
        $(
            impl Encode for $t {
                fn encode(&self) -> Vec<u8> {
                    self.to_le_bytes().to_vec()
                }
                fn encode_to(&self, writer: &mut Vec<u8>) {
                    writer.extend_from_slice(&self.to_le_bytes())
                }
            }

            impl EncodeSize for $t {
                fn encode_size(&self, l: usize) -> Vec<u8> {
                    encode_integer(*self as usize, l)
                }
            }
        )*
    };
}

impl_encode_int!(u8, u16, u32, u64, usize);

impl Encode for bool {
    fn encode(&self) -> Vec<u8> {
        vec![*self as u8]
    }
    fn encode_to(&self, writer: &mut Vec<u8>) {
        writer.push(*self as u8)
    }
}

impl Encode for [u8] {
    fn encode(&self) -> Vec<u8> {
        self.to_vec()
    }
    fn encode_to(&self, writer: &mut Vec<u8>) {
        writer.extend_from_slice(self)
    }
}

impl<const N: usize> Encode for [u8; N] {
    fn encode(&self) -> Vec<u8> {
        self.to_vec()
    }
    fn encode_to(&self, writer: &mut Vec<u8>) {
        writer.extend_from_slice(self)
    }
}

impl<const N: usize> Encode for [[u8; 32]; N] {
    fn encode(&self) -> Vec<u8> {
        let mut encoded = Vec::with_capacity(32 * N);
        self.encode_to(&mut encoded);
        encoded
    }
    fn encode_to(&self, writer: &mut Vec<u8>) {
        for array in self {
            writer.extend_from_slice(array);
        }
    }
}

impl<T: Encode, U: Encode> Encode for (T, U) {
    fn encode(&self) -> Vec<u8> {
        let mut blob = Vec::new();
        self.encode_to(&mut blob);
        blob
    }
    fn encode_to(&self, into: &mut Vec<u8>) {
        self.0.encode_to(into);
        self.1.encode_to(into);
    }
}

impl<T: Encode> Encode for Vec<T> {
    fn encode(&self) -> Vec<u8> {
        let mut blob = Vec::with_capacity(self.len());
        self.encode_to(&mut blob);
        blob
    }
    fn encode_to(&self, into: &mut Vec<u8>) {
        for item in self.iter() {
            item.encode_to(into);
        }
    }
}

impl<T: Encode> Encode for Option<T> {
    fn encode(&self) -> Vec<u8> {
        let mut blob = Vec::new();
        self.encode_to(&mut blob);
        blob
    }
    fn encode_to(&self, into: &mut Vec<u8>) {
        match self {
            None => into.push(0),
            Some(data) => {
                into.push(1);
                data.encode_to(into);
            }
        }
    }
}

// Sets and maps are always length prefixed and iterate in key order
impl<T: Encode> Encode for BTreeSet<T> {
    fn encode(&self) -> Vec<u8> {
        let mut blob = encode_unsigned(self.len());
        for item in self.iter() {
            item.encode_to(&mut blob);
        }
        blob
    }
    fn encode_to(&self, into: &mut Vec<u8>) {
        into.extend_from_slice(&self.encode());
    }
}

impl<K: Encode, V: Encode> Encode for BTreeMap<K, V> {
    fn encode(&self) -> Vec<u8> {
        let mut blob = encode_unsigned(self.len());
        for (key, value) in self.iter() {
            key.encode_to(&mut blob);
            value.encode_to(&mut blob);
        }
        blob
    }
    fn encode_to(&self, into: &mut Vec<u8>) {
        into.extend_from_slice(&self.encode());
    }
}

// A sequence whose length is fixed by the profile is a plain concatenation, otherwise it carries its length
impl<T: Encode, B: SizeBound> Encode for BoundedVec<T, B> {
    fn encode(&self) -> Vec<u8> {
        let mut blob = Vec::new();
        self.encode_to(&mut blob);
        blob
    }
    fn encode_to(&self, into: &mut Vec<u8>) {
        if !self.is_fixed() {
            into.extend_from_slice(&encode_unsigned(self.len()));
        }
        for item in self.iter() {
            item.encode_to(into);
        }
    }
}

impl<T: Encode> EncodeLen for Vec<T> {
    fn encode_len(&self) -> Vec<u8> {
        self.as_slice().encode_len()
    }
}

impl<T: Encode> EncodeLen for [T] {
    fn encode_len(&self) -> Vec<u8> {
        let mut blob = encode_unsigned(self.len());
        for item in self.iter() {
            item.encode_to(&mut blob);
        }
        blob
    }
}
