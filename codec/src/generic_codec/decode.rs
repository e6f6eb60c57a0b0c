use std::collections::{BTreeMap, BTreeSet};

use jam_types::ReadError;
use crate::{BytesReader, Decode, DecodeLen, DecodeSize};

pub fn decode_unsigned(data: &mut BytesReader) -> Result<usize, ReadError> {

    let first_byte = data.read_byte()?;
    let l = first_byte.leading_ones() as usize;

    if l == 0 {
        return Ok(first_byte as usize);
    }

    let result = decode_integer(data, l)?;

    if l == 8 {
        return Ok(result);
    }

    let mask = (1u8 << (7 - l)) - 1;

    Ok(result | ((first_byte & mask) as usize) << (8 * l))
}

pub fn decode_integer(data: &mut BytesReader, l: usize) -> Result<usize, ReadError> {
    if l > std::mem::size_of::<u64>() {
        return Err(ReadError::InvalidData);
    }
    let mut array = [0u8; 8];
    let bytes = data.read_bytes(l)?;
    array[..l].copy_from_slice(bytes);
    usize::try_from(u64::from_le_bytes(array)).map_err(|_| ReadError::ConversionError)
}

pub fn decode_to_bits(bytes: &mut BytesReader, n: usize) -> Result<Vec<bool>, ReadError> {
    let mut bools = Vec::with_capacity(n * 8);

    for _ in 0..n {
        let byte = bytes.read_byte()?;
        for i in 0..8 {
            bools.push(byte & (1 << i) != 0);
        }
    }

    Ok(bools)
}

macro_rules! impl_decode_int {
    ($($t:ty),*) => {
        $(
            impl Decode for $t {
                fn decode(reader: &mut BytesReader) -> Result<Self, ReadError> {
                    let bytes = reader.read_bytes(std::mem::size_of::<$t>())?;
                    let mut array = [0u8; std::mem::size_of::<$t>()];
                    array.copy_from_slice(bytes);
                    Ok(<$t>::from_le_bytes(array))
                }
            }

            impl DecodeSize for $t {
                fn decode_size(reader: &mut BytesReader, l: usize) -> Result<usize, ReadError> {
                    decode_integer(reader, l)
                }
            }
        )*
    };
}

impl_decode_int!(u8, u16, u32, u64);

impl Decode for bool {
    fn decode(reader: &mut BytesReader) -> Result<Self, ReadError> {
        match reader.read_byte()? {
            0 => Ok(false),
            1 => Ok(true),
            _ => Err(ReadError::InvalidData),
        }
    }
}

impl<const N: usize> Decode for [u8; N] {
    fn decode(reader: &mut BytesReader) -> Result<Self, ReadError> {
        let bytes = reader.read_bytes(N)?;
        let mut array = [0u8; N];
        array.copy_from_slice(bytes);
        Ok(array)
    }
}

impl<T: Decode, U: Decode> Decode for (T, U) {
    fn decode(reader: &mut BytesReader) -> Result<Self, ReadError> {
        Ok((T::decode(reader)?, U::decode(reader)?))
    }
}

impl<T: Decode> Decode for Option<T> {
    fn decode(reader: &mut BytesReader) -> Result<Self, ReadError> {
        match reader.read_byte()? {
            0 => Ok(None),
            1 => Ok(Some(T::decode(reader)?)),
            _ => Err(ReadError::InvalidData),
        }
    }
}

impl<T: Decode> DecodeLen for Vec<T> {
    fn decode_len(reader: &mut BytesReader) -> Result<Self, ReadError> {
        let len = decode_unsigned(reader)?;
        // Every item takes at least one octet
        if len > reader.remaining() {
            return Err(ReadError::NotEnoughData);
        }
        decode_n(reader, len)
    }
}

/// Decodes `n` consecutive items with no length prefix.
pub fn decode_n<T: Decode>(reader: &mut BytesReader, n: usize) -> Result<Vec<T>, ReadError> {
    let mut result = Vec::with_capacity(n.min(reader.remaining()));
    for _ in 0..n {
        result.push(T::decode(reader)?);
    }
    Ok(result)
}

impl<T: Decode + Ord> Decode for BTreeSet<T> {
    fn decode(reader: &mut BytesReader) -> Result<Self, ReadError> {
        let items = Vec::<T>::decode_len(reader)?;
        let len = items.len();
        let set: BTreeSet<T> = items.into_iter().collect();
        if set.len() != len {
            return Err(ReadError::InvalidData);
        }
        Ok(set)
    }
}

impl<K: Decode + Ord, V: Decode> Decode for BTreeMap<K, V> {
    fn decode(reader: &mut BytesReader) -> Result<Self, ReadError> {
        let items = Vec::<(K, V)>::decode_len(reader)?;
        let len = items.len();
        let map: BTreeMap<K, V> = items.into_iter().collect();
        if map.len() != len {
            return Err(ReadError::InvalidData);
        }
        Ok(map)
    }
}
