/*
    JAM serialization. Integers are little endian, either at a fixed width or with the general variable-length
    natural encoding; sequences are either a plain concatenation (when their length is implied by the protocol
    profile) or prefixed with their length. Optional values carry a 0/1 discriminator byte.
*/

use constants::ProtocolConfig;
use jam_types::ReadError;

pub mod generic_codec;
pub mod jam_codec;

pub trait Encode {
    fn encode(&self) -> Vec<u8>;
    fn encode_to(&self, into: &mut Vec<u8>);
}

pub trait EncodeSize {
    fn encode_size(&self, l: usize) -> Vec<u8>;
}

pub trait EncodeLen {
    fn encode_len(&self) -> Vec<u8>;
}

pub trait Decode: Sized {
    fn decode(reader: &mut BytesReader) -> Result<Self, ReadError>;
}

pub trait DecodeSize: Sized {
    fn decode_size(reader: &mut BytesReader, l: usize) -> Result<usize, ReadError>;
}

pub trait DecodeLen: Sized {
    fn decode_len(reader: &mut BytesReader) -> Result<Self, ReadError>;
}

/// Cursor over an encoded blob. It carries the protocol profile because several sequences (validator keys in the
/// epoch marker, the winning tickets, verdict judgements) are encoded without a length prefix.
pub struct BytesReader<'a> {
    pub position: usize,
    pub data: &'a [u8],
    pub config: &'a ProtocolConfig,
}

impl<'a> BytesReader<'a> {

    pub fn new(data: &'a [u8], config: &'a ProtocolConfig) -> Self {
        BytesReader { data, position: 0, config }
    }

    pub fn read_bytes(&mut self, length: usize) -> Result<&'a [u8], ReadError> {

        let end = self.position.checked_add(length).ok_or(ReadError::NotEnoughData)?;
        if end > self.data.len() {
            log::trace!("Not enough data at position {}, length {}", self.position, length);
            return Err(ReadError::NotEnoughData);
        }

        let bytes = &self.data[self.position..end];
        self.position = end;

        Ok(bytes)
    }

    pub fn read_byte(&mut self) -> Result<u8, ReadError> {
        Ok(self.read_bytes(1)?[0])
    }

    pub fn get_position(&self) -> usize {
        self.position
    }

    pub fn remaining(&self) -> usize {
        self.data.len() - self.position
    }
}

/// Decodes a complete value, rejecting trailing bytes.
pub fn decode_all<T: Decode>(data: &[u8], config: &ProtocolConfig) -> Result<T, ReadError> {
    let mut reader = BytesReader::new(data, config);
    let value = T::decode(&mut reader)?;
    if reader.remaining() != 0 {
        return Err(ReadError::InvalidData);
    }
    Ok(value)
}
