use jam_types::{Preimage, ReadError, ServiceId};
use crate::{BytesReader, Decode, DecodeLen, Encode, EncodeLen};

impl Encode for Preimage {

    fn encode(&self) -> Vec<u8> {

        let mut blob = Vec::with_capacity(5 + self.blob.len());

        self.requester.encode_to(&mut blob);
        self.blob.encode_len().encode_to(&mut blob);

        blob
    }

    fn encode_to(&self, into: &mut Vec<u8>) {
        into.extend_from_slice(&self.encode());
    }
}

impl Decode for Preimage {

    fn decode(blob: &mut BytesReader) -> Result<Self, ReadError> {

        Ok(Preimage {
            requester: ServiceId::decode(blob)?,
            blob: Vec::<u8>::decode_len(blob)?,
        })
    }
}
