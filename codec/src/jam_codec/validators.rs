use jam_types::{
    BandersnatchPublic, BlsPublic, Ed25519Public, EntropyPool, Metadata, ReadError, ValidatorData,
};
use crate::{BytesReader, Decode, Encode};

impl Encode for ValidatorData {

    fn encode(&self) -> Vec<u8> {

        let mut blob = Vec::with_capacity(336);

        self.bandersnatch.encode_to(&mut blob);
        self.ed25519.encode_to(&mut blob);
        self.bls.encode_to(&mut blob);
        self.metadata.encode_to(&mut blob);

        blob
    }

    fn encode_to(&self, into: &mut Vec<u8>) {
        into.extend_from_slice(&self.encode());
    }
}

impl Decode for ValidatorData {

    fn decode(blob: &mut BytesReader) -> Result<Self, ReadError> {

        Ok(ValidatorData {
            bandersnatch: BandersnatchPublic::decode(blob)?,
            ed25519: Ed25519Public::decode(blob)?,
            bls: BlsPublic::decode(blob)?,
            metadata: Metadata::decode(blob)?,
        })
    }
}

impl Encode for EntropyPool {

    fn encode(&self) -> Vec<u8> {
        self.0.encode()
    }

    fn encode_to(&self, into: &mut Vec<u8>) {
        self.0.encode_to(into);
    }
}
