use jam_types::{Ed25519Signature, Guarantee, ReadError, TimeSlot, ValidatorIndex, ValidatorSignature, WorkReport};
use crate::{BytesReader, Decode, DecodeLen, Encode, EncodeLen};

impl Encode for ValidatorSignature {

    fn encode(&self) -> Vec<u8> {

        let mut blob = Vec::with_capacity(66);

        self.validator_index.encode_to(&mut blob);
        self.signature.encode_to(&mut blob);

        blob
    }

    fn encode_to(&self, into: &mut Vec<u8>) {
        into.extend_from_slice(&self.encode());
    }
}

impl Decode for ValidatorSignature {

    fn decode(blob: &mut BytesReader) -> Result<Self, ReadError> {

        Ok(ValidatorSignature {
            validator_index: ValidatorIndex::decode(blob)?,
            signature: Ed25519Signature::decode(blob)?,
        })
    }
}

impl Encode for Guarantee {

    fn encode(&self) -> Vec<u8> {

        let mut guarantee_blob = self.report.encode();

        self.slot.encode_to(&mut guarantee_blob);
        self.signatures.encode_len().encode_to(&mut guarantee_blob);

        guarantee_blob
    }

    fn encode_to(&self, into: &mut Vec<u8>) {
        into.extend_from_slice(&self.encode());
    }
}

impl Decode for Guarantee {

    fn decode(guarantee_blob: &mut BytesReader) -> Result<Self, ReadError> {

        Ok(Guarantee {
            report: WorkReport::decode(guarantee_blob)?,
            slot: TimeSlot::decode(guarantee_blob)?,
            signatures: Vec::<ValidatorSignature>::decode_len(guarantee_blob)?,
        })
    }
}
