use jam_types::{DeferredTransfer, ReadError, ReadyRecord, WorkPackageHash, WorkReport};
use crate::{BytesReader, Decode, DecodeLen, Encode, EncodeLen};

impl Encode for ReadyRecord {

    fn encode(&self) -> Vec<u8> {

        let mut blob = self.report.encode();
        self.dependencies.encode_len().encode_to(&mut blob);

        blob
    }

    fn encode_to(&self, into: &mut Vec<u8>) {
        into.extend_from_slice(&self.encode());
    }
}

impl Decode for ReadyRecord {

    fn decode(blob: &mut BytesReader) -> Result<Self, ReadError> {

        Ok(ReadyRecord {
            report: WorkReport::decode(blob)?,
            dependencies: Vec::<WorkPackageHash>::decode_len(blob)?,
        })
    }
}

// The ready queue and the accumulation history hold one variable-length list per epoch slot
pub fn encode_per_slot<T: Encode>(slots: &[Vec<T>]) -> Vec<u8> {
    let mut blob = Vec::new();
    for slot in slots {
        slot.encode_len().encode_to(&mut blob);
    }
    blob
}

impl Encode for DeferredTransfer {

    fn encode(&self) -> Vec<u8> {

        let mut blob = Vec::with_capacity(28 + self.memo.len());

        self.from.encode_to(&mut blob);
        self.to.encode_to(&mut blob);
        self.amount.encode_to(&mut blob);
        self.memo.encode_to(&mut blob);
        self.gas_limit.encode_to(&mut blob);

        blob
    }

    fn encode_to(&self, into: &mut Vec<u8>) {
        into.extend_from_slice(&self.encode());
    }
}
