use std::collections::BTreeSet;

use jam_types::{
    Culprit, DisputesExtrinsic, DisputesRecords, Ed25519Public, Ed25519Signature, Fault, Judgement, ReadError, ValidatorIndex,
    Verdict, WorkReportHash,
};
use crate::{BytesReader, Decode, DecodeLen, Encode, EncodeLen};
use crate::generic_codec::decode_n;

impl Encode for Judgement {

    fn encode(&self) -> Vec<u8> {

        let mut judgement_blob: Vec<u8> = Vec::with_capacity(67);

        self.vote.encode_to(&mut judgement_blob);
        self.index.encode_to(&mut judgement_blob);
        self.signature.encode_to(&mut judgement_blob);

        judgement_blob
    }

    fn encode_to(&self, into: &mut Vec<u8>) {
        into.extend_from_slice(&self.encode());
    }
}

impl Decode for Judgement {

    fn decode(judgement_blob: &mut BytesReader) -> Result<Self, ReadError> {

        Ok(Judgement {
            vote: bool::decode(judgement_blob)?,
            index: ValidatorIndex::decode(judgement_blob)?,
            signature: Ed25519Signature::decode(judgement_blob)?,
        })
    }
}

// A verdict holds exactly a super majority of judgements, so they go without a length prefix
impl Encode for Verdict {

    fn encode(&self) -> Vec<u8> {

        let mut verdict_blob: Vec<u8> = Vec::with_capacity(36 + 67 * self.votes.len());

        self.target.encode_to(&mut verdict_blob);
        self.age.encode_to(&mut verdict_blob);
        self.votes.encode_to(&mut verdict_blob);

        verdict_blob
    }

    fn encode_to(&self, into: &mut Vec<u8>) {
        into.extend_from_slice(&self.encode());
    }
}

impl Decode for Verdict {

    fn decode(verdict_blob: &mut BytesReader) -> Result<Self, ReadError> {

        let super_majority = verdict_blob.config.two_thirds_plus_one();

        Ok(Verdict {
            target: WorkReportHash::decode(verdict_blob)?,
            age: u32::decode(verdict_blob)?,
            votes: decode_n::<Judgement>(verdict_blob, super_majority)?,
        })
    }
}

impl Encode for Culprit {

    fn encode(&self) -> Vec<u8> {

        let mut culprit_blob: Vec<u8> = Vec::with_capacity(128);

        self.target.encode_to(&mut culprit_blob);
        self.key.encode_to(&mut culprit_blob);
        self.signature.encode_to(&mut culprit_blob);

        culprit_blob
    }

    fn encode_to(&self, into: &mut Vec<u8>) {
        into.extend_from_slice(&self.encode());
    }
}

impl Decode for Culprit {

    fn decode(culprit_blob: &mut BytesReader) -> Result<Self, ReadError> {

        Ok(Culprit {
            target: WorkReportHash::decode(culprit_blob)?,
            key: Ed25519Public::decode(culprit_blob)?,
            signature: Ed25519Signature::decode(culprit_blob)?,
        })
    }
}

impl Encode for Fault {

    fn encode(&self) -> Vec<u8> {

        let mut fault_blob: Vec<u8> = Vec::with_capacity(129);

        self.target.encode_to(&mut fault_blob);
        self.vote.encode_to(&mut fault_blob);
        self.key.encode_to(&mut fault_blob);
        self.signature.encode_to(&mut fault_blob);

        fault_blob
    }

    fn encode_to(&self, into: &mut Vec<u8>) {
        into.extend_from_slice(&self.encode());
    }
}

impl Decode for Fault {

    fn decode(fault_blob: &mut BytesReader) -> Result<Self, ReadError> {

        Ok(Fault {
            target: WorkReportHash::decode(fault_blob)?,
            vote: bool::decode(fault_blob)?,
            key: Ed25519Public::decode(fault_blob)?,
            signature: Ed25519Signature::decode(fault_blob)?,
        })
    }
}

impl Encode for DisputesExtrinsic {

    fn encode(&self) -> Vec<u8> {

        let mut dispute_blob: Vec<u8> = Vec::new();

        self.verdicts.encode_len().encode_to(&mut dispute_blob);
        self.culprits.encode_len().encode_to(&mut dispute_blob);
        self.faults.encode_len().encode_to(&mut dispute_blob);

        dispute_blob
    }

    fn encode_to(&self, into: &mut Vec<u8>) {
        into.extend_from_slice(&self.encode());
    }
}

impl Decode for DisputesExtrinsic {

    fn decode(dispute_blob: &mut BytesReader) -> Result<Self, ReadError> {

        Ok(DisputesExtrinsic {
            verdicts: Vec::<Verdict>::decode_len(dispute_blob)?,
            culprits: Vec::<Culprit>::decode_len(dispute_blob)?,
            faults: Vec::<Fault>::decode_len(dispute_blob)?,
        })
    }
}

impl Encode for DisputesRecords {

    fn encode(&self) -> Vec<u8> {

        let mut blob = Vec::new();

        self.good.encode_to(&mut blob);
        self.bad.encode_to(&mut blob);
        self.wonky.encode_to(&mut blob);
        self.offenders.encode_to(&mut blob);

        blob
    }

    fn encode_to(&self, into: &mut Vec<u8>) {
        into.extend_from_slice(&self.encode());
    }
}

impl Decode for DisputesRecords {

    fn decode(blob: &mut BytesReader) -> Result<Self, ReadError> {

        Ok(DisputesRecords {
            good: BTreeSet::<WorkReportHash>::decode(blob)?,
            bad: BTreeSet::<WorkReportHash>::decode(blob)?,
            wonky: BTreeSet::<WorkReportHash>::decode(blob)?,
            offenders: BTreeSet::<Ed25519Public>::decode(blob)?,
        })
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use constants::ProtocolConfig;
    use crate::decode_all;

    #[test]
    fn verdict_votes_have_no_prefix() {
        let config = ProtocolConfig::tiny();
        let verdict = Verdict {
            target: [1; 32],
            age: 3,
            votes: (0..5).map(|index| Judgement { vote: index % 2 == 0, index, signature: [index as u8; 64] }).collect(),
        };
        let blob = verdict.encode();
        assert_eq!(32 + 4 + 5 * 67, blob.len());
        assert_eq!(verdict, decode_all::<Verdict>(&blob, &config).unwrap());
    }

    #[test]
    fn records_are_sorted_sets() {
        let config = ProtocolConfig::tiny();
        let mut records = DisputesRecords::default();
        records.bad.insert([9; 32]);
        records.bad.insert([1; 32]);
        let blob = records.encode();
        assert_eq!(0, blob[0]);
        assert_eq!(2, blob[1]);
        assert_eq!([1; 32], blob[2..34]);
        assert_eq!(records, decode_all::<DisputesRecords>(&blob, &config).unwrap());
    }
}
