use jam_types::{
    Assurance, AvailabilityAssignment, Ed25519Signature, OpaqueHash, ReadError, TimeSlot, ValidatorIndex, WorkReport,
};
use crate::{BytesReader, Decode, Encode};

impl Encode for Assurance {

    fn encode(&self) -> Vec<u8> {

        let mut blob = Vec::with_capacity(98 + self.bitfield.len());

        self.anchor.encode_to(&mut blob);
        // One bit per core, so the width is implied by the profile
        self.bitfield.encode_to(&mut blob);
        self.validator_index.encode_to(&mut blob);
        self.signature.encode_to(&mut blob);

        blob
    }

    fn encode_to(&self, into: &mut Vec<u8>) {
        into.extend_from_slice(&self.encode());
    }
}

impl Decode for Assurance {

    fn decode(reader: &mut BytesReader) -> Result<Self, ReadError> {

        let bitfield_bytes = reader.config.avail_bitfield_bytes();

        Ok(Assurance {
            anchor: OpaqueHash::decode(reader)?,
            bitfield: reader.read_bytes(bitfield_bytes)?.to_vec(),
            validator_index: ValidatorIndex::decode(reader)?,
            signature: Ed25519Signature::decode(reader)?,
        })
    }
}

impl Encode for AvailabilityAssignment {

    fn encode(&self) -> Vec<u8> {

        let mut blob = self.report.encode();
        self.timeslot.encode_to(&mut blob);

        blob
    }

    fn encode_to(&self, into: &mut Vec<u8>) {
        into.extend_from_slice(&self.encode());
    }
}

impl Decode for AvailabilityAssignment {

    fn decode(blob: &mut BytesReader) -> Result<Self, ReadError> {

        Ok(AvailabilityAssignment {
            report: WorkReport::decode(blob)?,
            timeslot: TimeSlot::decode(blob)?,
        })
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use constants::ProtocolConfig;
    use crate::decode_all;

    #[test]
    fn assurance_bitfield_width_follows_cores() {
        let config = ProtocolConfig::tiny();
        let assurance = Assurance { anchor: [1; 32], bitfield: vec![0b10], validator_index: 5, signature: [2; 64] };
        let blob = assurance.encode();
        assert_eq!(32 + 1 + 2 + 64, blob.len());
        assert_eq!(assurance, decode_all::<Assurance>(&blob, &config).unwrap());
    }
}
