// The epoch and winning-tickets markers are information placed in the header in order to minimize data transfer
// necessary to determine the validator keys associated with any given epoch. They are particularly useful to nodes
// which do not synchronize the entire state for any given block since they facilitate the secure tracking of changes
// to the validator key sets using only the chain of headers.

use jam_types::{
    BandersnatchPublic, BandersnatchVrfSignature, Ed25519Public, Entropy, EpochMark, Header, OpaqueHash, ReadError,
    TicketBody, TimeSlot, UnsignedHeader, ValidatorIndex,
};
use crate::{BytesReader, Decode, DecodeLen, Encode, EncodeLen};
use crate::generic_codec::decode_n;

// The epoch marker carries both the entropy and the keys of the validators beginning in the next epoch, one pair per
// validator, with no length prefix.
impl Encode for EpochMark {

    fn encode(&self) -> Vec<u8> {

        let mut blob: Vec<u8> = Vec::with_capacity(64 + 64 * self.validators.len());

        self.entropy.encode_to(&mut blob);
        self.tickets_entropy.encode_to(&mut blob);
        self.validators.encode_to(&mut blob);

        blob
    }

    fn encode_to(&self, into: &mut Vec<u8>) {
        into.extend_from_slice(&self.encode());
    }
}

impl Decode for EpochMark {

    fn decode(blob: &mut BytesReader) -> Result<Self, ReadError> {

        let validators_count = blob.config.validators_count;

        Ok(EpochMark {
            entropy: Entropy::decode(blob)?,
            tickets_entropy: Entropy::decode(blob)?,
            validators: decode_n::<(BandersnatchPublic, Ed25519Public)>(blob, validators_count)?,
        })
    }
}

impl Encode for TicketBody {

    fn encode(&self) -> Vec<u8> {

        let mut body_blob = Vec::with_capacity(33);

        self.id.encode_to(&mut body_blob);
        self.attempt.encode_to(&mut body_blob);

        body_blob
    }

    fn encode_to(&self, into: &mut Vec<u8>) {
        into.extend_from_slice(&self.encode());
    }
}

impl Decode for TicketBody {

    fn decode(body_blob: &mut BytesReader) -> Result<Self, ReadError> {

        Ok(TicketBody {
            id: OpaqueHash::decode(body_blob)?,
            attempt: u8::decode(body_blob)?,
        })
    }
}

impl Encode for UnsignedHeader {

    fn encode(&self) -> Vec<u8> {

        let mut header_blob: Vec<u8> = Vec::with_capacity(256);

        self.parent.encode_to(&mut header_blob);
        self.parent_state_root.encode_to(&mut header_blob);
        self.extrinsic_hash.encode_to(&mut header_blob);
        self.slot.encode_to(&mut header_blob);
        self.epoch_mark.encode_to(&mut header_blob);
        // The winning tickets are a full epoch's worth, so no length prefix either
        self.tickets_mark.encode_to(&mut header_blob);
        self.author_index.encode_to(&mut header_blob);
        self.entropy_source.encode_to(&mut header_blob);
        self.offenders_mark.encode_len().encode_to(&mut header_blob);

        header_blob
    }

    fn encode_to(&self, into: &mut Vec<u8>) {
        into.extend_from_slice(&self.encode());
    }
}

impl Decode for UnsignedHeader {

    fn decode(header_blob: &mut BytesReader) -> Result<Self, ReadError> {

        let epoch_length = header_blob.config.epoch_length as usize;

        Ok(UnsignedHeader {
            parent: OpaqueHash::decode(header_blob)?,
            parent_state_root: OpaqueHash::decode(header_blob)?,
            extrinsic_hash: OpaqueHash::decode(header_blob)?,
            slot: TimeSlot::decode(header_blob)?,
            epoch_mark: Option::<EpochMark>::decode(header_blob)?,
            tickets_mark: match header_blob.read_byte()? {
                0 => None,
                1 => Some(decode_n::<TicketBody>(header_blob, epoch_length)?),
                _ => return Err(ReadError::InvalidData),
            },
            author_index: ValidatorIndex::decode(header_blob)?,
            entropy_source: BandersnatchVrfSignature::decode(header_blob)?,
            offenders_mark: Vec::<Ed25519Public>::decode_len(header_blob)?,
        })
    }
}

impl Encode for Header {

    fn encode(&self) -> Vec<u8> {

        let mut header_blob = self.unsigned.encode();
        self.seal.encode_to(&mut header_blob);

        header_blob
    }

    fn encode_to(&self, into: &mut Vec<u8>) {
        into.extend_from_slice(&self.encode());
    }
}

impl Decode for Header {

    fn decode(header_blob: &mut BytesReader) -> Result<Self, ReadError> {

        Ok(Header {
            unsigned: UnsignedHeader::decode(header_blob)?,
            seal: BandersnatchVrfSignature::decode(header_blob)?,
        })
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use constants::ProtocolConfig;
    use crate::decode_all;

    #[test]
    fn header_with_markers_round_trips() {
        let config = ProtocolConfig::tiny();
        let mut header = Header::default();
        header.unsigned.slot = 42;
        header.unsigned.author_index = 3;
        header.unsigned.epoch_mark = Some(EpochMark {
            entropy: [1; 32],
            tickets_entropy: [2; 32],
            validators: vec![([3; 32], [4; 32]); 6],
        });
        header.unsigned.tickets_mark = Some((0..12).map(|i| TicketBody { id: [i; 32], attempt: i % 3 }).collect());
        header.unsigned.offenders_mark = vec![[5; 32]];
        header.seal = [6; 96];

        let blob = header.encode();
        // 3 hashes, slot, epoch mark, tickets mark, author, entropy source, offenders, seal
        assert_eq!(96 + 4 + (1 + 64 + 6 * 64) + (1 + 12 * 33) + 2 + 96 + (1 + 32) + 96, blob.len());
        assert_eq!(header, decode_all::<Header>(&blob, &config).unwrap());
    }

    #[test]
    fn unsigned_header_is_a_prefix_of_the_header() {
        let header = Header { seal: [9; 96], ..Default::default() };
        let unsigned = header.unsigned.encode();
        assert_eq!(&unsigned[..], &header.encode()[..unsigned.len()]);
    }
}
