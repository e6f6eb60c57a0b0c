use jam_types::{Assurance, Block, DisputesExtrinsic, Extrinsic, Guarantee, Header, Preimage, ReadError, Ticket};
use crate::{BytesReader, Decode, DecodeLen, Encode, EncodeLen};

impl Encode for Block {

    fn encode(&self) -> Vec<u8> {

        let mut block_blob: Vec<u8> = Vec::new();

        self.header.encode_to(&mut block_blob);
        self.extrinsic.encode_to(&mut block_blob);

        block_blob
    }

    fn encode_to(&self, into: &mut Vec<u8>) {
        into.extend_from_slice(&self.encode());
    }
}

impl Decode for Block {

    fn decode(block_blob: &mut BytesReader) -> Result<Self, ReadError> {

        let header = Header::decode(block_blob)?;
        let extrinsic = Extrinsic::decode(block_blob)?;

        Ok(Block { header, extrinsic })
    }
}

impl Encode for Extrinsic {

    fn encode(&self) -> Vec<u8> {

        let mut extrinsic_blob: Vec<u8> = Vec::new();

        self.tickets.encode_len().encode_to(&mut extrinsic_blob);
        self.preimages.encode_len().encode_to(&mut extrinsic_blob);
        self.guarantees.encode_len().encode_to(&mut extrinsic_blob);
        self.assurances.encode_len().encode_to(&mut extrinsic_blob);
        self.disputes.encode_to(&mut extrinsic_blob);

        extrinsic_blob
    }

    fn encode_to(&self, into: &mut Vec<u8>) {
        into.extend_from_slice(&self.encode());
    }
}

impl Decode for Extrinsic {

    fn decode(extrinsic_blob: &mut BytesReader) -> Result<Self, ReadError> {

        Ok(Extrinsic {
            tickets: Vec::<Ticket>::decode_len(extrinsic_blob)?,
            preimages: Vec::<Preimage>::decode_len(extrinsic_blob)?,
            guarantees: Vec::<Guarantee>::decode_len(extrinsic_blob)?,
            assurances: Vec::<Assurance>::decode_len(extrinsic_blob)?,
            disputes: DisputesExtrinsic::decode(extrinsic_blob)?,
        })
    }
}
