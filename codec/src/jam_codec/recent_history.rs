use jam_types::{BlockInfo, Mmr, RecentBlocks};
use crate::{Encode, EncodeLen};

impl Encode for Mmr {

    fn encode(&self) -> Vec<u8> {
        self.peaks.encode_len()
    }

    fn encode_to(&self, into: &mut Vec<u8>) {
        into.extend_from_slice(&self.encode());
    }
}

impl Encode for BlockInfo {

    fn encode(&self) -> Vec<u8> {

        let mut blob = Vec::with_capacity(97 + 64 * self.reported.len());

        self.header_hash.encode_to(&mut blob);
        self.beefy_root.encode_to(&mut blob);
        self.state_root.encode_to(&mut blob);
        self.reported.encode_len().encode_to(&mut blob);

        blob
    }

    fn encode_to(&self, into: &mut Vec<u8>) {
        into.extend_from_slice(&self.encode());
    }
}

impl Encode for RecentBlocks {

    fn encode(&self) -> Vec<u8> {

        let mut blob = self.history.encode();
        self.mmr.encode_to(&mut blob);

        blob
    }

    fn encode_to(&self, into: &mut Vec<u8>) {
        into.extend_from_slice(&self.encode());
    }
}
