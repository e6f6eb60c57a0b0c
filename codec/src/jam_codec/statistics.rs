use jam_types::{ActivityRecord, CoreActivityRecord, ServiceActivityRecord, Statistics};
use crate::Encode;
use crate::generic_codec::encode_unsigned;

impl Encode for ActivityRecord {

    fn encode(&self) -> Vec<u8> {

        let mut blob = Vec::with_capacity(24);

        self.blocks.encode_to(&mut blob);
        self.tickets.encode_to(&mut blob);
        self.preimages.encode_to(&mut blob);
        self.preimages_size.encode_to(&mut blob);
        self.guarantees.encode_to(&mut blob);
        self.assurances.encode_to(&mut blob);

        blob
    }

    fn encode_to(&self, into: &mut Vec<u8>) {
        into.extend_from_slice(&self.encode());
    }
}

// Core and service records use the compact natural encoding for every counter
impl Encode for CoreActivityRecord {

    fn encode(&self) -> Vec<u8> {

        [
            self.da_load as usize,
            self.popularity as usize,
            self.imports as usize,
            self.extrinsic_count as usize,
            self.extrinsic_size as usize,
            self.exports as usize,
            self.bundle_size as usize,
            self.gas_used as usize,
        ]
        .into_iter()
        .flat_map(encode_unsigned)
        .collect()
    }

    fn encode_to(&self, into: &mut Vec<u8>) {
        into.extend_from_slice(&self.encode());
    }
}

impl Encode for ServiceActivityRecord {

    fn encode(&self) -> Vec<u8> {

        [
            self.provided_count as usize,
            self.provided_size as usize,
            self.refinement_count as usize,
            self.refinement_gas_used as usize,
            self.imports as usize,
            self.extrinsic_count as usize,
            self.extrinsic_size as usize,
            self.exports as usize,
            self.accumulate_count as usize,
            self.accumulate_gas_used as usize,
            self.on_transfers_count as usize,
            self.on_transfers_gas_used as usize,
        ]
        .into_iter()
        .flat_map(encode_unsigned)
        .collect()
    }

    fn encode_to(&self, into: &mut Vec<u8>) {
        into.extend_from_slice(&self.encode());
    }
}

impl Encode for Statistics {

    fn encode(&self) -> Vec<u8> {

        let mut blob = Vec::new();

        self.curr.encode_to(&mut blob);
        self.prev.encode_to(&mut blob);
        self.cores.encode_to(&mut blob);
        self.services.encode_to(&mut blob);

        blob
    }

    fn encode_to(&self, into: &mut Vec<u8>) {
        into.extend_from_slice(&self.encode());
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use constants::ProtocolConfig;

    #[test]
    fn statistics_layout() {
        let config = ProtocolConfig::tiny();
        let mut statistics = Statistics::new(&config);
        statistics.cores[1].gas_used = 200;
        statistics.services.insert(4, ServiceActivityRecord { accumulate_count: 1, ..Default::default() });

        let blob = statistics.encode();
        // two validator records, core records (one gas counter taking two octets), one service entry
        assert_eq!(2 * 6 * 24 + (8 + 9) + (1 + 4 + 12), blob.len());
    }
}
