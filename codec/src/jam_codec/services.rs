use std::collections::BTreeMap;

use constants::node::SERVICE_INFO_VERSION;
use jam_types::{Balance, Gas, OpaqueHash, Privileges, ReadError, ServiceId, ServiceInfo, TimeSlot};
use crate::{BytesReader, Decode, Encode};

impl Encode for ServiceInfo {

    fn encode(&self) -> Vec<u8> {

        let mut blob = Vec::with_capacity(89);

        SERVICE_INFO_VERSION.encode_to(&mut blob);
        self.code_hash.encode_to(&mut blob);
        self.balance.encode_to(&mut blob);
        self.acc_min_gas.encode_to(&mut blob);
        self.xfer_min_gas.encode_to(&mut blob);
        self.bytes.encode_to(&mut blob);
        self.gratis_storage.encode_to(&mut blob);
        self.items.encode_to(&mut blob);
        self.created_at.encode_to(&mut blob);
        self.last_acc.encode_to(&mut blob);
        self.parent_service.encode_to(&mut blob);

        blob
    }

    fn encode_to(&self, into: &mut Vec<u8>) {
        into.extend_from_slice(&self.encode());
    }
}

impl Decode for ServiceInfo {

    fn decode(blob: &mut BytesReader) -> Result<Self, ReadError> {

        if blob.read_byte()? != SERVICE_INFO_VERSION {
            return Err(ReadError::InvalidData);
        }

        Ok(ServiceInfo {
            code_hash: OpaqueHash::decode(blob)?,
            balance: Balance::decode(blob)?,
            acc_min_gas: Gas::decode(blob)?,
            xfer_min_gas: Gas::decode(blob)?,
            bytes: u64::decode(blob)?,
            gratis_storage: u64::decode(blob)?,
            items: u32::decode(blob)?,
            created_at: TimeSlot::decode(blob)?,
            last_acc: TimeSlot::decode(blob)?,
            parent_service: ServiceId::decode(blob)?,
        })
    }
}

impl Encode for Privileges {

    fn encode(&self) -> Vec<u8> {

        let mut blob = Vec::with_capacity(13 + 12 * self.always_acc.len());

        self.empower.encode_to(&mut blob);
        self.assign.encode_to(&mut blob);
        self.designate.encode_to(&mut blob);
        self.always_acc.encode_to(&mut blob);

        blob
    }

    fn encode_to(&self, into: &mut Vec<u8>) {
        into.extend_from_slice(&self.encode());
    }
}

impl Decode for Privileges {

    fn decode(blob: &mut BytesReader) -> Result<Self, ReadError> {

        Ok(Privileges {
            empower: ServiceId::decode(blob)?,
            assign: ServiceId::decode(blob)?,
            designate: ServiceId::decode(blob)?,
            always_acc: BTreeMap::<ServiceId, Gas>::decode(blob)?,
        })
    }
}
