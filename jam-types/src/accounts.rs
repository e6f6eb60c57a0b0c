/*
    Service accounts. Each service holds a storage dictionary, a dictionary of preimage blobs and a dictionary of
    preimage availability records keyed by (hash, length), together with its code hash, balance and gas thresholds.
    The account's minimum balance is a pure function of its storage footprint, which is kept up to date on every
    write to storage or to the availability records.
*/

use std::collections::BTreeMap;

use constants::node::{PREIMAGE_INFO_FOOTPRINT, STORAGE_ITEM_FOOTPRINT};
use constants::ProtocolConfig;
use crate::{Balance, Gas, OpaqueHash, ServiceId, TimeSlot};

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ServiceInfo {
    // Code hash
    pub code_hash: OpaqueHash,
    // Account balance
    pub balance: Balance,
    // Minimum gas required in order to execute the accumulate entry-point of the service's code
    pub acc_min_gas: Gas,
    // Minimum gas required for the on transfer entry-point
    pub xfer_min_gas: Gas,
    // Number of octets in the storage footprint
    pub bytes: u64,
    // Storage deposit offset granted to the service
    pub gratis_storage: u64,
    // Number of items in the storage footprint
    pub items: u32,
    // Timeslot at which the service was created
    pub created_at: TimeSlot,
    // Timeslot of the most recent accumulation
    pub last_acc: TimeSlot,
    // Service which created this one
    pub parent_service: ServiceId,
}

impl ServiceInfo {
    /// The minimum balance the service must hold given its footprint.
    pub fn threshold(&self, config: &ProtocolConfig) -> Balance {
        let required = config.service_min_balance
            .saturating_add(config.min_balance_per_item.saturating_mul(self.items as u64))
            .saturating_add(config.min_balance_per_octet.saturating_mul(self.bytes));
        required.saturating_sub(self.gratis_storage)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Account {
    pub info: ServiceInfo,
    // Storage dictionary
    pub storage: BTreeMap<Vec<u8>, Vec<u8>>,
    // Preimages dictionary
    pub preimages: BTreeMap<OpaqueHash, Vec<u8>>,
    // Preimage availability records
    pub lookup: BTreeMap<(OpaqueHash, u32), Vec<TimeSlot>>,
}

impl Account {

    pub fn new(info: ServiceInfo) -> Self {
        Account { info, ..Default::default() }
    }

    pub fn set_storage(&mut self, key: &[u8], value: Option<Vec<u8>>) {
        if let Some(old) = self.storage.remove(key) {
            self.info.items = self.info.items.saturating_sub(1);
            self.info.bytes = self.info.bytes.saturating_sub(STORAGE_ITEM_FOOTPRINT + key.len() as u64 + old.len() as u64);
        }
        if let Some(value) = value {
            self.info.items = self.info.items.saturating_add(1);
            self.info.bytes = self.info.bytes.saturating_add(STORAGE_ITEM_FOOTPRINT + key.len() as u64 + value.len() as u64);
            self.storage.insert(key.to_vec(), value);
        }
    }

    pub fn set_preimage_info(&mut self, hash: OpaqueHash, length: u32, value: Option<Vec<TimeSlot>>) {
        match value {
            Some(slots) => {
                if self.lookup.insert((hash, length), slots).is_none() {
                    self.info.items = self.info.items.saturating_add(2);
                    self.info.bytes = self.info.bytes.saturating_add(PREIMAGE_INFO_FOOTPRINT + length as u64);
                }
            }
            None => {
                if self.lookup.remove(&(hash, length)).is_some() {
                    self.info.items = self.info.items.saturating_sub(2);
                    self.info.bytes = self.info.bytes.saturating_sub(PREIMAGE_INFO_FOOTPRINT + length as u64);
                }
            }
        }
    }
}

/// Access to the service accounts of the state. Writes addressed to a service which does not exist are ignored.
pub trait ServiceAccounts {
    fn service_info(&self, service: ServiceId) -> Option<ServiceInfo>;
    fn set_service_info(&mut self, service: ServiceId, info: ServiceInfo);
    fn remove_service(&mut self, service: ServiceId);
    fn storage(&self, service: ServiceId, key: &[u8]) -> Option<Vec<u8>>;
    fn set_storage(&mut self, service: ServiceId, key: &[u8], value: Option<Vec<u8>>);
    fn preimage(&self, service: ServiceId, hash: &OpaqueHash) -> Option<Vec<u8>>;
    fn set_preimage(&mut self, service: ServiceId, hash: OpaqueHash, value: Option<Vec<u8>>);
    fn preimage_info(&self, service: ServiceId, hash: &OpaqueHash, length: u32) -> Option<Vec<TimeSlot>>;
    fn set_preimage_info(&mut self, service: ServiceId, hash: OpaqueHash, length: u32, value: Option<Vec<TimeSlot>>);
    fn service_ids(&self) -> Vec<ServiceId>;

    /// The preimage of `hash` as it was available to `service` at `timeslot`.
    fn historical_lookup(&self, service: ServiceId, timeslot: TimeSlot, hash: &OpaqueHash) -> Option<Vec<u8>> {
        let preimage = self.preimage(service, hash)?;
        let slots = self.preimage_info(service, hash, preimage.len() as u32)?;
        let available = match slots.as_slice() {
            [x] => *x <= timeslot,
            [x, y] => *x <= timeslot && timeslot < *y,
            [x, y, z] => (*x <= timeslot && timeslot < *y) || *z <= timeslot,
            _ => false,
        };
        available.then_some(preimage)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Services {
    pub accounts: BTreeMap<ServiceId, Account>,
}

impl Services {

    pub fn get(&self, service: ServiceId) -> Option<&Account> {
        self.accounts.get(&service)
    }

    pub fn get_mut(&mut self, service: ServiceId) -> Option<&mut Account> {
        self.accounts.get_mut(&service)
    }

    pub fn insert(&mut self, service: ServiceId, account: Account) {
        self.accounts.insert(service, account);
    }

    pub fn contains(&self, service: ServiceId) -> bool {
        self.accounts.contains_key(&service)
    }
}

impl ServiceAccounts for Services {

    fn service_info(&self, service: ServiceId) -> Option<ServiceInfo> {
        self.accounts.get(&service).map(|account| account.info.clone())
    }

    fn set_service_info(&mut self, service: ServiceId, info: ServiceInfo) {
        match self.accounts.get_mut(&service) {
            Some(account) => account.info = info,
            None => { self.accounts.insert(service, Account::new(info)); }
        }
    }

    fn remove_service(&mut self, service: ServiceId) {
        self.accounts.remove(&service);
    }

    fn storage(&self, service: ServiceId, key: &[u8]) -> Option<Vec<u8>> {
        self.accounts.get(&service)?.storage.get(key).cloned()
    }

    fn set_storage(&mut self, service: ServiceId, key: &[u8], value: Option<Vec<u8>>) {
        if let Some(account) = self.accounts.get_mut(&service) {
            account.set_storage(key, value);
        }
    }

    fn preimage(&self, service: ServiceId, hash: &OpaqueHash) -> Option<Vec<u8>> {
        self.accounts.get(&service)?.preimages.get(hash).cloned()
    }

    fn set_preimage(&mut self, service: ServiceId, hash: OpaqueHash, value: Option<Vec<u8>>) {
        if let Some(account) = self.accounts.get_mut(&service) {
            match value {
                Some(blob) => { account.preimages.insert(hash, blob); }
                None => { account.preimages.remove(&hash); }
            }
        }
    }

    fn preimage_info(&self, service: ServiceId, hash: &OpaqueHash, length: u32) -> Option<Vec<TimeSlot>> {
        self.accounts.get(&service)?.lookup.get(&(*hash, length)).cloned()
    }

    fn set_preimage_info(&mut self, service: ServiceId, hash: OpaqueHash, length: u32, value: Option<Vec<TimeSlot>>) {
        if let Some(account) = self.accounts.get_mut(&service) {
            account.set_preimage_info(hash, length, value);
        }
    }

    fn service_ids(&self) -> Vec<ServiceId> {
        self.accounts.keys().copied().collect()
    }
}
