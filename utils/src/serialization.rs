/*
    The serialization of state primarily involves placing all the various components of σ into a single mapping from
    31-octet sequence state-keys to octet sequences of indefinite length. The state-key is constructed from a hash
    component and a chapter component, equivalent to either the index of a state component or, in the case of the
    inner dictionaries of δ, a service index.
*/

use std::collections::BTreeMap;

use codec::jam_codec::accumulate::encode_per_slot;
use codec::{Encode, EncodeLen};
use constants::node::{
    ACCUMULATION_HISTORY, AUTH_POOLS, AUTH_QUEUE, AVAILABILITY, CURR_VALIDATORS, DISPUTES, ENTROPY, PREV_VALIDATORS, PRIVILEGES,
    READY_QUEUE, RECENT_HISTORY, SAFROLE, SERVICE_ACCOUNT, STATISTICS, TIME, VALIDATOR_QUEUE,
};
use jam_types::{OpaqueHash, ServiceId, State, StateKey};
use crate::common::blake2;
use crate::trie::merkle_state;

pub type SerializedState = BTreeMap<StateKey, Vec<u8>>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StateKeyType {
    // A top level state component
    Component(u8),
    // A per-service record of a component
    Service(u8, ServiceId),
    // An entry of the inner dictionaries of a service
    Account(ServiceId, Vec<u8>),
}

impl StateKeyType {

    // We define the state-key constructor functions C as:
    pub fn construct(&self) -> StateKey {

        let mut key = StateKey::default();

        match self {
            StateKeyType::Component(index) => {
                key[0] = *index;
            }
            StateKeyType::Service(index, service) => {
                key[0] = *index;
                for (i, byte) in service.to_le_bytes().iter().enumerate() {
                    key[1 + 2 * i] = *byte;
                }
            }
            StateKeyType::Account(service, suffix) => {
                let hash = blake2(suffix);
                for (i, byte) in service.to_le_bytes().iter().enumerate() {
                    key[2 * i] = *byte;
                    key[2 * i + 1] = hash[i];
                }
                key[8..].copy_from_slice(&hash[4..27]);
            }
        }

        key
    }
}

pub fn storage_key(service: ServiceId, key: &[u8]) -> StateKey {
    StateKeyType::Account(service, [&u32::MAX.to_le_bytes()[..], key].concat()).construct()
}

pub fn preimage_key(service: ServiceId, hash: &OpaqueHash) -> StateKey {
    StateKeyType::Account(service, [&(u32::MAX - 1).to_le_bytes()[..], &hash[..]].concat()).construct()
}

pub fn lookup_key(service: ServiceId, hash: &OpaqueHash, length: u32) -> StateKey {
    StateKeyType::Account(service, [&length.to_le_bytes()[..], &hash[..]].concat()).construct()
}

// The state serialization is then defined as the dictionary built from the amalgamation of each of the components.
// Cryptographic hashing ensures that there will be no duplicate state-keys given that there are no duplicate inputs to C.
pub fn serialize(state: &State) -> SerializedState {

    let mut map = SerializedState::new();

    map.insert(StateKeyType::Component(AUTH_POOLS).construct(), state.auth_pools.encode());
    map.insert(StateKeyType::Component(AUTH_QUEUE).construct(), state.auth_queues.encode());
    map.insert(StateKeyType::Component(RECENT_HISTORY).construct(), state.recent_history.encode());
    map.insert(StateKeyType::Component(SAFROLE).construct(), state.safrole.encode());
    map.insert(StateKeyType::Component(DISPUTES).construct(), state.disputes.encode());
    map.insert(StateKeyType::Component(ENTROPY).construct(), state.entropy.encode());
    map.insert(StateKeyType::Component(VALIDATOR_QUEUE).construct(), state.validator_queue.encode());
    map.insert(StateKeyType::Component(CURR_VALIDATORS).construct(), state.curr_validators.encode());
    map.insert(StateKeyType::Component(PREV_VALIDATORS).construct(), state.prev_validators.encode());
    map.insert(StateKeyType::Component(AVAILABILITY).construct(), state.availability.encode());
    map.insert(StateKeyType::Component(TIME).construct(), state.time.encode());
    map.insert(StateKeyType::Component(PRIVILEGES).construct(), state.privileges.encode());
    map.insert(StateKeyType::Component(STATISTICS).construct(), state.statistics.encode());
    map.insert(StateKeyType::Component(READY_QUEUE).construct(), encode_per_slot(&state.ready_queue));
    map.insert(StateKeyType::Component(ACCUMULATION_HISTORY).construct(), encode_per_slot(&state.accumulation_history));

    for (service, account) in state.services.accounts.iter() {

        map.insert(StateKeyType::Service(SERVICE_ACCOUNT, *service).construct(), account.info.encode());

        for (key, value) in account.storage.iter() {
            map.insert(storage_key(*service, key), value.clone());
        }

        for (hash, blob) in account.preimages.iter() {
            map.insert(preimage_key(*service, hash), blob.clone());
        }

        for ((hash, length), timeslots) in account.lookup.iter() {
            map.insert(lookup_key(*service, hash, *length), timeslots.encode_len());
        }
    }

    map
}

/// Merkle root of the serialized state.
pub fn state_root(state: &State) -> OpaqueHash {
    let root = merkle_state(&serialize(state));
    log::debug!("State root: 0x{}", crate::print_hash!(root));
    root
}

#[cfg(test)]
mod test {
    use super::*;
    use constants::ProtocolConfig;
    use jam_types::{Account, ServiceInfo};

    #[test]
    fn component_and_service_keys() {
        let mut expected = [0u8; 31];
        expected[0] = 5;
        assert_eq!(expected, StateKeyType::Component(5).construct());

        let key = StateKeyType::Service(255, 0xAABBCCDD).construct();
        assert_eq!([255, 0xDD, 0, 0xCC, 0, 0xBB, 0, 0xAA, 0], key[..9]);
        assert!(key[9..].iter().all(|byte| *byte == 0));
    }

    #[test]
    fn account_keys_interleave_service_and_hash() {
        let suffix = [&u32::MAX.to_le_bytes()[..], b"key"].concat();
        let hash = blake2(&suffix);
        let key = storage_key(0x04030201, b"key");
        assert_eq!([1, hash[0], 2, hash[1], 3, hash[2], 4, hash[3]], key[..8]);
        assert_eq!(hash[4..27], key[8..]);
        assert_ne!(key, preimage_key(0x04030201, &[0; 32]));
        assert_ne!(lookup_key(1, &[0; 32], 1), lookup_key(1, &[0; 32], 2));
    }

    #[test]
    fn serialized_state_has_every_component() {
        let config = ProtocolConfig::tiny();
        let mut state = State::new(&config);
        assert_eq!(15, serialize(&state).len());

        let mut account = Account::new(ServiceInfo { balance: 1_000, ..Default::default() });
        account.set_storage(b"k", Some(vec![1]));
        account.preimages.insert([1; 32], vec![1, 2]);
        account.set_preimage_info([1; 32], 2, Some(vec![3]));
        state.services.insert(9, account);

        let map = serialize(&state);
        assert_eq!(15 + 4, map.len());
        assert_eq!(Some(&vec![1, 3, 0, 0, 0]), map.get(&lookup_key(9, &[1; 32], 2)));
        assert_eq!(Some(&vec![1]), map.get(&storage_key(9, b"k")));
    }

    #[test]
    fn state_root_is_deterministic() {
        let config = ProtocolConfig::tiny();
        let mut state = State::new(&config);
        let copy = state.clone();
        assert_eq!(state_root(&state), state_root(&copy));
        state.time = 1;
        assert_ne!(state_root(&state), state_root(&copy));
    }
}
