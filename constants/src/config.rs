/*
    Every size, gas and timing parameter of the protocol which differs between chain profiles. The "tiny" profile is
    used by the test networks and test vectors, the "full" profile by production networks. Bounded sequences across
    the codebase read their limits from here at runtime rather than from compile-time constants.
*/

use std::sync::Arc;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub type ProtocolConfigRef = Arc<ProtocolConfig>;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error(transparent)]
    Json(#[from] serde_json::Error),
    #[error("invalid protocol config: {0}")]
    Invalid(&'static str),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProtocolConfig {
    // Total number of validators (V)
    pub validators_count: usize,
    // Total number of cores (C)
    pub cores_count: usize,
    // The length of an epoch in timeslots (E)
    pub epoch_length: u32,
    // The rotation period of validator-core assignments, in timeslots (R)
    pub rotation_period: u32,
    // The number of slots into an epoch at which ticket-submission ends (Y)
    pub ticket_submission_end: u32,
    // The number of ticket entries per validator (N)
    pub ticket_entries_per_validator: u8,
    // The maximum number of tickets which may be submitted in a single extrinsic (K)
    pub max_tickets_per_extrinsic: usize,
    // The size of recent history, in blocks (H)
    pub recent_history_size: usize,
    // The maximum number of items in the authorizations pool (O)
    pub max_auth_pool_items: usize,
    // The number of items in the authorizations queue (Q)
    pub auth_queue_items: usize,
    // The gas allocated to invoke a work-report's accumulation logic (G_A)
    pub work_report_accumulation_gas: u64,
    // The total gas allocated across all accumulation (G_T)
    pub total_accumulation_gas: u64,
    // The maximum age in timeslots of the lookup anchor (L)
    pub max_lookup_anchor_age: u32,
    // The period in timeslots after which reported but unavailable work may be replaced (U)
    pub preimage_replacement_period: u32,
    // The basic minimum balance which all services require (B_S)
    pub service_min_balance: u64,
    // The additional minimum balance required per item of elective service state (B_I)
    pub min_balance_per_item: u64,
    // The additional minimum balance required per octet of elective service state (B_L)
    pub min_balance_per_octet: u64,
    // The maximum amount of work items in a package (I)
    pub max_work_items: usize,
    // The maximum sum of dependency items in a work-report (J)
    pub max_dependencies: usize,
    // The size of a transfer memo in octets (W_T)
    pub transfer_memo_size: usize,
    // The maximum total size of the output blobs of a work-report, in octets (W_R)
    pub max_report_output_size: usize,
}

impl ProtocolConfig {

    pub fn tiny() -> Self {
        ProtocolConfig {
            validators_count: 6,
            cores_count: 2,
            epoch_length: 12,
            rotation_period: 4,
            ticket_submission_end: 10,
            ticket_entries_per_validator: 3,
            max_tickets_per_extrinsic: 3,
            recent_history_size: 8,
            max_auth_pool_items: 8,
            auth_queue_items: 80,
            work_report_accumulation_gas: 10_000_000,
            total_accumulation_gas: 3_500_000_000,
            max_lookup_anchor_age: 14_400,
            preimage_replacement_period: 5,
            service_min_balance: 100,
            min_balance_per_item: 10,
            min_balance_per_octet: 1,
            max_work_items: 16,
            max_dependencies: 8,
            transfer_memo_size: 128,
            max_report_output_size: 48 << 10,
        }
    }

    pub fn full() -> Self {
        ProtocolConfig {
            validators_count: 1023,
            cores_count: 341,
            epoch_length: 600,
            rotation_period: 10,
            ticket_submission_end: 500,
            ticket_entries_per_validator: 2,
            max_tickets_per_extrinsic: 16,
            ..Self::tiny()
        }
    }

    /// Loads a profile from its JSON representation and checks it is internally consistent.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: ProtocolConfig = serde_json::from_str(json)?;
        config.check()?;
        Ok(config)
    }

    pub fn check(&self) -> Result<(), ConfigError> {
        if self.validators_count == 0 {
            return Err(ConfigError::Invalid("validators_count must be positive"));
        }
        if self.cores_count == 0 {
            return Err(ConfigError::Invalid("cores_count must be positive"));
        }
        if self.epoch_length == 0 || self.rotation_period == 0 {
            return Err(ConfigError::Invalid("epoch_length and rotation_period must be positive"));
        }
        if self.ticket_submission_end > self.epoch_length {
            return Err(ConfigError::Invalid("ticket_submission_end beyond epoch_length"));
        }
        if self.auth_queue_items == 0 || self.max_auth_pool_items == 0 {
            return Err(ConfigError::Invalid("authorization pool and queue sizes must be positive"));
        }
        Ok(())
    }

    // Validator super majority
    pub fn two_thirds_plus_one(&self) -> usize {
        self.validators_count * 2 / 3 + 1
    }

    pub fn one_third(&self) -> usize {
        self.validators_count / 3
    }

    pub fn avail_bitfield_bytes(&self) -> usize {
        (self.cores_count + 7) / 8
    }

    pub fn epoch_of(&self, slot: u32) -> u32 {
        slot / self.epoch_length
    }

    pub fn phase_of(&self, slot: u32) -> u32 {
        slot % self.epoch_length
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn tiny_derived_values() {
        let config = ProtocolConfig::tiny();
        assert_eq!(5, config.two_thirds_plus_one());
        assert_eq!(2, config.one_third());
        assert_eq!(1, config.avail_bitfield_bytes());
        assert_eq!(2, config.epoch_of(25));
        assert_eq!(1, config.phase_of(25));
    }

    #[test]
    fn full_profile_overrides() {
        let config = ProtocolConfig::full();
        assert_eq!(1023, config.validators_count);
        assert_eq!(683, config.two_thirds_plus_one());
        assert_eq!(43, config.avail_bitfield_bytes());
        assert_eq!(ProtocolConfig::tiny().recent_history_size, config.recent_history_size);
    }

    #[test]
    fn json_round_trip() {
        let json = serde_json::to_string(&ProtocolConfig::tiny()).unwrap();
        assert_eq!(ProtocolConfig::tiny(), ProtocolConfig::from_json(&json).unwrap());
    }

    #[test]
    fn json_rejects_inconsistent_profile() {
        let mut config = ProtocolConfig::tiny();
        config.ticket_submission_end = 20;
        let json = serde_json::to_string(&config).unwrap();
        assert!(matches!(ProtocolConfig::from_json(&json), Err(ConfigError::Invalid(_))));
        assert!(matches!(ProtocolConfig::from_json("{"), Err(ConfigError::Json(_))));
    }
}
