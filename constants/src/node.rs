/*
    Protocol constants which do not depend on the chain profile. Everything that changes between the tiny and
    full profiles lives in `ProtocolConfig` instead.
*/

// The size of the on-chain entropy pool
pub const ENTROPY_POOL_SIZE: usize = 4;
// The number of erasure-coded pieces in a segment.
pub const SEGMENT_PIECES: usize = 6;
// The basic size of erasure-coded pieces in octets.
pub const PIECE_SIZE: usize = 684;
// The size of a segment in octets.
pub const SEGMENT_SIZE: usize = PIECE_SIZE * SEGMENT_PIECES;
// The maximum number of timeslots kept in a preimage availability record
pub const MAX_PREIMAGE_INFO_SLOTS: usize = 3;
// Octets charged per preimage info record in the storage footprint
pub const PREIMAGE_INFO_FOOTPRINT: u64 = 81;
// Octets charged per storage item in the storage footprint
pub const STORAGE_ITEM_FOOTPRINT: u64 = 34;
// Version byte prefixed to the serialized service info
pub const SERVICE_INFO_VERSION: u8 = 0;

// Signing contexts
pub const XT_TICKET_SEAL: &[u8] = b"jam_ticket_seal";
pub const XT_FALLBACK_SEAL: &[u8] = b"jam_fallback_seal";
pub const XT_ENTROPY: &[u8] = b"jam_entropy";
pub const XT_VALID: &[u8] = b"jam_valid";
pub const XT_INVALID: &[u8] = b"jam_invalid";
pub const XT_GUARANTEE: &[u8] = b"jam_guarantee";
pub const XT_AVAILABLE: &[u8] = b"jam_available";
// Prefix used when folding MMR peaks into a super-peak
pub const MMR_PEAK: &[u8] = b"peak";
// Prefix used by the balanced binary merkle tree nodes
pub const MERKLE_NODE: &[u8] = b"node";

// JAM global state components
pub const AUTH_POOLS: u8 = 1;
pub const AUTH_QUEUE: u8 = 2;
pub const RECENT_HISTORY: u8 = 3;
pub const SAFROLE: u8 = 4;
pub const DISPUTES: u8 = 5;
pub const ENTROPY: u8 = 6;
pub const VALIDATOR_QUEUE: u8 = 7;
pub const CURR_VALIDATORS: u8 = 8;
pub const PREV_VALIDATORS: u8 = 9;
pub const AVAILABILITY: u8 = 10;
pub const TIME: u8 = 11;
pub const PRIVILEGES: u8 = 12;
pub const STATISTICS: u8 = 13;
pub const READY_QUEUE: u8 = 14;
pub const ACCUMULATION_HISTORY: u8 = 15;
pub const SERVICE_ACCOUNT: u8 = 255;
