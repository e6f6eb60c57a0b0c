// JAM Protocol Types
mod accounts;
mod bounded;
mod default;
mod error;
mod invocation;
mod validate;

use std::collections::{BTreeMap, BTreeSet};

use constants::node::ENTROPY_POOL_SIZE;

pub use accounts::{Account, ServiceAccounts, ServiceInfo, Services};
pub use bounded::{
    AuthPoolSize, AuthQueueSize, BoundedVec, PerCore, PerEpochSlot, PerValidator, RecentHistorySize, SizeBound, UpToEpochLength,
};
pub use error::*;
pub use invocation::{
    AccumulateFunction, AccumulateOutput, AccumulationOperand, AccumulationPartialState, DeferredTransfer, OnTransferFunction,
};
pub use validate::Validate;

// ----------------------------------------------------------------------------------------------------------
// Crypto
// ----------------------------------------------------------------------------------------------------------
pub type Ed25519Public = [u8; 32];
pub type BlsPublic = [u8; 144];
pub type BandersnatchPublic = [u8; 32];

pub type BandersnatchRingVrfSignature = [u8; 784];
pub type BandersnatchVrfSignature = [u8; 96];
pub type Ed25519Signature = [u8; 64];

pub type BandersnatchRingCommitment = [u8; 144];
// ----------------------------------------------------------------------------------------------------------
// Application Specific Core
// ----------------------------------------------------------------------------------------------------------
pub type OpaqueHash = [u8; 32];
pub type Metadata = [u8; 128];

pub type TimeSlot = u32;
pub type ValidatorIndex = u16;
pub type CoreIndex = u16;
pub type ServiceId = u32;

pub type Hash = OpaqueHash;
pub type HeaderHash = OpaqueHash;
pub type StateRoot = OpaqueHash;
pub type BeefyRoot = OpaqueHash;
pub type WorkPackageHash = OpaqueHash;
pub type WorkReportHash = OpaqueHash;
pub type ExportsRoot = OpaqueHash;
pub type ErasureRoot = OpaqueHash;
pub type AuthorizerHash = OpaqueHash;
pub type Entropy = OpaqueHash;

pub type Gas = u64;
pub type Balance = u64;

// ----------------------------------------------------------------------------------------------------------
// Block
// ----------------------------------------------------------------------------------------------------------
#[derive(Debug, PartialEq, Clone)]
pub struct Block {
    pub header: Header,
    pub extrinsic: Extrinsic,
}

#[derive(Debug, PartialEq, Clone)]
pub struct Header {
    pub unsigned: UnsignedHeader,
    pub seal: BandersnatchVrfSignature,
}

#[derive(Debug, PartialEq, Clone)]
pub struct UnsignedHeader {
    pub parent: HeaderHash,
    pub parent_state_root: StateRoot,
    pub extrinsic_hash: OpaqueHash,
    pub slot: TimeSlot,
    pub epoch_mark: Option<EpochMark>,
    pub tickets_mark: Option<TicketsMark>,
    pub offenders_mark: OffendersMark,
    pub author_index: ValidatorIndex,
    pub entropy_source: BandersnatchVrfSignature,
}

#[derive(Debug, PartialEq, Clone, Default)]
pub struct Extrinsic {
    // Tickets, used for the mechanism which manages the selection of validators for the permissioning of block authoring.
    pub tickets: Vec<Ticket>,
    // Votes, by validators, on dispute(s) arising between them presently taking place.
    pub disputes: DisputesExtrinsic,
    // Static data which is presently being requested to be available for workloads to be able to fetch on demand.
    pub preimages: Vec<Preimage>,
    // Assurances by each validator concerning which of the input data of workloads they have correctly received and are storing locally.
    pub assurances: Vec<Assurance>,
    // Reports of newly completed workloads whose accuracy is guaranteed by specific validators.
    pub guarantees: Vec<Guarantee>,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct DisputesExtrinsic {
    pub verdicts: Vec<Verdict>,
    pub culprits: Vec<Culprit>,
    pub faults: Vec<Fault>,
}

// The epoch marker specifies key and entropy relevant to the following epoch in case the ticket contest does not
// complete adequately. It is present only in the first block of a new epoch.
#[derive(Debug, PartialEq, Clone)]
pub struct EpochMark {
    pub entropy: Entropy,
    pub tickets_entropy: Entropy,
    pub validators: Vec<(BandersnatchPublic, Ed25519Public)>,
}
// The tickets marker provides the series of epoch-length slot sealing tickets for the next epoch. It is present only in
// the first block after the end of the submission period, and only if the ticket accumulator is saturated.
pub type TicketsMark = Vec<TicketBody>;

pub type OffendersMark = Vec<Ed25519Public>;
// ----------------------------------------------------------------------------------------------------------
// Entropy
// ----------------------------------------------------------------------------------------------------------
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct EntropyPool(pub [Entropy; ENTROPY_POOL_SIZE]);
// ----------------------------------------------------------------------------------------------------------
// Validators
// ----------------------------------------------------------------------------------------------------------

/// This is a combination of a set of cryptographic public keys and metadata which is an opaque octet sequence,
/// but utilized to specify practical identifiers for the validator, not least a hardware address. The set of
/// validator keys itself is equivalent to the set of 336-octet sequences.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct ValidatorData {
    // The Bandersnatch key is equivalent to the first 32 octets
    pub bandersnatch: BandersnatchPublic,
    // The Ed25519 is the second 32 octets
    pub ed25519: Ed25519Public,
    // The bls key is equivalent to the following 144 octets
    pub bls: BlsPublic,
    // The metadata is the last 128 octets
    pub metadata: Metadata,
}

pub type ValidatorsData = BoundedVec<ValidatorData, PerValidator>;
// ----------------------------------------------------------------------------------------------------------
// Availability Assignments
// ----------------------------------------------------------------------------------------------------------
#[derive(Debug, Clone, PartialEq)]
pub struct AvailabilityAssignment {
    pub report: WorkReport,
    // Slot in which the report was guaranteed
    pub timeslot: TimeSlot,
}

pub type AvailabilityAssignments = BoundedVec<Option<AvailabilityAssignment>, PerCore>;
// ----------------------------------------------------------------------------------------------------------
// Refine Context
// ----------------------------------------------------------------------------------------------------------
// A refinement context describes the context of the chain at the point that the report's corresponding
// work-package was evaluated.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RefineContext {
    // Anchor block header hash
    pub anchor: HeaderHash,
    // Posterior block state root
    pub state_root: StateRoot,
    // Posterior BEEFY root
    pub beefy_root: BeefyRoot,
    // Lookup anchor header hash
    pub lookup_anchor: HeaderHash,
    // Lookup anchor timeslot
    pub lookup_anchor_slot: TimeSlot,
    // Sequence of hashes of any prerequisite work packages
    pub prerequisites: Vec<WorkPackageHash>,
}
// ----------------------------------------------------------------------------------------------------------
// Authorizations
// ----------------------------------------------------------------------------------------------------------
pub type AuthPool = BoundedVec<AuthorizerHash, AuthPoolSize>;
pub type AuthPools = BoundedVec<AuthPool, PerCore>;
pub type AuthQueue = BoundedVec<AuthorizerHash, AuthQueueSize>;
pub type AuthQueues = BoundedVec<AuthQueue, PerCore>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CodeAuthorizer {
    pub core: CoreIndex,
    pub auth_hash: AuthorizerHash,
}
// ----------------------------------------------------------------------------------------------------------
// Work Report
// ----------------------------------------------------------------------------------------------------------
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkReport {
    // Work package specification
    pub package_spec: WorkPackageSpec,
    // Refine context
    pub context: RefineContext,
    // Core index
    pub core_index: CoreIndex,
    // Authorizer hash
    pub authorizer_hash: AuthorizerHash,
    // Authorization trace
    pub auth_output: Vec<u8>,
    // Segment root lookup dictionary
    pub segment_root_lookup: Vec<SegmentRootLookupItem>,
    // Sequence of work results of the evaluation of each of the items in the package together with some associated data
    pub results: Vec<WorkResult>,
    // Gas used by the is-authorized invocation
    pub auth_gas_used: Gas,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct ReportedPackage {
    pub work_package_hash: WorkPackageHash,
    pub segment_tree_root: ExportsRoot,
}

// The Work Result is the data conduit by which services states may be altered through the computation done within a work-package.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkResult {
    // Index of the service whose state is to be altered and thus whose refine code was already executed
    pub service: ServiceId,
    // Hash of the code service at the time of being reported, which must be accurately predicted within the work report
    pub code_hash: OpaqueHash,
    // Hash of the payload within the work item which was executed in the refine stage to give this result
    pub payload_hash: OpaqueHash,
    // Gas limit for executing this item's accumulate
    pub gas: Gas,
    // Output blob or error of the refine execution
    pub result: WorkExecResult,
    // Level of activity which this workload imposed on the core in bringing the result to bear
    pub refine_load: RefineLoad,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RefineLoad {
    // Gas used during refinement
    pub gas_used: Gas,
    // Number of segments imported from DA
    pub imports: u16,
    // Number of the extrinsics used in computing the workload
    pub extrinsic_count: u16,
    // Total size in octets of the extrinsics used in computing the workload
    pub extrinsic_size: u32,
    // Number of segments exported into DA
    pub exports: u16,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WorkExecResult {
    Ok(Vec<u8>),
    Error(WorkExecError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkExecError {
    OutOfGas = 1,
    Panic = 2,
    BadNumberExports = 3,
    BadCode = 4,
    CodeOversize = 5,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct WorkPackageSpec {
    // Work package hash
    pub hash: WorkPackageHash,
    // Work bundle length
    pub length: u32,
    // Erasure root
    pub erasure_root: ErasureRoot,
    // Segment root
    pub exports_root: ExportsRoot,
    // Segment count
    pub exports_count: u16,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SegmentRootLookupItem {
    pub work_package_hash: WorkPackageHash,
    pub segment_tree_root: ExportsRoot,
}
// ----------------------------------------------------------------------------------------------------------
// Recent History
// ----------------------------------------------------------------------------------------------------------
pub type MmrPeak = Option<Hash>;

#[derive(Clone, Debug, PartialEq, Eq, Default)]
pub struct Mmr {
    pub peaks: Vec<MmrPeak>,
}

#[derive(Clone, Debug, PartialEq, Eq, Default)]
pub struct BlockInfo {
    // Block's header hash
    pub header_hash: HeaderHash,
    // Super-peak of the accumulation-result MMR after this block
    pub beefy_root: BeefyRoot,
    // Block's state root, known only once the next block arrives
    pub state_root: StateRoot,
    // Work packages reported in this block and their segment roots
    pub reported: Vec<ReportedPackage>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct RecentBlocks {
    pub history: BoundedVec<BlockInfo, RecentHistorySize>,
    pub mmr: Mmr,
}
// ----------------------------------------------------------------------------------------------------------
// Statistics
// ----------------------------------------------------------------------------------------------------------
#[derive(Clone, Debug, PartialEq, Eq, Copy, Default)]
pub struct ActivityRecord {
    pub blocks: u32,
    pub tickets: u32,
    pub preimages: u32,
    pub preimages_size: u32,
    pub guarantees: u32,
    pub assurances: u32,
}

pub type ValidatorStatistics = BoundedVec<ActivityRecord, PerValidator>;

#[derive(Clone, Debug, PartialEq, Eq, Copy, Default)]
pub struct CoreActivityRecord {
    // Amount of bytes which are placed into either Audits or Segments DA
    pub da_load: u32,
    // Number of validators which assured availability of the core
    pub popularity: u16,
    // Number of segments imported from DA made by core for reported work.
    pub imports: u16,
    // Total number of extrinsics used by core for reported work.
    pub extrinsic_count: u16,
    // Total size of extrinsics used by core for reported work.
    pub extrinsic_size: u32,
    // Number of segments exported into DA made by core for reported work.
    pub exports: u16,
    // The work-bundle size. This is the size of data being placed into Audits DA by the core.
    pub bundle_size: u32,
    // Total gas consumed by core for reported work.
    pub gas_used: Gas,
}

pub type CoresStatistics = BoundedVec<CoreActivityRecord, PerCore>;

#[derive(Clone, Debug, PartialEq, Eq, Copy, Default)]
pub struct ServiceActivityRecord {
    // Number of preimages provided to this service
    pub provided_count: u16,
    // Total size of preimages provided to this service.
    pub provided_size: u32,
    // Number of work-items refined by service for reported work.
    pub refinement_count: u32,
    // Amount of gas used for refinement by service for reported work.
    pub refinement_gas_used: Gas,
    // Number of segments imported from the DL by service for reported work.
    pub imports: u32,
    // Total number of extrinsics used by service for reported work.
    pub extrinsic_count: u32,
    // Total size of extrinsics used by service for reported work.
    pub extrinsic_size: u32,
    // Number of segments exported into the DL by service for reported work.
    pub exports: u32,
    // Number of work-items accumulated by service.
    pub accumulate_count: u32,
    // Amount of gas used for accumulation by service.
    pub accumulate_gas_used: Gas,
    // Number of transfers processed by service.
    pub on_transfers_count: u32,
    // Amount of gas used for processing transfers by service.
    pub on_transfers_gas_used: Gas,
}

pub type ServicesStatistics = BTreeMap<ServiceId, ServiceActivityRecord>;

#[derive(Clone, Debug, PartialEq)]
pub struct Statistics {
    // Accumulator for the present epoch
    pub curr: ValidatorStatistics,
    // Completed record of the previous epoch
    pub prev: ValidatorStatistics,
    pub cores: CoresStatistics,
    pub services: ServicesStatistics,
}
// ----------------------------------------------------------------------------------------------------------
// Tickets
// ----------------------------------------------------------------------------------------------------------
// The tickets extrinsic is a sequence of proofs of valid tickets; a ticket implies an entry in our epochal "contest"
// to determine which validators are privileged to author a block for each timeslot in the following epoch.
// Each proof implies a ticket identifier, a high-entropy unbiasable 32-octet sequence, which is used both as a
// score in the contest and as input to the on-chain vrf.
pub type TicketId = OpaqueHash;
pub type TicketAttempt = u8;

#[derive(Debug, Clone, PartialEq)]
pub struct Ticket {
    pub attempt: TicketAttempt,
    pub signature: BandersnatchRingVrfSignature,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
pub struct TicketBody {
    pub id: TicketId,
    pub attempt: TicketAttempt,
}

pub type TicketAccumulator = BoundedVec<TicketBody, UpToEpochLength>;

#[derive(Debug, Clone, PartialEq)]
pub enum TicketsOrKeys {
    Tickets(BoundedVec<TicketBody, PerEpochSlot>),
    Keys(BoundedVec<BandersnatchPublic, PerEpochSlot>),
}
// ----------------------------------------------------------------------------------------------------------
// Safrole
// ----------------------------------------------------------------------------------------------------------
#[derive(Debug, Clone, PartialEq)]
pub struct Safrole {
    // The set of keys which will be active in the next epoch and which determine the Bandersnatch ring root which
    // authorizes tickets into the sealing-key contest for the next epoch.
    pub next_validators: ValidatorsData,
    // Sequence of highest-scoring ticket identifiers to be used for the next epoch
    pub ticket_accumulator: TicketAccumulator,
    // Current epoch's slot-sealer. Either a full complement of epoch-length tickets or, in fallback mode, a series
    // of epoch-length Bandersnatch keys
    pub tickets_or_keys: TicketsOrKeys,
    // Bandersnatch ring root composed with the one Bandersnatch key of each of the next epoch's validators
    pub ring_commitment: BandersnatchRingCommitment,
}
// ----------------------------------------------------------------------------------------------------------
// Disputes
// ----------------------------------------------------------------------------------------------------------
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct DisputesRecords {
    // Reports judged to be correct
    pub good: BTreeSet<WorkReportHash>,
    // Reports judged to be incorrect
    pub bad: BTreeSet<WorkReportHash>,
    // Reports for which it appears impossible to judge
    pub wonky: BTreeSet<WorkReportHash>,
    // Ed25519 keys of validators found to have misjudged a work report
    pub offenders: BTreeSet<Ed25519Public>,
}
// A verdict is a compilation of judgments coming from exactly two-thirds plus one of either the active validator
// set or the previous epoch's validator set.
#[derive(Debug, Clone, PartialEq)]
pub struct Verdict {
    pub target: WorkReportHash,
    // Epoch of the validator set which judged
    pub age: u32,
    pub votes: Vec<Judgement>,
}
// Proof of a guarantor having guaranteed a work-report found to be invalid.
#[derive(Debug, Clone, PartialEq)]
pub struct Culprit {
    pub target: WorkReportHash,
    pub key: Ed25519Public,
    pub signature: Ed25519Signature,
}
// Proof of a validator having signed a judgment contradicting the verdict on a work-report.
#[derive(Debug, Clone, PartialEq)]
pub struct Fault {
    pub target: WorkReportHash,
    pub vote: bool,
    pub key: Ed25519Public,
    pub signature: Ed25519Signature,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Judgement {
    pub vote: bool,
    pub index: ValidatorIndex,
    pub signature: Ed25519Signature,
}
// ----------------------------------------------------------------------------------------------------------
// Preimages
// ----------------------------------------------------------------------------------------------------------
#[derive(Debug, PartialEq, Eq, Clone)]
pub struct Preimage {
    pub requester: ServiceId,
    pub blob: Vec<u8>,
}
// ----------------------------------------------------------------------------------------------------------
// Assurances
// ----------------------------------------------------------------------------------------------------------
#[derive(Debug, Clone, PartialEq)]
pub struct Assurance {
    // Assurance anchor hash must be the parent header
    pub anchor: HeaderHash,
    // One bit per core; a set bit means the validator holds its share of the pending report on that core
    pub bitfield: Vec<u8>,
    // Index of validator who is assuring
    pub validator_index: ValidatorIndex,
    // Validator public Ed25519 signature
    pub signature: Ed25519Signature,
}
// ----------------------------------------------------------------------------------------------------------
// Guarantees
// ----------------------------------------------------------------------------------------------------------
#[derive(Debug, Clone, PartialEq)]
pub struct ValidatorSignature {
    pub validator_index: ValidatorIndex,
    pub signature: Ed25519Signature,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Guarantee {
    pub report: WorkReport,
    pub slot: TimeSlot,
    pub signatures: Vec<ValidatorSignature>,
}
// ----------------------------------------------------------------------------------------------------------
// Accumulation
// ----------------------------------------------------------------------------------------------------------
#[derive(Debug, Clone, PartialEq)]
pub struct ReadyRecord {
    pub report: WorkReport,
    pub dependencies: Vec<WorkPackageHash>,
}

pub type ReadyQueue = BoundedVec<Vec<ReadyRecord>, PerEpochSlot>;
pub type AccumulatedHistory = BoundedVec<Vec<WorkPackageHash>, PerEpochSlot>;

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Privileges {
    // Index of the service able to alter the privileges state component from block to block
    pub empower: ServiceId,
    // Index of service able to alter the authorizer queue state component
    pub assign: ServiceId,
    // Index of service able to alter the validator queue state component
    pub designate: ServiceId,
    // Services which automatically accumulate in each block together with their basic amount of gas
    pub always_acc: BTreeMap<ServiceId, Gas>,
}

pub type AccumulateRoot = OpaqueHash;
// Gas used and number of work items accumulated, per service
pub type AccumulationStats = BTreeMap<ServiceId, (Gas, u32)>;
// Number of transfers received and gas used processing them, per destination service
pub type TransferStats = BTreeMap<ServiceId, (u32, Gas)>;
// ----------------------------------------------------------------------------------------------------------
// State
// ----------------------------------------------------------------------------------------------------------
#[derive(Clone, Debug, PartialEq)]
pub struct State {
    pub auth_pools: AuthPools,
    pub auth_queues: AuthQueues,
    pub recent_history: RecentBlocks,
    pub safrole: Safrole,
    pub disputes: DisputesRecords,
    pub entropy: EntropyPool,
    // Validators enqueued for the epoch after next
    pub validator_queue: ValidatorsData,
    pub curr_validators: ValidatorsData,
    pub prev_validators: ValidatorsData,
    pub availability: AvailabilityAssignments,
    pub time: TimeSlot,
    pub privileges: Privileges,
    pub statistics: Statistics,
    pub ready_queue: ReadyQueue,
    pub accumulation_history: AccumulatedHistory,
    pub services: Services,
}

pub type StateKey = [u8; 31];
