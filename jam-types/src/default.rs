use constants::ProtocolConfig;

use crate::{
    AuthPools, AuthQueues, AvailabilityAssignments, BoundedVec, CoresStatistics, DisputesRecords, EntropyPool, Header, Mmr,
    Privileges, RecentBlocks, RefineContext, ReadyQueue, AccumulatedHistory, Safrole, Services, State, Statistics, TicketAccumulator,
    TicketsOrKeys, UnsignedHeader, ValidatorData, ValidatorStatistics, ValidatorsData, WorkExecResult, WorkPackageSpec, WorkReport,
    WorkResult, RefineLoad,
};

impl Default for ValidatorData {
    fn default() -> Self {
        ValidatorData {
            bandersnatch: [0u8; 32],
            ed25519: [0u8; 32],
            bls: [0u8; 144],
            metadata: [0u8; 128],
        }
    }
}

impl Default for UnsignedHeader {
    fn default() -> Self {
        UnsignedHeader {
            parent: [0u8; 32],
            parent_state_root: [0u8; 32],
            extrinsic_hash: [0u8; 32],
            slot: 0,
            epoch_mark: None,
            tickets_mark: None,
            offenders_mark: Vec::new(),
            author_index: 0,
            entropy_source: [0u8; 96],
        }
    }
}

impl Default for Header {
    fn default() -> Self {
        Header { unsigned: UnsignedHeader::default(), seal: [0u8; 96] }
    }
}

impl Default for WorkExecResult {
    fn default() -> Self {
        WorkExecResult::Ok(Vec::new())
    }
}

impl Default for WorkResult {
    fn default() -> Self {
        WorkResult {
            service: 0,
            code_hash: [0u8; 32],
            payload_hash: [0u8; 32],
            gas: 0,
            result: WorkExecResult::default(),
            refine_load: RefineLoad::default(),
        }
    }
}

impl Default for WorkReport {
    fn default() -> Self {
        WorkReport {
            package_spec: WorkPackageSpec::default(),
            context: RefineContext::default(),
            core_index: 0,
            authorizer_hash: [0u8; 32],
            auth_output: Vec::new(),
            segment_root_lookup: Vec::new(),
            results: vec![WorkResult::default()],
            auth_gas_used: 0,
        }
    }
}

impl RecentBlocks {
    pub fn new(config: &ProtocolConfig) -> Self {
        RecentBlocks { history: BoundedVec::with_default(config), mmr: Mmr::default() }
    }
}

impl Statistics {
    pub fn new(config: &ProtocolConfig) -> Self {
        Statistics {
            curr: ValidatorStatistics::with_default(config),
            prev: ValidatorStatistics::with_default(config),
            cores: CoresStatistics::with_default(config),
            services: Default::default(),
        }
    }
}

impl Safrole {
    pub fn new(config: &ProtocolConfig) -> Self {
        Safrole {
            next_validators: ValidatorsData::with_default(config),
            ticket_accumulator: TicketAccumulator::with_default(config),
            tickets_or_keys: TicketsOrKeys::Keys(BoundedVec::filled(config, [0u8; 32])),
            ring_commitment: [0u8; 144],
        }
    }
}

impl State {
    /// An empty state for `config`: zeroed keys, empty pools and queues, no services.
    pub fn new(config: &ProtocolConfig) -> Self {
        State {
            auth_pools: AuthPools::filled(config, BoundedVec::filled(config, [0u8; 32])),
            auth_queues: AuthQueues::filled(config, BoundedVec::filled(config, [0u8; 32])),
            recent_history: RecentBlocks::new(config),
            safrole: Safrole::new(config),
            disputes: DisputesRecords::default(),
            entropy: EntropyPool::default(),
            validator_queue: ValidatorsData::with_default(config),
            curr_validators: ValidatorsData::with_default(config),
            prev_validators: ValidatorsData::with_default(config),
            availability: AvailabilityAssignments::with_default(config),
            time: 0,
            privileges: Privileges::default(),
            statistics: Statistics::new(config),
            ready_queue: ReadyQueue::with_default(config),
            accumulation_history: AccumulatedHistory::with_default(config),
            services: Services::default(),
        }
    }
}
