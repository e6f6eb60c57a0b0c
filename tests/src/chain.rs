// A small in-memory chain for the block import tests: a genesis state with known validator secrets, a block author
// which seals with the fallback keys and a runtime whose service code is mocked.

use std::sync::{Arc, Mutex};

use once_cell::sync::Lazy;
use sp_core::{ed25519, Pair};

use block::{author_header, extrinsic_hash, header_hash};
use constants::ProtocolConfig;
use jam_types::{
    AccumulateFunction, AccumulateOutput, AccumulationOperand, AccumulationPartialState, Account, AuthPool, AuthPools,
    AuthQueue, AuthQueues, BandersnatchPublic, Block, BoxedError, BoundedVec, DeferredTransfer, Ed25519Public, Entropy,
    EntropyPool, Extrinsic, Gas, OnTransferFunction, RuntimeError, ServiceAccounts, ServiceId, ServiceInfo, Services, State,
    StateRoot, TicketsOrKeys, TimeSlot, UnsignedHeader,
};
use safrole::SafroleInput;
use state_controller::{state_root, ApplyContext, Runtime};
use utils::bandersnatch::{Prover, RingContext};
use utils::common::blake2;

pub const SERVICE: ServiceId = 7;
pub const CODE: &[u8] = b"counter service code";
pub const AUTHORIZER: [u8; 32] = [0xA0; 32];
// Storage key the mocked service counts its accumulated items under
pub const COUNTER_KEY: &[u8] = b"items";

pub static RING: Lazy<Arc<RingContext>> = Lazy::new(|| Arc::new(RingContext::from_seed(6, [0u8; 32])));

pub fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Accumulate code which adds the number of operands to a counter in its storage and commits to the first payload.
#[derive(Default)]
pub struct CounterService {
    pub calls: Mutex<Vec<(ServiceId, usize)>>,
}

impl AccumulateFunction for CounterService {
    fn invoke(
        &self,
        _config: &ProtocolConfig,
        service: ServiceId,
        _code: &[u8],
        state: &AccumulationPartialState,
        _gas: Gas,
        operands: &[AccumulationOperand],
        _initial_index: ServiceId,
        _timeslot: TimeSlot,
    ) -> Result<AccumulateOutput, BoxedError> {
        self.calls.lock().unwrap().push((service, operands.len()));

        let mut state = state.clone();
        let count = state.services.storage(service, COUNTER_KEY).map_or(0, |value| value[0]);
        state.services.set_storage(service, COUNTER_KEY, Some(vec![count + operands.len() as u8]));

        Ok(AccumulateOutput {
            state,
            transfers: Vec::new(),
            commitment: operands.first().map(|operand| operand.payload_hash),
            gas_used: operands.iter().map(|operand| operand.gas_limit / 4).sum(),
            provided: Vec::new(),
        })
    }
}

pub struct NoTransfers;

impl OnTransferFunction for NoTransfers {
    fn invoke(
        &self,
        _config: &ProtocolConfig,
        _service: ServiceId,
        _services: &mut Services,
        _timeslot: TimeSlot,
        _transfers: &[DeferredTransfer],
    ) -> Result<Gas, BoxedError> {
        Ok(0)
    }
}

pub struct Chain {
    pub config: ProtocolConfig,
    pub provers: Vec<Prover>,
    pub pairs: Vec<ed25519::Pair>,
    pub service: Arc<CounterService>,
    pub runtime: Runtime,
    pub state: State,
    pub root: StateRoot,
}

impl Chain {

    pub fn genesis() -> Chain {
        let config = ProtocolConfig::tiny();
        let provers: Vec<Prover> = (0..config.validators_count as u8).map(|i| Prover::from_seed(&[i])).collect();
        let pairs: Vec<ed25519::Pair> = (0..config.validators_count as u8).map(|i| ed25519::Pair::from_seed(&[i; 32])).collect();

        let mut state = State::new(&config);
        for (i, (prover, pair)) in provers.iter().zip(pairs.iter()).enumerate() {
            for set in [&mut state.curr_validators, &mut state.prev_validators, &mut state.validator_queue, &mut state.safrole.next_validators] {
                set[i].bandersnatch = prover.public().unwrap();
                set[i].ed25519 = pair.public().0;
            }
        }
        let keys: Vec<BandersnatchPublic> = state.safrole.next_validators.iter().map(|v| v.bandersnatch).collect();
        state.safrole.ring_commitment = RING.commitment(&keys).unwrap();
        // Slot s of the genesis epoch is sealed by validator s mod V
        let slot_keys = (0..config.epoch_length as usize).map(|slot| keys[slot % keys.len()]).collect();
        state.safrole.tickets_or_keys = TicketsOrKeys::Keys(BoundedVec::new(&config, slot_keys).unwrap());
        state.entropy = EntropyPool([[1; 32], [2; 32], [3; 32], [4; 32]]);

        let pool: AuthPool = BoundedVec::new(&config, vec![AUTHORIZER]).unwrap();
        state.auth_pools = AuthPools::filled(&config, pool);
        let queue: AuthQueue = BoundedVec::filled(&config, AUTHORIZER);
        state.auth_queues = AuthQueues::filled(&config, queue);

        let mut account = Account::new(ServiceInfo { code_hash: blake2(CODE), balance: 10_000, ..Default::default() });
        account.preimages.insert(blake2(CODE), CODE.to_vec());
        state.services.insert(SERVICE, account);

        let service = Arc::new(CounterService::default());
        let runtime = Runtime::new(Arc::new(config.clone()), RING.clone(), service.clone(), Arc::new(NoTransfers));
        let root = state_root(&state);

        Chain { config, provers, pairs, service, runtime, state, root }
    }

    pub fn parent(&self) -> [u8; 32] {
        self.state.recent_history.history.last().map(|block| block.header_hash).unwrap_or_default()
    }

    pub fn offenders(&self) -> Vec<Ed25519Public> {
        self.state.disputes.offenders.iter().copied().collect()
    }

    // The slot's seal keys and markers only depend on the prior state, so a dry run of safrole without the block's
    // tickets gives the author everything the header must carry
    pub fn author(&self, slot: TimeSlot, extrinsic: Extrinsic) -> Block {
        let offenders = self.offenders();
        let input = SafroleInput { slot, entropy: Entropy::default(), offenders: &offenders, tickets: &[] };
        let dry_run = safrole::process(&self.config, &RING, &self.state, &input).unwrap();
        let post = &dry_run.post_state;

        let phase = self.config.phase_of(slot) as usize;
        let TicketsOrKeys::Keys(keys) = &post.safrole.tickets_or_keys else {
            panic!("chain fixture only seals with fallback keys");
        };
        let author_index = post.curr_validators.iter().position(|v| v.bandersnatch == keys[phase]).unwrap();

        let unsigned = UnsignedHeader {
            parent: self.parent(),
            parent_state_root: self.root,
            extrinsic_hash: extrinsic_hash(&extrinsic),
            slot,
            epoch_mark: dry_run.epoch_mark.clone(),
            tickets_mark: dry_run.tickets_mark.clone(),
            offenders_mark: Vec::new(),
            author_index: author_index as u16,
            ..Default::default()
        };
        let header = author_header(&self.provers[author_index], unsigned, &post.safrole.tickets_or_keys, &post.entropy.0[3], phase).unwrap();

        Block { header, extrinsic }
    }

    pub fn apply(&self, block: &Block) -> Result<State, RuntimeError> {
        let context = ApplyContext { timeslot: block.header.unsigned.slot, state_root: self.root };
        self.runtime.apply(&self.state, block, &context)
    }

    pub fn import(&mut self, block: &Block) -> Result<(), RuntimeError> {
        let state = self.apply(block)?;
        self.root = state_root(&state);
        self.state = state;
        log::debug!("Imported block 0x{} at slot {}", utils::print_hash!(header_hash(&block.header)), block.header.unsigned.slot);
        Ok(())
    }

    pub fn sign(&self, validator: usize, message: &[u8]) -> [u8; 64] {
        self.pairs[validator].sign(message).0
    }
}
