/*
    Our state may be logically partitioned into several largely independent segments which can both help avoid visual clutter
    within our protocol description and provide formality over elements of computation which may be simultaneously calculated
    (i.e. parallelized). We therefore pronounce an equivalence between σ (some complete state) and a tuple of partitioned
    segments of that state:

    σ ≡ (α, β, γ, δ, η, ι, κ, λ, ρ, τ, φ, χ, ψ, π, ϑ, ξ)

    In summary, δ is the portion of state dealing with services, analogous in Jam to the Yellow Paper’s (smart contract) accounts,
    the only state of the YP’s Ethereum. The identities of services which hold some privileged status are tracked in χ.

    Validators, who are the set of economic actors uniquely privileged to help build and maintain the Jam chain, are identified
    within κ, archived in λ and enqueued from ι. All other state concerning the determination of these keys is held within γ.
    An on-chain entropy pool is retained in η.

    Our state also tracks two aspects of each core: α, the authorization requirement which work done on that core must satisfy at
    the time of being reported on-chain, together with the queue which fills this, φ; and ρ, each of the cores currently assigned
    report, the availability of whose work-package must yet be assured by a super-majority of validators.

    Finally, details of the most recent blocks and timeslot index are tracked in β and τ respectively, work-reports which are
    ready to be accumulated and work-packages which were recently accumulated are tracked in ϑ and ξ respectively and, judgments
    are tracked in ψ and validator statistics are tracked in π.
*/

use std::sync::Arc;

use accumulation::Invoker;
use block::{extrinsic_hash, header_hash, seal_verify};
use constants::ProtocolConfigRef;
use jam_types::{
    AccumulateFunction, Block, Ed25519Public, OnTransferFunction, RuntimeError, State, StateRoot, TimeSlot, Validate,
};
use reports::GuaranteesContext;
use safrole::SafroleInput;
use statistics::BlockActivity;
use utils::bandersnatch::{vrf_output, RingContext};
use utils::print_hash;

pub use utils::serialization::state_root;

/// What the importer knows about the block beyond the block itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ApplyContext {
    // The wall-clock slot; blocks from the future are rejected
    pub timeslot: TimeSlot,
    // Merkle root of the prior state
    pub state_root: StateRoot,
}

/// Applies blocks to states. Holds the protocol profile, the ring parameters used by ticket proofs and the service
/// code entry-points.
#[derive(Clone)]
pub struct Runtime {
    pub config: ProtocolConfigRef,
    pub ring: Arc<RingContext>,
    pub accumulate: Arc<dyn AccumulateFunction>,
    pub on_transfer: Arc<dyn OnTransferFunction>,
}

impl Runtime {
    pub fn new(
        config: ProtocolConfigRef,
        ring: Arc<RingContext>,
        accumulate: Arc<dyn AccumulateFunction>,
        on_transfer: Arc<dyn OnTransferFunction>,
    ) -> Self {
        Runtime { config, ring, accumulate, on_transfer }
    }

    // We specify the state transition function as the implication of formulating all items of posterior state in terms of the
    // prior state and block. Every stage works on values, so a failing block leaves the prior state untouched.
    pub fn apply(&self, state: &State, block: &Block, context: &ApplyContext) -> Result<State, RuntimeError> {

        let config = self.config.as_ref();
        let header = &block.header.unsigned;
        let extrinsic = &block.extrinsic;
        let hash = header_hash(&block.header);
        log::debug!("Importing new block: 0x{} at slot {}", print_hash!(hash), header.slot);

        block.validate(config)?;
        self.verify_header(state, block, context)?;

        // Safrole
        let mut offenders: Vec<Ed25519Public> = state.disputes.offenders.iter().copied().collect();
        offenders.extend(header.offenders_mark.iter().filter(|key| !state.disputes.offenders.contains(*key)));
        let entropy = vrf_output(&header.entropy_source).map_err(RuntimeError::InvalidVrfSignature)?;
        let safrole_input = SafroleInput { slot: header.slot, entropy, offenders: &offenders, tickets: &extrinsic.tickets };
        let safrole = safrole::process(config, &self.ring, state, &safrole_input)?;

        if header.epoch_mark != safrole.epoch_mark {
            log::error!("Epoch marker does not match the safrole output");
            return Err(RuntimeError::InvalidHeaderEpochMarker);
        }
        if header.tickets_mark != safrole.tickets_mark {
            log::error!("Winning tickets marker does not match the safrole output");
            return Err(RuntimeError::InvalidHeaderWinningTickets);
        }

        let post = safrole.post_state;
        let author = post
            .curr_validators
            .get(header.author_index as usize)
            .ok_or(RuntimeError::InvalidAuthorIndex(header.author_index))?;
        let phase = config.phase_of(header.slot) as usize;
        seal_verify(&block.header, &post.safrole.tickets_or_keys, &post.entropy.0[3], &author.bandersnatch, phase)?;

        // Disputes
        let disputes = disputes::process(config, state, &extrinsic.disputes)?;
        if header.offenders_mark != disputes.offenders {
            log::error!("Offenders marker does not match the disputes output");
            return Err(RuntimeError::InvalidHeaderOffendersMarkers);
        }

        // Assurances
        let assurances = assurances::process(
            config,
            &disputes.availability,
            &post.curr_validators,
            &extrinsic.assurances,
            header.slot,
            &header.parent,
        )?;

        // Accumulation
        let invoker = Invoker { accumulate: self.accumulate.as_ref(), on_transfer: self.on_transfer.as_ref() };
        let accumulated = accumulation::process(config, invoker, state, &assurances.available, header.slot, &post.entropy.0[0])?;

        // Recent history as seen by the guarantees: the previous block's state root is now known
        let intermediate_history = recent_history::process(&state.recent_history, &header.parent_state_root);

        // Guaranteeing
        let guarantees_context = GuaranteesContext {
            entropy: &post.entropy,
            curr_validators: &post.curr_validators,
            prev_validators: &post.prev_validators,
            offenders: &disputes.records.offenders,
            availability: &assurances.availability,
            auth_pools: &state.auth_pools,
            recent_history: &intermediate_history,
            ready_queue: &state.ready_queue,
            accumulation_history: &state.accumulation_history,
        };
        let reports = reports::process(config, &guarantees_context, &accumulated.services, header.slot, &extrinsic.guarantees)?;

        let recent_history = recent_history::finalize(&intermediate_history, &hash, &accumulated.root, &reports.reported);

        // Authorization
        let used_authorizers = authorization::used_authorizers(&extrinsic.guarantees);
        let auth_pools = authorization::process(config, &state.auth_pools, &accumulated.auth_queues, header.slot, &used_authorizers)?;

        // Preimages
        let mut services = accumulated.services;
        let preimage_updates = preimages::process(&state.services, &services, header.slot, &extrinsic.preimages)?;
        preimages::apply_updates(&mut services, &preimage_updates);

        // Statistics
        let activity = BlockActivity {
            author_index: header.author_index,
            extrinsic,
            reporters: &reports.reporters,
            available: &assurances.available,
            accumulation_stats: &accumulated.accumulation_stats,
            transfer_stats: &accumulated.transfer_stats,
        };
        let statistics = statistics::process(config, &state.statistics, &post.curr_validators, state.time, header.slot, &activity);

        log::debug!("Block 0x{} processed successfully", print_hash!(hash));

        Ok(State {
            auth_pools,
            auth_queues: accumulated.auth_queues,
            recent_history,
            safrole: post.safrole,
            disputes: disputes.records,
            entropy: post.entropy,
            validator_queue: accumulated.validator_queue,
            curr_validators: post.curr_validators,
            prev_validators: post.prev_validators,
            availability: reports.availability,
            time: post.time,
            privileges: accumulated.privileges,
            statistics,
            ready_queue: accumulated.ready_queue,
            accumulation_history: accumulated.accumulation_history,
            services,
        })
    }

    // Checks which need nothing but the header and the prior state
    fn verify_header(&self, state: &State, block: &Block, context: &ApplyContext) -> Result<(), RuntimeError> {

        let header = &block.header.unsigned;

        if let Some(last) = state.recent_history.history.last() {
            if header.parent != last.header_hash {
                log::error!("Bad parent 0x{} != 0x{}", print_hash!(header.parent), print_hash!(last.header_hash));
                return Err(RuntimeError::InvalidParentHash);
            }
        }

        if header.parent_state_root != context.state_root {
            log::error!("Bad parent state root 0x{} != 0x{}", print_hash!(header.parent_state_root), print_hash!(context.state_root));
            return Err(RuntimeError::InvalidHeaderStateRoot);
        }

        if header.extrinsic_hash != extrinsic_hash(&block.extrinsic) {
            log::error!("Bad extrinsic hash 0x{}", print_hash!(header.extrinsic_hash));
            return Err(RuntimeError::InvalidExtrinsicHash);
        }

        if header.slot <= state.time {
            log::error!("Block slot {} not after the previous slot {}", header.slot, state.time);
            return Err(RuntimeError::HeaderTimeslotTooSmall);
        }

        if header.slot > context.timeslot {
            log::error!("Block slot {} is in the future, now is {}", header.slot, context.timeslot);
            return Err(RuntimeError::InvalidTimeslot);
        }

        Ok(())
    }
}
