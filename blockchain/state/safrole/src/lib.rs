/*
    Jam's block production mechanism, termed Safrole after the novel Sassafras production mechanism of which it is
    a simplified variant, is a stateful system rather more complex than the Nakamoto consensus described in the YP.
    The chief purpose of a block production consensus mechanism is to limit the rate at which new blocks may be
    authored and, ideally, preclude the possibility of "forks": multiple blocks with equal numbers of ancestors.

    To achieve this, Safrole limits the possible author of any block within any given six-second timeslot to a single
    key-holder from within a prespecified set of validators. Furthermore, under normal operation, the identity of the
    key-holder of any future timeslot will have a very high degree of anonymity. As a side effect of its operation, we
    can generate a high-quality pool of entropy which may be used by other parts of the protocol and is accessible to
    services running on it.

    Because of its tightly scoped role, the core of Safrole's state, "gamma", is independent of the rest of the
    protocol. It interacts with other portions of the protocol through "iota" and "kappa", the prospective and active
    sets of validator keys respectively; "tau", the most recent block's timeslot; and "eta", the entropy accumulator.

    In order to generate the sequence of sealing keys in regular operation, and in particular to do so without making
    public the correspondence relation between them and the validator set, we use a Ring VRF over the Bandersnatch
    curve. The output of a valid ring proof is a ticket, and the validators' tickets with the best score define the
    sealing keys of the next epoch.
*/

use constants::node::XT_TICKET_SEAL;
use constants::ProtocolConfig;
use jam_types::{
    BandersnatchPublic, BoundedVec, Ed25519Public, Entropy, EntropyPool, EpochMark, SafroleError, Safrole, State, Ticket,
    TicketAccumulator, TicketBody, TicketsMark, TicketsOrKeys, TimeSlot, ValidatorsData,
};
use utils::bandersnatch::RingContext;
use utils::common::{blake2, set_offenders_null};
use utils::print_hash;

pub struct SafroleInput<'a> {
    pub slot: TimeSlot,
    // Output of the block's entropy-source VRF
    pub entropy: Entropy,
    // Validators punished so far, including the ones this block reports
    pub offenders: &'a [Ed25519Public],
    pub tickets: &'a [Ticket],
}

#[derive(Debug, Clone, PartialEq)]
pub struct SafrolePostState {
    pub time: TimeSlot,
    pub safrole: Safrole,
    pub entropy: EntropyPool,
    pub curr_validators: ValidatorsData,
    pub prev_validators: ValidatorsData,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SafroleOutput {
    pub post_state: SafrolePostState,
    pub epoch_mark: Option<EpochMark>,
    pub tickets_mark: Option<TicketsMark>,
}

// Process Safrole state
pub fn process(
    config: &ProtocolConfig,
    ring: &RingContext,
    state: &State,
    input: &SafroleInput,
) -> Result<SafroleOutput, SafroleError> {

    // tau defines the most recent block, post_tau the block being processed
    let tau = state.time;
    let post_tau = input.slot;
    log::debug!("Process Safrole state for slot {post_tau}");
    // Timeslot must be strictly monotonic
    if post_tau <= tau {
        log::error!("Bad block slot: {post_tau}. The previous slot is: {tau}. Timeslot must be strictly monotonic");
        return Err(SafroleError::InvalidTimeslot);
    }

    // Calculate time parameters
    let epoch = config.epoch_of(tau);
    let m = config.phase_of(tau);
    let post_epoch = config.epoch_of(post_tau);
    let post_m = config.phase_of(post_tau);

    let mut safrole = state.safrole.clone();
    let mut entropy = state.entropy.clone();
    let mut curr_validators = state.curr_validators.clone();
    let mut prev_validators = state.prev_validators.clone();
    let mut epoch_mark = None;

    // The winning-tickets marker is either empty or, if the block is the first after the end of the submission period
    // for tickets and if the ticket accumulator is saturated, then the final sequence of ticket identifiers
    let tickets_mark = if post_epoch == epoch
        && m < config.ticket_submission_end
        && config.ticket_submission_end <= post_m
        && state.safrole.ticket_accumulator.len() == config.epoch_length as usize
    {
        log::debug!("Tickets mark for epoch {}", post_epoch + 1);
        Some(outside_in_sequencer(&state.safrole.ticket_accumulator))
    } else {
        None
    };

    if post_epoch > epoch {
        log::debug!("We are in a new epoch: {post_epoch}");
        // On an epoch transition, we therefore rotate the accumulator value into the history eta1, eta2 eta3
        entropy.0 = [entropy.0[0], entropy.0[0], entropy.0[1], entropy.0[2]];
        // With a new epoch, validator keys get rotated and the epoch's Bandersnatch key root is updated. The queued
        // keys belonging to the offenders are replaced with a null key containing only zeroes.
        let mut next_validators = state.validator_queue.clone();
        set_offenders_null(&mut next_validators, input.offenders);
        prev_validators = curr_validators;
        curr_validators = std::mem::replace(&mut safrole.next_validators, next_validators);

        let ring_keys: Vec<BandersnatchPublic> = safrole.next_validators.iter().map(|v| v.bandersnatch).collect();
        safrole.ring_commitment = ring.commitment(&ring_keys)?;
        log::debug!("New ring commitment: 0x{}", print_hash!(safrole.ring_commitment));

        // gamma_s is the current epoch's slot-sealer series, which is either a full complement of epoch-length
        // tickets or, in case of fallback, a series of epoch-length bandersnatch keys
        safrole.tickets_or_keys = if post_epoch == epoch + 1
            && m >= config.ticket_submission_end
            && state.safrole.ticket_accumulator.len() == config.epoch_length as usize
        {
            log::debug!("First block after the end of submission period for tickets and the ticket accumulator is saturated");
            TicketsOrKeys::Tickets(BoundedVec::new(config, outside_in_sequencer(&state.safrole.ticket_accumulator))?)
        } else {
            log::warn!("Fallback mode!");
            TicketsOrKeys::Keys(BoundedVec::new(config, fallback(config, &entropy.0[2], &curr_validators))?)
        };

        // A tuple of the next and current epoch randomness, along with the Bandersnatch and Ed25519 keys of each
        // validator beginning in the next epoch
        epoch_mark = Some(EpochMark {
            entropy: entropy.0[1],
            tickets_entropy: entropy.0[2],
            validators: safrole.next_validators.iter().map(|v| (v.bandersnatch, v.ed25519)).collect(),
        });

        safrole.ticket_accumulator.clear()?;
    }

    // The entropy accumulator mixes in the block's VRF output
    entropy.0[0] = blake2(&[entropy.0[0], input.entropy].concat());

    let new_tickets = verify_tickets(config, ring, &safrole, &entropy.0[2], post_m, input.tickets)?;
    if !new_tickets.is_empty() {
        safrole.ticket_accumulator = merge_tickets(config, &safrole.ticket_accumulator, &new_tickets)?;
    }

    log::debug!("Safrole state processed successfully");

    Ok(SafroleOutput {
        post_state: SafrolePostState { time: post_tau, safrole, entropy, curr_validators, prev_validators },
        epoch_mark,
        tickets_mark,
    })
}

// Each ticket proof is checked against the posterior ring commitment and the posterior second-oldest entropy
fn verify_tickets(
    config: &ProtocolConfig,
    ring: &RingContext,
    safrole: &Safrole,
    entropy: &Entropy,
    post_m: TimeSlot,
    tickets: &[Ticket],
) -> Result<Vec<TicketBody>, SafroleError> {

    if tickets.is_empty() {
        return Ok(Vec::new());
    }

    if post_m >= config.ticket_submission_end {
        log::error!("Tickets submitted at phase {post_m}, after the submission period");
        return Err(SafroleError::ExtrinsicsNotAllowed);
    }

    if tickets.len() > config.max_tickets_per_extrinsic {
        log::error!("Too many tickets: {}", tickets.len());
        return Err(SafroleError::TooManyExtrinsics);
    }

    let mut bodies = Vec::with_capacity(tickets.len());

    for ticket in tickets {

        if ticket.attempt >= config.ticket_entries_per_validator {
            log::error!("Bad ticket attempt {}", ticket.attempt);
            return Err(SafroleError::BadTicketAttempt);
        }

        let vrf_input = [XT_TICKET_SEAL, &entropy[..], &[ticket.attempt][..]].concat();
        let id = ring
            .ring_vrf_verify(&safrole.ring_commitment, &vrf_input, &[], &ticket.signature)
            .map_err(SafroleError::BadTicketProof)?;

        bodies.push(TicketBody { id, attempt: ticket.attempt });
    }

    for window in bodies.windows(2) {
        if window[0].id == window[1].id {
            return Err(SafroleError::ExtrinsicsNotUnique);
        }
        if window[0].id > window[1].id {
            log::error!("Tickets not sorted: {} > {}", print_hash!(window[0].id), print_hash!(window[1].id));
            return Err(SafroleError::ExtrinsicsNotSorted);
        }
    }

    if bodies.iter().any(|body| safrole.ticket_accumulator.iter().any(|known| known.id == body.id)) {
        log::error!("Ticket already in the accumulator");
        return Err(SafroleError::ExtrinsicsNotUnique);
    }

    Ok(bodies)
}

// The new tickets are inserted in order and only the lowest epoch-length are kept. Every new ticket must survive the
// cut, otherwise the submission did not improve the accumulator.
fn merge_tickets(
    config: &ProtocolConfig,
    accumulator: &TicketAccumulator,
    new_tickets: &[TicketBody],
) -> Result<TicketAccumulator, SafroleError> {

    let mut merged: Vec<TicketBody> = accumulator.iter().chain(new_tickets.iter()).copied().collect();
    merged.sort();

    let capacity = config.epoch_length as usize;
    if merged.len() > capacity {
        let evicted = &merged[capacity..];
        if new_tickets.iter().any(|ticket| evicted.contains(ticket)) {
            log::error!("Submitted tickets do not improve the accumulator");
            return Err(SafroleError::ExtrinsicsTooLow);
        }
        merged.truncate(capacity);
    }

    Ok(accumulator.replace(merged)?)
}

/// Interleaves the sequence from both ends towards the middle.
pub fn outside_in_sequencer<T: Clone>(items: &[T]) -> Vec<T> {

    let mut result = Vec::with_capacity(items.len());
    let (mut i, mut j) = (0, items.len());

    while i < j {
        result.push(items[i].clone());
        i += 1;
        if i < j {
            j -= 1;
            result.push(items[j].clone());
        }
    }

    result
}

// This is the fallback key sequence function which selects an epoch's worth of validator Bandersnatch keys from the
// validator key set using the entropy collected on-chain
pub fn fallback(config: &ProtocolConfig, entropy: &Entropy, validators: &ValidatorsData) -> Vec<BandersnatchPublic> {
    (0..config.epoch_length)
        .map(|i| {
            let hash = blake2(&[&entropy[..], &i.to_le_bytes()].concat());
            let index = u32::from_le_bytes([hash[0], hash[1], hash[2], hash[3]]) as usize % validators.len().max(1);
            validators.get(index).map(|v| v.bandersnatch).unwrap_or_default()
        })
        .collect()
}
