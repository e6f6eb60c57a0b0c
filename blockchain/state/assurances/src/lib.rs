/*
    The Assurances Extrinsic. The assurances extrinsic is a sequence of assurance values, at most one per validator. Each
    assurance is a sequence of binary values (i.e. a bitstring), one per core, together with a signature and the index
    of the validator who is assuring. A value of 1 at any given index implies that the validator assures they are
    contributing to its availability.
*/

use codec::Encode;
use constants::node::XT_AVAILABLE;
use constants::ProtocolConfig;
use jam_types::{Assurance, AssurancesError, AvailabilityAssignments, CoreIndex, HeaderHash, TimeSlot, ValidatorsData, WorkReport};
use utils::common::{blake2, with_context, VerifySignature};
use utils::print_hash;

#[derive(Debug, Clone, PartialEq)]
pub struct AssurancesOutput {
    pub availability: AvailabilityAssignments,
    // Reports which became available in this block, in core order
    pub available: Vec<WorkReport>,
}

/// Whether the bit of `core` is set in an assurance bitfield.
pub fn is_core_assured(bitfield: &[u8], core: usize) -> bool {
    bitfield.get(core / 8).map_or(false, |byte| byte & (1 << (core % 8)) != 0)
}

// The signature must be one whose public key is that of the validator assuring and whose message is the
// serialization of the parent hash and the aforementioned bitstring
pub fn assurance_message(parent: &HeaderHash, bitfield: &[u8]) -> Vec<u8> {
    let mut serialization = Vec::with_capacity(32 + bitfield.len());
    parent.encode_to(&mut serialization);
    serialization.extend_from_slice(bitfield);
    with_context(XT_AVAILABLE, &blake2(&serialization))
}

pub fn process(
    config: &ProtocolConfig,
    availability: &AvailabilityAssignments,
    validators: &ValidatorsData,
    assurances: &[Assurance],
    post_tau: TimeSlot,
    parent: &HeaderHash,
) -> Result<AssurancesOutput, AssurancesError> {

    log::debug!("Process {} assurances", assurances.len());

    // Reports which have been pending for too long are dropped, whether or not they become available
    let mut new_availability = availability.clone();
    for (core, assignment) in new_availability.iter_mut().enumerate() {
        let timed_out = assignment
            .as_ref()
            .map_or(false, |pending| pending.timeslot + config.preimage_replacement_period <= post_tau);
        if timed_out {
            log::debug!("Pending report on core {core} timed out");
            *assignment = None;
        }
    }

    for assurance in assurances {
        // The assurances must all be anchored on the parent
        if assurance.anchor != *parent {
            log::error!("Bad assurance anchor 0x{} != parent 0x{}", print_hash!(assurance.anchor), print_hash!(parent));
            return Err(AssurancesError::InvalidAssuranceParentHash);
        }

        let validator = validators
            .get(assurance.validator_index as usize)
            .ok_or(AssurancesError::InvalidValidatorIndex(assurance.validator_index))?;

        if !assurance.signature.verify_signature(&assurance_message(parent, &assurance.bitfield), &validator.ed25519) {
            log::error!("Bad assurance signature from validator {}", assurance.validator_index);
            return Err(AssurancesError::InvalidAssuranceSignature);
        }
    }

    let mut core_marks = vec![0usize; config.cores_count];
    for assurance in assurances {
        for (core, marks) in core_marks.iter_mut().enumerate() {
            if is_core_assured(&assurance.bitfield, core) {
                *marks += 1;
            }
        }
    }

    // A work-report is said to become available if and only if there are a clear super-majority of validators
    // who have marked its core as set within the block's assurance extrinsic
    let mut available = Vec::new();

    for (core, marks) in core_marks.into_iter().enumerate() {
        if marks == 0 {
            continue;
        }
        // A bit may only be set if the corresponding core has a report pending availability on it
        let Some(pending) = &availability[core] else {
            log::error!("Assurance for core {core} which has no pending report");
            return Err(AssurancesError::AssuranceForEmptyCore(core as CoreIndex));
        };
        if marks >= config.two_thirds_plus_one() {
            log::debug!("Report {} on core {core} is now available", print_hash!(pending.report.package_spec.hash));
            available.push(pending.report.clone());
            new_availability[core] = None;
        }
    }

    log::debug!("Assurances processed: {} reports available", available.len());

    Ok(AssurancesOutput { availability: new_availability, available })
}
