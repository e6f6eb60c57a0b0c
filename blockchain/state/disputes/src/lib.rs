/*
    The disputes extrinsic may contain one or more verdicts v as a compilation of judgments coming from exactly
    two-thirds plus one of either the active validator set or the previous epoch's validator set, i.e. the Ed25519
    keys of κ or λ. Additionally, it may contain proofs of the misbehavior of one or more validators, either by
    guaranteeing a work-report found to be invalid (culprits), or by signing a judgment found to be contradiction
    to a work-report's validity (faults). Both are considered a kind of offense.
*/

use std::collections::BTreeSet;

use codec::Encode;
use constants::node::{XT_GUARANTEE, XT_INVALID, XT_VALID};
use constants::ProtocolConfig;
use jam_types::{
    AvailabilityAssignments, Culprit, DisputesError, DisputesExtrinsic, DisputesRecords, Ed25519Public, Fault, OffendersMark,
    State, ValidatorsData, Verdict, WorkReportHash,
};
use utils::common::{blake2, is_sorted_and_unique, with_context, VerifySignature};
use utils::print_hash;

#[derive(Debug, Clone, PartialEq)]
pub struct DisputesOutput {
    pub records: DisputesRecords,
    // Pending reports with the ones judged not good removed
    pub availability: AvailabilityAssignments,
    // Keys punished by this extrinsic, culprits first
    pub offenders: OffendersMark,
}

// The judgement signing context depends on the direction of the vote
fn vote_message(vote: bool, target: &WorkReportHash) -> Vec<u8> {
    let context = if vote { XT_VALID } else { XT_INVALID };
    with_context(context, target)
}

pub fn process(config: &ProtocolConfig, state: &State, extrinsic: &DisputesExtrinsic) -> Result<DisputesOutput, DisputesError> {

    let mut output = DisputesOutput {
        records: state.disputes.clone(),
        availability: state.availability.clone(),
        offenders: OffendersMark::new(),
    };

    if extrinsic.verdicts.is_empty() && extrinsic.culprits.is_empty() && extrinsic.faults.is_empty() {
        return Ok(output);
    }

    log::debug!("Process disputes: {} verdicts, {} culprits, {} faults",
        extrinsic.verdicts.len(), extrinsic.culprits.len(), extrinsic.faults.len());

    let epoch = config.epoch_of(state.time);
    let tallies = process_verdicts(config, state, epoch, &extrinsic.verdicts)?;

    // We require the total of valid judgements to be either exactly two-thirds-plus-one, zero or one-third of the
    // validator set, indicating respectively that the report is good, that it's bad, or that it's wonky
    let mut new_good = BTreeSet::new();
    let mut new_bad = BTreeSet::new();
    let mut new_wonky = BTreeSet::new();

    for (target, count) in tallies {
        if count == config.two_thirds_plus_one() {
            // Any verdict containing solely valid judgements implies the same report having at least one valid
            // entry in the faults sequence
            if !extrinsic.faults.iter().any(|fault| fault.target == target) {
                log::error!("Good verdict on {} without faults", print_hash!(target));
                return Err(DisputesError::ExpectInFaults);
            }
            new_good.insert(target);
        } else if count == 0 {
            // Any verdict containing solely invalid judgements implies the same report having at least two valid
            // entries in the culprits sequence
            if extrinsic.culprits.iter().filter(|culprit| culprit.target == target).count() < 2 {
                log::error!("Bad verdict on {} without two culprits", print_hash!(target));
                return Err(DisputesError::ExpectInCulprits);
            }
            new_bad.insert(target);
        } else if count == config.one_third() {
            new_wonky.insert(target);
        } else {
            log::error!("Bad vote split on {}: {count} valid judgements", print_hash!(target));
            return Err(DisputesError::InvalidJudgementsCount);
        }
    }

    let bad_set: BTreeSet<WorkReportHash> = state.disputes.bad.union(&new_bad).copied().collect();
    let good_set: BTreeSet<WorkReportHash> = state.disputes.good.union(&new_good).copied().collect();

    // Offenders may be drawn from the current or the previous validator set, and can't be punished twice
    let allowed_keys: BTreeSet<Ed25519Public> = state.curr_validators.iter()
        .chain(state.prev_validators.iter())
        .map(|validator| validator.ed25519)
        .filter(|key| !state.disputes.offenders.contains(key))
        .collect();

    let culprit_keys = process_culprits(&extrinsic.culprits, &bad_set, &allowed_keys)?;
    let fault_keys = process_faults(&extrinsic.faults, &bad_set, &good_set, &allowed_keys)?;

    // The judged reports which are not good are no longer pending
    for assignment in output.availability.iter_mut() {
        let judged = match assignment {
            Some(pending) => {
                let hash = blake2(&pending.report.encode());
                new_bad.contains(&hash) || new_wonky.contains(&hash)
            }
            None => false,
        };
        if judged {
            log::debug!("Pending report on a disputed core removed");
            *assignment = None;
        }
    }

    output.records.good.extend(new_good);
    output.records.bad.extend(new_bad);
    output.records.wonky.extend(new_wonky);

    for key in culprit_keys.into_iter().chain(fault_keys) {
        output.records.offenders.insert(key);
        output.offenders.push(key);
    }

    log::debug!("Disputes processed, {} new offenders", output.offenders.len());
    Ok(output)
}

// Returns, for every verdict, its report hash and the number of valid judgements
fn process_verdicts(
    config: &ProtocolConfig,
    state: &State,
    epoch: u32,
    verdicts: &[Verdict],
) -> Result<Vec<(WorkReportHash, usize)>, DisputesError> {

    // Verdicts must be ordered by report hash
    let targets: Vec<WorkReportHash> = verdicts.iter().map(|verdict| verdict.target).collect();
    if !is_sorted_and_unique(&targets) {
        return Err(DisputesError::VerdictsNotSortedUnique);
    }

    // There may be no duplicate report hashes within the extrinsic, nor amongst any past reported hashes
    let records = &state.disputes;
    if targets.iter().any(|target| records.good.contains(target) || records.bad.contains(target) || records.wonky.contains(target)) {
        return Err(DisputesError::DuplicatedReport);
    }

    let mut tallies = Vec::with_capacity(verdicts.len());

    for verdict in verdicts {

        // Verdicts come from either the active validator set or the previous epoch's validator set
        let validators: &ValidatorsData = if verdict.age == epoch {
            &state.curr_validators
        } else if epoch.checked_sub(1) == Some(verdict.age) {
            &state.prev_validators
        } else {
            log::error!("Verdict age {} with current epoch {epoch}", verdict.age);
            return Err(DisputesError::InvalidEpoch);
        };

        if verdict.votes.len() != config.two_thirds_plus_one() {
            return Err(DisputesError::InvalidJudgementsCount);
        }

        // The judgements of all verdicts must be ordered by validator index and there may be no duplicates
        let indices: Vec<_> = verdict.votes.iter().map(|vote| vote.index).collect();
        if !is_sorted_and_unique(&indices) {
            return Err(DisputesError::JudgementsNotSortedUnique);
        }

        for vote in &verdict.votes {
            let validator = validators.get(vote.index as usize).ok_or(DisputesError::InvalidValidatorIndex(vote.index))?;
            if !vote.signature.verify_signature(&vote_message(vote.vote, &verdict.target), &validator.ed25519) {
                log::error!("Bad judgement signature from validator {}", vote.index);
                return Err(DisputesError::InvalidJudgementSignature);
            }
        }

        tallies.push((verdict.target, verdict.votes.iter().filter(|vote| vote.vote).count()));
    }

    Ok(tallies)
}

fn process_culprits(
    culprits: &[Culprit],
    bad_set: &BTreeSet<WorkReportHash>,
    allowed_keys: &BTreeSet<Ed25519Public>,
) -> Result<Vec<Ed25519Public>, DisputesError> {

    // Culprits must be ordered by Ed25519 keys
    let keys: Vec<Ed25519Public> = culprits.iter().map(|culprit| culprit.key).collect();
    if !is_sorted_and_unique(&keys) {
        return Err(DisputesError::CulpritsNotSortedUnique);
    }

    for culprit in culprits {

        if !bad_set.contains(&culprit.target) {
            return Err(DisputesError::InvalidCulprit);
        }

        if !allowed_keys.contains(&culprit.key) {
            log::error!("Culprit key {} not allowed", print_hash!(culprit.key));
            return Err(DisputesError::InvalidCulpritSigner);
        }

        // A culprit proves the guarantee of a report judged bad
        if !culprit.signature.verify_signature(&with_context(XT_GUARANTEE, &culprit.target), &culprit.key) {
            return Err(DisputesError::InvalidCulpritSignature);
        }
    }

    Ok(keys)
}

fn process_faults(
    faults: &[Fault],
    bad_set: &BTreeSet<WorkReportHash>,
    good_set: &BTreeSet<WorkReportHash>,
    allowed_keys: &BTreeSet<Ed25519Public>,
) -> Result<Vec<Ed25519Public>, DisputesError> {

    // Faults must be ordered by Ed25519 keys
    let keys: Vec<Ed25519Public> = faults.iter().map(|fault| fault.key).collect();
    if !is_sorted_and_unique(&keys) {
        return Err(DisputesError::FaultsNotSortedUnique);
    }

    for fault in faults {

        // A fault is a judgement contradicting the verdict
        let is_bad = bad_set.contains(&fault.target);
        let is_good = good_set.contains(&fault.target);
        let contradicts = if fault.vote { is_bad && !is_good } else { is_good && !is_bad };
        if !contradicts {
            log::error!("Fault on {} agrees with the verdict", print_hash!(fault.target));
            return Err(DisputesError::InvalidFaults);
        }

        if !allowed_keys.contains(&fault.key) {
            return Err(DisputesError::InvalidFaultSigner);
        }

        if !fault.signature.verify_signature(&vote_message(fault.vote, &fault.target), &fault.key) {
            return Err(DisputesError::InvalidFaultSignature);
        }
    }

    Ok(keys)
}
