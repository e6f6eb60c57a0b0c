/*
    Accumulation may be defined as some function whose arguments are the newly available work-reports together with
    selected portions of (at times partially transitioned) state and which yields the posterior service state together
    with additional state elements.

    The proposition of accumulation is in fact quite simple: we merely wish to execute the Accumulate logic of the
    service code of each of the services which has at least one work output, passing to it the work outputs and useful
    contextual information. However, there are three main complications. Firstly, the execution environment of this
    logic lives behind the AccumulateFunction boundary. Secondly, we must define the amount of gas to be allowed for
    each service's execution. Finally, we must determine the nature of transfers within Accumulate which leads to the
    need for a second entry-point, on-transfer.
*/

use std::collections::{BTreeMap, BTreeSet, HashSet};

use rayon::prelude::*;

use constants::ProtocolConfig;
use jam_types::{
    AccumulateFunction, AccumulateOutput, AccumulateRoot, AccumulatedHistory, AccumulationError, AccumulationOperand,
    AccumulationPartialState, AccumulationStats, Account, AuthQueues, DeferredTransfer, Entropy, Gas, OnTransferFunction,
    OpaqueHash, Privileges, ReadyQueue, ServiceAccounts, ServiceId, Services, State, TimeSlot,
    TransferStats, ValidatorsData, WorkPackageHash, WorkReport,
};
use utils::common::{blake2, keccak};
use utils::print_hash;

mod queue;

pub use queue::{accumulatable_reports, edit_queue, resolve_queue, update_history, update_ready_queue};

/// The external entry-points accumulation runs service code through.
#[derive(Clone, Copy)]
pub struct Invoker<'a> {
    pub accumulate: &'a dyn AccumulateFunction,
    pub on_transfer: &'a dyn OnTransferFunction,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AccumulationOutput {
    pub root: AccumulateRoot,
    pub services: Services,
    pub validator_queue: ValidatorsData,
    pub auth_queues: AuthQueues,
    pub privileges: Privileges,
    pub ready_queue: ReadyQueue,
    pub accumulation_history: AccumulatedHistory,
    pub accumulation_stats: AccumulationStats,
    pub transfer_stats: TransferStats,
}

// Result of the outer accumulation
#[derive(Debug)]
struct OuterOutput {
    accumulated: usize,
    state: AccumulationPartialState,
    transfers: Vec<DeferredTransfer>,
    commitments: BTreeSet<(ServiceId, OpaqueHash)>,
    gas_used: Vec<(ServiceId, Gas)>,
}

// Result of one parallelized accumulation
#[derive(Debug)]
struct BatchOutput {
    state: AccumulationPartialState,
    transfers: Vec<DeferredTransfer>,
    commitments: BTreeSet<(ServiceId, OpaqueHash)>,
    gas_used: Vec<(ServiceId, Gas)>,
}

pub fn process(
    config: &ProtocolConfig,
    invoker: Invoker,
    state: &State,
    available: &[WorkReport],
    post_tau: TimeSlot,
    entropy: &Entropy,
) -> Result<AccumulationOutput, AccumulationError> {

    log::debug!("Process accumulation of {} available reports", available.len());

    let slot_index = (post_tau % config.epoch_length) as usize;
    let (accumulatable, mut new_queue_items) =
        accumulatable_reports(available, &state.ready_queue, &state.accumulation_history, slot_index);

    log::debug!("{} accumulatable reports", accumulatable.len());

    let initial = AccumulationPartialState {
        services: state.services.clone(),
        validator_queue: state.validator_queue.clone(),
        auth_queues: state.auth_queues.clone(),
        privileges: state.privileges.clone(),
    };

    let gas_limit = gas_limit(config, &state.privileges);
    let outer = outer_accumulation(config, invoker, initial, &accumulatable, &state.privileges.always_acc, gas_limit, post_tau, entropy)?;

    let AccumulationPartialState { mut services, validator_queue, auth_queues, privileges } = outer.state;
    let accumulated = &accumulatable[..outer.accumulated];

    let transfer_stats = process_transfers(config, invoker, &mut services, &outer.transfers, post_tau)?;

    // The last-accumulation record is updated for all accumulated services
    let mut accumulation_stats = AccumulationStats::new();
    for (service, gas) in &outer.gas_used {
        let items = accumulated
            .iter()
            .flat_map(|report| report.results.iter())
            .filter(|result| result.service == *service)
            .count() as u32;
        if items == 0 {
            continue;
        }
        let entry = accumulation_stats.entry(*service).or_insert((0, items));
        entry.0 += *gas;
    }
    for service in accumulation_stats.keys() {
        if let Some(mut info) = services.service_info(*service) {
            info.last_acc = post_tau;
            services.set_service_info(*service, info);
        }
    }

    let accumulated_hashes: Vec<WorkPackageHash> = accumulated.iter().map(|report| report.package_spec.hash).collect();
    let mut accumulation_history = state.accumulation_history.clone();
    update_history(&mut accumulation_history, &accumulated_hashes);

    let accumulated_set: HashSet<WorkPackageHash> = accumulated_hashes.iter().copied().collect();
    edit_queue(&mut new_queue_items, &accumulated_set);
    let mut ready_queue = state.ready_queue.clone();
    update_ready_queue(&mut ready_queue, new_queue_items, &accumulated_set, state.time, post_tau, slot_index);

    let root = accumulate_root(&outer.commitments);
    log::debug!("Accumulated {} reports, root 0x{}", outer.accumulated, print_hash!(root));

    Ok(AccumulationOutput {
        root,
        services,
        validator_queue,
        auth_queues,
        privileges,
        ready_queue,
        accumulation_history,
        accumulation_stats,
        transfer_stats,
    })
}

/// The gas limit for the whole block: enough for every core plus the privileged services, and never below the
/// total accumulation gas.
pub fn gas_limit(config: &ProtocolConfig, privileges: &Privileges) -> Gas {
    let privileged: Gas = privileges.always_acc.values().fold(0, |acc, gas| acc.saturating_add(*gas));
    let cores = config.work_report_accumulation_gas.saturating_mul(config.cores_count as Gas).saturating_add(privileged);
    std::cmp::max(config.total_accumulation_gas, cores)
}

/// Number of leading reports whose cumulative gas fits the limit.
pub fn fitting_prefix(reports: &[WorkReport], gas_limit: Gas) -> usize {
    let mut total: Gas = 0;
    for (i, report) in reports.iter().enumerate() {
        let report_gas = report.results.iter().fold(0 as Gas, |acc, result| acc.saturating_add(result.gas));
        total = total.saturating_add(report_gas);
        if total > gas_limit {
            return i;
        }
    }
    reports.len()
}

/// Index of the first service a service creates while accumulating, derived from the accumulating service, the fresh
/// entropy and the timeslot.
pub fn initial_service_index(service: ServiceId, entropy: &Entropy, timeslot: TimeSlot) -> ServiceId {
    let mut payload = Vec::with_capacity(40);
    payload.extend_from_slice(&service.to_le_bytes());
    payload.extend_from_slice(entropy);
    payload.extend_from_slice(&timeslot.to_le_bytes());
    let hash = blake2(&payload);
    let value = u32::from_le_bytes([hash[0], hash[1], hash[2], hash[3]]);
    (value % (u32::MAX - (1 << 9) + 1)) + (1 << 8)
}

/// Keccak balanced Merkle root of the (service, commitment) pairs, ordered by service.
pub fn accumulate_root(commitments: &BTreeSet<(ServiceId, OpaqueHash)>) -> AccumulateRoot {
    let leaves: Vec<Vec<u8>> = commitments
        .iter()
        .map(|(service, hash)| [&service.to_le_bytes()[..], &hash[..]].concat())
        .collect();
    utils::trie::merkle_balanced(&leaves, keccak)
}

// The outer accumulation function. Takes the longest prefix which fits the remaining gas, accumulates it in
// parallel, and moves on to the rest. Privileged gas is only granted to the first batch.
#[allow(clippy::too_many_arguments)]
fn outer_accumulation(
    config: &ProtocolConfig,
    invoker: Invoker,
    state: AccumulationPartialState,
    reports: &[WorkReport],
    always_acc: &BTreeMap<ServiceId, Gas>,
    gas_limit: Gas,
    timeslot: TimeSlot,
    entropy: &Entropy,
) -> Result<OuterOutput, AccumulationError> {

    let mut output = OuterOutput {
        accumulated: 0,
        state,
        transfers: Vec::new(),
        commitments: BTreeSet::new(),
        gas_used: Vec::new(),
    };
    let mut remaining_gas = gas_limit;
    let mut privileged_gas = always_acc.clone();
    let mut remaining = reports;

    loop {
        let count = fitting_prefix(remaining, remaining_gas);
        if count == 0 {
            log::debug!("Outer accumulation done after {} reports", output.accumulated);
            break;
        }

        let batch = parallelized_accumulation(config, invoker, &output.state, &remaining[..count], &privileged_gas, timeslot, entropy)?;
        let batch_gas: Gas = batch.gas_used.iter().fold(0, |acc, (_, gas)| acc.saturating_add(*gas));

        output.accumulated += count;
        output.state = batch.state;
        output.transfers.extend(batch.transfers);
        output.commitments.extend(batch.commitments);
        output.gas_used.extend(batch.gas_used);

        remaining_gas = remaining_gas.saturating_sub(batch_gas);
        privileged_gas.clear();
        remaining = &remaining[count..];
    }

    Ok(output)
}

// Changes one service's accumulation made to the accounts, relative to the batch snapshot
#[derive(Default)]
struct AccountChanges {
    new: BTreeMap<ServiceId, Account>,
    altered: BTreeMap<ServiceId, Account>,
    removed: BTreeSet<ServiceId>,
}

impl AccountChanges {

    fn diff(before: &Services, after: &Services) -> Self {
        let mut changes = AccountChanges::default();
        for (id, account) in &after.accounts {
            match before.get(*id) {
                None => { changes.new.insert(*id, account.clone()); }
                Some(old) if old != account => { changes.altered.insert(*id, account.clone()); }
                Some(_) => {}
            }
        }
        changes.removed = before.accounts.keys().filter(|id| !after.contains(**id)).copied().collect();
        changes
    }

    // Different services may not each contribute the same index for a new, altered or removed service
    fn merge(&mut self, other: AccountChanges) -> Result<(), AccumulationError> {
        if let Some(id) = other.new.keys().find(|id| self.new.contains_key(*id)) {
            return Err(AccumulationError::DuplicatedServiceIndex(*id));
        }
        if let Some(id) = other.altered.keys().find(|id| self.altered.contains_key(*id)) {
            return Err(AccumulationError::DuplicatedContributionToService(*id));
        }
        if let Some(id) = other.removed.iter().find(|id| self.removed.contains(*id)) {
            return Err(AccumulationError::DuplicatedRemovedService(*id));
        }
        self.new.extend(other.new);
        self.altered.extend(other.altered);
        self.removed.extend(other.removed);
        Ok(())
    }

    fn apply(self, services: &mut Services) {
        for (id, account) in self.new.into_iter().chain(self.altered) {
            services.insert(id, account);
        }
        for id in self.removed {
            services.remove_service(id);
        }
    }
}

// The parallelized accumulation function. Every service of the batch runs against the same snapshot; their
// outputs are merged once all of them are done.
fn parallelized_accumulation(
    config: &ProtocolConfig,
    invoker: Invoker,
    state: &AccumulationPartialState,
    reports: &[WorkReport],
    privileged_gas: &BTreeMap<ServiceId, Gas>,
    timeslot: TimeSlot,
    entropy: &Entropy,
) -> Result<BatchOutput, AccumulationError> {

    let mut services: Vec<ServiceId> = Vec::new();
    let mut seen = HashSet::new();
    let referenced = reports.iter().flat_map(|report| report.results.iter().map(|result| result.service));
    for service in referenced.chain(privileged_gas.keys().copied()) {
        if seen.insert(service) {
            services.push(service);
        }
    }

    log::debug!("Parallelized accumulation of services {services:?}");

    let outputs: Vec<(ServiceId, AccumulateOutput)> = services
        .par_iter()
        .map(|service| {
            single_accumulation(config, invoker.accumulate, state, reports, *service, privileged_gas, timeslot, entropy)
                .map(|output| (*service, output))
        })
        .collect::<Result<_, _>>()?;

    let mut batch = BatchOutput {
        state: state.clone(),
        transfers: Vec::new(),
        commitments: BTreeSet::new(),
        gas_used: Vec::with_capacity(outputs.len()),
    };
    let mut changes = AccountChanges::default();
    let mut provided: Vec<(ServiceId, Vec<u8>)> = Vec::new();

    for (service, output) in outputs {
        batch.gas_used.push((service, output.gas_used));
        if let Some(hash) = output.commitment {
            batch.commitments.insert((service, hash));
        }
        batch.transfers.extend(output.transfers);
        provided.extend(output.provided);

        changes.merge(AccountChanges::diff(&state.services, &output.state.services))?;

        // Privileged services alter the parts of the state they are in charge of
        if service == state.privileges.empower {
            batch.state.privileges = output.state.privileges.clone();
        }
        if service == state.privileges.assign {
            batch.state.auth_queues = output.state.auth_queues.clone();
        }
        if service == state.privileges.designate {
            batch.state.validator_queue = output.state.validator_queue.clone();
        }
    }

    changes.apply(&mut batch.state.services);
    integrate_preimages(&mut batch.state.services, &provided, timeslot);

    Ok(batch)
}

// The single-service accumulation function
#[allow(clippy::too_many_arguments)]
fn single_accumulation(
    config: &ProtocolConfig,
    accumulate: &dyn AccumulateFunction,
    state: &AccumulationPartialState,
    reports: &[WorkReport],
    service: ServiceId,
    privileged_gas: &BTreeMap<ServiceId, Gas>,
    timeslot: TimeSlot,
    entropy: &Entropy,
) -> Result<AccumulateOutput, AccumulationError> {

    let mut gas = privileged_gas.get(&service).copied().unwrap_or(0);
    let mut operands = Vec::new();

    for report in reports {
        for result in report.results.iter().filter(|result| result.service == service) {
            gas = gas.saturating_add(result.gas);
            operands.push(AccumulationOperand {
                package_hash: report.package_spec.hash,
                exports_root: report.package_spec.exports_root,
                authorizer_hash: report.authorizer_hash,
                payload_hash: result.payload_hash,
                gas_limit: result.gas,
                result: result.result.clone(),
                auth_output: report.auth_output.clone(),
            });
        }
    }

    // A service without an account or without its code available accumulates nothing
    let code = state
        .services
        .service_info(service)
        .and_then(|info| state.services.preimage(service, &info.code_hash));
    let Some(code) = code else {
        log::warn!("No code for service {service}, skipping accumulation");
        return Ok(AccumulateOutput {
            state: state.clone(),
            transfers: Vec::new(),
            commitment: None,
            gas_used: 0,
            provided: Vec::new(),
        });
    };

    log::debug!("Accumulate service {service} with {} operands and {gas} gas", operands.len());

    let output = accumulate
        .invoke(config, service, &code, state, gas, &operands, initial_service_index(service, entropy, timeslot), timeslot)
        .map_err(|source| AccumulationError::Invocation { service, source })?;

    log::trace!("Service {service} used {} gas", output.gas_used);
    Ok(output)
}

// The preimage integration. Provisions into services which no longer exist or whose request was dropped are
// disregarded.
fn integrate_preimages(services: &mut Services, provided: &[(ServiceId, Vec<u8>)], timeslot: TimeSlot) {
    for (service, blob) in provided {
        let hash = blake2(blob);
        let length = blob.len() as u32;
        let requested = services.preimage_info(*service, &hash, length).map_or(false, |slots| slots.is_empty());
        if requested {
            log::debug!("Service {service} provided preimage 0x{}", print_hash!(hash));
            services.set_preimage_info(*service, hash, length, Some(vec![timeslot]));
            services.set_preimage(*service, hash, Some(blob.clone()));
        }
    }
}

// Deferred transfers are grouped by destination, ordered by source within each group. The destination is credited
// with the whole batch and then its on-transfer entry-point runs once.
fn process_transfers(
    config: &ProtocolConfig,
    invoker: Invoker,
    services: &mut Services,
    transfers: &[DeferredTransfer],
    timeslot: TimeSlot,
) -> Result<TransferStats, AccumulationError> {

    let mut groups: BTreeMap<ServiceId, Vec<DeferredTransfer>> = BTreeMap::new();
    for transfer in transfers {
        groups.entry(transfer.to).or_default().push(transfer.clone());
    }

    let mut stats = TransferStats::new();

    for (destination, mut batch) in groups {
        batch.sort_by_key(|transfer| transfer.from);

        let Some(mut info) = services.service_info(destination) else {
            log::error!("Transfer to unknown service {destination}");
            return Err(AccumulationError::InvalidServiceIndex(destination));
        };
        let amount = batch.iter().fold(0u64, |acc, transfer| acc.saturating_add(transfer.amount));
        info.balance = info.balance.saturating_add(amount);
        services.set_service_info(destination, info);

        let gas_used = invoker
            .on_transfer
            .invoke(config, destination, services, timeslot, &batch)
            .map_err(|source| AccumulationError::OnTransfer { service: destination, source })?;

        log::debug!("Service {destination} received {} transfers, used {gas_used} gas", batch.len());
        stats.insert(destination, (batch.len() as u32, gas_used));
    }

    Ok(stats)
}
