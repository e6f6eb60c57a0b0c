// Reporting and assurance are the two on-chain processes we do to allow the results of in-core computation to make
// its way into the service state singleton. A work-package, which comprises several work items, is transformed
// by validators acting as guarantors into its corresponding work-report, which similarly comprises several work outputs
// and then presented on-chain within the guarantees extrinsic. At this point, the work-package is erasure coded into a
// multitude of segments and each segment distributed to the associated validator who then attests to its availability
// through an assurance placed on-chain. After enough assurances the work-report is considered available, and the work
// outputs transform the state of their associated service by virtue of accumulation. The report may also be timed-out,
// implying it may be replaced by another report without accumulation.

// From the perspective of the work-report, therefore, the guarantee happens first and the assurance afterwards. However,
// from the perspective of a block's state transition, the assurances are best processed first since each core may only
// have a single work-report pending its package becoming available at a time. This crate covers the second half: the
// guarantees extrinsic is checked against the intermediate availability state left behind by the assurances.

use std::collections::{BTreeMap, BTreeSet, HashSet};

use codec::Encode;
use constants::node::XT_GUARANTEE;
use constants::ProtocolConfig;
use jam_types::{
    AccumulatedHistory, AuthPools, AvailabilityAssignment, AvailabilityAssignments, CoreIndex, Ed25519Public, Entropy,
    EntropyPool, ExportsRoot, Guarantee, GuaranteeingError, ReadyQueue, RecentBlocks, ReportedPackage, ServiceAccounts,
    TimeSlot, ValidatorsData, WorkPackageHash, WorkReport,
};
use utils::common::{blake2, set_offenders_null, with_context, VerifySignature};
use utils::print_hash;
use utils::shuffle::{rotate, shuffle};

/// The parts of the state the guarantees are checked against.
pub struct GuaranteesContext<'a> {
    // Posterior entropy pool, after the safrole stage
    pub entropy: &'a EntropyPool,
    pub curr_validators: &'a ValidatorsData,
    pub prev_validators: &'a ValidatorsData,
    // Posterior punish set, after the disputes stage
    pub offenders: &'a BTreeSet<Ed25519Public>,
    // Availability left by the assurances stage
    pub availability: &'a AvailabilityAssignments,
    pub auth_pools: &'a AuthPools,
    // History as it was before this block is appended
    pub recent_history: &'a RecentBlocks,
    pub ready_queue: &'a ReadyQueue,
    pub accumulation_history: &'a AccumulatedHistory,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ReportsOutput {
    pub availability: AvailabilityAssignments,
    // Newly reported packages, ordered by package hash
    pub reported: Vec<ReportedPackage>,
    // Ed25519 keys of every guarantor which signed a report, sorted and unique
    pub reporters: Vec<Ed25519Public>,
}

/// Core assigned to every validator index for the rotation in which `slot` falls.
pub fn core_assignment(config: &ProtocolConfig, entropy: &Entropy, slot: TimeSlot) -> Vec<CoreIndex> {
    let validators = config.validators_count;
    let source: Vec<CoreIndex> = (0..validators).map(|i| (config.cores_count * i / validators) as CoreIndex).collect();
    let rotation = (slot % config.epoch_length) / config.rotation_period;
    rotate(&shuffle(&source, entropy), rotation, config.cores_count)
}

/// Assignment together with the guarantor keys it applies to. Offenders' keys are nulled so their signatures never
/// verify.
#[derive(Debug, Clone, PartialEq)]
pub struct GuarantorAssignments {
    pub cores: Vec<CoreIndex>,
    pub keys: Vec<Ed25519Public>,
}

fn guarantor_keys(validators: &ValidatorsData, offenders: &BTreeSet<Ed25519Public>) -> Vec<Ed25519Public> {
    let mut validators = validators.clone();
    set_offenders_null(&mut validators, offenders.iter());
    validators.iter().map(|validator| validator.ed25519).collect()
}

/// Assignments of the rotation containing `post_tau`.
pub fn current_assignments(config: &ProtocolConfig, ctx: &GuaranteesContext, post_tau: TimeSlot) -> GuarantorAssignments {
    GuarantorAssignments {
        cores: core_assignment(config, &ctx.entropy.0[2], post_tau),
        keys: guarantor_keys(ctx.curr_validators, ctx.offenders),
    }
}

/// Assignments of the previous rotation. When that rotation belongs to the previous epoch, the previous epoch's
/// entropy and validator set apply.
pub fn previous_assignments(config: &ProtocolConfig, ctx: &GuaranteesContext, post_tau: TimeSlot) -> GuarantorAssignments {
    let epoch_changing = post_tau % config.epoch_length < config.rotation_period;
    let (entropy, validators) = if epoch_changing {
        (&ctx.entropy.0[3], ctx.prev_validators)
    } else {
        (&ctx.entropy.0[2], ctx.curr_validators)
    };
    GuarantorAssignments {
        cores: core_assignment(config, entropy, post_tau.saturating_sub(config.rotation_period)),
        keys: guarantor_keys(validators, ctx.offenders),
    }
}

pub fn guarantee_message(report: &WorkReport) -> Vec<u8> {
    with_context(XT_GUARANTEE, &blake2(&report.encode()))
}

pub fn process<S: ServiceAccounts>(
    config: &ProtocolConfig,
    ctx: &GuaranteesContext,
    services: &S,
    post_tau: TimeSlot,
    guarantees: &[Guarantee],
) -> Result<ReportsOutput, GuaranteeingError> {

    log::debug!("Process {} guarantees at slot {post_tau}", guarantees.len());

    let mut new_availability = ctx.availability.clone();

    if guarantees.is_empty() {
        return Ok(ReportsOutput { availability: new_availability, reported: Vec::new(), reporters: Vec::new() });
    }

    let current = current_assignments(config, ctx, post_tau);
    let previous = previous_assignments(config, ctx, post_tau);

    let mut package_hashes: HashSet<WorkPackageHash> = HashSet::new();
    let mut reporters: BTreeSet<Ed25519Public> = BTreeSet::new();

    for guarantee in guarantees {
        let report = &guarantee.report;
        let core = report.core_index;

        if guarantee.slot > post_tau {
            log::error!("Future report slot {} > {post_tau}", guarantee.slot);
            return Err(GuaranteeingError::FutureReportSlot);
        }

        // Guarantees older than the previous rotation can't be checked against any known assignment
        if config.rotation_period * (post_tau / config.rotation_period).saturating_sub(1) > guarantee.slot {
            log::error!("Guarantee slot {} is before the previous rotation", guarantee.slot);
            return Err(GuaranteeingError::ReportEpochBeforeLast);
        }

        // Two reports of the same package in one extrinsic
        if !package_hashes.insert(report.package_spec.hash) {
            log::error!("Package 0x{} reported twice", print_hash!(report.package_spec.hash));
            return Err(GuaranteeingError::DuplicatedWorkPackage);
        }

        // The signing validators must be assigned to the core in question in either this block if the timeslot for
        // the guarantee is in the same rotation as this block's timeslot, or in the most recent previous set of
        // assignments
        let assignments = if guarantee.slot / config.rotation_period == post_tau / config.rotation_period {
            &current
        } else {
            &previous
        };

        let message = guarantee_message(report);

        for credential in &guarantee.signatures {
            let index = credential.validator_index as usize;
            let key = assignments.keys.get(index).ok_or(GuaranteeingError::InvalidValidatorIndex(credential.validator_index))?;

            if !credential.signature.verify_signature(&message, key) {
                log::error!("Bad guarantee signature from validator {index}");
                return Err(GuaranteeingError::InvalidGuaranteeSignature);
            }

            // TODO: decide whether a guarantor of the last core in the previous rotation may also report here
            if assignments.cores.get(index) != Some(&core) {
                log::error!("Validator {index} is not assigned to core {core}");
                return Err(GuaranteeingError::InvalidGuaranteeCore(core));
            }

            reporters.insert(*key);
        }

        // No reports may be placed on cores with a report pending availability on it, unless it timed out
        let pending = new_availability.get(core as usize).ok_or(GuaranteeingError::InvalidGuaranteeCore(core))?;
        if let Some(pending) = pending {
            if post_tau < pending.timeslot + config.preimage_replacement_period {
                log::error!("Core {core} is engaged by report 0x{}", print_hash!(pending.report.package_spec.hash));
                return Err(GuaranteeingError::CoreNotAvailable(core));
            }
        }

        // The authorizer hash must be present in the authorizer pool of the core on which the work is reported
        let authorized = ctx.auth_pools.get(core as usize).map_or(false, |pool| pool.contains(&report.authorizer_hash));
        if !authorized {
            log::error!("Authorizer 0x{} not in the pool of core {core}", print_hash!(report.authorizer_hash));
            return Err(GuaranteeingError::InvalidReportAuthorizer(core));
        }

        let mut total_gas = 0u64;
        for result in &report.results {
            let info = services.service_info(result.service).ok_or(GuaranteeingError::InvalidServiceIndex(result.service))?;

            if info.code_hash != result.code_hash {
                log::error!("Code hash mismatch for service {}", result.service);
                return Err(GuaranteeingError::InvalidResultCodeHash(result.service));
            }

            if result.gas < info.acc_min_gas {
                log::error!("Gas {} below the minimum {} of service {}", result.gas, info.acc_min_gas, result.service);
                return Err(GuaranteeingError::InvalidServiceGas(result.service));
            }

            total_gas = total_gas.saturating_add(result.gas);
        }

        if total_gas > config.work_report_accumulation_gas {
            log::error!("Report 0x{} needs {total_gas} gas", print_hash!(report.package_spec.hash));
            return Err(GuaranteeingError::OutOfGas);
        }
    }

    // We require that the work-package of the report not be the work-package of some other report made in the past.
    // We ensure that the work-package not appear anywhere within our pipeline.
    let recent_packages: BTreeMap<WorkPackageHash, ExportsRoot> = ctx
        .recent_history
        .history
        .iter()
        .flat_map(|block| block.reported.iter())
        .map(|package| (package.work_package_hash, package.segment_tree_root))
        .collect();

    let mut pipeline: HashSet<WorkPackageHash> = recent_packages.keys().copied().collect();
    pipeline.extend(ctx.accumulation_history.iter().flatten());
    pipeline.extend(ctx.ready_queue.iter().flatten().flat_map(|record| record.report.context.prerequisites.iter()));
    pipeline.extend(ctx.availability.iter().flatten().flat_map(|pending| pending.report.context.prerequisites.iter()));

    if let Some(duplicated) = package_hashes.iter().find(|hash| pipeline.contains(*hash)) {
        log::error!("Package 0x{} already in the pipeline", print_hash!(duplicated));
        return Err(GuaranteeingError::DuplicatedWorkPackage);
    }

    // Segment roots known from recent history and from this extrinsic
    let mut known_roots = recent_packages.clone();
    for guarantee in guarantees {
        known_roots.entry(guarantee.report.package_spec.hash).or_insert(guarantee.report.package_spec.exports_root);
    }

    for guarantee in guarantees {
        check_context(config, ctx, post_tau, &guarantee.report)?;

        let report = &guarantee.report;
        let dependencies = report
            .context
            .prerequisites
            .iter()
            .chain(report.segment_root_lookup.iter().map(|item| &item.work_package_hash));

        for dependency in dependencies {
            if !recent_packages.contains_key(dependency) && !package_hashes.contains(dependency) {
                log::error!("Prerequisite 0x{} not found", print_hash!(dependency));
                return Err(GuaranteeingError::PrerequisiteNotFound);
            }
        }

        for item in &report.segment_root_lookup {
            if known_roots.get(&item.work_package_hash) != Some(&item.segment_tree_root) {
                log::error!("Segment root lookup of 0x{} does not match", print_hash!(item.work_package_hash));
                return Err(GuaranteeingError::InvalidSegmentLookup);
            }
        }
    }

    let mut reported = Vec::with_capacity(guarantees.len());
    for guarantee in guarantees {
        let report = &guarantee.report;
        new_availability[report.core_index as usize] = Some(AvailabilityAssignment { report: report.clone(), timeslot: post_tau });
        reported.push(ReportedPackage {
            work_package_hash: report.package_spec.hash,
            segment_tree_root: report.package_spec.exports_root,
        });
    }
    reported.sort_by_key(|package| package.work_package_hash);

    log::debug!("{} reports placed by {} guarantors", reported.len(), reporters.len());

    Ok(ReportsOutput { availability: new_availability, reported, reporters: reporters.into_iter().collect() })
}

// We require that the anchor block be within the last blocks and that its details be correct by ensuring that it
// appears within our most recent blocks, and that the lookup anchor is not too old
fn check_context(config: &ProtocolConfig, ctx: &GuaranteesContext, post_tau: TimeSlot, report: &WorkReport) -> Result<(), GuaranteeingError> {
    let context = &report.context;

    let Some(anchor) = ctx.recent_history.history.iter().find(|block| block.header_hash == context.anchor) else {
        log::error!("Anchor 0x{} not recent", print_hash!(context.anchor));
        return Err(GuaranteeingError::InvalidContext);
    };

    if anchor.state_root != context.state_root {
        log::error!("Bad state root 0x{} != 0x{}", print_hash!(anchor.state_root), print_hash!(context.state_root));
        return Err(GuaranteeingError::InvalidContext);
    }

    if anchor.beefy_root != context.beefy_root {
        log::error!("Bad beefy root 0x{} != 0x{}", print_hash!(anchor.beefy_root), print_hash!(context.beefy_root));
        return Err(GuaranteeingError::InvalidContext);
    }

    if (context.lookup_anchor_slot as i64) < post_tau as i64 - config.max_lookup_anchor_age as i64 {
        log::error!("Lookup anchor slot {} too old", context.lookup_anchor_slot);
        return Err(GuaranteeingError::InvalidContext);
    }

    Ok(())
}

#[cfg(test)]
mod test {
    use super::*;
    use jam_types::{Account, BlockInfo, ReadyRecord, ServiceInfo, Services, ValidatorSignature, AuthPool, BoundedVec};
    use sp_core::{ed25519, Pair};

    const ENTROPY: Entropy = [7; 32];
    const AUTHORIZER: [u8; 32] = [3; 32];
    const ANCHOR: [u8; 32] = [1; 32];

    struct Fixture {
        config: ProtocolConfig,
        pairs: Vec<ed25519::Pair>,
        validators: ValidatorsData,
        entropy: EntropyPool,
        offenders: BTreeSet<Ed25519Public>,
        availability: AvailabilityAssignments,
        auth_pools: AuthPools,
        recent_history: RecentBlocks,
        ready_queue: ReadyQueue,
        accumulation_history: AccumulatedHistory,
        services: Services,
    }

    impl Fixture {
        fn new() -> Self {
            let config = ProtocolConfig::tiny();
            let pairs: Vec<ed25519::Pair> = (0..6u8).map(|i| ed25519::Pair::from_seed(&[i + 20; 32])).collect();
            let mut validators = ValidatorsData::with_default(&config);
            for (i, pair) in pairs.iter().enumerate() {
                validators[i].ed25519 = pair.public().0;
            }
            let pool: AuthPool = BoundedVec::new(&config, vec![AUTHORIZER]).unwrap();
            let mut recent_history = RecentBlocks::new(&config);
            recent_history.history.push(BlockInfo { header_hash: ANCHOR, beefy_root: [2; 32], state_root: [4; 32], reported: vec![] }).unwrap();
            let mut services = Services::default();
            services.insert(0, Account::new(ServiceInfo { acc_min_gas: 10, ..Default::default() }));

            Fixture {
                availability: AvailabilityAssignments::with_default(&config),
                auth_pools: AuthPools::filled(&config, pool),
                ready_queue: ReadyQueue::with_default(&config),
                accumulation_history: AccumulatedHistory::with_default(&config),
                entropy: EntropyPool([ENTROPY; 4]),
                offenders: BTreeSet::new(),
                config,
                pairs,
                validators,
                recent_history,
                services,
            }
        }

        fn ctx(&self) -> GuaranteesContext<'_> {
            GuaranteesContext {
                entropy: &self.entropy,
                curr_validators: &self.validators,
                prev_validators: &self.validators,
                offenders: &self.offenders,
                availability: &self.availability,
                auth_pools: &self.auth_pools,
                recent_history: &self.recent_history,
                ready_queue: &self.ready_queue,
                accumulation_history: &self.accumulation_history,
            }
        }

        fn report(&self, core: CoreIndex, package: u8) -> WorkReport {
            let mut report = WorkReport::default();
            report.core_index = core;
            report.package_spec.hash = [package; 32];
            report.authorizer_hash = AUTHORIZER;
            report.context.anchor = ANCHOR;
            report.context.beefy_root = [2; 32];
            report.context.state_root = [4; 32];
            report.results[0].gas = 100;
            report
        }

        // Signed by the validators assigned to the report's core in the current rotation
        fn guarantee(&self, report: WorkReport, slot: TimeSlot) -> Guarantee {
            let cores = core_assignment(&self.config, &ENTROPY, slot);
            let message = guarantee_message(&report);
            let signatures = cores
                .iter()
                .enumerate()
                .filter(|(_, core)| **core == report.core_index)
                .map(|(index, _)| ValidatorSignature { validator_index: index as u16, signature: self.pairs[index].sign(&message).0 })
                .collect();
            Guarantee { report, slot, signatures }
        }
    }

    #[test]
    fn assignment_covers_every_core() {
        let config = ProtocolConfig::tiny();
        let cores = core_assignment(&config, &ENTROPY, 0);
        assert_eq!(config.validators_count, cores.len());
        for core in 0..config.cores_count as CoreIndex {
            assert_eq!(3, cores.iter().filter(|c| **c == core).count());
        }
        // One rotation later every validator moves to the next core
        let rotated = core_assignment(&config, &ENTROPY, config.rotation_period);
        assert!(cores.iter().zip(&rotated).all(|(a, b)| (*a + 1) % 2 == *b));
    }

    #[test]
    fn report_is_placed() {
        let _ = env_logger::builder().is_test(true).try_init();
        let f = Fixture::new();
        let guarantee = f.guarantee(f.report(1, 9), 5);
        let output = process(&f.config, &f.ctx(), &f.services, 6, &[guarantee.clone()]).unwrap();

        assert_eq!(Some(6), output.availability[1].as_ref().map(|pending| pending.timeslot));
        assert_eq!(vec![ReportedPackage { work_package_hash: [9; 32], segment_tree_root: [0; 32] }], output.reported);
        let mut expected: Vec<Ed25519Public> = guarantee.signatures.iter().map(|s| f.validators[s.validator_index as usize].ed25519).collect();
        expected.sort();
        assert_eq!(expected, output.reporters);
    }

    #[test]
    fn package_in_recent_history_is_rejected() {
        let mut f = Fixture::new();
        f.recent_history.history[0].reported.push(ReportedPackage { work_package_hash: [9; 32], segment_tree_root: [0; 32] });
        let guarantee = f.guarantee(f.report(1, 9), 5);
        let result = process(&f.config, &f.ctx(), &f.services, 6, &[guarantee]);
        assert_eq!(Err(GuaranteeingError::DuplicatedWorkPackage), result);
    }

    #[test]
    fn package_in_accumulation_history_is_rejected() {
        let mut f = Fixture::new();
        f.accumulation_history[3] = vec![[9; 32]];
        let guarantee = f.guarantee(f.report(1, 9), 5);
        assert_eq!(Err(GuaranteeingError::DuplicatedWorkPackage), process(&f.config, &f.ctx(), &f.services, 6, &[guarantee]));
    }

    #[test]
    fn package_awaited_by_ready_queue_is_rejected() {
        let mut f = Fixture::new();
        let mut waiting = f.report(0, 8);
        waiting.context.prerequisites = vec![[9; 32]];
        f.ready_queue[2] = vec![ReadyRecord { report: waiting, dependencies: vec![[9; 32]] }];
        let guarantee = f.guarantee(f.report(1, 9), 5);
        assert_eq!(Err(GuaranteeingError::DuplicatedWorkPackage), process(&f.config, &f.ctx(), &f.services, 6, &[guarantee]));
    }

    #[test]
    fn package_awaited_by_pending_report_is_rejected() {
        let mut f = Fixture::new();
        let mut pending = f.report(0, 8);
        pending.context.prerequisites = vec![[9; 32]];
        f.availability[0] = Some(AvailabilityAssignment { report: pending, timeslot: 4 });
        let guarantee = f.guarantee(f.report(1, 9), 5);
        assert_eq!(Err(GuaranteeingError::DuplicatedWorkPackage), process(&f.config, &f.ctx(), &f.services, 6, &[guarantee]));

        // Without the dependency the same guarantee goes through
        if let Some(pending) = f.availability[0].as_mut() {
            pending.report.context.prerequisites.clear();
        }
        let guarantee = f.guarantee(f.report(1, 9), 5);
        assert!(process(&f.config, &f.ctx(), &f.services, 6, &[guarantee]).is_ok());
    }

    #[test]
    fn signatures_and_assignment() {
        let mut f = Fixture::new();
        let mut guarantee = f.guarantee(f.report(1, 9), 5);
        guarantee.signatures[0].signature = [0; 64];
        assert_eq!(Err(GuaranteeingError::InvalidGuaranteeSignature), process(&f.config, &f.ctx(), &f.services, 6, &[guarantee]));

        // Signed for core 1 by the guarantors of core 1, but claims core 0
        let good = f.guarantee(f.report(1, 9), 5);
        let mut wrong_core = good.clone();
        wrong_core.report.core_index = 0;
        let message = guarantee_message(&wrong_core.report);
        for signature in wrong_core.signatures.iter_mut() {
            signature.signature = f.pairs[signature.validator_index as usize].sign(&message).0;
        }
        assert_eq!(Err(GuaranteeingError::InvalidGuaranteeCore(0)), process(&f.config, &f.ctx(), &f.services, 6, &[wrong_core]));

        // An offender's signature never verifies
        f.offenders.insert(f.validators[good.signatures[0].validator_index as usize].ed25519);
        assert_eq!(Err(GuaranteeingError::InvalidGuaranteeSignature), process(&f.config, &f.ctx(), &f.services, 6, &[good]));
    }

    #[test]
    fn previous_rotation_uses_previous_assignment() {
        let f = Fixture::new();
        // Slot 3 belongs to the rotation before slot 5, so the guarantors of that rotation sign
        let guarantee = f.guarantee(f.report(1, 9), 3);
        assert!(process(&f.config, &f.ctx(), &f.services, 5, &[guarantee.clone()]).is_ok());

        // The same credentials dated in the current rotation point at the other core. Only the exact assigned
        // core is accepted, even for guarantors who moved at the rotation boundary.
        let mut moved = guarantee;
        moved.slot = 4;
        assert_eq!(Err(GuaranteeingError::InvalidGuaranteeCore(1)), process(&f.config, &f.ctx(), &f.services, 5, &[moved]));
    }

    #[test]
    fn slots_and_core_availability() {
        let mut f = Fixture::new();
        let guarantee = f.guarantee(f.report(1, 9), 7);
        assert_eq!(Err(GuaranteeingError::FutureReportSlot), process(&f.config, &f.ctx(), &f.services, 6, &[guarantee]));

        let old = f.guarantee(f.report(1, 9), 1);
        assert_eq!(Err(GuaranteeingError::ReportEpochBeforeLast), process(&f.config, &f.ctx(), &f.services, 9, &[old]));

        f.availability[1] = Some(AvailabilityAssignment { report: f.report(1, 8), timeslot: 4 });
        let guarantee = f.guarantee(f.report(1, 9), 5);
        assert_eq!(Err(GuaranteeingError::CoreNotAvailable(1)), process(&f.config, &f.ctx(), &f.services, 6, &[guarantee]));
    }

    #[test]
    fn service_gas_checks() {
        let f = Fixture::new();
        let mut report = f.report(1, 9);
        report.results[0].gas = 5;
        let guarantee = f.guarantee(report, 5);
        assert_eq!(Err(GuaranteeingError::InvalidServiceGas(0)), process(&f.config, &f.ctx(), &f.services, 6, &[guarantee]));

        let mut report = f.report(1, 9);
        report.results[0].gas = f.config.work_report_accumulation_gas + 1;
        let guarantee = f.guarantee(report, 5);
        assert_eq!(Err(GuaranteeingError::OutOfGas), process(&f.config, &f.ctx(), &f.services, 6, &[guarantee]));

        let mut report = f.report(1, 9);
        report.results[0].service = 5;
        let guarantee = f.guarantee(report, 5);
        assert_eq!(Err(GuaranteeingError::InvalidServiceIndex(5)), process(&f.config, &f.ctx(), &f.services, 6, &[guarantee]));
    }

    #[test]
    fn context_and_dependencies() {
        let f = Fixture::new();
        let mut report = f.report(1, 9);
        report.context.state_root = [0; 32];
        let guarantee = f.guarantee(report, 5);
        assert_eq!(Err(GuaranteeingError::InvalidContext), process(&f.config, &f.ctx(), &f.services, 6, &[guarantee]));

        let mut report = f.report(1, 9);
        report.context.prerequisites = vec![[42; 32]];
        let guarantee = f.guarantee(report, 5);
        assert_eq!(Err(GuaranteeingError::PrerequisiteNotFound), process(&f.config, &f.ctx(), &f.services, 6, &[guarantee]));

        // A prerequisite reported in the same extrinsic is fine
        let mut first = f.report(0, 42);
        first.package_spec.exports_root = [5; 32];
        let mut second = f.report(1, 9);
        second.context.prerequisites = vec![[42; 32]];
        second.segment_root_lookup = vec![jam_types::SegmentRootLookupItem { work_package_hash: [42; 32], segment_tree_root: [6; 32] }];
        let guarantees = [f.guarantee(first.clone(), 5), f.guarantee(second.clone(), 5)];
        assert_eq!(Err(GuaranteeingError::InvalidSegmentLookup), process(&f.config, &f.ctx(), &f.services, 6, &guarantees));

        second.segment_root_lookup[0].segment_tree_root = [5; 32];
        let guarantees = [f.guarantee(first, 5), f.guarantee(second, 5)];
        let output = process(&f.config, &f.ctx(), &f.services, 6, &guarantees).unwrap();
        assert_eq!(2, output.reported.len());
        assert_eq!([9; 32], output.reported[0].work_package_hash);

        // Lookups also resolve against packages reported in recent blocks
        let mut f = Fixture::new();
        f.recent_history.history[0].reported.push(ReportedPackage { work_package_hash: [42; 32], segment_tree_root: [5; 32] });
        let mut report = f.report(1, 9);
        report.segment_root_lookup = vec![jam_types::SegmentRootLookupItem { work_package_hash: [42; 32], segment_tree_root: [5; 32] }];
        assert!(process(&f.config, &f.ctx(), &f.services, 6, &[f.guarantee(report.clone(), 5)]).is_ok());

        report.segment_root_lookup[0].segment_tree_root = [6; 32];
        assert_eq!(Err(GuaranteeingError::InvalidSegmentLookup), process(&f.config, &f.ctx(), &f.services, 6, &[f.guarantee(report, 5)]));
    }
}
