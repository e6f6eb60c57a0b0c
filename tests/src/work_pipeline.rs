#[cfg(test)]
mod tests {

    use crate::chain::{init_logger, Chain, AUTHORIZER, CODE, COUNTER_KEY, SERVICE};
    use jam_types::{
        Assurance, CoreIndex, Extrinsic, GuaranteeingError, Guarantee, RefineContext, RefineLoad, RuntimeError,
        ServiceAccounts, TimeSlot, ValidatorSignature, WorkExecResult, WorkPackageHash, WorkPackageSpec, WorkReport,
        WorkResult,
    };
    use utils::common::blake2;

    const PACKAGE: WorkPackageHash = [0x5A; 32];

    // A report of one item for the counter service, anchored on the chain head
    fn report(chain: &Chain, core: CoreIndex, package: WorkPackageHash) -> WorkReport {
        let head = chain.state.recent_history.history.last().unwrap();
        WorkReport {
            package_spec: WorkPackageSpec { hash: package, length: 1_000, exports_root: [0x11; 32], exports_count: 2, ..Default::default() },
            context: RefineContext {
                anchor: head.header_hash,
                state_root: chain.root,
                beefy_root: head.beefy_root,
                lookup_anchor: head.header_hash,
                lookup_anchor_slot: chain.state.time,
                prerequisites: Vec::new(),
            },
            core_index: core,
            authorizer_hash: AUTHORIZER,
            results: vec![WorkResult {
                service: SERVICE,
                code_hash: blake2(CODE),
                payload_hash: [0x22; 32],
                gas: 1_000,
                result: WorkExecResult::Ok(vec![1, 2, 3]),
                refine_load: RefineLoad { gas_used: 500, imports: 1, extrinsic_count: 1, extrinsic_size: 64, exports: 2 },
            }],
            ..Default::default()
        }
    }

    // Signed by the first two validators assigned to the report's core at `slot`
    fn guarantee(chain: &Chain, report: WorkReport, slot: TimeSlot) -> (Guarantee, Vec<usize>) {
        let cores = reports::core_assignment(&chain.config, &chain.state.entropy.0[2], slot);
        let guarantors: Vec<usize> = (0..cores.len()).filter(|i| cores[*i] == report.core_index).take(2).collect();
        let message = reports::guarantee_message(&report);
        let signatures = guarantors
            .iter()
            .map(|index| ValidatorSignature { validator_index: *index as u16, signature: chain.sign(*index, &message) })
            .collect();
        (Guarantee { report, slot, signatures }, guarantors)
    }

    fn assure_all(chain: &Chain, bitfield: u8) -> Vec<Assurance> {
        let parent = chain.parent();
        (0..chain.config.validators_count)
            .map(|index| Assurance {
                anchor: parent,
                bitfield: vec![bitfield],
                validator_index: index as u16,
                signature: chain.sign(index, &assurances::assurance_message(&parent, &[bitfield])),
            })
            .collect()
    }

    // Block 1 is empty, block 2 reports the package on core 0
    fn reported_chain() -> (Chain, Vec<usize>) {
        init_logger();
        let mut chain = Chain::genesis();
        let block = chain.author(1, Extrinsic::default());
        chain.import(&block).unwrap();

        let (guarantee, guarantors) = guarantee(&chain, report(&chain, 0, PACKAGE), 2);
        let block = chain.author(2, Extrinsic { guarantees: vec![guarantee], ..Default::default() });
        chain.import(&block).unwrap();
        (chain, guarantors)
    }

    #[test]
    fn guaranteed_report_waits_for_availability() {
        let (chain, guarantors) = reported_chain();
        let state = &chain.state;

        let pending = state.availability[0].as_ref().unwrap();
        assert_eq!(PACKAGE, pending.report.package_spec.hash);
        assert_eq!(2, pending.timeslot);
        assert!(state.availability[1].is_none());

        let head = state.recent_history.history.last().unwrap();
        assert_eq!(1, head.reported.len());
        assert_eq!(PACKAGE, head.reported[0].work_package_hash);

        for (index, record) in state.statistics.curr.iter().enumerate() {
            assert_eq!(guarantors.contains(&index) as u32, record.guarantees);
        }
        assert_eq!(1_000, state.statistics.cores[0].bundle_size);
        assert_eq!(500, state.statistics.cores[0].gas_used);
        assert_eq!(1, state.statistics.services[&SERVICE].refinement_count);

        // Every block appends the queued authorizer; core 0 also consumed one
        assert_eq!(&[AUTHORIZER; 2], &state.auth_pools[0][..]);
        assert_eq!(&[AUTHORIZER; 3], &state.auth_pools[1][..]);
        assert!(chain.service.calls.lock().unwrap().is_empty());
    }

    #[test]
    fn assured_report_is_accumulated() {
        let (mut chain, _) = reported_chain();
        let beefy_before = chain.state.recent_history.history.last().unwrap().beefy_root;

        let block = chain.author(3, Extrinsic { assurances: assure_all(&chain, 0b01), ..Default::default() });
        chain.import(&block).unwrap();
        let state = &chain.state;

        assert!(state.availability[0].is_none());
        assert_eq!(vec![(SERVICE, 1)], *chain.service.calls.lock().unwrap());
        assert_eq!(Some(vec![1]), state.services.storage(SERVICE, COUNTER_KEY));
        assert_eq!(3, state.services.service_info(SERVICE).unwrap().last_acc);
        assert_eq!(&vec![PACKAGE], state.accumulation_history.last().unwrap());

        let stats = &state.statistics;
        assert_eq!(1, stats.services[&SERVICE].accumulate_count);
        assert_eq!(250, stats.services[&SERVICE].accumulate_gas_used);
        assert!(stats.cores[0].da_load > 1_000);
        assert_eq!(6, stats.cores[0].popularity);
        assert!(stats.curr.iter().all(|record| record.assurances == 1));

        // The service's commitment moves the beefy root
        assert_ne!(beefy_before, state.recent_history.history.last().unwrap().beefy_root);
    }

    #[test]
    fn package_can_only_be_reported_once() {
        let (chain, _) = reported_chain();

        // Core 0 is still waiting for availability
        let (again, _) = guarantee(&chain, report(&chain, 0, [0x77; 32]), 3);
        let block = chain.author(3, Extrinsic { guarantees: vec![again], ..Default::default() });
        assert!(matches!(chain.apply(&block), Err(RuntimeError::Guaranteeing(GuaranteeingError::CoreNotAvailable(0)))));

        // The package is in the recent history
        let (duplicate, _) = guarantee(&chain, report(&chain, 1, PACKAGE), 3);
        let block = chain.author(3, Extrinsic { guarantees: vec![duplicate], ..Default::default() });
        assert!(matches!(chain.apply(&block), Err(RuntimeError::Guaranteeing(GuaranteeingError::DuplicatedWorkPackage))));
    }

    #[test]
    fn guarantee_needs_assigned_signers() {
        init_logger();
        let mut chain = Chain::genesis();
        let block = chain.author(1, Extrinsic::default());
        chain.import(&block).unwrap();

        let (mut guarantee, guarantors) = guarantee(&chain, report(&chain, 0, PACKAGE), 2);
        let outsider = (0..chain.config.validators_count).find(|index| !guarantors.contains(index)).unwrap();
        let message = reports::guarantee_message(&guarantee.report);
        guarantee.signatures[1] = ValidatorSignature { validator_index: outsider as u16, signature: chain.sign(outsider, &message) };
        guarantee.signatures.sort_by_key(|signature| signature.validator_index);

        let block = chain.author(2, Extrinsic { guarantees: vec![guarantee], ..Default::default() });
        assert!(matches!(chain.apply(&block), Err(RuntimeError::Guaranteeing(GuaranteeingError::InvalidGuaranteeCore(0)))));
    }
}
