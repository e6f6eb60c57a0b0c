/*
    The Jam chain does not explicitly issue rewards; we leave this as a job to be done by the staking subsystem (in Polkadot’s case
    envisioned as a system parachain hosted without fees in the current imagining of a public Jam network). However, much as with
    validator punishment information, it is important for the Jam chain to facilitate the arrival of information on validator activity
    in to the staking subsystem so that it may be acted upon.

    Such performance information cannot directly cover all aspects of validator activity; whereas block production, guarantor reports
    and availability assurance can easily be tracked on-chain, Grandpa, Beefy and auditing activity cannot. In the latter case, this is
    instead tracked with validator voting activity: validators vote on their impression of each other’s efforts and a median may be
    accepted as the truth for any given validator. With an assumption of 50% honest validators, this gives an adequate means of oraclizing
    this information.

    The validator statistics are made on a per-epoch basis and we retain one record of completed statistics together with one record which
    serves as an accumulator for the present epoch. Both are tracked in π, which is thus a sequence of two elements, with the first being
    the accumulator and the second the previous epoch’s statistics. For each epoch we track a performance record for each validator.
*/

use constants::node::SEGMENT_SIZE;
use constants::ProtocolConfig;
use jam_types::{
    AccumulationStats, CoresStatistics, Ed25519Public, Extrinsic, ServicesStatistics,
    Statistics, TimeSlot, TransferStats, ValidatorIndex, ValidatorStatistics, ValidatorsData, WorkReport,
};

/// Everything the block contributes to the activity records.
pub struct BlockActivity<'a> {
    pub author_index: ValidatorIndex,
    pub extrinsic: &'a Extrinsic,
    // Guarantors whose credentials were accepted in this block
    pub reporters: &'a [Ed25519Public],
    // Reports made available by this block's assurances
    pub available: &'a [WorkReport],
    pub accumulation_stats: &'a AccumulationStats,
    pub transfer_stats: &'a TransferStats,
}

pub fn process(
    config: &ProtocolConfig,
    statistics: &Statistics,
    curr_validators: &ValidatorsData,
    prior_tau: TimeSlot,
    post_tau: TimeSlot,
    activity: &BlockActivity,
) -> Statistics {

    log::debug!("Process statistics");

    let mut statistics = statistics.clone();

    if config.epoch_of(post_tau) != config.epoch_of(prior_tau) {
        // We are in a new epoch: the accumulator becomes the previous record and starts over
        statistics.prev = statistics.curr.clone();
        statistics.curr = ValidatorStatistics::with_default(config);
    }

    update_validators(&mut statistics.curr, curr_validators, activity);

    // The core and service activity statistics are tracked only on a per-block basis unlike the validator statistics
    // which are tracked over the whole epoch.
    statistics.cores = core_records(config, activity);
    statistics.services = service_records(activity);

    statistics
}

fn update_validators(records: &mut ValidatorStatistics, curr_validators: &ValidatorsData, activity: &BlockActivity) {

    if let Some(author) = records.get_mut(activity.author_index as usize) {
        // The number of blocks produced by the validator
        author.blocks += 1;
        // The number of tickets introduced by the validator
        author.tickets += activity.extrinsic.tickets.len() as u32;
        // The number of preimages introduced and their total size in octets
        for preimage in &activity.extrinsic.preimages {
            author.preimages += 1;
            author.preimages_size = author.preimages_size.saturating_add(preimage.blob.len() as u32);
        }
    }

    for (record, validator) in records.iter_mut().zip(curr_validators.iter()) {
        if activity.reporters.contains(&validator.ed25519) {
            record.guarantees += 1;
        }
    }

    // The number of availability assurances made by the validator
    for assurance in &activity.extrinsic.assurances {
        if let Some(record) = records.get_mut(assurance.validator_index as usize) {
            record.assurances += 1;
        }
    }
}

fn core_records(config: &ProtocolConfig, activity: &BlockActivity) -> CoresStatistics {

    let mut cores = CoresStatistics::with_default(config);

    for guarantee in &activity.extrinsic.guarantees {
        let Some(record) = cores.get_mut(guarantee.report.core_index as usize) else {
            continue;
        };
        for result in &guarantee.report.results {
            record.imports = record.imports.saturating_add(result.refine_load.imports);
            record.extrinsic_count = record.extrinsic_count.saturating_add(result.refine_load.extrinsic_count);
            record.extrinsic_size = record.extrinsic_size.saturating_add(result.refine_load.extrinsic_size);
            record.exports = record.exports.saturating_add(result.refine_load.exports);
            record.gas_used = record.gas_used.saturating_add(result.refine_load.gas_used);
        }
        record.bundle_size = record.bundle_size.saturating_add(guarantee.report.package_spec.length);
    }

    for assurance in &activity.extrinsic.assurances {
        for (core, record) in cores.iter_mut().enumerate() {
            let set = assurance.bitfield.get(core / 8).map_or(false, |byte| byte & (1 << (core % 8)) != 0);
            if set {
                record.popularity = record.popularity.saturating_add(1);
            }
        }
    }

    for report in activity.available {
        if let Some(record) = cores.get_mut(report.core_index as usize) {
            record.da_load = record.da_load.saturating_add(da_load(report));
        }
    }

    cores
}

/// Octets a newly available report places into the audit and segment stores: the bundle plus its exported segments
/// together with their paged proofs.
pub fn da_load(report: &WorkReport) -> u32 {
    let exports = report.package_spec.exports_count as u64;
    let segments = (exports * 65).div_ceil(64);
    let load = report.package_spec.length as u64 + SEGMENT_SIZE as u64 * segments;
    u32::try_from(load).unwrap_or(u32::MAX)
}

fn service_records(activity: &BlockActivity) -> ServicesStatistics {

    let mut services = ServicesStatistics::new();

    for guarantee in &activity.extrinsic.guarantees {
        for result in &guarantee.report.results {
            let entry = services.entry(result.service).or_default();
            entry.refinement_count += 1;
            entry.refinement_gas_used = entry.refinement_gas_used.saturating_add(result.refine_load.gas_used);
            entry.imports += result.refine_load.imports as u32;
            entry.extrinsic_count += result.refine_load.extrinsic_count as u32;
            entry.extrinsic_size = entry.extrinsic_size.saturating_add(result.refine_load.extrinsic_size);
            entry.exports += result.refine_load.exports as u32;
        }
    }

    for preimage in &activity.extrinsic.preimages {
        let entry = services.entry(preimage.requester).or_default();
        entry.provided_count = entry.provided_count.saturating_add(1);
        entry.provided_size = entry.provided_size.saturating_add(preimage.blob.len() as u32);
    }

    for (service, (gas, count)) in activity.accumulation_stats {
        let entry = services.entry(*service).or_default();
        entry.accumulate_count += *count;
        entry.accumulate_gas_used = entry.accumulate_gas_used.saturating_add(*gas);
    }

    for (service, (count, gas)) in activity.transfer_stats {
        let entry = services.entry(*service).or_default();
        entry.on_transfers_count += *count;
        entry.on_transfers_gas_used = entry.on_transfers_gas_used.saturating_add(*gas);
    }

    services
}

#[cfg(test)]
mod test {
    use super::*;
    use jam_types::{Assurance, Guarantee, Preimage, RefineLoad, ServiceActivityRecord, ServiceId, WorkResult};

    fn validators(config: &ProtocolConfig) -> ValidatorsData {
        let mut validators = ValidatorsData::with_default(config);
        for (i, validator) in validators.iter_mut().enumerate() {
            validator.ed25519 = [i as u8 + 1; 32];
        }
        validators
    }

    fn guarantee(core: u16, service: ServiceId, gas_used: u64) -> Guarantee {
        let mut report = WorkReport::default();
        report.core_index = core;
        report.package_spec.length = 100;
        report.results = vec![WorkResult {
            service,
            refine_load: RefineLoad { gas_used, imports: 2, extrinsic_count: 1, extrinsic_size: 10, exports: 3 },
            ..Default::default()
        }];
        Guarantee { report, slot: 0, signatures: vec![] }
    }

    fn assurance(validator_index: ValidatorIndex, bitfield: u8) -> Assurance {
        Assurance { anchor: [0; 32], bitfield: vec![bitfield], validator_index, signature: [0; 64] }
    }

    static NO_ACCUMULATION: AccumulationStats = AccumulationStats::new();
    static NO_TRANSFERS: TransferStats = TransferStats::new();

    fn empty_activity(extrinsic: &Extrinsic) -> BlockActivity<'_> {
        BlockActivity {
            author_index: 2,
            extrinsic,
            reporters: &[],
            available: &[],
            accumulation_stats: &NO_ACCUMULATION,
            transfer_stats: &NO_TRANSFERS,
        }
    }

    #[test]
    fn author_and_validator_counters() {
        let _ = env_logger::builder().is_test(true).try_init();
        let config = ProtocolConfig::tiny();
        let extrinsic = Extrinsic {
            preimages: vec![Preimage { requester: 1, blob: vec![0; 7] }, Preimage { requester: 1, blob: vec![0; 5] }],
            assurances: vec![assurance(0, 0b01), assurance(4, 0b11)],
            ..Default::default()
        };
        let reporters = [[2; 32], [4; 32]];
        let mut activity = empty_activity(&extrinsic);
        activity.reporters = &reporters;

        let post = process(&config, &Statistics::new(&config), &validators(&config), 1, 2, &activity);
        assert_eq!(1, post.curr[2].blocks);
        assert_eq!(2, post.curr[2].preimages);
        assert_eq!(12, post.curr[2].preimages_size);
        assert_eq!(1, post.curr[1].guarantees);
        assert_eq!(1, post.curr[3].guarantees);
        assert_eq!(0, post.curr[0].guarantees);
        assert_eq!(1, post.curr[0].assurances);
        assert_eq!(1, post.curr[4].assurances);
        assert_eq!(2, post.cores[0].popularity);
        assert_eq!(1, post.cores[1].popularity);
        assert_eq!(2, post.services[&1].provided_count);
    }

    #[test]
    fn epoch_change_rotates_records() {
        let config = ProtocolConfig::tiny();
        let extrinsic = Extrinsic::default();
        let activity = empty_activity(&extrinsic);
        let validators = validators(&config);

        let first = process(&config, &Statistics::new(&config), &validators, 10, 11, &activity);
        assert_eq!(1, first.curr[2].blocks);
        assert_eq!(0, first.prev[2].blocks);

        let second = process(&config, &first, &validators, 11, config.epoch_length + 1, &activity);
        assert_eq!(1, second.curr[2].blocks);
        assert_eq!(1, second.prev[2].blocks);
    }

    #[test]
    fn core_and_service_records() {
        let config = ProtocolConfig::tiny();
        let extrinsic = Extrinsic {
            guarantees: vec![guarantee(0, 7, 1000), guarantee(1, 7, 500)],
            ..Default::default()
        };
        let mut available = WorkReport::default();
        available.core_index = 1;
        available.package_spec.length = 50;
        available.package_spec.exports_count = 64;
        let available = [available];

        let accumulation_stats: AccumulationStats = [(7, (300, 2)), (9, (40, 1))].into_iter().collect();
        let transfer_stats: TransferStats = [(9, (3, 60))].into_iter().collect();
        let activity = BlockActivity {
            author_index: 0,
            extrinsic: &extrinsic,
            reporters: &[],
            available: &available,
            accumulation_stats: &accumulation_stats,
            transfer_stats: &transfer_stats,
        };

        let mut prior = Statistics::new(&config);
        prior.services.insert(99, ServiceActivityRecord::default());
        let post = process(&config, &prior, &validators(&config), 1, 2, &activity);

        assert_eq!(1000, post.cores[0].gas_used);
        assert_eq!(2, post.cores[0].imports);
        assert_eq!(100, post.cores[1].bundle_size);
        assert_eq!(50 + SEGMENT_SIZE as u32 * 65, post.cores[1].da_load);
        assert_eq!(0, post.cores[0].da_load);

        let service = &post.services[&7];
        assert_eq!(2, service.refinement_count);
        assert_eq!(1500, service.refinement_gas_used);
        assert_eq!(6, service.exports);
        assert_eq!(2, service.accumulate_count);
        assert_eq!(300, service.accumulate_gas_used);
        assert_eq!(3, post.services[&9].on_transfers_count);
        assert_eq!(60, post.services[&9].on_transfers_gas_used);
        // Per-block records start over
        assert!(!post.services.contains_key(&99));
    }

    #[test]
    fn partial_segment_pages_round_up() {
        let mut report = WorkReport::default();
        report.package_spec.exports_count = 1;
        assert_eq!(SEGMENT_SIZE as u32 * 2, da_load(&report));
    }
}
