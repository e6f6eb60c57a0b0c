/*
    We retain in state information on the most recent blocks. This is used to preclude the possibility of duplicate
    or out of date work-reports from being submitted.

    For each recent block, we retain its header hash, its state root, the super-peak of the accumulation-result MMR
    after it and the work-package hashes (with their segment roots) of each item reported in it.
*/

use jam_types::{AccumulateRoot, BlockInfo, HeaderHash, RecentBlocks, ReportedPackage, StateRoot};
use utils::common::keccak;
use utils::mmr::{append, super_peak};
use utils::print_hash;

/// The intermediate history the guarantees are checked against. The state root of the last block only becomes known
/// with its child, so it is corrected here from the parent state root of the new header.
pub fn process(recent_history: &RecentBlocks, parent_state_root: &StateRoot) -> RecentBlocks {
    let mut intermediate = recent_history.clone();
    if let Some(last) = intermediate.history.last_mut() {
        log::debug!("State root of block 0x{} is 0x{}", print_hash!(last.header_hash), print_hash!(parent_state_root));
        last.state_root = *parent_state_root;
    }
    intermediate
}

/// Appends the new block. The accumulate root goes into the MMR and the entry records the new super-peak, the
/// packages reported in this block and, for now, a zero state root.
pub fn finalize(
    intermediate: &RecentBlocks,
    header_hash: &HeaderHash,
    accumulate_root: &AccumulateRoot,
    reported: &[ReportedPackage],
) -> RecentBlocks {

    let mmr = append(&intermediate.mmr, *accumulate_root, keccak);
    let beefy_root = super_peak(&mmr);

    let mut history = intermediate.history.clone();
    history.push_evicting(BlockInfo {
        header_hash: *header_hash,
        beefy_root,
        state_root: StateRoot::default(),
        reported: reported.to_vec(),
    });

    log::debug!("Recent history: block 0x{} beefy root 0x{}", print_hash!(header_hash), print_hash!(beefy_root));

    RecentBlocks { history, mmr }
}
