#[cfg(test)]
mod tests {

    use crate::chain::{init_logger, Chain, SERVICE};
    use jam_types::{Extrinsic, Preimage, RuntimeError, ServiceAccounts};
    use state_controller::{state_root, ApplyContext};
    use utils::common::blake2;

    #[test]
    fn empty_blocks_advance_the_chain() {
        init_logger();
        let mut chain = Chain::genesis();
        let genesis = chain.state.clone();

        for slot in 1..=3 {
            let block = chain.author(slot, Extrinsic::default());
            chain.import(&block).unwrap();
            assert_eq!(block::header_hash(&block.header), chain.parent());
        }

        assert_eq!(3, chain.state.time);
        assert_eq!(3, chain.state.recent_history.history.len());
        assert_ne!(genesis.entropy.0[0], chain.state.entropy.0[0]);
        assert_eq!(genesis.entropy.0[1..], chain.state.entropy.0[1..]);
        // Slots 1, 2 and 3 are sealed by validators 1, 2 and 3
        for author in 1..=3 {
            assert_eq!(1, chain.state.statistics.curr[author].blocks);
        }
        assert_eq!(0, chain.state.statistics.curr[0].blocks);
        // The state root of each block is filled in by its child
        assert_eq!([0; 32], chain.state.recent_history.history[2].state_root);
        assert_ne!([0; 32], chain.state.recent_history.history[1].state_root);
    }

    #[test]
    fn identical_inputs_give_identical_states() {
        let first = Chain::genesis();
        let second = Chain::genesis();
        let block = first.author(1, Extrinsic::default());

        let a = first.apply(&block).unwrap();
        let b = second.apply(&block).unwrap();
        assert_eq!(a, b);
        assert_eq!(state_root(&a), state_root(&b));
    }

    #[test]
    fn header_checks_reject_blocks() {
        init_logger();
        let mut chain = Chain::genesis();
        let first = chain.author(1, Extrinsic::default());
        chain.import(&first).unwrap();
        let before = chain.state.clone();

        // Replaying a block breaks the parent link
        assert!(matches!(chain.apply(&first), Err(RuntimeError::InvalidParentHash)));

        let block = chain.author(2, Extrinsic::default());

        let mut stale = block.clone();
        stale.header.unsigned.slot = 1;
        assert!(matches!(chain.apply(&stale), Err(RuntimeError::HeaderTimeslotTooSmall)));

        let mut wrong_root = block.clone();
        wrong_root.header.unsigned.parent_state_root = [9; 32];
        assert!(matches!(chain.apply(&wrong_root), Err(RuntimeError::InvalidHeaderStateRoot)));

        let mut wrong_extrinsic = block.clone();
        wrong_extrinsic.extrinsic.preimages.push(Preimage { requester: SERVICE, blob: vec![1] });
        assert!(matches!(chain.apply(&wrong_extrinsic), Err(RuntimeError::InvalidExtrinsicHash)));

        let too_early = ApplyContext { timeslot: 1, state_root: chain.root };
        assert!(matches!(chain.runtime.apply(&chain.state, &block, &too_early), Err(RuntimeError::InvalidTimeslot)));

        // Failed imports leave the chain where it was
        assert_eq!(before, chain.state);
        chain.import(&block).unwrap();
    }

    #[test]
    fn seal_must_come_from_the_slot_author() {
        let chain = Chain::genesis();
        let block = chain.author(4, Extrinsic::default());

        let mut other_author = block.clone();
        other_author.header.unsigned.author_index = 5;
        assert!(matches!(chain.apply(&other_author), Err(RuntimeError::InvalidAuthorKey)));

        let mut tampered = block.clone();
        tampered.header.seal = chain.author(5, Extrinsic::default()).header.seal;
        assert!(matches!(chain.apply(&tampered), Err(RuntimeError::InvalidBlockSeal(_))));

        assert!(chain.apply(&block).is_ok());
    }

    #[test]
    fn epoch_change_rotates_validators_and_entropy() {
        init_logger();
        let mut chain = Chain::genesis();
        let block = chain.author(1, Extrinsic::default());
        chain.import(&block).unwrap();
        let before = chain.state.clone();

        let epoch_length = chain.config.epoch_length;
        let block = chain.author(epoch_length, Extrinsic::default());
        let epoch_mark = block.header.unsigned.epoch_mark.clone().unwrap();

        let mut unmarked = block.clone();
        unmarked.header.unsigned.epoch_mark = None;
        assert!(matches!(chain.apply(&unmarked), Err(RuntimeError::InvalidHeaderEpochMarker)));

        chain.import(&block).unwrap();
        assert_eq!(before.entropy.0[0], chain.state.entropy.0[1]);
        assert_eq!(before.entropy.0[1], chain.state.entropy.0[2]);
        assert_eq!(before.entropy.0[2], chain.state.entropy.0[3]);
        assert_eq!(epoch_mark.entropy, chain.state.entropy.0[1]);
        assert_eq!(before.curr_validators, chain.state.prev_validators);
        assert_eq!(before.safrole.next_validators, chain.state.curr_validators);
        // The finished epoch's record moves to the previous slot of the statistics
        assert_eq!(1, chain.state.statistics.prev[1].blocks);
        assert_eq!(1, chain.state.statistics.curr.iter().map(|record| record.blocks).sum::<u32>());
    }

    #[test]
    fn solicited_preimage_is_stored() {
        let mut chain = Chain::genesis();
        let blob = b"requested blob".to_vec();
        let hash = blake2(&blob);
        chain.state.services.set_preimage_info(SERVICE, hash, blob.len() as u32, Some(vec![]));
        chain.root = state_root(&chain.state);

        let extrinsic = Extrinsic { preimages: vec![Preimage { requester: SERVICE, blob: blob.clone() }], ..Default::default() };
        let block = chain.author(1, extrinsic);
        chain.import(&block).unwrap();

        assert_eq!(Some(blob.clone()), chain.state.services.preimage(SERVICE, &hash));
        assert_eq!(Some(vec![1]), chain.state.services.preimage_info(SERVICE, &hash, blob.len() as u32));
        let author = block.header.unsigned.author_index as usize;
        assert_eq!(1, chain.state.statistics.curr[author].preimages);
        assert_eq!(blob.len() as u32, chain.state.statistics.curr[author].preimages_size);
        assert_eq!(1, chain.state.statistics.services[&SERVICE].provided_count);

        // Once provided it may not be provided again
        let again = Extrinsic { preimages: vec![Preimage { requester: SERVICE, blob }], ..Default::default() };
        let block = chain.author(2, again);
        assert!(matches!(chain.apply(&block), Err(RuntimeError::Preimages(_))));
    }
}
