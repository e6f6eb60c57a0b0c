/*
    Merkle Mountain Range of the accumulation outputs. The range is a sequence of optional peaks, peak i covering
    2^i leaves. Appending carries like binary addition, merging two equal-height peaks with the given hash.
*/

use constants::node::MMR_PEAK;
use jam_types::{Hash, Mmr};
use crate::common::keccak;

pub fn append(mmr: &Mmr, leaf: Hash, hash: fn(&[u8]) -> Hash) -> Mmr {

    let mut peaks = mmr.peaks.clone();
    let mut carry = leaf;

    for peak in peaks.iter_mut() {
        match peak.take() {
            None => {
                *peak = Some(carry);
                return Mmr { peaks };
            }
            Some(existing) => {
                carry = hash(&[existing, carry].concat());
            }
        }
    }

    peaks.push(Some(carry));
    Mmr { peaks }
}

fn fold_peaks(peaks: &[Hash]) -> Hash {
    match peaks {
        [] => [0u8; 32],
        [peak] => *peak,
        [prefix @ .., last] => keccak(&[MMR_PEAK, &fold_peaks(prefix)[..], &last[..]].concat()),
    }
}

/// Commitment to the whole range.
pub fn super_peak(mmr: &Mmr) -> Hash {
    let peaks: Vec<Hash> = mmr.peaks.iter().flatten().copied().collect();
    fold_peaks(&peaks)
}
