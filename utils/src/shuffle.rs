use jam_types::Entropy;
use crate::common::blake2;

// The Fisher-Yates shuffle function is defined formally as:
fn fisher_yates_shuffle<T: Clone>(s: &[T], r: &[u32]) -> Vec<T> {

    let mut remaining = s.to_vec();
    let mut result = Vec::with_capacity(s.len());

    for number in r.iter().take(s.len()) {
        let index = *number as usize % remaining.len();
        // The chosen element is replaced by the last one
        result.push(remaining.swap_remove(index));
    }

    result
}

// Since it is often useful to shuffle a sequence based on some random seed in the form of a hash, we provide a secondary
// form of the shuffle function F which accepts a 32-byte hash instead of the numeric sequence
pub fn shuffle<T: Clone>(s: &[T], entropy: &Entropy) -> Vec<T> {
    fisher_yates_shuffle(s, &sequencer(entropy, s.len()))
}

// We define the numeric-sequence-from-hash function, thus:
fn sequencer(entropy: &Entropy, len: usize) -> Vec<u32> {

    let mut sequence = Vec::with_capacity(len);
    let mut hash = [0u8; 32];

    for i in 0..len {
        if i % 8 == 0 {
            let mut payload = entropy.to_vec();
            payload.extend_from_slice(&((i / 8) as u32).to_le_bytes());
            hash = blake2(&payload);
        }
        let start = (4 * i) % 32;
        sequence.push(u32::from_le_bytes([hash[start], hash[start + 1], hash[start + 2], hash[start + 3]]));
    }

    sequence
}

/// Adds `n` to every core index, modulo the number of cores.
pub fn rotate(cores: &[u16], n: u32, cores_count: usize) -> Vec<u16> {
    cores.iter().map(|core| ((*core as u64 + n as u64) % cores_count as u64) as u16).collect()
}
