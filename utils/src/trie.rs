/*
    State Merklization involves transforming the serialized mapping into a cryptographic commitment. We define this
    commitment as the root of the binary Patricia Merkle Trie with a format optimized for modern compute hardware,
    primarily by optimizing sizes to fit succinctly into typical memory layouts and reducing the need for unpredictable
    branching. The balanced binary Merkle tree used by the accumulation and reports commitments lives here too.
*/

use std::collections::BTreeMap;

use constants::node::MERKLE_NODE;
use jam_types::{OpaqueHash, StateKey};
use crate::common::blake2;

fn bit(k: &[u8], i: usize) -> bool {
    (k[i >> 3] & (1 << (7 - (i & 7)))) != 0
}

fn branch(l: &OpaqueHash, r: &OpaqueHash) -> [u8; 64] {
    let mut node = [0u8; 64];
    // Each node is either a branch or a leaf. The first bit discriminates between these two types.
    // Use the last 255 bits of the 0-bit (left) sub-trie identity
    node[..32].copy_from_slice(l);
    node[0] &= 0x7f;
    // Use the full 256 bits of the 1-bit (right) sub-trie identity
    node[32..].copy_from_slice(r);
    node
}

fn leaf(k: &StateKey, v: &[u8]) -> [u8; 64] {
    let mut node = [0u8; 64];
    // Leaf nodes are further subdivided into embedded-value leaves and regular leaves.
    // The second bit of the node discriminates between these.
    if v.len() <= 32 {
        // The remaining 6 bits of the first byte store the embedded value size
        node[0] = 0b1000_0000 | v.len() as u8;
        node[1..32].copy_from_slice(k);
        // Zero padded value
        node[32..32 + v.len()].copy_from_slice(v);
    } else {
        node[0] = 0b1100_0000;
        node[1..32].copy_from_slice(k);
        node[32..].copy_from_slice(&blake2(v));
    }
    node
}

// The entries are sorted by key, so the ones going left at depth i always precede the ones going right
fn merkle(kvs: &[(&StateKey, &Vec<u8>)], i: usize) -> OpaqueHash {
    match kvs {
        // Empty (sub-)tries are identified as the zero hash
        [] => [0u8; 32],
        [(k, v)] => blake2(&leaf(k, v)),
        _ => {
            let split = kvs.partition_point(|(k, _)| !bit(&k[..], i));
            let left = merkle(&kvs[..split], i + 1);
            let right = merkle(&kvs[split..], i + 1);
            blake2(&branch(&left, &right))
        }
    }
}

/// Root of the serialized state.
pub fn merkle_state(state: &BTreeMap<StateKey, Vec<u8>>) -> OpaqueHash {
    let kvs: Vec<(&StateKey, &Vec<u8>)> = state.iter().collect();
    merkle(&kvs, 0)
}

fn node(items: &[Vec<u8>], hash: fn(&[u8]) -> OpaqueHash) -> Vec<u8> {
    match items {
        [] => vec![0u8; 32],
        [item] => item.clone(),
        _ => {
            let mid = (items.len() + 1) / 2;
            let mut payload = MERKLE_NODE.to_vec();
            payload.extend_from_slice(&node(&items[..mid], hash));
            payload.extend_from_slice(&node(&items[mid..], hash));
            hash(&payload).to_vec()
        }
    }
}

/// Well-balanced binary Merkle root of a sequence of blobs.
pub fn merkle_balanced(items: &[Vec<u8>], hash: fn(&[u8]) -> OpaqueHash) -> OpaqueHash {
    if let [item] = items {
        return hash(item);
    }
    let root = node(items, hash);
    let mut result = [0u8; 32];
    result.copy_from_slice(&root[..32]);
    result
}
