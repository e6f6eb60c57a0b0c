use codec::{Encode, EncodeLen};
use codec::generic_codec::encode_unsigned;
use jam_types::{Extrinsic, Guarantee, OpaqueHash};
use utils::common::blake2;

// Guarantees are committed to through the hash of their report rather than the report itself
fn guarantees_blob(guarantees: &[Guarantee]) -> Vec<u8> {

    let mut blob: Vec<u8> = Vec::with_capacity(guarantees.len() * (32 + 4 + 1 + 3 * 66));
    encode_unsigned(guarantees.len()).encode_to(&mut blob);

    for guarantee in guarantees.iter() {

        blake2(&guarantee.report.encode()).encode_to(&mut blob);
        guarantee.slot.encode_to(&mut blob);
        encode_unsigned(guarantee.signatures.len()).encode_to(&mut blob);

        for signature in &guarantee.signatures {
            signature.validator_index.encode_to(&mut blob);
            signature.signature.encode_to(&mut blob);
        }
    }

    blob
}

/// The commitment to the extrinsic carried by the header.
pub fn extrinsic_hash(extrinsic: &Extrinsic) -> OpaqueHash {

    let parts = [
        blake2(&extrinsic.tickets.encode_len()),
        blake2(&extrinsic.preimages.encode_len()),
        blake2(&guarantees_blob(&extrinsic.guarantees)),
        blake2(&extrinsic.assurances.encode_len()),
        blake2(&extrinsic.disputes.encode()),
    ]
    .concat();

    blake2(&parts)
}
