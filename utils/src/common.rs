use std::collections::HashSet;
use std::hash::Hash;

use sp_core::{ed25519, Pair};

use jam_types::{Ed25519Public, Ed25519Signature, OpaqueHash, ValidatorData, ValidatorsData};

pub fn blake2(data: &[u8]) -> OpaqueHash {
    sp_core::blake2_256(data)
}

pub fn keccak(data: &[u8]) -> OpaqueHash {
    sp_core::keccak_256(data)
}

/// Domain separated message: a signing context followed by the payload.
pub fn with_context(context: &[u8], payload: &[u8]) -> Vec<u8> {
    [context, payload].concat()
}

pub fn is_sorted_and_unique<T: PartialOrd>(items: &[T]) -> bool {
    items.windows(2).all(|window| window[0] < window[1])
}

pub fn has_duplicates<T: Eq + Hash>(items: &[T]) -> bool {
    let mut seen = HashSet::new();
    !items.iter().all(|item| seen.insert(item))
}

pub trait VerifySignature {
    fn verify_signature(&self, message: &[u8], public_key: &Ed25519Public) -> bool;
}

impl VerifySignature for Ed25519Signature {

    fn verify_signature(&self, message: &[u8], public_key: &Ed25519Public) -> bool {

        let signature = ed25519::Signature::from_raw(*self);
        let public_key = ed25519::Public::from_raw(*public_key);

        ed25519::Pair::verify(&signature, message, &public_key)
    }
}

/// Replaces the keys of every validator found in `offenders` by the null key.
pub fn set_offenders_null<'a, I>(validators: &mut ValidatorsData, offenders: I)
where
    I: IntoIterator<Item = &'a Ed25519Public>,
{
    for offender in offenders {
        for validator in validators.iter_mut() {
            if validator.ed25519 == *offender {
                log::debug!("Validator {} belongs to offenders set", crate::print_hash!(offender));
                *validator = ValidatorData::default();
            }
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use constants::ProtocolConfig;

    #[test]
    fn sorted_and_unique() {
        assert!(is_sorted_and_unique::<u8>(&[]));
        assert!(is_sorted_and_unique(&[1, 2, 5]));
        assert!(!is_sorted_and_unique(&[1, 1, 5]));
        assert!(!is_sorted_and_unique(&[2, 1]));
        assert!(has_duplicates(&[3, 1, 3]));
        assert!(!has_duplicates(&[3, 1, 2]));
    }

    #[test]
    fn ed25519_signature() {
        let pair = ed25519::Pair::from_seed(&[7u8; 32]);
        let message = with_context(b"jam_available", &[1, 2, 3]);
        let signature: Ed25519Signature = pair.sign(&message).0;
        assert!(signature.verify_signature(&message, &pair.public().0));
        assert!(!signature.verify_signature(&message[1..], &pair.public().0));
        assert!(!signature.verify_signature(&message, &[0u8; 32]));
    }

    #[test]
    fn offenders_are_nulled() {
        let config = ProtocolConfig::tiny();
        let mut validators = ValidatorsData::with_default(&config);
        for (i, validator) in validators.iter_mut().enumerate() {
            validator.ed25519 = [i as u8 + 1; 32];
            validator.bandersnatch = [i as u8 + 1; 32];
        }
        set_offenders_null(&mut validators, &[[2u8; 32], [9u8; 32]]);
        assert_eq!(ValidatorData::default(), validators[1]);
        assert_eq!([1u8; 32], validators[0].bandersnatch);
        assert_eq!(config.validators_count, validators.len());
    }
}
