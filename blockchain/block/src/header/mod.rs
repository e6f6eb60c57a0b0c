// The header comprises a parent hash and prior state root, an extrinsic hash, a time-slot index, the epoch, winning-tickets and
// offenders markers, and, a Bandersnatch block author index and two Bandersnatch signatures; the entropy-yielding, vrf signature,
// and a block seal. Excepting the Genesis header, all block headers H have an associated parent header, whose hash is Hp.

use codec::Encode;
use constants::node::{XT_ENTROPY, XT_FALLBACK_SEAL, XT_TICKET_SEAL};
use jam_types::{
    BandersnatchError, BandersnatchPublic, Entropy, Header, HeaderHash, OpaqueHash, RuntimeError, TicketsOrKeys, UnsignedHeader,
};
use utils::bandersnatch::{ietf_vrf_verify, Prover};
use utils::common::blake2;

pub fn header_hash(header: &Header) -> HeaderHash {
    blake2(&header.encode())
}

/// VRF input of the seal for the slot at `phase` of the epoch.
pub fn seal_context(seal_keys: &TicketsOrKeys, entropy: &Entropy, phase: usize) -> Vec<u8> {
    match seal_keys {
        // The context is "jam_ticket_seal" + entropy[3] + ticket_attempt
        TicketsOrKeys::Tickets(tickets) => {
            let attempt = tickets.get(phase).map(|ticket| ticket.attempt).unwrap_or_default();
            [XT_TICKET_SEAL, &entropy[..], &[attempt][..]].concat()
        }
        // The context is "jam_fallback_seal" + entropy[3]
        TicketsOrKeys::Keys(_) => [XT_FALLBACK_SEAL, &entropy[..]].concat(),
    }
}

// The header must contain a valid seal and valid vrf output. These are two signatures both using the current slot's
// seal key; the message data of the former is the header's serialization omitting the seal component, whereas the
// latter is used as a bias-resistant entropy source and thus its message must already have been fixed: we use the
// entropy stemming from the vrf of the seal signature.
//
// Sealing using the ticket is of greater security, and we utilize this knowledge when determining a candidate block
// on which to extend the chain. On success the entropy-source VRF output is returned.
pub fn seal_verify(
    header: &Header,
    seal_keys: &TicketsOrKeys,
    entropy: &Entropy,
    author_key: &BandersnatchPublic,
    phase: usize,
) -> Result<OpaqueHash, RuntimeError> {

    let unsigned_header = header.unsigned.encode();
    let context = seal_context(seal_keys, entropy, phase);

    let seal_vrf_output = match seal_keys {
        TicketsOrKeys::Tickets(tickets) => {
            log::debug!("Verify tickets seal");
            let ticket = tickets.get(phase).ok_or(RuntimeError::InvalidAuthorTicket)?;
            let seal_vrf_output = ietf_vrf_verify(author_key, &context, &unsigned_header, &header.seal).map_err(|error| {
                log::error!("Invalid tickets seal: {error}");
                RuntimeError::InvalidBlockSeal(error)
            })?;

            if ticket.id != seal_vrf_output {
                log::error!("Ticket {phase} not match: id {} != seal vrf {}", utils::print_hash!(ticket.id), utils::print_hash!(seal_vrf_output));
                return Err(RuntimeError::InvalidAuthorTicket);
            }
            seal_vrf_output
        }
        TicketsOrKeys::Keys(keys) => {
            log::debug!("Verify keys seal");
            let slot_key = keys.get(phase).ok_or(RuntimeError::InvalidAuthorKey)?;
            if slot_key != author_key {
                log::error!("Key not match: seal key {} != author key {}", utils::print_hash!(slot_key), utils::print_hash!(author_key));
                return Err(RuntimeError::InvalidAuthorKey);
            }

            ietf_vrf_verify(author_key, &context, &unsigned_header, &header.seal).map_err(|error| {
                log::error!("Invalid key seal: {error}");
                RuntimeError::InvalidBlockSeal(error)
            })?
        }
    };

    // Verify the entropy source
    let context = [XT_ENTROPY, &seal_vrf_output[..]].concat();
    let entropy_source_vrf_output = ietf_vrf_verify(author_key, &context, &[], &header.unsigned.entropy_source).map_err(|error| {
        log::error!("Invalid entropy source: {error}");
        RuntimeError::InvalidVrfSignature(error)
    })?;

    log::debug!("Seal header verified successfully. vrf output: 0x{}", utils::print_hash!(entropy_source_vrf_output));
    Ok(entropy_source_vrf_output)
}

/// Signs the entropy source and then seals `unsigned` for the slot at `phase`.
pub fn author_header(
    prover: &Prover,
    mut unsigned: UnsignedHeader,
    seal_keys: &TicketsOrKeys,
    entropy: &Entropy,
    phase: usize,
) -> Result<Header, BandersnatchError> {

    let context = seal_context(seal_keys, entropy, phase);
    // The seal output depends only on the VRF input, so the entropy source can be fixed before the seal
    let seal_vrf_output = prover.vrf_output(&context)?;
    unsigned.entropy_source = prover.ietf_vrf_sign(&[XT_ENTROPY, &seal_vrf_output[..]].concat(), &[])?;

    let seal = prover.ietf_vrf_sign(&context, &unsigned.encode())?;
    Ok(Header { unsigned, seal })
}
