/*
    Bandersnatch VRF primitives. Block seals and entropy sources are IETF VRF signatures by a known key; tickets are
    ring VRF signatures, anonymous within the ring of the next epoch's validators and verified against the ring's
    KZG commitment. In both cases the first 32 octets of the VRF output hash are what the protocol consumes.
*/

use ark_vrf::reexports::ark_serialize::{self, CanonicalDeserialize, CanonicalSerialize};
use ark_vrf::suites::bandersnatch;
use bandersnatch::{BandersnatchSha512Ell2, IetfProof, Input, Output, PcsParams, Public, RingProof, RingProofParams, Secret};

use jam_types::{
    BandersnatchError, BandersnatchPublic, BandersnatchRingCommitment, BandersnatchRingVrfSignature, BandersnatchVrfSignature,
    OpaqueHash,
};

type RingCommitment = ark_vrf::ring::RingCommitment<BandersnatchSha512Ell2>;

// This is the IETF `Prove` procedure output as described in section 2.2
// of the Bandersnatch VRF specification
#[derive(CanonicalSerialize, CanonicalDeserialize)]
struct IetfVrfSignature {
    output: Output,
    proof: IetfProof,
}

// This is the IETF `Prove` procedure output as described in section 4.2
// of the Bandersnatch VRF specification
#[derive(CanonicalSerialize, CanonicalDeserialize)]
struct RingVrfSignature {
    output: Output,
    // This contains both the Pedersen proof and actual ring proof.
    proof: RingProof,
}

// Construct VRF Input Point from arbitrary data (section 1.2)
fn vrf_input_point(vrf_input_data: &[u8]) -> Result<Input, BandersnatchError> {
    Input::new(vrf_input_data).ok_or(BandersnatchError::InvalidInput)
}

// This truncated hash is the actual value used as ticket-id/score in JAM
fn output_hash(output: &Output) -> OpaqueHash {
    let mut hash = [0u8; 32];
    hash.copy_from_slice(&output.hash()[..32]);
    hash
}

fn to_array<const N: usize>(buf: &[u8]) -> Result<[u8; N], BandersnatchError> {
    buf.try_into().map_err(|_| BandersnatchError::InvalidSignature)
}

fn public_key(key: &BandersnatchPublic) -> Result<Public, BandersnatchError> {
    Public::deserialize_compressed(&key[..]).map_err(|_| BandersnatchError::InvalidPublicKey)
}

/// Ring members in order. Keys with no corresponding curve point (the null key of an offender, for instance)
/// are replaced by the padding point.
pub fn ring_set(keys: &[BandersnatchPublic]) -> Vec<Public> {
    keys.iter()
        .map(|key| {
            Public::deserialize_compressed_unchecked(&key[..])
                .unwrap_or_else(|_| Public::from(RingProofParams::padding_point()))
        })
        .collect()
}

/// Ring proof parameters, built once per profile and shared.
pub struct RingContext {
    params: RingProofParams,
}

impl RingContext {

    /// Deterministic parameters, for test networks which don't load the ceremony SRS.
    pub fn from_seed(ring_size: usize, seed: [u8; 32]) -> Self {
        RingContext { params: RingProofParams::from_seed(ring_size, seed) }
    }

    /// Parameters from an uncompressed KZG SRS.
    pub fn from_srs(ring_size: usize, srs: &[u8]) -> Result<Self, BandersnatchError> {
        let pcs_params = PcsParams::deserialize_uncompressed_unchecked(srs).map_err(|_| BandersnatchError::InvalidParams)?;
        let params = RingProofParams::from_pcs_params(ring_size, pcs_params).map_err(|_| BandersnatchError::InvalidParams)?;
        Ok(RingContext { params })
    }

    fn check_ring_size(&self, size: usize) -> Result<(), BandersnatchError> {
        let max = self.params.max_ring_size();
        if size > max {
            return Err(BandersnatchError::RingTooLarge { size, max });
        }
        Ok(())
    }

    /// KZG commitment to the ring formed by `keys`.
    pub fn commitment(&self, keys: &[BandersnatchPublic]) -> Result<BandersnatchRingCommitment, BandersnatchError> {

        self.check_ring_size(keys.len())?;

        // Backend currently requires the wrapped type (plain affine points)
        let pts: Vec<_> = ring_set(keys).iter().map(|pk| pk.0).collect();
        let commitment = self.params.verifier_key(&pts).commitment();

        let mut buf = Vec::with_capacity(std::mem::size_of::<BandersnatchRingCommitment>());
        commitment.serialize_compressed(&mut buf).map_err(|_| BandersnatchError::InvalidCommitment)?;
        log::trace!("Ring commitment over {} keys: 0x{}", keys.len(), crate::print_hash!(buf));
        buf.as_slice().try_into().map_err(|_| BandersnatchError::InvalidCommitment)
    }

    /// Anonymous VRF signature verification. On success returns the VRF output hash.
    pub fn ring_vrf_verify(
        &self,
        commitment: &BandersnatchRingCommitment,
        vrf_input_data: &[u8],
        aux_data: &[u8],
        signature: &BandersnatchRingVrfSignature,
    ) -> Result<OpaqueHash, BandersnatchError> {
        use ark_vrf::ring::Verifier as _;

        let commitment = RingCommitment::deserialize_compressed(&commitment[..]).map_err(|_| BandersnatchError::InvalidCommitment)?;
        let signature = RingVrfSignature::deserialize_compressed(&signature[..]).map_err(|_| BandersnatchError::InvalidSignature)?;

        let input = vrf_input_point(vrf_input_data)?;
        let output = signature.output;

        // The verifier key is reconstructed from the commitment and the constant verifier key component of the SRS
        let verifier_key = self.params.verifier_key_from_commitment(commitment);
        let verifier = self.params.verifier(verifier_key);
        if Public::verify(input, output, aux_data, &signature.proof, &verifier).is_err() {
            log::debug!("Ring signature verification failure");
            return Err(BandersnatchError::VerificationFailed);
        }

        Ok(output_hash(&output))
    }
}

/// Non-anonymous VRF signature verification. On success returns the VRF output hash.
pub fn ietf_vrf_verify(
    key: &BandersnatchPublic,
    vrf_input_data: &[u8],
    aux_data: &[u8],
    signature: &BandersnatchVrfSignature,
) -> Result<OpaqueHash, BandersnatchError> {
    use ark_vrf::ietf::Verifier as _;

    let public = public_key(key)?;
    let signature = IetfVrfSignature::deserialize_compressed(&signature[..]).map_err(|_| BandersnatchError::InvalidSignature)?;

    let input = vrf_input_point(vrf_input_data)?;
    let output = signature.output;

    if public.verify(input, output, aux_data, &signature.proof).is_err() {
        log::debug!("Ietf signature verification failure");
        return Err(BandersnatchError::VerificationFailed);
    }

    // As far as vrf_input_data is the same, this matches the one produced using the ring-vrf
    Ok(output_hash(&output))
}

/// The output hash carried by an IETF signature, without checking its proof.
pub fn vrf_output(signature: &BandersnatchVrfSignature) -> Result<OpaqueHash, BandersnatchError> {
    let signature = IetfVrfSignature::deserialize_compressed(&signature[..]).map_err(|_| BandersnatchError::InvalidSignature)?;
    Ok(output_hash(&signature.output))
}

/// Signing side, used to author blocks and tickets.
pub struct Prover {
    secret: Secret,
}

impl Prover {

    pub fn from_seed(seed: &[u8]) -> Self {
        Prover { secret: Secret::from_seed(seed) }
    }

    pub fn public(&self) -> Result<BandersnatchPublic, BandersnatchError> {
        let mut buf = Vec::with_capacity(32);
        self.secret.public().serialize_compressed(&mut buf).map_err(|_| BandersnatchError::InvalidPublicKey)?;
        buf.as_slice().try_into().map_err(|_| BandersnatchError::InvalidPublicKey)
    }

    /// VRF output hash.
    pub fn vrf_output(&self, vrf_input_data: &[u8]) -> Result<OpaqueHash, BandersnatchError> {
        let input = vrf_input_point(vrf_input_data)?;
        Ok(output_hash(&self.secret.output(input)))
    }

    pub fn ietf_vrf_sign(&self, vrf_input_data: &[u8], aux_data: &[u8]) -> Result<BandersnatchVrfSignature, BandersnatchError> {
        use ark_vrf::ietf::Prover as _;

        let input = vrf_input_point(vrf_input_data)?;
        let output = self.secret.output(input);
        let proof = self.secret.prove(input, output, aux_data);

        // Output and IETF Proof bundled together (as per section 2.2)
        let signature = IetfVrfSignature { output, proof };
        let mut buf = Vec::new();
        signature.serialize_compressed(&mut buf).map_err(|_| BandersnatchError::InvalidSignature)?;
        to_array(&buf)
    }

    /// Anonymous VRF signature by the `index`-th member of `ring`.
    pub fn ring_vrf_sign(
        &self,
        context: &RingContext,
        ring: &[BandersnatchPublic],
        index: usize,
        vrf_input_data: &[u8],
        aux_data: &[u8],
    ) -> Result<BandersnatchRingVrfSignature, BandersnatchError> {
        use ark_vrf::ring::Prover as _;

        context.check_ring_size(ring.len())?;
        if index >= ring.len() {
            return Err(BandersnatchError::SignerNotInRing(index));
        }

        let input = vrf_input_point(vrf_input_data)?;
        let output = self.secret.output(input);

        let pts: Vec<_> = ring_set(ring).iter().map(|pk| pk.0).collect();
        let prover_key = context.params.prover_key(&pts);
        let prover = context.params.prover(prover_key, index);
        let proof = self.secret.prove(input, output, aux_data, &prover);

        // Output and Ring Proof bundled together (as per section 2.2)
        let signature = RingVrfSignature { output, proof };
        let mut buf = Vec::new();
        signature.serialize_compressed(&mut buf).map_err(|_| BandersnatchError::InvalidSignature)?;
        to_array(&buf)
    }
}
