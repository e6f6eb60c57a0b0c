/*
    Typed failures of every state transition stage. A stage fails locally with its own enum and the runtime wraps it
    into `RuntimeError`, aborting the block with nothing of the stage's work committed.
*/

use thiserror::Error;
use crate::{CoreIndex, ServiceId, ValidatorIndex};

pub type BoxedError = Box<dyn std::error::Error + Send + Sync + 'static>;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{what} length {len} outside bounds [{min}, {max}]")]
pub struct BoundsError {
    pub what: &'static str,
    pub len: usize,
    pub min: usize,
    pub max: usize,
}

#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum ReadError {
    NotEnoughData,
    InvalidData,
    ConversionError,
}

impl std::fmt::Display for ReadError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ReadError::NotEnoughData => write!(f, "Not enough data to decode."),
            ReadError::InvalidData => write!(f, "Invalid data encountered during decoding."),
            ReadError::ConversionError => write!(f, "Error occurred during data conversion."),
        }
    }
}

impl std::error::Error for ReadError {}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidateError {
    #[error(transparent)]
    Bounds(#[from] BoundsError),
    #[error("invalid validator index {0}")]
    InvalidValidatorIndex(ValidatorIndex),
    #[error("invalid core index {0}")]
    InvalidCoreIndex(CoreIndex),
    #[error("invalid ticket attempt {0}")]
    InvalidTicketAttempt(u8),
    #[error("empty preimage for service {0}")]
    EmptyPreimage(ServiceId),
    #[error("assurance bitfield has {len} bytes, expected {expected}")]
    InvalidBitfieldLength { len: usize, expected: usize },
    #[error("verdict carries {len} judgements, expected {expected}")]
    InvalidVotesCount { len: usize, expected: usize },
    #[error("guarantee carries {0} credentials")]
    InvalidCredentialsCount(usize),
    #[error("guarantee credentials not sorted by validator index")]
    CredentialsNotSorted,
    #[error("guarantees not sorted by core index")]
    GuaranteesNotSorted,
    #[error("assurances not sorted by validator index")]
    AssurancesNotSorted,
    #[error("work report carries {0} results")]
    InvalidResultsCount(usize),
    #[error("work report carries {0} dependencies")]
    TooManyDependencies(usize),
    #[error("work report output is {0} octets")]
    WorkReportTooBig(usize),
    #[error("too many {what}: {len} > {max}")]
    TooMany { what: &'static str, len: usize, max: usize },
    #[error("{field}: {source}")]
    Child {
        field: &'static str,
        #[source]
        source: Box<ValidateError>,
    },
}

impl ValidateError {
    pub fn child(field: &'static str) -> impl FnOnce(ValidateError) -> ValidateError {
        move |source| ValidateError::Child { field, source: Box::new(source) }
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BandersnatchError {
    #[error("invalid bandersnatch public key")]
    InvalidPublicKey,
    #[error("invalid VRF signature encoding")]
    InvalidSignature,
    #[error("invalid VRF input")]
    InvalidInput,
    #[error("invalid ring commitment")]
    InvalidCommitment,
    #[error("VRF verification failed")]
    VerificationFailed,
    #[error("ring size {size} exceeds the parameters' capacity {max}")]
    RingTooLarge { size: usize, max: usize },
    #[error("invalid SRS parameters")]
    InvalidParams,
    #[error("signer key {0} not in ring")]
    SignerNotInRing(usize),
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SafroleError {
    #[error("timeslot must be strictly greater than the previous one")]
    InvalidTimeslot,
    #[error("too many tickets in extrinsic")]
    TooManyExtrinsics,
    #[error("tickets are not allowed after the submission period")]
    ExtrinsicsNotAllowed,
    #[error("tickets not sorted or unique")]
    ExtrinsicsNotSorted,
    #[error("tickets do not improve the accumulator")]
    ExtrinsicsTooLow,
    #[error("ticket already in accumulator")]
    ExtrinsicsNotUnique,
    #[error("invalid ticket attempt")]
    BadTicketAttempt,
    #[error("invalid ticket proof: {0}")]
    BadTicketProof(BandersnatchError),
    #[error(transparent)]
    Bandersnatch(#[from] BandersnatchError),
    #[error(transparent)]
    Bounds(#[from] BoundsError),
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DisputesError {
    #[error("verdict epoch is neither the current nor the previous one")]
    InvalidEpoch,
    #[error("invalid validator index {0}")]
    InvalidValidatorIndex(ValidatorIndex),
    #[error("invalid judgement signature")]
    InvalidJudgementSignature,
    #[error("invalid public key")]
    InvalidPublicKey,
    #[error("culprit signer is not an active validator or was already punished")]
    InvalidCulpritSigner,
    #[error("fault signer is not an active validator or was already punished")]
    InvalidFaultSigner,
    #[error("invalid culprit signature")]
    InvalidCulpritSignature,
    #[error("invalid fault signature")]
    InvalidFaultSignature,
    #[error("report already judged")]
    DuplicatedReport,
    #[error("invalid judgements count")]
    InvalidJudgementsCount,
    #[error("good verdict requires a fault")]
    ExpectInFaults,
    #[error("bad verdict requires two culprits")]
    ExpectInCulprits,
    #[error("fault vote contradicts verdict")]
    InvalidFaults,
    #[error("culprit report is not in the bad set")]
    InvalidCulprit,
    #[error("verdicts not sorted or unique")]
    VerdictsNotSortedUnique,
    #[error("judgements not sorted or unique")]
    JudgementsNotSortedUnique,
    #[error("culprits not sorted or unique")]
    CulpritsNotSortedUnique,
    #[error("faults not sorted or unique")]
    FaultsNotSortedUnique,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AssurancesError {
    #[error("assurance anchor is not the parent block")]
    InvalidAssuranceParentHash,
    #[error("invalid validator index {0}")]
    InvalidValidatorIndex(ValidatorIndex),
    #[error("invalid assurance signature")]
    InvalidAssuranceSignature,
    #[error("assurance for core {0} with no pending report")]
    AssuranceForEmptyCore(CoreIndex),
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AuthorizationError {
    #[error("authorizer not in the pool of core {0}")]
    InvalidReportAuthorizer(CoreIndex),
    #[error(transparent)]
    Bounds(#[from] BoundsError),
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GuaranteeingError {
    #[error("invalid validator index {0}")]
    InvalidValidatorIndex(ValidatorIndex),
    #[error("guarantee timeslot is in the future")]
    FutureReportSlot,
    #[error("guarantee timeslot is before the previous rotation")]
    ReportEpochBeforeLast,
    #[error("invalid guarantee signature")]
    InvalidGuaranteeSignature,
    #[error("guarantor not assigned to core {0}")]
    InvalidGuaranteeCore(CoreIndex),
    #[error("core {0} has a pending report")]
    CoreNotAvailable(CoreIndex),
    #[error("authorizer not in the pool of core {0}")]
    InvalidReportAuthorizer(CoreIndex),
    #[error("service {0} does not exist")]
    InvalidServiceIndex(ServiceId),
    #[error("code hash mismatch for service {0}")]
    InvalidResultCodeHash(ServiceId),
    #[error("gas below the minimum accumulate gas of service {0}")]
    InvalidServiceGas(ServiceId),
    #[error("work report exceeds the accumulation gas limit")]
    OutOfGas,
    #[error("work package already reported")]
    DuplicatedWorkPackage,
    #[error("refinement context does not match recent history")]
    InvalidContext,
    #[error("prerequisite work package not found")]
    PrerequisiteNotFound,
    #[error("segment root lookup mismatch")]
    InvalidSegmentLookup,
    #[error(transparent)]
    Bounds(#[from] BoundsError),
}

#[derive(Error, Debug)]
pub enum AccumulationError {
    #[error("service {0} does not exist")]
    InvalidServiceIndex(ServiceId),
    #[error("service {0} created by more than one accumulation")]
    DuplicatedServiceIndex(ServiceId),
    #[error("service {0} altered by more than one accumulation")]
    DuplicatedContributionToService(ServiceId),
    #[error("service {0} removed by more than one accumulation")]
    DuplicatedRemovedService(ServiceId),
    #[error("accumulation of service {service} failed: {source}")]
    Invocation {
        service: ServiceId,
        #[source]
        source: BoxedError,
    },
    #[error("transfers to service {service} failed: {source}")]
    OnTransfer {
        service: ServiceId,
        #[source]
        source: BoxedError,
    },
    #[error(transparent)]
    Bounds(#[from] BoundsError),
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PreimagesError {
    #[error("preimages not sorted or unique")]
    PreimagesNotSorted,
    #[error("preimage already provided")]
    DuplicatedPreimage,
    #[error("preimage was not requested")]
    PreimageNotSolicited,
    #[error("service {0} does not exist")]
    InvalidServiceIndex(ServiceId),
}

#[derive(Error, Debug)]
pub enum RuntimeError {
    #[error("parent hash does not match the last block")]
    InvalidParentHash,
    #[error("header state root does not match the prior state root")]
    InvalidHeaderStateRoot,
    #[error("extrinsic hash does not match the header")]
    InvalidExtrinsicHash,
    #[error("header timeslot not after the previous block")]
    HeaderTimeslotTooSmall,
    #[error("header timeslot is in the future")]
    InvalidTimeslot,
    #[error("epoch marker mismatch")]
    InvalidHeaderEpochMarker,
    #[error("winning tickets marker mismatch")]
    InvalidHeaderWinningTickets,
    #[error("offenders marker mismatch")]
    InvalidHeaderOffendersMarkers,
    #[error("invalid author index {0}")]
    InvalidAuthorIndex(ValidatorIndex),
    #[error("seal ticket does not match the slot ticket")]
    InvalidAuthorTicket,
    #[error("author key does not match the slot key")]
    InvalidAuthorKey,
    #[error("invalid block seal: {0}")]
    InvalidBlockSeal(BandersnatchError),
    #[error("invalid entropy source: {0}")]
    InvalidVrfSignature(BandersnatchError),
    #[error(transparent)]
    Validate(#[from] ValidateError),
    #[error(transparent)]
    Safrole(#[from] SafroleError),
    #[error(transparent)]
    Disputes(#[from] DisputesError),
    #[error(transparent)]
    Assurances(#[from] AssurancesError),
    #[error(transparent)]
    Authorization(#[from] AuthorizationError),
    #[error(transparent)]
    Guaranteeing(#[from] GuaranteeingError),
    #[error(transparent)]
    Accumulation(#[from] AccumulationError),
    #[error(transparent)]
    Preimages(#[from] PreimagesError),
    #[error(transparent)]
    Bounds(#[from] BoundsError),
}
