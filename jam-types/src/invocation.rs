/*
    The boundary between the state transition and the virtual machine which runs service code. Accumulation hands a
    service its operands and a snapshot of the partial state, and gets back the service's view of the new partial
    state together with the transfers, commitment and preimages it produced.
*/

use constants::ProtocolConfig;
use crate::error::BoxedError;
use crate::{
    AuthQueues, AuthorizerHash, ExportsRoot, Gas, OpaqueHash, Privileges, ServiceId, Services, TimeSlot, ValidatorsData,
    WorkExecResult, WorkPackageHash,
};

#[derive(Debug, Clone, PartialEq)]
pub struct AccumulationPartialState {
    pub services: Services,
    pub validator_queue: ValidatorsData,
    pub auth_queues: AuthQueues,
    pub privileges: Privileges,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeferredTransfer {
    // Service index of the sender
    pub from: ServiceId,
    // Service index of the receiver
    pub to: ServiceId,
    // Amount to send
    pub amount: u64,
    // Memo component
    pub memo: Vec<u8>,
    // Gas limit for the transfer
    pub gas_limit: Gas,
}

// Everything the accumulate entry-point learns about one work result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccumulationOperand {
    pub package_hash: WorkPackageHash,
    pub exports_root: ExportsRoot,
    pub authorizer_hash: AuthorizerHash,
    pub payload_hash: OpaqueHash,
    pub gas_limit: Gas,
    pub result: WorkExecResult,
    pub auth_output: Vec<u8>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AccumulateOutput {
    pub state: AccumulationPartialState,
    pub transfers: Vec<DeferredTransfer>,
    pub commitment: Option<OpaqueHash>,
    pub gas_used: Gas,
    // Preimages supplied for (service, blob) during execution
    pub provided: Vec<(ServiceId, Vec<u8>)>,
}

pub trait AccumulateFunction: Send + Sync {
    #[allow(clippy::too_many_arguments)]
    fn invoke(
        &self,
        config: &ProtocolConfig,
        service: ServiceId,
        code: &[u8],
        state: &AccumulationPartialState,
        gas: Gas,
        operands: &[AccumulationOperand],
        initial_index: ServiceId,
        timeslot: TimeSlot,
    ) -> Result<AccumulateOutput, BoxedError>;
}

pub trait OnTransferFunction: Send + Sync {
    /// Runs the on-transfer entry-point of `service` over its batch and returns the gas it used.
    fn invoke(
        &self,
        config: &ProtocolConfig,
        service: ServiceId,
        services: &mut Services,
        timeslot: TimeSlot,
        transfers: &[DeferredTransfer],
    ) -> Result<Gas, BoxedError>;
}
