/*
    Structural checks run on a decoded block before any stage sees it. They cover everything that can be judged
    without the state: lengths against the active profile, index ranges and the orderings that the extrinsic
    encoding requires. Stage-specific rules which need the state (signatures, timeslots, pools) stay in the stages.
*/

use constants::ProtocolConfig;
use crate::error::ValidateError;
use crate::{
    Assurance, Block, BoundedVec, DisputesExtrinsic, EpochMark, Extrinsic, Guarantee, Header, Judgement,
    Preimage, SizeBound, Ticket, UnsignedHeader, Verdict, WorkExecResult, WorkReport,
};

pub trait Validate {
    fn validate(&self, config: &ProtocolConfig) -> Result<(), ValidateError>;
}

impl<T: Validate> Validate for Option<T> {
    fn validate(&self, config: &ProtocolConfig) -> Result<(), ValidateError> {
        match self {
            Some(value) => value.validate(config),
            None => Ok(()),
        }
    }
}

impl<T: Validate> Validate for Vec<T> {
    fn validate(&self, config: &ProtocolConfig) -> Result<(), ValidateError> {
        self.iter().try_for_each(|item| item.validate(config))
    }
}

impl<T, B: SizeBound> Validate for BoundedVec<T, B> {
    fn validate(&self, config: &ProtocolConfig) -> Result<(), ValidateError> {
        Ok(self.check(config)?)
    }
}

impl Validate for Block {
    fn validate(&self, config: &ProtocolConfig) -> Result<(), ValidateError> {
        self.header.validate(config).map_err(ValidateError::child("header"))?;
        self.extrinsic.validate(config).map_err(ValidateError::child("extrinsic"))
    }
}

impl Validate for Header {
    fn validate(&self, config: &ProtocolConfig) -> Result<(), ValidateError> {
        self.unsigned.validate(config)
    }
}

impl Validate for UnsignedHeader {
    fn validate(&self, config: &ProtocolConfig) -> Result<(), ValidateError> {
        if self.author_index as usize >= config.validators_count {
            return Err(ValidateError::InvalidValidatorIndex(self.author_index));
        }
        self.epoch_mark.validate(config).map_err(ValidateError::child("epoch_mark"))?;
        if let Some(tickets_mark) = &self.tickets_mark {
            if tickets_mark.len() != config.epoch_length as usize {
                return Err(ValidateError::Child {
                    field: "tickets_mark",
                    source: Box::new(ValidateError::TooMany {
                        what: "tickets",
                        len: tickets_mark.len(),
                        max: config.epoch_length as usize,
                    }),
                });
            }
        }
        if self.offenders_mark.len() > config.validators_count {
            return Err(ValidateError::TooMany {
                what: "offenders",
                len: self.offenders_mark.len(),
                max: config.validators_count,
            });
        }
        Ok(())
    }
}

impl Validate for EpochMark {
    fn validate(&self, config: &ProtocolConfig) -> Result<(), ValidateError> {
        if self.validators.len() != config.validators_count {
            return Err(ValidateError::TooMany {
                what: "epoch mark validators",
                len: self.validators.len(),
                max: config.validators_count,
            });
        }
        Ok(())
    }
}

impl Validate for Extrinsic {
    fn validate(&self, config: &ProtocolConfig) -> Result<(), ValidateError> {
        // The ticket count limit is a Safrole rule with its own error, so only the attempts are checked here
        self.tickets.validate(config).map_err(ValidateError::child("tickets"))?;
        self.disputes.validate(config).map_err(ValidateError::child("disputes"))?;
        self.preimages.validate(config).map_err(ValidateError::child("preimages"))?;

        if self.assurances.len() > config.validators_count {
            return Err(ValidateError::TooMany { what: "assurances", len: self.assurances.len(), max: config.validators_count });
        }
        if self.assurances.windows(2).any(|w| w[0].validator_index >= w[1].validator_index) {
            return Err(ValidateError::AssurancesNotSorted);
        }
        self.assurances.validate(config).map_err(ValidateError::child("assurances"))?;

        if self.guarantees.len() > config.cores_count {
            return Err(ValidateError::TooMany { what: "guarantees", len: self.guarantees.len(), max: config.cores_count });
        }
        if self.guarantees.windows(2).any(|w| w[0].report.core_index >= w[1].report.core_index) {
            return Err(ValidateError::GuaranteesNotSorted);
        }
        self.guarantees.validate(config).map_err(ValidateError::child("guarantees"))
    }
}

impl Validate for Ticket {
    fn validate(&self, config: &ProtocolConfig) -> Result<(), ValidateError> {
        if self.attempt >= config.ticket_entries_per_validator {
            return Err(ValidateError::InvalidTicketAttempt(self.attempt));
        }
        Ok(())
    }
}

impl Validate for Preimage {
    fn validate(&self, _config: &ProtocolConfig) -> Result<(), ValidateError> {
        if self.blob.is_empty() {
            return Err(ValidateError::EmptyPreimage(self.requester));
        }
        Ok(())
    }
}

impl Validate for DisputesExtrinsic {
    fn validate(&self, config: &ProtocolConfig) -> Result<(), ValidateError> {
        // Culprits and faults carry nothing to check without the state
        self.verdicts.validate(config).map_err(ValidateError::child("verdicts"))
    }
}

impl Validate for Verdict {
    fn validate(&self, config: &ProtocolConfig) -> Result<(), ValidateError> {
        let expected = config.two_thirds_plus_one();
        if self.votes.len() != expected {
            return Err(ValidateError::InvalidVotesCount { len: self.votes.len(), expected });
        }
        self.votes.validate(config)
    }
}

impl Validate for Judgement {
    fn validate(&self, config: &ProtocolConfig) -> Result<(), ValidateError> {
        if self.index as usize >= config.validators_count {
            return Err(ValidateError::InvalidValidatorIndex(self.index));
        }
        Ok(())
    }
}

impl Validate for Assurance {
    fn validate(&self, config: &ProtocolConfig) -> Result<(), ValidateError> {
        if self.validator_index as usize >= config.validators_count {
            return Err(ValidateError::InvalidValidatorIndex(self.validator_index));
        }
        let expected = config.avail_bitfield_bytes();
        if self.bitfield.len() != expected {
            return Err(ValidateError::InvalidBitfieldLength { len: self.bitfield.len(), expected });
        }
        Ok(())
    }
}

impl Validate for Guarantee {
    fn validate(&self, config: &ProtocolConfig) -> Result<(), ValidateError> {
        if !(2..=3).contains(&self.signatures.len()) {
            return Err(ValidateError::InvalidCredentialsCount(self.signatures.len()));
        }
        if self.signatures.windows(2).any(|w| w[0].validator_index >= w[1].validator_index) {
            return Err(ValidateError::CredentialsNotSorted);
        }
        if let Some(credential) = self.signatures.iter().find(|c| c.validator_index as usize >= config.validators_count) {
            return Err(ValidateError::InvalidValidatorIndex(credential.validator_index));
        }
        self.report.validate(config).map_err(ValidateError::child("report"))
    }
}

impl Validate for WorkReport {
    fn validate(&self, config: &ProtocolConfig) -> Result<(), ValidateError> {
        if self.core_index as usize >= config.cores_count {
            return Err(ValidateError::InvalidCoreIndex(self.core_index));
        }
        if self.results.is_empty() || self.results.len() > config.max_work_items {
            return Err(ValidateError::InvalidResultsCount(self.results.len()));
        }
        let dependencies = self.context.prerequisites.len() + self.segment_root_lookup.len();
        if dependencies > config.max_dependencies {
            return Err(ValidateError::TooManyDependencies(dependencies));
        }
        let output_size = self.auth_output.len()
            + self.results.iter()
                .map(|result| match &result.result {
                    WorkExecResult::Ok(blob) => blob.len(),
                    WorkExecResult::Error(_) => 0,
                })
                .sum::<usize>();
        if output_size > config.max_report_output_size {
            return Err(ValidateError::WorkReportTooBig(output_size));
        }
        Ok(())
    }
}
