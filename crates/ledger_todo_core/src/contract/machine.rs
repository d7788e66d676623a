//! Three-phase contract state machine.
//!
//! # Responsibility
//! - Drive one transaction through verify → vote → commit.
//! - Read current state through the host; never write it.
//!
//! # Invariants
//! - Phases run strictly in order and each one runs at most once.
//! - `Committed` and `Rejected` are terminal.
//! - A rejection carries the phase that produced it and no state change.

use crate::contract::commit::{commit, StateChange};
use crate::contract::error::ContractError;
use crate::contract::verify::{verify, VerifiedTransaction};
use crate::contract::vote::{authorize, Authorized};
use crate::host::{HostError, LedgerHost};
use crate::model::todo::TodoState;
use crate::model::transaction::TransactionEnvelope;
use log::debug;
use std::fmt::{Display, Formatter};

/// Contract phase, used to attribute rejections.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Verify,
    Vote,
    Commit,
}

impl Phase {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Verify => "verify",
            Self::Vote => "vote",
            Self::Commit => "commit",
        }
    }
}

impl Display for Phase {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One state of a running transaction.
#[derive(Debug, Clone, PartialEq)]
pub enum ContractRun<'tx> {
    Verifying {
        envelope: &'tx TransactionEnvelope,
        self_signed: bool,
    },
    Voting(VerifiedTransaction),
    Committing(Authorized),
    Committed(StateChange),
    Rejected { phase: Phase, reason: ContractError },
}

/// Terminal result of a transaction.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    Committed(StateChange),
    Rejected { phase: Phase, reason: ContractError },
}

impl<'tx> ContractRun<'tx> {
    pub fn start(envelope: &'tx TransactionEnvelope, self_signed: bool) -> Self {
        Self::Verifying {
            envelope,
            self_signed,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Committed(_) | Self::Rejected { .. })
    }

    /// Advances by one phase. Terminal states are returned unchanged.
    ///
    /// # Errors
    /// Returns host failures from resolving the vote target. Contract
    /// rejections are states, not errors.
    pub fn step<H: LedgerHost + ?Sized>(self, host: &H) -> Result<Self, HostError> {
        let next = match self {
            Self::Verifying {
                envelope,
                self_signed,
            } => match verify(envelope, self_signed) {
                Ok(verified) => Self::Voting(verified),
                Err(reason) => Self::rejected(Phase::Verify, reason),
            },
            Self::Voting(verified) => {
                let current = match verified.vote_target() {
                    Some(target) => host
                        .resolve_stream(target)?
                        .as_ref()
                        .and_then(TodoState::from_document),
                    None => None,
                };
                match authorize(verified, current) {
                    Ok(authorized) => Self::Committing(authorized),
                    Err(reason) => Self::rejected(Phase::Vote, reason),
                }
            }
            Self::Committing(authorized) => Self::Committed(commit(authorized)),
            terminal => terminal,
        };
        Ok(next)
    }

    /// Steps until a terminal state is reached.
    pub fn run<H: LedgerHost + ?Sized>(self, host: &H) -> Result<Outcome, HostError> {
        let mut run = self;
        loop {
            run = match run.step(host)? {
                Self::Committed(change) => return Ok(Outcome::Committed(change)),
                Self::Rejected { phase, reason } => {
                    return Ok(Outcome::Rejected { phase, reason })
                }
                pending => pending,
            };
        }
    }

    fn rejected(phase: Phase, reason: ContractError) -> Self {
        debug!(
            "event=contract_phase module=contract status=rejected phase={} error_code={}",
            phase,
            reason.code()
        );
        Self::Rejected { phase, reason }
    }
}

/// Processes one transaction end to end against `host`.
pub fn process<H: LedgerHost + ?Sized>(
    host: &H,
    envelope: &TransactionEnvelope,
    self_signed: bool,
) -> Result<Outcome, HostError> {
    ContractRun::start(envelope, self_signed).run(host)
}
