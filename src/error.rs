/*
    Copyright © 2024, contract-runtime contributors
    Licensed under the Apache License, Version 2.0: http://www.apache.org/licenses/LICENSE-2.0
*/

//! error defines sets of error definitions in the entire lifetime of a state transition.

use thiserror::Error;

use crate::vm::{VmFault, VmFaultKind};

/// Descriptive error definitions for a failed message application. Every
/// failure terminates in one of these variants carried inside a
/// [StateTransitionResult](crate::state::StateTransitionResult); there is no
/// crash path reaching the caller of `apply`.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum StateTransitionError {
    /// Remaining gas cannot cover the message gas limit, or the gas limit
    /// cannot cover the base cost. Checked before anything is charged.
    #[error("remaining gas does not cover the message gas limit or base cost")]
    InsufficientGas,

    /// The sender's effective balance cannot cover the transferred amount.
    /// Checked before any gas is spent or ledger state touched.
    #[error("sender balance does not cover the transferred amount")]
    InsufficientBalance,

    /// The call target carries no contract code.
    #[error("call target has no contract code")]
    NoCode,

    /// The call message carries an empty method name. The base fee charged for
    /// the attempt is kept.
    #[error("call message has no method name")]
    NoMethodName,

    /// The gas limit was exhausted mid-execution.
    #[error("gas limit exhausted during contract execution")]
    OutOfGas,

    /// The virtual machine faulted for any reason other than gas exhaustion,
    /// including the invocation-shape errors it reports.
    #[error("contract execution faulted: {0}")]
    VmError(VmFault),
}

impl From<VmFault> for StateTransitionError {
    fn from(fault: VmFault) -> Self {
        match fault.kind {
            VmFaultKind::OutOfGas => StateTransitionError::OutOfGas,
            _ => StateTransitionError::VmError(fault),
        }
    }
}
