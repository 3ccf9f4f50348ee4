/*
    Copyright © 2024, contract-runtime contributors
    Licensed under the Apache License, Version 2.0: http://www.apache.org/licenses/LICENSE-2.0
*/

//! The virtual machine seam and its execution outcome type.

use thiserror::Error;

use crate::context::ExecutionContext;
use crate::ledger::LedgerStorage;
use crate::types::MethodCall;

/// Why a contract execution faulted inside the virtual machine.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Error)]
pub enum VmFaultKind {
    #[error("the method does not exist on the contract")]
    MethodDoesNotExist,
    #[error("the method is private and cannot be invoked externally")]
    MethodIsPrivate,
    #[error("the method is a constructor and cannot be invoked directly")]
    MethodIsConstructor,
    #[error("the supplied parameter types do not match the method signature")]
    ParameterTypesDontMatch,
    #[error("the supplied parameter count does not match the method signature")]
    ParameterCountIncorrect,
    #[error("execution ran out of gas")]
    OutOfGas,
    #[error("the contract execution threw an error")]
    Runtime,
}

/// A fault surfaced by the virtual machine, optionally with a diagnostic
/// message from the contract or the loader.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
#[error("{kind}")]
pub struct VmFault {
    pub kind: VmFaultKind,
    pub detail: Option<String>,
}

impl VmFault {
    pub fn new(kind: VmFaultKind) -> Self {
        Self { kind, detail: None }
    }

    pub fn with_detail(kind: VmFaultKind, detail: impl Into<String>) -> Self {
        Self {
            kind,
            detail: Some(detail.into()),
        }
    }
}

/// Outcome of one virtual machine invocation. Either the contract ran to
/// completion with an optional return value, or it faulted; there is no third
/// state.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum VmExecutionResult {
    Ok(Option<Vec<u8>>),
    Fault(VmFault),
}

impl VmExecutionResult {
    pub fn is_ok(&self) -> bool {
        matches!(self, VmExecutionResult::Ok(_))
    }
}

/// Contract execution backend. The engine hands every invocation an
/// [ExecutionContext] scoped to the current checkpoint and gas meter; the
/// implementation loads `code`, runs the requested entry point, and reports
/// the outcome. It must not retain the context beyond the call.
pub trait VirtualMachine<S: LedgerStorage> {
    /// Instantiates a new contract: runs its constructor with `parameters`.
    /// `type_name` selects the contract type when the code module holds more
    /// than one.
    fn create(
        &self,
        context: &mut ExecutionContext<'_, S>,
        code: &[u8],
        type_name: Option<&str>,
        parameters: &[Vec<u8>],
    ) -> VmExecutionResult;

    /// Invokes a method on an already-deployed contract.
    fn execute_method(
        &self,
        context: &mut ExecutionContext<'_, S>,
        code: &[u8],
        type_name: Option<&str>,
        method: &MethodCall,
    ) -> VmExecutionResult;
}
