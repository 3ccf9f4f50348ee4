/*
    Copyright © 2024, contract-runtime contributors
    Licensed under the Apache License, Version 2.0: http://www.apache.org/licenses/LICENSE-2.0
*/

//! Executor for internal transactions: the transfers, calls, and creates a
//! contract issues while it is itself being executed.
//!
//! Each operation carves a gas budget out of the caller's meter, routes a
//! fresh message through [State::apply](crate::state::State::apply), and then
//! settles the child's consumption back onto the caller. A failed internal
//! transaction is reported as a value, never as a caller fault; the calling
//! contract decides what to do with it.

use log::trace;

use crate::error::StateTransitionError;
use crate::gas::GasMeter;
use crate::ledger::LedgerStorage;
use crate::message::{
    ContractTransferMessage, InternalCallMessage, InternalCreateMessage, Message,
};
use crate::state::{State, StateTransitionResult};
use crate::types::{Address, MethodCall};

/// Outcome of an internal create, as seen by the issuing contract.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CreateResult {
    Created {
        contract_address: Address,
        return_value: Option<Vec<u8>>,
    },
    Failed(StateTransitionError),
}

impl CreateResult {
    pub fn is_success(&self) -> bool {
        matches!(self, CreateResult::Created { .. })
    }
}

/// Outcome of an internal call or transfer. `Empty` means value moved without
/// any contract code running.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TransferResult {
    Empty,
    Transferred(Option<Vec<u8>>),
    Failed(StateTransitionError),
}

impl TransferResult {
    pub fn is_success(&self) -> bool {
        !matches!(self, TransferResult::Failed(_))
    }
}

/// Binds an executor to the issuing contract. One factory is built into each
/// execution context so the sender address cannot be forged by contract code.
#[derive(Clone, Copy, Debug, Default)]
pub struct InternalTransactionExecutorFactory;

impl InternalTransactionExecutorFactory {
    pub(crate) fn create<'a, S: LedgerStorage>(
        &self,
        state: &'a mut State<S>,
        gas_meter: &'a mut GasMeter,
        from: Address,
    ) -> InternalTransactionExecutor<'a, S> {
        InternalTransactionExecutor {
            state,
            gas_meter,
            from,
        }
    }
}

/// Per-attempt capability for issuing internal transactions. Holds exclusive
/// borrows of the state and the caller's meter for its whole lifetime, so a
/// nested application can never interleave with the caller's own storage
/// access.
pub struct InternalTransactionExecutor<'a, S: LedgerStorage> {
    state: &'a mut State<S>,
    gas_meter: &'a mut GasMeter,
    from: Address,
}

impl<'a, S: LedgerStorage> InternalTransactionExecutor<'a, S> {
    /// Deploys a new contract from within the executing one. A `gas_limit` of
    /// zero hands the child everything the caller has left.
    pub fn create(
        &mut self,
        amount: u64,
        type_name: String,
        parameters: Vec<Vec<u8>>,
        gas_limit: u64,
    ) -> CreateResult {
        let budget = self.resolve_budget(gas_limit);
        if self.gas_meter.gas_available() < budget {
            return CreateResult::Failed(StateTransitionError::InsufficientGas);
        }
        trace!(
            "internal create from {} amount {} budget {}",
            hex_prefix(&self.from),
            amount,
            budget
        );

        let result = self.state.apply(Message::InternalCreate(InternalCreateMessage {
            from: self.from,
            amount,
            gas_limit: budget,
            parameters,
            type_name,
        }));

        if self.settle(&result).is_err() {
            return CreateResult::Failed(StateTransitionError::OutOfGas);
        }
        match result {
            StateTransitionResult::Success {
                contract_address,
                return_value,
                ..
            } => CreateResult::Created {
                contract_address,
                return_value,
            },
            StateTransitionResult::Failure { error, .. } => CreateResult::Failed(error),
        }
    }

    /// Calls a method on another contract, moving `amount` alongside. A call
    /// to an address without code degrades to a plain transfer.
    pub fn call(
        &mut self,
        to: Address,
        amount: u64,
        method: MethodCall,
        gas_limit: u64,
    ) -> TransferResult {
        let budget = self.resolve_budget(gas_limit);
        if self.gas_meter.gas_available() < budget {
            return TransferResult::Failed(StateTransitionError::InsufficientGas);
        }
        trace!(
            "internal call from {} to {} method {:?} budget {}",
            hex_prefix(&self.from),
            hex_prefix(&to),
            method.name,
            budget
        );

        let message = if self.state.has_code(&to) {
            Message::InternalCall(InternalCallMessage {
                from: self.from,
                to,
                amount,
                gas_limit: budget,
                method,
            })
        } else {
            Message::ContractTransfer(ContractTransferMessage {
                from: self.from,
                to,
                amount,
                gas_limit: budget,
            })
        };

        let result = self.state.apply(message);
        self.to_transfer_result(result)
    }

    /// Moves value to another address. If the recipient is a contract its
    /// receive handler runs under a small fixed budget.
    pub fn transfer(&mut self, to: Address, amount: u64) -> TransferResult {
        let budget = self.state.schedule().transfer_gas_budget();
        if self.gas_meter.gas_available() < budget {
            return TransferResult::Failed(StateTransitionError::InsufficientGas);
        }
        trace!(
            "internal transfer from {} to {} amount {}",
            hex_prefix(&self.from),
            hex_prefix(&to),
            amount
        );

        let result = self.state.apply(Message::ContractTransfer(ContractTransferMessage {
            from: self.from,
            to,
            amount,
            gas_limit: budget,
        }));
        self.to_transfer_result(result)
    }

    /// A zero caller-supplied limit means "everything I have left".
    fn resolve_budget(&self, gas_limit: u64) -> u64 {
        if gas_limit == 0 {
            self.gas_meter.gas_available()
        } else {
            gas_limit
        }
    }

    /// Charges the child's consumption onto the caller's meter. The up-front
    /// budget check makes an overspend here unreachable unless the child
    /// consumed beyond its own limit, which the gas ceiling forbids.
    fn settle(&mut self, result: &StateTransitionResult) -> Result<(), crate::gas::OutOfGas> {
        self.gas_meter.spend(result.gas_consumed())
    }

    fn to_transfer_result(&mut self, result: StateTransitionResult) -> TransferResult {
        if self.settle(&result).is_err() {
            return TransferResult::Failed(StateTransitionError::OutOfGas);
        }
        match result {
            StateTransitionResult::Success {
                gas_consumed,
                return_value,
                ..
            } => {
                // no gas consumed means no contract code ran
                if gas_consumed == 0 {
                    TransferResult::Empty
                } else {
                    TransferResult::Transferred(return_value)
                }
            }
            StateTransitionResult::Failure { error, .. } => TransferResult::Failed(error),
        }
    }
}

fn hex_prefix(address: &Address) -> String {
    address[..4].iter().map(|b| format!("{:02x}", b)).collect()
}
