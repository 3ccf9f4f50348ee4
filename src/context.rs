/*
    Copyright © 2024, contract-runtime contributors
    Licensed under the Apache License, Version 2.0: http://www.apache.org/licenses/LICENSE-2.0
*/

//! Defines the execution context handed to contract code for the duration of
//! one virtual machine invocation. It is the contract's only window onto the
//! chain: metered storage, balances, logs, block and message data, and the
//! executor for outbound internal transactions all route through it.

use std::rc::Rc;

use crate::gas::{GasMeter, OutOfGas};
use crate::internal::{InternalTransactionExecutor, InternalTransactionExecutorFactory};
use crate::ledger::LedgerStorage;
use crate::persistence::PersistentState;
use crate::state::State;
use crate::types::{Address, BlockContext};

/// The message being executed, as visible to contract code.
#[derive(Clone, Copy, Debug)]
pub struct MessageContext {
    pub sender: Address,
    pub contract_address: Address,
    pub amount: u64,
}

/// Per-invocation execution environment. Borrows the state for the length of
/// the invocation and owns the gas meter, so gas spent by nested calls is
/// settled back onto this meter before the invocation returns.
pub struct ExecutionContext<'a, S: LedgerStorage> {
    state: &'a mut State<S>,
    gas_meter: GasMeter,
    persistent: PersistentState<S>,
    ite_factory: InternalTransactionExecutorFactory,
    pub block: BlockContext,
    pub message: MessageContext,
}

impl<'a, S: LedgerStorage> ExecutionContext<'a, S> {
    pub(crate) fn new(
        state: &'a mut State<S>,
        gas_meter: GasMeter,
        message: MessageContext,
    ) -> Self {
        let persistent = PersistentState::new(
            state.ledger().clone(),
            state.checkpoint(),
            message.contract_address,
            Rc::clone(state.schedule()),
            state.key_encoder(),
        );
        let block = state.block();
        Self {
            state,
            gas_meter,
            persistent,
            ite_factory: InternalTransactionExecutorFactory,
            block,
            message,
        }
    }

    pub(crate) fn into_gas_meter(self) -> GasMeter {
        self.gas_meter
    }

    pub fn gas_available(&self) -> u64 {
        self.gas_meter.gas_available()
    }

    /// Direct charge for virtual machine work that has no storage footprint,
    /// e.g. instruction accounting.
    pub fn spend_gas(&mut self, amount: u64) -> Result<(), OutOfGas> {
        self.gas_meter.spend(amount)
    }

    pub fn get_storage(&mut self, key: &[u8]) -> Result<Option<Vec<u8>>, OutOfGas> {
        self.persistent.fetch_bytes(&mut self.gas_meter, key)
    }

    pub fn set_storage(&mut self, key: &[u8], value: Vec<u8>) -> Result<(), OutOfGas> {
        self.persistent.store_bytes(&mut self.gas_meter, key, value)
    }

    pub fn contract_exists(&mut self, address: &Address) -> Result<bool, OutOfGas> {
        self.persistent.contract_exists(&mut self.gas_meter, address)
    }

    /// Balance of the executing contract, including uncommitted transfers and
    /// the amount carried by the current message. Gas-free.
    pub fn get_balance(&self) -> u64 {
        self.state.balance_state().get_balance(&self.message.contract_address)
    }

    pub fn log(&mut self, topics: Vec<Vec<u8>>, data: Vec<u8>) {
        self.state.log_holder_mut().add_log(crate::logs::RawLog {
            contract: self.message.contract_address,
            topics,
            data,
        });
    }

    /// Executor for outbound transfers, calls, and creates from this
    /// contract. Borrows the context mutably, so at most one internal
    /// transaction is in flight at a time.
    pub fn internal_executor(&mut self) -> InternalTransactionExecutor<'_, S> {
        self.ite_factory.create(
            &mut *self.state,
            &mut self.gas_meter,
            self.message.contract_address,
        )
    }
}
