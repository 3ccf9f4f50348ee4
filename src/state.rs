/*
    Copyright © 2024, contract-runtime contributors
    Licensed under the Apache License, Version 2.0: http://www.apache.org/licenses/LICENSE-2.0
*/

//! The state-transition engine.
//!
//! A [State] represents the intermediate chain state for one message,
//! tracking its own checkpoint in the ledger overlay arena alongside the
//! transfers, logs, and contract-address nonce accumulated so far.
//! [State::apply] executes a message against it: nesting a child state,
//! running contract code through the virtual machine, and committing the
//! child into the parent on success or discarding it wholesale on failure.

use std::rc::Rc;

use log::{debug, trace};

use crate::address::AddressGenerator;
use crate::balance::BalanceState;
use crate::context::{ExecutionContext, MessageContext};
use crate::error::StateTransitionError;
use crate::gas::{GasMeter, GasSchedule};
use crate::ledger::{CheckpointId, ContractLedger, LedgerStorage};
use crate::logs::{ContractLogHolder, RawLog};
use crate::message::{ContractTransferMessage, Message};
use crate::persistence::KeyEncodingStrategy;
use crate::types::{Address, BlockContext, MethodCall, TransferInfo, TxHash};
use crate::vm::{VirtualMachine, VmExecutionResult};

/// Outcome of applying one message. Gas consumption is reported either way;
/// a failure carries no contract address or return value because the nested
/// state it would have described was discarded.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum StateTransitionResult {
    Success {
        contract_address: Address,
        gas_consumed: u64,
        return_value: Option<Vec<u8>>,
    },
    Failure {
        gas_consumed: u64,
        error: StateTransitionError,
    },
}

impl StateTransitionResult {
    fn success(contract_address: Address, gas_consumed: u64, return_value: Option<Vec<u8>>) -> Self {
        StateTransitionResult::Success {
            contract_address,
            gas_consumed,
            return_value,
        }
    }

    fn failure(gas_consumed: u64, error: StateTransitionError) -> Self {
        StateTransitionResult::Failure { gas_consumed, error }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, StateTransitionResult::Success { .. })
    }

    pub fn gas_consumed(&self) -> u64 {
        match self {
            StateTransitionResult::Success { gas_consumed, .. } => *gas_consumed,
            StateTransitionResult::Failure { gas_consumed, .. } => *gas_consumed,
        }
    }
}

/// The operation handed to the virtual machine once the preflight checks and
/// the base charge have passed.
enum VmOperation {
    Create {
        code: Vec<u8>,
        type_name: Option<String>,
        parameters: Vec<Vec<u8>>,
    },
    Call {
        code: Vec<u8>,
        type_name: Option<String>,
        method: MethodCall,
    },
}

/// Intermediate state for one message application. The root state is built by
/// the [Runtime](crate::transition::Runtime); nested states are created
/// internally per message and either committed into their parent or
/// discarded.
pub struct State<S: LedgerStorage> {
    ledger: ContractLedger<S>,
    /// Checkpoint this state was forked from. A root-level rollback reopens a
    /// fresh overlay on it.
    parent_checkpoint: CheckpointId,
    checkpoint: CheckpointId,
    gas_remaining: u64,
    nonce: u64,
    origin_nonce: u64,
    internal_transfers: Vec<TransferInfo>,
    log_holder: ContractLogHolder,
    tx_hash: TxHash,
    block: BlockContext,
    /// Recipient of the message being executed in this state, if any. Its
    /// uncommitted credit feeds the balance view.
    self_address: Option<Address>,
    amount: u64,
    address_generator: AddressGenerator,
    vm: Rc<dyn VirtualMachine<S>>,
    schedule: Rc<GasSchedule>,
    key_encoder: Rc<dyn KeyEncodingStrategy>,
}

impl<S: LedgerStorage> State<S> {
    /// Builds the root state for one transaction.
    pub fn new(
        ledger: ContractLedger<S>,
        vm: Rc<dyn VirtualMachine<S>>,
        block: BlockContext,
        tx_hash: TxHash,
        gas_limit: u64,
        schedule: Rc<GasSchedule>,
        key_encoder: Rc<dyn KeyEncodingStrategy>,
    ) -> Self {
        let base = ledger.base();
        let checkpoint = ledger.start_tracking(base);
        Self {
            ledger,
            parent_checkpoint: base,
            checkpoint,
            gas_remaining: gas_limit,
            nonce: 0,
            origin_nonce: 0,
            internal_transfers: Vec::new(),
            log_holder: ContractLogHolder::default(),
            tx_hash,
            block,
            self_address: None,
            amount: 0,
            address_generator: AddressGenerator,
            vm,
            schedule,
            key_encoder,
        }
    }

    /// Applies a message, returning the outcome. The state is only mutated on
    /// success; a failed application leaves transfers, logs, and the ledger
    /// as they were, except that any contract address consumed stays
    /// consumed.
    pub fn apply(&mut self, message: Message) -> StateTransitionResult {
        let gas_limit = message.gas_limit();
        trace!(
            "apply {} message, gas limit {}, amount {}",
            if message.is_internal() { "internal" } else { "external" },
            gas_limit,
            message.amount()
        );

        // gas ceiling: a message may never be granted more gas than the
        // enclosing state has left, and never less than the base charge
        if gas_limit > self.gas_remaining || gas_limit < self.schedule.base_cost {
            return StateTransitionResult::failure(0, StateTransitionError::InsufficientGas);
        }

        // external senders were balance-checked by mempool rules; internal
        // senders are checked against the uncommitted view
        if message.is_internal() {
            let from = message.from_address();
            if self.balance_state().get_balance(&from) < message.amount() {
                return StateTransitionResult::failure(0, StateTransitionError::InsufficientBalance);
            }
        }

        match message {
            Message::ExternalCreate(m) => {
                let recipient = self.get_new_address();
                self.invoke(
                    m.from,
                    recipient,
                    m.amount,
                    m.gas_limit,
                    VmOperation::Create {
                        code: m.code,
                        type_name: None,
                        parameters: m.parameters,
                    },
                    false,
                )
            }
            Message::InternalCreate(m) => {
                // an internal create instantiates a type from the creating
                // contract's own code module
                let code = match self.ledger.get_code(self.checkpoint, &m.from) {
                    Some(code) => code,
                    None => {
                        return StateTransitionResult::failure(0, StateTransitionError::NoCode)
                    }
                };
                let recipient = self.get_new_address();
                self.invoke(
                    m.from,
                    recipient,
                    m.amount,
                    m.gas_limit,
                    VmOperation::Create {
                        code,
                        type_name: Some(m.type_name),
                        parameters: m.parameters,
                    },
                    true,
                )
            }
            Message::ExternalCall(m) => match self.ledger.get_code(self.checkpoint, &m.to) {
                Some(code) => {
                    let type_name = self.ledger.get_contract_type(self.checkpoint, &m.to);
                    self.invoke(
                        m.from,
                        m.to,
                        m.amount,
                        m.gas_limit,
                        VmOperation::Call {
                            code,
                            type_name,
                            method: m.method,
                        },
                        false,
                    )
                }
                None => StateTransitionResult::failure(0, StateTransitionError::NoCode),
            },
            Message::InternalCall(m) => match self.ledger.get_code(self.checkpoint, &m.to) {
                Some(code) => {
                    let type_name = self.ledger.get_contract_type(self.checkpoint, &m.to);
                    self.invoke(
                        m.from,
                        m.to,
                        m.amount,
                        m.gas_limit,
                        VmOperation::Call {
                            code,
                            type_name,
                            method: m.method,
                        },
                        true,
                    )
                }
                None => StateTransitionResult::failure(0, StateTransitionError::NoCode),
            },
            Message::ContractTransfer(m) => self.apply_transfer(m),
        }
    }

    /// Value transfer out of a contract. No code at the recipient means no
    /// execution at all: the transfer is recorded and no gas is consumed.
    /// A contract recipient gets its receive handler run instead.
    fn apply_transfer(&mut self, message: ContractTransferMessage) -> StateTransitionResult {
        match self.ledger.get_code(self.checkpoint, &message.to) {
            None => {
                self.internal_transfers.push(TransferInfo {
                    from: message.from,
                    to: message.to,
                    value: message.amount,
                });
                StateTransitionResult::success(message.to, 0, None)
            }
            Some(code) => {
                let type_name = self.ledger.get_contract_type(self.checkpoint, &message.to);
                self.invoke(
                    message.from,
                    message.to,
                    message.amount,
                    message.gas_limit,
                    VmOperation::Call {
                        code,
                        type_name,
                        method: MethodCall::receive(),
                    },
                    true,
                )
            }
        }
    }

    /// Runs one contract execution in a nested state.
    fn invoke(
        &mut self,
        from: Address,
        recipient: Address,
        amount: u64,
        gas_limit: u64,
        operation: VmOperation,
        record_transfer: bool,
    ) -> StateTransitionResult {
        let mut child = self.nest(recipient, amount, gas_limit);
        let mut gas_meter = GasMeter::new(gas_limit);

        // unconditional base charge for reaching the virtual machine at all;
        // the ceiling check above guarantees it fits
        if gas_meter.spend(self.schedule.base_cost).is_err() {
            child.revert();
            let gas_consumed = gas_meter.gas_consumed();
            self.gas_remaining = self.gas_remaining.saturating_sub(gas_consumed);
            return StateTransitionResult::failure(gas_consumed, StateTransitionError::OutOfGas);
        }

        if let VmOperation::Call { method, .. } = &operation {
            if method.name.is_empty() {
                child.revert();
                let gas_consumed = gas_meter.gas_consumed();
                self.gas_remaining = self.gas_remaining.saturating_sub(gas_consumed);
                return StateTransitionResult::failure(
                    gas_consumed,
                    StateTransitionError::NoMethodName,
                );
            }
        }

        // account and code land before the constructor runs, so the new
        // contract can write its own storage and spawn further contracts from
        // its own module; a fault discards all of it with the checkpoint
        if let VmOperation::Create {
            code, type_name, ..
        } = &operation
        {
            child.ledger.create_account(child.checkpoint, recipient);
            child.ledger.set_code(child.checkpoint, recipient, code.clone());
            if let Some(type_name) = type_name {
                child
                    .ledger
                    .set_contract_type(child.checkpoint, recipient, type_name.clone());
            }
        }

        let message_context = MessageContext {
            sender: from,
            contract_address: recipient,
            amount,
        };
        let vm = Rc::clone(&self.vm);
        let mut context = ExecutionContext::new(&mut child, gas_meter, message_context);
        let vm_result = match &operation {
            VmOperation::Create {
                code,
                type_name,
                parameters,
            } => vm.create(&mut context, code, type_name.as_deref(), parameters),
            VmOperation::Call {
                code,
                type_name,
                method,
            } => vm.execute_method(&mut context, code, type_name.as_deref(), method),
        };
        let gas_meter = context.into_gas_meter();
        let gas_consumed = gas_meter.gas_consumed();
        self.gas_remaining = self.gas_remaining.saturating_sub(gas_consumed);

        match vm_result {
            VmExecutionResult::Fault(fault) => {
                debug!("execution at {:?} faulted: {}", recipient, fault);
                child.revert();
                StateTransitionResult::failure(gas_consumed, fault.into())
            }
            VmExecutionResult::Ok(return_value) => {
                // the initial transfer precedes everything the child recorded
                if record_transfer {
                    self.internal_transfers.push(TransferInfo {
                        from,
                        to: recipient,
                        value: amount,
                    });
                }
                child.commit(self);
                StateTransitionResult::success(recipient, gas_consumed, return_value)
            }
        }
    }

    /// Forks a child state on a fresh checkpoint. The child starts from this
    /// state's nonce and accumulates its own transfers and logs.
    fn nest(&self, recipient: Address, amount: u64, gas_budget: u64) -> State<S> {
        let checkpoint = self.ledger.start_tracking(self.checkpoint);
        State {
            ledger: self.ledger.clone(),
            parent_checkpoint: self.checkpoint,
            checkpoint,
            gas_remaining: gas_budget,
            nonce: self.nonce,
            origin_nonce: self.nonce,
            internal_transfers: Vec::new(),
            log_holder: ContractLogHolder::default(),
            tx_hash: self.tx_hash,
            block: self.block,
            self_address: Some(recipient),
            amount,
            address_generator: self.address_generator,
            vm: Rc::clone(&self.vm),
            schedule: Rc::clone(&self.schedule),
            key_encoder: Rc::clone(&self.key_encoder),
        }
    }

    /// Folds this state into its parent: ledger delta, transfers, logs, and
    /// nonce. The nonce only ever moves forward; addresses consumed by the
    /// child stay consumed in the parent.
    fn commit(self, parent: &mut State<S>) {
        trace!("commit checkpoint {:?}", self.checkpoint);
        self.ledger.commit(self.checkpoint);
        parent.internal_transfers.extend(self.internal_transfers);
        parent.log_holder.add_raw_logs(self.log_holder.into_raw_logs());
        parent.nonce = parent.nonce.max(self.nonce);
    }

    /// Discards this state and its ledger delta.
    fn revert(self) {
        trace!("revert checkpoint {:?}", self.checkpoint);
        self.ledger.rollback(self.checkpoint);
    }

    /// Restores a root state to its pristine condition: transfers, logs, and
    /// the nonce return to their starting values and a fresh checkpoint is
    /// opened. Used by the outer executor to retry or to settle a refund-only
    /// outcome.
    pub fn rollback(&mut self) {
        debug!("rollback to checkpoint {:?}", self.parent_checkpoint);
        self.ledger.rollback(self.checkpoint);
        self.checkpoint = self.ledger.start_tracking(self.parent_checkpoint);
        self.internal_transfers.clear();
        self.log_holder.clear();
        self.nonce = self.origin_nonce;
    }

    /// Uncommitted balance view over this state.
    pub fn balance_state(&self) -> BalanceState<'_, S> {
        BalanceState::new(
            &self.ledger,
            &self.internal_transfers,
            self.self_address.map(|address| (address, self.amount)),
        )
    }

    pub fn get_nonce_and_increment(&mut self) -> u64 {
        let nonce = self.nonce;
        self.nonce += 1;
        nonce
    }

    /// Derives the next contract address. The nonce advances whether or not
    /// the deployment it feeds ultimately succeeds.
    pub fn get_new_address(&mut self) -> Address {
        let nonce = self.get_nonce_and_increment();
        self.address_generator.generate_address(&self.tx_hash, nonce)
    }

    /// Transfers recorded by this state so far, in order.
    pub fn internal_transfers(&self) -> &[TransferInfo] {
        &self.internal_transfers
    }

    /// Logs accumulated by this state so far.
    pub fn log_holder(&self) -> &ContractLogHolder {
        &self.log_holder
    }

    pub(crate) fn has_code(&self, address: &Address) -> bool {
        self.ledger.get_code(self.checkpoint, address).is_some()
    }

    pub(crate) fn ledger(&self) -> &ContractLedger<S> {
        &self.ledger
    }

    pub(crate) fn checkpoint(&self) -> CheckpointId {
        self.checkpoint
    }

    pub(crate) fn schedule(&self) -> &Rc<GasSchedule> {
        &self.schedule
    }

    pub(crate) fn key_encoder(&self) -> Rc<dyn KeyEncodingStrategy> {
        Rc::clone(&self.key_encoder)
    }

    pub(crate) fn block(&self) -> BlockContext {
        self.block
    }

    pub(crate) fn log_holder_mut(&mut self) -> &mut ContractLogHolder {
        &mut self.log_holder
    }

    /// Decomposes a finished root state for settlement.
    pub(crate) fn into_parts(self) -> (CheckpointId, Vec<TransferInfo>, Vec<RawLog>) {
        (
            self.checkpoint,
            self.internal_transfers,
            self.log_holder.into_raw_logs(),
        )
    }
}
