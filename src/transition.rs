/*
    Copyright © 2024, contract-runtime contributors
    Licensed under the Apache License, Version 2.0: http://www.apache.org/licenses/LICENSE-2.0
*/

//! Defines the entry point that drives a full state transition and settles
//! its effects against backing storage.

use std::rc::Rc;

use log::debug;

use crate::gas::GasSchedule;
use crate::ledger::{ContractLedger, LedgerStorage};
use crate::logs::RawLog;
use crate::message::Message;
use crate::persistence::{BasicKeyEncodingStrategy, KeyEncodingStrategy};
use crate::state::{State, StateTransitionResult};
use crate::types::{BlockContext, TransferInfo, TxHash};
use crate::vm::VirtualMachine;

/// Everything a transition produced. The storage backend is handed back so
/// the caller can settle transfers and persist the block; on failure it is
/// returned untouched.
pub struct TransitionResult<S> {
    pub result: StateTransitionResult,
    pub transfers: Vec<TransferInfo>,
    pub logs: Vec<RawLog>,
    pub storage: S,
}

/// Entrypoint for state transitions. Carries the pricing schedule and key
/// encoding shared across transactions; one instance serves a whole block.
pub struct Runtime {
    schedule: GasSchedule,
    key_encoder: Rc<dyn KeyEncodingStrategy>,
}

impl Runtime {
    pub fn new() -> Self {
        Self {
            schedule: GasSchedule::default(),
            key_encoder: Rc::new(BasicKeyEncodingStrategy),
        }
    }

    /// Overrides the gas pricing schedule.
    pub fn set_gas_schedule(mut self, schedule: GasSchedule) -> Self {
        self.schedule = schedule;
        self
    }

    /// Overrides the storage key encoding.
    pub fn set_key_encoding(mut self, key_encoder: Rc<dyn KeyEncodingStrategy>) -> Self {
        self.key_encoder = key_encoder;
        self
    }

    /// Executes one external message against `storage`. Successful effects
    /// are flushed into the backend before it is returned; failures leave it
    /// exactly as received, with only the gas consumption to show.
    pub fn transition<S: LedgerStorage>(
        &self,
        storage: S,
        vm: Rc<dyn VirtualMachine<S>>,
        message: Message,
        block: BlockContext,
        tx_hash: TxHash,
    ) -> TransitionResult<S> {
        let ledger = ContractLedger::new(storage);
        let mut state = State::new(
            ledger.clone(),
            vm,
            block,
            tx_hash,
            message.gas_limit(),
            Rc::new(self.schedule),
            Rc::clone(&self.key_encoder),
        );

        let result = state.apply(message);
        let (checkpoint, transfers, logs) = state.into_parts();

        if result.is_success() {
            ledger.commit(checkpoint);
            ledger.flush_to_storage();
        } else {
            debug!("transition failed, discarding effects");
            ledger.rollback(checkpoint);
        }
        let storage = ledger.into_storage();

        TransitionResult {
            result,
            transfers,
            logs,
            storage,
        }
    }
}

impl Default for Runtime {
    fn default() -> Self {
        Self::new()
    }
}
