/*
    Copyright © 2024, contract-runtime contributors
    Licensed under the Apache License, Version 2.0: http://www.apache.org/licenses/LICENSE-2.0
*/

//! Smart-contract **state transition engine**: executes a contract message
//! against backing storage and produces the next state.
//!
//! ```text
//! f(S, B, M) -> (S', R)
//!
//! S = Contract state, a set of accounts with code, type, and key-value storage
//! B = Block context the message executes under
//! M = Message (create, call, or transfer)
//! R = Transition result: gas consumed, transfers, logs, return data
//! ```
//!
//! The engine owns the transactional semantics of execution. Every message
//! runs in a nested [state] forked from its parent's checkpoint; contract
//! code observes its own writes immediately, yet nothing escapes to the
//! parent until the message succeeds, and a failed message discards its delta
//! wholesale. Contract code itself runs behind the [vm] seam; this crate
//! supplies the [gas] accounting, the [ledger] overlay it writes through, and
//! the [internal] transaction plumbing, but no bytecode interpreter.
//!
//! Entry is through [transition::Runtime]:
//!
//! ```rust
//! // prepare storage, a virtual machine, and an external message,
//! // then call transition.
//! // let result = contract_runtime::Runtime::new()
//! //     .transition(storage, vm, message, block, tx_hash);
//! ```

pub mod address;
pub use address::AddressGenerator;

pub mod balance;
pub use balance::BalanceState;

pub mod context;
pub use context::{ExecutionContext, MessageContext};

pub mod error;
pub use error::StateTransitionError;

pub mod gas;
pub use gas::{GasMeter, GasSchedule, OutOfGas};

pub mod internal;
pub use internal::{CreateResult, InternalTransactionExecutor, TransferResult};

pub mod ledger;
pub use ledger::{CheckpointId, ContractLedger, LedgerStorage};

pub mod logs;
pub use logs::{ContractLogHolder, RawLog};

pub mod message;
pub use message::Message;

pub mod persistence;
pub use persistence::{BasicKeyEncodingStrategy, KeyEncodingStrategy, PersistentState};

pub mod state;
pub use state::{State, StateTransitionResult};

pub mod transition;
pub use transition::{Runtime, TransitionResult};

pub mod types;
pub use types::{Address, BlockContext, MethodCall, TransferInfo, TxHash};

pub mod vm;
pub use vm::{VirtualMachine, VmExecutionResult, VmFault, VmFaultKind};
