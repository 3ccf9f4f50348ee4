/*
    Copyright © 2024, contract-runtime contributors
    Licensed under the Apache License, Version 2.0: http://www.apache.org/licenses/LICENSE-2.0
*/

//! Defines the [Message] hierarchy: one variant per call site into the state
//! transition engine. Every variant carries a sender, an amount and a gas
//! limit; only call variants carry a destination, only create variants carry
//! code or a type name.

use crate::types::{Address, MethodCall};

/// Top-level contract deployment, code supplied by the transaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExternalCreateMessage {
    pub from: Address,
    pub amount: u64,
    pub gas_limit: u64,
    pub code: Vec<u8>,
    pub parameters: Vec<Vec<u8>>,
}

/// Deployment triggered by an executing contract. The new contract's code is
/// fetched from the creator's own deployed code; `type_name` selects the type
/// to instantiate out of that module.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InternalCreateMessage {
    pub from: Address,
    pub amount: u64,
    pub gas_limit: u64,
    pub parameters: Vec<Vec<u8>>,
    pub type_name: String,
}

/// Top-level method invocation on a deployed contract.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExternalCallMessage {
    pub from: Address,
    pub to: Address,
    pub amount: u64,
    pub gas_limit: u64,
    pub method: MethodCall,
}

/// Method invocation triggered by an executing contract.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InternalCallMessage {
    pub from: Address,
    pub to: Address,
    pub amount: u64,
    pub gas_limit: u64,
    pub method: MethodCall,
}

/// Plain value movement from an executing contract. If the destination is a
/// contract its implicit receive handler runs under a fixed small budget;
/// otherwise the transfer is recorded without invoking the virtual machine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContractTransferMessage {
    pub from: Address,
    pub to: Address,
    pub amount: u64,
    pub gas_limit: u64,
}

/// A request to create or call a contract.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Message {
    ExternalCreate(ExternalCreateMessage),
    InternalCreate(InternalCreateMessage),
    ExternalCall(ExternalCallMessage),
    InternalCall(InternalCallMessage),
    ContractTransfer(ContractTransferMessage),
}

impl Message {
    pub fn from_address(&self) -> Address {
        match self {
            Message::ExternalCreate(m) => m.from,
            Message::InternalCreate(m) => m.from,
            Message::ExternalCall(m) => m.from,
            Message::InternalCall(m) => m.from,
            Message::ContractTransfer(m) => m.from,
        }
    }

    pub fn amount(&self) -> u64 {
        match self {
            Message::ExternalCreate(m) => m.amount,
            Message::InternalCreate(m) => m.amount,
            Message::ExternalCall(m) => m.amount,
            Message::InternalCall(m) => m.amount,
            Message::ContractTransfer(m) => m.amount,
        }
    }

    pub fn gas_limit(&self) -> u64 {
        match self {
            Message::ExternalCreate(m) => m.gas_limit,
            Message::InternalCreate(m) => m.gas_limit,
            Message::ExternalCall(m) => m.gas_limit,
            Message::InternalCall(m) => m.gas_limit,
            Message::ContractTransfer(m) => m.gas_limit,
        }
    }

    /// Destination address, for the variants that carry one.
    pub fn to_address(&self) -> Option<Address> {
        match self {
            Message::ExternalCall(m) => Some(m.to),
            Message::InternalCall(m) => Some(m.to),
            Message::ContractTransfer(m) => Some(m.to),
            _ => None,
        }
    }

    /// Whether the message was triggered by executing contract code rather
    /// than decoded from an external transaction. Internal variants are
    /// balance-checked up front and record a [TransferInfo](crate::types::TransferInfo)
    /// on success.
    pub fn is_internal(&self) -> bool {
        matches!(
            self,
            Message::InternalCreate(_) | Message::InternalCall(_) | Message::ContractTransfer(_)
        )
    }

    pub fn is_create(&self) -> bool {
        matches!(self, Message::ExternalCreate(_) | Message::InternalCreate(_))
    }
}
