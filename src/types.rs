/*
    Copyright © 2024, contract-runtime contributors
    Licensed under the Apache License, Version 2.0: http://www.apache.org/licenses/LICENSE-2.0
*/

//! Defines common data structures used across the state transition engine, or from outside application.

/// A 20-byte account identifier. Both externally-owned senders and deployed
/// contracts are addressed this way.
pub type Address = [u8; 20];

/// The 32-byte hash of the transaction being executed. Immutable for the whole
/// transaction and the seed for contract address generation.
pub type TxHash = [u8; 32];

/// Block-level data made visible to executing contract code.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct BlockContext {
    /// Height of the block that includes the transaction.
    pub height: u64,
    /// Address of the block producer.
    pub coinbase: Address,
}

/// An immutable record of value moved between two addresses during contract
/// execution. Transfers are not reflected in the underlying ledger balances
/// until the outer executor settles them after the transaction completes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransferInfo {
    pub from: Address,
    pub to: Address,
    pub value: u64,
}

/// Name of the implicit handler invoked when plain value is sent to a contract.
pub const RECEIVE_HANDLER_NAME: &str = "Receive";

/// A method invocation target: the method name plus its serialized parameters.
/// Parameter encoding is opaque to the engine; only the virtual machine
/// interprets the byte blobs.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct MethodCall {
    pub name: String,
    pub parameters: Vec<Vec<u8>>,
}

impl MethodCall {
    pub fn new(name: impl Into<String>, parameters: Vec<Vec<u8>>) -> Self {
        Self {
            name: name.into(),
            parameters,
        }
    }

    /// The call performed when value is transferred to a contract address.
    pub fn receive() -> Self {
        Self {
            name: RECEIVE_HANDLER_NAME.to_string(),
            parameters: Vec::new(),
        }
    }

    pub fn is_receive_handler(&self) -> bool {
        self.name == RECEIVE_HANDLER_NAME
    }
}
