/*
    Copyright © 2024, contract-runtime contributors
    Licensed under the Apache License, Version 2.0: http://www.apache.org/licenses/LICENSE-2.0
*/

//! Accumulates event log entries emitted by executing contracts, scoped to the
//! current attempt. Logs become visible to the parent state only when the
//! child attempt commits; a rolled-back attempt discards them.

use crate::types::Address;

/// One event emitted by a contract: the emitting address, ordered topics, and
/// an opaque data payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawLog {
    pub contract: Address,
    pub topics: Vec<Vec<u8>>,
    pub data: Vec<u8>,
}

/// Ordered, append-only holder of the logs emitted during one attempt.
#[derive(Debug, Default, Clone)]
pub struct ContractLogHolder {
    logs: Vec<RawLog>,
}

impl ContractLogHolder {
    pub fn add_log(&mut self, log: RawLog) {
        self.logs.push(log);
    }

    /// Appends a batch of logs, preserving their order. Used when folding a
    /// committed child attempt into its parent.
    pub fn add_raw_logs(&mut self, logs: impl IntoIterator<Item = RawLog>) {
        self.logs.extend(logs);
    }

    pub fn get_raw_logs(&self) -> Vec<RawLog> {
        self.logs.clone()
    }

    pub fn into_raw_logs(self) -> Vec<RawLog> {
        self.logs
    }

    pub fn len(&self) -> usize {
        self.logs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.logs.is_empty()
    }

    /// Discards everything accumulated so far. Used on rollback.
    pub fn clear(&mut self) {
        self.logs.clear();
    }
}
