/*
    Copyright © 2024, contract-runtime contributors
    Licensed under the Apache License, Version 2.0: http://www.apache.org/licenses/LICENSE-2.0
*/

//! Defines gas as the measurement unit for contract execution cost: the
//! [GasMeter] that tracks one attempt's budget, and the [GasSchedule] of named
//! costs applied to storage access and message application.
//!
//! The schedule is an injected value, not a process-wide table, so it can be
//! swapped per network or per test.

use thiserror::Error;

/// Raised by [GasMeter::spend] when a spend would exceed the budget. The sole
/// resource-exhaustion signal in the engine.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Error)]
#[error("out of gas")]
pub struct OutOfGas;

/// The table of named gas costs. Numeric values are chain policy; callers
/// that need different pricing construct their own schedule.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct GasSchedule {
    /// Fixed charge levied at the start of every message application, before
    /// any contract code runs.
    pub base_cost: u64,
    /// Charge for checking whether an account exists.
    pub storage_check_exists_cost: u64,
    /// Per-byte charge over key plus value for a storage read.
    pub storage_read_per_byte: u64,
    /// Per-byte charge over key plus value for a storage write.
    pub storage_write_per_byte: u64,
}

impl GasSchedule {
    pub const DEFAULT_BASE_COST: u64 = 10_000;
    pub const DEFAULT_CHECK_EXISTS_COST: u64 = 5;
    pub const DEFAULT_READ_PER_BYTE: u64 = 1;
    pub const DEFAULT_WRITE_PER_BYTE: u64 = 20;

    /// Cost of reading a storage entry of the given key and value sizes.
    pub fn storage_retrieve_cost(&self, key_len: usize, value_len: usize) -> u64 {
        (key_len as u64)
            .saturating_add(value_len as u64)
            .saturating_mul(self.storage_read_per_byte)
    }

    /// Cost of writing a storage entry of the given key and value sizes.
    pub fn storage_save_cost(&self, key_len: usize, value_len: usize) -> u64 {
        (key_len as u64)
            .saturating_add(value_len as u64)
            .saturating_mul(self.storage_write_per_byte)
    }

    /// Fixed budget handed to the receive handler of a plain value transfer.
    /// Deliberately below a full call's budget to bound re-entrancy depth.
    pub fn transfer_gas_budget(&self) -> u64 {
        self.base_cost.saturating_mul(2).saturating_sub(1)
    }
}

impl Default for GasSchedule {
    fn default() -> Self {
        Self {
            base_cost: Self::DEFAULT_BASE_COST,
            storage_check_exists_cost: Self::DEFAULT_CHECK_EXISTS_COST,
            storage_read_per_byte: Self::DEFAULT_READ_PER_BYTE,
            storage_write_per_byte: Self::DEFAULT_WRITE_PER_BYTE,
        }
    }
}

/// Tracks the gas budget of one message application attempt. `spend` is the
/// only mutation; the budget and the amount consumed are queryable at any time.
///
/// An overspend forfeits the entire remaining budget before erroring: gas
/// already metered is never refunded, and a runaway execution pays its whole
/// limit.
#[derive(Clone, Debug)]
pub struct GasMeter {
    gas_limit: u64,
    gas_consumed: u64,
}

impl GasMeter {
    pub fn new(gas_limit: u64) -> Self {
        Self {
            gas_limit,
            gas_consumed: 0,
        }
    }

    pub fn gas_limit(&self) -> u64 {
        self.gas_limit
    }

    pub fn gas_consumed(&self) -> u64 {
        self.gas_consumed
    }

    pub fn gas_available(&self) -> u64 {
        self.gas_limit - self.gas_consumed
    }

    /// Spends `amount` against the budget. Fails with [OutOfGas] if the spend
    /// would exceed the limit; in that case the whole budget is consumed.
    pub fn spend(&mut self, amount: u64) -> Result<(), OutOfGas> {
        if amount > self.gas_available() {
            self.gas_consumed = self.gas_limit;
            return Err(OutOfGas);
        }
        self.gas_consumed += amount;
        Ok(())
    }
}
