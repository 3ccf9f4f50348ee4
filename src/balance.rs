/*
    Copyright © 2024, contract-runtime contributors
    Licensed under the Apache License, Version 2.0: http://www.apache.org/licenses/LICENSE-2.0
*/

//! Balance view that layers uncommitted value movement over the ledger.

use crate::ledger::{ContractLedger, LedgerStorage};
use crate::types::{Address, TransferInfo};

/// Read-only balance view for one state. The ledger holds settled balances;
/// this adds the transfers accumulated so far plus the amount carried by the
/// message being executed, which is spendable by the recipient before any
/// settlement happens.
pub struct BalanceState<'a, S: LedgerStorage> {
    ledger: &'a ContractLedger<S>,
    transfers: &'a [TransferInfo],
    /// Message amount credited to the executing contract, pre-settlement.
    in_flight: Option<(Address, u64)>,
}

impl<'a, S: LedgerStorage> BalanceState<'a, S> {
    pub(crate) fn new(
        ledger: &'a ContractLedger<S>,
        transfers: &'a [TransferInfo],
        in_flight: Option<(Address, u64)>,
    ) -> Self {
        Self {
            ledger,
            transfers,
            in_flight,
        }
    }

    pub fn get_balance(&self, address: &Address) -> u64 {
        let mut balance = self.ledger.get_balance(address);
        if let Some((recipient, amount)) = self.in_flight {
            if recipient == *address {
                balance = balance.saturating_add(amount);
            }
        }
        for transfer in self.transfers {
            if transfer.to == *address {
                balance = balance.saturating_add(transfer.value);
            }
            if transfer.from == *address {
                balance = balance.saturating_sub(transfer.value);
            }
        }
        balance
    }
}
