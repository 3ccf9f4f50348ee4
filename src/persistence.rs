/*
    Copyright © 2024, contract-runtime contributors
    Licensed under the Apache License, Version 2.0: http://www.apache.org/licenses/LICENSE-2.0
*/

//! Metered, key-encoded persistence operations for executing contract code.

use std::rc::Rc;

use crate::gas::{GasMeter, GasSchedule, OutOfGas};
use crate::ledger::{CheckpointId, ContractLedger, LedgerStorage};
use crate::types::Address;

/// Maps contract-visible storage keys to physical ledger keys. The default is
/// the identity mapping; a node may substitute hashing or namespacing without
/// the engine noticing.
pub trait KeyEncodingStrategy {
    fn encode(&self, key: &[u8]) -> Vec<u8>;
}

/// Identity key encoding.
#[derive(Clone, Copy, Debug, Default)]
pub struct BasicKeyEncodingStrategy;

impl KeyEncodingStrategy for BasicKeyEncodingStrategy {
    fn encode(&self, key: &[u8]) -> Vec<u8> {
        key.to_vec()
    }
}

/// Storage access for one executing contract: every operation charges the gas
/// meter it is handed and routes through the state's checkpoint, so a
/// reverted state discards the contract's writes with everything else.
pub struct PersistentState<S: LedgerStorage> {
    ledger: ContractLedger<S>,
    checkpoint: CheckpointId,
    contract_address: Address,
    schedule: Rc<GasSchedule>,
    key_encoder: Rc<dyn KeyEncodingStrategy>,
}

impl<S: LedgerStorage> PersistentState<S> {
    pub(crate) fn new(
        ledger: ContractLedger<S>,
        checkpoint: CheckpointId,
        contract_address: Address,
        schedule: Rc<GasSchedule>,
        key_encoder: Rc<dyn KeyEncodingStrategy>,
    ) -> Self {
        Self {
            ledger,
            checkpoint,
            contract_address,
            schedule,
            key_encoder,
        }
    }

    /// Charged existence probe, used to distinguish contract recipients from
    /// plain accounts.
    pub fn contract_exists(
        &self,
        gas_meter: &mut GasMeter,
        address: &Address,
    ) -> Result<bool, OutOfGas> {
        gas_meter.spend(self.schedule.storage_check_exists_cost)?;
        Ok(self.ledger.is_exist(self.checkpoint, address))
    }

    /// Reads a storage value, charging per byte of key and of the value
    /// actually found.
    pub fn fetch_bytes(
        &self,
        gas_meter: &mut GasMeter,
        key: &[u8],
    ) -> Result<Option<Vec<u8>>, OutOfGas> {
        let encoded = self.key_encoder.encode(key);
        let value = self
            .ledger
            .get_storage_value(self.checkpoint, &self.contract_address, &encoded);
        let value_len = value.as_ref().map(Vec::len).unwrap_or_default();
        gas_meter.spend(self.schedule.storage_retrieve_cost(encoded.len(), value_len))?;
        Ok(value)
    }

    /// Writes a storage value, charging for key and value bytes up front. A
    /// failed charge leaves the ledger untouched.
    pub fn store_bytes(
        &mut self,
        gas_meter: &mut GasMeter,
        key: &[u8],
        value: Vec<u8>,
    ) -> Result<(), OutOfGas> {
        let encoded = self.key_encoder.encode(key);
        gas_meter.spend(self.schedule.storage_save_cost(encoded.len(), value.len()))?;
        self.ledger
            .set_storage_value(self.checkpoint, self.contract_address, encoded, value);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::tests_support::MapStorage;

    const CONTRACT: Address = [7u8; 20];

    fn persistent(ledger: &ContractLedger<MapStorage>, at: CheckpointId) -> PersistentState<MapStorage> {
        PersistentState::new(
            ledger.clone(),
            at,
            CONTRACT,
            Rc::new(GasSchedule::default()),
            Rc::new(BasicKeyEncodingStrategy),
        )
    }

    #[test]
    fn store_then_fetch_charges_gas() {
        let ledger = ContractLedger::new(MapStorage::default());
        let root = ledger.start_tracking(ledger.base());
        let mut state = persistent(&ledger, root);
        let mut gas_meter = GasMeter::new(100_000);

        state.store_bytes(&mut gas_meter, b"key", b"value".to_vec()).unwrap();
        let schedule = GasSchedule::default();
        assert_eq!(gas_meter.gas_consumed(), schedule.storage_save_cost(3, 5));

        let fetched = state.fetch_bytes(&mut gas_meter, b"key").unwrap();
        assert_eq!(fetched, Some(b"value".to_vec()));
        assert_eq!(
            gas_meter.gas_consumed(),
            schedule.storage_save_cost(3, 5) + schedule.storage_retrieve_cost(3, 5)
        );
    }

    #[test]
    fn failed_write_charge_leaves_ledger_untouched() {
        let ledger = ContractLedger::new(MapStorage::default());
        let root = ledger.start_tracking(ledger.base());
        let mut state = persistent(&ledger, root);
        let mut gas_meter = GasMeter::new(1);

        assert!(state.store_bytes(&mut gas_meter, b"key", b"value".to_vec()).is_err());
        assert_eq!(gas_meter.gas_available(), 0);
        assert_eq!(
            ledger.get_storage_value(root, &CONTRACT, b"key"),
            None
        );
    }

    #[test]
    fn exists_probe_is_charged() {
        let ledger = ContractLedger::new(MapStorage::default());
        let root = ledger.start_tracking(ledger.base());
        ledger.create_account(root, CONTRACT);
        let state = persistent(&ledger, root);
        let mut gas_meter = GasMeter::new(100);

        assert!(state.contract_exists(&mut gas_meter, &CONTRACT).unwrap());
        assert_eq!(
            gas_meter.gas_consumed(),
            GasSchedule::default().storage_check_exists_cost
        );
    }
}
