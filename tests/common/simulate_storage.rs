use std::collections::{HashMap, HashSet};

use contract_runtime::{Address, LedgerStorage};

/// In-memory ledger backend for transition tests.
#[derive(Clone, Default)]
pub struct SimulatedStorage {
    accounts: HashSet<Address>,
    codes: HashMap<Address, Vec<u8>>,
    contract_types: HashMap<Address, String>,
    balances: HashMap<Address, u64>,
    storage: HashMap<(Address, Vec<u8>), Vec<u8>>,
}

impl SimulatedStorage {
    pub fn set_balance(&mut self, address: Address, balance: u64) {
        self.balances.insert(address, balance);
    }

    /// Seeds a deployed contract, as if an earlier transaction created it.
    pub fn add_contract(&mut self, address: Address, code: Vec<u8>, type_name: &str) {
        self.accounts.insert(address);
        self.codes.insert(address, code);
        self.contract_types.insert(address, type_name.to_string());
    }

    pub fn storage_data(&self, address: Address, key: &[u8]) -> Option<Vec<u8>> {
        self.storage.get(&(address, key.to_vec())).cloned()
    }
}

impl LedgerStorage for SimulatedStorage {
    fn is_exist(&self, address: &Address) -> bool {
        self.accounts.contains(address)
    }

    fn get_code(&self, address: &Address) -> Option<Vec<u8>> {
        self.codes.get(address).cloned()
    }

    fn get_contract_type(&self, address: &Address) -> Option<String> {
        self.contract_types.get(address).cloned()
    }

    fn get_balance(&self, address: &Address) -> u64 {
        self.balances.get(address).copied().unwrap_or_default()
    }

    fn get_storage_value(&self, address: &Address, key: &[u8]) -> Option<Vec<u8>> {
        self.storage.get(&(*address, key.to_vec())).cloned()
    }

    fn create_account(&mut self, address: Address) {
        self.accounts.insert(address);
    }

    fn set_code(&mut self, address: Address, code: Vec<u8>) {
        self.codes.insert(address, code);
    }

    fn set_contract_type(&mut self, address: Address, type_name: String) {
        self.contract_types.insert(address, type_name);
    }

    fn set_storage_value(&mut self, address: Address, key: Vec<u8>, value: Vec<u8>) {
        self.storage.insert((address, key), value);
    }
}
