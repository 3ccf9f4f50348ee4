/*
    Copyright © 2024, contract-runtime contributors
    Licensed under the Apache License, Version 2.0: http://www.apache.org/licenses/LICENSE-2.0
*/

//! Defines the versioned key-value ledger consumed by the engine.
//!
//! [LedgerStorage] is the backend contract implemented by the node's
//! persistence layer. [ContractLedger] layers a tree of copy-on-write
//! checkpoints over it, addressed by [CheckpointId] handles in an arena:
//! starting a tracking layer allocates a child overlay, commit folds the
//! child's delta into its parent overlay, and rollback drops the child handle
//! outright. Partial commits are never visible; an overlay either folds in
//! whole or disappears.
//!
//! Reads consult the overlay chain first ('read-your-write' semantics), then a
//! backend read cache, and finally the backend itself.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use crate::types::Address;

/// The persistence contract the engine consumes. Balances are read-only from
/// the engine's viewpoint: value movement is accumulated as transfers and
/// settled by the outer executor, never written here mid-transaction.
pub trait LedgerStorage {
    fn is_exist(&self, address: &Address) -> bool;
    fn get_code(&self, address: &Address) -> Option<Vec<u8>>;
    fn get_contract_type(&self, address: &Address) -> Option<String>;
    fn get_balance(&self, address: &Address) -> u64;
    fn get_storage_value(&self, address: &Address, key: &[u8]) -> Option<Vec<u8>>;

    fn create_account(&mut self, address: Address);
    fn set_code(&mut self, address: Address, code: Vec<u8>);
    fn set_contract_type(&mut self, address: Address, type_name: String);
    fn set_storage_value(&mut self, address: Address, key: Vec<u8>, value: Vec<u8>);
}

/// Handle to one overlay in the checkpoint arena.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct CheckpointId(usize);

/// Key for overlay entries. Storage keys are physical ledger keys; the
/// metered accessor applies the key encoding strategy before reaching here.
#[derive(Clone, Debug, Hash, PartialEq, Eq)]
enum CacheKey {
    Exists(Address),
    Code(Address),
    ContractType(Address),
    Storage(Address, Vec<u8>),
}

#[derive(Clone, Debug)]
enum CacheValue {
    Exists,
    Code(Vec<u8>),
    ContractType(String),
    Storage(Vec<u8>),
}

struct Checkpoint {
    parent: Option<CheckpointId>,
    writes: HashMap<CacheKey, CacheValue>,
}

struct Inner<S> {
    backend: S,
    /// First-hand values read from the backend, cached for the transaction.
    reads: HashMap<CacheKey, Option<CacheValue>>,
    /// Arena of overlays; a discarded overlay leaves a `None` slot behind.
    checkpoints: Vec<Option<Checkpoint>>,
}

/// Cheaply cloneable handle to the shared checkpoint arena for one
/// transaction. All nested states of the transaction hold clones of the same
/// handle and address their own overlays by [CheckpointId].
pub struct ContractLedger<S: LedgerStorage> {
    inner: Rc<RefCell<Inner<S>>>,
}

impl<S: LedgerStorage> Clone for ContractLedger<S> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<S: LedgerStorage> ContractLedger<S> {
    /// Wraps a backend, allocating the base overlay every other checkpoint
    /// descends from. The base is only ever folded into the backend by
    /// [flush_to_storage](Self::flush_to_storage).
    pub fn new(backend: S) -> Self {
        let base = Checkpoint {
            parent: None,
            writes: HashMap::new(),
        };
        Self {
            inner: Rc::new(RefCell::new(Inner {
                backend,
                reads: HashMap::new(),
                checkpoints: vec![Some(base)],
            })),
        }
    }

    /// The base overlay of the transaction.
    pub fn base(&self) -> CheckpointId {
        CheckpointId(0)
    }

    /// Opens a fresh tracking overlay on top of `parent`.
    pub fn start_tracking(&self, parent: CheckpointId) -> CheckpointId {
        let mut inner = self.inner.borrow_mut();
        inner.checkpoints.push(Some(Checkpoint {
            parent: Some(parent),
            writes: HashMap::new(),
        }));
        CheckpointId(inner.checkpoints.len() - 1)
    }

    /// Folds the overlay's delta into its parent and discards the handle.
    pub fn commit(&self, id: CheckpointId) {
        let mut inner = self.inner.borrow_mut();
        let checkpoint = inner.checkpoints[id.0]
            .take()
            .unwrap_or_else(|| panic!("commit on discarded checkpoint"));
        let parent = match checkpoint.parent {
            Some(parent) => parent,
            None => panic!("commit on the base overlay"),
        };
        match inner.checkpoints[parent.0].as_mut() {
            Some(target) => target.writes.extend(checkpoint.writes),
            None => panic!("commit into discarded checkpoint"),
        }
    }

    /// Discards the overlay and everything written to it. Nothing below it is
    /// touched; unlike a physical-erase model, a dropped overlay can simply
    /// never be read again.
    pub fn rollback(&self, id: CheckpointId) {
        let mut inner = self.inner.borrow_mut();
        inner.checkpoints[id.0] = None;
    }

    pub fn is_exist(&self, at: CheckpointId, address: &Address) -> bool {
        self.get(at, &CacheKey::Exists(*address)).is_some()
    }

    pub fn get_code(&self, at: CheckpointId, address: &Address) -> Option<Vec<u8>> {
        match self.get(at, &CacheKey::Code(*address)) {
            Some(CacheValue::Code(code)) => Some(code),
            None => None,
            _ => panic!("retrieved value not of Code variant"),
        }
    }

    pub fn get_contract_type(&self, at: CheckpointId, address: &Address) -> Option<String> {
        match self.get(at, &CacheKey::ContractType(*address)) {
            Some(CacheValue::ContractType(type_name)) => Some(type_name),
            None => None,
            _ => panic!("retrieved value not of ContractType variant"),
        }
    }

    pub fn get_storage_value(
        &self,
        at: CheckpointId,
        address: &Address,
        key: &[u8],
    ) -> Option<Vec<u8>> {
        match self.get(at, &CacheKey::Storage(*address, key.to_vec())) {
            Some(CacheValue::Storage(value)) => Some(value),
            None => None,
            _ => panic!("retrieved value not of Storage variant"),
        }
    }

    /// Balances are never written by the engine; reads go straight through to
    /// the backend. [BalanceState](crate::balance::BalanceState) layers the
    /// in-flight transfer adjustments on top.
    pub fn get_balance(&self, address: &Address) -> u64 {
        self.inner.borrow().backend.get_balance(address)
    }

    pub fn create_account(&self, at: CheckpointId, address: Address) {
        self.set(at, CacheKey::Exists(address), CacheValue::Exists);
    }

    pub fn set_code(&self, at: CheckpointId, address: Address, code: Vec<u8>) {
        self.set(at, CacheKey::Code(address), CacheValue::Code(code));
    }

    pub fn set_contract_type(&self, at: CheckpointId, address: Address, type_name: String) {
        self.set(
            at,
            CacheKey::ContractType(address),
            CacheValue::ContractType(type_name),
        );
    }

    pub fn set_storage_value(&self, at: CheckpointId, address: Address, key: Vec<u8>, value: Vec<u8>) {
        self.set(at, CacheKey::Storage(address, key), CacheValue::Storage(value));
    }

    /// Applies the base overlay's accumulated writes to the backend and clears
    /// the read cache. The settlement hook for the outer executor once the
    /// outermost apply has committed.
    pub fn flush_to_storage(&self) {
        let mut inner = self.inner.borrow_mut();
        let writes = match inner.checkpoints[0].as_mut() {
            Some(base) => std::mem::take(&mut base.writes),
            None => panic!("base overlay discarded"),
        };
        for (key, value) in writes {
            match (key, value) {
                (CacheKey::Exists(address), CacheValue::Exists) => {
                    inner.backend.create_account(address)
                }
                (CacheKey::Code(address), CacheValue::Code(code)) => {
                    inner.backend.set_code(address, code)
                }
                (CacheKey::ContractType(address), CacheValue::ContractType(type_name)) => {
                    inner.backend.set_contract_type(address, type_name)
                }
                (CacheKey::Storage(address, key), CacheValue::Storage(value)) => {
                    inner.backend.set_storage_value(address, key, value)
                }
                _ => panic!("overlay key/value variant mismatch"),
            }
        }
        inner.reads.clear();
    }

    /// Recovers the backend. All nested states must have been dropped.
    pub fn into_storage(self) -> S {
        match Rc::try_unwrap(self.inner) {
            Ok(cell) => cell.into_inner().backend,
            Err(_) => panic!("ledger handles still outstanding"),
        }
    }

    /// Lowest level get: walk the overlay chain, then the read cache, then
    /// the backend (caching the result).
    fn get(&self, at: CheckpointId, key: &CacheKey) -> Option<CacheValue> {
        let mut inner = self.inner.borrow_mut();

        let mut cursor = Some(at);
        while let Some(id) = cursor {
            let checkpoint = match inner.checkpoints[id.0].as_ref() {
                Some(checkpoint) => checkpoint,
                None => panic!("read through discarded checkpoint"),
            };
            if let Some(value) = checkpoint.writes.get(key) {
                return Some(value.clone());
            }
            cursor = checkpoint.parent;
        }

        if let Some(value) = inner.reads.get(key) {
            return value.clone();
        }

        let value = Self::fetch_from_backend(&inner.backend, key);
        inner.reads.insert(key.clone(), value.clone());
        value
    }

    fn set(&self, at: CheckpointId, key: CacheKey, value: CacheValue) {
        let mut inner = self.inner.borrow_mut();
        match inner.checkpoints[at.0].as_mut() {
            Some(checkpoint) => {
                checkpoint.writes.insert(key, value);
            }
            None => panic!("write through discarded checkpoint"),
        }
    }

    fn fetch_from_backend(backend: &S, key: &CacheKey) -> Option<CacheValue> {
        match key {
            CacheKey::Exists(address) => backend.is_exist(address).then_some(CacheValue::Exists),
            CacheKey::Code(address) => backend.get_code(address).map(CacheValue::Code),
            CacheKey::ContractType(address) => {
                backend.get_contract_type(address).map(CacheValue::ContractType)
            }
            CacheKey::Storage(address, key) => {
                backend.get_storage_value(address, key).map(CacheValue::Storage)
            }
        }
    }
}
