/*
    Copyright © 2024, contract-runtime contributors
    Licensed under the Apache License, Version 2.0: http://www.apache.org/licenses/LICENSE-2.0
*/

//! Derives fresh contract addresses from the transaction hash and a
//! per-transaction nonce.

use ripemd::Ripemd160;
use sha2::{Digest, Sha256};

use crate::types::{Address, TxHash};

/// Deterministic, collision-resistant contract address derivation:
/// RIPEMD-160 over SHA-256 of the transaction hash concatenated with the
/// little-endian nonce. The nonce starts at 0 per transaction and increases by
/// exactly one per generated address, including nested creates, regardless of
/// whether the resulting creation succeeds.
#[derive(Clone, Copy, Debug, Default)]
pub struct AddressGenerator;

impl AddressGenerator {
    pub fn generate_address(&self, tx_hash: &TxHash, nonce: u64) -> Address {
        let mut sha = Sha256::new();
        sha.update(tx_hash);
        sha.update(nonce.to_le_bytes());

        let digest = Ripemd160::digest(sha.finalize());

        let mut address = Address::default();
        address.copy_from_slice(&digest);
        address
    }
}
