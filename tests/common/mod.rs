#[allow(dead_code)]
pub mod simulate_storage;
pub use simulate_storage::*;

use contract_runtime::{Address, BlockContext, TxHash};

pub const SENDER: Address = [1u8; 20];
pub const CONTRACT_A: Address = [2u8; 20];
pub const CONTRACT_B: Address = [3u8; 20];
pub const PLAIN_ACCOUNT: Address = [4u8; 20];

pub const TX_HASH: TxHash = [0xABu8; 32];

pub fn block_context() -> BlockContext {
    BlockContext {
        height: 100,
        coinbase: [0xFFu8; 20],
    }
}
