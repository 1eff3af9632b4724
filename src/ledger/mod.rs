pub mod models;
pub mod redis_store;
pub mod store;

#[cfg(test)]
pub mod memory;

pub use redis_store::RedisLedgerStore;
pub use store::LedgerStore;
