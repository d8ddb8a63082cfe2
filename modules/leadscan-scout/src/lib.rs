pub mod dedup;
pub mod filter;
pub mod notify;
pub mod pipeline;
pub mod scoring;
pub mod sources;
pub mod store;
#[cfg(any(test, feature = "test-support"))]
pub mod testing;
