//! Domain types and pure logic for the primality service.
//!
//! Nothing in this crate performs I/O: the oracle, the dispatch policy and
//! the job record state machine are all plain functions and values so the
//! store, worker and API crates can share them.

pub mod dispatch;
pub mod error;
pub mod job;
pub mod primality;
pub mod types;
