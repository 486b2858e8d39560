//! The demonstration catalogue, grouped by primitive.
//!
//! Every demonstration takes the shared [`crate::PracticalConfig`] and a
//! [`crate::Transcript`] and returns a typed outcome for tests to assert on.

pub mod channels;
pub mod closures;
pub mod cond;
pub mod mutex;
pub mod once;
pub mod pool;
pub mod selects;
pub mod wait_group;
