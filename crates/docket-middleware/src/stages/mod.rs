//! Built-in stages.
//!
//! Registered in this order by [`Pipeline::new`](crate::Pipeline::new):
//!
//! 1. [`hook`] - Per-phase user callbacks
//! 2. [`field`] - Bookkeeping timestamps and identifiers
//! 3. [`validation`] - Declared field constraints (opt-in)

pub mod field;
pub mod hook;
pub mod validation;

pub use field::FieldInjectionStage;
pub use hook::HookDispatchStage;
pub use validation::ValidationStage;
