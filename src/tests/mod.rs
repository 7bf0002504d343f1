// Tests module
// Transaction flow: validation, dispatch, completion, finalization
// Invariants: property tests over gas, fees and rejection
// Block flow: sequential execution, receipts, stores

pub mod support;

pub mod invariants;
pub mod block_flow;
