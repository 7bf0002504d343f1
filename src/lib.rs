// KratOs Executor - Fonction de transition d'état des transactions
// Principle: Same inputs, same results, on every node

pub mod cli;
pub mod execution;
pub mod genesis;
pub mod storage;
pub mod types;

#[cfg(test)]
mod tests;
