// Storage - Vue d'état en couches et stores de blocs/receipts
// Principe: Auditabilité, Reproductibilité

pub mod state;
pub mod store;

pub use state::*;
pub use store::*;
