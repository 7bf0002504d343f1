// Genesis - Configuration de la chaîne et état initial
pub mod config;
pub mod spec;

pub use config::{ChainConfig, ConfigError, ExecutionConfig, SetupCallPolicy};
pub use spec::{GenesisAccount, GenesisBuilder, GenesisSpec};
