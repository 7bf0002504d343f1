// Gas - Arithmétique de gas et de rent, coût intrinsèque des transactions
use super::activation::{ActivationsForBlock, ConsensusRule};
use crate::types::{Balance, Gas, Transaction};

/// Coûts en gas et arithmétique bornée
pub struct GasCost;

impl GasCost {
    /// Sentinel upper bound of every gas quantity
    pub const MAX_GAS: Gas = i64::MAX as Gas;

    // Coût intrinsèque
    pub const TRANSACTION: Gas = 21_000;
    pub const TRANSACTION_CREATE_CONTRACT: Gas = 53_000;
    pub const TX_ZERO_DATA: Gas = 4;
    pub const TX_NO_ZERO_DATA: Gas = 68;

    /// Par byte de code sauvegardé à la création
    pub const CREATE_DATA: Gas = 200;

    /// Refund per self-destructed account
    pub const SUICIDE_REFUND: Gas = 24_000;

    /// Canonical gas value, clamped to `MAX_GAS`
    pub fn to_gas(value: u64) -> Gas {
        value.min(Self::MAX_GAS)
    }

    /// Addition saturant à `MAX_GAS`
    pub fn add(x: Gas, y: Gas) -> Gas {
        x.saturating_add(y).min(Self::MAX_GAS)
    }

    /// Soustraction vérifiée
    pub fn subtract(x: Gas, y: Gas) -> Result<Gas, GasError> {
        x.checked_sub(y).ok_or(GasError::Underflow { x, y })
    }

    /// Multiplication saturant à `MAX_GAS`
    pub fn multiply(x: Gas, y: Gas) -> Gas {
        x.saturating_mul(y).min(Self::MAX_GAS)
    }

    /// Prix en unités natives d'une quantité de gas
    pub fn to_balance(gas: Gas, gas_price: Balance) -> Balance {
        (gas as Balance).saturating_mul(gas_price)
    }
}

/// Intrinsic cost: base fee, creation surcharge and data bytes.
/// `free` zeroes the cost for setup calls that the protocol does not charge.
pub fn transaction_cost(tx: &Transaction, free: bool) -> Gas {
    if free {
        return 0;
    }
    let non_zeroes = tx.non_zero_data_bytes() as Gas;
    let zeroes = tx.data().len() as Gas - non_zeroes;
    let base = if tx.is_contract_creation() {
        GasCost::TRANSACTION_CREATE_CONTRACT
    } else {
        GasCost::TRANSACTION
    };
    GasCost::add(
        base,
        GasCost::add(
            GasCost::multiply(zeroes, GasCost::TX_ZERO_DATA),
            GasCost::multiply(non_zeroes, GasCost::TX_NO_ZERO_DATA),
        ),
    )
}

/// Gas arithmetic in force for a block.
///
/// `Legacy` keeps the historical comparisons and never fails on
/// underflow; `Strict` checks every subtraction and compares the gas limit
/// against the full gas used.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GasRules {
    Legacy,
    Strict,
}

impl GasRules {
    pub fn for_activations(activations: &ActivationsForBlock) -> Self {
        if activations.is_active(ConsensusRule::StrictGasArithmetic) {
            GasRules::Strict
        } else {
            GasRules::Legacy
        }
    }

    /// Whether `gas_limit` covers a built-in call needing `required` gas,
    /// `used` being the required gas plus the intrinsic cost
    pub fn has_enough_gas(&self, gas_limit: Gas, required: Gas, used: Gas) -> bool {
        match self {
            GasRules::Legacy => gas_limit >= required,
            GasRules::Strict => gas_limit >= used,
        }
    }

    pub fn subtract(&self, x: Gas, y: Gas) -> Result<Gas, GasError> {
        match self {
            GasRules::Legacy => Ok(x.saturating_sub(y)),
            GasRules::Strict => GasCost::subtract(x, y),
        }
    }

    pub fn add(&self, x: Gas, y: Gas) -> Gas {
        match self {
            GasRules::Legacy => x.saturating_add(y),
            GasRules::Strict => GasCost::add(x, y),
        }
    }
}

/// Refund cap: at most half of the gas used
pub fn capped_refund(future_refund: Gas, gas_used: Gas) -> Gas {
    future_refund.min(gas_used / 2)
}

/// Erreurs de gas
#[derive(Debug, thiserror::Error, Clone, PartialEq, Eq)]
pub enum GasError {
    #[error("Invalid gas subtraction: {x} - {y}")]
    Underflow { x: Gas, y: Gas },

    #[error("Gas insuffisant: besoin de {needed}, reste {remaining}")]
    OutOfGas { needed: Gas, remaining: Gas },
}
