// Receipt - Résultat persistant d'une transaction
use super::primitives::{Address, DataWord, Gas, Hash};
use serde::{Deserialize, Serialize};

/// Log émis pendant l'exécution
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogInfo {
    pub address: Address,
    pub topics: Vec<DataWord>,
    pub data: Vec<u8>,

    /// Set when a nested call that emitted the log was rolled back
    #[serde(default)]
    pub rejected: bool,
}

impl LogInfo {
    pub fn new(address: Address, topics: Vec<DataWord>, data: Vec<u8>) -> Self {
        Self {
            address,
            topics,
            data,
            rejected: false,
        }
    }

    pub fn reject(&mut self) {
        self.rejected = true;
    }
}

/// Statut d'une transaction exécutée
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReceiptStatus {
    Success,
    Failed,
}

impl ReceiptStatus {
    /// Encodage compact (1 = succès, 0 = échec)
    pub fn as_byte(&self) -> u8 {
        match self {
            ReceiptStatus::Success => 1,
            ReceiptStatus::Failed => 0,
        }
    }
}

/// Receipt d'une transaction incluse dans un bloc
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionReceipt {
    pub tx_hash: Hash,

    /// Gas cumulé dans le bloc, transaction incluse
    pub cumulative_gas: Gas,
    pub gas_used: Gas,
    pub rent_gas_used: Gas,
    pub status: ReceiptStatus,
    pub logs: Vec<LogInfo>,
}

impl TransactionReceipt {
    pub fn is_successful(&self) -> bool {
        self.status == ReceiptStatus::Success
    }

    /// Bytes committed by the block's receipts root
    pub fn encode(&self) -> Vec<u8> {
        bincode::serialize(self).unwrap_or_else(|_| {
            let mut bytes = self.tx_hash.as_bytes().to_vec();
            bytes.extend_from_slice(&self.cumulative_gas.to_be_bytes());
            bytes.push(self.status.as_byte());
            bytes
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_rejection_flag() {
        let mut log = LogInfo::new(Address::from_low_u64(1), vec![DataWord::from_u64(5)], vec![1, 2]);
        assert!(!log.rejected);
        log.reject();
        assert!(log.rejected);
    }

    #[test]
    fn test_receipt_encoding_depends_on_status() {
        let mut receipt = TransactionReceipt {
            tx_hash: Hash::hash(b"tx"),
            cumulative_gas: 21_000,
            gas_used: 21_000,
            rent_gas_used: 0,
            status: ReceiptStatus::Success,
            logs: vec![],
        };
        let ok = receipt.encode();
        receipt.status = ReceiptStatus::Failed;
        assert!(!receipt.is_successful());
        assert_ne!(ok, receipt.encode());
    }
}
