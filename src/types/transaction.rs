// Transaction - Appel de contrat, création ou simple transfert
use super::primitives::{Address, Balance, Gas, Hash, Nonce};
use super::signature::{domain_separate, TxSignature, DOMAIN_TRANSACTION};
use ed25519_dalek::SigningKey;
use serde::{Deserialize, Serialize};
use std::cell::OnceCell;

/// Transaction fields covered by the signature
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnsignedTransaction {
    pub nonce: Nonce,
    pub gas_price: Balance,
    pub gas_limit: Gas,
    /// Storage-rent gas limit, pre-paid together with `gas_limit`
    pub rent_gas_limit: Gas,
    /// Raw receiver address; empty for contract creation
    pub receiver: Vec<u8>,
    pub value: Balance,
    pub data: Vec<u8>,
    /// 0 = valid on any chain
    pub chain_id: u8,
}

impl UnsignedTransaction {
    /// Domain-separated signing payload
    pub fn signing_message(&self) -> Option<Vec<u8>> {
        let bytes = bincode::serialize(self).ok()?;
        Some(domain_separate(DOMAIN_TRANSACTION, &bytes))
    }

    /// Signe la transaction
    pub fn sign(self, key: &SigningKey) -> Transaction {
        let message = self.signing_message().unwrap_or_default();
        let signature = TxSignature::sign(key, &message);
        Transaction::new(self, TransactionAuth::Signed(signature))
    }

    /// Unsigned transaction carrying an explicit sender, only meant for
    /// local (read-only) calls.
    pub fn into_local_call(self, sender: Address) -> Transaction {
        Transaction::new(self, TransactionAuth::LocalCall { sender })
    }
}

/// How the sender of a transaction is established
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum TransactionAuth {
    Signed(TxSignature),
    LocalCall { sender: Address },
}

/// Transaction signée, immutable once built
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Transaction {
    unsigned: UnsignedTransaction,
    auth: TransactionAuth,

    #[serde(skip)]
    sender: OnceCell<Address>,

    #[serde(skip)]
    hash: OnceCell<Hash>,
}

impl Transaction {
    pub fn new(unsigned: UnsignedTransaction, auth: TransactionAuth) -> Self {
        Self {
            unsigned,
            auth,
            sender: OnceCell::new(),
            hash: OnceCell::new(),
        }
    }

    pub fn nonce(&self) -> Nonce {
        self.unsigned.nonce
    }

    pub fn gas_price(&self) -> Balance {
        self.unsigned.gas_price
    }

    pub fn gas_limit(&self) -> Gas {
        self.unsigned.gas_limit
    }

    pub fn rent_gas_limit(&self) -> Gas {
        self.unsigned.rent_gas_limit
    }

    pub fn value(&self) -> Balance {
        self.unsigned.value
    }

    pub fn data(&self) -> &[u8] {
        &self.unsigned.data
    }

    pub fn chain_id(&self) -> u8 {
        self.unsigned.chain_id
    }

    pub fn auth(&self) -> &TransactionAuth {
        &self.auth
    }

    /// Raw receiver bytes as sent
    pub fn receiver_bytes(&self) -> &[u8] {
        &self.unsigned.receiver
    }

    /// Receiver address, `None` for contract creation
    pub fn receive_address(&self) -> Option<Address> {
        if self.unsigned.receiver.is_empty() {
            None
        } else {
            Some(Address::from_slice(&self.unsigned.receiver))
        }
    }

    pub fn is_contract_creation(&self) -> bool {
        self.unsigned.receiver.is_empty()
    }

    pub fn is_local_call(&self) -> bool {
        matches!(self.auth, TransactionAuth::LocalCall { .. })
    }

    /// Sender address, recovered from the signature on first access
    pub fn sender(&self) -> Address {
        *self.sender.get_or_init(|| match &self.auth {
            TransactionAuth::Signed(signature) => signature.signer(),
            TransactionAuth::LocalCall { sender } => *sender,
        })
    }

    /// Hash de la transaction
    pub fn hash(&self) -> Hash {
        *self.hash.get_or_init(|| {
            match bincode::serialize(&(&self.unsigned, &self.auth)) {
                Ok(bytes) => Hash::hash(&bytes),
                Err(_) => {
                    let mut data = Vec::new();
                    data.extend_from_slice(&self.unsigned.nonce.to_le_bytes());
                    data.extend_from_slice(&self.unsigned.receiver);
                    data.extend_from_slice(&self.unsigned.data);
                    Hash::hash(&data)
                }
            }
        })
    }

    /// Number of non-zero bytes in the data payload
    pub fn non_zero_data_bytes(&self) -> usize {
        self.unsigned.data.iter().filter(|b| **b != 0).count()
    }

    /// Accepts the signature if the chain id matches (or is 0) and the
    /// Ed25519 signature verifies over the signing payload.
    pub fn accept_signature(&self, chain_id: u8) -> bool {
        if self.unsigned.chain_id != 0 && self.unsigned.chain_id != chain_id {
            return false;
        }
        match &self.auth {
            TransactionAuth::Signed(signature) => match self.unsigned.signing_message() {
                Some(message) => signature.verify(&message),
                None => false,
            },
            TransactionAuth::LocalCall { .. } => false,
        }
    }

    /// Human-readable signature for logs and error messages
    pub fn signature_display(&self) -> String {
        match &self.auth {
            TransactionAuth::Signed(signature) => signature.to_string(),
            TransactionAuth::LocalCall { .. } => "unsigned".to_string(),
        }
    }
}

impl PartialEq for Transaction {
    fn eq(&self, other: &Self) -> bool {
        self.unsigned == other.unsigned && self.auth == other.auth
    }
}

impl Eq for Transaction {}
