// Reversible - Appels locaux sans effet sur l'état (call / estimateGas)
use super::executor::{ExecutionContext, TransactionExecutor};
use super::result::ProgramResult;
use super::signature_cache::SignatureCache;
use crate::storage::StateView;
use crate::types::{Address, Balance, Gas, UnsignedTransaction};
use std::collections::BTreeSet;
use tracing::debug;

/// Selector of the ABI `Error(string)` revert payload
pub const REVERT_REASON_SELECTOR: [u8; 4] = [0x08, 0xc3, 0x79, 0xa0];

/// Read-only call parameters
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CallRequest {
    pub from: Address,
    /// `None` simulates a contract creation
    pub to: Option<Address>,
    pub value: Balance,
    pub gas_price: Balance,
    pub gas_limit: Gas,
    pub data: Vec<u8>,
}

/// Outcome of a local call
#[derive(Debug, Clone, PartialEq)]
pub struct CallOutcome {
    pub result: ProgramResult,
    pub execution_error: String,
}

impl CallOutcome {
    pub fn return_data(&self) -> &[u8] {
        self.result.h_return()
    }

    pub fn revert_reason(&self) -> Option<String> {
        if !self.result.is_revert() {
            return None;
        }
        decode_revert_reason(self.result.h_return())
    }
}

/// Runs transactions as local calls on a throw-away layer over `state`
pub struct ReversibleTransactionExecutor<'s> {
    ctx: ExecutionContext,
    state: &'s dyn StateView,
}

impl<'s> ReversibleTransactionExecutor<'s> {
    pub fn new(ctx: ExecutionContext, state: &'s dyn StateView) -> Self {
        Self { ctx, state }
    }

    pub fn execute_transaction(&self, call: &CallRequest) -> CallOutcome {
        let mut snapshot = self.state.start_tracking();
        let nonce = snapshot.get_nonce(&call.from);

        let tx = UnsignedTransaction {
            nonce,
            gas_price: call.gas_price,
            gas_limit: call.gas_limit,
            rent_gas_limit: 0,
            receiver: call.to.map(|a| a.as_bytes().to_vec()).unwrap_or_default(),
            value: call.value,
            data: call.data.clone(),
            chain_id: self.ctx.chain.chain_id,
        }
        .into_local_call(call.from);

        let mut signature_cache = SignatureCache::new(1);
        let mut executor = TransactionExecutor::new(
            &self.ctx,
            &tx,
            0,
            snapshot.as_mut(),
            0,
            &BTreeSet::new(),
            &mut signature_cache,
        )
        .set_local_call(tx.is_local_call());
        executor.execute_transaction();

        debug!(
            "Local call from {} used {} gas",
            call.from,
            executor.get_result().gas_used()
        );

        CallOutcome {
            result: executor.get_result().clone(),
            execution_error: executor.execution_error().to_string(),
        }
    }

    /// Gas consumed by the call, intrinsic cost included
    pub fn estimate_gas(&self, call: &CallRequest) -> Gas {
        self.execute_transaction(call).result.gas_used()
    }
}

/// Extracts the message of an ABI-encoded `Error(string)` payload
pub fn decode_revert_reason(data: &[u8]) -> Option<String> {
    let body = data.strip_prefix(&REVERT_REASON_SELECTOR)?;
    let offset = read_word(body, 0)?;
    let length = read_word(body, offset)?;
    let start = offset.checked_add(32)?;
    let end = start.checked_add(length)?;
    let bytes = body.get(start..end)?;
    String::from_utf8(bytes.to_vec()).ok()
}

/// Big-endian 32-byte word at `at`, if it fits in a usize
fn read_word(data: &[u8], at: usize) -> Option<usize> {
    let word = data.get(at..at.checked_add(32)?)?;
    let (high, low) = word.split_at(24);
    if high.iter().any(|b| *b != 0) {
        return None;
    }
    let mut bytes = [0u8; 8];
    bytes.copy_from_slice(low);
    usize::try_from(u64::from_be_bytes(bytes)).ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn encode_reason(reason: &str) -> Vec<u8> {
        let mut data = REVERT_REASON_SELECTOR.to_vec();
        let mut offset = [0u8; 32];
        offset[31] = 32;
        data.extend_from_slice(&offset);
        let mut length = [0u8; 32];
        length[24..].copy_from_slice(&(reason.len() as u64).to_be_bytes());
        data.extend_from_slice(&length);
        let mut padded = reason.as_bytes().to_vec();
        padded.resize(reason.len().div_ceil(32) * 32, 0);
        data.extend_from_slice(&padded);
        data
    }

    #[test]
    fn test_decode_revert_reason() {
        let data = encode_reason("insufficient allowance");
        assert_eq!(decode_revert_reason(&data).as_deref(), Some("insufficient allowance"));
    }

    #[test]
    fn test_decode_rejects_other_payloads() {
        assert_eq!(decode_revert_reason(&[]), None);
        assert_eq!(decode_revert_reason(&[0xde, 0xad, 0xbe, 0xef]), None);

        let mut truncated = encode_reason("too short");
        truncated.truncate(4 + 64 + 3);
        assert_eq!(decode_revert_reason(&truncated), None);

        let mut wrong = encode_reason("x");
        wrong[0] = 0x00;
        assert_eq!(decode_revert_reason(&wrong), None);
    }
}
