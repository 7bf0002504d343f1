// Block Flow - Exécution de blocs complets
//
// Rejected transactions are skipped, accepted ones are committed together,
// receipts are stored and the header is saved.

use crate::execution::{BlockExecutor, MemoryTraceProcessor};
use crate::storage::{BlockStore, MemoryBlockStore, MemoryReceiptStore, OverlayState, ReceiptStore, StateView};
use crate::tests::support::*;
use crate::types::{Block, ExecutionBlock, Hash, OrderedMerkleTree, Transaction};
use std::sync::Arc;

struct Harness {
    executor: BlockExecutor,
    block_store: Arc<dyn BlockStore>,
    receipt_store: Arc<dyn ReceiptStore>,
}

fn harness(interpreter: ScriptedInterpreter) -> Harness {
    let block_store: Arc<dyn BlockStore> = Arc::new(MemoryBlockStore::new());
    block_store.save_block(&genesis_block());
    let receipt_store: Arc<dyn ReceiptStore> = Arc::new(MemoryReceiptStore::new());
    let executor = BlockExecutor::new(
        test_chain(),
        Arc::clone(&block_store),
        Arc::clone(&receipt_store),
        Arc::new(interpreter),
    );
    Harness {
        executor,
        block_store,
        receipt_store,
    }
}

fn block_of(header: ExecutionBlock, transactions: Vec<Transaction>) -> Block {
    Block::new(header, transactions)
}

fn funded() -> OverlayState {
    state_with(&[(address_of(&alice()), 1_000_000), (address_of(&bob()), 1_000_000)])
}

#[cfg(test)]
mod block_execution {
    use super::*;

    #[test]
    fn test_mixed_block_skips_rejected_transactions() {
        let mut h = harness(ScriptedInterpreter::new());
        let mut state = funded();

        let first = call(0, RECEIVER, 100, 21_000).sign(&alice());
        let stale = call(5, RECEIVER, 1, 21_000).sign(&alice());
        let second = call(0, RECEIVER, 50, 21_000).sign(&bob());
        let block = block_of(test_block(), vec![first.clone(), stale.clone(), second.clone()]);

        let result = h.executor.execute_block(&block, &mut state);

        assert_eq!(result.block_hash, block.hash());
        assert_eq!(result.receipts.len(), 2);
        assert_eq!(result.rejected.len(), 1);
        assert_eq!(result.rejected[0].tx_hash, stale.hash());
        assert!(result.rejected[0].reason.contains("Invalid nonce: required: 1 , tx.nonce: 5"));

        assert_eq!(result.gas_used, 42_000);
        assert_eq!(result.paid_fees, 42_000);
        assert_eq!(result.receipts[0].cumulative_gas, 21_000);
        assert_eq!(result.receipts[1].cumulative_gas, 42_000);

        // Committed into the caller's state
        assert_eq!(state.get_balance(&RECEIVER), 150);
        assert_eq!(state.get_balance(&COINBASE), 42_000);
        assert_eq!(state.get_nonce(&address_of(&alice())), 1);
        assert_eq!(state.get_nonce(&address_of(&bob())), 1);
    }

    #[test]
    fn test_receipts_and_header_are_stored() {
        let mut h = harness(ScriptedInterpreter::new());
        let mut state = funded();

        let first = call(0, RECEIVER, 100, 21_000).sign(&alice());
        let second = call(0, RECEIVER, 50, 21_000).sign(&bob());
        let block = block_of(test_block(), vec![first.clone(), second.clone()]);

        let result = h.executor.execute_block(&block, &mut state);

        assert_eq!(h.receipt_store.count(), 2);
        let info = h.receipt_store.get(&second.hash()).unwrap();
        assert_eq!(info.block_hash, block.hash());
        assert_eq!(info.tx_index, 1);
        assert_eq!(info.receipt, result.receipts[1]);

        assert_eq!(h.block_store.block_hash(1), Some(block.hash()));
        assert_eq!(h.block_store.best_block_number(), Some(1));

        let expected_root = OrderedMerkleTree::new(result.receipts.iter().map(|r| r.encode())).root();
        assert_eq!(result.receipts_root, expected_root);
        assert_ne!(result.receipts_root, Hash::ZERO);
    }

    #[test]
    fn test_empty_block() {
        let mut h = harness(ScriptedInterpreter::new());
        let mut state = funded();
        let before = state.accounts();

        let result = h.executor.execute_block(&block_of(test_block(), vec![]), &mut state);

        assert!(result.receipts.is_empty());
        assert_eq!(result.gas_used, 0);
        assert_eq!(result.receipts_root, Hash::ZERO);
        assert_eq!(state.accounts(), before);
        assert_eq!(h.block_store.best_block_number(), Some(1));
    }

    #[test]
    fn test_block_gas_limit_excludes_overflowing_transaction() {
        let mut h = harness(ScriptedInterpreter::new());
        let mut state = funded();
        let mut header = test_block();
        header.gas_limit = 50_000;

        let txs: Vec<Transaction> = (0..3).map(|n| call(n, RECEIVER, 1, 21_000).sign(&alice())).collect();
        let result = h.executor.execute_block(&block_of(header, txs.clone()), &mut state);

        assert_eq!(result.receipts.len(), 2);
        assert_eq!(result.rejected.len(), 1);
        assert_eq!(result.rejected[0].tx_hash, txs[2].hash());
        assert_eq!(
            result.rejected[0].reason,
            "Too much gas used in this block: available in block: 29000 tx sent: 21000"
        );
        assert_eq!(state.get_nonce(&address_of(&alice())), 2);
    }

    #[test]
    fn test_failed_transaction_still_gets_a_receipt() {
        let code = [0x02u8];
        let mut h = harness(ScriptedInterpreter::new().with(&code, vec![Step::Fail("bad jump")]));
        let mut state = funded();
        deploy(&mut state, CONTRACT, &code, 0);

        let block = block_of(test_block(), vec![call(0, CONTRACT, 0, 30_000).sign(&alice())]);
        let result = h.executor.execute_block(&block, &mut state);

        assert!(result.rejected.is_empty());
        assert_eq!(result.receipts.len(), 1);
        assert!(!result.receipts[0].is_successful());
        assert_eq!(result.gas_used, 30_000);
    }
}

#[cfg(test)]
mod block_side_effects {
    use super::*;

    const DESTRUCTING: &[u8] = &[0x05];

    #[test]
    fn test_self_destructed_accounts_are_reported() {
        let mut h = harness(ScriptedInterpreter::new().with(DESTRUCTING, vec![Step::SelfDestruct(BENEFICIARY)]));
        let mut state = funded();
        deploy(&mut state, CONTRACT, DESTRUCTING, 300);

        let block = block_of(
            test_block(),
            vec![
                call(0, CONTRACT, 0, 100_000).sign(&alice()),
                // No code left: plain transfer
                call(0, CONTRACT, 7, 100_000).sign(&bob()),
            ],
        );
        let result = h.executor.execute_block(&block, &mut state);

        assert_eq!(result.receipts.len(), 2);
        assert!(result.deleted_accounts.contains(&CONTRACT));
        assert_eq!(result.receipts[1].gas_used, 21_000);
        assert_eq!(state.get_balance(&BENEFICIARY), 300);
        assert_eq!(state.get_balance(&CONTRACT), 7);
        assert!(!state.is_contract(&CONTRACT));
    }

    #[test]
    fn test_traced_block_reports_accepted_transactions_only() {
        let mut h = harness(ScriptedInterpreter::new());
        let mut state = funded();
        let accepted = call(0, RECEIVER, 1, 21_000).sign(&alice());
        let rejected = call(9, RECEIVER, 1, 21_000).sign(&bob());
        let block = block_of(test_block(), vec![accepted.clone(), rejected.clone()]);

        let mut processor = MemoryTraceProcessor::new();
        h.executor.execute_block_traced(&block, &mut state, &mut processor);

        assert_eq!(processor.len(), 1);
        assert!(processor.get(&accepted.hash()).is_some());
        assert!(processor.get(&rejected.hash()).is_none());
    }

    #[test]
    fn test_signature_cache_is_shared_across_blocks() {
        let mut h = harness(ScriptedInterpreter::new());
        let mut state = funded();

        let tx = call(0, RECEIVER, 1, 21_000).sign(&alice());
        let first = test_block();
        h.executor.execute_block(&block_of(first.clone(), vec![tx.clone()]), &mut state);
        assert!(h.executor.signature_cache().contains(&tx.hash()));

        let next = call(1, RECEIVER, 1, 21_000).sign(&alice());
        let result = h
            .executor
            .execute_block(&block_of(first.child(first.timestamp + 6), vec![next.clone()]), &mut state);
        assert_eq!(result.receipts.len(), 1);
        assert!(h.executor.signature_cache().contains(&next.hash()));
        assert_eq!(h.block_store.best_block_number(), Some(2));
    }
}
