// Block - Exécution séquentielle des transactions d'un bloc
use super::executor::{ExecutionContext, TransactionExecutor};
use super::gas::GasCost;
use super::precompiled::PrecompiledContracts;
use super::signature_cache::SignatureCache;
use super::trace::ProgramTraceProcessor;
use super::vm::{Interpreter, ProgramInvokeFactory};
use crate::genesis::ChainConfig;
use crate::storage::{BlockStore, ReceiptStore, StateView};
use crate::types::{Address, Balance, Block, ExecutionBlock, Gas, Hash, OrderedMerkleTree, TransactionReceipt};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Transaction écartée du bloc
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RejectedTransaction {
    pub tx_hash: Hash,
    pub reason: String,
}

/// Résultat de l'exécution d'un bloc
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockResult {
    pub block_hash: Hash,
    pub receipts: Vec<TransactionReceipt>,
    pub rejected: Vec<RejectedTransaction>,
    pub gas_used: Gas,
    pub paid_fees: Balance,
    pub deleted_accounts: BTreeSet<Address>,
    pub receipts_root: Hash,
}

/// Exécuteur de blocs
pub struct BlockExecutor {
    chain: ChainConfig,
    block_store: Arc<dyn BlockStore>,
    receipt_store: Arc<dyn ReceiptStore>,
    interpreter: Arc<dyn Interpreter>,
    precompiled: Option<PrecompiledContracts>,
    invoke_factory: Option<Arc<dyn ProgramInvokeFactory>>,
    play_vm: bool,
    signature_cache: SignatureCache,
}

impl BlockExecutor {
    pub fn new(
        chain: ChainConfig,
        block_store: Arc<dyn BlockStore>,
        receipt_store: Arc<dyn ReceiptStore>,
        interpreter: Arc<dyn Interpreter>,
    ) -> Self {
        let signature_cache = SignatureCache::new(chain.execution.signature_cache_size);
        Self {
            chain,
            block_store,
            receipt_store,
            interpreter,
            precompiled: None,
            invoke_factory: None,
            play_vm: true,
            signature_cache,
        }
    }

    pub fn with_precompiled(mut self, precompiled: PrecompiledContracts) -> Self {
        self.precompiled = Some(precompiled);
        self
    }

    pub fn with_invoke_factory(mut self, factory: Arc<dyn ProgramInvokeFactory>) -> Self {
        self.invoke_factory = Some(factory);
        self
    }

    pub fn with_play_vm(mut self, play_vm: bool) -> Self {
        self.play_vm = play_vm;
        self
    }

    pub fn signature_cache(&self) -> &SignatureCache {
        &self.signature_cache
    }

    /// Contexte d'exécution pour `header`
    pub fn context_for(&self, header: &ExecutionBlock) -> ExecutionContext {
        let mut ctx = ExecutionContext::new(
            self.chain.clone(),
            header.clone(),
            Arc::clone(&self.block_store),
            Arc::clone(&self.receipt_store),
            Arc::clone(&self.interpreter),
        )
        .with_play_vm(self.play_vm);
        if let Some(precompiled) = &self.precompiled {
            ctx = ctx.with_precompiled(precompiled.clone());
        }
        if let Some(factory) = &self.invoke_factory {
            ctx = ctx.with_invoke_factory(Arc::clone(factory));
        }
        ctx
    }

    pub fn execute_block(&mut self, block: &Block, state: &mut dyn StateView) -> BlockResult {
        self.execute(block, state, None)
    }

    /// Comme `execute_block`, en envoyant la trace de chaque transaction à `processor`
    pub fn execute_block_traced(
        &mut self,
        block: &Block,
        state: &mut dyn StateView,
        processor: &mut dyn ProgramTraceProcessor,
    ) -> BlockResult {
        self.execute(block, state, Some(processor))
    }

    fn execute(
        &mut self,
        block: &Block,
        state: &mut dyn StateView,
        mut processor: Option<&mut dyn ProgramTraceProcessor>,
    ) -> BlockResult {
        let ctx = self.context_for(&block.header);
        let block_hash = block.hash();
        let mut track = state.start_tracking();

        let mut receipts = Vec::new();
        let mut rejected = Vec::new();
        let mut deleted_accounts = BTreeSet::new();
        let mut gas_used: Gas = 0;
        let mut paid_fees: Balance = 0;

        for tx in &block.transactions {
            let mut executor = TransactionExecutor::new(
                &ctx,
                tx,
                receipts.len(),
                track.as_mut(),
                gas_used,
                &deleted_accounts,
                &mut self.signature_cache,
            );

            if !executor.execute_transaction() {
                warn!("Transaction {} excluded from block #{}", tx.hash(), block.number());
                rejected.push(RejectedTransaction {
                    tx_hash: tx.hash(),
                    reason: executor.execution_error().to_string(),
                });
                continue;
            }

            if let Some(processor) = processor.as_deref_mut() {
                executor.extract_trace(processor);
            }

            gas_used = GasCost::add(gas_used, executor.get_gas_used());
            paid_fees = paid_fees.saturating_add(executor.get_paid_fees());
            deleted_accounts.extend(executor.self_destructed_accounts().iter().copied());
            receipts.push(executor.get_receipt().clone());
        }

        track.commit();

        for (index, receipt) in receipts.iter().enumerate() {
            self.receipt_store.add(block_hash, index, receipt.clone());
        }
        self.block_store.save_block(&block.header);

        let receipts_root = OrderedMerkleTree::new(receipts.iter().map(|r| r.encode())).root();

        info!(
            "Block #{} executed: {} tx, {} rejected, gas used {}, fees {}",
            block.number(),
            receipts.len(),
            rejected.len(),
            gas_used,
            paid_fees
        );
        debug!("Receipts root of block #{}: {:?}", block.number(), receipts_root);

        BlockResult {
            block_hash,
            receipts,
            rejected,
            gas_used,
            paid_fees,
            deleted_accounts,
            receipts_root,
        }
    }
}
