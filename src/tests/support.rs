// Support - Fixtures partagées par les tests d'exécution

use crate::execution::trace::TraceStep;
use crate::execution::{
    ExecutionContext, Interpreter, Program, ProgramResult, SignatureCache,
    TransactionExecutionSummary, TransactionExecutor, VmError,
};
use crate::genesis::config::DEFAULT_BLOCK_GAS_LIMIT;
use crate::genesis::ChainConfig;
use crate::storage::{BlockStore, MemoryBlockStore, MemoryReceiptStore, OverlayState, StateView};
use crate::types::*;
use ed25519_dalek::SigningKey;
use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;

pub const COINBASE: Address = Address::from_low_u64(0xC0FFEE);
pub const RECEIVER: Address = Address::from_low_u64(0xBEEF);
pub const CONTRACT: Address = Address::from_low_u64(0xC0DE);
pub const BENEFICIARY: Address = Address::from_low_u64(0xB0B);

pub const CHAIN_ID: u8 = 33;
pub const RICH: Balance = 10_000_000;

// ===== SCRIPTED INTERPRETER =====

/// One action of a scripted program
#[derive(Debug, Clone)]
pub enum Step {
    Spend(Gas),
    Return(Vec<u8>),
    Revert,
    Fail(&'static str),
    Store(u64, u64),
    Log(LogInfo),
    SelfDestruct(Address),
    FutureRefund(Gas),
}

/// Interpreter running a fixed list of steps, selected by the program code
#[derive(Debug, Clone, Default)]
pub struct ScriptedInterpreter {
    scripts: HashMap<Vec<u8>, Vec<Step>>,
}

impl ScriptedInterpreter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, code: &[u8], steps: Vec<Step>) -> Self {
        self.scripts.insert(code.to_vec(), steps);
        self
    }
}

impl Interpreter for ScriptedInterpreter {
    fn play(&self, program: &mut Program, state: &mut dyn StateView) {
        let Some(steps) = self.scripts.get(program.code()) else {
            return;
        };
        for (pc, step) in steps.iter().enumerate() {
            program.record_step(TraceStep {
                pc: pc as u64,
                op: format!("{:?}", step),
                gas: program.gas_remaining(),
                gas_cost: 0,
                depth: 0,
            });
            let owner = program.owner();
            match step {
                Step::Spend(gas) => {
                    if let Err(err) = program.spend_gas(*gas, "SCRIPT") {
                        program.spend_all_gas();
                        program.set_runtime_failure(err);
                        return;
                    }
                }
                Step::Return(data) => program.set_h_return(data.clone()),
                Step::Revert => {
                    program.result_mut().set_revert();
                    return;
                }
                Step::Fail(reason) => {
                    program.set_runtime_failure(VmError::Runtime(reason.to_string()));
                    return;
                }
                Step::Store(key, value) => {
                    state.put_storage(owner, DataWord::from_u64(*key), DataWord::from_u64(*value));
                }
                Step::Log(log) => program.result_mut().add_log(log.clone()),
                Step::SelfDestruct(beneficiary) => {
                    let balance = state.get_balance(&owner);
                    if state.transfer(&owner, beneficiary, balance).is_ok() {
                        program.result_mut().add_delete_account(owner);
                    }
                }
                Step::FutureRefund(gas) => program.result_mut().add_future_refund(*gas),
            }
        }
    }
}

// ===== KEYS & TRANSACTIONS =====

pub fn alice() -> SigningKey {
    SigningKey::from_bytes(&[0xA1; 32])
}

pub fn bob() -> SigningKey {
    SigningKey::from_bytes(&[0xB2; 32])
}

pub fn address_of(key: &SigningKey) -> Address {
    address_of_public_key(&key.verifying_key().to_bytes())
}

/// Call with gas price 1 and no rent gas
pub fn call(nonce: Nonce, to: Address, value: Balance, gas_limit: Gas) -> UnsignedTransaction {
    UnsignedTransaction {
        nonce,
        gas_price: 1,
        gas_limit,
        rent_gas_limit: 0,
        receiver: to.as_bytes().to_vec(),
        value,
        data: Vec::new(),
        chain_id: CHAIN_ID,
    }
}

pub fn create(nonce: Nonce, init_code: &[u8], value: Balance, gas_limit: Gas) -> UnsignedTransaction {
    UnsignedTransaction {
        nonce,
        gas_price: 1,
        gas_limit,
        rent_gas_limit: 0,
        receiver: Vec::new(),
        value,
        data: init_code.to_vec(),
        chain_id: CHAIN_ID,
    }
}

// ===== CONTEXT =====

/// Main network rules with fees paid to the coinbase
pub fn test_chain() -> ChainConfig {
    let mut chain = ChainConfig::mainnet();
    chain.execution.fee_to_protocol_account = false;
    chain
}

pub fn genesis_block() -> ExecutionBlock {
    ExecutionBlock {
        number: 0,
        parent_hash: Hash::ZERO,
        coinbase: Address::ZERO,
        timestamp: 1_000,
        gas_limit: DEFAULT_BLOCK_GAS_LIMIT,
    }
}

pub fn test_block() -> ExecutionBlock {
    let mut block = genesis_block().child(1_006);
    block.coinbase = COINBASE;
    block
}

pub fn context_with(chain: ChainConfig, interpreter: ScriptedInterpreter) -> ExecutionContext {
    let block_store: Arc<dyn BlockStore> = Arc::new(MemoryBlockStore::new());
    block_store.save_block(&genesis_block());
    ExecutionContext::new(
        chain,
        test_block(),
        block_store,
        Arc::new(MemoryReceiptStore::new()),
        Arc::new(interpreter),
    )
}

pub fn context(interpreter: ScriptedInterpreter) -> ExecutionContext {
    context_with(test_chain(), interpreter)
}

pub fn state_with(accounts: &[(Address, Balance)]) -> OverlayState {
    OverlayState::with_accounts(
        accounts
            .iter()
            .map(|(address, balance)| (*address, AccountState::with_balance(*balance))),
    )
}

/// Installs `code` at `address` as a contract account
pub fn deploy(state: &mut OverlayState, address: Address, code: &[u8], balance: Balance) {
    state.put_account(address, AccountState::with_balance(balance));
    state.setup_contract(&address);
    state.save_code(&address, code.to_vec());
}

// ===== EXECUTION =====

/// Everything observable after one executor run
#[derive(Debug, Clone)]
pub struct Outcome {
    pub accepted: bool,
    pub error: String,
    pub receipt: TransactionReceipt,
    pub gas_used: Gas,
    pub rent_gas_used: Gas,
    pub gas_leftover: Gas,
    pub rent_gas_leftover: Gas,
    pub paid_fees: Balance,
    pub result: ProgramResult,
    pub summary: Option<TransactionExecutionSummary>,
    pub new_contract: Option<Address>,
}

pub fn execute_at(
    ctx: &ExecutionContext,
    tx: &Transaction,
    state: &mut OverlayState,
    gas_used_in_block: Gas,
    local_call: bool,
) -> Outcome {
    let mut cache = SignatureCache::default();
    let mut executor = TransactionExecutor::new(
        ctx,
        tx,
        0,
        state,
        gas_used_in_block,
        &BTreeSet::new(),
        &mut cache,
    )
    .set_local_call(local_call);
    let accepted = executor.execute_transaction();

    Outcome {
        accepted,
        error: executor.execution_error().to_string(),
        receipt: executor.get_receipt().clone(),
        gas_used: executor.get_gas_used(),
        rent_gas_used: executor.get_rent_gas_used(),
        gas_leftover: executor.gas_leftover(),
        rent_gas_leftover: executor.rent_gas_leftover(),
        paid_fees: executor.get_paid_fees(),
        result: executor.get_result().clone(),
        summary: executor.get_summary().cloned(),
        new_contract: executor.new_contract_address(),
    }
}

pub fn execute(ctx: &ExecutionContext, tx: &Transaction, state: &mut OverlayState) -> Outcome {
    execute_at(ctx, tx, state, 0, false)
}
