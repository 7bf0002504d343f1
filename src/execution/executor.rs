// Executor - Machine à états d'une transaction
//
// validate -> run -> complete -> finalize
//
// `track` est la vue d'état de la transaction (couche externe), `cache_track`
// la couche d'exécution créée à la construction: elle est commitée en cas de
// succès et annulée en cas d'échec.
use super::activation::ActivationsForBlock;
use super::gas::{capped_refund, GasCost, GasRules};
use super::precompiled::{PrecompiledContract, PrecompiledContracts, PrecompiledEnv};
use super::result::{ProgramResult, VmError};
use super::signature_cache::SignatureCache;
use super::summary::TransactionExecutionSummary;
use super::trace::{
    ProgramSubtrace, ProgramTraceProcessor, SummarizedProgramTrace, TransactionTrace, TransferInvoke,
};
use super::vm::{DefaultProgramInvokeFactory, Interpreter, Program, ProgramInvokeFactory, VmConfig};
use crate::genesis::ChainConfig;
use crate::storage::{BlockStore, ReceiptStore, StateError, StateView};
use crate::types::{
    Address, Balance, ExecutionBlock, Gas, LogInfo, Nonce, ReceiptStatus, Transaction,
    TransactionReceipt,
};
use std::cell::OnceCell;
use std::collections::BTreeSet;
use std::sync::Arc;
use tracing::{debug, trace, warn};

// =============================================================================
// Execution context
// =============================================================================

/// Collaborateurs et paramètres partagés par toutes les transactions d'un bloc
#[derive(Clone)]
pub struct ExecutionContext {
    pub chain: ChainConfig,
    pub block: ExecutionBlock,
    /// Reçoit les fees quand ils ne vont pas au compte du protocole
    pub coinbase: Address,
    pub activations: ActivationsForBlock,
    pub block_store: Arc<dyn BlockStore>,
    pub receipt_store: Arc<dyn ReceiptStore>,
    pub invoke_factory: Arc<dyn ProgramInvokeFactory>,
    pub interpreter: Arc<dyn Interpreter>,
    pub precompiled: Arc<PrecompiledContracts>,
    pub vm_config: VmConfig,
    /// Si faux, les programmes sont préparés et facturés mais pas exécutés
    pub play_vm: bool,
    pub fee_to_protocol_account: bool,
}

impl ExecutionContext {
    pub fn new(
        chain: ChainConfig,
        block: ExecutionBlock,
        block_store: Arc<dyn BlockStore>,
        receipt_store: Arc<dyn ReceiptStore>,
        interpreter: Arc<dyn Interpreter>,
    ) -> Self {
        let activations = chain.activations.for_block(block.number);
        Self {
            coinbase: block.coinbase,
            activations,
            vm_config: chain.vm.clone(),
            fee_to_protocol_account: chain.execution.fee_to_protocol_account,
            invoke_factory: Arc::new(DefaultProgramInvokeFactory),
            precompiled: Arc::new(PrecompiledContracts::with_builtins()),
            play_vm: true,
            chain,
            block,
            block_store,
            receipt_store,
            interpreter,
        }
    }

    pub fn with_precompiled(mut self, precompiled: PrecompiledContracts) -> Self {
        self.precompiled = Arc::new(precompiled);
        self
    }

    pub fn with_invoke_factory(mut self, factory: Arc<dyn ProgramInvokeFactory>) -> Self {
        self.invoke_factory = factory;
        self
    }

    pub fn with_coinbase(mut self, coinbase: Address) -> Self {
        self.coinbase = coinbase;
        self
    }

    pub fn with_play_vm(mut self, play_vm: bool) -> Self {
        self.play_vm = play_vm;
        self
    }

    pub fn with_fee_to_protocol_account(mut self, enabled: bool) -> Self {
        self.fee_to_protocol_account = enabled;
        self
    }

    /// Compte crédité des fees de transaction
    pub fn fee_recipient(&self) -> Address {
        if self.fee_to_protocol_account {
            self.chain.execution.fee_collector
        } else {
            self.coinbase
        }
    }
}

// =============================================================================
// Validation errors
// =============================================================================

/// Raisons de rejet d'une transaction
#[derive(Debug, thiserror::Error, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Too much gas used in this block: available in block: {available} tx sent: {tx_gas_limit}")]
    BlockGasLimitReached { available: i128, tx_gas_limit: Gas },

    #[error("Not enough gas for transaction execution: tx needs: {required} tx sent: {tx_gas_limit}")]
    NotEnoughGas { required: Gas, tx_gas_limit: Gas },

    #[error("Invalid nonce: required: {required} , tx.nonce: {actual}")]
    InvalidNonce { required: Nonce, actual: Nonce },

    #[error("Not enough cash: Require: {required}, Sender cash: {available}")]
    NotEnoughCash { required: Balance, available: Balance },

    #[error("Receiver address too long: size: {0}")]
    ReceiverAddressTooLong(usize),

    #[error("Transaction signature not accepted: {0}")]
    SignatureNotAccepted(String),
}

// =============================================================================
// Transaction executor
// =============================================================================

/// Chemin d'exécution choisi une fois par transaction
enum Dispatch {
    ContractCreation { address: Address },
    PrecompiledCall { address: Address, contract: Box<dyn PrecompiledContract> },
    BytecodeCall { address: Address, code: Vec<u8> },
    PlainTransfer { address: Address },
}

impl Dispatch {
    fn kind(&self) -> &'static str {
        match self {
            Dispatch::ContractCreation { .. } => "contract creation",
            Dispatch::PrecompiledCall { .. } => "precompiled call",
            Dispatch::BytecodeCall { .. } => "bytecode call",
            Dispatch::PlainTransfer { .. } => "plain transfer",
        }
    }
}

/// Exécute une transaction sur une vue d'état propre à la transaction
pub struct TransactionExecutor<'a> {
    ctx: &'a ExecutionContext,
    tx: &'a Transaction,
    tx_index: usize,
    track: &'a mut dyn StateView,
    cache_track: Box<dyn StateView>,
    signature_cache: &'a mut SignatureCache,
    deleted_accounts: BTreeSet<Address>,
    gas_used_in_block: Gas,
    gas_rules: GasRules,

    local_call: bool,
    execution_error: String,
    basic_tx_cost: Gas,
    /// Gas à rembourser à l'émetteur
    m_end_gas: Gas,
    /// Rent gas à rembourser à l'émetteur
    m_end_rent_gas: Gas,
    prepaid: bool,

    result: ProgramResult,
    program: Option<Program>,
    subtraces: Vec<ProgramSubtrace>,
    new_contract_address: Option<Address>,
    creation_constraint_failed: bool,

    logs: Vec<LogInfo>,
    paid_fees: Balance,
    summary: Option<TransactionExecutionSummary>,
    receipt: OnceCell<TransactionReceipt>,
}

impl<'a> TransactionExecutor<'a> {
    pub fn new(
        ctx: &'a ExecutionContext,
        tx: &'a Transaction,
        tx_index: usize,
        track: &'a mut dyn StateView,
        gas_used_in_block: Gas,
        deleted_accounts: &BTreeSet<Address>,
        signature_cache: &'a mut SignatureCache,
    ) -> Self {
        let cache_track = track.start_tracking();
        Self {
            ctx,
            tx,
            tx_index,
            track,
            cache_track,
            signature_cache,
            deleted_accounts: deleted_accounts.clone(),
            gas_used_in_block,
            gas_rules: GasRules::for_activations(&ctx.activations),
            local_call: false,
            execution_error: String::new(),
            basic_tx_cost: 0,
            m_end_gas: 0,
            m_end_rent_gas: 0,
            prepaid: false,
            result: ProgramResult::new(),
            program: None,
            subtraces: Vec::new(),
            new_contract_address: None,
            creation_constraint_failed: false,
            logs: Vec::new(),
            paid_fees: 0,
            summary: None,
            receipt: OnceCell::new(),
        }
    }

    /// Simulation en lecture seule: nonce, soldes et fees inchangés
    pub fn set_local_call(mut self, local_call: bool) -> Self {
        self.local_call = local_call;
        self
    }

    /// Valide puis exécute la transaction. `false` signifie un rejet
    /// avant toute modification d'état.
    pub fn execute_transaction(&mut self) -> bool {
        if !self.validate() {
            return false;
        }
        self.run();
        self.complete();
        self.finalize();
        true
    }

    // =========================================================================
    // Validation
    // =========================================================================

    fn validate(&mut self) -> bool {
        self.basic_tx_cost = self.ctx.chain.transaction_cost(self.tx, &self.ctx.activations);

        if self.local_call {
            return true;
        }

        match self.check_validity() {
            Ok(()) => true,
            Err(err) => {
                warn!("Transaction {} rejected: {}", self.tx.hash(), err);
                self.execution_error = err.to_string();
                false
            }
        }
    }

    fn check_validity(&mut self) -> Result<(), ValidationError> {
        let tx_gas_limit = GasCost::to_gas(self.tx.gas_limit());
        let tx_rent_gas_limit = GasCost::to_gas(self.tx.rent_gas_limit());
        let block_gas_limit = GasCost::to_gas(self.ctx.block.gas_limit);

        // Rent gas does not count towards the block gas limit
        let cumulative_gas = GasCost::add(tx_gas_limit, self.gas_used_in_block);
        if cumulative_gas > block_gas_limit || cumulative_gas == GasCost::MAX_GAS {
            return Err(ValidationError::BlockGasLimitReached {
                available: block_gas_limit as i128 - tx_gas_limit as i128,
                tx_gas_limit,
            });
        }
        if tx_gas_limit < self.basic_tx_cost {
            return Err(ValidationError::NotEnoughGas {
                required: self.basic_tx_cost,
                tx_gas_limit,
            });
        }

        let sender = self.signature_cache.get_sender(self.tx);
        let required_nonce = self.track.get_nonce(&sender);
        if required_nonce != self.tx.nonce() {
            return Err(ValidationError::InvalidNonce {
                required: required_nonce,
                actual: self.tx.nonce(),
            });
        }

        let mut total_cost = self.tx.value();
        if self.basic_tx_cost > 0 {
            let gas_cost = GasCost::to_balance(tx_gas_limit, self.tx.gas_price());
            let rent_gas_cost = GasCost::to_balance(tx_rent_gas_limit, self.tx.gas_price());
            total_cost = total_cost.saturating_add(gas_cost).saturating_add(rent_gas_cost);
        }
        let sender_balance = self.track.get_balance(&sender);
        if sender_balance < total_cost {
            return Err(ValidationError::NotEnoughCash {
                required: total_cost,
                available: sender_balance,
            });
        }

        let receiver = self.tx.receiver_bytes();
        if !receiver.is_empty() && receiver.len() > self.ctx.chain.execution.max_address_byte_length {
            return Err(ValidationError::ReceiverAddressTooLong(receiver.len()));
        }
        if !self.tx.accept_signature(self.ctx.chain.chain_id) {
            return Err(ValidationError::SignatureNotAccepted(self.tx.signature_display()));
        }

        Ok(())
    }

    // =========================================================================
    // Run
    // =========================================================================

    fn run(&mut self) {
        trace!("Execute transaction {} {}", self.tx.nonce(), self.tx.hash());

        if !self.local_call {
            if let Err(err) = self.prepay() {
                self.m_end_gas = 0;
                self.exec_error(format!("Gas prepayment failed: {}", err));
                self.result.set_exception(VmError::Transfer(err));
                return;
            }
            self.prepaid = true;
        }

        let dispatch = self.select_dispatch();
        debug!("Transaction {} dispatched as {}", self.tx.hash(), dispatch.kind());

        match dispatch {
            Dispatch::ContractCreation { address } => self.create(address),
            Dispatch::PrecompiledCall { address, contract } => {
                if self.call_precompiled(address, contract) {
                    self.transfer_value_if_no_exception(address);
                }
            }
            Dispatch::BytecodeCall { address, code } => {
                self.prepare_program(address, code);
                self.transfer_value_if_no_exception(address);
            }
            Dispatch::PlainTransfer { address } => {
                let tx_gas_limit = GasCost::to_gas(self.tx.gas_limit());
                self.m_end_gas = GasCost::subtract(tx_gas_limit, self.basic_tx_cost).unwrap_or(0);
                self.result.spend_gas(self.basic_tx_cost);
                self.transfer_value_if_no_exception(address);
            }
        }
    }

    /// Incrémente le nonce et prélève d'avance tout le gas et le rent gas
    fn prepay(&mut self) -> Result<(), StateError> {
        let sender = self.tx.sender();
        self.track.increase_nonce(&sender);

        let tx_gas_limit = GasCost::to_gas(self.tx.gas_limit());
        let tx_rent_gas_limit = GasCost::to_gas(self.tx.rent_gas_limit());
        let gas_cost = GasCost::to_balance(tx_gas_limit, self.tx.gas_price());
        let rent_gas_cost = GasCost::to_balance(tx_rent_gas_limit, self.tx.gas_price());
        self.track.sub_balance(&sender, gas_cost.saturating_add(rent_gas_cost))?;

        trace!(
            "Paying: txGasCost: [{}], txRentGasCost: [{}], gasPrice: [{}], gasLimit: [{}], rentGasLimit: [{}]",
            gas_cost,
            rent_gas_cost,
            self.tx.gas_price(),
            tx_gas_limit,
            tx_rent_gas_limit
        );
        Ok(())
    }

    fn select_dispatch(&self) -> Dispatch {
        let Some(receiver) = self.tx.receive_address() else {
            let address = self.track.contract_address(&self.tx.sender(), self.tx.nonce());
            return Dispatch::ContractCreation { address };
        };
        if let Some(contract) = self
            .ctx
            .precompiled
            .get_contract_for_address(&self.ctx.activations, &receiver)
        {
            return Dispatch::PrecompiledCall {
                address: receiver,
                contract,
            };
        }
        match self.track.get_code(&receiver) {
            Some(code) if !code.is_empty() => Dispatch::BytecodeCall {
                address: receiver,
                code,
            },
            _ => Dispatch::PlainTransfer { address: receiver },
        }
    }

    fn create(&mut self, address: Address) {
        self.new_contract_address = Some(address);
        self.cache_track.create_account(&address);

        if self.tx.data().is_empty() {
            // Account without code nor storage root
            let tx_gas_limit = GasCost::to_gas(self.tx.gas_limit());
            self.m_end_gas = GasCost::subtract(tx_gas_limit, self.basic_tx_cost).unwrap_or(0);
            self.result.spend_gas(self.basic_tx_cost);
        } else {
            self.cache_track.setup_contract(&address);
            self.prepare_program(address, self.tx.data().to_vec());
        }

        let sender = self.tx.sender();
        if let Err(err) = self.cache_track.transfer(&sender, &address, self.tx.value()) {
            self.fail_run(VmError::Transfer(err));
        }
    }

    /// Exécute un contrat natif. Retourne false si l'appel s'arrête avant
    /// le transfert de valeur.
    fn call_precompiled(&mut self, address: Address, mut contract: Box<dyn PrecompiledContract>) -> bool {
        contract.init(&PrecompiledEnv {
            tx: self.tx,
            block: &self.ctx.block,
            block_store: &self.ctx.block_store,
            receipt_store: &self.ctx.receipt_store,
        });

        let required_gas = contract.required_gas(self.tx.data());
        let tx_gas_limit = GasCost::to_gas(self.tx.gas_limit());
        let tx_rent_gas_limit = GasCost::to_gas(self.tx.rent_gas_limit());
        let gas_used = GasCost::add(required_gas, self.basic_tx_cost);

        if !self.local_call && !self.gas_rules.has_enough_gas(tx_gas_limit, required_gas, gas_used) {
            self.exec_error(format!(
                "Out of Gas calling precompiled contract at block {} for address {}. required: {}, used: {}, left: {} ",
                self.ctx.block.number, address, required_gas, gas_used, self.m_end_gas
            ));
            self.m_end_gas = 0;
            // A quarter of the rent gas is retained
            self.m_end_rent_gas = (tx_rent_gas_limit as u128 * 3 / 4) as Gas;
            return false;
        }

        self.m_end_gas = match self.gas_rules.subtract(tx_gas_limit, gas_used) {
            Ok(left) => left,
            Err(err) => {
                self.result.set_exception(VmError::InvalidGas(err));
                0
            }
        };
        self.m_end_rent_gas = tx_rent_gas_limit;

        match contract.execute(self.tx.data()) {
            Ok(out) => {
                self.subtraces = contract.subtraces();
                self.result.set_h_return(out);
                // Built-ins become regular contract accounts on first call
                if !self.cache_track.is_exist(&address) {
                    self.cache_track.create_account(&address);
                    self.cache_track.setup_contract(&address);
                } else if !self.cache_track.is_contract(&address) {
                    self.cache_track.setup_contract(&address);
                }
            }
            Err(err) => {
                debug!("Precompiled contract {} failed: {}", address, err);
                self.result.set_exception(VmError::Precompiled(err.to_string()));
            }
        }
        self.result.spend_gas(gas_used);
        true
    }

    fn prepare_program(&mut self, owner: Address, code: Vec<u8>) {
        let invoke = self.ctx.invoke_factory.create_program_invoke(
            self.tx,
            self.tx_index,
            owner,
            &self.ctx.block,
            self.cache_track.as_ref(),
        );
        self.program = Some(Program::new(
            &self.ctx.vm_config,
            code,
            invoke,
            self.deleted_accounts.clone(),
        ));
    }

    fn transfer_value_if_no_exception(&mut self, to: Address) {
        if self.result.exception().is_some() {
            return;
        }
        let sender = self.tx.sender();
        if let Err(err) = self.cache_track.transfer(&sender, &to, self.tx.value()) {
            self.fail_run(VmError::Transfer(err));
        }
    }

    /// Échec dur levé avant l'interpréteur
    fn fail_run(&mut self, error: VmError) {
        self.cache_track.rollback();
        self.program = None;
        self.m_end_gas = 0;
        self.exec_error(error.to_string());
        self.result.set_exception(error);
    }

    // =========================================================================
    // Interpreter completion
    // =========================================================================

    fn complete(&mut self) {
        let Some(mut program) = self.program.take() else {
            self.cache_track.commit();
            return;
        };

        trace!("Go transaction {} {}", self.tx.nonce(), self.tx.hash());

        let outcome = self.play(&mut program);
        self.result = program.result().clone();
        self.program = Some(program);

        match outcome {
            Ok(()) => self.cache_track.commit(),
            Err(err) => {
                self.cache_track.rollback();
                self.m_end_gas = 0;
                self.exec_error(err.to_string());
                if self.result.exception().is_none() {
                    self.result.set_exception(err);
                }
                // The pre-created account survives a rejected deployment
                if self.creation_constraint_failed {
                    if let Some(address) = self.new_contract_address {
                        if !self.cache_track.is_exist(&address) {
                            self.cache_track.create_account(&address);
                        }
                        self.cache_track.commit();
                    }
                }
            }
        }
    }

    fn play(&mut self, program: &mut Program) -> Result<(), VmError> {
        program.spend_gas(self.basic_tx_cost, "TRANSACTION COST")?;

        if self.ctx.play_vm {
            self.ctx.interpreter.play(program, self.cache_track.as_mut());
        }

        let tx_gas_limit = GasCost::to_gas(self.tx.gas_limit());
        self.m_end_gas = GasCost::subtract(tx_gas_limit, program.result().gas_used())?;

        if let Some(address) = self.new_contract_address {
            if !program.result().is_revert() {
                self.create_contract(program, address)?;
            }
        }

        let result = program.result_mut();
        if result.exception().is_some() || result.is_revert() {
            result.clear_fields_on_exception();
            self.cache_track.rollback();

            if let Some(exception) = result.exception() {
                return Err(exception.clone());
            }
            self.exec_error("REVERT opcode executed");
        }
        Ok(())
    }

    /// Facture et enregistre le code retourné par le code d'init
    fn create_contract(&mut self, program: &mut Program, address: Address) -> Result<(), VmError> {
        let size = program.result().h_return().len();
        let data_cost = GasCost::multiply(GasCost::CREATE_DATA, size as Gas);
        let max_size = self.ctx.chain.execution.max_contract_size;

        if self.m_end_gas < data_cost {
            let failure = program.not_enough_spending_gas("No gas to return just created contract", data_cost);
            program.set_runtime_failure(failure);
            program.set_h_return(Vec::new());
            self.creation_constraint_failed = true;
        } else if size > max_size {
            program.set_runtime_failure(VmError::ContractTooLarge {
                max: max_size,
                size,
            });
            program.set_h_return(Vec::new());
            self.creation_constraint_failed = true;
        } else {
            self.m_end_gas = GasCost::subtract(self.m_end_gas, data_cost)?;
            program.spend_gas(data_cost, "CONTRACT DATA COST")?;
            let code = program.result().h_return().to_vec();
            self.cache_track.save_code(&address, code);
        }
        Ok(())
    }

    // =========================================================================
    // Finalization
    // =========================================================================

    fn finalize(&mut self) {
        if self.local_call {
            return;
        }

        trace!("Finalize transaction {} {}", self.tx.nonce(), self.tx.hash());

        self.cache_track.commit();
        self.signature_cache.store_sender(self.tx);

        let logs = self.result.accepted_logs();
        let gas_leftover = self.m_end_gas;

        let deleted = self.result.delete_accounts().len() as Gas;
        self.result.add_future_refund(GasCost::multiply(deleted, GasCost::SUICIDE_REFUND));
        let gas_refund = capped_refund(self.result.future_refund(), self.result.gas_used());
        self.m_end_gas = self.gas_rules.add(self.m_end_gas, gas_refund);

        let summary = TransactionExecutionSummary {
            tx_hash: self.tx.hash(),
            value: self.tx.value(),
            gas_price: self.tx.gas_price(),
            gas_limit: GasCost::to_gas(self.tx.gas_limit()),
            gas_used: self.result.gas_used(),
            gas_leftover,
            gas_refund,
            logs: logs.clone(),
            deleted_accounts: self.result.delete_accounts().clone(),
            internal_transactions: self.result.internal_transactions().to_vec(),
            result: self.result.h_return().to_vec(),
            failed: self.result.exception().is_some(),
        };

        if self.prepaid {
            let sender = self.tx.sender();
            let refund = summary.leftover().saturating_add(summary.refund());
            self.track.add_balance(&sender, refund);
            trace!("Pay total refund to sender: [{}], refund val: [{}]", sender, refund);

            let fee = summary.fee();
            let recipient = self.ctx.fee_recipient();
            self.track.add_balance(&recipient, fee);
            debug!("Transaction {} paid fee {} to {}", self.tx.hash(), fee, recipient);
            self.paid_fees = fee;
        }

        self.logs = logs;

        for (address, code) in self.result.code_changes() {
            self.track.save_code(address, code.clone());
        }
        for address in self.result.delete_accounts() {
            self.track.delete(address);
        }

        self.summary = Some(summary);
        trace!("tx finalization done");
    }

    fn exec_error(&mut self, error: impl Into<String>) {
        let error = error.into();
        warn!("Transaction {}: {}", self.tx.hash(), error);
        self.execution_error = error;
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    /// Receipt, construit au premier accès
    pub fn get_receipt(&self) -> &TransactionReceipt {
        self.receipt.get_or_init(|| {
            let gas_used = self.get_gas_used();
            TransactionReceipt {
                tx_hash: self.tx.hash(),
                cumulative_gas: GasCost::add(self.gas_used_in_block, gas_used),
                gas_used,
                rent_gas_used: self.get_rent_gas_used(),
                status: if self.execution_error.is_empty() {
                    ReceiptStatus::Success
                } else {
                    ReceiptStatus::Failed
                },
                logs: self.logs.clone(),
            }
        })
    }

    pub fn get_result(&self) -> &ProgramResult {
        &self.result
    }

    pub fn get_vm_logs(&self) -> &[LogInfo] {
        &self.logs
    }

    /// Gas facturé à l'émetteur, remboursements déduits
    pub fn get_gas_used(&self) -> Gas {
        self.gas_rules
            .subtract(GasCost::to_gas(self.tx.gas_limit()), self.m_end_gas)
            .unwrap_or(0)
    }

    pub fn get_rent_gas_used(&self) -> Gas {
        self.gas_rules
            .subtract(GasCost::to_gas(self.tx.rent_gas_limit()), self.m_end_rent_gas)
            .unwrap_or(0)
    }

    pub fn get_paid_fees(&self) -> Balance {
        self.paid_fees
    }

    pub fn get_summary(&self) -> Option<&TransactionExecutionSummary> {
        self.summary.as_ref()
    }

    /// Vide si la transaction a été acceptée et exécutée sans erreur
    pub fn execution_error(&self) -> &str {
        &self.execution_error
    }

    pub fn gas_leftover(&self) -> Gas {
        self.m_end_gas
    }

    pub fn rent_gas_leftover(&self) -> Gas {
        self.m_end_rent_gas
    }

    pub fn basic_tx_cost(&self) -> Gas {
        self.basic_tx_cost
    }

    pub fn new_contract_address(&self) -> Option<Address> {
        self.new_contract_address
    }

    pub fn self_destructed_accounts(&self) -> &BTreeSet<Address> {
        self.result.delete_accounts()
    }

    /// Envoie la trace d'exécution à `processor`: la trace de l'interpréteur
    /// si du bytecode a tourné, sinon un résumé du transfert
    pub fn extract_trace(&self, processor: &mut dyn ProgramTraceProcessor) {
        let trace = match &self.program {
            Some(program) => TransactionTrace::Program(
                program
                    .trace()
                    .clone()
                    .with_result(self.result.h_return())
                    .with_error(self.result.exception().map(|e| e.to_string()))
                    .with_revert(self.result.is_revert()),
            ),
            None => {
                let mut trace = SummarizedProgramTrace::new(TransferInvoke {
                    sender: self.tx.sender(),
                    receiver: self.tx.receive_address(),
                    gas: 0,
                    value: self.tx.value(),
                });
                for subtrace in &self.subtraces {
                    trace.add_subtrace(subtrace.clone());
                }
                TransactionTrace::Summarized(trace)
            }
        };
        processor.process_program_trace(trace, self.tx.hash());
    }

    /// Enregistre dans la table de rent les noeuds du trie d'un compte créé:
    /// le noeud du compte, et pour un contrat le code et la racine de storage
    pub fn record_new_node(&mut self, address: &Address) {
        let key = self.track.account_node_key(address);
        let length = self.track.account_node_value_length(address);
        self.result.add_new_trie_node(key, length);

        if self.track.is_contract(address) {
            let code_key = self.track.code_node_key(address);
            let code_length = self.track.code_node_length(address);
            self.result.add_new_trie_node(code_key, code_length);

            let root_key = self.track.storage_root_key(address);
            let root_length = self.track.storage_root_value_length(address);
            self.result.add_new_trie_node(root_key, root_length);
        }
    }
}
