// VM - Contrat de l'interpréteur de bytecode
//
// L'interpréteur lui-même est externe: il reçoit un `Program` (contexte
// d'invocation, code, accumulateur de résultat) et la vue d'état interne.
use super::result::{ProgramResult, VmError};
use super::trace::{ProgramTrace, TraceStep};
use crate::storage::StateView;
use crate::types::{Address, Balance, BlockNumber, ExecutionBlock, Gas, Hash, Timestamp, Transaction};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use tracing::debug;

pub const DEFAULT_MAX_TRACE_STEPS: usize = 100_000;

/// Options de l'interpréteur
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VmConfig {
    /// Enregistre chaque pas de l'interpréteur dans la trace
    pub vm_trace: bool,
    pub max_trace_steps: usize,
}

impl Default for VmConfig {
    fn default() -> Self {
        Self {
            vm_trace: false,
            max_trace_steps: DEFAULT_MAX_TRACE_STEPS,
        }
    }
}

/// Contexte d'invocation d'un programme
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProgramInvoke {
    /// Compte dont le code s'exécute
    pub owner: Address,
    pub origin: Address,
    pub caller: Address,
    pub owner_balance: Balance,
    pub gas_price: Balance,
    pub gas_limit: Gas,
    pub call_value: Balance,
    pub call_data: Vec<u8>,
    pub block_number: BlockNumber,
    pub block_timestamp: Timestamp,
    pub block_coinbase: Address,
    pub block_gas_limit: Gas,
    pub parent_hash: Hash,
    pub tx_index: usize,
}

/// Construit les contextes d'invocation des programmes de premier niveau
pub trait ProgramInvokeFactory: Send + Sync {
    fn create_program_invoke(
        &self,
        tx: &Transaction,
        tx_index: usize,
        owner: Address,
        block: &ExecutionBlock,
        state: &dyn StateView,
    ) -> ProgramInvoke;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct DefaultProgramInvokeFactory;

impl ProgramInvokeFactory for DefaultProgramInvokeFactory {
    fn create_program_invoke(
        &self,
        tx: &Transaction,
        tx_index: usize,
        owner: Address,
        block: &ExecutionBlock,
        state: &dyn StateView,
    ) -> ProgramInvoke {
        let sender = tx.sender();
        // Creation init code is not call data
        let call_data = if tx.is_contract_creation() {
            Vec::new()
        } else {
            tx.data().to_vec()
        };
        ProgramInvoke {
            owner,
            origin: sender,
            caller: sender,
            owner_balance: state.get_balance(&owner),
            gas_price: tx.gas_price(),
            gas_limit: tx.gas_limit(),
            call_value: tx.value(),
            call_data,
            block_number: block.number,
            block_timestamp: block.timestamp,
            block_coinbase: block.coinbase,
            block_gas_limit: block.gas_limit,
            parent_hash: block.parent_hash,
            tx_index,
        }
    }
}

/// Programme prêt à être exécuté par l'interpréteur
#[derive(Debug, Clone)]
pub struct Program {
    invoke: ProgramInvoke,
    code: Vec<u8>,
    result: ProgramResult,
    trace: ProgramTrace,
    /// Comptes déjà auto-détruits plus tôt dans le bloc
    deleted_accounts: BTreeSet<Address>,
}

impl Program {
    pub fn new(
        config: &VmConfig,
        code: Vec<u8>,
        invoke: ProgramInvoke,
        deleted_accounts: BTreeSet<Address>,
    ) -> Self {
        let trace = ProgramTrace::new(invoke.owner, config.vm_trace, config.max_trace_steps);
        Self {
            invoke,
            code,
            result: ProgramResult::new(),
            trace,
            deleted_accounts,
        }
    }

    pub fn invoke(&self) -> &ProgramInvoke {
        &self.invoke
    }

    pub fn code(&self) -> &[u8] {
        &self.code
    }

    pub fn owner(&self) -> Address {
        self.invoke.owner
    }

    pub fn result(&self) -> &ProgramResult {
        &self.result
    }

    pub fn result_mut(&mut self) -> &mut ProgramResult {
        &mut self.result
    }

    pub fn trace(&self) -> &ProgramTrace {
        &self.trace
    }

    pub fn record_step(&mut self, step: TraceStep) {
        self.trace.add_step(step);
    }

    pub fn was_deleted_in_block(&self, address: &Address) -> bool {
        self.deleted_accounts.contains(address)
    }

    pub fn gas_remaining(&self) -> Gas {
        self.invoke.gas_limit.saturating_sub(self.result.gas_used())
    }

    /// Facture `amount`; échoue sans rien facturer si la limite serait
    /// dépassée
    pub fn spend_gas(&mut self, amount: Gas, cause: &str) -> Result<(), VmError> {
        let remaining = self.gas_remaining();
        if amount > remaining {
            return Err(VmError::OutOfGas {
                cause: cause.to_string(),
                needed: amount,
                remaining,
            });
        }
        self.result.spend_gas(amount);
        Ok(())
    }

    pub fn spend_all_gas(&mut self) {
        let remaining = self.gas_remaining();
        self.result.spend_gas(remaining);
    }

    pub fn set_h_return(&mut self, data: Vec<u8>) {
        self.result.set_h_return(data);
    }

    pub fn set_runtime_failure(&mut self, error: VmError) {
        self.result.set_exception(error);
    }

    pub fn not_enough_spending_gas(&self, cause: &str, needed: Gas) -> VmError {
        VmError::NotEnoughSpendingGas {
            cause: cause.to_string(),
            needed,
            remaining: self.gas_remaining(),
        }
    }
}

/// Interpréteur de bytecode.
///
/// `play` exécute le programme jusqu'au bout sur `state`; les échecs passent
/// par le résultat du programme, jamais par une valeur de retour.
pub trait Interpreter: Send + Sync {
    fn play(&self, program: &mut Program, state: &mut dyn StateView);
}

/// Interpréteur qui n'exécute aucune instruction: le programme ne retourne
/// rien et ne consomme que le gas facturé par l'appelant.
#[derive(Debug, Default, Clone, Copy)]
pub struct PassiveInterpreter;

impl Interpreter for PassiveInterpreter {
    fn play(&self, program: &mut Program, _state: &mut dyn StateView) {
        debug!(
            "Passive interpreter skipping {} bytes of code at {}",
            program.code().len(),
            program.owner()
        );
    }
}
