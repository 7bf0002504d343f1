// Execution - Machine à états déterministe des transactions
// Principe: mêmes entrées, mêmes résultats sur tous les nœuds

pub mod activation;
pub mod block;
pub mod executor;
pub mod gas;
pub mod precompiled;
pub mod result;
pub mod reversible;
pub mod signature_cache;
pub mod summary;
pub mod trace;
pub mod vm;

pub use activation::{ActivationConfig, ActivationsForBlock, ConsensusRule};
pub use block::{BlockExecutor, BlockResult, RejectedTransaction};
pub use executor::{ExecutionContext, TransactionExecutor, ValidationError};
pub use gas::{GasCost, GasError, GasRules};
pub use precompiled::{PrecompiledContract, PrecompiledContracts, PrecompiledError};
pub use result::{InternalTransaction, ProgramResult, VmError};
pub use reversible::{decode_revert_reason, CallOutcome, CallRequest, ReversibleTransactionExecutor};
pub use signature_cache::SignatureCache;
pub use summary::TransactionExecutionSummary;
pub use trace::{MemoryTraceProcessor, ProgramTraceProcessor, TransactionTrace};
pub use vm::{Interpreter, PassiveInterpreter, Program, ProgramInvoke, ProgramInvokeFactory, VmConfig};
