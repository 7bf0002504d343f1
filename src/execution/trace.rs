// Trace - Traces d'exécution extraites à la demande
use crate::types::{Address, Balance, Gas, Hash};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Hex encoding for byte payloads in JSON traces
mod hex_bytes {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&format!("0x{}", hex::encode(bytes)))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        let s = String::deserialize(deserializer)?;
        hex::decode(s.trim_start_matches("0x")).map_err(serde::de::Error::custom)
    }
}

/// One interpreter step
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TraceStep {
    pub pc: u64,
    pub op: String,
    pub gas: Gas,
    pub gas_cost: Gas,
    pub depth: u32,
}

/// Full interpreter trace of a bytecode run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgramTrace {
    pub contract_address: Address,
    pub steps: Vec<TraceStep>,
    #[serde(with = "hex_bytes")]
    pub result: Vec<u8>,
    pub error: Option<String>,
    pub revert: bool,
    #[serde(skip)]
    enabled: bool,
    #[serde(skip)]
    max_steps: usize,
}

impl ProgramTrace {
    pub fn new(contract_address: Address, enabled: bool, max_steps: usize) -> Self {
        Self {
            contract_address,
            enabled,
            max_steps,
            ..Default::default()
        }
    }

    /// Records a step; ignored when tracing is off or the cap is reached
    pub fn add_step(&mut self, step: TraceStep) {
        if self.enabled && self.steps.len() < self.max_steps {
            self.steps.push(step);
        }
    }

    pub fn with_result(mut self, result: &[u8]) -> Self {
        self.result = result.to_vec();
        self
    }

    pub fn with_error(mut self, error: Option<String>) -> Self {
        self.error = error;
        self
    }

    pub fn with_revert(mut self, revert: bool) -> Self {
        self.revert = revert;
        self
    }
}

/// Value movement between two accounts
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferInvoke {
    pub sender: Address,
    pub receiver: Option<Address>,
    pub gas: Gas,
    pub value: Balance,
}

/// Call performed by a built-in contract
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgramSubtrace {
    pub call_type: String,
    pub invoke: TransferInvoke,
    #[serde(with = "hex_bytes")]
    pub output: Vec<u8>,
    pub subtraces: Vec<ProgramSubtrace>,
}

/// Trace of a run that did not go through the interpreter
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SummarizedProgramTrace {
    pub invoke: TransferInvoke,
    pub subtraces: Vec<ProgramSubtrace>,
}

impl SummarizedProgramTrace {
    pub fn new(invoke: TransferInvoke) -> Self {
        Self {
            invoke,
            subtraces: Vec::new(),
        }
    }

    pub fn add_subtrace(&mut self, subtrace: ProgramSubtrace) {
        self.subtraces.push(subtrace);
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TransactionTrace {
    Program(ProgramTrace),
    Summarized(SummarizedProgramTrace),
}

/// Sink receiving extracted traces
pub trait ProgramTraceProcessor {
    fn process_program_trace(&mut self, trace: TransactionTrace, tx_hash: Hash);
}

/// Keeps traces in memory, keyed by transaction hash
#[derive(Debug, Default)]
pub struct MemoryTraceProcessor {
    traces: BTreeMap<Hash, TransactionTrace>,
}

impl MemoryTraceProcessor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, tx_hash: &Hash) -> Option<&TransactionTrace> {
        self.traces.get(tx_hash)
    }

    pub fn len(&self) -> usize {
        self.traces.len()
    }

    pub fn is_empty(&self) -> bool {
        self.traces.is_empty()
    }

    pub fn to_json(&self, tx_hash: &Hash) -> Option<Result<String, serde_json::Error>> {
        self.traces.get(tx_hash).map(serde_json::to_string_pretty)
    }

    pub fn into_traces(self) -> BTreeMap<Hash, TransactionTrace> {
        self.traces
    }
}

impl ProgramTraceProcessor for MemoryTraceProcessor {
    fn process_program_trace(&mut self, trace: TransactionTrace, tx_hash: Hash) {
        self.traces.insert(tx_hash, trace);
    }
}
