//! The index table of host functions importable from the `"env"` module.

/// Identifies a host function across the resolver and the dispatch in
/// `Runtime::invoke_index`.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
#[repr(usize)]
pub(crate) enum FunctionIndex {
    GetSender = 0,
    GetContractAddress = 1,
    GetArg = 2,
    ReadState = 3,
    WriteState = 4,
    Log = 5,
    SetResponse = 6,
    EmitEvent = 7,
    CallContract = 8,
    Read = 9,
    Keccak256 = 10,
    Sha256 = 11,
    EcRecover = 12,
    EcRecoverAddress = 13,
}

impl FunctionIndex {
    /// Resolves an import name to a function index and its parameter count.
    /// All host functions take i32 parameters and return an i32 status.
    pub(crate) fn from_import_name(name: &str) -> Option<(FunctionIndex, usize)> {
        let entry = match name {
            "__get_sender" => (FunctionIndex::GetSender, 2),
            "__get_contract_address" => (FunctionIndex::GetContractAddress, 2),
            "__get_arg" => (FunctionIndex::GetArg, 4),
            "__read_state" => (FunctionIndex::ReadState, 5),
            "__write_state" => (FunctionIndex::WriteState, 4),
            "__log" => (FunctionIndex::Log, 2),
            "__set_response" => (FunctionIndex::SetResponse, 2),
            "__emit_event" => (FunctionIndex::EmitEvent, 4),
            "__call_contract" => (FunctionIndex::CallContract, 6),
            "__read" => (FunctionIndex::Read, 4),
            "__keccak256" => (FunctionIndex::Keccak256, 4),
            "__sha256" => (FunctionIndex::Sha256, 4),
            "__ecrecover" => (FunctionIndex::EcRecover, 10),
            "__ecrecover_address" => (FunctionIndex::EcRecoverAddress, 10),
            _ => return None,
        };
        Some(entry)
    }
}

impl TryFrom<usize> for FunctionIndex {
    type Error = usize;

    fn try_from(value: usize) -> Result<Self, usize> {
        let index = match value {
            0 => FunctionIndex::GetSender,
            1 => FunctionIndex::GetContractAddress,
            2 => FunctionIndex::GetArg,
            3 => FunctionIndex::ReadState,
            4 => FunctionIndex::WriteState,
            5 => FunctionIndex::Log,
            6 => FunctionIndex::SetResponse,
            7 => FunctionIndex::EmitEvent,
            8 => FunctionIndex::CallContract,
            9 => FunctionIndex::Read,
            10 => FunctionIndex::Keccak256,
            11 => FunctionIndex::Sha256,
            12 => FunctionIndex::EcRecover,
            13 => FunctionIndex::EcRecoverAddress,
            other => return Err(other),
        };
        Ok(index)
    }
}
