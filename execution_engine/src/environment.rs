//! Execution environments: the per-invocation context a contract runs in,
//! and the executor that creates them over a shared durable store.

use std::{cell::RefCell, mem, rc::Rc};

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};
use wasmi::{ExternVal, ImportsBuilder, MemoryRef, ModuleInstance, ModuleRef, RuntimeValue};

use tessera_hashing::Digest;
use tessera_state::{StateStore, VersionedStore};
use tessera_types::{
    Address, AddressEffect, Args, BlockEffects, Contract, ContractEvent, Event, Version,
};

use crate::{
    error::Error, registry::ContractRegistry, resolver::RuntimeModuleImportResolver,
    runtime::Runtime,
};

/// The block position an invocation executes at. Writes committed for the
/// block are stamped with the corresponding version.
#[derive(Copy, Clone, Eq, PartialEq, Debug, Serialize, Deserialize)]
pub struct BlockContext {
    /// The block height.
    pub height: u32,
    /// The transaction sequence within the block.
    pub sequence: u32,
}

impl BlockContext {
    /// Constructs a block context.
    pub const fn new(height: u32, sequence: u32) -> Self {
        BlockContext { height, sequence }
    }

    /// Returns the version writes at this position are stamped with.
    pub fn version(&self) -> Version {
        Version::new(self.height, self.sequence)
    }
}

/// Everything a successful invocation produced: the exit status, the
/// response, the aggregated effects and the events of the whole call tree.
#[derive(Clone, Eq, PartialEq, Debug, Serialize, Deserialize)]
pub struct ExecutionOutcome {
    /// The non-negative status the entry point returned.
    pub status: i32,
    /// The response bytes, empty if the contract set none.
    pub response: Vec<u8>,
    /// Per-address effect sets, children before their callers.
    pub effects: BlockEffects,
    /// Events grouped per emitting contract.
    pub events: Vec<ContractEvent>,
}

#[derive(Copy, Clone, Eq, PartialEq, Debug)]
enum Phase {
    Created,
    Running,
    Succeeded,
    Failed,
}

/// Creates execution environments over a shared durable store.
pub struct Executor<S> {
    state: Rc<RefCell<S>>,
}

impl<S> Clone for Executor<S> {
    fn clone(&self) -> Self {
        Executor {
            state: Rc::clone(&self.state),
        }
    }
}

impl<S: StateStore> Executor<S> {
    /// Constructs an executor over `state`.
    pub fn new(state: Rc<RefCell<S>>) -> Self {
        Executor { state }
    }

    /// Returns a handle on the underlying durable store.
    pub fn state(&self) -> &Rc<RefCell<S>> {
        &self.state
    }

    /// Returns a contract registry over the same store.
    pub fn registry(&self) -> ContractRegistry<S> {
        ContractRegistry::new(Rc::clone(&self.state))
    }

    /// Deploys `code` and returns its content-derived address.
    pub fn deploy_contract(&self, owner: Address, code: Vec<u8>) -> Result<Address, Error> {
        self.registry().deploy(owner, code)
    }

    /// Constructs a top-level environment for invoking the contract at
    /// `address`.
    pub fn environment(
        &self,
        block: BlockContext,
        sender: Address,
        address: Address,
        args: Args,
    ) -> Result<Environment<S>, Error> {
        self.environment_nested(block, sender, address, args, Vec::new())
    }

    /// Constructs an environment for a nested call, extending the caller's
    /// call stack with the callee.
    pub(crate) fn environment_nested(
        &self,
        block: BlockContext,
        sender: Address,
        address: Address,
        args: Args,
        mut call_stack: Vec<Address>,
    ) -> Result<Environment<S>, Error> {
        let contract = self.registry().get(address)?;
        call_stack.push(address);
        Ok(Environment {
            block,
            sender,
            args,
            contract,
            address,
            executor: self.clone(),
            store: VersionedStore::new(Rc::clone(&self.state), address),
            call_stack,
            effects: BlockEffects::new(),
            events: Vec::new(),
            entries: Vec::new(),
            response: Vec::new(),
            results: Vec::new(),
            phase: Phase::Created,
        })
    }
}

/// The context one contract invocation runs in: its identity, its arguments,
/// its tracked state view and the accumulators the host functions fill.
///
/// An environment is single-shot: `exec` consumes its created phase and a
/// second call fails with [`Error::InvalidPhase`].
pub struct Environment<S> {
    pub(crate) block: BlockContext,
    pub(crate) sender: Address,
    pub(crate) args: Args,
    contract: Contract,
    pub(crate) address: Address,
    pub(crate) executor: Executor<S>,
    pub(crate) store: VersionedStore<S>,
    pub(crate) call_stack: Vec<Address>,
    pub(crate) effects: BlockEffects,
    pub(crate) events: Vec<ContractEvent>,
    pub(crate) entries: Vec<Event>,
    pub(crate) response: Vec<u8>,
    pub(crate) results: Vec<Vec<u8>>,
    phase: Phase,
}

impl<S: StateStore> Environment<S> {
    /// Returns the address of the contract this environment invokes.
    pub fn address(&self) -> Address {
        self.address
    }

    /// Returns the transaction sender.
    pub fn sender(&self) -> Address {
        self.sender
    }

    /// Runs the exported entry point `entry` to completion.
    ///
    /// On success the returned outcome carries the aggregated effects of the
    /// whole call tree, this contract's own effect set last. On any failure
    /// every buffered write, event and response of the tree is discarded.
    pub fn exec(&mut self, entry: &str) -> Result<ExecutionOutcome, Error> {
        if self.phase != Phase::Created {
            return Err(Error::InvalidPhase);
        }
        self.phase = Phase::Running;
        match self.run(entry) {
            Ok(outcome) => {
                self.phase = Phase::Succeeded;
                debug!(contract = %self.address, entry, status = outcome.status, "execution succeeded");
                Ok(outcome)
            }
            Err(error) => {
                self.phase = Phase::Failed;
                warn!(contract = %self.address, entry, %error, "execution failed");
                Err(error)
            }
        }
    }

    fn run(&mut self, entry: &str) -> Result<ExecutionOutcome, Error> {
        let (instance, memory) = instance_and_memory(&self.contract.code)?;

        match instance.export_by_name(entry) {
            Some(ExternVal::Func(_)) => (),
            _ => return Err(Error::EntryPointNotFound(entry.to_string())),
        }

        let result = {
            let mut runtime = Runtime::new(self, memory);
            instance.invoke_export(entry, &[], &mut runtime)
        };
        let status = match result {
            Ok(Some(RuntimeValue::I32(status))) => status,
            Ok(_) => return Err(Error::ExpectedReturnValue),
            Err(error) => return Err(error.into()),
        };
        if status < 0 {
            return Err(Error::ExitCode(status));
        }

        // Children pushed their effects during nested calls; this
        // invocation's own effect set goes last.
        self.effects.push(AddressEffect {
            address: self.address,
            effect_set: self.store.effect_set(),
        });
        if !self.entries.is_empty() {
            let events = mem::take(&mut self.entries);
            self.events.push(ContractEvent {
                address: self.address,
                events,
            });
        }

        Ok(ExecutionOutcome {
            status,
            response: mem::take(&mut self.response),
            effects: mem::take(&mut self.effects),
            events: mem::take(&mut self.events),
        })
    }
}

/// Instantiates `code` and attaches a linear memory: the imported one if the
/// module imports it, its own exported `"memory"` otherwise.
fn instance_and_memory(code: &[u8]) -> Result<(ModuleRef, MemoryRef), Error> {
    let module = wasmi::Module::from_buffer(code)?;
    let resolver = RuntimeModuleImportResolver::new();
    let mut imports = ImportsBuilder::new();
    imports.push_resolver("env", &resolver);

    let not_started = ModuleInstance::new(&module, &imports)?;
    if not_started.has_start() {
        return Err(Error::UnsupportedWasmStart);
    }
    let instance = not_started.not_started_instance().clone();

    let memory = match resolver.memory_ref() {
        Some(memory) => memory,
        None => match instance.export_by_name("memory") {
            Some(ExternVal::Memory(memory)) => memory,
            _ => return Err(Error::NoImportedMemory),
        },
    };
    Ok((instance, memory))
}

/// Checks a declared effect commitment against freshly produced effects.
pub fn verify_commitment(declared: Digest, effects: &BlockEffects) -> Result<(), Error> {
    let actual = effects.commitment();
    if declared != actual {
        return Err(Error::CommitmentMismatch { declared, actual });
    }
    Ok(())
}
