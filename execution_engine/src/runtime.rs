//! The host-function bridge between a running WASM instance and its
//! execution environment.

use std::cmp;

use tracing::debug;
use wasmi::{Externals, MemoryRef, RuntimeArgs, RuntimeValue, Trap};

use tessera_hashing::Digest;
use tessera_state::{Error as StateError, StateStore};
use tessera_types::{encoding::FromBytes, Address, Args, Event};

use crate::{crypto, environment::Environment, error::Error, function_index::FunctionIndex};

/// The call completed.
pub const RET_OK: i32 = 0;
/// The call failed, or the destination buffer is too small for a
/// fixed-size result.
pub const RET_ERR: i32 = -1;
/// The requested key is absent from the durable store.
pub const RET_KEY_NOT_FOUND: i32 = -2;

/// Dispatches host calls made by one contract invocation, reading and
/// writing the instance's linear memory.
pub(crate) struct Runtime<'a, S> {
    env: &'a mut Environment<S>,
    memory: MemoryRef,
}

impl<'a, S: StateStore> Runtime<'a, S> {
    pub(crate) fn new(env: &'a mut Environment<S>, memory: MemoryRef) -> Self {
        Runtime { env, memory }
    }

    fn bytes_at(&self, ptr: u32, len: u32) -> Result<Vec<u8>, Trap> {
        self.memory
            .get(ptr, len as usize)
            .map_err(|error| Error::Interpreter(error.to_string()).into())
    }

    /// Copies a fixed-size result into the guest buffer. The buffer must hold
    /// the whole result; partial copies of fixed-size values are never
    /// useful to a contract.
    fn write_fixed(&self, ptr: u32, len: u32, source: &[u8]) -> i32 {
        if (len as usize) < source.len() {
            return RET_ERR;
        }
        match self.memory.set(ptr, source) {
            Ok(()) => RET_OK,
            Err(_) => RET_ERR,
        }
    }

    /// Copies a window of a variable-size result into the guest buffer,
    /// starting `offset` bytes into the source. Returns the number of bytes
    /// copied; an offset at or past the end copies nothing.
    fn write_windowed(&self, ptr: u32, offset: u32, len: u32, source: &[u8]) -> i32 {
        let offset = offset as usize;
        if offset >= source.len() {
            return 0;
        }
        let end = cmp::min(offset + len as usize, source.len());
        let window = &source[offset..end];
        match self.memory.set(ptr, window) {
            Ok(()) => window.len() as i32,
            Err(_) => RET_ERR,
        }
    }

    fn read_state(&mut self, args: &RuntimeArgs) -> Result<i32, Trap> {
        let key_ptr: u32 = args.nth_checked(0)?;
        let key_len: u32 = args.nth_checked(1)?;
        let offset: u32 = args.nth_checked(2)?;
        let value_ptr: u32 = args.nth_checked(3)?;
        let value_len: u32 = args.nth_checked(4)?;

        let key = self.bytes_at(key_ptr, key_len)?;
        match self.env.store.get_tracked(&key) {
            Ok(value) => Ok(self.write_windowed(value_ptr, offset, value_len, &value)),
            Err(StateError::KeyNotFound) => Ok(RET_KEY_NOT_FOUND),
            Err(error) => {
                debug!(%error, "state read failed");
                Ok(RET_ERR)
            }
        }
    }

    fn write_state(&mut self, args: &RuntimeArgs) -> Result<i32, Trap> {
        let key_ptr: u32 = args.nth_checked(0)?;
        let key_len: u32 = args.nth_checked(1)?;
        let value_ptr: u32 = args.nth_checked(2)?;
        let value_len: u32 = args.nth_checked(3)?;

        let key = self.bytes_at(key_ptr, key_len)?;
        let value = self.bytes_at(value_ptr, value_len)?;
        self.env.store.set_tracked(&key, value);
        Ok(RET_OK)
    }

    fn emit_event(&mut self, args: &RuntimeArgs) -> Result<i32, Trap> {
        let name_ptr: u32 = args.nth_checked(0)?;
        let name_len: u32 = args.nth_checked(1)?;
        let value_ptr: u32 = args.nth_checked(2)?;
        let value_len: u32 = args.nth_checked(3)?;

        // Event names are opaque bytes; only the size bounds are enforced.
        let name = self.bytes_at(name_ptr, name_len)?;
        let value = self.bytes_at(value_ptr, value_len)?;
        match Event::new(name, value) {
            Ok(event) => {
                self.env.entries.push(event);
                Ok(RET_OK)
            }
            Err(error) => {
                debug!(%error, "rejected event");
                Ok(RET_ERR)
            }
        }
    }

    fn call_contract(&mut self, args: &RuntimeArgs) -> Result<i32, Trap> {
        let address_ptr: u32 = args.nth_checked(0)?;
        let address_len: u32 = args.nth_checked(1)?;
        let entry_ptr: u32 = args.nth_checked(2)?;
        let entry_len: u32 = args.nth_checked(3)?;
        let args_ptr: u32 = args.nth_checked(4)?;
        let args_len: u32 = args.nth_checked(5)?;

        let target = match Address::try_from(self.bytes_at(address_ptr, address_len)?.as_slice()) {
            Ok(target) => target,
            Err(_) => return Ok(RET_ERR),
        };
        let entry = match String::from_utf8(self.bytes_at(entry_ptr, entry_len)?) {
            Ok(entry) => entry,
            Err(_) => return Ok(RET_ERR),
        };
        let call_args = match Args::from_slice(&self.bytes_at(args_ptr, args_len)?) {
            Ok(call_args) => call_args,
            Err(_) => return Ok(RET_ERR),
        };

        if self.env.call_stack.contains(&target) {
            let error = Error::ReentrantCall(target);
            debug!(caller = %self.env.address, %error, "rejected nested call");
            return Ok(RET_ERR);
        }

        let mut child = match self.env.executor.environment_nested(
            self.env.block,
            self.env.sender,
            target,
            call_args,
            self.env.call_stack.clone(),
        ) {
            Ok(child) => child,
            Err(error) => {
                debug!(%target, %error, "nested call setup failed");
                return Ok(RET_ERR);
            }
        };

        match child.exec(&entry) {
            Ok(outcome) => {
                self.env.effects.append(outcome.effects);
                self.env.events.extend(outcome.events);
                let id = self.env.results.len() as i32;
                self.env.results.push(outcome.response);
                Ok(id)
            }
            Err(error) => {
                debug!(%target, entry, %error, "nested call failed");
                Ok(RET_ERR)
            }
        }
    }
}

impl<'a, S: StateStore> Externals for Runtime<'a, S> {
    fn invoke_index(
        &mut self,
        index: usize,
        args: RuntimeArgs,
    ) -> Result<Option<RuntimeValue>, Trap> {
        let index = FunctionIndex::try_from(index).map_err(|bad| {
            Trap::from(Error::Interpreter(format!(
                "unknown host function index {}",
                bad
            )))
        })?;

        let code = match index {
            FunctionIndex::GetSender => {
                let ptr: u32 = args.nth_checked(0)?;
                let len: u32 = args.nth_checked(1)?;
                let sender = self.env.sender;
                self.write_fixed(ptr, len, sender.as_bytes())
            }
            FunctionIndex::GetContractAddress => {
                let ptr: u32 = args.nth_checked(0)?;
                let len: u32 = args.nth_checked(1)?;
                let address = self.env.address;
                self.write_fixed(ptr, len, address.as_bytes())
            }
            FunctionIndex::GetArg => {
                let index: u32 = args.nth_checked(0)?;
                let offset: u32 = args.nth_checked(1)?;
                let ptr: u32 = args.nth_checked(2)?;
                let len: u32 = args.nth_checked(3)?;
                match self.env.args.get(index as usize) {
                    Some(arg) => {
                        let arg = arg.to_vec();
                        self.write_windowed(ptr, offset, len, &arg)
                    }
                    None => RET_ERR,
                }
            }
            FunctionIndex::ReadState => self.read_state(&args)?,
            FunctionIndex::WriteState => self.write_state(&args)?,
            FunctionIndex::Log => {
                let ptr: u32 = args.nth_checked(0)?;
                let len: u32 = args.nth_checked(1)?;
                let message = self.bytes_at(ptr, len)?;
                debug!(
                    contract = %self.env.address,
                    message = %String::from_utf8_lossy(&message),
                    "contract log"
                );
                RET_OK
            }
            FunctionIndex::SetResponse => {
                let ptr: u32 = args.nth_checked(0)?;
                let len: u32 = args.nth_checked(1)?;
                self.env.response = self.bytes_at(ptr, len)?;
                RET_OK
            }
            FunctionIndex::EmitEvent => self.emit_event(&args)?,
            FunctionIndex::CallContract => self.call_contract(&args)?,
            FunctionIndex::Read => {
                let id: u32 = args.nth_checked(0)?;
                let offset: u32 = args.nth_checked(1)?;
                let ptr: u32 = args.nth_checked(2)?;
                let len: u32 = args.nth_checked(3)?;
                match self.env.results.get(id as usize) {
                    Some(result) => {
                        let result = result.clone();
                        self.write_windowed(ptr, offset, len, &result)
                    }
                    None => RET_ERR,
                }
            }
            FunctionIndex::Keccak256 => {
                let msg_ptr: u32 = args.nth_checked(0)?;
                let msg_len: u32 = args.nth_checked(1)?;
                let ptr: u32 = args.nth_checked(2)?;
                let len: u32 = args.nth_checked(3)?;
                let digest = Digest::keccak256(&self.bytes_at(msg_ptr, msg_len)?);
                self.write_fixed(ptr, len, digest.as_bytes())
            }
            FunctionIndex::Sha256 => {
                let msg_ptr: u32 = args.nth_checked(0)?;
                let msg_len: u32 = args.nth_checked(1)?;
                let ptr: u32 = args.nth_checked(2)?;
                let len: u32 = args.nth_checked(3)?;
                let digest = Digest::sha256(&self.bytes_at(msg_ptr, msg_len)?);
                self.write_fixed(ptr, len, digest.as_bytes())
            }
            FunctionIndex::EcRecover => {
                let (hash, v, r, s) = self.recovery_params(&args)?;
                let ptr: u32 = args.nth_checked(8)?;
                let len: u32 = args.nth_checked(9)?;
                match crypto::ecrecover(&hash, &v, &r, &s) {
                    Ok(key) => self.write_fixed(ptr, len, &key),
                    Err(error) => {
                        debug!(%error, "ecrecover failed");
                        RET_ERR
                    }
                }
            }
            FunctionIndex::EcRecoverAddress => {
                let (hash, v, r, s) = self.recovery_params(&args)?;
                let ptr: u32 = args.nth_checked(8)?;
                let len: u32 = args.nth_checked(9)?;
                match crypto::ecrecover_address(&hash, &v, &r, &s) {
                    Ok(address) => self.write_fixed(ptr, len, address.as_bytes()),
                    Err(error) => {
                        debug!(%error, "ecrecover_address failed");
                        RET_ERR
                    }
                }
            }
        };

        Ok(Some(RuntimeValue::I32(code)))
    }
}

impl<'a, S: StateStore> Runtime<'a, S> {
    #[allow(clippy::type_complexity)]
    fn recovery_params(
        &self,
        args: &RuntimeArgs,
    ) -> Result<(Vec<u8>, Vec<u8>, Vec<u8>, Vec<u8>), Trap> {
        let hash_ptr: u32 = args.nth_checked(0)?;
        let hash_len: u32 = args.nth_checked(1)?;
        let v_ptr: u32 = args.nth_checked(2)?;
        let v_len: u32 = args.nth_checked(3)?;
        let r_ptr: u32 = args.nth_checked(4)?;
        let r_len: u32 = args.nth_checked(5)?;
        let s_ptr: u32 = args.nth_checked(6)?;
        let s_len: u32 = args.nth_checked(7)?;
        Ok((
            self.bytes_at(hash_ptr, hash_len)?,
            self.bytes_at(v_ptr, v_len)?,
            self.bytes_at(r_ptr, r_len)?,
            self.bytes_at(s_ptr, s_len)?,
        ))
    }
}
