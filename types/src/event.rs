use std::fmt::{self, Display, Formatter};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::Address;

/// Maximum length of an event name in bytes.
pub const MAX_EVENT_NAME_LENGTH: usize = 32;
/// Maximum length of an event value in bytes.
pub const MAX_EVENT_VALUE_LENGTH: usize = 1024;

/// Event validation error.
#[derive(Error, Debug, Copy, Clone, Eq, PartialEq)]
#[non_exhaustive]
pub enum EventError {
    /// Name or value is empty, or the name exceeds
    /// [`MAX_EVENT_NAME_LENGTH`] / the value exceeds
    /// [`MAX_EVENT_VALUE_LENGTH`].
    #[error(
        "event name must be 1..={MAX_EVENT_NAME_LENGTH} bytes and value \
         1..={MAX_EVENT_VALUE_LENGTH} bytes, got name={name_length} value={value_length}"
    )]
    OutOfBounds {
        /// Length of the offending name.
        name_length: usize,
        /// Length of the offending value.
        value_length: usize,
    },
    /// The wire form could not be decoded.
    #[error("malformed event encoding")]
    Malformed,
}

/// An event emitted by a contract during execution. Both fields are mandatory
/// and size-bounded; the wire form is `len(name):1 ‖ name ‖ value`.
#[derive(Clone, Eq, PartialEq, Hash, Debug, Serialize, Deserialize)]
pub struct Event {
    name: Vec<u8>,
    value: Vec<u8>,
}

impl Event {
    /// Constructs a validated event.
    pub fn new<N: Into<Vec<u8>>, V: Into<Vec<u8>>>(name: N, value: V) -> Result<Self, EventError> {
        let name = name.into();
        let value = value.into();
        if name.is_empty()
            || name.len() > MAX_EVENT_NAME_LENGTH
            || value.is_empty()
            || value.len() > MAX_EVENT_VALUE_LENGTH
        {
            return Err(EventError::OutOfBounds {
                name_length: name.len(),
                value_length: value.len(),
            });
        }
        Ok(Event { name, value })
    }

    /// Returns the event name.
    pub fn name(&self) -> &[u8] {
        &self.name
    }

    /// Returns the event value.
    pub fn value(&self) -> &[u8] {
        &self.value
    }

    /// Returns the binary wire form: `len(name):1 ‖ name ‖ value`.
    pub fn wire_bytes(&self) -> Vec<u8> {
        let mut writer = Vec::with_capacity(1 + self.name.len() + self.value.len());
        writer.push(self.name.len() as u8);
        writer.extend_from_slice(&self.name);
        writer.extend_from_slice(&self.value);
        writer
    }

    /// Decodes the binary wire form.
    pub fn from_wire_bytes(bytes: &[u8]) -> Result<Self, EventError> {
        let (&name_length, rest) = bytes.split_first().ok_or(EventError::Malformed)?;
        if rest.len() < name_length as usize {
            return Err(EventError::Malformed);
        }
        let (name, value) = rest.split_at(name_length as usize);
        Event::new(name, value)
    }

    /// Returns the hex-encoded wire form used when events are embedded in
    /// text-based indexing and query systems.
    pub fn to_hex(&self) -> String {
        base16::encode_lower(&self.wire_bytes())
    }

    /// Decodes the hex-encoded wire form.
    pub fn from_hex<T: AsRef<[u8]>>(hex: T) -> Result<Self, EventError> {
        let bytes = base16::decode(hex.as_ref()).map_err(|_| EventError::Malformed)?;
        Event::from_wire_bytes(&bytes)
    }
}

impl Display for Event {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        write!(
            f,
            "{}{{0x{}}}",
            String::from_utf8_lossy(&self.name),
            base16::encode_upper(&self.value)
        )
    }
}

/// The events emitted by one invocation, wrapped under the emitting
/// contract's address.
#[derive(Clone, Eq, PartialEq, Debug, Serialize, Deserialize)]
pub struct ContractEvent {
    /// The contract that emitted the events.
    pub address: Address,
    /// The emitted events, in emission order.
    pub events: Vec<Event>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bounds_are_inclusive() {
        assert!(Event::new(vec![b'n'; 1], vec![b'v'; 1]).is_ok());
        assert!(Event::new(vec![b'n'; 32], vec![b'v'; 1024]).is_ok());
    }

    #[test]
    fn out_of_bounds_lengths_are_rejected() {
        assert!(Event::new(vec![], vec![b'v']).is_err());
        assert!(Event::new(vec![b'n'; 33], vec![b'v']).is_err());
        assert!(Event::new(vec![b'n'], vec![]).is_err());
        assert!(Event::new(vec![b'n'], vec![b'v'; 1025]).is_err());
    }

    #[test]
    fn wire_round_trip() {
        let event = Event::new(&b"Transfer"[..], &b"\x01\x02\x03"[..]).unwrap();
        assert_eq!(Event::from_wire_bytes(&event.wire_bytes()).unwrap(), event);
    }

    #[test]
    fn hex_round_trip() {
        let event = Event::new(&b"minted"[..], &b"0xdeadbeef"[..]).unwrap();
        assert_eq!(Event::from_hex(event.to_hex()).unwrap(), event);
    }

    #[test]
    fn wire_form_layout() {
        let event = Event::new(&b"ab"[..], &b"xyz"[..]).unwrap();
        assert_eq!(event.wire_bytes(), vec![2, b'a', b'b', b'x', b'y', b'z']);
    }

    #[test]
    fn truncated_wire_form_is_rejected() {
        assert_eq!(Event::from_wire_bytes(&[]), Err(EventError::Malformed));
        assert_eq!(Event::from_wire_bytes(&[5, b'a']), Err(EventError::Malformed));
    }
}
