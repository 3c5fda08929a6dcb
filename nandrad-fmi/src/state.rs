//! The FMU state blob.
//!
//! A blob starts with its own total length as a little-endian `u64` (the
//! prefix counts itself) followed by little-endian `f64` fields in an order
//! fixed by the model that wrote it. [`StateWriter`] and [`StateReader`]
//! check the buffer size before touching any field and never index out of
//! bounds.

use nandrad_core::ConsistencyFault;
use thiserror::Error;

/// Byte length of the leading length prefix.
pub const PREFIX_LEN: usize = 8;

const FIELD_LEN: usize = 8;

/// Returns the blob length for a state made of `fields` `f64` values.
#[must_use]
pub const fn state_size(fields: usize) -> usize {
    PREFIX_LEN + fields * FIELD_LEN
}

/// Reasons a state blob cannot be restored.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum StateError {
    #[error(transparent)]
    Consistency(#[from] ConsistencyFault),

    #[error("state blob declares {declared} bytes but holds {actual}")]
    LengthPrefix { declared: u64, actual: usize },

    #[error("state blob ended at byte {offset}")]
    Truncated { offset: usize },

    #[error("state blob has {remaining} unread bytes")]
    TrailingBytes { remaining: usize },

    #[error("invalid {field} in state blob: {value}")]
    InvalidValue { field: &'static str, value: f64 },
}

/// An opaque snapshot of an FMU instance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FmuState(Vec<u8>);

impl FmuState {
    #[must_use]
    pub fn from_bytes(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }

    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    #[must_use]
    pub fn into_bytes(self) -> Vec<u8> {
        self.0
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Writes fields into a buffer of exactly the expected size.
#[derive(Debug)]
pub struct StateWriter<'a> {
    buffer: &'a mut [u8],
    offset: usize,
    overflow: bool,
}

impl<'a> StateWriter<'a> {
    /// Checks the buffer size and writes the length prefix.
    ///
    /// # Errors
    ///
    /// Returns [`ConsistencyFault::BufferSize`] if `buffer` is not exactly
    /// `expected_size` bytes long.
    pub fn new(buffer: &'a mut [u8], expected_size: usize) -> Result<Self, ConsistencyFault> {
        if buffer.len() != expected_size || expected_size < PREFIX_LEN {
            return Err(ConsistencyFault::BufferSize {
                expected: expected_size,
                found: buffer.len(),
            });
        }
        let declared = buffer.len() as u64;
        buffer[..PREFIX_LEN].copy_from_slice(&declared.to_le_bytes());
        Ok(Self {
            buffer,
            offset: PREFIX_LEN,
            overflow: false,
        })
    }

    pub fn write_f64(&mut self, value: f64) {
        match self.buffer.get_mut(self.offset..self.offset + FIELD_LEN) {
            Some(field) => {
                field.copy_from_slice(&value.to_le_bytes());
                self.offset += FIELD_LEN;
            }
            None => self.overflow = true,
        }
    }

    /// Checks that the written fields filled the buffer exactly.
    ///
    /// # Errors
    ///
    /// Returns [`ConsistencyFault::BufferSize`] if more or fewer bytes were
    /// written than the buffer holds.
    pub fn finish(self) -> Result<(), ConsistencyFault> {
        if self.overflow || self.offset != self.buffer.len() {
            let written = if self.overflow {
                self.buffer.len() + FIELD_LEN
            } else {
                self.offset
            };
            return Err(ConsistencyFault::BufferSize {
                expected: written,
                found: self.buffer.len(),
            });
        }
        Ok(())
    }
}

/// Reads fields from a buffer of exactly the expected size.
#[derive(Debug)]
pub struct StateReader<'a> {
    buffer: &'a [u8],
    offset: usize,
}

impl<'a> StateReader<'a> {
    /// Checks the buffer size and the length prefix.
    ///
    /// # Errors
    ///
    /// Returns [`StateError::Consistency`] on a size mismatch and
    /// [`StateError::LengthPrefix`] if the prefix disagrees with the size.
    pub fn new(buffer: &'a [u8], expected_size: usize) -> Result<Self, StateError> {
        if buffer.len() != expected_size || expected_size < PREFIX_LEN {
            return Err(ConsistencyFault::BufferSize {
                expected: expected_size,
                found: buffer.len(),
            }
            .into());
        }
        let mut prefix = [0; PREFIX_LEN];
        prefix.copy_from_slice(&buffer[..PREFIX_LEN]);
        let declared = u64::from_le_bytes(prefix);
        if usize::try_from(declared).ok() != Some(buffer.len()) {
            return Err(StateError::LengthPrefix {
                declared,
                actual: buffer.len(),
            });
        }
        Ok(Self {
            buffer,
            offset: PREFIX_LEN,
        })
    }

    /// Reads the next field.
    ///
    /// # Errors
    ///
    /// Returns [`StateError::Truncated`] if the buffer has no field left.
    pub fn read_f64(&mut self) -> Result<f64, StateError> {
        let field = self
            .buffer
            .get(self.offset..self.offset + FIELD_LEN)
            .ok_or(StateError::Truncated {
                offset: self.offset,
            })?;
        let mut bytes = [0; FIELD_LEN];
        bytes.copy_from_slice(field);
        self.offset += FIELD_LEN;
        Ok(f64::from_le_bytes(bytes))
    }

    /// Reads the next field and checks that it is finite.
    ///
    /// # Errors
    ///
    /// Returns [`StateError::InvalidValue`] for NaN or infinite values.
    pub fn read_finite(&mut self, field: &'static str) -> Result<f64, StateError> {
        let value = self.read_f64()?;
        if !value.is_finite() {
            return Err(StateError::InvalidValue { field, value });
        }
        Ok(value)
    }

    /// Checks that every field has been read.
    ///
    /// # Errors
    ///
    /// Returns [`StateError::TrailingBytes`] if unread bytes remain.
    pub fn finish(self) -> Result<(), StateError> {
        let remaining = self.buffer.len() - self.offset;
        if remaining != 0 {
            return Err(StateError::TrailingBytes { remaining });
        }
        Ok(())
    }
}
