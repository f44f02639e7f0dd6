//! Growable binary buffers.
//!
//! Compilation outputs land in buffers owned by the session and reused across calls. A buffer
//! grows by reallocating to exactly the size of the payload that did not fit: compilation
//! outputs are one-shot and overwrite the buffer wholesale each call, so amortized growth would
//! only change the observable capacity without buying anything. Capacity never shrinks until the
//! buffer is dropped.

use std::error::Error;
use std::fmt;

/// Initial capacity of a buffer, in bytes.
pub const INITIAL_CAPACITY: usize = 1024;

/// Error risen when a buffer cannot grow to the requested capacity.
///
/// The buffer keeps its prior capacity and contents when this happens; the write that triggered
/// the growth was not performed.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct BufferError {
  /// Capacity that could not be allocated, in bytes.
  pub requested: usize
}

impl fmt::Display for BufferError {
  fn fmt(&self, f: &mut fmt::Formatter) -> Result<(), fmt::Error> {
    write!(f, "cannot grow buffer to {} bytes", self.requested)
  }
}

impl Error for BufferError {}

/// A byte region with a tracked capacity that grows on demand.
///
/// The used length reflects the last successful write; bytes past it up to the capacity are
/// reusable scratch space from previous calls.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct GrowBuffer {
  bytes: Vec<u8>,
  len: usize
}

impl GrowBuffer {
  /// Create a buffer with the default initial capacity.
  pub fn new() -> Result<Self, BufferError> {
    let mut bytes = Vec::new();

    bytes.try_reserve_exact(INITIAL_CAPACITY).map_err(|_| BufferError { requested: INITIAL_CAPACITY })?;
    bytes.resize(INITIAL_CAPACITY, 0);

    Ok(GrowBuffer { bytes, len: 0 })
  }

  /// Current capacity, in bytes.
  pub fn capacity(&self) -> usize {
    self.bytes.len()
  }

  /// Number of bytes written by the last successful write.
  pub fn len(&self) -> usize {
    self.len
  }

  pub fn is_empty(&self) -> bool {
    self.len == 0
  }

  /// Bytes written by the last successful write.
  pub fn as_slice(&self) -> &[u8] {
    &self.bytes[..self.len]
  }

  /// Guarantee `capacity() >= required`.
  ///
  /// Grows by reallocating to exactly `required` bytes when the current capacity is
  /// insufficient. Never shrinks.
  pub fn ensure_capacity(&mut self, required: usize) -> Result<(), BufferError> {
    if required > self.bytes.len() {
      let additional = required - self.bytes.len();
      self.bytes.try_reserve_exact(additional).map_err(|_| BufferError { requested: required })?;
      self.bytes.resize(required, 0);
    }

    Ok(())
  }

  /// Overwrite the buffer contents with `payload`, growing first if needed.
  pub fn write(&mut self, payload: &[u8]) -> Result<usize, BufferError> {
    self.ensure_capacity(payload.len())?;

    self.bytes[..payload.len()].copy_from_slice(payload);
    self.len = payload.len();

    Ok(self.len)
  }

  /// Overwrite the buffer contents with a sequence of 32-bit words, stored little-endian.
  pub fn write_words(&mut self, words: &[u32]) -> Result<usize, BufferError> {
    let byte_len = words.len() * 4;
    self.ensure_capacity(byte_len)?;

    for (chunk, word) in self.bytes.chunks_exact_mut(4).zip(words) {
      chunk.copy_from_slice(&word.to_le_bytes());
    }

    self.len = byte_len;

    Ok(self.len)
  }

  /// Overwrite the buffer contents with `payload` followed by a NUL byte.
  ///
  /// The reported length includes the terminator.
  pub fn write_terminated(&mut self, payload: &[u8]) -> Result<usize, BufferError> {
    let byte_len = payload.len() + 1;
    self.ensure_capacity(byte_len)?;

    self.bytes[..payload.len()].copy_from_slice(payload);
    self.bytes[payload.len()] = 0;
    self.len = byte_len;

    Ok(self.len)
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn initial_capacity() {
    let buffer = GrowBuffer::new().unwrap();

    assert_eq!(buffer.capacity(), INITIAL_CAPACITY);
    assert_eq!(buffer.len(), 0);
    assert!(buffer.is_empty());
  }

  #[test]
  fn small_writes_do_not_grow() {
    let mut buffer = GrowBuffer::new().unwrap();

    assert_eq!(buffer.write(&[1, 2, 3]), Ok(3));
    assert_eq!(buffer.capacity(), INITIAL_CAPACITY);
    assert_eq!(buffer.as_slice(), &[1, 2, 3]);
  }

  #[test]
  fn growth_is_exact_fit() {
    let mut buffer = GrowBuffer::new().unwrap();
    let payload = vec![0xab; INITIAL_CAPACITY + 37];

    assert_eq!(buffer.write(&payload), Ok(payload.len()));
    assert_eq!(buffer.capacity(), payload.len());
    assert_eq!(buffer.as_slice(), payload.as_slice());
  }

  #[test]
  fn capacity_never_shrinks() {
    let mut buffer = GrowBuffer::new().unwrap();
    let big = vec![1; 4096];

    buffer.write(&big).unwrap();
    buffer.write(&[7, 8]).unwrap();

    assert_eq!(buffer.capacity(), 4096);
    assert_eq!(buffer.as_slice(), &[7, 8]);
  }

  #[test]
  fn words_are_little_endian() {
    let mut buffer = GrowBuffer::new().unwrap();

    assert_eq!(buffer.write_words(&[0x07230203, 0x00010500]), Ok(8));
    assert_eq!(buffer.as_slice(), &[0x03, 0x02, 0x23, 0x07, 0x00, 0x05, 0x01, 0x00]);
  }

  #[test]
  fn terminated_writes_include_the_nul() {
    let mut buffer = GrowBuffer::new().unwrap();

    assert_eq!(buffer.write_terminated(b"metal"), Ok(6));
    assert_eq!(buffer.as_slice(), b"metal\0");
  }
}
