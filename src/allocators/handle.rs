//! Native handle carrier exchanged with the transport layer

use std::os::fd::RawFd;

use crate::error::{BufferHubError, Result};

/// A bundle of file descriptors and integers, the shape the transport layer
/// uses to move buffer handles, metadata handles and tokens between processes.
///
/// The descriptors are borrowed: the object that produced the handle keeps
/// them open for as long as it lives.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct NativeHandle {
    fds: Vec<RawFd>,
    ints: Vec<i32>,
}

impl NativeHandle {
    /// Create a handle from descriptors and integers
    pub fn new(fds: Vec<RawFd>, ints: Vec<i32>) -> Self {
        Self { fds, ints }
    }

    /// The null handle
    pub fn empty() -> Self {
        Self::default()
    }

    /// Token carrier: no descriptors and exactly one integer slot
    pub fn from_token(token: u32) -> Self {
        Self {
            fds: Vec::new(),
            ints: vec![token as i32],
        }
    }

    /// Decode a token carrier.
    ///
    /// Anything other than zero descriptors and exactly one integer is
    /// rejected before the token value is looked at.
    pub fn token(&self) -> Result<u32> {
        if self.num_fds() != 0 || self.num_ints() != 1 {
            return Err(BufferHubError::invalid_token(format!(
                "malformed carrier: {} fds, {} ints",
                self.num_fds(),
                self.num_ints()
            )));
        }
        Ok(self.ints[0] as u32)
    }

    pub fn fds(&self) -> &[RawFd] {
        &self.fds
    }

    pub fn ints(&self) -> &[i32] {
        &self.ints
    }

    pub fn num_fds(&self) -> usize {
        self.fds.len()
    }

    pub fn num_ints(&self) -> usize {
        self.ints.len()
    }

    /// True for the null handle
    pub fn is_empty(&self) -> bool {
        self.fds.is_empty() && self.ints.is_empty()
    }
}
