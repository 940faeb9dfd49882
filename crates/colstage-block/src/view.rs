//! Non-owning views into the blocks of a [`BlockBuffer`](crate::BlockBuffer).
//!
//! Views borrow from the buffer that produced them, so they can never
//! outlive it and never own the memory they describe.

use std::ops::{Deref, DerefMut};

/// Read-only view of the logically used part of one block.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Block<'a> {
    data: &'a [u8],
}

impl<'a> Block<'a> {
    pub(crate) fn new(data: &'a [u8]) -> Self {
        Self { data }
    }

    /// The viewed bytes.
    pub fn data(&self) -> &'a [u8] {
        self.data
    }

    /// Length of the view in bytes.
    ///
    /// Equal to the block size for every block but the last, which may
    /// be partially filled.
    pub fn size(&self) -> usize {
        self.data.len()
    }
}

impl Deref for Block<'_> {
    type Target = [u8];

    fn deref(&self) -> &[u8] {
        self.data
    }
}

impl AsRef<[u8]> for Block<'_> {
    fn as_ref(&self) -> &[u8] {
        self.data
    }
}

/// Writable view of a region handed out by
/// [`BlockBuffer::next_block`](crate::BlockBuffer::next_block).
///
/// The region is already counted as used when the view is returned.
#[derive(Debug)]
pub struct BlockMut<'a> {
    data: &'a mut [u8],
}

impl<'a> BlockMut<'a> {
    pub(crate) fn new(data: &'a mut [u8]) -> Self {
        Self { data }
    }

    /// Length of the writable region in bytes.
    pub fn size(&self) -> usize {
        self.data.len()
    }

    /// Consume the view, returning the underlying slice with its full lifetime.
    pub fn into_slice(self) -> &'a mut [u8] {
        self.data
    }
}

impl Deref for BlockMut<'_> {
    type Target = [u8];

    fn deref(&self) -> &[u8] {
        self.data
    }
}

impl DerefMut for BlockMut<'_> {
    fn deref_mut(&mut self) -> &mut [u8] {
        self.data
    }
}

impl AsMut<[u8]> for BlockMut<'_> {
    fn as_mut(&mut self) -> &mut [u8] {
        self.data
    }
}
