//! Self-balancing binary search tree that uses a color bit and a shared sentinel leaf to keep the
//! tree approximately balanced during insertions and deletions.

mod node;
mod tree;

pub use self::tree::{NodeRef, RedBlackTree};

use std::error;
use std::fmt;

/// An error returned when a removal would leave a tree with no elements.
///
/// The tree's invariants assume a black root exists, so the last remaining key cannot be removed.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct RootDeletionError;

impl fmt::Display for RootDeletionError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "cannot remove the last remaining key of a red-black tree")
    }
}

impl error::Error for RootDeletionError {}
