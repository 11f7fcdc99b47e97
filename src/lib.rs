//! An ordered-key container implemented as a red-black tree whose nodes live in a chunked arena.
//!
//! Parent and child links are stable arena handles rather than owning pointers, and every missing
//! child is represented by a single sentinel leaf shared within the tree, so the rebalancing code
//! never has to special-case absent nodes.

#[macro_use]
extern crate serde_derive;
extern crate serde;

pub mod arena;
pub mod red_black_tree;
