//! A variable-arity radix tree.
//!
//! Keys are viewed as bit strings (see [`keys::KeyHash`]) and consumed in
//! MSB-first windows by directory tables whose fan-out grows where the data
//! is dense: full buckets split into small two-bit directories, and a
//! directory whose every slot holds a sub-directory is flattened together
//! with all of them into one table four times as wide. Runs of bits shared
//! by every key in a subtree are skipped outright and never stored. Entries
//! sit in small buckets probed through a one-byte tag array.
//!
//! One engine serves two container shapes. With an ordered key
//! ([`keys::fixed_key::FixedKey`], [`keys::bytes_key::BytesKey`],
//! [`keys::composite_key::CompositeKey`]) the tree behaves like a sorted
//! map: ascending iteration, `lower_bound`/`upper_bound`, range and prefix
//! queries. With [`keys::opaque_key::OpaqueKey`] it behaves like a hash
//! table over a caller-supplied hash, and the ordered surface simply does
//! not compile against it.
//!
//! # Example
//!
//! ```rust
//! use vart::VartTree;
//! use vart::keys::fixed_key::FixedKey;
//!
//! let mut scores: VartTree<FixedKey, &str> = VartTree::new();
//! scores.insert(3u32, "bronze");
//! scores.insert(1u32, "gold");
//! scores.insert(2u32, "silver");
//!
//! let podium: Vec<&str> = scores.iter().map(|(_, v)| *v).collect();
//! assert_eq!(podium, ["gold", "silver", "bronze"]);
//!
//! let key: FixedKey = 2u32.into();
//! assert_eq!(scores.lower_bound(&key).next().map(|(_, v)| *v), Some("silver"));
//! ```

pub mod iter;
pub mod keys;
mod node;
pub mod range;
pub mod stats;
pub mod tree;
pub mod utils;

pub use iter::{Iter, PrefixIter};
pub use keys::bytes_key::BytesKey;
pub use keys::composite_key::CompositeKey;
pub use keys::fixed_key::FixedKey;
pub use keys::opaque_key::OpaqueKey;
pub use keys::{KeyHash, OrderedKey, PrefixKey};
pub use range::Range;
pub use stats::{TreeStats, TreeStatsTrait};
pub use tree::VartTree;
