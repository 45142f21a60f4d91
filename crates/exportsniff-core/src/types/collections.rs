//! Re-exports of performance-oriented collection types.

pub use rustc_hash::{FxHashMap, FxHashSet};
pub use smallvec::SmallVec;

/// SmallVec for the formats sharing one indicator name (usually <4).
pub type SmallVec4<T> = SmallVec<[T; 4]>;
