use std::fmt::Debug;
use std::hash::Hash;

/// Identifier of a fetchable unit (typically a URL string).
///
/// Blanket-implemented for every type with the needed bounds.
pub trait ResourceKey: Clone + Eq + Hash + Debug + Send + Sync + 'static {}

impl<T> ResourceKey for T where T: Clone + Eq + Hash + Debug + Send + Sync + 'static {}
