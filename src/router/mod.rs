//! # Router Module
//!
//! Method-aware path matching. Routes are registered per [`Verb`] into a
//! [`PathTrie`] of path segments, and a lookup returns the handler chain bound
//! at the matched node together with the captured parameters.
//!
//! ## Route grammar
//!
//! - `users` - literal segment, matched verbatim
//! - `:id` - parameter segment, binds exactly one request segment to `id`
//! - `*` - registered at the root only, the last-resort fallback when no
//!   literal/parameter path exists
//!
//! ## Architecture
//!
//! 1. **Registration**: [`MethodRegistry::register_route`] creates the verb's
//!    trie on first use and appends handlers to the addressed node. Repeating a
//!    path composes a longer chain.
//! 2. **Matching**: [`MethodRegistry::lookup`] walks one segment per level,
//!    literal child first, then the parameter child, and falls back to the root
//!    wildcard on a miss. A miss is a [`RouteMatch`] with no handlers.
//! 3. **Live updates**: [`SharedRegistry`] publishes new tables with an atomic
//!    snapshot swap.
//!
//! See [`trie`] for how the edge cases of matching behave.

mod core;
mod shared;
pub mod trie;
mod verb;


pub use self::core::{MethodRegistry, ParamVec, RouteMatch, MAX_INLINE_PARAMS};
pub use shared::SharedRegistry;
pub use trie::{PathTrie, RouteNode, SegmentKind};
pub use verb::{UnknownVerb, Verb};
