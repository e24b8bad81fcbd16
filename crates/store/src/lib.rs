//! Single-tree state container for quire.
//!
//! A [`Store`] owns the current [`State`](quire_state::State) snapshot and
//! routes every [`Action`](quire_state::Action) through a middleware chain to
//! the core reducer and any plugin reducers. Reducers edit a copy-on-write
//! [`Draft`](quire_state::Draft); a dispatch that changes nothing keeps the
//! previous snapshot and notifies nobody.

mod core_reducer;
mod middleware;
pub mod panic;
mod persistence;
mod reducer;
mod store;
mod subscribers;

pub use core_reducer::{CORE_REDUCER_ID, CoreReducerError, core_reducer, reduce_core};
pub use middleware::{Middleware, MiddlewareApi, Next, logging_middleware, middleware, next_fn};
pub use persistence::{Persistence, StateSink};
pub use reducer::{Reducer, reducer};
pub use store::Store;
pub use subscribers::{Listener, Subscription};
