//! Application layer managing session state and screen workflows.
//!
//! [`session`] holds the session state manager that every screen reads and
//! mutates; [`state`] wraps it with forms, navigation and deferred work for
//! the terminal front end.

pub mod session;
pub mod state;

pub use session::*;
pub use state::*;
