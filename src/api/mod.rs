//! Typed wrappers for each backend endpoint, implemented on [`ApiClient`](crate::gateway::ApiClient).

pub mod recruits;
pub mod teams;
pub mod users;
