pub mod state;
pub mod store;

pub use state::{Session, SessionEffect, SessionEvent, SessionState, TransitionError};
pub use store::SessionStore;
