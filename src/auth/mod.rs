pub mod auth;

// Re-export from auth.rs so we can do "use crate::auth::*;"
pub use auth::Auth;
