//! Server implementations
//!
//! - portal: the account web portal (login, character list, password change)

pub mod portal;
