//! cg-portal - account portal for a legacy game server database
//!
//! The game keeps its accounts and characters in MySQL tables encoded in
//! GBK. This crate puts a UTF-8 web portal in front of them: every string
//! crosses a charset bridge on its way to and from the datastore.

// ============================================
// Core Modules
// ============================================

/// Server configuration (YAML)
pub mod config;
/// Error taxonomy and the HTTP error body
pub mod error;
/// UTF-8 <-> legacy charset transcoding
pub mod charset;
/// Connection pool, query gateway, MySQL backend
pub mod database;
/// Session tokens
pub mod session;
/// Session cookie check and input validation
pub mod auth;
/// Row to display-record mapping
pub mod projector;

// ============================================
// Servers
// ============================================

/// Server implementations (portal)
pub mod servers;
