//! # Storage Module
//!
//! Data persistence for the finance tracker.
//!
//! The domain layer only sees the traits in [`traits`]; the SQLite
//! implementation lives in [`sqlite`]. Schema creation happens when the
//! connection is opened.

pub mod sqlite;
pub mod traits;

pub use sqlite::DbConnection;
pub use traits::*;
