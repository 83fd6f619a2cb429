//! CLI command implementations
//!
//! This module contains the implementation of the login command.

pub mod connect;
