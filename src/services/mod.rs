//! Services Layer
//!
//! Business operations that span several tables and need a transaction.
//! Handlers call these directly; single-table work goes through the
//! repositories.

pub mod catalog_service;
