//! # Ledger Hex
//!
//! Application service layer and HTTP adapter for the wallet ledger.
//!
//! ## Architecture
//!
//! - `wallets/` - Wallet lifecycle and single-wallet adjustments
//! - `thresholds/` - Multi-window limit evaluation
//! - `orchestrator/` - All-or-nothing transfer workflow
//! - `locks/` - Keyed mutual exclusion shared by every mutation path
//! - `service/` - DTO-level facade over the components above
//! - `inbound/` - HTTP adapter (Axum server)
//!
//! The service is generic over `R: LedgerRepository`, allowing
//! different repository implementations to be injected.

pub mod inbound;
pub mod locks;
pub mod openapi;
pub mod orchestrator;
pub mod service;
pub mod thresholds;
pub mod wallets;

#[cfg(test)]
mod service_tests;

pub use orchestrator::{OrchestratorConfig, TransferOrchestrator};
pub use service::{Collaborators, LedgerService};
