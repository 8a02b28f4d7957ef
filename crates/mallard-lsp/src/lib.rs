//! Language Server Protocol implementation for Mallard pipeline files.
//!
//! This crate wraps `mallard-lsp-core` with the tower-lsp framework:
//! document lifecycle over full-text sync, debounced validation on open and
//! save, completion with trigger characters, and settings pull with
//! config-directory probing.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                        mallard-lsp                           │
//! │        tower-lsp wrapper, JSON-RPC over stdio                │
//! │                                                              │
//! │  ┌───────────┐  ┌────────────┐  ┌──────────────────────┐     │
//! │  │ server.rs │  │ convert.rs │  │   capabilities.rs    │     │
//! │  │  Backend  │  │ core ⇄ LSP │  │ capability negotiation│    │
//! │  └─────┬─────┘  └─────┬──────┘  └──────────────────────┘     │
//! │        │              │                                      │
//! │  ┌─────▼──────────────▼──────────────────────────────────┐   │
//! │  │                  mallard-lsp-core                     │   │
//! │  │          (transport-agnostic analysis logic)          │   │
//! │  └───────────────────────────────────────────────────────┘   │
//! └──────────────────────────────────────────────────────────────┘
//! ```

pub mod capabilities;
pub mod convert;
pub mod server;
pub mod settings;

pub use server::run_server;
