//! # eyetribe
//!
//! Client for The Eye Tribe tracker server with:
//! - JSON request/response codec
//! - Correlation of replies within an asynchronous frame stream
//! - Calibration session state machine
//! - Blocking TCP transport with heartbeat keep-alive
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                        Client                                │
//! │              (one method per capability)                     │
//! └──────────────┬──────────────────────────────┬───────────────┘
//!                │                              │
//!                │                     ┌────────▼────────┐
//!                │                     │   Calibration   │
//!                │                     │     Session     │
//!                │                     └────────┬────────┘
//!                │                              │
//! ┌──────────────▼──────────────────────────────▼───────────────┐
//! │                      Correlator                              │
//! │        (send request, block on matching frame)               │
//! └─────────────────────┬───────────────────────────────────────┘
//!                       │
//!          ┌────────────┴────────────┐
//!          │                         │
//!          ▼                         ▼
//!   ┌─────────────┐          ┌─────────────┐
//!   │  Protocol   │          │  Transport  │
//!   │   (codec)   │          │    (TCP)    │
//!   └─────────────┘          └─────────────┘
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod config;

pub mod protocol;
pub mod network;
pub mod correlator;
pub mod calibration;
pub mod client;
pub mod shared;

// =============================================================================
// Public API Re-exports
// =============================================================================

pub use error::{EyeTribeError, Result};
pub use config::Config;
pub use calibration::{CalibrationState, PointEndOutcome};
pub use client::Client;
pub use network::{TcpTransport, Transport};
pub use shared::SharedClient;

// =============================================================================
// Version Info
// =============================================================================

/// Current version of the client library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
