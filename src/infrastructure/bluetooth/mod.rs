//! Bluetooth Module
//!
//! Provides BLE discovery and GATT client access for the application.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────┐
//! │                       BleService                         │
//! │   (worker loop - commands in, events out, settle delay)  │
//! └─────────────────────┬───────────────────────────────────┘
//!                       │
//!             ┌─────────┴─────────┐
//!             ▼                   ▼
//!     ┌──────────────┐   ┌────────────────────┐
//!     │  BleScanner  │   │ LowEnergyController │
//!     │              │   │                    │
//!     │ - scan window│   │ - connect/close    │
//!     │ - dedup      │   │ - GATT discovery   │
//!     │   accumulator│   │ - read/write/notify│
//!     └──────────────┘   └────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`scanner`] - fixed-window device discovery
//! - [`controller`] - GATT client pass-through
//! - [`service`] - worker loop coordinating both
//! - [`error`] - failure classification and user-facing messages

pub mod controller;
pub mod error;
pub mod scanner;
pub mod service;

pub use error::BleError;
