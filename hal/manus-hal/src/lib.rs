//! Manus Hardware Abstraction Layer
//!
//! This crate defines the output capability the controller drives relays
//! through. The controller never touches pins directly, so the same
//! application code runs against real GPIO or an in-memory board.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────┐
//! │  Application (manus-controller)         │
//! └─────────────────────────────────────────┘
//!                     │
//!                     ▼
//! ┌─────────────────────────────────────────┐
//! │  manus-hal (this crate - OutputChannel) │
//! └─────────────────────────────────────────┘
//!                     │
//!         ┌───────────┴───────────┐
//!         ▼                       ▼
//! ┌───────────────┐       ┌───────────────┐
//! │  PinChannel   │       │  SimChannel   │
//! │ (embedded-hal)│       │  (in-memory)  │
//! └───────────────┘       └───────────────┘
//! ```
//!
//! # Types
//!
//! - [`output::OutputChannel`] - one binary output (a relay coil)
//! - [`pin::PinChannel`] - adapter over any `embedded_hal` output pin
//! - [`sim::SimBoard`], [`sim::SimChannel`] - simulated relay board

#![deny(unsafe_code)]

pub mod output;
pub mod pin;
pub mod sim;

// Re-export key types at crate root for convenience
pub use output::{ChannelError, OutputChannel};
pub use pin::PinChannel;
pub use sim::{ChannelEvent, InterlockViolation, SimBoard, SimChannel};
