//! # minibar-app
//!
//! Application layer — the action engine and **port definitions** (traits).
//!
//! ## Responsibilities
//! - Define **port traits** that hardware adapters must implement:
//!   - `DeviceDirectory` — enumerate attached endpoints, open lines/channels
//!   - `AudioLine` — a sound output line playing a loaded clip
//!   - `PumpChannel` — a pump motor driver channel
//! - Resolve logical device names against live hardware (`resolver`)
//! - Provide the one-shot completion signal between driver and trigger thread
//!   (`completion`)
//! - Guarantee device release on every exit path (`lease`)
//! - Execute event actions and record their outcome (`engine`)
//!
//! ## Dependency rule
//! Depends on `minibar-domain` only (plus `crossbeam-channel` for the
//! completion signal). Never imports adapter crates. Adapters depend on
//! *this* crate, not the reverse.

pub mod completion;
pub mod engine;
pub mod lease;
pub mod ports;
pub mod resolver;

#[cfg(test)]
pub(crate) mod testing;
