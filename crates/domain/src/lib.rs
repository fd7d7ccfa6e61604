//! # minibar-domain
//!
//! Pure domain model for the minibar dispensing machine's action engine.
//!
//! ## Responsibilities
//! - Foundational types: typed identifiers, error conventions, timestamps
//! - Define **Event actions** (hardware-triggering behaviours: play audio, run pump, …)
//! - Define **Running actions** (per-invocation execution context and log)
//! - Define **Device descriptors** (logical name + supported capabilities)
//! - Define **Control ranges** (percentage → native hardware range mapping)
//!
//! ## Dependency rule
//! This crate has **no internal dependencies**.
//! It must never import anything from `app`, adapters, or external IO crates.
//! All IO boundaries are expressed as traits in the `app` crate (ports).

pub mod error;
pub mod id;
pub mod time;

pub mod control;
pub mod device;
pub mod event_action;
pub mod running_action;
