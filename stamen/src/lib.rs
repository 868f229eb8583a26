#![warn(clippy::pedantic)]
#![warn(missing_docs)]
#![warn(unreachable_pub)]
#![doc = include_str!("../README.md")]
//!
//! # Threading Notes
//!
//! Slots always run on the thread that emits, and never while a lock is held.  
//! A panicking slot unwinds out of `emit` without invoking the remaining slots,
//! and leaves the signal fully usable.
//!
//! # Features
//!
//! - `sync` (default): Enables the [`sync`] module.

pub mod connection;
#[cfg(feature = "sync")]
pub mod sync;
pub mod unsync;

mod combiner;
pub use combiner::{Collect, Combiner, Discard, FailFast, Last};

pub use anther::registry::SlotId;
