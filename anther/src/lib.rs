#![warn(clippy::pedantic)]
#![warn(missing_docs)]
#![warn(unreachable_pub)]
#![doc = include_str!("../README.md")]
//!
//! # Threading Notes
//!
//! Dispatch never holds a registry's critical section while slots run.  
//! Per-slot liveness is published with release/acquire ordering under the
//! [`Synchronized`](`policy::Synchronized`) policy, so a disconnect that returned on one
//! thread is observed by the next liveness check of a dispatch on any other thread.

pub mod policy;
pub mod registry;
