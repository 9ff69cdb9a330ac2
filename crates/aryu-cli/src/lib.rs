//! Command-line front end for Aryu realtime channels.
//!
//! The binary wires the production transports into the generic runtime.
//! This library holds the parts worth testing on their own: the stdin
//! command grammar and the logging surface.

#![forbid(unsafe_code)]
#![deny(missing_docs)]

pub mod command;
pub mod surface;
