#![forbid(unsafe_code)]
//! gridstl-core: the vocabulary shared by the device runtime and the algorithms.
//!
//! Nothing in here launches work. The crate defines what a device-copyable
//! element is, how a physical launch grid is described, how kernels are named,
//! and how devices and policies are configured.

pub mod budget;
pub mod config;
pub mod element;
pub mod error;
pub mod id;
pub mod range;

pub mod prelude;
