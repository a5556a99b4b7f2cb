#![forbid(unsafe_code)]
//! gridstl-algorithms: parallel algorithms over device buffers.
//!
//! Layering:
//! - `grid`: the virtualised parallel-for every launch goes through.
//! - `map` and `reduce`: the two engines (elementwise transform and
//!   multi-pass tree reduction).
//! - `transform`, `transform_reduce`, `find`, `for_each`: host-facing
//!   algorithms composed from the engines.
//!
//! Every call builds its buffers, drives one queue through an
//! [`ExecutionPolicy`], and releases everything before returning. Device
//! failures come back as [`gridstl_device::Error`] unchanged.

pub mod find;
pub mod for_each;
pub mod grid;
pub mod map;
pub mod policy;
pub mod reduce;
pub mod transform;
pub mod transform_reduce;

pub use find::{find, find_iter, position, SearchResult};
pub use for_each::for_each;
pub use policy::{DevicePolicy, ExecutionPolicy};
pub use transform::{transform, transform2, transform_buffers};
pub use transform_reduce::{reduce, transform_reduce};
