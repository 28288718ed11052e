// SPDX-License-Identifier: Parity-7.0.0 OR PolyForm-Noncommercial-1.0.0

mod bound_device;
mod entry_point;
mod error;
mod kernel;
mod sort_pass;
mod unbound_device;

pub use bound_device::BoundDevice;
pub use entry_point::EntryPoint;
pub(crate) use error::Error;
pub use sort_pass::SortPass;
pub use unbound_device::UnboundDevice;
