/*! The sorting component of flips_and_disperses */

pub use driver::SortDriver;
pub use engine::Engine;

pub mod network;

pub(crate) mod device;
pub(crate) mod engine;

pub mod driver;

pub use device::{BindError, BoundDevice, PickError};
pub use engine::CreateError;
