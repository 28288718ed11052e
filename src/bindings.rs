/*! The payload side of the sort engine.

Types in this module describe what the engine sorts: a plain `u32` key, or a
composite record that travels with its key.  The engine is generic over
[`payload::SortablePayload`] so that one driver and one kernel template serve
both cases.
*/

pub mod payload;

pub use payload::{CRepr, SortablePayload, SpatialEntry};
