// SPDX-License-Identifier: Parity-7.0.0 OR PolyForm-Noncommercial-1.0.0

/*! Sortable payload types and their byte-level marshalling.

The device side sees payloads as raw bytes in storage buffers; the WGSL
kernel sees them as a concrete element type.  [`SortablePayload`] carries
both views so the engine can marshal host slices into device buffers and
splice the element type into the generated kernel source.
*/

/**
Marker for types that can be safely viewed as raw bytes and reconstructed
from them.

# Safety

Implementors must be `#[repr(C)]`, contain no padding whose contents matter,
no pointers, and no invalid bit patterns.  The engine will memcpy values of
this type across the CPU/GPU boundary.
*/
pub unsafe trait CRepr: Copy + 'static {}

unsafe impl CRepr for u32 {}

/**
A payload the bitonic sort engine can order.

The engine compares elements by [`sort_key`](SortablePayload::sort_key) and
moves whole elements when it swaps.  Relative order of elements with equal
keys is unspecified; callers must not rely on stability.

The WGSL constants describe the same type to the generated kernel:
[`WGSL_PRELUDE`](SortablePayload::WGSL_PRELUDE) declares any struct the
element type needs, [`WGSL_ELEMENT`](SortablePayload::WGSL_ELEMENT) names
the element type, and [`WGSL_KEY_SUFFIX`](SortablePayload::WGSL_KEY_SUFFIX)
is appended to an element lvalue to reach the key (empty for scalar keys).
*/
pub trait SortablePayload: CRepr + Send + Sync {
    ///Struct declarations the kernel needs before the element arrays; empty for scalars.
    const WGSL_PRELUDE: &'static str;
    ///WGSL element type name.
    const WGSL_ELEMENT: &'static str;
    ///Accessor suffix from an element lvalue to its `u32` key, e.g. `".key"`.
    const WGSL_KEY_SUFFIX: &'static str;
    ///The value the sorting network orders by, ascending.
    fn sort_key(&self) -> u32;
}

impl SortablePayload for u32 {
    const WGSL_PRELUDE: &'static str = "";
    const WGSL_ELEMENT: &'static str = "u32";
    const WGSL_KEY_SUFFIX: &'static str = "";
    fn sort_key(&self) -> u32 {
        *self
    }
}

/**
A spatial-hash record as used by particle-neighborhood pipelines.

Sorting a buffer of these by `key` groups particles that hash to the same
cell; `index` and `hash` ride along so the consumer can recover the original
particle after the sort.
*/
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct SpatialEntry {
    pub index: u32,
    pub hash: u32,
    pub key: u32,
}

unsafe impl CRepr for SpatialEntry {}

impl SortablePayload for SpatialEntry {
    const WGSL_PRELUDE: &'static str = r#"struct SpatialEntry {
  index: u32,
  hash: u32,
  key: u32,
}

"#;
    const WGSL_ELEMENT: &'static str = "SpatialEntry";
    const WGSL_KEY_SUFFIX: &'static str = ".key";
    fn sort_key(&self) -> u32 {
        self.key
    }
}

///Views a payload slice as the bytes the device will read.
pub(crate) fn slice_as_bytes<T: CRepr>(elements: &[T]) -> &[u8] {
    unsafe {
        std::slice::from_raw_parts(
            elements.as_ptr() as *const u8,
            std::mem::size_of_val(elements),
        )
    }
}

///Reconstructs payloads from bytes read back off the device.
///
/// `bytes.len()` must be a multiple of the element size.
pub(crate) fn bytes_to_vec<T: CRepr>(bytes: &[u8]) -> Vec<T> {
    let size = std::mem::size_of::<T>();
    assert_eq!(bytes.len() % size, 0, "partial element in readback");
    let count = bytes.len() / size;
    let mut out = Vec::with_capacity(count);
    unsafe {
        std::ptr::copy_nonoverlapping(bytes.as_ptr() as *const T, out.as_mut_ptr(), count);
        out.set_len(count);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bytes_round_trip() {
        let entries = [
            SpatialEntry {
                index: 0,
                hash: 0xDEAD,
                key: 3,
            },
            SpatialEntry {
                index: 1,
                hash: 0xBEEF,
                key: 1,
            },
        ];
        let bytes = slice_as_bytes(&entries);
        assert_eq!(bytes.len(), 24);
        let back: Vec<SpatialEntry> = bytes_to_vec(bytes);
        assert_eq!(&back, &entries);
    }

    #[test]
    fn key_extraction() {
        assert_eq!(7u32.sort_key(), 7);
        let e = SpatialEntry {
            index: 9,
            hash: 4,
            key: 2,
        };
        assert_eq!(e.sort_key(), 2);
    }
}
