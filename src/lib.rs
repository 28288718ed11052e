/*! flips_and_disperses is GPU sort middleware: a bitonic merge sort network
with a host-side step driver, built for hosts that want to *watch* a sort
run: visualizers, teaching tools, and spatial-hash pipelines that sort on
the device every frame.

Here is a quick chart to compare FD against other ways of ordering data:

| Strategy              | Examples                  | Where it runs | Observable mid-sort | Payloads             | Step count                  | Best at                                          |
|-----------------------|---------------------------|---------------|---------------------|----------------------|-----------------------------|--------------------------------------------------|
| Library sort          | `sort_unstable`           | CPU           | No                  | Anything `Ord`       | n/a                         | Almost everything that fits on one core          |
| GPU radix sort        | Vendor compute libraries  | GPU           | No                  | Keys + value indices | Fixed digit passes          | Raw throughput on huge arrays                    |
| Bitonic, fire-and-forget | One-submission networks | GPU           | No                  | Keys                 | `log²` passes, one submission | Sorting inside a larger GPU frame              |
| Bitonic, step-driven  | flips_and_disperses       | GPU           | **Every step**      | Keys or records      | `k(k+1)/2` for `k = log2(N)` | Watching, pausing, and single-stepping the sort |

The engine splits into three pieces:

1. A pure sorting network ([`sort::network`]): the step-count formula, the
   flip/disperse phase state machine, and the index pairing rule.  No device
   required; this is also the executable reference the kernel is tested
   against.
2. A compare-and-swap compute kernel, generated per payload type and
   workgroup size, with a *local* variant that stages elements through
   workgroup shared storage and a *global* variant for comparisons that
   cross workgroup boundaries.
3. A step driver ([`sort::SortDriver`]) that writes phase parameters,
   dispatches one pass per step, optionally reads results back for display,
   and advances, either single-stepped, on a timer, or straight to completion.

Payloads are either bare `u32` keys or records that ride along with one
(see [`bindings::SpatialEntry`]); the engine is generic over
[`bindings::SortablePayload`].

# Backends

Current development targets [wgpu](https://wgpu.rs) as backend, so we
inherit its broad support for DX12, Vulkan, Metal, and WebGPU.  The backend
boundary is the same one a multi-backend middleware would have; everything
above `imp` is backend-agnostic and the network layer is pure.

*/

pub mod bindings;
mod entry_point;
mod imp;
pub mod sort;
