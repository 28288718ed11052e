// SPDX-License-Identifier: Parity-7.0.0 OR PolyForm-Noncommercial-1.0.0

/*! Generates the compare-and-swap kernel.

The kernel is a template: the workgroup width and the element type are
spliced in at pipeline-build time, so one source serves every payload and
every device capability.  Each invocation owns one element pair per step;
the driver selects the pairing rule by writing a phase code into the
`SortParams` uniform before dispatch.

Local phases stage a whole workgroup-sized window of elements through
shared storage with a barrier on each side; global phases touch main
storage directly, which is the only way to reach a partner in another
workgroup.
*/

use crate::bindings::SortablePayload;

pub(super) fn sort_kernel_source<Payload: SortablePayload>(workgroup_size: u32) -> String {
    debug_assert!(workgroup_size >= 1);
    let shared_len = workgroup_size * 2;
    let prelude = Payload::WGSL_PRELUDE;
    let element = Payload::WGSL_ELEMENT;
    let key = Payload::WGSL_KEY_SUFFIX;
    format!(
        r#"struct SortParams {{
  width: f32,
  height: f32,
  algo: u32,
  block_height: u32,
}}

{prelude}// Shared staging for one workgroup's window of elements
var<workgroup> local_data: array<{element}, {shared_len}>;

@group(0) @binding(0) var<storage, read> input_data: array<{element}>;
@group(0) @binding(1) var<storage, read_write> output_data: array<{element}>;
@group(0) @binding(2) var<uniform> params: SortParams;
@group(0) @binding(3) var<storage, read_write> swap_counter: atomic<u32>;

// idx_before is always the structurally earlier index
fn local_compare_and_swap(idx_before: u32, idx_after: u32) {{
  if (local_data[idx_after]{key} < local_data[idx_before]{key}) {{
    atomicAdd(&swap_counter, 1u);
    var temp: {element} = local_data[idx_before];
    local_data[idx_before] = local_data[idx_after];
    local_data[idx_after] = temp;
  }}
}}

fn global_compare_and_swap(idx_before: u32, idx_after: u32) {{
  if (input_data[idx_after]{key} < input_data[idx_before]{key}) {{
    atomicAdd(&swap_counter, 1u);
    output_data[idx_before] = input_data[idx_after];
    output_data[idx_after] = input_data[idx_before];
  }} else {{
    output_data[idx_before] = input_data[idx_before];
    output_data[idx_after] = input_data[idx_after];
  }}
}}

// Mirrored pairing within the block: first against last, and so on inward
fn get_flip_indices(invocation: u32, block_height: u32) -> vec2<u32> {{
  let block_offset: u32 = ((2u * invocation) / block_height) * block_height;
  let half_height = block_height / 2u;
  var idx = vec2<u32>(
    invocation % half_height,
    block_height - (invocation % half_height) - 1u,
  );
  idx.x += block_offset;
  idx.y += block_offset;
  return idx;
}}

// Adjacent-half pairing: each lower-half element against the one half_height above
fn get_disperse_indices(invocation: u32, block_height: u32) -> vec2<u32> {{
  let block_offset: u32 = ((2u * invocation) / block_height) * block_height;
  let half_height = block_height / 2u;
  var idx = vec2<u32>(
    invocation % half_height,
    (invocation % half_height) + half_height,
  );
  idx.x += block_offset;
  idx.y += block_offset;
  return idx;
}}

// Phase codes as written by the step driver
const ALGO_DISPERSE_LOCAL: u32 = 2u;

@compute @workgroup_size({workgroup_size}, 1, 1)
fn compute_main(
  @builtin(global_invocation_id) global_id: vec3<u32>,
  @builtin(local_invocation_id) local_id: vec3<u32>,
  @builtin(workgroup_id) workgroup_id: vec3<u32>,
) {{
  let offset = {workgroup_size}u * 2u * workgroup_id.x;
  if (params.algo <= ALGO_DISPERSE_LOCAL) {{
    // One invocation stages two elements of this workgroup's window...
    local_data[local_id.x * 2u] = input_data[offset + local_id.x * 2u];
    local_data[local_id.x * 2u + 1u] = input_data[offset + local_id.x * 2u + 1u];
  }}

  //...and everyone waits for staging to finish before comparing.
  workgroupBarrier();

  switch params.algo {{
    case 1u: {{ // Local Flip
      let idx = get_flip_indices(local_id.x, params.block_height);
      local_compare_and_swap(idx.x, idx.y);
    }}
    case 2u: {{ // Local Disperse
      let idx = get_disperse_indices(local_id.x, params.block_height);
      local_compare_and_swap(idx.x, idx.y);
    }}
    case 3u: {{ // Global Flip
      let idx = get_flip_indices(global_id.x, params.block_height);
      global_compare_and_swap(idx.x, idx.y);
    }}
    case 4u: {{ // Global Disperse
      let idx = get_disperse_indices(global_id.x, params.block_height);
      global_compare_and_swap(idx.x, idx.y);
    }}
    default: {{
    }}
  }}

  // All compares settle before the window is written back
  workgroupBarrier();

  if (params.algo <= ALGO_DISPERSE_LOCAL) {{
    output_data[offset + local_id.x * 2u] = local_data[local_id.x * 2u];
    output_data[offset + local_id.x * 2u + 1u] = local_data[local_id.x * 2u + 1u];
  }}
}}
"#
    )
}
