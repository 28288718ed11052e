// SPDX-License-Identifier: Parity-7.0.0 OR PolyForm-Noncommercial-1.0.0

/*! Device resources and per-step execution for one sort.

A `SortPass` owns everything sized to the element count: the input/output
storage pair, the staging buffer results are read back through, the config
uniform the driver writes each step, and the swap-diagnostic counter.
Recording a step is synchronous; only the optional readback suspends.
*/

use crate::bindings::payload::{bytes_to_vec, slice_as_bytes};
use crate::bindings::{CRepr, SortablePayload};
use crate::sort::network::Step;
use std::marker::PhantomData;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use wgpu::util::DeviceExt;

///The config record the kernel reads each step.
#[repr(C)]
#[derive(Copy, Clone, Debug)]
struct SortParams {
    width: f32,
    height: f32,
    algo: u32,
    block_height: u32,
}

unsafe impl CRepr for SortParams {}

#[derive(Debug)]
pub struct SortPass<Payload> {
    bound_device: Arc<crate::sort::BoundDevice>,
    pipeline: wgpu::ComputePipeline,
    bind_group: wgpu::BindGroup,
    input: wgpu::Buffer,
    output: wgpu::Buffer,
    ///Host-mappable; elements first, then the swap counter.
    staging: wgpu::Buffer,
    params: wgpu::Buffer,
    counter: wgpu::Buffer,
    element_count: u32,
    element_bytes: u64,
    group_size: u32,
    workgroups: u32,
    ///Set while the staging buffer is promised to an unfinished readback.
    readback_in_flight: AtomicBool,
    _marker: PhantomData<Payload>,
}

impl<Payload: SortablePayload> SortPass<Payload> {
    pub(crate) async fn new(
        bound_device: Arc<crate::sort::BoundDevice>,
        initial: &[Payload],
        debug_name: &str,
    ) -> Result<Self, super::Error> {
        let element_count = initial.len() as u32;
        let element_bytes = (initial.len() * std::mem::size_of::<Payload>()) as u64;
        let limit = bound_device.0.max_storage_binding();
        if element_bytes > limit {
            return Err(super::Error::StorageLimit {
                requested: element_bytes,
                limit,
            });
        }
        //half the elements per invocation; small sorts shrink the group
        let group_size = (element_count / 2).min(bound_device.0.max_workgroup_size()).max(1);
        let workgroups = (element_count / 2).div_ceil(group_size);

        let device = bound_device.0.device();

        let input = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(&format!("{debug_name} input")),
            contents: slice_as_bytes(initial),
            usage: wgpu::BufferUsages::STORAGE | wgpu::BufferUsages::COPY_DST,
        });
        let output = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some(&format!("{debug_name} output")),
            size: element_bytes,
            usage: wgpu::BufferUsages::STORAGE | wgpu::BufferUsages::COPY_SRC,
            mapped_at_creation: false,
        });
        let staging = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some(&format!("{debug_name} staging")),
            size: element_bytes + 4,
            usage: wgpu::BufferUsages::MAP_READ | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        let params = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some(&format!("{debug_name} params")),
            size: std::mem::size_of::<SortParams>() as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        let counter = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(&format!("{debug_name} swap counter")),
            contents: slice_as_bytes(&[0u32]),
            usage: wgpu::BufferUsages::STORAGE
                | wgpu::BufferUsages::COPY_SRC
                | wgpu::BufferUsages::COPY_DST,
        });

        let module = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some(debug_name),
            source: wgpu::ShaderSource::Wgsl(
                super::kernel::sort_kernel_source::<Payload>(group_size).into(),
            ),
        });

        let storage_entry = |binding, read_only| wgpu::BindGroupLayoutEntry {
            binding,
            visibility: wgpu::ShaderStages::COMPUTE,
            ty: wgpu::BindingType::Buffer {
                ty: wgpu::BufferBindingType::Storage { read_only },
                has_dynamic_offset: false,
                min_binding_size: None,
            },
            count: None,
        };
        let bind_group_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some(debug_name),
            entries: &[
                storage_entry(0, true),
                storage_entry(1, false),
                wgpu::BindGroupLayoutEntry {
                    binding: 2,
                    visibility: wgpu::ShaderStages::COMPUTE,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Uniform,
                        has_dynamic_offset: false,
                        min_binding_size: None,
                    },
                    count: None,
                },
                storage_entry(3, false),
            ],
        });
        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some(debug_name),
            layout: &bind_group_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: input.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: output.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 2,
                    resource: params.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 3,
                    resource: counter.as_entire_binding(),
                },
            ],
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some(debug_name),
            bind_group_layouts: &[&bind_group_layout],
            push_constant_ranges: &[],
        });
        let pipeline = device.create_compute_pipeline(&wgpu::ComputePipelineDescriptor {
            label: Some(debug_name),
            layout: Some(&pipeline_layout),
            module: &module,
            entry_point: Some("compute_main"),
            compilation_options: Default::default(),
            cache: None,
        });

        Ok(SortPass {
            bound_device,
            pipeline,
            bind_group,
            input,
            output,
            staging,
            params,
            counter,
            element_count,
            element_bytes,
            group_size,
            workgroups,
            readback_in_flight: AtomicBool::new(false),
            _marker: PhantomData,
        })
    }

    ///The invocation-group size the kernel was generated for.
    pub(crate) fn group_size(&self) -> u32 {
        self.group_size
    }

    ///Replaces the unsorted contents.  The caller must have validated the length.
    pub(crate) fn write_elements(&self, elements: &[Payload]) {
        assert_eq!(elements.len() as u32, self.element_count);
        self.bound_device
            .0
            .queue()
            .write_buffer(&self.input, 0, slice_as_bytes(elements));
    }

    ///Zeroes the swap-diagnostic counter.
    pub(crate) fn clear_swap_counter(&self) {
        self.bound_device
            .0
            .queue()
            .write_buffer(&self.counter, 0, slice_as_bytes(&[0u32]));
    }

    /**
    Claims the staging buffer for a readback.

    Returns false if an earlier readback is still in flight; the staging
    buffer cannot be copied into while it is (or is about to be) mapped.
    */
    pub(crate) fn try_begin_readback(&self) -> bool {
        !self.readback_in_flight.swap(true, Ordering::AcqRel)
    }

    /**
    Records and submits one comparison pass.

    Writes the config record, dispatches enough workgroups to cover every
    element pair, and copies the output back over the input so the next
    step sees this one's result.  With `with_staging_copy` (caller must
    hold the readback claim) the output and counter are also copied to the
    staging buffer for [`finish_readback`](Self::finish_readback).
    */
    pub(crate) fn record_step(
        &self,
        step: Step,
        block_height: u32,
        grid: (u32, u32),
        with_staging_copy: bool,
    ) {
        let queue = self.bound_device.0.queue();
        let params = SortParams {
            width: grid.0 as f32,
            height: grid.1 as f32,
            algo: step.code(),
            block_height,
        };
        queue.write_buffer(&self.params, 0, slice_as_bytes(&[params]));

        let mut encoder = self.bound_device.0.device().create_command_encoder(
            &wgpu::CommandEncoderDescriptor {
                label: wgpu::Label::from("SortPass::record_step"),
            },
        );
        {
            let mut pass = encoder.begin_compute_pass(&wgpu::ComputePassDescriptor {
                label: wgpu::Label::from("sort step"),
                timestamp_writes: None,
            });
            pass.set_pipeline(&self.pipeline);
            pass.set_bind_group(0, &self.bind_group, &[]);
            pass.dispatch_workgroups(self.workgroups, 1, 1);
        }
        encoder.copy_buffer_to_buffer(&self.output, 0, &self.input, 0, self.element_bytes);
        if with_staging_copy {
            self.encode_staging_copy(&mut encoder);
        }
        queue.submit(std::iter::once(encoder.finish()));
    }

    ///Submits a bare staging copy, for readbacks outside any step.  Caller
    /// must hold the readback claim.
    pub(crate) fn record_staging_copy(&self) {
        let mut encoder = self.bound_device.0.device().create_command_encoder(
            &wgpu::CommandEncoderDescriptor {
                label: wgpu::Label::from("SortPass::record_staging_copy"),
            },
        );
        self.encode_staging_copy(&mut encoder);
        self.bound_device
            .0
            .queue()
            .submit(std::iter::once(encoder.finish()));
    }

    fn encode_staging_copy(&self, encoder: &mut wgpu::CommandEncoder) {
        encoder.copy_buffer_to_buffer(&self.output, 0, &self.staging, 0, self.element_bytes);
        encoder.copy_buffer_to_buffer(&self.counter, 0, &self.staging, self.element_bytes, 4);
    }

    /**
    Maps the staging buffer and returns the elements and swap count it holds.

    Resolves once the GPU finishes the copy recorded for this readback.
    Releases the readback claim on every path.
    */
    pub(crate) async fn finish_readback(&self) -> Result<(Vec<Payload>, u32), super::Error> {
        struct Claim<'a>(&'a AtomicBool);
        impl Drop for Claim<'_> {
            fn drop(&mut self) {
                self.0.store(false, Ordering::Release);
            }
        }
        let claim = Claim(&self.readback_in_flight);

        let readback_perf = logwise::perfwarn_begin!("SortPass::finish_readback");
        let slice = self.staging.slice(..);
        let (s, r) = r#continue::continuation();
        slice.map_async(wgpu::MapMode::Read, move |result| {
            s.send(result);
        });
        // Signal the polling thread that we need to poll
        self.bound_device.0.set_needs_poll();
        r.await?;

        let (elements, swaps) = {
            let mapped = slice.get_mapped_range();
            let elements = bytes_to_vec::<Payload>(&mapped[..self.element_bytes as usize]);
            let mut counter_bytes = [0u8; 4];
            counter_bytes.copy_from_slice(&mapped[self.element_bytes as usize..]);
            (elements, u32::from_le_bytes(counter_bytes))
        };
        self.staging.unmap();
        drop(readback_perf);
        drop(claim);
        Ok((elements, swaps))
    }
}
