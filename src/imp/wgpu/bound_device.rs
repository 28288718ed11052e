// SPDX-License-Identifier: Parity-7.0.0 OR PolyForm-Noncommercial-1.0.0
use crate::imp::Error;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Receiver, Sender};
use std::thread::{self, JoinHandle};
use wgpu::{Limits, PollType, Trace};

///Largest workgroup width the generated kernel will use, regardless of what
/// the adapter advertises.
const MAX_KERNEL_WORKGROUP_SIZE: u32 = 256;

/// Internal resource management for BoundDevice
/// This type owns the actual GPU resources and handles cleanup
#[derive(Debug)]
struct BoundDeviceResources {
    device: wgpu::Device,
    queue: wgpu::Queue,
    #[allow(dead_code)] //must outlive the device
    adapter: wgpu::Adapter,
    poll_thread: Option<JoinHandle<()>>,
    poll_shutdown: Arc<AtomicBool>,
    poll_trigger: Sender<()>,
}

/// Cross-platform bound device that can be safely cloned
/// Multiple instances share the same underlying GPU resources
#[derive(Debug, Clone)]
pub struct BoundDevice {
    resources: Arc<BoundDeviceResources>,
}

impl BoundDevice {
    pub(crate) async fn bind(
        unbound_device: crate::sort::device::UnboundDevice,
    ) -> Result<Self, Error> {
        let adapter = unbound_device.0.adapter;
        let label = wgpu::Label::from("Bound Device");
        //compute shaders need real limits, not the webgl2 downlevel set
        let limits = Limits::default();

        let descriptor = wgpu::DeviceDescriptor {
            label,
            required_features: Default::default(),
            required_limits: limits,
            memory_hints: Default::default(),
            trace: Trace::Off,
        };
        let (device, queue) = adapter.request_device(&descriptor).await?;

        let jailbreak_device = device.clone();
        let poll_shutdown = Arc::new(AtomicBool::new(false));
        let shutdown_clone = poll_shutdown.clone();

        let (poll_sender, poll_receiver): (Sender<()>, Receiver<()>) = mpsc::channel();

        let poll_thread = thread::Builder::new()
            .name("wgpu_poll".to_string())
            .spawn(move || {
                while !shutdown_clone.load(Ordering::Relaxed) {
                    // Wait for a signal that polling is needed
                    match poll_receiver.recv() {
                        Ok(_) => {
                            // Poll until the queue is empty
                            let _ = jailbreak_device.poll(PollType::Wait);
                        }
                        Err(_) => break, // Channel closed, exit thread
                    }
                }
            })
            .expect("Failed to spawn wgpu polling thread");
        let resources = BoundDeviceResources {
            device,
            queue,
            adapter,
            poll_thread: Some(poll_thread),
            poll_shutdown,
            poll_trigger: poll_sender,
        };
        Ok(BoundDevice {
            resources: Arc::new(resources),
        })
    }

    /// Signal the polling thread that GPU work may be ready
    pub fn set_needs_poll(&self) {
        // Send a signal to the polling thread (ignore if channel is full/closed)
        let _ = self.resources.poll_trigger.send(());
    }

    /**
    The invocation-group capability `G` the sorting network is generated for.

    This is the adapter's x-axis workgroup limit, capped at the kernel
    template's own maximum.
    */
    pub fn max_workgroup_size(&self) -> u32 {
        let limits = self.resources.device.limits();
        let supported = limits
            .max_compute_workgroup_size_x
            .min(limits.max_compute_invocations_per_workgroup)
            .min(MAX_KERNEL_WORKGROUP_SIZE);
        //the network's block math needs a power-of-two group
        if supported.is_power_of_two() {
            supported
        } else {
            supported.next_power_of_two() / 2
        }
    }

    ///Largest storage-buffer binding the device accepts, in bytes.
    pub(super) fn max_storage_binding(&self) -> u64 {
        self.resources.device.limits().max_storage_buffer_binding_size as u64
    }

    /// Access to the wgpu device
    pub(super) fn device(&self) -> &wgpu::Device {
        &self.resources.device
    }

    /// Access to the wgpu queue
    pub(super) fn queue(&self) -> &wgpu::Queue {
        &self.resources.queue
    }
}

impl Drop for BoundDeviceResources {
    fn drop(&mut self) {
        // Signal the polling thread to shut down
        self.poll_shutdown.store(true, Ordering::Relaxed);
        // Wake it out of recv so it can observe the flag
        let _ = self.poll_trigger.send(());

        // Wait for the polling thread to finish
        if let Some(handle) = self.poll_thread.take() {
            let _ = handle.join();
        }
    }
}
