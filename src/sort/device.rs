// SPDX-License-Identifier: Parity-7.0.0 OR PolyForm-Noncommercial-1.0.0
//!Cross-platform COMPUTE device wrappers
use std::fmt::Formatter;

use crate::entry_point::EntryPoint;
use crate::imp;

///Cross-platform unbound device, sort edition
pub(crate) struct UnboundDevice(pub(crate) crate::imp::UnboundDevice);
impl UnboundDevice {
    ///Pick a compute-capable device
    pub async fn pick(entry_point: &EntryPoint) -> Result<UnboundDevice, PickError> {
        crate::imp::UnboundDevice::pick(entry_point)
            .await
            .map(UnboundDevice)
            .map_err(PickError)
    }
}

#[derive(Debug)]
pub struct PickError(imp::Error);
impl std::fmt::Display for PickError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        std::fmt::Display::fmt(&self.0, f)
    }
}
impl std::error::Error for PickError {}

/**
Cross-platform bound device, sort edition.

The bound device carries the capability the sorting network is generated
against: [`max_workgroup_size`](BoundDevice::max_workgroup_size), the
invocation-group limit `G` that separates local from global phases.
*/
#[derive(Debug)]
pub struct BoundDevice(pub(crate) imp::BoundDevice);

impl AsRef<imp::BoundDevice> for BoundDevice {
    fn as_ref(&self) -> &imp::BoundDevice {
        &self.0
    }
}

#[derive(Debug)]
pub struct BindError(imp::Error);
impl std::fmt::Display for BindError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        std::fmt::Display::fmt(&self.0, f)
    }
}
impl std::error::Error for BindError {}

impl BoundDevice {
    pub(crate) async fn bind(unbound_device: UnboundDevice) -> Result<Self, BindError> {
        let bind = crate::imp::BoundDevice::bind(unbound_device)
            .await
            .map_err(BindError)?;
        Ok(Self(bind))
    }

    ///The largest invocation group the device (and kernel template) support.
    pub fn max_workgroup_size(&self) -> u32 {
        self.0.max_workgroup_size()
    }
}

// Boilerplate implementations

impl Clone for BoundDevice {
    fn clone(&self) -> Self {
        // Safe to clone - resources are shared via Arc in the backend implementation.
        Self(self.0.clone())
    }
}
