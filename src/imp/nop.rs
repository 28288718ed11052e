#![allow(dead_code)]

// SPDX-License-Identifier: Parity-7.0.0 OR PolyForm-Noncommercial-1.0.0
use crate::bindings::SortablePayload;
use crate::sort::network::Step;
use std::fmt::Display;
use std::marker::PhantomData;
use std::sync::Arc;

#[derive(Debug, Clone)]
pub struct EntryPoint;
impl EntryPoint {
    pub async fn new() -> Result<Self, Error> {
        todo!()
    }
}

pub struct UnboundDevice;

impl UnboundDevice {
    pub async fn pick(_entry_point: &crate::entry_point::EntryPoint) -> Result<UnboundDevice, Error> {
        todo!()
    }
}

#[derive(Debug, Clone)]
pub struct BoundDevice;

impl BoundDevice {
    pub(crate) async fn bind(
        _unbound_device: crate::sort::device::UnboundDevice,
    ) -> Result<Self, Error> {
        todo!()
    }

    pub fn max_workgroup_size(&self) -> u32 {
        todo!()
    }

    pub fn set_needs_poll(&self) {
        todo!()
    }
}

#[derive(Debug)]
pub struct SortPass<Payload> {
    _marker: PhantomData<Payload>,
}

impl<Payload: SortablePayload> SortPass<Payload> {
    pub(crate) async fn new(
        _bound_device: Arc<crate::sort::BoundDevice>,
        _initial: &[Payload],
        _debug_name: &str,
    ) -> Result<Self, Error> {
        todo!()
    }

    pub(crate) fn group_size(&self) -> u32 {
        todo!()
    }

    pub(crate) fn write_elements(&self, _elements: &[Payload]) {
        todo!()
    }

    pub(crate) fn clear_swap_counter(&self) {
        todo!()
    }

    pub(crate) fn try_begin_readback(&self) -> bool {
        todo!()
    }

    pub(crate) fn record_step(
        &self,
        _step: Step,
        _block_height: u32,
        _grid: (u32, u32),
        _with_staging_copy: bool,
    ) {
        todo!()
    }

    pub(crate) fn record_staging_copy(&self) {
        todo!()
    }

    pub(crate) async fn finish_readback(&self) -> Result<(Vec<Payload>, u32), Error> {
        todo!()
    }
}

#[derive(Debug)]
pub struct Error;
impl Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Error")
    }
}
impl std::error::Error for Error {}
