// SPDX-License-Identifier: Parity-7.0.0 OR PolyForm-Noncommercial-1.0.0
use crate::entry_point::{EntryPoint, EntryPointError};
use crate::sort::device::BoundDevice;
use crate::sort::device::{BindError, PickError, UnboundDevice};
use std::sync::Arc;

/**
The engine ties an entry point to a bound compute device.

Unlike a rendering engine there is no surface and no port; the only thing a
sort host needs from here is [`bound_device`](Engine::bound_device), which
[`crate::sort::SortDriver`] consumes.
*/
#[derive(Debug)]
pub struct Engine {
    //note that drop order is significant here.
    device: Arc<BoundDevice>,
    _entry_point: Arc<EntryPoint>,
}

impl Engine {
    ///Stands up a headless compute engine on whatever adapter the platform offers.
    pub async fn for_compute() -> Result<Arc<Self>, CreateError> {
        let entry_point = Arc::new(EntryPoint::new().await?);
        let unbound_device = UnboundDevice::pick(&entry_point).await?;
        let bound_device = Arc::new(BoundDevice::bind(unbound_device).await?);
        Ok(Arc::new(Engine {
            device: bound_device,
            _entry_point: entry_point,
        }))
    }

    pub fn bound_device(&self) -> &Arc<BoundDevice> {
        &self.device
    }
}

#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum CreateError {
    #[error("Can't create engine {0}")]
    EntryPoint(#[from] EntryPointError),
    #[error("Can't find a GPU {0}")]
    Gpu(#[from] PickError),
    #[error("Can't bind GPU {0}")]
    Bind(#[from] BindError),
}
