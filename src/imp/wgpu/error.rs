use std::fmt::Display;

#[derive(Debug, thiserror::Error)]
pub(crate) enum Error {
    NoSuchAdapter,
    RequestDeviceError(#[from] wgpu::RequestDeviceError),
    BufferMapError(#[from] wgpu::BufferAsyncError),
    StorageLimit { requested: u64, limit: u64 },
}

impl Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Error::NoSuchAdapter => write!(f, "No such adapter"),
            Error::RequestDeviceError(e) => write!(f, "{}", e),
            Error::BufferMapError(e) => write!(f, "{}", e),
            Error::StorageLimit { requested, limit } => write!(
                f,
                "Element buffer needs {} bytes but the device caps storage bindings at {}",
                requested, limit
            ),
        }
    }
}
