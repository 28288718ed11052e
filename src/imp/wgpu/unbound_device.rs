pub struct UnboundDevice {
    pub(super) adapter: wgpu::Adapter,
}

impl UnboundDevice {
    ///Picks a compute-capable adapter.  No surface is involved; the engine
    /// never presents.
    pub async fn pick(
        entry_point: &crate::entry_point::EntryPoint,
    ) -> Result<UnboundDevice, super::Error> {
        let options = wgpu::RequestAdapterOptions {
            power_preference: Default::default(),
            force_fallback_adapter: false,
            compatible_surface: None,
        };
        let adapter = entry_point.0.0.request_adapter(&options).await;
        let adapter = adapter.map_err(|_| super::Error::NoSuchAdapter)?;

        Ok(UnboundDevice { adapter })
    }
}
