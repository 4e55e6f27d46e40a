/// Optional persistence for the handful of mouse settings a host expects to
/// survive a power cycle: wheel/5-button knock results, streaming
/// enable, resolution, scaling, and mode. Namespaced by `namespace` (the
/// embedding application's pin-pair identifier, mirroring the original
/// firmware's per-device NVS partition) so more than one `Device` can share
/// a single backing store.
///
/// Implement this over whatever the target actually has: a flash-backed
/// key-value store, an EEPROM driver, or (in tests) a `HashMap`. A no-op
/// implementation that always returns `None`/`Ok(())` is a valid choice for
/// applications that don't need settings to survive a reset.
pub trait StateStore {
    type Error;

    fn get_u8(&mut self, namespace: &str, key: &str) -> Option<u8>;
    fn set_u8(&mut self, namespace: &str, key: &str, value: u8) -> Result<(), Self::Error>;
}

/// Keys written under a mouse's namespace. Values are all small enough to
/// fit `u8`; booleans are stored as `0`/`1`.
pub mod keys {
    pub const HAS_WHEEL: &str = "hasWheel";
    pub const HAS_4_AND_5_BTN: &str = "has4and5Btn";
    pub const DATA_REPORTING_ENABLED: &str = "dataRepEn";
    pub const RESOLUTION: &str = "resolution";
    pub const SCALE: &str = "scale";
    pub const MODE: &str = "mode";
}

/// A `StateStore` that discards everything, for embedders with no
/// persistence backend.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullStore;

impl StateStore for NullStore {
    type Error = core::convert::Infallible;

    fn get_u8(&mut self, _namespace: &str, _key: &str) -> Option<u8> {
        None
    }

    fn set_u8(&mut self, _namespace: &str, _key: &str, _value: u8) -> Result<(), Self::Error> {
        Ok(())
    }
}
