//! Per-device root document.
//!
//! The root document carries the device's supplementary query parameters:
//! a URL-encoded `k=v&k=v` string forwarded to the secondary telemetry
//! source and, when enabled, appended to the primary query.

use std::sync::Arc;

use webcfg_core::{DeviceMac, Lookup};

use crate::error::StoreError;
use crate::kv::KvBackend;

#[derive(Debug, Clone)]
pub struct DeviceRootStore {
    kv: Arc<dyn KvBackend>,
}

impl DeviceRootStore {
    pub fn new(kv: Arc<dyn KvBackend>) -> Self {
        Self { kv }
    }

    /// Stored query params for `mac`.
    pub fn query_params(&self, mac: &DeviceMac) -> Result<Lookup<String>, StoreError> {
        let key = key(mac);
        match self.kv.get(&key)? {
            Some(raw) => String::from_utf8(raw)
                .map(Lookup::Present)
                .map_err(|_| StoreError::Corrupt {
                    key,
                    reason: "query params are not UTF-8".into(),
                }),
            None => Ok(Lookup::Absent),
        }
    }

    /// Replace the stored query params for `mac`.
    pub fn set_query_params(&self, mac: &DeviceMac, params: &str) -> Result<(), StoreError> {
        self.kv.put(&key(mac), params.as_bytes().to_vec())?;
        tracing::info!(mac = %mac, params, "device query params updated");
        Ok(())
    }
}

fn key(mac: &DeviceMac) -> String {
    format!("root/{mac}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kv::MemoryBackend;

    #[test]
    fn set_and_read_back() {
        let kv = Arc::new(MemoryBackend::new());
        let roots = DeviceRootStore::new(kv.clone());
        let mac = DeviceMac::parse("567890abcdef").unwrap();
        assert_eq!(roots.query_params(&mac).unwrap(), Lookup::Absent);

        roots.set_query_params(&mac, "stormReadyWifi=true").unwrap();
        assert_eq!(
            roots.query_params(&mac).unwrap(),
            Lookup::Present("stormReadyWifi=true".to_string())
        );
    }

    #[test]
    fn non_utf8_is_corrupt() {
        let kv = Arc::new(MemoryBackend::new());
        kv.put("root/567890ABCDEF", vec![0xff, 0xfe]).unwrap();
        let roots = DeviceRootStore::new(kv);
        let mac = DeviceMac::parse("567890ABCDEF").unwrap();
        assert!(matches!(
            roots.query_params(&mac),
            Err(StoreError::Corrupt { .. })
        ));
    }
}
