//! Per-owner device registry

use tracing::{debug, info};

use crate::error::{IntegrityError, IntegrityResult};
use crate::hash::PublicKey;
use crate::storage::{IntegrityStore, StoreResult};
use crate::types::Device;

/// View over the device table.
pub struct DeviceRegistry<'a, S: ?Sized> {
    store: &'a mut S,
}

impl<'a, S: IntegrityStore + ?Sized> DeviceRegistry<'a, S> {
    pub fn new(store: &'a mut S) -> Self {
        Self { store }
    }

    /// Register or re-register a device. Always leaves it active.
    pub fn register(
        &mut self,
        owner: &str,
        device_id: &str,
        name: &str,
        public_key: PublicKey,
    ) -> IntegrityResult<()> {
        let device = Device {
            device_id: device_id.to_string(),
            display_name: name.to_string(),
            public_key,
            is_active: true,
        };
        self.store.put_device(owner, &device)?;
        info!(owner, device_id, "device registered");
        Ok(())
    }

    /// Mark a device inactive. The record itself is kept.
    pub fn deactivate(&mut self, owner: &str, device_id: &str) -> IntegrityResult<()> {
        let mut device = self
            .store
            .device(owner, device_id)?
            .ok_or_else(|| IntegrityError::InvalidDevice(device_id.to_string()))?;
        device.is_active = false;
        self.store.put_device(owner, &device)?;
        info!(owner, device_id, "device deactivated");
        Ok(())
    }

    /// False for unknown devices as well as deactivated ones.
    pub fn is_active(&self, owner: &str, device_id: &str) -> StoreResult<bool> {
        let active = self
            .store
            .device(owner, device_id)?
            .is_some_and(|d| d.is_active);
        debug!(owner, device_id, active, "device status");
        Ok(active)
    }

    pub fn get(&self, owner: &str, device_id: &str) -> StoreResult<Option<Device>> {
        self.store.device(owner, device_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStore;

    const KEY: PublicKey = PublicKey::new([3; 33]);

    #[test]
    fn register_activates() {
        let mut store = MemoryStore::new();
        let mut registry = DeviceRegistry::new(&mut store);
        registry.register("alice", "laptop", "Laptop", KEY).unwrap();
        assert!(registry.is_active("alice", "laptop").unwrap());
    }

    #[test]
    fn unknown_device_is_inactive() {
        let mut store = MemoryStore::new();
        let registry = DeviceRegistry::new(&mut store);
        assert!(!registry.is_active("alice", "ghost").unwrap());
    }

    #[test]
    fn deactivate_keeps_record() {
        let mut store = MemoryStore::new();
        let mut registry = DeviceRegistry::new(&mut store);
        registry.register("alice", "laptop", "Laptop", KEY).unwrap();
        registry.deactivate("alice", "laptop").unwrap();

        assert!(!registry.is_active("alice", "laptop").unwrap());
        let device = registry.get("alice", "laptop").unwrap().unwrap();
        assert!(!device.is_active);
        assert_eq!(device.display_name, "Laptop");
    }

    #[test]
    fn deactivate_unknown_fails() {
        let mut store = MemoryStore::new();
        let mut registry = DeviceRegistry::new(&mut store);
        let err = registry.deactivate("alice", "ghost").unwrap_err();
        assert_eq!(err, IntegrityError::InvalidDevice("ghost".into()));
    }

    #[test]
    fn reregister_overwrites_and_reactivates() {
        let mut store = MemoryStore::new();
        let mut registry = DeviceRegistry::new(&mut store);
        registry.register("alice", "laptop", "Old", KEY).unwrap();
        registry.deactivate("alice", "laptop").unwrap();

        let new_key = PublicKey::new([9; 33]);
        registry.register("alice", "laptop", "New", new_key).unwrap();

        let device = registry.get("alice", "laptop").unwrap().unwrap();
        assert!(device.is_active);
        assert_eq!(device.display_name, "New");
        assert_eq!(device.public_key, new_key);
    }

    #[test]
    fn devices_are_per_owner() {
        let mut store = MemoryStore::new();
        let mut registry = DeviceRegistry::new(&mut store);
        registry.register("alice", "laptop", "Laptop", KEY).unwrap();
        assert!(!registry.is_active("bob", "laptop").unwrap());
    }
}
