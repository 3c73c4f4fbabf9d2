//! Request registry
//!
//! Owns the mapping of variable name <-> (definition id, request id) <-> last
//! known value, and allocates ids from bounded pools. Definition ids and
//! request ids come from separate monotonic counters, each independently
//! bounded; ids are never reused while an entry lives.
//!
//! All mutation is internally synchronized behind a single mutex: the engine
//! callback path and the host API path may call in concurrently. Accessors
//! return owned clones so no caller ever holds the registry lock while
//! making an engine call.

use crate::catalog::VariableDescriptor;
use crate::error::{Error, Result};
use crate::types::{Value, WireType};
use parking_lot::Mutex;
use std::collections::HashMap;

/// Default capacity of the definition id pool
pub const MAX_DEFINITIONS: u32 = 100;
/// Default capacity of the request id pool
pub const MAX_REQUESTS: u32 = 100;

/// Bounded monotonic id allocator for one id space
#[derive(Debug)]
struct IdPool {
    space: &'static str,
    next: u32,
    capacity: u32,
}

impl IdPool {
    fn new(space: &'static str, capacity: u32) -> Self {
        Self { space, next: 0, capacity }
    }

    fn is_exhausted(&self) -> bool {
        self.next >= self.capacity
    }

    fn allocate(&mut self) -> Result<u32> {
        if self.is_exhausted() {
            return Err(Error::CapacityExceeded {
                space: self.space,
                capacity: self.capacity,
            });
        }
        let id = self.next;
        self.next += 1;
        Ok(id)
    }
}

/// Tracked state for one named variable
#[derive(Debug, Clone, PartialEq)]
pub struct RegistryEntry {
    /// Canonical variable name (uppercase); unique case-insensitively
    pub name: String,
    /// Wire-level definition id, assigned once for the entry's lifetime
    pub definition_id: u32,
    /// Wire-level request id correlating data pulls with responses
    pub request_id: u32,
    /// Typed wire slot for payload decoding
    pub wire_type: WireType,
    /// Engine unit string
    pub unit: String,
    /// Last decoded value; cleared on disconnect
    pub last_value: Option<Value>,
    /// True only after the session registered this definition with the
    /// engine in the current connection cycle
    pub registered: bool,
}

struct RegistryInner {
    // Keyed by lowercase name
    by_name: HashMap<String, RegistryEntry>,
    // request id -> lowercase name, the dispatcher's hot path
    by_request: HashMap<u32, String>,
    definitions: IdPool,
    requests: IdPool,
}

/// Name <-> id <-> value table with bounded id allocation
pub struct RequestRegistry {
    inner: Mutex<RegistryInner>,
}

impl RequestRegistry {
    /// Registry with the default pool capacities
    pub fn new() -> Self {
        Self::with_capacity(MAX_DEFINITIONS, MAX_REQUESTS)
    }

    /// Registry with explicit pool capacities (used by capacity tests)
    pub fn with_capacity(max_definitions: u32, max_requests: u32) -> Self {
        Self {
            inner: Mutex::new(RegistryInner {
                by_name: HashMap::new(),
                by_request: HashMap::new(),
                definitions: IdPool::new("definition", max_definitions),
                requests: IdPool::new("request", max_requests),
            }),
        }
    }

    fn key(name: &str) -> String {
        name.trim().to_lowercase()
    }

    /// Create an entry for a resolved descriptor, allocating the next
    /// definition/request id pair.
    ///
    /// Registering a name that already has a live entry is idempotent: the
    /// existing entry is returned and no ids are allocated. Exhaustion of
    /// either pool fails with [`Error::CapacityExceeded`] and allocates
    /// nothing.
    pub fn register(&self, descriptor: &VariableDescriptor) -> Result<RegistryEntry> {
        let key = Self::key(&descriptor.name);
        let mut inner = self.inner.lock();

        if let Some(existing) = inner.by_name.get(&key) {
            return Ok(existing.clone());
        }

        // Check both pools before touching either, so a half-allocated pair
        // can never leak.
        if inner.definitions.is_exhausted() {
            return Err(Error::CapacityExceeded {
                space: inner.definitions.space,
                capacity: inner.definitions.capacity,
            });
        }
        if inner.requests.is_exhausted() {
            return Err(Error::CapacityExceeded {
                space: inner.requests.space,
                capacity: inner.requests.capacity,
            });
        }

        let definition_id = inner.definitions.allocate()?;
        let request_id = inner.requests.allocate()?;

        let entry = RegistryEntry {
            name: descriptor.name.clone(),
            definition_id,
            request_id,
            wire_type: descriptor.wire_type,
            unit: descriptor.unit.clone(),
            last_value: None,
            registered: false,
        };

        inner.by_request.insert(request_id, key.clone());
        inner.by_name.insert(key, entry.clone());
        Ok(entry)
    }

    /// Entry for a name, if one is live
    pub fn lookup_by_name(&self, name: &str) -> Option<RegistryEntry> {
        self.inner.lock().by_name.get(&Self::key(name)).cloned()
    }

    /// Entry correlated to a request id. The dispatcher's hot path; O(1).
    pub fn lookup_by_request_id(&self, request_id: u32) -> Option<RegistryEntry> {
        let inner = self.inner.lock();
        let key = inner.by_request.get(&request_id)?;
        inner.by_name.get(key).cloned()
    }

    /// Snapshot of every live entry, ordered by request id.
    ///
    /// The ordering is deterministic so repeated iteration within one
    /// connection cycle sees the same sequence.
    pub fn all(&self) -> Vec<RegistryEntry> {
        let inner = self.inner.lock();
        let mut entries: Vec<RegistryEntry> = inner.by_name.values().cloned().collect();
        entries.sort_by_key(|e| e.request_id);
        entries
    }

    /// Number of live entries
    pub fn len(&self) -> usize {
        self.inner.lock().by_name.len()
    }

    /// Whether the registry has no entries
    pub fn is_empty(&self) -> bool {
        self.inner.lock().by_name.is_empty()
    }

    /// Flag an entry as registered with the engine for this connection cycle
    pub fn mark_registered(&self, name: &str) {
        if let Some(entry) = self.inner.lock().by_name.get_mut(&Self::key(name)) {
            entry.registered = true;
        }
    }

    /// Store a decoded value on the entry correlated to `request_id`.
    ///
    /// Returns the updated entry, or `None` when the id is stale (no live
    /// entry), in which case nothing is mutated.
    pub fn update_value(&self, request_id: u32, value: Value) -> Option<RegistryEntry> {
        let mut inner = self.inner.lock();
        let key = inner.by_request.get(&request_id)?.clone();
        let entry = inner.by_name.get_mut(&key)?;
        entry.last_value = Some(value);
        Some(entry.clone())
    }

    /// Drop every cached value. Invoked by the session on disconnect.
    pub fn clear_all_values(&self) {
        for entry in self.inner.lock().by_name.values_mut() {
            entry.last_value = None;
        }
    }

    /// Reset every `registered` flag. Definitions are session-scoped in the
    /// engine and do not survive a reconnect.
    pub fn set_all_unregistered(&self) {
        for entry in self.inner.lock().by_name.values_mut() {
            entry.registered = false;
        }
    }

    /// Destroy every entry. The only operation that removes entries;
    /// disconnect cycles preserve them. Ids already handed out are never
    /// reused: entries created afterwards continue the monotonic sequence.
    pub fn clear(&self) {
        let mut inner = self.inner.lock();
        inner.by_name.clear();
        inner.by_request.clear();
    }
}

impl Default for RequestRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn descriptor(name: &str) -> VariableDescriptor {
        VariableDescriptor {
            name: name.to_string(),
            unit: "feet".to_string(),
            wire_type: WireType::Float64,
        }
    }

    #[test]
    fn test_ids_are_strictly_increasing_and_unique() {
        let registry = RequestRegistry::new();
        let mut last: Option<(u32, u32)> = None;
        for i in 0..10 {
            let entry = registry.register(&descriptor(&format!("VAR {i}"))).unwrap();
            if let Some((def, req)) = last {
                assert!(entry.definition_id > def);
                assert!(entry.request_id > req);
            }
            last = Some((entry.definition_id, entry.request_id));
        }
        assert_eq!(registry.len(), 10);
    }

    #[test]
    fn test_register_same_name_is_idempotent() {
        let registry = RequestRegistry::new();
        let first = registry.register(&descriptor("PLANE ALTITUDE")).unwrap();
        let second = registry.register(&descriptor("Plane Altitude")).unwrap();
        assert_eq!(first.definition_id, second.definition_id);
        assert_eq!(first.request_id, second.request_id);
        assert_eq!(registry.len(), 1);

        // No ids were consumed by the duplicate
        let third = registry.register(&descriptor("OTHER")).unwrap();
        assert_eq!(third.request_id, first.request_id + 1);
    }

    #[test]
    fn test_capacity_exceeded_allocates_nothing() {
        let registry = RequestRegistry::with_capacity(2, 2);
        registry.register(&descriptor("A")).unwrap();
        registry.register(&descriptor("B")).unwrap();

        let err = registry.register(&descriptor("C")).unwrap_err();
        assert!(matches!(err, Error::CapacityExceeded { .. }));
        assert_eq!(registry.len(), 2);

        // Still exceeded on retry, still exactly 2 entries
        assert!(registry.register(&descriptor("D")).is_err());
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn test_lookup_by_request_id() {
        let registry = RequestRegistry::new();
        let entry = registry.register(&descriptor("AIRSPEED TRUE")).unwrap();
        let found = registry.lookup_by_request_id(entry.request_id).unwrap();
        assert_eq!(found.name, "AIRSPEED TRUE");
        assert!(registry.lookup_by_request_id(9999).is_none());
    }

    #[test]
    fn test_update_value_and_stale_id() {
        let registry = RequestRegistry::new();
        let entry = registry.register(&descriptor("PLANE ALTITUDE")).unwrap();

        let updated = registry.update_value(entry.request_id, Value::Float(1234.5)).unwrap();
        assert_eq!(updated.last_value, Some(Value::Float(1234.5)));

        // Stale id mutates nothing
        assert!(registry.update_value(entry.request_id + 1, Value::Float(0.0)).is_none());
        let current = registry.lookup_by_name("PLANE ALTITUDE").unwrap();
        assert_eq!(current.last_value, Some(Value::Float(1234.5)));
    }

    #[test]
    fn test_clear_values_and_unregister() {
        let registry = RequestRegistry::new();
        let entry = registry.register(&descriptor("PLANE ALTITUDE")).unwrap();
        registry.mark_registered("PLANE ALTITUDE");
        registry.update_value(entry.request_id, Value::Float(100.0));

        registry.clear_all_values();
        registry.set_all_unregistered();

        let current = registry.lookup_by_name("plane altitude").unwrap();
        assert_eq!(current.last_value, None);
        assert!(!current.registered);
    }

    #[test]
    fn test_clear_destroys_entries_without_reusing_ids() {
        let registry = RequestRegistry::new();
        let first = registry.register(&descriptor("A")).unwrap();
        registry.clear();

        assert!(registry.is_empty());
        assert!(registry.lookup_by_request_id(first.request_id).is_none());

        let next = registry.register(&descriptor("B")).unwrap();
        assert!(next.request_id > first.request_id);
        assert!(next.definition_id > first.definition_id);
    }

    #[test]
    fn test_all_is_deterministic_and_ordered() {
        let registry = RequestRegistry::new();
        for name in ["C", "A", "B"] {
            registry.register(&descriptor(name)).unwrap();
        }
        let first: Vec<u32> = registry.all().iter().map(|e| e.request_id).collect();
        let second: Vec<u32> = registry.all().iter().map(|e| e.request_id).collect();
        assert_eq!(first, second);
        assert_eq!(first, vec![0, 1, 2]);
    }
}
