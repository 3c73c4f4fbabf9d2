//! Variable catalog
//!
//! Static lookup from human-readable variable name to its wire unit/type
//! metadata. The catalog is immutable once built and therefore thread-safe;
//! lookup normalizes case, so `"plane altitude"` and `"PLANE ALTITUDE"`
//! resolve to the same descriptor. A miss is a defined result (`None`), not
//! an error.
//!
//! Indexed variables (`"GENERAL ENG RPM:1"`) resolve through their base name
//! with the index validated to 1..=10, matching the simulator's per-engine /
//! per-tank addressing.

use crate::types::WireType;
use std::collections::HashMap;

/// Valid range for the `:index` suffix of indexed variables
const INDEX_RANGE: std::ops::RangeInclusive<u32> = 1..=10;

/// Immutable metadata for one named variable
#[derive(Debug, Clone, PartialEq)]
pub struct VariableDescriptor {
    /// Canonical variable name (uppercase, including any `:index` suffix)
    pub name: String,
    /// Engine unit string ("feet", "knots", ...); empty for strings
    pub unit: String,
    /// Typed wire slot the engine delivers this variable in
    pub wire_type: WireType,
}

/// Builtin variables known to the simulator engine.
///
/// A subset of the simulator's variable dictionary covering the telemetry
/// the host commonly requests. Config-supplied descriptors extend this at
/// construction.
const BUILTIN_VARS: &[(&str, &str, WireType)] = &[
    ("TITLE", "", WireType::String256),
    ("CATEGORY", "", WireType::String256),
    ("ATC ID", "", WireType::String64),
    ("ATC AIRLINE", "", WireType::String64),
    ("ATC FLIGHT NUMBER", "", WireType::String8),
    ("PLANE ALTITUDE", "feet", WireType::Float64),
    ("PLANE ALT ABOVE GROUND", "feet", WireType::Float64),
    ("INDICATED ALTITUDE", "feet", WireType::Float64),
    ("PLANE LATITUDE", "degrees", WireType::Float64),
    ("PLANE LONGITUDE", "degrees", WireType::Float64),
    ("PLANE HEADING DEGREES TRUE", "degrees", WireType::Float64),
    ("PLANE HEADING DEGREES MAGNETIC", "degrees", WireType::Float64),
    ("PLANE PITCH DEGREES", "degrees", WireType::Float64),
    ("PLANE BANK DEGREES", "degrees", WireType::Float64),
    ("AIRSPEED INDICATED", "knots", WireType::Float64),
    ("AIRSPEED TRUE", "knots", WireType::Float64),
    ("VERTICAL SPEED", "feet per minute", WireType::Float64),
    ("GROUND VELOCITY", "knots", WireType::Float64),
    ("GENERAL ENG RPM", "rpm", WireType::Float64),
    ("GENERAL ENG THROTTLE LEVER POSITION", "percent", WireType::Float64),
    ("FUEL TOTAL QUANTITY", "gallons", WireType::Float64),
    ("FLAPS HANDLE INDEX", "number", WireType::Int32),
    ("GEAR HANDLE POSITION", "bool", WireType::Int32),
    ("SIM ON GROUND", "bool", WireType::Int32),
    ("AUTOPILOT MASTER", "bool", WireType::Int32),
    ("AMBIENT TEMPERATURE", "celsius", WireType::Float64),
    ("AMBIENT WIND VELOCITY", "knots", WireType::Float64),
    ("KOHLSMAN SETTING HG", "inHg", WireType::Float64),
];

/// Read-only variable name -> descriptor lookup
#[derive(Debug, Clone)]
pub struct VariableCatalog {
    // Keyed by lowercase base name (no :index suffix)
    entries: HashMap<String, VariableDescriptor>,
}

impl VariableCatalog {
    /// Catalog containing only the builtin variable table
    pub fn builtin() -> Self {
        let mut entries = HashMap::with_capacity(BUILTIN_VARS.len());
        for &(name, unit, wire_type) in BUILTIN_VARS {
            entries.insert(
                name.to_lowercase(),
                VariableDescriptor {
                    name: name.to_string(),
                    unit: unit.to_string(),
                    wire_type,
                },
            );
        }
        Self { entries }
    }

    /// Empty catalog, for hosts that supply their own descriptors
    pub fn empty() -> Self {
        Self { entries: HashMap::new() }
    }

    /// Extend the catalog with additional descriptors.
    ///
    /// A descriptor with the same name as a builtin replaces it. Consumes and
    /// returns `self` so construction stays a single expression; the catalog
    /// is immutable afterwards.
    pub fn with<I>(mut self, descriptors: I) -> Self
    where
        I: IntoIterator<Item = VariableDescriptor>,
    {
        for mut descriptor in descriptors {
            descriptor.name = descriptor.name.trim().to_uppercase();
            self.entries.insert(descriptor.name.to_lowercase(), descriptor);
        }
        self
    }

    /// Look up a variable by name.
    ///
    /// Pure and read-only. Returns the descriptor carrying the canonical
    /// (uppercase) form of the requested name, with any `:index` suffix
    /// preserved. `None` means the name is not in the catalog or carries an
    /// out-of-range index.
    pub fn resolve(&self, name: &str) -> Option<VariableDescriptor> {
        let trimmed = name.trim();
        if trimmed.is_empty() {
            return None;
        }

        let (base, index) = match trimmed.split_once(':') {
            Some((base, index)) => (base.trim(), Some(index.trim())),
            None => (trimmed, None),
        };

        if let Some(index) = index {
            let parsed: u32 = index.parse().ok()?;
            if !INDEX_RANGE.contains(&parsed) {
                return None;
            }
        }

        let descriptor = self.entries.get(&base.to_lowercase())?;
        Some(VariableDescriptor {
            name: trimmed.to_uppercase(),
            unit: descriptor.unit.clone(),
            wire_type: descriptor.wire_type,
        })
    }

    /// Number of distinct base names in the catalog
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the catalog has no entries
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_builtin() {
        let catalog = VariableCatalog::builtin();
        let descriptor = catalog.resolve("PLANE ALTITUDE").unwrap();
        assert_eq!(descriptor.name, "PLANE ALTITUDE");
        assert_eq!(descriptor.unit, "feet");
        assert_eq!(descriptor.wire_type, WireType::Float64);
    }

    #[test]
    fn test_resolve_is_case_insensitive() {
        let catalog = VariableCatalog::builtin();
        let descriptor = catalog.resolve("plane altitude").unwrap();
        assert_eq!(descriptor.name, "PLANE ALTITUDE");
    }

    #[test]
    fn test_resolve_miss_is_none() {
        let catalog = VariableCatalog::builtin();
        assert!(catalog.resolve("NO SUCH VARIABLE").is_none());
        assert!(catalog.resolve("").is_none());
    }

    #[test]
    fn test_resolve_indexed_variable() {
        let catalog = VariableCatalog::builtin();
        let descriptor = catalog.resolve("general eng rpm:1").unwrap();
        assert_eq!(descriptor.name, "GENERAL ENG RPM:1");
        assert_eq!(descriptor.unit, "rpm");
    }

    #[test]
    fn test_resolve_rejects_bad_index() {
        let catalog = VariableCatalog::builtin();
        assert!(catalog.resolve("GENERAL ENG RPM:0").is_none());
        assert!(catalog.resolve("GENERAL ENG RPM:11").is_none());
        assert!(catalog.resolve("GENERAL ENG RPM:x").is_none());
    }

    #[test]
    fn test_with_extends_and_overrides() {
        let catalog = VariableCatalog::builtin().with([
            VariableDescriptor {
                name: "custom gauge".to_string(),
                unit: "psi".to_string(),
                wire_type: WireType::Float64,
            },
            VariableDescriptor {
                name: "TITLE".to_string(),
                unit: "".to_string(),
                wire_type: WireType::String64,
            },
        ]);

        let custom = catalog.resolve("CUSTOM GAUGE").unwrap();
        assert_eq!(custom.name, "CUSTOM GAUGE");
        assert_eq!(custom.unit, "psi");

        // Override replaced the builtin wire type
        assert_eq!(catalog.resolve("TITLE").unwrap().wire_type, WireType::String64);
    }
}
