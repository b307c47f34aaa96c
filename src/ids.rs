use std::borrow::Borrow;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

/// Global counter for auto-incrementing instance IDs (starts at 1, 0 is reserved).
static INSTANCE_ID_COUNTER: AtomicU64 = AtomicU64::new(1);

/// Stable identifier for a symbol definition.
///
/// All rule-level matching (removal, counting, bond activation) goes through
/// this key. Display names are a presentation concern and never participate
/// in matching, so rules stay correct under localization.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serialization", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serialization", serde(transparent))]
pub struct SymbolKey(String);

impl SymbolKey {
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SymbolKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for SymbolKey {
    fn from(key: &str) -> Self {
        Self::new(key)
    }
}

impl Borrow<str> for SymbolKey {
    fn borrow(&self) -> &str {
        &self.0
    }
}

/// Unique symbol-instance identifier, monotonically increasing and never
/// reused. Multiple identical symbols may coexist in the pool; this is what
/// makes them independently removable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct InstanceId(pub u64);

impl InstanceId {
    /// Allocate a fresh instance ID from the global counter.
    pub fn new() -> Self {
        Self(INSTANCE_ID_COUNTER.fetch_add(1, Ordering::SeqCst))
    }

    /// Create an instance ID from a specific value (for when you need explicit control).
    pub fn from_raw(id: u64) -> Self {
        Self(id)
    }
}

impl Default for InstanceId {
    fn default() -> Self {
        Self::new()
    }
}

/// Bond definition identifier, references static bond data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serialization", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serialization", serde(transparent))]
pub struct BondId(pub u32);
