//! # Subdocument Identifiers
//!
//! A subdocument id names one configuration fragment on a device. The set
//! of ids a device may request is held in a [`SubdocRegistry`], which maps
//! each id to a bit position. The registry is built once at startup from
//! the built-in table plus any ids supplied by configuration, then shared
//! read-only.
//!
//! `root` is a sentinel: it heads every group request but is never stored
//! as a subdocument and never appears in the registry.

use std::collections::HashMap;
use std::fmt;


/// The sentinel id that must head every group request.
pub const ROOT: &str = "root";

/// Built-in subdocument ids and their bit positions.
const BUILTIN_SUBDOCS: &[(&str, u32)] = &[
    ("portforwarding", 1),
    ("lan", 2),
    ("wan", 3),
    ("macbinding", 4),
    ("hotspot", 5),
    ("bridge", 6),
    ("privatessid", 7),
    ("homessid", 8),
    ("radio", 9),
    ("moca", 10),
    ("xdns", 11),
    ("advsecurity", 12),
    ("mesh", 13),
    ("aker", 14),
    ("telemetry", 15),
    ("trafficreport", 16),
    ("interfacereport", 17),
    ("statusreport", 18),
    ("radioreport", 19),
    ("telcovoip", 20),
    ("wanmanager", 21),
    ("voiceservice", 22),
    ("wanfailover", 23),
    ("cellularconfig", 24),
    ("gwfailover", 25),
    ("gwrestore", 26),
    ("prioritizedmacs", 27),
    ("lldqoscontrol", 28),
    ("connectedbuilding", 29),
    ("xmspeedboost", 30),
    ("defaultrfc", 31),
    ("defaulttelemetry", 32),
    ("defaultdcm", 33),
    ("clienttosteeringprofile", 34),
    ("meshsteeringprofiles", 35),
    ("wifimotionsettings", 36),
];

/// Identifier of a subdocument within a device.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubdocId(String);

impl SubdocId {
    /// Wrap an id without checking it against a registry.
    ///
    /// Use [`SubdocRegistry::resolve`] for untrusted input.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// The `root` sentinel.
    pub fn root() -> Self {
        Self(ROOT.to_string())
    }

    /// Returns `true` for the `root` sentinel.
    pub fn is_root(&self) -> bool {
        self.0 == ROOT
    }

    /// Borrow the id.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SubdocId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// The set of valid subdocument ids, each mapped to a bit position.
#[derive(Debug, Clone)]
pub struct SubdocRegistry {
    bits: HashMap<String, u32>,
}

impl SubdocRegistry {
    /// An empty registry. Mostly useful in tests.
    pub fn empty() -> Self {
        Self {
            bits: HashMap::new(),
        }
    }

    /// The built-in id table.
    pub fn builtin() -> Self {
        Self {
            bits: BUILTIN_SUBDOCS
                .iter()
                .map(|(id, bit)| (id.to_string(), *bit))
                .collect(),
        }
    }

    /// Add ids, assigning each new one the next free bit position.
    ///
    /// Ids already present keep their position; blanks and `root` are
    /// ignored.
    pub fn with_extra_ids<I, S>(mut self, ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        for id in ids {
            let id = id.as_ref().trim();
            if id.is_empty() || id == ROOT || self.bits.contains_key(id) {
                continue;
            }
            let next = self.bits.values().copied().max().unwrap_or(0) + 1;
            self.bits.insert(id.to_string(), next);
        }
        self
    }

    /// Returns `true` when `id` is a registered subdocument.
    pub fn contains(&self, id: &str) -> bool {
        self.bits.contains_key(id)
    }

    /// Bit position assigned to `id`.
    pub fn bit_index(&self, id: &str) -> Option<u32> {
        self.bits.get(id).copied()
    }

    /// Look up an untrusted id, returning the typed id when registered.
    pub fn resolve(&self, id: &str) -> Option<SubdocId> {
        self.contains(id).then(|| SubdocId::new(id))
    }

    /// Number of registered ids.
    pub fn len(&self) -> usize {
        self.bits.len()
    }

    /// Returns `true` when no id is registered.
    pub fn is_empty(&self) -> bool {
        self.bits.is_empty()
    }
}

impl Default for SubdocRegistry {
    fn default() -> Self {
        Self::builtin()
    }
}
