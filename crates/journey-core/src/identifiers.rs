//! Client identifier resolution and the fixed client roster.
//!
//! The visit export identifies clients by an opaque numeric id; every other
//! source uses display names. [`ClientDirectory`] bridges the two and never
//! invents a name for an id it does not know.

use std::collections::HashMap;

use tracing::debug;

/// Known numeric ids and their display names.
pub const KNOWN_CLIENT_IDS: &[(u64, &str)] = &[
    (8858, "Nathan Lunn (Adrian)"),
    (16555, "Kelly Baswick"),
    (52896, "Less Four Horns"),
    (66275, "Darlene Auger"),
    (72287, "Dawson Jarvis"),
    (73033, "Patricia Chapman (Dawn)"),
    (74545, "David Thok (Kuany)"),
    (75724, "Erin Burris (Isabelle)"),
    (76579, "Michael Goodfeather (Roy)"),
    (77463, "Graham Miles (Douglas)"),
    (84999, "Courtney Bird"),
    (85880, "Carrie Saikkonen (Lynn)"),
];

/// Every client offered by the journey view, in selector order.
pub const CLIENT_ROSTER: &[&str] = &[
    "Carrie Saikkonen (Lynn)",
    "Colin Anderson (D)",
    "Courtney Bird",
    "Darlene Auger",
    "David Thok (Kuany)",
    "Dawson Jarvis",
    "Erin Burris (Isabelle)",
    "Graham Miles (Douglas)",
    "Kelly Baswick",
    "Kual Kual (Kual)",
    "Lambert MedicineTraveller",
    "Less Four Horns",
    "Michael Goodfeather (Roy)",
    "Nathan Lunn (Adrian)",
    "Patricia Chapman (Dawn)",
];

/// File stem of a client's check-in export: the first word of the display
/// name, lower-cased (`"Kual Kual (Kual)"` → `"kual"`).
pub fn data_file_stem(display_name: &str) -> String {
    display_name
        .split_whitespace()
        .next()
        .unwrap_or_default()
        .to_lowercase()
}

// ── ClientDirectory ───────────────────────────────────────────────────────────

/// Immutable id → display-name lookup.
#[derive(Debug, Clone)]
pub struct ClientDirectory {
    names: HashMap<u64, String>,
}

impl Default for ClientDirectory {
    fn default() -> Self {
        Self::from_pairs(KNOWN_CLIENT_IDS.iter().map(|(id, name)| (*id, *name)))
    }
}

impl ClientDirectory {
    /// Build a directory from explicit `(id, name)` pairs.
    pub fn from_pairs<S: Into<String>>(pairs: impl IntoIterator<Item = (u64, S)>) -> Self {
        Self {
            names: pairs
                .into_iter()
                .map(|(id, name)| (id, name.into()))
                .collect(),
        }
    }

    /// Display name for `id`, or `None` when the id is not mapped.
    pub fn resolve(&self, id: u64) -> Option<&str> {
        self.names.get(&id).map(String::as_str)
    }

    /// Resolve a raw table cell.
    ///
    /// Accepts integer text and integral float text (`"8858"`, `"8858.0"`),
    /// since exports with gaps in the id column store ids as floats. Anything
    /// else resolves to `None`.
    pub fn resolve_cell(&self, raw: &str) -> Option<&str> {
        let id = parse_client_id(raw)?;
        let name = self.resolve(id);
        if name.is_none() {
            debug!("no display name for client id {}", id);
        }
        name
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

fn parse_client_id(raw: &str) -> Option<u64> {
    let trimmed = raw.trim();
    if let Ok(id) = trimmed.parse::<u64>() {
        return Some(id);
    }
    let f = trimmed.parse::<f64>().ok()?;
    if f.is_finite() && f >= 0.0 && f.fract() == 0.0 {
        Some(f as u64)
    } else {
        None
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
