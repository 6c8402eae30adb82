//! Lookup tables that map plant and inverter selections to the integer codes
//! the regressor was trained on.
//!
//! The tables are written into the model artifact at training time, and the
//! artifact's codes are the only ones ever fed to a regressor. The built-in
//! tables list the two plants and 44 inverters of the published dataset. They
//! are consulted only when no artifact loads, to validate and list selections
//! before the request fails with `ModelNotLoaded`, so their codes are
//! informational and never reach a model.

use std::collections::HashSet;
use std::fmt;
use std::sync::LazyLock;

use serde::{Deserialize, Serialize};

/// Which categorical input a table encodes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CategoryKind {
    Plant,
    Inverter,
}

impl fmt::Display for CategoryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CategoryKind::Plant => write!(f, "plant"),
            CategoryKind::Inverter => write!(f, "inverter"),
        }
    }
}

/// One selectable value and its trained code.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryEntry {
    /// Integer code used as the feature value.
    pub code: u32,
    /// Identifier as it appears in the datasets (plant ID, inverter source key).
    pub key: String,
    /// Human-readable label offered to users.
    pub label: String,
}

/// Immutable ordered table for one category kind.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryTable {
    kind: CategoryKind,
    entries: Vec<CategoryEntry>,
}

impl CategoryTable {
    /// Builds a table from explicit entries.
    pub fn new(kind: CategoryKind, entries: Vec<CategoryEntry>) -> Self {
        Self { kind, entries }
    }

    /// Builds a table from keys that are already in code order.
    ///
    /// The entry at position `i` gets code `i`; `label` receives the position
    /// and the key.
    pub fn from_ordered_keys<I, F>(kind: CategoryKind, keys: I, label: F) -> Self
    where
        I: IntoIterator<Item = String>,
        F: Fn(usize, &str) -> String,
    {
        let entries = keys
            .into_iter()
            .enumerate()
            .map(|(i, key)| CategoryEntry {
                code: i as u32,
                label: label(i, &key),
                key,
            })
            .collect();
        Self { kind, entries }
    }

    pub fn kind(&self) -> CategoryKind {
        self.kind
    }

    pub fn entries(&self) -> &[CategoryEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Resolves a user selection against keys first, then labels.
    ///
    /// Surrounding whitespace is ignored; matching is otherwise exact since
    /// inverter keys are case-sensitive.
    pub fn resolve(&self, selection: &str) -> Option<&CategoryEntry> {
        let selection = selection.trim();
        self.entries
            .iter()
            .find(|e| e.key == selection)
            .or_else(|| self.entries.iter().find(|e| e.label == selection))
    }

    /// Looks up the entry that carries `key` exactly.
    pub fn by_key(&self, key: &str) -> Option<&CategoryEntry> {
        self.entries.iter().find(|e| e.key == key)
    }

    /// Checks that the table is non-empty and that keys and codes are unique.
    pub fn check(&self) -> Result<(), String> {
        if self.entries.is_empty() {
            return Err("table is empty".to_string());
        }
        let mut keys = HashSet::new();
        let mut codes = HashSet::new();
        for entry in &self.entries {
            if !keys.insert(entry.key.as_str()) {
                return Err(format!("duplicate key \"{}\"", entry.key));
            }
            if !codes.insert(entry.code) {
                return Err(format!("duplicate code {}", entry.code));
            }
        }
        Ok(())
    }
}

/// The plant and inverter tables used together by the validator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryTables {
    pub plants: CategoryTable,
    pub inverters: CategoryTable,
}

impl CategoryTables {
    /// Tables for the published dataset, used for validation when no
    /// artifact is loaded. Their codes never reach a model.
    pub fn builtin() -> &'static CategoryTables {
        &BUILTIN
    }

    /// Returns the table for `kind`.
    pub fn table(&self, kind: CategoryKind) -> &CategoryTable {
        match kind {
            CategoryKind::Plant => &self.plants,
            CategoryKind::Inverter => &self.inverters,
        }
    }

    /// Formats a plant ID the way plant labels are shown to users.
    pub fn plant_label(position: usize, plant_id: &str) -> String {
        format!("Plant {} (ID: {plant_id})", position + 1)
    }
}

const BUILTIN_PLANTS: [&str; 2] = ["4135001", "4136001"];

// Codes follow the published mapping for reference only; a loaded artifact
// supplies its own.
const BUILTIN_INVERTERS: [(&str, u32); 44] = [
    ("1BY6WEcLGh8j5v7", 0),
    ("1IF53ai7Xc0U56Y", 1),
    ("3PZuoBAID5Wc2HD", 2),
    ("7JYdWkrLSPkdwr4", 3),
    ("McdE0feGgRqW7Ca", 4),
    ("VHMLBKoKgIrUVDU", 5),
    ("WRmjgnKYAwPKWDb", 6),
    ("WZaEZ7ZgXuqsy4W", 7),
    ("ZPfzyrzsUq1vF8S", 8),
    ("YxYShMdWyrA7czw", 9),
    ("dDQRgiyyACCcBDH", 10),
    ("iCRJl6heRkivqQc", 11),
    ("ih0MWyTcMoPkXeN", 12),
    ("mxJmm7HC2YPijMd", 13),
    ("oZZRqmMfGdntoCq", 14),
    ("q49JqTeGQLHzLyk", 15),
    ("rrqTqKZQfGF4PVE", 16),
    ("uHbhkAHOPCPlxGn", 17),
    ("wCzmfRPeisgLqPV", 18),
    ("z9Y9gH1T5YWrNuG", 19),
    ("zBIq5rxdHJRwDNY", 20),
    ("zVJPv84UY57bAof", 21),
    ("4UPUqMRk7TRMgml", 22),
    ("81aHJ1q11NBPMrL", 23),
    ("9kRcWv60rDACzjR", 24),
    ("Et9kgGMDl729KT4", 25),
    ("IQ2d7wF4YD8zU1Q", 26),
    ("LYwnQax7tno7AMq", 27),
    ("NX4BCAknbGZzAbt", 28),
    ("Qf4h9SfABzKipbr", 29),
    ("QutzIDWKPEPLqvN", 30),
    ("R9DqYjSHD05jZBK", 31),
    ("SMZaZ6WQDfckz4P", 32),
    ("TRqACzmdXgCzEji", 33),
    ("V94E5fvQR0Xg2Gf", 34),
    ("WchCZF8zXeZJrzc", 35),
    ("adHrOEFoJhjV6oz", 36),
    ("dshEAWzCgTdehzi", 37),
    ("jgaGg8JWf7h0IBz", 38),
    ("jyJH8pHBYCpMWuJ", 39),
    ("qfaP9BGznU8S4nY", 40),
    ("rGaZhrFxWfASzB7", 41),
    ("xMbIugepa2P7lBB", 42),
    ("xoJJ8DcxJEcupym", 43),
];

static BUILTIN: LazyLock<CategoryTables> = LazyLock::new(|| CategoryTables {
    plants: CategoryTable::from_ordered_keys(
        CategoryKind::Plant,
        BUILTIN_PLANTS.iter().map(|id| id.to_string()),
        CategoryTables::plant_label,
    ),
    inverters: CategoryTable::new(
        CategoryKind::Inverter,
        BUILTIN_INVERTERS
            .iter()
            .map(|(key, code)| CategoryEntry {
                code: *code,
                key: key.to_string(),
                label: key.to_string(),
            })
            .collect(),
    ),
});
