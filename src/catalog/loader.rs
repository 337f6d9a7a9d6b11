//! NDJSON catalog loading.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};

use log::{debug, info, warn};

use super::filter::ModFilter;
use super::modifier::Modifier;
use crate::error::{Result, RollError};

/// Filtered working catalog, in source order.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    source: Option<PathBuf>,
    filter: ModFilter,
    modifiers: Vec<Modifier>,
}

impl Catalog {
    /// Build a catalog directly from modifiers (no backing file).
    pub fn from_modifiers(modifiers: Vec<Modifier>) -> Self {
        Self {
            source: None,
            filter: ModFilter::accept_all(),
            modifiers,
        }
    }

    /// Load the catalog at `path`, keeping records accepted by `filter`.
    ///
    /// A missing or unreadable file yields an empty catalog and a warning.
    pub fn load(path: impl AsRef<Path>, filter: &ModFilter) -> Self {
        let path = path.as_ref();
        let modifiers = match read_records(path, filter) {
            Ok(modifiers) => {
                info!("Loaded {} modifiers from {}", modifiers.len(), path.display());
                modifiers
            }
            Err(e) => {
                warn!("Catalog unavailable at {}: {}", path.display(), e);
                Vec::new()
            }
        };

        Self {
            source: Some(path.to_path_buf()),
            filter: filter.clone(),
            modifiers,
        }
    }

    /// Re-read the backing file with the same filter.
    pub fn reload(&mut self) {
        if let Some(path) = self.source.clone() {
            *self = Self::load(&path, &self.filter);
        }
    }

    pub fn source(&self) -> Option<&Path> {
        self.source.as_deref()
    }

    pub fn len(&self) -> usize {
        self.modifiers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.modifiers.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Modifier> {
        self.modifiers.get(index)
    }

    /// Find a modifier by exact `ref`.
    pub fn find_by_ref(&self, reference: &str) -> Option<(usize, &Modifier)> {
        self.modifiers
            .iter()
            .enumerate()
            .find(|(_, m)| m.reference == reference)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Modifier> {
        self.modifiers.iter()
    }

    /// Case-insensitive search over description and ref, returning catalog indices.
    pub fn search(&self, query: &str) -> Vec<(usize, &Modifier)> {
        let needle = query.trim().to_lowercase();
        self.modifiers
            .iter()
            .enumerate()
            .filter(|(_, m)| {
                needle.is_empty()
                    || m.description().to_lowercase().contains(&needle)
                    || m.reference.to_lowercase().contains(&needle)
            })
            .collect()
    }
}

fn read_records(path: &Path, filter: &ModFilter) -> Result<Vec<Modifier>> {
    if !path.exists() {
        return Err(RollError::Catalog(format!("{} does not exist", path.display())));
    }

    let reader = BufReader::new(File::open(path)?);
    let mut modifiers = Vec::new();
    for (number, bytes) in reader.split(b'\n').enumerate() {
        let line = match String::from_utf8(bytes?) {
            Ok(line) => line,
            Err(e) => {
                debug!("Skipping malformed catalog line {}: {}", number + 1, e);
                continue;
            }
        };
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        match serde_json::from_str::<Modifier>(line) {
            Ok(modifier) if filter.accepts(&modifier) => modifiers.push(modifier),
            Ok(_) => {}
            Err(e) => debug!("Skipping malformed catalog line {}: {}", number + 1, e),
        }
    }
    Ok(modifiers)
}
