//! Label Map - class index <-> class name

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use serde::Deserialize;

use crate::logic::error::{AttackError, AttackResult};

/// On-disk label formats: `["tench", "goldfish", ...]` or `{"0": "tench", ...}`
#[derive(Deserialize)]
#[serde(untagged)]
enum LabelFile {
    List(Vec<String>),
    Map(HashMap<String, String>),
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct LabelMap {
    names: Vec<String>,
    index: HashMap<String, usize>,
}

impl LabelMap {
    /// Build from names in index order. A repeated name maps to its last index;
    /// label files go through `from_json_slice`, which rejects repeats.
    pub fn new(names: Vec<String>) -> Self {
        let index = names
            .iter()
            .enumerate()
            .map(|(i, name)| (name.clone(), i))
            .collect();
        Self { names, index }
    }

    pub fn from_file(path: &Path) -> AttackResult<Self> {
        let data = fs::read(path)?;
        let map = Self::from_json_slice(&data)?;
        log::info!("Loaded {} labels from {}", map.len(), path.display());
        Ok(map)
    }

    pub fn from_json_slice(data: &[u8]) -> AttackResult<Self> {
        let names = match serde_json::from_slice::<LabelFile>(data)? {
            LabelFile::List(names) => names,
            LabelFile::Map(entries) => {
                let mut indexed = entries
                    .into_iter()
                    .map(|(k, v)| {
                        k.trim()
                            .parse::<usize>()
                            .map(|i| (i, v))
                            .map_err(|_| AttackError::InvalidArgument(format!("label key `{}` is not an index", k)))
                    })
                    .collect::<AttackResult<Vec<_>>>()?;
                indexed.sort_by_key(|(i, _)| *i);

                for (expected, (i, _)) in indexed.iter().enumerate() {
                    if *i != expected {
                        return Err(AttackError::InvalidArgument(format!(
                            "label indices must be contiguous from 0, missing {}",
                            expected
                        )));
                    }
                }

                indexed.into_iter().map(|(_, v)| v).collect()
            }
        };

        let map = Self::new(names);
        if map.index.len() != map.names.len() {
            let dup = map
                .names
                .iter()
                .enumerate()
                .find(|(i, name)| map.index.get(*name) != Some(i))
                .map(|(_, name)| name.clone())
                .unwrap_or_default();
            return Err(AttackError::InvalidArgument(format!("duplicate label `{}`", dup)));
        }
        Ok(map)
    }

    /// index -> name
    pub fn name(&self, idx: usize) -> Option<&str> {
        self.names.get(idx).map(String::as_str)
    }

    /// name -> index
    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.index.get(name).copied()
    }

    pub fn require_name(&self, idx: usize) -> AttackResult<&str> {
        self.name(idx)
            .ok_or_else(|| AttackError::UnknownLabel(format!("index {}", idx)))
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}
