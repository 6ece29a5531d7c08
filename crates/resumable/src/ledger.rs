//! Durable record of completed stages, partitioned by deployment target
//!
//! The ledger is a single JSON document:
//!
//! ```json
//! {
//!     "site": {
//!         "update_system": true,
//!         "install_apt_packages": true
//!     }
//! }
//! ```
//!
//! It is loaded fully at startup and rewritten in full after every stage
//! completion. Keys this crate does not understand are kept as-is, so a
//! hand-edited file survives a load/record/persist cycle.
//!
//! Concurrent writers are not coordinated. Running two processes against
//! the same root at once is unsupported.

use crate::error::{Error, Result};
use serde::Serialize;
use serde_json::ser::PrettyFormatter;
use serde_json::{Map, Value};
use std::fs;
use std::path::{Path, PathBuf};

/// Directory (under the deployment root) holding the ledger and other artifacts
pub const ARTIFACTS_DIR: &str = ".deployment_artifacts";

/// Ledger file name inside [`ARTIFACTS_DIR`]
pub const LEDGER_FILE: &str = "stage.json";

/// In-memory copy of the ledger document plus the file it was loaded from
#[derive(Debug, Clone)]
pub struct Ledger {
    path: PathBuf,
    document: Map<String, Value>,
}

impl Ledger {
    /// Artifacts directory for a deployment root
    pub fn artifacts_dir(root: &Path) -> PathBuf {
        root.join(ARTIFACTS_DIR)
    }

    /// Ledger file path for a deployment root
    pub fn path_for(root: &Path) -> PathBuf {
        Self::artifacts_dir(root).join(LEDGER_FILE)
    }

    /// Load the ledger for `root`, creating and persisting an empty one if needed
    pub fn load(root: &Path) -> Result<Self> {
        Self::open(Self::path_for(root))
    }

    /// Load the ledger stored at an explicit file path
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();

        if let Some(dir) = path.parent() {
            fs::create_dir_all(dir).map_err(|source| Error::LedgerIo {
                path: dir.to_path_buf(),
                source,
            })?;
        }

        if !path.exists() {
            log::debug!("Ledger does not exist, creating {}", path.display());
            let ledger = Self {
                path,
                document: Map::new(),
            };
            ledger.persist()?;
            return Ok(ledger);
        }

        let content = fs::read_to_string(&path).map_err(|source| Error::LedgerIo {
            path: path.clone(),
            source,
        })?;

        // A zero-length file is what an interrupted first write leaves behind
        if content.trim().is_empty() {
            return Ok(Self {
                path,
                document: Map::new(),
            });
        }

        let document = match serde_json::from_str::<Value>(&content) {
            Ok(Value::Object(map)) => map,
            Ok(other) => {
                return Err(Error::MalformedLedger {
                    path,
                    reason: format!("expected a JSON object, found {}", json_kind(&other)),
                });
            }
            Err(e) => {
                return Err(Error::MalformedLedger {
                    path,
                    reason: e.to_string(),
                });
            }
        };

        log::debug!("Loaded ledger from {}", path.display());
        Ok(Self { path, document })
    }

    /// File backing this ledger
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// The raw document, including any keys this crate does not interpret
    pub fn document(&self) -> &Map<String, Value> {
        &self.document
    }

    /// Whether `stage` has been recorded complete for `target`
    ///
    /// An absent target, an absent stage, or a value other than `true`
    /// all read as not complete.
    pub fn is_complete(&self, target: &str, stage: &str) -> bool {
        self.document
            .get(target)
            .and_then(Value::as_object)
            .and_then(|record| record.get(stage))
            .and_then(Value::as_bool)
            .unwrap_or(false)
    }

    /// Record `stage` complete for `target` and rewrite the whole document
    ///
    /// Callers must only do this after the stage body returned successfully.
    pub fn mark_complete(&mut self, target: &str, stage: &str) -> Result<()> {
        match self
            .document
            .entry(target.to_string())
            .or_insert_with(|| Value::Object(Map::new()))
        {
            Value::Object(record) => {
                record.insert(stage.to_string(), Value::Bool(true));
            }
            other => {
                return Err(Error::MalformedLedger {
                    path: self.path.clone(),
                    reason: format!(
                        "record for '{target}' is {}, expected an object",
                        json_kind(other)
                    ),
                });
            }
        }

        self.persist()?;

        log::debug!("Recorded {target}/{stage} in {}", self.path.display());
        Ok(())
    }

    /// Deployment targets present in the document, in file order
    pub fn targets(&self) -> impl Iterator<Item = &str> {
        self.document.keys().map(String::as_str)
    }

    /// Stages recorded complete for `target`, in file order
    pub fn completed(&self, target: &str) -> Vec<&str> {
        self.document
            .get(target)
            .and_then(Value::as_object)
            .map(|record| {
                record
                    .iter()
                    .filter(|(_, done)| done.as_bool() == Some(true))
                    .map(|(name, _)| name.as_str())
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Write the full document to a sibling temp file, then rename it into place
    fn persist(&self) -> Result<()> {
        let io_err = |source: std::io::Error| Error::LedgerIo {
            path: self.path.clone(),
            source,
        };

        let mut buf = Vec::new();
        let mut serializer =
            serde_json::Serializer::with_formatter(&mut buf, PrettyFormatter::with_indent(b"    "));
        self.document
            .serialize(&mut serializer)
            .map_err(|e| io_err(e.into()))?;

        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, &buf).map_err(io_err)?;
        fs::rename(&tmp, &self.path).map_err(io_err)?;
        Ok(())
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
