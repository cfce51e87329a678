//! Symbolic OID resolution from YAML MIB modules.
//!
//! A module file `<dir>/<MODULE>.yaml` is a flat map of object names to
//! dotted OIDs, the format produced by the ruby-snmp MIB importer:
//!
//! ```yaml
//! sysUpTime: 1.3.6.1.2.1.1.3
//! snmpTrapOID: 1.3.6.1.6.3.1.1.4.1
//! ```
//!
//! Resolution picks the longest registered prefix of an OID and renders it
//! as `MODULE::name.suffix`. Problems with individual modules are logged and
//! the module is skipped; they never prevent the listener from starting.

use crate::error::{Error, Result};
use crate::oid::Oid;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

const MODULE_EXTENSION: &str = "yaml";

#[derive(Debug, Clone)]
struct MibEntry {
    module: Arc<str>,
    name: String,
}

/// Loaded MIB modules.
#[derive(Debug, Clone, Default)]
pub struct Mib {
    entries: HashMap<Oid, MibEntry>,
    modules: Vec<Arc<str>>,
}

impl Mib {
    /// Create an empty MIB (numeric OIDs only).
    pub fn new() -> Self {
        Self::default()
    }

    /// Module names available in `dir`: base names of its `*.yaml` files, sorted.
    ///
    /// A missing or unreadable directory yields no modules.
    pub fn discover_modules(dir: &Path) -> Vec<String> {
        let entries = match std::fs::read_dir(dir) {
            Ok(entries) => entries,
            Err(e) => {
                tracing::info!(
                    snmp.mib_dir = %dir.display(),
                    error = %e,
                    "MIB directory not readable, using numeric OIDs"
                );
                return Vec::new();
            }
        };

        let mut modules: Vec<String> = entries
            .filter_map(|entry| entry.ok())
            .map(|entry| entry.path())
            .filter(|path| {
                path.is_file()
                    && path.extension().and_then(|e| e.to_str()) == Some(MODULE_EXTENSION)
            })
            .filter_map(|path| path.file_stem().and_then(|s| s.to_str()).map(String::from))
            .collect();
        modules.sort();
        modules
    }

    /// Load the named modules from `dir`.
    ///
    /// Modules that cannot be read or parsed are logged at warn and skipped.
    pub fn load(dir: &Path, modules: &[String]) -> Self {
        tracing::info!(
            snmp.mib_dir = %dir.display(),
            "using yaml MIB directory"
        );

        let mut mib = Self::new();
        for module in modules {
            let path = module_path(dir, module);
            match mib.load_module(module, &path) {
                Ok(count) => tracing::info!(
                    snmp.mib_module = %module,
                    snmp.mib_objects = count,
                    "loaded MIB module"
                ),
                Err(e) => tracing::warn!(
                    snmp.mib_module = %module,
                    error = %e,
                    "skipping MIB module"
                ),
            }
        }
        mib
    }

    /// Load one module file, returning the number of objects it registered.
    pub fn load_module(&mut self, module: &str, path: &Path) -> Result<usize> {
        let text = std::fs::read_to_string(path).map_err(|e| Error::Mib {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        self.load_module_str(module, &text).map_err(|message| Error::Mib {
            path: path.to_path_buf(),
            message,
        })
    }

    fn load_module_str(&mut self, module: &str, text: &str) -> std::result::Result<usize, String> {
        let raw: HashMap<String, serde_yaml::Value> =
            serde_yaml::from_str(text).map_err(|e| e.to_string())?;

        let mut parsed = Vec::with_capacity(raw.len());
        for (name, value) in raw {
            let dotted = match value {
                serde_yaml::Value::String(s) => s,
                // Unquoted dotted values such as `1.10` arrive as floats.
                serde_yaml::Value::Number(n) => match n.as_u64() {
                    Some(arc) => arc.to_string(),
                    None => return Err(format!("{}: {} must be quoted as an OID string", name, n)),
                },
                other => return Err(format!("{}: expected an OID, got {:?}", name, other)),
            };
            let oid = Oid::parse(&dotted).map_err(|e| format!("{}: {}", name, e))?;
            parsed.push((oid, name));
        }

        // Only a fully parsed module is registered.
        let module: Arc<str> = Arc::from(module);
        let count = parsed.len();
        for (oid, name) in parsed {
            self.entries.insert(
                oid,
                MibEntry {
                    module: Arc::clone(&module),
                    name,
                },
            );
        }
        self.modules.push(module);
        Ok(count)
    }

    /// Names of the successfully loaded modules, in load order.
    pub fn modules(&self) -> impl Iterator<Item = &str> {
        self.modules.iter().map(|m| m.as_ref())
    }

    /// Number of registered objects.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True when no objects are registered.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Symbolic name of `oid`, or `None` when no registered object is a prefix.
    pub fn resolve(&self, oid: &Oid) -> Option<String> {
        let arcs = oid.arcs();
        (1..=arcs.len()).rev().find_map(|len| {
            let entry = self.entries.get(&Oid::from_slice(&arcs[..len]))?;
            let mut name = format!("{}::{}", entry.module, entry.name);
            for arc in &arcs[len..] {
                name.push('.');
                name.push_str(&arc.to_string());
            }
            Some(name)
        })
    }
}

fn module_path(dir: &Path, module: &str) -> PathBuf {
    dir.join(format!("{}.{}", module, MODULE_EXTENSION))
}
