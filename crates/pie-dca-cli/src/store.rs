//! Portfolio files on disk.
//!
//! Each portfolio lives at `<data_dir>/<name>.json` in the canonical tree
//! form. Parsed classifier responses are cached under
//! `<data_dir>/.cache/<sha256>.json`. Writes go to a temporary sibling first
//! and are renamed into place, so a failed command never leaves a half
//! written file.

use std::fs;
use std::path::{Path, PathBuf};

use pie_dca_core::{Pie, PieError};
use serde_json::{Map, Value};
use tracing::{debug, info};

const EXTENSION: &str = "json";
const CACHE_DIR: &str = ".cache";

pub struct Store {
    dir: PathBuf,
}

impl Store {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// File path for a portfolio name. Names that could escape the data
    /// directory are rejected.
    pub fn path_for(&self, name: &str) -> Result<PathBuf, Box<dyn std::error::Error>> {
        let invalid = name.is_empty()
            || name.starts_with('.')
            || name.contains(['/', '\\'])
            || name.chars().any(char::is_control);
        if invalid {
            return Err(PieError::InvalidInput {
                field: "name".into(),
                reason: format!("'{name}' is not a valid portfolio name"),
            }
            .into());
        }
        Ok(self.dir.join(format!("{name}.{EXTENSION}")))
    }

    pub fn exists(&self, name: &str) -> bool {
        self.path_for(name).map(|p| p.is_file()).unwrap_or(false)
    }

    /// Create and save an empty portfolio. Fails if one already exists.
    pub fn create(&self, name: &str) -> Result<Pie, Box<dyn std::error::Error>> {
        if self.exists(name) {
            return Err(format!("Portfolio '{name}' already exists").into());
        }
        let pie = Pie::new(name);
        self.save(name, &pie)?;
        info!(portfolio = %name, "created portfolio");
        Ok(pie)
    }

    pub fn load(&self, name: &str) -> Result<Pie, Box<dyn std::error::Error>> {
        let path = self.path_for(name)?;
        if !path.is_file() {
            return Err(PieError::NotFound(format!("portfolio '{name}' in {}", self.dir.display())).into());
        }
        debug!(path = %path.display(), "loading portfolio");
        let contents = fs::read_to_string(&path)
            .map_err(|e| format!("Failed to read '{}': {}", path.display(), e))?;
        let pie = Pie::from_json(&contents)
            .map_err(|e| format!("Failed to parse '{}': {}", path.display(), e))?;
        Ok(pie)
    }

    /// Load a portfolio, or an unsaved empty one named `name` when missing.
    pub fn load_or_create(&self, name: &str) -> Result<Pie, Box<dyn std::error::Error>> {
        if self.exists(name) {
            self.load(name)
        } else {
            debug!(portfolio = %name, "no saved portfolio, starting empty");
            Ok(Pie::new(name))
        }
    }

    /// Write `pie` to `<name>.json`, creating the data directory if needed.
    pub fn save(&self, name: &str, pie: &Pie) -> Result<PathBuf, Box<dyn std::error::Error>> {
        let path = self.path_for(name)?;
        write_atomic(&path, pie.to_json_pretty()?.as_bytes())?;
        info!(path = %path.display(), "saved portfolio");
        Ok(path)
    }

    /// Sorted portfolio file names.
    pub fn list(&self) -> Result<Vec<String>, Box<dyn std::error::Error>> {
        if !self.dir.is_dir() {
            return Ok(Vec::new());
        }
        let mut names: Vec<String> = fs::read_dir(&self.dir)?
            .filter_map(|entry| entry.ok())
            .map(|entry| entry.path())
            .filter(|p| p.is_file() && p.extension().is_some_and(|e| e == EXTENSION))
            .filter_map(|p| p.file_name().map(|n| n.to_string_lossy().into_owned()))
            .filter(|n| !n.starts_with('.'))
            .collect();
        names.sort();
        Ok(names)
    }

    pub fn delete(&self, name: &str) -> Result<(), Box<dyn std::error::Error>> {
        let path = self.path_for(name)?;
        if !path.is_file() {
            return Err(PieError::NotFound(format!("portfolio '{name}'")).into());
        }
        fs::remove_file(&path)?;
        info!(path = %path.display(), "deleted portfolio");
        Ok(())
    }

    fn cache_path(&self, hash: &str) -> PathBuf {
        self.dir.join(CACHE_DIR).join(format!("{hash}.{EXTENSION}"))
    }

    /// A previously parsed classifier response, if cached.
    pub fn cached_response(
        &self,
        hash: &str,
    ) -> Result<Option<Map<String, Value>>, Box<dyn std::error::Error>> {
        let path = self.cache_path(hash);
        if !path.is_file() {
            return Ok(None);
        }
        let contents = fs::read_to_string(&path)?;
        match serde_json::from_str::<Value>(&contents)? {
            Value::Object(map) => {
                debug!(%hash, "classifier response cache hit");
                Ok(Some(map))
            }
            _ => Ok(None),
        }
    }

    pub fn cache_response(
        &self,
        hash: &str,
        parsed: &Map<String, Value>,
    ) -> Result<(), Box<dyn std::error::Error>> {
        let body = serde_json::to_string_pretty(parsed)?;
        write_atomic(&self.cache_path(hash), body.as_bytes())
    }
}

fn write_atomic(path: &Path, contents: &[u8]) -> Result<(), Box<dyn std::error::Error>> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let mut tmp = path.as_os_str().to_owned();
    tmp.push(".tmp");
    let tmp = PathBuf::from(tmp);
    fs::write(&tmp, contents)
        .map_err(|e| format!("Failed to write '{}': {}", tmp.display(), e))?;
    fs::rename(&tmp, path)?;
    Ok(())
}
