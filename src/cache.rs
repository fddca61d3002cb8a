//! Change cache: last-synced content fingerprint per issue key.
//!
//! The reconciler only talks to the `ChangeStore` trait. `TsvStore` keeps the table in a
//! tab-separated file (`key<TAB>"summary"<TAB>md5hex`, one row per key, no header);
//! `MemoryStore` keeps it in memory.

use std::{
	io::{self, Write},
	path::{Path, PathBuf},
};

use tempfile::NamedTempFile;

/// Default location of the cache file, relative to the working directory.
pub const DEFAULT_CACHE_FILE: &str = ".md2jira_cache.tsv";

#[derive(Debug, thiserror::Error)]
pub enum CacheError {
	#[error("failed to read cache file {}", path.display())]
	Read {
		path: PathBuf,
		#[source]
		source: io::Error,
	},
	#[error("failed to write cache file {}", path.display())]
	Write {
		path: PathBuf,
		#[source]
		source: io::Error,
	},
	#[error("failed to replace cache file {}", path.display())]
	Persist {
		path: PathBuf,
		#[source]
		source: tempfile::PersistError,
	},
}

/// One row of the cache table.
#[derive(Clone, Debug, Eq, PartialEq, derive_new::new)]
pub struct CacheEntry {
	#[new(into)]
	pub key: String,
	#[new(into)]
	pub summary: String,
	#[new(into)]
	pub hash: String,
}

impl CacheEntry {
	/// Parse a `key<TAB>"summary"<TAB>hash` row.
	pub fn from_row(row: &str) -> Option<Self> {
		let mut fields = row.split('\t');
		let key = fields.next()?.trim();
		let summary = fields.next()?;
		let hash = fields.next()?.trim();
		if fields.next().is_some() || key.is_empty() || hash.is_empty() {
			return None;
		}
		let summary = summary.strip_prefix('"').and_then(|s| s.strip_suffix('"')).unwrap_or(summary);
		Some(Self::new(key, summary, hash))
	}

	pub fn to_row(&self) -> String {
		let summary: String = self.summary.chars().map(|c| if matches!(c, '\t' | '\n' | '\r') { ' ' } else { c }).collect();
		format!("{}\t\"{summary}\"\t{}", self.key, self.hash)
	}
}

/// Key-value contract of the change cache.
pub trait ChangeStore {
	/// Last recorded fingerprint for `key`.
	fn get(&self, key: &str) -> Result<Option<String>, CacheError>;

	/// Record `hash` for `key`, replacing any previous row for that key.
	fn put(&mut self, key: &str, summary: &str, hash: &str) -> Result<(), CacheError>;

	/// All rows, in table order.
	fn entries(&self) -> Result<Vec<CacheEntry>, CacheError>;
}

/// File-backed cache. The table is re-read on every access and replaced atomically on write.
#[derive(Clone, Debug)]
pub struct TsvStore {
	path: PathBuf,
}

impl TsvStore {
	pub fn new(path: impl Into<PathBuf>) -> Self {
		Self { path: path.into() }
	}

	pub fn path(&self) -> &Path {
		&self.path
	}

	fn write_table(&self, entries: &[CacheEntry]) -> Result<(), CacheError> {
		let dir = match self.path.parent() {
			Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
			_ => PathBuf::from("."),
		};
		let write_err = |source| CacheError::Write { path: self.path.clone(), source };

		let mut tmp = NamedTempFile::new_in(&dir).map_err(write_err)?;
		let mut table = String::new();
		for entry in entries {
			table.push_str(&entry.to_row());
			table.push('\n');
		}
		tmp.write_all(table.as_bytes()).map_err(write_err)?;
		tmp.as_file().sync_all().map_err(write_err)?;
		tmp.persist(&self.path).map_err(|source| CacheError::Persist { path: self.path.clone(), source })?;
		Ok(())
	}
}

impl ChangeStore for TsvStore {
	fn get(&self, key: &str) -> Result<Option<String>, CacheError> {
		let hash = self.entries()?.into_iter().rev().find(|e| e.key == key).map(|e| e.hash);
		tracing::debug!("[cache] get {key} -> {hash:?}");
		Ok(hash)
	}

	fn put(&mut self, key: &str, summary: &str, hash: &str) -> Result<(), CacheError> {
		let mut entries = self.entries()?;
		entries.retain(|e| e.key != key);
		entries.push(CacheEntry::new(key, summary, hash));
		self.write_table(&entries)?;
		tracing::debug!("[cache] put {key} = {hash}");
		Ok(())
	}

	fn entries(&self) -> Result<Vec<CacheEntry>, CacheError> {
		let content = match std::fs::read(&self.path) {
			Ok(content) => content,
			Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
			Err(source) => return Err(CacheError::Read { path: self.path.clone(), source }),
		};

		// rows are decoded one by one so a corrupt row can't take the whole table with it
		let entries = content
			.split(|&b| b == b'\n')
			.enumerate()
			.filter_map(|(idx, raw)| {
				let Ok(row) = std::str::from_utf8(raw) else {
					tracing::warn!("Skipping undecodable cache row {} in {}", idx + 1, self.path.display());
					return None;
				};
				let row = row.strip_suffix('\r').unwrap_or(row);
				if row.trim().is_empty() {
					return None;
				}
				let entry = CacheEntry::from_row(row);
				if entry.is_none() {
					tracing::warn!("Skipping malformed cache row {} in {}: {row:?}", idx + 1, self.path.display());
				}
				entry
			})
			.collect();
		Ok(entries)
	}
}

/// In-memory cache with the same semantics as `TsvStore`.
#[derive(Clone, Debug, Default)]
pub struct MemoryStore {
	entries: Vec<CacheEntry>,
}

impl MemoryStore {
	pub fn new() -> Self {
		Self::default()
	}
}

impl ChangeStore for MemoryStore {
	fn get(&self, key: &str) -> Result<Option<String>, CacheError> {
		Ok(self.entries.iter().find(|e| e.key == key).map(|e| e.hash.clone()))
	}

	fn put(&mut self, key: &str, summary: &str, hash: &str) -> Result<(), CacheError> {
		self.entries.retain(|e| e.key != key);
		self.entries.push(CacheEntry::new(key, summary, hash));
		Ok(())
	}

	fn entries(&self) -> Result<Vec<CacheEntry>, CacheError> {
		Ok(self.entries.clone())
	}
}
