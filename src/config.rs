use anyhow::Context;
use serde::Deserialize;
use std::path::{Path, PathBuf};

#[derive(Debug, Deserialize)]
pub struct Config {
    pub version: u32,
    pub database: Database,
    pub library_source: LibrarySource,
    pub cache: CacheDirs,
    #[serde(default)]
    pub workers: Workers,
}

impl Config {
    pub fn load(path: &Path) -> anyhow::Result<Config> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config {}", path.to_string_lossy()))?;
        toml::from_str(&contents).with_context(|| "Failed to parse config TOML")
    }

    pub fn preferences(&self) -> Preferences {
        Preferences {
            music_roots: self.library_source.roots.clone(),
            follow_symlinks: self.library_source.follow_symlinks,
            ignored_dirs: self.library_source.ignored_dirs.clone(),
            thumbnail_dir: self.cache.thumbnail_dir.clone(),
            artwork_dir: self.cache.artwork_dir.clone(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct Database {
    pub in_memory: bool,
    pub path: Option<PathBuf>,
}

#[derive(Debug, Deserialize, Default, Clone)]
pub struct LibrarySource {
    pub roots: Vec<PathBuf>,
    pub follow_symlinks: bool,
    #[serde(default)]
    pub ignored_dirs: Vec<PathBuf>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct CacheDirs {
    pub thumbnail_dir: PathBuf,
    pub artwork_dir: PathBuf,
}

#[derive(Debug, Deserialize, Clone, Copy)]
pub struct Workers {
    #[serde(default = "default_scanner_threads")]
    pub scanner_threads: usize,
    #[serde(default = "default_cover_threads")]
    pub cover_threads: usize,
}

fn default_scanner_threads() -> usize {
    4
}

fn default_cover_threads() -> usize {
    2
}

impl Default for Workers {
    fn default() -> Self {
        Self {
            scanner_threads: default_scanner_threads(),
            cover_threads: default_cover_threads(),
        }
    }
}

/// Immutable snapshot of everything a scan pass reads from the user's settings.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Preferences {
    pub music_roots: Vec<PathBuf>,
    pub follow_symlinks: bool,
    pub ignored_dirs: Vec<PathBuf>,
    pub thumbnail_dir: PathBuf,
    pub artwork_dir: PathBuf,
}

/// Source of preference snapshots. Read once at the start of every scan pass.
pub trait PreferenceSource: Send + Sync {
    fn snapshot(&self) -> anyhow::Result<Preferences>;
}

impl PreferenceSource for Preferences {
    fn snapshot(&self) -> anyhow::Result<Preferences> {
        Ok(self.clone())
    }
}

/// Re-reads the config file on every snapshot, so edited roots apply to the next scan.
#[derive(Debug, Clone)]
pub struct ConfigFile {
    pub path: PathBuf,
}

impl PreferenceSource for ConfigFile {
    fn snapshot(&self) -> anyhow::Result<Preferences> {
        Ok(Config::load(&self.path)?.preferences())
    }
}
