use std::{fmt::Display, path::PathBuf};

use super::hash::ContentHash;

/// Catalog-assigned identifier of a stored track.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TrackId(pub i64);

impl Display for TrackId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Where a track comes from. Only `Local` tracks are subject to pruning.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TrackOrigin {
    Local,
    Remote(String),
}

impl TrackOrigin {
    pub fn as_tag(&self) -> &str {
        match self {
            TrackOrigin::Local => "LOCAL",
            TrackOrigin::Remote(provider) => provider,
        }
    }

    pub fn from_tag(tag: &str) -> Self {
        if tag == "LOCAL" {
            TrackOrigin::Local
        } else {
            TrackOrigin::Remote(tag.to_string())
        }
    }
}

/// High and low resolution variants of a cover.
///
/// Each side is either a local path or an http URL.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CoverPair {
    pub high: Option<String>,
    pub low: Option<String>,
}

impl CoverPair {
    pub fn new(high: impl Into<String>, low: impl Into<String>) -> Self {
        Self {
            high: Some(high.into()),
            low: Some(low.into()),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Album {
    pub name: String,
    pub cover: CoverPair,
}

/// Represent a music track
#[derive(Debug, Clone, PartialEq)]
pub struct Track {
    /// `None` until the catalog stored it
    pub id: Option<TrackId>,
    pub hash: ContentHash,
    pub path: Option<PathBuf>,
    pub origin: TrackOrigin,
    pub title: String,
    pub artists: Vec<String>,
    pub album: Option<Album>,
    pub genres: Vec<String>,
    pub duration_secs: Option<u64>,
    pub cover: CoverPair,
}

impl Track {
    /// A freshly scanned local track, not yet stored.
    pub fn local(hash: ContentHash, path: PathBuf, title: impl Into<String>) -> Self {
        Self {
            id: None,
            hash,
            path: Some(path),
            origin: TrackOrigin::Local,
            title: title.into(),
            artists: Vec::new(),
            album: None,
            genres: Vec::new(),
            duration_secs: None,
            cover: CoverPair::default(),
        }
    }

    pub fn album_cover(&self) -> CoverPair {
        self.album
            .as_ref()
            .map(|album| album.cover.clone())
            .unwrap_or_default()
    }
}
