//! Removes catalog rows whose local file is gone or lies outside the music roots.

use std::path::{Path, PathBuf};

use crate::{
    domain::track::TrackOrigin,
    storage::{
        catalog::{SharedCatalog, lock},
        error::CatalogError,
        fs::file_exists,
    },
};

/// Matches paths against the configured music roots, component-wise.
///
/// `/music` matches `/music/a.mp3` but not `/musicold/a.mp3`.
#[derive(Debug, Clone)]
pub struct RootMatcher {
    roots: Vec<PathBuf>,
}

impl RootMatcher {
    pub fn new(roots: &[PathBuf]) -> Self {
        Self {
            roots: roots.to_vec(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.roots.is_empty()
    }

    pub fn matches(&self, path: &Path) -> bool {
        self.roots.iter().any(|root| path.starts_with(root))
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PruneReport {
    /// local rows looked at
    pub examined: usize,
    pub out_of_roots: usize,
    pub missing: usize,
}

impl PruneReport {
    pub fn removed(&self) -> usize {
        self.out_of_roots + self.missing
    }
}

/// Deletes every local row that is no longer backed by a file under `roots`.
///
/// With no roots configured every local row goes. Remote rows are never touched.
pub fn sweep(catalog: &SharedCatalog, roots: &[PathBuf]) -> Result<PruneReport, CatalogError> {
    let matcher = RootMatcher::new(roots);
    let tracks = lock(catalog).list_tracks()?;
    let mut report = PruneReport::default();

    for track in tracks {
        if track.origin != TrackOrigin::Local {
            continue;
        }
        let Some(id) = track.id else { continue };
        report.examined += 1;

        let keep = match &track.path {
            Some(path) if !matcher.is_empty() && matcher.matches(path) => {
                if file_exists(path) {
                    true
                } else {
                    report.missing += 1;
                    false
                }
            }
            _ => {
                report.out_of_roots += 1;
                false
            }
        };
        if keep {
            continue;
        }

        log::debug!("pruning track {id} '{}'", track.title);
        match lock(catalog).remove_track(id) {
            // already gone, nothing to do
            Ok(()) | Err(CatalogError::TrackNotFound(_)) => {}
            Err(e) => return Err(e),
        }
    }

    if report.removed() > 0 {
        log::info!(
            "pruned {} tracks ({} outside music roots, {} missing)",
            report.removed(),
            report.out_of_roots,
            report.missing
        );
    }
    Ok(report)
}
