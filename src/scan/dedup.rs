//! Decides whether a scanned track is new or already in the catalog,
//! and backfills missing artwork on tracks that are already there.

use std::{path::PathBuf, sync::Arc};

use thiserror::Error;

use crate::{
    artwork::store::CoverPaths,
    domain::{
        CoverBuffer,
        track::{CoverPair, Track, TrackId},
    },
    notify::{Notice, Notifier, ids},
    storage::{
        catalog::{SharedCatalog, lock},
        error::CatalogError,
        fs::cover_pair_exists,
    },
    workers::covers::CoverWorkerPool,
};

#[derive(Debug, Error)]
#[error("could not reconcile '{title}': {source}")]
pub struct DedupError {
    pub title: String,
    #[source]
    pub source: CatalogError,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reconciled {
    Inserted(TrackId),
    Duplicate {
        id: TrackId,
        song_cover_patched: bool,
        album_cover_patched: bool,
    },
}

impl From<CoverPaths> for CoverPair {
    fn from(paths: CoverPaths) -> Self {
        CoverPair {
            high: Some(paths.high),
            low: paths.low,
        }
    }
}

pub struct DedupEngine {
    catalog: SharedCatalog,
    covers: Arc<CoverWorkerPool>,
    notifier: Arc<dyn Notifier>,
    thumbnail_dir: PathBuf,
}

impl DedupEngine {
    pub fn new(
        catalog: SharedCatalog,
        covers: Arc<CoverWorkerPool>,
        notifier: Arc<dyn Notifier>,
        thumbnail_dir: PathBuf,
    ) -> Self {
        Self {
            catalog,
            covers,
            notifier,
            thumbnail_dir,
        }
    }

    /// Covers are named after the content hash, so duplicates reuse the same files.
    fn store_cover(&self, track: &Track, buffer: CoverBuffer) -> Option<CoverPair> {
        self.covers
            .persist_now(buffer, &self.thumbnail_dir, &track.hash.to_hex(), true)
            .map(CoverPair::from)
    }

    pub fn reconcile(
        &self,
        track: Track,
        cover: Option<CoverBuffer>,
    ) -> Result<Reconciled, DedupError> {
        self.notifier
            .post(Notice::info(ids::SCAN_STATUS, format!("Scanned {}", track.title)));

        let title = track.title.clone();
        self.reconcile_inner(track, cover)
            .map_err(|source| DedupError { title, source })
    }

    fn reconcile_inner(
        &self,
        mut track: Track,
        cover: Option<CoverBuffer>,
    ) -> Result<Reconciled, CatalogError> {
        let existing = lock(&self.catalog).get_by_hash(&track.hash)?;

        let Some(existing) = existing else {
            if let Some(pair) = cover.and_then(|buffer| self.store_cover(&track, buffer)) {
                if let Some(album) = track.album.as_mut() {
                    // other tracks of the album may already have given it a cover
                    let stored = lock(&self.catalog).album_cover(&album.name)?;
                    match stored.filter(|stored| cover_pair_exists(stored)) {
                        Some(stored) => album.cover = stored,
                        None if !cover_pair_exists(&album.cover) => album.cover = pair.clone(),
                        None => {}
                    }
                }
                track.cover = pair;
            }

            let id = lock(&self.catalog).insert_track(&track)?;
            log::debug!("stored new track {id} '{}'", track.title);
            return Ok(Reconciled::Inserted(id));
        };

        let id = existing.id.ok_or_else(|| {
            CatalogError::Internal(anyhow::anyhow!("catalog returned a track without id"))
        })?;
        // an album-less track has no album cover to backfill
        let album_ok = existing.album.is_none() || cover_pair_exists(&existing.album_cover());
        let song_ok = cover_pair_exists(&existing.cover);

        let mut outcome = Reconciled::Duplicate {
            id,
            song_cover_patched: false,
            album_cover_patched: false,
        };
        if album_ok && song_ok {
            return Ok(outcome);
        }

        let Some(CoverPair {
            high: Some(high),
            low: Some(low),
        }) = cover.and_then(|buffer| self.store_cover(&track, buffer))
        else {
            return Ok(outcome);
        };

        let mut catalog = lock(&self.catalog);
        if let Reconciled::Duplicate {
            song_cover_patched,
            album_cover_patched,
            ..
        } = &mut outcome
        {
            if !song_ok {
                catalog.update_song_cover(id, &high, &low)?;
                *song_cover_patched = true;
            }
            if !album_ok {
                catalog.update_album_cover(id, &high, &low)?;
                *album_cover_patched = true;
            }
        }
        Ok(outcome)
    }
}
