//! Artist enrichment: resolves external identifiers, then fetches artwork.
//!
//! Runs after a successful scan. Every artist is written back as soon as its
//! result arrives, so an interrupted run keeps what it already found.

use std::{path::Path, sync::Arc};

use thiserror::Error;

use crate::{
    domain::artist::Artist,
    notify::{Notice, Notifier, ids},
    storage::{
        catalog::{SharedCatalog, lock},
        error::CatalogError,
    },
    workers::{
        covers::CoverWorkerPool,
        pool::WorkerError,
        scraper::{ArtistScraper, ArtworkResult, ScraperWorker},
    },
};

#[derive(Debug, Error)]
pub enum EnrichmentError {
    #[error(transparent)]
    Catalog(#[from] CatalogError),

    #[error("artist lookup failed: {0}")]
    Worker(#[from] WorkerError),
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EnrichmentReport {
    /// artists that got an external identifier
    pub resolved: usize,
    pub artwork_updated: usize,
}

pub struct ArtistEnricher {
    catalog: SharedCatalog,
    covers: Arc<CoverWorkerPool>,
    notifier: Arc<dyn Notifier>,
    scraper: Arc<dyn ArtistScraper>,
}

impl ArtistEnricher {
    pub fn new(
        catalog: SharedCatalog,
        covers: Arc<CoverWorkerPool>,
        notifier: Arc<dyn Notifier>,
        scraper: Arc<dyn ArtistScraper>,
    ) -> Self {
        Self {
            catalog,
            covers,
            notifier,
            scraper,
        }
    }

    pub fn run(&self, artwork_dir: &Path) -> Result<EnrichmentReport, EnrichmentError> {
        let worker = ScraperWorker::spawn(self.scraper.clone())?;
        let mut report = EnrichmentReport::default();

        let artists = lock(&self.catalog).list_artists()?;
        log::info!("resolving identifiers of {} artists", artists.len());
        for resolved in worker.resolve_ids(artists).iter() {
            let artist = resolved?;
            lock(&self.catalog).update_artist(&artist)?;
            report.resolved += 1;
        }

        // second phase sees the identifiers written by the first
        let artists = lock(&self.catalog).list_artists()?;
        for result in worker.fetch_artworks(artists, artwork_dir).iter() {
            let result = match result {
                Ok(result) => result,
                Err(e) => {
                    log::warn!("artwork fetching stopped: {e}");
                    break;
                }
            };
            let artist = self.apply_artwork(result, artwork_dir)?;
            lock(&self.catalog).update_artist(&artist)?;
            report.artwork_updated += 1;
        }

        worker.terminate();
        log::info!(
            "artist enrichment done: {} resolved, {} artworks updated",
            report.resolved,
            report.artwork_updated
        );
        Ok(report)
    }

    fn apply_artwork(
        &self,
        ArtworkResult { mut artist, cover }: ArtworkResult,
        artwork_dir: &Path,
    ) -> Result<Artist, CatalogError> {
        self.notifier.post(Notice::info(
            ids::ARTWORK_STATUS,
            format!("Found artwork for {}", artist.name),
        ));

        let stored = cover.and_then(|buffer| {
            self.covers
                .persist_now(buffer, artwork_dir, &artist.id.to_string(), false)
        });
        artist.cover_path = match stored {
            Some(paths) => Some(paths.high),
            None => lock(&self.catalog).default_cover_for_artist(artist.id)?,
        };
        Ok(artist)
    }
}

#[cfg(test)]
mod tests {
    use std::{path::PathBuf, sync::Arc};

    use tempfile::TempDir;

    use super::{ArtistEnricher, EnrichmentReport};
    use crate::{
        domain::{
            artist::Artist,
            hash::ContentHash,
            track::{Album, CoverPair, Track},
        },
        notify::{RecordingNotifier, ids},
        scan::dedup::tests::memory_catalog,
        storage::catalog::{SharedCatalog, lock},
        workers::{covers::CoverWorkerPool, scraper::OfflineScraper, scraper::tests::FakeScraper},
    };

    fn insert(catalog: &SharedCatalog, artist: &str, album_cover: Option<&str>) {
        let mut track = Track::local(
            ContentHash::from_bytes(artist.as_bytes()),
            PathBuf::from(format!("/music/{artist}.mp3")),
            artist,
        );
        track.artists = vec![artist.to_string()];
        track.album = Some(Album {
            name: format!("{artist} album"),
            cover: album_cover
                .map(|high| CoverPair::new(high, format!("{high}.low")))
                .unwrap_or_default(),
        });
        lock(catalog).insert_track(&track).unwrap();
    }

    fn by_name(catalog: &SharedCatalog, name: &str) -> Artist {
        lock(catalog)
            .list_artists()
            .unwrap()
            .into_iter()
            .find(|a| a.name == name)
            .unwrap()
    }

    #[test]
    fn resolved_artists_get_fetched_artwork_others_the_default() {
        let tmp = TempDir::new().unwrap();
        let catalog = memory_catalog();
        insert(&catalog, "Known Band", None);
        insert(&catalog, "Garage Band", Some("/covers/garage.png"));
        let notifier = Arc::new(RecordingNotifier::default());
        let enricher = ArtistEnricher::new(
            catalog.clone(),
            Arc::new(CoverWorkerPool::spawn(1).unwrap()),
            notifier.clone(),
            Arc::new(FakeScraper),
        );

        let report = enricher.run(tmp.path()).unwrap();

        assert_eq!(
            report,
            EnrichmentReport {
                resolved: 1,
                artwork_updated: 2,
            }
        );

        let known = by_name(&catalog, "Known Band");
        assert_eq!(known.external_id.as_deref(), Some("ext-Known Band"));
        let cover = PathBuf::from(known.cover_path.unwrap());
        assert!(cover.starts_with(tmp.path()));
        assert!(cover.exists());

        let garage = by_name(&catalog, "Garage Band");
        assert_eq!(garage.external_id, None);
        assert_eq!(garage.cover_path.as_deref(), Some("/covers/garage.png"));

        let mut found = notifier.messages_with_id(ids::ARTWORK_STATUS);
        found.sort();
        assert_eq!(
            found,
            vec!["Found artwork for Garage Band", "Found artwork for Known Band"]
        );
    }

    #[test]
    fn offline_scraper_leaves_artists_with_default_covers() {
        let tmp = TempDir::new().unwrap();
        let catalog = memory_catalog();
        insert(&catalog, "Solo", None);
        let enricher = ArtistEnricher::new(
            catalog.clone(),
            Arc::new(CoverWorkerPool::spawn(1).unwrap()),
            Arc::new(RecordingNotifier::default()),
            Arc::new(OfflineScraper),
        );

        let report = enricher.run(tmp.path()).unwrap();

        assert_eq!(report.resolved, 0);
        let solo = by_name(&catalog, "Solo");
        assert_eq!(solo.cover_path, None);
    }

    #[test]
    fn lookup_panic_aborts_enrichment() {
        let tmp = TempDir::new().unwrap();
        let catalog = memory_catalog();
        insert(&catalog, "Panic Room", None);
        let enricher = ArtistEnricher::new(
            catalog.clone(),
            Arc::new(CoverWorkerPool::spawn(1).unwrap()),
            Arc::new(RecordingNotifier::default()),
            Arc::new(FakeScraper),
        );

        assert!(enricher.run(tmp.path()).is_err());
    }
}
