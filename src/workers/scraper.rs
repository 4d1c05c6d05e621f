//! Scraper worker: a dedicated thread that talks to the external artist
//! metadata service through an [`ArtistScraper`].

use std::{
    panic::{self, AssertUnwindSafe},
    path::{Path, PathBuf},
    sync::Arc,
    thread::JoinHandle,
};

use crossbeam_channel::{Receiver, Sender, bounded, unbounded};

use crate::{
    domain::{CoverBuffer, artist::Artist},
    workers::pool::{WorkerError, panic_message, spawn_thread},
};

const WORKER_NAME: &str = "scraper";
const PENDING_RESULTS: usize = 16;

/// Access to the external artist metadata service.
pub trait ArtistScraper: Send + Sync {
    /// Looks up the artist's external identifier by display name.
    fn resolve_external_id(&self, artist: &Artist) -> anyhow::Result<Option<String>>;

    /// Downloads artwork for the artist. `artwork_dir` may be used as a download cache.
    fn fetch_artwork(
        &self,
        artist: &Artist,
        artwork_dir: &Path,
    ) -> anyhow::Result<Option<CoverBuffer>>;
}

/// Scraper for machines without network access: resolves nothing, so
/// artists end up with their default covers.
#[derive(Debug, Default)]
pub struct OfflineScraper;

impl ArtistScraper for OfflineScraper {
    fn resolve_external_id(&self, _artist: &Artist) -> anyhow::Result<Option<String>> {
        Ok(None)
    }

    fn fetch_artwork(
        &self,
        _artist: &Artist,
        _artwork_dir: &Path,
    ) -> anyhow::Result<Option<CoverBuffer>> {
        Ok(None)
    }
}

#[derive(Debug)]
pub struct ArtworkResult {
    pub artist: Artist,
    pub cover: Option<CoverBuffer>,
}

enum ScrapeJob {
    ResolveIds {
        artists: Vec<Artist>,
        results: Sender<Result<Artist, WorkerError>>,
    },
    FetchArtworks {
        artists: Vec<Artist>,
        artwork_dir: PathBuf,
        results: Sender<Result<ArtworkResult, WorkerError>>,
    },
}

pub struct ScraperWorker {
    jobs: Option<Sender<ScrapeJob>>,
    thread: Option<JoinHandle<()>>,
}

impl ScraperWorker {
    pub fn spawn(scraper: Arc<dyn ArtistScraper>) -> Result<Self, WorkerError> {
        let (jobs, rx) = unbounded::<ScrapeJob>();
        let thread = spawn_thread(WORKER_NAME.to_string(), move || {
            for job in rx.iter() {
                match job {
                    ScrapeJob::ResolveIds { artists, results } => {
                        run_guarded(&results, || resolve_ids(scraper.as_ref(), artists, &results))
                    }
                    ScrapeJob::FetchArtworks {
                        artists,
                        artwork_dir,
                        results,
                    } => run_guarded(&results, || {
                        fetch_artworks(scraper.as_ref(), artists, &artwork_dir, &results)
                    }),
                }
            }
        })?;
        log::debug!("spawned {WORKER_NAME} worker");

        Ok(Self {
            jobs: Some(jobs),
            thread: Some(thread),
        })
    }

    fn submit<T>(&self, job: impl FnOnce(Sender<Result<T, WorkerError>>) -> ScrapeJob) -> Receiver<Result<T, WorkerError>> {
        let (results, rx) = bounded(PENDING_RESULTS);
        let sent = match &self.jobs {
            Some(jobs) => jobs.send(job(results.clone())).is_ok(),
            None => false,
        };
        if !sent {
            let _ = results.send(Err(WorkerError::Disconnected(WORKER_NAME.to_string())));
        }
        rx
    }

    /// Streams every artist whose external identifier could be resolved,
    /// with `external_id` filled in. Unresolved artists are left out.
    pub fn resolve_ids(&self, artists: Vec<Artist>) -> Receiver<Result<Artist, WorkerError>> {
        self.submit(|results| ScrapeJob::ResolveIds { artists, results })
    }

    /// Streams one artwork result per artist.
    pub fn fetch_artworks(
        &self,
        artists: Vec<Artist>,
        artwork_dir: &Path,
    ) -> Receiver<Result<ArtworkResult, WorkerError>> {
        let artwork_dir = artwork_dir.to_path_buf();
        self.submit(|results| ScrapeJob::FetchArtworks {
            artists,
            artwork_dir,
            results,
        })
    }

    fn shutdown(&mut self) {
        self.jobs.take();
        if let Some(thread) = self.thread.take() {
            if thread.join().is_err() {
                log::warn!("{WORKER_NAME} worker exited abnormally");
            }
        }
    }

    pub fn terminate(mut self) {
        self.shutdown();
    }
}

impl Drop for ScraperWorker {
    fn drop(&mut self) {
        self.shutdown();
    }
}

/// Runs one job; a panic ends that job's stream with an error.
fn run_guarded<T>(results: &Sender<Result<T, WorkerError>>, job: impl FnOnce()) {
    if let Err(payload) = panic::catch_unwind(AssertUnwindSafe(job)) {
        let _ = results.send(Err(WorkerError::Panicked {
            worker: WORKER_NAME.to_string(),
            message: panic_message(payload.as_ref()),
        }));
    }
}

fn resolve_ids(
    scraper: &dyn ArtistScraper,
    artists: Vec<Artist>,
    results: &Sender<Result<Artist, WorkerError>>,
) {
    for mut artist in artists {
        match scraper.resolve_external_id(&artist) {
            Ok(Some(external_id)) => {
                artist.external_id = Some(external_id);
                if results.send(Ok(artist)).is_err() {
                    return;
                }
            }
            Ok(None) => log::debug!("no external id found for {}", artist.name),
            Err(e) => log::debug!("could not resolve {}: {e:#}", artist.name),
        }
    }
}

fn fetch_artworks(
    scraper: &dyn ArtistScraper,
    artists: Vec<Artist>,
    artwork_dir: &Path,
    results: &Sender<Result<ArtworkResult, WorkerError>>,
) {
    for artist in artists {
        let cover = match scraper.fetch_artwork(&artist, artwork_dir) {
            Ok(cover) => cover,
            Err(e) => {
                log::warn!("could not fetch artwork for {}: {e:#}", artist.name);
                None
            }
        };
        if results.send(Ok(ArtworkResult { artist, cover })).is_err() {
            return;
        }
    }
}
