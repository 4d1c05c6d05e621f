//! Scan worker: walks library roots and extracts tracks on a pool of threads.

use std::{
    path::{Path, PathBuf},
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
    },
    thread::JoinHandle,
};

use crossbeam_channel::{Receiver, bounded};
use lofty::file::{AudioFile, TaggedFileExt};
use lofty::prelude::Accessor;
use lofty::tag::Tag;

use crate::{
    domain::{
        CoverBuffer,
        hash::ContentHash,
        track::{Album, Track},
    },
    storage::fs::walk_music_files,
    workers::pool::{JobHandle, WorkerError, WorkerPool, spawn_thread},
};

const WORKER_NAME: &str = "scanner";
/// Extracted tracks waiting to be reconciled.
const PENDING_RESULTS: usize = 64;

/// One discovered track and the cover embedded in its file, if any.
#[derive(Debug)]
pub struct ScanResult {
    pub track: Track,
    pub cover: Option<CoverBuffer>,
}

/// Reads a music file into a track.
pub trait TrackExtractor: Send + Sync {
    /// `Ok(None)` means the file is not usable and is skipped.
    /// `Err` is a worker failure and aborts the scan.
    fn extract(&self, path: &Path) -> anyhow::Result<Option<ScanResult>>;
}

/// Extracts tags and embedded artwork with `lofty`.
#[derive(Debug, Default)]
pub struct LoftyExtractor;

fn first_non_empty<F>(primary_tag: Option<&Tag>, tags: &[Tag], mut extractor: F) -> Option<String>
where
    F: FnMut(&Tag) -> Option<String>,
{
    primary_tag
        .into_iter()
        .chain(tags.iter())
        .filter_map(|tag| extractor(tag))
        .map(|value| value.trim().to_string())
        .find(|value| !value.is_empty())
}

/// "A; B / C" -> ["A", "B", "C"]
fn split_names(value: &str) -> Vec<String> {
    value
        .split([';', '/'])
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .map(str::to_string)
        .collect()
}

fn fallback_title(path: &Path) -> String {
    path.file_stem()
        .map(|stem| stem.to_string_lossy().to_string())
        .unwrap_or_else(|| path.to_string_lossy().to_string())
}

impl TrackExtractor for LoftyExtractor {
    fn extract(&self, path: &Path) -> anyhow::Result<Option<ScanResult>> {
        let hash = match ContentHash::from_file(path) {
            Ok(hash) => hash,
            Err(e) => {
                log::warn!("skipping {}: {e:#}", path.to_string_lossy());
                return Ok(None);
            }
        };
        let mut track = Track::local(hash, path.to_path_buf(), fallback_title(path));

        let tagged_file = match lofty::read_from_path(path) {
            Ok(tagged_file) => tagged_file,
            Err(e) => {
                log::debug!("no readable tags in {}: {e}", path.to_string_lossy());
                return Ok(Some(ScanResult { track, cover: None }));
            }
        };
        let primary_tag = tagged_file.primary_tag();
        let tags = tagged_file.tags();

        if let Some(title) = first_non_empty(primary_tag, tags, |t| t.title().map(|v| v.into_owned())) {
            track.title = title;
        }
        if let Some(artist) = first_non_empty(primary_tag, tags, |t| t.artist().map(|v| v.into_owned())) {
            track.artists = split_names(&artist);
        }
        if let Some(genre) = first_non_empty(primary_tag, tags, |t| t.genre().map(|v| v.into_owned())) {
            track.genres = split_names(&genre);
        }
        track.album = first_non_empty(primary_tag, tags, |t| t.album().map(|v| v.into_owned()))
            .map(|name| Album {
                name,
                ..Default::default()
            });
        track.duration_secs = Some(tagged_file.properties().duration().as_secs());

        let cover = primary_tag
            .into_iter()
            .chain(tags.iter())
            .find_map(|tag| tag.pictures().first())
            .map(|picture| CoverBuffer(picture.data().to_vec()));

        Ok(Some(ScanResult { track, cover }))
    }
}

/// A freshly spawned scan worker. Consumed by [`ScannerWorker::start`],
/// so every scan needs a new one.
pub struct ScannerWorker {
    pool: WorkerPool<PathBuf, Option<ScanResult>>,
}

impl ScannerWorker {
    pub fn spawn(extractor: Arc<dyn TrackExtractor>, threads: usize) -> Result<Self, WorkerError> {
        let pool = WorkerPool::spawn(WORKER_NAME, threads, move |path: PathBuf| {
            extractor
                .extract(&path)
                .map_err(|e| WorkerError::failed(WORKER_NAME, format!("{}: {e:#}", path.to_string_lossy())))
        })?;
        Ok(Self { pool })
    }

    /// Starts walking `roots`; extracted tracks come out of the returned stream
    /// in the order the files were discovered.
    pub fn start(
        self,
        roots: Vec<PathBuf>,
        follow_symlinks: bool,
        ignored_dirs: Vec<PathBuf>,
    ) -> Result<ScanStream, WorkerError> {
        let pool = Arc::new(self.pool);
        let stop = Arc::new(AtomicBool::new(false));
        let (handles_tx, handles_rx) = bounded::<JobHandle<Option<ScanResult>>>(PENDING_RESULTS);

        let walker = {
            let pool = Arc::clone(&pool);
            let stop = Arc::clone(&stop);
            spawn_thread(format!("{WORKER_NAME}-walker"), move || {
                let mut discovered = 0usize;
                for path in walk_music_files(&roots, follow_symlinks, &ignored_dirs) {
                    if stop.load(Ordering::Relaxed) {
                        break;
                    }
                    discovered += 1;
                    if handles_tx.send(pool.submit(path)).is_err() {
                        break;
                    }
                }
                log::debug!("scanner walker done, {discovered} music file(s) discovered");
            })?
        };

        Ok(ScanStream {
            pool,
            stop,
            handles: Some(handles_rx),
            walker: Some(walker),
            skipped: 0,
            failed: false,
        })
    }
}

/// Lazy, finite sequence of scan results.
///
/// Ends after the last discovered file, or right after the first worker error.
/// Dropping the stream stops the walker and joins every scanner thread.
pub struct ScanStream {
    pool: Arc<WorkerPool<PathBuf, Option<ScanResult>>>,
    stop: Arc<AtomicBool>,
    handles: Option<Receiver<JobHandle<Option<ScanResult>>>>,
    walker: Option<JoinHandle<()>>,
    skipped: usize,
    failed: bool,
}

impl ScanStream {
    /// Files that were discovered but yielded no track.
    pub fn skipped(&self) -> usize {
        self.skipped
    }

    pub fn terminate(self) {
        drop(self);
    }

    fn shutdown(&mut self) {
        self.stop.store(true, Ordering::Relaxed);
        // unblocks a walker waiting for room in the handle queue
        self.handles.take();
        if let Some(walker) = self.walker.take() {
            if walker.join().is_err() {
                log::warn!("{} walker exited abnormally", self.pool.name());
            }
        }
        self.pool.await_completion();
    }
}

impl Iterator for ScanStream {
    type Item = Result<ScanResult, WorkerError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed {
            return None;
        }
        loop {
            let handle = self.handles.as_ref()?.recv().ok()?;
            match handle.wait() {
                Ok(Some(result)) => return Some(Ok(result)),
                Ok(None) => self.skipped += 1,
                Err(e) => {
                    self.failed = true;
                    return Some(Err(e));
                }
            }
        }
    }
}

impl Drop for ScanStream {
    fn drop(&mut self) {
        self.shutdown();
    }
}
