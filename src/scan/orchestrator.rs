//! Scan orchestrator: accepts scan requests, coalesces the ones that arrive
//! while a pass is running, and starts artist enrichment once the library
//! is settled.
//!
//! Requests move a small state machine:
//!
//! ```text
//! Idle     --request--> Scanning   (a chain thread starts)
//! Scanning --request--> Queued
//! Queued   --request--> Queued     (coalesced into the queued pass)
//! pass ends: Queued -> Scanning (next pass), Scanning -> Idle
//! ```
//!
//! Any number of requests made during one pass are served by a single
//! follow-up pass. Every caller gets exactly one reply, sent when the chain
//! of passes settles back to idle.

use std::{
    mem,
    panic::{self, AssertUnwindSafe},
    sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError},
    thread::JoinHandle,
    time::SystemTime,
};

use crossbeam_channel::{Receiver, Sender, bounded};
use thiserror::Error;

use crate::{
    config::{PreferenceSource, Workers},
    notify::{Notice, Notifier, ids},
    scan::{
        dedup::{DedupEngine, Reconciled},
        enrichment::{ArtistEnricher, EnrichmentReport},
        prune::{self, PruneReport},
    },
    storage::{
        catalog::{SharedCatalog, lock},
        error::CatalogError,
    },
    workers::{
        covers::CoverWorkerPool,
        pool::{WorkerError, panic_message, spawn_thread},
        scanner::{ScanResult, ScannerWorker, TrackExtractor},
        scraper::ArtistScraper,
    },
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanStatus {
    Idle,
    Scanning,
    /// a pass is running and at least one more has been requested
    Queued,
}

/// Collaborators every pass and enrichment run works with.
pub struct ScanServices {
    pub catalog: SharedCatalog,
    pub notifier: Arc<dyn Notifier>,
    pub preferences: Arc<dyn PreferenceSource>,
    pub extractor: Arc<dyn TrackExtractor>,
    pub scraper: Arc<dyn ArtistScraper>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScanSummary {
    pub pruned: PruneReport,
    pub inserted: usize,
    pub duplicates: usize,
    /// tracks that could not be reconciled; the pass went on without them
    pub dedup_failures: usize,
    pub skipped: usize,
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ScanError {
    #[error("could not read preferences: {0}")]
    Preferences(String),

    #[error("catalog error: {0}")]
    Catalog(String),

    #[error(transparent)]
    Worker(#[from] WorkerError),

    #[error("scan pass panicked: {0}")]
    Panicked(String),

    #[error("scan was abandoned before it could report")]
    Abandoned,
}

impl From<CatalogError> for ScanError {
    fn from(e: CatalogError) -> Self {
        ScanError::Catalog(e.to_string())
    }
}

type Outcome = Result<ScanSummary, ScanError>;

/// Pending answer to a [`ScanOrchestrator::request_scan`] call.
pub struct ScanReply {
    rx: Receiver<Outcome>,
}

impl ScanReply {
    /// Blocks until the chain serving this request has settled.
    pub fn wait(self) -> Outcome {
        self.rx.recv().unwrap_or(Err(ScanError::Abandoned))
    }
}

struct Machine {
    status: ScanStatus,
    enriching: bool,
    /// callers served by the running pass
    current: Vec<Sender<Outcome>>,
    /// callers waiting for the queued pass
    next: Vec<Sender<Outcome>>,
}

struct Core {
    services: ScanServices,
    workers: Workers,
    covers: Arc<CoverWorkerPool>,
    machine: Mutex<Machine>,
    changed: Condvar,
    threads: Mutex<Vec<JoinHandle<()>>>,
}

pub struct ScanOrchestrator {
    core: Arc<Core>,
}

impl ScanOrchestrator {
    pub fn new(services: ScanServices, workers: Workers) -> Result<Self, ScanError> {
        let covers = Arc::new(CoverWorkerPool::spawn(workers.cover_threads)?);
        Ok(Self {
            core: Arc::new(Core {
                services,
                workers,
                covers,
                machine: Mutex::new(Machine {
                    status: ScanStatus::Idle,
                    enriching: false,
                    current: Vec::new(),
                    next: Vec::new(),
                }),
                changed: Condvar::new(),
                threads: Mutex::new(Vec::new()),
            }),
        })
    }

    /// Asks for a scan. Never blocks: the work happens on a chain thread.
    pub fn request_scan(&self) -> ScanReply {
        let (tx, rx) = bounded(1);
        let start_chain = {
            let mut machine = self.core.machine();
            match machine.status {
                ScanStatus::Idle => {
                    machine.status = ScanStatus::Scanning;
                    machine.current.push(tx);
                    true
                }
                ScanStatus::Scanning | ScanStatus::Queued => {
                    machine.status = ScanStatus::Queued;
                    machine.next.push(tx);
                    log::debug!("scan in progress, request queued");
                    false
                }
            }
        };
        if start_chain {
            self.core.changed.notify_all();
            Core::start_chain(&self.core);
        }
        ScanReply { rx }
    }

    pub fn status(&self) -> ScanStatus {
        self.core.machine().status
    }

    pub fn is_enriching(&self) -> bool {
        self.core.machine().enriching
    }

    /// Blocks until no pass is running or queued.
    pub fn wait_idle(&self) {
        self.core.wait_until(|m| m.status == ScanStatus::Idle);
    }

    pub fn wait_for_enrichment(&self) {
        self.core.wait_until(|m| !m.enriching);
    }

    /// Waits for running work to end and joins every thread it started.
    pub fn shutdown(self) {
        self.wait_idle();
        self.wait_for_enrichment();
        loop {
            let handles = mem::take(&mut *self.core.threads());
            if handles.is_empty() {
                break;
            }
            for handle in handles {
                if handle.join().is_err() {
                    log::warn!("scan thread exited abnormally");
                }
            }
        }
        self.core.covers.await_completion();
        log::debug!("scan orchestrator shut down");
    }
}

impl Core {
    fn machine(&self) -> MutexGuard<'_, Machine> {
        self.machine.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn threads(&self) -> MutexGuard<'_, Vec<JoinHandle<()>>> {
        self.threads.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn wait_until(&self, done: impl Fn(&Machine) -> bool) {
        let guard = self.machine();
        drop(
            self.changed
                .wait_while(guard, |m| !done(m))
                .unwrap_or_else(PoisonError::into_inner),
        );
    }

    fn track_thread(&self, handle: JoinHandle<()>) {
        let mut threads = self.threads();
        threads.retain(|h| !h.is_finished());
        threads.push(handle);
    }

    fn start_chain(core: &Arc<Core>) {
        let chain = Arc::clone(core);
        match spawn_thread("scan-chain".to_string(), move || chain.run_chain()) {
            Ok(handle) => core.track_thread(handle),
            Err(e) => {
                log::error!("could not start scan: {e}");
                let waiters = {
                    let mut machine = core.machine();
                    machine.status = ScanStatus::Idle;
                    let mut waiters = mem::take(&mut machine.current);
                    waiters.append(&mut machine.next);
                    waiters
                };
                core.changed.notify_all();
                for waiter in waiters {
                    let _ = waiter.send(Err(ScanError::Worker(e.clone())));
                }
            }
        }
    }

    /// Runs passes until no request is queued, then answers every caller.
    fn run_chain(self: Arc<Self>) {
        let mut settled: Vec<(Sender<Outcome>, Outcome)> = Vec::new();
        loop {
            let outcome = self.run_pass_guarded();
            let succeeded = outcome.is_ok();

            let mut machine = self.machine();
            settled.extend(
                mem::take(&mut machine.current)
                    .into_iter()
                    .map(|waiter| (waiter, outcome.clone())),
            );
            if machine.status == ScanStatus::Queued {
                machine.status = ScanStatus::Scanning;
                machine.current = mem::take(&mut machine.next);
                log::info!("running queued scan");
                continue;
            }

            machine.status = ScanStatus::Idle;
            let enrich = succeeded && !machine.enriching;
            if enrich {
                machine.enriching = true;
            }
            drop(machine);
            self.changed.notify_all();

            for (waiter, outcome) in settled {
                let _ = waiter.send(outcome);
            }
            if enrich {
                self.start_enrichment();
            }
            return;
        }
    }

    fn run_pass_guarded(&self) -> Outcome {
        let outcome = panic::catch_unwind(AssertUnwindSafe(|| self.run_pass()))
            .unwrap_or_else(|payload| Err(ScanError::Panicked(panic_message(payload.as_ref()))));
        if let Err(e) = &outcome {
            log::error!("scan failed: {e}");
            self.services
                .notifier
                .post(Notice::error(ids::COMPLETED_SCAN, format!("Scanning failed: {e}")));
        }
        outcome
    }

    fn run_pass(&self) -> Outcome {
        let services = &self.services;
        services
            .notifier
            .post(Notice::info(ids::STARTED_SCAN, "Starting scanning files"));

        let worker = ScannerWorker::spawn(services.extractor.clone(), self.workers.scanner_threads)?;
        let prefs = services
            .preferences
            .snapshot()
            .map_err(|e| ScanError::Preferences(format!("{e:#}")))?;
        log::info!("scanning {} music root(s)", prefs.music_roots.len());

        let mut summary = ScanSummary {
            pruned: prune::sweep(&services.catalog, &prefs.music_roots)?,
            ..ScanSummary::default()
        };

        let dedup = DedupEngine::new(
            services.catalog.clone(),
            self.covers.clone(),
            services.notifier.clone(),
            prefs.thumbnail_dir.clone(),
        );
        let mut stream = worker.start(
            prefs.music_roots.clone(),
            prefs.follow_symlinks,
            prefs.ignored_dirs.clone(),
        )?;
        for item in &mut stream {
            let ScanResult { track, cover } = item?;
            match dedup.reconcile(track, cover) {
                Ok(Reconciled::Inserted(_)) => summary.inserted += 1,
                Ok(Reconciled::Duplicate { .. }) => summary.duplicates += 1,
                Err(e) => {
                    log::warn!("{e}");
                    summary.dedup_failures += 1;
                }
            }
        }
        summary.skipped = stream.skipped();
        stream.terminate();

        {
            let mut catalog = lock(&services.catalog);
            catalog.recompute_counts()?;
            catalog.record_scan(SystemTime::now())?;
        }

        services
            .notifier
            .post(Notice::info(ids::COMPLETED_SCAN, "Scanning Completed"));
        log::info!(
            "scan done: {} new, {} already known, {} pruned, {} skipped",
            summary.inserted,
            summary.duplicates,
            summary.pruned.removed(),
            summary.skipped
        );
        Ok(summary)
    }

    fn start_enrichment(self: Arc<Self>) {
        let core = Arc::clone(&self);
        let spawned = spawn_thread("enrichment".to_string(), move || {
            match panic::catch_unwind(AssertUnwindSafe(|| core.enrich())) {
                Ok(Ok(report)) => log::debug!("enrichment report: {report:?}"),
                Ok(Err(e)) => {
                    log::warn!("artist enrichment failed: {e:#}");
                    core.services.notifier.post(Notice::warning(
                        ids::ARTWORK_STATUS,
                        format!("Artist enrichment failed: {e}"),
                    ));
                }
                Err(payload) => {
                    log::error!("artist enrichment panicked: {}", panic_message(payload.as_ref()))
                }
            }
            core.finish_enrichment();
        });
        match spawned {
            Ok(handle) => self.track_thread(handle),
            Err(e) => {
                log::error!("could not start artist enrichment: {e}");
                self.finish_enrichment();
            }
        }
    }

    fn enrich(&self) -> anyhow::Result<EnrichmentReport> {
        let prefs = self.services.preferences.snapshot()?;
        let enricher = ArtistEnricher::new(
            self.services.catalog.clone(),
            self.covers.clone(),
            self.services.notifier.clone(),
            self.services.scraper.clone(),
        );
        Ok(enricher.run(&prefs.artwork_dir)?)
    }

    fn finish_enrichment(&self) {
        self.machine().enriching = false;
        self.changed.notify_all();
    }
}

#[cfg(test)]
mod tests {
    use std::{
        path::{Path, PathBuf},
        sync::{Arc, Mutex},
    };

    use anyhow::anyhow;
    use crossbeam_channel::{Receiver, Sender, unbounded};
    use tempfile::TempDir;

    use super::{ScanError, ScanOrchestrator, ScanServices, ScanStatus};
    use crate::{
        config::{PreferenceSource, Preferences, Workers},
        domain::{CoverBuffer, artist::Artist, hash::ContentHash, track::Track},
        notify::{RecordingNotifier, ids},
        scan::dedup::tests::memory_catalog,
        storage::{
            catalog::{SharedCatalog, lock},
            fs::cover_pair_exists,
        },
        workers::{
            pool::WorkerError,
            scanner::{ScanResult, TrackExtractor, tests::FakeExtractor},
            scraper::{ArtistScraper, tests::FakeScraper},
        },
    };

    /// Reports every extraction on `entered`, then blocks until `release`
    /// is dropped.
    struct GatedExtractor {
        entered: Sender<()>,
        release: Receiver<()>,
    }

    impl TrackExtractor for GatedExtractor {
        fn extract(&self, path: &Path) -> anyhow::Result<Option<ScanResult>> {
            let _ = self.entered.send(());
            let _ = self.release.recv();
            FakeExtractor.extract(path)
        }
    }

    /// Blocks every identifier lookup until `release` is dropped. Finds nothing.
    struct GatedScraper {
        entered: Sender<()>,
        release: Receiver<()>,
    }

    impl ArtistScraper for GatedScraper {
        fn resolve_external_id(&self, _artist: &Artist) -> anyhow::Result<Option<String>> {
            let _ = self.entered.send(());
            let _ = self.release.recv();
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

    /// Preferences that a test can swap while a scan is running.
    struct SwitchablePreferences(Mutex<Preferences>);

    impl PreferenceSource for SwitchablePreferences {
        fn snapshot(&self) -> anyhow::Result<Preferences> {
            Ok(self.0.lock().unwrap().clone())
        }
    }

    struct BrokenPreferences;

    impl PreferenceSource for BrokenPreferences {
        fn snapshot(&self) -> anyhow::Result<Preferences> {
            Err(anyhow!("config file is gone"))
        }
    }

    struct Library {
        tmp: TempDir,
    }

    impl Library {
        fn new() -> Self {
            let tmp = TempDir::new().unwrap();
            std::fs::create_dir_all(tmp.path().join("music")).unwrap();
            Self { tmp }
        }

        fn music(&self) -> PathBuf {
            self.tmp.path().join("music")
        }

        fn add(&self, name: &str) -> PathBuf {
            let path = self.music().join(name);
            std::fs::write(&path, name.as_bytes()).unwrap();
            path
        }

        fn preferences(&self) -> Preferences {
            self.preferences_for(self.music())
        }

        fn preferences_for(&self, root: PathBuf) -> Preferences {
            Preferences {
                music_roots: vec![root],
                follow_symlinks: false,
                ignored_dirs: vec![],
                thumbnail_dir: self.tmp.path().join("thumbs"),
                artwork_dir: self.tmp.path().join("artwork"),
            }
        }
    }

    fn orchestrator(
        catalog: &SharedCatalog,
        notifier: &Arc<RecordingNotifier>,
        preferences: Arc<dyn PreferenceSource>,
        extractor: Arc<dyn TrackExtractor>,
    ) -> ScanOrchestrator {
        orchestrator_with(catalog, notifier, preferences, extractor, Arc::new(FakeScraper))
    }

    fn orchestrator_with(
        catalog: &SharedCatalog,
        notifier: &Arc<RecordingNotifier>,
        preferences: Arc<dyn PreferenceSource>,
        extractor: Arc<dyn TrackExtractor>,
        scraper: Arc<dyn ArtistScraper>,
    ) -> ScanOrchestrator {
        ScanOrchestrator::new(
            ScanServices {
                catalog: catalog.clone(),
                notifier: notifier.clone(),
                preferences,
                extractor,
                scraper,
            },
            Workers {
                scanner_threads: 2,
                cover_threads: 1,
            },
        )
        .unwrap()
    }

    fn gate() -> (GatedExtractor, Receiver<()>, Sender<()>) {
        let (entered_tx, entered_rx) = unbounded();
        let (release_tx, release_rx) = unbounded();
        (
            GatedExtractor {
                entered: entered_tx,
                release: release_rx,
            },
            entered_rx,
            release_tx,
        )
    }

    #[test]
    fn scan_inserts_then_recognises_duplicates() {
        let library = Library::new();
        library.add("a.mp3");
        library.add("b.flac");
        let catalog = memory_catalog();
        let notifier = Arc::new(RecordingNotifier::default());
        let scans = orchestrator(
            &catalog,
            &notifier,
            Arc::new(library.preferences()),
            Arc::new(FakeExtractor),
        );

        let first = scans.request_scan().wait().unwrap();
        assert_eq!(first.inserted, 2);
        assert_eq!(first.duplicates, 0);

        let second = scans.request_scan().wait().unwrap();
        assert_eq!(second.inserted, 0);
        assert_eq!(second.duplicates, 2);

        assert_eq!(lock(&catalog).count_tracks().unwrap(), 2);
        assert!(lock(&catalog).last_scan().unwrap().is_some());
        assert_eq!(notifier.messages_with_id(ids::STARTED_SCAN).len(), 2);
        assert_eq!(
            notifier.messages_with_id(ids::COMPLETED_SCAN),
            vec!["Scanning Completed", "Scanning Completed"]
        );
        scans.shutdown();
    }

    #[test]
    fn requests_during_a_pass_share_one_follow_up_pass() {
        let library = Library::new();
        library.add("a.mp3");
        let catalog = memory_catalog();
        let notifier = Arc::new(RecordingNotifier::default());
        let (extractor, entered, release) = gate();
        let scans = orchestrator(
            &catalog,
            &notifier,
            Arc::new(library.preferences()),
            Arc::new(extractor),
        );

        let first = scans.request_scan();
        entered.recv().unwrap();
        assert_eq!(scans.status(), ScanStatus::Scanning);

        let queued: Vec<_> = (0..3).map(|_| scans.request_scan()).collect();
        assert_eq!(scans.status(), ScanStatus::Queued);
        drop(release);

        let first = first.wait().unwrap();
        assert_eq!(first.inserted, 1);
        let outcomes: Vec<_> = queued.into_iter().map(|r| r.wait().unwrap()).collect();
        for outcome in &outcomes {
            assert_eq!(outcome.duplicates, 1);
            assert_eq!(outcome, &outcomes[0]);
        }

        assert_eq!(notifier.messages_with_id(ids::STARTED_SCAN).len(), 2);
        assert_eq!(scans.status(), ScanStatus::Idle);
        scans.shutdown();
    }

    #[test]
    fn failing_pass_still_answers_and_skips_enrichment() {
        let library = Library::new();
        library.add("broken.mp3");
        let catalog = memory_catalog();
        let notifier = Arc::new(RecordingNotifier::default());
        let scans = orchestrator(
            &catalog,
            &notifier,
            Arc::new(library.preferences()),
            Arc::new(FakeExtractor),
        );

        let outcome = scans.request_scan().wait();

        assert!(matches!(
            outcome,
            Err(ScanError::Worker(WorkerError::Failed { .. }))
        ));
        assert_eq!(scans.status(), ScanStatus::Idle);
        assert!(!scans.is_enriching());
        assert!(notifier.messages_with_id(ids::ARTWORK_STATUS).is_empty());
        assert!(lock(&catalog).last_scan().unwrap().is_none());
        scans.shutdown();
    }

    #[test]
    fn unreadable_preferences_fail_the_pass() {
        let catalog = memory_catalog();
        let notifier = Arc::new(RecordingNotifier::default());
        let scans = orchestrator(
            &catalog,
            &notifier,
            Arc::new(BrokenPreferences),
            Arc::new(FakeExtractor),
        );

        let outcome = scans.request_scan().wait();

        assert!(matches!(outcome, Err(ScanError::Preferences(_))));
        scans.shutdown();
    }

    #[test]
    fn queued_pass_runs_after_a_failed_one() {
        let library = Library::new();
        library.add("broken.mp3");
        let clean = library.tmp.path().join("clean");
        std::fs::create_dir_all(&clean).unwrap();
        std::fs::write(clean.join("fine.mp3"), b"fine").unwrap();

        let catalog = memory_catalog();
        let notifier = Arc::new(RecordingNotifier::default());
        let preferences = Arc::new(SwitchablePreferences(Mutex::new(library.preferences())));
        let (extractor, entered, release) = gate();
        let scans = orchestrator(&catalog, &notifier, preferences.clone(), Arc::new(extractor));

        let failing = scans.request_scan();
        entered.recv().unwrap();
        let queued = scans.request_scan();
        *preferences.0.lock().unwrap() = library.preferences_for(clean);
        drop(release);

        assert!(failing.wait().is_err());
        let summary = queued.wait().unwrap();
        assert_eq!(summary.inserted, 1);
        scans.shutdown();
    }

    #[test]
    fn rows_outside_the_roots_are_pruned_before_scanning() {
        let library = Library::new();
        library.add("a.mp3");
        let catalog = memory_catalog();
        let stale = Track::local(
            ContentHash::from_bytes(b"stale"),
            PathBuf::from("/elsewhere/stale.mp3"),
            "stale",
        );
        lock(&catalog).insert_track(&stale).unwrap();
        let notifier = Arc::new(RecordingNotifier::default());
        let scans = orchestrator(
            &catalog,
            &notifier,
            Arc::new(library.preferences()),
            Arc::new(FakeExtractor),
        );

        let summary = scans.request_scan().wait().unwrap();

        assert_eq!(summary.pruned.out_of_roots, 1);
        assert!(lock(&catalog).get_by_hash(&stale.hash).unwrap().is_none());
        assert_eq!(lock(&catalog).count_tracks().unwrap(), 1);
        scans.shutdown();
    }

    #[test]
    fn successful_scan_starts_enrichment() {
        let library = Library::new();
        library.add("a.mp3");
        let catalog = memory_catalog();
        let notifier = Arc::new(RecordingNotifier::default());
        let scans = orchestrator(
            &catalog,
            &notifier,
            Arc::new(library.preferences()),
            Arc::new(FakeExtractor),
        );

        scans.request_scan().wait().unwrap();
        scans.wait_for_enrichment();

        assert!(!scans.is_enriching());
        assert_eq!(
            notifier.messages_with_id(ids::ARTWORK_STATUS),
            vec!["Found artwork for Fake Artist"]
        );
        scans.shutdown();
    }

    #[test]
    fn scanned_tracks_have_their_covers_on_disk() {
        let library = Library::new();
        library.add("a.mp3");
        library.add("b.flac");
        let catalog = memory_catalog();
        let notifier = Arc::new(RecordingNotifier::default());
        let scans = orchestrator(
            &catalog,
            &notifier,
            Arc::new(library.preferences()),
            Arc::new(FakeExtractor),
        );

        scans.request_scan().wait().unwrap();

        let tracks = lock(&catalog).list_tracks().unwrap();
        assert_eq!(tracks.len(), 2);
        let thumbs = library.preferences().thumbnail_dir;
        for track in tracks {
            assert!(cover_pair_exists(&track.cover), "{} has no cover", track.title);
            let high = PathBuf::from(track.cover.high.unwrap());
            assert!(high.starts_with(&thumbs));
            assert!(high.to_string_lossy().contains(&track.hash.to_hex()));
        }
        scans.shutdown();
    }

    #[test]
    fn scans_finishing_during_enrichment_do_not_start_another() {
        let library = Library::new();
        library.add("a.mp3");
        let catalog = memory_catalog();
        let notifier = Arc::new(RecordingNotifier::default());
        let (entered_tx, entered) = unbounded();
        let (release, release_rx) = unbounded::<()>();
        let scans = orchestrator_with(
            &catalog,
            &notifier,
            Arc::new(library.preferences()),
            Arc::new(FakeExtractor),
            Arc::new(GatedScraper {
                entered: entered_tx,
                release: release_rx,
            }),
        );

        // the reply does not wait for the enrichment it triggers
        let first = scans.request_scan().wait().unwrap();
        assert_eq!(first.inserted, 1);
        entered.recv().unwrap();
        assert!(scans.is_enriching());

        let second = scans.request_scan().wait().unwrap();
        assert_eq!(second.duplicates, 1);
        assert!(scans.is_enriching());

        drop(release);
        scans.wait_for_enrichment();

        assert_eq!(
            notifier.messages_with_id(ids::ARTWORK_STATUS),
            vec!["Found artwork for Fake Artist"]
        );
        assert!(entered.try_recv().is_err());
        scans.shutdown();
    }
}
