//! Boundary to the persistent catalog of tracks and artists.

use std::{
    sync::{Arc, Mutex, MutexGuard, PoisonError},
    time::SystemTime,
};

use crate::{
    domain::{
        artist::{Artist, ArtistId},
        hash::ContentHash,
        track::{CoverPair, Track, TrackId},
    },
    storage::{db::SecondsSinceUnix, error::CatalogError},
};

/// Operations the scan pipeline needs from the catalog.
///
/// Identity assignment and hash indexing belong to the implementation:
/// `insert_track` returns the id it assigned, and artists, albums and genres
/// named by a track are created as a side effect of storing it.
pub trait Catalog: Send {
    fn get_by_hash(&mut self, hash: &ContentHash) -> Result<Option<Track>, CatalogError>;

    fn insert_track(&mut self, track: &Track) -> Result<TrackId, CatalogError>;

    fn update_song_cover(
        &mut self,
        id: TrackId,
        high: &str,
        low: &str,
    ) -> Result<(), CatalogError>;

    /// Cover currently stored for the named album, if the album exists.
    fn album_cover(&mut self, album: &str) -> Result<Option<CoverPair>, CatalogError>;

    /// Updates the cover of the album the track belongs to.
    fn update_album_cover(
        &mut self,
        id: TrackId,
        high: &str,
        low: &str,
    ) -> Result<(), CatalogError>;

    fn list_tracks(&mut self) -> Result<Vec<Track>, CatalogError>;

    fn remove_track(&mut self, id: TrackId) -> Result<(), CatalogError>;

    fn count_tracks(&mut self) -> Result<usize, CatalogError>;

    fn list_artists(&mut self) -> Result<Vec<Artist>, CatalogError>;

    fn update_artist(&mut self, artist: &Artist) -> Result<(), CatalogError>;

    /// Refreshes song counts of albums, artists, genres and playlists.
    fn recompute_counts(&mut self) -> Result<(), CatalogError>;

    /// Cover to show for an artist when no artwork could be fetched.
    fn default_cover_for_artist(&mut self, id: ArtistId) -> Result<Option<String>, CatalogError>;

    fn record_scan(&mut self, at: SystemTime) -> Result<(), CatalogError>;

    /// Time of the last completed scan, if any.
    fn last_scan(&mut self) -> Result<Option<SecondsSinceUnix>, CatalogError>;
}

/// Catalog handle shared by the orchestrator, the scan pass and enrichment.
pub type SharedCatalog = Arc<Mutex<dyn Catalog>>;

pub fn shared<C: Catalog + 'static>(catalog: C) -> SharedCatalog {
    Arc::new(Mutex::new(catalog))
}

/// Locks the catalog. Writes are single statements or transactions, so a
/// holder that panicked leaves nothing half-written and the lock is reused.
pub fn lock(catalog: &SharedCatalog) -> MutexGuard<'_, dyn Catalog + 'static> {
    catalog.lock().unwrap_or_else(PoisonError::into_inner)
}
