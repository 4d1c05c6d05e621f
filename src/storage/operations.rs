use std::{path::PathBuf, time::SystemTime};

use crate::{
    config,
    domain::{
        artist::{Artist, ArtistId},
        hash::ContentHash,
        track::{Album, CoverPair, Track, TrackId, TrackOrigin},
    },
    storage::{
        catalog::Catalog,
        db::{self, SecondsSinceUnix, system_time_to_i64},
        error::CatalogError,
        schema::{columns, tables},
    },
};

use columns::*;
use rusqlite::{OptionalExtension, Row, Transaction, params, types::Type};
use tables::*;

/// SQLite implementation of the catalog
pub struct SqliteCatalog {
    pub(crate) db: rusqlite::Connection,
}

impl SqliteCatalog {
    /// when called, opens a data base connection
    pub fn new(db_config: &config::Database) -> Result<Self, CatalogError> {
        let db: rusqlite::Connection = db::open(db_config)?;
        Ok(Self::from_existing_conn(db))
    }

    pub fn from_existing_conn(db: rusqlite::Connection) -> Self {
        Self { db }
    }

    fn track_select() -> String {
        format!(
            "SELECT t.{ID}, t.{HASH}, t.{PATH}, t.{ORIGIN}, t.{TITLE}, t.{DURATION},
                    t.{COVER_HIGH}, t.{COVER_LOW},
                    a.{NAME}, a.{COVER_HIGH}, a.{COVER_LOW}
             FROM {TRACKS} t LEFT JOIN {ALBUMS} a ON a.{ID} = t.{ALBUM_ID}"
        )
    }

    /// reads a row produced by [`Self::track_select`], without artists and genres
    fn track_from_row(row: &Row) -> rusqlite::Result<Track> {
        let hash_hex: String = row.get(1)?;
        let hash = ContentHash::from_hex(&hash_hex)
            .map_err(|e| rusqlite::Error::FromSqlConversionFailure(1, Type::Text, e.into()))?;

        let album = match row.get::<_, Option<String>>(8)? {
            Some(name) => Some(Album {
                name,
                cover: CoverPair {
                    high: row.get(9)?,
                    low: row.get(10)?,
                },
            }),
            None => None,
        };

        Ok(Track {
            id: Some(TrackId(row.get(0)?)),
            hash,
            path: row.get::<_, Option<String>>(2)?.map(PathBuf::from),
            origin: TrackOrigin::from_tag(&row.get::<_, String>(3)?),
            title: row.get(4)?,
            duration_secs: row.get::<_, Option<i64>>(5)?.map(|d| d.max(0) as u64),
            cover: CoverPair {
                high: row.get(6)?,
                low: row.get(7)?,
            },
            album,
            artists: Vec::new(),
            genres: Vec::new(),
        })
    }

    fn with_links(&self, mut track: Track) -> Result<Track, CatalogError> {
        if let Some(id) = track.id {
            track.artists = self.names_for_track(id, ARTISTS, TRACK_ARTISTS, ARTIST_ID)?;
            track.genres = self.names_for_track(id, GENRES, TRACK_GENRES, GENRE_ID)?;
        }
        Ok(track)
    }

    fn names_for_track(
        &self,
        id: TrackId,
        table: &str,
        link_table: &str,
        link_column: &str,
    ) -> Result<Vec<String>, CatalogError> {
        let mut stmt = self.db.prepare(&format!(
            "SELECT x.{NAME} FROM {table} x
             JOIN {link_table} l ON l.{link_column} = x.{ID}
             WHERE l.{TRACK_ID} = ?1 ORDER BY x.{NAME}"
        ))?;
        let names = stmt
            .query_map(params![id.0], |row| row.get(0))?
            .collect::<Result<Vec<String>, _>>()?;
        Ok(names)
    }

    /// returns id of the row with that name, inserting it first if needed
    fn upsert_named(tx: &Transaction, table: &str, name: &str) -> Result<i64, rusqlite::Error> {
        tx.execute(
            &format!("INSERT OR IGNORE INTO {table} ({NAME}) VALUES (?1)"),
            params![name],
        )?;
        tx.query_row(
            &format!("SELECT {ID} FROM {table} WHERE {NAME} = ?1"),
            params![name],
            |row| row.get(0),
        )
    }

    fn album_id_of(&self, id: TrackId) -> Result<Option<i64>, CatalogError> {
        let album_id: Option<Option<i64>> = self
            .db
            .query_row(
                &format!("SELECT {ALBUM_ID} FROM {TRACKS} WHERE {ID} = ?1"),
                params![id.0],
                |row| row.get(0),
            )
            .optional()?;
        album_id.ok_or(CatalogError::TrackNotFound(id))
    }
}

impl Catalog for SqliteCatalog {
    fn get_by_hash(&mut self, hash: &ContentHash) -> Result<Option<Track>, CatalogError> {
        let row = self
            .db
            .query_row(
                &format!("{} WHERE t.{HASH} = ?1", Self::track_select()),
                params![hash.to_hex()],
                Self::track_from_row,
            )
            .optional()?;

        row.map(|row| self.with_links(row)).transpose()
    }

    fn insert_track(&mut self, track: &Track) -> Result<TrackId, CatalogError> {
        let tx = self.db.transaction()?;

        let album_id = match &track.album {
            Some(album) if !album.name.trim().is_empty() => {
                let album_id = Self::upsert_named(&tx, ALBUMS, &album.name)?;
                // an album cover carried by the track wins over what was stored
                tx.execute(
                    &format!(
                        "UPDATE {ALBUMS}
                         SET {COVER_HIGH} = COALESCE(?1, {COVER_HIGH}),
                             {COVER_LOW} = COALESCE(?2, {COVER_LOW})
                         WHERE {ID} = ?3"
                    ),
                    params![album.cover.high, album.cover.low, album_id],
                )?;
                Some(album_id)
            }
            _ => None,
        };

        tx.execute(
            &format!(
                "INSERT INTO {TRACKS}
                 ({HASH}, {PATH}, {ORIGIN}, {TITLE}, {DURATION}, {ALBUM_ID}, {COVER_HIGH}, {COVER_LOW})
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)"
            ),
            params![
                track.hash.to_hex(),
                track.path.as_ref().map(|p| p.to_string_lossy().to_string()),
                track.origin.as_tag(),
                track.title,
                track.duration_secs.map(|d| d as i64),
                album_id,
                track.cover.high,
                track.cover.low,
            ],
        )?;
        let track_id = tx.last_insert_rowid();

        for artist in track.artists.iter().filter(|a| !a.trim().is_empty()) {
            let artist_id = Self::upsert_named(&tx, ARTISTS, artist)?;
            tx.execute(
                &format!("INSERT OR IGNORE INTO {TRACK_ARTISTS} ({TRACK_ID}, {ARTIST_ID}) VALUES (?1, ?2)"),
                params![track_id, artist_id],
            )?;
        }

        for genre in track.genres.iter().filter(|g| !g.trim().is_empty()) {
            let genre_id = Self::upsert_named(&tx, GENRES, genre)?;
            tx.execute(
                &format!("INSERT OR IGNORE INTO {TRACK_GENRES} ({TRACK_ID}, {GENRE_ID}) VALUES (?1, ?2)"),
                params![track_id, genre_id],
            )?;
        }

        tx.commit()?;
        Ok(TrackId(track_id))
    }

    fn update_song_cover(&mut self, id: TrackId, high: &str, low: &str) -> Result<(), CatalogError> {
        let changed = self.db.execute(
            &format!("UPDATE {TRACKS} SET {COVER_HIGH} = ?1, {COVER_LOW} = ?2 WHERE {ID} = ?3"),
            params![high, low, id.0],
        )?;
        if changed == 0 {
            return Err(CatalogError::TrackNotFound(id));
        }
        Ok(())
    }

    fn album_cover(&mut self, album: &str) -> Result<Option<CoverPair>, CatalogError> {
        Ok(self
            .db
            .query_row(
                &format!("SELECT {COVER_HIGH}, {COVER_LOW} FROM {ALBUMS} WHERE {NAME} = ?1"),
                params![album],
                |row| {
                    Ok(CoverPair {
                        high: row.get(0)?,
                        low: row.get(1)?,
                    })
                },
            )
            .optional()?)
    }

    fn update_album_cover(&mut self, id: TrackId, high: &str, low: &str) -> Result<(), CatalogError> {
        let Some(album_id) = self.album_id_of(id)? else {
            log::debug!("track {id} has no album, skipping album cover update");
            return Ok(());
        };
        self.db.execute(
            &format!("UPDATE {ALBUMS} SET {COVER_HIGH} = ?1, {COVER_LOW} = ?2 WHERE {ID} = ?3"),
            params![high, low, album_id],
        )?;
        Ok(())
    }

    fn list_tracks(&mut self) -> Result<Vec<Track>, CatalogError> {
        let rows = {
            let mut stmt = self.db.prepare(&format!("{} ORDER BY t.{ID}", Self::track_select()))?;
            stmt.query_map([], Self::track_from_row)?
                .collect::<Result<Vec<_>, _>>()?
        };

        rows.into_iter().map(|row| self.with_links(row)).collect()
    }

    fn remove_track(&mut self, id: TrackId) -> Result<(), CatalogError> {
        let removed = self.db.execute(
            &format!("DELETE FROM {TRACKS} WHERE {ID} = ?1"),
            params![id.0],
        )?;
        if removed == 0 {
            return Err(CatalogError::TrackNotFound(id));
        }
        Ok(())
    }

    fn count_tracks(&mut self) -> Result<usize, CatalogError> {
        let count: i64 =
            self.db
                .query_row(&format!("SELECT COUNT(*) FROM {TRACKS}"), [], |row| row.get(0))?;
        Ok(count.max(0) as usize)
    }

    fn list_artists(&mut self) -> Result<Vec<Artist>, CatalogError> {
        let mut stmt = self.db.prepare(&format!(
            "SELECT {ID}, {NAME}, {EXTERNAL_ID}, {COVER_PATH} FROM {ARTISTS} ORDER BY {ID}"
        ))?;
        let artists = stmt
            .query_map([], |row| {
                Ok(Artist {
                    id: ArtistId(row.get(0)?),
                    name: row.get(1)?,
                    external_id: row.get(2)?,
                    cover_path: row.get(3)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(artists)
    }

    fn update_artist(&mut self, artist: &Artist) -> Result<(), CatalogError> {
        let changed = self.db.execute(
            &format!(
                "UPDATE {ARTISTS} SET {NAME} = ?1, {EXTERNAL_ID} = ?2, {COVER_PATH} = ?3 WHERE {ID} = ?4"
            ),
            params![artist.name, artist.external_id, artist.cover_path, artist.id.0],
        )?;
        if changed == 0 {
            return Err(CatalogError::ArtistNotFound(artist.id));
        }
        Ok(())
    }

    fn recompute_counts(&mut self) -> Result<(), CatalogError> {
        let tx = self.db.transaction()?;
        tx.execute(
            &format!(
                "UPDATE {ALBUMS} SET {SONG_COUNT} =
                 (SELECT COUNT(*) FROM {TRACKS} t WHERE t.{ALBUM_ID} = {ALBUMS}.{ID})"
            ),
            [],
        )?;
        tx.execute(
            &format!(
                "UPDATE {ARTISTS} SET {SONG_COUNT} =
                 (SELECT COUNT(*) FROM {TRACK_ARTISTS} l WHERE l.{ARTIST_ID} = {ARTISTS}.{ID})"
            ),
            [],
        )?;
        tx.execute(
            &format!(
                "UPDATE {GENRES} SET {SONG_COUNT} =
                 (SELECT COUNT(*) FROM {TRACK_GENRES} l WHERE l.{GENRE_ID} = {GENRES}.{ID})"
            ),
            [],
        )?;
        tx.execute(
            &format!(
                "UPDATE {PLAYLISTS} SET {SONG_COUNT} =
                 (SELECT COUNT(*) FROM {PLAYLIST_TRACKS} l WHERE l.{PLAYLIST_ID} = {PLAYLISTS}.{ID})"
            ),
            [],
        )?;
        tx.commit()?;
        Ok(())
    }

    fn default_cover_for_artist(&mut self, id: ArtistId) -> Result<Option<String>, CatalogError> {
        let cover: Option<Option<String>> = self
            .db
            .query_row(
                &format!(
                    "SELECT a.{COVER_HIGH} FROM {ALBUMS} a
                     JOIN {TRACKS} t ON t.{ALBUM_ID} = a.{ID}
                     JOIN {TRACK_ARTISTS} l ON l.{TRACK_ID} = t.{ID}
                     WHERE l.{ARTIST_ID} = ?1 AND a.{COVER_HIGH} IS NOT NULL
                     ORDER BY a.{ID} LIMIT 1"
                ),
                params![id.0],
                |row| row.get(0),
            )
            .optional()?;
        Ok(cover.flatten())
    }

    fn record_scan(&mut self, at: SystemTime) -> Result<(), CatalogError> {
        let time_secs = system_time_to_i64(at).map_err(CatalogError::Internal)?;
        self.db.execute(
            &format!("INSERT INTO {UPDATES} ({UPDATED_AT}) VALUES (?1)"),
            params![time_secs],
        )?;
        Ok(())
    }

    fn last_scan(&mut self) -> Result<Option<SecondsSinceUnix>, CatalogError> {
        Ok(self.db.query_row(
            &format!("SELECT MAX({UPDATED_AT}) FROM {UPDATES}"),
            [],
            |row| row.get(0),
        )?)
    }
}

#[cfg(test)]
impl SqliteCatalog {
    /// Creates a playlist holding the given tracks.
    pub(crate) fn create_playlist(&mut self, name: &str, tracks: &[TrackId]) -> Result<i64, CatalogError> {
        let tx = self.db.transaction()?;
        tx.execute(
            &format!("INSERT INTO {PLAYLISTS} ({NAME}) VALUES (?1)"),
            params![name],
        )?;
        let playlist_id = tx.last_insert_rowid();
        for track in tracks {
            tx.execute(
                &format!("INSERT OR IGNORE INTO {PLAYLIST_TRACKS} ({PLAYLIST_ID}, {TRACK_ID}) VALUES (?1, ?2)"),
                params![playlist_id, track.0],
            )?;
        }
        tx.commit()?;
        Ok(playlist_id)
    }

    /// Reads the stored song count of a named album, artist or genre.
    pub(crate) fn song_count(&self, table: &str, name: &str) -> Result<Option<i64>, CatalogError> {
        Ok(self
            .db
            .query_row(
                &format!("SELECT {SONG_COUNT} FROM {table} WHERE {NAME} = ?1"),
                params![name],
                |row| row.get(0),
            )
            .optional()?)
    }
}
