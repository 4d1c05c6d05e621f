use rusqlite::Connection;

pub mod tables {
    pub const TRACKS: &str = "tracks";
    pub const ALBUMS: &str = "albums";
    pub const ARTISTS: &str = "artists";
    pub const TRACK_ARTISTS: &str = "track_artists";
    pub const GENRES: &str = "genres";
    pub const TRACK_GENRES: &str = "track_genres";
    pub const PLAYLISTS: &str = "playlists";
    pub const PLAYLIST_TRACKS: &str = "playlist_tracks";
    pub const UPDATES: &str = "updates";

    pub const ALL_TABLES: &[&str] = &[
        TRACKS,
        ALBUMS,
        ARTISTS,
        TRACK_ARTISTS,
        GENRES,
        TRACK_GENRES,
        PLAYLISTS,
        PLAYLIST_TRACKS,
        UPDATES,
    ];
}

pub mod columns {
    pub const ID: &str = "id";
    pub const HASH: &str = "hash";
    pub const PATH: &str = "path";
    pub const ORIGIN: &str = "origin";
    pub const TITLE: &str = "title";
    pub const DURATION: &str = "duration";
    pub const ALBUM_ID: &str = "album_id";
    pub const COVER_HIGH: &str = "cover_high";
    pub const COVER_LOW: &str = "cover_low";
    pub const NAME: &str = "name";
    pub const EXTERNAL_ID: &str = "external_id";
    pub const COVER_PATH: &str = "cover_path";
    pub const SONG_COUNT: &str = "song_count";
    pub const TRACK_ID: &str = "track_id";
    pub const ARTIST_ID: &str = "artist_id";
    pub const GENRE_ID: &str = "genre_id";
    pub const PLAYLIST_ID: &str = "playlist_id";
    pub const UPDATED_AT: &str = "updated_at";
}

pub use columns::*;
pub use tables::*;

const SCHEMA: &str = r#"
PRAGMA foreign_keys = ON;

CREATE TABLE IF NOT EXISTS albums (
    id INTEGER PRIMARY KEY,
    name TEXT NOT NULL UNIQUE,
    cover_high TEXT,
    cover_low TEXT,
    song_count INTEGER NOT NULL DEFAULT 0
);

CREATE TABLE IF NOT EXISTS tracks (
    id INTEGER PRIMARY KEY,
    hash TEXT NOT NULL UNIQUE,
    path TEXT,
    origin TEXT NOT NULL,
    title TEXT NOT NULL,
    duration INTEGER,
    album_id INTEGER REFERENCES albums(id),
    cover_high TEXT,
    cover_low TEXT
);

CREATE TABLE IF NOT EXISTS artists (
    id INTEGER PRIMARY KEY,
    name TEXT NOT NULL UNIQUE,
    external_id TEXT,
    cover_path TEXT,
    song_count INTEGER NOT NULL DEFAULT 0
);

CREATE TABLE IF NOT EXISTS track_artists (
    track_id INTEGER NOT NULL REFERENCES tracks(id) ON DELETE CASCADE,
    artist_id INTEGER NOT NULL REFERENCES artists(id),
    PRIMARY KEY (track_id, artist_id)
);

CREATE TABLE IF NOT EXISTS genres (
    id INTEGER PRIMARY KEY,
    name TEXT NOT NULL UNIQUE,
    song_count INTEGER NOT NULL DEFAULT 0
);

CREATE TABLE IF NOT EXISTS track_genres (
    track_id INTEGER NOT NULL REFERENCES tracks(id) ON DELETE CASCADE,
    genre_id INTEGER NOT NULL REFERENCES genres(id),
    PRIMARY KEY (track_id, genre_id)
);

CREATE TABLE IF NOT EXISTS playlists (
    id INTEGER PRIMARY KEY,
    name TEXT NOT NULL,
    song_count INTEGER NOT NULL DEFAULT 0
);

CREATE TABLE IF NOT EXISTS playlist_tracks (
    playlist_id INTEGER NOT NULL REFERENCES playlists(id) ON DELETE CASCADE,
    track_id INTEGER NOT NULL REFERENCES tracks(id) ON DELETE CASCADE,
    PRIMARY KEY (playlist_id, track_id)
);

CREATE TABLE IF NOT EXISTS updates (
    updated_at INTEGER NOT NULL
);
"#;

pub fn init(conn: &Connection) -> Result<(), rusqlite::Error> {
    conn.execute_batch(SCHEMA)
}
