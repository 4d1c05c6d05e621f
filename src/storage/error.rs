use thiserror::Error;

use crate::domain::{artist::ArtistId, track::TrackId};

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("track {0} not found")]
    TrackNotFound(TrackId),

    #[error("artist {0} not found")]
    ArtistNotFound(ArtistId),

    #[error("internal error: {0}")]
    Internal(#[from] anyhow::Error),
}
