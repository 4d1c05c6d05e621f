use std::fmt::Display;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ArtistId(pub i64);

impl Display for ArtistId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Artist row. Created by the catalog as a side effect of storing tracks,
/// filled in later by enrichment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Artist {
    pub id: ArtistId,
    pub name: String,
    /// identifier in the external metadata service, once resolved
    pub external_id: Option<String>,
    pub cover_path: Option<String>,
}
