//! Song queries and their optional album context.

/// Album information attached to songs that come from an album resolution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AlbumContext {
    pub title: String,
    pub artist: String,
    pub year: Option<String>,
}

/// A free-text song query, optionally tied to an album.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SongQuery {
    pub text: String,
    pub album: Option<AlbumContext>,
}

impl SongQuery {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            album: None,
        }
    }

    pub fn with_album(mut self, album: AlbumContext) -> Self {
        self.album = Some(album);
        self
    }
}

impl std::fmt::Display for SongQuery {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.text)
    }
}

impl From<&str> for SongQuery {
    fn from(text: &str) -> Self {
        Self::new(text)
    }
}

impl From<String> for SongQuery {
    fn from(text: String) -> Self {
        Self::new(text)
    }
}
