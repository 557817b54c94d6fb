//! Metadata tagging for finished audio files.

use crate::error::Result;
use lofty::config::WriteOptions;
use lofty::file::TaggedFileExt;
use lofty::tag::{Accessor, ItemKey, ItemValue, Tag, TagExt, TagItem, TagType};
use std::path::Path;
use tracing::debug;

/// Tags written to a finished track.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TrackTags {
    pub title: String,
    pub artist: String,
    pub album: Option<String>,
    /// Release year, or a full date whose first four characters are the year.
    pub year: Option<String>,
    /// Page the audio came from.
    pub source_url: Option<String>,
}

impl TrackTags {
    /// Numeric year, if one can be read from `year`.
    pub fn numeric_year(&self) -> Option<u32> {
        self.year
            .as_deref()
            .and_then(|y| y.get(..4))
            .and_then(|y| y.parse().ok())
    }
}

/// Trait for tag writers.
pub trait TagWriter: Send + Sync {
    fn write(&self, path: &Path, tags: &TrackTags) -> Result<()>;
}

/// Writes tags with lofty.
///
/// The container's primary tag (ID3v2.4 for MP3) gets every field. Containers
/// that also accept ID3v1 receive a simplified copy.
#[derive(Debug, Default)]
pub struct LoftyTagWriter;

impl LoftyTagWriter {
    pub fn new() -> Self {
        Self
    }

    fn fill(tag: &mut Tag, tags: &TrackTags, year: Option<u32>) {
        tag.set_title(tags.title.clone());
        tag.set_artist(tags.artist.clone());
        if let Some(album) = &tags.album {
            tag.set_album(album.clone());
        }
        if let Some(year) = year {
            tag.set_year(year);
        }
    }
}

impl TagWriter for LoftyTagWriter {
    fn write(&self, path: &Path, tags: &TrackTags) -> Result<()> {
        let tagged_file = lofty::read_from_path(path)?;
        let year = tags.numeric_year();

        let mut primary = Tag::new(tagged_file.primary_tag_type());
        Self::fill(&mut primary, tags, year);
        if let Some(url) = &tags.source_url {
            primary.set_comment(url.clone());
            primary.insert(TagItem::new(
                ItemKey::AudioSourceUrl,
                ItemValue::Locator(url.clone()),
            ));
        }
        primary.save_to_path(path, WriteOptions::default())?;

        if primary.tag_type() != TagType::Id3v1
            && tagged_file.file_type().supports_tag_type(TagType::Id3v1)
        {
            let mut simple = Tag::new(TagType::Id3v1);
            Self::fill(&mut simple, tags, year);
            if let Some(url) = &tags.source_url {
                simple.set_comment(url.clone());
            }
            simple.save_to_path(path, WriteOptions::default())?;
        }

        debug!("Wrote tags to {}", path.display());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_numeric_year() {
        let mut tags = TrackTags::default();
        assert_eq!(tags.numeric_year(), None);

        tags.year = Some("1969-09-26".to_string());
        assert_eq!(tags.numeric_year(), Some(1969));

        tags.year = Some("1976".to_string());
        assert_eq!(tags.numeric_year(), Some(1976));

        tags.year = Some("n/a".to_string());
        assert_eq!(tags.numeric_year(), None);
    }

    /// A few silent MPEG-1 Layer III frames, 128 kbps at 44.1 kHz.
    fn write_silent_mp3(path: &Path) {
        let mut frame = vec![0xFF, 0xFB, 0x90, 0x64];
        frame.resize(417, 0);
        std::fs::write(path, frame.repeat(20)).unwrap();
    }

    #[test]
    fn test_mp3_gets_id3v2_and_id3v1() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("Eagles - Hotel California.mp3");
        write_silent_mp3(&path);

        let url = "https://www.youtube.com/watch?v=BciS5krYL80";
        let tags = TrackTags {
            title: "Hotel California".to_string(),
            artist: "Eagles".to_string(),
            album: Some("Hotel California".to_string()),
            year: Some("1976-12-08".to_string()),
            source_url: Some(url.to_string()),
        };
        LoftyTagWriter::new().write(&path, &tags).unwrap();

        let bytes = std::fs::read(&path).unwrap();
        assert_eq!(&bytes[..4], b"ID3\x04");
        assert_eq!(&bytes[bytes.len() - 128..bytes.len() - 125], b"TAG");

        let tagged = lofty::read_from_path(&path).unwrap();

        let v2 = tagged.tag(TagType::Id3v2).unwrap();
        assert_eq!(v2.title().as_deref(), Some("Hotel California"));
        assert_eq!(v2.artist().as_deref(), Some("Eagles"));
        assert_eq!(v2.album().as_deref(), Some("Hotel California"));
        assert_eq!(v2.year(), Some(1976));
        assert_eq!(v2.comment().as_deref(), Some(url));

        // ID3v1 fields are fixed width, so the comment is cut short
        let v1 = tagged.tag(TagType::Id3v1).unwrap();
        assert_eq!(v1.title().as_deref(), Some("Hotel California"));
        assert_eq!(v1.artist().as_deref(), Some("Eagles"));
        assert_eq!(v1.year(), Some(1976));
        let comment = v1.comment().unwrap();
        assert!(!comment.is_empty());
        assert!(url.starts_with(&*comment));
    }

    #[test]
    fn test_unreadable_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("not-audio.mp3");
        std::fs::write(&path, b"definitely not audio").unwrap();

        let tags = TrackTags {
            title: "Hotel California".to_string(),
            artist: "Eagles".to_string(),
            ..TrackTags::default()
        };
        assert!(LoftyTagWriter::new().write(&path, &tags).is_err());
    }
}
