//! Filesystem helpers: music file discovery and reachability checks.
//!
//! Nothing here returns an error for a missing file. An inaccessible path
//! is simply reported as absent.

use walkdir::WalkDir;

use std::path::{Path, PathBuf};

use crate::domain::track::CoverPair;

const MUSIC_EXTENSIONS: &[&str] = &["mp3", "flac", "wav", "m4a", "ogg", "aac", "opus"];

pub fn is_music_file(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| MUSIC_EXTENSIONS.contains(&ext.to_lowercase().as_str()))
        .unwrap_or(false)
}

pub fn is_remote(path: &str) -> bool {
    path.starts_with("http")
}

/// Whether a file is currently accessible on disk.
pub fn file_exists(path: &Path) -> bool {
    match std::fs::metadata(path) {
        Ok(_) => true,
        Err(e) => {
            log::debug!("{} not accessible: {e}", path.to_string_lossy());
            false
        }
    }
}

/// Whether a cover path points to a local image that is still there.
///
/// Remote URLs never count: a cover that only exists online gets replaced
/// by a local one whenever a local image is available.
pub fn cover_exists(path: Option<&str>) -> bool {
    match path {
        Some(path) if !is_remote(path) => file_exists(Path::new(path)),
        _ => false,
    }
}

/// Both resolutions of the pair are reachable.
pub fn cover_pair_exists(pair: &CoverPair) -> bool {
    cover_exists(pair.high.as_deref()) && cover_exists(pair.low.as_deref())
}

/// Lazily walks the given roots and yields music files.
///
/// Unreadable entries are logged and skipped, ignored directories are not descended into.
pub fn walk_music_files<'a>(
    roots: &'a [PathBuf],
    follow_symlinks: bool,
    ignored_dirs: &'a [PathBuf],
) -> impl Iterator<Item = PathBuf> + 'a {
    roots.iter().flat_map(move |root| {
        let root_str = root.to_string_lossy().to_string();
        WalkDir::new(root)
            .follow_links(follow_symlinks)
            .into_iter()
            // keep the entry if it's not inside any ignored directory
            .filter_entry(move |entry| {
                !ignored_dirs
                    .iter()
                    .any(|ignored| entry.path().starts_with(ignored))
            })
            .filter_map(move |e| match e {
                Ok(e) => Some(e),
                Err(err) => {
                    log::warn!("error while scanning dir {root_str}, skipping an entry: {err}");
                    None
                }
            })
            .filter(|e| e.file_type().is_file())
            .map(|e| e.into_path())
            .filter(|path| is_music_file(path))
    })
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use tempfile::TempDir;

    use crate::{
        domain::track::CoverPair,
        storage::fs::{cover_exists, cover_pair_exists, file_exists, walk_music_files},
    };

    #[test]
    fn walk_finds_music_files() {
        let tmp = TempDir::new().unwrap();
        let root_path = tmp.path().to_path_buf();

        let song1 = root_path.join("song1.mp3");
        let song2 = root_path.join("song2.FLAC");
        let not_music = root_path.join("notes.txt");

        std::fs::write(&song1, b"aaa").unwrap();
        std::fs::write(&song2, b"bbb").unwrap();
        std::fs::write(&not_music, b"ccc").unwrap();

        let roots = vec![root_path];
        let files: Vec<_> = walk_music_files(&roots, false, &[]).collect();

        assert_eq!(files.len(), 2);
        assert!(files.contains(&song1));
        assert!(files.contains(&song2));
    }

    #[test]
    fn walk_covers_multiple_roots() {
        let dir1 = TempDir::new().unwrap();
        let dir2 = TempDir::new().unwrap();

        let song1 = dir1.path().join("a.mp3");
        let song2 = dir2.path().join("nested").join("b.ogg");
        std::fs::create_dir_all(song2.parent().unwrap()).unwrap();

        std::fs::write(&song1, b"song one").unwrap();
        std::fs::write(&song2, b"song two").unwrap();

        let roots = vec![dir1.path().to_path_buf(), dir2.path().to_path_buf()];
        let files: Vec<_> = walk_music_files(&roots, false, &[]).collect();

        assert_eq!(files.len(), 2);
        assert!(files.contains(&song1));
        assert!(files.contains(&song2));
    }

    #[test]
    fn walk_respects_ignored_dirs() {
        let tmp = TempDir::new().unwrap();
        let root = tmp.path();

        let song1 = root.join("song1.mp3");
        let ignored_dir = root.join("ignored");
        std::fs::create_dir_all(&ignored_dir).unwrap();
        let ignored_song = ignored_dir.join("ignored_song.mp3");

        std::fs::write(&song1, b"aaa").unwrap();
        std::fs::write(&ignored_song, b"ccc").unwrap();

        let roots = vec![root.to_path_buf()];
        let ignored = vec![ignored_dir];
        let files: Vec<_> = walk_music_files(&roots, false, &ignored).collect();

        assert_eq!(files, vec![song1]);
    }

    #[test]
    fn walk_skips_missing_root() {
        let roots = vec![PathBuf::from("/definitely/not/a/root")];
        assert_eq!(walk_music_files(&roots, false, &[]).count(), 0);
    }

    #[test]
    fn cover_checks() {
        let tmp = TempDir::new().unwrap();
        let high = tmp.path().join("x-high.png");
        let low = tmp.path().join("x-low.png");
        std::fs::write(&high, b"png").unwrap();

        let high_str = high.to_string_lossy().to_string();
        let low_str = low.to_string_lossy().to_string();

        assert!(file_exists(&high));
        assert!(cover_exists(Some(&high_str)));
        assert!(!cover_exists(Some(&low_str)));
        assert!(!cover_exists(None));
        assert!(!cover_exists(Some("https://example.com/cover.jpg")));

        let pair = CoverPair::new(high_str.clone(), low_str.clone());
        assert!(!cover_pair_exists(&pair));

        std::fs::write(&low, b"png").unwrap();
        assert!(cover_pair_exists(&pair));
    }
}
