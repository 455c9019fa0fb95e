//! `.xue` container access: metadata load, asset extraction, atomic write-back.
//!
//! A container is a zip archive holding `metadata.json` plus named binary
//! entries (`instruction.<ext>`, `native.<ext>`, `image.<ext>`, ...). Writers
//! only ever replace `metadata.json`; every other entry is raw-copied so its
//! compressed bytes survive untouched.

use std::fs::{self, File};
use std::io::{self, BufReader, Read, Write};
use std::path::{Path, PathBuf};

use log::{debug, warn};
use tempfile::NamedTempFile;
use zip::result::ZipError;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

use crate::domain::LearningObject;
use crate::error::{Result, XueError};
use crate::scratch;

/// Name of the metadata entry inside every container
pub const METADATA_ENTRY: &str = "metadata.json";

/// Well-known asset names; entries are matched by file stem
pub mod assets {
    pub const INSTRUCTION: &str = "instruction";
    pub const NATIVE: &str = "native";
    pub const IMAGE: &str = "image";
}

type Archive = ZipArchive<BufReader<File>>;

fn open_archive(path: &Path) -> Result<Archive> {
    let file = File::open(path).map_err(|e| match e.kind() {
        io::ErrorKind::NotFound => XueError::NotFound(path.to_path_buf()),
        _ => XueError::Io(e),
    })?;
    ZipArchive::new(BufReader::new(file)).map_err(|e| XueError::corrupt(path, e))
}

fn zip_io(err: ZipError) -> XueError {
    match err {
        ZipError::Io(e) => XueError::Io(e),
        other => XueError::Io(io::Error::other(other.to_string())),
    }
}

fn metadata_options() -> SimpleFileOptions {
    SimpleFileOptions::default().compression_method(CompressionMethod::Deflated)
}

/// Resolve an asset name to an entry name.
///
/// Exact entry names win; otherwise the first non-metadata entry whose file
/// stem equals `asset` is used (`native` matches `native.mp3`).
fn find_entry(archive: &Archive, asset: &str) -> Option<String> {
    if asset != METADATA_ENTRY && archive.index_for_name(asset).is_some() {
        return Some(asset.to_string());
    }
    archive
        .file_names()
        .filter(|name| *name != METADATA_ENTRY && !name.ends_with('/'))
        .find(|name| {
            Path::new(name)
                .file_stem()
                .map(|stem| stem == asset)
                .unwrap_or(false)
        })
        .map(str::to_string)
}

/// Load a learning object's metadata from its container.
pub fn load(path: impl AsRef<Path>) -> Result<LearningObject> {
    let path = path.as_ref();
    let mut archive = open_archive(path)?;

    let mut json = String::new();
    match archive.by_name(METADATA_ENTRY) {
        Ok(mut entry) => {
            entry
                .read_to_string(&mut json)
                .map_err(|e| XueError::corrupt(path, e))?;
        }
        Err(ZipError::FileNotFound) => return Err(XueError::NotFound(path.join(METADATA_ENTRY))),
        Err(e) => return Err(XueError::corrupt(path, e)),
    }

    let mut object: LearningObject =
        serde_json::from_str(&json).map_err(|e| XueError::corrupt(path, e))?;
    object.path = path.to_path_buf();

    if object.schema_version > crate::domain::CURRENT_SCHEMA_VERSION {
        warn!(
            "{} has schema version {}, newer than supported {}",
            path.display(),
            object.schema_version,
            crate::domain::CURRENT_SCHEMA_VERSION
        );
    }
    Ok(object)
}

/// List entry names in a container (metadata included).
pub fn entry_names(path: impl AsRef<Path>) -> Result<Vec<String>> {
    let archive = open_archive(path.as_ref())?;
    Ok(archive.file_names().map(str::to_string).collect())
}

/// Whether the container carries the named asset.
pub fn has_asset(path: impl AsRef<Path>, asset: &str) -> Result<bool> {
    let archive = open_archive(path.as_ref())?;
    Ok(find_entry(&archive, asset).is_some())
}

/// Copy one embedded asset into `dest_dir` under a collision-free name.
///
/// Returns `AssetMissing` when the container has no such entry. A partially
/// written file is removed before returning any other error.
pub fn extract_asset(path: impl AsRef<Path>, asset: &str, dest_dir: impl AsRef<Path>) -> Result<PathBuf> {
    let path = path.as_ref();
    let dest_dir = dest_dir.as_ref();
    let mut archive = open_archive(path)?;

    let entry_name = find_entry(&archive, asset).ok_or_else(|| XueError::AssetMissing {
        path: path.to_path_buf(),
        asset: asset.to_string(),
    })?;

    fs::create_dir_all(dest_dir)?;
    let target = scratch::unique_path(dest_dir, &entry_name);

    let mut entry = archive
        .by_name(&entry_name)
        .map_err(|e| XueError::corrupt(path, e))?;

    let copied = File::create(&target).and_then(|mut out| {
        io::copy(&mut entry, &mut out)?;
        out.flush()
    });
    if let Err(e) = copied {
        let _ = fs::remove_file(&target);
        return Err(e.into());
    }

    debug!("Extracted {} from {} to {}", entry_name, path.display(), target.display());
    Ok(target)
}

/// Build the replacement container next to `path` without touching it.
///
/// The returned temp file is deleted on drop unless persisted.
pub(crate) fn stage_metadata(path: &Path, object: &LearningObject) -> Result<NamedTempFile> {
    let mut archive = open_archive(path)?;
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };

    let staged = tempfile::Builder::new()
        .prefix(".xue-")
        .suffix(".tmp")
        .tempfile_in(dir)?;
    let mut writer = ZipWriter::new(staged);

    for index in 0..archive.len() {
        let entry = archive.by_index_raw(index).map_err(zip_io)?;
        if entry.name() == METADATA_ENTRY {
            continue;
        }
        writer.raw_copy_file(entry).map_err(zip_io)?;
    }

    let json = serde_json::to_string_pretty(object)?;
    writer.start_file(METADATA_ENTRY, metadata_options()).map_err(zip_io)?;
    writer.write_all(json.as_bytes())?;

    let staged = writer.finish().map_err(zip_io)?;
    staged.as_file().sync_all()?;
    Ok(staged)
}

/// Atomically replace the metadata entry of an existing container.
///
/// Readers of `path` see either the old container or the new one, never a
/// partial file. On failure the original is untouched and the staging file
/// is removed. Every failure is `Io`, including a container that has vanished.
pub fn save_metadata(path: impl AsRef<Path>, object: &LearningObject) -> Result<()> {
    let path = path.as_ref();
    let staged = stage_metadata(path, object).map_err(|e| match e {
        XueError::NotFound(missing) => XueError::Io(io::Error::new(
            io::ErrorKind::NotFound,
            format!("container {} no longer exists", missing.display()),
        )),
        other => other,
    })?;
    staged.persist(path).map_err(|e| XueError::Io(e.error))?;
    debug!("Saved metadata for {}", path.display());
    Ok(())
}

/// Load, flip the flag, save. Returns the new flag value.
pub fn toggle_flag(path: impl AsRef<Path>) -> Result<bool> {
    let path = path.as_ref();
    let mut object = load(path)?;
    let flagged = object.toggle_flag();
    save_metadata(path, &object)?;
    Ok(flagged)
}

/// Write a brand-new container with the given metadata and assets.
///
/// Used by importers and fixtures; goes through the same temp-and-rename path
/// as `save_metadata`.
pub fn create_container(path: impl AsRef<Path>, object: &LearningObject, entries: &[(&str, &[u8])]) -> Result<()> {
    let path = path.as_ref();
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    fs::create_dir_all(dir)?;

    let staged = tempfile::Builder::new()
        .prefix(".xue-")
        .suffix(".tmp")
        .tempfile_in(dir)?;
    let mut writer = ZipWriter::new(staged);

    let json = serde_json::to_string_pretty(object)?;
    writer.start_file(METADATA_ENTRY, metadata_options()).map_err(zip_io)?;
    writer.write_all(json.as_bytes())?;

    // audio is already compressed
    let stored = SimpleFileOptions::default().compression_method(CompressionMethod::Stored);
    for (name, bytes) in entries {
        writer.start_file(*name, stored).map_err(zip_io)?;
        writer.write_all(bytes)?;
    }

    let staged = writer.finish().map_err(zip_io)?;
    staged.as_file().sync_all()?;
    staged.persist(path).map_err(|e| XueError::Io(e.error))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use tempfile::TempDir;

    const NATIVE: &[u8] = b"ID3\x04native-audio-bytes\x00\x01\x02";
    const INSTRUCTION: &[u8] = b"ID3\x04instruction-audio-bytes";
    const IMAGE: &[u8] = b"\x89PNG\r\n\x1a\nimage";

    fn fixture(dir: &TempDir, name: &str) -> PathBuf {
        let path = dir.path().join(name);
        let object = LearningObject::new("hello", "nǐ hǎo", "你好").with_tags(["greeting"]);
        create_container(
            &path,
            &object,
            &[
                ("instruction.mp3", INSTRUCTION),
                ("native.mp3", NATIVE),
                ("image.png", IMAGE),
            ],
        )
        .unwrap();
        path
    }

    fn read_entry(path: &Path, name: &str) -> Vec<u8> {
        let mut archive = open_archive(path).unwrap();
        let mut entry = archive.by_name(name).unwrap();
        let mut buf = Vec::new();
        entry.read_to_end(&mut buf).unwrap();
        buf
    }

    #[test]
    fn test_load_sets_path_and_fields() {
        let dir = TempDir::new().unwrap();
        let path = fixture(&dir, "hello.xue");

        let lo = load(&path).unwrap();
        assert_eq!(lo.path, path);
        assert_eq!(lo.prompt_text, "hello");
        assert_eq!(lo.native_text, "你好");
        assert_eq!(lo.tags, vec!["greeting"]);
    }

    #[test]
    fn test_load_missing_file() {
        let dir = TempDir::new().unwrap();
        let err = load(dir.path().join("nope.xue")).unwrap_err();
        assert!(matches!(err, XueError::NotFound(_)));
    }

    #[test]
    fn test_load_missing_metadata_entry() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("bare.xue");
        let file = File::create(&path).unwrap();
        let mut writer = ZipWriter::new(file);
        writer.start_file("native.mp3", SimpleFileOptions::default()).unwrap();
        writer.write_all(NATIVE).unwrap();
        writer.finish().unwrap();

        let err = load(&path).unwrap_err();
        assert!(matches!(err, XueError::NotFound(_)));
    }

    #[test]
    fn test_load_not_a_zip_is_corrupt() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("junk.xue");
        fs::write(&path, b"definitely not a zip archive").unwrap();

        let err = load(&path).unwrap_err();
        assert!(matches!(err, XueError::Corrupt { .. }));
    }

    #[test]
    fn test_load_bad_json_is_corrupt() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("badjson.xue");
        let file = File::create(&path).unwrap();
        let mut writer = ZipWriter::new(file);
        writer.start_file(METADATA_ENTRY, SimpleFileOptions::default()).unwrap();
        writer.write_all(b"{ \"english\": ").unwrap();
        writer.finish().unwrap();

        let err = load(&path).unwrap_err();
        assert!(matches!(err, XueError::Corrupt { .. }));
    }

    #[test]
    fn test_extract_asset_by_stem_and_name() {
        let dir = TempDir::new().unwrap();
        let path = fixture(&dir, "hello.xue");
        let scratch = dir.path().join("scratch");

        let by_stem = extract_asset(&path, assets::NATIVE, &scratch).unwrap();
        let by_name = extract_asset(&path, "native.mp3", &scratch).unwrap();

        assert_ne!(by_stem, by_name);
        assert_eq!(fs::read(&by_stem).unwrap(), NATIVE);
        assert_eq!(fs::read(&by_name).unwrap(), NATIVE);
        assert!(by_stem.starts_with(&scratch));
    }

    #[test]
    fn test_extract_same_asset_twice_never_collides() {
        let dir = TempDir::new().unwrap();
        let path = fixture(&dir, "hello.xue");
        let scratch = dir.path().join("scratch");

        let a = extract_asset(&path, assets::INSTRUCTION, &scratch).unwrap();
        let b = extract_asset(&path, assets::INSTRUCTION, &scratch).unwrap();
        assert_ne!(a, b);
        assert!(a.exists() && b.exists());
    }

    #[test]
    fn test_extract_missing_asset() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("native_only.xue");
        create_container(&path, &LearningObject::new("a", "b", "c"), &[("native.mp3", NATIVE)]).unwrap();

        let err = extract_asset(&path, assets::INSTRUCTION, dir.path()).unwrap_err();
        assert!(err.is_asset_missing());
        assert!(!has_asset(&path, assets::INSTRUCTION).unwrap());
        assert!(has_asset(&path, assets::NATIVE).unwrap());
    }

    #[test]
    fn test_metadata_is_not_an_asset() {
        let dir = TempDir::new().unwrap();
        let path = fixture(&dir, "hello.xue");
        let err = extract_asset(&path, "metadata", dir.path()).unwrap_err();
        assert!(err.is_asset_missing());
    }

    #[test]
    fn test_save_roundtrip_preserves_assets() {
        let dir = TempDir::new().unwrap();
        let path = fixture(&dir, "hello.xue");

        let before = load(&path).unwrap();
        save_metadata(&path, &before).unwrap();
        let after = load(&path).unwrap();

        assert!(before.same_content(&after));
        assert_eq!(read_entry(&path, "native.mp3"), NATIVE);
        assert_eq!(read_entry(&path, "instruction.mp3"), INSTRUCTION);
        assert_eq!(read_entry(&path, "image.png"), IMAGE);
    }

    #[test]
    fn test_save_updates_stats_and_keeps_unknown_entries() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("extra.xue");
        create_container(
            &path,
            &LearningObject::new("a", "b", "c"),
            &[("native.mp3", NATIVE), ("notes/tones.txt", b"tone 3 sandhi")],
        )
        .unwrap();

        let mut lo = load(&path).unwrap();
        let now = Utc::now();
        lo.record_play(now);
        save_metadata(&path, &lo).unwrap();

        let reloaded = load(&path).unwrap();
        assert_eq!(reloaded.stats.times_played, 1);
        assert_eq!(reloaded.stats.last_played, Some(now));
        assert_eq!(read_entry(&path, "notes/tones.txt"), b"tone 3 sandhi");

        let names = entry_names(&path).unwrap();
        assert_eq!(names.iter().filter(|n| *n == METADATA_ENTRY).count(), 1);
    }

    #[test]
    fn test_crash_before_rename_leaves_original_intact() {
        let dir = TempDir::new().unwrap();
        let path = fixture(&dir, "hello.xue");
        let original_bytes = fs::read(&path).unwrap();

        let mut changed = load(&path).unwrap();
        changed.prompt_text = "goodbye".to_string();
        let staged = stage_metadata(&path, &changed).unwrap();
        // leave the staged file behind as a crash would
        let leftover = staged.into_temp_path().keep().unwrap();

        assert!(leftover.exists());
        assert_eq!(fs::read(&path).unwrap(), original_bytes);
        assert_eq!(load(&path).unwrap().prompt_text, "hello");
    }

    #[test]
    fn test_failed_save_leaves_no_temp_files() {
        let dir = TempDir::new().unwrap();
        let missing = dir.path().join("gone.xue");

        let err = save_metadata(&missing, &LearningObject::new("a", "b", "c")).unwrap_err();
        assert!(matches!(err, XueError::Io(ref e) if e.kind() == io::ErrorKind::NotFound));
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[test]
    fn test_toggle_flag_persists() {
        let dir = TempDir::new().unwrap();
        let path = fixture(&dir, "hello.xue");

        assert!(toggle_flag(&path).unwrap());
        assert!(load(&path).unwrap().flagged);
        assert!(!toggle_flag(&path).unwrap());
        assert!(!load(&path).unwrap().flagged);
    }
}
