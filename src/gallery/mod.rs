/// Picture gallery on disk
///
/// Every generation lives in its own directory named by its start time:
///
/// ```text
/// Picture_Gallery/
///   20240131_174502/
///     original.png
///     x2.png
///     x4.png
/// ```
///
/// Directories are append-only: a generation is written once by the flow that
/// created it and never modified afterwards. All reads and writes of the tree
/// go through `GalleryStore`.

pub mod generation;

use chrono::{Local, NaiveDateTime, Timelike};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use crate::error::GalleryError;
use crate::inference::ScaleFactor;

/// Directory name format of a generation
const DIR_FORMAT: &str = "%Y%m%d_%H%M%S";
/// Human-readable label format of a generation
const LABEL_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

pub const ORIGINAL_FILE_NAME: &str = "original.png";

/// Identifier of one generation: its start time, to the second
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct GenerationId(NaiveDateTime);

impl GenerationId {
    pub fn from_datetime(at: NaiveDateTime) -> Self {
        Self(at.with_nanosecond(0).unwrap_or(at))
    }

    /// Identifier for a generation starting right now (local time)
    pub fn now() -> Self {
        Self::from_datetime(Local::now().naive_local())
    }

    /// Parse a directory name like `20240131_174502`
    pub fn parse(dir_name: &str) -> Result<Self, GalleryError> {
        NaiveDateTime::parse_from_str(dir_name, DIR_FORMAT)
            .map(Self)
            .map_err(|_| GalleryError::InvalidTimestamp(dir_name.to_string()))
    }

    pub fn dir_name(&self) -> String {
        self.0.format(DIR_FORMAT).to_string()
    }

    /// Label shown in the generation selector, e.g. `2024-01-31 17:45:02`
    pub fn label(&self) -> String {
        self.0.format(LABEL_FORMAT).to_string()
    }
}

impl fmt::Display for GenerationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.label())
    }
}

/// What a gallery file holds, derived from its name
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileKind {
    Original,
    Upscaled(ScaleFactor),
}

impl FileKind {
    pub fn from_file_name(name: &str) -> Option<Self> {
        if name == ORIGINAL_FILE_NAME {
            return Some(FileKind::Original);
        }
        ScaleFactor::ALL
            .into_iter()
            .find(|scale| scale.file_name() == name)
            .map(FileKind::Upscaled)
    }

    /// Size multiplier relative to the original (1 for the original itself)
    pub fn scale(&self) -> u32 {
        match self {
            FileKind::Original => 1,
            FileKind::Upscaled(scale) => scale.factor(),
        }
    }
}

/// One picture of a generation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GalleryFile {
    pub path: PathBuf,
    pub kind: FileKind,
}

impl GalleryFile {
    /// Base name shown as caption and used as download name
    pub fn file_name(&self) -> String {
        self.path
            .file_name()
            .map(|name| name.to_string_lossy().to_string())
            .unwrap_or_default()
    }
}

/// The gallery directory tree
#[derive(Debug, Clone)]
pub struct GalleryStore {
    root: PathBuf,
}

impl GalleryStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn generation_dir(&self, id: &GenerationId) -> PathBuf {
        self.root.join(id.dir_name())
    }

    pub fn original_path(&self, id: &GenerationId) -> PathBuf {
        self.generation_dir(id).join(ORIGINAL_FILE_NAME)
    }

    /// All generations holding at least one PNG, most recent first.
    /// A gallery that was never written to has no generations.
    pub fn list_generations(&self) -> Result<Vec<GenerationId>, GalleryError> {
        if !self.root.is_dir() {
            return Ok(Vec::new());
        }

        let mut generations = Vec::new();
        for entry in WalkDir::new(&self.root).min_depth(1).max_depth(1) {
            let entry = entry?;
            if !entry.file_type().is_dir() {
                continue;
            }

            let name = entry.file_name().to_string_lossy();
            let id = match GenerationId::parse(&name) {
                Ok(id) => id,
                Err(_) => {
                    tracing::debug!("Skipping non-generation directory {}", entry.path().display());
                    continue;
                }
            };

            if png_files(entry.path())?.is_empty() {
                continue;
            }
            generations.push(id);
        }

        generations.sort_unstable_by(|a, b| b.cmp(a));
        Ok(generations)
    }

    /// Pictures of one generation, sorted by path
    pub fn list_files(&self, id: &GenerationId) -> Result<Vec<GalleryFile>, GalleryError> {
        let dir = self.generation_dir(id);
        if !dir.is_dir() {
            return Err(GalleryError::io(
                &dir,
                std::io::Error::new(std::io::ErrorKind::NotFound, "generation directory missing"),
            ));
        }

        let files = png_files(&dir)?
            .into_iter()
            .filter_map(|path| {
                let name = path.file_name()?.to_string_lossy().to_string();
                match FileKind::from_file_name(&name) {
                    Some(kind) => Some(GalleryFile { path, kind }),
                    None => {
                        tracing::debug!("Ignoring unrecognised gallery file {}", path.display());
                        None
                    }
                }
            })
            .collect();
        Ok(files)
    }

    /// Read a gallery file
    pub fn open(&self, path: &Path) -> Result<Vec<u8>, GalleryError> {
        fs::read(path).map_err(|e| GalleryError::io(path, e))
    }

    /// Write one file of a generation, creating its directory on demand
    pub fn save(&self, id: &GenerationId, file_name: &str, bytes: &[u8]) -> Result<PathBuf, GalleryError> {
        let dir = self.generation_dir(id);
        fs::create_dir_all(&dir).map_err(|e| GalleryError::io(&dir, e))?;

        let path = dir.join(file_name);
        fs::write(&path, bytes).map_err(|e| GalleryError::io(&path, e))?;

        tracing::info!("💾 Saved {} ({} KB)", path.display(), bytes.len() / 1024);
        Ok(path)
    }

    /// Copy a gallery file somewhere outside the gallery
    pub fn export(&self, path: &Path, destination: &Path) -> Result<(), GalleryError> {
        fs::copy(path, destination).map_err(|e| GalleryError::io(destination, e))?;
        tracing::info!("📤 Exported {} to {}", path.display(), destination.display());
        Ok(())
    }
}

/// PNG files directly inside `dir`, sorted by path
fn png_files(dir: &Path) -> Result<Vec<PathBuf>, GalleryError> {
    let mut files = Vec::new();
    for entry in WalkDir::new(dir).min_depth(1).max_depth(1) {
        let entry = entry?;
        if !entry.file_type().is_file() {
            continue;
        }

        let is_png = entry
            .path()
            .extension()
            .map(|ext| ext.to_string_lossy().eq_ignore_ascii_case("png"))
            .unwrap_or(false);
        if is_png {
            files.push(entry.into_path());
        }
    }

    files.sort();
    Ok(files)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn id(h: u32, m: u32, s: u32) -> GenerationId {
        let at = NaiveDate::from_ymd_opt(2023, 5, 17)
            .unwrap()
            .and_hms_opt(h, m, s)
            .unwrap();
        GenerationId::from_datetime(at)
    }

    #[test]
    fn test_generation_id_formats() {
        let id = id(9, 3, 7);
        assert_eq!(id.dir_name(), "20230517_090307");
        assert_eq!(id.label(), "2023-05-17 09:03:07");
        assert_eq!(GenerationId::parse("20230517_090307").unwrap(), id);
        assert!(GenerationId::parse("holiday pics").is_err());
    }

    #[test]
    fn test_generation_id_drops_subseconds() {
        let at = NaiveDate::from_ymd_opt(2023, 5, 17)
            .unwrap()
            .and_hms_milli_opt(9, 3, 7, 450)
            .unwrap();
        let id = GenerationId::from_datetime(at);
        assert_eq!(GenerationId::parse(&id.dir_name()).unwrap(), id);
    }

    #[test]
    fn test_file_kinds() {
        assert_eq!(FileKind::from_file_name("original.png"), Some(FileKind::Original));
        assert_eq!(FileKind::from_file_name("x8.png"), Some(FileKind::Upscaled(ScaleFactor::X8)));
        assert_eq!(FileKind::from_file_name("x3.png"), None);
        assert_eq!(FileKind::Original.scale(), 1);
        assert_eq!(FileKind::Upscaled(ScaleFactor::X4).scale(), 4);
    }

    #[test]
    fn test_empty_gallery_has_no_generations() {
        let dir = tempfile::tempdir().unwrap();
        let store = GalleryStore::new(dir.path().join("Picture_Gallery"));
        assert!(store.list_generations().unwrap().is_empty());

        fs::create_dir_all(store.root()).unwrap();
        assert!(store.list_generations().unwrap().is_empty());
    }

    #[test]
    fn test_generations_most_recent_first() {
        let dir = tempfile::tempdir().unwrap();
        let store = GalleryStore::new(dir.path());

        for id in [id(10, 0, 0), id(12, 30, 0), id(11, 15, 0)] {
            store.save(&id, ORIGINAL_FILE_NAME, b"png").unwrap();
        }

        assert_eq!(
            store.list_generations().unwrap(),
            vec![id(12, 30, 0), id(11, 15, 0), id(10, 0, 0)]
        );
    }

    #[test]
    fn test_generations_without_png_are_hidden() {
        let dir = tempfile::tempdir().unwrap();
        let store = GalleryStore::new(dir.path());

        store.save(&id(10, 0, 0), "notes.txt", b"hello").unwrap();
        fs::create_dir_all(dir.path().join("not_a_timestamp")).unwrap();
        fs::write(dir.path().join("not_a_timestamp").join("original.png"), b"png").unwrap();
        store.save(&id(11, 0, 0), "x2.png", b"png").unwrap();

        assert_eq!(store.list_generations().unwrap(), vec![id(11, 0, 0)]);
    }

    #[test]
    fn test_list_files_sorted_and_typed() {
        let dir = tempfile::tempdir().unwrap();
        let store = GalleryStore::new(dir.path());
        let gen = id(10, 0, 0);

        for name in ["x4.png", "original.png", "x2.png", "readme.txt", "thumb.png"] {
            store.save(&gen, name, b"data").unwrap();
        }

        let files = store.list_files(&gen).unwrap();
        let names: Vec<String> = files.iter().map(|f| f.file_name()).collect();
        assert_eq!(names, vec!["original.png", "x2.png", "x4.png"]);
        assert_eq!(files[2].kind, FileKind::Upscaled(ScaleFactor::X4));
    }

    #[test]
    fn test_list_files_of_missing_generation() {
        let dir = tempfile::tempdir().unwrap();
        let store = GalleryStore::new(dir.path());
        assert!(matches!(store.list_files(&id(1, 2, 3)), Err(GalleryError::Io { .. })));
    }

    #[test]
    fn test_save_open_export() {
        let dir = tempfile::tempdir().unwrap();
        let store = GalleryStore::new(dir.path().join("gallery"));
        let gen = id(8, 0, 0);

        let path = store.save(&gen, "x2.png", b"pixels").unwrap();
        assert_eq!(path, store.generation_dir(&gen).join("x2.png"));
        assert_eq!(store.open(&path).unwrap(), b"pixels");

        let out = dir.path().join("download.png");
        store.export(&path, &out).unwrap();
        assert_eq!(fs::read(out).unwrap(), b"pixels");
    }
}
