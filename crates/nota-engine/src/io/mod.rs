use relative_path::{RelativePath, RelativePathBuf};
use std::fs;
use std::path::{Path, PathBuf};

use crate::models::NoteFile;

/// Extension of note files, without the dot.
pub const NOTE_EXTENSION: &str = "nd";

#[derive(Debug, thiserror::Error)]
pub enum IoError {
    #[error("File not found: {0}")]
    NotFound(PathBuf),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Invalid notes directory: {0}")]
    InvalidNotesDir(String),
    #[error("Invalid note id: {0}")]
    InvalidNoteId(String),
}

/// Where note text comes from. Ids are `/`-separated paths without the
/// extension, e.g. `tools/git`.
pub trait NoteStore {
    /// All note ids, sorted.
    fn list(&self) -> Result<Vec<NoteFile>, IoError>;

    fn read(&self, id: &str) -> Result<String, IoError>;

    /// Every note as `(id, text)`, in `list` order.
    fn load_all(&self) -> Result<Vec<(String, String)>, IoError> {
        self.list()?
            .into_iter()
            .map(|file| {
                let text = self.read(file.id())?;
                Ok((file.id().to_owned(), text))
            })
            .collect()
    }
}

/// Notes stored as `*.nd` files below a root directory.
#[derive(Debug, Clone)]
pub struct LocalStore {
    root: PathBuf,
}

impl LocalStore {
    pub fn open(root: impl Into<PathBuf>) -> Result<Self, IoError> {
        let root = root.into();
        validate_notes_dir(&root)?;
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn write(&self, id: &str, content: &str) -> Result<(), IoError> {
        write_file(&note_path(id)?, &self.root, content)
    }
}

impl NoteStore for LocalStore {
    fn list(&self) -> Result<Vec<NoteFile>, IoError> {
        scan_note_files(&self.root)?
            .into_iter()
            .map(|path| {
                let relative = path
                    .strip_prefix(&self.root)
                    .ok()
                    .and_then(|p| RelativePathBuf::from_path(p).ok())
                    .ok_or_else(|| IoError::InvalidNoteId(path.display().to_string()))?;
                Ok(NoteFile::new(relative))
            })
            .collect()
    }

    fn read(&self, id: &str) -> Result<String, IoError> {
        read_file(&note_path(id)?, &self.root)
    }
}

/// Relative file path for a note id. Rejects ids that would leave the root.
pub fn note_path(id: &str) -> Result<RelativePathBuf, IoError> {
    let relative = RelativePath::new(id);
    let escapes = relative.components().any(|c| {
        matches!(
            c,
            relative_path::Component::ParentDir | relative_path::Component::CurDir
        )
    });
    if id.is_empty() || escapes || id.starts_with('/') {
        return Err(IoError::InvalidNoteId(id.to_owned()));
    }
    Ok(RelativePathBuf::from(format!("{id}.{NOTE_EXTENSION}")))
}

/// Read a note file and return its content
pub fn read_file(relative_path: &RelativePath, notes_root: &Path) -> Result<String, IoError> {
    let absolute_path = relative_path.to_path(notes_root);
    if !absolute_path.exists() {
        return Err(IoError::NotFound(absolute_path));
    }
    fs::read_to_string(&absolute_path).map_err(IoError::Io)
}

pub fn write_file(
    relative_path: &RelativePath,
    notes_root: &Path,
    content: &str,
) -> Result<(), IoError> {
    let absolute_path = relative_path.to_path(notes_root);

    if let Some(parent) = absolute_path.parent() {
        fs::create_dir_all(parent).map_err(IoError::Io)?;
    }

    fs::write(&absolute_path, content).map_err(IoError::Io)
}

/// Scan for note files in the notes directory, sorted
pub fn scan_note_files(notes_root: &Path) -> Result<Vec<PathBuf>, IoError> {
    if !notes_root.exists() {
        return Err(IoError::InvalidNotesDir(
            "notes directory not found".to_string(),
        ));
    }

    let mut files = Vec::new();
    scan_directory_recursive(notes_root, &mut files)?;
    files.sort();
    Ok(files)
}

fn scan_directory_recursive(dir: &Path, files: &mut Vec<PathBuf>) -> Result<(), IoError> {
    let entries = fs::read_dir(dir).map_err(IoError::Io)?;

    for entry in entries {
        let entry = entry.map_err(IoError::Io)?;
        let path = entry.path();

        if path.is_dir() {
            scan_directory_recursive(&path, files)?;
        } else if let Some(ext) = path.extension()
            && ext == NOTE_EXTENSION
        {
            files.push(path);
        }
    }

    Ok(())
}

pub fn validate_notes_dir(path: &Path) -> Result<(), IoError> {
    if !path.exists() || !path.is_dir() {
        return Err(IoError::InvalidNotesDir(format!(
            "{} is not a directory",
            path.display()
        )));
    }

    Ok(())
}
