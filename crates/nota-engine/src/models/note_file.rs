use relative_path::{RelativePath, RelativePathBuf};
use serde::Serialize;

use crate::io::NOTE_EXTENSION;

/// A note file with its relative path and derived document id
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub struct NoteFile {
    relative_path: RelativePathBuf,
    id: String,
    display_name: String,
}

impl NoteFile {
    pub fn new(relative_path: RelativePathBuf) -> Self {
        let id = strip_extension(relative_path.as_str()).to_string();
        let display_name = relative_path
            .file_name()
            .map(strip_extension)
            .unwrap_or("Untitled")
            .to_string();

        Self {
            relative_path,
            id,
            display_name,
        }
    }

    pub fn from_relative_str(path: &str) -> Self {
        Self::new(RelativePathBuf::from(path))
    }

    pub fn relative_path(&self) -> &RelativePath {
        &self.relative_path
    }

    /// Document id: the relative path without extension, e.g. `tools/git`
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Last path segment without extension
    pub fn display_name(&self) -> &str {
        &self.display_name
    }
}

fn strip_extension(name: &str) -> &str {
    name.strip_suffix(NOTE_EXTENSION)
        .and_then(|rest| rest.strip_suffix('.'))
        .unwrap_or(name)
}

impl From<RelativePathBuf> for NoteFile {
    fn from(path: RelativePathBuf) -> Self {
        Self::new(path)
    }
}

impl From<&str> for NoteFile {
    fn from(path: &str) -> Self {
        Self::from_relative_str(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("journal.nd", "journal", "journal")]
    #[case("tools/git.nd", "tools/git", "git")]
    #[case("v1.2.nd", "v1.2", "v1.2")]
    #[case("readme", "readme", "readme")]
    fn ids_and_names(#[case] path: &str, #[case] id: &str, #[case] name: &str) {
        let file = NoteFile::from(path);
        assert_eq!(file.id(), id);
        assert_eq!(file.display_name(), name);
        assert_eq!(file.relative_path().as_str(), path);
    }
}
