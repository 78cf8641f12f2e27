//! Unpacked archive contents

/// File tree extracted from an uploaded archive
///
/// Entries keep the order in which they appeared in the archive. Paths are
/// stored verbatim, including any leading directory components the archive
/// was packed with.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ArchiveContent {
    files: Vec<(String, Vec<u8>)>,
}

impl ArchiveContent {
    /// Appends a file to the archive
    pub fn insert<S: Into<String>>(&mut self, path: S, data: Vec<u8>) {
        self.files.push((path.into(), data));
    }

    /// Looks up a file by its exact path
    pub fn file(&self, path: &str) -> Option<&[u8]> {
        self.files
            .iter()
            .find(|(p, _)| p == path)
            .map(|(_, data)| data.as_slice())
    }

    /// Looks up the first file whose path ends with the given suffix
    ///
    /// Tolerates archives that nest their content below a top-level
    /// directory.
    pub fn file_with_suffix(&self, suffix: &str) -> Option<&[u8]> {
        self.files
            .iter()
            .find(|(p, _)| p.ends_with(suffix))
            .map(|(_, data)| data.as_slice())
    }

    /// Number of files in the archive
    pub fn len(&self) -> usize {
        self.files.len()
    }

    /// Whether the archive contains no files
    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    /// Paths of all contained files, in archive order
    pub fn paths(&self) -> impl Iterator<Item = &str> {
        self.files.iter().map(|(p, _)| p.as_str())
    }
}
