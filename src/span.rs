use rustc_hash::FxHashMap;
use std::{
    fmt::Debug,
    io,
    ops::Range,
    path::{Path, PathBuf},
};
use ustr::Ustr;

/// Identifies a loaded document by its path relative to the cache root.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SourceId(Ustr);

impl SourceId {
    pub fn new(str: &str) -> Self {
        Self(Ustr::from(str))
    }

    pub fn as_str(&self) -> &'static str {
        self.0.as_str()
    }
}

/// A byte range within a specific source.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Span {
    source: SourceId,
    start: usize,
    end: usize,
}

impl Span {
    pub fn new(source: SourceId, start: usize, end: usize) -> Self {
        debug_assert!(start <= end);
        Self { source, start, end }
    }

    pub fn source(&self) -> SourceId {
        self.source
    }

    pub fn bytes(&self) -> Range<usize> {
        self.start..self.end
    }
}

impl Debug for Span {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Span({}:{}-{})", self.source.0, self.start, self.end)
    }
}

/// Stores the text of all the loaded documents.
pub struct SourceCache {
    root: PathBuf,
    files: FxHashMap<SourceId, String>,
}

impl SourceCache {
    pub fn new(root: PathBuf) -> Self {
        Self {
            root,
            files: FxHashMap::default(),
        }
    }

    fn get_id(&self, path: &Path) -> SourceId {
        let relative = path.strip_prefix(&self.root).unwrap_or(path);
        SourceId::new(&relative.to_string_lossy())
    }

    pub fn add_path(&mut self, path: &Path) -> io::Result<SourceId> {
        let text = std::fs::read_to_string(path)?;
        let id = self.get_id(path);
        self.add(id, text);
        Ok(id)
    }

    pub fn add(&mut self, id: SourceId, text: String) {
        self.files.insert(id, text);
    }

    pub fn get_text(&self, id: SourceId) -> &str {
        &self.files[&id]
    }

    pub fn span_text(&self, span: Span) -> &str {
        &self.get_text(span.source())[span.bytes()]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_are_relative_to_root() {
        let cache = SourceCache::new(PathBuf::from("/work/proofs"));
        let id = cache.get_id(Path::new("/work/proofs/theories/project.v"));
        assert_eq!(id.as_str(), "theories/project.v");

        let outside = cache.get_id(Path::new("/elsewhere/other.v"));
        assert_eq!(outside.as_str(), "/elsewhere/other.v");
    }

    #[test]
    fn span_text_slices_source() {
        let mut cache = SourceCache::new(PathBuf::new());
        let id = SourceId::new("doc.v");
        cache.add(id, "Lemma foo : True.".to_string());
        assert_eq!(cache.span_text(Span::new(id, 6, 9)), "foo");
    }
}
