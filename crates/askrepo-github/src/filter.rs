//! Shared path denylist applied at fetch time and at ingestion time.

const IGNORED_FILENAMES: &[&str] = &["yarn.lock", "package-lock.json"];

const IGNORED_SEGMENTS: &[&str] = &[
    "node_modules/",
    "dist/",
    "build/",
    "coverage/",
    ".git/",
    ".next/",
];

const IGNORED_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "gif", "svg", "exe", "pdf"];

/// Pure predicate over repository paths.
///
/// One instance is shared between the fetcher and the ingestor so both sides
/// agree on what counts as source text.
#[derive(Debug, Clone)]
pub struct IgnorePolicy {
    filenames: Vec<String>,
    segments: Vec<String>,
    extensions: Vec<String>,
}

impl Default for IgnorePolicy {
    fn default() -> Self {
        Self {
            filenames: IGNORED_FILENAMES.iter().map(|s| (*s).to_owned()).collect(),
            segments: IGNORED_SEGMENTS.iter().map(|s| (*s).to_owned()).collect(),
            extensions: IGNORED_EXTENSIONS.iter().map(|s| (*s).to_owned()).collect(),
        }
    }
}

impl IgnorePolicy {
    #[must_use]
    pub fn new(
        filenames: Vec<String>,
        segments: Vec<String>,
        extensions: Vec<String>,
    ) -> Self {
        let lower = |v: Vec<String>| v.into_iter().map(|s| s.to_lowercase()).collect();
        Self {
            filenames: lower(filenames),
            segments: lower(segments),
            extensions: lower(extensions),
        }
    }

    /// Case-insensitive match against the filename, path-segment, and
    /// extension denylists.
    #[must_use]
    pub fn should_ignore(&self, path: &str) -> bool {
        let lowered = path.to_lowercase();
        let filename = lowered.rsplit('/').next().unwrap_or(&lowered);

        if self.filenames.iter().any(|f| filename == f) {
            return true;
        }
        if self.segments.iter().any(|s| lowered.contains(s)) {
            return true;
        }
        filename
            .rsplit_once('.')
            .is_some_and(|(_, ext)| self.extensions.iter().any(|e| ext == e))
    }
}
