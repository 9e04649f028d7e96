//! Mapping files on disk to the semantic roles transcription tasks read from.

use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};

use regex_lite::Regex;
use serde::{Deserialize, Serialize};
use stemscribe_domain::{ResolutionGap, Role, StemSet};
use tracing::{debug, info, instrument, warn};
use walkdir::WalkDir;

/// Ordered filename patterns per role. Earlier patterns win; `*` and `?`
/// are wildcards and matching ignores ASCII case.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct StemPatterns {
    pub vocals: Vec<String>,
    pub drums: Vec<String>,
    pub bass: Vec<String>,
    pub other: Vec<String>,
    pub full_mix: Vec<String>,
}

impl Default for StemPatterns {
    fn default() -> Self {
        fn list(items: &[&str]) -> Vec<String> {
            items.iter().map(|item| item.to_string()).collect()
        }
        Self {
            vocals: list(&["vocals.wav", "vocals.mp3", "*vocals*"]),
            drums: list(&["drums.wav", "drums.mp3", "drum.wav", "drum.mp3", "*drum*"]),
            bass: list(&["bass.wav", "bass.mp3", "*bass*"]),
            other: list(&["other.wav", "other.mp3", "*other*"]),
            full_mix: list(&["mixture.wav", "mixture.mp3", "*mixture*"]),
        }
    }
}

impl StemPatterns {
    pub fn for_role(&self, role: Role) -> &[String] {
        match role {
            Role::Vocals => &self.vocals,
            Role::Drums => &self.drums,
            Role::Bass => &self.bass,
            Role::Other => &self.other,
            Role::FullMix => &self.full_mix,
        }
    }
}

/// What kind of input a run was pointed at.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SourceKind {
    /// One unseparated recording.
    Mixture,
    /// A directory of separated stems.
    StemDirectory,
    Missing,
}

impl SourceKind {
    pub fn classify(path: &Path) -> Self {
        if path.is_file() {
            SourceKind::Mixture
        } else if path.is_dir() {
            SourceKind::StemDirectory
        } else {
            SourceKind::Missing
        }
    }
}

#[derive(Clone, Debug, Default)]
pub struct StemResolver {
    patterns: StemPatterns,
    excluded: Vec<PathBuf>,
}

impl StemResolver {
    pub fn new(patterns: StemPatterns) -> Self {
        Self {
            patterns,
            excluded: Vec::new(),
        }
    }

    /// Leaves `dir` out of every directory scan, e.g. the run's own output
    /// directory when it sits inside the stem directory.
    pub fn excluding(mut self, dir: impl Into<PathBuf>) -> Self {
        self.excluded.push(dir.into());
        self
    }

    pub fn patterns(&self) -> &StemPatterns {
        &self.patterns
    }

    /// Resolves each required role to a file under `source`.
    ///
    /// Never fails: unmatched roles are left out of the result and recorded
    /// as gaps. A single file source covers every role with that file.
    #[instrument(skip_all, fields(source = %source.display()))]
    pub fn resolve(&self, source: &Path, required_roles: &BTreeSet<Role>) -> StemSet {
        let root = absolute(source);
        if root.is_file() {
            info!(roles = required_roles.len(), "single mixture covers every role");
            return StemSet::single_mix(root, required_roles.iter().copied());
        }

        let excluded: Vec<PathBuf> = self
            .excluded
            .iter()
            .filter_map(|dir| std::fs::canonicalize(dir).ok())
            .collect();
        let candidates = collect_files(&root, &excluded);
        debug!(count = candidates.len(), "collected candidate stem files");

        let mut paths = BTreeMap::new();
        let mut gaps = Vec::new();
        for &role in required_roles {
            let patterns = self.patterns.for_role(role);
            match first_match(patterns, &candidates) {
                Some(path) => {
                    info!(%role, path = %path.display(), "resolved stem");
                    paths.insert(role, path.to_path_buf());
                }
                None => {
                    warn!(%role, "no stem file matched");
                    gaps.push(ResolutionGap {
                        role,
                        patterns_tried: patterns.to_vec(),
                    });
                }
            }
        }
        StemSet::new(paths, gaps)
    }
}

fn absolute(path: &Path) -> PathBuf {
    std::fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf())
}

/// Every regular file below `root` outside `excluded`, in lexical path order.
fn collect_files(root: &Path, excluded: &[PathBuf]) -> Vec<PathBuf> {
    let mut files = Vec::new();
    let walker = WalkDir::new(root)
        .follow_links(true)
        .into_iter()
        .filter_entry(|entry| {
            entry.depth() == 0 || !excluded.iter().any(|dir| entry.path() == dir)
        });
    for entry in walker {
        match entry {
            Ok(entry) if entry.file_type().is_file() => files.push(entry.into_path()),
            Ok(_) => {}
            Err(err) => debug!("skipping unreadable entry: {}", err),
        }
    }
    files.sort();
    files
}

fn first_match<'a>(patterns: &[String], candidates: &'a [PathBuf]) -> Option<&'a Path> {
    for pattern in patterns {
        let matcher = match wildcard(pattern) {
            Ok(matcher) => matcher,
            Err(err) => {
                warn!(%pattern, "ignoring unusable stem pattern: {}", err);
                continue;
            }
        };
        let found = candidates.iter().find(|path| {
            path.file_name()
                .map(|name| matcher.is_match(&name.to_string_lossy().to_ascii_lowercase()))
                .unwrap_or(false)
        });
        if let Some(path) = found {
            debug!(%pattern, path = %path.display(), "pattern matched");
            return Some(path);
        }
    }
    None
}

fn wildcard(pattern: &str) -> Result<Regex, regex_lite::Error> {
    let mut expr = String::from("^");
    for ch in pattern.to_ascii_lowercase().chars() {
        match ch {
            '*' => expr.push_str(".*"),
            '?' => expr.push('.'),
            other => expr.push_str(&regex_lite::escape(other.encode_utf8(&mut [0; 4]))),
        }
    }
    expr.push('$');
    Regex::new(&expr)
}
