use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::DomainError;

/// Semantic audio track a task reads from, independent of any filename.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Vocals,
    Drums,
    Bass,
    Other,
    FullMix,
}

impl Role {
    pub const ALL: [Role; 5] = [
        Role::Vocals,
        Role::Drums,
        Role::Bass,
        Role::Other,
        Role::FullMix,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Vocals => "vocals",
            Role::Drums => "drums",
            Role::Bass => "bass",
            Role::Other => "other",
            Role::FullMix => "full_mix",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

impl FromStr for Role {
    type Err = DomainError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Role::ALL
            .into_iter()
            .find(|role| role.as_str() == value)
            .ok_or_else(|| DomainError::validation(format!("unknown role `{value}`")))
    }
}

/// A required role that no file could be matched to.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct ResolutionGap {
    pub role: Role,
    pub patterns_tried: Vec<String>,
}

/// Role to file mapping produced once per run by stem resolution.
///
/// Partial maps are normal: a role that could not be resolved is simply
/// absent and listed in [`StemSet::gaps`].
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
pub struct StemSet {
    paths: BTreeMap<Role, PathBuf>,
    gaps: Vec<ResolutionGap>,
}

impl StemSet {
    pub fn new(paths: BTreeMap<Role, PathBuf>, gaps: Vec<ResolutionGap>) -> Self {
        Self { paths, gaps }
    }

    /// Every listed role mapped to the same file, for unseparated input.
    pub fn single_mix(path: impl Into<PathBuf>, roles: impl IntoIterator<Item = Role>) -> Self {
        let path = path.into();
        Self {
            paths: roles.into_iter().map(|role| (role, path.clone())).collect(),
            gaps: Vec::new(),
        }
    }

    pub fn get(&self, role: Role) -> Option<&Path> {
        self.paths.get(&role).map(PathBuf::as_path)
    }

    pub fn contains(&self, role: Role) -> bool {
        self.paths.contains_key(&role)
    }

    pub fn roles(&self) -> impl Iterator<Item = Role> + '_ {
        self.paths.keys().copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (Role, &Path)> + '_ {
        self.paths.iter().map(|(role, path)| (*role, path.as_path()))
    }

    pub fn gaps(&self) -> &[ResolutionGap] {
        &self.gaps
    }

    pub fn len(&self) -> usize {
        self.paths.len()
    }

    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }
}
