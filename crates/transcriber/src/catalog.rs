use std::collections::BTreeSet;

use stemscribe_audio::SourceKind;
use stemscribe_domain::{Capability, Role, TranscriptionTask};

/// Tasks run against a single unseparated recording.
pub const MIX_CATALOG: &[TranscriptionTask] = &[
    TranscriptionTask::simple(
        "Musical notes",
        Role::FullMix,
        Capability::Music,
        "music_notes.mid",
    ),
    TranscriptionTask {
        name: "Vocal melody (F0)",
        required_role: Role::FullMix,
        capability: Capability::VocalContour,
        output_name: "vocal_melody.mid",
        expected_artifact: "vocal_melody.mid_f0.csv",
        secondary_artifacts: &["vocal_melody.mid_trans.wav"],
    },
    TranscriptionTask {
        name: "Chord progressions",
        required_role: Role::FullMix,
        capability: Capability::Chord,
        output_name: "chord_progressions.mid",
        expected_artifact: "chord_progressions.mid",
        secondary_artifacts: &["chord_progressions.csv"],
    },
];

/// Tasks run against separated stems.
pub const STEM_CATALOG: &[TranscriptionTask] = &[
    TranscriptionTask::simple(
        "Musical notes (other)",
        Role::Other,
        Capability::Music,
        "music_notes_other.mid",
    ),
    TranscriptionTask {
        name: "Vocal melody (F0, vocals)",
        required_role: Role::Vocals,
        capability: Capability::VocalContour,
        output_name: "vocal_melody_vocals.mid",
        expected_artifact: "vocal_melody_vocals.mid_f0.csv",
        secondary_artifacts: &["vocal_melody_vocals.mid_trans.wav"],
    },
    TranscriptionTask {
        name: "Chord progressions (vocals)",
        required_role: Role::Vocals,
        capability: Capability::Chord,
        output_name: "chord_progressions_vocals.mid",
        expected_artifact: "chord_progressions_vocals.mid",
        secondary_artifacts: &["chord_progressions_vocals.csv"],
    },
    TranscriptionTask::simple(
        "Bass line",
        Role::Bass,
        Capability::Music,
        "bass_line.mid",
    ),
];

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CatalogKind {
    Mix,
    Stems,
}

impl CatalogKind {
    /// Mixture inputs get the mix catalog, stem directories the stem catalog.
    pub fn for_source(kind: SourceKind) -> Option<Self> {
        match kind {
            SourceKind::Mixture => Some(CatalogKind::Mix),
            SourceKind::StemDirectory => Some(CatalogKind::Stems),
            SourceKind::Missing => None,
        }
    }

    pub fn tasks(&self) -> &'static [TranscriptionTask] {
        match self {
            CatalogKind::Mix => MIX_CATALOG,
            CatalogKind::Stems => STEM_CATALOG,
        }
    }
}

pub fn required_roles(tasks: &[TranscriptionTask]) -> BTreeSet<Role> {
    tasks.iter().map(|task| task.required_role).collect()
}

pub fn capabilities(tasks: &[TranscriptionTask]) -> Vec<Capability> {
    let mut seen = Vec::new();
    for task in tasks {
        if !seen.contains(&task.capability) {
            seen.push(task.capability);
        }
    }
    seen
}
