use std::fs::File;
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;

/// Container level facts about an input, read without decoding it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MediaInfo {
    pub sample_rate: Option<u32>,
    pub channels: Option<u16>,
    pub duration_secs: Option<f64>,
}

impl MediaInfo {
    pub fn describe(&self) -> String {
        let mut parts = Vec::new();
        if let Some(rate) = self.sample_rate {
            parts.push(format!("{rate} Hz"));
        }
        if let Some(channels) = self.channels {
            parts.push(format!("{channels} ch"));
        }
        if let Some(secs) = self.duration_secs {
            let whole = secs.round() as u64;
            parts.push(format!("{}:{:02}", whole / 60, whole % 60));
        }
        if parts.is_empty() {
            "unknown format".to_string()
        } else {
            parts.join(", ")
        }
    }
}

pub fn probe<P: AsRef<Path>>(path: P) -> Result<MediaInfo> {
    let path_ref = path.as_ref();
    let file = File::open(path_ref).with_context(|| format!("open audio file {:?}", path_ref))?;
    let mss = MediaSourceStream::new(Box::new(file), Default::default());
    let mut hint = Hint::new();
    if let Some(ext) = path_ref.extension().and_then(|ext| ext.to_str()) {
        hint.with_extension(ext);
    }

    let probed = symphonia::default::get_probe()
        .format(
            &hint,
            mss,
            &FormatOptions::default(),
            &MetadataOptions::default(),
        )
        .with_context(|| format!("probe audio file {:?}", path_ref))?;
    let track = probed
        .format
        .default_track()
        .ok_or_else(|| anyhow::anyhow!("no default track found in {:?}", path_ref))?;
    let params = &track.codec_params;
    let duration_secs = match (params.n_frames, params.sample_rate) {
        (Some(frames), Some(rate)) if rate > 0 => Some(frames as f64 / rate as f64),
        _ => None,
    };

    Ok(MediaInfo {
        sample_rate: params.sample_rate,
        channels: params.channels.map(|c| c.count() as u16),
        duration_secs,
    })
}
