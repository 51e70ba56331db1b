use super::blueprint::ACT_COUNT;
use serde::Serialize;

pub const PRODUCT_SHOT_COUNT: usize = 2;
pub const BRANDING_LENGTH: f64 = 2.0;
pub const MUSIC_VOLUME: f64 = 0.2;
pub const VOICEOVER_VOLUME: f64 = 1.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Slot {
    Clip(usize),
    ProductShot(usize),
    Branding,
}

/// Fixed video layout: (slot, start, length). Asset durations are not
/// inspected; the renderer trims or loops whatever does not fit.
const VIDEO_LAYOUT: [(Slot, f64, f64); 6] = [
    (Slot::Clip(0), 0.0, 5.0),
    (Slot::ProductShot(0), 5.0, 4.0),
    (Slot::Clip(1), 9.0, 5.0),
    (Slot::ProductShot(1), 14.0, 5.0),
    (Slot::Clip(2), 19.0, 5.0),
    (Slot::Branding, 24.0, BRANDING_LENGTH),
];

/// Retrievable URLs for everything the composition references.
#[derive(Debug, Clone)]
pub struct TimelineAssets {
    pub clips: [String; ACT_COUNT],
    pub product_shots: [String; PRODUCT_SHOT_COUNT],
    pub branding_clip: String,
    pub voiceover: String,
    pub music: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RenderRequest {
    pub timeline: Timeline,
    pub output: RenderOutput,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Timeline {
    pub tracks: Vec<Track>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Track {
    pub clips: Vec<TimelineClip>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TimelineClip {
    pub asset: Asset,
    pub start: f64,
    pub length: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Asset {
    #[serde(rename = "type")]
    pub kind: AssetKind,
    pub src: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub volume: Option<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AssetKind {
    Video,
    Audio,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RenderOutput {
    pub format: String,
    pub resolution: String,
}

impl Default for RenderOutput {
    fn default() -> Self {
        Self {
            format: "mp4".to_string(),
            resolution: "hd".to_string(),
        }
    }
}

pub fn total_length() -> f64 {
    VIDEO_LAYOUT
        .iter()
        .map(|(_, start, length)| start + length)
        .fold(0.0, f64::max)
}

/// Builds the three-track composition: video, voiceover, background music.
/// Both audio tracks stop where the branding outro begins.
pub fn assemble(assets: &TimelineAssets) -> RenderRequest {
    let video = VIDEO_LAYOUT
        .iter()
        .map(|&(slot, start, length)| {
            let (src, volume) = match slot {
                Slot::Clip(i) => (assets.clips[i].clone(), None),
                // Product footage ships with its own audio; mute it under the narration.
                Slot::ProductShot(i) => (assets.product_shots[i].clone(), Some(0.0)),
                Slot::Branding => (assets.branding_clip.clone(), None),
            };
            TimelineClip {
                asset: Asset {
                    kind: AssetKind::Video,
                    src,
                    volume,
                },
                start,
                length,
            }
        })
        .collect();

    let narrated = total_length() - BRANDING_LENGTH;
    let audio_track = |src: &str, volume: f64| Track {
        clips: vec![TimelineClip {
            asset: Asset {
                kind: AssetKind::Audio,
                src: src.to_string(),
                volume: Some(volume),
            },
            start: 0.0,
            length: narrated,
        }],
    };

    RenderRequest {
        timeline: Timeline {
            tracks: vec![
                Track { clips: video },
                audio_track(&assets.voiceover, VOICEOVER_VOLUME),
                audio_track(&assets.music, MUSIC_VOLUME),
            ],
        },
        output: RenderOutput::default(),
    }
}
