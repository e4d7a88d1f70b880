// crates/clipmill-core/src/quality.rs
//
// Quality presets: a named level mapped to a fixed target bitrate for the
// output encode. The mapping is hard-coded — nothing here is persisted or
// configurable beyond picking one of the three levels.

use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Quality {
    Low,
    Medium,
    High,
}

impl Default for Quality {
    fn default() -> Self {
        Quality::Medium
    }
}

impl Quality {
    pub const ALL: [Quality; 3] = [Quality::Low, Quality::Medium, Quality::High];

    /// Target video bitrate handed to the encoder, e.g. `"5000k"`.
    pub fn bitrate(self) -> &'static str {
        match self {
            Quality::Low    => "1000k",
            Quality::Medium => "5000k",
            Quality::High   => "10000k",
        }
    }

    /// Resolve a combo-box label to a preset. Accepts the spellings of both
    /// shipped locales; anything unrecognised falls back to Medium so a stale
    /// or hand-edited label can never abort a job.
    pub fn from_label(label: &str) -> Quality {
        match label.trim() {
            "Low"    | "Thấp"       => Quality::Low,
            "Medium" | "Trung bình" => Quality::Medium,
            "High"   | "Cao"        => Quality::High,
            _                        => Quality::Medium,
        }
    }

    /// Localisation key for the combo-box label.
    pub fn label_key(self) -> &'static str {
        match self {
            Quality::Low    => "quality_low",
            Quality::Medium => "quality_medium",
            Quality::High   => "quality_high",
        }
    }
}
