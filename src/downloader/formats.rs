//! Format selection for the `/info` endpoint
//!
//! Reduces the yt-dlp format list to one entry per resolution (video) or
//! bitrate (audio) in the containers a browser can save directly.

use serde::{Deserialize, Serialize};
use serde_json::{Number, Value};
use std::collections::HashMap;

/// Containers offered to the user, also the lookup order after a download
pub const MEDIA_EXTENSIONS: [&str; 4] = ["mp4", "webm", "m4a", "mp3"];

const MIB: f64 = 1024.0 * 1024.0;

/// The parts of `yt-dlp -J` output the downloader reads
#[derive(Debug, Clone, Default, Deserialize)]
pub struct VideoInfo {
    pub title: Option<String>,
    pub uploader: Option<String>,
    pub duration: Option<Number>,
    pub thumbnail: Option<String>,
    #[serde(default)]
    pub formats: Vec<RawFormat>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawFormat {
    pub format_id: String,
    pub ext: Option<String>,
    pub acodec: Option<String>,
    pub vcodec: Option<String>,
    pub resolution: Option<String>,
    pub fps: Option<Number>,
    pub abr: Option<Number>,
    pub filesize: Option<f64>,
    pub filesize_approx: Option<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    Video,
    Audio,
}

impl RawFormat {
    /// Audio-only streams have an audio codec and `vcodec == "none"`
    pub fn kind(&self) -> MediaKind {
        if self.acodec.as_deref() != Some("none") && self.vcodec.as_deref() == Some("none") {
            MediaKind::Audio
        } else {
            MediaKind::Video
        }
    }

    fn group_key(&self, kind: MediaKind) -> String {
        match kind {
            MediaKind::Video => format!("{}_video", self.resolution.as_deref().unwrap_or("none")),
            MediaKind::Audio => match &self.abr {
                Some(abr) => format!("{abr}_audio"),
                None => "none_audio".to_string(),
            },
        }
    }

    /// Higher wins within a group: fps for video, bitrate for audio
    fn rank(&self, kind: MediaKind) -> f64 {
        let value = match kind {
            MediaKind::Video => &self.fps,
            MediaKind::Audio => &self.abr,
        };
        value.as_ref().and_then(Number::as_f64).unwrap_or(0.0)
    }

    fn size_mb(&self) -> Option<f64> {
        let bytes = [self.filesize, self.filesize_approx]
            .into_iter()
            .flatten()
            .find(|size| *size > 0.0)?;
        Some((bytes / MIB * 100.0).round() / 100.0)
    }
}

/// One row of the format picker
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FormatSummary {
    pub format_id: String,
    pub ext: Option<String>,
    pub resolution: String,
    /// Number, or `""` when unknown
    pub fps: Value,
    /// Number, or `""` when unknown
    pub abr: Value,
    #[serde(rename = "type")]
    pub kind: MediaKind,
    pub size_mb: Option<f64>,
}

impl From<&RawFormat> for FormatSummary {
    fn from(f: &RawFormat) -> Self {
        Self {
            format_id: f.format_id.clone(),
            ext: f.ext.clone(),
            resolution: f.resolution.clone().unwrap_or_default(),
            fps: number_or_blank(f.fps.as_ref()),
            abr: number_or_blank(f.abr.as_ref()),
            kind: f.kind(),
            size_mb: f.size_mb(),
        }
    }
}

/// Body of a successful `/info` response
#[derive(Debug, Serialize)]
pub struct InfoResponse {
    pub title: Option<String>,
    pub author: Option<String>,
    pub length: Option<Number>,
    pub thumbnail: Option<String>,
    pub formats: Vec<FormatSummary>,
}

impl From<VideoInfo> for InfoResponse {
    fn from(info: VideoInfo) -> Self {
        let formats = select_formats(&info.formats);
        Self {
            title: info.title,
            author: info.uploader,
            length: info.duration,
            thumbnail: info.thumbnail,
            formats,
        }
    }
}

/// Filter, deduplicate and order formats: videos by resolution, then audio by
/// bitrate, both descending
pub fn select_formats(formats: &[RawFormat]) -> Vec<FormatSummary> {
    let mut kept: Vec<&RawFormat> = Vec::new();
    let mut by_key: HashMap<String, usize> = HashMap::new();

    for f in formats {
        if !f
            .ext
            .as_deref()
            .is_some_and(|ext| MEDIA_EXTENSIONS.contains(&ext))
        {
            continue;
        }
        let kind = f.kind();
        match by_key.get(&f.group_key(kind)) {
            Some(&slot) => {
                if f.rank(kind) > kept[slot].rank(kind) {
                    kept[slot] = f;
                }
            }
            None => {
                by_key.insert(f.group_key(kind), kept.len());
                kept.push(f);
            }
        }
    }

    let (mut videos, mut audios): (Vec<FormatSummary>, Vec<FormatSummary>) = kept
        .into_iter()
        .map(FormatSummary::from)
        .partition(|s| s.kind == MediaKind::Video);

    videos.sort_by_key(|s| std::cmp::Reverse(resolution_rank(&s.resolution)));
    audios.sort_by(|a, b| value_rank(&b.abr).total_cmp(&value_rank(&a.abr)));
    videos.extend(audios);
    videos
}

/// Digits of a resolution read as one number: `1920x1080` ranks as 19201080
fn resolution_rank(resolution: &str) -> u128 {
    let digits: String = resolution.chars().filter(char::is_ascii_digit).collect();
    digits.parse().unwrap_or(0)
}

fn value_rank(value: &Value) -> f64 {
    value.as_f64().unwrap_or(0.0)
}

fn number_or_blank(n: Option<&Number>) -> Value {
    match n {
        Some(n) if n.as_f64().is_some_and(|v| v != 0.0) => Value::Number(n.clone()),
        _ => Value::String(String::new()),
    }
}

/// Prefix `https://` unless the input already starts with `http`
pub fn normalize_url(url: &str) -> String {
    let url = url.trim();
    if url.starts_with("http") {
        url.to_string()
    } else {
        format!("https://{url}")
    }
}

/// Strip characters that are unsafe in file names; never returns an empty name
pub fn sanitize_title(title: &str) -> String {
    let name: String = title
        .chars()
        .filter(|c| !matches!(c, '\\' | '/' | '*' | '?' | ':' | '"' | '<' | '>' | '|'))
        .collect();
    if name.trim().is_empty() {
        "download".to_string()
    } else {
        name
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn formats(value: Value) -> Vec<RawFormat> {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_kind() {
        let f = formats(json!([
            { "format_id": "a", "acodec": "opus", "vcodec": "none" },
            { "format_id": "b", "acodec": "none", "vcodec": "avc1" },
            { "format_id": "c", "acodec": "mp4a", "vcodec": "avc1" },
            { "format_id": "d" }
        ]));
        let kinds: Vec<_> = f.iter().map(RawFormat::kind).collect();
        assert_eq!(
            kinds,
            vec![MediaKind::Audio, MediaKind::Video, MediaKind::Video, MediaKind::Video]
        );
    }

    #[test]
    fn test_filters_extensions() {
        let f = formats(json!([
            { "format_id": "sb0", "ext": "mhtml", "resolution": "48x27" },
            { "format_id": "233", "ext": "3gp", "resolution": "176x144" },
            { "format_id": "18", "ext": "mp4", "resolution": "640x360", "fps": 30 }
        ]));
        let selected = select_formats(&f);
        assert_eq!(selected.len(), 1);
        assert_eq!(selected[0].format_id, "18");
    }

    #[test]
    fn test_dedupe_keeps_higher_fps_in_first_seen_slot() {
        let f = formats(json!([
            { "format_id": "136", "ext": "mp4", "vcodec": "avc1", "acodec": "none", "resolution": "1280x720", "fps": 30 },
            { "format_id": "247", "ext": "webm", "vcodec": "vp9", "acodec": "none", "resolution": "1280x720", "fps": 30 },
            { "format_id": "298", "ext": "mp4", "vcodec": "avc1", "acodec": "none", "resolution": "1280x720", "fps": 60 }
        ]));
        let selected = select_formats(&f);
        assert_eq!(selected.len(), 1);
        assert_eq!(selected[0].format_id, "298");
        assert_eq!(selected[0].fps, json!(60));
    }

    #[test]
    fn test_order_videos_then_audio() {
        let f = formats(json!([
            { "format_id": "140", "ext": "m4a", "acodec": "mp4a", "vcodec": "none", "abr": 129.5 },
            { "format_id": "18", "ext": "mp4", "resolution": "640x360", "fps": 30 },
            { "format_id": "251", "ext": "webm", "acodec": "opus", "vcodec": "none", "abr": 160 },
            { "format_id": "137", "ext": "mp4", "resolution": "1920x1080", "fps": 30 },
            { "format_id": "139", "ext": "m4a", "acodec": "mp4a", "vcodec": "none", "abr": 48.8 }
        ]));
        let ids: Vec<_> = select_formats(&f)
            .into_iter()
            .map(|s| s.format_id)
            .collect();
        assert_eq!(ids, vec!["137", "18", "251", "140", "139"]);
    }

    #[test]
    fn test_audio_orders_by_numeric_bitrate() {
        // Digit-string ranking would put 129.563 (129563) above 160.0 (1600)
        let f = formats(json!([
            { "format_id": "140", "ext": "m4a", "acodec": "mp4a", "vcodec": "none", "abr": 129.563 },
            { "format_id": "251", "ext": "webm", "acodec": "opus", "vcodec": "none", "abr": 160.0 }
        ]));
        let ids: Vec<_> = select_formats(&f)
            .into_iter()
            .map(|s| s.format_id)
            .collect();
        assert_eq!(ids, vec!["251", "140"]);
    }

    #[test]
    fn test_summary_fields() {
        let f = formats(json!([
            { "format_id": "140", "ext": "m4a", "acodec": "mp4a", "vcodec": "none",
              "abr": 129.5, "fps": null, "filesize": null, "filesize_approx": 3_565_158 }
        ]));
        let summary = FormatSummary::from(&f[0]);
        assert_eq!(summary.resolution, "");
        assert_eq!(summary.fps, json!(""));
        assert_eq!(summary.abr, json!(129.5));
        assert_eq!(summary.size_mb, Some(3.4));

        let value = serde_json::to_value(&summary).unwrap();
        assert_eq!(value["type"], "audio");
    }

    #[test]
    fn test_size_unknown() {
        let f = formats(json!([{ "format_id": "x", "ext": "mp4" }]));
        assert_eq!(FormatSummary::from(&f[0]).size_mb, None);
    }

    #[test]
    fn test_resolution_rank() {
        assert_eq!(resolution_rank("1920x1080"), 19_201_080);
        assert_eq!(resolution_rank("audio only"), 0);
        assert_eq!(resolution_rank(""), 0);
    }

    #[test]
    fn test_normalize_url() {
        assert_eq!(normalize_url("  youtu.be/abc "), "https://youtu.be/abc");
        assert_eq!(normalize_url("http://x.test/v"), "http://x.test/v");
        assert_eq!(normalize_url("https://x.test/v"), "https://x.test/v");
    }

    #[test]
    fn test_sanitize_title() {
        assert_eq!(sanitize_title(r#"a/b\c*d?e:f"g<h>i|j"#), "abcdefghij");
        assert_eq!(sanitize_title("???"), "download");
        assert_eq!(sanitize_title("Live: Part 1"), "Live Part 1");
    }
}
