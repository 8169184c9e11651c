//! Identifiers used throughout the pipeline: video/request/model keys and
//! the deterministic derivation rules for video and moment ids.

use sha2::{Digest, Sha256};
use std::fmt;
use url::Url;

/// Stable identifier for a video, either supplied by the caller or derived
/// from a submitted URL via [`generate_video_id`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, serde::Serialize, serde::Deserialize)]
#[serde(transparent)]
pub struct VideoId(pub String);

impl VideoId {
    pub fn from_string(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for VideoId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for VideoId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for VideoId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Opaque, globally-unique identifier for one run of the pipeline.
///
/// Format used by the submission path: `pipeline:{video_id}:{millis}`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(transparent)]
pub struct RequestId(pub String);

impl RequestId {
    pub fn new(video_id: &VideoId, millis: i64) -> Self {
        Self(format!("pipeline:{}:{}", video_id.as_str(), millis))
    }

    pub fn from_string(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Key under which a model's connection parameters are registered, e.g.
/// `qwen3_vl_fp8`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(transparent)]
pub struct ModelKey(pub String);

impl ModelKey {
    pub fn from_string(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ModelKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for ModelKey {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

const GENERIC_STEMS: &[&str] = &[
    "video", "clip", "output", "index", "download", "file", "untitled", "stream",
];

/// Normalize a submitted URL for hashing: percent-decode, drop all query
/// parameters except those beginning with `X-Goog-`, lowercase.
fn normalize_url(url: &str) -> String {
    let decoded = urlencoding::decode(url)
        .map(|s| s.into_owned())
        .unwrap_or_else(|_| url.to_string());

    let normalized = match Url::parse(&decoded) {
        Ok(parsed) => {
            let kept: Vec<(String, String)> = parsed
                .query_pairs()
                .filter(|(k, _)| k.starts_with("X-Goog-"))
                .map(|(k, v)| (k.into_owned(), v.into_owned()))
                .collect();
            let mut rebuilt = parsed.clone();
            rebuilt.set_query(None);
            let mut s = rebuilt.to_string();
            if !kept.is_empty() {
                let qs: Vec<String> = kept.into_iter().map(|(k, v)| format!("{k}={v}")).collect();
                s.push('?');
                s.push_str(&qs.join("&"));
            }
            s
        }
        Err(_) => decoded,
    };

    normalized.to_lowercase()
}

fn sanitize_stem(stem: &str) -> String {
    let lowered = stem.to_lowercase();
    let mut out = String::with_capacity(lowered.len());
    for c in lowered.chars() {
        if c.is_ascii_alphanumeric() {
            out.push(c);
        } else {
            out.push('-');
        }
    }
    let trimmed = out.trim_matches('-');
    let capped: String = trimmed.chars().take(50).collect();
    capped.trim_matches('-').to_string()
}

/// Derive a stable video id from a submitted URL.
///
/// The filename stem (last path segment, minus extension) is lowercased,
/// non-alphanumeric runs become `-`, and the result is trimmed and capped at
/// 50 chars. If that stem is empty or one of a handful of generic names, the
/// id falls back to `video-{sha256(normalized_url)[:8]}`.
pub fn generate_video_id(url: &str) -> VideoId {
    let stem = Url::parse(url)
        .ok()
        .and_then(|parsed| {
            parsed
                .path_segments()
                .and_then(|segs| segs.last().map(|s| s.to_string()))
        })
        .unwrap_or_default();

    let stem_no_ext = match stem.rsplit_once('.') {
        Some((base, _ext)) if !base.is_empty() => base.to_string(),
        _ => stem,
    };

    let sanitized = sanitize_stem(&stem_no_ext);

    let use_fallback = sanitized.is_empty() || GENERIC_STEMS.contains(&sanitized.as_str());

    if use_fallback {
        let normalized = normalize_url(url);
        let mut hasher = Sha256::new();
        hasher.update(normalized.as_bytes());
        let digest = hasher.finalize();
        let hex = hex_encode(&digest);
        VideoId(format!("video-{}", &hex[..8]))
    } else {
        VideoId(sanitized)
    }
}

/// Deterministic moment identifier: first 16 hex chars of
/// `sha256("{start:.2f}_{end:.2f}")`.
pub fn moment_id(start: f64, end: f64) -> String {
    let payload = format!("{start:.2}_{end:.2}");
    let mut hasher = Sha256::new();
    hasher.update(payload.as_bytes());
    let digest = hasher.finalize();
    hex_encode(&digest)[..16].to_string()
}

fn hex_encode(bytes: &[u8]) -> String {
    use std::fmt::Write;
    let mut s = String::with_capacity(bytes.len() * 2);
    for b in bytes {
        let _ = write!(s, "{b:02x}");
    }
    s
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn moment_id_is_deterministic() {
        assert_eq!(moment_id(12.345, 45.678), moment_id(12.345, 45.678));
    }

    #[test]
    fn moment_id_rounds_to_two_decimals() {
        assert_eq!(moment_id(12.3449, 45.0), moment_id(12.345, 45.0));
    }

    #[test]
    fn moment_id_distinguishes_distinct_pairs() {
        assert_ne!(moment_id(1.0, 2.0), moment_id(1.0, 2.01));
    }

    #[test]
    fn video_id_from_normal_url() {
        let id = generate_video_id("https://cdn.example.com/videos/My Cool Clip!.mp4");
        assert_eq!(id.as_str(), "my-cool-clip");
    }

    #[test]
    fn video_id_falls_back_for_generic_name() {
        let id = generate_video_id("https://cdn.example.com/output.mp4");
        assert!(id.as_str().starts_with("video-"));
        assert_eq!(id.as_str().len(), "video-".len() + 8);
    }

    #[test]
    fn video_id_falls_back_for_empty_stem() {
        let id = generate_video_id("https://cdn.example.com/");
        assert!(id.as_str().starts_with("video-"));
    }

    #[test]
    fn video_id_caps_at_fifty_chars() {
        let long = "a".repeat(80);
        let id = generate_video_id(&format!("https://cdn.example.com/{long}.mp4"));
        assert!(id.as_str().len() <= 50);
    }

    #[test]
    fn video_id_is_stable_across_query_param_noise() {
        let a = generate_video_id("https://cdn.example.com/output.mp4?utm_source=x");
        let b = generate_video_id("https://cdn.example.com/output.mp4?utm_source=y");
        assert_eq!(a, b);
    }
}
