//! Cloudflare R2 (S3-compatible) object-store client for the pipeline.
//!
//! This crate provides:
//! - File/byte upload and download against R2
//! - Presigned (signed) URL generation for inter-stage handoff
//! - The per-video object key layout (source video, audio, clips)

pub mod client;
pub mod error;
pub mod operations;
pub mod signed_url;

pub use client::{ObjectInfo, R2Client, R2Config};
pub use error::{StorageError, StorageResult};
pub use signed_url::{SignedUrl, AUDIO_SIGNED_URL_EXPIRY_SECS};
