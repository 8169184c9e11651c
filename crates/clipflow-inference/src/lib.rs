//! Tunnel management, connection scoping, and HTTP clients for the remote
//! transcription and generation model hosts.
//!
//! - [`tunnel`]: SSH port-forward lifecycle (C5).
//! - [`connector`]: acquire/release scope selecting tunnel vs direct (C6).
//! - [`inference_client`]: chat-completions calls (S5, S8).
//! - [`transcription_client`]: transcription calls (S4).
//! - [`decode`]: assistant-content parsing into structured moments/bounds.

pub mod connector;
pub mod decode;
pub mod error;
pub mod inference_client;
pub mod transcription_client;
pub mod tunnel;

pub use connector::{ConnectionScope, Connector};
pub use decode::{decode_moments, decode_refinement, strip_think_and_fence, RefinedBounds};
pub use error::{InferenceError, InferenceResult};
pub use inference_client::{ChatMessage, InferenceClient};
pub use transcription_client::TranscriptionClient;
pub use tunnel::{TunnelHandle, TunnelManager, TunnelPolicy};
