//! Prompt-driven image editing.
//!
//! A user picks an image, writes an instruction and optionally nudges
//! brightness, contrast and saturation. The [`client`] side composes the
//! final instruction, encodes the image and posts it to the [`proxy`], which
//! holds the model credential, calls the generative model and returns the
//! edited image.

pub mod client;
pub mod config;
pub mod encoder;
pub mod error;
pub mod gemini;
pub mod logger;
pub mod models;
pub mod prompt;
pub mod proxy;

pub use client::{EditClient, EditService, EditSession, ImageSource, SessionStatus, SubmitOutcome};
pub use config::{ClientConfig, GeminiConfig, ProxyConfig};
pub use encoder::EncodedImage;
pub use error::{EditError, ErrorKind, Result};
pub use gemini::{GeminiClient, ImageModel};
pub use models::*;
pub use prompt::{compose, Adjustment, AdjustmentSet};
pub use proxy::{EditProxy, ProxyFailure};
