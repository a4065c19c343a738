pub mod edit;
pub mod gemini;
pub mod media;

pub use edit::*;
pub use gemini::{GenerateContentRequest, GenerateContentResponse, InlineData, ResponsePart};
pub use media::*;
