pub mod error;
pub mod ollama;
pub mod openai;
pub mod traits;
pub mod util;

pub use error::{AiError, Result};
pub use ollama::Ollama;
pub use openai::OpenAi;
pub use traits::ChatModel;
pub use util::{strip_code_blocks, truncate_chars};
