mod openai;

pub use openai::{require_api_key, OpenAiLlm, OPENAI_API_KEY};
