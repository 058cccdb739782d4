pub mod engine;
pub mod protocol;

pub mod scenario;
pub mod machine;
pub mod compositor;
pub mod session;

pub mod prompt_builder;
pub mod llm_client;
