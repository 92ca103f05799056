// MindMitra - Journal analysis and supportive chat backend
// Library exports

pub mod auth; // Caller identity and token verification
pub mod config;
pub mod crisis;
pub mod errors;
pub mod parser;
pub mod prompt;
pub mod providers; // Text-generation gateway
pub mod server; // HTTP transport
pub mod services; // analyzeEntry and chatbotProxy
pub mod store; // Document store
pub mod types;
