// Résumé analysis: prompt building, the remote model call, reply parsing and the HTTP handlers.
// All model calls go through llm_client.

pub mod handlers;
pub mod prompts;
pub mod response;
pub mod service;
