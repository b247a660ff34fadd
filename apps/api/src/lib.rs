pub mod config;
pub mod embedding;
pub mod errors;
pub mod explain;
pub mod index;
pub mod llm_client;
pub mod matching;
pub mod models;
pub mod resume;
pub mod routes;
pub mod state;
