// Matching & Ranking Engine: embed → nearest-neighbor search → hybrid
// re-rank. All LLM calls go through llm_client — nothing here talks to
// providers directly except through the injected traits.

pub mod engine;
pub mod handlers;
pub mod skills;
