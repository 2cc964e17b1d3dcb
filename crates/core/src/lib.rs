//! Core logic of the Hermes language assistant: the learner profile and its
//! storage, the text-generation seam, the assessment engine and the study
//! content generators. Console interaction lives in the `hermes-assistant`
//! service crate.

pub mod assessment;
pub mod curriculum;
pub mod llm_client;
pub mod profile;
pub mod prompts;
pub mod store;
