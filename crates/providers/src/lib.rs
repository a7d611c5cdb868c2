//! LLM Provider implementations for frontsmith.
//!
//! All providers implement the `frontsmith_core::Provider` trait.
//! The router selects the correct provider based on configuration.

pub mod openai_compat;
pub mod router;

pub use openai_compat::OpenAiCompatProvider;
pub use router::{build_from_config, check_reachability, model_for, ProviderRouter, Reachability};
