pub mod client;
pub mod prompts;
pub mod stages;

pub use client::OpenAiClient;
pub use stages::{problem_statement, OpenAiModel, OpportunityModel, GENERIC_OPPORTUNITY};
