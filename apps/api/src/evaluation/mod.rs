// Resume evaluation: prompt templates, the LLM reply parser, the request pipeline
// and its HTTP handler. All LLM calls go through llm_client.

pub mod handlers;
pub mod models;
pub mod parser;
pub mod pipeline;
pub mod prompts;
