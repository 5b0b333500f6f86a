// Analysis: request parsing, prompt assembly, section parsing and the analyze/chat handlers.
// The analyze and chat endpoints share prompts.rs and parser.rs.

pub mod handlers;
pub mod parser;
pub mod prompts;
pub mod request;
pub mod sample;
