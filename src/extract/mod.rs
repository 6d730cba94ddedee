//! Content extraction
//!
//! Defensive parsers over generated text. Each mode has one contract:
//!
//! - `sections`: `### Heading` blocks into an ordered heading -> body mapping,
//!   flagged incomplete when an expected heading is absent
//! - `table`: a pipe table into row mappings; ragged rows are dropped
//! - `yaml`: a YAML document into a mapping, or `InvalidFormat`
//! - `fenced`: the first fenced JSON object of a chat reply
//!
//! None of these panic on malformed input.

pub mod fenced;
pub mod sections;
pub mod table;
pub mod yaml;

pub use fenced::extract_json_block;
pub use sections::{extract_sections, SectionExtraction};
pub use table::{extract_table, MarkdownTable};
pub use yaml::{parse_document, serialize_document};
