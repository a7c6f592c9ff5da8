//! Renderings of the session state.
//!
//! # Submodules
//!
//! - [`markdown`]: article tables and the Markdown files written with `-m`
//! - [`json`]: the JSON export written with `-j`
//! - [`summary`]: line parser for the model's templated summary
//! - [`pdf`]: styled PDF document built from the parsed summary
//!
//! # Output Structure
//!
//! ```text
//! markdown_output_dir/
//! ├── domestic.md
//! ├── international.md
//! └── summary.md          # only after summarization
//!
//! json_output_dir/
//! └── session.json
//! ```

pub mod json;
pub mod markdown;
pub mod pdf;
pub mod summary;
