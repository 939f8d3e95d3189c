//! Report files written for each generated post.
//!
//! # Submodules
//!
//! - [`report`]: Renders one article and its post into a plain-text report
//!
//! # Output Structure
//!
//! ```text
//! output_dir/
//! ├── 20250506_090000_1_AI重磅突破新模型.txt
//! ├── 20250506_090000_2_OpenAI发布新.txt
//! └── 20250507_090000_1_芯片.txt
//! ```
//!
//! Every file of one run shares the run's timestamp; the index is the
//! article's position among the selected articles, starting at 1.

pub mod report;
