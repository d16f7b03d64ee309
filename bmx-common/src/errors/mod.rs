//! Error catalog for bmx.
//!
//! Every library error maps to a stable code so failures in nightly logs can
//! be searched and triaged without reading the message text.
//!
//! # Error Code Ranges
//!
//! | Range      | Category    | Description                          |
//! |------------|-------------|--------------------------------------|
//! | E001-E099  | Config      | Configuration and mode list errors   |
//! | E100-E199  | Corpus      | Program discovery and identity       |
//! | E200-E299  | Build       | Compiler invocation and artifacts    |
//! | E300-E399  | Timing      | Timing tool invocation               |
//! | E400-E499  | Report      | Aggregation and report documents     |

pub mod catalog;

pub use catalog::{ErrorCategory, ErrorCode, ErrorEntry};
