//! Compilation and scanning engine.
//!
//! This module is the *public entry point* for the engine. It is split into
//! focused submodules under `src/engine/` while keeping public paths stable
//! (for example `crate::engine::Matcher` and `crate::engine::Scanner`).
//!
//! ## How the parts work together
//!
//! Normalizing a string is a two-stage pipeline: compile once, scan many
//! times.
//!
//! ```text
//! rule lines ──┐
//!              │  parse_lines                  (lines.rs)
//!              └──────────────┬──────────────
//!                             │
//!                  Matcher::compile            (compiler.rs)
//!                    - merge settings
//!                    - resolve replacement chains (closure.rs)
//!                    - build char map + trie      (trie.rs)
//!                             │
//! input ──────────────────────┼─ Scanner::run  (scanner.rs)
//!                             │    - fold + map characters (text.rs)
//!                             │    - walk the trie, fire leaves
//!                             │    - render for the output mode
//!                             v
//!                 ScanResult + reverse_map     (position.rs)
//! ```
//!
//! A [`Matcher`] is plain data: it can be cloned, updated with more rule lines,
//! and written to or read from a snapshot (`persist.rs`).
//!
//! ## Responsibilities by module
//!
//! - `lines.rs`: splits rule-line text into validated records.
//! - `closure.rs`: collapses replacement chains and detects cycles and
//!   conflicts.
//! - `trie.rs`: arena prefix tree holding split and replacement markers.
//! - `compiler.rs`: builds and updates a [`Matcher`].
//! - `scanner.rs`: the single-pass walk that produces output and positions.
//! - `position.rs`: inverts forward maps.
//! - `text.rs`: case folding, character classes, case alignment.
//! - `persist.rs`: versioned bincode snapshots.
//! - `metrics.rs`: optional counters and timing for a scan.
//!
//! ## Debugging
//!
//! The engine logs through `tracing`: compile summaries at `debug`, fired
//! leaves and backtracks at `trace`. The CLI reads its filter from
//! `LEXMAP_LOG`.

#[path = "engine/closure.rs"]
mod closure;
#[path = "engine/compiler.rs"]
mod compiler;
#[path = "engine/lines.rs"]
mod lines;
#[path = "engine/metrics.rs"]
mod metrics;
#[path = "engine/persist.rs"]
mod persist;
#[path = "engine/position.rs"]
mod position;
#[path = "engine/scanner.rs"]
mod scanner;
#[path = "engine/text.rs"]
mod text;
#[path = "engine/trie.rs"]
mod trie;

pub use compiler::{Matcher, Settings};
pub use metrics::{ScanMetrics, ScanRun};
pub use persist::FORMAT_VERSION;
pub use position::reverse_map;
pub use scanner::Scanner;
