//! Rule-driven string normalization with exact position maps.
//!
//! A [`Matcher`] is compiled from tab-separated rule lines (or a JSON
//! [`RuleConfig`]) and scans text in one pass. Every output character knows
//! which input character it came from, so spans found in the normalized text
//! can be mapped back onto the original.
//!
//! ```
//! use lexmap::{Options, compile, normalize_with};
//!
//! let matcher = compile("set\tcs\t0\ns\tlmr\tkappa\nr\tword\tseveral words\n").unwrap();
//!
//! let out = normalize_with(&matcher, "NFkappaB", &Options::default()).unwrap();
//! assert_eq!(out.transformed, "nf kappa b");
//! assert_eq!(out.forward_map, vec![0, 1, 7, 2, 3, 4, 5, 6, 7, 7]);
//!
//! let out = normalize_with(&matcher, "give me several words", &Options::default()).unwrap();
//! assert_eq!(out.transformed, "give me word");
//! ```

extern crate self as lexmap;

#[macro_use]
mod macros;
mod api;
mod config;
mod engine;
mod error;
mod model;
mod rules;

pub use api::{
    DEFAULT_CONTROL, DEFAULT_SEPARATOR, Options, OutputMode, ScanDetails, ScanResult, ScanResultVerbose, compile,
    compile_update, normalize, normalize_verbose_with, normalize_with, parse_single_char, scan, standard,
};
pub use config::{LoadedRules, ReplaceEntry, RuleConfig, SplitEntry};
pub use engine::{FORMAT_VERSION, Matcher, ScanMetrics, ScanRun, Scanner, Settings, reverse_map};
pub use error::{CompileWarning, Error, Result};
pub use model::{Rule, RuleKind, RuleSet, Sides};

/// The built-in rule set as an editable [`RuleSet`].
pub fn standard_rules() -> RuleSet {
    rules::standard::rules::get()
}
