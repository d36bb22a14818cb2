use crate::engine::{self, Matcher, ScanMetrics, Settings};
use crate::error::{Error, Result};
use once_cell::sync::OnceCell;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

static STANDARD: OnceCell<Matcher> = OnceCell::new();

pub const DEFAULT_SEPARATOR: char = ' ';

/// Default control character: U+001F (unit separator).
pub const DEFAULT_CONTROL: char = '\u{1F}';

/// How the scanned output is rendered.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputMode {
    /// Ordered output, one separator per boundary. Maps populated.
    #[default]
    Normal,
    /// Tokens sorted by code point. No maps.
    List,
    /// Like `List`, duplicates removed.
    Set,
    /// Inserted boundaries removed, original casing kept. Maps populated.
    Join,
}

impl OutputMode {
    /// Numeric code: 0 normal, 1 list, 2 set, 3 join.
    pub fn code(self) -> u8 {
        match self {
            OutputMode::Normal => 0,
            OutputMode::List => 1,
            OutputMode::Set => 2,
            OutputMode::Join => 3,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            OutputMode::Normal => "normal",
            OutputMode::List => "list",
            OutputMode::Set => "set",
            OutputMode::Join => "join",
        }
    }

    /// Whether scans in this mode fill the position maps.
    pub fn has_maps(self) -> bool {
        matches!(self, OutputMode::Normal | OutputMode::Join)
    }
}

impl TryFrom<u8> for OutputMode {
    type Error = Error;

    fn try_from(code: u8) -> Result<Self> {
        match code {
            0 => Ok(OutputMode::Normal),
            1 => Ok(OutputMode::List),
            2 => Ok(OutputMode::Set),
            3 => Ok(OutputMode::Join),
            other => Err(Error::InvalidArgument(format!("unknown output mode {other} (expected 0-3)"))),
        }
    }
}

impl FromStr for OutputMode {
    type Err = Error;

    /// Accepts a mode name or its numeric code.
    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "normal" => Ok(OutputMode::Normal),
            "list" => Ok(OutputMode::List),
            "set" => Ok(OutputMode::Set),
            "join" => Ok(OutputMode::Join),
            other => match other.parse::<u8>() {
                Ok(code) => OutputMode::try_from(code),
                Err(_) => Err(Error::InvalidArgument(format!(
                    "unknown output mode {s:?} (expected normal, list, set or join)"
                ))),
            },
        }
    }
}

impl fmt::Display for OutputMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Options that affect scanning.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Options {
    /// Emitted between tokens.
    pub separator: char,
    pub mode: OutputMode,
    /// Internal boundary marker. Must differ from `separator` and must not
    /// occur in the input.
    pub control: char,
}

impl Default for Options {
    fn default() -> Self {
        Self { separator: DEFAULT_SEPARATOR, mode: OutputMode::Normal, control: DEFAULT_CONTROL }
    }
}

/// Result of one scan.
///
/// Positions are char indices, not byte offsets.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanResult {
    /// The scanned input.
    pub original: String,
    pub transformed: String,
    /// For each output char, the input char it is anchored to. Empty in list
    /// and set modes.
    pub forward_map: Vec<usize>,
    /// For each input char, the inclusive range of output chars it produced.
    /// `None` in list and set modes.
    pub reverse_map: Option<Vec<Option<[usize; 2]>>>,
}

/// Additional details returned by [`normalize_verbose_with`].
#[derive(Debug, Clone)]
pub struct ScanDetails {
    pub metrics: ScanMetrics,
    pub settings: Settings,
    /// Size of the matcher's trie, root included.
    pub node_count: usize,
    pub pattern_count: usize,
}

/// Result from [`normalize_verbose_with`].
#[derive(Debug, Clone)]
pub struct ScanResultVerbose {
    pub result: ScanResult,
    pub elapsed: Duration,
    pub details: ScanDetails,
}

/// Compile rule lines into a [`Matcher`].
///
/// # Example
/// ```
/// let matcher = lexmap::compile("set\tcs\t0\nr\tcolor\tcolour\n").unwrap();
/// assert!(!matcher.settings().case_sensitive);
/// ```
pub fn compile(rule_lines: &str) -> Result<Matcher> {
    Matcher::compile(rule_lines)
}

/// Graft more rule lines onto `matcher`. On error the matcher is unchanged.
pub fn compile_update(matcher: &mut Matcher, rule_lines: &str) -> Result<()> {
    matcher.update(rule_lines)
}

/// Scan `input` with `matcher`.
pub fn scan(matcher: &Matcher, input: &str, separator: char, mode: OutputMode, control: char) -> Result<ScanResult> {
    normalize_with(matcher, input, &Options { separator, mode, control })
}

/// Parse a flag or config value that must be exactly one character.
pub fn parse_single_char(value: &str, what: &str) -> Result<char> {
    let mut chars = value.chars();
    match (chars.next(), chars.next()) {
        (Some(c), None) => Ok(c),
        _ => Err(Error::InvalidArgument(format!("{what} must be exactly one character, got {value:?}"))),
    }
}

/// The built-in rule set, compiled on first use.
pub fn standard() -> Result<&'static Matcher> {
    STANDARD.get_or_try_init(|| Matcher::compile(&crate::rules::standard::rules::RULE_LINES))
}

/// Normalize `text` with the standard rules and default [`Options`].
///
/// # Example
/// ```
/// assert_eq!(lexmap::normalize("nfkappab").unwrap(), "nf kappa b");
/// ```
pub fn normalize(text: &str) -> Result<String> {
    Ok(normalize_with(standard()?, text, &Options::default())?.transformed)
}

/// Normalize `text` with `matcher` and `options`.
pub fn normalize_with(matcher: &Matcher, text: &str, options: &Options) -> Result<ScanResult> {
    engine::Scanner::new(matcher, text, options).run()
}

/// Normalize `text` and return metrics alongside the result.
///
/// The default [`normalize_with`] path does not read the clock.
pub fn normalize_verbose_with(matcher: &Matcher, text: &str, options: &Options) -> Result<ScanResultVerbose> {
    let run = engine::Scanner::new(matcher, text, options).run_with_metrics()?;

    let details = ScanDetails {
        settings: matcher.settings(),
        node_count: matcher.node_count(),
        pattern_count: matcher.pattern_count(),
        metrics: run.metrics,
    };

    Ok(ScanResultVerbose { result: run.result, elapsed: details.metrics.elapsed, details })
}
