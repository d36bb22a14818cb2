//! Single-pass scanner.
//!
//! This module is the operational core of the engine: it walks the input once,
//! following the matcher's trie, and builds the output as a list of [`Cell`]s.
//! Every cell remembers the input index it is anchored to, which is what the
//! position maps are made of.
//!
//! ## Key concepts
//!
//! - **Boundary**: a cell holding the separator or the control character.
//!   Control cells are boundaries the scanner inserted itself; they render as
//!   the separator (or vanish in join mode).
//! - **Buffer**: cells of the match in progress (or of the last unmatched
//!   character).
//! - **Fragment**: committed output so far.
//! - **Left / right edge**: a match is on its left edge when it starts at a
//!   boundary and on its right edge when it ends at one. A match with neither
//!   is in the middle of a word.
//!
//! ## Walk
//!
//! ```text
//! for each character c:
//!   class change / punctuation ──> boundary into the buffer
//!   trie continues with c      ──> extend the match
//!   otherwise                  ──> fire the leaf's markers (apply_leaves)
//!                                  nothing fired and a resume point exists?
//!                                    rewind to it and try again
//!                                  commit the buffer, restart at the root
//! end of input ──> fire the last leaf as a right-edge match, trim boundaries
//! ```
//!
//! While a match is in progress, the first position where a fresh match could
//! start is remembered as the resume point. Only one is kept at a time.
//!
//! ## Deferred replacements
//!
//! A token rule that is not a whole word does not fire. The match is
//! remembered instead, and survives a rewind to the resume point. When a later
//! leaf fires a middle or right split, the remembered text is now followed by
//! a boundary and is replaced after the fact (a *re-expansion*), provided the
//! committed output still ends with it. A newer token match or a whole-word
//! replacement discards it.

use std::borrow::Cow;
use std::mem;
use std::time::Instant;

use tracing::{debug, trace};

use super::compiler::Matcher;
use super::metrics::{ScanMetrics, ScanRun};
use super::position::reverse_map;
use super::text::{CharClass, align_case, fold_char};
use super::trie::{Node, ROOT};
use crate::error::{Error, Result};
use crate::model::Sides;
use crate::{Options, OutputMode, ScanResult};

/// One output character.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Cell {
    ch: char,
    /// Input index this cell is anchored to.
    at: usize,
    /// Copied from the input rather than produced by a rule.
    literal: bool,
}

impl Cell {
    fn literal(ch: char, at: usize) -> Self {
        Cell { ch, at, literal: true }
    }
}

#[derive(Debug, Clone, Copy)]
struct Boundaries {
    separator: char,
    control: char,
}

impl Boundaries {
    #[inline]
    fn is(self, c: char) -> bool {
        c == self.separator || c == self.control
    }

    fn ends(self, cells: &[Cell]) -> bool {
        cells.last().is_some_and(|cell| self.is(cell.ch))
    }

    fn starts(self, cells: &[Cell]) -> bool {
        cells.first().is_some_and(|cell| self.is(cell.ch))
    }

    fn cell(self, at: usize) -> Cell {
        Cell { ch: self.control, at, literal: false }
    }
}

/// A token match that did not fire, kept in case a later split puts a
/// boundary after it.
struct Pending<'m> {
    matched: Vec<Cell>,
    replacement: &'m str,
}

struct Resume {
    at: usize,
    buffer: Vec<Cell>,
    last_char: Option<char>,
    last_class: CharClass,
}

/// Scanner orchestrates one pass of a [`Matcher`] over an input string.
///
/// Usage: create with `Scanner::new(&matcher, input, &options)` then call
/// [`run`](Scanner::run) or [`run_with_metrics`](Scanner::run_with_metrics).
#[derive(Debug)]
pub struct Scanner<'a> {
    matcher: &'a Matcher,
    input: &'a str,
    options: &'a Options,
}

impl<'a> Scanner<'a> {
    pub fn new(matcher: &'a Matcher, input: &'a str, options: &'a Options) -> Self {
        Scanner { matcher, input, options }
    }

    pub fn run(&self) -> Result<ScanResult> {
        let mut metrics = ScanMetrics::default();
        self.scan(&mut metrics)
    }

    pub fn run_with_metrics(&self) -> Result<ScanRun> {
        let start = Instant::now();
        let mut metrics = ScanMetrics::default();
        let result = self.scan(&mut metrics)?;
        metrics.elapsed = start.elapsed();

        debug!(
            chars = result.original.chars().count(),
            backtracks = metrics.backtracks,
            replacements = metrics.replacements,
            splits = metrics.splits,
            reexpansions = metrics.reexpansions,
            elapsed_us = metrics.elapsed.as_micros() as u64,
            "scan finished"
        );

        Ok(ScanRun { result, metrics })
    }

    fn scan(&self, metrics: &mut ScanMetrics) -> Result<ScanResult> {
        let Options { separator, mode, control } = *self.options;
        if separator == control {
            return Err(Error::InvalidArgument(format!(
                "separator and control character must differ (both {separator:?})"
            )));
        }
        if let Some(position) = self.input.chars().position(|c| c == control) {
            return Err(Error::ReservedCharacterCollision { ch: control, position });
        }

        let original: Vec<char> = self.input.chars().collect();
        let n = original.len();

        if self.matcher.settings().bypass {
            return Ok(ScanResult {
                original: self.input.to_string(),
                transformed: self.input.to_string(),
                forward_map: (0..n).collect(),
                reverse_map: Some((0..n).map(|i| Some([i, i])).collect()),
            });
        }
        if n == 0 {
            return Ok(ScanResult {
                original: String::new(),
                transformed: String::new(),
                forward_map: Vec::new(),
                reverse_map: Some(Vec::new()),
            });
        }

        let case_sensitive = self.matcher.settings().case_sensitive;
        let boundaries = Boundaries { separator, control };
        let mut walk = Walk {
            boundaries,
            original: &original,
            align: mode == OutputMode::Join && !case_sensitive,
            fragment: Vec::with_capacity(n + n / 2),
            buffer: Vec::new(),
            pending: None,
            metrics,
        };
        walk.run(self.matcher, case_sensitive);
        let cells = walk.finish();

        let rendered = render(&cells, &original, boundaries, mode, case_sensitive);
        let transformed: String = rendered.iter().map(|&(ch, _)| ch).collect();

        match mode {
            OutputMode::List | OutputMode::Set => {
                let mut tokens: Vec<&str> = transformed.split(separator).filter(|t| !t.is_empty()).collect();
                tokens.sort_unstable();
                if mode == OutputMode::Set {
                    tokens.dedup();
                }
                let separator = separator.to_string();
                Ok(ScanResult {
                    original: self.input.to_string(),
                    transformed: tokens.join(separator.as_str()),
                    forward_map: Vec::new(),
                    reverse_map: None,
                })
            }
            OutputMode::Normal | OutputMode::Join => {
                let forward_map: Vec<usize> = rendered.iter().map(|&(_, at)| at).collect();
                let reverse = reverse_map(&forward_map, n);
                Ok(ScanResult {
                    original: self.input.to_string(),
                    transformed,
                    forward_map,
                    reverse_map: Some(reverse),
                })
            }
        }
    }
}

/// Mutable state of one walk over the input.
struct Walk<'s, 'm> {
    boundaries: Boundaries,
    original: &'s [char],
    /// Re-case replacements after the text they replace.
    align: bool,
    fragment: Vec<Cell>,
    buffer: Vec<Cell>,
    pending: Option<Pending<'m>>,
    metrics: &'s mut ScanMetrics,
}

impl<'s, 'm> Walk<'s, 'm> {
    fn run(&mut self, matcher: &'m Matcher, case_sensitive: bool) {
        let trie = matcher.trie();
        let b = self.boundaries;
        let sep = b.separator;
        let chars: Vec<char> = self.original.iter().map(|&c| matcher.map_char(fold_char(c, case_sensitive))).collect();
        let n = chars.len();

        let mut node = ROOT;
        let mut began = false;
        let mut on_left = true;
        let mut last_char: Option<char> = None;
        let mut last_class = CharClass::of(chars[0]);
        let mut resume: Option<Resume> = None;

        let mut i = 0;
        while i < n {
            let c = chars[i];
            let class = CharClass::of(c);
            let mut on_right = false;
            let mut added = false;
            let continues = node != ROOT && trie.child(node, c).is_some();

            if c != sep
                && last_char != Some(sep)
                && !continues
                && (class == CharClass::Other || class != last_class)
            {
                if !b.ends(&self.buffer) {
                    self.buffer.push(b.cell(i));
                    self.metrics.boundaries += 1;
                }
                began = false;
                on_right = true;
                added = true;
            }

            if node != ROOT && resume.is_none() && trie.child(ROOT, c).is_some() {
                resume = Some(Resume { at: i, buffer: self.buffer.clone(), last_char, last_class });
            }

            if let Some(next) = trie.child(node, c) {
                if !began {
                    if on_left && !self.fragment.is_empty() && !b.ends(&self.fragment) {
                        self.fragment.push(b.cell(i));
                    }
                    self.join_buffer();
                }
                on_left = on_left || added || last_char.is_some_and(|l| b.is(l));
                began = true;
                node = next;
                self.buffer.push(Cell::literal(c, i));
            } else {
                on_right = on_right || c == sep;
                on_left = self.fragment.is_empty() || b.ends(&self.fragment);
                began = false;

                let fired = self.apply_leaves(trie.node(node), on_left, on_right, i);
                node = ROOT;
                if fired {
                    resume = None;
                } else if let Some(saved) = resume.take() {
                    trace!(from = i, to = saved.at, "no leaf fired; resuming");
                    i = saved.at;
                    self.buffer = saved.buffer;
                    last_char = saved.last_char;
                    last_class = saved.last_class;
                    self.metrics.backtracks += 1;
                    continue;
                }

                if on_left && !self.fragment.is_empty() && !b.ends(&self.fragment) && c != sep && !added {
                    self.fragment.push(b.cell(i));
                }
                self.join_buffer();
                self.buffer.push(Cell::literal(c, i));
                on_left = false;

                if let Some(next) = trie.child(ROOT, c) {
                    on_left = added || last_char.is_some_and(|l| b.is(l));
                    began = true;
                    node = next;
                }
            }

            last_class = class;
            last_char = Some(c);
            i += 1;
        }

        let on_left = self.fragment.is_empty() || b.ends(&self.fragment);
        self.apply_leaves(trie.node(node), on_left, true, n - 1);
        if on_left && !self.fragment.is_empty() && !b.ends(&self.fragment) {
            self.fragment.push(b.cell(n - 1));
        }
        self.join_buffer();
    }

    /// Committed cells without leading or trailing boundaries.
    fn finish(self) -> Vec<Cell> {
        let b = self.boundaries;
        let mut cells = self.fragment;
        let end = cells.iter().rposition(|cell| !b.is(cell.ch)).map_or(0, |last| last + 1);
        cells.truncate(end);
        let start = cells.iter().position(|cell| !b.is(cell.ch)).unwrap_or(cells.len());
        cells.drain(..start);
        cells
    }

    /// Move the buffer onto the fragment, collapsing a boundary pair at the
    /// seam into one. A real separator wins over an inserted one.
    fn join_buffer(&mut self) {
        let b = self.boundaries;
        let mut buffer = mem::take(&mut self.buffer);
        if b.ends(&self.fragment) && b.starts(&buffer) {
            if let (Some(last), Some(first)) = (self.fragment.pop(), buffer.first_mut()) {
                if last.ch == b.separator && first.ch == b.control {
                    first.ch = b.separator;
                }
            }
        }
        self.fragment.append(&mut buffer);
    }

    /// Fire the markers of `node` for the match held in the buffer.
    ///
    /// Returns whether anything fired.
    fn apply_leaves(&mut self, node: &'m Node, on_left: bool, on_right: bool, at: usize) -> bool {
        let b = self.boundaries;
        let previous = self.pending.take();
        let middle = !on_left && !on_right;
        let split_left = on_left && node.splits.contains(Sides::LEFT);
        let split_middle = middle && node.splits.contains(Sides::MIDDLE);
        let split_right = on_right && node.splits.contains(Sides::RIGHT);

        let mut fired = false;
        let mut buffer = mem::take(&mut self.buffer);

        if let Some(replacement) = node.replacement.as_deref() {
            let whole = on_left && on_right;
            if whole || split_left || split_middle || split_right {
                let mut cells = self.replacement_cells(replacement, &buffer);
                if whole {
                    cells.push(b.cell(at));
                }
                trace!(at, replacement, whole, "replacement fired");
                buffer = cells;
                fired = true;
                self.metrics.replacements += 1;
            } else {
                self.pending = Some(Pending { matched: buffer.clone(), replacement });
            }
        }

        if split_left {
            if !b.ends(&buffer) {
                buffer.push(b.cell(at));
            }
            fired = true;
        }
        if split_middle {
            if !b.starts(&buffer) {
                buffer.insert(0, b.cell(at));
            }
            if !b.ends(&buffer) {
                buffer.push(b.cell(at));
            }
            fired = true;
        }
        if split_right {
            if !b.starts(&buffer) {
                buffer.insert(0, b.cell(at));
            }
            fired = true;
        }

        if split_left || split_middle || split_right {
            trace!(at, sides = %node.splits.letters(), "split fired");
            self.metrics.splits += 1;
        }
        if split_middle || split_right {
            if let Some(pending) = previous {
                self.reexpand(pending);
            }
        } else if node.replacement.is_none() {
            self.pending = previous;
        }

        self.buffer = buffer;
        fired
    }

    /// Replace the tail of the fragment with a deferred replacement, if the
    /// tail still holds the text it was matched on.
    fn reexpand(&mut self, pending: Pending<'m>) {
        let k = pending.matched.len();
        let len = self.fragment.len();
        if k == 0 || k > len {
            return;
        }
        let tail = &self.fragment[len - k..];
        if !tail.iter().map(|cell| cell.ch).eq(pending.matched.iter().map(|cell| cell.ch)) {
            return;
        }

        let cells = self.replacement_cells(pending.replacement, &pending.matched);
        self.fragment.truncate(len - k);
        self.fragment.extend(cells);
        self.metrics.reexpansions += 1;
        trace!(replacement = pending.replacement, "deferred replacement applied");
    }

    /// Cells for `text`, all anchored at the first matched cell.
    ///
    /// `matched` is never empty: only a non-root trie node carries a
    /// replacement, and reaching one pushes at least one cell.
    fn replacement_cells(&self, text: &str, matched: &[Cell]) -> Vec<Cell> {
        debug_assert!(!matched.is_empty(), "replacement without a matched span");
        let anchor = matched[0].at;
        let text = if self.align {
            let source: String = matched.iter().map(|cell| self.original[cell.at]).collect();
            Cow::Owned(align_case(text, &source))
        } else {
            Cow::Borrowed(text)
        };
        text.chars().map(|ch| Cell { ch, at: anchor, literal: false }).collect()
    }
}

/// Turn cells into `(char, input index)` pairs for the requested mode.
fn render(
    cells: &[Cell],
    original: &[char],
    boundaries: Boundaries,
    mode: OutputMode,
    case_sensitive: bool,
) -> Vec<(char, usize)> {
    let mut out: Vec<(char, usize)> = Vec::with_capacity(cells.len());

    if mode == OutputMode::Join {
        for cell in cells.iter().filter(|cell| cell.ch != boundaries.control) {
            let source = original[cell.at];
            let ch = if cell.literal && fold_char(source, case_sensitive) == cell.ch { source } else { cell.ch };
            out.push((ch, cell.at));
        }
        return out;
    }

    for cell in cells {
        if boundaries.is(cell.ch) {
            if out.last().is_some_and(|&(last, _)| last == boundaries.separator) {
                continue;
            }
            out.push((boundaries.separator, cell.at));
        } else {
            out.push((cell.ch, cell.at));
        }
    }
    out
}
