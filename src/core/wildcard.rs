// src/core/wildcard.rs

use crate::constants::{WILDCARD_MULTI, WILDCARD_SINGLE};
use std::collections::HashSet;

/// Returns `true` for the two reserved wildcard bytes.
///
/// There is no escaping mechanism: a literal `?` or `*` cannot appear in a
/// pattern. This is a documented limitation of the pattern syntax.
pub fn is_wildcard(byte: u8) -> bool {
    byte == WILDCARD_SINGLE || byte == WILDCARD_MULTI
}

/// The substring of a candidate that one wildcard resolved to.
///
/// `pattern_offset` is the byte index of the wildcard in the pattern (for a
/// run of consecutive MULTI wildcards, the first of the run). `start`/`len`
/// reference a byte span of the candidate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WildcardCapture {
    pub pattern_offset: usize,
    pub start: usize,
    pub len: usize,
}

impl WildcardCapture {
    /// The captured slice of `candidate`, or `""` if the span does not fall
    /// on UTF-8 boundaries (patterns are byte-oriented).
    pub fn value<'a>(&self, candidate: &'a str) -> &'a str {
        candidate.get(self.start..self.start + self.len).unwrap_or("")
    }
}

/// A successful match: one capture per capture point, in pattern order.
#[derive(Debug, Clone)]
pub struct WildcardMatch {
    pub captures: Vec<WildcardCapture>,
    /// True number of capture points in the pattern, independent of any
    /// capacity bound applied to `captures`.
    pub wildcard_count: usize,
}

impl WildcardMatch {
    /// Reconstructs the candidate by substituting each capture into the
    /// pattern at its recorded offset. For a successful unbounded match this
    /// yields exactly the original candidate.
    pub fn rebuild(&self, pattern: &str, candidate: &str) -> String {
        let pat = pattern.as_bytes();
        let cand = candidate.as_bytes();
        // Assemble bytes and convert once, so multi-byte literal segments
        // and captures spanning them survive the round trip.
        let mut output = Vec::with_capacity(cand.len());
        for (i, &byte) in pat.iter().enumerate() {
            if is_wildcard(byte) {
                if let Some(capture) = self.captures.iter().find(|c| c.pattern_offset == i) {
                    let span = cand
                        .get(capture.start..capture.start + capture.len)
                        .unwrap_or(&[]);
                    output.extend_from_slice(span);
                }
                // A non-leading byte of a collapsed MULTI run has no capture
                // and contributes nothing.
            } else {
                output.push(byte);
            }
        }
        String::from_utf8_lossy(&output).into_owned()
    }
}

/// Count-only query mode: the number of capture points in `pattern`.
///
/// A run of consecutive MULTI wildcards collapses to a single point; SINGLE
/// wildcards always count individually, even when adjacent.
pub fn count_wildcards(pattern: &str) -> usize {
    let pat = pattern.as_bytes();
    let mut count = 0;
    let mut prev_multi = false;
    for &byte in pat {
        if byte == WILDCARD_MULTI {
            if !prev_multi {
                count += 1;
            }
            prev_multi = true;
        } else {
            if byte == WILDCARD_SINGLE {
                count += 1;
            }
            prev_multi = false;
        }
    }
    count
}

/// Offsets of every capture point in `pattern`, left to right.
pub fn find_wildcards(pattern: &str) -> Vec<usize> {
    find_wildcards_bounded(pattern, usize::MAX).1
}

/// Bounded variant of [`find_wildcards`]: fills at most `capacity` offsets
/// while still returning the true total count. The filled offsets are always
/// a prefix of the unbounded result.
pub fn find_wildcards_bounded(pattern: &str, capacity: usize) -> (usize, Vec<usize>) {
    let pat = pattern.as_bytes();
    let mut offsets = Vec::new();
    let mut count = 0;
    let mut prev_multi = false;
    for (i, &byte) in pat.iter().enumerate() {
        let is_point = if byte == WILDCARD_MULTI {
            let leading = !prev_multi;
            prev_multi = true;
            leading
        } else {
            prev_multi = false;
            byte == WILDCARD_SINGLE
        };
        if is_point {
            count += 1;
            if offsets.len() < capacity {
                offsets.push(i);
            }
        }
    }
    (count, offsets)
}

/// Matches `candidate` against `pattern`, extracting captures.
///
/// Returns `None` on mismatch. MULTI wildcards are resolved shortest-first,
/// growing on failure; the search tries every feasible split before giving
/// up, with failed (pattern, candidate) positions memoized so pathological
/// patterns stay O(pattern · candidate).
pub fn solve(pattern: &str, candidate: &str) -> Option<WildcardMatch> {
    solve_bounded(pattern, candidate, usize::MAX)
}

/// Like [`solve`], but silently drops captures beyond `capacity`. The match
/// result itself is unaffected by the bound, and `wildcard_count` still
/// reports the true number of capture points.
pub fn solve_bounded(pattern: &str, candidate: &str, capacity: usize) -> Option<WildcardMatch> {
    let mut search = Search {
        pat: pattern.as_bytes(),
        cand: candidate.as_bytes(),
        captures: Vec::new(),
        capacity,
        dead_ends: HashSet::new(),
    };
    if search.solve_at(0, 0) {
        Some(WildcardMatch {
            captures: search.captures,
            wildcard_count: count_wildcards(pattern),
        })
    } else {
        log::trace!("pattern '{}' does not match '{}'", pattern, candidate);
        None
    }
}

struct Search<'a> {
    pat: &'a [u8],
    cand: &'a [u8],
    captures: Vec<WildcardCapture>,
    capacity: usize,
    // Memoized (pattern, candidate) positions already proven unsolvable.
    dead_ends: HashSet<(usize, usize)>,
}

impl Search<'_> {
    fn solve_at(&mut self, p: usize, c: usize) -> bool {
        if self.dead_ends.contains(&(p, c)) {
            return false;
        }
        let solved = self.solve_at_inner(p, c);
        if !solved {
            self.dead_ends.insert((p, c));
        }
        solved
    }

    fn solve_at_inner(&mut self, p: usize, c: usize) -> bool {
        let Some(&byte) = self.pat.get(p) else {
            // Pattern exhausted: the candidate must be too.
            return c == self.cand.len();
        };

        if byte == WILDCARD_SINGLE {
            if c >= self.cand.len() {
                return false;
            }
            let pushed = self.push_capture(p, c, 1);
            if self.solve_at(p + 1, c + 1) {
                return true;
            }
            self.pop_capture(pushed);
            return false;
        }

        if byte == WILDCARD_MULTI {
            // Collapse the run: adjacent MULTI wildcards are one match point.
            let mut next = p + 1;
            while self.pat.get(next) == Some(&WILDCARD_MULTI) {
                next += 1;
            }
            // Shortest expansion first, growing until the rest matches.
            for len in 0..=(self.cand.len() - c) {
                let pushed = self.push_capture(p, c, len);
                if self.solve_at(next, c + len) {
                    return true;
                }
                self.pop_capture(pushed);
            }
            return false;
        }

        // Literal byte: must match exactly at the aligned position.
        if self.cand.get(c) == Some(&byte) {
            return self.solve_at(p + 1, c + 1);
        }
        false
    }

    fn push_capture(&mut self, pattern_offset: usize, start: usize, len: usize) -> bool {
        if self.captures.len() < self.capacity {
            self.captures.push(WildcardCapture {
                pattern_offset,
                start,
                len,
            });
            true
        } else {
            false
        }
    }

    fn pop_capture(&mut self, pushed: bool) {
        if pushed {
            self.captures.pop();
        }
    }
}

// MARK: --- UNIT TESTS ---
