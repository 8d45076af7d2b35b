// Copyright 2025-present Harīṣh Tummalachērla
// SPDX-License-Identifier: Apache-2.0

//! Terminal display utilities for mzsweep CLI.
//!
//! Matrices print as boxed tables with each value tinted by where it sits
//! between the matrix minimum and maximum, a poor man's heatmap good enough to
//! spot the sweet spot of a sweep before plotting anything. OneDark colors on
//! dark terminals, One Light on light ones.
//!
//! # Theme detection order
//!
//! 1. `MZSWEEP_THEME` env var ("dark" or "light")
//! 2. `COLORFGBG` env var (terminal background hint)
//! 3. Default to dark theme
//!
//! `NO_COLOR` and non-TTY stdout disable colors entirely.

use mzsweep::{Accuracy, Metric, MetricMatrix, SweepOutcome};
use std::sync::OnceLock;

// Width between │ and │ (excluding border chars)
pub const BOX_WIDTH: usize = 72;

/// Width of one matrix column.
const CELL_WIDTH: usize = 8;

// ═══════════════════════════════════════════════════════════════════════════
// THEME DETECTION
// ═══════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Theme {
    Dark,
    Light,
}

static THEME: OnceLock<Theme> = OnceLock::new();

fn detect_theme() -> Theme {
    if let Ok(theme) = std::env::var("MZSWEEP_THEME") {
        match theme.to_lowercase().as_str() {
            "light" | "l" => return Theme::Light,
            "dark" | "d" => return Theme::Dark,
            _ => {}
        }
    }

    // COLORFGBG is "fg;bg"; bg 7 and up (except 8) is a light background
    if let Ok(colorfgbg) = std::env::var("COLORFGBG") {
        if let Some(Ok(bg)) = colorfgbg.split(';').next_back().map(str::parse::<u8>) {
            if bg >= 7 && bg != 8 {
                return Theme::Light;
            }
        }
    }

    Theme::Dark
}

pub fn theme() -> Theme {
    *THEME.get_or_init(detect_theme)
}

// ═══════════════════════════════════════════════════════════════════════════
// COLORS
// ═══════════════════════════════════════════════════════════════════════════

pub const RESET: &str = "\x1b[0m";
pub const BOLD: &str = "\x1b[1m";
pub const DIM: &str = "\x1b[2m";

type Rgb = (u8, u8, u8);

/// Palette slots, indexed the same way in both themes.
#[derive(Debug, Clone, Copy)]
pub enum Slot {
    Red,
    Yellow,
    Green,
    Cyan,
    Blue,
    Gray,
}

// OneDark: https://github.com/joshdick/onedark.vim
const ONEDARK: [Rgb; 6] = [
    (224, 108, 117), // #e06c75
    (229, 192, 123), // #e5c07b
    (152, 195, 121), // #98c379
    (86, 182, 194),  // #56b6c2
    (97, 175, 239),  // #61afef
    (92, 99, 112),   // #5c6370
];

// One Light: https://github.com/sonph/onehalf
const ONELIGHT: [Rgb; 6] = [
    (228, 86, 73),  // #e45649
    (193, 132, 1),  // #c18401
    (80, 161, 79),  // #50a14f
    (1, 132, 188),  // #0184bc
    (64, 120, 242), // #4078f2
    (160, 161, 167), // #a0a1a7
];

fn fg(slot: Slot) -> String {
    let palette = match theme() {
        Theme::Dark => &ONEDARK,
        Theme::Light => &ONELIGHT,
    };
    let (r, g, b) = palette[slot as usize];
    format!("\x1b[38;2;{};{};{}m", r, g, b)
}

/// Check if colors should be used (TTY detection)
pub fn use_colors() -> bool {
    if std::env::var("NO_COLOR").is_ok() {
        return false;
    }
    atty::is(atty::Stream::Stdout)
}

/// Apply a palette color plus modifiers, or nothing when colors are off.
pub fn paint(slot: Slot, modifiers: &[&str], text: &str) -> String {
    if use_colors() {
        format!("{}{}{}{}", modifiers.join(""), fg(slot), text, RESET)
    } else {
        text.to_string()
    }
}

/// Calculate visible length (excluding ANSI codes)
pub fn visible_len(s: &str) -> usize {
    let mut in_escape = false;
    let mut len = 0;
    for c in s.chars() {
        if c == '\x1b' {
            in_escape = true;
        } else if in_escape && c == 'm' {
            in_escape = false;
        } else if !in_escape {
            len += 1;
        }
    }
    len
}

pub fn pad_left(s: &str, width: usize) -> String {
    format!("{}{}", " ".repeat(width.saturating_sub(visible_len(s))), s)
}

pub fn pad_right(s: &str, width: usize) -> String {
    format!("{}{}", s, " ".repeat(width.saturating_sub(visible_len(s))))
}

/// Bucket of `value` within `[min, max]`: green (low) to red (high).
///
/// A flat matrix (min == max) is all green.
pub fn heat_slot(value: f64, min: f64, max: f64) -> Slot {
    let span = max - min;
    if span <= f64::EPSILON {
        return Slot::Green;
    }
    let t = (value - min) / span;
    if t < 1.0 / 3.0 {
        Slot::Green
    } else if t < 2.0 / 3.0 {
        Slot::Yellow
    } else {
        Slot::Red
    }
}

// ═══════════════════════════════════════════════════════════════════════════
// BOX DRAWING
// ═══════════════════════════════════════════════════════════════════════════

/// │ content          │
pub fn row(content: &str) {
    let border = paint(Slot::Gray, &[], "│");
    println!("{}{}{}", border, pad_right(content, BOX_WIDTH), border);
}

/// ┌─ LABEL ──────────┐
pub fn section_top(label: &str) {
    let label_part = format!("─ {} ", paint(Slot::Cyan, &[BOLD], label));
    let remaining = BOX_WIDTH.saturating_sub(visible_len(&label_part));
    println!(
        "{}{}{}",
        paint(Slot::Gray, &[], "┌"),
        label_part,
        paint(Slot::Gray, &[], &format!("{}┐", "─".repeat(remaining)))
    );
}

/// └──────────────────┘
pub fn section_bot() {
    println!(
        "{}",
        paint(Slot::Gray, &[], &format!("└{}┘", "─".repeat(BOX_WIDTH)))
    );
}

// ═══════════════════════════════════════════════════════════════════════════
// REPORTS
// ═══════════════════════════════════════════════════════════════════════════

/// Print a metric matrix as a tinted w×k table.
pub fn print_matrix(matrix: &MetricMatrix, metric: Option<Metric>) {
    let format = |v: f64| match metric {
        Some(m) => m.format(v),
        None => format!("{:.3}", v),
    };
    let min = matrix.values.values().copied().fold(f64::INFINITY, f64::min);
    let max = matrix.values.values().copied().fold(f64::NEG_INFINITY, f64::max);

    section_top(&matrix.name);
    let mut head = pad_left(&paint(Slot::Gray, &[], "w\\k"), 5);
    for k in &matrix.k_values {
        head.push_str(&pad_left(&paint(Slot::Blue, &[BOLD], &k.to_string()), CELL_WIDTH));
    }
    row(&head);

    for &w in &matrix.w_values {
        let mut line = pad_left(&paint(Slot::Blue, &[BOLD], &w.to_string()), 5);
        for (_, value) in matrix.row(w) {
            let cell = match value {
                Some(v) => paint(heat_slot(v, min, max), &[], &format(v)),
                None => paint(Slot::Gray, &[DIM], "·"),
            };
            line.push_str(&pad_left(&cell, CELL_WIDTH));
        }
        row(&line);
    }
    section_bot();
}

/// Print the statistics of one ground-truth/candidate comparison.
pub fn print_accuracy(acc: &Accuracy) {
    section_top("accuracy");
    let field = |label: &str, value: String| {
        row(&format!(" {} {}", pad_right(&paint(Slot::Gray, &[], label), 34), value));
    };
    field("queries", acc.queries.to_string());
    field("avg false negatives / query", format!("{:.3}", acc.avg_false_negatives));
    field("avg false positives / query", format!("{:.3}", acc.avg_false_positives));
    field("queries with a false positive", format!("{:.3}", acc.false_positive_rate));
    field(
        "queries with a false negative",
        format!(
            "{} ({:.3})",
            acc.queries_with_false_negatives, acc.false_negative_rate
        ),
    );
    section_bot();
}

/// Print one metric row from two strategies side by side.
pub fn print_series(
    metric: Metric,
    w: usize,
    names: (&str, &str),
    points: &[(usize, Option<f64>, Option<f64>)],
) {
    section_top(&format!("{} at w={}", metric, w));
    row(&format!(
        " {}{}{}",
        pad_left(&paint(Slot::Gray, &[], "k"), 4),
        pad_left(&paint(Slot::Cyan, &[BOLD], names.0), 24),
        pad_left(&paint(Slot::Cyan, &[BOLD], names.1), 24)
    ));
    let show = |v: Option<f64>| v.map(|v| metric.format(v)).unwrap_or_else(|| "·".to_string());
    for &(k, a, b) in points {
        row(&format!(
            " {}{}{}",
            pad_left(&k.to_string(), 4),
            pad_left(&show(a), 24),
            pad_left(&show(b), 24)
        ));
    }
    section_bot();
}

/// One-line summary after a sweep.
pub fn print_summary(outcome: &SweepOutcome) {
    let total_build: f64 = outcome.cells.iter().map(|c| c.build_secs).sum();
    let total_query: f64 = outcome.cells.iter().map(|c| c.query_secs).sum();
    eprintln!();
    eprintln!("✅ Sweep complete");
    eprintln!(
        "   {} cells │ build {:.1}s │ query {:.1}s │ {} tables",
        outcome.cells.len(),
        total_build,
        total_query,
        outcome.written.len()
    );
}
