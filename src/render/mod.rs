//! Presentation of edit scripts and hunks.
//!
//! Renderers only read the script. Long unchanged stretches are elided down
//! to a few lines around each change, with `---` marking the cut.

use crate::{EditOp, Hunk, HunkLine};
use crossterm::style::Stylize;
use serde::Deserialize;
use std::fmt::Write;

/// Unchanged lines shown next to a change when rendering a whole diff.
pub const DISPLAY_CONTEXT: usize = 1;

const SEPARATOR: &str = "---";

/// Turns an edit script or hunk into display text.
pub trait Renderer {
    fn render(&self, ops: &[EditOp]) -> String;

    fn render_hunk(&self, hunk: &Hunk) -> String;
}

/// Which renderer a run uses.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum RenderStyle {
    /// Colour when stdout is a terminal, prefixed otherwise.
    #[default]
    Auto,
    /// Raw lines, no markers.
    Plain,
    /// Unified-diff style ` `/`-`/`+` prefixes.
    Prefixed,
    /// Prefixes plus ANSI colours.
    Color,
}

impl RenderStyle {
    pub fn renderer(self, is_terminal: bool) -> Box<dyn Renderer> {
        match self {
            RenderStyle::Auto if is_terminal => Box::new(ColorRenderer),
            RenderStyle::Auto | RenderStyle::Prefixed => Box::new(PrefixRenderer),
            RenderStyle::Plain => Box::new(PlainRenderer),
            RenderStyle::Color => Box::new(ColorRenderer),
        }
    }
}

/// One displayed line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Row<'a> {
    Context(&'a str),
    Delete(&'a str),
    Insert(&'a str),
    Separator,
}

/// Pick the rows worth showing: every changed line plus up to `context`
/// unchanged lines on each side of a change.
fn visible_rows(ops: &[EditOp], context: usize) -> Vec<Row<'_>> {
    let mut rows = Vec::new();
    let last = ops.len().saturating_sub(1);

    for (i, op) in ops.iter().enumerate() {
        match op {
            EditOp::Delete(lines) => rows.extend(lines.iter().map(|l| Row::Delete(l))),
            EditOp::Insert(lines) => rows.extend(lines.iter().map(|l| Row::Insert(l))),
            EditOp::Equal(lines) => {
                let head = if i == 0 { 0 } else { context.min(lines.len()) };
                let tail = if i == last {
                    0
                } else {
                    context.min(lines.len() - head)
                };

                if head + tail >= lines.len() {
                    rows.extend(lines.iter().map(|l| Row::Context(l)));
                    continue;
                }
                rows.extend(lines[..head].iter().map(|l| Row::Context(l)));
                rows.push(Row::Separator);
                rows.extend(lines[lines.len() - tail..].iter().map(|l| Row::Context(l)));
            }
        }
    }

    rows
}

fn hunk_rows(hunk: &Hunk) -> impl Iterator<Item = Row<'_>> {
    hunk.lines.iter().map(|line| match line {
        HunkLine::Context(s) => Row::Context(s),
        HunkLine::Delete(s) => Row::Delete(s),
        HunkLine::Insert(s) => Row::Insert(s),
    })
}

/// Strip the line terminator; flag lines that had none.
fn split_terminator(line: &str) -> (&str, bool) {
    match line.strip_suffix('\n') {
        Some(body) => (body.strip_suffix('\r').unwrap_or(body), true),
        None => (line, false),
    }
}

const NO_NEWLINE: &str = "\\ No newline at end of file";

/// Raw lines without markers.
#[derive(Debug, Clone, Copy, Default)]
pub struct PlainRenderer;

impl PlainRenderer {
    fn write_rows<'a>(rows: impl Iterator<Item = Row<'a>>) -> String {
        let mut out = String::new();
        for row in rows {
            match row {
                Row::Context(line) | Row::Delete(line) | Row::Insert(line) => {
                    let (body, _) = split_terminator(line);
                    let _ = writeln!(out, "{body}");
                }
                Row::Separator => {
                    let _ = writeln!(out, "{SEPARATOR}");
                }
            }
        }
        out
    }
}

impl Renderer for PlainRenderer {
    fn render(&self, ops: &[EditOp]) -> String {
        Self::write_rows(visible_rows(ops, DISPLAY_CONTEXT).into_iter())
    }

    fn render_hunk(&self, hunk: &Hunk) -> String {
        Self::write_rows(hunk_rows(hunk))
    }
}

/// Unified-diff style prefixes.
#[derive(Debug, Clone, Copy, Default)]
pub struct PrefixRenderer;

fn write_prefixed<'a>(
    rows: impl Iterator<Item = Row<'a>>,
    paint: impl Fn(Row<'a>, String) -> String,
) -> String {
    let mut out = String::new();
    for row in rows {
        let text = match row {
            Row::Context(line) | Row::Delete(line) | Row::Insert(line) => {
                let marker = match row {
                    Row::Delete(_) => '-',
                    Row::Insert(_) => '+',
                    _ => ' ',
                };
                let (body, terminated) = split_terminator(line);
                let mut text = format!("{marker}{body}");
                if !terminated {
                    text.push('\n');
                    text.push_str(NO_NEWLINE);
                }
                text
            }
            Row::Separator => SEPARATOR.to_string(),
        };
        let _ = writeln!(out, "{}", paint(row, text));
    }
    out
}

impl Renderer for PrefixRenderer {
    fn render(&self, ops: &[EditOp]) -> String {
        write_prefixed(visible_rows(ops, DISPLAY_CONTEXT).into_iter(), |_, text| text)
    }

    fn render_hunk(&self, hunk: &Hunk) -> String {
        let body = write_prefixed(hunk_rows(hunk), |_, text| text);
        format!("{}\n{body}", hunk.header())
    }
}

/// Prefixes plus colour: deletions red, insertions green, markers blue.
#[derive(Debug, Clone, Copy, Default)]
pub struct ColorRenderer;

fn paint(row: Row<'_>, text: String) -> String {
    match row {
        Row::Delete(_) => text.red().to_string(),
        Row::Insert(_) => text.green().to_string(),
        Row::Separator => text.blue().to_string(),
        Row::Context(_) => text,
    }
}

impl Renderer for ColorRenderer {
    fn render(&self, ops: &[EditOp]) -> String {
        write_prefixed(visible_rows(ops, DISPLAY_CONTEXT).into_iter(), paint)
    }

    fn render_hunk(&self, hunk: &Hunk) -> String {
        let body = write_prefixed(hunk_rows(hunk), paint);
        format!("{}\n{body}", hunk.header().blue().bold())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diff::diff_lines;
    use crate::hunk::build_hunks;

    #[test]
    fn prefixed_marks_changes() {
        let ops = diff_lines("a\nb\nc\n", "a\nx\nc\n");
        assert_eq!(PrefixRenderer.render(&ops), " a\n-b\n+x\n c\n");
    }

    #[test]
    fn long_equal_runs_are_elided() {
        let original: String = (0..10).map(|i| format!("l{i}\n")).collect();
        let target = original.replace("l5\n", "five\n");
        let ops = diff_lines(&original, &target);

        let shown = PrefixRenderer.render(&ops);
        assert_eq!(shown, "---\n l4\n-l5\n+five\n l6\n---\n");
    }

    #[test]
    fn missing_newline_is_flagged() {
        let ops = diff_lines("a\n", "a\nb");
        let shown = PrefixRenderer.render(&ops);
        assert!(shown.ends_with("+b\n\\ No newline at end of file\n"));
    }

    #[test]
    fn plain_has_no_markers() {
        let ops = diff_lines("a\nb\n", "a\nx\n");
        assert_eq!(PlainRenderer.render(&ops), "a\nb\nx\n");
    }

    #[test]
    fn hunk_render_starts_with_header() {
        let ops = diff_lines("a\nb\nc\n", "a\nx\nc\n");
        let hunks = build_hunks(&ops, 3);
        let shown = PrefixRenderer.render_hunk(&hunks[0]);
        assert_eq!(shown, "@@ -1,3 +1,3 @@\n a\n-b\n+x\n c\n");
    }

    #[test]
    fn color_keeps_text() {
        let ops = diff_lines("a\nb\n", "a\nx\n");
        let shown = ColorRenderer.render(&ops);
        assert!(shown.contains("-b"));
        assert!(shown.contains("+x"));
    }

    #[test]
    fn auto_style_depends_on_terminal() {
        let ops = diff_lines("a\n", "b\n");
        let piped = RenderStyle::Auto.renderer(false).render(&ops);
        assert_eq!(piped, "-a\n+b\n");
    }
}
