//! Post-processing: shape per-page PDF text into Markdown.
//!
//! The fallback converter pulls raw text out of each page with pdfium. Raw
//! page text keeps the visual layout (columns separated by runs of spaces or
//! tabs, running headers at the top of each page) but has no Markdown
//! structure. This module turns it into Markdown with a fixed set of
//! deterministic rules.
//!
//! ## Rule Order
//!
//! 1. Normalise line endings and strip invisible Unicode, per page
//! 2. Optionally drop running headers (a first line repeated on most pages)
//! 3. Detect table blocks and render them as GFM tables under a heading
//! 4. Join pages, trim trailing whitespace, collapse blank lines
//! 5. Ensure the document ends with exactly one newline (empty stays empty)

use crate::config::FallbackOptions;
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::{HashMap, HashSet};

/// Convert extracted page texts to one Markdown document.
///
/// Returns the empty string when no page contains any text, so the caller
/// can treat an image-only PDF as "no output".
pub fn pages_to_markdown(pages: &[String], options: &FallbackOptions) -> String {
    let cleaned: Vec<String> = pages
        .iter()
        .map(|p| remove_invisible_chars(&normalise_line_endings(p)))
        .collect();

    let headers = if options.remove_headers {
        running_headers(&cleaned)
    } else {
        HashSet::new()
    };

    let shaped: Vec<String> = cleaned
        .iter()
        .map(|page| {
            let page = strip_running_header(page, &headers);
            shape_tables(&page, options)
        })
        .collect();

    let s = shaped.join("\n\n");
    let s = trim_trailing_whitespace(&s);
    let s = collapse_blank_lines(&s);
    ensure_final_newline(&s)
}

// ── Rule 1: Normalise line endings / invisible characters ───────────────────

fn normalise_line_endings(input: &str) -> String {
    input.replace("\r\n", "\n").replace('\r', "\n")
}

fn remove_invisible_chars(input: &str) -> String {
    input.replace(
        [
            '\u{200B}', '\u{FEFF}', '\u{00AD}', '\u{200C}', '\u{200D}', '\u{2060}',
        ],
        "",
    )
}

// ── Rule 2: Running headers ──────────────────────────────────────────────────

fn first_text_line(page: &str) -> Option<&str> {
    page.lines().map(str::trim).find(|l| !l.is_empty())
}

/// Lines that open at least half of the pages (and at least two of them).
fn running_headers(pages: &[String]) -> HashSet<String> {
    if pages.len() < 2 {
        return HashSet::new();
    }
    let mut counts: HashMap<&str, usize> = HashMap::new();
    for page in pages {
        if let Some(line) = first_text_line(page) {
            *counts.entry(line).or_default() += 1;
        }
    }
    counts
        .into_iter()
        .filter(|&(_, n)| n >= 2 && n * 2 >= pages.len())
        .map(|(line, _)| line.to_string())
        .collect()
}

fn strip_running_header(page: &str, headers: &HashSet<String>) -> String {
    match first_text_line(page) {
        Some(first) if headers.contains(first) => {
            let mut removed = false;
            page.lines()
                .filter(|l| {
                    if !removed && l.trim() == first {
                        removed = true;
                        false
                    } else {
                        true
                    }
                })
                .collect::<Vec<_>>()
                .join("\n")
        }
        _ => page.to_string(),
    }
}

// ── Rule 3: Tables ───────────────────────────────────────────────────────────

static RE_CELL_GAP: Lazy<Regex> = Lazy::new(|| Regex::new(r"\t+| {2,}").unwrap());

/// Split a layout line into cells; a single cell means "not a table row".
fn split_cells(line: &str) -> Vec<String> {
    RE_CELL_GAP
        .split(line.trim())
        .map(str::trim)
        .filter(|c| !c.is_empty())
        .map(|c| c.replace('|', "\\|"))
        .collect()
}

fn shape_tables(page: &str, options: &FallbackOptions) -> String {
    let mut out: Vec<String> = Vec::new();
    let mut block: Vec<(String, Vec<String>)> = Vec::new();

    for line in page.lines() {
        let cells = split_cells(line);
        if cells.len() >= 2 {
            block.push((line.trim().to_string(), cells));
        } else {
            flush_table(&mut block, &mut out, options);
            out.push(line.trim_end().to_string());
        }
    }
    flush_table(&mut block, &mut out, options);

    out.join("\n")
}

fn flush_table(
    block: &mut Vec<(String, Vec<String>)>,
    out: &mut Vec<String>,
    options: &FallbackOptions,
) {
    if block.is_empty() {
        return;
    }
    let rows = std::mem::take(block);

    // Header row with no body: keep the text, drop the table.
    if rows.len() == 1 && options.skip_empty_tables {
        out.push(rows[0].0.clone());
        return;
    }

    let columns = rows.iter().map(|(_, c)| c.len()).max().unwrap_or(0);
    out.push(String::new());
    out.push(options.table_header.clone());
    out.push(String::new());
    for (i, (_, cells)) in rows.iter().enumerate() {
        out.push(render_row(cells, columns));
        if i == 0 {
            let sep: String = std::iter::once("|")
                .chain(std::iter::repeat_n(" --- |", columns))
                .collect();
            out.push(sep);
        }
    }
    out.push(String::new());
}

fn render_row(cells: &[String], columns: usize) -> String {
    let mut row = String::from("|");
    for i in 0..columns {
        let cell = cells.get(i).map(String::as_str).unwrap_or("");
        row.push(' ');
        row.push_str(cell);
        row.push_str(" |");
    }
    row
}

// ── Rule 4: Whitespace ───────────────────────────────────────────────────────

fn trim_trailing_whitespace(input: &str) -> String {
    input
        .lines()
        .map(|line| line.trim_end())
        .collect::<Vec<_>>()
        .join("\n")
}

static RE_BLANK_LINES: Lazy<Regex> = Lazy::new(|| Regex::new(r"\n{3,}").unwrap());

fn collapse_blank_lines(input: &str) -> String {
    RE_BLANK_LINES.replace_all(input, "\n\n").to_string()
}

// ── Rule 5: Final newline ────────────────────────────────────────────────────

fn ensure_final_newline(input: &str) -> String {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        String::new()
    } else {
        format!("{}\n", input.trim_start_matches('\n').trim_end())
    }
}

// ── Tests ────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn opts() -> FallbackOptions {
        FallbackOptions::default()
    }

    fn pages(texts: &[&str]) -> Vec<String> {
        texts.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn blank_document_is_empty() {
        assert_eq!(pages_to_markdown(&pages(&["", "  \n\n "]), &opts()), "");
        assert_eq!(pages_to_markdown(&[], &opts()), "");
    }

    #[test]
    fn plain_text_passes_through() {
        let md = pages_to_markdown(&pages(&["Hello world\nSecond line"]), &opts());
        assert_eq!(md, "Hello world\nSecond line\n");
    }

    #[test]
    fn pages_are_separated_by_blank_line() {
        let md = pages_to_markdown(&pages(&["Page one", "Page two"]), &opts());
        assert_eq!(md, "Page one\n\nPage two\n");
    }

    #[test]
    fn column_block_becomes_table_under_heading() {
        let text = "Intro\nName    Qty\nApple   3\nPear\t5\nOutro";
        let md = pages_to_markdown(&pages(&[text]), &opts());
        assert_eq!(
            md,
            "Intro\n\n### Table\n\n| Name | Qty |\n| --- | --- |\n| Apple | 3 |\n| Pear | 5 |\n\nOutro\n"
        );
    }

    #[test]
    fn ragged_rows_are_padded() {
        let text = "A  B  C\n1  2";
        let md = pages_to_markdown(&pages(&[text]), &opts());
        assert!(md.contains("| 1 | 2 |  |"), "got: {md}");
        assert!(md.contains("| --- | --- | --- |"), "got: {md}");
    }

    #[test]
    fn header_only_table_is_skipped_by_default() {
        let md = pages_to_markdown(&pages(&["Total    42"]), &opts());
        assert_eq!(md, "Total    42\n");
        assert!(!md.contains("### Table"));
    }

    #[test]
    fn header_only_table_kept_when_not_skipping() {
        let options = FallbackOptions {
            skip_empty_tables: false,
            ..opts()
        };
        let md = pages_to_markdown(&pages(&["Total    42"]), &options);
        assert_eq!(md, "### Table\n\n| Total | 42 |\n| --- | --- |\n");
    }

    #[test]
    fn custom_table_heading() {
        let options = FallbackOptions {
            table_header: "#### Data".into(),
            ..opts()
        };
        let md = pages_to_markdown(&pages(&["a  b\nc  d"]), &options);
        assert!(md.starts_with("#### Data\n"), "got: {md}");
    }

    #[test]
    fn pipes_inside_cells_are_escaped() {
        let md = pages_to_markdown(&pages(&["x|y  z\n1  2"]), &opts());
        assert!(md.contains("| x\\|y | z |"), "got: {md}");
    }

    #[test]
    fn headers_retained_by_default() {
        let md = pages_to_markdown(
            &pages(&["ACME Report\nBody one", "ACME Report\nBody two"]),
            &opts(),
        );
        assert_eq!(md.matches("ACME Report").count(), 2);
    }

    #[test]
    fn running_headers_removed_when_enabled() {
        let options = FallbackOptions {
            remove_headers: true,
            ..opts()
        };
        let md = pages_to_markdown(
            &pages(&[
                "ACME Report\nBody one",
                "ACME Report\nBody two",
                "Appendix\nBody three",
            ]),
            &options,
        );
        assert!(!md.contains("ACME Report"), "got: {md}");
        assert!(md.contains("Appendix"));
        assert!(md.contains("Body two"));
    }

    #[test]
    fn single_page_never_loses_its_first_line() {
        let options = FallbackOptions {
            remove_headers: true,
            ..opts()
        };
        let md = pages_to_markdown(&pages(&["Title\nBody"]), &options);
        assert!(md.starts_with("Title"));
    }

    #[test]
    fn invisible_chars_and_crlf_are_cleaned() {
        let md = pages_to_markdown(&pages(&["He\u{200B}llo\r\nWorld  \r\n"]), &opts());
        assert_eq!(md, "Hello\nWorld\n");
    }

    #[test]
    fn blank_runs_collapse_to_one_empty_line() {
        let md = pages_to_markdown(&pages(&["a\n\n\n\n\nb"]), &opts());
        assert_eq!(md, "a\n\nb\n");
    }
}
