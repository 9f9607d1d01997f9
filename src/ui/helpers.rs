use anyhow::Error;
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};

use crate::lyrics::LyricLine;

/// Blank rows kept above and below the lyrics so the first and last lines can
/// clear the overlaid header and controls.
pub(crate) const LYRIC_PADDING_ROWS: usize = 3;

/// Pixel height of one rendered row at `font_size`. Scroll speed is expressed
/// in pixels per second, so rows are mapped back onto that scale.
pub(crate) fn line_height_px(font_size: u32) -> u32 {
    (font_size * 6 / 5).max(1)
}

/// Parse `#rrggbb` into a terminal colour. Anything else falls back to the
/// terminal default.
pub(crate) fn parse_hex_color(raw: &str) -> Option<Color> {
    let hex = raw.trim().strip_prefix('#')?;
    if hex.len() != 6 || !hex.chars().all(|ch| ch.is_ascii_hexdigit()) {
        return None;
    }
    let channel = |range: std::ops::Range<usize>| u8::from_str_radix(&hex[range], 16).ok();
    Some(Color::Rgb(channel(0..2)?, channel(2..4)?, channel(4..6)?))
}

/// Whole rows closest to `px` pixels of spacing at `line_px` per row.
fn spacer_rows(px: u32, line_px: u32) -> usize {
    ((px + line_px / 2) / line_px) as usize
}

/// Lay out formatted lyrics as terminal rows of at most `width` cells. Bold
/// runs keep their modifier across wrapped rows, and each line's pixel
/// spacing becomes blank rows at the height of `font_size`.
pub(crate) fn lyric_rows(lines: &[LyricLine], width: u16, font_size: u32) -> Vec<Line<'static>> {
    let width = usize::from(width.max(1));
    let line_px = line_height_px(font_size);
    let mut rows: Vec<Line<'static>> = Vec::new();
    rows.extend((0..LYRIC_PADDING_ROWS).map(|_| Line::from("")));

    for line in lines {
        let (before, after) = line.spacing();
        rows.extend((0..spacer_rows(before, line_px)).map(|_| Line::from("")));
        push_wrapped(&mut rows, line, width);
        rows.extend((0..spacer_rows(after, line_px)).map(|_| Line::from("")));
    }

    rows.extend((0..LYRIC_PADDING_ROWS).map(|_| Line::from("")));
    rows
}

fn push_wrapped(rows: &mut Vec<Line<'static>>, line: &LyricLine, width: usize) {
    if line.runs.is_empty() {
        rows.push(Line::from(""));
        return;
    }

    let mut current: Vec<Span<'static>> = Vec::new();
    let mut used = 0usize;
    for run in &line.runs {
        let style = if run.bold {
            Style::default().add_modifier(Modifier::BOLD)
        } else {
            Style::default()
        };
        let mut chunk = String::new();
        for ch in run.text.chars() {
            if used == width {
                if !chunk.is_empty() {
                    current.push(Span::styled(std::mem::take(&mut chunk), style));
                }
                rows.push(Line::from(std::mem::take(&mut current)));
                used = 0;
            }
            chunk.push(ch);
            used += 1;
        }
        if !chunk.is_empty() {
            current.push(Span::styled(chunk, style));
        }
    }
    rows.push(Line::from(current));
}

/// Text progress bar filling `width` cells for a percentage in `[0, 100]`.
pub(crate) fn progress_bar(progress: f64, width: u16) -> String {
    let width = usize::from(width);
    let filled = ((progress.clamp(0.0, 100.0) / 100.0) * width as f64).round() as usize;
    let mut bar = "█".repeat(filled.min(width));
    bar.push_str(&"░".repeat(width.saturating_sub(filled)));
    bar
}

/// Produce a rectangle centered within `area` that spans the requested percent
/// of the width and height. Used for modal dialogs.
pub(crate) fn centered_rect(percent_x: u16, percent_y: u16, area: Rect) -> Rect {
    let horizontal = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(area);

    let vertical = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(horizontal[1]);

    vertical[1]
}

/// Extract the most relevant error message from a chained error.
pub(crate) fn surface_error(err: &Error) -> String {
    err.chain()
        .last()
        .map(|cause| cause.to_string())
        .unwrap_or_else(|| err.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lyrics::format_lyrics;

    fn row_text(line: &Line<'_>) -> String {
        line.spans.iter().map(|span| span.content.as_ref()).collect()
    }

    #[test]
    fn hex_colors() {
        assert_eq!(parse_hex_color("#1f2937"), Some(Color::Rgb(0x1f, 0x29, 0x37)));
        assert_eq!(parse_hex_color(" #FFFFFF "), Some(Color::Rgb(255, 255, 255)));
        assert_eq!(parse_hex_color("1f2937"), None);
        assert_eq!(parse_hex_color("#12345"), None);
        assert_eq!(parse_hex_color("#gg0000"), None);
    }

    #[test]
    fn rows_add_spacer_before_sections() {
        let lines = format_lyrics("Intro line\n**CHORUS**\nSing");
        let rows = lyric_rows(&lines, 40, 18);
        let texts: Vec<String> = rows.iter().map(row_text).collect();
        let body = &texts[LYRIC_PADDING_ROWS..texts.len() - LYRIC_PADDING_ROWS];
        assert_eq!(body, ["Intro line", "", "CHORUS", "Sing"]);
        let chorus = &rows[LYRIC_PADDING_ROWS + 2];
        assert!(chorus.spans[0].style.add_modifier.contains(Modifier::BOLD));
    }

    #[test]
    fn spacing_rows_follow_font_height() {
        let lines = format_lyrics("Intro line\n**CHORUS**\nSing");
        let rows = lyric_rows(&lines, 40, 10);
        let texts: Vec<String> = rows.iter().map(row_text).collect();
        let body = &texts[LYRIC_PADDING_ROWS..texts.len() - LYRIC_PADDING_ROWS];
        assert_eq!(body, ["Intro line", "", "", "CHORUS", "", "Sing"]);

        let rows = lyric_rows(&format_lyrics("**VERSE 1**\nGo"), 40, 48);
        let texts: Vec<String> = rows.iter().map(row_text).collect();
        let body = &texts[LYRIC_PADDING_ROWS..texts.len() - LYRIC_PADDING_ROWS];
        assert_eq!(body, ["VERSE 1", "Go"]);
    }

    #[test]
    fn rows_wrap_long_lines_keeping_style() {
        let lines = format_lyrics("ab**cdef**");
        let rows = lyric_rows(&lines, 3, 18);
        let body: Vec<String> = rows[LYRIC_PADDING_ROWS..rows.len() - LYRIC_PADDING_ROWS]
            .iter()
            .map(row_text)
            .collect();
        assert_eq!(body, ["abc", "def"]);
        let second = &rows[LYRIC_PADDING_ROWS + 1];
        assert!(second.spans[0].style.add_modifier.contains(Modifier::BOLD));
    }

    #[test]
    fn progress_bar_fills_proportionally() {
        assert_eq!(progress_bar(50.0, 4), "██░░");
        assert_eq!(progress_bar(0.0, 3), "░░░");
        assert_eq!(progress_bar(150.0, 2), "██");
    }

    #[test]
    fn line_height_scales_with_font() {
        assert_eq!(line_height_px(18), 21);
        assert_eq!(line_height_px(48), 57);
    }

    #[test]
    fn surface_error_prefers_root_cause() {
        let err = anyhow::anyhow!("disk full").context("failed to save songs");
        assert_eq!(surface_error(&err), "disk full");
    }
}
