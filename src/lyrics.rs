//! Lyric markup tokenizer. Raw lyrics are plain text where `**text**` marks a
//! bold span. Each input line becomes one [`LyricLine`] made of bold and plain
//! runs; no markup is ever interpreted beyond that pairing.

/// Marker delimiting bold spans.
const BOLD_MARKER: &str = "**";

/// Extra spacing (in pixels) above a section marker line.
pub const SECTION_SPACING_BEFORE: u32 = 24;
/// Spacing (in pixels) below a section marker line.
pub const SECTION_SPACING_AFTER: u32 = 8;
/// Spacing (in pixels) below every other line.
pub const LINE_SPACING_AFTER: u32 = 4;

/// A contiguous piece of a line rendered with a single weight.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Run {
    pub text: String,
    pub bold: bool,
}

impl Run {
    fn plain(text: &str) -> Self {
        Self {
            text: text.to_string(),
            bold: false,
        }
    }

    fn bold(text: &str) -> Self {
        Self {
            text: text.to_string(),
            bold: true,
        }
    }
}

/// One rendered lyric line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LyricLine {
    pub runs: Vec<Run>,
    /// Set when the raw line holds an all-caps `**...**` span (`CHORUS`,
    /// `VERSE 1`, `PRE-CHORUS`). This is a heuristic on the text only, so
    /// any all-caps marked span triggers it.
    pub section_marker: bool,
}

impl LyricLine {
    /// Line text with markers removed.
    pub fn plain_text(&self) -> String {
        self.runs.iter().map(|run| run.text.as_str()).collect()
    }

    /// Vertical spacing `(before, after)` in pixels.
    pub fn spacing(&self) -> (u32, u32) {
        if self.section_marker {
            (SECTION_SPACING_BEFORE, SECTION_SPACING_AFTER)
        } else {
            (0, LINE_SPACING_AFTER)
        }
    }
}

/// Split raw lyrics into styled lines. Empty input yields no lines; otherwise
/// every `\n` separated line (a trailing `\r` is dropped) yields exactly one
/// output line, in order.
pub fn format_lyrics(lyrics: &str) -> Vec<LyricLine> {
    if lyrics.is_empty() {
        return Vec::new();
    }
    lyrics
        .split('\n')
        .map(|line| format_line(line.strip_suffix('\r').unwrap_or(line)))
        .collect()
}

/// Tokenize a single line into bold/plain runs. Pairs are matched left to
/// right with the nearest closing marker; an unpaired trailing `**` stays in
/// the text as literal characters.
pub fn format_line(line: &str) -> LyricLine {
    let mut runs = Vec::new();
    let mut rest = line;

    while let Some(open) = rest.find(BOLD_MARKER) {
        let after_open = &rest[open + BOLD_MARKER.len()..];
        let Some(close) = after_open.find(BOLD_MARKER) else {
            break;
        };
        if open > 0 {
            runs.push(Run::plain(&rest[..open]));
        }
        let inner = &after_open[..close];
        if !inner.is_empty() {
            runs.push(Run::bold(inner));
        }
        rest = &after_open[close + BOLD_MARKER.len()..];
    }
    if !rest.is_empty() {
        runs.push(Run::plain(rest));
    }

    LyricLine {
        runs,
        section_marker: has_section_marker(line),
    }
}

/// Whether the raw line holds `**` + an uppercase letter + uppercase
/// letters, digits, whitespace or hyphens + `**` anywhere. Markers are
/// matched on the raw text, so a closing marker may also open the heading
/// (`**a**B**` counts through `**B**`).
fn has_section_marker(line: &str) -> bool {
    let mut opens = line
        .char_indices()
        .map(|(idx, _)| idx)
        .filter(|&idx| line[idx..].starts_with(BOLD_MARKER));
    opens.any(|open| {
        let mut chars = line[open + BOLD_MARKER.len()..].char_indices();
        match chars.next() {
            Some((_, first)) if first.is_ascii_uppercase() => {}
            _ => return false,
        }
        let body_end = chars
            .find(|&(_, ch)| {
                !(ch.is_ascii_uppercase() || ch.is_ascii_digit() || ch.is_whitespace() || ch == '-')
            })
            .map(|(idx, _)| idx);
        body_end.is_some_and(|idx| line[open + BOLD_MARKER.len() + idx..].starts_with(BOLD_MARKER))
    })
}
