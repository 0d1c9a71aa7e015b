//! Text chunking.
//!
//! Every strategy reduces to the same two steps: cut the text into small
//! segments (sentences, separator-delimited pieces, or sections), then pack
//! consecutive segments greedily into chunks of at most `chunk_size` characters,
//! repeating trailing segments totalling at most `chunk_overlap` characters at the
//! start of the next chunk. Sizes are counted in characters, offsets in bytes.

use std::ops::Range;

use ayd_config::{ChunkStrategy, ChunkingConfig};

use crate::markdown::split_sections;

/// Separators tried in order by the recursive strategy.
const RECURSIVE_SEPARATORS: &[&str] = &["\n\n", "\n", ". ", " "];

/// A chunk of text cut from a document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextChunk {
    /// Position of the chunk within its document.
    pub index: usize,
    /// The chunk text, trimmed.
    pub text: String,
    /// Byte offset of the chunk start in the source.
    pub start: usize,
    /// Byte offset one past the chunk end in the source.
    pub end: usize,
    /// Heading breadcrumb, for markdown sections.
    pub section: Option<String>,
}

/// Splits documents according to a [`ChunkingConfig`].
#[derive(Debug, Clone)]
pub struct Chunker {
    /// Active strategy.
    strategy: ChunkStrategy,
    /// Maximum chunk size in characters.
    size: usize,
    /// Characters repeated between neighbours.
    overlap: usize,
    /// Snap fixed windows to whitespace.
    respect_boundaries: bool,
    /// Trailing chunks below this size are merged backwards.
    min_size: usize,
}

impl Chunker {
    /// Creates a chunker from configuration.
    ///
    /// Out-of-range values are clamped so chunking always terminates.
    pub fn new(config: &ChunkingConfig) -> Self {
        let size = config.chunk_size.max(1);
        Self {
            strategy: config.strategy,
            size,
            overlap: config.chunk_overlap.min(size - 1),
            respect_boundaries: config.respect_boundaries,
            min_size: config.min_chunk_size,
        }
    }

    /// Splits `text` into chunks in document order.
    pub fn chunk(&self, text: &str) -> Vec<TextChunk> {
        let pieces: Vec<(Range<usize>, Option<String>)> = match self.strategy {
            ChunkStrategy::Sentence => self.pack(text, &self.sentence_segments(text, 0..text.len())),
            ChunkStrategy::Recursive => {
                let segments = self.recursive_segments(text, 0..text.len(), RECURSIVE_SEPARATORS);
                self.pack(text, &segments)
            }
            ChunkStrategy::Fixed => self.fixed_windows(text),
            ChunkStrategy::Markdown => return self.chunk_markdown(text),
        }
        .into_iter()
        .map(|r| (r, None))
        .collect();

        self.finish(text, pieces)
    }

    /// Chunks markdown section by section, tagging chunks with their breadcrumb.
    fn chunk_markdown(&self, text: &str) -> Vec<TextChunk> {
        let mut pieces = Vec::new();
        for section in split_sections(text) {
            let range = section.start..section.end;
            let label = Some(section.breadcrumb).filter(|b| !b.is_empty());
            let ranges = if char_len(text, &range) <= self.size {
                vec![range]
            } else {
                self.pack(text, &self.sentence_segments(text, range))
            };
            pieces.extend(ranges.into_iter().map(|r| (r, label.clone())));
        }
        self.finish(text, pieces)
    }

    /// Trims ranges, drops empty ones, merges a short tail, and numbers the result.
    fn finish(&self, text: &str, pieces: Vec<(Range<usize>, Option<String>)>) -> Vec<TextChunk> {
        let mut kept: Vec<(Range<usize>, Option<String>)> = pieces
            .into_iter()
            .filter_map(|(r, label)| {
                let r = trim_range(text, r);
                (!r.is_empty()).then_some((r, label))
            })
            .collect();

        if kept.len() >= 2 {
            let last = kept.len() - 1;
            let (tail, tail_label) = kept[last].clone();
            let (prev, prev_label) = &kept[last - 1];
            let merged = prev.start..tail.end;
            if char_len(text, &tail) < self.min_size
                && *prev_label == tail_label
                && char_len(text, &merged) <= self.size + self.overlap
            {
                kept[last - 1].0 = merged;
                kept.pop();
            }
        }

        kept.into_iter()
            .enumerate()
            .map(|(index, (r, section))| TextChunk {
                index,
                text: text[r.clone()].to_string(),
                start: r.start,
                end: r.end,
                section,
            })
            .collect()
    }

    /// Greedily packs segments into chunks with overlap.
    fn pack(&self, text: &str, segments: &[Range<usize>]) -> Vec<Range<usize>> {
        let mut chunks = Vec::new();
        let mut i = 0;
        while i < segments.len() {
            let start = segments[i].start;
            let mut j = i;
            while j + 1 < segments.len() && char_len(text, &(start..segments[j + 1].end)) <= self.size
            {
                j += 1;
            }
            chunks.push(start..segments[j].end);
            if j + 1 >= segments.len() {
                break;
            }

            // Walk back over trailing segments that fit in the overlap budget.
            let mut next = j + 1;
            let mut k = j;
            while k > i && char_len(text, &(segments[k].start..segments[j].end)) <= self.overlap {
                next = k;
                k -= 1;
            }
            // The next chunk must still have room for the first new segment.
            let must = j + 1;
            while next < must
                && char_len(text, &(segments[next].start..segments[must].end)) > self.size
            {
                next += 1;
            }
            i = next;
        }
        chunks
    }

    /// Cuts `range` into trimmed sentences, splitting any longer than the chunk size.
    fn sentence_segments(&self, text: &str, range: Range<usize>) -> Vec<Range<usize>> {
        let slice = &text[range.clone()];
        let mut segments = Vec::new();
        let mut seg_start = 0;
        let mut chars = slice.char_indices().peekable();

        while let Some((_, c)) = chars.next() {
            let boundary = match c {
                '.' | '!' | '?' => {
                    // Absorb closing quotes and brackets after the terminator.
                    while let Some(&(_, next)) = chars.peek() {
                        if matches!(next, '"' | '\'' | ')' | ']' | '\u{201d}' | '\u{2019}') {
                            chars.next();
                        } else {
                            break;
                        }
                    }
                    chars.peek().is_none_or(|&(_, next)| next.is_whitespace())
                }
                '\n' => chars.peek().is_some_and(|&(_, next)| next == '\n'),
                _ => false,
            };
            if boundary {
                let end = chars.peek().map_or(slice.len(), |&(i, _)| i);
                segments.push(range.start + seg_start..range.start + end);
                seg_start = end;
            }
        }
        if seg_start < slice.len() {
            segments.push(range.start + seg_start..range.end);
        }

        segments
            .into_iter()
            .map(|r| trim_range(text, r))
            .filter(|r| !r.is_empty())
            .flat_map(|r| self.split_oversized(text, r))
            .collect()
    }

    /// Splits a range on separators, recursing into pieces that are still too long.
    fn recursive_segments(
        &self,
        text: &str,
        range: Range<usize>,
        separators: &[&str],
    ) -> Vec<Range<usize>> {
        let range = trim_range(text, range);
        if range.is_empty() {
            return Vec::new();
        }
        if char_len(text, &range) <= self.size {
            return vec![range];
        }
        let Some((separator, finer)) = separators.split_first() else {
            return self.split_oversized(text, range);
        };

        let slice = &text[range.clone()];
        let mut pieces = Vec::new();
        let mut piece_start = 0;
        for (pos, _) in slice.match_indices(separator) {
            let end = pos + separator.len();
            pieces.push(range.start + piece_start..range.start + end);
            piece_start = end;
        }
        pieces.push(range.start + piece_start..range.end);

        if pieces.len() == 1 {
            return self.recursive_segments(text, range, finer);
        }
        pieces
            .into_iter()
            .flat_map(|piece| self.recursive_segments(text, piece, finer))
            .collect()
    }

    /// Splits a segment longer than the chunk size on whitespace, hard-splitting
    /// single words that are longer still.
    fn split_oversized(&self, text: &str, range: Range<usize>) -> Vec<Range<usize>> {
        if char_len(text, &range) <= self.size {
            return vec![range];
        }

        let mut words = Vec::new();
        let slice = &text[range.clone()];
        let mut word_start: Option<usize> = None;
        for (idx, c) in slice.char_indices() {
            match (c.is_whitespace(), word_start) {
                (true, Some(s)) => {
                    words.push(range.start + s..range.start + idx);
                    word_start = None;
                }
                (false, None) => word_start = Some(idx),
                _ => {}
            }
        }
        if let Some(s) = word_start {
            words.push(range.start + s..range.end);
        }

        let words: Vec<Range<usize>> = words
            .into_iter()
            .flat_map(|w| hard_split(text, w, self.size))
            .collect();

        // Pack words without overlap into pieces no longer than the chunk size.
        let mut pieces: Vec<Range<usize>> = Vec::new();
        for word in words {
            match pieces.last_mut() {
                Some(last) if char_len(text, &(last.start..word.end)) <= self.size => {
                    last.end = word.end;
                }
                _ => pieces.push(word),
            }
        }
        pieces
    }

    /// Cuts fixed windows of `size` characters advancing by `size - overlap`.
    fn fixed_windows(&self, text: &str) -> Vec<Range<usize>> {
        let offsets: Vec<usize> = text
            .char_indices()
            .map(|(i, _)| i)
            .chain([text.len()])
            .collect();
        let total = offsets.len() - 1;
        let mut windows = Vec::new();
        let mut start = 0;

        while start < total {
            let mut end = (start + self.size).min(total);
            if self.respect_boundaries && end < total {
                let window = &text[offsets[start]..offsets[end]];
                // Back up to the last whitespace, unless that would empty the window.
                if let Some(pos) = window.rfind(char::is_whitespace)
                    && pos > 0
                {
                    end = start + window[..pos].chars().count();
                }
            }
            windows.push(offsets[start]..offsets[end]);
            if end >= total {
                break;
            }

            let mut next = end.saturating_sub(self.overlap).max(start + 1);
            if self.respect_boundaries {
                // Move forward to the start of a word.
                while next < end && !is_word_start(text, &offsets, next) {
                    next += 1;
                }
            }
            start = next;
        }
        windows
    }
}

/// Returns true if the character at char index `i` begins a word.
fn is_word_start(text: &str, offsets: &[usize], i: usize) -> bool {
    let current = text[offsets[i]..].chars().next();
    let previous = text[..offsets[i]].chars().next_back();
    current.is_some_and(|c| !c.is_whitespace()) && previous.is_none_or(char::is_whitespace)
}

/// Cuts a range into pieces of at most `size` characters.
fn hard_split(text: &str, range: Range<usize>, size: usize) -> Vec<Range<usize>> {
    if char_len(text, &range) <= size {
        return vec![range];
    }
    let mut pieces = Vec::new();
    let mut piece_start = range.start;
    let mut count = 0;
    for (idx, _) in text[range.clone()].char_indices() {
        if count == size {
            pieces.push(piece_start..range.start + idx);
            piece_start = range.start + idx;
            count = 0;
        }
        count += 1;
    }
    pieces.push(piece_start..range.end);
    pieces
}

/// Shrinks a range to exclude leading and trailing whitespace.
fn trim_range(text: &str, range: Range<usize>) -> Range<usize> {
    let slice = &text[range.clone()];
    let leading = slice.len() - slice.trim_start().len();
    let trailing = slice.len() - slice.trim_end().len();
    if leading == slice.len() {
        return range.start..range.start;
    }
    range.start + leading..range.end - trailing
}

/// Number of characters in a byte range.
fn char_len(text: &str, range: &Range<usize>) -> usize {
    text[range.clone()].chars().count()
}
