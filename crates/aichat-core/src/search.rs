//! Find / find-next over the displayed response text
//!
//! Matching is case-insensitive. Offsets are byte offsets into the original
//! (unfolded) text, so a `Found` span can be used to slice the haystack
//! directly.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchOutcome {
    /// Half-open byte span of the match.
    Found { start: usize, end: usize },
    NotFound,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchState {
    needle: String,
    term: String,
    cursor: usize,
}

impl SearchState {
    /// Begin a new search at the caller's current view position.
    pub fn start(needle: &str, cursor: usize) -> Self {
        Self {
            needle: needle.chars().flat_map(char::to_lowercase).collect(),
            term: needle.to_string(),
            cursor,
        }
    }

    /// The search term as entered, for "not found" notices.
    pub fn term(&self) -> &str {
        &self.term
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn is_empty(&self) -> bool {
        self.needle.is_empty()
    }

    /// Scan forward from the cursor.
    ///
    /// A miss resets the cursor to the start of the text but does not rescan
    /// in the same call. An empty needle never matches and leaves the cursor
    /// where it was.
    pub fn find_next(&mut self, haystack: &str) -> SearchOutcome {
        if self.needle.is_empty() {
            return SearchOutcome::NotFound;
        }

        let from = ceil_char_boundary(haystack, self.cursor);
        let folded = FoldedText::new(&haystack[from..]);

        match folded.text.find(&self.needle) {
            Some(idx) => {
                let start = from + folded.source_start(idx);
                let end = from + folded.source_end(idx + self.needle.len());
                self.cursor = end;
                SearchOutcome::Found { start, end }
            }
            None => {
                self.cursor = 0;
                SearchOutcome::NotFound
            }
        }
    }
}

/// Lowercased copy of a text with a map back to the original byte offsets.
struct FoldedText {
    text: String,
    // For each byte of `text`: (start, end) of the source char it came from
    origin: Vec<(usize, usize)>,
}

impl FoldedText {
    fn new(source: &str) -> Self {
        let mut text = String::with_capacity(source.len());
        let mut origin = Vec::with_capacity(source.len());

        for (i, c) in source.char_indices() {
            let span = (i, i + c.len_utf8());
            for lower in c.to_lowercase() {
                text.push(lower);
                origin.extend(std::iter::repeat(span).take(lower.len_utf8()));
            }
        }

        Self { text, origin }
    }

    fn source_start(&self, folded_idx: usize) -> usize {
        self.origin[folded_idx].0
    }

    fn source_end(&self, folded_end: usize) -> usize {
        // folded_end is exclusive and the needle is non-empty
        self.origin[folded_end - 1].1
    }
}

fn ceil_char_boundary(s: &str, idx: usize) -> usize {
    if idx >= s.len() {
        return s.len();
    }
    let mut i = idx;
    while !s.is_char_boundary(i) {
        i += 1;
    }
    i
}
