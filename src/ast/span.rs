use super::SourceRange;

/// Source snippet of a call expression plus the 1-based line it starts on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallSpan {
    pub text: String,
    pub line: usize,
}

/// Cut the text covered by `range` out of `source`.
///
/// Runs of whitespace inside the snippet are collapsed so that calls spread
/// over several lines read as one line in failure messages. Returns `None`
/// if the range does not fall on character boundaries inside `source`.
pub fn extract_call_span(range: SourceRange, source: &str) -> Option<CallSpan> {
    let snippet = source.get(range.start..range.end())?;
    let text = snippet.split_whitespace().collect::<Vec<_>>().join(" ");
    let line = line_at(source, range.start)?;
    Some(CallSpan { text, line })
}

/// 1-based line of byte `offset` in `source`.
pub fn line_at(source: &str, offset: usize) -> Option<usize> {
    source
        .get(..offset)
        .map(|prefix| prefix.matches('\n').count() + 1)
}
