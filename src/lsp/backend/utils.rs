use ropey::{Rope, RopeSlice};
use tower_lsp::lsp_types::{SemanticToken, SemanticTokenType, SemanticTokensLegend};

use crate::data::{ClassificationResult, HighlightCache, Style};

/// Token types in legend order; a token's type is its index here.
pub(super) const TOKEN_TYPES: [SemanticTokenType; 3] = [
    SemanticTokenType::NAMESPACE,
    SemanticTokenType::KEYWORD,
    SemanticTokenType::VARIABLE,
];

pub(super) fn legend() -> SemanticTokensLegend {
    SemanticTokensLegend { token_types: TOKEN_TYPES.to_vec(), token_modifiers: vec![] }
}

pub(super) fn token_type(style: Style) -> u32 {
    match style {
        Style::TableHeader => 0,
        Style::SettingName => 1,
        Style::VariableName => 2,
    }
}

/// Builds delta-encoded semantic tokens from absolute positions.
///
/// Tokens must be pushed in document order.
pub(super) struct SemanticTokensBuilder {
    tokens: Vec<SemanticToken>,
    prev_line: u32,
    prev_start: u32,
}

impl SemanticTokensBuilder {
    pub(super) fn new() -> Self {
        Self { tokens: Vec::new(), prev_line: 0, prev_start: 0 }
    }

    /// Adds the span of `result` on `line`, whose text is `text`. Columns are
    /// re-counted in UTF-16 code units. Unstyled and empty spans produce no token.
    pub(super) fn push_result(&mut self, line: u32, text: RopeSlice<'_>, result: &ClassificationResult) {
        let Some(style) = result.style else {
            return;
        };
        if result.is_empty() {
            return;
        }
        let utf16 = |column: usize| text.char_to_utf16_cu(column.min(text.len_chars())) as u32;
        let start = utf16(result.start);
        self.push(line, start, utf16(result.end) - start, token_type(style));
    }

    fn push(&mut self, line: u32, start: u32, length: u32, token_type: u32) {
        let delta_line = line.saturating_sub(self.prev_line);
        let delta_start = if delta_line == 0 { start.saturating_sub(self.prev_start) } else { start };

        self.tokens.push(SemanticToken {
            delta_line,
            delta_start,
            length,
            token_type,
            token_modifiers_bitset: 0,
        });

        self.prev_line = line;
        self.prev_start = start;
    }

    pub(super) fn build(self) -> Vec<SemanticToken> {
        self.tokens
    }
}

/// Tokens for the cached lines of `text` in `first..=last` (clamped to the document).
pub(super) fn tokens_for_lines(
    highlights: &HighlightCache,
    text: &Rope,
    first: usize,
    last: usize,
) -> Vec<SemanticToken> {
    let mut builder = SemanticTokensBuilder::new();
    let last = last.min(highlights.len().min(text.len_lines()).saturating_sub(1));
    for line in first..=last {
        if let Some(result) = highlights.result(line) {
            builder.push_result(line as u32, text.line(line), &result);
        }
    }
    builder.build()
}
