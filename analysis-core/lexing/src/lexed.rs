use syntax::SyntaxKind;

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct LexError {
    pub(crate) index: u32,
    pub(crate) message: String,
}

/// The output of the lexer: token kinds over a source string, with byte
/// offsets and per-token error messages. The final token is always
/// [`SyntaxKind::END_OF_FILE`].
#[derive(Debug)]
pub struct Lexed<'s> {
    source: &'s str,
    kinds: Vec<SyntaxKind>,
    offsets: Vec<u32>,
    errors: Vec<LexError>,
}

impl<'s> Lexed<'s> {
    pub(crate) fn new(
        source: &'s str,
        kinds: Vec<SyntaxKind>,
        offsets: Vec<u32>,
        errors: Vec<LexError>,
    ) -> Lexed<'s> {
        debug_assert_eq!(offsets.len(), kinds.len() + 1);
        Lexed { source, kinds, offsets, errors }
    }

    /// The number of tokens, including the end-of-file token.
    pub fn len(&self) -> usize {
        self.kinds.len()
    }

    pub fn is_empty(&self) -> bool {
        self.kinds.is_empty()
    }

    pub fn kind(&self, index: usize) -> SyntaxKind {
        self.kinds[index]
    }

    pub fn text(&self, index: usize) -> &'s str {
        let start = self.offsets[index] as usize;
        let end = self.offsets[index + 1] as usize;
        &self.source[start..end]
    }

    /// The byte offset at which the token starts.
    pub fn offset(&self, index: usize) -> u32 {
        self.offsets[index]
    }

    pub fn error(&self, index: usize) -> Option<&str> {
        let index = index as u32;
        let position = self.errors.binary_search_by_key(&index, |error| error.index).ok()?;
        Some(&self.errors[position].message)
    }

    pub fn kinds(&self) -> impl Iterator<Item = SyntaxKind> + '_ {
        self.kinds.iter().copied()
    }
}
