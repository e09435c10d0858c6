use crate::SyntaxKind;

const LAST_KIND: usize = SyntaxKind::Error as usize;

#[derive(Clone, Copy)]
pub struct TokenSet(u128);

impl TokenSet {
    pub const fn new(kinds: &[SyntaxKind]) -> TokenSet {
        let mut set = 0u128;
        let mut index = 0;
        while index < kinds.len() {
            let kind = kinds[index] as usize;
            debug_assert!(kind <= LAST_KIND, "Invalid kind");
            set |= 1 << kind;
            index += 1;
        }
        TokenSet(set)
    }

    pub const fn union(self, other: TokenSet) -> TokenSet {
        TokenSet(self.0 | other.0)
    }

    pub const fn contains(&self, kind: SyntaxKind) -> bool {
        let kind = kind as usize;
        debug_assert!(kind <= LAST_KIND, "Invalid kind");
        self.0 & (1 << kind) != 0
    }
}

#[test]
fn test_token_set() {
    let set = TokenSet::new(&[SyntaxKind::FUN]);
    assert!(set.contains(SyntaxKind::FUN));
    assert!(!set.contains(SyntaxKind::LEFT_PAREN));
    let set = TokenSet::new(&[SyntaxKind::VAL, SyntaxKind::VAR]).union(set);
    assert!(set.contains(SyntaxKind::FUN));
    assert!(set.contains(SyntaxKind::VAL));
    assert!(set.contains(SyntaxKind::VAR));
    assert!(!set.contains(SyntaxKind::LEFT_PAREN));
}
