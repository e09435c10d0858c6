use std::sync::Arc;

use rowan::{TextRange, TextSize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Severity {
    Error,
    Warning,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    pub severity: Severity,
    pub range: TextRange,
    pub message: Arc<str>,
}

impl Diagnostic {
    pub fn error(range: TextRange, message: impl Into<Arc<str>>) -> Diagnostic {
        Diagnostic { severity: Severity::Error, range, message: message.into() }
    }

    pub fn warning(range: TextRange, message: impl Into<Arc<str>>) -> Diagnostic {
        Diagnostic { severity: Severity::Warning, range, message: message.into() }
    }

    pub fn at_offset(offset: u32, message: impl Into<Arc<str>>) -> Diagnostic {
        let offset = TextSize::from(offset);
        Diagnostic::error(TextRange::empty(offset), message)
    }
}
