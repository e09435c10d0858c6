use std::fmt;
use std::sync::OnceLock;

use semantic::Diagnostic;

type Compute = Box<dyn Fn() -> Vec<Diagnostic> + Send + Sync>;

/// Lazily computed diagnostics for a structure element. The computation runs
/// at most once, on the first thread that asks; results are shared after.
pub struct DiagnosticsHolder {
    compute: Compute,
    cell: OnceLock<Vec<Diagnostic>>,
}

impl DiagnosticsHolder {
    pub(crate) fn new(compute: impl Fn() -> Vec<Diagnostic> + Send + Sync + 'static) -> DiagnosticsHolder {
        DiagnosticsHolder { compute: Box::new(compute), cell: OnceLock::new() }
    }

    pub(crate) fn eager(diagnostics: Vec<Diagnostic>) -> DiagnosticsHolder {
        let holder = DiagnosticsHolder::new(Vec::new);
        let _ = holder.cell.set(diagnostics);
        holder
    }

    pub fn get(&self) -> &[Diagnostic] {
        self.cell.get_or_init(|| (self.compute)())
    }

    pub fn is_computed(&self) -> bool {
        self.cell.get().is_some()
    }
}

impl fmt::Debug for DiagnosticsHolder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DiagnosticsHolder").field("computed", &self.cell.get()).finish()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    use rowan::TextRange;
    use semantic::Diagnostic;

    use super::DiagnosticsHolder;

    #[test]
    fn test_computes_once() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        let holder = DiagnosticsHolder::new(move || {
            counter.fetch_add(1, Ordering::Relaxed);
            vec![Diagnostic::error(TextRange::empty(0.into()), "boom")]
        });
        assert!(!holder.is_computed());
        assert_eq!(holder.get().len(), 1);
        assert_eq!(holder.get().len(), 1);
        assert_eq!(calls.load(Ordering::Relaxed), 1);
    }

    #[test]
    fn test_eager() {
        let holder = DiagnosticsHolder::eager(vec![]);
        assert!(holder.is_computed());
        assert!(holder.get().is_empty());
    }
}
