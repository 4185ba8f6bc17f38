/// A non-fatal problem found while standardizing.
///
/// The offending subtree is passed through unchanged; evaluation of such a
/// tree is rejected later by the control-structure flattener.
#[derive(Debug, Clone)]
pub struct Diagnostic {
    /// The surface construct whose shape did not match, e.g. "let".
    pub construct: &'static str,
    pub reason: String,
}

impl Diagnostic {
    pub fn new(construct: &'static str, reason: impl Into<String>) -> Self {
        Diagnostic {
            construct,
            reason: reason.into(),
        }
    }
}

impl std::fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "cannot standardize '{}': {}", self.construct, self.reason)
    }
}
