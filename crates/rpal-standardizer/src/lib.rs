pub mod error;
pub mod rewrite;
mod tests;

pub use error::Diagnostic;

use rpal_ast::Node;

/// The result of standardization.
pub struct Standardized {
    /// The rewritten tree.
    pub tree: Node,
    /// Shape mismatches found on the way; the corresponding subtrees were
    /// passed through unchanged.
    pub diagnostics: Vec<Diagnostic>,
}

/// Rewrite an AST into the Standardized Tree.
///
/// Performs a post-order traversal; children are standardized before their
/// parents, so each rewrite sees already-standardized subtrees. After this
/// pass a well-formed tree contains only `gamma`, `lambda`, `=`, `Y`,
/// `tau`, `,`, `->`, operator tags, and leaves.
pub fn standardize(ast: Node) -> Standardized {
    let mut diagnostics = Vec::new();
    let tree = rewrite::standardize_subtree(ast, &mut diagnostics);
    Standardized { tree, diagnostics }
}
