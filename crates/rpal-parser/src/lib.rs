pub mod error;
pub mod parser;

pub use error::SyntaxError;

use rpal_ast::Node;
use rpal_lexer::SpannedToken;

/// Parse a token stream into an AST.
pub fn parse(tokens: Vec<SpannedToken>) -> Result<Node, SyntaxError> {
    parser::Parser::new(tokens).parse()
}

/// Lex and parse source code, formatting any error as a string.
///
/// Convenience entry point for tests and downstream stages that don't care
/// which stage failed; the CLI uses the typed APIs instead.
pub fn parse_tree(source: &str) -> Result<Node, String> {
    let tokens = rpal_lexer::lex(source).map_err(|errs| {
        errs.iter()
            .map(|e| e.to_string())
            .collect::<Vec<_>>()
            .join("\n")
    })?;
    parse(tokens).map_err(|e| e.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rpal_ast::NodeValue;

    // ─── Acceptance ──────────────────────────────────────────

    #[test]
    fn test_simple_let() {
        let tree = parse_tree("let x = 5 in x + 3").expect("parse failed");
        let expected = "\
let
.=
..<ID:x>
..<INT:5>
.+
..<ID:x>
..<INT:3>
";
        assert_eq!(tree.to_text(), expected);
    }

    #[test]
    fn test_where_mirror_of_let() {
        let tree = parse_tree("x + 3 where x = 5").expect("parse failed");
        assert_eq!(tree.value, NodeValue::Where);
        assert_eq!(tree.child_count(), 2);
        assert_eq!(tree.nth_child(0).unwrap().value, NodeValue::Plus);
        assert_eq!(tree.nth_child(1).unwrap().value, NodeValue::Equal);
    }

    #[test]
    fn test_fn_multi_param() {
        let tree = parse_tree("fn x y . x * y").expect("parse failed");
        assert_eq!(tree.value, NodeValue::Lambda);
        // two bound variables plus the body
        assert_eq!(tree.child_count(), 3);
        assert_eq!(
            tree.nth_child(0).unwrap().value,
            NodeValue::Id("x".to_string())
        );
        assert_eq!(
            tree.nth_child(1).unwrap().value,
            NodeValue::Id("y".to_string())
        );
        assert_eq!(tree.nth_child(2).unwrap().value, NodeValue::Times);
    }

    #[test]
    fn test_application_is_left_associative() {
        let tree = parse_tree("f x y").expect("parse failed");
        // gamma ( gamma (f, x), y )
        assert_eq!(tree.value, NodeValue::Gamma);
        let inner = tree.nth_child(0).unwrap();
        assert_eq!(inner.value, NodeValue::Gamma);
        assert_eq!(
            inner.nth_child(0).unwrap().value,
            NodeValue::Id("f".to_string())
        );
        assert_eq!(
            inner.nth_child(1).unwrap().value,
            NodeValue::Id("x".to_string())
        );
        assert_eq!(
            tree.nth_child(1).unwrap().value,
            NodeValue::Id("y".to_string())
        );
    }

    #[test]
    fn test_precedence_mul_over_add() {
        let tree = parse_tree("1 + 2 * 3").expect("parse failed");
        // + (1, * (2, 3))
        assert_eq!(tree.value, NodeValue::Plus);
        assert_eq!(tree.nth_child(0).unwrap().value, NodeValue::Int(1));
        let mul = tree.nth_child(1).unwrap();
        assert_eq!(mul.value, NodeValue::Times);
        assert_eq!(mul.nth_child(0).unwrap().value, NodeValue::Int(2));
        assert_eq!(mul.nth_child(1).unwrap().value, NodeValue::Int(3));
    }

    #[test]
    fn test_power_right_associative() {
        let tree = parse_tree("2 ** 3 ** 2").expect("parse failed");
        // ** (2, ** (3, 2))
        assert_eq!(tree.value, NodeValue::Power);
        assert_eq!(tree.nth_child(0).unwrap().value, NodeValue::Int(2));
        let inner = tree.nth_child(1).unwrap();
        assert_eq!(inner.value, NodeValue::Power);
        assert_eq!(inner.nth_child(0).unwrap().value, NodeValue::Int(3));
        assert_eq!(inner.nth_child(1).unwrap().value, NodeValue::Int(2));
    }

    #[test]
    fn test_unary_minus_is_neg() {
        let tree = parse_tree("-1 + 2").expect("parse failed");
        // + (neg (1), 2)
        assert_eq!(tree.value, NodeValue::Plus);
        let neg = tree.nth_child(0).unwrap();
        assert_eq!(neg.value, NodeValue::Neg);
        assert_eq!(neg.nth_child(0).unwrap().value, NodeValue::Int(1));
    }

    #[test]
    fn test_conditional() {
        let tree = parse_tree("x eq 0 -> 1 | 2").expect("parse failed");
        assert_eq!(tree.value, NodeValue::Arrow);
        assert_eq!(tree.child_count(), 3);
        assert_eq!(tree.nth_child(0).unwrap().value, NodeValue::Eq);
        assert_eq!(tree.nth_child(1).unwrap().value, NodeValue::Int(1));
        assert_eq!(tree.nth_child(2).unwrap().value, NodeValue::Int(2));
    }

    #[test]
    fn test_symbolic_comparison_aliases() {
        // '>' parses to the same tag as 'gr', and so on
        let sym = parse_tree("a > b").expect("parse failed");
        let word = parse_tree("a gr b").expect("parse failed");
        assert_eq!(sym.to_text(), word.to_text());
    }

    #[test]
    fn test_tuple_and_tau() {
        let tree = parse_tree("1, 2, 3").expect("parse failed");
        assert_eq!(tree.value, NodeValue::Tau);
        assert_eq!(tree.child_count(), 3);
    }

    #[test]
    fn test_aug_left_associative() {
        let tree = parse_tree("nil aug 1 aug 2").expect("parse failed");
        // aug (aug (nil, 1), 2)
        assert_eq!(tree.value, NodeValue::Aug);
        let inner = tree.nth_child(0).unwrap();
        assert_eq!(inner.value, NodeValue::Aug);
        assert_eq!(inner.nth_child(0).unwrap().value, NodeValue::Nil);
    }

    #[test]
    fn test_at_infix() {
        let tree = parse_tree("2 @ Add 3").expect("parse failed");
        let expected = "\
@
.<INT:2>
.<ID:Add>
.<INT:3>
";
        assert_eq!(tree.to_text(), expected);
    }

    #[test]
    fn test_function_form() {
        let tree = parse_tree("let f x y = x + y in f 1 2").expect("parse failed");
        let ff = tree.nth_child(0).unwrap();
        assert_eq!(ff.value, NodeValue::FunctionForm);
        // name, two parameters, body
        assert_eq!(ff.child_count(), 4);
        assert_eq!(
            ff.nth_child(0).unwrap().value,
            NodeValue::Id("f".to_string())
        );
    }

    #[test]
    fn test_function_form_tuple_parameter() {
        let tree = parse_tree("let P (a,b) = a + b in P (3,4)").expect("parse failed");
        let ff = tree.nth_child(0).unwrap();
        assert_eq!(ff.value, NodeValue::FunctionForm);
        assert_eq!(ff.child_count(), 3);
        let params = ff.nth_child(1).unwrap();
        assert_eq!(params.value, NodeValue::Comma);
        assert_eq!(params.child_count(), 2);
    }

    #[test]
    fn test_empty_parameter_list() {
        let tree = parse_tree("let f () = 1 in f dummy").expect("parse failed");
        let ff = tree.nth_child(0).unwrap();
        assert_eq!(ff.nth_child(1).unwrap().value, NodeValue::Empty);
    }

    #[test]
    fn test_simultaneous_definitions() {
        let tree = parse_tree("let x = 1 and y = 2 in x + y").expect("parse failed");
        let and = tree.nth_child(0).unwrap();
        assert_eq!(and.value, NodeValue::And);
        assert_eq!(and.child_count(), 2);
        assert_eq!(and.nth_child(0).unwrap().value, NodeValue::Equal);
        assert_eq!(and.nth_child(1).unwrap().value, NodeValue::Equal);
    }

    #[test]
    fn test_within_definition() {
        let tree =
            parse_tree("let a = 1 within b = a + 1 in b").expect("parse failed");
        let within = tree.nth_child(0).unwrap();
        assert_eq!(within.value, NodeValue::Within);
        assert_eq!(within.child_count(), 2);
    }

    #[test]
    fn test_rec_definition() {
        let tree =
            parse_tree("let rec f n = n eq 0 -> 1 | n * f (n - 1) in f 5").expect("parse failed");
        let rec = tree.nth_child(0).unwrap();
        assert_eq!(rec.value, NodeValue::Rec);
        assert_eq!(rec.nth_child(0).unwrap().value, NodeValue::FunctionForm);
    }

    #[test]
    fn test_parenthesized_definition() {
        let tree = parse_tree("let (x = 1) in x").expect("parse failed");
        assert_eq!(tree.nth_child(0).unwrap().value, NodeValue::Equal);
    }

    #[test]
    fn test_string_literal_unquoted_payload() {
        let tree = parse_tree("Print 'abc'").expect("parse failed");
        assert_eq!(
            tree.nth_child(1).unwrap().value,
            NodeValue::Str("abc".to_string())
        );
    }

    // ─── Rejection ───────────────────────────────────────────

    #[test]
    fn test_missing_in_is_error() {
        let err = parse_tree("let x = 5 x + 3").unwrap_err();
        assert!(err.contains("'in'"), "unhelpful message: {}", err);
    }

    #[test]
    fn test_missing_bar_is_error() {
        let err = parse_tree("true -> 1 2").unwrap_err();
        assert!(err.contains("'|'"), "unhelpful message: {}", err);
    }

    #[test]
    fn test_unclosed_paren_is_error() {
        let err = parse_tree("(1 + 2").unwrap_err();
        assert!(err.contains("end of input"), "unhelpful message: {}", err);
    }

    #[test]
    fn test_trailing_token_is_error() {
        let err = parse_tree("1 + 2 )").unwrap_err();
        assert!(err.contains("unexpected token"), "unhelpful message: {}", err);
    }

    #[test]
    fn test_error_carries_position() {
        let err = parse_tree("let x = 5\nin in").unwrap_err();
        assert!(err.contains("line 2"), "missing position: {}", err);
    }
}
