//! Control structures ("deltas") and the flattener that builds them from a
//! standardized tree.

use std::fmt;

use rpal_ast::{Node, NodeValue};

use crate::error::EvalError;
use crate::value::{Closure, ClosureKind};

/// Binary operators the machine evaluates with rule 6.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Binop {
    Plus,
    Minus,
    Times,
    Divide,
    Power,
    Gr,
    Ge,
    Ls,
    Le,
    Eq,
    Ne,
    Amp,
    Or,
    Aug,
}

impl Binop {
    pub fn symbol(&self) -> &'static str {
        match self {
            Binop::Plus => "+",
            Binop::Minus => "-",
            Binop::Times => "*",
            Binop::Divide => "/",
            Binop::Power => "**",
            Binop::Gr => "gr",
            Binop::Ge => "ge",
            Binop::Ls => "ls",
            Binop::Le => "le",
            Binop::Eq => "eq",
            Binop::Ne => "ne",
            Binop::Amp => "&",
            Binop::Or => "or",
            Binop::Aug => "aug",
        }
    }
}

/// Unary operators, rule 7.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Unop {
    Not,
    Neg,
}

impl Unop {
    pub fn symbol(&self) -> &'static str {
        match self {
            Unop::Not => "not",
            Unop::Neg => "neg",
        }
    }
}

/// One item in a delta or on the control stack.
#[derive(Debug, Clone)]
pub enum ControlItem {
    /// `<ID:name>`; looked up in the active environment chain.
    Name(String),
    Integer(i64),
    Str(String),
    True,
    False,
    Nil,
    Dummy,
    YStar,
    Gamma,
    Beta,
    /// `tau_n`, the tuple constructor of arity n.
    Tau(usize),
    /// `delta_<id>_t`, the true-branch reference consumed by `beta`.
    DeltaTrue(usize),
    /// `delta_<id>_f`, the false-branch reference consumed by `beta`.
    DeltaFalse(usize),
    Closure(Closure),
    Binop(Binop),
    Unop(Unop),
    /// `e_<id>`, an environment marker delimiting a frame.
    EnvMarker(usize),
}

impl fmt::Display for ControlItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ControlItem::Name(name) => write!(f, "<ID:{}>", name),
            ControlItem::Integer(n) => write!(f, "<INT:{}>", n),
            ControlItem::Str(s) => write!(f, "<STR:\"{}\">", s),
            ControlItem::True => write!(f, "true"),
            ControlItem::False => write!(f, "false"),
            ControlItem::Nil => write!(f, "nil"),
            ControlItem::Dummy => write!(f, "dummy"),
            ControlItem::YStar => write!(f, "Y_star"),
            ControlItem::Gamma => write!(f, "gamma"),
            ControlItem::Beta => write!(f, "beta"),
            ControlItem::Tau(n) => write!(f, "tau_{}", n),
            ControlItem::DeltaTrue(id) => write!(f, "delta_{}_t", id),
            ControlItem::DeltaFalse(id) => write!(f, "delta_{}_f", id),
            ControlItem::Closure(c) => write!(f, "{}", c),
            ControlItem::Binop(op) => write!(f, "{}", op.symbol()),
            ControlItem::Unop(op) => write!(f, "{}", op.symbol()),
            ControlItem::EnvMarker(id) => write!(f, "e_{}", id),
        }
    }
}

/// A numbered, immutable control structure. Delta 0 is the program body;
/// every lambda body and conditional arm gets its own.
#[derive(Debug, Clone)]
pub struct Delta {
    pub id: usize,
    pub body: Vec<ControlItem>,
}

/// Flatten a standardized tree into the delta table.
pub fn build_control_structures(st: &Node) -> Result<Vec<Delta>, EvalError> {
    let mut flattener = Flattener { deltas: Vec::new() };
    let root = flattener.fresh();
    flattener.flatten_subtree(st, root)?;
    Ok(flattener
        .deltas
        .into_iter()
        .enumerate()
        .map(|(id, body)| Delta { id, body })
        .collect())
}

struct Flattener {
    /// Bodies under construction, indexed by delta id.
    deltas: Vec<Vec<ControlItem>>,
}

impl Flattener {
    /// Allocate the next delta id.
    fn fresh(&mut self) -> usize {
        self.deltas.push(Vec::new());
        self.deltas.len() - 1
    }

    /// Emit one node's subtree into `delta`, pre-order. Siblings are the
    /// caller's business: children are reached through [`Node::children`],
    /// never by following this node's own sibling link.
    fn flatten_subtree(&mut self, node: &Node, delta: usize) -> Result<(), EvalError> {
        match &node.value {
            NodeValue::Lambda => {
                if node.child_count() != 2 {
                    return Err(EvalError::MalformedTree {
                        tag: "lambda".to_string(),
                    });
                }
                let binder = node.nth_child(0).expect("checked arity");
                let body = node.nth_child(1).expect("checked arity");
                let id = self.fresh();
                let params = closure_params(binder)?;
                self.deltas[delta].push(ControlItem::Closure(Closure {
                    delta: id,
                    params,
                    kind: ClosureKind::Lambda,
                    env: None,
                }));
                self.flatten_subtree(body, id)
            }
            NodeValue::Arrow => {
                if node.child_count() != 3 {
                    return Err(EvalError::MalformedTree {
                        tag: "->".to_string(),
                    });
                }
                let cond = node.nth_child(0).expect("checked arity");
                let true_branch = node.nth_child(1).expect("checked arity");
                let false_branch = node.nth_child(2).expect("checked arity");

                let t = self.fresh();
                let f = self.fresh();
                self.deltas[delta].push(ControlItem::DeltaTrue(t));
                self.deltas[delta].push(ControlItem::DeltaFalse(f));
                self.deltas[delta].push(ControlItem::Beta);
                self.flatten_subtree(cond, delta)?;
                self.flatten_subtree(true_branch, t)?;
                self.flatten_subtree(false_branch, f)
            }
            NodeValue::Tau => {
                self.deltas[delta].push(ControlItem::Tau(node.child_count()));
                for child in node.children() {
                    self.flatten_subtree(child, delta)?;
                }
                Ok(())
            }
            value => {
                let item = leaf_or_operator_item(value)?;
                self.deltas[delta].push(item);
                for child in node.children() {
                    self.flatten_subtree(child, delta)?;
                }
                Ok(())
            }
        }
    }
}

/// Parameter names from a lambda's bound-name child: a single identifier,
/// a `,`-list of identifiers, or `()` for none.
fn closure_params(binder: &Node) -> Result<Vec<String>, EvalError> {
    match &binder.value {
        NodeValue::Id(name) => Ok(vec![name.clone()]),
        NodeValue::Empty => Ok(Vec::new()),
        NodeValue::Comma => {
            let mut params = Vec::new();
            for child in binder.children() {
                match &child.value {
                    NodeValue::Id(name) => params.push(name.clone()),
                    other => {
                        return Err(EvalError::MalformedTree {
                            tag: other.to_string(),
                        });
                    }
                }
            }
            Ok(params)
        }
        other => Err(EvalError::MalformedTree {
            tag: other.to_string(),
        }),
    }
}

/// Control item for everything but `lambda`, `->`, and `tau`.
///
/// Surface tags and a bare `=` or `,` mean standardization failed; the
/// machine refuses the tree up front rather than getting stuck mid-run.
fn leaf_or_operator_item(value: &NodeValue) -> Result<ControlItem, EvalError> {
    let item = match value {
        NodeValue::Id(name) => ControlItem::Name(name.clone()),
        NodeValue::Int(n) => ControlItem::Integer(*n),
        NodeValue::Str(s) => ControlItem::Str(s.clone()),
        NodeValue::True => ControlItem::True,
        NodeValue::False => ControlItem::False,
        NodeValue::Nil => ControlItem::Nil,
        NodeValue::Dummy => ControlItem::Dummy,
        NodeValue::Y => ControlItem::YStar,
        NodeValue::Gamma => ControlItem::Gamma,
        NodeValue::Plus => ControlItem::Binop(Binop::Plus),
        NodeValue::Minus => ControlItem::Binop(Binop::Minus),
        NodeValue::Times => ControlItem::Binop(Binop::Times),
        NodeValue::Divide => ControlItem::Binop(Binop::Divide),
        NodeValue::Power => ControlItem::Binop(Binop::Power),
        NodeValue::Gr => ControlItem::Binop(Binop::Gr),
        NodeValue::Ge => ControlItem::Binop(Binop::Ge),
        NodeValue::Ls => ControlItem::Binop(Binop::Ls),
        NodeValue::Le => ControlItem::Binop(Binop::Le),
        NodeValue::Eq => ControlItem::Binop(Binop::Eq),
        NodeValue::Ne => ControlItem::Binop(Binop::Ne),
        NodeValue::Amp => ControlItem::Binop(Binop::Amp),
        NodeValue::Or => ControlItem::Binop(Binop::Or),
        NodeValue::Aug => ControlItem::Binop(Binop::Aug),
        NodeValue::Not => ControlItem::Unop(Unop::Not),
        NodeValue::Neg => ControlItem::Unop(Unop::Neg),
        other => {
            return Err(EvalError::MalformedTree {
                tag: other.to_string(),
            });
        }
    };
    Ok(item)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rpal_parser::parse_tree;
    use rpal_standardizer::standardize;

    fn flatten(src: &str) -> Vec<Delta> {
        let ast = parse_tree(src).expect("parse failed");
        let st = standardize(ast).tree;
        build_control_structures(&st).expect("flatten failed")
    }

    fn dump(delta: &Delta) -> String {
        delta
            .body
            .iter()
            .map(|i| i.to_string())
            .collect::<Vec<_>>()
            .join(" ")
    }

    #[test]
    fn test_reverse_polish_order() {
        // Operators come after their operands in the emitted stream
        let deltas = flatten("let x = 5 in x + 3");
        assert_eq!(deltas.len(), 2);
        assert_eq!(dump(&deltas[0]), "gamma [lambda closure: x: 1] <INT:5>");
        assert_eq!(dump(&deltas[1]), "+ <ID:x> <INT:3>");
    }

    #[test]
    fn test_lambda_allocates_fresh_delta() {
        let deltas = flatten("(fn x y . x * y) 3 4");
        // delta 0: outer applications; delta 1: fn x; delta 2: fn y
        assert_eq!(deltas.len(), 3);
        assert_eq!(
            dump(&deltas[0]),
            "gamma gamma [lambda closure: x: 1] <INT:3> <INT:4>"
        );
        assert_eq!(dump(&deltas[1]), "[lambda closure: y: 2]");
        assert_eq!(dump(&deltas[2]), "* <ID:x> <ID:y>");
    }

    #[test]
    fn test_conditional_emits_beta_pair() {
        let deltas = flatten("true -> 1 | 2");
        assert_eq!(deltas.len(), 3);
        assert_eq!(dump(&deltas[0]), "delta_1_t delta_2_f beta true");
        assert_eq!(dump(&deltas[1]), "<INT:1>");
        assert_eq!(dump(&deltas[2]), "<INT:2>");
    }

    #[test]
    fn test_tau_arity() {
        let deltas = flatten("1, 2, 3");
        assert_eq!(dump(&deltas[0]), "tau_3 <INT:1> <INT:2> <INT:3>");
    }

    #[test]
    fn test_comma_list_parameters() {
        let deltas = flatten("let P (a,b) = a + b in P");
        let closure = deltas[0]
            .body
            .iter()
            .find_map(|item| match item {
                ControlItem::Closure(c) => Some(c),
                _ => None,
            })
            .expect("no closure emitted");
        assert_eq!(closure.params, vec!["P".to_string()]);

        let inner = deltas
            .iter()
            .flat_map(|d| d.body.iter())
            .find_map(|item| match item {
                ControlItem::Closure(c) if c.params.len() == 2 => Some(c),
                _ => None,
            })
            .expect("no two-parameter closure emitted");
        assert_eq!(inner.params, vec!["a".to_string(), "b".to_string()]);
    }

    #[test]
    fn test_y_emitted_as_sentinel() {
        let deltas = flatten("let rec f n = n in f 1");
        let has_ystar = deltas
            .iter()
            .flat_map(|d| d.body.iter())
            .any(|item| matches!(item, ControlItem::YStar));
        assert!(has_ystar);
    }

    #[test]
    fn test_surface_tag_is_rejected() {
        use rpal_ast::{Node, NodeValue};
        // An unstandardized 'let' must not flatten
        let ast = parse_tree("let x = 1 in x").expect("parse failed");
        let err = build_control_structures(&ast).unwrap_err();
        assert!(matches!(err, EvalError::MalformedTree { .. }));

        let eq = Node::internal(
            NodeValue::Equal,
            vec![
                Node::leaf(NodeValue::Id("x".to_string())),
                Node::leaf(NodeValue::Int(1)),
            ],
        );
        let err = build_control_structures(&eq).unwrap_err();
        assert!(matches!(err, EvalError::MalformedTree { .. }));
    }
}
