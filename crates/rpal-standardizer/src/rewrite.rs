//! The eight standardizing rewrites.
//!
//! Each rewrite consumes a node whose children have already been
//! standardized and returns the canonical replacement subtree. A node whose
//! shape does not match its tag's expected pattern is reassembled unchanged
//! and a [`Diagnostic`] is recorded.

use rpal_ast::{Node, NodeValue};

use crate::error::Diagnostic;

/// Standardize a subtree bottom-up: children first, then this node.
pub(crate) fn standardize_subtree(mut node: Node, diags: &mut Vec<Diagnostic>) -> Node {
    if let Some(child) = node.child.take() {
        node.child = Some(Box::new(standardize_subtree(*child, diags)));
    }
    if let Some(sibling) = node.sibling.take() {
        node.sibling = Some(Box::new(standardize_subtree(*sibling, diags)));
    }
    rewrite_node(node, diags)
}

/// Dispatch on the node tag. The node's own sibling link is detached first
/// and reattached to whatever root the rewrite produces, so rewrites work
/// at any position in the tree.
fn rewrite_node(mut node: Node, diags: &mut Vec<Diagnostic>) -> Node {
    let rewritable = node.value.is_surface()
        || (node.value == NodeValue::Lambda && node.child_count() > 2);
    if !rewritable {
        return node;
    }

    let sibling = node.sibling.take();
    let mut out = match node.value {
        NodeValue::Let => rewrite_let(node, diags),
        NodeValue::Where => rewrite_where(node, diags),
        NodeValue::FunctionForm => rewrite_function_form(node, diags),
        NodeValue::Lambda => rewrite_multi_param_lambda(node),
        NodeValue::Within => rewrite_within(node, diags),
        NodeValue::At => rewrite_at(node, diags),
        NodeValue::And => rewrite_and(node, diags),
        NodeValue::Rec => rewrite_rec(node, diags),
        _ => unreachable!("rewritable tags are covered above"),
    };
    out.sibling = sibling;
    out
}

/// True if `node` is `= ( name, value )`.
fn is_binding(node: &Node) -> bool {
    node.value == NodeValue::Equal && node.child_count() == 2
}

//    let                 gamma
//    / \                 /   \
//   =   P    =>      lambda   E
//  / \               /   \
// x   E             x     P
fn rewrite_let(mut node: Node, diags: &mut Vec<Diagnostic>) -> Node {
    let kids = node.take_children();
    if kids.len() != 2 || !is_binding(&kids[0]) {
        diags.push(Diagnostic::new("let", "expected a '=' binding and a body"));
        return Node::internal(NodeValue::Let, kids);
    }
    let mut kids = kids.into_iter();
    let mut binding = kids.next().unwrap();
    let body = kids.next().unwrap();

    let mut parts = binding.take_children().into_iter();
    let name = parts.next().unwrap();
    let value = parts.next().unwrap();

    let lambda = Node::internal(NodeValue::Lambda, vec![name, body]);
    Node::internal(NodeValue::Gamma, vec![lambda, value])
}

//   where                gamma
//   /  \                 /   \
//  P    =      =>    lambda   E
//      / \            /   \
//     x   E          x     P
fn rewrite_where(mut node: Node, diags: &mut Vec<Diagnostic>) -> Node {
    let kids = node.take_children();
    if kids.len() != 2 || !is_binding(&kids[1]) {
        diags.push(Diagnostic::new("where", "expected a body and a '=' binding"));
        return Node::internal(NodeValue::Where, kids);
    }
    let mut kids = kids.into_iter();
    let body = kids.next().unwrap();
    let mut binding = kids.next().unwrap();

    let mut parts = binding.take_children().into_iter();
    let name = parts.next().unwrap();
    let value = parts.next().unwrap();

    let lambda = Node::internal(NodeValue::Lambda, vec![name, body]);
    Node::internal(NodeValue::Gamma, vec![lambda, value])
}

//   function_form             =
//  /      |     \            / \
// P       V+     E    =>    P   +lambda
//                                /    \
//                               V      .E
fn rewrite_function_form(mut node: Node, diags: &mut Vec<Diagnostic>) -> Node {
    let kids = node.take_children();
    if kids.len() < 3 {
        diags.push(Diagnostic::new(
            "function_form",
            "expected a name, parameters, and a body",
        ));
        return Node::internal(NodeValue::FunctionForm, kids);
    }
    let mut kids = kids.into_iter();
    let name = kids.next().unwrap();
    let mut params: Vec<Node> = kids.collect();
    let body = params.pop().unwrap();

    Node::internal(NodeValue::Equal, vec![name, nest_lambdas(params, body)])
}

//   lambda                 ++lambda
//  /      \               /       \
// V++      E     =>      V         .E
fn rewrite_multi_param_lambda(mut node: Node) -> Node {
    // Shape is guaranteed by the dispatcher: three or more children.
    let mut params = node.take_children();
    let body = params.pop().unwrap();
    nest_lambdas(params, body)
}

/// Right-nest `params` over `body`: `lambda(V1, lambda(V2, ... body))`.
fn nest_lambdas(params: Vec<Node>, body: Node) -> Node {
    let mut tree = body;
    for param in params.into_iter().rev() {
        tree = Node::internal(NodeValue::Lambda, vec![param, tree]);
    }
    tree
}

//    within                     =
//   /      \                   / \
//  =        =        =>      x2   gamma
// / \      / \                   /     \
// x1  E1  x2  E2             lambda     E1
//                            /    \
//                           x1     E2
fn rewrite_within(mut node: Node, diags: &mut Vec<Diagnostic>) -> Node {
    let kids = node.take_children();
    if kids.len() != 2 || !is_binding(&kids[0]) || !is_binding(&kids[1]) {
        diags.push(Diagnostic::new("within", "expected two '=' bindings"));
        return Node::internal(NodeValue::Within, kids);
    }
    let mut kids = kids.into_iter();
    let mut outer = kids.next().unwrap();
    let mut inner = kids.next().unwrap();

    let mut outer_parts = outer.take_children().into_iter();
    let x1 = outer_parts.next().unwrap();
    let e1 = outer_parts.next().unwrap();
    let mut inner_parts = inner.take_children().into_iter();
    let x2 = inner_parts.next().unwrap();
    let e2 = inner_parts.next().unwrap();

    let lambda = Node::internal(NodeValue::Lambda, vec![x1, e2]);
    let gamma = Node::internal(NodeValue::Gamma, vec![lambda, e1]);
    Node::internal(NodeValue::Equal, vec![x2, gamma])
}

//     @                   gamma
//   / | \                 /   \
// E1  N  E2     =>    gamma    E2
//                     /   \
//                    N     E1
fn rewrite_at(mut node: Node, diags: &mut Vec<Diagnostic>) -> Node {
    let kids = node.take_children();
    if kids.len() != 3 {
        diags.push(Diagnostic::new(
            "@",
            "expected an operand, a name, and an operand",
        ));
        return Node::internal(NodeValue::At, kids);
    }
    let mut kids = kids.into_iter();
    let e1 = kids.next().unwrap();
    let name = kids.next().unwrap();
    let e2 = kids.next().unwrap();

    let inner = Node::internal(NodeValue::Gamma, vec![name, e1]);
    Node::internal(NodeValue::Gamma, vec![inner, e2])
}

//    and                 =
//     |                 / \
//    =++       =>      ,   tau
//    / \               |    |
//   x   E             x++  E++
fn rewrite_and(mut node: Node, diags: &mut Vec<Diagnostic>) -> Node {
    let kids = node.take_children();
    if kids.len() < 2 || !kids.iter().all(is_binding) {
        diags.push(Diagnostic::new("and", "expected two or more '=' bindings"));
        return Node::internal(NodeValue::And, kids);
    }
    let mut names = Vec::with_capacity(kids.len());
    let mut values = Vec::with_capacity(kids.len());
    for mut binding in kids {
        let mut parts = binding.take_children().into_iter();
        names.push(parts.next().unwrap());
        values.push(parts.next().unwrap());
    }

    let comma = Node::internal(NodeValue::Comma, names);
    let tau = Node::internal(NodeValue::Tau, values);
    Node::internal(NodeValue::Equal, vec![comma, tau])
}

//    rec                =
//     |                / \
//     =      =>       x   gamma
//    / \                  /   \
//   x   E                Y     lambda
//                              /    \
//                             x      E
//
// The outer `=` gets a fresh copy of the bound-name leaf.
fn rewrite_rec(mut node: Node, diags: &mut Vec<Diagnostic>) -> Node {
    let kids = node.take_children();
    let shape_ok = kids.len() == 1
        && is_binding(&kids[0])
        && matches!(kids[0].nth_child(0).unwrap().value, NodeValue::Id(_));
    if !shape_ok {
        diags.push(Diagnostic::new(
            "rec",
            "expected a '=' binding of a single name",
        ));
        return Node::internal(NodeValue::Rec, kids);
    }
    let mut binding = kids.into_iter().next().unwrap();
    let mut parts = binding.take_children().into_iter();
    let name = parts.next().unwrap();
    let value = parts.next().unwrap();

    let name_copy = Node::leaf(name.value.clone());
    let lambda = Node::internal(NodeValue::Lambda, vec![name, value]);
    let gamma = Node::internal(
        NodeValue::Gamma,
        vec![Node::leaf(NodeValue::Y), lambda],
    );
    Node::internal(NodeValue::Equal, vec![name_copy, gamma])
}
