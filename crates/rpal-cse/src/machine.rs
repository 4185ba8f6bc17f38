//! The CSE machine: a control stack, a value stack, and an environment
//! stack, stepped by rule dispatch until the control stack drains.

use std::io::{self, Write};
use std::rc::Rc;

use rpal_ast::Node;

use crate::builtins::{Builtin, BuiltinKind};
use crate::control::{Binop, ControlItem, Delta, Unop, build_control_structures};
use crate::error::EvalError;
use crate::value::{Closure, ClosureKind, Environment, Value};

/// One slot on the value stack: a computed value or an environment marker.
#[derive(Debug, Clone)]
enum StackEntry {
    Value(Value),
    Env(usize),
}

pub struct CseMachine<W: Write> {
    deltas: Vec<Delta>,
    control: Vec<ControlItem>,
    stack: Vec<StackEntry>,
    /// Active environments; the top is the current one.
    envs: Vec<Rc<Environment>>,
    next_env_id: usize,
    steps: usize,
    out: W,
}

impl CseMachine<io::Stdout> {
    /// Build a machine over `st` that prints to stdout.
    pub fn new(st: &Node) -> Result<Self, EvalError> {
        Self::with_output(st, io::stdout())
    }
}

impl<W: Write> CseMachine<W> {
    /// Build a machine over `st` with an explicit `Print` sink.
    pub fn with_output(st: &Node, out: W) -> Result<Self, EvalError> {
        let deltas = build_control_structures(st)?;

        let mut primitive = Environment::new(0, None);
        for kind in BuiltinKind::ALL {
            primitive.bind(kind.name(), Value::Builtin(Builtin::new(kind)));
        }
        let primitive = Rc::new(primitive);

        let mut control = vec![ControlItem::EnvMarker(0)];
        control.extend(deltas[0].body.iter().cloned());
        let stack = vec![StackEntry::Env(0)];

        Ok(CseMachine {
            deltas,
            control,
            stack,
            envs: vec![primitive],
            next_env_id: 0,
            steps: 0,
            out,
        })
    }

    /// Run to completion: apply rules until the control stack is empty,
    /// then return the single remaining value.
    pub fn evaluate(&mut self) -> Result<Value, EvalError> {
        while !self.control.is_empty() {
            self.step()?;
        }
        if self.stack.len() != 1 {
            return Err(EvalError::BadFinalState {
                values: self.stack.len(),
            });
        }
        match self.stack.pop() {
            Some(StackEntry::Value(value)) => Ok(value),
            _ => Err(EvalError::BadFinalState { values: 0 }),
        }
    }

    /// Rule applications performed so far.
    pub fn steps(&self) -> usize {
        self.steps
    }

    /// Recover the `Print` sink (used by tests to read captured output).
    pub fn into_output(self) -> W {
        self.out
    }

    // ─── Stack helpers ───────────────────────────────────────

    fn push_value(&mut self, value: Value) {
        self.stack.push(StackEntry::Value(value));
    }

    fn pop_value(&mut self, context: &str) -> Result<Value, EvalError> {
        match self.stack.pop() {
            Some(StackEntry::Value(value)) => Ok(value),
            _ => Err(EvalError::StackUnderflow {
                context: context.to_string(),
            }),
        }
    }

    fn current_env(&self) -> Result<&Rc<Environment>, EvalError> {
        self.envs.last().ok_or(EvalError::StackUnderflow {
            context: "environment stack".to_string(),
        })
    }

    fn lookup(&self, name: &str) -> Result<Value, EvalError> {
        self.current_env()?
            .lookup(name)
            .cloned()
            .ok_or_else(|| EvalError::UnboundName {
                name: name.to_string(),
            })
    }

    fn splice_delta(&mut self, id: usize) {
        let body = self.deltas[id].body.clone();
        self.control.extend(body);
    }

    // ─── Rule dispatch ───────────────────────────────────────

    fn step(&mut self) -> Result<(), EvalError> {
        let Some(item) = self.control.pop() else {
            return Ok(());
        };
        self.steps += 1;

        match item {
            // Rule 1: stack a leaf
            ControlItem::Name(name) => {
                let value = self.lookup(&name)?;
                self.push_value(value);
                Ok(())
            }
            ControlItem::Integer(n) => {
                self.push_value(Value::Integer(n));
                Ok(())
            }
            ControlItem::Str(s) => {
                self.push_value(Value::Str(s));
                Ok(())
            }
            ControlItem::True => {
                self.push_value(Value::Boolean(true));
                Ok(())
            }
            ControlItem::False => {
                self.push_value(Value::Boolean(false));
                Ok(())
            }
            ControlItem::Nil => {
                self.push_value(Value::Nil);
                Ok(())
            }
            ControlItem::Dummy => {
                self.push_value(Value::Dummy);
                Ok(())
            }
            ControlItem::YStar => {
                self.push_value(Value::YStar);
                Ok(())
            }

            // Rule 2: stack a lambda, capturing the current environment
            ControlItem::Closure(mut closure) => {
                closure.env = Some(Rc::clone(self.current_env()?));
                self.push_value(Value::Closure(closure));
                Ok(())
            }

            // Rules 3, 4, 10, 12, 13: all dispatch on gamma
            ControlItem::Gamma => self.apply_gamma(),

            // Rule 5: exit environment
            ControlItem::EnvMarker(id) => self.exit_env(id),

            // Rule 6: binary operators
            ControlItem::Binop(op) => self.apply_binop(op),

            // Rule 7: unary operators
            ControlItem::Unop(op) => self.apply_unop(op),

            // Rule 8: conditional
            ControlItem::Beta => self.apply_beta(),

            // Rule 9: tuple formation
            ControlItem::Tau(n) => self.form_tuple(n),

            // Delta references are only ever consumed by beta
            item @ (ControlItem::DeltaTrue(_) | ControlItem::DeltaFalse(_)) => {
                Err(EvalError::Stuck {
                    item: item.to_string(),
                })
            }
        }
    }

    // ─── gamma: application ──────────────────────────────────

    fn apply_gamma(&mut self) -> Result<(), EvalError> {
        let rator = self.pop_value("gamma")?;
        match rator {
            // Rule 3: built-in; one operand per application, partial
            // applications are first-class values
            Value::Builtin(builtin) => {
                let operand = self.pop_value("a built-in application")?;
                let result = builtin.apply(operand, &mut self.out)?;
                self.push_value(result);
                Ok(())
            }

            // Rule 4 (and 11): apply lambda
            Value::Closure(closure) if closure.kind == ClosureKind::Lambda => {
                self.apply_lambda(closure)
            }

            // Rule 13, unfold eta: re-push gamma twice, stack a lambda
            // copy above the eta, and let rules 4/12 carry the recursion
            Value::Closure(eta) => {
                self.control.push(ControlItem::Gamma);
                self.control.push(ControlItem::Gamma);
                let mut unfolded = eta.clone();
                unfolded.kind = ClosureKind::Lambda;
                self.push_value(Value::Closure(eta));
                self.push_value(Value::Closure(unfolded));
                Ok(())
            }

            // Rule 12, apply Y: turn the lambda beneath into an eta closure
            Value::YStar => {
                let operand = self.pop_value("a Y application")?;
                match operand {
                    Value::Closure(mut closure) if closure.kind == ClosureKind::Lambda => {
                        closure.kind = ClosureKind::Eta;
                        self.push_value(Value::Closure(closure));
                        Ok(())
                    }
                    other => Err(EvalError::TypeMismatch {
                        operation: "Y".to_string(),
                        expected: "a lambda closure",
                        found: other.kind(),
                    }),
                }
            }

            // Rule 10: tuple indexing, 1-based
            Value::Tuple(items) => {
                let index = self.pop_value("a tuple index")?;
                match index {
                    Value::Integer(i) => {
                        if i < 1 || i as usize > items.len() {
                            return Err(EvalError::Index {
                                index: i,
                                length: items.len(),
                            });
                        }
                        self.push_value(items[i as usize - 1].clone());
                        Ok(())
                    }
                    other => Err(EvalError::TypeMismatch {
                        operation: "tuple indexing".to_string(),
                        expected: "an integer",
                        found: other.kind(),
                    }),
                }
            }

            other => Err(EvalError::TypeMismatch {
                operation: "application".to_string(),
                expected: "a function, tuple, or Y",
                found: other.kind(),
            }),
        }
    }

    /// Rule 4: allocate a fresh environment on the closure's captured one,
    /// bind the parameters, and enter the closure's delta.
    fn apply_lambda(&mut self, closure: Closure) -> Result<(), EvalError> {
        let operand = self.pop_value("a lambda application")?;
        let captured = match closure.env {
            Some(ref env) => Rc::clone(env),
            None => {
                return Err(EvalError::Stuck {
                    item: closure.to_string(),
                });
            }
        };

        self.next_env_id += 1;
        let mut env = Environment::new(self.next_env_id, Some(captured));

        match closure.params.len() {
            // '()' parameter: the operand is consumed, nothing is bound
            0 => {}
            // A single parameter takes the operand whole, tuple or not
            1 => env.bind(closure.params[0].clone(), operand),
            // An n-ary list unpacks a tuple operand of matching length
            n => match operand {
                Value::Tuple(items) => {
                    if items.len() != n {
                        return Err(EvalError::Arity {
                            context: "tuple unpacking".to_string(),
                            expected: n,
                            found: items.len(),
                        });
                    }
                    for (param, value) in closure.params.iter().zip(items.iter()) {
                        env.bind(param.clone(), value.clone());
                    }
                }
                other => {
                    return Err(EvalError::TypeMismatch {
                        operation: "tuple unpacking".to_string(),
                        expected: "a tuple",
                        found: other.kind(),
                    });
                }
            },
        }

        let env = Rc::new(env);
        self.envs.push(Rc::clone(&env));
        self.control.push(ControlItem::EnvMarker(env.id));
        self.splice_delta(closure.delta);
        self.stack.push(StackEntry::Env(env.id));
        Ok(())
    }

    // ─── Rule 5: exit environment ────────────────────────────

    /// The frame's result sits on top of the value stack with the matching
    /// marker directly beneath it; drop the marker, keep the result.
    fn exit_env(&mut self, id: usize) -> Result<(), EvalError> {
        let result = self.pop_value("an environment exit")?;
        match self.stack.pop() {
            Some(StackEntry::Env(marker)) if marker == id => {}
            _ => {
                return Err(EvalError::Stuck {
                    item: format!("e_{}", id),
                });
            }
        }
        self.push_value(result);
        self.envs.pop();
        Ok(())
    }

    // ─── Rule 6: binary operators ────────────────────────────

    fn apply_binop(&mut self, op: Binop) -> Result<(), EvalError> {
        // Orientation is fixed: the first value popped is the left operand
        let left = self.pop_value(op.symbol())?;
        let right = self.pop_value(op.symbol())?;

        let result = match op {
            Binop::Plus | Binop::Minus | Binop::Times | Binop::Divide | Binop::Power => {
                let (a, b) = Self::two_integers(op, left, right)?;
                Value::Integer(Self::arithmetic(op, a, b)?)
            }
            Binop::Gr | Binop::Ge | Binop::Ls | Binop::Le => {
                let (a, b) = Self::two_integers(op, left, right)?;
                let holds = match op {
                    Binop::Gr => a > b,
                    Binop::Ge => a >= b,
                    Binop::Ls => a < b,
                    Binop::Le => a <= b,
                    _ => unreachable!(),
                };
                Value::Boolean(holds)
            }
            Binop::Eq | Binop::Ne => match left.structurally_equal(&right) {
                Some(equal) => Value::Boolean(if op == Binop::Eq { equal } else { !equal }),
                None => {
                    return Err(EvalError::TypeMismatch {
                        operation: op.symbol().to_string(),
                        expected: "two comparable values of the same kind",
                        found: left.kind(),
                    });
                }
            },
            Binop::Amp | Binop::Or => match (left, right) {
                (Value::Boolean(a), Value::Boolean(b)) => {
                    Value::Boolean(if op == Binop::Amp { a && b } else { a || b })
                }
                (Value::Boolean(_), other) | (other, _) => {
                    return Err(EvalError::TypeMismatch {
                        operation: op.symbol().to_string(),
                        expected: "two truth values",
                        found: other.kind(),
                    });
                }
            },
            Binop::Aug => match left {
                Value::Tuple(items) => {
                    let mut extended: Vec<Value> = items.iter().cloned().collect();
                    extended.push(right);
                    Value::Tuple(Rc::new(extended))
                }
                Value::Nil => Value::Tuple(Rc::new(vec![right])),
                other => {
                    return Err(EvalError::TypeMismatch {
                        operation: "aug".to_string(),
                        expected: "a tuple or nil on the left",
                        found: other.kind(),
                    });
                }
            },
        };

        self.push_value(result);
        Ok(())
    }

    fn two_integers(op: Binop, left: Value, right: Value) -> Result<(i64, i64), EvalError> {
        match (left, right) {
            (Value::Integer(a), Value::Integer(b)) => Ok((a, b)),
            (Value::Integer(_), other) | (other, _) => Err(EvalError::TypeMismatch {
                operation: op.symbol().to_string(),
                expected: "two integers",
                found: other.kind(),
            }),
        }
    }

    fn arithmetic(op: Binop, a: i64, b: i64) -> Result<i64, EvalError> {
        let overflow = || EvalError::Overflow {
            operation: op.symbol().to_string(),
        };
        match op {
            Binop::Plus => a.checked_add(b).ok_or_else(overflow),
            Binop::Minus => a.checked_sub(b).ok_or_else(overflow),
            Binop::Times => a.checked_mul(b).ok_or_else(overflow),
            Binop::Divide => {
                if b == 0 {
                    Err(EvalError::DivisionByZero)
                } else {
                    a.checked_div(b).ok_or_else(overflow)
                }
            }
            Binop::Power => {
                let exponent = u32::try_from(b).map_err(|_| EvalError::TypeMismatch {
                    operation: "**".to_string(),
                    expected: "a non-negative exponent",
                    found: "a negative integer",
                })?;
                a.checked_pow(exponent).ok_or_else(overflow)
            }
            _ => unreachable!("only arithmetic operators reach here"),
        }
    }

    // ─── Rule 7: unary operators ─────────────────────────────

    fn apply_unop(&mut self, op: Unop) -> Result<(), EvalError> {
        let operand = self.pop_value(op.symbol())?;
        let result = match (op, operand) {
            (Unop::Not, Value::Boolean(b)) => Value::Boolean(!b),
            (Unop::Neg, Value::Integer(n)) => {
                Value::Integer(n.checked_neg().ok_or(EvalError::Overflow {
                    operation: "neg".to_string(),
                })?)
            }
            (Unop::Not, other) => {
                return Err(EvalError::TypeMismatch {
                    operation: "not".to_string(),
                    expected: "a truth value",
                    found: other.kind(),
                });
            }
            (Unop::Neg, other) => {
                return Err(EvalError::TypeMismatch {
                    operation: "neg".to_string(),
                    expected: "an integer",
                    found: other.kind(),
                });
            }
        };
        self.push_value(result);
        Ok(())
    }

    // ─── Rule 8: conditional ─────────────────────────────────

    /// Beneath `beta` on the control stack sit the false-branch reference,
    /// then the true-branch reference. Both are discarded; the chosen
    /// delta's body is spliced on.
    fn apply_beta(&mut self) -> Result<(), EvalError> {
        let condition = match self.pop_value("a conditional")? {
            Value::Boolean(b) => b,
            other => {
                return Err(EvalError::TypeMismatch {
                    operation: "->".to_string(),
                    expected: "a truth value",
                    found: other.kind(),
                });
            }
        };

        let false_id = match self.control.pop() {
            Some(ControlItem::DeltaFalse(id)) => id,
            other => {
                return Err(EvalError::Stuck {
                    item: other.map_or("empty control".to_string(), |i| i.to_string()),
                });
            }
        };
        let true_id = match self.control.pop() {
            Some(ControlItem::DeltaTrue(id)) => id,
            other => {
                return Err(EvalError::Stuck {
                    item: other.map_or("empty control".to_string(), |i| i.to_string()),
                });
            }
        };

        self.splice_delta(if condition { true_id } else { false_id });
        Ok(())
    }

    // ─── Rule 9: tuple formation ─────────────────────────────

    /// Pop n values; the first popped was the first subexpression
    /// textually, so it becomes the first element.
    fn form_tuple(&mut self, n: usize) -> Result<(), EvalError> {
        let mut items = Vec::with_capacity(n);
        for _ in 0..n {
            items.push(self.pop_value("tuple formation")?);
        }
        self.push_value(Value::Tuple(Rc::new(items)));
        Ok(())
    }
}
