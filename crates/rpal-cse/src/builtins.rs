//! The primitive environment's built-in functions.

use std::io::Write;

use crate::error::EvalError;
use crate::value::Value;

/// The thirteen names bound in environment 0.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuiltinKind {
    Print,
    Isinteger,
    Istruthvalue,
    Isstring,
    Istuple,
    Isfunction,
    Isdummy,
    Stem,
    Stern,
    Conc,
    ItoS,
    Order,
    Null,
}

impl BuiltinKind {
    pub const ALL: [BuiltinKind; 13] = [
        BuiltinKind::Print,
        BuiltinKind::Isinteger,
        BuiltinKind::Istruthvalue,
        BuiltinKind::Isstring,
        BuiltinKind::Istuple,
        BuiltinKind::Isfunction,
        BuiltinKind::Isdummy,
        BuiltinKind::Stem,
        BuiltinKind::Stern,
        BuiltinKind::Conc,
        BuiltinKind::ItoS,
        BuiltinKind::Order,
        BuiltinKind::Null,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            BuiltinKind::Print => "Print",
            BuiltinKind::Isinteger => "Isinteger",
            BuiltinKind::Istruthvalue => "Istruthvalue",
            BuiltinKind::Isstring => "Isstring",
            BuiltinKind::Istuple => "Istuple",
            BuiltinKind::Isfunction => "Isfunction",
            BuiltinKind::Isdummy => "Isdummy",
            BuiltinKind::Stem => "Stem",
            BuiltinKind::Stern => "Stern",
            BuiltinKind::Conc => "Conc",
            BuiltinKind::ItoS => "ItoS",
            BuiltinKind::Order => "Order",
            BuiltinKind::Null => "Null",
        }
    }

    /// How many operands the builtin needs before it fires.
    ///
    /// `Print` is variadic in the reference semantics; here every
    /// application supplies exactly one operand, and surface comma-lists
    /// reach it as a single `tau`-built tuple.
    pub fn arity(&self) -> usize {
        match self {
            BuiltinKind::Conc => 2,
            _ => 1,
        }
    }
}

/// A built-in function value, possibly partially applied.
///
/// Each `gamma` supplies one operand; the collected operands ride along in
/// the value so `Conc (Stem S) (Stern S)` works one application at a time.
#[derive(Debug, Clone)]
pub struct Builtin {
    pub kind: BuiltinKind,
    pub args: Vec<Value>,
}

impl Builtin {
    pub fn new(kind: BuiltinKind) -> Self {
        Builtin {
            kind,
            args: Vec::new(),
        }
    }

    /// Apply one operand. Returns the partially-applied builtin until the
    /// arity is met, then the result of the call.
    pub fn apply(mut self, operand: Value, out: &mut dyn Write) -> Result<Value, EvalError> {
        self.args.push(operand);
        if self.args.len() < self.kind.arity() {
            return Ok(Value::Builtin(self));
        }
        self.invoke(out)
    }

    fn invoke(self, out: &mut dyn Write) -> Result<Value, EvalError> {
        let kind = self.kind;
        let mut args = self.args.into_iter();
        let first = args.next().expect("builtin fired with no operands");

        match kind {
            BuiltinKind::Print => {
                writeln!(out, "{}", first).map_err(|e| EvalError::Io {
                    message: e.to_string(),
                })?;
                Ok(first)
            }
            BuiltinKind::Isinteger => Ok(Value::Boolean(matches!(first, Value::Integer(_)))),
            BuiltinKind::Istruthvalue => Ok(Value::Boolean(matches!(first, Value::Boolean(_)))),
            BuiltinKind::Isstring => Ok(Value::Boolean(matches!(first, Value::Str(_)))),
            BuiltinKind::Istuple => Ok(Value::Boolean(matches!(first, Value::Tuple(_)))),
            BuiltinKind::Isfunction => Ok(Value::Boolean(matches!(
                first,
                Value::Closure(_) | Value::Builtin(_)
            ))),
            BuiltinKind::Isdummy => Ok(Value::Boolean(matches!(first, Value::Dummy))),
            BuiltinKind::Stem => match first {
                Value::Str(s) if !s.is_empty() => {
                    let head: String = s.chars().take(1).collect();
                    Ok(Value::Str(head))
                }
                Value::Str(_) => Err(EvalError::TypeMismatch {
                    operation: "Stem".to_string(),
                    expected: "a non-empty string",
                    found: "an empty string",
                }),
                other => Err(mismatch("Stem", "a string", &other)),
            },
            BuiltinKind::Stern => match first {
                Value::Str(s) => {
                    let tail: String = s.chars().skip(1).collect();
                    Ok(Value::Str(tail))
                }
                other => Err(mismatch("Stern", "a string", &other)),
            },
            BuiltinKind::Conc => {
                let second = args.next().expect("Conc fired with one operand");
                match (first, second) {
                    (Value::Str(a), Value::Str(b)) => Ok(Value::Str(a + &b)),
                    (Value::Str(_), other) | (other, _) => {
                        Err(mismatch("Conc", "two strings", &other))
                    }
                }
            }
            BuiltinKind::ItoS => match first {
                Value::Integer(n) => Ok(Value::Str(n.to_string())),
                other => Err(mismatch("ItoS", "an integer", &other)),
            },
            BuiltinKind::Order => match first {
                Value::Tuple(items) => Ok(Value::Integer(items.len() as i64)),
                _ => Ok(Value::Integer(0)),
            },
            BuiltinKind::Null => match first {
                Value::Tuple(items) => Ok(Value::Boolean(items.is_empty())),
                Value::Nil => Ok(Value::Boolean(true)),
                _ => Ok(Value::Boolean(false)),
            },
        }
    }
}

fn mismatch(operation: &str, expected: &'static str, found: &Value) -> EvalError {
    EvalError::TypeMismatch {
        operation: operation.to_string(),
        expected,
        found: found.kind(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn call(kind: BuiltinKind, operands: Vec<Value>) -> Result<Value, EvalError> {
        let mut out = Vec::new();
        let mut value = Value::Builtin(Builtin::new(kind));
        for operand in operands {
            match value {
                Value::Builtin(b) => value = b.apply(operand, &mut out)?,
                other => return Ok(other),
            }
        }
        Ok(value)
    }

    fn s(text: &str) -> Value {
        Value::Str(text.to_string())
    }

    #[test]
    fn test_type_predicates() {
        assert!(matches!(
            call(BuiltinKind::Isinteger, vec![Value::Integer(1)]),
            Ok(Value::Boolean(true))
        ));
        // booleans are not integers
        assert!(matches!(
            call(BuiltinKind::Isinteger, vec![Value::Boolean(true)]),
            Ok(Value::Boolean(false))
        ));
        assert!(matches!(
            call(BuiltinKind::Istruthvalue, vec![Value::Boolean(false)]),
            Ok(Value::Boolean(true))
        ));
        assert!(matches!(
            call(BuiltinKind::Isdummy, vec![Value::Dummy]),
            Ok(Value::Boolean(true))
        ));
    }

    #[test]
    fn test_stem_and_stern() {
        assert!(matches!(
            call(BuiltinKind::Stem, vec![s("abc")]),
            Ok(Value::Str(ref head)) if head == "a"
        ));
        assert!(matches!(
            call(BuiltinKind::Stern, vec![s("abc")]),
            Ok(Value::Str(ref tail)) if tail == "bc"
        ));
        // Stern of a one-char string is the empty string
        assert!(matches!(
            call(BuiltinKind::Stern, vec![s("a")]),
            Ok(Value::Str(ref tail)) if tail.is_empty()
        ));
        assert!(call(BuiltinKind::Stem, vec![s("")]).is_err());
    }

    #[test]
    fn test_conc_is_curried() {
        let mut out = Vec::new();
        let partial = Builtin::new(BuiltinKind::Conc)
            .apply(s("ab"), &mut out)
            .expect("first application");
        // One operand in: still a builtin value
        let partial = match partial {
            Value::Builtin(b) => b,
            other => panic!("expected partial application, got {}", other),
        };
        let result = partial.apply(s("cd"), &mut out).expect("second application");
        assert!(matches!(result, Value::Str(ref t) if t == "abcd"));
    }

    #[test]
    fn test_conc_rejects_non_strings() {
        assert!(call(BuiltinKind::Conc, vec![s("a"), Value::Integer(1)]).is_err());
    }

    #[test]
    fn test_itos_order_null() {
        assert!(matches!(
            call(BuiltinKind::ItoS, vec![Value::Integer(-7)]),
            Ok(Value::Str(ref t)) if t == "-7"
        ));

        let pair = Value::Tuple(std::rc::Rc::new(vec![Value::Integer(1), Value::Integer(2)]));
        assert!(matches!(
            call(BuiltinKind::Order, vec![pair.clone()]),
            Ok(Value::Integer(2))
        ));
        assert!(matches!(
            call(BuiltinKind::Order, vec![Value::Nil]),
            Ok(Value::Integer(0))
        ));

        // Null treats nil and the empty tuple alike
        assert!(matches!(
            call(BuiltinKind::Null, vec![Value::Nil]),
            Ok(Value::Boolean(true))
        ));
        let empty = Value::Tuple(std::rc::Rc::new(vec![]));
        assert!(matches!(
            call(BuiltinKind::Null, vec![empty]),
            Ok(Value::Boolean(true))
        ));
        assert!(matches!(
            call(BuiltinKind::Null, vec![pair]),
            Ok(Value::Boolean(false))
        ));
    }

    #[test]
    fn test_print_writes_and_returns() {
        let mut out = Vec::new();
        let result = Builtin::new(BuiltinKind::Print)
            .apply(s("hello"), &mut out)
            .expect("print");
        assert_eq!(String::from_utf8(out).unwrap(), "hello\n");
        assert!(matches!(result, Value::Str(ref t) if t == "hello"));
    }
}
