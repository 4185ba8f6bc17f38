/// A runtime error raised by the CSE machine or its flattener.
#[derive(Debug, Clone)]
pub enum EvalError {
    /// Identifier lookup failed along the whole environment chain.
    UnboundName { name: String },
    /// An operator or built-in saw a value of the wrong kind.
    TypeMismatch {
        operation: String,
        expected: &'static str,
        found: &'static str,
    },
    /// Built-in arity or tuple unpacking length mismatch.
    Arity {
        context: String,
        expected: usize,
        found: usize,
    },
    /// Tuple index outside 1..=length.
    Index { index: i64, length: usize },
    DivisionByZero,
    /// Arithmetic left the i64 range.
    Overflow { operation: String },
    /// The standardized tree still contained a tag the flattener cannot
    /// lower (a surviving surface construct, or a stray `=`/`,`).
    MalformedTree { tag: String },
    /// No evaluation rule matched the machine state.
    Stuck { item: String },
    /// A value was needed but the stack frame had none to give.
    StackUnderflow { context: String },
    /// The control stack drained without leaving exactly one result.
    BadFinalState { values: usize },
    /// Writing `Print` output failed.
    Io { message: String },
}

impl std::fmt::Display for EvalError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EvalError::UnboundName { name } => {
                write!(f, "name '{}' is not defined", name)
            }
            EvalError::TypeMismatch {
                operation,
                expected,
                found,
            } => write!(f, "'{}' expects {}, found {}", operation, expected, found),
            EvalError::Arity {
                context,
                expected,
                found,
            } => write!(
                f,
                "{} expects {} value(s), found {}",
                context, expected, found
            ),
            EvalError::Index { index, length } => write!(
                f,
                "tuple index {} out of range for tuple of length {}",
                index, length
            ),
            EvalError::DivisionByZero => write!(f, "division by zero"),
            EvalError::Overflow { operation } => {
                write!(f, "integer overflow in '{}'", operation)
            }
            EvalError::MalformedTree { tag } => write!(
                f,
                "standardized tree still contains '{}'; cannot build control structures",
                tag
            ),
            EvalError::Stuck { item } => {
                write!(f, "no evaluation rule applies at '{}'", item)
            }
            EvalError::StackUnderflow { context } => {
                write!(f, "value stack underflow while evaluating {}", context)
            }
            EvalError::BadFinalState { values } => write!(
                f,
                "evaluation finished with {} values on the stack instead of one",
                values
            ),
            EvalError::Io { message } => write!(f, "i/o error during Print: {}", message),
        }
    }
}
