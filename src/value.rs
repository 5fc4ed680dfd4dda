use crate::error::EvalError;
use crate::session::Session;
use crate::store::{ObjHandle, ObjId, TypeDesc};
use std::fmt;
use std::rc::Rc;

/// Raw result of evaluating an expression.
#[derive(Debug, Clone, PartialEq)]
pub enum Datum {
    Null,
    Bool(bool),
    Int(i32),
    Long(i64),
    Float(f32),
    Double(f64),
    Char(char),
    Str(String),
    /// Raw object identifier (raw-store mode `@id` literals).
    ObjId(ObjId),
    /// Resolved object handle (typed-model mode).
    Object(ObjHandle),
    /// Type descriptor produced by a `.class` literal.
    Type(TypeDesc),
    /// Enumeration result: a bounded set of object handles.
    Objects(Vec<ObjHandle>),
}

impl Datum {
    pub fn type_name(&self) -> &'static str {
        match self {
            Datum::Null => "null",
            Datum::Bool(_) => "boolean",
            Datum::Int(_) => "int",
            Datum::Long(_) => "long",
            Datum::Float(_) => "float",
            Datum::Double(_) => "double",
            Datum::Char(_) => "char",
            Datum::Str(_) => "string",
            Datum::ObjId(_) => "object ID",
            Datum::Object(_) => "object",
            Datum::Type(_) => "type",
            Datum::Objects(_) => "object set",
        }
    }
}

impl fmt::Display for Datum {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Datum::Null => write!(f, "null"),
            Datum::Bool(b) => write!(f, "{}", b),
            Datum::Int(n) => write!(f, "{}", n),
            Datum::Long(n) => write!(f, "{}L", n),
            Datum::Float(n) => write!(f, "{}f", n),
            Datum::Double(n) => {
                if n.fract() == 0.0 {
                    write!(f, "{:.1}", n)
                } else {
                    write!(f, "{}", n)
                }
            }
            Datum::Char(c) => write!(f, "'{}'", c),
            Datum::Str(s) => write!(f, "\"{}\"", s),
            Datum::ObjId(id) => write!(f, "@{}", id),
            Datum::Object(handle) => write!(f, "@{}", handle.id),
            Datum::Type(ty) => write!(f, "{}.class", ty.name),
            Datum::Objects(handles) => {
                write!(f, "[")?;
                for (i, handle) in handles.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "@{}", handle.id)?;
                }
                write!(f, "]")
            }
        }
    }
}

/// Closure behind a deferred value. Re-run on every retrieval so the result
/// always reflects the session's current transaction.
pub type DeferredFn = dyn Fn(&Session) -> Result<Datum, EvalError>;

/// Result of evaluating an AST node.
///
/// `Const` wraps an already-computed datum. `Deferred` wraps a computation
/// that runs against the session's current transaction on each [`get`]; the
/// result is never cached across retrievals.
///
/// [`get`]: Value::get
#[derive(Clone)]
pub enum Value {
    Const(Datum),
    Deferred(Rc<DeferredFn>),
}

impl Value {
    pub fn deferred<F>(f: F) -> Self
    where
        F: Fn(&Session) -> Result<Datum, EvalError> + 'static,
    {
        Value::Deferred(Rc::new(f))
    }

    /// Retrieve the underlying datum, running any deferred computation.
    pub fn get(&self, session: &Session) -> Result<Datum, EvalError> {
        match self {
            Value::Const(datum) => Ok(datum.clone()),
            Value::Deferred(f) => f(session),
        }
    }

    /// Retrieve the underlying datum, failing with a labeled error if null.
    ///
    /// The label names the operation that rejected the null, e.g. `all()`.
    pub fn check_not_null(&self, session: &Session, label: &str) -> Result<Datum, EvalError> {
        match self.get(session)? {
            Datum::Null => Err(EvalError::null_value(label)),
            datum => Ok(datum),
        }
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Value::Const(datum) => f.debug_tuple("Const").field(datum).finish(),
            Value::Deferred(_) => f.write_str("Deferred(..)"),
        }
    }
}
