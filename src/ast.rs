use crate::error::EvalError;
use crate::func::FuncParams;
use crate::session::{Mode, Session};
use crate::store::{ObjId, TypeDesc};
use crate::value::{Datum, Value};

/// Static type information derived from a node without evaluating it.
#[derive(Debug, Clone, PartialEq)]
pub enum TypeHint {
    /// A scalar whose type is fixed by the literal itself.
    Scalar(&'static str),
    /// A registered model type.
    Model(TypeDesc),
    /// An object whose stored type is absent from the bound schema version.
    Untyped,
    /// The most generic object type; used when the storage identifier is not
    /// recognized at all, and for variables and function results.
    AnyObject,
}

/// A parsed expression element.
///
/// Nodes are immutable recipes: they carry no transaction state and may be
/// evaluated repeatedly, each time against the session's current bindings and
/// transaction.
#[derive(Debug, Clone)]
pub enum Node {
    /// An already-computed literal, possibly null.
    Literal(Datum),
    /// A `Name.class` literal; the name resolves against the model registry
    /// at evaluation time.
    ClassLit { name: String },
    /// A `$name` reference, resolved against the session at evaluation time.
    Var(String),
    /// An `@id` literal in typed-model mode; resolved against the current
    /// transaction at evaluation time.
    ObjRef(ObjId),
    /// A function call with its parsed parameter payload.
    Call { name: String, params: FuncParams },
}

impl Node {
    pub fn evaluate(&self, session: &Session) -> Result<Value, EvalError> {
        match self {
            Node::Literal(datum) => Ok(Value::Const(datum.clone())),
            Node::ClassLit { name } => match session.model().type_for_name(name) {
                Some(ty) => Ok(Value::Const(Datum::Type(ty.clone()))),
                None => Err(EvalError::new(format!("unknown type `{}'", name))),
            },
            Node::Var(name) => session
                .get_var(name)
                .ok_or_else(|| EvalError::unbound_variable(name)),
            Node::ObjRef(id) => {
                let txn = session.transaction()?;
                match txn.resolve_object(*id) {
                    Some(handle) => Ok(Value::Const(Datum::Object(handle))),
                    None => Err(EvalError::new(format!("object @{} does not exist", id))),
                }
            }
            Node::Call { name, params } => {
                let function = session
                    .function(name)
                    .ok_or_else(|| EvalError::new(format!("unknown function `{}()'", name)))?;
                function.apply(session, params)
            }
        }
    }

    pub fn type_hint(&self, session: &Session) -> TypeHint {
        match self {
            Node::Literal(datum) => TypeHint::Scalar(datum.type_name()),
            Node::ClassLit { .. } => TypeHint::Scalar("type"),
            Node::Var(_) | Node::Call { .. } => TypeHint::AnyObject,
            Node::ObjRef(id) => match session.mode() {
                Mode::KeyValue | Mode::RawStore => TypeHint::Scalar("object ID"),
                Mode::TypedModel => {
                    let storage_id = id.storage_id();
                    match session.model().type_for_storage_id(storage_id) {
                        Some(ty) => TypeHint::Model(ty.clone()),
                        None if session.model().knows_storage_id(storage_id) => TypeHint::Untyped,
                        None => TypeHint::AnyObject,
                    }
                }
            },
        }
    }
}
