use crate::ast::Node;
use crate::cursor::ParseContext;
use crate::error::{EvalError, ParseError};
use crate::parser;
use crate::session::{Mode, Session};
use crate::value::{Datum, Value};
use regex::Regex;
use std::sync::LazyLock;

static IDENT_ONLY_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").unwrap());

/// Parsed parameter payload handed from [`Function::parse_params`] to
/// [`Function::apply`]. The payload is opaque to the rest of the grammar;
/// only the owning function interprets it.
#[derive(Debug, Clone)]
pub enum FuncParams {
    /// No parameters.
    Empty,
    /// A storage identifier resolved at parse time from a bare type name.
    StorageId(u32),
    /// An unevaluated expression, resolved when the call is applied.
    Expr(Box<Node>),
}

/// A console function registered with the session.
///
/// `parse_params` consumes the text after the opening parenthesis, including
/// the closing one, and may backtrack between parse strategies. `apply` must
/// not run expensive queries eagerly: database access belongs in a deferred
/// [`Value`] so each retrieval observes the then-current transaction.
pub trait Function {
    fn name(&self) -> &'static str;

    fn usage(&self) -> &'static str;

    fn summary(&self) -> &'static str;

    fn parse_params(
        &self,
        session: &Session,
        ctx: &mut ParseContext<'_>,
        complete: bool,
    ) -> Result<FuncParams, ParseError>;

    fn apply(&self, session: &Session, params: &FuncParams) -> Result<Value, EvalError>;
}

/// `all([type])`: enumerate persisted objects, optionally restricted to one
/// type and (in typed-model mode) its subtypes.
pub struct AllFunction;

impl AllFunction {
    /// Build the deferred enumeration for a storage identifier.
    ///
    /// In typed-model mode the identifier must name a type in the bound
    /// schema version, checked here at apply time; raw-store mode defers even
    /// the existence check to retrieval.
    fn get_all(&self, session: &Session, storage_id: u32) -> Result<Value, EvalError> {
        match session.mode() {
            Mode::KeyValue => Err(EvalError::new(
                "object enumeration requires raw-store or typed-model mode",
            )),
            Mode::RawStore => Ok(Value::deferred(move |session: &Session| {
                if !session.model().knows_storage_id(storage_id) {
                    return Err(EvalError::new(format!(
                        "unknown type with storage ID {}",
                        storage_id
                    )));
                }
                Ok(Datum::Objects(session.transaction()?.get_all_of(storage_id)))
            })),
            Mode::TypedModel => {
                let ty = session
                    .model()
                    .type_for_storage_id(storage_id)
                    .cloned()
                    .ok_or_else(|| {
                        EvalError::new(format!("unknown type with storage ID {}", storage_id))
                    })?;
                Ok(Value::deferred(move |session: &Session| {
                    let storage_ids = session.model().subtypes(ty.storage_id);
                    Ok(Datum::Objects(
                        session.transaction()?.get_all_matching(&storage_ids),
                    ))
                }))
            }
        }
    }
}

impl Function for AllFunction {
    fn name(&self) -> &'static str {
        "all"
    }

    fn usage(&self) -> &'static str {
        "all([type])"
    }

    fn summary(&self) -> &'static str {
        "Get all database objects of a specified type"
    }

    fn parse_params(
        &self,
        session: &Session,
        ctx: &mut ParseContext<'_>,
        complete: bool,
    ) -> Result<FuncParams, ParseError> {
        ctx.skip_whitespace();
        if ctx.try_literal(")") {
            return Ok(FuncParams::Empty);
        }

        // Tab completion for type names: when the parameter position is empty
        // or holds a partial identifier at end of input, suggest type names
        // and abandon the parse so the caller presents them.
        if complete && (ctx.is_eof() || IDENT_ONLY_RE.is_match(ctx.remaining())) {
            return Err(match parser::parse_obj_type(session, ctx, complete) {
                Err(err) => err,
                Ok(_) => ParseError::new(ctx.index(), "expected `)'").with_completion(") "),
            });
        }

        // Bare type name first, then rewind and try a full expression.
        let mark = ctx.mark();
        let params = match parser::parse_obj_type(session, ctx, complete) {
            Ok(ty) => FuncParams::StorageId(ty.storage_id),
            Err(_) => {
                ctx.set_index(mark);
                FuncParams::Expr(Box::new(parser::parse_expression(session, ctx, complete)?))
            }
        };

        ctx.skip_whitespace();
        if !ctx.try_literal(")") {
            return Err(ParseError::new(ctx.index(), "expected `)'").with_completion(") "));
        }
        Ok(params)
    }

    fn apply(&self, session: &Session, params: &FuncParams) -> Result<Value, EvalError> {
        match params {
            FuncParams::Empty => match session.mode() {
                Mode::KeyValue => Err(EvalError::new(
                    "object enumeration requires raw-store or typed-model mode",
                )),
                Mode::RawStore | Mode::TypedModel => {
                    Ok(Value::deferred(|session: &Session| {
                        Ok(Datum::Objects(session.transaction()?.get_all()))
                    }))
                }
            },
            FuncParams::StorageId(storage_id) => self.get_all(session, *storage_id),
            FuncParams::Expr(node) => {
                let datum = node.evaluate(session)?.check_not_null(session, "all()")?;
                // Any numeric result names a storage identifier; fractional
                // values truncate as integer narrowing would.
                let storage_id = match datum {
                    Datum::Int(n) => i64::from(n),
                    Datum::Long(n) => n,
                    Datum::Float(n) => n as i64,
                    Datum::Double(n) => n as i64,
                    Datum::Type(ty) if session.mode() == Mode::TypedModel => {
                        return self.get_all(session, ty.storage_id)
                    }
                    other => {
                        return Err(EvalError::new(format!(
                            "invalid object type expression with value of type {}",
                            other.type_name()
                        )))
                    }
                };
                match u32::try_from(storage_id) {
                    Ok(storage_id) => self.get_all(session, storage_id),
                    Err(_) => Err(EvalError::new(format!(
                        "unknown type with storage ID {}",
                        storage_id
                    ))),
                }
            }
        }
    }
}
