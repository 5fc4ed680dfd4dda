use crate::ast::Node;
use crate::cursor::ParseContext;
use crate::error::{completions_matching, ParseError};
use crate::literal::{self, IDENT_RE};
use crate::session::Session;
use crate::store::TypeDesc;

/// Parse entry point for the console front-end.
///
/// Parses one complete expression starting at `start`, requiring the rest of
/// the input to be blank. With `complete` set, end-of-input failures carry
/// tab-completion suggestions instead of plain errors.
pub fn parse(
    session: &Session,
    source: &str,
    start: usize,
    complete: bool,
) -> Result<Node, ParseError> {
    let mut ctx = ParseContext::at(source, start);
    ctx.skip_whitespace();
    let node = parse_expression(session, &mut ctx, complete)?;
    ctx.skip_whitespace();
    if !ctx.is_eof() {
        return Err(ParseError::new(ctx.index(), "unexpected trailing input"));
    }
    Ok(node)
}

/// Parse one expression: a function call or a literal.
///
/// The full arithmetic grammar lives above this layer; function-call syntax
/// is handled here because the registry is consulted during tokenization.
pub fn parse_expression(
    session: &Session,
    ctx: &mut ParseContext<'_>,
    complete: bool,
) -> Result<Node, ParseError> {
    ctx.skip_whitespace();
    let mark = ctx.mark();

    if let Some(caps) = ctx.try_pattern(&IDENT_RE) {
        let name = &caps[0];
        if ctx.try_literal("(") {
            if let Some(function) = session.function(name) {
                let params = function.parse_params(session, ctx, complete)?;
                return Ok(Node::Call {
                    name: name.to_string(),
                    params,
                });
            }
            return Err(
                ParseError::new(mark, format!("unknown function `{}()'", name)).with_completions(
                    completions_matching(session.function_names().into_iter(), name)
                        .into_iter()
                        .map(|n| format!("{}(", n)),
                ),
            );
        }
        if complete && ctx.is_eof() {
            // Partial function name at end of input
            return Err(ParseError::new(ctx.index(), "invalid expression").with_completions(
                completions_matching(session.function_names().into_iter(), name)
                    .into_iter()
                    .map(|n| format!("{}(", n)),
            ));
        }
        ctx.set_index(mark);
    }

    literal::parse_literal(session, ctx, complete)
}

/// Parse a bare object type name and resolve it against the model registry.
///
/// Used by functions taking a type parameter; the cursor is rolled back by
/// the caller when this strategy loses to a general expression parse.
pub fn parse_obj_type(
    session: &Session,
    ctx: &mut ParseContext<'_>,
    complete: bool,
) -> Result<TypeDesc, ParseError> {
    ctx.skip_whitespace();
    let mark = ctx.mark();
    let Some(caps) = ctx.try_pattern(&IDENT_RE) else {
        return Err(ParseError::new(ctx.index(), "invalid object type")
            .with_completions(session.model().type_names()));
    };
    let name = &caps[0];
    if complete && ctx.is_eof() {
        return Err(ParseError::new(ctx.index(), "invalid object type")
            .with_completions(completions_matching(
                session.model().type_names(),
                name,
            )));
    }
    match session.model().type_for_name(name) {
        Some(ty) => Ok(ty.clone()),
        None => {
            let err = ParseError::new(mark, format!("unknown object type `{}'", name));
            ctx.set_index(mark);
            Err(err)
        }
    }
}
