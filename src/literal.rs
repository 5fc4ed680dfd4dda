use crate::ast::Node;
use crate::cursor::ParseContext;
use crate::error::{completions_matching, ParseError};
use crate::session::{Mode, Session};
use crate::store::ObjId;
use crate::value::Datum;
use num_bigint::BigInt;
use num_traits::ToPrimitive;
use regex::Regex;
use std::sync::LazyLock;

pub static IDENT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*").unwrap());
static IDENT_CHAR_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^[A-Za-z0-9_]").unwrap());

static NULL_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^null").unwrap());
static BOOL_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^(false|true)").unwrap());
static CLASS_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^([A-Za-z_][A-Za-z0-9_]*(?:\s*\.\s*[A-Za-z_][A-Za-z0-9_]*)*)\s*((?:\[\s*\]\s*)*)\.\s*class",
    )
    .unwrap()
});

static HEX_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^([+-]?)(?:0[xX]|#)([0-9a-fA-F]+)([lL])?").unwrap());
static BIN_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^([+-]?)0[bB]([01]+)([lL])?").unwrap());
static OCT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^([+-]?)(0[0-7]*)([lL])?").unwrap());
static DEC_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^([+-]?)([1-9][0-9]*)([lL])?").unwrap());
// A trailing dot or identifier character (digits included) invalidates an
// integer match, so "1.5" is never claimed as the integer 1.
static NUM_FOLLOW_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^[.0-9A-Za-z_]").unwrap());

// Float/double mantissas reject a leading zero followed by more digits, so a
// malformed octal like "09" fails outright instead of becoming a base-10
// number.
static FLOAT_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^([+-]?(?:(?:0|[1-9][0-9]*)(?:\.[0-9]*)?|\.[0-9]+)(?:[eE][+-]?[0-9]+)?)[fF]")
        .unwrap()
});
static DOUBLE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^([+-]?(?:(?:0|[1-9][0-9]*)(?:\.[0-9]*)?|\.[0-9]+)(?:[eE][+-]?[0-9]+)?)[dD]?")
        .unwrap()
});

static CHAR_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^'((?:\\.|[^'\\])*)'").unwrap());
static STRING_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r#"^"((?:\\.|[^"\\])*)""#).unwrap());
static QUOTE_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^'").unwrap());

static OBJ_ID_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^[0-9a-fA-F]{16}").unwrap());

/// Parse one literal at the cursor position.
///
/// The alternatives are attempted in fixed priority order, each rolled back
/// on failure so later forms see the original text. Only exhaustion of every
/// alternative surfaces a parse failure; `complete` enables tab-completion
/// suggestions when the cursor is at end of input.
pub fn parse_literal(
    session: &Session,
    ctx: &mut ParseContext<'_>,
    complete: bool,
) -> Result<Node, ParseError> {
    let start = ctx.index();

    if let Some(node) = try_keyword(ctx) {
        return Ok(node);
    }
    if let Some(node) = try_class(ctx) {
        return Ok(node);
    }
    if let Some(node) = try_int(ctx) {
        return Ok(node);
    }
    if let Some(node) = try_float(ctx) {
        return Ok(node);
    }
    if let Some(node) = try_double(ctx) {
        return Ok(node);
    }
    if let Some(node) = try_char(ctx)? {
        return Ok(node);
    }
    if let Some(node) = try_string(ctx)? {
        return Ok(node);
    }
    if let Some(node) = try_variable(session, ctx, complete)? {
        return Ok(node);
    }
    if let Some(node) = try_object_id(session, ctx)? {
        return Ok(node);
    }

    Err(ParseError::new(start, "invalid expression"))
}

/// `null`, `false`, `true`, but not a longer identifier starting with one.
fn try_keyword(ctx: &mut ParseContext<'_>) -> Option<Node> {
    let mark = ctx.mark();
    if ctx.try_pattern(&NULL_RE).is_some() {
        if !ctx.looking_at(&IDENT_CHAR_RE) {
            return Some(Node::Literal(Datum::Null));
        }
        ctx.set_index(mark);
    }
    if let Some(caps) = ctx.try_pattern(&BOOL_RE) {
        let value = &caps[1] == "true";
        if !ctx.looking_at(&IDENT_CHAR_RE) {
            return Some(Node::Literal(Datum::Bool(value)));
        }
        ctx.set_index(mark);
    }
    None
}

/// A dotted type name with optional `[]` pairs followed by `.class`. Name
/// resolution is left to the model registry at evaluation time.
fn try_class(ctx: &mut ParseContext<'_>) -> Option<Node> {
    let mark = ctx.mark();
    let caps = ctx.try_pattern(&CLASS_RE)?;
    if ctx.looking_at(&IDENT_CHAR_RE) {
        ctx.set_index(mark);
        return None;
    }
    let mut name: String = caps[1].split_whitespace().collect();
    let brackets = caps[2].chars().filter(|c| !c.is_whitespace()).count() / 2;
    for _ in 0..brackets {
        name.push_str("[]");
    }
    Some(Node::ClassLit { name })
}

fn try_int(ctx: &mut ParseContext<'_>) -> Option<Node> {
    let mark = ctx.mark();
    let (radix, caps) = if let Some(caps) = ctx.try_pattern(&HEX_RE) {
        (16, caps)
    } else if let Some(caps) = ctx.try_pattern(&BIN_RE) {
        (2, caps)
    } else if let Some(caps) = ctx.try_pattern(&OCT_RE) {
        (8, caps)
    } else if let Some(caps) = ctx.try_pattern(&DEC_RE) {
        (10, caps)
    } else {
        return None;
    };
    if ctx.looking_at(&NUM_FOLLOW_RE) {
        ctx.set_index(mark);
        return None;
    }

    let mut digits = String::new();
    if &caps[1] == "-" {
        digits.push('-');
    }
    digits.push_str(&caps[2]);
    let is_long = caps.get(3).is_some();

    // Arbitrary-precision magnitude first, then range-check into the target
    // width; out of range abandons this alternative.
    let big = match BigInt::parse_bytes(digits.as_bytes(), radix) {
        Some(big) => big,
        None => {
            ctx.set_index(mark);
            return None;
        }
    };
    let datum = if is_long {
        big.to_i64().map(Datum::Long)
    } else {
        big.to_i32().map(Datum::Int)
    };
    match datum {
        Some(datum) => Some(Node::Literal(datum)),
        None => {
            ctx.set_index(mark);
            None
        }
    }
}

fn try_float(ctx: &mut ParseContext<'_>) -> Option<Node> {
    let mark = ctx.mark();
    let caps = ctx.try_pattern(&FLOAT_RE)?;
    if ctx.looking_at(&IDENT_CHAR_RE) {
        ctx.set_index(mark);
        return None;
    }
    match caps[1].parse::<f32>() {
        Ok(value) => Some(Node::Literal(Datum::Float(value))),
        Err(_) => {
            ctx.set_index(mark);
            None
        }
    }
}

fn try_double(ctx: &mut ParseContext<'_>) -> Option<Node> {
    let mark = ctx.mark();
    let caps = ctx.try_pattern(&DOUBLE_RE)?;
    if ctx.looking_at(&NUM_FOLLOW_RE) {
        ctx.set_index(mark);
        return None;
    }
    match caps[1].parse::<f64>() {
        Ok(value) => Some(Node::Literal(Datum::Double(value))),
        Err(_) => {
            ctx.set_index(mark);
            None
        }
    }
}

/// Single-quoted literal containing exactly one decoded character. Malformed
/// character literals are hard parse errors, not fallthroughs: the opening
/// quote is unambiguous about the author's intent.
fn try_char(ctx: &mut ParseContext<'_>) -> Result<Option<Node>, ParseError> {
    let mark = ctx.mark();
    let Some(caps) = ctx.try_pattern(&CHAR_RE) else {
        return Ok(None);
    };
    if ctx.looking_at(&QUOTE_RE) {
        ctx.set_index(mark);
        return Err(ParseError::new(
            mark,
            "invalid character: contains unescaped single quote",
        ));
    }
    let raw = caps.get(1).map(|m| m.as_str()).unwrap_or("");
    let decoded = decode_escapes(raw).map_err(|msg| {
        ctx.set_index(mark);
        ParseError::new(mark, format!("invalid character: {}", msg))
    })?;
    let mut chars = decoded.chars();
    match (chars.next(), chars.next()) {
        (Some(c), None) => Ok(Some(Node::Literal(Datum::Char(c)))),
        _ => {
            ctx.set_index(mark);
            Err(ParseError::new(
                mark,
                "invalid character: quotes must contain exactly one character",
            ))
        }
    }
}

fn try_string(ctx: &mut ParseContext<'_>) -> Result<Option<Node>, ParseError> {
    let mark = ctx.mark();
    let Some(caps) = ctx.try_pattern(&STRING_RE) else {
        return Ok(None);
    };
    let raw = caps.get(1).map(|m| m.as_str()).unwrap_or("");
    let decoded = decode_escapes(raw).map_err(|msg| {
        ctx.set_index(mark);
        ParseError::new(mark, format!("invalid string: {}", msg))
    })?;
    Ok(Some(Node::Literal(Datum::Str(decoded))))
}

/// `$name`. The binding is looked up at evaluation time; here we only need
/// the name, plus completion support against the session's current bindings.
fn try_variable(
    session: &Session,
    ctx: &mut ParseContext<'_>,
    complete: bool,
) -> Result<Option<Node>, ParseError> {
    if !ctx.try_literal("$") {
        return Ok(None);
    }
    let Some(caps) = ctx.try_pattern(&IDENT_RE) else {
        return Err(ParseError::new(ctx.index(), "invalid variable reference")
            .with_completions(session.var_names()));
    };
    let name = caps[0].to_string();
    if ctx.is_eof() && complete {
        return Err(ParseError::new(ctx.index(), "invalid variable reference")
            .with_completions(completions_matching(session.var_names(), &name)));
    }
    Ok(Some(Node::Var(name)))
}

/// `@` followed by a 16-digit hexadecimal object identifier. Only permitted
/// when the mode allows object access at all.
fn try_object_id(
    session: &Session,
    ctx: &mut ParseContext<'_>,
) -> Result<Option<Node>, ParseError> {
    match session.mode() {
        Mode::KeyValue => return Ok(None),
        Mode::RawStore | Mode::TypedModel => {}
    }
    if !ctx.try_literal("@") {
        return Ok(None);
    }
    let Some(caps) = ctx.try_pattern(&OBJ_ID_RE) else {
        return Err(ParseError::new(
            ctx.index(),
            "invalid object ID: expected 16 hexadecimal digits",
        ));
    };
    // 16 hex digits always fit in a u64
    let id = ObjId(u64::from_str_radix(&caps[0], 16).unwrap());
    match session.mode() {
        Mode::KeyValue => unreachable!(),
        Mode::RawStore => Ok(Some(Node::Literal(Datum::ObjId(id)))),
        Mode::TypedModel => Ok(Some(Node::ObjRef(id))),
    }
}

/// Decode backslash escapes shared by character and string literals.
fn decode_escapes(raw: &str) -> Result<String, String> {
    let mut result = String::with_capacity(raw.len());
    let mut chars = raw.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            result.push(c);
            continue;
        }
        match chars.next() {
            Some('b') => result.push('\u{0008}'),
            Some('t') => result.push('\t'),
            Some('n') => result.push('\n'),
            Some('f') => result.push('\u{000c}'),
            Some('r') => result.push('\r'),
            Some('"') => result.push('"'),
            Some('\'') => result.push('\''),
            Some('\\') => result.push('\\'),
            Some('u') => {
                let hex: String = chars.by_ref().take(4).collect();
                if hex.len() != 4 {
                    return Err("truncated unicode escape".to_string());
                }
                let code = u32::from_str_radix(&hex, 16)
                    .map_err(|_| format!("invalid unicode escape \\u{}", hex))?;
                match char::from_u32(code) {
                    Some(c) => result.push(c),
                    None => return Err(format!("invalid unicode escape \\u{}", hex)),
                }
            }
            Some(c) => return Err(format!("invalid escape sequence \\{}", c)),
            None => return Err("trailing backslash".to_string()),
        }
    }
    Ok(result)
}
