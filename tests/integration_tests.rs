// End-to-end tests for the console expression language: parse entry point,
// evaluation against live transactions, and tab completion.

use objex::{
    Database, Datum, EvalError, Mode, ModelRegistry, Node, ParseError, Session, TypeHint, Value,
};
use std::rc::Rc;

fn demo_model() -> ModelRegistry {
    let mut model = ModelRegistry::new();
    model.register("Person", 10, None);
    model.register("Employee", 11, Some(10));
    model.register("Pet", 20, None);
    model.record_prior_version("LegacyAccount", 30);
    model
}

fn typed_session() -> Session {
    Session::new(Mode::TypedModel, demo_model())
}

fn parse(session: &Session, source: &str) -> Result<Node, ParseError> {
    objex::parse(session, source, 0, false)
}

fn parse_complete(session: &Session, source: &str) -> Result<Node, ParseError> {
    objex::parse(session, source, 0, true)
}

fn eval(session: &Session, source: &str) -> Result<Datum, EvalError> {
    let node = parse(session, source).expect("parse failed");
    node.evaluate(session)?.get(session)
}

#[test]
fn numeric_literals_round_trip() {
    let session = typed_session();
    for (source, expected) in [
        ("0", Datum::Int(0)),
        ("42", Datum::Int(42)),
        ("0x7fffffff", Datum::Int(i32::MAX)),
        ("0b101", Datum::Int(5)),
        ("017", Datum::Int(15)),
        ("42L", Datum::Long(42)),
        ("0x80000000L", Datum::Long(0x8000_0000)),
        ("-0x80000000", Datum::Int(i32::MIN)),
    ] {
        assert_eq!(eval(&session, source).unwrap(), expected, "{}", source);
    }
}

#[test]
fn int_range_check_rejects_one_bit_over() {
    let session = typed_session();
    assert!(parse(&session, "0x80000000").is_err());
    assert!(parse(&session, "0x8000000000000000L").is_err());
}

#[test]
fn malformed_octal_is_a_parse_failure() {
    let session = typed_session();
    assert!(parse(&session, "09").is_err());
}

#[test]
fn escaped_quote_char_literal() {
    let session = typed_session();
    assert_eq!(eval(&session, r"'\''").unwrap(), Datum::Char('\''));
    let err = parse(&session, "'''").unwrap_err();
    assert!(err.message.contains("unescaped single quote"), "{}", err);
}

#[test]
fn unbound_variable_fails_at_evaluation_not_parse() {
    let mut session = typed_session();
    let node = parse(&session, "$foo").expect("$foo must parse");
    let err = node.evaluate(&session).unwrap_err();
    assert!(err.message.contains("$foo"), "{}", err);

    // Binding the name afterwards makes the same node evaluate
    session.set_var("foo", Value::Const(Datum::Int(7)));
    assert_eq!(
        node.evaluate(&session).unwrap().get(&session).unwrap(),
        Datum::Int(7)
    );
}

#[test]
fn object_reference_type_hint_degrades_in_two_tiers() {
    let mut model = demo_model();
    model.record_prior_version("Ancient", 0);
    let session = Session::new(Mode::TypedModel, model);

    // Storage ID 0: known to an earlier schema version only
    let node = parse(&session, "@0000000000000001").unwrap();
    assert_eq!(node.type_hint(&session), TypeHint::Untyped);

    // Storage ID 99: never registered at all
    let node = parse(&session, "@0063000000000001").unwrap();
    assert_eq!(node.type_hint(&session), TypeHint::AnyObject);

    // Storage ID 10: present in the bound schema version
    let node = parse(&session, "@000a000000000001").unwrap();
    match node.type_hint(&session) {
        TypeHint::Model(ty) => assert_eq!(ty.name, "Person"),
        other => panic!("unexpected hint {:?}", other),
    }
}

#[test]
fn object_reference_resolves_against_current_transaction() {
    let mut database = Database::new();
    let id = database.create(10);
    let mut session = typed_session();

    let node = parse(&session, &format!("@{}", id)).unwrap();

    // No transaction open yet
    let err = node.evaluate(&session).unwrap_err();
    assert!(err.message.contains("transaction"), "{}", err);

    session.set_transaction(Some(Rc::new(database.snapshot())));
    match node.evaluate(&session).unwrap().get(&session).unwrap() {
        Datum::Object(handle) => assert_eq!(handle.id, id),
        other => panic!("unexpected {:?}", other),
    }

    // The object goes away in a later transaction; the same node notices
    database.delete(id);
    session.set_transaction(Some(Rc::new(database.snapshot())));
    assert!(node.evaluate(&session).is_err());
}

#[test]
fn raw_store_object_literal_is_the_bare_id() {
    let session = Session::new(Mode::RawStore, demo_model());
    match eval(&session, "@000a000000000001").unwrap() {
        Datum::ObjId(id) => assert_eq!(id.storage_id(), 10),
        other => panic!("unexpected {:?}", other),
    }
}

#[test]
fn all_reflects_each_transaction_independently() {
    let mut database = Database::new();
    database.create(10);
    let mut session = typed_session();
    session.set_transaction(Some(Rc::new(database.snapshot())));

    let node = parse(&session, "all()").unwrap();
    let value = node.evaluate(&session).unwrap();

    match value.get(&session).unwrap() {
        Datum::Objects(handles) => assert_eq!(handles.len(), 1),
        other => panic!("unexpected {:?}", other),
    }

    database.create(10);
    database.create(20);
    session.set_transaction(Some(Rc::new(database.snapshot())));

    // Same deferred value, no caching across retrievals
    match value.get(&session).unwrap() {
        Datum::Objects(handles) => assert_eq!(handles.len(), 3),
        other => panic!("unexpected {:?}", other),
    }
}

#[test]
fn all_with_type_name_resolves_at_parse_time() {
    let session = typed_session();
    let node = parse(&session, "all(Person)").unwrap();
    match &node {
        Node::Call { name, params } => {
            assert_eq!(name, "all");
            match params {
                objex::FuncParams::StorageId(10) => {}
                other => panic!("unexpected payload {:?}", other),
            }
        }
        other => panic!("unexpected {:?}", other),
    }
}

#[test]
fn all_with_type_name_includes_subtypes_in_typed_mode() {
    let mut database = Database::new();
    database.create(10);
    database.create(11);
    database.create(20);
    let mut session = typed_session();
    session.set_transaction(Some(Rc::new(database.snapshot())));

    match eval(&session, "all(Person)").unwrap() {
        // Person plus its Employee subtype, but not Pet
        Datum::Objects(handles) => {
            assert_eq!(handles.len(), 2);
            assert!(handles.iter().all(|h| h.storage_id == 10 || h.storage_id == 11));
        }
        other => panic!("unexpected {:?}", other),
    }
}

#[test]
fn raw_store_all_does_not_expand_subtypes() {
    let mut database = Database::new();
    database.create(10);
    database.create(11);
    let mut session = Session::new(Mode::RawStore, demo_model());
    session.set_transaction(Some(Rc::new(database.snapshot())));

    match eval(&session, "all(Person)").unwrap() {
        Datum::Objects(handles) => {
            assert_eq!(handles.len(), 1);
            assert_eq!(handles[0].storage_id, 10);
        }
        other => panic!("unexpected {:?}", other),
    }
}

#[test]
fn all_with_expression_defers_storage_id_resolution() {
    let mut database = Database::new();
    database.create(20);
    let mut session = typed_session();
    session.set_transaction(Some(Rc::new(database.snapshot())));

    // The literal 3 parses fine; the unknown storage ID fails at evaluation
    let node = parse(&session, "all(3)").unwrap();
    match &node {
        Node::Call { params, .. } => assert!(matches!(params, objex::FuncParams::Expr(_))),
        other => panic!("unexpected {:?}", other),
    }
    let err = node.evaluate(&session).unwrap_err();
    assert!(err.message.contains("unknown type"), "{}", err);

    // A registered storage ID works
    match eval(&session, "all(20)").unwrap() {
        Datum::Objects(handles) => assert_eq!(handles.len(), 1),
        other => panic!("unexpected {:?}", other),
    }
}

#[test]
fn all_accepts_any_numeric_storage_id_expression() {
    let mut database = Database::new();
    database.create(20);
    let mut session = typed_session();
    session.set_transaction(Some(Rc::new(database.snapshot())));

    // Floats and doubles name a storage ID too; fractions truncate
    for source in ["all(20.0)", "all(20f)", "all(20L)", "all(20.9)"] {
        match eval(&session, source).unwrap() {
            Datum::Objects(handles) => assert_eq!(handles.len(), 1, "{}", source),
            other => panic!("unexpected {:?} for {}", other, source),
        }
    }
}

#[test]
fn all_with_class_expression_in_typed_mode() {
    let mut database = Database::new();
    database.create(10);
    database.create(11);
    let mut session = typed_session();
    session.set_transaction(Some(Rc::new(database.snapshot())));

    session.set_var(
        "personType",
        Value::Const(Datum::Type(
            session.model().type_for_name("Person").unwrap().clone(),
        )),
    );
    match eval(&session, "all($personType)").unwrap() {
        Datum::Objects(handles) => assert_eq!(handles.len(), 2),
        other => panic!("unexpected {:?}", other),
    }
}

#[test]
fn all_rejects_null_and_wrong_runtime_types() {
    let mut database = Database::new();
    database.create(10);
    let mut session = typed_session();
    session.set_transaction(Some(Rc::new(database.snapshot())));

    let err = eval(&session, "all(null)").unwrap_err();
    assert!(err.message.contains("null value for all()"), "{}", err);

    let err = eval(&session, "all(\"Person\")").unwrap_err();
    assert!(err.message.contains("value of type string"), "{}", err);
}

#[test]
fn class_literal_resolves_through_the_registry() {
    let session = typed_session();
    match eval(&session, "Person.class").unwrap() {
        Datum::Type(ty) => assert_eq!(ty.storage_id, 10),
        other => panic!("unexpected {:?}", other),
    }
    let node = parse(&session, "Nonesuch.class").unwrap();
    assert!(node.evaluate(&session).is_err());
}

#[test]
fn variable_completion_after_dollar() {
    let mut session = typed_session();
    session.set_var("foo", Value::Const(Datum::Int(1)));
    session.set_var("fob", Value::Const(Datum::Int(2)));
    session.set_var("bar", Value::Const(Datum::Int(3)));

    let err = parse_complete(&session, "$").unwrap_err();
    assert_eq!(err.completions, vec!["bar", "fob", "foo"]);

    let err = parse_complete(&session, "$f").unwrap_err();
    assert_eq!(err.completions, vec!["fob", "foo"]);
}

#[test]
fn type_name_completion_inside_all() {
    let session = typed_session();

    let err = parse_complete(&session, "all(").unwrap_err();
    assert_eq!(err.completions, vec!["Employee", "Person", "Pet"]);

    let err = parse_complete(&session, "all(Pe").unwrap_err();
    assert_eq!(err.completions, vec!["Person", "Pet"]);
}

#[test]
fn missing_close_paren_offers_completion() {
    let session = typed_session();
    let err = parse(&session, "all(Person").unwrap_err();
    assert_eq!(err.message, "expected `)'");
    assert_eq!(err.completions, vec![") "]);
}

#[test]
fn function_name_completion() {
    let session = typed_session();
    let err = parse_complete(&session, "al").unwrap_err();
    assert_eq!(err.completions, vec!["all("]);
}

#[test]
fn unknown_function_reports_at_call_site() {
    let session = typed_session();
    let err = parse(&session, "frobnicate(1)").unwrap_err();
    assert_eq!(err.position, 0);
    assert!(err.message.contains("frobnicate"), "{}", err);
}

#[test]
fn trailing_input_is_a_parse_failure() {
    let session = typed_session();
    let err = parse(&session, "42 bogus").unwrap_err();
    assert_eq!(err.message, "unexpected trailing input");
    assert_eq!(err.position, 3);
}

#[test]
fn deferred_binding_tracks_the_live_transaction() {
    let mut database = Database::new();
    database.create(10);
    let mut session = typed_session();
    session.set_transaction(Some(Rc::new(database.snapshot())));

    // Bind $everything to the unforced enumeration value
    let node = parse(&session, "all()").unwrap();
    let value = node.evaluate(&session).unwrap();
    session.set_var("everything", value);

    match eval(&session, "$everything").unwrap() {
        Datum::Objects(handles) => assert_eq!(handles.len(), 1),
        other => panic!("unexpected {:?}", other),
    }

    database.create(20);
    session.set_transaction(Some(Rc::new(database.snapshot())));
    match eval(&session, "$everything").unwrap() {
        Datum::Objects(handles) => assert_eq!(handles.len(), 2),
        other => panic!("unexpected {:?}", other),
    }
}

#[test]
fn key_value_mode_has_no_object_access() {
    let session = Session::new(Mode::KeyValue, demo_model());
    assert!(parse(&session, "@000a000000000001").is_err());

    let node = parse(&session, "all()").unwrap();
    let err = node.evaluate(&session).unwrap_err();
    assert!(err.message.contains("mode"), "{}", err);
}

#[test]
fn whitespace_tolerated_around_expressions() {
    let session = typed_session();
    assert_eq!(eval(&session, "   42  ").unwrap(), Datum::Int(42));
    assert_eq!(
        parse(&session, "all( Person )").is_ok(),
        true,
        "space inside call parens"
    );
}
