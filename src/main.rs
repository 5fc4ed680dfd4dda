mod ast;
mod cursor;
mod error;
mod func;
mod literal;
mod parser;
mod repl;
mod session;
mod store;
mod value;

use clap::{Arg, Command};
use session::{Mode, Session};
use std::rc::Rc;
use store::{Database, ModelRegistry};

fn main() {
    let matches = Command::new("objex")
        .about("Expression console for a transactional object database")
        .arg(
            Arg::new("mode")
                .long("mode")
                .value_name("MODE")
                .help("Resolution mode: kv, raw, or typed")
                .default_value("typed"),
        )
        .arg(
            Arg::new("command")
                .short('c')
                .long("command")
                .value_name("EXPR")
                .help("Evaluate a single expression and exit"),
        )
        .get_matches();

    let mode = match matches.get_one::<String>("mode").map(String::as_str) {
        Some("kv") => Mode::KeyValue,
        Some("raw") => Mode::RawStore,
        Some("typed") | None => Mode::TypedModel,
        Some(other) => {
            eprintln!("Error: unknown mode '{}' (expected kv, raw, or typed)", other);
            std::process::exit(2);
        }
    };

    let (model, database) = demo_database();
    let mut session = Session::new(mode, model);
    session.set_transaction(Some(Rc::new(database.snapshot())));

    if let Some(expr) = matches.get_one::<String>("command") {
        run_once(expr, &mut session);
    } else {
        repl::start(&mut session);
    }
}

fn run_once(source: &str, session: &mut Session) {
    match parser::parse(session, source, 0, false) {
        Ok(node) => match node.evaluate(session).and_then(|value| value.get(session)) {
            Ok(datum) => println!("{}", datum),
            Err(error) => {
                error.report();
                std::process::exit(1);
            }
        },
        Err(error) => {
            error.report(source);
            std::process::exit(1);
        }
    }
}

/// Seed a small in-memory database so the console has something to query.
fn demo_database() -> (ModelRegistry, Database) {
    let mut model = ModelRegistry::new();
    model.register("Person", 10, None);
    model.register("Employee", 11, Some(10));
    model.register("Pet", 20, None);
    // A type from an earlier schema version: its objects resolve as untyped
    model.record_prior_version("LegacyAccount", 30);

    let mut database = Database::new();
    database.create(10);
    database.create(10);
    database.create(11);
    database.create(20);
    database.create(30);
    (model, database)
}
