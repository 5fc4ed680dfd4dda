// objex - expression console for a transactional object database
//
// The core is the literal tokenizer, the node/value abstraction, and the
// function dispatch protocol: expressions parse once into immutable nodes
// and evaluate repeatedly against whichever transaction is current.

// Public modules
pub mod ast;
pub mod cursor;
pub mod error;
pub mod func;
pub mod literal;
pub mod parser;
pub mod repl;
pub mod session;
pub mod store;
pub mod value;

// Re-export commonly used items
pub use ast::{Node, TypeHint};
pub use cursor::ParseContext;
pub use error::{EvalError, ParseError};
pub use func::{AllFunction, FuncParams, Function};
pub use session::{Mode, Session};
pub use store::{Database, ModelRegistry, ObjHandle, ObjId, Transaction, TypeDesc};
pub use value::{Datum, Value};

// Re-export main functions
pub use parser::parse;
pub use repl::start as start_repl;
