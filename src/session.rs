use crate::error::EvalError;
use crate::func::{AllFunction, Function};
use crate::store::{ModelRegistry, Transaction};
use crate::value::Value;
use std::collections::{BTreeMap, HashMap};
use std::rc::Rc;

/// How object references and enumeration resolve.
///
/// Every mode-sensitive branch matches this exhaustively; there are no
/// boolean capability flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// Key/value access only; no object addressing at all.
    KeyValue,
    /// Raw store access: `@id` literals evaluate to the bare identifier and
    /// enumeration ignores the typed model.
    RawStore,
    /// Typed model access: `@id` literals resolve to handles and enumeration
    /// is schema-aware.
    TypedModel,
}

/// Per-console state consulted during evaluation: variable bindings, the
/// operating mode, the model registry, and the currently open transaction.
///
/// The transaction is replaceable between expressions; parsed nodes never
/// capture it, so re-evaluating a node always observes the live one.
pub struct Session {
    mode: Mode,
    vars: HashMap<String, Value>,
    model: ModelRegistry,
    txn: Option<Rc<Transaction>>,
    functions: BTreeMap<&'static str, Rc<dyn Function>>,
}

impl Session {
    /// Create a session with the standard functions registered.
    pub fn new(mode: Mode, model: ModelRegistry) -> Self {
        let mut session = Self {
            mode,
            vars: HashMap::new(),
            model,
            txn: None,
            functions: BTreeMap::new(),
        };
        session.register_function(Rc::new(AllFunction));
        session
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn model(&self) -> &ModelRegistry {
        &self.model
    }

    pub fn model_mut(&mut self) -> &mut ModelRegistry {
        &mut self.model
    }

    /// Replace (or clear) the currently open transaction.
    pub fn set_transaction(&mut self, txn: Option<Rc<Transaction>>) {
        self.txn = txn;
    }

    /// The currently open transaction, or a labeled evaluation error if none
    /// is open or it has been invalidated.
    pub fn transaction(&self) -> Result<&Transaction, EvalError> {
        self.txn.as_deref().ok_or_else(EvalError::no_transaction)
    }

    pub fn get_var(&self, name: &str) -> Option<Value> {
        self.vars.get(name).cloned()
    }

    pub fn set_var(&mut self, name: &str, value: Value) {
        self.vars.insert(name.to_string(), value);
    }

    pub fn var_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.vars.keys().map(String::as_str).collect();
        names.sort();
        names
    }

    pub fn register_function(&mut self, function: Rc<dyn Function>) {
        self.functions.insert(function.name(), function);
    }

    pub fn function(&self, name: &str) -> Option<Rc<dyn Function>> {
        self.functions.get(name).cloned()
    }

    pub fn function_names(&self) -> Vec<&'static str> {
        self.functions.keys().copied().collect()
    }

    pub fn functions(&self) -> impl Iterator<Item = &Rc<dyn Function>> {
        self.functions.values()
    }
}
