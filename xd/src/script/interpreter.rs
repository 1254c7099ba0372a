//! Interpreter - the registry of builtins payloads may call

use std::collections::HashMap;

use super::builtin::{Builtin, ErrorBuiltin, LogBuiltin, PrintBuiltin, SourceNameBuiltin};

/// Local execution context for received payloads
///
/// Payloads can only reach what is registered here.
pub struct Interpreter {
    builtins: HashMap<String, Box<dyn Builtin>>,
}

impl Interpreter {
    /// Interpreter with the standard builtins
    pub fn standard() -> Self {
        let mut builtins: HashMap<String, Box<dyn Builtin>> = HashMap::new();

        builtins.insert("print".into(), Box::new(PrintBuiltin));
        builtins.insert("log".into(), Box::new(LogBuiltin));
        builtins.insert("error".into(), Box::new(ErrorBuiltin));

        // Host hook used by the default addressed binding
        builtins.insert("print_source_name".into(), Box::new(SourceNameBuiltin));

        Self { builtins }
    }

    /// Interpreter with no builtins (for testing)
    pub fn empty() -> Self {
        Self {
            builtins: HashMap::new(),
        }
    }

    /// Register a builtin, replacing any with the same name
    pub fn register(&mut self, builtin: Box<dyn Builtin>) {
        self.builtins.insert(builtin.name().to_string(), builtin);
    }

    pub fn builtin(&self, name: &str) -> Option<&dyn Builtin> {
        self.builtins.get(name).map(|b| b.as_ref())
    }

    pub fn has_builtin(&self, name: &str) -> bool {
        self.builtins.contains_key(name)
    }

    /// Registered names, sorted
    pub fn builtin_names(&self) -> Vec<String> {
        let mut names: Vec<_> = self.builtins.keys().cloned().collect();
        names.sort();
        names
    }
}

impl Default for Interpreter {
    fn default() -> Self {
        Self::standard()
    }
}
