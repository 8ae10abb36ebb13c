//! AST interpreter (tree-walking)
//!
//! Direct AST evaluation with environment-based variable storage.
//! Supports:
//! - Expression evaluation (literals, binary/unary ops, calls, indexing)
//! - Statement execution (declarations, assignments, control flow)
//! - Function calls with a frame stack for error tracebacks
//! - Imports executed into the importing namespace

mod expr;
mod stmt;

use crate::ast::{ImportDecl, Item, Program};
use crate::lexer::Lexer;
use crate::parser::Parser;
use crate::value::{ErrorKind, Frame, Function, RuntimeError, Value};
use indexmap::IndexMap;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::rc::Rc;

/// Deepest allowed call (and import) nesting
pub const MAX_CALL_DEPTH: usize = 256;

/// Name of the frame that runs a file's top-level code
pub const MODULE_FRAME: &str = "<module>";

/// Control flow signal for handling break, continue, and return
#[derive(Debug, Clone, PartialEq)]
pub(super) enum ControlFlow {
    None,
    Break,
    Continue,
    Return(Value),
}

/// A variable slot
#[derive(Debug, Clone)]
pub(super) struct Binding {
    pub(super) value: Value,
    pub(super) mutable: bool,
}

/// One active call
#[derive(Debug, Clone)]
pub(super) struct CallFrame {
    pub(super) function: String,
    pub(super) file: Rc<Path>,
    /// Line of the statement currently executing
    pub(super) line: u32,
}

impl CallFrame {
    fn snapshot(&self) -> Frame {
        Frame {
            function: self.function.clone(),
            file: self.file.to_path_buf(),
            line: self.line,
        }
    }
}

/// Interpreter state
pub struct Interpreter {
    /// Global variables, in definition order
    pub(super) globals: IndexMap<String, Binding>,
    /// Local scopes (stack of environments); empty at module level
    pub(super) locals: Vec<HashMap<String, Binding>>,
    /// Current control flow state
    pub(super) control_flow: ControlFlow,
    /// Loops enclosing the current statement in the current call
    pub(super) loop_depth: usize,
    /// Active calls, outermost first
    pub(super) frames: Vec<CallFrame>,
    /// Files being executed (import cycle detection)
    pub(super) loading: Vec<PathBuf>,
}

impl Interpreter {
    /// Create a new interpreter
    pub fn new() -> Self {
        Self {
            globals: IndexMap::new(),
            locals: Vec::new(),
            control_flow: ControlFlow::None,
            loop_depth: 0,
            frames: Vec::new(),
            loading: Vec::new(),
        }
    }

    /// Execute a program's top-level items in order, inside a `<module>` frame
    pub fn exec_program(&mut self, program: &Program, file: Rc<Path>) -> Result<(), RuntimeError> {
        let key = std::fs::canonicalize(&file).unwrap_or_else(|_| file.to_path_buf());
        self.loading.push(key);
        self.frames.push(CallFrame {
            function: MODULE_FRAME.to_string(),
            file: Rc::clone(&file),
            line: 0,
        });

        let result = self.exec_items(program, &file);

        self.frames.pop();
        self.loading.pop();
        result
    }

    fn exec_items(&mut self, program: &Program, file: &Rc<Path>) -> Result<(), RuntimeError> {
        for item in &program.items {
            match item {
                Item::Function(decl) => {
                    self.set_line(decl.span.line);
                    let function = Function {
                        name: decl.name.name.clone(),
                        params: decl.params.clone(),
                        body: decl.body.clone(),
                        file: Rc::clone(file),
                        line: decl.span.line,
                    };
                    self.define_global(
                        decl.name.name.clone(),
                        Value::Function(Rc::new(function)),
                        false,
                    );
                }
                Item::Import(import) => {
                    self.set_line(import.span.line);
                    self.exec_import(import, file)
                        .map_err(|e| self.with_traceback(e))?;
                }
                Item::Statement(stmt) => {
                    self.exec_statement(stmt)?;
                    if let ControlFlow::Return(_) = self.control_flow {
                        self.control_flow = ControlFlow::None;
                        break;
                    }
                }
            }
        }
        Ok(())
    }

    /// Execute an imported file into this interpreter's globals
    fn exec_import(&mut self, import: &ImportDecl, importer: &Path) -> Result<(), RuntimeError> {
        let base = importer.parent().unwrap_or_else(|| Path::new(""));
        let path = base.join(&import.source);
        let key = std::fs::canonicalize(&path).unwrap_or_else(|_| path.clone());

        if self.loading.contains(&key) {
            return Err(RuntimeError::new(
                ErrorKind::Import,
                format!("circular import of '{}'", import.source),
            ));
        }
        if self.loading.len() > MAX_CALL_DEPTH {
            return Err(RuntimeError::new(
                ErrorKind::Recursion,
                "maximum import depth exceeded",
            ));
        }

        let source = std::fs::read_to_string(&path).map_err(|e| {
            RuntimeError::new(
                ErrorKind::Import,
                format!("cannot read '{}': {}", import.source, e),
            )
        })?;

        let (tokens, lex_diags) = Lexer::new(source).tokenize();
        let (program, parse_diags) = Parser::new(tokens).parse();
        if let Some(diag) = lex_diags.iter().chain(parse_diags.iter()).next() {
            return Err(RuntimeError::new(
                ErrorKind::Import,
                format!("syntax error in '{}' at line {}: {}", import.source, diag.line, diag.message),
            ));
        }

        tracing::debug!(path = %path.display(), "importing");
        self.exec_program(&program, Rc::from(path))
    }

    /// Call a function value with already-evaluated arguments
    pub fn call_value(&mut self, callee: &Value, args: Vec<Value>) -> Result<Value, RuntimeError> {
        match callee {
            Value::Builtin(name) => crate::stdlib::call_builtin(name, &args),
            Value::Function(func) => self.call_function(func, args),
            other => Err(RuntimeError::type_error(format!(
                "'{}' is not callable",
                other.type_name()
            ))),
        }
    }

    fn call_function(&mut self, func: &Rc<Function>, args: Vec<Value>) -> Result<Value, RuntimeError> {
        if args.len() != func.params.len() {
            return Err(RuntimeError::type_error(format!(
                "{}() takes {} argument(s) but {} were given",
                func.name,
                func.params.len(),
                args.len()
            )));
        }
        if self.frames.len() >= MAX_CALL_DEPTH {
            return Err(RuntimeError::new(
                ErrorKind::Recursion,
                "maximum call depth exceeded",
            ));
        }

        let mut scope = HashMap::new();
        for (param, value) in func.params.iter().zip(args) {
            scope.insert(
                param.name.clone(),
                Binding {
                    value,
                    mutable: false,
                },
            );
        }

        let saved_locals = std::mem::replace(&mut self.locals, vec![scope]);
        let saved_loop_depth = std::mem::replace(&mut self.loop_depth, 0);
        self.frames.push(CallFrame {
            function: func.name.clone(),
            file: Rc::clone(&func.file),
            line: func.line,
        });

        let result = self.exec_body(func);

        self.frames.pop();
        self.locals = saved_locals;
        self.loop_depth = saved_loop_depth;
        result
    }

    fn exec_body(&mut self, func: &Function) -> Result<Value, RuntimeError> {
        for stmt in &func.body.statements {
            self.exec_statement(stmt)?;
            if let ControlFlow::Return(value) =
                std::mem::replace(&mut self.control_flow, ControlFlow::None)
            {
                return Ok(value);
            }
        }
        Ok(Value::Null)
    }

    /// Record the line of the statement about to run in the innermost frame
    pub(super) fn set_line(&mut self, line: u32) {
        if let Some(frame) = self.frames.last_mut() {
            frame.line = line;
        }
    }

    /// Attach the current call stack to an error that has none yet
    pub(super) fn with_traceback(&self, mut error: RuntimeError) -> RuntimeError {
        if error.frames.is_empty() {
            error.frames = self.frames.iter().rev().map(CallFrame::snapshot).collect();
        }
        error
    }

    /// Get a variable value
    pub(super) fn get_variable(&self, name: &str) -> Result<Value, RuntimeError> {
        // Check locals (innermost to outermost)
        for scope in self.locals.iter().rev() {
            if let Some(binding) = scope.get(name) {
                return Ok(binding.value.clone());
            }
        }

        if let Some(binding) = self.globals.get(name) {
            return Ok(binding.value.clone());
        }

        if let Some(builtin) = crate::stdlib::lookup(name) {
            return Ok(Value::Builtin(builtin));
        }

        Err(RuntimeError::undefined(name))
    }

    /// Set a variable value
    pub(super) fn set_variable(&mut self, name: &str, value: Value) -> Result<(), RuntimeError> {
        let slot = self
            .locals
            .iter_mut()
            .rev()
            .find_map(|scope| scope.get_mut(name))
            .or_else(|| self.globals.get_mut(name));

        match slot {
            Some(binding) if binding.mutable => {
                binding.value = value;
                Ok(())
            }
            Some(_) => Err(RuntimeError::type_error(format!(
                "cannot assign to immutable binding '{}'",
                name
            ))),
            None => Err(RuntimeError::undefined(name)),
        }
    }

    /// Declare a variable in the innermost scope
    pub(super) fn declare(&mut self, name: String, value: Value, mutable: bool) {
        match self.locals.last_mut() {
            Some(scope) => {
                scope.insert(name, Binding { value, mutable });
            }
            None => self.define_global(name, value, mutable),
        }
    }

    /// Define a global variable
    ///
    /// Rebinding an existing name keeps its original position.
    pub fn define_global(&mut self, name: String, value: Value, mutable: bool) {
        self.globals.insert(name, Binding { value, mutable });
    }

    /// Look up a global binding
    pub fn global(&self, name: &str) -> Option<&Value> {
        self.globals.get(name).map(|binding| &binding.value)
    }

    /// Global bindings in definition order
    pub fn globals(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.globals
            .iter()
            .map(|(name, binding)| (name.as_str(), &binding.value))
    }

    /// Push a new scope
    pub(super) fn push_scope(&mut self) {
        self.locals.push(HashMap::new());
    }

    /// Pop the current scope
    pub(super) fn pop_scope(&mut self) {
        self.locals.pop();
    }
}

impl Default for Interpreter {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::fs;
    use tempfile::TempDir;

    fn run(source: &str, file: &str) -> (Interpreter, Result<(), RuntimeError>) {
        let (tokens, lex_diags) = Lexer::new(source).tokenize();
        assert!(lex_diags.is_empty(), "lexer errors: {:?}", lex_diags);
        let (program, diags) = Parser::new(tokens).parse();
        assert!(diags.is_empty(), "parse errors: {:?}", diags);
        let mut interp = Interpreter::new();
        let result = interp.exec_program(&program, Rc::from(Path::new(file)));
        (interp, result)
    }

    fn call(interp: &mut Interpreter, name: &str) -> Result<Value, RuntimeError> {
        let callee = interp.global(name).cloned().expect("global exists");
        interp.call_value(&callee, Vec::new())
    }

    #[test]
    fn test_globals_keep_definition_order() {
        let (interp, result) = run(
            "fn test_b() { }\nlet x = 1;\nfn test_a() { }\nfn test_b() { return 2; }",
            "unit.tl",
        );
        result.unwrap();
        let names: Vec<&str> = interp.globals().map(|(name, _)| name).collect();
        assert_eq!(names, vec!["test_b", "x", "test_a"]);
    }

    #[test]
    fn test_function_binds_when_reached() {
        let (_, result) = run("later();\nfn later() { }", "unit.tl");
        let err = result.unwrap_err();
        assert_eq!(err.kind, ErrorKind::Name);
        assert_eq!(err.frames[0].function, MODULE_FRAME);
        assert_eq!(err.frames[0].line, 1);
    }

    #[test]
    fn test_error_frames_point_at_failing_statement() {
        let source = "fn helper(x) {\n    return 10 / x;\n}\n\nfn test_div() {\n    let a = 1;\n    helper(0);\n}\n";
        let (mut interp, result) = run(source, "unit.tl");
        result.unwrap();

        let err = call(&mut interp, "test_div").unwrap_err();
        assert_eq!(err.kind, ErrorKind::ZeroDivision);
        let frames: Vec<(&str, u32)> = err
            .frames
            .iter()
            .map(|f| (f.function.as_str(), f.line))
            .collect();
        assert_eq!(frames, vec![("helper", 2), ("test_div", 7)]);
    }

    #[test]
    fn test_while_condition_error_reports_while_line() {
        let source = "fn test_loop() {\n    var i = 0;\n    while (i < 2) {\n        i = i + 1;\n    }\n    while (missing) {\n    }\n}";
        let (mut interp, result) = run(source, "unit.tl");
        result.unwrap();
        let err = call(&mut interp, "test_loop").unwrap_err();
        assert_eq!(err.kind, ErrorKind::Name);
        assert_eq!(err.frames[0].line, 6);
    }

    #[test]
    fn test_functions_see_globals_not_caller_locals() {
        let source = "let g = 5;\nfn read() { return g; }\nfn peek() { return secret; }\nfn test_scope() {\n    let secret = 1;\n    assert(read() == 5);\n    peek();\n}";
        let (mut interp, result) = run(source, "unit.tl");
        result.unwrap();
        let err = call(&mut interp, "test_scope").unwrap_err();
        assert_eq!(err.kind, ErrorKind::Name);
        assert_eq!(err.message, "name 'secret' is not defined");
    }

    #[test]
    fn test_recursion_limit() {
        // Debug builds need more than the default test thread stack
        let handle = std::thread::Builder::new()
            .stack_size(64 * 1024 * 1024)
            .spawn(|| {
                let source = "fn down(n) { return down(n + 1); }\nfn test_deep() { down(0); }";
                let (mut interp, result) = run(source, "unit.tl");
                result.unwrap();
                let err = call(&mut interp, "test_deep").unwrap_err();
                assert_eq!(err.kind, ErrorKind::Recursion);
                assert_eq!(err.frames.len(), MAX_CALL_DEPTH);
                assert!(interp.frames.is_empty());
            })
            .unwrap();
        handle.join().unwrap();
    }

    #[test]
    fn test_self_containing_array_renders_and_compares() {
        let source = "fn test_cycle() {\n    var a = [1];\n    push(a, a);\n    var b = [1];\n    push(b, b);\n    assert(str(a) == \"[1, [...]]\");\n    assert(a == b);\n    raise a;\n}";
        let (mut interp, result) = run(source, "unit.tl");
        result.unwrap();
        let err = call(&mut interp, "test_cycle").unwrap_err();
        assert_eq!(err.kind, ErrorKind::Raised);
        assert_eq!(err.message, "[1, [...]]");
        assert_eq!(err.frames[0].line, 8);
    }

    #[test]
    fn test_deeply_nested_comparison_is_recursion_error() {
        let source = "fn nest() {\n    var a = [];\n    var i = 0;\n    while (i < 300) {\n        a = [a];\n        i = i + 1;\n    }\n    return a;\n}\nfn test_eq() {\n    let same = nest() == nest();\n}";
        let (mut interp, result) = run(source, "unit.tl");
        result.unwrap();
        let err = call(&mut interp, "test_eq").unwrap_err();
        assert_eq!(err.kind, ErrorKind::Recursion);
        assert_eq!(err.frames[0].line, 11);
    }

    #[test]
    fn test_let_is_immutable() {
        let (_, result) = run("let x = 1;\nx = 2;", "unit.tl");
        let err = result.unwrap_err();
        assert_eq!(err.kind, ErrorKind::Type);
        assert!(err.message.contains("immutable"));
    }

    #[test]
    fn test_import_keeps_helper_file_in_frames() {
        let dir = TempDir::new().unwrap();
        fs::write(
            dir.path().join("helpers.tl"),
            "fn fail() {\n    raise \"from helper\";\n}\n",
        )
        .unwrap();
        let unit = dir.path().join("test_unit.tl");
        let source = "import \"helpers.tl\";\n\nfn test_it() {\n    fail();\n}\n";
        fs::write(&unit, source).unwrap();

        let (mut interp, result) = run(source, unit.to_str().unwrap());
        result.unwrap();
        let err = call(&mut interp, "test_it").unwrap_err();
        assert_eq!(err.kind, ErrorKind::Raised);
        assert_eq!(err.frames[0].file, dir.path().join("helpers.tl"));
        assert_eq!(err.frames[0].line, 2);
        let in_unit = err.innermost_frame_in(&unit).expect("unit frame");
        assert_eq!(in_unit.line, 4);
    }

    #[test]
    fn test_circular_import_detected() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("a.tl"), "import \"b.tl\";\n").unwrap();
        fs::write(dir.path().join("b.tl"), "import \"a.tl\";\n").unwrap();
        let unit = dir.path().join("a.tl");

        let (_, result) = run("import \"b.tl\";\n", unit.to_str().unwrap());
        let err = result.unwrap_err();
        assert_eq!(err.kind, ErrorKind::Import);
        assert!(err.message.contains("circular import"));
    }

    #[test]
    fn test_missing_import() {
        let (_, result) = run("import \"nowhere.tl\";", "unit.tl");
        let err = result.unwrap_err();
        assert_eq!(err.kind, ErrorKind::Import);
        assert_eq!(err.frames[0].line, 1);
    }
}
