//! shonac-drv - JIT driver.
//!
//! The read–compile–execute loop:
//!
//! ```text
//! Source (.shona)
//!      │
//!      ▼
//!  [Lexer] ──▶ tokens (one-token lookahead)
//!      │
//!      ▼
//!  [Parser] ──▶ top-level item
//!      │
//!      ▼
//!  [Codegen] ──▶ IR in the authoritative module
//!      │
//!      ├─ definition / class / global / extern: accumulate, stage at EOF
//!      │
//!      └─ top-level expression: clone the module (bitcode round-trip into
//!         a fresh context), hand the clone to a scoped JIT instance, map
//!         host intrinsics and global slots, call `__anon_expr<N>`, release.
//! ```
//!
//! The authoritative module, context, and builder survive every execution,
//! so later definitions keep extending the same accumulated state. Globals
//! are host-backed (driver-owned storage mapped into every JIT instance),
//! which is what makes a mutation in one top-level expression visible to the
//! next.
//!
//! Everything is single-threaded: each item is fully compiled and, for
//! expressions, executed before the next token is even read.

use anyhow::{anyhow, Result};
use inkwell::context::Context;
use inkwell::execution_engine::ExecutionEngine;
use inkwell::module::Module;
use inkwell::OptimizationLevel;
use tracing::debug;

use shonac_gen::{initialize_native_target, Codegen, Session};
use shonac_par::ast::Prototype;
use shonac_par::{Parser, ToplevelItem};
use shonac_util::Handler;

/// The call shape of an anonymous top-level expression.
type AnonExpr = unsafe extern "C" fn() -> f64;

/// Driver state for one process.
pub struct Driver<'ctx> {
    codegen: Codegen<'ctx>,
    session: Session,
    /// Whether the module has acquired long-lived content since the last
    /// staging.
    dirty: bool,
    /// Dump module IR before each top-level execution.
    emit_ir: bool,
    /// Names successive authoritative modules after EOF re-initialization.
    module_generation: u32,
}

impl<'ctx> Driver<'ctx> {
    /// Initializes the native target, the code generator, and the built-in
    /// prototype registry.
    pub fn new(context: &'ctx Context, emit_ir: bool) -> Result<Self> {
        initialize_native_target().map_err(|e| anyhow!("{}", e))?;
        let codegen = Codegen::new(context, "shona_main").map_err(|e| anyhow!("{}", e))?;

        let mut session = Session::new();
        for proto in builtin_prototypes() {
            session.register_prototype(proto);
        }

        Ok(Self {
            codegen,
            session,
            dirty: false,
            emit_ir,
            module_generation: 0,
        })
    }

    /// The symbol tables, exposed for inspection.
    pub fn session(&self) -> &Session {
        &self.session
    }

    /// Runs one source text through the loop.
    ///
    /// Parse and emit errors abandon their item and the loop continues; only
    /// JIT/linker failures are fatal.
    pub fn run(&mut self, source: &str) -> Result<()> {
        let handler = Handler::new();
        let mut parser = Parser::new(source, &handler);

        // Holds the EOF-staged engine so its code stays resident until the
        // process exits.
        let mut staged: Option<ExecutionEngine<'ctx>> = None;

        loop {
            match parser.parse_toplevel(&self.session.precedence) {
                ToplevelItem::Eof => {
                    if self.dirty {
                        staged = Some(self.stage_and_reinitialize()?);
                    }
                    break;
                }

                ToplevelItem::Skipped => continue,

                ToplevelItem::Definition(func) => {
                    let name = func.effective_name().to_string();
                    match self.codegen.emit_function(&func, None, &mut self.session) {
                        Ok(_) => {
                            self.dirty = true;
                            debug!(%name, "compiled definition");
                        }
                        Err(error) => eprintln!("Error: {}", error),
                    }
                }

                ToplevelItem::Class(class) => {
                    match self.codegen.emit_class(&class, &mut self.session) {
                        Ok(()) => {
                            self.dirty = true;
                            debug!(name = %class.name, "compiled class");
                        }
                        Err(error) => eprintln!("Error: {}", error),
                    }
                }

                ToplevelItem::Globals(bindings) => {
                    match self
                        .codegen
                        .emit_global_bindings(&bindings, &mut self.session)
                    {
                        Ok(()) => self.dirty = true,
                        Err(error) => eprintln!("Error: {}", error),
                    }
                }

                ToplevelItem::Extern(proto) => {
                    match self.codegen.emit_extern(&proto, &mut self.session) {
                        Ok(_) => debug!(name = %proto.name, "declared extern"),
                        Err(error) => eprintln!("Error: {}", error),
                    }
                }

                ToplevelItem::Expression(func) => {
                    let name = func.proto.name.clone();
                    match self.codegen.emit_function(&func, None, &mut self.session) {
                        Ok(_) => self.execute_anon(&name)?,
                        Err(error) => eprintln!("Error: {}", error),
                    }
                }
            }
        }

        if staged.is_some() {
            debug!("staged definitions held for the remainder of the process");
        }
        Ok(())
    }

    /// Clones the authoritative module and runs one `__anon_expr<N>` in a
    /// scoped JIT instance. The instance and the clone are released when
    /// this returns; the authoritative module is untouched.
    fn execute_anon(&mut self, name: &str) -> Result<()> {
        if self.emit_ir {
            println!("{}", self.codegen.module().print_to_string().to_string());
        }

        let bitcode = self.codegen.bitcode();
        let jit_context = Context::create();
        let module = Module::parse_bitcode_from_buffer(&bitcode, &jit_context)
            .map_err(|e| anyhow!("failed to clone module: {}", e))?;

        let engine = module
            .create_jit_execution_engine(OptimizationLevel::None)
            .map_err(|e| anyhow!("failed to create JIT instance: {}", e))?;

        let slot_addresses = self.session.globals.addresses();
        resolve_host_symbols(&engine, &module);
        resolve_global_slots(&slot_addresses, &engine, &module);

        let compiled = unsafe { engine.get_function::<AnonExpr>(name) }
            .map_err(|e| anyhow!("failed to resolve {}: {}", name, e))?;
        let value = unsafe { compiled.call() };
        debug!(%name, value, "executed top-level expression");

        Ok(())
    }

    /// EOF staging: the accumulated module goes to a JIT instance the caller
    /// keeps alive, and a fresh module (carrying the global declarations)
    /// takes its place so prototypes can keep materializing.
    fn stage_and_reinitialize(&mut self) -> Result<ExecutionEngine<'ctx>> {
        let slot_addresses = self.session.globals.addresses();
        let engine = self
            .codegen
            .module()
            .create_jit_execution_engine(OptimizationLevel::None)
            .map_err(|e| anyhow!("failed to stage module: {}", e))?;
        resolve_host_symbols(&engine, self.codegen.module());
        resolve_global_slots(&slot_addresses, &engine, self.codegen.module());

        self.module_generation += 1;
        let name = format!("shona_main.{}", self.module_generation);
        self.codegen.reinitialize(&name, &self.session.globals);
        self.dirty = false;
        debug!(module = %name, "staged definitions and reopened module");

        Ok(engine)
    }
}

/// Maps every declared global to its host-backed slot.
fn resolve_global_slots<'m>(
    addresses: &[(String, usize)],
    engine: &ExecutionEngine<'m>,
    module: &Module<'m>,
) {
    for (name, address) in addresses {
        if let Some(global) = module.get_global(name) {
            engine.add_global_mapping(&global.as_pointer_value(), *address);
        }
    }
}

/// Maps declared host intrinsics to their addresses in this process.
///
/// Only declarations are mapped; a user definition that shadows an intrinsic
/// name keeps its own body.
fn resolve_host_symbols<'ctx>(engine: &ExecutionEngine<'ctx>, module: &Module<'ctx>) {
    for (symbol, address) in shonac_rt::host_symbols() {
        if let Some(function) = module.get_function(symbol) {
            if function.count_basic_blocks() == 0 {
                engine.add_global_mapping(&function, address);
            }
        }
    }
}

/// The prototypes registered before the loop starts: host-supplied
/// print, file, and arithmetic intrinsics. Bodies live in `shonac-rt`.
fn builtin_prototypes() -> Vec<Prototype> {
    fn args(names: &[&str]) -> Vec<String> {
        names.iter().map(|name| name.to_string()).collect()
    }

    vec![
        Prototype::new("putchard", args(&["x"])),
        Prototype::new("nyora", args(&["x"])),
        Prototype::new("vhuraFaera", args(&["filePath", "mode"])),
        Prototype::new("verengaFaera", args(&["filePath"])),
        Prototype::new("nyoraFaera", args(&["fileHandle", "content"])),
        Prototype::new("bvisaFaera", args(&["filePath"])),
        Prototype::new("wedzera", args(&["a", "b"])),
        Prototype::new("bvisaNamba", args(&["a", "b"])),
        Prototype::new("wedzeranisa", args(&["a", "b"])),
        Prototype::new("govana", args(&["a", "b"])),
        Prototype::new("nambaInosara", args(&["a", "b"])),
        Prototype::new("simba", args(&["base", "exponent"])),
        Prototype::new("tsvagaMudzi", args(&["value"])),
        Prototype::new("logarithm", args(&["value"])),
        Prototype::new("expo", args(&["value"])),
        Prototype::new("saini", args(&["angle"])),
        Prototype::new("cosi", args(&["angle"])),
        Prototype::new("tanhi", args(&["angle"])),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_prototypes_cover_runtime_symbols() {
        let builtins = builtin_prototypes();
        for name in [
            "nyora",
            "putchard",
            "vhuraFaera",
            "verengaFaera",
            "nyoraFaera",
            "bvisaFaera",
            "wedzera",
            "tsvagaMudzi",
            "tanhi",
        ] {
            assert!(
                builtins.iter().any(|p| p.name == name),
                "{} not registered",
                name
            );
        }
    }

    #[test]
    fn test_every_builtin_has_a_host_symbol() {
        let symbols = shonac_rt::host_symbols();
        for proto in builtin_prototypes() {
            assert!(
                symbols.iter().any(|(name, _)| *name == proto.name),
                "{} has no host implementation",
                proto.name
            );
        }
    }

    #[test]
    fn test_builtins_are_not_operators() {
        assert!(builtin_prototypes().iter().all(|p| !p.is_operator));
    }
}
