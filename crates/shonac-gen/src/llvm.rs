//! IR emission into an LLVM module via inkwell.

use indexmap::IndexMap;
use inkwell::builder::Builder;
use inkwell::context::Context;
use inkwell::memory_buffer::MemoryBuffer;
use inkwell::module::{Linkage, Module};
use inkwell::passes::PassBuilderOptions;
use inkwell::targets::{CodeModel, InitializationConfig, RelocMode, Target, TargetMachine};
use inkwell::types::BasicMetadataTypeEnum;
use inkwell::values::{
    BasicMetadataValueEnum, BasicValueEnum, FloatValue, FunctionValue, GlobalValue, PointerValue,
};
use inkwell::{AddressSpace, FloatPredicate, OptimizationLevel};
use rustc_hash::FxHashMap;

use shonac_par::ast::{Class, Expr, Function, Prototype};
use shonac_par::{default_precedence, PrecedenceTable};

use crate::error::{CodegenError, Result};
use crate::intrinsics::{intrinsic_signature, AbiType, IntrinsicSig};

/// The scalar pass set run after every function emission.
const FUNCTION_PASS_PIPELINE: &str = "function(mem2reg,instcombine,reassociate,gvn,simplifycfg)";

/// Initializes the native LLVM target. Idempotent; must run before any
/// [`Codegen`] is created.
pub fn initialize_native_target() -> Result<()> {
    Target::initialize_native(&InitializationConfig::default()).map_err(CodegenError::Llvm)
}

/// Process-wide global variable slots.
///
/// Each slot is host-backed storage owned by the driver, so a global mutated
/// by one JIT'd expression is seen by the next one: every ephemeral module
/// declares the global `external` and every JIT instance maps the symbol to
/// the same address. Insertion order is kept so re-declaration after module
/// re-initialization is deterministic.
pub struct GlobalStore {
    slots: IndexMap<String, Box<f64>>,
}

impl GlobalStore {
    pub fn new() -> Self {
        Self {
            slots: IndexMap::new(),
        }
    }

    /// True if a global of this name has been defined.
    pub fn contains(&self, name: &str) -> bool {
        self.slots.contains_key(name)
    }

    /// Defines a global with its constant initial value.
    pub fn define(&mut self, name: &str, value: f64) {
        self.slots.insert(name.to_string(), Box::new(value));
    }

    /// Current value of a global, if defined.
    pub fn value(&self, name: &str) -> Option<f64> {
        self.slots.get(name).map(|slot| **slot)
    }

    /// Names of all defined globals, in definition order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.slots.keys().map(String::as_str)
    }

    /// `(name, address)` pairs for JIT symbol mapping.
    ///
    /// The addresses point into the boxed slots and stay valid for the
    /// lifetime of the store.
    pub fn addresses(&mut self) -> Vec<(String, usize)> {
        self.slots
            .iter_mut()
            .map(|(name, slot)| (name.clone(), &mut **slot as *mut f64 as usize))
            .collect()
    }
}

impl Default for GlobalStore {
    fn default() -> Self {
        Self::new()
    }
}

/// The process-wide symbol tables, owned by the driver and passed by
/// reference into the parser (precedence) and the emitter (all three).
pub struct Session {
    /// name → prototype; read during call lowering to lazily declare
    /// functions in a freshly initialized module.
    pub fn_protos: FxHashMap<String, Prototype>,
    /// Host-backed global variable slots.
    pub globals: GlobalStore,
    /// Binary operator precedence, extended by emitted operator definitions.
    pub precedence: PrecedenceTable,
}

impl Session {
    pub fn new() -> Self {
        Self {
            fn_protos: FxHashMap::default(),
            globals: GlobalStore::new(),
            precedence: default_precedence(),
        }
    }

    /// Registers a prototype under its own name.
    pub fn register_prototype(&mut self, proto: Prototype) {
        self.fn_protos.insert(proto.name.clone(), proto);
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

/// Code generator over one authoritative module.
///
/// `named_values` is the per-function local scope; it is cleared at every
/// function entry, snapshotted and restored around every statement sequence,
/// and additionally save/restored around the `pakati` loop variable.
pub struct Codegen<'ctx> {
    context: &'ctx Context,
    module: Module<'ctx>,
    builder: Builder<'ctx>,
    named_values: FxHashMap<String, PointerValue<'ctx>>,
    target_machine: TargetMachine,
}

impl<'ctx> Codegen<'ctx> {
    /// Creates a code generator with a fresh module configured for the host
    /// target.
    pub fn new(context: &'ctx Context, module_name: &str) -> Result<Self> {
        let target_machine = host_target_machine()?;

        let module = context.create_module(module_name);
        module.set_triple(&target_machine.get_triple());
        module.set_data_layout(&target_machine.get_target_data().get_data_layout());

        Ok(Self {
            context,
            module,
            builder: context.create_builder(),
            named_values: FxHashMap::default(),
            target_machine,
        })
    }

    /// The authoritative module currently being extended.
    pub fn module(&self) -> &Module<'ctx> {
        &self.module
    }

    /// Serializes the current module to bitcode, for cloning into a fresh
    /// context.
    pub fn bitcode(&self) -> MemoryBuffer {
        self.module.write_bitcode_to_memory()
    }

    /// Replaces the current module with a fresh one and re-declares every
    /// known global in it, so each registered global stays backed by a live
    /// declaration.
    pub fn reinitialize(&mut self, module_name: &str, globals: &GlobalStore) {
        let module = self.context.create_module(module_name);
        module.set_triple(&self.target_machine.get_triple());
        module.set_data_layout(&self.target_machine.get_target_data().get_data_layout());
        self.module = module;
        self.named_values.clear();

        for name in globals.names() {
            self.declare_global(name);
        }
    }

    // =========================================================================
    // Top-level emission entry points
    // =========================================================================

    /// Emits a function definition (or an anonymous top-level wrapper).
    ///
    /// `name_override` is used for class methods, which are emitted under
    /// their qualified `Class.method` name only.
    pub fn emit_function(
        &mut self,
        func: &Function,
        name_override: Option<&str>,
        session: &mut Session,
    ) -> Result<FunctionValue<'ctx>> {
        let name = name_override
            .map(str::to_owned)
            .unwrap_or_else(|| func.effective_name().to_owned());
        let proto = func.proto.with_name(&name);

        // Register first so recursive calls inside the body resolve.
        session.register_prototype(proto.clone());

        // Reuse an existing declaration when it matches; otherwise add a new
        // function (LLVM renames on collision, so an older body keeps
        // resolving for the call sites that already reference it).
        let (function, created) = match self.module.get_function(&name) {
            Some(existing)
                if existing.count_basic_blocks() == 0
                    && existing.count_params() as usize == proto.args.len()
                    && all_params_double(existing) =>
            {
                (existing, false)
            }
            _ => (self.declare_plain_function(&proto), true),
        };

        if proto.is_binary_op() {
            if let Some(op) = proto.operator_char() {
                session.precedence.insert(op, proto.precedence);
            }
        }

        let entry = self.context.append_basic_block(function, "entry");
        self.builder.position_at_end(entry);

        self.named_values.clear();
        for (index, param) in function.get_param_iter().enumerate() {
            let arg_name = &proto.args[index];
            let value = param.into_float_value();
            value.set_name(arg_name);

            let slot = self.create_entry_block_alloca(function, arg_name)?;
            self.builder.build_store(slot, value).map_err(|e| {
                CodegenError::Llvm(format!("failed to spill parameter '{}': {}", arg_name, e))
            })?;
            self.named_values.insert(arg_name.clone(), slot);
        }

        if let Err(error) = self.emit_function_body(&func.body, session) {
            self.discard_partial(function, created);
            return Err(error);
        }

        if let Err(message) = self.module.verify() {
            self.discard_partial(function, created);
            return Err(CodegenError::Verify(message.to_string()));
        }

        self.run_function_pipeline()?;

        Ok(function)
    }

    /// Emits the body sequence and the implicit return of the last value.
    fn emit_function_body(&mut self, body: &[Expr], session: &mut Session) -> Result<()> {
        let last = self.emit_seq(body, session)?;

        if !self.block_terminated() {
            let result = match last {
                BasicValueEnum::FloatValue(value) => value,
                _ => self.f64_zero(),
            };
            self.builder
                .build_return(Some(&result))
                .map_err(|e| CodegenError::Llvm(format!("failed to emit return: {}", e)))?;
        }

        Ok(())
    }

    /// Emits an extern prototype as a declaration and registers it.
    pub fn emit_extern(
        &mut self,
        proto: &Prototype,
        session: &mut Session,
    ) -> Result<FunctionValue<'ctx>> {
        let function = match self.module.get_function(&proto.name) {
            Some(existing) => existing,
            None => self.declare_function(proto)?,
        };
        session.register_prototype(proto.clone());
        Ok(function)
    }

    /// Lowers a class: each method under `Class.method`, each member as a
    /// `Class.member` global. The short-named originals are never emitted.
    pub fn emit_class(&mut self, class: &Class, session: &mut Session) -> Result<()> {
        for method in &class.methods {
            let qualified = format!("{}.{}", class.name, method.proto.name);
            self.emit_function(method, Some(&qualified), session)?;
        }

        let members: Vec<(String, Option<Expr>)> = class
            .members
            .iter()
            .map(|(member, init)| (format!("{}.{}", class.name, member), init.clone()))
            .collect();

        self.emit_global_bindings(&members, session)
    }

    /// Defines global variables: constant-folds each initializer, seeds the
    /// host-backed slot, and declares the symbol in the current module.
    pub fn emit_global_bindings(
        &mut self,
        bindings: &[(String, Option<Expr>)],
        session: &mut Session,
    ) -> Result<()> {
        for (name, init) in bindings {
            if session.globals.contains(name) || self.module.get_global(name).is_some() {
                return Err(CodegenError::GlobalRedefinition(name.clone()));
            }

            let value = match init {
                Some(expr) => const_eval(expr)
                    .ok_or_else(|| CodegenError::NonConstantInitializer(name.clone()))?,
                None => 0.0,
            };

            session.globals.define(name, value);
            self.declare_global(name);
        }
        Ok(())
    }

    // =========================================================================
    // Expression emission
    // =========================================================================

    fn emit_expr(&mut self, expr: &Expr, session: &mut Session) -> Result<BasicValueEnum<'ctx>> {
        match expr {
            Expr::Number(value) => Ok(self.context.f64_type().const_float(*value).into()),

            Expr::Str(text) => {
                let global = self
                    .builder
                    .build_global_string_ptr(text, "str")
                    .map_err(|e| CodegenError::Llvm(format!("failed to intern string: {}", e)))?;
                Ok(global.as_pointer_value().into())
            }

            Expr::Variable(name) => {
                let slot = self.resolve_slot(name, session)?;
                self.builder
                    .build_load(slot, name)
                    .map_err(|e| CodegenError::Llvm(format!("failed to load '{}': {}", name, e)))
            }

            Expr::Unary { op, operand } => {
                let value = self.emit_expr(operand, session)?;
                let operand_value = self.expect_float(value)?;

                let callee = format!("unary{}", op);
                let function = match self.get_function(&callee, session) {
                    Ok(function) => function,
                    Err(CodegenError::UnknownFunction(_)) => {
                        return Err(CodegenError::UnknownUnaryOperator(*op))
                    }
                    Err(error) => return Err(error),
                };

                let call = self
                    .builder
                    .build_call(function, &[operand_value.into()], "unop")
                    .map_err(|e| CodegenError::Llvm(format!("failed to call {}: {}", callee, e)))?;
                Ok(call
                    .try_as_basic_value()
                    .basic()
                    .unwrap_or_else(|| self.f64_zero().into()))
            }

            Expr::Binary { op, lhs, rhs } => self.emit_binary(*op, lhs, rhs, session),

            Expr::Call { callee, args } => self.emit_call(callee, args, session),

            Expr::If {
                cond,
                then_body,
                else_body,
            } => self.emit_if(cond, then_body, else_body, session),

            Expr::While { cond, body } => self.emit_while(cond, body, session),

            Expr::For {
                var,
                start,
                end,
                step,
                body,
            } => self.emit_for(var, start, end, step.as_deref(), body, session),

            Expr::Var { bindings, body } => self.emit_var(bindings, body, session),

            Expr::GlobalVar { bindings } => {
                self.emit_global_bindings(bindings, session)?;
                Ok(self.f64_zero().into())
            }

            Expr::Block(stmts) => self.emit_seq(stmts, session),

            Expr::Return(value) => {
                let value = self.emit_expr(value, session)?;
                let result = self.expect_float(value)?;
                self.builder
                    .build_return(Some(&result))
                    .map_err(|e| CodegenError::Llvm(format!("failed to emit return: {}", e)))?;
                Ok(result.into())
            }
        }
    }

    fn emit_binary(
        &mut self,
        op: char,
        lhs: &Expr,
        rhs: &Expr,
        session: &mut Session,
    ) -> Result<BasicValueEnum<'ctx>> {
        if op == '=' {
            let Expr::Variable(name) = lhs else {
                return Err(CodegenError::AssignTarget);
            };

            let value = self.emit_expr(rhs, session)?;
            let value = self.expect_float(value)?;
            let slot = self.resolve_slot(name, session)?;

            self.builder
                .build_store(slot, value)
                .map_err(|e| CodegenError::Llvm(format!("failed to store '{}': {}", name, e)))?;
            return Ok(value.into());
        }

        let lhs_value = self.emit_expr(lhs, session)?;
        let rhs_value = self.emit_expr(rhs, session)?;
        let l = self.expect_float(lhs_value)?;
        let r = self.expect_float(rhs_value)?;

        match op {
            '+' => self
                .builder
                .build_float_add(l, r, "addtmp")
                .map(Into::into)
                .map_err(|e| CodegenError::Llvm(format!("failed fadd: {}", e))),
            '-' => self
                .builder
                .build_float_sub(l, r, "subtmp")
                .map(Into::into)
                .map_err(|e| CodegenError::Llvm(format!("failed fsub: {}", e))),
            '*' => self
                .builder
                .build_float_mul(l, r, "multmp")
                .map(Into::into)
                .map_err(|e| CodegenError::Llvm(format!("failed fmul: {}", e))),
            '<' | '>' => {
                let predicate = if op == '<' {
                    FloatPredicate::ULT
                } else {
                    FloatPredicate::UGT
                };
                let cmp = self
                    .builder
                    .build_float_compare(predicate, l, r, "cmptmp")
                    .map_err(|e| CodegenError::Llvm(format!("failed fcmp: {}", e)))?;
                self.builder
                    .build_unsigned_int_to_float(cmp, self.context.f64_type(), "booltmp")
                    .map(Into::into)
                    .map_err(|e| CodegenError::Llvm(format!("failed uitofp: {}", e)))
            }
            _ => {
                // User-defined operator: dispatch through its mangled name.
                let callee = format!("binary{}", op);
                let function = match self.get_function(&callee, session) {
                    Ok(function) => function,
                    Err(CodegenError::UnknownFunction(_)) => {
                        return Err(CodegenError::UnknownBinaryOperator(op))
                    }
                    Err(error) => return Err(error),
                };

                let call = self
                    .builder
                    .build_call(function, &[l.into(), r.into()], "binop")
                    .map_err(|e| CodegenError::Llvm(format!("failed to call {}: {}", callee, e)))?;
                Ok(call
                    .try_as_basic_value()
                    .basic()
                    .unwrap_or_else(|| self.f64_zero().into()))
            }
        }
    }

    fn emit_call(
        &mut self,
        callee: &str,
        args: &[Expr],
        session: &mut Session,
    ) -> Result<BasicValueEnum<'ctx>> {
        if callee == "nyora" {
            return self.emit_print_call(args, session);
        }

        let function = self.get_function(callee, session)?;

        let expected = function.count_params() as usize;
        if expected != args.len() {
            return Err(CodegenError::ArgCountMismatch {
                name: callee.to_string(),
                expected,
                got: args.len(),
            });
        }

        let mut values: Vec<BasicValueEnum<'ctx>> = Vec::with_capacity(args.len());
        for arg in args {
            values.push(self.emit_expr(arg, session)?);
        }

        // Marshal: doubles to double parameters, string pointers to pointer
        // parameters, nothing else.
        let param_types = function.get_type().get_param_types();
        let mut call_args: Vec<BasicMetadataValueEnum<'ctx>> = Vec::with_capacity(values.len());
        for (value, param) in values.iter().zip(param_types.iter()) {
            let compatible = matches!(
                (value, param),
                (
                    BasicValueEnum::FloatValue(_),
                    BasicMetadataTypeEnum::FloatType(_)
                ) | (
                    BasicValueEnum::PointerValue(_),
                    BasicMetadataTypeEnum::PointerType(_)
                )
            );
            if !compatible {
                return Err(CodegenError::TypeMismatch(format!(
                    "argument of wrong type in call to {}",
                    callee
                )));
            }
            call_args.push((*value).into());
        }

        let call = self
            .builder
            .build_call(function, &call_args, "calltmp")
            .map_err(|e| CodegenError::Llvm(format!("failed to call {}: {}", callee, e)))?;

        Ok(call
            .try_as_basic_value()
            .basic()
            .unwrap_or_else(|| self.f64_zero().into()))
    }

    /// The `nyora` special case: exactly one argument, dispatched on its IR
    /// type to the matching typed print intrinsic (`%.5f\n`, `%d\n`,
    /// `%s\n`, all on stderr). Yields a null double.
    fn emit_print_call(
        &mut self,
        args: &[Expr],
        session: &mut Session,
    ) -> Result<BasicValueEnum<'ctx>> {
        if args.len() != 1 {
            return Err(CodegenError::PrintArity);
        }

        let value = self.emit_expr(&args[0], session)?;
        let (shim, argument): (&str, BasicMetadataValueEnum<'ctx>) = match value {
            BasicValueEnum::FloatValue(v) => ("shona_print_f64", v.into()),
            BasicValueEnum::PointerValue(v) => ("shona_print_str", v.into()),
            BasicValueEnum::IntValue(v) => {
                let widened = self
                    .builder
                    .build_int_s_extend_or_bit_cast(v, self.context.i64_type(), "printint")
                    .map_err(|e| CodegenError::Llvm(format!("failed sext: {}", e)))?;
                ("shona_print_i64", widened.into())
            }
            _ => return Err(CodegenError::PrintType),
        };

        let function = self.declare_intrinsic(shim)?;
        self.builder
            .build_call(function, &[argument], "printcall")
            .map_err(|e| CodegenError::Llvm(format!("failed to call {}: {}", shim, e)))?;

        Ok(self.f64_zero().into())
    }

    fn emit_if(
        &mut self,
        cond: &Expr,
        then_body: &[Expr],
        else_body: &[Expr],
        session: &mut Session,
    ) -> Result<BasicValueEnum<'ctx>> {
        let cond_value = self.emit_expr(cond, session)?;
        let cond_value = self.expect_float(cond_value)?;
        let cond_bool = self
            .builder
            .build_float_compare(
                FloatPredicate::ONE,
                cond_value,
                self.f64_zero(),
                "ifcond",
            )
            .map_err(|e| CodegenError::Llvm(format!("failed fcmp: {}", e)))?;

        let function = self.current_function()?;
        let then_bb = self.context.append_basic_block(function, "then");
        let else_bb = self.context.append_basic_block(function, "else");
        let merge_bb = self.context.append_basic_block(function, "ifcont");

        self.builder
            .build_conditional_branch(cond_bool, then_bb, else_bb)
            .map_err(|e| CodegenError::Llvm(format!("failed condbr: {}", e)))?;

        self.builder.position_at_end(then_bb);
        self.emit_seq(then_body, session)?;
        self.branch_if_open(merge_bb)?;

        self.builder.position_at_end(else_bb);
        self.emit_seq(else_body, session)?;
        self.branch_if_open(merge_bb)?;

        self.builder.position_at_end(merge_bb);
        Ok(self.f64_zero().into())
    }

    fn emit_while(
        &mut self,
        cond: &Expr,
        body: &[Expr],
        session: &mut Session,
    ) -> Result<BasicValueEnum<'ctx>> {
        let function = self.current_function()?;
        let cond_bb = self.context.append_basic_block(function, "whilecond");
        let loop_bb = self.context.append_basic_block(function, "whileloop");
        let after_bb = self.context.append_basic_block(function, "afterwhile");

        self.builder
            .build_unconditional_branch(cond_bb)
            .map_err(|e| CodegenError::Llvm(format!("failed br: {}", e)))?;

        self.builder.position_at_end(cond_bb);
        let cond_value = self.emit_expr(cond, session)?;
        let cond_value = self.expect_float(cond_value)?;
        let cond_bool = self
            .builder
            .build_float_compare(
                FloatPredicate::ONE,
                cond_value,
                self.f64_zero(),
                "whilecond",
            )
            .map_err(|e| CodegenError::Llvm(format!("failed fcmp: {}", e)))?;
        self.builder
            .build_conditional_branch(cond_bool, loop_bb, after_bb)
            .map_err(|e| CodegenError::Llvm(format!("failed condbr: {}", e)))?;

        self.builder.position_at_end(loop_bb);
        self.emit_seq(body, session)?;
        self.branch_if_open(cond_bb)?;

        self.builder.position_at_end(after_bb);
        Ok(self.f64_zero().into())
    }

    fn emit_for(
        &mut self,
        var: &str,
        start: &Expr,
        end: &Expr,
        step: Option<&Expr>,
        body: &Expr,
        session: &mut Session,
    ) -> Result<BasicValueEnum<'ctx>> {
        let function = self.current_function()?;

        let slot = self.create_entry_block_alloca(function, var)?;
        let start_value = self.emit_expr(start, session)?;
        let start_value = self.expect_float(start_value)?;
        self.builder
            .build_store(slot, start_value)
            .map_err(|e| CodegenError::Llvm(format!("failed to store '{}': {}", var, e)))?;

        let loop_bb = self.context.append_basic_block(function, "loop");
        let after_bb = self.context.append_basic_block(function, "afterloop");

        self.builder
            .build_unconditional_branch(loop_bb)
            .map_err(|e| CodegenError::Llvm(format!("failed br: {}", e)))?;
        self.builder.position_at_end(loop_bb);

        // The loop variable shadows any outer binding for the body's extent.
        let shadowed = self.named_values.insert(var.to_string(), slot);

        let result = self.emit_for_latch(var, slot, end, step, body, loop_bb, after_bb, session);

        match shadowed {
            Some(previous) => self.named_values.insert(var.to_string(), previous),
            None => self.named_values.remove(var),
        };

        result?;
        Ok(self.f64_zero().into())
    }

    /// Body plus latch: next = current + step, loop while next < end.
    #[allow(clippy::too_many_arguments)]
    fn emit_for_latch(
        &mut self,
        var: &str,
        slot: PointerValue<'ctx>,
        end: &Expr,
        step: Option<&Expr>,
        body: &Expr,
        loop_bb: inkwell::basic_block::BasicBlock<'ctx>,
        after_bb: inkwell::basic_block::BasicBlock<'ctx>,
        session: &mut Session,
    ) -> Result<()> {
        self.emit_expr(body, session)?;

        if !self.block_terminated() {
            let step_value = match step {
                Some(expr) => {
                    let value = self.emit_expr(expr, session)?;
                    self.expect_float(value)?
                }
                None => self.context.f64_type().const_float(1.0),
            };

            let current = self
                .builder
                .build_load(slot, var)
                .map_err(|e| CodegenError::Llvm(format!("failed to load '{}': {}", var, e)))?
                .into_float_value();
            let next = self
                .builder
                .build_float_add(current, step_value, "nextvar")
                .map_err(|e| CodegenError::Llvm(format!("failed fadd: {}", e)))?;
            self.builder
                .build_store(slot, next)
                .map_err(|e| CodegenError::Llvm(format!("failed to store '{}': {}", var, e)))?;

            let end_value = self.emit_expr(end, session)?;
            let end_value = self.expect_float(end_value)?;
            let keep_going = self
                .builder
                .build_float_compare(FloatPredicate::ULT, next, end_value, "loopcond")
                .map_err(|e| CodegenError::Llvm(format!("failed fcmp: {}", e)))?;

            self.builder
                .build_conditional_branch(keep_going, loop_bb, after_bb)
                .map_err(|e| CodegenError::Llvm(format!("failed condbr: {}", e)))?;
        }

        self.builder.position_at_end(after_bb);
        Ok(())
    }

    /// `zita` bindings: initializer (default 0.0) into an entry-block slot.
    ///
    /// Bindings are not popped here; a statement-level `zita` stays in scope
    /// for the remainder of the enclosing statement sequence, and
    /// [`Codegen::emit_seq`] restores the scope at the sequence boundary.
    fn emit_var(
        &mut self,
        bindings: &[(String, Option<Expr>)],
        body: &Expr,
        session: &mut Session,
    ) -> Result<BasicValueEnum<'ctx>> {
        let function = self.current_function()?;

        for (name, init) in bindings {
            // Emit the initializer before installing the binding, so
            // `zita a = a mu ...` refers to any outer `a`.
            let value = match init {
                Some(expr) => {
                    let value = self.emit_expr(expr, session)?;
                    self.expect_float(value)?
                }
                None => self.f64_zero(),
            };

            let slot = self.create_entry_block_alloca(function, name)?;
            self.builder
                .build_store(slot, value)
                .map_err(|e| CodegenError::Llvm(format!("failed to store '{}': {}", name, e)))?;
            self.named_values.insert(name.clone(), slot);
        }

        self.emit_expr(body, session)
    }

    /// Emits a statement sequence; the sequence is a scope boundary for
    /// `zita` bindings. Emission stops early once the block is terminated
    /// (after `dzosa`). The result is the last statement's value.
    fn emit_seq(&mut self, stmts: &[Expr], session: &mut Session) -> Result<BasicValueEnum<'ctx>> {
        let saved_scope = self.named_values.clone();

        let mut last: BasicValueEnum<'ctx> = self.f64_zero().into();
        for stmt in stmts {
            if self.block_terminated() {
                break;
            }
            last = match self.emit_expr(stmt, session) {
                Ok(value) => value,
                Err(error) => {
                    self.named_values = saved_scope;
                    return Err(error);
                }
            };
        }

        self.named_values = saved_scope;
        Ok(last)
    }

    // =========================================================================
    // Declarations and lookups
    // =========================================================================

    /// Finds a function in the module, or lazily materializes a declaration
    /// from its registered prototype.
    fn get_function(&mut self, name: &str, session: &Session) -> Result<FunctionValue<'ctx>> {
        if let Some(function) = self.module.get_function(name) {
            return Ok(function);
        }

        if let Some(proto) = session.fn_protos.get(name) {
            let proto = proto.clone();
            return self.declare_function(&proto);
        }

        Err(CodegenError::UnknownFunction(name.to_string()))
    }

    /// Declares a function from its prototype: the intrinsic signature table
    /// for known host functions, `double (double, …)` for everything else.
    fn declare_function(&self, proto: &Prototype) -> Result<FunctionValue<'ctx>> {
        if let Some(sig) = intrinsic_signature(&proto.name) {
            return self.declare_intrinsic_sig(sig);
        }

        Ok(self.declare_plain_function(proto))
    }

    /// Declares the `double (double, …)` shape every user definition gets,
    /// regardless of any intrinsic sharing the name.
    fn declare_plain_function(&self, proto: &Prototype) -> FunctionValue<'ctx> {
        let f64_type = self.context.f64_type();
        let param_types: Vec<BasicMetadataTypeEnum<'ctx>> =
            vec![f64_type.into(); proto.args.len()];
        let fn_type = f64_type.fn_type(&param_types, false);

        let function = self
            .module
            .add_function(&proto.name, fn_type, Some(Linkage::External));
        for (index, param) in function.get_param_iter().enumerate() {
            param.into_float_value().set_name(&proto.args[index]);
        }

        function
    }

    /// Declares a host intrinsic by name; the name must be in the table.
    fn declare_intrinsic(&self, name: &str) -> Result<FunctionValue<'ctx>> {
        if let Some(function) = self.module.get_function(name) {
            return Ok(function);
        }
        let sig = intrinsic_signature(name)
            .ok_or_else(|| CodegenError::UnknownFunction(name.to_string()))?;
        self.declare_intrinsic_sig(sig)
    }

    fn declare_intrinsic_sig(&self, sig: &IntrinsicSig) -> Result<FunctionValue<'ctx>> {
        if let Some(function) = self.module.get_function(sig.name) {
            return Ok(function);
        }

        let param_types: Vec<BasicMetadataTypeEnum<'ctx>> =
            sig.params.iter().map(|t| self.abi_type(*t)).collect();
        let fn_type = match sig.ret {
            AbiType::F64 => self.context.f64_type().fn_type(&param_types, false),
            AbiType::I64 => self.context.i64_type().fn_type(&param_types, false),
            AbiType::Ptr => self
                .context
                .i8_type()
                .ptr_type(AddressSpace::default())
                .fn_type(&param_types, false),
        };

        Ok(self
            .module
            .add_function(sig.name, fn_type, Some(Linkage::External)))
    }

    fn abi_type(&self, abi: AbiType) -> BasicMetadataTypeEnum<'ctx> {
        match abi {
            AbiType::F64 => self.context.f64_type().into(),
            AbiType::I64 => self.context.i64_type().into(),
            AbiType::Ptr => self.context.i8_type().ptr_type(AddressSpace::default()).into(),
        }
    }

    /// Declares (or finds) the external f64 global backing a slot.
    fn declare_global(&self, name: &str) -> GlobalValue<'ctx> {
        match self.module.get_global(name) {
            Some(global) => global,
            None => self
                .module
                .add_global(self.context.f64_type(), None, name),
        }
    }

    /// Resolves a name to its slot: local scope first, then globals.
    fn resolve_slot(&mut self, name: &str, session: &Session) -> Result<PointerValue<'ctx>> {
        if let Some(slot) = self.named_values.get(name) {
            return Ok(*slot);
        }
        if session.globals.contains(name) {
            return Ok(self.declare_global(name).as_pointer_value());
        }
        Err(CodegenError::UnknownVariable(name.to_string()))
    }

    // =========================================================================
    // Support
    // =========================================================================

    /// Allocates a double slot in the entry block of `function`.
    fn create_entry_block_alloca(
        &self,
        function: FunctionValue<'ctx>,
        name: &str,
    ) -> Result<PointerValue<'ctx>> {
        let entry = function.get_first_basic_block().ok_or_else(|| {
            CodegenError::Llvm(format!("function '{}' has no entry block", name))
        })?;

        let tmp = self.context.create_builder();
        match entry.get_first_instruction() {
            Some(first) => tmp.position_before(&first),
            None => tmp.position_at_end(entry),
        }

        tmp.build_alloca(self.context.f64_type(), name).map_err(|e| {
            CodegenError::Llvm(format!("failed to allocate slot '{}': {}", name, e))
        })
    }

    fn current_function(&self) -> Result<FunctionValue<'ctx>> {
        self.builder
            .get_insert_block()
            .and_then(|block| block.get_parent())
            .ok_or_else(|| CodegenError::Llvm("builder has no insertion point".to_string()))
    }

    /// True when the current insertion block already has a terminator.
    fn block_terminated(&self) -> bool {
        self.builder
            .get_insert_block()
            .map(|block| block.get_terminator().is_some())
            .unwrap_or(true)
    }

    /// Branches to `target` unless the current block is terminated.
    fn branch_if_open(&self, target: inkwell::basic_block::BasicBlock<'ctx>) -> Result<()> {
        if !self.block_terminated() {
            self.builder
                .build_unconditional_branch(target)
                .map_err(|e| CodegenError::Llvm(format!("failed br: {}", e)))?;
        }
        Ok(())
    }

    fn expect_float(&self, value: BasicValueEnum<'ctx>) -> Result<FloatValue<'ctx>> {
        match value {
            BasicValueEnum::FloatValue(v) => Ok(v),
            _ => Err(CodegenError::TypeMismatch(
                "string value used where a number is required".to_string(),
            )),
        }
    }

    fn f64_zero(&self) -> FloatValue<'ctx> {
        self.context.f64_type().const_float(0.0)
    }

    /// Abandons a failed emission, leaving the module verifiable.
    fn discard_partial(&self, function: FunctionValue<'ctx>, created: bool) {
        if created {
            // Only this function's own body can reference it; both go away.
            unsafe { function.delete() };
        } else {
            // Pre-existing declaration: strip back to a declaration so the
            // call sites that already reference it stay valid.
            for block in function.get_basic_blocks() {
                let _ = unsafe { block.delete() };
            }
        }
    }

    fn run_function_pipeline(&self) -> Result<()> {
        self.module
            .run_passes(
                FUNCTION_PASS_PIPELINE,
                &self.target_machine,
                PassBuilderOptions::create(),
            )
            .map_err(|e| CodegenError::Llvm(format!("pass pipeline failed: {}", e)))
    }
}

/// True when every parameter of `function` is a double.
fn all_params_double(function: FunctionValue<'_>) -> bool {
    function
        .get_type()
        .get_param_types()
        .iter()
        .all(|t| matches!(t, BasicMetadataTypeEnum::FloatType(_)))
}

/// Builds a target machine for the host, as the object-emission path does.
fn host_target_machine() -> Result<TargetMachine> {
    let triple = TargetMachine::get_default_triple();
    let target = Target::from_triple(&triple)
        .map_err(|e| CodegenError::Llvm(format!("failed to resolve target: {}", e)))?;

    target
        .create_target_machine(
            &triple,
            "generic",
            "",
            OptimizationLevel::Default,
            RelocMode::Default,
            CodeModel::Default,
        )
        .ok_or_else(|| CodegenError::Llvm("failed to create target machine".to_string()))
}

/// Folds a global initializer to a constant, mirroring what the IR builder's
/// constant folding accepts: literals and `+ - * < >` over constants.
fn const_eval(expr: &Expr) -> Option<f64> {
    match expr {
        Expr::Number(value) => Some(*value),
        Expr::Binary { op, lhs, rhs } => {
            let l = const_eval(lhs)?;
            let r = const_eval(rhs)?;
            match op {
                '+' => Some(l + r),
                '-' => Some(l - r),
                '*' => Some(l * r),
                '<' => Some(if l < r { 1.0 } else { 0.0 }),
                '>' => Some(if l > r { 1.0 } else { 0.0 }),
                _ => None,
            }
        }
        _ => None,
    }
}
