//! shonac-gen - LLVM IR code generator.
//!
//! Walks the AST and emits IR into the currently open module through a
//! builder. The type discipline is deliberately tiny: every expression value
//! is a double, except string literals, which are interned global byte
//! pointers and may only flow into the print intrinsic and the file-I/O
//! externs.
//!
//! Mutable bindings are lowered as entry-block stack slots; control flow is
//! emitted in SSA-compatible shape (every sequence guards its fall-through
//! branch on the block not already being terminated), and the mem2reg pass
//! promotes the slots afterwards. The per-function pipeline is the classic
//! scalar set: mem2reg, instcombine, reassociate, gvn, simplifycfg.

pub mod error;
mod intrinsics;
mod llvm;


pub use error::{CodegenError, Result};
pub use intrinsics::{intrinsic_signature, AbiType, IntrinsicSig};
pub use llvm::{initialize_native_target, Codegen, GlobalStore, Session};
