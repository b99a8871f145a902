//! Error types for IR emission.
//!
//! Emission errors abandon the current top-level item only; the driver
//! renders them to stderr with an `Error: ` prefix and keeps going.

use thiserror::Error;

/// Error type for code generation.
#[derive(Debug, Error)]
pub enum CodegenError {
    /// A name that is neither a local slot nor a global.
    #[error("Unknown variable name: {0}")]
    UnknownVariable(String),

    /// A call to a function with no definition and no prototype.
    #[error("Unknown function referenced: {0}")]
    UnknownFunction(String),

    /// A unary operator with no `unary<op>` definition.
    #[error("Unknown unary operator: {0}")]
    UnknownUnaryOperator(char),

    /// A binary operator with no built-in meaning and no `binary<op>`.
    #[error("Unknown binary operator: {0}")]
    UnknownBinaryOperator(char),

    /// Call arity does not match the declared parameter count.
    #[error("Incorrect number of arguments passed to {name}: expected {expected}, got {got}")]
    ArgCountMismatch {
        name: String,
        expected: usize,
        got: usize,
    },

    /// `nyora` takes exactly one argument.
    #[error("nyora expects exactly one argument")]
    PrintArity,

    /// `nyora` received a value of a type it cannot format.
    #[error("Unsupported type for nyora")]
    PrintType,

    /// The left side of `=` must be a variable.
    #[error("destination of '=' must be a variable")]
    AssignTarget,

    /// A global of this name already exists.
    #[error("Redefinition of global variable {0}")]
    GlobalRedefinition(String),

    /// A global initializer that does not fold to a constant.
    #[error("Initializer must be constant for global '{0}'")]
    NonConstantInitializer(String),

    /// A string value reached a double-typed position or vice versa.
    #[error("Type mismatch: {0}")]
    TypeMismatch(String),

    /// The module verifier rejected the emitted function.
    #[error("Module verification failed: {0}")]
    Verify(String),

    /// LLVM operation failed.
    #[error("LLVM operation failed: {0}")]
    Llvm(String),
}

/// Result type alias for code generation operations.
pub type Result<T> = std::result::Result<T, CodegenError>;
