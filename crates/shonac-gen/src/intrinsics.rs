//! Host intrinsic signatures.
//!
//! Prototypes carry no types (every declared parameter is a double), so the
//! handful of host functions that traffic in string pointers need their true
//! C signatures spelled out here; `declare_function` consults this table
//! before falling back to the double-typed default. The table also covers
//! the typed print intrinsics the `nyora` special case dispatches to.

/// A parameter or return type in the host C ABI.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AbiType {
    /// `double`
    F64,
    /// `int64_t`
    I64,
    /// `const char*`
    Ptr,
}

/// The C signature of one host intrinsic.
pub struct IntrinsicSig {
    pub name: &'static str,
    pub params: &'static [AbiType],
    pub ret: AbiType,
}

use AbiType::{F64, I64, Ptr};

/// Host intrinsics whose IR declarations differ from the double-typed
/// default. Math helpers (`wedzera`, `simba`, …) are all-double and need no
/// entry.
const INTRINSIC_SIGS: &[IntrinsicSig] = &[
    // Typed print intrinsics behind the `nyora` re-route.
    IntrinsicSig {
        name: "shona_print_f64",
        params: &[F64],
        ret: F64,
    },
    IntrinsicSig {
        name: "shona_print_i64",
        params: &[I64],
        ret: F64,
    },
    IntrinsicSig {
        name: "shona_print_str",
        params: &[Ptr],
        ret: F64,
    },
    IntrinsicSig {
        name: "nyora",
        params: &[Ptr],
        ret: F64,
    },
    // File primitives, Shona-named wrappers.
    IntrinsicSig {
        name: "vhuraFaera",
        params: &[Ptr, Ptr],
        ret: F64,
    },
    IntrinsicSig {
        name: "verengaFaera",
        params: &[Ptr],
        ret: F64,
    },
    IntrinsicSig {
        name: "nyoraFaera",
        params: &[Ptr, Ptr],
        ret: F64,
    },
    IntrinsicSig {
        name: "bvisaFaera",
        params: &[Ptr],
        ret: F64,
    },
    // File primitives, generic names.
    IntrinsicSig {
        name: "openFile",
        params: &[Ptr, Ptr],
        ret: F64,
    },
    IntrinsicSig {
        name: "readFile",
        params: &[Ptr],
        ret: Ptr,
    },
    IntrinsicSig {
        name: "writeFile",
        params: &[Ptr, Ptr],
        ret: F64,
    },
    IntrinsicSig {
        name: "deleteFile",
        params: &[Ptr],
        ret: F64,
    },
];

/// Looks up the C signature of a host intrinsic, if it has one.
pub fn intrinsic_signature(name: &str) -> Option<&'static IntrinsicSig> {
    INTRINSIC_SIGS.iter().find(|sig| sig.name == name)
}
