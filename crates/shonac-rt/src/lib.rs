//! shonac-rt - Host runtime intrinsics.
//!
//! Every function here is exported with C linkage and a fixed signature so
//! JIT'd code can call straight into the host process. The driver maps each
//! symbol explicitly into every JIT instance (see [`host_symbols`]), so the
//! binary does not need to re-export dynamic symbols.
//!
//! Print output and runtime warnings go to stderr, keeping them apart from
//! program data written to stdout by the file primitives.

mod io;
mod math;

pub use io::*;
pub use math::*;

/// `(symbol, address)` pairs for all host intrinsics.
///
/// The driver feeds these to each JIT instance so external declarations in
/// the cloned module resolve into this process.
pub fn host_symbols() -> Vec<(&'static str, usize)> {
    vec![
        ("putchard", putchard as usize),
        ("nyora", nyora as usize),
        ("shona_print_f64", shona_print_f64 as usize),
        ("shona_print_i64", shona_print_i64 as usize),
        ("shona_print_str", shona_print_str as usize),
        ("vhuraFaera", vhuraFaera as usize),
        ("verengaFaera", verengaFaera as usize),
        ("nyoraFaera", nyoraFaera as usize),
        ("bvisaFaera", bvisaFaera as usize),
        ("openFile", openFile as usize),
        ("readFile", readFile as usize),
        ("writeFile", writeFile as usize),
        ("deleteFile", deleteFile as usize),
        ("wedzera", wedzera as usize),
        ("bvisaNamba", bvisaNamba as usize),
        ("wedzeranisa", wedzeranisa as usize),
        ("govana", govana as usize),
        ("nambaInosara", nambaInosara as usize),
        ("simba", simba as usize),
        ("tsvagaMudzi", tsvagaMudzi as usize),
        ("logarithm", logarithm as usize),
        ("expo", expo as usize),
        ("saini", saini as usize),
        ("cosi", cosi as usize),
        ("tanhi", tanhi as usize),
    ]
}
