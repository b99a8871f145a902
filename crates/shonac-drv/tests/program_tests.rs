//! End-to-end program runs against the real JIT.

use assert_cmd::assert::Assert;
use assert_cmd::Command;
use predicates::prelude::*;
use std::io::Write;

/// Writes `source` to a temp file and runs `shonac` on it.
fn run_program(source: &str) -> Assert {
    let mut file = tempfile::NamedTempFile::new().expect("temp file");
    file.write_all(source.as_bytes()).expect("write source");

    Command::cargo_bin("shonac")
        .expect("shonac binary")
        .arg(file.path())
        .assert()
}

#[test]
fn test_fib() {
    run_program(
        "basa fib(n) { kana (n < 2) { dzosa n } kanaKuti { dzosa fib(n-1) + fib(n-2) } }\n\
         nyora(fib(10))\n",
    )
    .success()
    .stderr(predicate::str::contains("55.00000"));
}

#[test]
fn test_while_accumulator() {
    run_program(
        "basa sum(n) { zita s = 0 mu zita i = 1 mu kusvika (i < n+1) { s = s + i; i = i + 1 } s }\n\
         nyora(sum(10))\n",
    )
    .success()
    .stderr(predicate::str::contains("55.00000"));
}

#[test]
fn test_for_with_step() {
    run_program(
        "basa tri(n) { zita s = 0 mu pakati (i = 1, n+1, 1) { s = s + i } s }\n\
         nyora(tri(5))\n",
    )
    .success()
    .stderr(predicate::str::contains("15.00000"));
}

#[test]
fn test_global_persistence_across_expressions() {
    run_program(
        "zitaGuru counter = 0\n\
         counter = counter + 1\n\
         counter = counter + 1\n\
         nyora(counter)\n",
    )
    .success()
    .stderr(predicate::str::contains("2.00000"));
}

#[test]
fn test_user_defined_binary_operator() {
    // binary ':' at precedence 1 binds loosest, so 1+2 : 3+4 groups as
    // (1+2):(3+4) and the operator returns its right operand.
    run_program(
        "basa binary : 1 (a b) { b }\n\
         nyora(1+2 : 3+4)\n",
    )
    .success()
    .stderr(predicate::str::contains("7.00000"));
}

#[test]
fn test_class_method_dispatch() {
    run_program(
        "kirasi Point { basa dist(x) { dzosa x * x } }\n\
         nyora(Point.dist(3))\n",
    )
    .success()
    .stderr(predicate::str::contains("9.00000"));
}

#[test]
fn test_class_member_access() {
    run_program(
        "kirasi Munhu { zitaGuru makore = 21 }\n\
         nyora(Munhu.makore)\n",
    )
    .success()
    .stderr(predicate::str::contains("21.00000"));
}

#[test]
fn test_string_print() {
    run_program("nyora(\"mhoro nyika\")\n")
        .success()
        .stderr(predicate::str::contains("mhoro nyika"));
}

#[test]
fn test_determinism_of_repeated_execution() {
    let assert = run_program(
        "basa f(x) { dzosa x * x + 1 }\n\
         nyora(f(6))\n\
         nyora(f(6))\n\
         nyora(f(6))\n",
    )
    .success();

    let stderr = String::from_utf8_lossy(&assert.get_output().stderr).to_string();
    assert_eq!(stderr.matches("37.00000").count(), 3);
}

#[test]
fn test_definition_matches_inlined_body() {
    let assert = run_program(
        "basa inlineme(a b) { a * b + a }\n\
         nyora(inlineme(3, 4))\n\
         nyora(3 * 4 + 3)\n",
    )
    .success();

    let stderr = String::from_utf8_lossy(&assert.get_output().stderr).to_string();
    assert_eq!(stderr.matches("15.00000").count(), 2);
}

#[test]
fn test_user_defined_unary_operator() {
    run_program(
        "basa unary ! (v) { kana (v) { dzosa 0 } kanaKuti { dzosa 1 } }\n\
         nyora(!0)\n",
    )
    .success()
    .stderr(predicate::str::contains("1.00000"));
}

#[test]
fn test_putchard_writes_byte() {
    run_program("putchard(72)\n")
        .success()
        .stderr(predicate::str::contains("H"));
}

#[test]
fn test_math_helpers() {
    run_program("nyora(wedzera(2, 3))\nnyora(tsvagaMudzi(49))\nnyora(simba(2, 10))\n")
        .success()
        .stderr(
            predicate::str::contains("5.00000")
                .and(predicate::str::contains("7.00000"))
                .and(predicate::str::contains("1024.00000")),
        );
}

#[test]
fn test_error_does_not_stop_later_items() {
    run_program("nyora(hapana)\nnyora(1)\n")
        .success()
        .stderr(
            predicate::str::contains("Unknown variable name: hapana")
                .and(predicate::str::contains("1.00000")),
        );
}

#[test]
fn test_global_redefinition_keeps_original() {
    run_program(
        "zitaGuru g = 1\n\
         zitaGuru g = 2\n\
         nyora(g)\n",
    )
    .success()
    .stderr(
        predicate::str::contains("Redefinition of global variable g")
            .and(predicate::str::contains("1.00000")),
    );
}

#[test]
fn test_var_binding_not_visible_in_later_expression() {
    run_program(
        "zita x = 5 mu nyora(x)\n\
         nyora(x)\n",
    )
    .success()
    .stderr(
        predicate::str::contains("5.00000")
            .and(predicate::str::contains("Unknown variable name: x")),
    );
}

#[test]
fn test_for_variable_not_visible_after_loop() {
    run_program("basa leak(n) { pakati (i = 1, n) { i } i }\nnyora(1)\n")
        .success()
        .stderr(
            predicate::str::contains("Unknown variable name: i")
                .and(predicate::str::contains("1.00000")),
        );
}

#[test]
fn test_parse_error_reports_line_and_continues() {
    run_program("kana 5\nnyora(2)\n")
        .success()
        .stderr(
            predicate::str::contains("Kukanganisa pa line 1")
                .and(predicate::str::contains("2.00000")),
        );
}

#[test]
fn test_extern_math_call() {
    run_program("extern cosi(angle)\nnyora(cosi(0))\n")
        .success()
        .stderr(predicate::str::contains("1.00000"));
}

#[test]
fn test_file_write_and_read_back() {
    let dir = tempfile::tempdir().expect("temp dir");
    let path = dir.path().join("tsamba.txt");
    let source = format!(
        "nyoraFaera(\"{0}\", \"rugwaro rwedu\")\nverengaFaera(\"{0}\")\n",
        path.display()
    );

    run_program(&source)
        .success()
        .stdout(predicate::str::contains("rugwaro rwedu"));
}

#[test]
fn test_nested_control_flow() {
    // Count the multiples of 3 below 10: 0, 3, 6, 9.
    run_program(
        "basa count(n) {\n\
         zita c = 0 mu zita i = 0 mu\n\
         kusvika (i < n) {\n\
         kana (nambaInosara(i, 3) < 1) { c = c + 1 }\n\
         i = i + 1\n\
         }\n\
         c\n\
         }\n\
         nyora(count(10))\n",
    )
    .success()
    .stderr(predicate::str::contains("4.00000"));
}
