//! The `vigild` binary's flag surface.

fn vigild(args: &[&str]) -> std::process::Output {
    std::process::Command::new(assert_cmd::cargo::cargo_bin("vigild"))
        .args(args)
        .output()
        .unwrap()
}

#[test]
fn version_flag_prints_the_build_string() {
    let output = vigild(&["--version"]);
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains(env!("CARGO_PKG_VERSION")));
}

#[test]
fn help_flag_documents_the_socket_surface() {
    let output = vigild(&["--help"]);
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("USAGE"));
    assert!(stdout.contains("socket"));
}

#[test]
fn unexpected_arguments_are_refused() {
    let output = vigild(&["--bogus"]);
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("unexpected argument"));
}
