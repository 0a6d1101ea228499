use std::process::{Command, Output};

fn ddc_write(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_ddc-write"))
        .args(args)
        .env_remove("DDC_WRITE_BACKEND")
        .env("RUST_LOG", "off")
        .output()
        .expect("failed to run ddc-write")
}

#[test]
fn wrong_argument_count_prints_usage() {
    let cases: [&[&str]; 3] = [&["0", "0x0f"], &[], &["0", "0f", "60", "50", "51"]];
    for args in cases {
        let output = ddc_write(args);
        assert_eq!(output.status.code(), Some(1), "{args:?}");
        let stdout = String::from_utf8_lossy(&output.stdout);
        assert!(stdout.contains("Usage:"), "{stdout}");
        assert!(stdout.contains("register_address"), "{stdout}");
    }
}

#[test]
fn malformed_hex_is_rejected() {
    let output = ddc_write(&["0", "0xzz", "60"]);
    assert_eq!(output.status.code(), Some(1));
}

#[test]
fn help_succeeds() {
    let output = ddc_write(&["--help"]);
    assert_eq!(output.status.code(), Some(0));
    assert!(String::from_utf8_lossy(&output.stdout).contains("<DISPLAY_INDEX>"));
}

#[cfg(not(windows))]
#[test]
fn missing_ddcutil_fails() {
    let output = ddc_write(&["--ddcutil", "/nonexistent/ddcutil", "0", "0x0f", "0x60"]);
    assert_eq!(output.status.code(), Some(1));
    assert!(String::from_utf8_lossy(&output.stdout).contains("Changing value failed"));
}

#[cfg(unix)]
#[test]
fn rejected_write_fails() {
    use std::{fs, os::unix::fs::PermissionsExt, path::PathBuf};

    let stub = PathBuf::from(env!("CARGO_TARGET_TMPDIR")).join("ddcutil-rejects");
    fs::write(&stub, "#!/bin/sh\n[ \"$1\" = --version ] && exit 0\nexit 3\n").unwrap();
    fs::set_permissions(&stub, fs::Permissions::from_mode(0o755)).unwrap();

    let output = ddc_write(&["--ddcutil", stub.to_str().unwrap(), "0", "0x0f", "0x60"]);
    assert_eq!(output.status.code(), Some(1));
    assert!(String::from_utf8_lossy(&output.stdout).contains("Changing value failed"));
}
