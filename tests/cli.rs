use std::fs;
use std::io::Write;
use std::path::Path;
use std::process::{Command, Output, Stdio};

use tempfile::TempDir;

fn encutil(args: &[&Path], stdin: &str) -> Output {
    let mut child = Command::new(env!("CARGO_BIN_EXE_encutil"))
        .args(args)
        .env_remove("RUST_LOG")
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .expect("failed to spawn encutil");

    child
        .stdin
        .take()
        .expect("failed to open stdin")
        .write_all(stdin.as_bytes())
        .expect("failed to write stdin");

    child.wait_with_output().expect("failed to wait on encutil")
}

fn stderr(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).into_owned()
}

#[test]
fn keyfile_scenario_roundtrip() {
    let dir = TempDir::new().unwrap();
    let k1 = dir.path().join("k1");
    let plain = dir.path().join("a.txt");
    let sealed = dir.path().join("a.enc");
    let opened = dir.path().join("b.txt");
    fs::write(&plain, "hello").unwrap();

    let genkey = encutil(&[Path::new("--genkey"), &k1], "maybe\nn\n");
    assert!(genkey.status.success(), "genkey failed: {}", stderr(&genkey));
    let prompts = String::from_utf8_lossy(&genkey.stdout).into_owned();
    assert!(prompts.contains("Please answer 'y' or 'n'."));

    let encrypt = encutil(
        &[Path::new("--encrypt"), Path::new("--keyfile"), &k1, &plain, &sealed],
        "",
    );
    assert!(encrypt.status.success(), "encrypt failed: {}", stderr(&encrypt));
    assert_ne!(fs::read(&sealed).unwrap(), b"hello");

    let decrypt = encutil(
        &[Path::new("--decrypt"), Path::new("--keyfile"), &k1, &sealed, &opened],
        "",
    );
    assert!(decrypt.status.success(), "decrypt failed: {}", stderr(&decrypt));
    assert_eq!(fs::read_to_string(&opened).unwrap(), "hello");
}

#[test]
fn bad_arguments_exit_with_usage() {
    for args in [
        vec![],
        vec![Path::new("--encrypt")],
        vec![Path::new("--encrypt"), Path::new("--password"), Path::new("only-one")],
        vec![Path::new("--genkey"), Path::new("a"), Path::new("b")],
    ] {
        let output = encutil(&args, "");
        assert_eq!(output.status.code(), Some(1), "args {args:?}");
        let err = stderr(&output);
        assert!(err.contains("Bad command-line arguments."), "{err}");
        assert!(err.contains("--genkey <keyfile>"), "{err}");
    }
}

#[test]
fn missing_keyfile_fails_without_output() {
    let dir = TempDir::new().unwrap();
    let plain = dir.path().join("a.txt");
    let sealed = dir.path().join("a.enc");
    fs::write(&plain, "hello").unwrap();

    let output = encutil(
        &[
            Path::new("--encrypt"),
            Path::new("--keyfile"),
            &dir.path().join("absent"),
            &plain,
            &sealed,
        ],
        "",
    );

    assert_eq!(output.status.code(), Some(1));
    assert!(stderr(&output).contains("error reading the keyfile"));
    assert!(!sealed.exists());
}

#[test]
fn tampered_ciphertext_is_refused() {
    let dir = TempDir::new().unwrap();
    let k1 = dir.path().join("k1");
    let plain = dir.path().join("a.txt");
    let sealed = dir.path().join("a.enc");
    let opened = dir.path().join("b.txt");
    fs::write(&plain, "hello").unwrap();

    assert!(encutil(&[Path::new("--genkey"), &k1], "n\n").status.success());
    assert!(encutil(
        &[Path::new("--encrypt"), Path::new("--keyfile"), &k1, &plain, &sealed],
        "",
    )
    .status
    .success());

    let mut bytes = fs::read(&sealed).unwrap();
    let middle = bytes.len() / 2;
    bytes[middle] ^= 0x01;
    fs::write(&sealed, bytes).unwrap();

    let output = encutil(
        &[Path::new("--decrypt"), Path::new("--keyfile"), &k1, &sealed, &opened],
        "",
    );
    assert_eq!(output.status.code(), Some(1));
    assert!(stderr(&output).contains("wrong password or keyfile"));
    assert!(!opened.exists());
}

#[test]
fn keyfile_with_garbage_is_bad_format() {
    let dir = TempDir::new().unwrap();
    let keyfile = dir.path().join("k");
    let plain = dir.path().join("a.txt");
    fs::write(&keyfile, "not a key").unwrap();
    fs::write(&plain, "hello").unwrap();

    let output = encutil(
        &[
            Path::new("--encrypt"),
            Path::new("--keyfile"),
            &keyfile,
            &plain,
            &dir.path().join("a.enc"),
        ],
        "",
    );
    assert_eq!(output.status.code(), Some(1));
    assert!(stderr(&output).contains("not in a recognized format"));
}
