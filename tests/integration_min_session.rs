// Drives the compiled binary through a PTY to exercise the real event
// loop and crossterm input handling.
//
// Unix-only and ignored by default since it needs a pseudo terminal.
// Run manually via: `cargo test --test integration_min_session -- --ignored`.

#![cfg(unix)]

use std::time::Duration;

use expectrl::{spawn, Eof};

#[test]
#[ignore]
fn minimal_session_completes_and_exits() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempfile::tempdir()?;
    let bin = assert_cmd::cargo::cargo_bin("typedrill");
    let cmd = format!(
        "{} -t hi --db {}",
        bin.display(),
        dir.path().join("p.db").display()
    );

    let mut p = spawn(cmd)?;
    std::thread::sleep(Duration::from_millis(200));

    p.send("hi")?;
    p.expect("wpm")?;

    // ESC quits from any state
    p.send("\x1b")?;
    p.expect(Eof)?;
    Ok(())
}
