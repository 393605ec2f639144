use std::process::{Child, Command, Stdio};
use std::thread;
use std::time::{Duration, Instant};

use healthy::system::kill::{KillResult, kill_process};
use sysinfo::{Signal, System};

fn spawn_long_lived_child() -> Child {
    #[cfg(windows)]
    let mut cmd = {
        let mut c = Command::new("powershell");
        c.args([
            "-NoProfile",
            "-NonInteractive",
            "-Command",
            "Start-Sleep -Seconds 30",
        ]);
        c
    };

    #[cfg(not(windows))]
    let mut cmd = {
        let mut c = Command::new("sh");
        c.args(["-c", "sleep 30"]);
        c
    };

    cmd.stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .spawn()
        .expect("failed to spawn child process")
}

fn wait_for_exit(child: &mut Child, timeout: Duration) {
    let deadline = Instant::now() + timeout;
    loop {
        match child.try_wait() {
            Ok(Some(_)) => return,
            Ok(None) if Instant::now() < deadline => thread::sleep(Duration::from_millis(50)),
            Ok(None) => {
                let _ = child.kill();
                panic!("child process did not exit before timeout");
            }
            Err(err) => {
                let _ = child.kill();
                panic!("failed waiting for child exit: {err}");
            }
        }
    }
}

#[test]
fn kill_nonexistent_pid_returns_not_found() {
    let mut sys = System::new();
    let result = kill_process(&mut sys, u32::MAX, Signal::Term);
    assert_eq!(result, KillResult::NotFound(u32::MAX));
    assert_eq!(result.message(), format!("Process {} not found", u32::MAX));
}

#[test]
fn kill_spawned_child_terminates() {
    let mut child = spawn_long_lived_child();
    let pid = child.id();

    // An empty System works: kill_process refreshes the one pid it needs.
    let mut sys = System::new();
    let signal = if cfg!(windows) {
        Signal::Kill
    } else {
        Signal::Term
    };
    let mut result = kill_process(&mut sys, pid, signal);
    if !result.is_success() {
        thread::sleep(Duration::from_millis(100));
        result = kill_process(&mut sys, pid, Signal::Kill);
    }

    match result {
        KillResult::Success(killed, _) => {
            assert_eq!(killed, pid);
            wait_for_exit(&mut child, Duration::from_secs(5));
        }
        KillResult::Failed(_, err) => {
            let _ = child.kill();
            panic!("kill_process reported failure: {err}");
        }
        KillResult::NotFound(_) => {
            let _ = child.kill();
            panic!("child process PID {pid} not found by sysinfo");
        }
    }
}
