use std::process::Command;

fn run_binary(args: &[&str]) -> std::process::Output {
    Command::new(env!("CARGO_BIN_EXE_intersection_sim"))
        .args(args)
        .env("RUST_LOG", "warn,intersection_sim=info")
        .output()
        .expect("Failed to execute simulation")
}

/// Test that a lockstep run completes and reports its totals
#[test]
fn test_lockstep_simulation_runs() {
    let output = run_binary(&["--lockstep", "--horizon", "60", "--seed", "7"]);

    assert!(
        output.status.success(),
        "Simulation failed to run in lockstep mode. stderr: {}",
        String::from_utf8_lossy(&output.stderr)
    );

    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(
        stderr.contains("Simulation complete"),
        "Simulation did not complete properly. stderr: {}",
        stderr
    );

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(
        stdout.contains("Total vehicles passed:"),
        "Missing 'Total vehicles passed' line. stdout: {}",
        stdout
    );
    assert!(stdout.contains("Time: 60s of 60s"), "stdout: {}", stdout);
}

/// Test that periodic progress lines are logged
#[test]
fn test_progress_logged() {
    let output = run_binary(&[
        "--lockstep",
        "--horizon",
        "45",
        "--seed",
        "3",
        "--summary-every",
        "15",
    ]);
    assert!(output.status.success(), "Simulation failed to run");

    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("t=15s"), "Missing progress line. stderr: {}", stderr);
    assert!(stderr.contains("t=30s"), "Missing progress line. stderr: {}", stderr);
}

/// Test that a short threaded run finishes on its own
#[test]
fn test_threaded_simulation_runs() {
    let output = run_binary(&["--horizon", "3", "--time-scale", "50", "--seed", "11"]);

    assert!(
        output.status.success(),
        "Threaded simulation failed. stderr: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Time: 3s of 3s"), "stdout: {}", stdout);
}

/// Test that an inconsistent configuration is rejected before the run
#[test]
fn test_invalid_configuration_fails_fast() {
    let output = run_binary(&["--lockstep", "--motion-hz", "0"]);

    assert!(!output.status.success(), "Invalid configuration was accepted");
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(
        stderr.contains("motion rate must be positive"),
        "Missing validation error. stderr: {}",
        stderr
    );
}
