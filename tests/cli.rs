use std::fs;
use std::path::Path;
use std::process::{Command, Output};

fn qareport(cwd: &Path, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_qareport"))
        .current_dir(cwd)
        .args(args)
        .output()
        .expect("failed to run qareport")
}

#[test]
fn missing_jtl_input_exits_two_without_output() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("qareport.toml"), "").unwrap();
    fs::write(dir.path().join("run1.jtl"), "elapsed,success\n5,true\n").unwrap();

    let output = qareport(
        dir.path(),
        &[
            "from-jtl",
            "--inputs", "run1.jtl", "run2.jtl",
            "--targets", "100", "200",
            "--output", "out/perf.xml",
            "--no-hardware",
        ],
    );

    assert_eq!(output.status.code(), Some(2));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("run2.jtl"), "stderr: {}", stderr);
    assert!(!dir.path().join("out").join("perf.xml").exists());
}

#[test]
fn mismatched_targets_exit_two() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("qareport.toml"), "").unwrap();
    fs::write(dir.path().join("run1.jtl"), "elapsed\n5\n").unwrap();

    let output = qareport(
        dir.path(),
        &["from-jtl", "--inputs", "run1.jtl", "--targets", "100", "200", "--no-hardware"],
    );

    assert_eq!(output.status.code(), Some(2));
}

#[test]
fn jtl_conversion_prints_output_path() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("qareport.toml"), "[perf]\nduration = 120\n").unwrap();
    fs::write(
        dir.path().join("run1.jtl"),
        "timeStamp,elapsed,label,responseCode,success\n1,10,tx,200,true\n2,30,tx,500,false\n",
    )
    .unwrap();

    let output = qareport(
        dir.path(),
        &["from-jtl", "--inputs", "run1.jtl", "--targets", "50", "--output", "out/perf.xml", "--no-hardware"],
    );

    assert_eq!(output.status.code(), Some(0));
    assert!(String::from_utf8_lossy(&output.stdout).contains("out/perf.xml"));

    let xml = fs::read_to_string(dir.path().join("out").join("perf.xml")).unwrap();
    assert!(xml.contains("<DurationSec>120</DurationSec>"));
    assert!(xml.contains("<AvgLatencyMs>20.00</AvgLatencyMs>"));
    assert!(xml.contains("<TotalFailure>1</TotalFailure>"));
}

#[test]
fn missing_json_summary_is_fatal() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("qareport.toml"), "").unwrap();

    let output = qareport(
        dir.path(),
        &["from-json", "--input", "perf-summary.json", "--output", "perf.xml", "--no-hardware"],
    );

    assert_eq!(output.status.code(), Some(1));
    assert!(!dir.path().join("perf.xml").exists());
}

#[test]
fn suites_use_configured_paths() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(
        dir.path().join("qareport.toml"),
        "[project]\nreport_date = \"2026-01-19\"\n\n[suites]\noutput = \"report.xml\"\n",
    )
    .unwrap();
    let reports = dir.path().join("target").join("surefire-reports");
    fs::create_dir_all(&reports).unwrap();
    fs::write(
        reports.join("TEST-org.pilot.TransferTest.xml"),
        r#"<testsuite tests="1"><testcase classname="org.pilot.TransferTest" name="transfers"/></testsuite>"#,
    )
    .unwrap();

    let output = qareport(dir.path(), &["suites"]);

    assert_eq!(output.status.code(), Some(0));
    let xml = fs::read_to_string(dir.path().join("report.xml")).unwrap();
    assert!(xml.contains(r#"date="2026-01-19""#));
    assert!(xml.contains("<coverage>N/A</coverage>"));
    assert!(xml.contains("<status>passed</status>"));
}

#[test]
fn suites_default_date_is_pinned_and_name_is_printed() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(
        dir.path().join("qareport.toml"),
        "[project]\nname = \"TransactionServicePilot\"\n",
    )
    .unwrap();

    let output = qareport(dir.path(), &["suites"]);

    assert_eq!(output.status.code(), Some(0));
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("TransactionServicePilot"), "stdout: {}", stdout);

    let xml = fs::read_to_string(
        dir.path().join("test").join("report").join("integration-report.xml"),
    )
    .unwrap();
    assert!(xml.contains(r#"date="2026-01-19""#));
    assert!(xml.contains("<testcases/>"));
}
