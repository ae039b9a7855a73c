use std::{
    io::Write,
    path::PathBuf,
    process::{Command, Stdio},
};

fn doclabel_bin() -> PathBuf {
    PathBuf::from(env!("CARGO_BIN_EXE_doclabel"))
}

#[test]
fn session_over_stdin_labels_and_exports()
-> Result<(), Box<dyn std::error::Error>> {
    let tempdir = tempfile::tempdir()?;
    let input = tempdir.path().join("notes.csv");
    std::fs::write(
        &input,
        "x;y;text;label\n1;1;red apple;fruit\n2;2;blue car;no_label\n3;3;green car;no_label\n",
    )?;

    let mut child = Command::new(doclabel_bin())
        .arg("session")
        .arg(&input)
        .env("DOCLABEL_LOG", "warn")
        .env_remove("DOCLABEL_OUTPUT_DIR")
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()?;

    child.stdin.take().expect("stdin").write_all(
        b"label vehicle\nkeyword car\nselect 1 2\nchoose vehicle\ncommit\nexport\nquit\n",
    )?;
    let output = child.wait_with_output()?;
    assert!(output.status.success());

    let stdout = String::from_utf8(output.stdout)?;
    assert!(stdout.contains("2 of 3 documents visible"));
    assert!(stdout.contains("[ok] 2 documents labeled as \"vehicle\""));
    assert!(stdout.contains("[ok] Labels saved to"));

    let exported: Vec<PathBuf> = std::fs::read_dir(tempdir.path())?
        .filter_map(|e| e.ok().map(|e| e.path()))
        .filter(|p| {
            p.file_name()
                .and_then(|n| n.to_str())
                .is_some_and(|n| n.starts_with("notes-output-"))
        })
        .collect();
    assert_eq!(exported.len(), 1);

    let content = std::fs::read_to_string(&exported[0])?;
    assert!(content.starts_with("x;y;text;label\n"));
    assert!(content.contains("2;2;blue car;vehicle"));
    assert!(content.contains("1;1;red apple;fruit"));
    Ok(())
}

#[test]
fn comma_delimited_input_exports_with_commas()
-> Result<(), Box<dyn std::error::Error>> {
    let tempdir = tempfile::tempdir()?;
    let input = tempdir.path().join("plain.csv");
    std::fs::write(&input, "x,y,text,label\n1.0,2,red apple,\n3,4,car,\n")?;

    let mut child = Command::new(doclabel_bin())
        .args(["session", "-d", ","])
        .arg(&input)
        .env("DOCLABEL_LOG", "warn")
        .env_remove("DOCLABEL_OUTPUT_DIR")
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()?;

    child
        .stdin
        .take()
        .expect("stdin")
        .write_all(b"label fruit\nselect 0\nchoose fruit\ncommit\nexport\n")?;
    let output = child.wait_with_output()?;
    assert!(output.status.success());

    let exported: Vec<PathBuf> = std::fs::read_dir(tempdir.path())?
        .filter_map(|e| e.ok().map(|e| e.path()))
        .filter(|p| p != &input)
        .collect();
    assert_eq!(exported.len(), 1);
    assert_eq!(
        std::fs::read_to_string(&exported[0])?,
        "x,y,text,label\n1.0,2,red apple,fruit\n3,4,car,\n"
    );
    Ok(())
}

#[test]
fn view_command_filters_by_keyword() -> Result<(), Box<dyn std::error::Error>> {
    let tempdir = tempfile::tempdir()?;
    let input = tempdir.path().join("demo.csv");
    std::fs::write(&input, "x;y;text\n0;0;afoobar\n1;1;bar\n")?;

    let output = Command::new(doclabel_bin())
        .args(["view", "--json", "-k", "foo"])
        .arg(&input)
        .env("DOCLABEL_LOG", "warn")
        .output()?;
    assert!(output.status.success());

    let view: serde_json::Value = serde_json::from_slice(&output.stdout)?;
    let points = view["traces"][0]["points"].as_array().expect("points");
    assert_eq!(points.len(), 1);
    assert_eq!(points[0]["meta"]["text"], "afoobar");
    assert_eq!(view["color_by_label"], false);
    Ok(())
}

#[test]
fn missing_column_fails_loudly() -> Result<(), Box<dyn std::error::Error>> {
    let tempdir = tempfile::tempdir()?;
    let input = tempdir.path().join("broken.csv");
    std::fs::write(&input, "x;text\n0;a\n")?;

    let output = Command::new(doclabel_bin())
        .arg("status")
        .arg(&input)
        .env("DOCLABEL_LOG", "warn")
        .output()?;
    assert!(!output.status.success());
    let stderr = String::from_utf8(output.stderr)?;
    assert!(stderr.contains("MissingColumn(\"y\")"));
    Ok(())
}
