// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use sk_core::LogLine;
use std::process::Stdio;
use tokio::process::Command;
use tokio::sync::mpsc;

fn drain(rx: &mut mpsc::UnboundedReceiver<LogLine>) -> Vec<String> {
    let mut out = Vec::new();
    while let Ok(line) = rx.try_recv() {
        out.push(line.to_string());
    }
    out
}

#[tokio::test]
async fn relay_stream_sends_each_line() {
    let logs = LogChannel::new();
    let mut rx = logs.subscribe();

    let input: &[u8] = b"first\nsecond\r\nthird without newline";
    let count = relay_stream(input, LogSource::Stdout, &logs).await;

    assert_eq!(count, 3);
    assert_eq!(
        drain(&mut rx),
        vec!["first", "second", "third without newline"]
    );
}

#[tokio::test]
async fn stderr_lines_are_marked() {
    let logs = LogChannel::new();
    let mut rx = logs.subscribe();

    let input: &[u8] = b"disk full\n";
    relay_stream(input, LogSource::Stderr, &logs).await;

    assert_eq!(drain(&mut rx), vec!["STDERR: disk full"]);
}

#[tokio::test]
async fn invalid_utf8_is_replaced_not_dropped() {
    let logs = LogChannel::new();
    let mut rx = logs.subscribe();

    let input: &[u8] = b"ok \xff\xfe bytes\n";
    relay_stream(input, LogSource::Stdout, &logs).await;

    assert_eq!(drain(&mut rx), vec!["ok \u{fffd}\u{fffd} bytes"]);
}

#[tokio::test]
async fn relay_finishes_after_child_exit_and_keeps_per_stream_order() {
    let logs = LogChannel::new();
    let mut rx = logs.subscribe();

    let mut child = Command::new("/bin/sh")
        .arg("-c")
        .arg("for i in 1 2 3; do echo out$i; echo err$i >&2; done")
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .unwrap();
    let relay = spawn_relay(child.stdout.take(), child.stderr.take(), logs.clone());
    child.wait().await.unwrap();
    relay.await.unwrap();

    let lines = drain(&mut rx);
    let out: Vec<&String> = lines.iter().filter(|l| l.starts_with("out")).collect();
    let err: Vec<&String> = lines.iter().filter(|l| l.starts_with("STDERR")).collect();
    assert_eq!(out, vec!["out1", "out2", "out3"]);
    assert_eq!(err, vec!["STDERR: err1", "STDERR: err2", "STDERR: err3"]);
}

#[tokio::test]
async fn missing_streams_finish_immediately() {
    let relay = spawn_relay::<&'static [u8], &'static [u8]>(None, None, LogChannel::new());
    relay.await.unwrap();
}
