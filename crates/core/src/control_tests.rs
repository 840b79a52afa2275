// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn flags_start_cleared() {
    let flags = ControlFlags::new();
    assert!(!flags.is_shutdown_requested());
    assert!(!flags.is_restart_requested());
    assert!(!flags.desired_running());
}

#[test]
fn restart_request_is_consumed_once() {
    let flags = ControlFlags::new();
    flags.request_restart();

    assert!(flags.take_restart_request());
    assert!(!flags.take_restart_request());
}

#[test]
fn repeated_restart_requests_collapse() {
    let flags = ControlFlags::new();
    flags.request_restart();
    flags.request_restart();

    assert!(flags.take_restart_request());
    assert!(!flags.is_restart_requested());
}

#[test]
fn clones_share_state() {
    let flags = ControlFlags::new();
    let controller = flags.clone();

    controller.set_desired_running(true);
    controller.request_shutdown();

    assert!(flags.desired_running());
    assert!(flags.is_shutdown_requested());
}

#[tokio::test(start_paused = true)]
async fn wait_for_change_times_out_without_mutation() {
    let flags = ControlFlags::new();
    let woken = flags.wait_for_change(Duration::from_secs(1)).await;
    assert!(!woken);
}

#[tokio::test(start_paused = true)]
async fn wait_for_change_wakes_on_mutation_from_another_task() {
    let flags = ControlFlags::new();
    let controller = flags.clone();

    let waiter = tokio::spawn(async move { flags.wait_for_change(Duration::from_secs(60)).await });
    tokio::task::yield_now().await;
    controller.request_restart();

    assert!(waiter.await.unwrap());
}

#[tokio::test(start_paused = true)]
async fn mutation_before_wait_is_not_lost() {
    let flags = ControlFlags::new();
    flags.set_desired_running(true);

    // The stored permit wakes the next waiter immediately.
    assert!(flags.wait_for_change(Duration::from_secs(60)).await);
}

#[tokio::test(start_paused = true)]
async fn shutdown_wakes_every_waiter() {
    let flags = ControlFlags::new();
    let waiters: Vec<_> = (0..3)
        .map(|_| {
            let flags = flags.clone();
            tokio::spawn(async move { flags.wait_for_shutdown().await })
        })
        .collect();
    tokio::task::yield_now().await;

    flags.request_shutdown();

    for waiter in waiters {
        tokio::time::timeout(Duration::from_secs(1), waiter)
            .await
            .unwrap()
            .unwrap();
    }
    // The supervisor's change permit is still there
    assert!(flags.wait_for_change(Duration::from_secs(60)).await);
}

#[tokio::test(start_paused = true)]
async fn wait_for_shutdown_returns_when_already_requested() {
    let flags = ControlFlags::new();
    flags.request_shutdown();
    tokio::time::timeout(Duration::from_secs(1), flags.wait_for_shutdown())
        .await
        .unwrap();
}
