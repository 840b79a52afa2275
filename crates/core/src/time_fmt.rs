// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Duration formatting for status output.

/// Format a countdown as `HH:MM:SS`.
///
/// Hours are not wrapped, so a countdown of a day or more shows `24:00:00`+.
pub fn format_countdown(secs: u64) -> String {
    let hours = secs / 3600;
    let minutes = (secs % 3600) / 60;
    let seconds = secs % 60;
    format!("{:02}:{:02}:{:02}", hours, minutes, seconds)
}

/// Format an uptime as a short duration: `"5s"`, `"2m"`, `"1h30m"`, `"3d"`.
pub fn format_uptime(secs: u64) -> String {
    match secs {
        0..=59 => format!("{}s", secs),
        60..=3599 => format!("{}m", secs / 60),
        3600..=86399 => {
            let (h, m) = (secs / 3600, (secs % 3600) / 60);
            if m > 0 {
                format!("{}h{}m", h, m)
            } else {
                format!("{}h", h)
            }
        }
        _ => format!("{}d", secs / 86400),
    }
}

#[cfg(test)]
#[path = "time_fmt_tests.rs"]
mod tests;
