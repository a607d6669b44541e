//! Summary lines printed by `ping`, as relayed through an instance console.
//!
//! Busybox (cirros) and iputils word the summary slightly differently:
//!
//! ```text
//! 3 packets transmitted, 3 packets received, 0% packet loss
//! 3 packets transmitted, 3 received, 0% packet loss, time 2003ms
//! 3 packets transmitted, 0 received, +3 errors, 100% packet loss, time 2030ms
//! ```

use std::sync::LazyLock;

use regex::Regex;

static SUMMARY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(\d+) packets transmitted, (\d+) (?:packets )?received,(?: \+\d+ errors,)? (\d+(?:\.\d+)?)% packet loss",
    )
    .expect("ping summary pattern is valid")
});

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PingSummary {
    pub transmitted: u32,
    pub received: u32,
    pub loss_percent: f64,
}

impl PingSummary {
    /// Exactly `0%` loss with at least one packet sent.
    pub fn is_lossless(&self) -> bool {
        self.transmitted > 0 && self.loss_percent == 0.0
    }
}

/// Finds the last ping summary in `output`.
///
/// The console relays whatever the guest prints, so earlier attempts may
/// show up before the one that matters.
pub fn parse_summary(output: &str) -> Option<PingSummary> {
    SUMMARY.captures_iter(output).last().and_then(|caps| {
        Some(PingSummary {
            transmitted: caps[1].parse().ok()?,
            received: caps[2].parse().ok()?,
            loss_percent: caps[3].parse().ok()?,
        })
    })
}
