use crate::config::GovernorConfig;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::{SystemTime, UNIX_EPOCH};

/// Verdict for a single inbound request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Allowed,
    Rejected {
        reason: RejectReason,
        /// Seconds until the client may retry
        retry_after_secs: u64,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RejectReason {
    /// The client is inside an active temporary ban
    Banned,
    /// This request overflowed the current window and triggered a ban
    RateLimitedAndBanned,
}

impl RejectReason {
    /// Stable identifier used in JSON error bodies
    pub fn as_str(&self) -> &'static str {
        match self {
            RejectReason::Banned => "banned",
            RejectReason::RateLimitedAndBanned => "rate_limited_and_banned",
        }
    }
}

/// Per-client request accounting for the current window
struct ClientWindow {
    count: u32,
    window_reset_at: u64,
}

#[derive(Default)]
struct GovernorState {
    /// Request counters keyed by client id (normalized source address)
    windows: HashMap<String, ClientWindow>,
    /// Active bans keyed by client id, value is the expiry (epoch seconds)
    bans: HashMap<String, u64>,
}

/// Request Governor - decides for every inbound request whether it may proceed,
/// based solely on the client's recent request history.
///
/// Two-tier policy: a client may make `limit` requests per fixed window; the
/// request that overflows the window triggers a temporary ban. A client that
/// merely touches the limit is never banned. Requests arriving during an
/// active ban do not extend it.
///
/// All state lives behind a single mutex so the ban-check / window-increment /
/// ban-creation sequence is atomic per call. Lock hold time is O(1) and the
/// governor never touches I/O.
#[derive(Clone)]
pub struct RequestGovernor {
    limit: u32,
    window_secs: u64,
    ban_secs: u64,
    state: Arc<Mutex<GovernorState>>,
}

impl RequestGovernor {
    pub fn new(config: &GovernorConfig) -> Self {
        Self {
            limit: config.limit,
            window_secs: config.window_secs,
            ban_secs: config.ban_secs,
            state: Arc::new(Mutex::new(GovernorState::default())),
        }
    }

    /// Admit or reject a request from `client_id` at the current wall-clock time
    pub fn admit(&self, client_id: &str) -> Decision {
        self.admit_at(client_id, now_secs())
    }

    /// Admit or reject a request at an explicit time (epoch seconds)
    pub fn admit_at(&self, client_id: &str, now: u64) -> Decision {
        let mut state = self.state.lock().unwrap();

        // Ban check first: an active ban rejects outright, an expired one is
        // removed lazily before the window is consulted.
        if let Some(&banned_until) = state.bans.get(client_id) {
            if now < banned_until {
                return Decision::Rejected {
                    reason: RejectReason::Banned,
                    retry_after_secs: banned_until - now,
                };
            }
            state.bans.remove(client_id);
        }

        let overflowed = {
            let window = state
                .windows
                .entry(client_id.to_string())
                .or_insert(ClientWindow {
                    count: 0,
                    window_reset_at: 0,
                });
            if now >= window.window_reset_at {
                // No window yet, or the previous one elapsed: this request
                // opens a fresh window and counts as its first hit.
                window.count = 1;
                window.window_reset_at = now + self.window_secs;
                false
            } else {
                window.count += 1;
                window.count > self.limit
            }
        };

        if !overflowed {
            return Decision::Allowed;
        }

        // Overflow: escalate to a ban and drop the window so the client
        // starts fresh once the ban expires.
        state.windows.remove(client_id);
        state.bans.insert(client_id.to_string(), now + self.ban_secs);
        Decision::Rejected {
            reason: RejectReason::RateLimitedAndBanned,
            retry_after_secs: self.ban_secs,
        }
    }

    /// Evict entries that can no longer affect any decision, using the
    /// current wall-clock time. Returns the number of entries removed.
    pub fn sweep(&self) -> usize {
        self.sweep_at(now_secs())
    }

    /// Evict windows whose reset time has passed and bans that have expired.
    /// Both kinds of entry are already treated as absent by `admit_at`, so
    /// sweeping never changes an admission decision.
    pub fn sweep_at(&self, now: u64) -> usize {
        let mut state = self.state.lock().unwrap();
        let before = state.windows.len() + state.bans.len();
        state.windows.retain(|_, w| now < w.window_reset_at);
        state.bans.retain(|_, &mut banned_until| now < banned_until);
        before - (state.windows.len() + state.bans.len())
    }

    /// Current table sizes: (tracked windows, active ban records)
    pub fn tracked_clients(&self) -> (usize, usize) {
        let state = self.state.lock().unwrap();
        (state.windows.len(), state.bans.len())
    }
}

fn now_secs() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap()
        .as_secs()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    fn governor(limit: u32, window_secs: u64, ban_secs: u64) -> RequestGovernor {
        RequestGovernor::new(&GovernorConfig {
            limit,
            window_secs,
            ban_secs,
        })
    }

    #[test]
    fn requests_within_limit_are_allowed() {
        let gov = governor(5, 60, 600);
        for i in 0..5 {
            assert_eq!(
                gov.admit_at("10.0.0.1", i),
                Decision::Allowed,
                "request {} should be allowed",
                i + 1
            );
        }
    }

    #[test]
    fn overflow_request_triggers_ban() {
        let gov = governor(3, 60, 1200);
        for t in 0..3 {
            assert_eq!(gov.admit_at("10.0.0.1", t), Decision::Allowed);
        }
        assert_eq!(
            gov.admit_at("10.0.0.1", 3),
            Decision::Rejected {
                reason: RejectReason::RateLimitedAndBanned,
                retry_after_secs: 1200,
            }
        );
    }

    #[test]
    fn banned_client_stays_rejected_until_expiry() {
        let gov = governor(3, 60, 1200);
        for t in 0..3 {
            gov.admit_at("10.0.0.1", t);
        }
        gov.admit_at("10.0.0.1", 3); // overflow, banned until t=1203

        // Every further request inside the ban is rejected as banned, even
        // long after the original window would have rolled over.
        assert_eq!(
            gov.admit_at("10.0.0.1", 5),
            Decision::Rejected {
                reason: RejectReason::Banned,
                retry_after_secs: 1198,
            }
        );
        assert_eq!(
            gov.admit_at("10.0.0.1", 500),
            Decision::Rejected {
                reason: RejectReason::Banned,
                retry_after_secs: 703,
            }
        );
    }

    #[test]
    fn ban_is_not_extended_by_requests_during_ban() {
        let gov = governor(1, 60, 1000);
        gov.admit_at("10.0.0.1", 0);
        gov.admit_at("10.0.0.1", 1); // banned until t=1001

        // retry_after keeps shrinking - hammering does not refresh the ban
        for (t, expected) in [(100, 901), (500, 501), (1000, 1)] {
            assert_eq!(
                gov.admit_at("10.0.0.1", t),
                Decision::Rejected {
                    reason: RejectReason::Banned,
                    retry_after_secs: expected,
                }
            );
        }
    }

    #[test]
    fn fresh_window_after_ban_expires() {
        let gov = governor(3, 60, 1200);
        for t in 0..3 {
            gov.admit_at("10.0.0.1", t);
        }
        gov.admit_at("10.0.0.1", 3); // banned until t=1203

        // At expiry the ban is gone and the dropped window means a clean start
        assert_eq!(gov.admit_at("10.0.0.1", 1203), Decision::Allowed);
        assert_eq!(gov.admit_at("10.0.0.1", 1204), Decision::Allowed);
        assert_eq!(gov.admit_at("10.0.0.1", 1205), Decision::Allowed);
        // ...and the fresh window still enforces the limit
        assert_eq!(
            gov.admit_at("10.0.0.1", 1206),
            Decision::Rejected {
                reason: RejectReason::RateLimitedAndBanned,
                retry_after_secs: 1200,
            }
        );
    }

    #[test]
    fn window_rollover_resets_count() {
        let gov = governor(3, 60, 1200);
        // Touch the limit exactly - never banned, only counted
        for t in 0..3 {
            assert_eq!(gov.admit_at("10.0.0.1", t), Decision::Allowed);
        }
        // Window elapses at t=60; the next request opens a fresh one
        assert_eq!(gov.admit_at("10.0.0.1", 60), Decision::Allowed);
        assert_eq!(gov.admit_at("10.0.0.1", 61), Decision::Allowed);
    }

    #[test]
    fn idle_client_gets_fresh_window() {
        let gov = governor(3, 60, 1200);
        assert_eq!(gov.admit_at("10.0.0.2", 0), Decision::Allowed);
        // Nothing until after the window expired
        assert_eq!(gov.admit_at("10.0.0.2", 61), Decision::Allowed);
        let (windows, bans) = gov.tracked_clients();
        assert_eq!((windows, bans), (1, 0));
    }

    #[test]
    fn clients_are_rate_limited_independently() {
        let gov = governor(2, 60, 600);
        gov.admit_at("10.0.0.1", 0);
        gov.admit_at("10.0.0.1", 0);
        assert!(matches!(
            gov.admit_at("10.0.0.1", 1),
            Decision::Rejected { .. }
        ));
        // A different client is unaffected by the first one's ban
        assert_eq!(gov.admit_at("10.0.0.2", 1), Decision::Allowed);
    }

    #[test]
    fn no_race_admits_more_than_limit() {
        let limit = 50u32;
        let total = 80usize;
        let gov = governor(limit, 300, 1260);

        let mut handles = Vec::new();
        for _ in 0..total {
            let gov = gov.clone();
            handles.push(thread::spawn(move || gov.admit_at("10.9.9.9", 100)));
        }

        let decisions: Vec<Decision> = handles.into_iter().map(|h| h.join().unwrap()).collect();
        let allowed = decisions
            .iter()
            .filter(|d| matches!(d, Decision::Allowed))
            .count();
        let overflows = decisions
            .iter()
            .filter(|d| {
                matches!(
                    d,
                    Decision::Rejected {
                        reason: RejectReason::RateLimitedAndBanned,
                        ..
                    }
                )
            })
            .count();

        assert_eq!(allowed, limit as usize);
        // Exactly one request crosses the boundary; the rest hit the ban
        assert_eq!(overflows, 1);
        assert_eq!(decisions.len() - allowed - overflows, total - limit as usize - 1);
    }

    #[test]
    fn sweep_evicts_dead_entries_only() {
        let gov = governor(1, 60, 100);
        gov.admit_at("a", 0); // window resets at t=60
        gov.admit_at("b", 50); // window resets at t=110
        gov.admit_at("c", 0);
        gov.admit_at("c", 1); // banned until t=101

        assert_eq!(gov.sweep_at(60), 1); // only a's window is dead
        assert_eq!(gov.tracked_clients(), (1, 1));

        assert_eq!(gov.sweep_at(200), 2); // b's window and c's ban
        assert_eq!(gov.tracked_clients(), (0, 0));

        // Eviction never resurrects quota: c starts a clean window
        assert_eq!(gov.admit_at("c", 200), Decision::Allowed);
    }

    #[test]
    fn limit_of_one_bans_on_second_request() {
        let gov = governor(1, 60, 600);
        assert_eq!(gov.admit_at("10.0.0.1", 0), Decision::Allowed);
        assert_eq!(
            gov.admit_at("10.0.0.1", 10),
            Decision::Rejected {
                reason: RejectReason::RateLimitedAndBanned,
                retry_after_secs: 600,
            }
        );
    }
}
