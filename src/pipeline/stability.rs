//! Debounce of per-frame tokens into committed events.
//!
//! A token commits once it has been observed `required_stability` frames in
//! a row **and** more than `cooldown` has passed since the previous commit.
//! The run restarts on any change of token, on `Unknown`, on hand loss and
//! after every commit.
//!
//! ```text
//! frame:   A  A  A … A(15th)  A  A …
//! run:     1  2  3 … 15       1  2 …
//! commit:               ▲
//! ```

use std::time::{Duration, Instant};

use crate::config::TrackingConfig;
use crate::gesture::Token;

// ---------------------------------------------------------------------------
// CommittedEvent
// ---------------------------------------------------------------------------

/// A token that survived debounce and cooldown.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CommittedEvent {
    pub token: Token,
    pub at: Instant,
}

// ---------------------------------------------------------------------------
// StabilityFilter
// ---------------------------------------------------------------------------

/// Run-length debounce with a cooldown between commits.
#[derive(Debug, Clone)]
pub struct StabilityFilter {
    required: u32,
    cooldown: Duration,
    last_token: Token,
    run_length: u32,
    last_commit: Option<Instant>,
}

impl StabilityFilter {
    /// `required` is clamped to at least 1.
    pub fn new(required: u32, cooldown: Duration) -> Self {
        Self {
            required: required.max(1),
            cooldown,
            last_token: Token::Unknown,
            run_length: 0,
            last_commit: None,
        }
    }

    pub fn from_config(config: &TrackingConfig) -> Self {
        Self::new(config.required_stability, config.cooldown())
    }

    /// Feed one frame's token.  Returns the committed event, if any.
    pub fn observe(&mut self, token: Token, now: Instant) -> Option<CommittedEvent> {
        if token != Token::Unknown && token == self.last_token {
            self.run_length = self.run_length.saturating_add(1);
        } else {
            self.last_token = token;
            self.run_length = u32::from(token != Token::Unknown);
        }

        if self.run_length >= self.required && self.cooldown_elapsed(now) {
            self.run_length = 0;
            self.last_commit = Some(now);
            return Some(CommittedEvent { token, at: now });
        }
        None
    }

    /// No hand in frame: behaves like an `Unknown` frame.  The cooldown clock
    /// is left alone.
    pub fn hand_lost(&mut self) {
        self.last_token = Token::Unknown;
        self.run_length = 0;
    }

    /// Back to the session-start state, cooldown included.
    pub fn reset(&mut self) {
        self.last_token = Token::Unknown;
        self.run_length = 0;
        self.last_commit = None;
    }

    /// The run has reached the threshold and is only held back by cooldown.
    pub fn is_stable(&self) -> bool {
        self.run_length >= self.required
    }

    pub fn run_length(&self) -> u32 {
        self.run_length
    }

    pub fn last_token(&self) -> Token {
        self.last_token
    }

    /// Time left before another commit is allowed; zero when none is pending.
    pub fn cooldown_remaining(&self, now: Instant) -> Duration {
        match self.last_commit {
            Some(at) => self
                .cooldown
                .saturating_sub(now.saturating_duration_since(at)),
            None => Duration::ZERO,
        }
    }

    fn cooldown_elapsed(&self, now: Instant) -> bool {
        match self.last_commit {
            Some(at) => now.saturating_duration_since(at) > self.cooldown,
            None => true,
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gesture::Control;

    const A: Token = Token::Letter('A');
    const B: Token = Token::Letter('B');

    fn secs(start: Instant, s: f64) -> Instant {
        start + Duration::from_secs_f64(s)
    }

    fn filter() -> StabilityFilter {
        StabilityFilter::new(15, Duration::from_millis(1500))
    }

    /// 20 observations one second apart commit exactly once, on the 15th.
    #[test]
    fn commits_once_on_the_fifteenth_observation() {
        let t0 = Instant::now();
        let mut f = filter();

        let commits: Vec<usize> = (1..=20)
            .filter_map(|i| f.observe(A, secs(t0, i as f64)).map(|_| i))
            .collect();

        assert_eq!(commits, vec![15]);
    }

    #[test]
    fn fewer_than_required_never_commits() {
        let t0 = Instant::now();
        let mut f = filter();
        for i in 0..14 {
            assert!(f.observe(A, secs(t0, i as f64)).is_none());
        }
        assert_eq!(f.run_length(), 14);
    }

    #[test]
    fn interruption_by_other_token_restarts_run() {
        let t0 = Instant::now();
        let mut f = filter();
        let mut t = 0.0;
        let mut commits = 0;
        for _ in 0..10 {
            commits += f.observe(A, secs(t0, t)).is_some() as usize;
            t += 1.0;
        }
        commits += f.observe(B, secs(t0, t)).is_some() as usize;
        t += 1.0;
        for _ in 0..10 {
            commits += f.observe(A, secs(t0, t)).is_some() as usize;
            t += 1.0;
        }
        assert_eq!(commits, 0);
        assert_eq!(f.run_length(), 10);
    }

    #[test]
    fn unknown_interrupts_and_never_accumulates() {
        let t0 = Instant::now();
        let mut f = filter();
        for i in 0..10 {
            f.observe(A, secs(t0, i as f64));
        }
        assert!(f.observe(Token::Unknown, secs(t0, 10.0)).is_none());
        assert_eq!(f.run_length(), 0);

        for i in 0..100 {
            assert!(f.observe(Token::Unknown, secs(t0, 11.0 + i as f64)).is_none());
            assert_eq!(f.run_length(), 0);
        }
    }

    /// A held gesture cannot commit twice within the cooldown.
    #[test]
    fn cooldown_spaces_out_sustained_commits() {
        let t0 = Instant::now();
        let mut f = StabilityFilter::new(3, Duration::from_millis(1500));
        let step = 0.1;

        let commit_times: Vec<f64> = (0..100)
            .filter_map(|i| {
                let t = i as f64 * step;
                f.observe(A, secs(t0, t)).map(|_| t)
            })
            .collect();

        assert!(commit_times.len() >= 2);
        for pair in commit_times.windows(2) {
            assert!(pair[1] - pair[0] > 1.5, "commits too close: {pair:?}");
        }
    }

    #[test]
    fn held_by_cooldown_reports_stable() {
        let t0 = Instant::now();
        let mut f = StabilityFilter::new(2, Duration::from_secs(10));
        f.observe(A, t0);
        assert!(f.observe(A, secs(t0, 0.1)).is_some());

        f.observe(A, secs(t0, 0.2));
        assert!(f.observe(A, secs(t0, 0.3)).is_none());
        assert!(f.is_stable());
        assert!(f.cooldown_remaining(secs(t0, 0.3)) > Duration::from_secs(9));
    }

    #[test]
    fn hand_loss_resets_run_but_keeps_cooldown() {
        let t0 = Instant::now();
        let mut f = StabilityFilter::new(2, Duration::from_secs(5));
        f.observe(A, t0);
        assert!(f.observe(A, secs(t0, 0.1)).is_some());
        f.observe(A, secs(t0, 0.2));

        f.hand_lost();
        assert_eq!(f.run_length(), 0);
        assert_eq!(f.last_token(), Token::Unknown);
        assert!(f.cooldown_remaining(secs(t0, 1.0)) > Duration::from_secs(3));

        // Cooldown still applies after the hand comes back.
        f.observe(A, secs(t0, 1.0));
        assert!(f.observe(A, secs(t0, 1.1)).is_none());
    }

    #[test]
    fn cooldown_remaining_is_zero_before_first_commit() {
        let f = filter();
        assert_eq!(f.cooldown_remaining(Instant::now()), Duration::ZERO);
    }

    #[test]
    fn reset_clears_cooldown() {
        let t0 = Instant::now();
        let mut f = StabilityFilter::new(1, Duration::from_secs(60));
        assert!(f.observe(A, t0).is_some());
        f.reset();
        assert!(f
            .observe(Token::Control(Control::Space), secs(t0, 0.1))
            .is_some());
    }
}
