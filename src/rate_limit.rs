use jiff::{SignedDuration, Timestamp};
use strum::IntoStaticStr;
use tracing::warn;

use crate::config::RateLimitSettings;
use crate::error::{Error, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, IntoStaticStr)]
#[strum(serialize_all = "lowercase")]
pub enum Action {
    Comment,
    Vote,
    Report,
}

/// Per-identity caps over a sliding window. Counts come from timestamps the
/// store already keeps, so nothing is tracked between requests.
pub struct RateLimiter<'a> {
    settings: &'a RateLimitSettings,
}

impl<'a> RateLimiter<'a> {
    pub fn new(settings: &'a RateLimitSettings) -> Self {
        Self { settings }
    }

    /// Maximum actions per window; 0 means uncapped.
    pub fn limit_for(&self, action: Action) -> u32 {
        match action {
            Action::Comment => self.settings.comments_per_window,
            Action::Vote => self.settings.votes_per_window,
            Action::Report => self.settings.reports_per_window,
        }
    }

    pub fn window_start(&self, now: Timestamp) -> Timestamp {
        let secs = i64::try_from(self.settings.window_secs).unwrap_or(i64::MAX);
        now.checked_sub(SignedDuration::from_secs(secs))
            .unwrap_or(Timestamp::MIN)
    }

    /// Fail when `recent` actions inside the window already use up the cap.
    pub fn check(&self, action: Action, recent: usize) -> Result<()> {
        let limit = self.limit_for(action);
        if !self.settings.enabled || limit == 0 {
            return Ok(());
        }
        if recent >= limit as usize {
            let name: &'static str = action.into();
            warn!(action = name, recent, limit, "rate limit reached");
            return Err(Error::RateLimited {
                action: name,
                limit,
                window_secs: self.settings.window_secs,
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::{fixture, rstest};

    #[fixture]
    fn settings() -> RateLimitSettings {
        RateLimitSettings {
            enabled: true,
            window_secs: 60,
            comments_per_window: 2,
            votes_per_window: 0,
            reports_per_window: 1,
        }
    }

    #[rstest]
    #[case::under(Action::Comment, 1, true)]
    #[case::at_limit(Action::Comment, 2, false)]
    #[case::report_first(Action::Report, 0, true)]
    #[case::report_second(Action::Report, 1, false)]
    #[case::uncapped(Action::Vote, 10_000, true)]
    fn caps_per_action(
        settings: RateLimitSettings,
        #[case] action: Action,
        #[case] recent: usize,
        #[case] allowed: bool,
    ) {
        let limiter = RateLimiter::new(&settings);
        assert_eq!(limiter.check(action, recent).is_ok(), allowed);
    }

    #[rstest]
    fn disabled_never_limits(mut settings: RateLimitSettings) {
        settings.enabled = false;
        let limiter = RateLimiter::new(&settings);
        assert!(limiter.check(Action::Comment, 99).is_ok());
    }

    #[rstest]
    fn error_names_the_action(settings: RateLimitSettings) {
        let limiter = RateLimiter::new(&settings);
        match limiter.check(Action::Report, 5).unwrap_err() {
            Error::RateLimited {
                action,
                limit,
                window_secs,
            } => {
                assert_eq!(action, "report");
                assert_eq!(limit, 1);
                assert_eq!(window_secs, 60);
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[rstest]
    fn window_start_is_window_secs_back(settings: RateLimitSettings) {
        let limiter = RateLimiter::new(&settings);
        let now = Timestamp::from_second(1_000).unwrap();
        assert_eq!(
            limiter.window_start(now),
            Timestamp::from_second(940).unwrap()
        );
    }
}
