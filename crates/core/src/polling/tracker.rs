use crate::domain::run::RunStatus;
use crate::polling::states::{PollDecision, PollPolicy, PollTransition, RunPhase};

/// Bounded state machine for one assistant run.
///
/// `start` records the status returned when the run was created and does not count as a
/// poll. Every `observe` counts one poll against `max_polls`.
#[derive(Clone, Debug)]
pub struct RunTracker {
    policy: PollPolicy,
    phase: RunPhase,
    polls: u32,
    last: Option<PollTransition>,
}

impl RunTracker {
    pub fn new(policy: PollPolicy) -> Self {
        Self { policy, phase: RunPhase::Created, polls: 0, last: None }
    }

    pub fn phase(&self) -> RunPhase {
        self.phase
    }

    pub fn polls(&self) -> u32 {
        self.polls
    }

    pub fn policy(&self) -> PollPolicy {
        self.policy
    }

    pub fn start(&mut self, status: RunStatus) -> PollTransition {
        if self.phase != RunPhase::Created {
            return self.settled_or_observe(status);
        }
        self.phase = RunPhase::Running;
        self.transition(RunPhase::Created, status)
    }

    pub fn observe(&mut self, status: RunStatus) -> PollTransition {
        self.settled_or_observe(status)
    }

    fn settled_or_observe(&mut self, status: RunStatus) -> PollTransition {
        if self.phase.is_settled() {
            if let Some(last) = self.last {
                return last;
            }
        }
        if self.phase == RunPhase::Created {
            return self.start(status);
        }
        self.polls += 1;
        self.transition(RunPhase::Running, status)
    }

    fn transition(&mut self, from: RunPhase, status: RunStatus) -> PollTransition {
        let (to, decision) = if status.is_completed() {
            (RunPhase::Completed, PollDecision::Fetch)
        } else if status.is_terminal() {
            (RunPhase::Failed, PollDecision::Abort(status))
        } else if self.polls >= self.policy.max_polls {
            (RunPhase::Failed, PollDecision::Exhausted(status))
        } else {
            (RunPhase::Running, PollDecision::Wait(self.policy.interval))
        };

        self.phase = to;
        let outcome = PollTransition { from, to, status, decision };
        self.last = Some(outcome);
        outcome
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use crate::domain::run::RunStatus;
    use crate::polling::states::{PollDecision, PollPolicy, RunPhase};
    use crate::polling::tracker::RunTracker;

    fn policy(max_polls: u32) -> PollPolicy {
        PollPolicy { interval: Duration::from_secs(3), max_polls }
    }

    #[test]
    fn created_run_moves_to_running_without_counting_a_poll() {
        let mut tracker = RunTracker::new(policy(5));
        let outcome = tracker.start(RunStatus::Queued);

        assert_eq!(outcome.from, RunPhase::Created);
        assert_eq!(outcome.to, RunPhase::Running);
        assert_eq!(outcome.decision, PollDecision::Wait(Duration::from_secs(3)));
        assert_eq!(tracker.polls(), 0);
    }

    #[test]
    fn completed_status_requests_message_fetch() {
        let mut tracker = RunTracker::new(policy(5));
        tracker.start(RunStatus::Queued);
        tracker.observe(RunStatus::InProgress);
        let outcome = tracker.observe(RunStatus::Completed);

        assert_eq!(outcome.decision, PollDecision::Fetch);
        assert_eq!(tracker.phase(), RunPhase::Completed);
        assert_eq!(tracker.polls(), 2);
    }

    #[test]
    fn non_completed_terminal_status_aborts_immediately() {
        for status in [
            RunStatus::Failed,
            RunStatus::Expired,
            RunStatus::Cancelled,
            RunStatus::Incomplete,
            RunStatus::RequiresAction,
        ] {
            let mut tracker = RunTracker::new(policy(5));
            tracker.start(RunStatus::Queued);
            let outcome = tracker.observe(status);
            assert_eq!(outcome.decision, PollDecision::Abort(status));
            assert_eq!(tracker.phase(), RunPhase::Failed);
        }
    }

    #[test]
    fn budget_is_exhausted_after_max_polls_of_active_status() {
        let mut tracker = RunTracker::new(policy(3));
        tracker.start(RunStatus::Queued);
        assert!(matches!(tracker.observe(RunStatus::InProgress).decision, PollDecision::Wait(_)));
        assert!(matches!(tracker.observe(RunStatus::InProgress).decision, PollDecision::Wait(_)));
        let outcome = tracker.observe(RunStatus::InProgress);

        assert_eq!(outcome.decision, PollDecision::Exhausted(RunStatus::InProgress));
        assert_eq!(tracker.polls(), 3);
    }

    #[test]
    fn completion_on_the_last_allowed_poll_still_fetches() {
        let mut tracker = RunTracker::new(policy(1));
        tracker.start(RunStatus::Queued);
        assert_eq!(tracker.observe(RunStatus::Completed).decision, PollDecision::Fetch);
    }

    #[test]
    fn settled_tracker_ignores_further_observations() {
        let mut tracker = RunTracker::new(policy(5));
        tracker.start(RunStatus::Failed);
        let again = tracker.observe(RunStatus::Completed);

        assert_eq!(again.decision, PollDecision::Abort(RunStatus::Failed));
        assert_eq!(tracker.polls(), 0);
    }
}
