//! Delayed, cancellable validation of the attribute input field.
//!
//! At most one validation is in flight. Each [`DebounceController::submit`]
//! supersedes the previous one: the old task is aborted and its cancel flag
//! raised, then a new task sleeps for the configured delay before validating.
//!
//! # Cancellation
//!
//! Aborting a Tokio task only takes effect at its next suspension point, so
//! the task also checks a shared flag immediately before publishing. The flag
//! is read and the verdict published while holding the flag's lock, and
//! [`DebounceController::cancel`] raises it under that same lock. Once
//! `cancel` returns, the superseded task can no longer publish.
//!
//! ```ignore
//! let mut debounce = DebounceController::new(range, Duration::from_millis(100));
//! let mut verdicts = debounce.subscribe();
//! debounce.submit("1");
//! debounce.submit("15"); // "1" is never validated
//! verdicts.changed().await?;
//! ```

use crate::config::EditorConfig;
use crate::range::AttributeRange;
use crate::validate::{validate, Verdict};
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::runtime::Handle;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::instrument;

/// A published verdict together with the text it was computed from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationOutcome {
    pub text: String,
    pub verdict: Verdict,
    pub is_confirmable: bool,
}

impl ValidationOutcome {
    fn new(text: String, verdict: Verdict) -> Self {
        let is_confirmable = verdict.is_confirmable();
        Self {
            text,
            verdict,
            is_confirmable,
        }
    }
}

type OutcomeSender = Arc<watch::Sender<Option<ValidationOutcome>>>;

/// Shared "was I cancelled" flag for one scheduled validation.
#[derive(Clone, Default)]
struct CancelFlag {
    cancelled: Arc<Mutex<bool>>,
}

impl CancelFlag {
    fn cancel(&self) {
        let mut guard = self.cancelled.lock().unwrap_or_else(|e| e.into_inner());
        *guard = true;
    }

    /// Run `effect` only if the flag is still down. The lock is held for the
    /// duration of `effect`.
    fn run_unless_cancelled(&self, effect: impl FnOnce()) -> bool {
        let guard = self.cancelled.lock().unwrap_or_else(|e| e.into_inner());
        if *guard {
            return false;
        }
        effect();
        true
    }
}

struct PendingValidation {
    flag: CancelFlag,
    handle: JoinHandle<()>,
}

/// Owns the single in-flight validation for one attribute's input field.
pub struct DebounceController {
    range: Arc<AttributeRange>,
    delay: Duration,
    pending: Option<PendingValidation>,
    outcomes: OutcomeSender,
    published: Arc<AtomicU64>,
}

impl DebounceController {
    pub fn new(range: AttributeRange, delay: Duration) -> Self {
        let (tx, _rx) = watch::channel(None);
        Self {
            range: Arc::new(range),
            delay,
            pending: None,
            outcomes: Arc::new(tx),
            published: Arc::new(AtomicU64::new(0)),
        }
    }

    pub fn from_config(range: AttributeRange, config: &EditorConfig) -> Self {
        Self::new(range, config.debounce_delay())
    }

    pub fn range(&self) -> &AttributeRange {
        &self.range
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// Receiver for published outcomes. Starts at `None` until the first publish.
    pub fn subscribe(&self) -> watch::Receiver<Option<ValidationOutcome>> {
        self.outcomes.subscribe()
    }

    /// Most recently published outcome.
    pub fn latest(&self) -> Option<ValidationOutcome> {
        self.outcomes.borrow().clone()
    }

    /// Whether the confirm action should be enabled right now.
    pub fn is_confirmable(&self) -> bool {
        self.outcomes
            .borrow()
            .as_ref()
            .is_some_and(|outcome| outcome.is_confirmable)
    }

    /// Number of verdicts published so far.
    pub fn published_count(&self) -> u64 {
        self.published.load(Ordering::Acquire)
    }

    pub fn is_pending(&self) -> bool {
        self.pending
            .as_ref()
            .is_some_and(|pending| !pending.handle.is_finished())
    }

    /// Schedule validation of `text` after the delay, superseding any pending one.
    ///
    /// Outside a Tokio runtime there is nothing to defer onto, so the text is
    /// validated immediately.
    #[instrument(skip_all, name = "debounce_submit")]
    pub fn submit(&mut self, text: impl Into<String>) {
        let text = text.into();
        self.cancel();

        let runtime = match Handle::try_current() {
            Ok(handle) => handle,
            Err(_) => {
                log::debug!("No async runtime available; validating input immediately");
                self.validate_now(&text);
                return;
            }
        };

        let flag = CancelFlag::default();
        let task_flag = flag.clone();
        let range = Arc::clone(&self.range);
        let outcomes = Arc::clone(&self.outcomes);
        let published = Arc::clone(&self.published);
        let delay = self.delay;

        let handle = runtime.spawn(async move {
            tokio::time::sleep(delay).await;

            let verdict = validate(&text, &range);
            let outcome = ValidationOutcome::new(text, verdict);
            let delivered = task_flag.run_unless_cancelled(|| {
                publish(&outcomes, &published, outcome);
            });
            if !delivered {
                log::trace!("Discarded superseded validation");
            }
        });

        self.pending = Some(PendingValidation { flag, handle });
    }

    /// Validate `text` right away, cancelling anything pending, and publish the result.
    pub fn validate_now(&mut self, text: &str) -> ValidationOutcome {
        self.cancel();
        let outcome = ValidationOutcome::new(text.to_string(), validate(text, &self.range));
        publish(&self.outcomes, &self.published, outcome.clone());
        outcome
    }

    /// Drop the pending validation, if any. It will never publish.
    pub fn cancel(&mut self) {
        if let Some(pending) = self.pending.take() {
            pending.flag.cancel();
            pending.handle.abort();
        }
    }
}

impl Drop for DebounceController {
    fn drop(&mut self) {
        self.cancel();
    }
}

fn publish(outcomes: &OutcomeSender, published: &AtomicU64, outcome: ValidationOutcome) {
    log::debug!(
        "Validated {:?}: confirmable={}",
        outcome.text,
        outcome.is_confirmable
    );
    outcomes.send_replace(Some(outcome));
    published.fetch_add(1, Ordering::AcqRel);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::multiplier::Multiplier;
    use crate::validate::ValidationError;

    const DELAY: Duration = Duration::from_millis(100);

    fn velocity() -> AttributeRange {
        AttributeRange::new(
            37,
            "Maximum Velocity",
            Multiplier::from_f64(0.90),
            Multiplier::from_f64(1.20),
        )
        .unwrap()
    }

    #[tokio::test(start_paused = true)]
    async fn test_publishes_after_delay() {
        let mut debounce = DebounceController::new(velocity(), DELAY);
        debounce.submit("15");

        tokio::time::sleep(Duration::from_millis(99)).await;
        assert_eq!(debounce.published_count(), 0);
        assert!(debounce.latest().is_none());

        tokio::time::sleep(Duration::from_millis(2)).await;
        assert_eq!(debounce.published_count(), 1);
        let outcome = debounce.latest().unwrap();
        assert_eq!(outcome.verdict, Verdict::Valid(Multiplier::from_f64(1.15)));
        assert!(outcome.is_confirmable);
        assert!(debounce.is_confirmable());
    }

    #[tokio::test(start_paused = true)]
    async fn test_only_latest_text_is_validated() {
        let mut debounce = DebounceController::new(velocity(), DELAY);
        let mut outcomes = debounce.subscribe();

        debounce.submit("15");
        tokio::time::sleep(Duration::from_millis(50)).await;
        debounce.submit("25");
        tokio::time::sleep(Duration::from_millis(250)).await;

        assert_eq!(debounce.published_count(), 1);
        assert!(outcomes.has_changed().unwrap());
        let outcome = outcomes.borrow_and_update().clone().unwrap();
        assert_eq!(outcome.text, "25");
        assert!(matches!(
            outcome.verdict,
            Verdict::Invalid(ValidationError::OutOfRange { .. })
        ));
        assert!(!outcome.is_confirmable);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_prevents_publish() {
        let mut debounce = DebounceController::new(velocity(), DELAY);
        debounce.submit("15");
        assert!(debounce.is_pending());

        tokio::time::sleep(Duration::from_millis(40)).await;
        debounce.cancel();
        assert!(!debounce.is_pending());

        tokio::time::sleep(Duration::from_millis(500)).await;
        assert_eq!(debounce.published_count(), 0);
        assert!(debounce.latest().is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_drop_cancels_pending() {
        let debounce_range = velocity();
        let mut debounce = DebounceController::new(debounce_range, DELAY);
        let outcomes = debounce.subscribe();
        let published = Arc::clone(&debounce.published);

        debounce.submit("15");
        drop(debounce);

        tokio::time::sleep(Duration::from_millis(500)).await;
        assert_eq!(published.load(Ordering::Acquire), 0);
        assert!(outcomes.borrow().is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_validate_now_supersedes_pending() {
        let mut debounce = DebounceController::new(velocity(), DELAY);
        debounce.submit("15");

        let outcome = debounce.validate_now("-5");
        assert_eq!(outcome.verdict, Verdict::Valid(Multiplier::from_f64(0.95)));
        assert_eq!(debounce.published_count(), 1);

        tokio::time::sleep(Duration::from_millis(500)).await;
        assert_eq!(debounce.published_count(), 1);
        assert_eq!(debounce.latest().unwrap().text, "-5");
    }

    #[tokio::test(start_paused = true)]
    async fn test_empty_input_disables_confirm() {
        let mut debounce = DebounceController::new(velocity(), DELAY);
        debounce.submit("15");
        tokio::time::sleep(Duration::from_millis(150)).await;
        assert!(debounce.is_confirmable());

        debounce.submit("  ");
        tokio::time::sleep(Duration::from_millis(150)).await;
        assert_eq!(debounce.latest().unwrap().verdict, Verdict::Empty);
        assert!(!debounce.is_confirmable());
    }

    #[test]
    fn test_without_runtime_validates_immediately() {
        let mut debounce = DebounceController::new(velocity(), DELAY);
        debounce.submit("1..5");
        assert_eq!(debounce.published_count(), 1);
        assert_eq!(
            debounce.latest().unwrap().verdict,
            Verdict::Invalid(ValidationError::Format)
        );
    }
}
