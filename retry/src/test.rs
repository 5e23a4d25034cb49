use super::logger::ExhaustionLogger;
use super::retry_async::{retry_async, RetryExecutor};
use super::retry_policy::RetryPolicy;
use super::retry_result::{Classify, RetryError};
use super::sleeper::Sleeper;
use async_trait::async_trait;
use retrier_config::backoff_policy::{BackOffPolicy, ExponentialOption, JitterStrategy};
use retrier_config::{RetryConfig, RetryConfigBuilder};
use snafu::Snafu;
use std::error::Error as StdError;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::runtime::Runtime;

#[derive(Debug, Clone, PartialEq, Eq, Snafu)]
enum SnafuError {
    #[snafu(display("rejected"))]
    Rejected,
    #[snafu(display("Error: {}", code))]
    Http { code: u16 },
    #[snafu(display("custom error"))]
    Custom,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum Kind {
    Rejected,
    Http,
    Custom,
}

impl Classify for SnafuError {
    type Kind = Kind;

    fn kind(&self) -> Kind {
        match self {
            SnafuError::Rejected => Kind::Rejected,
            SnafuError::Http { .. } => Kind::Http,
            SnafuError::Custom => Kind::Custom,
        }
    }
}

#[derive(Default)]
struct RecordingSleeper {
    delays: Mutex<Vec<Duration>>,
}

#[async_trait]
impl Sleeper for RecordingSleeper {
    async fn sleep(&self, delay: Duration) {
        self.delays.lock().unwrap().push(delay);
    }
}

impl RecordingSleeper {
    fn delays(&self) -> Vec<Duration> {
        self.delays.lock().unwrap().clone()
    }
}

#[derive(Default)]
struct RecordingLogger {
    messages: Mutex<Vec<String>>,
}

impl ExhaustionLogger for RecordingLogger {
    fn log(&self, message: &str) {
        self.messages.lock().unwrap().push(message.to_owned());
    }
}

impl RecordingLogger {
    fn messages(&self) -> Vec<String> {
        self.messages.lock().unwrap().clone()
    }
}

fn recording_executor() -> (RetryExecutor, Arc<RecordingSleeper>, Arc<RecordingLogger>) {
    let sleeper = Arc::new(RecordingSleeper::default());
    let logger = Arc::new(RecordingLogger::default());
    let executor = RetryExecutor::new(sleeper.clone(), logger.clone());
    (executor, sleeper, logger)
}

/// Fails with `error` on the first `failures` calls, then returns the number of calls.
async fn run(
    executor: &RetryExecutor,
    policy: &RetryPolicy<SnafuError>,
    failures: usize,
    error: SnafuError,
) -> (Result<usize, RetryError<SnafuError>>, usize) {
    let calls = AtomicUsize::new(0);
    let result = executor
        .execute(policy, "myMethod", || {
            let call = calls.fetch_add(1, Ordering::SeqCst) + 1;
            let error = error.clone();
            async move {
                if call <= failures {
                    Err(error)
                } else {
                    Ok(call)
                }
            }
        })
        .await;
    (result, calls.load(Ordering::SeqCst))
}

#[test]
fn attempts_just_once_on_success() {
    let runtime = Runtime::new().unwrap();
    let (executor, sleeper, logger) = recording_executor();
    let policy = RetryPolicy::new(RetryConfig::fixed(3, Duration::from_millis(1000)));

    let (result, calls) = runtime.block_on(run(&executor, &policy, 0, SnafuError::Rejected));
    assert_eq!(result.unwrap(), 1);
    assert_eq!(calls, 1);
    assert!(sleeper.delays().is_empty());
    assert!(logger.messages().is_empty());
}

#[test]
fn attempts_until_max_retries_exceeded() {
    let runtime = Runtime::new().unwrap();
    for max_attempts in 0..5 {
        let (executor, sleeper, logger) = recording_executor();
        let policy = RetryPolicy::new(RetryConfig::immediate(max_attempts));

        let failing = run(&executor, &policy, usize::MAX, SnafuError::Rejected);
        let (result, calls) = runtime.block_on(failing);
        let error = result.unwrap_err();
        assert_eq!(calls, max_attempts + 1);
        assert!(error.is_exhausted());
        assert_eq!(error.retry_count(), Some(max_attempts));
        assert_eq!(
            error.to_string(),
            format!("Failed for 'myMethod' for {} times. Original Error: rejected", max_attempts)
        );
        assert!(sleeper.delays().is_empty());
        assert_eq!(logger.messages(), vec!["rejected".to_owned()]);
    }
}

#[test]
fn attempts_until_success() {
    let runtime = Runtime::new().unwrap();
    let (executor, sleeper, logger) = recording_executor();
    let policy = RetryPolicy::new(RetryConfig::immediate(3));

    for failures in 0..=3 {
        let flaky = run(&executor, &policy, failures, SnafuError::Rejected);
        let (result, calls) = runtime.block_on(flaky);
        assert_eq!(result.unwrap(), failures + 1);
        assert_eq!(calls, failures + 1);
    }
    assert!(sleeper.delays().is_empty());
    assert!(logger.messages().is_empty());
}

#[tokio::test]
async fn exhausted_error_keeps_the_last_failure_as_source() {
    let (executor, _, _) = recording_executor();
    let policy = RetryPolicy::new(RetryConfig::immediate(2));
    let calls = AtomicUsize::new(0);

    let result: Result<(), _> = executor
        .execute(&policy, "myMethod", || {
            let code = 500 + calls.fetch_add(1, Ordering::SeqCst) as u16;
            async move { Err(SnafuError::Http { code }) }
        })
        .await;

    let error = result.unwrap_err();
    assert_eq!(
        error.source().map(|source| source.to_string()),
        Some("Error: 502".to_owned())
    );
    assert_eq!(error.into_inner(), SnafuError::Http { code: 502 });
}

#[tokio::test]
async fn predicate_rejection_returns_the_raw_error() {
    let (executor, sleeper, logger) = recording_executor();
    let policy = RetryPolicy::new(RetryConfig::fixed(3, Duration::from_millis(100)))
        .retry_if(|e: &SnafuError| e.to_string() == "Error: 429");

    let (result, calls) = run(&executor, &policy, usize::MAX, SnafuError::Http { code: 500 }).await;
    assert_eq!(calls, 1);
    match result.unwrap_err() {
        RetryError::Operation { source } => assert_eq!(source, SnafuError::Http { code: 500 }),
        other => panic!("unexpected error {:?}", other),
    }
    assert!(sleeper.delays().is_empty());
    assert!(logger.messages().is_empty());

    let (result, calls) = run(&executor, &policy, 2, SnafuError::Http { code: 429 }).await;
    assert_eq!(result.unwrap(), 3);
    assert_eq!(calls, 3);
}

#[tokio::test]
async fn kind_allow_list() {
    let (executor, _, _) = recording_executor();
    let policy = RetryPolicy::<SnafuError>::new(RetryConfig::immediate(3))
        .retry_on(vec![Kind::Custom, Kind::Http]);

    let (result, calls) = run(&executor, &policy, usize::MAX, SnafuError::Rejected).await;
    assert_eq!(calls, 1);
    assert_eq!(result.unwrap_err().into_inner(), SnafuError::Rejected);

    let (result, calls) = run(&executor, &policy, usize::MAX, SnafuError::Custom).await;
    assert_eq!(calls, 4);
    assert!(result.unwrap_err().is_exhausted());

    let (result, calls) = run(&executor, &policy, 1, SnafuError::Http { code: 503 }).await;
    assert_eq!(result.unwrap(), 2);
    assert_eq!(calls, 2);
}

#[tokio::test]
async fn rejection_after_retries_does_not_log() {
    let (executor, sleeper, logger) = recording_executor();
    let config = RetryConfig::fixed(3, Duration::from_millis(10));
    let policy = RetryPolicy::<SnafuError>::new(config).retry_on(vec![Kind::Http]);
    let calls = AtomicUsize::new(0);

    let result: Result<(), _> = executor
        .execute(&policy, "myMethod", || {
            let call = calls.fetch_add(1, Ordering::SeqCst);
            async move {
                if call == 0 {
                    Err(SnafuError::Http { code: 503 })
                } else {
                    Err(SnafuError::Custom)
                }
            }
        })
        .await;

    assert_eq!(calls.load(Ordering::SeqCst), 2);
    assert_eq!(result.unwrap_err().into_inner(), SnafuError::Custom);
    assert_eq!(sleeper.delays(), vec![Duration::from_millis(10)]);
    assert!(logger.messages().is_empty());
}

#[tokio::test]
async fn exhausted_budget_wins_over_a_rejecting_predicate() {
    let (executor, sleeper, logger) = recording_executor();
    let policy = RetryPolicy::new(RetryConfig::immediate(0)).retry_if(|_: &SnafuError| false);

    let (result, calls) = run(&executor, &policy, usize::MAX, SnafuError::Custom).await;
    assert_eq!(calls, 1);
    let error = result.unwrap_err();
    assert!(error.is_exhausted());
    assert_eq!(error.retry_count(), Some(0));
    assert_eq!(
        error.to_string(),
        "Failed for 'myMethod' for 0 times. Original Error: custom error"
    );
    assert!(sleeper.delays().is_empty());
    assert_eq!(logger.messages(), vec!["custom error".to_owned()]);
}

#[tokio::test]
async fn ineligible_last_failure_is_still_exhausted() {
    let (executor, sleeper, logger) = recording_executor();
    let config = RetryConfig::fixed(2, Duration::from_millis(10));
    let policy = RetryPolicy::<SnafuError>::new(config).retry_on(vec![Kind::Http]);
    let calls = AtomicUsize::new(0);

    let result: Result<(), _> = executor
        .execute(&policy, "myMethod", || {
            let call = calls.fetch_add(1, Ordering::SeqCst);
            async move {
                if call < 2 {
                    Err(SnafuError::Http { code: 503 })
                } else {
                    Err(SnafuError::Custom)
                }
            }
        })
        .await;

    assert_eq!(calls.load(Ordering::SeqCst), 3);
    match result.unwrap_err() {
        RetryError::Exhausted {
            retry_count, source, ..
        } => {
            assert_eq!(retry_count, 2);
            assert_eq!(source, SnafuError::Custom);
        }
        other => panic!("unexpected error {:?}", other),
    }
    assert_eq!(sleeper.delays(), vec![Duration::from_millis(10); 2]);
    assert_eq!(logger.messages(), vec!["custom error".to_owned()]);
}

#[tokio::test]
async fn fixed_back_off_sleeps_the_same_delay() {
    let (executor, sleeper, _) = recording_executor();
    let policy = RetryPolicy::new(RetryConfig::fixed(3, Duration::from_millis(1000)));

    let (result, calls) = run(&executor, &policy, usize::MAX, SnafuError::Rejected).await;
    assert_eq!(calls, 4);
    assert_eq!(sleeper.delays(), vec![Duration::from_millis(1000); 3]);
    match result.unwrap_err() {
        RetryError::Exhausted { total_delay, .. } => {
            assert_eq!(total_delay, Duration::from_millis(3000))
        }
        other => panic!("unexpected error {:?}", other),
    }
}

#[tokio::test]
async fn exponential_back_off_respects_max_interval() {
    let (executor, sleeper, _) = recording_executor();
    let config = RetryConfigBuilder::default()
        .max_attempts(4)
        .back_off_policy(BackOffPolicy::Exponential)
        .exponential_option(ExponentialOption::new(Duration::from_millis(4000), 3.0))
        .build()
        .unwrap();
    let policy = RetryPolicy::new(config);

    let (_, calls) = run(&executor, &policy, usize::MAX, SnafuError::Rejected).await;
    assert_eq!(calls, 5);
    assert_eq!(
        sleeper.delays(),
        vec![
            Duration::from_millis(1000),
            Duration::from_millis(3000),
            Duration::from_millis(4000),
            Duration::from_millis(4000),
        ]
    );
}

#[tokio::test]
async fn jittered_waits_stay_in_range() {
    let strategies = [
        (JitterStrategy::FullJitter, false),
        (JitterStrategy::EqualJitter, true),
    ];
    for (jitter, lower_half) in strategies.iter() {
        let (executor, sleeper, _) = recording_executor();
        let config = RetryConfigBuilder::default()
            .max_attempts(6)
            .back_off_policy(BackOffPolicy::Exponential)
            .exponential_option(
                ExponentialOption::new(Duration::from_millis(8000), 2.0).jitter(*jitter),
            )
            .build()
            .unwrap();
        let policy = RetryPolicy::new(config);

        let (result, calls) = run(&executor, &policy, usize::MAX, SnafuError::Rejected).await;
        assert!(result.unwrap_err().is_exhausted());
        assert_eq!(calls, 7);
        let bases = [1000u64, 2000, 4000, 8000, 8000, 8000];
        let delays = sleeper.delays();
        assert_eq!(delays.len(), bases.len());
        for (delay, base) in delays.iter().zip(bases.iter()) {
            let base = Duration::from_millis(*base);
            assert!(*delay < base);
            if *lower_half {
                assert!(*delay >= base / 2);
            }
        }
    }
}

#[tokio::test]
async fn use_original_error_on_exhaustion() {
    let (executor, _, logger) = recording_executor();
    let config = RetryConfigBuilder::default()
        .max_attempts(2)
        .use_original_error(true)
        .build()
        .unwrap();
    let policy = RetryPolicy::new(config);

    let (result, calls) = run(&executor, &policy, usize::MAX, SnafuError::Custom).await;
    assert_eq!(calls, 3);
    match result.unwrap_err() {
        RetryError::Operation { source } => assert_eq!(source, SnafuError::Custom),
        other => panic!("unexpected error {:?}", other),
    }
    assert_eq!(logger.messages(), vec!["custom error".to_owned()]);
}

#[tokio::test]
async fn no_log_on_exhaustion() {
    let (executor, _, logger) = recording_executor();
    let config = RetryConfigBuilder::default()
        .max_attempts(2)
        .log_on_exhaustion(false)
        .build()
        .unwrap();
    let policy = RetryPolicy::new(config);

    let (result, calls) = run(&executor, &policy, usize::MAX, SnafuError::Rejected).await;
    assert_eq!(calls, 3);
    assert!(result.unwrap_err().is_exhausted());
    assert!(logger.messages().is_empty());
}

#[tokio::test]
async fn default_executor_retries_without_backoff() {
    let policy = RetryPolicy::new(RetryConfig::immediate(2));
    let calls = AtomicUsize::new(0);

    let result = retry_async(&policy, "myMethod", || {
        let call = calls.fetch_add(1, Ordering::SeqCst);
        async move {
            if call == 0 {
                Err(SnafuError::Rejected)
            } else {
                Ok("fulfilled")
            }
        }
    })
    .await;
    assert_eq!(result.unwrap(), "fulfilled");
    assert_eq!(calls.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn default_executor_sleeps_on_the_tokio_timer() {
    let policy = RetryPolicy::new(RetryConfig::fixed(2, Duration::from_millis(5)));
    let start = std::time::Instant::now();

    let result: Result<(), _> =
        retry_async(&policy, "myMethod", || async { Err(SnafuError::Rejected) }).await;
    assert!(result.unwrap_err().is_exhausted());
    assert!(start.elapsed() >= Duration::from_millis(10));
}

#[tokio::test]
async fn concurrent_invocations_are_independent() {
    let (executor, sleeper, _) = recording_executor();
    let config = RetryConfig::fixed(2, Duration::from_millis(1));
    let policy = Arc::new(RetryPolicy::<SnafuError>::new(config));

    let first = run(&executor, &policy, 1, SnafuError::Rejected);
    let second = run(&executor, &policy, usize::MAX, SnafuError::Custom);
    let ((first, first_calls), (second, second_calls)) = futures::join!(first, second);

    assert_eq!(first.unwrap(), 2);
    assert_eq!(first_calls, 2);
    assert_eq!(second.unwrap_err().retry_count(), Some(2));
    assert_eq!(second_calls, 3);
    assert_eq!(sleeper.delays().len(), 3);
}
