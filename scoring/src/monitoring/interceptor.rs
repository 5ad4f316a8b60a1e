use std::fmt::Display;
use std::future::Future;
use std::sync::Arc;
use std::time::Instant;

use common::logger::TraceId;
use tracing::{Instrument, error, info, info_span};

use super::marker::Operation;
use super::policy::TimingPolicy;
use super::summary::{ArgSummary, summarize};

/// Wraps service calls with structured entry/exit/error logging and, when
/// the [`TimingPolicy`] says so, latency measurement.
///
/// The interceptor only observes: arguments, return values and errors pass
/// through untouched.
#[derive(Clone)]
pub struct Interceptor {
    policy: Arc<TimingPolicy>,
}

impl Interceptor {
    pub fn new(policy: Arc<TimingPolicy>) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> &TimingPolicy {
        &self.policy
    }

    /// Runs `call` inside an `invocation` span. `call` is not polled before
    /// the entry line has been written.
    ///
    /// Arguments are rendered eagerly, so the returned future is `Send`
    /// whenever `call` is.
    pub fn intercept<T, E, Fut>(
        &self,
        operation: &'static Operation,
        args: &dyn ArgSummary,
        call: Fut,
    ) -> impl Future<Output = Result<T, E>> + use<T, E, Fut>
    where
        Fut: Future<Output = Result<T, E>>,
        E: Display,
    {
        let trace_id = TraceId::new();
        let span = info_span!("invocation", operation = %operation, trace_id = %trace_id);

        let record = InvocationRecord {
            operation,
            args: summarize(args),
            timing_enabled: self.policy.is_timing_enabled(operation),
            started: None,
        };

        async move {
            let record = record.enter();
            let outcome = call.await;

            match &outcome {
                Ok(value) => record.exit(describe_result(value)),
                Err(e) => record.fail(e),
            }

            outcome
        }
        .instrument(span)
    }
}

/// Per-call bookkeeping; lives for exactly one invocation.
struct InvocationRecord {
    operation: &'static Operation,
    args: String,
    timing_enabled: bool,
    started: Option<Instant>,
}

impl InvocationRecord {
    fn enter(mut self) -> Self {
        info!(
            event = "entry",
            operation = %self.operation,
            args = %self.args,
            "service entry"
        );

        if self.timing_enabled {
            self.started = Some(Instant::now());
        }
        self
    }

    fn elapsed_ms(&self) -> Option<u64> {
        self.started.map(|t| t.elapsed().as_millis() as u64)
    }

    fn exit(&self, result_type: String) {
        match self.elapsed_ms() {
            Some(duration_ms) => info!(
                event = "exit",
                operation = %self.operation,
                duration_ms,
                result_type = %result_type,
                "service exit"
            ),
            None => info!(
                event = "exit",
                operation = %self.operation,
                result_type = %result_type,
                "service exit (timing disabled)"
            ),
        }
    }

    fn fail(&self, e: &dyn Display) {
        match self.elapsed_ms() {
            Some(duration_ms) => error!(
                event = "error",
                operation = %self.operation,
                duration_ms,
                "{e}"
            ),
            None => error!(event = "error", operation = %self.operation, "{e}"),
        }
    }
}

/// Short runtime type name of a returned value, `none` for unit.
fn describe_result<T>(_: &T) -> String {
    let full = std::any::type_name::<T>();
    if full == "()" {
        return "none".to_string();
    }
    short_type_name(full)
}

/// Drops module paths: `alloc::vec::Vec<my::Thing>` becomes `Vec<Thing>`.
fn short_type_name(full: &str) -> String {
    let mut out = String::with_capacity(full.len());
    let mut segment_start = 0;
    let mut chars = full.chars().peekable();

    while let Some(c) = chars.next() {
        if c == ':' && chars.peek() == Some(&':') {
            chars.next();
            out.truncate(segment_start);
            continue;
        }
        out.push(c);
        if !(c.is_alphanumeric() || c == '_') {
            segment_start = out.len();
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use tracing_test::traced_test;

    use super::*;
    use crate::monitoring::marker::Component;

    static ORDERS: Component = Component::new("OrderService");
    static BILLING: Component = Component::new("BillingService");

    static PLACE: Operation = Operation::new(&ORDERS, "place");
    static CANCEL: Operation = Operation::new(&ORDERS, "cancel");
    static CHARGE: Operation = Operation::new(&BILLING, "charge");

    #[derive(Debug)]
    struct Order(u32);

    fn interceptor(policy: TimingPolicy) -> Interceptor {
        Interceptor::new(Arc::new(policy))
    }

    #[tokio::test]
    #[traced_test]
    async fn timed_operation_logs_duration_on_exit() {
        let i = interceptor(TimingPolicy::builder().monitor_operation(&PLACE).build());

        let out: Result<Order, String> = i.intercept(&PLACE, &"o-1", async { Ok(Order(1)) }).await;

        assert_eq!(out.unwrap().0, 1);
        assert!(logs_contain("service entry"));
        assert!(logs_contain(r#"args=["o-1"]"#));
        assert!(logs_contain("service exit"));
        assert!(logs_contain("duration_ms="));
        assert!(logs_contain("result_type=Order"));
        assert!(!logs_contain("timing disabled"));
    }

    #[tokio::test]
    #[traced_test]
    async fn untimed_operation_omits_duration() {
        let i = interceptor(TimingPolicy::builder().monitor_operation(&PLACE).build());

        let out: Result<(), String> = i.intercept(&CANCEL, &(), async { Ok(()) }).await;

        assert!(out.is_ok());
        assert!(logs_contain("service exit (timing disabled)"));
        assert!(logs_contain("result_type=none"));
        assert!(!logs_contain("duration_ms"));
    }

    #[tokio::test]
    #[traced_test]
    async fn component_marker_enables_timing() {
        let i = interceptor(TimingPolicy::builder().monitor_component(&BILLING).build());

        let _: Result<u64, String> = i.intercept(&CHARGE, &(), async { Ok(42) }).await;

        assert!(logs_contain("duration_ms="));
        assert!(logs_contain("result_type=u64"));
    }

    #[tokio::test]
    #[traced_test]
    async fn errors_are_logged_and_returned_unchanged() {
        let i = interceptor(TimingPolicy::builder().monitor_operation(&PLACE).build());

        let out: Result<Order, String> = i
            .intercept(&PLACE, &(), async { Err("inventory offline".to_string()) })
            .await;

        assert_eq!(out.unwrap_err(), "inventory offline");
        assert!(logs_contain(r#"event="error""#));
        assert!(logs_contain("inventory offline"));
        assert!(logs_contain("duration_ms="));
        assert!(!logs_contain("service exit"));
    }

    #[tokio::test]
    #[traced_test]
    async fn untimed_errors_have_no_duration() {
        let i = interceptor(TimingPolicy::disabled());

        let out: Result<(), String> = i
            .intercept(&CANCEL, &(), async { Err("nope".to_string()) })
            .await;

        assert!(out.is_err());
        assert!(logs_contain(r#"event="error""#));
        assert!(!logs_contain("duration_ms"));
    }

    #[tokio::test]
    #[traced_test]
    async fn entry_precedes_call_precedes_exit() {
        let i = interceptor(TimingPolicy::disabled());

        let _: Result<(), String> = i
            .intercept(&CANCEL, &(), async {
                tracing::info!("inside wrapped call");
                Ok(())
            })
            .await;

        logs_assert(|lines: &[&str]| {
            let pos = |needle: &str| {
                lines
                    .iter()
                    .position(|l| l.contains(needle))
                    .ok_or_else(|| format!("missing line: {needle}"))
            };
            let entry = pos("service entry")?;
            let inside = pos("inside wrapped call")?;
            let exit = pos("service exit")?;
            if entry < inside && inside < exit {
                Ok(())
            } else {
                Err(format!("bad order: {entry} {inside} {exit}"))
            }
        });
    }

    #[tokio::test]
    #[traced_test]
    async fn measured_duration_reflects_the_call() {
        let i = interceptor(TimingPolicy::builder().monitor_operation(&PLACE).build());

        let _: Result<(), String> = i
            .intercept(&PLACE, &(), async {
                tokio::time::sleep(Duration::from_millis(20)).await;
                Ok(())
            })
            .await;

        logs_assert(|lines: &[&str]| {
            let exit = lines
                .iter()
                .find(|l| l.contains("service exit"))
                .ok_or("no exit line")?;
            let ms: u64 = exit
                .split("duration_ms=")
                .nth(1)
                .and_then(|rest| rest.split_whitespace().next())
                .and_then(|v| v.parse().ok())
                .ok_or("no duration field")?;
            if ms >= 20 {
                Ok(())
            } else {
                Err(format!("duration too small: {ms}"))
            }
        });
    }

    #[test]
    fn type_names_are_shortened() {
        assert_eq!(short_type_name("scoring::model::ScoreResult"), "ScoreResult");
        assert_eq!(
            short_type_name("alloc::vec::Vec<scoring::model::ScoreResult>"),
            "Vec<ScoreResult>"
        );
        assert_eq!(
            short_type_name("core::option::Option<alloc::string::String>"),
            "Option<String>"
        );
        assert_eq!(describe_result(&()), "none");
        assert_eq!(describe_result(&7u64), "u64");
    }
}
