//! Token usage and timing accumulation for a single streamed completion

use std::time::{Duration, Instant};

use super::{CompletionMetadata, Usage};

/// Completion tokens per second, or `None` when it cannot be computed
/// without producing NaN or infinity.
pub fn tokens_per_second(completion_tokens: Option<u32>, elapsed: Duration) -> Option<f64> {
    let tokens = completion_tokens?;
    let seconds = elapsed.as_secs_f64();

    if seconds <= 0.0 {
        return None;
    }

    let speed = f64::from(tokens) / seconds;
    speed.is_finite().then_some(speed)
}

/// Per-call accumulator, owned by the orchestrator for the lifetime of one stream
#[derive(Debug)]
pub struct UsageAccumulator {
    started_at: Instant,
    usage: Option<Usage>,
    thinking: String,
}

impl UsageAccumulator {
    pub fn start() -> Self {
        Self::started_at(Instant::now())
    }

    pub fn started_at(started_at: Instant) -> Self {
        Self {
            started_at,
            usage: None,
            thinking: String::new(),
        }
    }

    pub fn record_usage(&mut self, usage: Usage) {
        if usage.is_empty() {
            return;
        }

        self.usage = Some(match self.usage {
            Some(existing) => existing.merge(usage),
            None => usage,
        });
    }

    pub fn record_reasoning(&mut self, text: &str) {
        self.thinking.push_str(text);
    }

    pub fn usage(&self) -> Option<Usage> {
        self.usage
    }

    pub fn finish(self) -> CompletionMetadata {
        let elapsed = self.started_at.elapsed();
        self.finish_after(elapsed)
    }

    /// Finalize with an explicit elapsed duration
    pub fn finish_after(self, elapsed: Duration) -> CompletionMetadata {
        let speed = self
            .usage
            .and_then(|u| tokens_per_second(u.completion_tokens, elapsed));

        CompletionMetadata {
            usage: self.usage,
            speed,
            thinking: (!self.thinking.is_empty()).then_some(self.thinking),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tokens_per_second() {
        let speed = tokens_per_second(Some(50), Duration::from_secs(2)).unwrap();
        assert!((speed - 25.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_speed_guard_zero_elapsed() {
        assert_eq!(tokens_per_second(Some(50), Duration::ZERO), None);
    }

    #[test]
    fn test_speed_guard_missing_tokens() {
        assert_eq!(tokens_per_second(None, Duration::from_secs(1)), None);
    }

    #[test]
    fn test_finish_without_usage() {
        let metadata = UsageAccumulator::start().finish_after(Duration::from_secs(1));
        assert!(metadata.is_empty());
    }

    #[test]
    fn test_finish_with_usage_and_thinking() {
        let mut acc = UsageAccumulator::start();
        acc.record_reasoning("Let me ");
        acc.record_reasoning("think.");
        acc.record_usage(Usage::new(3, 7));

        let metadata = acc.finish_after(Duration::from_millis(500));

        assert_eq!(metadata.usage.unwrap().total_tokens, Some(10));
        assert!((metadata.speed.unwrap() - 14.0).abs() < 1e-9);
        assert_eq!(metadata.thinking.as_deref(), Some("Let me think."));
    }

    #[test]
    fn test_usage_observations_merge() {
        let mut acc = UsageAccumulator::start();
        acc.record_usage(Usage {
            prompt_tokens: Some(8),
            ..Usage::default()
        });
        acc.record_usage(Usage::default());
        acc.record_usage(Usage {
            completion_tokens: Some(2),
            total_tokens: Some(10),
            ..Usage::default()
        });

        assert_eq!(acc.usage(), Some(Usage::new(8, 2)));
    }

    #[test]
    fn test_zero_elapsed_leaves_speed_undefined() {
        let mut acc = UsageAccumulator::start();
        acc.record_usage(Usage::new(1, 1));

        let metadata = acc.finish_after(Duration::ZERO);
        assert!(metadata.usage.is_some());
        assert_eq!(metadata.speed, None);
    }
}
