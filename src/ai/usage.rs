//! Process-local usage tracker for the AI subsystem. A field of the
//! client, not a module-level singleton; its lifecycle is tied to the run.

use parking_lot::Mutex;

#[derive(Debug, Clone, Copy)]
struct ModelPricing {
    input_per_mtok: f64,
    output_per_mtok: f64,
}

fn pricing_for(model: &str) -> ModelPricing {
    if model.contains("opus") {
        ModelPricing { input_per_mtok: 15.0, output_per_mtok: 75.0 }
    } else if model.contains("sonnet") {
        ModelPricing { input_per_mtok: 3.0, output_per_mtok: 15.0 }
    } else {
        ModelPricing { input_per_mtok: 0.8, output_per_mtok: 4.0 }
    }
}

#[derive(Debug, Clone, Default)]
pub struct UsageSummary {
    pub total_requests: u64,
    pub successful_requests: u64,
    pub failed_requests: u64,
    pub total_input_tokens: u64,
    pub total_output_tokens: u64,
    pub total_cost_usd: f64,
}

#[derive(Debug, Default)]
struct UsageState {
    total_requests: u64,
    failed_requests: u64,
    total_input_tokens: u64,
    total_output_tokens: u64,
    total_cost: f64,
}

pub struct UsageTracker {
    model: String,
    state: Mutex<UsageState>,
}

impl UsageTracker {
    pub fn new(model: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            state: Mutex::new(UsageState::default()),
        }
    }

    pub fn log_request(&self, input_tokens: u64, output_tokens: u64, success: bool) {
        let pricing = pricing_for(&self.model);
        let mut state = self.state.lock();
        state.total_requests += 1;
        if success {
            state.total_input_tokens += input_tokens;
            state.total_output_tokens += output_tokens;
            state.total_cost += input_tokens as f64 / 1_000_000.0 * pricing.input_per_mtok
                + output_tokens as f64 / 1_000_000.0 * pricing.output_per_mtok;
        } else {
            state.failed_requests += 1;
        }
    }

    pub fn summary(&self) -> UsageSummary {
        let state = self.state.lock();
        UsageSummary {
            total_requests: state.total_requests,
            successful_requests: state.total_requests - state.failed_requests,
            failed_requests: state.failed_requests,
            total_input_tokens: state.total_input_tokens,
            total_output_tokens: state.total_output_tokens,
            total_cost_usd: (state.total_cost * 10_000.0).round() / 10_000.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn successful_request_accumulates_cost() {
        let tracker = UsageTracker::new("claude-opus-4");
        tracker.log_request(1_000_000, 1_000_000, true);
        let summary = tracker.summary();
        assert_eq!(summary.total_cost_usd, 90.0);
        assert_eq!(summary.successful_requests, 1);
    }

    #[test]
    fn failed_request_does_not_accumulate_tokens() {
        let tracker = UsageTracker::new("claude-opus-4");
        tracker.log_request(500, 500, false);
        let summary = tracker.summary();
        assert_eq!(summary.total_input_tokens, 0);
        assert_eq!(summary.failed_requests, 1);
    }
}
