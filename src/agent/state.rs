use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Performance metrics for monitoring
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PerformanceMetrics {
    pub total_tasks: u64,
    pub successful_tasks: u64,
    pub failed_tasks: u64,
    pub average_response_time_ms: f64,
    pub total_tokens_used: u64,
    pub tool_usage_stats: HashMap<String, ToolUsageStats>,
    pub last_activity: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ToolUsageStats {
    pub usage_count: u64,
    pub success_count: u64,
    pub failure_count: u64,
    pub average_execution_time_ms: f64,
    pub last_used: Option<DateTime<Utc>>,
}

impl PerformanceMetrics {
    pub fn new() -> Self {
        Self {
            total_tasks: 0,
            successful_tasks: 0,
            failed_tasks: 0,
            average_response_time_ms: 0.0,
            total_tokens_used: 0,
            tool_usage_stats: HashMap::new(),
            last_activity: None,
        }
    }

    pub fn record_task_completion(&mut self, success: bool, response_time_ms: f64, tokens_used: u32) {
        self.total_tasks += 1;
        if success {
            self.successful_tasks += 1;
        } else {
            self.failed_tasks += 1;
        }

        self.average_response_time_ms =
            running_average(self.average_response_time_ms, self.total_tasks, response_time_ms);
        self.total_tokens_used += tokens_used as u64;
        self.last_activity = Some(Utc::now());
    }

    pub fn record_tool_usage(&mut self, tool_name: &str, success: bool, execution_time_ms: f64) {
        let stats = self.tool_usage_stats.entry(tool_name.to_string()).or_default();

        stats.usage_count += 1;
        if success {
            stats.success_count += 1;
        } else {
            stats.failure_count += 1;
        }
        stats.average_execution_time_ms =
            running_average(stats.average_execution_time_ms, stats.usage_count, execution_time_ms);
        stats.last_used = Some(Utc::now());
    }

    pub fn get_success_rate(&self) -> f64 {
        if self.total_tasks == 0 {
            0.0
        } else {
            self.successful_tasks as f64 / self.total_tasks as f64
        }
    }
}

// `count` already includes `sample`
fn running_average(previous: f64, count: u64, sample: f64) -> f64 {
    previous + (sample - previous) / count as f64
}

impl Default for PerformanceMetrics {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_task_completion_averages() {
        let mut metrics = PerformanceMetrics::new();
        metrics.record_task_completion(true, 100.0, 10);
        metrics.record_task_completion(false, 300.0, 30);

        assert_eq!(metrics.total_tasks, 2);
        assert_eq!(metrics.failed_tasks, 1);
        assert_eq!(metrics.average_response_time_ms, 200.0);
        assert_eq!(metrics.total_tokens_used, 40);
        assert_eq!(metrics.get_success_rate(), 0.5);
    }

    #[test]
    fn test_tool_usage_stats() {
        let mut metrics = PerformanceMetrics::new();
        metrics.record_tool_usage("web_search", true, 10.0);
        metrics.record_tool_usage("web_search", false, 30.0);

        let stats = &metrics.tool_usage_stats["web_search"];
        assert_eq!(stats.usage_count, 2);
        assert_eq!(stats.failure_count, 1);
        assert_eq!(stats.average_execution_time_ms, 20.0);
        assert!(stats.last_used.is_some());
    }
}
