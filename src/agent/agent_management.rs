use crate::agent::agent::Agent;
use crate::agent::state::PerformanceMetrics;
use crate::tools::Tool;

impl Agent {
    pub fn get_id(&self) -> &str { &self.id }
    pub fn get_role(&self) -> &str { &self.role }
    pub fn get_tools(&self) -> &[std::sync::Arc<dyn Tool>] { &self.tools }

    pub fn has_tool(&self, tool_name: &str) -> bool {
        self.tools.iter().any(|t| t.name() == tool_name)
    }

    /// Snapshot of the agent's metrics
    pub fn get_performance_metrics(&self) -> PerformanceMetrics {
        self.metrics.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    pub fn get_success_rate(&self) -> f64 {
        self.get_performance_metrics().get_success_rate()
    }

    pub fn reset_metrics(&self) {
        *self.metrics.lock().unwrap_or_else(|e| e.into_inner()) = PerformanceMetrics::new();
    }

    pub fn get_status_summary(&self) -> String {
        let metrics = self.get_performance_metrics();
        format!(
            "{} - Tasks: {}/{}, Success Rate: {:.1}%, Tokens: {}",
            self.role,
            metrics.successful_tasks,
            metrics.total_tasks,
            metrics.get_success_rate() * 100.0,
            metrics.total_tokens_used
        )
    }
}
