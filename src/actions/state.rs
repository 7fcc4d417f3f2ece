use chrono::{DateTime, Utc};
use serde::Serialize;

/// Published view of the action loop.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ActionScheduleState {
    pub base_interval_minutes: f64,
    pub is_running: bool,
    pub next_fire_at: Option<DateTime<Utc>>,
    pub execution_count: u64,
    pub last_action: Option<String>,
}

impl ActionScheduleState {
    /// e.g. `running, executed 3 times, next in 14m 7s`.
    pub fn status_line(&self, now: DateTime<Utc>) -> String {
        if !self.is_running {
            return if self.execution_count == 0 {
                "idle".to_string()
            } else {
                format!("stopped, executed {} times", self.execution_count)
            };
        }

        let prefix = format!("running, executed {} times", self.execution_count);
        match self.next_fire_at {
            Some(next) if next > now => {
                let remaining = (next - now).num_seconds();
                format!("{prefix}, next in {}m {}s", remaining / 60, remaining % 60)
            }
            Some(_) => format!("{prefix}, firing now"),
            None => format!("{prefix}, action in progress"),
        }
    }
}
