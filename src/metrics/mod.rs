use crate::logging::{LogEvent, LogFields, LogLevel};
use serde_json::json;
use std::time::Duration;

/// Per-session counters accumulated by the frame loop.
#[derive(Debug, Default, Clone)]
pub struct FrameMetrics {
    frames: u64,
    events_routed: u64,
    layout_passes: u64,
    nodes_pruned: u64,
    arbitration_passes: u64,
    focus_changes: u64,
}

impl FrameMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_frame(&mut self) {
        self.frames = self.frames.saturating_add(1);
    }

    pub fn record_events_routed(&mut self, count: usize) {
        if count > 0 {
            self.events_routed = self.events_routed.saturating_add(count as u64);
        }
    }

    pub fn record_layout_pass(&mut self) {
        self.layout_passes = self.layout_passes.saturating_add(1);
    }

    pub fn record_pruned(&mut self, count: usize) {
        if count > 0 {
            self.nodes_pruned = self.nodes_pruned.saturating_add(count as u64);
        }
    }

    pub fn record_arbitration(&mut self) {
        self.arbitration_passes = self.arbitration_passes.saturating_add(1);
    }

    pub fn record_focus_change(&mut self) {
        self.focus_changes = self.focus_changes.saturating_add(1);
    }

    pub fn snapshot(&self, uptime: Duration) -> MetricSnapshot {
        MetricSnapshot {
            uptime_ms: uptime.as_millis() as u64,
            frames: self.frames,
            events_routed: self.events_routed,
            layout_passes: self.layout_passes,
            nodes_pruned: self.nodes_pruned,
            arbitration_passes: self.arbitration_passes,
            focus_changes: self.focus_changes,
        }
    }
}

#[derive(Debug, Clone)]
pub struct MetricSnapshot {
    pub uptime_ms: u64,
    pub frames: u64,
    pub events_routed: u64,
    pub layout_passes: u64,
    pub nodes_pruned: u64,
    pub arbitration_passes: u64,
    pub focus_changes: u64,
}

impl MetricSnapshot {
    pub fn to_log_event(&self, target: &str) -> LogEvent {
        LogEvent::with_fields(
            LogLevel::Info,
            target.to_string(),
            "frame_metrics".to_string(),
            self.as_fields(),
        )
    }

    pub fn as_fields(&self) -> LogFields {
        let mut map = LogFields::new();
        map.insert("uptime_ms".to_string(), json!(self.uptime_ms));
        map.insert("frames".to_string(), json!(self.frames));
        map.insert("events_routed".to_string(), json!(self.events_routed));
        map.insert("layout_passes".to_string(), json!(self.layout_passes));
        map.insert("nodes_pruned".to_string(), json!(self.nodes_pruned));
        map.insert(
            "arbitration_passes".to_string(),
            json!(self.arbitration_passes),
        );
        map.insert("focus_changes".to_string(), json!(self.focus_changes));
        map
    }
}
