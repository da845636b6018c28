//! Periodic status report.
//!
//! Logged every few seconds as one JSON line, for the serial console and
//! for anything scraping it.

use log::info;
use serde::Serialize;

use super::hub::LinkState;
use crate::scheduler::TaskInfo;

#[derive(Debug, Clone, Serialize)]
pub struct StatusReport<'a> {
    pub uptime_s: u32,
    pub link_connected: bool,
    /// Seconds the current central has been connected.
    pub link_connected_s: Option<u32>,
    /// A bridge payload is waiting for the radio task.
    pub bridge_pending: bool,
    pub ap_ssid: &'a str,
    /// Free heap, where the platform reports it.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub free_heap_bytes: Option<u32>,
    pub tasks: &'a [TaskInfo],
}

impl<'a> StatusReport<'a> {
    pub fn collect(
        now_ms: u32,
        link: &LinkState,
        bridge_pending: bool,
        ap_ssid: &'a str,
        tasks: &'a [TaskInfo],
    ) -> Self {
        Self {
            uptime_s: now_ms / 1000,
            link_connected: link.is_connected(),
            link_connected_s: link.connected_for_ms(now_ms).map(|ms| ms / 1000),
            bridge_pending,
            ap_ssid,
            free_heap_bytes: None,
            tasks,
        }
    }

    pub fn with_free_heap(mut self, bytes: u32) -> Self {
        self.free_heap_bytes = Some(bytes);
        self
    }

    pub fn log(&self) {
        match serde_json::to_string(self) {
            Ok(json) => info!("STATUS | {}", json),
            Err(e) => info!("STATUS | unserialisable: {}", e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scheduler::TaskName;

    #[test]
    fn report_serialises_link_and_tasks() {
        let link = LinkState::new();
        link.observe(true, 1_000);
        let tasks = [TaskInfo {
            name: TaskName::try_from("Inputs").unwrap(),
            interval_ms: 10,
            enabled: true,
            execution_count: 42,
            last_execution_ms: 5_990,
        }];

        let report = StatusReport::collect(6_500, &link, false, "Kroner", &tasks);
        let v: serde_json::Value = serde_json::to_value(&report).unwrap();
        assert_eq!(v["uptime_s"], 6);
        assert_eq!(v["link_connected"], true);
        assert_eq!(v["link_connected_s"], 5);
        assert_eq!(v["ap_ssid"], "Kroner");
        assert_eq!(v["tasks"][0]["name"], "Inputs");
        assert_eq!(v["tasks"][0]["execution_count"], 42);
        assert!(v.get("free_heap_bytes").is_none());
    }

    #[test]
    fn free_heap_is_reported_when_known() {
        let report = StatusReport::collect(1_000, &LinkState::new(), false, "Kroner", &[]).with_free_heap(181_240);
        let v = serde_json::to_value(&report).unwrap();
        assert_eq!(v["free_heap_bytes"], 181_240);
    }

    #[test]
    fn disconnected_link_has_no_duration() {
        let report = StatusReport::collect(1_000, &LinkState::new(), true, "Kroner", &[]);
        let v = serde_json::to_value(&report).unwrap();
        assert_eq!(v["link_connected_s"], serde_json::Value::Null);
        assert_eq!(v["bridge_pending"], true);
    }
}
