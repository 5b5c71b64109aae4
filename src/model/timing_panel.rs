use crate::client::{TimingReport, TimingStat};

#[derive(Clone, Debug, Default)]
pub struct TimingPanel {
    pub visible: bool,
    pub loading: bool,
    pub report: TimingReport,
    pub error: Option<String>,
}

impl TimingPanel {
    /// Opens the panel; returns true when a fresh report should be requested.
    pub fn open(&mut self) -> bool {
        if self.visible {
            return false;
        }
        self.visible = true;
        self.loading = true;
        self.error = None;
        true
    }

    pub fn close(&mut self) {
        self.visible = false;
        self.loading = false;
    }

    pub fn loaded(&mut self, report: TimingReport) {
        self.loading = false;
        self.error = None;
        self.report = report;
    }

    /// Keeps the previous report visible.
    pub fn failed(&mut self, message: String) {
        self.loading = false;
        self.error = Some(message);
    }

    pub fn lines(&self) -> Vec<(String, String)> {
        self.report
            .iter()
            .map(|(name, stat)| (name.clone(), describe(stat)))
            .collect()
    }
}

fn describe(stat: &TimingStat) -> String {
    format!(
        "{} calls · Avg: {:.2}s · Total: {:.2}s",
        stat.calls, stat.avg_time, stat.total_time
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn open_requests_once_until_closed() {
        let mut panel = TimingPanel::default();
        assert!(panel.open());
        assert!(panel.loading);
        assert!(!panel.open());
        panel.close();
        assert!(panel.open());
    }

    #[test]
    fn failure_keeps_previous_report() {
        let mut panel = TimingPanel::default();
        panel.open();
        let mut report = TimingReport::new();
        report.insert(
            "Universalis".into(),
            TimingStat {
                calls: 3,
                avg_time: 0.25,
                total_time: 0.75,
            },
        );
        panel.loaded(report);
        panel.close();
        panel.open();
        panel.failed("timeout".into());
        assert!(!panel.loading);
        assert_eq!(panel.error.as_deref(), Some("timeout"));
        assert_eq!(
            panel.lines(),
            vec![(
                "Universalis".to_string(),
                "3 calls · Avg: 0.25s · Total: 0.75s".to_string()
            )]
        );
    }
}
