use crate::stream::Heartbeat;
use std::time::Duration;

/// Chart time window selected in the statistics views.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Zoom {
    Minute,
    Hour,
    Day,
    Week,
    Month,
}

impl Zoom {
    /// Parse a scenario route parameter. Unknown values fall back to the
    /// hour window.
    pub fn parse(value: &str) -> Zoom {
        match value {
            "minute" => Zoom::Minute,
            "hour" => Zoom::Hour,
            "day" => Zoom::Day,
            "week" => Zoom::Week,
            "month" => Zoom::Month,
            _ => Zoom::Hour,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Zoom::Minute => "minute",
            Zoom::Hour => "hour",
            Zoom::Day => "day",
            Zoom::Week => "week",
            Zoom::Month => "month",
        }
    }
}

/// Poll period appropriate for a zoom window. Only the minute window
/// polls at an accelerated rate.
pub fn default_zoom_interval(zoom: Zoom) -> Duration {
    match zoom {
        Zoom::Minute => Duration::from_secs(5),
        Zoom::Hour => Duration::from_secs(60),
        Zoom::Day => Duration::from_secs(300),
        Zoom::Week => Duration::from_secs(600),
        Zoom::Month => Duration::from_secs(1800),
    }
}

/// The admin statistics poller shared by every statistics view.
///
/// Views never own it; they adjust its heartbeat for their zoom window
/// and must restore the previous cadence when they leave.
#[derive(Clone)]
pub struct StatsPoller {
    heartbeat: Heartbeat,
}

impl StatsPoller {
    pub fn new() -> Self {
        Self {
            heartbeat: Heartbeat::new(default_zoom_interval(Zoom::Minute)),
        }
    }

    pub fn heartbeat(&self) -> &Heartbeat {
        &self.heartbeat
    }

    pub fn set_zoom_interval(&self, zoom: Zoom) {
        self.heartbeat.set_interval(default_zoom_interval(zoom));
    }

    pub fn reload(&self) {
        self.heartbeat.reload();
    }
}

impl Default for StatsPoller {
    fn default() -> Self {
        Self::new()
    }
}
