use crate::stats::{StatsPoller, Zoom};

/// View model of the detailed (full-size) statistics chart.
///
/// Opening the chart speeds the shared stats poller up to match the
/// selected zoom window. Leaving it must hand the poller back at the
/// route's cadence, whichever way the view is torn down, or the
/// accelerated rate leaks into unrelated views; dropping the controller
/// performs that restore and forces a reload.
pub struct DetailedChartController {
    poller: StatsPoller,
    /// Zoom from the scenario route, restored on exit.
    route_zoom: Zoom,
    pub zoom: Zoom,
    pub show_focus: bool,
    reload_chart: bool,
}

impl DetailedChartController {
    /// `scenario_zoom` is the raw route parameter. A minute-level route
    /// opens the chart at the hour window; minute stays reachable through
    /// the zoom selector.
    pub fn new(poller: StatsPoller, scenario_zoom: &str) -> Self {
        let route_zoom = Zoom::parse(scenario_zoom);
        let zoom = if route_zoom == Zoom::Minute {
            Zoom::Hour
        } else {
            route_zoom
        };
        poller.set_zoom_interval(zoom);
        Self {
            poller,
            route_zoom,
            zoom,
            show_focus: true,
            reload_chart: false,
        }
    }

    pub fn on_select_zoom(&mut self, zoom: Zoom) {
        self.zoom = zoom;
        self.show_focus = zoom != Zoom::Minute;
        self.poller.set_zoom_interval(zoom);
        self.reload_chart = true;
    }

    /// One-shot flag the chart directive consumes to re-render after a
    /// zoom change.
    pub fn take_reload_chart(&mut self) -> bool {
        std::mem::take(&mut self.reload_chart)
    }
}

impl Drop for DetailedChartController {
    fn drop(&mut self) {
        self.poller.set_zoom_interval(self.route_zoom);
        self.poller.reload();
    }
}
