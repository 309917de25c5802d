use crate::gate::RedrawGate;
use crate::surface::TraySurface;
use diskicon_config::Config;
use diskicon_core::{MetricSource, MovingAverage, TrayEvent};
use diskicon_graph::{draw_graph, status_label};
use std::time::Instant;
use tracing::{debug, warn};

/// Samples held by the fast (per-tick) smoothing window.
pub const FAST_WINDOW: usize = 10;
/// Samples held by the graph history; one bar per sample.
pub const GRAPH_WINDOW: usize = 30;

/// Whether the graph window is currently shown.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Visibility {
    Hidden,
    Visible,
}

/// Drives the sampling/rendering pipeline and the tray surface.
///
/// All state that used to be scattered per-tick lives here: the two cascaded
/// averages, the redraw gate, the visibility state machine, and the icon
/// slot holding the one live native handle.
pub struct Presenter<M, S: TraySurface> {
    metric: M,
    surface: S,
    /// Smooths raw per-tick counter readings.
    fast: MovingAverage,
    /// Per-second smoothed values; this is what the graph draws.
    slow: MovingAverage,
    gate: RedrawGate,
    visibility: Visibility,
    hide_on_minimize: bool,
    /// The currently installed icon. Replaced (and thereby released) only
    /// after a successor has been installed.
    live_icon: Option<S::Icon>,
}

impl<M: MetricSource, S: TraySurface> Presenter<M, S> {
    pub fn new(metric: M, surface: S, config: &Config, now: Instant) -> Self {
        Self {
            metric,
            surface,
            fast: MovingAverage::new(FAST_WINDOW),
            slow: MovingAverage::new(GRAPH_WINDOW),
            gate: RedrawGate::new(config.graph_interval(), now),
            visibility: if config.start_visible {
                Visibility::Visible
            } else {
                Visibility::Hidden
            },
            hide_on_minimize: config.hide_on_minimize,
            live_icon: None,
        }
    }

    /// Apply the startup visibility and draw the initial (empty) graph so
    /// the tray never shows a blank icon.
    pub fn start(&mut self) {
        if self.visibility == Visibility::Visible {
            self.surface.set_window_visible(true);
        }
        self.redraw();
    }

    /// One sampling tick: pull a reading, feed the fast window, and push a
    /// graph sample + redraw when the gate fires.
    ///
    /// A failed read skips the tick instead of taking the process down.
    pub fn tick(&mut self, now: Instant) {
        match self.metric.sample() {
            Ok(value) => self.fast.push(value),
            Err(e) => {
                warn!("Metric read failed; skipping tick: {e}");
                return;
            }
        }

        if self.gate.poll(now) {
            self.slow.push(self.fast.average());
            self.redraw();
        }
    }

    /// Dispatch a tray/window event.
    pub fn handle(&mut self, event: TrayEvent) {
        match event {
            TrayEvent::Tick => self.tick(Instant::now()),
            TrayEvent::ShowRequested => self.show(),
            TrayEvent::Minimized => self.minimized(),
            TrayEvent::Restored => self.restored(),
            TrayEvent::HideOnMinimizeToggled(on) => {
                debug!("Hide on minimize: {on}");
                self.hide_on_minimize = on;
            }
            // Teardown belongs to the event loop owner.
            TrayEvent::QuitRequested => {}
        }
    }

    pub fn visibility(&self) -> Visibility {
        self.visibility
    }

    pub fn surface_mut(&mut self) -> &mut S {
        &mut self.surface
    }

    /// Render the graph history, install the new icon, then release the old
    /// handle. If installation fails the old icon stays live and the fresh
    /// handle is released instead.
    fn redraw(&mut self) {
        let canvas = draw_graph(&self.slow);

        match self.surface.create_icon(&canvas) {
            Ok(icon) => match self.surface.install_icon(&icon) {
                Ok(()) => {
                    // Dropping the previous handle here keeps exactly one
                    // icon live across every redraw.
                    self.live_icon = Some(icon);
                }
                Err(e) => warn!("Icon install failed: {e}"),
            },
            Err(e) => warn!("Icon creation failed: {e}"),
        }

        if let Err(e) = self.surface.set_tooltip(&status_label(self.fast.average())) {
            warn!("Tooltip update failed: {e}");
        }

        if self.visibility == Visibility::Visible {
            if let Err(e) = self.surface.paint_window(&canvas) {
                warn!("Window paint failed: {e}");
            }
        }
    }

    fn show(&mut self) {
        self.visibility = Visibility::Visible;
        self.surface.set_window_visible(true);
    }

    fn minimized(&mut self) {
        if self.hide_on_minimize {
            self.visibility = Visibility::Hidden;
            self.surface.set_window_visible(false);
        }
    }

    fn restored(&mut self) {
        if self.visibility == Visibility::Hidden {
            self.show();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use diskicon_core::{Error, Result};
    use diskicon_graph::Canvas;
    use std::cell::RefCell;
    use std::rc::Rc;
    use std::time::Duration;

    // ── Test doubles ──────────────────────────────────────────────────────

    #[derive(Default)]
    struct SurfaceLog {
        icons_created: usize,
        icons_released: usize,
        installs: usize,
        fail_install: bool,
        tooltips: Vec<String>,
        window_visible: bool,
        paints: usize,
    }

    struct StubIcon {
        log: Rc<RefCell<SurfaceLog>>,
    }

    impl Drop for StubIcon {
        fn drop(&mut self) {
            self.log.borrow_mut().icons_released += 1;
        }
    }

    struct StubSurface {
        log: Rc<RefCell<SurfaceLog>>,
    }

    impl TraySurface for StubSurface {
        type Icon = StubIcon;

        fn create_icon(&mut self, _canvas: &Canvas) -> Result<StubIcon> {
            self.log.borrow_mut().icons_created += 1;
            Ok(StubIcon {
                log: Rc::clone(&self.log),
            })
        }

        fn install_icon(&mut self, _icon: &StubIcon) -> Result<()> {
            if self.log.borrow().fail_install {
                return Err(Error::Tray("install refused".into()));
            }
            self.log.borrow_mut().installs += 1;
            Ok(())
        }

        fn set_tooltip(&mut self, text: &str) -> Result<()> {
            self.log.borrow_mut().tooltips.push(text.to_string());
            Ok(())
        }

        fn set_window_visible(&mut self, visible: bool) {
            self.log.borrow_mut().window_visible = visible;
        }

        fn paint_window(&mut self, _canvas: &Canvas) -> Result<()> {
            self.log.borrow_mut().paints += 1;
            Ok(())
        }
    }

    struct ConstMetric(f32);

    impl MetricSource for ConstMetric {
        fn sample(&mut self) -> Result<f32> {
            Ok(self.0)
        }
    }

    struct FailingMetric;

    impl MetricSource for FailingMetric {
        fn sample(&mut self) -> Result<f32> {
            Err(Error::Metric("counter gone".into()))
        }
    }

    fn presenter_with<M: MetricSource>(
        metric: M,
        config: Config,
        now: Instant,
    ) -> (Presenter<M, StubSurface>, Rc<RefCell<SurfaceLog>>) {
        let log = Rc::new(RefCell::new(SurfaceLog::default()));
        let surface = StubSurface {
            log: Rc::clone(&log),
        };
        (Presenter::new(metric, surface, &config, now), log)
    }

    fn second(n: u64) -> Duration {
        Duration::from_secs(n)
    }

    // ── Pipeline ──────────────────────────────────────────────────────────

    #[test]
    fn startup_draws_the_empty_graph() {
        let start = Instant::now();
        let (mut p, log) = presenter_with(ConstMetric(0.0), Config::default(), start);
        p.start();
        let log = log.borrow();
        assert_eq!(log.icons_created, 1);
        assert_eq!(log.installs, 1);
        assert_eq!(log.tooltips, vec!["HDD: 0%".to_string()]);
        assert!(!log.window_visible);
    }

    #[test]
    fn graph_sample_waits_for_the_gate() {
        let start = Instant::now();
        let (mut p, log) = presenter_with(ConstMetric(50.0), Config::default(), start);
        p.start();

        p.tick(start + Duration::from_millis(100));
        p.tick(start + Duration::from_millis(200));
        assert_eq!(p.slow.len(), 0);
        assert_eq!(p.fast.len(), 2);
        assert_eq!(log.borrow().icons_created, 1); // only the startup draw

        p.tick(start + second(1));
        assert_eq!(p.slow.len(), 1);
        assert_eq!(p.slow.average(), 50.0);
        assert_eq!(log.borrow().icons_created, 2);
    }

    #[test]
    fn tooltip_reports_the_fast_average() {
        let start = Instant::now();
        let (mut p, log) = presenter_with(ConstMetric(37.5), Config::default(), start);
        p.start();
        p.tick(start + second(1));
        assert_eq!(log.borrow().tooltips.last().unwrap(), "HDD: 37.5%");
    }

    #[test]
    fn failed_reads_skip_the_tick() {
        let start = Instant::now();
        let (mut p, log) = presenter_with(FailingMetric, Config::default(), start);
        p.start();
        for i in 1..=5 {
            p.tick(start + second(i));
        }
        assert_eq!(p.fast.len(), 0);
        assert_eq!(p.slow.len(), 0);
        // No redraws beyond the startup one.
        assert_eq!(log.borrow().icons_created, 1);
    }

    // ── Icon handle accounting ────────────────────────────────────────────

    #[test]
    fn exactly_one_icon_stays_live_across_redraws() {
        let start = Instant::now();
        let (mut p, log) = presenter_with(ConstMetric(20.0), Config::default(), start);
        p.start();
        for i in 1..=9 {
            p.tick(start + second(i));
        }
        let log = log.borrow();
        assert_eq!(log.icons_created, 10);
        assert_eq!(log.icons_released, 9);
        assert_eq!(log.icons_created - log.icons_released, 1);
    }

    #[test]
    fn failed_install_keeps_the_previous_icon_live() {
        let start = Instant::now();
        let (mut p, log) = presenter_with(ConstMetric(20.0), Config::default(), start);
        p.start();

        log.borrow_mut().fail_install = true;
        p.tick(start + second(1));

        let snapshot = {
            let log = log.borrow();
            (log.icons_created, log.icons_released, log.installs)
        };
        // The fresh handle was released, the startup one is still live.
        assert_eq!(snapshot, (2, 1, 1));

        log.borrow_mut().fail_install = false;
        p.tick(start + second(2));
        let log = log.borrow();
        assert_eq!(log.installs, 2);
        assert_eq!(log.icons_created - log.icons_released, 1);
    }

    // ── Window / visibility state machine ─────────────────────────────────

    #[test]
    fn starts_visible_when_configured() {
        let start = Instant::now();
        let config = Config {
            start_visible: true,
            ..Config::default()
        };
        let (mut p, log) = presenter_with(ConstMetric(0.0), config, start);
        p.start();
        assert_eq!(p.visibility(), Visibility::Visible);
        assert!(log.borrow().window_visible);
    }

    #[test]
    fn show_request_makes_the_window_visible() {
        let start = Instant::now();
        let (mut p, log) = presenter_with(ConstMetric(0.0), Config::default(), start);
        p.start();
        assert_eq!(p.visibility(), Visibility::Hidden);

        p.handle(TrayEvent::ShowRequested);
        assert_eq!(p.visibility(), Visibility::Visible);
        assert!(log.borrow().window_visible);
    }

    #[test]
    fn minimize_hides_when_toggle_is_on() {
        let start = Instant::now();
        let config = Config {
            start_visible: true,
            ..Config::default()
        };
        let (mut p, log) = presenter_with(ConstMetric(0.0), config, start);
        p.start();

        p.handle(TrayEvent::Minimized);
        assert_eq!(p.visibility(), Visibility::Hidden);
        assert!(!log.borrow().window_visible);
    }

    #[test]
    fn minimize_keeps_the_window_when_toggle_is_off() {
        let start = Instant::now();
        let config = Config {
            start_visible: true,
            hide_on_minimize: false,
            ..Config::default()
        };
        let (mut p, log) = presenter_with(ConstMetric(0.0), config, start);
        p.start();

        p.handle(TrayEvent::Minimized);
        assert_eq!(p.visibility(), Visibility::Visible);
        assert!(log.borrow().window_visible);
    }

    #[test]
    fn toggle_takes_effect_on_the_next_minimize() {
        let start = Instant::now();
        let config = Config {
            start_visible: true,
            ..Config::default()
        };
        let (mut p, _log) = presenter_with(ConstMetric(0.0), config, start);
        p.start();

        p.handle(TrayEvent::HideOnMinimizeToggled(false));
        p.handle(TrayEvent::Minimized);
        assert_eq!(p.visibility(), Visibility::Visible);

        p.handle(TrayEvent::HideOnMinimizeToggled(true));
        p.handle(TrayEvent::Minimized);
        assert_eq!(p.visibility(), Visibility::Hidden);
    }

    #[test]
    fn window_is_painted_only_while_visible() {
        let start = Instant::now();
        let (mut p, log) = presenter_with(ConstMetric(10.0), Config::default(), start);
        p.start();
        p.tick(start + second(1));
        assert_eq!(log.borrow().paints, 0);

        p.handle(TrayEvent::ShowRequested);
        p.tick(start + second(2));
        assert_eq!(log.borrow().paints, 1);
    }
}
