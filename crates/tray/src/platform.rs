//! Thin adapter binding the presenter to winit, tray-icon and softbuffer.
//!
//! Everything here is event plumbing: the tick cadence comes from
//! `ControlFlow::WaitUntil`, tray menu and icon events are forwarded into
//! the loop through an [`EventLoopProxy`], and the window blit stretches the
//! 32×32 canvas over the client rectangle.

use crate::presenter::Presenter;
use crate::surface::TraySurface;
use diskicon_config::Config;
use diskicon_core::{Error, Result, TrayEvent};
use diskicon_graph::{Canvas, HEIGHT, WIDTH};
use diskicon_system::DiskActivity;
use std::num::NonZeroU32;
use std::rc::Rc;
use std::time::{Duration, Instant};
use tracing::{error, info, warn};
use tray_icon::{
    menu::{CheckMenuItem, Menu, MenuEvent, MenuId, MenuItem, PredefinedMenuItem},
    TrayIcon, TrayIconBuilder, TrayIconEvent,
};
use winit::{
    application::ApplicationHandler,
    dpi::LogicalSize,
    event::{StartCause, WindowEvent},
    event_loop::{ActiveEventLoop, ControlFlow, EventLoop, EventLoopProxy},
    window::{Window, WindowId},
};

const MENU_SHOW: &str = "show";
const MENU_HIDE_ON_MINIMIZE: &str = "hide-on-minimize";
const MENU_QUIT: &str = "quit";

const WINDOW_TITLE: &str = "Disk Activity";
const WINDOW_SIZE: LogicalSize<f64> = LogicalSize::new(247.0, 218.0);

/// Raw toolkit events forwarded into the winit loop from the tray handlers.
#[derive(Debug)]
enum UserEvent {
    Menu(MenuId),
    Tray(TrayIconEvent),
}

/// Open the metric source and run the event loop until quit.
pub fn run(config: Config) -> Result<()> {
    let metric = DiskActivity::open()
        .inspect_err(|e| error!("Cannot open disk activity counters: {e}"))?;

    let event_loop = EventLoop::<UserEvent>::with_user_event()
        .build()
        .map_err(|e| Error::Tray(format!("cannot create event loop: {e}")))?;

    let menu_proxy = event_loop.create_proxy();
    MenuEvent::set_event_handler(Some(move |event: MenuEvent| {
        let _ = menu_proxy.send_event(UserEvent::Menu(event.id));
    }));
    let tray_proxy = event_loop.create_proxy();
    TrayIconEvent::set_event_handler(Some(move |event: TrayIconEvent| {
        let _ = tray_proxy.send_event(UserEvent::Tray(event));
    }));

    let mut app = App::new(config, metric);
    event_loop
        .run_app(&mut app)
        .map_err(|e| Error::Tray(format!("event loop failed: {e}")))
}

// ── Application ───────────────────────────────────────────────────────────────

struct App {
    config: Config,
    tick_interval: Duration,
    /// Taken when the presenter is assembled on the first `resumed`.
    metric: Option<DiskActivity>,
    presenter: Option<Presenter<DiskActivity, PlatformSurface>>,
    /// Kept so the checkbox state can be queried when its menu event fires.
    hide_item: Option<CheckMenuItem>,
}

impl App {
    fn new(config: Config, metric: DiskActivity) -> Self {
        let tick_interval = config.tick_interval();
        Self {
            config,
            tick_interval,
            metric: Some(metric),
            presenter: None,
            hide_item: None,
        }
    }

    fn setup(&mut self, event_loop: &ActiveEventLoop) -> Result<()> {
        let Some(metric) = self.metric.take() else {
            return Ok(());
        };

        let attrs = Window::default_attributes()
            .with_title(WINDOW_TITLE)
            .with_inner_size(WINDOW_SIZE)
            .with_visible(self.config.start_visible);
        let window = Rc::new(
            event_loop
                .create_window(attrs)
                .map_err(|e| Error::Tray(format!("cannot create window: {e}")))?,
        );

        let (menu, hide_item) = build_menu(self.config.hide_on_minimize)?;
        let tray = TrayIconBuilder::new()
            .with_menu(Box::new(menu))
            .build()
            .map_err(|e| Error::Tray(format!("cannot create tray icon: {e}")))?;

        let surface = PlatformSurface::new(tray, window)?;
        let mut presenter = Presenter::new(metric, surface, &self.config, Instant::now());
        presenter.start();

        self.presenter = Some(presenter);
        self.hide_item = Some(hide_item);
        info!("Tray icon ready; sampling every {:?}", self.tick_interval);
        Ok(())
    }
}

impl ApplicationHandler<UserEvent> for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.presenter.is_some() {
            return;
        }
        if let Err(e) = self.setup(event_loop) {
            error!("Startup failed: {e}");
            event_loop.exit();
        }
    }

    fn new_events(&mut self, event_loop: &ActiveEventLoop, cause: StartCause) {
        match cause {
            StartCause::Init => {
                event_loop
                    .set_control_flow(ControlFlow::WaitUntil(Instant::now() + self.tick_interval));
            }
            StartCause::ResumeTimeReached { .. } => {
                if let Some(presenter) = self.presenter.as_mut() {
                    presenter.tick(Instant::now());
                }
                event_loop
                    .set_control_flow(ControlFlow::WaitUntil(Instant::now() + self.tick_interval));
            }
            _ => {}
        }
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: WindowId,
        event: WindowEvent,
    ) {
        let Some(presenter) = self.presenter.as_mut() else {
            return;
        };
        match event {
            WindowEvent::CloseRequested => event_loop.exit(),
            WindowEvent::RedrawRequested => {
                if let Err(e) = presenter.surface_mut().present() {
                    warn!("Window paint failed: {e}");
                }
            }
            WindowEvent::Resized(_) => {
                // Minimize and restore both arrive as resizes.
                match presenter.surface_mut().window().is_minimized() {
                    Some(true) => presenter.handle(TrayEvent::Minimized),
                    Some(false) => presenter.handle(TrayEvent::Restored),
                    None => {}
                }
                presenter.surface_mut().window().request_redraw();
            }
            _ => {}
        }
    }

    fn user_event(&mut self, event_loop: &ActiveEventLoop, event: UserEvent) {
        let Some(presenter) = self.presenter.as_mut() else {
            return;
        };
        match event {
            UserEvent::Menu(id) => match id.0.as_str() {
                MENU_SHOW => presenter.handle(TrayEvent::ShowRequested),
                MENU_HIDE_ON_MINIMIZE => {
                    let on = self
                        .hide_item
                        .as_ref()
                        .is_some_and(CheckMenuItem::is_checked);
                    presenter.handle(TrayEvent::HideOnMinimizeToggled(on));
                }
                MENU_QUIT => {
                    presenter.handle(TrayEvent::QuitRequested);
                    event_loop.exit();
                }
                other => warn!("Unknown menu id: {other}"),
            },
            // Double-clicking the tray icon acts like the Show menu item.
            UserEvent::Tray(TrayIconEvent::DoubleClick { .. }) => {
                presenter.handle(TrayEvent::ShowRequested);
            }
            UserEvent::Tray(_) => {}
        }
    }
}

fn build_menu(hide_on_minimize: bool) -> Result<(Menu, CheckMenuItem)> {
    let show = MenuItem::with_id(MENU_SHOW, "Show", true, None);
    let hide = CheckMenuItem::with_id(
        MENU_HIDE_ON_MINIMIZE,
        "Hide on minimize",
        true,
        hide_on_minimize,
        None,
    );
    let separator = PredefinedMenuItem::separator();
    let quit = MenuItem::with_id(MENU_QUIT, "Quit", true, None);

    let menu = Menu::new();
    menu.append_items(&[&show, &hide, &separator, &quit])
        .map_err(|e| Error::Tray(format!("cannot build tray menu: {e}")))?;
    Ok((menu, hide))
}

// ── Surface ───────────────────────────────────────────────────────────────────

/// Concrete [`TraySurface`] over a tray-icon handle plus a softbuffer-backed
/// window.
pub struct PlatformSurface {
    tray: TrayIcon,
    window: Rc<Window>,
    // The context must outlive the surface it spawned.
    _context: softbuffer::Context<Rc<Window>>,
    soft: softbuffer::Surface<Rc<Window>, Rc<Window>>,
    /// Most recently rendered graph, re-presented on every redraw request.
    last_canvas: Option<Canvas>,
}

impl PlatformSurface {
    fn new(tray: TrayIcon, window: Rc<Window>) -> Result<Self> {
        let context = softbuffer::Context::new(Rc::clone(&window))
            .map_err(|e| Error::Tray(format!("cannot create draw context: {e}")))?;
        let soft = softbuffer::Surface::new(&context, Rc::clone(&window))
            .map_err(|e| Error::Tray(format!("cannot create draw surface: {e}")))?;
        Ok(Self {
            tray,
            window,
            _context: context,
            soft,
            last_canvas: None,
        })
    }

    pub fn window(&self) -> &Window {
        &self.window
    }

    /// Blit the stored canvas onto the window, nearest-neighbour stretched
    /// over the current client size.
    pub fn present(&mut self) -> Result<()> {
        let Some(canvas) = self.last_canvas.as_ref() else {
            return Ok(());
        };
        let size = self.window.inner_size();
        let (Some(width), Some(height)) =
            (NonZeroU32::new(size.width), NonZeroU32::new(size.height))
        else {
            return Ok(()); // zero-sized while minimized
        };

        self.soft
            .resize(width, height)
            .map_err(|e| Error::Tray(format!("surface resize failed: {e}")))?;
        let mut buffer = self
            .soft
            .buffer_mut()
            .map_err(|e| Error::Tray(format!("framebuffer unavailable: {e}")))?;

        for y in 0..size.height as usize {
            let src_y = y * HEIGHT / size.height as usize;
            for x in 0..size.width as usize {
                let src_x = x * WIDTH / size.width as usize;
                buffer[y * size.width as usize + x] = canvas.get(src_x, src_y).to_0rgb();
            }
        }

        buffer
            .present()
            .map_err(|e| Error::Tray(format!("present failed: {e}")))?;
        Ok(())
    }
}

impl TraySurface for PlatformSurface {
    type Icon = tray_icon::Icon;

    fn create_icon(&mut self, canvas: &Canvas) -> Result<Self::Icon> {
        tray_icon::Icon::from_rgba(canvas.to_rgba(), WIDTH as u32, HEIGHT as u32)
            .map_err(|e| Error::Tray(format!("icon conversion failed: {e}")))
    }

    fn install_icon(&mut self, icon: &Self::Icon) -> Result<()> {
        self.tray
            .set_icon(Some(icon.clone()))
            .map_err(|e| Error::Tray(format!("icon install failed: {e}")))
    }

    fn set_tooltip(&mut self, text: &str) -> Result<()> {
        self.tray
            .set_tooltip(Some(text))
            .map_err(|e| Error::Tray(format!("tooltip update failed: {e}")))
    }

    fn set_window_visible(&mut self, visible: bool) {
        if visible {
            self.window.set_visible(true);
            self.window.set_minimized(false);
            self.window.focus_window();
        } else {
            self.window.set_visible(false);
        }
    }

    fn paint_window(&mut self, canvas: &Canvas) -> Result<()> {
        self.last_canvas = Some(canvas.clone());
        self.window.request_redraw();
        Ok(())
    }
}
