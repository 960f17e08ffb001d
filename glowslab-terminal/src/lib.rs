/// Terminal front end for the glowing slab scene
use crossterm::{
    cursor,
    event::{self, Event, KeyCode, KeyEvent},
    execute, queue,
    style::{Color, Print, ResetColor, SetForegroundColor},
    terminal::{self},
};
use glowslab_core::{Display, FrameRequest, GlowslabResult, RenderOrchestrator, SceneConfig};
use log::info;
use std::io::{self, stdout, Write};
use std::time::{Duration, Instant};

pub mod renderer;

pub use renderer::SoftwareBackend;

/// Terminal cells are roughly twice as tall as they are wide
pub const CELL_ASPECT: f32 = 0.5;

/// Fixed-rate stand-in for a display refresh signal.
///
/// Each call to [`RefreshTicker::wait`] blocks until the next refresh
/// deadline and yields the host time in milliseconds.
pub struct RefreshTicker {
    start: Instant,
    interval: Duration,
    next: Instant,
}

impl RefreshTicker {
    pub fn new(refresh_hz: u32) -> Self {
        let start = Instant::now();
        Self {
            start,
            interval: Duration::from_secs_f64(1.0 / refresh_hz.max(1) as f64),
            next: start,
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    pub fn wait(&mut self) -> f64 {
        let now = Instant::now();
        if now < self.next {
            std::thread::sleep(self.next - now);
        }
        // Skip missed deadlines rather than bursting to catch up
        self.next = self.next.max(Instant::now()) + self.interval;
        self.start.elapsed().as_secs_f64() * 1000.0
    }
}

/// Status line shown above the rendered frame
#[derive(Debug, Default, Clone)]
pub struct StatusLine {
    text: String,
}

impl StatusLine {
    pub fn text(&self) -> &str {
        &self.text
    }
}

impl Display for StatusLine {
    fn set_text(&mut self, text: &str) {
        self.text.clear();
        self.text.push_str(text);
    }
}

/// Main application struct for terminal rendering
pub struct TerminalApp {
    orchestrator: RenderOrchestrator,
    backend: SoftwareBackend,
    status: StatusLine,
    ticker: RefreshTicker,
}

impl TerminalApp {
    /// Size the scene to the terminal, leaving the top row for the status line
    pub fn new(layer_count: usize, refresh_hz: u32) -> GlowslabResult<Self> {
        let (width, height) = terminal::size().unwrap_or((80, 24));
        let width = width.max(1);
        let height = height.saturating_sub(1).max(1);
        Self::with_viewport(width as u32, height as u32, layer_count, refresh_hz)
    }

    pub fn with_viewport(width: u32, height: u32, layer_count: usize, refresh_hz: u32) -> GlowslabResult<Self> {
        let config = SceneConfig::default()
            .with_viewport(width, height)
            .with_layer_count(layer_count)
            .with_pixel_aspect(CELL_ASPECT);
        let mut backend = SoftwareBackend::new(width as usize, height as usize);
        let orchestrator = RenderOrchestrator::new(config, &mut backend)?;

        Ok(Self {
            orchestrator,
            backend,
            status: StatusLine::default(),
            ticker: RefreshTicker::new(refresh_hz),
        })
    }

    pub fn run(&mut self) -> io::Result<()> {
        terminal::enable_raw_mode()?;
        execute!(stdout(), terminal::EnterAlternateScreen, cursor::Hide)?;

        let result = self.main_loop();

        // Cleanup
        terminal::disable_raw_mode()?;
        execute!(stdout(), terminal::LeaveAlternateScreen, cursor::Show)?;

        info!(
            "Stopped after {} frames ({} skipped)",
            self.orchestrator.frames_presented(),
            self.orchestrator.frames_skipped()
        );
        result
    }

    fn main_loop(&mut self) -> io::Result<()> {
        let mut request = FrameRequest::Continue;

        // A tick only happens when the previous one asked for it
        while request == FrameRequest::Continue {
            let now = self.ticker.wait();

            if event::poll(Duration::from_millis(0))? {
                self.handle_input()?;
            }

            request = self
                .orchestrator
                .tick(now, &mut self.backend, &mut self.status);
            if request == FrameRequest::Continue {
                self.render()?;
            }
        }

        Ok(())
    }

    fn handle_input(&mut self) -> io::Result<()> {
        if let Event::Key(KeyEvent { code, .. }) = event::read()? {
            if matches!(code, KeyCode::Char('q') | KeyCode::Esc) {
                self.orchestrator.cancel();
            }
        }
        Ok(())
    }

    fn render(&mut self) -> io::Result<()> {
        let mut stdout = stdout();
        queue!(stdout, cursor::MoveTo(0, 1))?;
        self.backend.write_frame(&mut stdout)?;

        // Draw UI overlay
        queue!(
            stdout,
            cursor::MoveTo(0, 0),
            terminal::Clear(terminal::ClearType::CurrentLine),
            SetForegroundColor(Color::Yellow),
            Print(format!(
                "glowslab | {} layers | {} | Q=Quit",
                self.orchestrator.config().layer_count,
                if self.status.text().is_empty() { "--fps" } else { self.status.text() }
            )),
            ResetColor
        )?;

        stdout.flush()?;
        Ok(())
    }
}
