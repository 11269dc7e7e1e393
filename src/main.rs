//! Terminal Starfall runner (default binary).
//!
//! Fixed-step loop: key events are fed to the session as they arrive, the
//! session ticks once per frame at the configured rate, and the snapshot is
//! drawn through the framebuffer renderer.
//!
//! Environment:
//! - `STARFALL_CONFIG`: path to a JSON tuning file
//! - `STARFALL_PRESET`: `classic`, `modern`, `beginner` or `expert` (ignored
//!   when a config file is given)
//! - `STARFALL_LOG_FILE`: write logs there instead of stderr
//! - `RUST_LOG`: log filter, `warn` by default

use std::fs::File;
use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};

use anyhow::{bail, Context, Result};
use crossterm::event::{self, Event};
use env_logger::{Builder, Env, Target};

use starfall::core::{GameSnapshot, Session, Settings};
use starfall::input::{KeyBindings, ReleaseTimeout};
use starfall::term::{FrameBuffer, GameView, TerminalRenderer, Theme, Viewport};
use starfall::types::Action;

fn main() -> Result<()> {
    init_logging()?;
    let settings = load_settings()?;

    let mut term = TerminalRenderer::new();
    term.enter()?;

    let result = run(&mut term, settings);

    // Always try to restore terminal state.
    let _ = term.exit();
    result
}

fn init_logging() -> Result<()> {
    let mut builder = Builder::from_env(Env::default().default_filter_or("warn"));
    if let Ok(path) = std::env::var("STARFALL_LOG_FILE") {
        let file = File::create(&path).with_context(|| format!("creating log file {path}"))?;
        builder.target(Target::Pipe(Box::new(file)));
    }
    builder.init();
    Ok(())
}

fn load_settings() -> Result<Settings> {
    if let Ok(path) = std::env::var("STARFALL_CONFIG") {
        let json =
            std::fs::read_to_string(&path).with_context(|| format!("reading config {path}"))?;
        let settings =
            Settings::from_json_str(&json).with_context(|| format!("loading config {path}"))?;
        log::info!("loaded settings from {path}");
        return Ok(settings);
    }
    match std::env::var("STARFALL_PRESET") {
        Ok(name) => match Settings::preset(&name) {
            Some(settings) => Ok(settings),
            None => bail!("unknown preset {name:?}"),
        },
        Err(_) => Ok(Settings::default()),
    }
}

fn run(term: &mut TerminalRenderer, settings: Settings) -> Result<()> {
    let bindings = KeyBindings::new(
        Action::ALL
            .iter()
            .map(|&action| (action, settings.keys.binding(action))),
    )?;
    let theme = Theme::from_palette(&settings.colors);
    let fps = settings.performance.target_fps;

    let seed = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.subsec_nanos() ^ d.as_secs() as u32)
        .unwrap_or(1);
    let mut session = Session::builder(settings).seed(seed).build()?;

    let view = GameView::default().with_theme(theme);
    let mut releases = ReleaseTimeout::default();
    let mut snap = GameSnapshot::default();
    let (w, h) = crossterm::terminal::size().unwrap_or((80, 24));
    let mut fb = FrameBuffer::new(w, h);

    let frame = Duration::from_secs(1) / fps;
    let mut next_tick = Instant::now() + frame;

    loop {
        // Input until the next tick is due.
        let timeout = next_tick.saturating_duration_since(Instant::now());
        if event::poll(timeout)? {
            match event::read()? {
                Event::Key(key) => {
                    if bindings.should_quit(key) {
                        return Ok(());
                    }
                    if let Some(action) = bindings.action_for(key.code) {
                        releases.observe(action, key.kind, Instant::now());
                    }
                    if let Some(input) = bindings.translate(key) {
                        session.push_input(input);
                    }
                }
                Event::Resize(..) => term.invalidate(),
                _ => {}
            }
        }

        let now = Instant::now();
        if now < next_tick {
            continue;
        }
        // Catch up at most four late frames.
        let mut late = 0;
        while next_tick <= now && late < 4 {
            for input in releases.expired(now) {
                session.push_input(input);
            }
            session.tick();
            next_tick += frame;
            late += 1;
        }
        if next_tick <= now {
            next_tick = now + frame;
        }

        for sound in session.take_events() {
            log::trace!("sound {}", sound.as_str());
        }

        session.snapshot_into(&mut snap);
        let (w, h) = crossterm::terminal::size().unwrap_or((80, 24));
        view.render_into(&snap, Viewport::new(w, h), &mut fb);
        term.draw_swap(&mut fb)?;
    }
}
