//! Falling Blocks - a falling-block puzzle game for the terminal
//!
//! Pieces fall into an 11x19 well; full rows clear, score, and speed up gravity.

mod board;
mod game;
mod input;
mod piece;
mod scheduler;
mod score;
mod settings;
mod spawn;
mod tetromino;
mod ui;

use anyhow::Context;
use crossterm::{
    event::{self, Event, KeyEventKind},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use game::{Game, Outcome};
use input::{Input, InputHandler};
use ratatui::{backend::CrosstermBackend, Terminal};
use scheduler::{Scheduler, SystemClock};
use settings::Settings;
use std::{
    io::{self, stdout},
    path::PathBuf,
    time::{Duration, Instant},
};

/// Target frame rate
const TARGET_FPS: u64 = 60;
const FRAME_DURATION: Duration = Duration::from_micros(1_000_000 / TARGET_FPS);

/// Input delay after game over to prevent accidental exit
const GAME_OVER_INPUT_DELAY: Duration = Duration::from_secs(2);

/// Get the temp directory for log files, creating it if needed
fn log_dir() -> PathBuf {
    let dir = std::env::temp_dir().join("falling-blocks");
    let _ = std::fs::create_dir_all(&dir);
    dir
}

/// Raw mode and the alternate screen, undone on drop
struct TerminalGuard;

impl TerminalGuard {
    fn enter() -> anyhow::Result<Self> {
        enable_raw_mode().context("failed to enable raw mode")?;
        // From here on, dropping the guard restores the terminal
        let guard = TerminalGuard;
        execute!(stdout(), EnterAlternateScreen).context("failed to enter alternate screen")?;
        Ok(guard)
    }
}

impl Drop for TerminalGuard {
    fn drop(&mut self) {
        if let Err(e) = disable_raw_mode() {
            tracing::warn!("failed to disable raw mode: {}", e);
        }
        if let Err(e) = execute!(stdout(), LeaveAlternateScreen) {
            tracing::warn!("failed to leave alternate screen: {}", e);
        }
    }
}

/// Final state of a session
struct Summary {
    score: u64,
    lines: u32,
    finished: bool,
}

fn main() -> anyhow::Result<()> {
    let session_id: u32 = rand::random();

    // Stdout belongs to the terminal UI, so log to a file
    let dir = log_dir();
    let log_file = format!("{:08x}.log", session_id);
    let file_appender = tracing_appender::rolling::never(&dir, &log_file);
    let (non_blocking, _guard) = tracing_appender::non_blocking(file_appender);
    tracing_subscriber::fmt()
        .with_writer(non_blocking)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("falling_blocks=debug".parse()?),
        )
        .with_ansi(false)
        .init();

    tracing::info!(
        "falling-blocks starting up, session={:08x}, log={}",
        session_id,
        dir.join(&log_file).display()
    );

    let settings = Settings::load();
    // Write a default file on first run so it can be edited
    if Settings::settings_path().is_some_and(|path| !path.exists()) {
        if let Err(e) = settings.save() {
            tracing::warn!("could not write default settings: {}", e);
        }
    }

    let summary = {
        let _terminal_guard = TerminalGuard::enter()?;
        let backend = CrosstermBackend::new(stdout());
        let mut terminal = Terminal::new(backend).context("failed to create terminal")?;
        terminal.clear()?;
        run_app(&mut terminal, &settings)?
    };

    if summary.finished {
        println!("GAME OVER");
    }
    println!("Score: {} | Lines: {}", summary.score, summary.lines);
    Ok(())
}

fn run_app(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    settings: &Settings,
) -> anyhow::Result<Summary> {
    let mut game = Game::new(settings);
    let mut input = InputHandler::from_settings(settings);
    let mut scheduler = Scheduler::new(SystemClock::new(), &game);
    let mut game_over_time: Option<Instant> = None;

    loop {
        terminal.draw(|frame| ui::render_game(frame, &game, settings))?;

        let summary = Summary {
            score: game.score.points,
            lines: game.score.lines,
            finished: game.is_over(),
        };

        // Drain everything that arrived during this frame
        let mut timeout = FRAME_DURATION;
        while event::poll(timeout)? {
            timeout = Duration::ZERO;
            let Event::Key(key) = event::read()? else {
                continue;
            };

            if let Some(since) = game_over_time {
                if key.kind == KeyEventKind::Press && since.elapsed() >= GAME_OVER_INPUT_DELAY {
                    return Ok(summary);
                }
                continue;
            }

            match key.kind {
                KeyEventKind::Press | KeyEventKind::Repeat => match input.key_down(key) {
                    Some(Input::Action(action)) => scheduler.submit(action),
                    Some(Input::Quit) => return Ok(summary),
                    None => {}
                },
                KeyEventKind::Release => input.key_up(key),
            }
        }

        if game_over_time.is_some() {
            continue;
        }

        // Held keys for DAS/ARR
        for action in input.update() {
            scheduler.submit(action);
        }

        if let Outcome::GameOver { score } = scheduler.pass(&mut game) {
            tracing::info!("round finished with score {}", score);
            game_over_time = Some(Instant::now());
        }
    }
}
