//! Entry point — terminal bring-up, the input core loop, and the hand-off
//! of the render task to the worker thread.
//!
//! Two loops run side by side: this thread polls the buttons every 20ms
//! and turns them into commands, while the worker thread runs the frame
//! orchestrator. A third thread does nothing but block on terminal event
//! reads and forward them over a channel, so neither core ever blocks on
//! input I/O.

use std::io::{self, stdout};
use std::sync::mpsc;
use std::thread;
use std::time::Duration;

use crossterm::{
    cursor,
    event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers},
    terminal, ExecutableCommand,
};
use rand::rngs::StdRng;
use rand::SeedableRng;

use asteroid_rush::compute::{Command, Game};
use asteroid_rush::display::{Screen, TermScreen};
use asteroid_rush::worker::Worker;

/// Input-core polling cadence.
const POLL_PERIOD: Duration = Duration::from_millis(20);

// ── Buttons ───────────────────────────────────────────────────────────────────

/// Four momentary buttons, each answering "was it pressed since last
/// check" exactly once per poll.
#[derive(Default)]
struct Buttons {
    up: bool,
    down: bool,
    fire: bool,
    start: bool,
}

impl Buttons {
    fn press(&mut self, code: KeyCode) {
        match code {
            KeyCode::Up | KeyCode::Char('w') => self.up = true,
            KeyCode::Down | KeyCode::Char('s') => self.down = true,
            KeyCode::Char(' ') => self.fire = true,
            KeyCode::Enter => self.start = true,
            _ => {}
        }
    }
}

// ── Entry point ───────────────────────────────────────────────────────────────

fn main() -> io::Result<()> {
    env_logger::init();

    let mut out = stdout();
    terminal::enable_raw_mode()?;
    out.execute(terminal::EnterAlternateScreen)?;
    out.execute(cursor::Hide)?;

    let result = run();

    // Always restore the terminal
    let _ = out.execute(cursor::Show);
    let _ = out.execute(terminal::LeaveAlternateScreen);
    let _ = terminal::disable_raw_mode();

    result
}

fn run() -> io::Result<()> {
    // Dedicate a thread exclusively to blocking event reads, sending them
    // through a channel so the input loop never has to block on I/O.
    let (event_tx, event_rx) = mpsc::channel::<Event>();
    thread::spawn(move || loop {
        match event::read() {
            Ok(ev) => {
                if event_tx.send(ev).is_err() {
                    break; // receiver dropped → program exiting
                }
            }
            Err(_) => break,
        }
    });

    let mut screen = TermScreen::new()?;
    let mut rng = StdRng::from_entropy();
    let (cmd_tx, cmd_rx) = mpsc::channel::<Command>();
    let mut game = Game::new(cmd_rx, &mut rng);

    // First paint before the render core takes the screen over.
    game.stage_view.clear(&mut screen);
    screen.present()?;

    let worker = Worker::new();
    let render_core = worker.start();
    worker.bind("game-display", move || game.frame(&mut screen, &mut rng));
    worker.request_start();
    if render_core {
        log::info!("render task bound: {:?}", worker.status());
    } else {
        log::warn!("running single-core; frames fold into the input loop");
    }

    let mut buttons = Buttons::default();
    loop {
        while let Ok(ev) = event_rx.try_recv() {
            if let Event::Key(KeyEvent {
                code,
                kind,
                modifiers,
                ..
            }) = ev
            {
                if !matches!(kind, KeyEventKind::Press | KeyEventKind::Repeat) {
                    continue;
                }
                match code {
                    KeyCode::Char('q') | KeyCode::Char('Q') | KeyCode::Esc => {
                        shutdown(&worker);
                        return Ok(());
                    }
                    KeyCode::Char('c') if modifiers.contains(KeyModifiers::CONTROL) => {
                        shutdown(&worker);
                        return Ok(());
                    }
                    other => buttons.press(other),
                }
            }
        }

        if std::mem::take(&mut buttons.up) {
            cmd_tx.send(Command::MoveUp).ok();
        }
        if std::mem::take(&mut buttons.down) {
            cmd_tx.send(Command::MoveDown).ok();
        }
        if std::mem::take(&mut buttons.fire) {
            cmd_tx.send(Command::Fire).ok();
        }
        if std::mem::take(&mut buttons.start) {
            cmd_tx.send(Command::Restart).ok();
        }

        if !render_core {
            worker.run_inline();
        }
        thread::sleep(POLL_PERIOD);
    }
}

/// Stop the render task and wait out the in-flight frame so nothing draws
/// over the restored terminal.
fn shutdown(worker: &Worker) {
    worker.request_stop();
    worker.drain();
}
