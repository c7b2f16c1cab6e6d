//! Terminal peer for trying a session by hand.
//!
//! `duel_peer host [config]` prints an offer; `duel_peer join <ROOM> [config]`
//! reads that offer and prints an answer. Artifacts are pasted into the other
//! terminal and terminated by an empty line.

use duelrtc::{
    config::Config,
    log::{LogSink, logger::Logger},
    message::{Envelope, Payload, PlayerState, Vec3},
    session::{Session, SessionConfig},
};
use std::env;
use std::io::{self, BufRead, Write};
use std::process::ExitCode;
use std::sync::{
    Arc,
    atomic::{AtomicBool, Ordering},
    mpsc,
};
use std::thread;
use std::time::{Duration, Instant};

const DEFAULT_CONFIG: &str = "duel_default.conf";
const LOG_QUEUE: usize = 4_096;
const SEND_EVERY: Duration = Duration::from_secs(1);
const TICK: Duration = Duration::from_millis(5);

enum Mode {
    Host,
    Join(String),
}

fn usage() -> ExitCode {
    eprintln!("usage: duel_peer host [config]\n       duel_peer join <ROOM> [config]");
    ExitCode::FAILURE
}

fn main() -> ExitCode {
    let args: Vec<String> = env::args().skip(1).collect();
    let (mode, config_path) = match args.as_slice() {
        [cmd, rest @ ..] if cmd == "host" => (Mode::Host, rest.first()),
        [cmd, room, rest @ ..] if cmd == "join" => (Mode::Join(room.clone()), rest.first()),
        _ => return usage(),
    };

    let config = Config::load(config_path.map_or(DEFAULT_CONFIG, String::as_str))
        .unwrap_or_else(|e| {
            eprintln!("Error loading config: {e}. Using defaults.");
            Config::empty()
        });
    let logger = Logger::start_from_config(LOG_QUEUE, &config);
    let log: Arc<dyn LogSink> = Arc::new(logger.handle());
    println!("logging to {}", logger.file_path().display());

    let mut session = Session::new(SessionConfig::from_config(&config), log);
    let opened = Arc::new(AtomicBool::new(false));
    let closed = Arc::new(AtomicBool::new(false));
    if let Err(e) = wire_hooks(&mut session, &opened, &closed) {
        eprintln!("could not subscribe: {e}");
        return ExitCode::FAILURE;
    }

    let pasted = spawn_stdin_reader();
    let result = match mode {
        Mode::Host => host(&mut session),
        Mode::Join(room) => join(&mut session, &room, &pasted),
    };
    if let Err(e) = result {
        eprintln!("{e}");
        return ExitCode::FAILURE;
    }

    run(&mut session, &pasted, &opened, &closed);
    session.close();
    ExitCode::SUCCESS
}

fn wire_hooks(
    session: &mut Session,
    opened: &Arc<AtomicBool>,
    closed: &Arc<AtomicBool>,
) -> Result<(), duelrtc::subscription::SubscribeError> {
    session.on_offer_ready().subscribe(|offer: &String| {
        println!("\n--- offer: paste into the guest, then an empty line ---\n{offer}");
        println!("--- paste the guest's answer below, then an empty line ---");
    })?;
    let flag = Arc::clone(opened);
    session.on_open().subscribe(move |_| {
        println!("connected");
        flag.store(true, Ordering::Release);
    })?;
    let flag = Arc::clone(closed);
    session.on_close().subscribe(move |_| {
        println!("disconnected");
        flag.store(true, Ordering::Release);
    })?;
    session.on_message().subscribe(print_envelope)?;
    Ok(())
}

fn print_envelope(envelope: &Envelope) {
    match envelope.payload() {
        Payload::StateUpdate(s) => println!(
            "peer @{}: pos ({:.1}, {:.1}, {:.1}) hp {} score {} ammo {}",
            envelope.sent_at(),
            s.position.x,
            s.position.y,
            s.position.z,
            s.health,
            s.score,
            s.ammo
        ),
        other => println!("peer @{}: {:?}", envelope.sent_at(), other),
    }
}

/// Reads blocks of lines terminated by an empty line.
fn spawn_stdin_reader() -> mpsc::Receiver<String> {
    let (tx, rx) = mpsc::channel();
    let _ = thread::Builder::new()
        .name("stdin-reader".into())
        .spawn(move || {
            let mut block = String::new();
            for line in io::stdin().lock().lines() {
                let Ok(line) = line else { break };
                if line.trim().is_empty() {
                    if !block.trim().is_empty() && tx.send(std::mem::take(&mut block)).is_err() {
                        break;
                    }
                    continue;
                }
                block.push_str(&line);
                block.push('\n');
            }
        });
    rx
}

fn host(session: &mut Session) -> Result<(), String> {
    let room = session.create_room().map_err(|e| e.to_string())?;
    println!("hosting room {room}; gathering candidates...");
    Ok(())
}

fn join(session: &mut Session, room: &str, pasted: &mpsc::Receiver<String>) -> Result<(), String> {
    println!("paste the host's offer, then an empty line:");
    let _ = io::stdout().flush();
    let offer = pasted.recv().map_err(|_| "stdin closed".to_owned())?;
    let answer = session
        .join_room(room, &offer)
        .map_err(|e| e.to_string())?;
    println!("\n--- answer: paste into the host, then an empty line ---\n{answer}");
    Ok(())
}

fn run(
    session: &mut Session,
    pasted: &mpsc::Receiver<String>,
    opened: &AtomicBool,
    closed: &AtomicBool,
) {
    let mut last_send = Instant::now();
    let mut tick: u32 = 0;
    while !closed.load(Ordering::Acquire) {
        if session.is_host()
            && let Ok(answer) = pasted.try_recv()
            && let Err(e) = session.finalize(&answer)
        {
            eprintln!("answer rejected: {e}");
        }

        session.poll();

        if opened.load(Ordering::Acquire) && last_send.elapsed() >= SEND_EVERY {
            last_send = Instant::now();
            tick = tick.wrapping_add(1);
            let step = f64::from(tick % 100);
            session.send_state_update(PlayerState {
                position: Vec3 {
                    x: step,
                    y: 0.0,
                    z: -step,
                },
                health: 100 - i32::try_from(tick % 100).unwrap_or(0),
                score: tick,
                ammo: 30,
                ..PlayerState::default()
            });
        }
        thread::sleep(TICK);
    }
}
