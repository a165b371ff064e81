//! Foreground host for a cycle.
//!
//! Owns the cycle inside a single task: a tokio interval pumps the armed
//! tick source, stdin lines arrive over a channel as control commands, and
//! every cycle event is rendered to stdout.

use std::error::Error;
use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;

use clap::Args;
use serde::Serialize;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tokio::time::{interval, Interval, MissedTickBehavior};
use tomato_core::{
    format_clock, Config, CycleEvent, CycleTimer, ManualScheduler, Notification, Phase,
    PhaseKind, TickSource, TICK_PERIOD,
};

use crate::sound;

#[derive(Args)]
pub struct RunArgs {
    /// Print events and snapshots as JSON lines
    #[arg(long)]
    json: bool,
    /// Do not ring the terminal bell at phase boundaries
    #[arg(long)]
    no_bell: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Control {
    Toggle,
    Stop,
    Reset,
    Status,
    Quit,
}

impl Control {
    fn parse(line: &str) -> Option<Self> {
        match line.trim().to_ascii_lowercase().as_str() {
            "p" | "pause" | "play" | "toggle" => Some(Control::Toggle),
            "s" | "stop" => Some(Control::Stop),
            "r" | "reset" => Some(Control::Reset),
            "" | "t" | "status" => Some(Control::Status),
            "q" | "quit" | "exit" => Some(Control::Quit),
            _ => None,
        }
    }
}

#[derive(Serialize)]
struct NotificationLine<'a> {
    #[serde(rename = "type")]
    kind: &'static str,
    #[serde(flatten)]
    notification: &'a Notification,
    sound_file: Option<&'a str>,
}

/// Renders cycle events. Subscribed once for the lifetime of the cycle.
struct Renderer {
    json: bool,
    notify: bool,
    bell: bool,
    sound_file: Option<PathBuf>,
    current: PhaseKind,
}

impl Renderer {
    fn handle(&mut self, event: &CycleEvent) {
        if self.json {
            if let Ok(line) = serde_json::to_string(event) {
                println!("{line}");
            }
        }

        match *event {
            CycleEvent::Start { kind, remaining, .. } => {
                self.current = kind;
                self.clock(remaining);
            }
            CycleEvent::Reset { kind, duration } => {
                self.current = kind;
                self.clock(duration);
            }
            CycleEvent::Increment { remaining, .. } => self.clock(remaining),
            CycleEvent::NextTransitionStarted { kind, duration } => {
                self.announce(&Notification::for_transition(&Phase::new(kind, duration)));
            }
            CycleEvent::Ended { .. } => {}
        }
    }

    fn clock(&self, remaining: u64) {
        if self.json {
            return;
        }
        let time = format_clock(i64::try_from(remaining).unwrap_or(i64::MAX));
        print!("\r{:<12} {:>6}  ", self.current.label(), time);
        let _ = std::io::stdout().flush();
    }

    fn announce(&self, notification: &Notification) {
        if !self.notify {
            return;
        }
        if self.json {
            let sound_file = self.sound_file.as_ref().map(|p| p.display().to_string());
            let line = NotificationLine {
                kind: "notification",
                notification,
                sound_file: sound_file.as_deref(),
            };
            if let Ok(line) = serde_json::to_string(&line) {
                println!("{line}");
            }
        } else {
            println!("\n{}: {}", notification.summary, notification.body);
        }
        let played = self.sound_file.as_deref().is_some_and(sound::play);
        if self.bell && !played {
            print!("\x07");
            let _ = std::io::stdout().flush();
        }
    }
}

pub fn run(args: RunArgs) -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::load()?;
    let settings = config.settings()?;
    let scheduler = Arc::new(ManualScheduler::new());
    let mut timer = CycleTimer::from_settings(&settings, scheduler.clone())?;

    let mut renderer = Renderer {
        json: args.json,
        notify: settings.notifications_enabled,
        bell: settings.notifications_enabled && settings.bell && !args.no_bell,
        sound_file: settings.sound_file.clone(),
        current: timer.current_phase().kind,
    };
    timer.subscribe(move |event| renderer.handle(event));

    if !args.json {
        eprintln!("controls: p = play/pause, s = stop, r = reset, q = quit");
    }

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;
    let result = runtime.block_on(host(timer, scheduler, args.json));
    // The stdin reader blocks on a pool thread; don't wait for it.
    runtime.shutdown_background();
    result
}

async fn host(
    mut timer: CycleTimer,
    scheduler: Arc<ManualScheduler>,
    json: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let (tx, mut controls) = mpsc::channel(8);
    tokio::spawn(read_controls(tx));
    let mut controls_open = true;

    let mut ticker = interval(TICK_PERIOD);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    let mut armed: Option<TickSource> = None;

    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);

    timer.start();
    loop {
        follow_armed_source(&scheduler, &mut armed, &mut ticker);

        tokio::select! {
            _ = ticker.tick(), if armed.is_some() => {
                if let Some(source) = armed {
                    timer.on_tick(source);
                }
            }
            control = controls.recv(), if controls_open => match control {
                Some(Control::Quit) => break,
                Some(control) => {
                    apply(&mut timer, control, || Ok(Config::load()?.settings()?.phases));
                    print_status(&timer, json)?;
                }
                None => controls_open = false,
            },
            _ = &mut ctrl_c => break,
        }
    }

    timer.stop();
    if !json {
        println!();
    }
    tracing::debug!(completed = timer.completed_phases(), "host loop finished");
    Ok(())
}

/// Restart the interval whenever a different source is armed, so the first
/// tick of a phase lands one full period after it started.
fn follow_armed_source(
    scheduler: &ManualScheduler,
    armed: &mut Option<TickSource>,
    ticker: &mut Interval,
) {
    let current = scheduler.active();
    if current != *armed {
        *armed = current;
        ticker.reset();
    }
}

/// Apply a control command. `Reset` re-reads the phases through
/// `load_phases` so config edits made while running take effect; if that
/// fails the current phases are kept and only rewound.
fn apply<L>(timer: &mut CycleTimer, control: Control, load_phases: L)
where
    L: FnOnce() -> Result<Vec<Phase>, Box<dyn Error>>,
{
    match control {
        Control::Toggle => timer.toggle(),
        Control::Stop => timer.stop(),
        Control::Reset => {
            let reloaded =
                load_phases().and_then(|phases| timer.reconfigure(phases).map_err(Into::into));
            if let Err(err) = reloaded {
                tracing::warn!(%err, "could not reload phases, keeping the current cycle");
                timer.reset();
            }
        }
        Control::Status | Control::Quit => {}
    }
}

fn print_status(timer: &CycleTimer, json: bool) -> Result<(), serde_json::Error> {
    if json {
        println!("{}", serde_json::to_string(&timer.snapshot())?);
    } else {
        let phase = timer.current_phase();
        println!(
            "\n[{}/{}] {} {} ({:?})",
            timer.phase_index() + 1,
            timer.sequence().len(),
            phase.kind.label(),
            timer.time(),
            timer.state()
        );
    }
    Ok(())
}

async fn read_controls(tx: mpsc::Sender<Control>) {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Ok(Some(line)) = lines.next_line().await {
        match Control::parse(&line) {
            Some(control) => {
                if tx.send(control).await.is_err() {
                    break;
                }
            }
            None => eprintln!("unknown command: {}", line.trim()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_controls() {
        assert_eq!(Control::parse("p"), Some(Control::Toggle));
        assert_eq!(Control::parse(" Pause \n"), Some(Control::Toggle));
        assert_eq!(Control::parse("r"), Some(Control::Reset));
        assert_eq!(Control::parse("s"), Some(Control::Stop));
        assert_eq!(Control::parse(""), Some(Control::Status));
        assert_eq!(Control::parse("q"), Some(Control::Quit));
        assert_eq!(Control::parse("launch"), None);
    }

    #[test]
    fn apply_drives_timer() {
        let scheduler = Arc::new(ManualScheduler::new());
        let mut sequence = tomato_core::PhaseSequence::new();
        sequence.add(PhaseKind::Focus, 5);
        let mut timer = CycleTimer::new(sequence, scheduler.clone()).unwrap();

        apply(&mut timer, Control::Toggle, unused_loader);
        assert!(timer.is_started());
        apply(&mut timer, Control::Toggle, unused_loader);
        assert!(timer.is_paused());
        apply(&mut timer, Control::Reset, || {
            Ok(vec![Phase::new(PhaseKind::Focus, 5)])
        });
        assert!(!timer.is_started());
        assert!(!timer.is_paused());
        assert!(!scheduler.is_armed());
    }

    fn unused_loader() -> Result<Vec<Phase>, Box<dyn Error>> {
        panic!("only reset reloads phases")
    }

    #[test]
    fn reset_picks_up_reloaded_phases() {
        let scheduler = Arc::new(ManualScheduler::new());
        let mut sequence = tomato_core::PhaseSequence::new();
        sequence.add(PhaseKind::Focus, 5).add(PhaseKind::ShortBreak, 2);
        let mut timer = CycleTimer::new(sequence, scheduler.clone()).unwrap();
        timer.start();
        timer.on_tick(scheduler.active().unwrap());

        apply(&mut timer, Control::Reset, || {
            Ok(vec![
                Phase::new(PhaseKind::Focus, 60),
                Phase::new(PhaseKind::LongBreak, 30),
                Phase::new(PhaseKind::ShortBreak, 10),
            ])
        });

        assert_eq!(timer.sequence().len(), 3);
        assert_eq!(timer.phase_index(), 0);
        assert_eq!(*timer.current_phase(), Phase::new(PhaseKind::Focus, 60));
        assert_eq!(timer.time(), "1:00");
        assert!(!scheduler.is_armed());
    }

    #[test]
    fn reset_keeps_phases_when_reload_fails() {
        let scheduler = Arc::new(ManualScheduler::new());
        let mut sequence = tomato_core::PhaseSequence::new();
        sequence.add(PhaseKind::Focus, 5).add(PhaseKind::ShortBreak, 2);
        let mut timer = CycleTimer::new(sequence, scheduler.clone()).unwrap();
        timer.start();
        timer.on_tick(scheduler.active().unwrap());

        apply(&mut timer, Control::Reset, || Err("config.toml: parse error".into()));
        assert_eq!(timer.sequence().len(), 2);
        assert_eq!(timer.time(), "0:05");
        assert!(!timer.is_started());

        // An unbuildable reloaded cycle is rejected the same way.
        apply(&mut timer, Control::Reset, || Ok(Vec::new()));
        assert_eq!(timer.sequence().len(), 2);
        assert_eq!(*timer.current_phase(), Phase::new(PhaseKind::Focus, 5));
    }

    #[test]
    fn notification_line_is_flat_json() {
        let notification = Notification::for_transition(&Phase::new(PhaseKind::ShortBreak, 300));
        let line = NotificationLine {
            kind: "notification",
            notification: &notification,
            sound_file: Some("/tmp/bell.oga"),
        };
        let json = serde_json::to_value(&line).unwrap();
        assert_eq!(json["type"], "notification");
        assert_eq!(json["body"], "5 minutes short break!");
        assert_eq!(json["sound_file"], "/tmp/bell.oga");
    }
}
