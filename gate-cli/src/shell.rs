//! Shell interativo do checkpoint
//!
//! # Uso
//!
//! ```text
//! $ gate -c 0 -c 1
//! > sim walk_up
//! detected
//! > sim open 42
//! scanning
//! > sim identify
//! allowed
//! > events
//! ```

use std::io::{self, BufRead, Write};

use colored::*;
use gate_camera::FeedId;
use gate_core::EventKind;
use gate_orchestration::{Checkpoint, EventRecord};

/// Resultado de um comando
#[derive(Debug, PartialEq, Eq)]
pub enum ShellResult {
    Continue,
    Output(String),
    Error(String),
    Exit,
}

pub struct Shell {
    checkpoint: Checkpoint,
    history: Vec<String>,
}

impl Shell {
    pub fn new(checkpoint: Checkpoint) -> Self {
        Self {
            checkpoint,
            history: Vec::new(),
        }
    }

    pub fn into_checkpoint(self) -> Checkpoint {
        self.checkpoint
    }

    /// Lê comandos do stdin até `quit` ou EOF
    pub fn run(&mut self) -> io::Result<()> {
        self.print_banner();

        let stdin = io::stdin();
        let mut stdout = io::stdout();
        let mut line = String::new();

        loop {
            print!("{} ", ">".cyan().bold());
            stdout.flush()?;

            line.clear();
            if stdin.lock().read_line(&mut line)? == 0 {
                break;
            }

            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            self.history.push(line.to_string());

            match self.process_line(line) {
                ShellResult::Continue => {}
                ShellResult::Output(s) => println!("{}", s),
                ShellResult::Error(e) => eprintln!("{} {}", "error:".red().bold(), e),
                ShellResult::Exit => break,
            }
        }

        Ok(())
    }

    fn print_banner(&self) {
        println!("{}", "Gate checkpoint simulator".bold());
        println!(
            "state: {}  cameras: {}  (type help for commands)",
            self.checkpoint.state().to_string().green(),
            self.checkpoint.cameras().camera_count()
        );
        println!();
    }

    /// Processa uma linha de input
    pub fn process_line(&mut self, line: &str) -> ShellResult {
        let parts: Vec<&str> = line.split_whitespace().collect();
        let Some((&command, args)) = parts.split_first() else {
            return ShellResult::Continue;
        };

        match command {
            "help" | "?" => self.cmd_help(),
            "quit" | "exit" => self.cmd_quit(),
            "sim" => self.cmd_sim(args),
            "state" => ShellResult::Output(self.checkpoint.state().to_string()),
            "actions" => self.cmd_actions(),
            "show_feed" => self.cmd_display(args, true),
            "hide_feed" => self.cmd_display(args, false),
            "add_camera" => self.cmd_add_camera(args),
            "remove_camera" => self.cmd_remove_camera(args),
            "cameras" => self.cmd_cameras(),
            "trigger_event" => self.cmd_trigger_event(args),
            "events" => self.cmd_events(),
            "purge_events" => {
                self.checkpoint.logger().purge();
                ShellResult::Output("events purged".into())
            }
            "history" => ShellResult::Output(self.history.join("\n")),
            _ => ShellResult::Error(format!("Unknown command: {}", command)),
        }
    }

    fn cmd_help(&self) -> ShellResult {
        ShellResult::Output(
            r#"Commands:
  sim <action> [args]    run a state machine action (walk_up, open <id>, hack,
                         identify, detain, catch, ignore, move_on)
  state                  current state
  actions                actions defined from the current state
  show_feed [feed]       display one feed, or all
  hide_feed [feed]       hide one feed, or all
  add_camera <feed>      open and start a camera
  remove_camera <feed>   stop a camera
  cameras                list cameras
  trigger_event <KIND>   capture and record an event by hand
  events                 list recorded events
  purge_events           erase the event history
  quit                   stop all cameras and exit"#
                .to_string(),
        )
    }

    fn cmd_quit(&mut self) -> ShellResult {
        if let Err(e) = self.checkpoint.shutdown() {
            eprintln!("{} {}", "warning:".yellow().bold(), e);
        }
        ShellResult::Exit
    }

    fn cmd_sim(&mut self, args: &[&str]) -> ShellResult {
        let Some((&action, rest)) = args.split_first() else {
            return ShellResult::Error("usage: sim <action> [args]".into());
        };
        match self.checkpoint.perform(action, rest) {
            Ok(state) => ShellResult::Output(state.to_string()),
            Err(e) => ShellResult::Error(e.to_string()),
        }
    }

    fn cmd_actions(&self) -> ShellResult {
        let enabled = self.checkpoint.enabled_actions();
        let listed: Vec<String> = self
            .checkpoint
            .available_actions()
            .into_iter()
            .map(|action| {
                if enabled.contains(&action) {
                    action.to_string()
                } else {
                    format!("{} (blocked)", action)
                }
            })
            .collect();

        if listed.is_empty() {
            ShellResult::Output("no actions".into())
        } else {
            ShellResult::Output(listed.join("\n"))
        }
    }

    fn cmd_display(&mut self, args: &[&str], show: bool) -> ShellResult {
        let feed = match args.first().map(|raw| raw.parse::<FeedId>()).transpose() {
            Ok(feed) => feed,
            Err(e) => return ShellResult::Error(e.to_string()),
        };
        let result = if show {
            self.checkpoint.show_feed(feed.as_ref())
        } else {
            self.checkpoint.hide_feed(feed.as_ref())
        };
        match result {
            Ok(()) => ShellResult::Continue,
            Err(e) => ShellResult::Error(e.to_string()),
        }
    }

    fn parse_feed(args: &[&str]) -> Result<FeedId, String> {
        let raw = args.first().ok_or_else(|| "missing feed".to_string())?;
        raw.parse::<FeedId>().map_err(|e| e.to_string())
    }

    fn cmd_add_camera(&mut self, args: &[&str]) -> ShellResult {
        let feed = match Self::parse_feed(args) {
            Ok(feed) => feed,
            Err(e) => return ShellResult::Error(e),
        };
        match self.checkpoint.add_camera(feed.clone()) {
            Ok(()) => ShellResult::Output(format!("camera {} started", feed)),
            Err(e) => ShellResult::Error(e.to_string()),
        }
    }

    fn cmd_remove_camera(&mut self, args: &[&str]) -> ShellResult {
        let feed = match Self::parse_feed(args) {
            Ok(feed) => feed,
            Err(e) => return ShellResult::Error(e),
        };
        match self.checkpoint.remove_camera(&feed) {
            Ok(()) => ShellResult::Output(format!("camera {} stopped", feed)),
            Err(e) => ShellResult::Error(e.to_string()),
        }
    }

    fn cmd_cameras(&self) -> ShellResult {
        let stats = self.checkpoint.cameras().stats();
        if stats.is_empty() {
            return ShellResult::Output("no cameras".into());
        }
        let lines: Vec<String> = stats
            .iter()
            .map(|s| {
                format!(
                    "{}  frames={}  {}{}",
                    s.feed,
                    s.frames_read,
                    if s.running { "running" } else { "stopped" },
                    if s.displaying { "  displayed" } else { "" }
                )
            })
            .collect();
        ShellResult::Output(lines.join("\n"))
    }

    fn cmd_trigger_event(&mut self, args: &[&str]) -> ShellResult {
        let Some(raw) = args.first() else {
            return ShellResult::Error("usage: trigger_event <KIND>".into());
        };
        match raw.parse::<EventKind>() {
            Ok(kind) => ShellResult::Output(describe(&self.checkpoint.trigger_event(kind))),
            Err(e) => ShellResult::Error(e.to_string()),
        }
    }

    fn cmd_events(&self) -> ShellResult {
        let events = self.checkpoint.logger().events();
        if events.is_empty() {
            return ShellResult::Output("no events".into());
        }
        ShellResult::Output(events.iter().map(describe).collect::<Vec<_>>().join("\n"))
    }
}

fn describe(record: &EventRecord) -> String {
    let mut line = format!(
        "{}  {}  {}  {}/{} images",
        record.event_time.format("%Y-%m-%d %H:%M:%S"),
        record.event_type,
        record.image_path.display(),
        record.captured(),
        record.cameras.len()
    );
    if let Some(err) = &record.storage_error {
        line.push_str(&format!("  ({})", err));
    }
    line
}
