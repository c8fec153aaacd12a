use std::{
    error::Error,
    io::{self, BufRead, Write},
    path::PathBuf,
    sync::mpsc,
    thread,
};

use clap::{Parser, Subcommand};
use ringer::{communication::Event, config::Config, scheduler::Scheduler};

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// use this config file instead of the default location
    #[clap(long, short)]
    config: Option<PathBuf>,
    #[clap(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// write the default config file and exit
    Init {
        #[clap(long, short)]
        force: bool,
    },
}

fn main() -> Result<(), Box<dyn Error>> {
    // initilize the logger
    simple_file_logger::init_logger!("ringer").expect("couldn't initialize logger");

    let args = Args::parse();
    let config_path = args.config.unwrap_or_else(Config::config_path);
    if let Some(Command::Init { force }) = args.command {
        if config_path.exists() && !force {
            println!(
                "config already present at {} (use --force to overwrite)",
                config_path.display()
            );
        } else {
            Config::default().save(&config_path)?;
            println!("wrote default config to {}", config_path.display());
        }
        return Ok(());
    }
    let config = Config::load(&config_path)?;

    // the printer thread is the event sink: it renders whatever the
    // scheduler and the workers report, then restores the prompt so
    // asynchronous worker output doesn't leave the terminal dangling
    let (tx, rx) = mpsc::channel::<Event>();
    let time_format = config.time_format.clone();
    let printer = thread::spawn(move || {
        while let Ok(event) = rx.recv() {
            println!("{}", event.render(&time_format));
            prompt();
        }
    });

    let scheduler = Scheduler::new(&config, tx);
    command_loop(&scheduler)?;

    // orderly shutdown: cancel everything, join every worker, then drop the
    // last sender so the printer sees the channel close
    scheduler.shutdown();
    drop(scheduler);
    if printer.join().is_err() {
        log::error!("printer thread panicked");
    }
    println!("Good Bye");
    Ok(())
}

/// Reads commands until `quit` or end of input. `start` and `end` take their
/// parameters from the next prompted line, like the prompt says.
fn command_loop(scheduler: &Scheduler) -> io::Result<()> {
    let stdin = io::stdin();
    let mut line = String::new();
    loop {
        prompt();
        line.clear();
        if stdin.lock().read_line(&mut line)? == 0 {
            // EOF quits too
            break;
        }
        match line.trim() {
            "quit" => break,
            "help" => print_help(),
            "start" => {
                prompt();
                line.clear();
                if stdin.lock().read_line(&mut line)? == 0 {
                    break;
                }
                match parse_start(&line) {
                    Some((duration, message)) => {
                        if let Err(e) = scheduler.insert(duration, message) {
                            // the slot was rolled back; the command loop can
                            // keep going
                            println!("could not create an alarm worker: {e}");
                        }
                    }
                    None => scheduler.reject(),
                }
            }
            "end" => {
                prompt();
                line.clear();
                if stdin.lock().read_line(&mut line)? == 0 {
                    break;
                }
                match line.trim().parse::<u64>() {
                    Ok(id) => scheduler.cancel(id),
                    Err(_) => scheduler.reject(),
                }
            }
            _ => scheduler.reject(),
        }
    }
    Ok(())
}

/// `<seconds> <message...>`; a negative duration or a missing message is a
/// parse failure, bounds on the message are the scheduler's business
fn parse_start(line: &str) -> Option<(u64, &str)> {
    let (duration, message) = line.trim().split_once(char::is_whitespace)?;
    let duration = duration.parse::<u64>().ok()?;
    let message = message.trim();
    if message.is_empty() {
        return None;
    }
    Some((duration, message))
}

fn prompt() {
    print!("alarm > ");
    let _ = io::stdout().flush();
}

fn print_help() {
    println!("{:<16}{:<64}", "help", "print this help text");
    println!("{:<16}{:<64}", "start", "insert a new alarm");
    println!("{:<16}{:<64}", "end", "cancel an alarm early");
    println!("{:<16}{:<64}", "quit", "exit the program");
    println!();
    println!("after entering start type-");
    println!(
        "{:<16}{:<64}",
        "<sec> <msg>", "sec=seconds, msg=alarm message"
    );
    println!();
    println!("after entering end type-");
    println!("{:<16}{:<64}", "<id>", "id=alarm id");
    println!();
}

#[cfg(test)]
mod tests {
    use super::parse_start;
    use ringer::communication::{Event, EventKind};
    use std::sync::mpsc;

    // the printer thread's shape: an Event channel rendered line by line
    #[test]
    fn events_render_straight_off_the_channel() {
        let (tx, rx) = mpsc::channel::<Event>();
        tx.send(Event::new(EventKind::Rang, 1, 2, "tea")).unwrap();
        drop(tx);
        let lines: Vec<String> = rx.iter().map(|event| event.render("%Y")).collect();
        assert_eq!(lines.len(), 1);
        assert!(lines[0].starts_with("Alarm(1) Rang at "));
    }

    #[test]
    fn parse_start_accepts_duration_and_message() {
        assert_eq!(parse_start("2 tea is ready\n"), Some((2, "tea is ready")));
        assert_eq!(parse_start("0 x"), Some((0, "x")));
    }

    #[test]
    fn parse_start_rejects_malformed_input() {
        assert_eq!(parse_start("nonsense"), None);
        assert_eq!(parse_start("-1 negative"), None);
        assert_eq!(parse_start("5"), None);
        assert_eq!(parse_start("5   "), None);
        assert_eq!(parse_start(""), None);
    }
}
