/// Canon Preview: interactive shell for checking how raw script text
/// canonicalizes into pages and display patterns.
///
/// Usage: canon_preview [--no-split] [--player <name>]
///
/// Commands:
///   <raw text>  canonicalize and print every segment
///   split on|off  toggle page splitting
///   display <text>  show the display key for on-screen text
///   bubble <text>  show the speech-bubble lookup key
///   player <name>  set the player name used for display keys
///   help  list commands
///   quit  exit

use std::io::{self, BufRead, Write};
use voiceline_engine::core::canonical::{canonicalize_with, CanonicalOptions};
use voiceline_engine::core::pack::bubble_key;
use voiceline_engine::core::resolver::display_key;
use voiceline_engine::schema::capture::{Capture, WorldSnapshot};

fn main() {
    env_logger::init();
    let args: Vec<String> = std::env::args().collect();

    let mut options = CanonicalOptions::default();
    let mut world = WorldSnapshot::default();

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--no-split" => options.split_pages = false,
            "--player" if i + 1 < args.len() => {
                i += 1;
                world.player_name = args[i].clone();
            }
            "--help" | "-h" => {
                print_usage();
                return;
            }
            _ => {
                eprintln!("Unknown argument: {}", args[i]);
                print_usage();
                std::process::exit(1);
            }
        }
        i += 1;
    }

    println!("Page splitting: {}", on_off(options.split_pages));
    println!("Type 'help' for commands.\n");

    let stdin = io::stdin();
    let mut stdout = io::stdout();

    loop {
        print!("canon> ");
        stdout.flush().ok();

        let mut line = String::new();
        if stdin.lock().read_line(&mut line).is_err() || line.is_empty() {
            break;
        }
        let line = line.trim_end_matches(['\r', '\n']);
        if line.trim().is_empty() {
            continue;
        }

        let (cmd, rest) = match line.split_once(' ') {
            Some((cmd, rest)) => (cmd.to_lowercase(), rest),
            None => (line.to_lowercase(), ""),
        };

        match cmd.as_str() {
            "quit" | "exit" | "q" => {
                println!("Goodbye.");
                break;
            }
            "help" | "h" | "?" => print_help(),
            "split" => match rest.trim() {
                "on" => options.split_pages = true,
                "off" => options.split_pages = false,
                _ => println!("Usage: split on|off"),
            },
            "player" => {
                world.player_name = rest.trim().to_string();
                println!("Player name: {:?}", world.player_name);
            }
            "display" => {
                let capture = Capture::from_world(&world);
                println!("{:?}", display_key(rest, &capture));
            }
            "bubble" => {
                let capture = Capture::from_world(&world);
                let key = bubble_key(&capture.strip_words(&capture.insert_placeholders(rest)));
                println!("{:?}", key);
            }
            _ => print_segments(line, options),
        }
    }
}

fn print_segments(raw: &str, options: CanonicalOptions) {
    let segments = canonicalize_with(raw, options);
    if segments.is_empty() {
        println!("(no segments)");
        return;
    }
    for seg in &segments {
        let gender = if seg.gender.is_none() {
            String::new()
        } else {
            format!(" [{}]", seg.gender)
        };
        println!("--- page {}{} ---", seg.page, gender);
        println!("  actor:   {:?}", seg.actor_text);
        println!("  display: {:?}", seg.display_text);
    }
}

fn on_off(flag: bool) -> &'static str {
    if flag {
        "on"
    } else {
        "off"
    }
}

fn print_usage() {
    println!("Usage: canon_preview [--no-split] [--player <name>]");
}

fn print_help() {
    println!("Commands:");
    println!("  <raw text>        canonicalize and print every segment");
    println!("  split on|off      toggle page splitting");
    println!("  display <text>    show the display key for on-screen text");
    println!("  bubble <text>     show the speech-bubble lookup key");
    println!("  player <name>     set the player name used for display keys");
    println!("  help              list commands");
    println!("  quit              exit");
}
