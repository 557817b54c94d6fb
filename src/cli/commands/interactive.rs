//! Interactive prompt: one song or album per request until exit.

use crate::cli::Output;
use crate::orchestrator::Orchestrator;
use crate::query::SongQuery;
use anyhow::Result;
use console::style;
use std::io::{self, BufRead, Write};
use std::path::Path;

/// A parsed line from the interactive prompt.
#[derive(Debug, PartialEq, Eq)]
pub enum InteractiveCommand {
    Song(String),
    Album,
    Exit,
    Empty,
}

/// Parse one input line.
pub fn parse_command(line: &str) -> InteractiveCommand {
    let line = line.trim();
    if line.is_empty() {
        return InteractiveCommand::Empty;
    }
    match line.to_ascii_lowercase().as_str() {
        "exit" | "quit" => InteractiveCommand::Exit,
        "album" => InteractiveCommand::Album,
        _ => InteractiveCommand::Song(line.to_string()),
    }
}

/// Prompt and read one trimmed line. None on end of input.
fn prompt(msg: &str) -> Result<Option<String>> {
    print!("{} ", style(msg).green().bold());
    io::stdout().flush()?;

    let mut input = String::new();
    if io::stdin().lock().read_line(&mut input)? == 0 {
        return Ok(None);
    }
    Ok(Some(input.trim().to_string()))
}

/// Run the interactive read loop.
pub async fn run_interactive(orchestrator: &Orchestrator, output_dir: &Path) -> Result<()> {
    println!("\n{}", style("hent").bold().cyan());
    println!(
        "{}\n",
        style("Type a song, 'album' for an album, or 'exit' to quit.").dim()
    );

    loop {
        let Some(line) =
            prompt("Enter a song to download, 'album' to download an album, or 'exit' to quit:")?
        else {
            break;
        };

        match parse_command(&line) {
            InteractiveCommand::Empty => continue,
            InteractiveCommand::Exit => {
                Output::info("Goodbye!");
                break;
            }
            InteractiveCommand::Album => {
                let Some(album) = prompt("Enter album name:")?.filter(|a| !a.is_empty()) else {
                    Output::warning("No album name given.");
                    continue;
                };
                let artist = prompt("Enter artist name (optional):")?.filter(|a| !a.is_empty());

                let report = orchestrator
                    .process_album(&album, artist.as_deref(), output_dir)
                    .await;
                Output::report(&report);
            }
            InteractiveCommand::Song(song) => {
                let report = orchestrator
                    .process_songs(&[SongQuery::new(song)], output_dir)
                    .await;
                Output::report(&report);
            }
        }
    }

    Ok(())
}
