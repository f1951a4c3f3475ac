use std::io::{self, Write};

use anyhow::Result;
use autoplayer::walkthrough::{self, Chapter};
use autoplayer::{Autoplayer, AutoplayerError, Path};
use colored::*;
use tracing::warn;

enum MenuChoice {
    Chapter(usize),
    All,
    Walk(String),
    Grind(String),
    Stats,
    Quit,
}

fn parse_choice(input: &str) -> Option<MenuChoice> {
    let mut parts = input.split_whitespace();
    let head = parts.next()?;
    let rest = parts.collect::<Vec<_>>().join(" ");
    match head.to_lowercase().as_str() {
        "q" | "quit" | "exit" => Some(MenuChoice::Quit),
        "a" | "all" => Some(MenuChoice::All),
        "s" | "stats" => Some(MenuChoice::Stats),
        "w" | "walk" => Some(MenuChoice::Walk(rest)),
        "g" | "grind" => Some(MenuChoice::Grind(rest)),
        n => n.parse::<usize>().ok().map(MenuChoice::Chapter),
    }
}

fn print_menu(chapters: &[Chapter]) {
    println!();
    println!("{}", "NeoQuest II Autoplayer".bold().cyan());
    println!("{}", "======================".cyan());
    for (i, chapter) in chapters.iter().enumerate() {
        println!("  {:>2}) {}", i + 1, chapter.title);
    }
    println!("   a) Play every chapter from the start");
    println!("   w <path>) Walk a path, e.g. w 3333");
    println!("   g <steps> [path]) Grind battles, e.g. g 100 7777");
    println!("   s) Session stats");
    println!("   q) Quit");
}

/// Console loop; returns when the user quits or stdin closes.
pub async fn run_menu(autoplayer: &mut Autoplayer) -> Result<()> {
    let chapters = walkthrough::chapters()?;
    let stdin = io::stdin();
    let mut stdout = io::stdout();

    loop {
        print_menu(&chapters);
        print!("{}", "> ".bold());
        stdout.flush()?;

        let mut input = String::new();
        if stdin.read_line(&mut input)? == 0 {
            return Ok(());
        }
        let Some(choice) = parse_choice(input.trim()) else {
            continue;
        };

        let outcome = match choice {
            MenuChoice::Quit => return Ok(()),
            MenuChoice::Stats => {
                let stats = autoplayer.stats();
                println!(
                    "{} steps, {} battles won, {} turns, {} potions",
                    stats.steps_taken, stats.battles_won, stats.turns, stats.potions_used
                );
                Ok(())
            }
            MenuChoice::Chapter(n) => match n.checked_sub(1).and_then(|i| chapters.get(i)) {
                Some(chapter) => autoplayer.run_chapter(chapter).await.map(|_| ()),
                None => {
                    println!("{}", format!("No chapter {n}").yellow());
                    Ok(())
                }
            },
            MenuChoice::All => run_all(autoplayer, &chapters).await,
            MenuChoice::Walk(path) => match Path::parse(&path) {
                Ok(path) => autoplayer.follow_path(&path).await,
                Err(e) => Err(e),
            },
            MenuChoice::Grind(args) => grind(autoplayer, &args).await,
        };

        match outcome {
            Ok(()) => println!("{}", "Done.".green()),
            Err(e) => {
                warn!("Menu action failed: {e}");
                println!("{} {e}", "Error:".red().bold());
            }
        }
    }
}

async fn run_all(
    autoplayer: &mut Autoplayer,
    chapters: &[Chapter],
) -> Result<(), AutoplayerError> {
    for chapter in chapters {
        autoplayer.run_chapter(chapter).await?;
    }
    Ok(())
}

async fn grind(autoplayer: &mut Autoplayer, args: &str) -> Result<(), AutoplayerError> {
    let mut parts = args.split_whitespace();
    let steps = parts
        .next()
        .and_then(|s| s.parse::<u32>().ok())
        .ok_or_else(|| {
            AutoplayerError::InvalidArgument(format!("Expected a step count, got '{args}'"))
        })?;
    let initial_path = parts.next().map(Path::parse).transpose()?;
    autoplayer.grind_battles(steps, initial_path.as_ref()).await
}
