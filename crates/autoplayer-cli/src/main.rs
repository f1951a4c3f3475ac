//! NeoQuest II autoplayer launcher
//!
//! Usage:
//!   nq2-autoplayer                          # interactive menu
//!   nq2-autoplayer chapters                 # list the scripted chapters
//!   nq2-autoplayer run zombom sand-grundo   # play chapters in order
//!   nq2-autoplayer --login-method neopass walk 3333
//!   nq2-autoplayer grind 100 --initial-path 7777

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use autoplayer::config::DEFAULT_CREDENTIALS_PATH;
use autoplayer::inventory::equipment_id;
use autoplayer::walkthrough;
use autoplayer::{
    Ally, Autoplayer, AutoplayerConfig, BrowserLauncher, ChapterId, Credentials, LoginMethod, Npc,
    Path, RunStats, Skill,
};
use clap::{Args, Parser, Subcommand, ValueEnum};
use colored::*;
use tracing::{error, info};

mod menu;

#[derive(Parser)]
#[command(name = "nq2-autoplayer")]
#[command(about = "Plays NeoQuest II in a Chrome window")]
#[command(version)]
struct Cli {
    #[command(flatten)]
    options: GlobalOptions,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(ValueEnum, Clone, Copy, Debug, Default)]
enum LoginMethodArg {
    #[default]
    Traditional,
    Neopass,
}

impl From<LoginMethodArg> for LoginMethod {
    fn from(arg: LoginMethodArg) -> Self {
        match arg {
            LoginMethodArg::Traditional => LoginMethod::Traditional,
            LoginMethodArg::Neopass => LoginMethod::Neopass,
        }
    }
}

#[derive(Args, Debug)]
struct GlobalOptions {
    /// How to sign into Neopets
    #[arg(long, global = true, value_enum, default_value_t = LoginMethodArg::Traditional, env = "NQ2_LOGIN_METHOD")]
    login_method: LoginMethodArg,

    /// Credentials file: two lines for traditional login, three for NeoPass
    #[arg(long, global = true, default_value = DEFAULT_CREDENTIALS_PATH, env = "NQ2_CREDENTIALS")]
    credentials: PathBuf,

    /// Chrome/Chromium executable (searched on PATH when omitted)
    #[arg(long, global = true, visible_alias = "browser", env = "NQ2_CHROME")]
    chrome: Option<PathBuf>,

    /// Run the browser without a window
    #[arg(long, global = true, env = "NQ2_HEADLESS")]
    headless: bool,

    /// Remote debugging port
    #[arg(long, global = true, default_value_t = 9222, env = "NQ2_DEBUG_PORT")]
    port: u16,

    /// Attach to a browser already listening on --port instead of launching one
    #[arg(long, global = true)]
    connect: bool,

    /// Heal when HP falls below this fraction of max HP
    #[arg(long, global = true, env = "NQ2_HEAL_THRESHOLD")]
    heal_threshold: Option<f64>,

    /// Spells the party may cast from the start (repeatable)
    #[arg(long = "spell", global = true, value_parser = parse_skill)]
    spells: Vec<Skill>,

    /// error, warn, info, debug or trace (falls back to LOG_LEVEL)
    #[arg(long, global = true)]
    log_level: Option<String>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Interactive menu (the default)
    Menu,
    /// List the scripted chapters
    Chapters,
    /// Play one or more chapters, by name or number
    Run {
        #[arg(required = true, value_parser = parse_chapter)]
        chapters: Vec<ChapterId>,
    },
    /// Follow a path of direction digits (1-8)
    Walk {
        #[arg(value_parser = parse_path)]
        path: Path,
    },
    /// Fight battles in hunting mode for an even number of steps
    Grind {
        steps: u32,
        #[arg(long, value_parser = parse_path)]
        initial_path: Option<Path>,
    },
    /// Finish the battle on the current page
    Battle,
    /// Spend skill points
    SpendSkill {
        #[arg(value_parser = parse_ally)]
        ally: Ally,
        #[arg(value_parser = parse_skill)]
        skill: Skill,
        #[arg(long, default_value_t = 1)]
        times: u32,
    },
    /// Equip an item by name or id
    Equip {
        #[arg(value_parser = parse_equipment)]
        item: u32,
        #[arg(value_parser = parse_ally)]
        ally: Ally,
    },
    /// Run through an NPC's dialogue
    Talk {
        #[arg(value_parser = parse_npc)]
        npc: Npc,
    },
}

fn parse_chapter(s: &str) -> Result<ChapterId, String> {
    s.parse().map_err(|e| format!("{e}"))
}

fn parse_path(s: &str) -> Result<Path, String> {
    s.parse().map_err(|e| format!("{e}"))
}

fn parse_ally(s: &str) -> Result<Ally, String> {
    s.parse().map_err(|e| format!("{e}"))
}

fn parse_skill(s: &str) -> Result<Skill, String> {
    s.parse().map_err(|e| format!("{e}"))
}

fn parse_npc(s: &str) -> Result<Npc, String> {
    s.parse().map_err(|e| format!("{e}"))
}

fn parse_equipment(s: &str) -> Result<u32, String> {
    equipment_id(s).map_err(|e| format!("{e}"))
}

impl GlobalOptions {
    fn to_config(&self) -> AutoplayerConfig {
        let mut config = AutoplayerConfig::default();
        config.browser.executable = self.chrome.clone();
        config.browser.headless = self.headless;
        config.browser.debug_port = self.port;
        config.browser.connect_existing = self.connect;
        if let Some(threshold) = self.heal_threshold {
            config.battle.heal_threshold = threshold;
        }
        for spell in &self.spells {
            config.battle.enable_spell(*spell);
        }
        config
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let log_dir = autoplayer::logging::init_logging(cli.options.log_level.as_deref())
        .context("Failed to initialize logging")?;
    info!("Writing logs to {}", log_dir.display());

    let command = cli.command.unwrap_or(Commands::Menu);
    if let Commands::Chapters = command {
        return print_chapters();
    }

    let config = cli.options.to_config();
    let credentials = Credentials::load(&cli.options.credentials, cli.options.login_method.into())
        .with_context(|| {
            format!(
                "Failed to load credentials from {}",
                cli.options.credentials.display()
            )
        })?;

    let mut launcher = BrowserLauncher::new(config.browser.clone());
    let result = run(&mut launcher, command, credentials, &config).await;
    launcher.shutdown().await;

    match result {
        Ok(stats) => {
            print_stats(&stats);
            Ok(())
        }
        Err(e) => {
            error!("Autoplayer stopped: {e:#}");
            Err(e)
        }
    }
}

async fn run(
    launcher: &mut BrowserLauncher,
    command: Commands,
    credentials: Credentials,
    config: &AutoplayerConfig,
) -> Result<RunStats> {
    let page = launcher.start().await.context("Failed to start the browser")?;
    let mut autoplayer = Autoplayer::start(Arc::new(page), credentials, config)
        .await
        .context("Failed to log in and open the game")?;

    match command {
        Commands::Menu => menu::run_menu(&mut autoplayer).await?,
        Commands::Chapters => {}
        Commands::Run { chapters } => {
            for id in chapters {
                let chapter = id.chapter()?;
                autoplayer
                    .run_chapter(&chapter)
                    .await
                    .with_context(|| format!("Chapter {id} failed"))?;
            }
        }
        Commands::Walk { path } => autoplayer.follow_path(&path).await?,
        Commands::Grind {
            steps,
            initial_path,
        } => autoplayer.grind_battles(steps, initial_path.as_ref()).await?,
        Commands::Battle => autoplayer.ensure_overworld().await?,
        Commands::SpendSkill { ally, skill, times } => {
            autoplayer.spend_skillpoints(ally, skill, times).await?
        }
        Commands::Equip { item, ally } => autoplayer.equip(item, ally).await?,
        Commands::Talk { npc } => autoplayer.talk(npc).await?,
    }

    Ok(autoplayer.stats())
}

fn print_chapters() -> Result<()> {
    println!("{}", "NeoQuest II chapters".bold().cyan());
    for (i, chapter) in walkthrough::chapters()?.iter().enumerate() {
        println!(
            "{:>3}. {:<16} {} {}",
            i + 1,
            chapter.id.to_string().green(),
            format!("[Act {}]", chapter.id.act()).dimmed(),
            chapter.title
        );
    }
    Ok(())
}

fn print_stats(stats: &RunStats) {
    println!();
    println!("{}", "Session summary".bold());
    println!("  Steps taken:   {}", stats.steps_taken);
    println!("  Battles won:   {}", stats.battles_won.to_string().green());
    println!("  Turns played:  {}", stats.turns);
    println!("  Potions used:  {}", stats.potions_used);
    println!("  Spells cast:   {}", stats.spells_cast);
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn verify_cli() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_subcommands() {
        let cli = Cli::try_parse_from(["nq2-autoplayer", "grind", "100", "--initial-path", "7777"])
            .unwrap();
        match cli.command {
            Some(Commands::Grind {
                steps,
                initial_path,
            }) => {
                assert_eq!(steps, 100);
                assert_eq!(initial_path.unwrap().to_string(), "7777");
            }
            _ => panic!("expected grind"),
        }

        assert!(Cli::try_parse_from(["nq2-autoplayer", "walk", "129"]).is_err());
        assert!(Cli::try_parse_from(["nq2-autoplayer", "run"]).is_err());
    }

    #[test]
    fn test_global_options_build_config() {
        let cli = Cli::try_parse_from([
            "nq2-autoplayer",
            "--headless",
            "--port",
            "9333",
            "--heal-threshold",
            "0.4",
            "--spell",
            "heal",
            "spend-skill",
            "mipsy",
            "direct-damage",
            "--times",
            "3",
        ])
        .unwrap();
        let config = cli.options.to_config();
        assert!(config.browser.headless);
        assert_eq!(config.browser.debug_port, 9333);
        assert_eq!(config.battle.heal_threshold, 0.4);
        assert!(config.battle.can_cast(Skill::Heal));
        assert!(matches!(
            cli.command,
            Some(Commands::SpendSkill {
                ally: Ally::Mipsy,
                skill: Skill::DirectDamage,
                times: 3
            })
        ));
    }
}
