use std::{path::PathBuf, time::Duration};

use clap::Parser;
use rcj_core::MatchSettings;
use rcj_referee::{
    ConsoleSink, ControllerCatalog, ControllerWatcher, DirCatalog, JsonFileStore, Referee,
    StaticCatalog, Supervisor,
};
use rcj_robot::BehaviorKind;

/// How often the controllers directory is checked for changes.
const WATCH_INTERVAL: Duration = Duration::from_secs(1);

/// Directory of the referee's own program inside the controllers directory.
const SUPERVISOR_DIR: &str = "supervisor";

#[derive(Debug, Parser)]
#[command(name = "rcj-cli", about = "Simulated RoboCup Junior soccer matches")]
pub struct Cli {
    #[clap(long, short = 'f', default_value = "rcj-settings.json")]
    pub settings_file: PathBuf,

    /// Where flags, team controllers and the saved snapshot survive restarts.
    #[clap(long, default_value = "rcj-state.json")]
    pub state_file: PathBuf,

    /// One subdirectory per controller program. Without it the built-in
    /// behaviors are offered.
    #[clap(long)]
    pub controllers_dir: Option<PathBuf>,

    #[clap(long, default_value = "5555")]
    pub webui_port: u16,

    #[clap(long, default_value = "false")]
    pub no_webui: bool,

    #[clap(long, default_value = "info")]
    pub log_level: String,

    /// Defaults to the platform's local data directory.
    #[clap(long)]
    pub log_directory: Option<PathBuf>,

    /// Stop after this many ticks.
    #[clap(long)]
    pub ticks: Option<u64>,

    /// Start the next match as soon as one ends.
    #[clap(long, default_value = "false")]
    pub loop_matches: bool,

    /// Seed for the radio losses and the random ball placement.
    #[clap(long)]
    pub seed: Option<u64>,

    /// Run ticks back to back instead of in real time.
    #[clap(long, default_value = "false")]
    pub fast: bool,

    #[clap(long, default_value = "striker")]
    pub blue: String,

    #[clap(long, default_value = "chaser")]
    pub yellow: String,
}

impl Cli {
    /// The settings file, with the command line seed applied.
    pub fn settings(&self) -> MatchSettings {
        let mut settings = MatchSettings::load_or_insert(&self.settings_file);
        if let Some(seed) = self.seed {
            settings.radio.seed = Some(seed);
        }
        settings
    }

    pub fn catalog(&self) -> Box<dyn ControllerCatalog> {
        match &self.controllers_dir {
            Some(dir) => Box::new(DirCatalog::new(dir, Some(SUPERVISOR_DIR.to_owned()))),
            None => Box::new(StaticCatalog(
                BehaviorKind::ALL.iter().map(|k| k.name().to_owned()).collect(),
            )),
        }
    }

    pub fn supervisor(&self, settings: &MatchSettings, console: impl ConsoleSink + 'static) -> Supervisor {
        let referee = Referee::new(settings.referee.clone(), settings.time_step());
        let mut supervisor = Supervisor::new(
            referee,
            JsonFileStore::new(&self.state_file),
            console,
            self.catalog(),
        );
        if let Some(dir) = &self.controllers_dir {
            supervisor = supervisor.with_watcher(ControllerWatcher::new(dir, WATCH_INTERVAL));
        }
        if let Some(seed) = self.seed {
            supervisor = supervisor.with_seed(seed);
        }
        supervisor
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let cli = Cli::parse_from(["rcj-cli"]);
        assert_eq!(cli.settings_file, PathBuf::from("rcj-settings.json"));
        assert_eq!(cli.webui_port, 5555);
        assert!(!cli.no_webui);
        assert_eq!(cli.blue, "striker");
        assert_eq!(cli.yellow, "chaser");
        assert_eq!(cli.catalog().list().len(), BehaviorKind::ALL.len());
    }

    #[test]
    fn headless_run() {
        let cli = Cli::parse_from([
            "rcj-cli",
            "--no-webui",
            "--ticks",
            "100",
            "--seed",
            "3",
            "--yellow",
            "watcher",
        ]);
        assert!(cli.no_webui);
        assert_eq!(cli.ticks, Some(100));
        assert_eq!(cli.seed, Some(3));
        assert_eq!(cli.yellow, "watcher");
    }

    #[test]
    fn seed_reaches_the_radio() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        let cli = Cli::parse_from([
            "rcj-cli",
            "--settings-file",
            path.to_str().unwrap(),
            "--seed",
            "11",
        ]);
        assert_eq!(cli.settings().radio.seed, Some(11));
    }
}
