use std::io::{self, BufRead, Write};
use std::path::PathBuf;

use clap::Parser;

use crate::config::GrabberConfig;

#[derive(Parser, Debug, Default)]
#[command(
    name = "sticker-grabber",
    version,
    about = "Collect stickers and comments from a post, reel or profile"
)]
pub struct Args {
    /// Post, reel or profile URL, or a local directory / .zip of stickers.
    /// Asked for on stdin when omitted.
    pub input: Option<String>,

    /// RON configuration file (defaults to ./grabber.ron when present).
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Base directory for run folders and archives.
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Persistent browser profile directory.
    #[arg(long)]
    pub profile_dir: Option<PathBuf>,

    /// Run the browser without a window. Manual login is impossible then.
    #[arg(long)]
    pub headless: bool,

    /// Upper bound on scan rounds.
    #[arg(long)]
    pub max_rounds: Option<u32>,

    /// Flat rounds tolerated before the scan stops.
    #[arg(long)]
    pub stagnant_threshold: Option<u32>,

    /// Simultaneous downloads.
    #[arg(short, long)]
    pub workers: Option<usize>,

    /// Never pause for a manual login.
    #[arg(long)]
    pub non_interactive: bool,

    /// Keep the run directory but skip the zip archive.
    #[arg(long)]
    pub no_archive: bool,

    /// Log file, overwritten every run.
    #[arg(long)]
    pub log_file: Option<PathBuf>,

    /// Echo debug logging to the terminal.
    #[arg(short, long)]
    pub verbose: bool,
}

impl Args {
    /// Flags given on the command line win over the configuration file.
    pub fn apply(&self, config: &mut GrabberConfig) {
        if let Some(dir) = &self.output {
            config.output.base_dir = dir.clone();
        }
        if let Some(dir) = &self.profile_dir {
            config.browser.profile_dir = dir.clone();
        }
        if self.headless {
            config.browser.headless = true;
        }
        if let Some(rounds) = self.max_rounds {
            config.scan.max_rounds = rounds;
        }
        if let Some(threshold) = self.stagnant_threshold {
            config.scan.stagnant_threshold = threshold;
        }
        if let Some(workers) = self.workers {
            config.fetch.workers = workers;
        }
        if self.non_interactive || self.headless {
            config.interactive = false;
        }
        if self.no_archive {
            config.output.archive = false;
        }
        if let Some(path) = &self.log_file {
            config.log_file = Some(path.clone());
        }
    }
}

/// Ask for the input on stdin. `None` on EOF or a blank answer.
pub fn prompt_for_input() -> io::Result<Option<String>> {
    print!("Post, reel or profile URL (or a local folder / .zip): ");
    io::stdout().flush()?;
    let mut line = String::new();
    if io::stdin().lock().read_line(&mut line)? == 0 {
        return Ok(None);
    }
    let line = line.trim();
    Ok((!line.is_empty()).then(|| line.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn flags_override_config() {
        let args = Args::parse_from([
            "sticker-grabber",
            "https://www.instagram.com/p/ABC123/",
            "--output",
            "out",
            "--max-rounds",
            "7",
            "-w",
            "2",
            "--non-interactive",
        ]);
        let mut config = GrabberConfig::default();
        args.apply(&mut config);

        assert_eq!(args.input.as_deref(), Some("https://www.instagram.com/p/ABC123/"));
        assert_eq!(config.output.base_dir, PathBuf::from("out"));
        assert_eq!(config.scan.max_rounds, 7);
        assert_eq!(config.fetch.workers, 2);
        assert!(!config.interactive);
        assert!(config.output.archive);
    }

    #[test]
    fn headless_implies_non_interactive() {
        let args = Args::parse_from(["sticker-grabber", "--headless"]);
        let mut config = GrabberConfig::default();
        args.apply(&mut config);

        assert_eq!(args.input, None);
        assert!(config.browser.headless);
        assert!(!config.interactive);
    }

    #[test]
    fn absent_flags_leave_config_alone() {
        let mut config = GrabberConfig::default();
        Args::default().apply(&mut config);
        assert_eq!(config, GrabberConfig::default());
    }
}
