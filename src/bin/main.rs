use anyhow::{anyhow, Result};
use clap::{Parser, ValueEnum};
use log::debug;
use relic::release::{ReleaseInfo, DEFAULT_REMOVE, INFO_FILE};
use relic::template;
use relic::utils::git::GitDescriber;
use relic::version::{RemovePattern, VersionRecord, ABBREV};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(author, version = env!("RELIC_BUILD_VERSION"), about, long_about = None)]
struct Cli {
    /// Directory inside the git repository
    #[arg(long, default_value = ".", env = "RELIC_REPO")]
    repo: PathBuf,

    /// Literal text to purge from tag names, may be repeated; pass "" to purge nothing
    #[arg(long, env = "RELIC_REMOVE", value_delimiter = ',', default_value = DEFAULT_REMOVE)]
    remove: Vec<String>,

    /// Minimum length of the abbreviated commit hash
    #[arg(long, default_value_t = ABBREV, env = "RELIC_ABBREV")]
    abbrev: usize,

    /// Persisted version info [default: <repo>/RELIC-INFO]
    #[arg(long, env = "RELIC_INFO")]
    info_file: Option<PathBuf>,

    #[arg(long, value_enum, default_value_t = Format::Pep386)]
    format: Format,

    /// Also write version.rs into this directory
    #[arg(long)]
    template_dir: Option<PathBuf>,

    /// Ask git only, never read or write the info file
    #[arg(long)]
    no_cache: bool,
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
enum Format {
    Pep386,
    Short,
    Long,
    Json,
    Yaml,
}

fn remove_pattern(mut remove: Vec<String>) -> Option<RemovePattern> {
    match remove.len() {
        0 => None,
        1 => remove.pop().map(RemovePattern::Single),
        _ => Some(RemovePattern::Many(remove)),
    }
}

fn render(record: &VersionRecord, format: Format) -> Result<String> {
    let out = match format {
        Format::Pep386 => record.normalized.clone(),
        Format::Short => record.short.clone(),
        Format::Long => record.long.clone(),
        Format::Json => serde_json::to_string_pretty(record)?,
        Format::Yaml => serde_yaml::to_string(record)?.trim_end().to_string(),
    };
    Ok(out)
}

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    let info_file = cli
        .info_file
        .clone()
        .unwrap_or_else(|| cli.repo.join(INFO_FILE));
    debug!("repo: {}, info file: {}", cli.repo.display(), info_file.display());

    let release = ReleaseInfo::new(GitDescriber::new().in_dir(&cli.repo))
        .abbrev(cli.abbrev)
        .info_file(info_file);
    let release = match remove_pattern(cli.remove) {
        Some(pattern) => release.remove(pattern),
        None => release.keep_prefixes(),
    };

    let record = if cli.no_cache {
        release
            .resolve()
            .ok_or(anyhow!("{} is not inside a git repository", cli.repo.display()))?
    } else {
        release.get_info()
    };

    if let Some(dir) = &cli.template_dir {
        let path = template::write_template(&record, dir)?;
        debug!("wrote {}", path.display());
    }

    println!("{}", render(&record, cli.format)?);
    Ok(())
}
