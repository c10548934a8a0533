mod logging;

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};

use mediateca_core::config::AppConfig;
use mediateca_core::{Catalog, KindFilter, MediaRecord, SortKey};

#[derive(Parser, Debug)]
#[command(name = "mediateca", about = "Personal catalog of movies, songs and books on disk")]
struct Cli {
    /// Path to the config file
    #[arg(long)]
    config: Option<PathBuf>,

    /// Record store to use instead of the configured one
    #[arg(long)]
    store: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List catalog entries
    List {
        /// all, movie, song or book
        #[arg(long, default_value = "all")]
        kind: String,
        /// Case-insensitive category filter
        #[arg(long, default_value = "")]
        category: String,
        /// title or duration
        #[arg(long)]
        sort: Option<String>,
    },
    /// Show the details of one entry
    Show { location: PathBuf },
    /// Register a media file
    Add {
        file: PathBuf,
        #[arg(long)]
        title: String,
        /// Inferred from the file extension when omitted
        #[arg(long)]
        kind: Option<String>,
        #[command(flatten)]
        fields: FieldArgs,
    },
    /// Unregister an entry (the media file is kept)
    Remove { location: PathBuf },
    /// Replace fields of an entry
    Edit {
        location: PathBuf,
        #[arg(long)]
        title: Option<String>,
        #[command(flatten)]
        fields: FieldArgs,
    },
    /// Move the media file into another directory
    Move { location: PathBuf, dir: PathBuf },
    /// Rename the media file, keeping its extension
    Rename { location: PathBuf, new_name: String },
    /// Re-read the file size of an entry
    RefreshSize { location: PathBuf },
}

#[derive(Args, Debug)]
struct FieldArgs {
    #[arg(long)]
    category: Option<String>,
    /// Minutes, seconds or pages depending on the kind
    #[arg(long)]
    duration: Option<u32>,
    /// Language, artist or authors depending on the kind
    #[arg(long)]
    extra: Option<String>,
    #[arg(long)]
    size: Option<String>,
}

impl FieldArgs {
    fn apply(self, mut record: MediaRecord) -> MediaRecord {
        if let Some(category) = self.category {
            record.category = category;
        }
        if let Some(duration) = self.duration {
            record.duration = duration;
        }
        if let Some(extra) = self.extra {
            record.extra = extra;
        }
        if let Some(size) = self.size {
            record.disk_size = size;
        }
        record
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => AppConfig::load_from(path),
        None => AppConfig::load(),
    }
    .context("failed to load config")?;
    if let Some(store) = &cli.store {
        config.catalog.store_path = Some(store.to_string_lossy().into_owned());
    }

    let _guard = logging::init(&config.logging);
    tracing::debug!(store = %config.resolved_store_path().display(), "Opening catalog");

    let mut catalog = Catalog::from_config(&config).context("failed to open catalog")?;
    run(&mut catalog, cli.command)
}

fn run(catalog: &mut Catalog, command: Command) -> Result<()> {
    match command {
        Command::List { kind, category, sort } => {
            let Some(kind) = KindFilter::parse(&kind) else {
                bail!("unknown kind: {kind}");
            };
            let sort = sort.as_deref().and_then(SortKey::parse);
            for record in catalog.query(kind, &category, sort) {
                println!(
                    "{:<6} {:<40} {:<16} {:>6} {}",
                    record.kind().label(),
                    record.title,
                    record.category,
                    record.duration,
                    record.location
                );
            }
        }
        Command::Show { location } => {
            let location = location_arg(&location)?;
            let Some(record) = catalog.find_by_location(&location) else {
                bail!("not in catalog: {location}");
            };
            print!("{}", record.details());
            println!("Location: {}", record.location);
        }
        Command::Add {
            file,
            title,
            kind,
            fields,
        } => {
            if !file.is_file() {
                bail!("no such file: {}", file.display());
            }
            let kind = match kind {
                Some(k) => match KindFilter::parse(&k) {
                    Some(KindFilter::Only(kind)) => Some(kind),
                    _ => bail!("unknown kind: {k}"),
                },
                None => None,
            };
            let record = fields.apply(MediaRecord::from_file(&file, title, kind)?);
            let location = record.location.clone();
            catalog.add(record)?;
            println!("Added {location}");
        }
        Command::Remove { location } => {
            let location = location_arg(&location)?;
            match catalog.remove(&location)? {
                Some(record) => println!("Removed {}", record.title),
                None => println!("Nothing registered at {location}"),
            }
        }
        Command::Edit {
            location,
            title,
            fields,
        } => {
            let location = location_arg(&location)?;
            let Some(current) = catalog.find_by_location(&location).cloned() else {
                bail!("not in catalog: {location}");
            };
            let mut record = fields.apply(current);
            if let Some(title) = title {
                record.title = title;
            }
            catalog.edit(&location, record)?;
            println!("Updated {location}");
        }
        Command::Move { location, dir } => {
            let location = location_arg(&location)?;
            let new_location = catalog.move_record(&location, &dir)?;
            println!("Moved to {new_location}");
        }
        Command::Rename { location, new_name } => {
            let location = location_arg(&location)?;
            let new_location = catalog.rename(&location, &new_name)?;
            println!("Renamed to {new_location}");
        }
        Command::RefreshSize { location } => {
            let location = location_arg(&location)?;
            let size = catalog.refresh_disk_size(&location)?;
            println!("{location}: {size}");
        }
    }
    Ok(())
}

/// Catalog keys are absolute paths.
fn location_arg(path: &Path) -> Result<String> {
    let absolute = std::path::absolute(path)
        .with_context(|| format!("invalid path: {}", path.display()))?;
    Ok(absolute.to_string_lossy().into_owned())
}
