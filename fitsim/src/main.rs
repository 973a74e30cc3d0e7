use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use fitsim_core::{
    format_percentage, AttributeId, AttributeRange, EditorConfig, EditorError, ItemId,
    JsonCatalog, Multiplier, MutationEditor, MutationStore, MutationUpdate, ProviderError,
    QuantitySynchronizer, RecomputePipeline, SyncReport,
};
use serde::Serialize;
use std::path::{Path, PathBuf};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Log level (error, warn, info, debug, trace)
    #[arg(long, default_value = "info")]
    log_level: String,

    /// Editor config (JSON)
    #[arg(long)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Attach a mutation to an item and apply percentage edits
    Mutate {
        /// Mutation catalog (JSON)
        #[arg(long)]
        catalog: PathBuf,

        /// Fitted item receiving the mutation
        #[arg(long)]
        item: ItemId,

        /// Mutation item to attach
        #[arg(long)]
        mutation: ItemId,

        /// Edit as ATTRIBUTE=PERCENT, e.g. 20=15 or 552=-7.5
        #[arg(long = "set", value_parser = parse_edit)]
        edits: Vec<(AttributeId, String)>,

        /// Fail if any edit is rejected
        #[arg(long)]
        strict: bool,
    },
    /// Edit the total and active counts of a drone stack
    Drones {
        #[arg(long)]
        total: u32,

        #[arg(long)]
        active: u32,

        /// Maximum active drones allowed by the fit
        #[arg(long)]
        cap: u32,

        #[arg(long, allow_negative_numbers = true)]
        set_total: Option<i64>,

        #[arg(long, allow_negative_numbers = true)]
        set_active: Option<i64>,

        /// Change the active cap before applying count edits
        #[arg(long)]
        set_cap: Option<u32>,
    },
}

fn parse_edit(s: &str) -> Result<(AttributeId, String), String> {
    let (attribute, percent) = s
        .split_once('=')
        .ok_or_else(|| format!("Expected ATTRIBUTE=PERCENT, got {s:?}"))?;
    let attribute = attribute
        .trim()
        .parse()
        .map_err(|_| format!("Invalid attribute id {attribute:?}"))?;
    Ok((attribute, percent.to_string()))
}

/// Keeps the last persisted update so it can be printed on exit.
#[derive(Default)]
struct LastUpdate {
    update: Option<MutationUpdate>,
}

impl MutationStore for LastUpdate {
    fn persist(&mut self, update: &MutationUpdate) -> Result<(), ProviderError> {
        self.update = Some(update.clone());
        Ok(())
    }
}

/// Stands in for the ship-attribute pipeline; just records the request.
#[derive(Default)]
struct RecomputeFlag {
    requested: bool,
}

impl RecomputePipeline for RecomputeFlag {
    fn recompute(&mut self) {
        log::info!("Ship attributes would be recomputed now");
        self.requested = true;
    }
}

#[derive(Serialize)]
struct DroneSummary {
    total: u32,
    active: u32,
    report: SyncReport,
    recomputed: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();

    let level = std::str::FromStr::from_str(&args.log_level).unwrap_or(log::LevelFilter::Info);
    env_logger::Builder::new()
        .filter_level(level)
        .format_timestamp(None)
        .init();

    let config = match &args.config {
        Some(path) => EditorConfig::load(path)?,
        None => EditorConfig::default(),
    };

    match args.command {
        Commands::Mutate {
            catalog,
            item,
            mutation,
            edits,
            strict,
        } => run_mutate(config, &catalog, item, mutation, &edits, strict),
        Commands::Drones {
            total,
            active,
            cap,
            set_total,
            set_active,
            set_cap,
        } => run_drones(total, active, cap, set_total, set_active, set_cap),
    }
}

fn run_mutate(
    config: EditorConfig,
    catalog_path: &Path,
    item: ItemId,
    mutation: ItemId,
    edits: &[(AttributeId, String)],
    strict: bool,
) -> Result<()> {
    let catalog = JsonCatalog::load(catalog_path)
        .with_context(|| format!("Failed to load catalog {}", catalog_path.display()))?;

    let mut editor = MutationEditor::new(item, LastUpdate::default(), config);
    editor
        .select_mutation_item(mutation, &catalog)
        .with_context(|| format!("Cannot attach mutation {mutation} to item {item}"))?;

    let mut rejected = 0;
    for (attribute, percent) in edits {
        if let Err(e) = apply_edit(&mut editor, *attribute, percent) {
            rejected += 1;
            eprintln!("Rejected {attribute}={percent}: {}", describe(&e));
            editor.cancel_editing();
        }
    }

    editor.persist()?;
    let update = editor
        .store()
        .update
        .as_ref()
        .context("No mutation state was persisted")?;
    println!("{}", serde_json::to_string_pretty(update)?);

    if strict && rejected > 0 {
        bail!("{rejected} edit(s) rejected");
    }
    Ok(())
}

fn apply_edit(
    editor: &mut MutationEditor<LastUpdate>,
    attribute: AttributeId,
    percent: &str,
) -> Result<(), EditorError> {
    editor.begin_editing(attribute)?;
    editor.input(percent)?;
    let value = editor.confirm()?;
    match editor.session().range_of(attribute) {
        Some(range) => log::info!("Set {}", summarize(range, value)),
        None => log::info!("Set {} to {}", attribute, format_percentage(value)),
    }
    Ok(())
}

/// e.g. `552 to -7.5% (improvement, 30% of range)`
fn summarize(range: &AttributeRange, value: Multiplier) -> String {
    let direction = if value == Multiplier::ONE {
        "unchanged"
    } else if range.is_improvement(value) {
        "improvement"
    } else {
        "penalty"
    };
    format!(
        "{} to {} ({}, {:.0}% of range)",
        range.attribute_id(),
        format_percentage(value),
        direction,
        range.ratio(value) * 100.0
    )
}

fn describe(e: &EditorError) -> String {
    match e {
        EditorError::NotConfirmable { verdict, .. } => verdict
            .message()
            .unwrap_or_else(|| "empty input".to_string()),
        other => other.to_string(),
    }
}

fn run_drones(
    total: u32,
    active: u32,
    cap: u32,
    set_total: Option<i64>,
    set_active: Option<i64>,
    set_cap: Option<u32>,
) -> Result<()> {
    let mut sync = QuantitySynchronizer::new(total, active, cap);
    if let Some(cap) = set_cap {
        sync.set_active_cap(cap);
    }
    if let Some(total) = set_total {
        sync.set_total(total);
    }
    if let Some(active) = set_active {
        sync.set_active(active);
    }

    let counts = sync.counts();
    let mut pipeline = RecomputeFlag::default();
    let report = sync.teardown(&mut pipeline);

    let summary = DroneSummary {
        total: counts.total(),
        active: counts.active(),
        report,
        recomputed: pipeline.requested,
    };
    println!("{}", serde_json::to_string_pretty(&summary)?);
    Ok(())
}
