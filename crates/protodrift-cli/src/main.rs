//! protodrift - Regenerate canonical .proto files from compiled descriptors
//!
//! This tool loads a compiled descriptor set, extracts every message, enum
//! and service per schema module, and writes one canonical `.proto` document
//! per module for diffing against hand-maintained schema files.

use anyhow::{bail, Context, Result};
use clap::{Parser, ValueEnum};
use protodrift_core::output::{output_path, write_document, DEFAULT_EXTENSION};
use protodrift_core::render::{BASE_MODULE, TIMESTAMP_IMPORT};
use protodrift_core::{
    CollisionPolicy, Extractor, ExtractorConfig, FixedImport, NoImports, RenderConfig, Renderer,
    SchemaModule, SchemaRegistry, TypeTable, DEFAULT_MODULES,
};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, error, info, warn, Level};
use tracing_subscriber::EnvFilter;

/// Regenerate canonical .proto files from compiled protobuf descriptors
#[derive(Parser, Debug)]
#[command(name = "protodrift")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// FileDescriptorSet file, or a directory of them (*.pb, *.binpb, *.desc, *.protoset)
    #[arg(short, long, env = "PROTODRIFT_DESCRIPTORS")]
    descriptors: PathBuf,

    /// Output directory for extracted documents
    #[arg(short, long, env = "PROTODRIFT_OUTPUT", default_value = "proto/xai/v1")]
    output: PathBuf,

    /// Module to extract; repeat for several (default: the full xAI module list)
    #[arg(short, long = "module", value_name = "NAME")]
    modules: Vec<String>,

    /// Extension of each output file
    #[arg(long, default_value = DEFAULT_EXTENSION)]
    extension: String,

    /// Package declared in every document
    #[arg(long, default_value = protodrift_core::render::DEFAULT_PACKAGE)]
    package: String,

    /// Value of the go_package option
    #[arg(long, default_value = protodrift_core::render::DEFAULT_GO_PACKAGE)]
    go_package: String,

    /// Import strategy
    #[arg(long, value_enum, default_value = "fixed")]
    imports: ImportStrategy,

    /// Import emitted by the fixed strategy
    #[arg(long, default_value = TIMESTAMP_IMPORT)]
    import: String,

    /// Module that gets no import line under the fixed strategy; repeatable
    #[arg(long = "no-import-module", value_name = "NAME", default_values_t = [BASE_MODULE.to_string()])]
    no_import_modules: Vec<String>,

    /// Fail a module when two different definitions share a name
    #[arg(long)]
    strict_collisions: bool,

    /// Lift nested message types to module scope
    #[arg(long)]
    nested_messages: bool,

    /// Name fixed32, fixed64 and group fields instead of rendering `type<N>`
    #[arg(long)]
    full_scalar_table: bool,

    /// Mark streaming rpc types with `stream`
    #[arg(long)]
    mark_streaming: bool,

    /// Verbosity level (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Dry run - print documents instead of writing files
    #[arg(long)]
    dry_run: bool,

    /// Only list the modules present in the descriptor set
    #[arg(long)]
    list_modules: bool,

    /// Compare rendered documents with existing files instead of writing
    #[arg(long, conflicts_with = "dry_run")]
    check: bool,
}

/// How import lines are chosen
#[derive(Debug, Clone, Copy, ValueEnum)]
enum ImportStrategy {
    /// One fixed import for every module outside the exclusion list
    Fixed,
    /// No import lines
    None,
}

/// Result of comparing a rendered document with the file on disk
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CheckOutcome {
    Unchanged,
    Drifted,
    Missing,
}

/// Per-run counters
#[derive(Default)]
struct RunStats {
    modules: usize,
    written: usize,
    failed: usize,
    drifted: usize,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize tracing
    let level = match cli.verbose {
        0 => Level::WARN,
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    };

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive(level.into()))
        .with_target(false)
        .init();

    let registry = SchemaRegistry::from_path(&cli.descriptors).with_context(|| {
        format!(
            "Failed to load descriptors from {}",
            cli.descriptors.display()
        )
    })?;

    if cli.list_modules {
        for name in registry.module_names() {
            println!("{}", name);
        }
        return Ok(());
    }

    let stats = run(&cli, &registry)?;
    info!(
        "Summary: {} modules, {} written, {} failed, {} drifted",
        stats.modules, stats.written, stats.failed, stats.drifted
    );

    if stats.failed > 0 {
        bail!("{} module(s) could not be written", stats.failed);
    }
    if stats.drifted > 0 {
        bail!("{} module(s) differ from {}", stats.drifted, cli.output.display());
    }
    Ok(())
}

/// The module list, either from the command line or the default set
fn module_list(cli: &Cli) -> Vec<&str> {
    if cli.modules.is_empty() {
        DEFAULT_MODULES.to_vec()
    } else {
        cli.modules.iter().map(String::as_str).collect()
    }
}

fn build_extractor(cli: &Cli) -> Extractor {
    let policy = if cli.strict_collisions {
        CollisionPolicy::Reject
    } else {
        CollisionPolicy::LastWins
    };
    let table = if cli.full_scalar_table {
        TypeTable::Complete
    } else {
        TypeTable::Reference
    };
    Extractor::with_config(
        ExtractorConfig::new()
            .collision_policy(policy)
            .include_nested_messages(cli.nested_messages)
            .type_table(table),
    )
}

fn build_renderer(cli: &Cli) -> Renderer {
    let config = RenderConfig::new()
        .package(&cli.package)
        .go_package(&cli.go_package)
        .mark_streaming(cli.mark_streaming);
    let renderer = Renderer::new().with_config(config);

    match cli.imports {
        ImportStrategy::Fixed => {
            let fixed = cli
                .no_import_modules
                .iter()
                .fold(FixedImport::new(&cli.import), |fixed, m| fixed.exclude(m));
            renderer.with_imports(fixed)
        }
        ImportStrategy::None => renderer.with_imports(NoImports),
    }
}

/// Process every module of the list
fn run(cli: &Cli, registry: &SchemaRegistry) -> Result<RunStats> {
    // Every module must exist before any output is produced
    let modules = registry
        .resolve(module_list(cli))
        .context("Descriptor set does not cover the module list")?;

    let extractor = build_extractor(cli);
    let renderer = build_renderer(cli);
    let mut stats = RunStats::default();

    for module in modules {
        stats.modules += 1;
        println!("Processing {}...", module.name());

        match process_module(cli, &extractor, &renderer, module) {
            Ok(ModuleResult::Written(path)) => {
                println!("  -> {}", path.display());
                stats.written += 1;
            }
            Ok(ModuleResult::Checked(outcome)) => {
                if outcome != CheckOutcome::Unchanged {
                    stats.drifted += 1;
                }
            }
            Ok(ModuleResult::Printed) => {}
            Err(e) => {
                // Already-written modules stand; keep going with the rest
                error!("Module {}: {:#}", module.name(), e);
                stats.failed += 1;
            }
        }
    }

    Ok(stats)
}

enum ModuleResult {
    Written(PathBuf),
    Checked(CheckOutcome),
    Printed,
}

/// Extract, render and write (or check) one module
fn process_module(
    cli: &Cli,
    extractor: &Extractor,
    renderer: &Renderer,
    module: &SchemaModule,
) -> Result<ModuleResult> {
    let extraction = extractor.extract(module)?;
    let module_stats = extraction.stats();

    info!(
        module = module.name(),
        messages = module_stats.message_count,
        enums = module_stats.enum_count,
        services = module_stats.service_count,
        "Extracted module"
    );
    println!(
        "  Extracted {} messages, {} enums, {} services",
        module_stats.message_count, module_stats.enum_count, module_stats.service_count
    );
    if module_stats.unknown_type_count > 0 {
        warn!(
            "Module {} has {} field(s) with unrecognized type codes",
            module.name(),
            module_stats.unknown_type_count
        );
    }

    let content = renderer.render(module.name(), &extraction);

    if cli.dry_run {
        println!("---");
        print!("{}", content);
        println!("---");
        return Ok(ModuleResult::Printed);
    }

    if cli.check {
        let path = output_path(&cli.output, module.name(), &cli.extension);
        let outcome = check_document(&path, &content)?;
        println!("  {:?}: {}", outcome, path.display());
        return Ok(ModuleResult::Checked(outcome));
    }

    let path = write_document(&cli.output, module.name(), &cli.extension, &content)?;
    Ok(ModuleResult::Written(path))
}

/// Compute the blake3 digest of the content
fn content_hash(content: &[u8]) -> blake3::Hash {
    blake3::hash(content)
}

/// Compare a rendered document with the file at `path`
fn check_document(path: &Path, content: &str) -> Result<CheckOutcome> {
    if !path.exists() {
        return Ok(CheckOutcome::Missing);
    }

    let existing =
        fs::read(path).with_context(|| format!("Failed to read {}", path.display()))?;
    let (old, new) = (content_hash(&existing), content_hash(content.as_bytes()));
    debug!(
        "{}: on disk {}, rendered {}",
        path.display(),
        old.to_hex(),
        new.to_hex()
    );

    Ok(if old == new {
        CheckOutcome::Unchanged
    } else {
        CheckOutcome::Drifted
    })
}
