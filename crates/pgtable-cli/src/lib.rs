mod cli;
pub mod logging;
pub mod prompt;
mod render;
pub mod shell;

use anyhow::Context;
use pgtable::{BatchLoader, ConnectParams, LoaderConfig, SourceKind, TableDescriptor, TableGateway};

/// Entry point of `pgtable-crud`: one interactive operation on one table.
pub async fn run_crud(args: Vec<String>) -> anyhow::Result<()> {
    let cli::Command::Run(args) = cli::parse_crud_args(&args)? else {
        cli::print_crud_help();
        return Ok(());
    };

    let params = ConnectParams::new(args.host, args.database, args.user).password(args.password);
    let descriptor = TableDescriptor::new(params, args.table.as_str(), args.primary_key.as_str())
        .context("invalid table or primary key name")?;
    let builder = descriptor.query_builder();

    let mut shell = shell::Shell::new(TableGateway::new(descriptor), prompt::Console::stdio(), builder);
    shell.run().await.context("CRUD operation failed")?;
    Ok(())
}

/// Entry point of `pgtable-ingest`: validate a source file and bulk load it.
pub async fn run_ingest(args: Vec<String>) -> anyhow::Result<()> {
    let cli::Command::Run(args) = cli::parse_ingest_args(&args)? else {
        cli::print_ingest_help();
        return Ok(());
    };

    let kind: SourceKind = args.filetype.parse()?;
    let rows = kind
        .open(&args.filepath, &args.encoding)
        .accepted_rows()
        .with_context(|| format!("failed to read {}", args.filepath.display()))?;

    let config = LoaderConfig::from_env().context("invalid loader configuration")?;
    let loader = BatchLoader::new(config, args.filepath.clone())?;

    let report = loader
        .process(&rows)
        .await
        .with_context(|| format!("failed to load {} into {}", args.filepath.display(), loader.table()))?;

    match report.copied {
        Some(copied) => tracing::info!(copied, staged = %report.staged.display(), "ingestion complete"),
        None => tracing::warn!(
            staged = %report.staged.display(),
            "rows were staged but not copied: {}",
            report.failure.as_deref().unwrap_or("unknown error")
        ),
    }
    Ok(())
}
