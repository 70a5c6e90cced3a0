///
/// This module implements the CLI interface for fedora-components: command parsing,
/// dispatch to the component operations, and rendering of their results.
///
/// All repository logic (collector, components, capability traits) lives in the
/// [`fedora-components-core`] crate; this module is CLI glue only.
///
/// ## Output
/// - Object and member listings are printed as pretty JSON.
/// - XML payloads and disseminations are written raw to `--output` or stdout.
/// - Scalar results (assigned PID, purge timestamp) are printed as a single line.
///
/// ## How To Use
/// - From the shell: `fedora-components --help`.
/// - Programmatically: call [`run`] with a constructed [`Cli`], or [`execute`] with an
///   explicit client and output sink.
///
/// [`fedora-components-core`]: ../../fedora_components_core/
use crate::fedora_client::FedoraClient;
use crate::load_config::{load_config, CliConfig};
use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use fedora_components_core::components::{
    self, collection_members, collection_objects, disseminate, export_object, fetch_object_xml,
    ingest_file, work_objects, DisseminationRequest,
};
use fedora_components_core::contract::{ExportContext, XmlFormat};
use std::io::Write;
use std::path::{Path, PathBuf};

/// CLI for fedora-components: search and manage objects in a Fedora repository.
#[derive(Parser, Debug)]
#[clap(
    name = "fedora-components",
    version,
    about = "Search, ingest, export and purge objects in a Fedora Commons repository"
)]
pub struct Cli {
    /// Path to the YAML config file (defaults apply when omitted)
    #[clap(long, global = true)]
    pub config: Option<PathBuf>,

    #[clap(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// List collection objects matching the collection search pattern
    Collections {
        /// Override `search.collection_pattern`
        #[clap(long)]
        pattern: Option<String>,
    },
    /// List work objects whose PID starts with the work prefix
    Works {
        /// Override `search.work_prefix`
        #[clap(long)]
        prefix: Option<String>,
    },
    /// List members of the super collection via the resource index
    Members {
        #[clap(long)]
        predicate: Option<String>,
        /// Super collection PID or info:fedora/ URI
        #[clap(long)]
        collection: Option<String>,
    },
    /// Export an object in the given XML format
    Export {
        #[clap(long)]
        pid: String,
        #[clap(long, default_value = "foxml")]
        format: XmlFormat,
        #[clap(long, default_value = "public")]
        context: ExportContext,
        #[clap(long)]
        output: Option<PathBuf>,
    },
    /// Fetch the stored XML of an object
    ObjectXml {
        #[clap(long)]
        pid: String,
        #[clap(long)]
        output: Option<PathBuf>,
    },
    /// Purge an object from the repository
    Purge {
        #[clap(long)]
        pid: String,
        #[clap(long, default_value = "Deleting a component...")]
        log_message: String,
        /// `true` or `false`
        #[clap(long, default_value = "false")]
        forced: String,
    },
    /// Ingest a serialized object from a file
    Ingest {
        #[clap(long)]
        file: PathBuf,
        #[clap(long, default_value = "foxml")]
        format: XmlFormat,
    },
    /// Run a behaviour method on one part of an object
    Disseminate {
        #[clap(long)]
        pid: String,
        #[clap(long, default_value = "monk:behav-def-book")]
        sdef: String,
        #[clap(long, default_value = "getChunk")]
        method: String,
        /// Part identifier, passed as `xmlid`
        #[clap(long)]
        part: String,
        #[clap(long)]
        output: Option<PathBuf>,
    },
}

/// Async CLI entrypoint for integration tests and main()
pub async fn run(cli: Cli) -> Result<()> {
    // Emit a top-level 'trace_initialised' event at the very start
    tracing::info!("trace_initialised");

    let config = match &cli.config {
        Some(path) => load_config(path)?,
        None => CliConfig::from_env(),
    };
    config.trace_loaded();

    let client = FedoraClient::new(&config.repository).context("Failed to construct Fedora client")?;
    let mut stdout = std::io::stdout().lock();
    let result = execute(cli.command, &config, &client, &mut stdout).await;
    match &result {
        Ok(()) => tracing::info!("Command complete"),
        Err(e) => tracing::error!(error = %e, "Command failed"),
    }
    result
}

/// Run one command against `client`, writing its result to `out`.
pub async fn execute<W: Write>(
    command: Commands,
    config: &CliConfig,
    client: &FedoraClient,
    out: &mut W,
) -> Result<()> {
    match command {
        Commands::Collections { pattern } => {
            let mut search = config.search.clone();
            if let Some(pattern) = pattern {
                search.collection_pattern = pattern;
            }
            let objects = collection_objects(client, &search).await?;
            write_json(out, &objects)
        }
        Commands::Works { prefix } => {
            let mut search = config.search.clone();
            if let Some(prefix) = prefix {
                search.work_prefix = prefix;
            }
            let objects = work_objects(client, &search).await?;
            write_json(out, &objects)
        }
        Commands::Members {
            predicate,
            collection,
        } => {
            let mut membership = config.membership.clone();
            if let Some(predicate) = predicate {
                membership.predicate = predicate;
            }
            if let Some(collection) = collection {
                membership.super_collection = collection;
            }
            let listing = collection_members(client, &membership).await?;
            write_json(out, &listing)
        }
        Commands::Export {
            pid,
            format,
            context,
            output,
        } => {
            let xml = export_object(client, &pid, format, context).await?;
            write_payload(out, output.as_deref(), &xml)
        }
        Commands::ObjectXml { pid, output } => {
            let xml = fetch_object_xml(client, &pid).await?;
            write_payload(out, output.as_deref(), &xml)
        }
        Commands::Purge {
            pid,
            log_message,
            forced,
        } => {
            let purged_at = components::purge_object(client, &pid, &log_message, &forced).await?;
            writeln!(out, "{purged_at}")?;
            Ok(())
        }
        Commands::Ingest { file, format } => {
            let pid = ingest_file(client, &file, format).await?;
            writeln!(out, "{pid}")?;
            Ok(())
        }
        Commands::Disseminate {
            pid,
            sdef,
            method,
            part,
            output,
        } => {
            let request = DisseminationRequest {
                pid,
                sdef_pid: sdef,
                method,
                part_id: part,
            };
            let stream = disseminate(client, &request).await?;
            tracing::info!(mime_type = %stream.mime_type, "Writing dissemination");
            write_payload(out, output.as_deref(), &stream.content)
        }
    }
}

fn write_json<W: Write, T: serde::Serialize>(out: &mut W, value: &T) -> Result<()> {
    serde_json::to_writer_pretty(&mut *out, value)?;
    writeln!(out)?;
    Ok(())
}

fn write_payload<W: Write>(out: &mut W, path: Option<&Path>, bytes: &[u8]) -> Result<()> {
    match path {
        Some(path) => {
            std::fs::write(path, bytes)
                .with_context(|| format!("Failed to write output file {}", path.display()))?;
            tracing::info!(path = %path.display(), bytes = bytes.len(), "Wrote output file");
        }
        None => out.write_all(bytes)?,
    }
    Ok(())
}
