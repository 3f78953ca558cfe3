use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tokio_util::sync::CancellationToken;
use tracing::debug;
use tracing_subscriber::EnvFilter;

use stepgraph_codec::{check_document_version, decode, encode, reconstruct, sanitize};
use stepgraph_config::WorkflowDocument;
use stepgraph_session::{
  EditorSession, Role, RoleDirectory, SessionError, StaticRoleDirectory, stale_roles,
};
use stepgraph_store::{SqliteStore, WorkflowStore};
use stepgraph_workflow::{TemplateKind, instantiate};

/// Stepgraph - approval and fulfillment workflow graphs
#[derive(Parser)]
#[command(name = "stepgraph")]
#[command(version, about, long_about = None)]
struct Cli {
  /// Path to the data directory (default: ~/.stepgraph)
  #[arg(long, global = true)]
  data_dir: Option<PathBuf>,

  #[command(subcommand)]
  command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
  /// Print a template instance as a workflow document
  Template {
    /// singleApproval, twoStepApproval or parallelApproval
    kind: TemplateKind,
  },

  /// Check a workflow document and print every violation
  Validate {
    /// Path to the workflow document
    file: PathBuf,

    /// JSON list of directory roles; assigned roles missing from it are reported
    #[arg(long)]
    roles: Option<PathBuf>,
  },

  /// Print a workflow document without non-schema fields
  Sanitize {
    /// Path to the workflow document
    file: PathBuf,
  },

  /// Store a workflow document
  Save {
    workflow_id: String,

    /// Path to the workflow document
    file: PathBuf,
  },

  /// Print a stored workflow document
  Show { workflow_id: String },

  /// List stored workflows
  List,

  /// Delete a stored workflow
  Delete { workflow_id: String },
}

fn main() -> Result<ExitCode> {
  let cli = Cli::parse();

  tracing_subscriber::fmt()
    .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
    .with_writer(std::io::stderr)
    .init();

  let data_dir = match cli.data_dir {
    Some(dir) => dir,
    None => dirs::home_dir()
      .context("could not determine home directory")?
      .join(".stepgraph"),
  };
  debug!(data_dir = %data_dir.display(), "using data directory");

  match cli.command {
    Some(Commands::Template { kind }) => {
      print_document(&encode(&instantiate(kind)))?;
    }
    Some(Commands::Validate { file, roles }) => {
      return validate_file(&file, roles.as_deref());
    }
    Some(Commands::Sanitize { file }) => {
      let document = read_document(&file)?;
      print_document(&sanitize(&document))?;
    }
    Some(Commands::Save { workflow_id, file }) => {
      return block_on(save_workflow(workflow_id, file, data_dir));
    }
    Some(Commands::Show { workflow_id }) => {
      block_on(show_workflow(workflow_id, data_dir))?;
    }
    Some(Commands::List) => {
      block_on(list_workflows(data_dir))?;
    }
    Some(Commands::Delete { workflow_id }) => {
      block_on(delete_workflow(workflow_id, data_dir))?;
    }
    None => {
      println!("stepgraph - use --help to see available commands");
    }
  }

  Ok(ExitCode::SUCCESS)
}

fn block_on<T>(future: impl Future<Output = Result<T>>) -> Result<T> {
  let rt = tokio::runtime::Runtime::new().context("failed to start tokio runtime")?;
  rt.block_on(future)
}

/// Read a workflow file, rejecting newer versions before the rest of the
/// document is interpreted.
fn read_document(path: &Path) -> Result<WorkflowDocument> {
  let content = std::fs::read_to_string(path)
    .with_context(|| format!("failed to read workflow file: {}", path.display()))?;
  let value: serde_json::Value = serde_json::from_str(&content)
    .with_context(|| format!("failed to parse workflow file: {}", path.display()))?;

  check_document_version(&value)
    .with_context(|| format!("cannot read workflow file: {}", path.display()))?;

  serde_json::from_value(value)
    .with_context(|| format!("failed to parse workflow file: {}", path.display()))
}

fn print_document(document: &WorkflowDocument) -> Result<()> {
  println!("{}", serde_json::to_string_pretty(document)?);
  Ok(())
}

fn validate_file(path: &Path, roles_file: Option<&Path>) -> Result<ExitCode> {
  let document = read_document(path)?;
  let workflow = reconstruct(&document).context("failed to reconstruct workflow")?;
  let violations = workflow.validate();
  for violation in &violations {
    println!("{violation}");
  }

  if let Some(roles_file) = roles_file {
    let content = std::fs::read_to_string(roles_file)
      .with_context(|| format!("failed to read roles file: {}", roles_file.display()))?;
    let roles: Vec<Role> = serde_json::from_str(&content)
      .with_context(|| format!("failed to parse roles file: {}", roles_file.display()))?;
    let directory = StaticRoleDirectory::new(roles);
    let roles = block_on(async { Ok(directory.list_roles().await?) })?;

    for stale in stale_roles(&workflow, &roles) {
      eprintln!(
        "warning: step {} references unknown role {}",
        stale.step_id, stale.role_id
      );
    }
  }

  if violations.is_empty() {
    eprintln!(
      "Workflow is valid: {} steps, {} connections",
      workflow.steps.len(),
      workflow.connections.len()
    );
    Ok(ExitCode::SUCCESS)
  } else {
    eprintln!("Workflow has {} violation(s)", violations.len());
    Ok(ExitCode::FAILURE)
  }
}

async fn open_store(data_dir: &Path) -> Result<SqliteStore> {
  tokio::fs::create_dir_all(data_dir)
    .await
    .with_context(|| format!("failed to create data directory: {}", data_dir.display()))?;

  let path = data_dir.join("workflows.db");
  SqliteStore::open(&path)
    .await
    .with_context(|| format!("failed to open workflow database: {}", path.display()))
}

async fn save_workflow(workflow_id: String, file: PathBuf, data_dir: PathBuf) -> Result<ExitCode> {
  let document = read_document(&file)?;
  let workflow = reconstruct(&document).context("failed to reconstruct workflow")?;

  let store: Arc<dyn WorkflowStore> = Arc::new(open_store(&data_dir).await?);
  let cancel = CancellationToken::new();
  let (mut session, worker) = EditorSession::spawn(workflow_id, workflow, store, cancel.clone());

  let result = match session.save() {
    Ok(revision) => {
      session
        .flush()
        .await
        .with_context(|| format!("failed to save workflow {}", session.workflow_id()))?;
      eprintln!("Saved workflow {} (revision {revision})", session.workflow_id());
      ExitCode::SUCCESS
    }
    Err(SessionError::Invalid(violations)) => {
      for violation in &violations {
        println!("{violation}");
      }
      eprintln!(
        "Workflow {} not saved: {} violation(s)",
        session.workflow_id(),
        violations.len()
      );
      ExitCode::FAILURE
    }
    Err(e) => return Err(e.into()),
  };

  cancel.cancel();
  worker.await.context("save worker panicked")?;
  Ok(result)
}

async fn show_workflow(workflow_id: String, data_dir: PathBuf) -> Result<()> {
  let store = open_store(&data_dir).await?;
  let stored = store
    .load(&workflow_id)
    .await?
    .with_context(|| format!("workflow '{workflow_id}' not found"))?;

  // Decode first so that a stored document this build cannot read is reported.
  let workflow = decode(&stored.document.0)
    .with_context(|| format!("failed to decode workflow '{workflow_id}'"))?;

  eprintln!("Updated: {}", stored.updated_at.to_rfc3339());
  print_document(&encode(&workflow))
}

async fn list_workflows(data_dir: PathBuf) -> Result<()> {
  let store = open_store(&data_dir).await?;
  for summary in store.list().await? {
    println!("{}\t{}", summary.workflow_id, summary.updated_at.to_rfc3339());
  }
  Ok(())
}

async fn delete_workflow(workflow_id: String, data_dir: PathBuf) -> Result<()> {
  let store = open_store(&data_dir).await?;
  store
    .delete(&workflow_id)
    .await
    .with_context(|| format!("failed to delete workflow '{workflow_id}'"))?;
  eprintln!("Deleted workflow {workflow_id}");
  Ok(())
}
