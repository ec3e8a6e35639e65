//! `leadbook` — command-line operator console for the Leadbook lead API.
//!
//! # Usage
//!
//! ```text
//! leadbook --url http://localhost:8080 list --tab b2b --status Prospect
//! leadbook show 3f1c…
//! leadbook status 3f1c… "In-conversation" "Called, interested in evening batch"
//! leadbook --config ~/.config/leadbook/config.toml counts
//! ```

mod client;
mod render;

use std::{path::PathBuf, time::Duration};

use anyhow::{Context, Result};
use chrono::{TimeDelta, Utc};
use clap::{Parser, Subcommand};
use client::HttpLeadStore;
use leadbook_core::{
  audit::NoteOrder,
  filter::{FilterSet, Tab},
  lead::{Actor, LeadStatus, LeadType},
  service::{LeadService, ServiceConfig},
  store::{DEFAULT_LIMIT, LeadQuery, MAX_LIMIT},
};
use serde::Deserialize;
use strum::IntoEnumIterator as _;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

// ─── CLI args ─────────────────────────────────────────────────────────────────

#[derive(Parser, Debug)]
#[command(name = "leadbook", about = "Operator console for the Leadbook lead store")]
struct Args {
  /// Path to a TOML config file (url, actor, timeout_secs).
  #[arg(short, long, value_name = "FILE")]
  config: Option<PathBuf>,

  /// Base URL of the leadbook server (default: http://localhost:8080).
  #[arg(long, env = "LEADBOOK_URL")]
  url: Option<String>,

  /// Name recorded as the author of notes (default: Admin).
  #[arg(long, env = "LEADBOOK_ACTOR")]
  actor: Option<String>,

  #[command(subcommand)]
  command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
  /// List one page of the leads matching the filters.
  List {
    #[arg(long, default_value_t = 1)]
    page:         u32,
    #[arg(long, default_value_t = DEFAULT_LIMIT)]
    limit:        u32,
    /// `all` or a lead type.
    #[arg(long, default_value = "all")]
    tab:          Tab,
    #[arg(long = "type", value_parser = parse_type)]
    lead_type:    Option<LeadType>,
    #[arg(long, value_parser = parse_status)]
    status:       Option<LeadStatus>,
    #[arg(long)]
    sub_category: Option<String>,
    /// Course category id.
    #[arg(long)]
    category:     Option<String>,
    #[arg(long)]
    course:       Option<String>,
    /// Case-insensitive match on name, email, query and course title.
    #[arg(long)]
    search:       Option<String>,
  },
  /// Show a lead with its note history.
  Show {
    id:     Uuid,
    /// List notes oldest first.
    #[arg(long)]
    oldest: bool,
  },
  /// Move a lead to a new status. The note is mandatory.
  Status {
    id:     Uuid,
    status: String,
    note:   String,
  },
  /// Add a note without changing the status.
  Note {
    id:     Uuid,
    text:   String,
    /// Status recorded with the note (default: the lead's current status).
    #[arg(long)]
    status: Option<String>,
  },
  /// Replace the lead's comment; pass "" to clear it.
  Comment { id: Uuid, text: String },
  /// Print the per-type badge counts.
  Counts,
  /// Print the status vocabulary.
  Statuses,
}

fn parse_type(s: &str) -> Result<LeadType, String> { LeadType::parse(s).map_err(|e| e.to_string()) }

fn parse_status(s: &str) -> Result<LeadStatus, String> {
  LeadStatus::parse(s).map_err(|e| e.to_string())
}

// ─── Config file ──────────────────────────────────────────────────────────────

/// Shape of the optional TOML config file.
#[derive(Deserialize, Default)]
struct ConfigFile {
  #[serde(default)]
  url:              String,
  #[serde(default)]
  actor:            String,
  timeout_secs:     Option<u64>,
  stale_after_secs: Option<i64>,
}

// ─── Entry point ──────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> Result<()> {
  tracing_subscriber::fmt()
    .with_writer(std::io::stderr)
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(LevelFilter::WARN.into())
        .from_env_lossy(),
    )
    .init();

  let args = Args::parse();

  let file_cfg: ConfigFile = if let Some(path) = &args.config {
    let raw = std::fs::read_to_string(path)
      .with_context(|| format!("reading config file {}", path.display()))?;
    toml::from_str(&raw).context("parsing config file")?
  } else {
    ConfigFile::default()
  };

  // CLI flags override config file, which overrides defaults.
  let base_url = args
    .url
    .or_else(|| (!file_cfg.url.is_empty()).then(|| file_cfg.url.clone()))
    .unwrap_or_else(|| "http://localhost:8080".to_string());
  let actor = args
    .actor
    .or_else(|| (!file_cfg.actor.is_empty()).then(|| file_cfg.actor.clone()))
    .map(Actor::new)
    .unwrap_or_default();

  let defaults = ServiceConfig::default();
  let config = ServiceConfig {
    default_actor:  actor,
    stale_after:    file_cfg
      .stale_after_secs
      .map(TimeDelta::seconds)
      .unwrap_or(defaults.stale_after),
    remote_timeout: file_cfg
      .timeout_secs
      .map(Duration::from_secs)
      .unwrap_or(defaults.remote_timeout),
  };

  let store = HttpLeadStore::new(&base_url, config.remote_timeout)
    .context("failed to build HTTP client")?;
  let service = LeadService::with_config(store, config);

  run(&service, args.command)
    .await
    .with_context(|| format!("request to {base_url} failed"))
}

async fn run(service: &LeadService<HttpLeadStore>, command: Command) -> Result<()> {
  match command {
    Command::List {
      page,
      limit,
      tab,
      lead_type,
      status,
      sub_category,
      category,
      course,
      search,
    } => {
      let mut query = LeadQuery::new(page, limit);
      query.tab = tab;
      query.filters = FilterSet {
        lead_type,
        sub_category,
        status,
        category,
        course_id: course,
        search_query: search,
      };
      let fetched = service.fetch(&query).await?;
      print!("{}", render::lead_table(&fetched.leads));
      println!("{}", render::pagination_line(&fetched.pagination));
      println!("{}", render::counts_line(&fetched.counts));
      if service.is_stale(Utc::now()).await {
        eprintln!("warning: lead data is stale; re-run to refresh");
      }
    }
    Command::Show { id, oldest } => {
      let lead = service.load_lead(id).await?;
      let order = if oldest { NoteOrder::OldestFirst } else { NoteOrder::NewestFirst };
      print!("{}", render::lead_detail(&lead, order));
    }
    Command::Status { id, status, note } => {
      service.load_lead(id).await?;
      let lead = service.change_status(id, &status, &note).await?;
      println!("{} is now {}", lead.name, lead.status());
    }
    Command::Note { id, text, status } => {
      let current = service.load_lead(id).await?.status();
      let status = status.unwrap_or_else(|| current.as_str().to_owned());
      let lead = service.add_note(id, &text, &status).await?;
      println!("note added to {} ({} notes)", lead.name, lead.notes().len());
    }
    Command::Comment { id, text } => {
      service.load_lead(id).await?;
      let lead = service.set_comment(id, &text).await?;
      if lead.comment.is_empty() {
        println!("comment cleared on {}", lead.name);
      } else {
        println!("comment updated on {}", lead.name);
      }
    }
    Command::Counts => {
      let fetched = service.fetch_page(1, MAX_LIMIT).await?;
      println!("{}", render::counts_line(&fetched.counts));
    }
    Command::Statuses => {
      for status in LeadStatus::iter() {
        println!("{status}");
      }
    }
  }
  Ok(())
}
