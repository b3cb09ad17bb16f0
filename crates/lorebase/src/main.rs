use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

use lorebase::cli::commands::{self, SeedRequest};
use lorebase::cli::ConnectionArgs;
use lorebase::knowledge::{TopicKnowledge, DEFAULT_CURRICULUM, DEFAULT_GRADE, DEFAULT_RETRIEVE_LIMIT};

#[derive(Parser)]
#[command(name = "lorebase")]
#[command(about = "Lorebase - Story Knowledge Store\nSeed lesson knowledge and retrieve it for story generation")]
#[command(version)]
struct Cli {
  #[command(flatten)]
  connection: ConnectionArgs,

  /// Show verbose and debug output
  #[arg(short, long, global = true)]
  verbose: bool,

  #[command(subcommand)]
  command: Command,
}

/// Topic the seeded facts belong to
#[derive(Args)]
struct TopicArgs {
  /// Subject of the lesson (e.g. Mathematics)
  #[arg(long, requires = "topic")]
  subject: Option<String>,
  /// Topic within the subject (e.g. Trigonometry)
  #[arg(long, requires = "subject")]
  topic: Option<String>,
  /// Narrower area within the topic
  #[arg(long, requires = "topic")]
  specific_area: Option<String>,
  #[arg(long, default_value = DEFAULT_GRADE)]
  grade: String,
  #[arg(long, default_value = DEFAULT_CURRICULUM)]
  curriculum: String,
}

impl TopicArgs {
  fn into_topic(self) -> Option<TopicKnowledge> {
    let (subject, topic) = (self.subject?, self.topic?);
    let mut knowledge =
      TopicKnowledge::new(subject, topic).with_grade(self.grade).with_curriculum(self.curriculum);
    if let Some(area) = self.specific_area {
      knowledge = knowledge.with_specific_area(area);
    }
    Some(knowledge)
  }
}

#[derive(Subcommand)]
enum Command {
  /// Seed facts into the knowledge collection
  Seed {
    /// Facts to seed, one per argument
    texts: Vec<String>,
    /// Read additional facts from a file, one per line
    #[arg(short, long)]
    file: Option<PathBuf>,
    #[command(flatten)]
    topic: TopicArgs,
    /// Extra metadata as a JSON object
    #[arg(long)]
    metadata: Option<String>,
  },
  /// Retrieve the snippets most relevant to a query
  Search {
    /// Query terms (space-separated)
    #[arg(required = true)]
    terms: Vec<String>,
    /// Maximum number of results
    #[arg(short, long, default_value_t = DEFAULT_RETRIEVE_LIMIT)]
    limit: usize,
    /// Print results as JSON
    #[arg(long)]
    json: bool,
  },
  /// Show collection, index location, model and point count
  Status,
}

#[tokio::main]
async fn main() -> Result<()> {
  let cli = Cli::parse();

  scribe::init();
  scribe::set_verbose(cli.verbose);
  // Lance and DataFusion are chatty at info level
  let target = scribe::TRACING_TARGET;
  scribe::init_subscriber(&if cli.verbose {
    format!("info,{target}=trace,lance=warn,lance_datafusion=warn,datafusion=warn")
  } else {
    format!("{target}=info,lance=error,lance_datafusion=error,datafusion=error,warn")
  });

  let config = cli.connection.resolve()?;

  match cli.command {
    Command::Seed { texts, file, topic, metadata } => {
      let request = SeedRequest { texts, file, topic: topic.into_topic(), metadata };
      commands::seed(&config, request).await
    }
    Command::Search { terms, limit, json } => commands::search(&config, &terms, limit, json).await,
    Command::Status => commands::status(&config).await,
  }
}
