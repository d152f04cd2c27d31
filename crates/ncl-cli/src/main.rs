//! CLI frontend for the narrative consequence ledger.

mod commands;

use std::process;

use clap::{Args, Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(
    name = "ncl",
    about = "Narrative consequence ledger: track what every chapter leaves behind",
    version,
    propagate_version = true
)]
struct Cli {
    #[command(flatten)]
    ledger: commands::LedgerArgs,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Record the consequence of a resolved chapter
    Record {
        /// Chapter the choice was resolved in
        chapter: u32,

        /// Reference of the winning choice (e.g. c12-b)
        choice_ref: String,

        /// Text of the winning choice
        choice_text: String,

        /// House affected by the choice (repeatable)
        #[arg(long = "house")]
        houses: Vec<String>,

        /// Description to use instead of the synthesized one
        #[arg(long)]
        hint: Option<String>,
    },

    /// Resolve a consequence and settle its bets
    Resolve {
        /// Consequence id or unique id prefix
        id: String,

        /// Chapter the consequence resolved in
        chapter: u32,

        /// How it was resolved
        text: String,
    },

    /// Settle bets left open on an already resolved consequence
    Settle {
        /// Consequence id or unique id prefix
        id: String,
    },

    /// Score the ledger at a chapter and show the debt report
    Report {
        /// Chapter to score at
        chapter: u32,
    },

    /// Print the prompt context block for a chapter
    Context {
        /// Chapter about to be generated
        chapter: u32,
    },

    /// List consequences
    List {
        /// Include resolved consequences
        #[arg(short, long)]
        all: bool,
    },

    /// Open the timing market on a consequence and show its options
    Market {
        /// Consequence id or unique id prefix
        id: String,
    },

    /// Place a bet on when a consequence resolves
    Bet(BetArgs),
}

#[derive(Args)]
struct BetArgs {
    /// Consequence id or unique id prefix
    id: String,

    /// Who is betting
    bettor: String,

    /// Predicted resolution chapter
    chapter: u32,

    /// Stake
    amount: f64,
}

fn init_tracing() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "warn".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn main() {
    init_tracing();
    let cli = Cli::parse();
    let ledger = &cli.ledger;

    let result = match cli.command {
        Commands::Record {
            chapter,
            choice_ref,
            choice_text,
            houses,
            hint,
        } => commands::record::run(
            ledger,
            chapter,
            &choice_ref,
            &choice_text,
            &houses,
            hint.as_deref(),
        ),
        Commands::Resolve { id, chapter, text } => {
            commands::resolve::run(ledger, &id, chapter, &text)
        }
        Commands::Settle { id } => commands::settle::run(ledger, &id),
        Commands::Report { chapter } => commands::report::run(ledger, chapter),
        Commands::Context { chapter } => commands::context::run(ledger, chapter),
        Commands::List { all } => commands::list::run(ledger, all),
        Commands::Market { id } => commands::market::run(ledger, &id),
        Commands::Bet(BetArgs {
            id,
            bettor,
            chapter,
            amount,
        }) => commands::bet::run(ledger, &id, &bettor, chapter, amount),
    };

    if let Err(e) = result {
        eprintln!("error: {e}");
        process::exit(1);
    }
}
