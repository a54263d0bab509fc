//! Terminal front end for the vocabulary trainer.
//!
//! All scheduling logic lives in kotoba-core; this binary only loads the
//! catalog, wires a file-backed blob store, and runs the interactive loops.

use std::fs;
use std::io::{self, BufRead, Write};
use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use chrono::Utc;
use clap::{Parser, Subcommand};
use kotoba_core::{
    Catalog, Direction, FileStore, Grade, QuizMode, QuizParams, SourceFilter, Trainer,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "kotoba", about = "Spaced-repetition vocabulary trainer")]
struct Cli {
    /// Directory holding progress and settings blobs.
    #[arg(long, default_value = "data")]
    data_dir: PathBuf,

    /// Vocabulary CSV to load.
    #[arg(long, default_value = "data/vocab_master.csv")]
    catalog: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Interactive review loop.
    Review {
        /// Deck to review ("all" for every deck).
        #[arg(long)]
        deck: Option<String>,
        /// Only present cards that are due.
        #[arg(long)]
        only_due: bool,
    },
    /// Run a timed quiz.
    Quiz {
        #[arg(long, value_parser = parse_source, default_value = "all")]
        source: SourceFilter,
        #[arg(long, default_value_t = 10)]
        count: usize,
        /// Multiple choice instead of typing.
        #[arg(long)]
        mcq: bool,
        /// Feed quiz results back into the review schedule.
        #[arg(long)]
        affects_srs: bool,
        #[arg(long)]
        deck: Option<String>,
    },
    /// Show today's counters, the streak, and per-deck totals.
    Stats,
    /// List decks in the catalog.
    Decks,
    /// Write a progress snapshot to a file.
    Export { out: PathBuf },
    /// Replace local progress with a snapshot file.
    Import { file: PathBuf },
}

fn parse_source(s: &str) -> std::result::Result<SourceFilter, String> {
    match s {
        "due" => Ok(SourceFilter::Due),
        "unknown" => Ok(SourceFilter::Unknown),
        "all" => Ok(SourceFilter::All),
        other => Err(format!("unknown source {other:?} (due|unknown|all)")),
    }
}

fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "warn".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();

    let csv = fs::File::open(&cli.catalog)
        .with_context(|| format!("cannot open catalog {}", cli.catalog.display()))?;
    let catalog = Catalog::load_csv(csv).context("failed to parse catalog")?;
    if catalog.is_empty() {
        bail!("catalog {} contains no cards", cli.catalog.display());
    }

    let mut store = FileStore::new(&cli.data_dir)?;
    let mut trainer = Trainer::new(catalog);
    trainer.load(&store)?;
    tracing::info!(
        cards = trainer.catalog().len(),
        tracked = trainer.ledger().cards.len(),
        "trainer ready"
    );

    match cli.command {
        Command::Review { deck, only_due } => {
            let mut settings = trainer.settings().clone();
            if let Some(deck) = deck {
                settings.deck_id = deck;
            }
            settings.only_due = only_due;
            trainer.update_settings(settings);
            run_review(&mut trainer, &mut store)?;
        }
        Command::Quiz {
            source,
            count,
            mcq,
            affects_srs,
            deck,
        } => {
            let mut settings = trainer.settings().clone();
            if let Some(deck) = deck {
                settings.deck_id = deck;
            }
            trainer.update_settings(settings);
            let params = QuizParams {
                source,
                count,
                mode: if mcq { QuizMode::Mcq } else { QuizMode::Typing },
                affects_srs,
                auto_advance: false,
            };
            run_quiz(&mut trainer, &mut store, params)?;
        }
        Command::Stats => print_stats(&mut trainer),
        Command::Decks => {
            for deck in trainer.catalog().deck_ids() {
                let count = trainer.catalog().in_deck(&deck).count();
                println!("{deck}  ({count} cards)");
            }
        }
        Command::Export { out } => {
            let json = trainer.export_snapshot(Utc::now()).to_json()?;
            fs::write(&out, json)?;
            println!("exported to {}", out.display());
        }
        Command::Import { file } => {
            let json = fs::read_to_string(&file)
                .with_context(|| format!("cannot read {}", file.display()))?;
            trainer.import_snapshot(&json)?;
            trainer.save(&mut store)?;
            println!("imported {}", file.display());
        }
    }

    Ok(())
}

fn run_review(trainer: &mut Trainer, store: &mut FileStore) -> Result<()> {
    let stdin = io::stdin();
    let mut lines = stdin.lock().lines();
    println!("grades: a(gain) h(ard) g(ood) e(asy)   s = skip, q = quit");

    loop {
        let now = Utc::now();
        let Some(card) = trainer.next_card(now)?.cloned() else {
            println!("no card available");
            break;
        };
        println!();
        println!("  {}", card.japanese);
        if trainer.settings().show_reading && !card.hiragana.is_empty() {
            println!("  ({})", card.hiragana);
        }
        print!("> ");
        io::stdout().flush()?;

        let Some(line) = lines.next() else { break };
        let input = line?.trim().to_lowercase();
        match input.as_str() {
            "q" => break,
            "s" => {
                trainer.skip(now)?;
            }
            "a" | "h" | "g" | "e" => {
                let grade = match input.as_str() {
                    "a" => Grade::Again,
                    "h" => Grade::Hard,
                    "e" => Grade::Easy,
                    _ => Grade::Good,
                };
                println!("  = {}", card.english);
                let state = trainer.grade(&card.id, grade, now)?;
                println!("  next in {:.1} days", state.interval_days);
            }
            _ => {
                println!("  ? unrecognized input");
                continue;
            }
        }
        trainer.save(store)?;
    }

    trainer.save(store)?;
    print_stats(trainer);
    Ok(())
}

fn run_quiz(trainer: &mut Trainer, store: &mut FileStore, params: QuizParams) -> Result<()> {
    let now = Utc::now();
    if let Err(err) = trainer.start_quiz(params, now) {
        println!("{err}");
        return Ok(());
    }

    let stdin = io::stdin();
    let mut lines = stdin.lock().lines();
    let direction = trainer.settings().direction;

    loop {
        let now = Utc::now();
        let Some(session) = trainer.quiz() else { break };
        let (index, total) = session.position();
        let card = trainer.quiz_card()?.clone();
        let prompt = match direction {
            Direction::JpToEn => card.japanese.clone(),
            Direction::EnToJp => card.english.clone(),
        };
        println!();
        println!("[{}/{}] {}", index + 1, total, prompt);

        match params.mode {
            QuizMode::Mcq => match trainer.quiz_mcq() {
                Ok(question) => {
                    for (i, choice) in question.choices.iter().enumerate() {
                        println!("  {}. {}", i + 1, choice.label);
                    }
                    print!("answer (1-4, s = skip)> ");
                    io::stdout().flush()?;
                    let Some(line) = lines.next() else { break };
                    let input = line?.trim().to_string();
                    if input == "s" {
                        trainer.skip_quiz_question(now)?;
                    } else if let Some(pick) = input
                        .parse::<usize>()
                        .ok()
                        .and_then(|n| n.checked_sub(1))
                        .filter(|&n| n < question.choices.len())
                    {
                        let ok = trainer.answer_quiz_choice(pick, now)?;
                        let correct = &question.choices[question.correct_index].label;
                        println!("  {}", if ok { "correct!".to_string() } else { format!("wrong — {correct}") });
                    } else {
                        println!("  ? pick 1-4 or s");
                        continue;
                    }
                }
                Err(err) => {
                    // not enough distinct answers for this deck; fall back
                    println!("{err}; switching to typing for this question");
                    quiz_typed_question(trainer, &mut lines, now)?;
                }
            },
            QuizMode::Typing => quiz_typed_question(trainer, &mut lines, now)?,
        }

        if let Some(summary) = trainer.advance_quiz()? {
            println!();
            println!(
                "done: {}/{} correct ({}%), {} skipped",
                summary.correct, summary.total, summary.accuracy_pct, summary.skipped
            );
        }
        trainer.save(store)?;
    }

    trainer.save(store)?;
    Ok(())
}

fn quiz_typed_question(
    trainer: &mut Trainer,
    lines: &mut io::Lines<io::StdinLock<'_>>,
    now: chrono::DateTime<Utc>,
) -> Result<()> {
    print!("type answer (s = skip)> ");
    io::stdout().flush()?;
    let Some(line) = lines.next() else {
        trainer.skip_quiz_question(now)?;
        return Ok(());
    };
    let input = line?;
    let input = input.trim();
    if input == "s" {
        trainer.skip_quiz_question(now)?;
        return Ok(());
    }
    let outcome = trainer.answer_quiz_typed(input, now)?;
    if outcome.ok {
        println!("  correct!");
    } else {
        println!("  wrong — {}", outcome.expected);
    }
    Ok(())
}

fn print_stats(trainer: &mut Trainer) {
    let now = Utc::now();
    let (today, streak) = trainer.today(now);
    let goal = trainer.settings().daily_goal;
    println!(
        "today: {} reviewed ({} correct, {} wrong, {} skipped) — goal {}/{}",
        today.reviewed, today.correct, today.wrong, today.skipped, today.reviewed, goal
    );
    println!("streak: {streak} day(s)");
}
