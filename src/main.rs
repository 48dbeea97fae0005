//! Gaia CLI - Document Geolocation Engine
//!
//! Command-line interface for building a cell grid from a geotagged corpus
//! and ranking documents against it.

use clap::{Parser, Subcommand};
use gaia::distribution::memo;
use gaia::text::read_stopwords;
use gaia::{
    prepare_documents, BatchRanker, CellGrid, Config, CorpusReader, Document, GaiaError,
    Gazetteer, RegionDistCache, Result, StageBudget, Strategy,
};
use indicatif::{HumanDuration, ProgressBar, ProgressStyle};
use log::{error, warn};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

#[derive(Parser)]
#[command(name = "gaia")]
#[command(author = "Gaia Contributors")]
#[command(version)]
#[command(about = "Document Geolocation Engine", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// JSON configuration file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Rank every non-training document of a corpus against the grid
    Rank {
        /// JSON-lines corpus file
        #[arg(long)]
        corpus: PathBuf,

        /// Strategy name (overrides the configuration)
        #[arg(short, long)]
        strategy: Option<String>,

        /// Number of cells to print per document
        #[arg(short = 'k', long, default_value = "5")]
        count: usize,

        /// Random seed for reproducibility
        #[arg(long)]
        seed: Option<u64>,

        /// Stopword file, one word per line
        #[arg(long)]
        stopwords: Option<PathBuf>,
    },

    /// Show the cells a word most likely comes from
    Posterior {
        /// JSON-lines corpus file
        #[arg(long)]
        corpus: PathBuf,

        /// The word
        #[arg(short, long)]
        word: String,

        /// Number of cells to print
        #[arg(short = 'k', long, default_value = "10")]
        count: usize,
    },

    /// Show grid and vocabulary statistics
    Info {
        /// JSON-lines corpus file
        #[arg(long)]
        corpus: PathBuf,
    },
}

fn main() {
    let cli = Cli::parse();

    // Initialize logging
    if cli.verbose {
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    } else {
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    }

    let result = load_config(cli.config).and_then(|config| match cli.command {
        Commands::Rank {
            corpus,
            strategy,
            count,
            seed,
            stopwords,
        } => rank_corpus(config, corpus, strategy, count, seed, stopwords),

        Commands::Posterior {
            corpus,
            word,
            count,
        } => show_posterior(config, corpus, word, count),

        Commands::Info { corpus } => show_info(config, corpus),
    });

    if let Err(e) = result {
        error!("Error: {}", e);
        std::process::exit(1);
    }
}

fn load_config(path: Option<PathBuf>) -> Result<Config> {
    let config = match path {
        Some(p) => Config::from_file(p)?,
        None => Config::default(),
    };
    config.validate()?;
    Ok(config)
}

fn spinner(message: &str) -> ProgressBar {
    let style = ProgressStyle::default_spinner()
        .template("{spinner:.cyan} {msg}")
        .unwrap_or_else(|_| ProgressStyle::default_spinner());
    let pb = ProgressBar::new_spinner();
    pb.set_style(style);
    pb.set_message(message.to_string());
    pb.enable_steady_tick(std::time::Duration::from_millis(100));
    pb
}

fn read_corpus(config: &Config, corpus: &Path) -> Result<Vec<Document>> {
    let pb = spinner("Loading corpus...");
    let docs = CorpusReader::new(config).read_file(corpus)?;
    pb.finish_and_clear();
    println!("✓ Loaded {} documents", format_number(docs.len()));
    Ok(docs)
}

fn build_grid(config: &Config, docs: &[Document]) -> Result<CellGrid> {
    let pb = spinner("Building cell grid...");
    let mut grid = CellGrid::new(&config.grid)?;

    let budget = StageBudget::new(config.scoring.stage_limit());
    let progress = grid.add_documents(docs, &budget);
    if !progress.complete {
        warn!(
            "Grid population stopped early: {} of {} documents added",
            progress.processed,
            docs.len()
        );
    }

    let summary = grid.finalize(config.distribution.minimum_word_count);
    pb.finish_and_clear();
    println!(
        "✓ Built grid: {} non-empty cells, {} words",
        format_number(summary.num_nonempty_cells),
        format_number(summary.vocabulary_size as usize)
    );
    Ok(grid)
}

fn rank_corpus(
    mut config: Config,
    corpus: PathBuf,
    strategy: Option<String>,
    count: usize,
    seed: Option<u64>,
    stopwords: Option<PathBuf>,
) -> Result<()> {
    let start_time = Instant::now();

    if let Some(name) = strategy {
        config.scoring.strategy = name;
    }
    if seed.is_some() {
        config.scoring.seed = seed;
    }
    if let Some(path) = stopwords {
        config.text.stopwords.extend(read_stopwords(path)?);
    }
    let strategy = Strategy::from_config(&config.scoring)?;

    println!("Gaia Document Geolocation Engine");
    println!("   Corpus: {}", corpus.display());
    println!("   Strategy: {}", strategy);
    println!();

    let docs = read_corpus(&config, &corpus)?;
    let grid = build_grid(&config, &docs)?;
    let gazetteer = Gazetteer::from_documents(docs.iter().filter(|d| d.is_training()));

    let mut queries: Vec<Document> = docs.into_iter().filter(|d| !d.is_training()).collect();
    if queries.is_empty() {
        return Err(GaiaError::EmptyInput(
            "corpus has no dev or test documents to rank".to_string(),
        ));
    }
    prepare_documents(&grid, &mut queries);
    let dists: Vec<_> = queries.iter().map(|d| d.dist.clone()).collect();

    let bar_style = ProgressStyle::default_bar()
        .template("{msg}\n{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({percent}%) ETA: {eta}")
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("█▓▒░  ");
    let pb = ProgressBar::new(dists.len() as u64);
    pb.set_style(bar_style);
    pb.set_message(format!("Ranking with {} (parallel)...", strategy));

    let result = BatchRanker::new(&grid, strategy, &config)
        .with_toponyms(Arc::new(gazetteer))
        .with_top_k(count)
        .rank_with_progress(&dists, |_| pb.inc(1));
    pb.finish_and_clear();

    for (doc, ranking) in queries.iter().zip(&result.rankings) {
        let Some(ranking) = ranking else {
            continue;
        };
        println!("{}", doc);
        for (rank, entry) in ranking.iter().enumerate() {
            let center = grid.multicell_center(entry.cell.index());
            println!(
                "  #{:<3} cell {:<12} center {:<18} score {:.6}",
                rank + 1,
                entry.cell.index().to_string(),
                center.to_string(),
                entry.score
            );
        }
        if let Some(best) = ranking.best() {
            let km = doc.coord.distance_km(&grid.multicell_center(best.cell.index()));
            println!("  error: {:.1} km", km);
        }
    }

    println!();
    println!(
        "✓ Ranked {} of {} documents",
        format_number(result.progress.processed),
        format_number(queries.len())
    );
    println!("   Total time: {}", HumanDuration(start_time.elapsed()));
    Ok(())
}

fn show_posterior(config: Config, corpus: PathBuf, word: String, count: usize) -> Result<()> {
    let docs = read_corpus(&config, &corpus)?;
    let grid = build_grid(&config, &docs)?;

    let text = if config.distribution.ignore_case {
        word.to_lowercase()
    } else {
        word
    };
    let word = memo::intern(&text);

    let mut cache = RegionDistCache::new(config.cache.lru_cache_size);
    let posterior = cache.get(&grid, word);
    if !posterior.is_normalized() {
        println!("No cell gives {:?} any probability", text);
        return Ok(());
    }

    println!("Region posterior for {:?}:", text);
    for (rank, (index, prob)) in posterior.ranked().into_iter().take(count).enumerate() {
        let popular = grid
            .cell(index)
            .and_then(|cell| cell.most_popular_document())
            .map(|(title, _)| title.to_string())
            .unwrap_or_default();
        println!(
            "  #{:<3} cell {:<12} center {:<18} p = {:.6}  {}",
            rank + 1,
            index.to_string(),
            grid.multicell_center(index).to_string(),
            prob,
            popular
        );
    }
    Ok(())
}

fn show_info(config: Config, corpus: PathBuf) -> Result<()> {
    let docs = read_corpus(&config, &corpus)?;
    let grid = build_grid(&config, &docs)?;
    let global = grid.global_stats();

    println!();
    println!("Grid");
    println!("   Degrees per cell:       {}", grid.degrees_per_cell());
    println!("   Multi-cell width:       {}", grid.width_of_multi_cell());
    if let Some(summary) = grid.summary() {
        for line in summary.to_string().lines() {
            println!("   {}", line);
        }
    }
    println!();
    println!("Vocabulary");
    println!("   Word types:             {}", format_number(global.total_types() as usize));
    println!("   Word tokens:            {}", format_number(global.total_tokens() as usize));
    println!("   Types seen once:        {}", format_number(global.types_seen_once() as usize));
    println!("   Unseen word mass:       {:.6}", global.globally_unseen_word_prob());
    println!("   Estimated unseen types: {}", format_number(global.num_unseen_word_types() as usize));
    Ok(())
}

fn format_number(n: usize) -> String {
    let s = n.to_string();
    let mut result = String::new();
    for (i, c) in s.chars().rev().enumerate() {
        if i > 0 && i % 3 == 0 {
            result.push(',');
        }
        result.push(c);
    }
    result.chars().rev().collect()
}
