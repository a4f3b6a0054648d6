mod load;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::Serialize;
use std::fs;
use std::path::PathBuf;
use tracing_subscriber::{fmt, EnvFilter};
use vsir_core::calibrate::find_pivot;
use vsir_core::corpus::load_directory;
use vsir_core::evaluation::{EvaluationReport, Evaluator};
use vsir_core::{DocStatus, EngineConfig, PivotParams, SearchEngine, Stemmer, TokenShape};

#[derive(Parser)]
#[command(name = "vsir")]
#[command(about = "Vector-space retrieval over a document directory, with TREC-style evaluation", long_about = None)]
struct Cli {
    #[command(flatten)]
    engine: EngineArgs,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct EngineArgs {
    /// Corpus directory, one document per file
    #[arg(long, default_value = "corpus")]
    corpus: PathBuf,
    /// JSON engine config; flags below override it
    #[arg(long)]
    config: Option<PathBuf>,
    /// Index a random sample of this many documents
    #[arg(long)]
    sample: Option<usize>,
    /// Seed for sampling and result padding (random when omitted)
    #[arg(long)]
    seed: Option<u64>,
    #[arg(long)]
    normalize: bool,
    /// Pivoted normalization; needs --normalize (or `normalize` in the config)
    #[arg(long)]
    pivot: bool,
    #[arg(long, requires = "pivot")]
    slope: Option<f64>,
    #[arg(long, requires = "pivot")]
    pivot_factor: Option<f64>,
    #[arg(long)]
    bigrams: bool,
    #[arg(long)]
    english_only: bool,
    #[arg(long, value_enum)]
    stemmer: Option<StemmerArg>,
    #[arg(long)]
    lemmatize: bool,
    #[arg(long)]
    remove_stopwords: bool,
    #[arg(long, value_enum)]
    token_shape: Option<TokenShapeArg>,
}

#[derive(Clone, Copy, ValueEnum)]
enum StemmerArg {
    Porter,
    Lancaster,
    Snowball,
}

#[derive(Clone, Copy, ValueEnum)]
enum TokenShapeArg {
    Letters,
    Word,
    WordHyphen,
}

#[derive(Args)]
struct Judged {
    /// TREC topics file
    #[arg(long)]
    topics: PathBuf,
    /// Qrels file
    #[arg(long)]
    qrels: PathBuf,
}

#[derive(Subcommand)]
enum Commands {
    /// Run one ranked query
    Query {
        text: String,
        #[arg(short, long, default_value_t = 10)]
        k: usize,
        #[arg(long)]
        json: bool,
    },
    /// Score every topic at depth k
    Evaluate {
        #[command(flatten)]
        judged: Judged,
        #[arg(short, long, default_value_t = 10)]
        k: usize,
        /// Print metrics for each topic
        #[arg(long)]
        per_query: bool,
        #[arg(long)]
        json: bool,
    },
    /// Mean precision and recall for k = 1..=max-k
    PrCurve {
        #[command(flatten)]
        judged: Judged,
        #[arg(long, default_value_t = 20)]
        max_k: usize,
        #[arg(long)]
        json: bool,
    },
    /// Fit pivot slope and pivot factor on a normalized index
    Calibrate {
        #[command(flatten)]
        judged: Judged,
        #[arg(short, long, default_value_t = 10)]
        k: usize,
        #[arg(long, default_value_t = 10)]
        bins: usize,
    },
    /// Show ranked hits of a topic, marked relevant or not
    Inspect {
        #[command(flatten)]
        judged: Judged,
        /// Topic title, exactly as in the topics file
        query: String,
        #[arg(short, long, default_value_t = 10)]
        k: usize,
        /// Reformulated query to compare against the topic
        #[arg(long)]
        compare: Option<String>,
    },
    /// Index statistics
    Stats,
}

impl EngineArgs {
    fn config(&self) -> Result<EngineConfig> {
        let mut cfg = match &self.config {
            Some(path) => {
                let json = fs::read_to_string(path).with_context(|| format!("reading config {}", path.display()))?;
                EngineConfig::from_json_str(&json)?
            }
            None => EngineConfig::default(),
        };
        cfg.normalize |= self.normalize;
        cfg.bigrams |= self.bigrams;
        cfg.english_only |= self.english_only;
        cfg.normalizer.lemmatize |= self.lemmatize;
        cfg.normalizer.remove_stopwords |= self.remove_stopwords;
        if self.pivot {
            let mut params = cfg.pivot.unwrap_or_default();
            if let Some(slope) = self.slope { params.slope = slope; }
            if let Some(pivot_factor) = self.pivot_factor { params.pivot_factor = pivot_factor; }
            cfg.pivot = Some(params);
        }
        if let Some(s) = self.stemmer {
            cfg.normalizer.stemmer = match s {
                StemmerArg::Porter => Stemmer::Porter,
                StemmerArg::Lancaster => Stemmer::Lancaster,
                StemmerArg::Snowball => Stemmer::Snowball,
            };
        }
        if let Some(shape) = self.token_shape {
            cfg.normalizer.token_shape = match shape {
                TokenShapeArg::Letters => TokenShape::LettersOnly,
                TokenShapeArg::Word => TokenShape::WordChars,
                TokenShapeArg::WordHyphen => TokenShape::WordCharsAndHyphenApostrophe,
            };
        }
        Ok(cfg)
    }

    fn rng(&self) -> StdRng {
        match self.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        }
    }
}

fn main() -> Result<()> {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();
    let cli = Cli::parse();

    let config = cli.engine.config()?;
    tracing::debug!(?config, "engine config");
    let mut rng = cli.engine.rng();
    let engine = load_directory(&cli.engine.corpus, cli.engine.sample, &config, &mut rng)
        .with_context(|| format!("indexing {}", cli.engine.corpus.display()))?;

    match cli.command {
        Commands::Query { text, k, json } => {
            let hits = engine.query(&text, k);
            if json {
                print_json(&hits)?;
            } else {
                for (rank, hit) in hits.iter().enumerate() {
                    println!("{:>3}  {:<40} {:.6}", rank + 1, hit.blog_id, hit.score);
                }
            }
        }
        Commands::Evaluate { judged, k, per_query, json } => {
            let mut evaluator = evaluator(&engine, &judged, rng)?;
            let report = evaluator.evaluate(k)?;
            if json {
                print_json(&report)?;
            } else {
                print_report(&report, per_query);
            }
        }
        Commands::PrCurve { judged, max_k, json } => {
            let mut evaluator = evaluator(&engine, &judged, rng)?;
            let curve = evaluator.pr_curve(max_k)?;
            if json {
                print_json(&curve)?;
            } else {
                println!("{:>4} {:>10} {:>10}", "k", "precision", "recall");
                for p in curve {
                    println!("{:>4} {:>10} {:>10}", p.k, fmt_opt(p.precision), fmt_opt(p.recall));
                }
            }
        }
        Commands::Calibrate { judged, k, bins } => {
            let topics = load::load_topics(&judged.topics)?;
            let qrels = load::load_qrels(&judged.qrels)?;
            let calibration = find_pivot(&engine, &topics, &qrels, k, bins)?;
            print_json(&calibration)?;
            let PivotParams { slope, pivot_factor } = calibration.params;
            println!("--pivot --slope {slope} --pivot-factor {pivot_factor}");
        }
        Commands::Inspect { judged, query, k, compare } => {
            let mut evaluator = evaluator(&engine, &judged, rng)?;
            for hit in evaluator.inspect(&query, k)? {
                let mark = if hit.relevant { "RELEVANT" } else { "" };
                println!("{:<40} {:.6} {}", hit.hit.blog_id, hit.hit.score, mark);
            }
            if let Some(new_query) = compare {
                let report = evaluator.evaluate(k)?;
                let cmp = evaluator.compare(&report, &query, &new_query)?;
                println!("Old precision: {}", fmt_opt(cmp.old_precision));
                println!("New precision: {:.4}", cmp.new_precision);
                println!("Old P@5: {}", fmt_opt(cmp.old_p_at_5));
                println!("New P@5: {:.4}", cmp.new_p_at_5);
            }
        }
        Commands::Stats => {
            println!("documents: {}", engine.documents().len());
            println!("  indexed:  {}", engine.count_with_status(DocStatus::Indexed));
            println!("  blank:    {}", engine.count_with_status(DocStatus::Blank));
            println!("  excluded: {}", engine.count_with_status(DocStatus::Excluded));
            println!("terms: {}", engine.vocabulary_size());
            println!("normalization: {:?}", engine.normalization());
        }
    }
    Ok(())
}

fn evaluator<'a>(engine: &'a SearchEngine, judged: &Judged, rng: StdRng) -> Result<Evaluator<'a, StdRng>> {
    let topics = load::load_topics(&judged.topics)?;
    let qrels = load::load_qrels(&judged.qrels)?;
    Ok(Evaluator::new(engine, topics, &qrels, rng))
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn fmt_opt(v: Option<f64>) -> String {
    v.map_or_else(|| "n/a".to_string(), |v| format!("{v:.4}"))
}

fn print_report(report: &EvaluationReport, per_query: bool) {
    if per_query {
        println!("{:<8} {:>8} {:>8} {:>8} {:>8} {:>8} {:>8} {:>8} {:>8}", "query", "P", "R", "P@5", "R-prec", "RR", "AP", "F1", "F.2");
        for (id, m) in &report.per_query {
            println!(
                "{:<8} {:>8.4} {:>8.4} {:>8.4} {:>8.4} {:>8} {:>8.4} {:>8} {:>8}",
                id, m.precision, m.recall, m.p_at_5, m.r_precision,
                fmt_opt(m.reciprocal_rank), m.average_precision, fmt_opt(m.f1), fmt_opt(m.f0_2),
            );
        }
        println!();
    }
    let a = &report.averages;
    println!("k = {}, scored topics = {}", report.k, report.per_query.len());
    println!("precision   {}", fmt_opt(a.precision));
    println!("recall      {}", fmt_opt(a.recall));
    println!("P@5         {}", fmt_opt(a.p_at_5));
    println!("R-prec      {}", fmt_opt(a.r_precision));
    println!("MRR         {}", fmt_opt(a.mrr));
    println!("MAP         {}", fmt_opt(a.map));
    println!("F1          {}", fmt_opt(a.f1));
    println!("F.2         {}", fmt_opt(a.f0_2));
}

#[cfg(test)]
mod tests {
    use super::*;
    use vsir_core::{IrError, Normalization};

    fn engine_args(args: &[&str]) -> EngineArgs {
        let argv = std::iter::once("vsir").chain(args.iter().copied()).chain(std::iter::once("stats"));
        Cli::try_parse_from(argv).unwrap().engine
    }

    #[test]
    fn pivot_alone_is_a_configuration_error() {
        let cfg = engine_args(&["--pivot"]).config().unwrap();
        assert!(!cfg.normalize);
        assert!(matches!(cfg.validate(), Err(IrError::Configuration(_))));
    }

    #[test]
    fn pivot_flags_override_defaults() {
        let cfg = engine_args(&["--normalize", "--pivot", "--slope", "0.3"]).config().unwrap();
        let expected = PivotParams { slope: 0.3, ..PivotParams::default() };
        assert_eq!(cfg.pivot, Some(expected));
        assert!(matches!(cfg.validate().unwrap().normalization(), Normalization::Pivoted(p) if p == expected));
    }
}
