use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde::Serialize;
use serde_json::json;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use skill_match::config::Config;
use skill_match::skills::{parse_skill_list, RawSkill};
use skill_match::{
    Catalog, LatentModel, LearningPathPlanner, MatchingStrategy, ModelStore, Preferences, Ranker,
    SkillGraph, SkillSet, StrategyKind,
};

#[derive(Parser, Debug)]
#[command(name = "skill-match")]
#[command(about = "Skill-to-course matching - ranked recommendations and skill-gap reports")]
struct Args {
    /// Log level
    #[arg(short, long, default_value = "info", global = true)]
    log_level: String,

    /// Catalog file, overriding `data.catalog_path`
    #[arg(long, global = true)]
    catalog: Option<PathBuf>,

    /// Model file, overriding `data.model_path`
    #[arg(long, global = true)]
    model: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Rank catalog courses for a skill set
    Recommend {
        /// JSON file, inline JSON object, or "Skill : Level, ..." list
        #[arg(short, long)]
        skills: String,

        #[arg(short = 'n', long)]
        top_n: Option<usize>,

        /// direct, latent or hybrid
        #[arg(long)]
        strategy: Option<StrategyKind>,

        /// Preferences JSON file
        #[arg(long)]
        preferences: Option<PathBuf>,

        /// Only courses with both matched and missing skills
        #[arg(long)]
        gaps: bool,
    },
    /// Match a skill set against one course
    Match {
        #[arg(short, long)]
        skills: String,

        #[arg(short, long)]
        course: String,

        #[arg(long)]
        strategy: Option<StrategyKind>,
    },
    /// Train the latent model and save it
    Train {
        #[arg(short = 'k', long)]
        n_components: Option<usize>,

        #[arg(long)]
        random_state: Option<u64>,
    },
    /// Courses most similar to one course in latent space
    Similar {
        #[arg(short, long)]
        course: String,

        #[arg(short = 'n', long, default_value_t = 5)]
        top_n: usize,
    },
    /// Skills to learn next
    Suggest {
        #[arg(short, long)]
        skills: String,

        #[arg(short = 'n', long, default_value_t = 5)]
        top_n: usize,
    },
    /// Multi-course learning path
    Path {
        #[arg(short, long)]
        skills: String,

        /// Goal course code
        #[arg(short, long)]
        goal: Option<String>,

        #[arg(long, default_value_t = 5)]
        max_len: usize,
    },
}

fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize logging
    let log_level = match args.log_level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_file(true)
        .with_line_number(true)
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .context("Failed to set tracing subscriber")?;

    let mut config = Config::load().context("Failed to load configuration")?;
    if let Some(path) = args.catalog {
        config.data.catalog_path = path;
    }
    if let Some(path) = args.model {
        config.data.model_path = path;
    }
    info!("Configuration loaded");

    let catalog = Arc::new(
        Catalog::load(&config.data.catalog_path).with_context(|| {
            format!("Failed to load catalog from {:?}", config.data.catalog_path)
        })?,
    );

    match args.command {
        Command::Recommend {
            skills,
            top_n,
            strategy,
            preferences,
            gaps,
        } => {
            let skills = read_skills(&skills)?;
            let strategy = build_strategy(&config, &catalog, strategy)?;
            let mut ranker = Ranker::new(catalog, strategy)
                .with_default_top_n(config.matching.default_top_n);
            if let Some(path) = preferences {
                ranker = ranker.with_preferences(read_preferences(&path)?);
            }
            let top_n = top_n.unwrap_or(config.matching.default_top_n);
            let results = if gaps {
                ranker.skill_gaps(&skills, top_n)
            } else {
                ranker.recommend(&skills, top_n)
            };
            let results = results.context("Failed to rank courses")?;
            print_json(&results)
        }
        Command::Match {
            skills,
            course,
            strategy,
        } => {
            let skills = read_skills(&skills)?;
            let strategy = build_strategy(&config, &catalog, strategy)?;
            let result = Ranker::new(catalog, strategy)
                .match_course(&skills, &course)
                .with_context(|| format!("Failed to match course {}", course))?;
            print_json(&result)
        }
        Command::Train {
            n_components,
            random_state,
        } => {
            let mut params = config.latent;
            if let Some(k) = n_components {
                params.n_components = k;
            }
            if let Some(seed) = random_state {
                params.random_state = seed;
            }
            let model = LatentModel::train(&catalog, params).context("Failed to train latent model")?;
            model
                .save(&config.data.model_path)
                .context("Failed to save latent model")?;
            print_json(&json!({
                "model_path": config.data.model_path,
                "courses": model.course_codes().len(),
                "skills": model.vocabulary().len(),
                "n_components": model.n_components(),
                "reconstruction_error": model.reconstruction_error(),
            }))
        }
        Command::Similar { course, top_n } => {
            let model = load_model(&config, &catalog)?;
            let similar = model
                .similar_courses(&course, top_n)
                .with_context(|| format!("Failed to find courses similar to {}", course))?;
            let similar: Vec<_> = similar
                .into_iter()
                .map(|(code, similarity)| json!({ "course_code": code, "similarity": similarity }))
                .collect();
            print_json(&similar)
        }
        Command::Suggest { skills, top_n } => {
            let skills = read_skills(&skills)?;
            let mut graph = SkillGraph::from_catalog(&catalog);
            graph.initialize_common_relationships();
            print_json(&graph.suggest_next_skills(&skills, top_n))
        }
        Command::Path {
            skills,
            goal,
            max_len,
        } => {
            let skills = read_skills(&skills)?;
            let planner = LearningPathPlanner::from_catalog(catalog);
            print_json(&planner.generate_learning_path(&skills, goal.as_deref(), max_len))
        }
    }
}

/// Accepts a JSON file, an inline JSON object, or a "Skill : Level" list.
fn read_skills(input: &str) -> Result<SkillSet> {
    let text = if Path::new(input).is_file() {
        fs::read_to_string(input).with_context(|| format!("Failed to read skills from {}", input))?
    } else {
        input.to_string()
    };

    if text.trim_start().starts_with('{') {
        let raw: BTreeMap<String, RawSkill> =
            serde_json::from_str(&text).context("Invalid skills JSON")?;
        Ok(SkillSet::from_raw(&raw))
    } else {
        Ok(parse_skill_list(&text))
    }
}

fn read_preferences(path: &Path) -> Result<Preferences> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("Failed to read preferences from {:?}", path))?;
    serde_json::from_str(&text).context("Invalid preferences JSON")
}

fn load_model(config: &Config, catalog: &Catalog) -> Result<Arc<LatentModel>> {
    let model = ModelStore::new(&config.data.model_path)
        .load_or_train(catalog, config.latent)
        .context("Failed to load or train latent model")?;
    Ok(Arc::new(model))
}

fn build_strategy(
    config: &Config,
    catalog: &Catalog,
    kind: Option<StrategyKind>,
) -> Result<MatchingStrategy> {
    let kind = kind.unwrap_or(config.matching.strategy);
    info!("Using {} matching strategy", kind);

    Ok(match kind {
        StrategyKind::Direct => MatchingStrategy::direct(config.direct_scorer()),
        StrategyKind::Latent => MatchingStrategy::latent(load_model(config, catalog)?),
        StrategyKind::Hybrid => MatchingStrategy::hybrid(
            load_model(config, catalog)?,
            config.direct_scorer(),
            config.hybrid_weights().context("Invalid hybrid weights")?,
        ),
    })
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    let out = serde_json::to_string_pretty(value).context("Failed to serialize output")?;
    println!("{}", out);
    Ok(())
}
