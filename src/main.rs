use chrono::Utc;
use clap::{Parser, Subcommand};
use std::fmt::Display;
use std::path::PathBuf;
use tokio::io::{AsyncBufReadExt, BufReader};

use campus_ai::ai::{
    get_cache_path, suggest_courses, Assistant, AssistantSettings, CourseCache, CourseList,
    GeminiClient, InlineImage, COURSE_SUGGESTION_LIMIT,
};
use campus_ai::chat::{CalculatorContext, ChatSession, ChatTurn};
use campus_ai::config::Config;
use campus_ai::history::{HistoryStore, SaveOutcome, SaveRequest};
use campus_ai::institutions::{self, Category, Institution, DEFAULT_SEARCH_LIMIT};
use campus_ai::news::{NewsCategory, NewsDesk, NewsDraft};
use campus_ai::output;
use campus_ai::scoring::{
    calculate, ExamScores, Grade, Policy, PolicyTable, SubjectGrade, SubjectGrades,
};
use campus_ai::storage::{get_data_dir, FileStorage, MemoryStorage, Storage};

const EXIT_SUCCESS: i32 = 0;
const EXIT_INPUT: i32 = 1;
const EXIT_NETWORK: i32 = 2;
const EXIT_CONFIG: i32 = 4;

#[derive(Subcommand, Debug)]
enum Commands {
    /// Calculate an admission aggregate
    Calc {
        /// JAMB (UTME) score, 0-400
        #[arg(long, default_value = "")]
        jamb: String,
        /// Post-UTME score, 0-100
        #[arg(long, default_value = "")]
        post_utme: String,
        /// Five O'Level grades, comma separated (A1,B2,...) or Subject=Grade pairs
        #[arg(long, value_delimiter = ',')]
        grades: Vec<String>,
        /// University slug or name; selects the weighting model
        #[arg(short, long)]
        university: Option<String>,
        /// Course applied for
        #[arg(long)]
        course: Option<String>,
        /// Override the weighting model
        #[arg(long)]
        policy: Option<Policy>,
        /// Save the result to history
        #[arg(long)]
        save: bool,
        /// Also look up the merit cut-off for the course
        #[arg(long)]
        cutoff: bool,
        /// Ask the assistant about this result
        #[arg(long)]
        ask: Option<String>,
    },
    /// Show or manage saved calculations
    History {
        #[command(subcommand)]
        action: Option<HistoryAction>,
    },
    /// Search the university directory
    Unis {
        /// Name or slug to search for
        term: Option<String>,
        /// federal, state or private
        #[arg(long)]
        category: Option<Category>,
        #[arg(long, default_value_t = DEFAULT_SEARCH_LIMIT)]
        limit: usize,
    },
    /// Profile and course list for one university
    Info { university: String },
    /// Courses offered by a university
    Courses {
        university: String,
        /// Narrow the list by a search term
        #[arg(long)]
        filter: Option<String>,
        /// Drop cached catalogues and ask again
        #[arg(long)]
        refresh: bool,
    },
    /// Merit cut-off estimate for a course
    Cutoff { university: String, course: String },
    /// Admission news
    News {
        #[command(subcommand)]
        action: Option<NewsAction>,
    },
    /// Ask the assistant one question
    Ask {
        message: Option<String>,
        /// Attach a result slip or letter (png, jpg, webp, heic, pdf)
        #[arg(long)]
        attach: Option<PathBuf>,
    },
    /// Interactive chat with the assistant
    Chat,
    /// Open a university portal in the browser
    Open { university: String },
    /// Write a default config file
    Init {
        #[arg(long)]
        force: bool,
    },
}

#[derive(Subcommand, Debug)]
enum HistoryAction {
    /// List saved calculations (default)
    List {
        /// Tab-separated output for scripting
        #[arg(long)]
        tsv: bool,
    },
    /// Delete one entry by id
    Delete { id: u64 },
    /// Delete every entry
    Clear,
}

#[derive(Subcommand, Debug)]
enum NewsAction {
    /// Show published and live news (default)
    List {
        #[arg(long)]
        category: Option<NewsCategory>,
    },
    /// Fetch live news through the assistant
    Sync,
    /// Publish a local news item
    Publish {
        #[arg(long)]
        title: String,
        #[arg(long)]
        category: NewsCategory,
        #[arg(long)]
        excerpt: String,
        /// Defaults to today
        #[arg(long)]
        date: Option<String>,
        #[arg(long)]
        url: Option<String>,
    },
    /// Delete a published item by id
    Delete { id: String },
}

#[derive(Parser, Debug)]
#[command(name = "campus")]
#[command(about = "Admissions toolkit for Nigerian universities", long_about = None)]
#[command(version)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Path to config file (defaults to ~/.config/campus-ai/config.yaml)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Directory for saved history and news
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    /// Keep everything in memory; nothing is read from or written to disk
    #[arg(long, global = true)]
    ephemeral: bool,

    #[command(subcommand)]
    command: Commands,
}

fn fail(code: i32, context: &str, err: impl Display) -> ! {
    eprintln!("{}: {:#}", context, err);
    std::process::exit(code);
}

fn resolve_institution(key: &str) -> &'static Institution {
    institutions::find(key).unwrap_or_else(|| {
        eprintln!("Unknown university '{}'. Try `campus unis {}`.", key, key);
        std::process::exit(EXIT_INPUT);
    })
}

/// Bare grades fill the default subjects in order; `Subject=Grade` names them.
fn parse_grades(raw: &[String]) -> Result<SubjectGrades, String> {
    if raw.is_empty() {
        return Ok(SubjectGrades::default());
    }
    let defaults = SubjectGrades::default();
    let mut subjects = defaults.iter();
    let grades = raw
        .iter()
        .map(|token| {
            let fallback = subjects.next().map(|s| s.subject.clone());
            if token.contains('=') {
                token.parse::<SubjectGrade>()
            } else {
                let grade: Grade = token.parse()?;
                Ok(SubjectGrade::new(
                    fallback.unwrap_or_else(|| "Subject".to_string()),
                    grade,
                ))
            }
        })
        .collect::<Result<Vec<_>, _>>()?;
    SubjectGrades::new(grades)
}

fn open_storage(cli: &Cli, config: &Config) -> Box<dyn Storage> {
    if cli.ephemeral {
        tracing::debug!("using in-memory storage");
        return Box::new(MemoryStorage::new());
    }
    let dir = cli
        .data_dir
        .clone()
        .or_else(|| config.storage.data_dir.clone())
        .unwrap_or_else(get_data_dir);
    tracing::debug!(dir = %dir.display(), "using file storage");
    Box::new(FileStorage::new(dir))
}

fn build_assistant(cli: &Cli, config: &Config) -> Assistant<GeminiClient> {
    let settings = AssistantSettings::from_config(&config.ai)
        .unwrap_or_else(|e| fail(EXIT_CONFIG, "Config error", e));
    let api_key = campus_ai::credentials::resolve_api_key(config.ai.api_key.as_deref());
    let client = GeminiClient::new(&config.ai, api_key)
        .unwrap_or_else(|e| fail(EXIT_NETWORK, "Failed to create AI client", e));
    if !client.has_api_key() {
        eprintln!(
            "No Gemini API key found; set {} to enable AI answers.",
            campus_ai::credentials::ENV_KEY_VAR
        );
    }

    let assistant = Assistant::new(client, settings);
    if cli.ephemeral {
        assistant
    } else {
        assistant.with_cache(CourseCache::new(get_cache_path()))
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    campus_ai::logging::init(cli.verbose);

    // Init must work even when the existing config is broken.
    if let Commands::Init { force } = cli.command {
        match campus_ai::config::write_default_config(cli.config.clone(), force) {
            Ok(path) => {
                println!("Config written to {}", path.display());
                std::process::exit(EXIT_SUCCESS);
            }
            Err(e) => fail(EXIT_CONFIG, "Config error", e),
        }
    }

    let config = campus_ai::config::load_config(cli.config.clone())
        .unwrap_or_else(|e| fail(EXIT_CONFIG, "Config error", e));

    if let Err(errors) = campus_ai::config::validate_config(&config) {
        eprintln!("Config errors:");
        for error in errors {
            eprintln!("  - {}", error);
        }
        std::process::exit(EXIT_CONFIG);
    }

    let use_colors = output::should_use_colors();
    let storage = open_storage(&cli, &config);
    let policies = PolicyTable::with_overrides(&config.policies);

    match &cli.command {
        Commands::Calc {
            jamb,
            post_utme,
            grades,
            university,
            course,
            policy,
            save,
            cutoff,
            ask,
        } => {
            let grades = parse_grades(grades)
                .unwrap_or_else(|e| fail(EXIT_INPUT, "Invalid grades", e));
            let institution = university.as_deref().map(resolve_institution);
            let policy = policy.unwrap_or_else(|| policies.resolve(institution.map(|u| u.slug)));
            let scores = ExamScores::parse(jamb, post_utme);
            let calculation = calculate(policy, scores, &grades);

            if let Some(u) = institution {
                println!("{}", u.name);
            }
            println!("{}", output::format_calculation(&calculation, &grades, use_colors));

            if *save {
                let store = HistoryStore::new(&*storage);
                let request = SaveRequest {
                    institution,
                    course: course.as_deref(),
                    calculation: &calculation,
                };
                match store.save(request) {
                    Ok(SaveOutcome::Saved(entry)) => println!("Saved to history (id {}).", entry.id),
                    Ok(SaveOutcome::Skipped(reason)) => eprintln!("Not saved: {}", reason.message()),
                    Err(e) => fail(EXIT_INPUT, "Failed to save history", e),
                }
            }

            if *cutoff || ask.is_some() {
                let assistant = build_assistant(&cli, &config);
                let estimate = match (institution, course.as_deref()) {
                    (Some(u), Some(c)) if *cutoff => {
                        let estimate = assistant.cutoff(u.name, c).await;
                        println!();
                        println!("{}", output::format_cutoff(u.name, c, estimate.as_ref(), use_colors));
                        estimate
                    }
                    _ => {
                        if *cutoff {
                            eprintln!("Cut-off lookup needs --university and --course.");
                        }
                        None
                    }
                };

                if let Some(question) = ask {
                    let context = CalculatorContext {
                        university: institution.map(|u| u.name.to_string()),
                        course: course.clone(),
                        scores,
                        calculation: calculation.clone(),
                        cutoff: estimate.map(|e| e.cutoff),
                    };
                    let mut session = ChatSession::with_context(context);
                    println!();
                    let code = print_turn(session.send(&assistant, question).await, use_colors);
                    std::process::exit(code);
                }
            }
        }
        Commands::History { action } => {
            let store = HistoryStore::new(&*storage);
            match action.as_ref().unwrap_or(&HistoryAction::List { tsv: false }) {
                HistoryAction::List { tsv } => {
                    let entries = store
                        .list()
                        .unwrap_or_else(|e| fail(EXIT_INPUT, "Failed to read history", e));
                    if *tsv {
                        println!("{}", output::format_history_tsv(&entries));
                    } else {
                        println!("{}", output::format_history_table(&entries, Utc::now(), use_colors));
                    }
                }
                HistoryAction::Delete { id } => {
                    match store.delete(*id) {
                        Ok(true) => println!("Deleted entry {}.", id),
                        Ok(false) => fail(EXIT_INPUT, "Delete failed", format!("no entry with id {}", id)),
                        Err(e) => fail(EXIT_INPUT, "Failed to update history", e),
                    }
                }
                HistoryAction::Clear => {
                    store
                        .clear()
                        .unwrap_or_else(|e| fail(EXIT_INPUT, "Failed to clear history", e));
                    println!("History cleared.");
                }
            }
        }
        Commands::Unis { term, category, limit } => {
            let term = term.as_deref().unwrap_or("");
            let found = institutions::search(term, *category, *limit);
            println!("{}", output::format_institution_list(&found, use_colors));
            if let Some(u) = institutions::auto_spotlight(term, *category) {
                println!();
                println!(
                    "{}: {} ({})",
                    u.name,
                    policies.resolve(Some(u.slug)).label(),
                    if policies.is_explicit(u.slug) { "school-specific" } else { "default" }
                );
                println!("Run `campus info {}` for a full profile.", u.slug);
            }
        }
        Commands::Info { university } => {
            let u = resolve_institution(university);
            let assistant = build_assistant(&cli, &config);
            let (profile, courses) =
                futures::join!(assistant.university_profile(u.name), assistant.courses(u.name));
            println!(
                "{}",
                output::format_institution_detail(u, profile.as_ref(), &courses, use_colors)
            );
        }
        Commands::Courses {
            university,
            filter,
            refresh,
        } => {
            let u = resolve_institution(university);
            if *refresh && !cli.ephemeral {
                if let Err(e) = CourseCache::new(get_cache_path()).clear() {
                    fail(EXIT_CONFIG, "Failed to clear course cache", e);
                }
            }
            let assistant = build_assistant(&cli, &config);
            let mut list = assistant.courses(u.name).await;
            if let Some(term) = filter {
                list = CourseList {
                    courses: suggest_courses(&list.courses, term, COURSE_SUGGESTION_LIMIT),
                    source: list.source,
                };
            }
            println!("{}", output::format_course_list(&list, use_colors));
        }
        Commands::Cutoff { university, course } => {
            let u = resolve_institution(university);
            let assistant = build_assistant(&cli, &config);
            let estimate = assistant.cutoff(u.name, course).await;
            println!("{}", output::format_cutoff(u.name, course, estimate.as_ref(), use_colors));
        }
        Commands::News { action } => {
            let desk = NewsDesk::new(&*storage);
            match action.as_ref().unwrap_or(&NewsAction::List { category: None }) {
                NewsAction::List { category } => {
                    let feed = desk
                        .feed(*category)
                        .unwrap_or_else(|e| fail(EXIT_INPUT, "Failed to read news", e));
                    println!("{}", output::format_news(&feed, use_colors));
                    if let Ok(Some(synced)) = desk.last_sync() {
                        println!();
                        println!("Live news synced {} ago.", output::format_age(Utc::now() - synced));
                    }
                }
                NewsAction::Sync => {
                    let assistant = build_assistant(&cli, &config);
                    let items = assistant.live_news().await;
                    if items.is_empty() {
                        fail(EXIT_NETWORK, "News sync failed", "no live news returned");
                    }
                    desk.store_live(&items, Utc::now())
                        .unwrap_or_else(|e| fail(EXIT_INPUT, "Failed to store news", e));
                    println!("Synced {} live news items.", items.len());
                }
                NewsAction::Publish {
                    title,
                    category,
                    excerpt,
                    date,
                    url,
                } => {
                    if title.trim().is_empty() || excerpt.trim().is_empty() {
                        fail(EXIT_INPUT, "Invalid news item", "title and excerpt are required");
                    }
                    let draft = NewsDraft {
                        title: title.trim().to_string(),
                        category: *category,
                        date: date
                            .clone()
                            .unwrap_or_else(|| Utc::now().format("%Y-%m-%d").to_string()),
                        excerpt: excerpt.trim().to_string(),
                        source_url: url.clone(),
                    };
                    let item = desk
                        .publish(draft)
                        .unwrap_or_else(|e| fail(EXIT_INPUT, "Failed to publish", e));
                    println!("Published '{}' (id {}).", item.title, item.id);
                }
                NewsAction::Delete { id } => match desk.delete(id) {
                    Ok(true) => println!("Deleted news item {}.", id),
                    Ok(false) => fail(EXIT_INPUT, "Delete failed", format!("no news item with id {}", id)),
                    Err(e) => fail(EXIT_INPUT, "Failed to update news", e),
                },
            }
        }
        Commands::Ask { message, attach } => {
            let assistant = build_assistant(&cli, &config);
            let mut session = ChatSession::new();
            let message = message.as_deref().unwrap_or("");
            let turn = match attach {
                Some(path) => {
                    let image = InlineImage::from_path(path)
                        .unwrap_or_else(|e| fail(EXIT_INPUT, "Invalid attachment", e));
                    session.send_with_attachment(&assistant, message, Some(image)).await
                }
                None => session.send(&assistant, message).await,
            };
            std::process::exit(print_turn(turn, use_colors));
        }
        Commands::Chat => {
            let assistant = build_assistant(&cli, &config);
            let mut session = ChatSession::new();
            if let Some(welcome) = session.transcript().first() {
                println!("{}", welcome.text);
            }
            println!("(type 'exit' to quit)");

            let mut lines = BufReader::new(tokio::io::stdin()).lines();
            loop {
                eprint!("> ");
                let line = match lines.next_line().await {
                    Ok(Some(line)) => line,
                    Ok(None) => break,
                    Err(e) => fail(EXIT_INPUT, "Failed to read input", e),
                };
                if matches!(line.trim(), "exit" | "quit") {
                    break;
                }
                let send = session.send(&assistant, &line);
                tokio::pin!(send);
                let turn = tokio::select! {
                    turn = &mut send => turn,
                    _ = tokio::signal::ctrl_c() => {
                        assistant.cancel_all();
                        send.await
                    }
                };
                print_turn(turn, use_colors);
            }
        }
        Commands::Open { university } => {
            let u = resolve_institution(university);
            if let Err(e) = campus_ai::browser::open_portal(u) {
                fail(EXIT_NETWORK, "Failed to open browser", e);
            }
            println!("Opening {} portal in browser: {}", u.name, u.url);
        }
        // Written before the config is loaded.
        Commands::Init { .. } => {}
    }

    std::process::exit(EXIT_SUCCESS);
}

/// Print one chat turn and return the exit code it implies.
fn print_turn(turn: ChatTurn, use_colors: bool) -> i32 {
    match turn {
        ChatTurn::Replied(reply) => {
            println!("{}", reply.text);
            let sources = output::format_sources(&reply.sources, use_colors);
            if !sources.is_empty() {
                println!();
                println!("{}", sources);
            }
            EXIT_SUCCESS
        }
        ChatTurn::Failed { message, .. } => {
            println!("{}", message);
            EXIT_NETWORK
        }
        ChatTurn::Ignored => EXIT_INPUT,
    }
}
