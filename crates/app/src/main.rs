use std::fmt;
use std::io::Write;
use std::sync::Arc;

use quiz_core::model::QuizResults;
use services::{
    AppServices, Clock, FileQuestionSource, HttpQuestionSource, LoadState, QuestionSource,
    QuizConfig, QuizOrchestrator, QuizView,
};
use tokio::io::{AsyncBufReadExt, BufReader};

#[derive(Debug)]
enum ArgsError {
    MissingValue { flag: &'static str },
    UnknownArg(String),
    InvalidDbUrl { raw: String },
}

impl fmt::Display for ArgsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArgsError::MissingValue { flag } => write!(f, "{flag} requires a value"),
            ArgsError::UnknownArg(arg) => write!(f, "unknown argument: {arg}"),
            ArgsError::InvalidDbUrl { raw } => write!(f, "invalid --db value: {raw}"),
        }
    }
}

impl std::error::Error for ArgsError {}

fn require_value(
    args: &mut impl Iterator<Item = String>,
    flag: &'static str,
) -> Result<String, ArgsError> {
    args.next().ok_or(ArgsError::MissingValue { flag })
}

fn print_usage() {
    eprintln!("Usage:");
    eprintln!("  cargo run -p app -- [--db <sqlite_url>] [--questions <file> | --source <url>] [--new-session]");
    eprintln!();
    eprintln!("Defaults:");
    eprintln!("  --db sqlite://quiz.sqlite3");
    eprintln!("  questions come from QUIZ_SOURCE_URL (default http://localhost:3000/api/questions)");
    eprintln!();
    eprintln!("Commands while playing:");
    eprintln!("  <number>  choose an option");
    eprintln!("  n         next question / see results");
    eprintln!("  r         reset the quiz");
    eprintln!("  h         go home (drop everything saved)");
    eprintln!("  q         quit");
    eprintln!();
    eprintln!("Environment:");
    eprintln!("  QUIZ_DB_URL, QUIZ_SOURCE_URL, QUIZ_QUESTION_LIMIT, QUIZ_MAX_RETRIES,");
    eprintln!("  QUIZ_RETRY_DELAY_MS, QUIZ_KEEP_QUESTIONS_ON_RESET, QUIZ_ADVANCE_POLICY,");
    eprintln!("  QUIZ_PASS_MARK, RUST_LOG");
}

enum SourceArg {
    Configured,
    File(String),
    Url(String),
}

struct Args {
    db_url: String,
    source: SourceArg,
    new_session: bool,
}

impl Args {
    fn parse(args: &mut impl Iterator<Item = String>) -> Result<Option<Self>, ArgsError> {
        let mut db_url = std::env::var("QUIZ_DB_URL")
            .ok()
            .map_or_else(|| "sqlite://quiz.sqlite3".into(), normalize_sqlite_url);
        let mut source = SourceArg::Configured;
        let mut new_session = false;

        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--db" => {
                    let value = require_value(args, "--db")?;
                    if value.trim().is_empty() {
                        return Err(ArgsError::InvalidDbUrl { raw: value });
                    }
                    db_url = normalize_sqlite_url(value);
                }
                "--questions" => source = SourceArg::File(require_value(args, "--questions")?),
                "--source" => source = SourceArg::Url(require_value(args, "--source")?),
                "--new-session" => new_session = true,
                "--help" | "-h" => return Ok(None),
                _ => return Err(ArgsError::UnknownArg(arg)),
            }
        }

        Ok(Some(Self {
            db_url,
            source,
            new_session,
        }))
    }

    fn question_source(&self) -> Option<Arc<dyn QuestionSource>> {
        match &self.source {
            SourceArg::Configured => None,
            SourceArg::File(path) => Some(Arc::new(FileQuestionSource::new(path))),
            SourceArg::Url(url) => Some(Arc::new(HttpQuestionSource::new(url.clone()))),
        }
    }
}

fn normalize_sqlite_url(raw: String) -> String {
    if raw == "sqlite::memory:" || raw.starts_with("sqlite://") {
        return raw;
    }

    let trimmed = raw.trim().to_string();
    let path_str = trimmed
        .strip_prefix("sqlite:")
        .unwrap_or(trimmed.as_str())
        .to_string();
    let path = std::path::Path::new(&path_str);
    let absolute = if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir()
            .unwrap_or_else(|_| std::path::PathBuf::from("."))
            .join(path)
    };
    format!("sqlite://{}", absolute.display())
}

fn prepare_sqlite_file(db_url: &str) -> Result<(), Box<dyn std::error::Error>> {
    if db_url == "sqlite::memory:" {
        return Ok(());
    }

    let path = db_url
        .strip_prefix("sqlite://")
        .ok_or_else(|| ArgsError::InvalidDbUrl {
            raw: db_url.to_string(),
        })?;
    let path = path.split('?').next().unwrap_or(path);
    if path.is_empty() {
        return Err(ArgsError::InvalidDbUrl {
            raw: db_url.to_string(),
        }
        .into());
    }

    let path = std::path::Path::new(path);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    if !path.exists() {
        std::fs::OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(false)
            .open(path)?;
    }

    Ok(())
}

// ─── RENDERING ─────────────────────────────────────────────────────────────

fn render(view: &QuizView, pass_mark: u32) {
    match &view.load_state {
        LoadState::Idle => {
            println!("Welcome to the quiz. Press n to start, q to quit.");
            return;
        }
        LoadState::Loading => {
            println!("Loading questions...");
            return;
        }
        LoadState::Failed(err) => {
            println!("Could not load questions: {err}");
            println!("Press n to try again, q to quit.");
            return;
        }
        LoadState::Ready => {}
    }

    if let Some(results) = view.results {
        render_results(&results, pass_mark);
        return;
    }

    let Some(question) = &view.question else {
        println!("No questions available. Press n to finish.");
        return;
    };

    let stats = &view.stats;
    println!();
    println!(
        "Question {} of {}  [{}]  {}",
        view.question_number,
        view.total,
        question.category(),
        "*".repeat(usize::from(view.difficulty_stars)),
    );
    println!(
        "Score {}%  Wrong {}%  Max possible {}%  Progress {}%",
        stats.score_percent,
        stats.wrong_percent,
        stats.max_possible_percent,
        stats.top_progress_percent,
    );
    println!("{}", question.text());
    for (i, option) in question.options().iter().enumerate() {
        let marker = match (view.is_revealed, view.selected_option) {
            (true, _) if question.is_correct(i) => "+",
            (true, Some(selected)) if selected == i => "x",
            (_, Some(selected)) if selected == i => ">",
            _ => " ",
        };
        println!(" {marker} {}. {option}", i + 1);
    }

    if let Some(feedback) = view.feedback {
        println!("{}", feedback.title());
        if let Some(correct) = question.correct_option() {
            println!("Answer: {correct}");
        }
        println!("Press n for {}.", view.next_action.label());
    }
}

fn render_results(results: &QuizResults, pass_mark: u32) {
    println!();
    println!(
        "You scored {} out of {} ({}%).",
        results.score,
        results.total,
        results.percent()
    );
    if results.passed(pass_mark) {
        println!("Passed!");
    } else {
        println!("Not quite; {pass_mark} correct answers are needed to pass.");
    }
    println!("Press r to play again, h to go home, q to quit.");
}

fn describe_elapsed(millis: i64) -> String {
    let minutes = millis.max(0) / 60_000;
    match minutes {
        0 => "just now".into(),
        1..=59 => format!("{minutes} min ago"),
        60..=1439 => format!("{} h ago", minutes / 60),
        _ => format!("{} days ago", minutes / 1440),
    }
}

// ─── INPUT LOOP ────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Input {
    Select(usize),
    Advance,
    Reset,
    Home,
    Quit,
    Unknown,
}

impl Input {
    fn parse(line: &str) -> Self {
        match line.trim() {
            "n" | "" => Self::Advance,
            "r" => Self::Reset,
            "h" => Self::Home,
            "q" => Self::Quit,
            other => other
                .parse::<usize>()
                .ok()
                .and_then(|n| n.checked_sub(1))
                .map_or(Self::Unknown, Self::Select),
        }
    }
}

async fn play(
    quiz: &mut QuizOrchestrator,
    pass_mark: u32,
) -> Result<(), Box<dyn std::error::Error>> {
    if let Some(previous) = quiz.last_results().await {
        println!(
            "Last time you scored {} out of {}.",
            previous.score, previous.total
        );
    }
    if let Some(last_active) = quiz.last_active().await {
        let elapsed = Clock::default_clock().now_millis() - last_active;
        println!("Last played {}.", describe_elapsed(elapsed));
    }

    quiz.start().await;
    render(&quiz.view(), pass_mark);

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        print!("> ");
        std::io::stdout().flush()?;
        let Some(line) = lines.next_line().await? else {
            break;
        };

        match Input::parse(&line) {
            Input::Select(option) => quiz.on_select(option).await,
            Input::Advance => match quiz.load_state() {
                LoadState::Ready => quiz.on_advance().await,
                _ => quiz.start().await,
            },
            Input::Reset => {
                quiz.on_reset_quiz().await;
                quiz.start().await;
            }
            Input::Home => quiz.on_go_home().await,
            Input::Quit => break,
            Input::Unknown => {
                println!("Unknown command: {}", line.trim());
                continue;
            }
        }
        render(&quiz.view(), pass_mark);
    }

    quiz.teardown_handle().teardown();
    Ok(())
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let mut argv = std::env::args().skip(1);
    let parsed = match Args::parse(&mut argv) {
        Ok(Some(parsed)) => parsed,
        Ok(None) => {
            print_usage();
            return Ok(());
        }
        Err(e) => {
            eprintln!("{e}");
            print_usage();
            return Err(e.into());
        }
    };

    let config = QuizConfig::from_env();
    log::debug!("starting with {config:?}");

    // Open + migrate SQLite at startup. Keep this in the binary glue so core/services stay pure.
    prepare_sqlite_file(&parsed.db_url)?;
    let app = AppServices::new_sqlite(
        &parsed.db_url,
        config,
        Clock::default_clock(),
        parsed.question_source(),
    )
    .await?;

    if parsed.new_session {
        app.begin_browser_session().await;
    }

    let pass_mark = app.config().pass_mark;
    let mut quiz = app.orchestrator();
    play(&mut quiz, pass_mark).await
}

#[tokio::main]
async fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    if let Err(err) = run().await {
        // At this layer (binary glue), printing once is fine.
        eprintln!("{err}");
        std::process::exit(2);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(list: &[&str]) -> impl Iterator<Item = String> {
        list.iter().map(|s| (*s).to_string()).collect::<Vec<_>>().into_iter()
    }

    #[test]
    fn input_numbers_are_one_based() {
        assert_eq!(Input::parse("1"), Input::Select(0));
        assert_eq!(Input::parse(" 3 \n"), Input::Select(2));
        assert_eq!(Input::parse("0"), Input::Unknown);
        assert_eq!(Input::parse("n"), Input::Advance);
        assert_eq!(Input::parse("x"), Input::Unknown);
    }

    #[test]
    fn elapsed_time_is_humanized() {
        assert_eq!(describe_elapsed(-5), "just now");
        assert_eq!(describe_elapsed(30_000), "just now");
        assert_eq!(describe_elapsed(5 * 60_000), "5 min ago");
        assert_eq!(describe_elapsed(3 * 3_600_000), "3 h ago");
        assert_eq!(describe_elapsed(2 * 86_400_000), "2 days ago");
    }

    #[test]
    fn parse_reads_flags() {
        let parsed = Args::parse(&mut args(&[
            "--db",
            "sqlite::memory:",
            "--questions",
            "demos/questions.json",
            "--new-session",
        ]))
        .unwrap()
        .unwrap();
        assert_eq!(parsed.db_url, "sqlite::memory:");
        assert!(parsed.new_session);
        assert!(matches!(parsed.source, SourceArg::File(ref p) if p == "demos/questions.json"));
    }

    #[test]
    fn parse_rejects_unknown_and_missing_values() {
        assert!(matches!(
            Args::parse(&mut args(&["--bogus"])),
            Err(ArgsError::UnknownArg(_))
        ));
        assert!(matches!(
            Args::parse(&mut args(&["--db"])),
            Err(ArgsError::MissingValue { flag: "--db" })
        ));
        assert!(matches!(Args::parse(&mut args(&["--help"])), Ok(None)));
    }

    #[test]
    fn relative_sqlite_paths_become_absolute() {
        let url = normalize_sqlite_url("data/quiz.db".into());
        assert!(url.starts_with("sqlite:///"));
        assert!(url.ends_with("data/quiz.db"));
        assert_eq!(normalize_sqlite_url("sqlite::memory:".into()), "sqlite::memory:");
    }
}
