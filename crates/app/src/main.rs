use std::fmt;

use progression_core::catalog::SEEDED_TRACKS;
use progression_core::model::{
    LessonId, NotificationFilter, NotificationId, ReplayXpPolicy, Track, UserId,
};
use progression_core::{LessonStatus, QuizEvent, QuizSession};
use services::{
    AppServices, Clock, DEFAULT_NOTIFICATION_LIMIT, EngineError, ProgressEvent, ProgressObserver,
    ProgressionEngine,
};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing_subscriber::EnvFilter;

#[derive(Debug)]
enum ArgsError {
    MissingValue { flag: &'static str },
    UnknownArg(String),
    InvalidDbUrl { raw: String },
    InvalidUser { raw: String },
    InvalidReplayXp { raw: String },
}

impl fmt::Display for ArgsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArgsError::MissingValue { flag } => write!(f, "{flag} requires a value"),
            ArgsError::UnknownArg(arg) => write!(f, "unknown argument: {arg}"),
            ArgsError::InvalidDbUrl { raw } => write!(f, "invalid --db value: {raw}"),
            ArgsError::InvalidUser { raw } => write!(f, "invalid --user value: {raw:?}"),
            ArgsError::InvalidReplayXp { raw } => {
                write!(f, "invalid --replay-xp value: {raw} (expected first|every)")
            }
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

struct Args {
    db_url: String,
    user: UserId,
    replay_xp: ReplayXpPolicy,
}

fn print_usage() {
    eprintln!("Usage:");
    eprintln!("  cargo run -p app -- [--db <sqlite_url>] [--user <id>] [--replay-xp first|every]");
    eprintln!();
    eprintln!("Defaults:");
    eprintln!("  --db sqlite://dev.sqlite3");
    eprintln!("  --user local");
    eprintln!("  --replay-xp first");
    eprintln!();
    eprintln!("Environment:");
    eprintln!("  LEARN_DB_URL, LEARN_USER_ID, LEARN_REPLAY_XP, RUST_LOG");
}

fn parse_user(raw: String) -> Result<UserId, ArgsError> {
    UserId::new(raw.clone()).map_err(|_| ArgsError::InvalidUser { raw })
}

fn parse_replay_xp(raw: String) -> Result<ReplayXpPolicy, ArgsError> {
    raw.parse()
        .map_err(|_| ArgsError::InvalidReplayXp { raw })
}

impl Args {
    fn parse(args: &mut impl Iterator<Item = String>) -> Result<Self, ArgsError> {
        let mut db_url = std::env::var("LEARN_DB_URL")
            .ok()
            .map_or_else(|| "sqlite://dev.sqlite3".into(), normalize_sqlite_url);
        let mut user = parse_user(std::env::var("LEARN_USER_ID").unwrap_or_else(|_| "local".into()))?;
        let mut replay_xp = match std::env::var("LEARN_REPLAY_XP") {
            Ok(raw) => parse_replay_xp(raw)?,
            Err(_) => ReplayXpPolicy::default(),
        };

        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--db" => {
                    let value = require_value(args, "--db")?;
                    if value.trim().is_empty() {
                        return Err(ArgsError::InvalidDbUrl { raw: value });
                    }
                    db_url = normalize_sqlite_url(value);
                }
                "--user" => user = parse_user(require_value(args, "--user")?)?,
                "--replay-xp" => replay_xp = parse_replay_xp(require_value(args, "--replay-xp")?)?,
                "--help" | "-h" => {
                    print_usage();
                    std::process::exit(0);
                }
                _ => return Err(ArgsError::UnknownArg(arg)),
            }
        }

        Ok(Self {
            db_url,
            user,
            replay_xp,
        })
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

/// Prints commit outcomes as they happen.
struct TerminalObserver;

impl ProgressObserver for TerminalObserver {
    fn on_event(&mut self, event: &ProgressEvent) {
        match event {
            ProgressEvent::Committed(summary) => {
                println!(
                    "Saved: +{} XP (total {} XP, level {}, {}% to next)",
                    summary.outcome.xp_awarded,
                    summary.level.total_xp,
                    summary.level.level,
                    summary.level.percent()
                );
                if summary.outcome.leveled_up() {
                    println!("Level up! You are now level {}.", summary.outcome.level_after);
                }
            }
            ProgressEvent::CommitFailed { lesson_id } => {
                println!("Could not save lesson {lesson_id}. Type `retry` to try again.");
            }
            ProgressEvent::SignedOut { user } => println!("Goodbye, {user}."),
            ProgressEvent::TrackLoaded { .. } | ProgressEvent::Quiz(_) => {}
        }
    }
}

#[derive(Debug, PartialEq, Eq)]
enum Input {
    Help,
    Tracks,
    Track(String),
    Start(LessonId),
    Pick(usize),
    Submit,
    Next,
    Restart,
    Abandon,
    Retry,
    Me,
    Inbox(NotificationFilter),
    Read(NotificationId),
    ReadAll,
    Delete(NotificationId),
    Clear,
    Quit,
}

fn parse_input(line: &str) -> Result<Input, String> {
    let mut parts = line.split_whitespace();
    let Some(cmd) = parts.next() else {
        return Err(String::new());
    };
    let arg = parts.next();
    let number = |what: &str| -> Result<u64, String> {
        arg.ok_or_else(|| format!("{cmd} needs {what}"))?
            .parse::<u64>()
            .map_err(|_| format!("{cmd} needs {what}"))
    };

    match cmd {
        "help" | "?" => Ok(Input::Help),
        "tracks" => Ok(Input::Tracks),
        "track" => arg
            .map(|t| Input::Track(t.to_string()))
            .ok_or_else(|| "track needs a name".into()),
        "start" => number("a lesson id").map(|id| Input::Start(LessonId::new(id))),
        "pick" => {
            let n = number("an option number")?;
            let index = usize::try_from(n)
                .ok()
                .and_then(|n| n.checked_sub(1))
                .ok_or_else(|| "options are numbered from 1".to_string())?;
            Ok(Input::Pick(index))
        }
        "submit" => Ok(Input::Submit),
        "next" => Ok(Input::Next),
        "restart" => Ok(Input::Restart),
        "abandon" => Ok(Input::Abandon),
        "retry" => Ok(Input::Retry),
        "me" => Ok(Input::Me),
        "inbox" => arg
            .map_or(Ok(NotificationFilter::All), str::parse)
            .map(Input::Inbox),
        "read" => number("a notification id").map(|id| Input::Read(NotificationId::new(id))),
        "read-all" => Ok(Input::ReadAll),
        "delete" => number("a notification id").map(|id| Input::Delete(NotificationId::new(id))),
        "clear" => Ok(Input::Clear),
        "quit" | "exit" => Ok(Input::Quit),
        other => Err(format!("unknown command: {other} (try `help`)")),
    }
}

/// Line-oriented output; captured in tests, printed otherwise.
#[derive(Default)]
struct Screen {
    captured: Option<Vec<String>>,
}

impl Screen {
    fn say(&mut self, line: impl Into<String>) {
        let line = line.into();
        match &mut self.captured {
            Some(lines) => lines.push(line),
            None => println!("{line}"),
        }
    }
}

fn print_commands(screen: &mut Screen) {
    for line in [
        "Commands:",
        "  tracks              list built-in tracks",
        "  track <name>        show lessons and which are unlocked",
        "  start <lesson id>   begin a lesson quiz",
        "  pick <n>            select option n",
        "  submit              check the selected option",
        "  next                continue after feedback",
        "  restart             start the current lesson over",
        "  abandon             leave the current quiz",
        "  retry               save a finished quiz again",
        "  me                  show level and XP",
        "  inbox [all|unread|system|community]",
        "  read <id> | read-all | delete <id> | clear",
        "  quit",
    ] {
        screen.say(line);
    }
}

fn render_question(screen: &mut Screen, quiz: &QuizSession) {
    let (Some(index), Some(question)) = (quiz.current_question_index(), quiz.current_question())
    else {
        return;
    };
    screen.say("");
    screen.say(format!(
        "[{}] Question {}/{}: {}",
        quiz.lesson().title(),
        index + 1,
        quiz.total_questions(),
        question.prompt()
    ));
    for (i, option) in question.options().iter().enumerate() {
        let marker = if quiz.selected_option() == Some(i) { '>' } else { ' ' };
        screen.say(format!(" {marker} {}. {option}", i + 1));
    }
}

fn render_event(engine: &ProgressionEngine, screen: &mut Screen, event: &QuizEvent) {
    match event {
        QuizEvent::QuestionPresented { .. } | QuizEvent::OptionSelected { .. } => {
            if let Some(quiz) = engine.quiz() {
                render_question(screen, quiz);
            }
        }
        QuizEvent::AnswerRevealed(feedback) => {
            if feedback.correct {
                screen.say("Correct!");
            } else {
                screen.say(format!(
                    "Not quite. The answer was option {}.",
                    feedback.correct_option + 1
                ));
            }
            if !feedback.explanation.is_empty() {
                screen.say(feedback.explanation.clone());
            }
            if feedback.is_last_question {
                screen.say("Type `next` to finish.");
            } else {
                screen.say("Type `next` to continue.");
            }
        }
        QuizEvent::Finished(result) => {
            screen.say(format!(
                "Finished: {}/{} correct, score {}, {} XP earned.",
                result.correct_count, result.total_questions, result.cumulative_score, result.earned_xp
            ));
            if result.is_perfect() {
                screen.say("Perfect score!");
            }
        }
    }
}

async fn show_track(
    engine: &mut ProgressionEngine,
    screen: &mut Screen,
    name: &str,
) -> Result<(), EngineError> {
    let track = match Track::new(name) {
        Ok(track) => track,
        Err(err) => {
            screen.say(err.to_string());
            return Ok(());
        }
    };
    let lessons = engine.load_track(&track).await?;
    if lessons.is_empty() {
        screen.say(format!("No lessons in {}.", track.display_name()));
        return Ok(());
    }
    let progress = engine.progress().track_progress(&track);
    screen.say(format!(
        "{} ({}/{} complete, {}%)",
        track.display_name(),
        progress.completed_count,
        lessons.len(),
        progress.percent()
    ));
    for (lesson, status) in lessons.iter() {
        let label = match status {
            LessonStatus::Completed => "done",
            LessonStatus::Unlocked => "open",
            LessonStatus::Locked => "locked",
        };
        screen.say(format!(
            "  #{:<4} {:>2}. {:<40} {:>4} XP  [{label}]",
            lesson.id().value(),
            lesson.order(),
            lesson.title(),
            lesson.xp_reward()
        ));
    }
    if let Some(next) = lessons.next_playable() {
        screen.say(format!("Next up: `start {}`", next.id()));
    }
    Ok(())
}

async fn show_inbox(engine: &ProgressionEngine, screen: &mut Screen, filter: NotificationFilter) {
    let user = engine.user().clone();
    match engine
        .notifications()
        .list(&user, filter, DEFAULT_NOTIFICATION_LIMIT)
        .await
    {
        Ok(items) if items.is_empty() => screen.say("No notifications."),
        Ok(items) => {
            for n in items {
                let dot = if n.read { ' ' } else { '*' };
                screen.say(format!(
                    "{dot} #{} [{}] {} - {}",
                    n.id,
                    n.kind.icon(),
                    n.title,
                    n.message
                ));
            }
        }
        Err(err) => screen.say(format!("Could not load notifications: {err}")),
    }
}

async fn handle(
    engine: &mut ProgressionEngine,
    screen: &mut Screen,
    input: Input,
) -> Result<bool, EngineError> {
    match input {
        Input::Help => print_commands(screen),
        Input::Tracks => {
            for name in SEEDED_TRACKS {
                if let Ok(track) = Track::new(*name) {
                    screen.say(format!("  {:<12} {}", track.as_str(), track.display_name()));
                }
            }
        }
        Input::Track(name) => show_track(engine, screen, &name).await?,
        Input::Start(id) => {
            let event = engine.start_lesson(id).await?;
            render_event(engine, screen, &event);
        }
        Input::Pick(option) => {
            let event = engine.select_option(option)?;
            render_event(engine, screen, &event);
        }
        Input::Submit => {
            let event = engine.submit_answer()?;
            render_event(engine, screen, &event);
        }
        Input::Next => match engine.advance().await {
            Ok(event) => render_event(engine, screen, &event),
            Err(err @ EngineError::SaveFailure(_)) => {
                // The quiz did finish; only the save is outstanding.
                if let Some(result) = engine.pending_result() {
                    render_event(engine, screen, &QuizEvent::Finished(result));
                }
                return Err(err);
            }
            Err(err) => return Err(err),
        },
        Input::Restart => {
            let event = engine.restart()?;
            render_event(engine, screen, &event);
        }
        Input::Abandon => {
            if engine.quiz().is_none() {
                return Err(EngineError::NoActiveQuiz);
            }
            if engine.pending_result().is_some() {
                screen.say("Unsaved result discarded.");
            }
            engine.abandon_quiz();
            screen.say("Left the quiz.");
        }
        Input::Retry => {
            engine.retry_commit().await?;
        }
        Input::Me => {
            let summary = engine.summary();
            screen.say(format!(
                "{}: level {}, {} XP ({} / {} into this level), {} lessons completed",
                summary.user,
                summary.level,
                summary.total_xp,
                summary.level_progress.xp_into_level,
                summary.level_progress.xp_for_next_level,
                summary.lessons_completed
            ));
        }
        Input::Inbox(filter) => show_inbox(engine, screen, filter).await,
        Input::Read(id) => {
            let user = engine.user().clone();
            if let Err(err) = engine.notifications().mark_read(&user, id).await {
                screen.say(format!("Could not mark #{id} read: {err}"));
            }
        }
        Input::ReadAll => {
            let user = engine.user().clone();
            match engine.notifications().mark_all_read(&user).await {
                Ok(n) => screen.say(format!("Marked {n} notifications read.")),
                Err(err) => screen.say(format!("Could not mark notifications read: {err}")),
            }
        }
        Input::Delete(id) => {
            let user = engine.user().clone();
            match engine.notifications().delete(&user, id).await {
                Ok(()) => screen.say(format!("Deleted #{id}.")),
                Err(err) => screen.say(format!("Could not delete #{id}: {err}")),
            }
        }
        Input::Clear => {
            let user = engine.user().clone();
            match engine.notifications().clear(&user).await {
                Ok(n) => screen.say(format!("Removed {n} notifications.")),
                Err(err) => screen.say(format!("Could not clear notifications: {err}")),
            }
        }
        Input::Quit => return Ok(false),
    }
    Ok(true)
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let mut argv = std::env::args().skip(1);
    let args = Args::parse(&mut argv).map_err(|e| {
        eprintln!("{e}");
        print_usage();
        e
    })?;

    prepare_sqlite_file(&args.db_url)?;
    let services = AppServices::new_sqlite(&args.db_url, Clock::default(), args.replay_xp).await?;
    let mut engine = services.sign_in(args.user).await?;
    engine.subscribe(Box::new(TerminalObserver));

    let summary = engine.summary();
    println!(
        "Welcome, {}. Level {} with {} XP. Type `help` for commands.",
        summary.user, summary.level, summary.total_xp
    );
    if let Ok(unread) = engine.notifications().unread_count(engine.user()).await {
        if unread > 0 {
            println!("You have {unread} unread notifications (`inbox`).");
        }
    }

    let mut screen = Screen::default();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        let input = match parse_input(&line) {
            Ok(input) => input,
            Err(msg) if msg.is_empty() => continue,
            Err(msg) => {
                screen.say(msg);
                continue;
            }
        };
        match handle(&mut engine, &mut screen, input).await {
            Ok(true) => {}
            Ok(false) => break,
            Err(err @ (EngineError::LoadFailure(_) | EngineError::SaveFailure(_))) => {
                tracing::warn!(error = ?err, "storage operation failed");
                screen.say(err.to_string());
            }
            Err(err) => screen.say(err.to_string()),
        }
    }

    engine.sign_out();
    Ok(())
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    if let Err(err) = run().await {
        eprintln!("{err}");
        std::process::exit(2);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pick_is_one_based() {
        assert_eq!(parse_input("pick 1"), Ok(Input::Pick(0)));
        assert!(parse_input("pick 0").is_err());
        assert!(parse_input("pick x").is_err());
    }

    #[test]
    fn commands_parse() {
        assert_eq!(parse_input("start 3"), Ok(Input::Start(LessonId::new(3))));
        assert_eq!(parse_input("track python"), Ok(Input::Track("python".into())));
        assert_eq!(parse_input("  read-all "), Ok(Input::ReadAll));
        assert_eq!(parse_input(""), Err(String::new()));
        assert!(parse_input("dance").is_err());
    }

    #[test]
    fn inbox_takes_an_optional_tab() {
        assert_eq!(parse_input("inbox"), Ok(Input::Inbox(NotificationFilter::All)));
        assert_eq!(
            parse_input("inbox community"),
            Ok(Input::Inbox(NotificationFilter::Community))
        );
        assert!(parse_input("inbox archived").is_err());
        assert_eq!(parse_input("delete 4"), Ok(Input::Delete(NotificationId::new(4))));
        assert!(parse_input("delete").is_err());
        assert_eq!(parse_input("clear"), Ok(Input::Clear));
        assert_eq!(parse_input("abandon"), Ok(Input::Abandon));
    }

    #[test]
    fn relative_sqlite_paths_become_absolute() {
        let url = normalize_sqlite_url("sqlite:data/dev.sqlite3".into());
        assert!(url.starts_with("sqlite:///"));
        assert!(url.ends_with("data/dev.sqlite3"));
        assert_eq!(normalize_sqlite_url("sqlite::memory:".into()), "sqlite::memory:");
    }

    use std::sync::Arc;

    use async_trait::async_trait;
    use progression_core::model::{Lesson, UserProgress};
    use progression_core::time::fixed_clock;
    use storage::repository::{InMemoryRepository, ProgressRepository, Storage, StorageError};

    /// Reads succeed, every save is refused.
    struct ReadOnlyProgress(InMemoryRepository);

    #[async_trait]
    impl ProgressRepository for ReadOnlyProgress {
        async fn get_or_init_progress(&self, user: &UserId) -> Result<UserProgress, StorageError> {
            self.0.get_or_init_progress(user).await
        }

        async fn save_progress(
            &self,
            _user: &UserId,
            _progress: &UserProgress,
        ) -> Result<(), StorageError> {
            Err(StorageError::Connection("read-only".into()))
        }
    }

    fn captured() -> Screen {
        Screen {
            captured: Some(Vec::new()),
        }
    }

    fn lines(screen: &Screen) -> &[String] {
        screen.captured.as_deref().unwrap_or_default()
    }

    async fn signed_in(storage: &Storage) -> (ProgressionEngine, Lesson) {
        let services = AppServices::from_storage(storage, fixed_clock(), ReplayXpPolicy::default());
        let mut engine = services.sign_in(UserId::new("learner").unwrap()).await.unwrap();
        let track = engine.load_track(&Track::new("javascript").unwrap()).await.unwrap();
        let lesson = track.lessons()[0].clone();
        (engine, lesson)
    }

    async fn play(
        engine: &mut ProgressionEngine,
        screen: &mut Screen,
        lesson: &Lesson,
    ) -> Result<bool, EngineError> {
        handle(engine, screen, Input::Start(lesson.id())).await?;
        let mut last = Ok(true);
        for question in lesson.questions() {
            handle(engine, screen, Input::Pick(question.correct_option())).await?;
            handle(engine, screen, Input::Submit).await?;
            last = handle(engine, screen, Input::Next).await;
        }
        last
    }

    #[tokio::test]
    async fn finished_quiz_is_shown_even_when_the_save_fails() {
        let repo = InMemoryRepository::new();
        let storage = Storage {
            lessons: Arc::new(repo.clone()),
            progress: Arc::new(ReadOnlyProgress(repo.clone())),
            notifications: Arc::new(repo),
        };
        let (mut engine, lesson) = signed_in(&storage).await;
        let mut screen = captured();

        let outcome = play(&mut engine, &mut screen, &lesson).await;

        assert!(matches!(outcome, Err(EngineError::SaveFailure(_))));
        assert!(engine.pending_result().is_some());
        let finished = format!("Finished: {n}/{n} correct", n = lesson.question_count());
        assert!(lines(&screen).iter().any(|l| l.starts_with(&finished)));
        assert!(lines(&screen).iter().any(|l| l == "Perfect score!"));
    }

    #[tokio::test]
    async fn abandon_drops_the_unsaved_result() {
        let repo = InMemoryRepository::new();
        let storage = Storage {
            lessons: Arc::new(repo.clone()),
            progress: Arc::new(ReadOnlyProgress(repo.clone())),
            notifications: Arc::new(repo),
        };
        let (mut engine, lesson) = signed_in(&storage).await;
        let mut screen = captured();
        play(&mut engine, &mut screen, &lesson).await.unwrap_err();

        assert!(handle(&mut engine, &mut screen, Input::Abandon).await.unwrap());

        assert!(engine.quiz().is_none());
        assert!(engine.pending_result().is_none());
        assert!(lines(&screen).iter().any(|l| l == "Unsaved result discarded."));
        assert!(matches!(
            handle(&mut engine, &mut screen, Input::Abandon).await,
            Err(EngineError::NoActiveQuiz)
        ));
    }

    #[tokio::test]
    async fn inbox_commands_filter_delete_and_clear() {
        let storage = Storage::in_memory();
        let (mut engine, lesson) = signed_in(&storage).await;
        let mut screen = captured();

        handle(&mut engine, &mut screen, Input::Inbox(NotificationFilter::All)).await.unwrap();
        assert_eq!(lines(&screen).len(), 3);

        play(&mut engine, &mut screen, &lesson).await.unwrap();
        let mut screen = captured();
        handle(&mut engine, &mut screen, Input::Inbox(NotificationFilter::Community))
            .await
            .unwrap();
        let community = lines(&screen).to_vec();
        assert!(community.iter().any(|l| l.contains("[trophy]")));

        let user = engine.user().clone();
        let newest = engine
            .notifications()
            .list(&user, NotificationFilter::All, 1)
            .await
            .unwrap()[0]
            .id;
        handle(&mut engine, &mut screen, Input::Delete(newest)).await.unwrap();
        handle(&mut engine, &mut screen, Input::Delete(newest)).await.unwrap();
        assert!(lines(&screen).iter().any(|l| l == &format!("Deleted #{newest}.")));
        assert!(lines(&screen).iter().any(|l| l.starts_with(&format!("Could not delete #{newest}"))));

        handle(&mut engine, &mut screen, Input::Clear).await.unwrap();
        let mut screen = captured();
        handle(&mut engine, &mut screen, Input::Inbox(NotificationFilter::All)).await.unwrap();
        assert_eq!(lines(&screen), ["No notifications."]);
    }
}
