use clap::{error::ErrorKind, CommandFactory, Parser};
use crossterm::{
    cursor::MoveToColumn,
    execute, queue,
    style::{Print, Stylize},
    terminal::{disable_raw_mode, enable_raw_mode, Clear, ClearType},
    tty::IsTty,
};
use std::{
    error::Error,
    fs::{self, OpenOptions},
    io::{self, stdin, Write},
    path::PathBuf,
    sync::Mutex,
    time::Duration,
};
use tracing_subscriber::EnvFilter;
use typedrill::{
    app_dirs::AppDirs,
    config::{Config, ConfigStore, FileConfigStore},
    engine::Engine,
    feedback::BellFeedback,
    progress::{DrillId, ProgressSummary, ResultStore, SqliteResultStore, Trainer},
    runtime::{CrosstermEventSource, Flow, Runner, TICK_RATE_MS},
    session::{Session, SessionState},
    text_source::normalize_whitespace,
    time_series::peak_wpm,
};

/// typing drills with live speed, accuracy and rhythm scoring
#[derive(Parser, Debug, Clone)]
#[clap(version, about)]
pub struct Cli {
    /// text to practice; a random word drill is generated when omitted
    #[clap(short = 't', long)]
    text: Option<String>,

    /// lesson the drill belongs to, used to key saved results
    #[clap(short = 'l', long, default_value = "free")]
    lesson: String,

    /// drill index within the lesson
    #[clap(short = 'd', long, default_value_t = 0)]
    drill: usize,

    /// number of words in a generated drill
    #[clap(short = 'w', long)]
    words: Option<usize>,

    /// config file to use instead of the default location
    #[clap(long)]
    config: Option<PathBuf>,

    /// progress database to use instead of the default location
    #[clap(long)]
    db: Option<PathBuf>,

    /// print a summary of saved progress and exit
    #[clap(long)]
    progress: bool,

    /// write the effective config (file plus flags) back to the config file and exit
    #[clap(long)]
    save_config: bool,
}

fn init_logging() {
    let path = AppDirs::log_path();
    if let Some(parent) = path.parent() {
        let _ = fs::create_dir_all(parent);
    }
    let Ok(file) = OpenOptions::new().create(true).append(true).open(&path) else {
        return;
    };
    let filter = EnvFilter::try_from_env("TYPEDRILL_LOG").unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_ansi(false)
        .with_writer(Mutex::new(file))
        .try_init();
}

fn print_progress(store: &SqliteResultStore) -> Result<(), Box<dyn Error>> {
    let all = store.all()?;
    for (id, result) in &all {
        println!(
            "{id}\t{} wpm\t{}%\t{}\t{}",
            result.wpm,
            result.accuracy,
            result.tier,
            result.timestamp.format("%Y-%m-%d %H:%M")
        );
    }
    let summary = ProgressSummary::from_results(all.iter().map(|(_, r)| r));
    println!(
        "{} drills: {} mastered, {} proficient, {} needs practice, avg {:.0} wpm / {:.0}%",
        summary.drills,
        summary.mastered,
        summary.proficient,
        summary.needs_practice,
        summary.avg_wpm,
        summary.avg_accuracy
    );
    Ok(())
}

fn main() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();
    init_logging();

    let config_store = match &cli.config {
        Some(path) => FileConfigStore::with_path(path),
        None => FileConfigStore::new(),
    };
    let mut config = config_store.load();
    if let Some(words) = cli.words {
        config.fallback_word_count = words;
    }
    if cli.save_config {
        config_store.save(&config)?;
        println!("saved config to {}", config_store.path().display());
        return Ok(());
    }

    let store = SqliteResultStore::open(cli.db.clone().unwrap_or_else(AppDirs::db_path))?;
    if cli.progress {
        return print_progress(&store);
    }

    if !stdin().is_tty() {
        let mut cmd = Cli::command();
        cmd.error(ErrorKind::Io, "stdin must be a tty").exit();
    }

    let mut engine = Engine::new(&config);
    if config.bell_on_error {
        engine = engine.with_feedback(BellFeedback::new(io::stdout()));
    }
    let drill = DrillId::new(&cli.lesson, cli.drill);
    let mut trainer = Trainer::new(engine, store, drill.clone());
    let text = cli.text.as_deref().map(normalize_whitespace);
    trainer.load(drill, text.as_deref());

    enable_raw_mode()?;
    let outcome = run(&mut trainer, &config);
    disable_raw_mode()?;
    println!();
    outcome
}

fn run<S: ResultStore>(trainer: &mut Trainer<S>, config: &Config) -> Result<(), Box<dyn Error>> {
    let runner = Runner::new(
        CrosstermEventSource::new(),
        Duration::from_millis(TICK_RATE_MS),
    );
    let mut out = io::stdout();
    draw(&mut out, trainer.engine.session())?;

    loop {
        let event = runner.step();
        match runner.dispatch(trainer, event) {
            Flow::Quit => break,
            Flow::Continue => {}
            Flow::Redraw => draw(&mut out, trainer.engine.session())?,
            Flow::Finished(result) => {
                let session = trainer.engine.session();
                draw(&mut out, session)?;
                let peak = peak_wpm(&session.wpm_history).unwrap_or(result.wpm);
                let problem_keys = session
                    .error_summary()
                    .iter()
                    .take(3)
                    .map(|e| format!("{}\u{d7}{}", e.expected, e.count))
                    .collect::<Vec<_>>()
                    .join(" ");
                execute!(
                    out,
                    Print("\r\n"),
                    Print(format!(
                        "{}: {} wpm (peak {}) / {}% acc / {}% consistency / {}\r\n",
                        trainer.drill(),
                        result.wpm,
                        peak,
                        result.accuracy,
                        session.consistency,
                        result.tier,
                    ))
                )?;
                if !problem_keys.is_empty() {
                    execute!(out, Print(format!("problem keys: {problem_keys}\r\n")))?;
                }
                execute!(
                    out,
                    Print(format!("({:?} restarts, esc quits)\r\n", config.restart_key))
                )?;
            }
        }
    }
    Ok(())
}

/// One line: typed text colored by correctness, then the remaining target
fn draw<W: Write>(out: &mut W, session: &Session) -> io::Result<()> {
    queue!(out, MoveToColumn(0), Clear(ClearType::CurrentLine))?;
    for (idx, c) in session.typed.iter().enumerate() {
        if session.is_correct_at(idx) == Some(true) {
            queue!(out, Print(c.to_string().green()))?;
        } else {
            queue!(out, Print(c.to_string().red().underlined()))?;
        }
    }
    let rest: String = session.target[session.typed.len()..].iter().collect();
    queue!(out, Print(rest.dark_grey()))?;
    if session.state == SessionState::Running {
        queue!(out, Print(format!("  {} wpm", session.live_wpm).cyan()))?;
    }
    out.flush()
}
