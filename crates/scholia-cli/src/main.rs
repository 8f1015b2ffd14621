//! `scholia`: terminal front end for the Scholia reading assistant.
//!
//! Every command runs against one [`LearningSession`] whose credential is
//! persisted under `SCHOLIA_STORAGE_DIR`, so `login` in one invocation
//! carries over to `ask` or `read` in the next.

mod render;

use std::io::Write;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{bail, Context};
use clap::{Args, Parser, Subcommand};
use scholia_models::{DocumentId, SelectionContext, Transcript};
use scholia_session::{
    FileCredentialStorage, LearningSession, Navigator, QuizInput, SessionConfig, ViewPhase,
};
use tokio::sync::oneshot;

#[derive(Parser, Debug)]
#[command(name = "scholia")]
#[command(author, version, about = "Scholia reading assistant", long_about = None)]
struct Cli {
    /// Backend base URL (overrides SCHOLIA_API_URL)
    #[arg(long, global = true)]
    api_url: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Sign in and remember the credential
    Login(AccountArgs),
    /// Create an account
    Signup(AccountArgs),
    /// Forget the stored credential
    Logout,
    /// Show who is signed in
    Whoami,
    /// Submit the background quiz
    Quiz(QuizArgs),
    /// Ask the assistant a question, optionally about a passage
    Ask(AskArgs),
    /// Read a chapter, optionally personalized and translated
    Read(ReadArgs),
}

#[derive(Args, Debug)]
struct AccountArgs {
    #[arg(long)]
    email: String,
    #[arg(long)]
    password: String,
}

#[derive(Args, Debug)]
struct QuizArgs {
    /// Python experience, 0-5
    #[arg(long, default_value_t = 0)]
    python: u8,
    /// ROS experience, 0-5
    #[arg(long, default_value_t = 0)]
    ros: u8,
    #[arg(long)]
    gpu: bool,
    #[arg(long)]
    jetson: bool,
    #[arg(long)]
    robot: bool,
}

#[derive(Args, Debug)]
struct AskArgs {
    /// The question
    question: String,
    /// Passage to ask about
    #[arg(long, requires = "chapter")]
    selection: Option<String>,
    /// Chapter the passage comes from
    #[arg(long, requires = "selection")]
    chapter: Option<String>,
}

#[derive(Args, Debug)]
struct ReadArgs {
    /// Chapter id, e.g. docs/ros2/nodes
    chapter: String,
    /// File holding the chapter text
    #[arg(long)]
    file: PathBuf,
    /// Personalize (or go to the quiz when no profile exists)
    #[arg(long)]
    personalize: bool,
    /// Translate the displayed text
    #[arg(long)]
    translate: bool,
}

/// Navigation in a terminal: tell the user where the browser would go.
#[derive(Debug)]
struct TerminalNavigator;

impl Navigator for TerminalNavigator {
    fn hard_navigate(&self, target: &str) {
        eprintln!("→ {target}");
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let mut config = SessionConfig::from_env();
    if let Some(url) = cli.api_url {
        config.api_url = url;
    }
    let storage = FileCredentialStorage::from_dir(config.storage_dir.as_deref())?;
    let session = LearningSession::new(config, Arc::new(storage), Arc::new(TerminalNavigator))?;
    let credential = session.start().await;

    match cli.command {
        Command::Login(args) => {
            let identity = session.accounts().sign_in(&args.email, &args.password).await?;
            println!("Signed in as {}", identity.display_name());
        }
        Command::Signup(args) => {
            session.accounts().sign_up(&args.email, &args.password).await?;
            println!("Account created. Sign in with `scholia login`.");
        }
        Command::Logout => {
            session.accounts().sign_out()?;
            println!("Signed out");
        }
        Command::Whoami => match credential.identity() {
            Some(identity) => println!("{} (id {})", identity.display_name(), identity.id),
            None => println!("Not signed in"),
        },
        Command::Quiz(args) => {
            let receipt = session
                .accounts()
                .submit_quiz(QuizInput {
                    python_experience: args.python,
                    ros_experience: args.ros,
                    has_gpu: args.gpu,
                    has_jetson: args.jetson,
                    has_robot_access: args.robot,
                })
                .await?;
            println!("{}", receipt.message);
        }
        Command::Ask(args) => return ask(&session, args).await,
        Command::Read(args) => read(&session, args).await?,
    }
    Ok(ExitCode::SUCCESS)
}

/// Failure text is already in the transcript, so a failed send is reported
/// through it and the exit code alone.
async fn ask(session: &LearningSession, args: AskArgs) -> anyhow::Result<ExitCode> {
    if !session.assistant_available() {
        bail!("the assistant is only available when signed in; run `scholia login`");
    }
    if let (Some(text), Some(chapter)) = (&args.selection, &args.chapter) {
        session
            .selection()
            .set(SelectionContext::capture(text, DocumentId::new(chapter)));
    }

    let chat = session.chat();
    let reply_index = chat.transcript().len() + 1;
    let (done_tx, done_rx) = oneshot::channel();
    let printer = tokio::spawn(render::stream_reply(chat.subscribe(), reply_index, done_rx));

    let result = chat.send(&args.question).await;
    let _ = done_tx.send(());
    printer.await.context("reply printer stopped")?;

    for line in after_reply(&chat.transcript(), reply_index) {
        println!("{line}");
    }
    std::io::stdout().flush()?;

    match result {
        Ok(_) => Ok(ExitCode::SUCCESS),
        Err(e) => {
            tracing::debug!(error = %e, "chat send failed");
            Ok(ExitCode::FAILURE)
        }
    }
}

/// Messages appended after the streamed reply, e.g. an error that followed
/// a partial answer.
fn after_reply(transcript: &Transcript, reply_index: usize) -> Vec<&str> {
    transcript
        .messages()
        .iter()
        .skip(reply_index + 1)
        .map(|m| m.text.as_str())
        .collect()
}

async fn read(session: &LearningSession, args: ReadArgs) -> anyhow::Result<()> {
    let text = std::fs::read_to_string(&args.file)
        .with_context(|| format!("reading {}", args.file.display()))?;
    let view = session.open_document(DocumentId::new(&args.chapter), text);

    if let ViewPhase::Redirecting(redirect) = view.attach().await {
        bail!("sign-in required ({})", redirect.reason);
    }
    if args.personalize {
        if let Err(e) = view.run_primary_action().await {
            tracing::warn!(error = %e, "personalize failed");
        }
    }
    if args.translate {
        if let Err(e) = view.transforms().translate().await {
            tracing::warn!(error = %e, "translate failed");
        }
    }

    render::print_view(&view.render());
    view.detach();
    Ok(())
}
