//! Console front-end. Reads lines from stdin, answers through the
//! [`Session`], prints replies to stdout.
//!
//! Runs until `/quit`, Ctrl-C or end of input. Logging goes to stderr, so
//! stdout only ever carries the conversation.

use std::io::Write as _;

use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader};
use tracing::{debug, info, warn};

use crate::error::AppError;
use crate::message::{Message, Role};
use crate::responder::RemoteDelegate;
use crate::session::{Session, SessionStatus};

/// Canned questions offered by `/quick`.
pub const QUICK_QUESTIONS: &[(&str, &str)] = &[
    ("Sick Leave", "How many sick leaves do I get?"),
    ("Dress Code", "What is the dress code policy?"),
    ("Health Insurance", "Tell me about health insurance benefits"),
    ("Working Hours", "What are the working hours?"),
    ("Maternity Leave", "What is the maternity leave policy?"),
    ("Resignation", "How do I resign from the company?"),
];

#[derive(Debug, PartialEq, Eq)]
pub enum Command<'a> {
    Ask(&'a str),
    Quick(Option<usize>),
    History,
    Status,
    Clear,
    Help,
    Quit,
    Unknown(&'a str),
    Empty,
}

/// Interpret one input line.
pub fn parse_command(line: &str) -> Command<'_> {
    let line = line.trim();
    if line.is_empty() {
        return Command::Empty;
    }
    let Some(rest) = line.strip_prefix('/') else {
        return Command::Ask(line);
    };
    let mut words = rest.split_whitespace();
    match (words.next().unwrap_or(""), words.next()) {
        ("quick" | "q", None) => Command::Quick(None),
        ("quick" | "q", Some(n)) => match n.parse::<usize>() {
            Ok(i) if (1..=QUICK_QUESTIONS.len()).contains(&i) => Command::Quick(Some(i - 1)),
            _ => Command::Unknown(line),
        },
        ("history", None) => Command::History,
        ("status", None) => Command::Status,
        ("clear", None) => Command::Clear,
        ("help", None) => Command::Help,
        ("quit" | "exit", None) => Command::Quit,
        _ => Command::Unknown(line),
    }
}

pub fn status_line(status: &SessionStatus) -> String {
    match status {
        SessionStatus::Remote { provider } => format!("✅ {provider} AI active"),
        SessionStatus::Local => {
            "ℹ️ Local mode active\n💡 Add LLM_API_KEY (or GOOGLE_API_KEY) to .env for AI features".to_string()
        }
        SessionStatus::Degraded { error } => format!("⚠️ Local mode active (AI unavailable: {error})"),
    }
}

pub fn render_transcript(messages: &[Message]) -> String {
    let mut out = String::new();
    for m in messages {
        let who = match m.role {
            Role::User => "You",
            Role::Assistant => "HR Assistant",
        };
        out.push_str(&format!("{who}: {}\n───\n", m.content));
    }
    out
}

fn quick_menu() -> String {
    QUICK_QUESTIONS
        .iter()
        .enumerate()
        .map(|(i, (label, q))| format!("  /quick {}  {label} — \"{q}\"", i + 1))
        .collect::<Vec<_>>()
        .join("\n")
}

const HELP: &str = "Type a question and press Enter.
  /quick [N]  list or ask a quick question
  /history    show the conversation
  /status     show the answering mode
  /clear      clear the conversation
  /quit       exit";

/// Run the console loop against `session` on stdin until Ctrl-C.
pub async fn run<D: RemoteDelegate>(session: Session<D>, title: &str) -> Result<(), AppError> {
    serve(session, title, BufReader::new(tokio::io::stdin()), tokio::signal::ctrl_c()).await
}

/// The loop behind [`run`]. `shutdown` is watched for the whole lifetime of
/// the console, including while an answer is pending.
async fn serve<D, R, S>(mut session: Session<D>, title: &str, input: R, shutdown: S) -> Result<(), AppError>
where
    D: RemoteDelegate,
    R: AsyncBufRead + Unpin,
    S: Future,
{
    info!(session_id = %session.id(), "console started");
    println!("─────────────────────────────────");
    println!(" 🤖 {title}  (/help, Ctrl-C to quit)");
    println!("─────────────────────────────────");
    println!("{}", status_line(session.status()));
    if let Some(greeting) = session.messages().first() {
        println!("\n{}\n", greeting.content);
    }

    let mut lines = input.lines();
    tokio::pin!(shutdown);

    loop {
        print!("> ");
        let _ = std::io::stdout().flush();

        let line = tokio::select! {
            biased;

            _ = &mut shutdown => {
                println!();
                info!("interrupt received; closing console");
                break;
            }

            line = lines.next_line() => line,
        };

        let line = match line {
            Ok(Some(line)) => line,
            Ok(None) => {
                info!("stdin closed");
                break;
            }
            Err(e) => {
                warn!("console read error: {e}");
                return Err(AppError::Io(e));
            }
        };

        match parse_command(&line) {
            Command::Empty => {}
            Command::Ask(question) => {
                debug!(question_len = question.len(), "console question");
                let reply = tokio::select! {
                    biased;

                    _ = &mut shutdown => {
                        println!();
                        info!("interrupt received while answering; closing console");
                        break;
                    }

                    reply = session.submit(question) => reply,
                };
                match reply {
                    Some(answer) => println!("\n{answer}\n"),
                    None => println!("(same question as before — ignored)"),
                }
            }
            Command::Quick(None) => println!("{}", quick_menu()),
            Command::Quick(Some(i)) => {
                let (_, question) = QUICK_QUESTIONS[i];
                println!("You: {question}");
                let answer = tokio::select! {
                    biased;

                    _ = &mut shutdown => {
                        println!();
                        info!("interrupt received while answering; closing console");
                        break;
                    }

                    answer = session.ask(question) => answer,
                };
                println!("\n{answer}\n");
            }
            Command::History => print!("{}", render_transcript(session.messages())),
            Command::Status => println!("{}", status_line(session.status())),
            Command::Clear => {
                session.clear();
                println!("Conversation cleared.");
            }
            Command::Help => println!("{HELP}"),
            Command::Quit => break,
            Command::Unknown(cmd) => println!("Unknown command: {cmd}  (try /help)"),
        }
    }

    info!(session_id = %session.id(), "console closed");
    Ok(())
}
