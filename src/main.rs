//! Forgechat - terminal client for multi-provider chat backends.

mod client;
mod config;
mod display;
mod render;
mod session;
mod transcript;

use std::time::Instant;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use client::{ChatApi, ChatMode, ChatTarget};
use config::{ContextStore, ModelConfig, Provider};
use display::TranscriptDisplay;
use session::SessionEntry;
use transcript::{MessageClass, Transcript};

/// Forgechat - chat with your backend from the terminal
#[derive(Parser, Debug)]
#[command(name = "forgechat")]
#[command(version, about, long_about = None)]
#[command(propagate_version = true)]
struct Args {
    /// Backend base URL
    #[arg(long, env = "FORGECHAT_URL", default_value = "http://127.0.0.1:5000")]
    url: String,

    /// Enable debug logging (equivalent to RUST_LOG=debug)
    #[arg(short = 'd', long)]
    debug: bool,

    /// Enable verbose logging (equivalent to RUST_LOG=trace)
    #[arg(short = 'v', long)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Submit one message and print the rendered reply
    Send {
        /// The message to send
        message: String,

        /// Chat surface: regular, developer, or rag
        #[arg(short, long, default_value = "regular")]
        mode: ChatMode,

        /// Chat session id (defaults to the remembered one)
        #[arg(long)]
        chat: Option<i64>,

        /// RAG corpus id (RAG-backed modes)
        #[arg(long)]
        rag: Option<i64>,

        /// RAG chat session id
        #[arg(long)]
        session: Option<i64>,
    },

    /// Fetch a session's history and render it
    History {
        #[arg(short, long, default_value = "regular")]
        mode: ChatMode,

        #[arg(long)]
        chat: Option<i64>,

        #[arg(long)]
        rag: Option<i64>,
    },

    /// Create a new chat session
    NewSession {
        #[arg(short, long, default_value = "regular")]
        mode: ChatMode,

        #[arg(long)]
        rag: Option<i64>,
    },

    /// List locally served models
    Models,

    /// Attach a model configuration to a chat session
    Configure {
        /// Provider: groq, ollama, or gpt
        provider: Provider,

        /// Model name
        model: String,

        #[arg(long)]
        api_key: Option<String>,

        #[arg(long, default_value_t = config::DEFAULT_TEMPERATURE)]
        temperature: f64,

        #[arg(long)]
        chat: Option<i64>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    init_tracing(args.debug, args.verbose);

    let api = ChatApi::new(&args.url);
    let store = ContextStore::new();
    let mut context = store.load();
    let display = TranscriptDisplay::new();

    match args.command {
        Command::Send {
            message,
            mode,
            chat,
            rag,
            session,
        } => {
            let target = resolve_target(mode, chat, rag, session, &context)?;
            let renderer = mode.renderer();
            let mut transcript = Transcript::new();

            // The regular surface refuses submissions until the chat
            // has a model configuration attached.
            if mode == ChatMode::Regular {
                let chat_id = target.chat.context("no chat session selected")?;
                let configured = api
                    .model_config(chat_id)
                    .await?
                    .is_some_and(|c| c.is_configured());
                if !configured {
                    transcript.push_reply(
                        &renderer,
                        MessageClass::Error,
                        "Please configure the chat model before sending messages. \
                         Run `forgechat configure` first.",
                    );
                    display.render_transcript(&transcript, Instant::now())?;
                    return Ok(());
                }
            }

            transcript.push_reply(&renderer, MessageClass::Outgoing, &message);
            transcript.begin_pending(&renderer);

            match api.send_message(mode, &target, &message).await {
                Ok(reply) => {
                    transcript.resolve_pending(&renderer, reply.class(), &reply.text);
                    remember_target(&mut context, mode, &target, reply.session_id);
                }
                Err(err) => {
                    tracing::debug!("submission failed: {err}");
                    transcript.remove_pending();
                    transcript.push_reply(
                        &renderer,
                        MessageClass::Error,
                        "Server error sending message",
                    );
                }
            }

            display.render_transcript(&transcript, Instant::now())?;
            store.save(&context)?;
        }

        Command::History { mode, chat, rag } => {
            let target = resolve_target(mode, chat, rag, None, &context)?;
            let renderer = mode.renderer();
            let mut transcript = Transcript::new();

            match api.history(mode, &target).await {
                Ok(turns) => {
                    for turn in turns {
                        transcript.push_reply(&renderer, MessageClass::Outgoing, &turn.prompt);
                        transcript.push_reply(&renderer, MessageClass::Incoming, &turn.reply);
                    }
                }
                Err(err) => {
                    tracing::debug!("history fetch failed: {err}");
                    transcript.push_reply(
                        &renderer,
                        MessageClass::Error,
                        "Failed to fetch chat history.",
                    );
                }
            }

            display.render_transcript(&transcript, Instant::now())?;
        }

        Command::NewSession { mode, rag } => {
            let rag = rag.or(context.active_rag);
            let entry: SessionEntry = api.new_session(mode, rag).await?;
            println!("Created session {} ({})", entry.id, entry.name);
            remember_target(
                &mut context,
                mode,
                &ChatTarget {
                    chat: Some(entry.id),
                    rag,
                    session: Some(entry.id),
                },
                None,
            );
            store.save(&context)?;
        }

        Command::Models => {
            for model in api.local_models().await? {
                println!("{}", model);
            }
        }

        Command::Configure {
            provider,
            model,
            api_key,
            temperature,
            chat,
        } => {
            let chat_id = chat
                .or(context.active_chat)
                .context("no chat session selected; pass --chat or create one")?;
            let mut config = ModelConfig::new(provider, model).with_temperature(temperature);
            if let Some(key) = api_key {
                config = config.with_api_key(key);
            }
            api.update_model_config(chat_id, &config).await?;
            context.config_draft = Some(config);
            store.save(&context)?;
            println!("Chat configured successfully! You can now send messages.");
        }
    }

    Ok(())
}

/// Pick explicit ids over remembered ones from the session context.
fn resolve_target(
    mode: ChatMode,
    chat: Option<i64>,
    rag: Option<i64>,
    session: Option<i64>,
    context: &config::SessionContext,
) -> anyhow::Result<ChatTarget> {
    match mode {
        ChatMode::Regular => {
            let chat = chat
                .or(context.active_chat)
                .context("no chat session selected; pass --chat or run new-session")?;
            Ok(ChatTarget::chat_session(chat))
        }
        ChatMode::DeveloperAssistant | ChatMode::Rag => {
            let rag = rag
                .or(context.active_rag)
                .context("no RAG corpus selected; pass --rag")?;
            let session = session.or(chat).or(context.active_rag_session);
            Ok(ChatTarget::rag_session(rag, session))
        }
    }
}

/// Save-on-change touch point for the remembered ids.
fn remember_target(
    context: &mut config::SessionContext,
    mode: ChatMode,
    target: &ChatTarget,
    reply_session: Option<i64>,
) {
    match mode {
        ChatMode::Regular => context.active_chat = target.chat,
        ChatMode::DeveloperAssistant | ChatMode::Rag => {
            context.active_rag = target.rag;
            context.active_rag_session = reply_session.or(target.session);
        }
    }
}

fn init_tracing(debug: bool, verbose: bool) {
    let default = if verbose {
        "forgechat=trace"
    } else if debug {
        "forgechat=debug"
    } else {
        "forgechat=warn"
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}
