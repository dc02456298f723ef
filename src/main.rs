use anyhow::Result;
use clap::Parser;
use convo::chat::EchoTransport;
use convo::cli::{Cli, default_config_path};
use convo::config::Config;
use convo::notice::NoticeSender;
use convo::speech::{ConsoleAvatar, SpeechBridge};
use convo::{Orchestrator, SendOptions, UserContent};
use std::io::{BufRead, Write};
use std::sync::Arc;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = load_config(&cli)?;
    if let Some(model) = cli.model {
        config.chat.model = model;
    }
    if cli.incremental {
        config.chat.incremental = true;
    }

    let (notice_tx, notice_rx) = crossbeam_channel::unbounded();
    let notices = if cli.quiet {
        NoticeSender::disabled()
    } else {
        NoticeSender::new(notice_tx)
    };
    let verbose = cli.verbose;
    std::thread::spawn(move || {
        for notice in notice_rx {
            if verbose > 0 {
                eprintln!("[notice] {notice:?}");
            }
        }
    });

    let bridge = SpeechBridge::new(Arc::new(ConsoleAvatar), config.speech.clone());
    let orchestrator = Orchestrator::new(
        Arc::new(EchoTransport),
        bridge,
        config,
        "local",
    )
    .with_notice_sender(notices);

    if !cli.quiet {
        eprintln!("convo: type a message, :reset to clear, :quit to exit");
    }

    let stdin = std::io::stdin();
    loop {
        print!("> ");
        std::io::stdout().flush()?;

        let mut line = String::new();
        if stdin.lock().read_line(&mut line)? == 0 {
            break;
        }
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        match line {
            ":quit" | ":q" => break,
            ":reset" => {
                orchestrator.reset()?;
                continue;
            }
            _ => {}
        }

        let outcome = orchestrator
            .submit(UserContent::text(line), SendOptions::default())
            .await?;
        match outcome.final_text {
            Some(text) => println!("{text}"),
            None => eprintln!("(exchange ended: {:?})", outcome.terminal),
        }
    }

    if verbose > 1 {
        for turn in orchestrator.turns() {
            eprintln!("{:?} #{}: {}", turn.role, turn.order, turn.text);
        }
    }
    Ok(())
}

fn load_config(cli: &Cli) -> Result<Config> {
    let config = match &cli.config {
        Some(path) => Config::load(path)?,
        None => match default_config_path() {
            Some(path) => Config::load_or_default(&path)?,
            None => Config::default(),
        },
    };
    Ok(config.with_env_overrides())
}
