use std::path::{Path, PathBuf};

use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use hl7tools::config::Config;
use hl7tools::extract::{add_segment_linebreaks, extract_field_values, extract_segments};
use hl7tools::message::{lines, looks_like_hl7, LineTerminator};
use hl7tools::{describe, DelimiterSet, FieldLocation, FindStep, SchemaSettings, Session};
use mllp::{CharacterEncoding, ListenerEvent, MllpListener, MllpSender, SenderConfig};
use tracing::{info, warn};

#[derive(Parser, Debug)]
#[command(name = "hl7tools", about = "Inspect, search, validate and transmit HL7 v2 messages")]
struct Cli {
    /// Path to a TOML configuration file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    cmd: Cmd,
}

#[derive(Subcommand, Debug)]
enum Cmd {
    /// Find a field (`PID-5`, `OBX-5.1`) or search field descriptions
    Find {
        input: PathBuf,
        query: String,
        /// Step through this many further matches
        #[arg(long, default_value_t = 0)]
        next: usize,
    },
    /// List every range a query resolves to
    Highlight {
        input: PathBuf,
        query: String,
        #[arg(long)]
        json: bool,
    },
    /// Report required fields that are missing or empty
    Check { input: PathBuf },
    /// Print every segment of the same type as the given line
    ExtractSegments {
        input: PathBuf,
        /// 1-based line number of the reference segment
        #[arg(short, long)]
        line: usize,
    },
    /// Print the value of a field from every matching segment
    ExtractField { input: PathBuf, location: String },
    /// Split a batch file into one file per message
    Split {
        input: PathBuf,
        #[arg(short, long)]
        output_dir: PathBuf,
        /// Proceed even when the batch exceeds the split threshold
        #[arg(long)]
        yes: bool,
    },
    /// Show the fields of one segment with their descriptions
    Describe {
        input: PathBuf,
        /// 1-based line number of the segment
        #[arg(short, long)]
        line: usize,
    },
    /// List every field with its schema description
    Fields {
        input: PathBuf,
        /// Only describe this many lines; defaults to `max_lines_for_descriptions`
        #[arg(long)]
        max_lines: Option<usize>,
    },
    /// Put segments that were run together onto separate lines
    AddLinebreaks {
        input: PathBuf,
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Send a message to a remote MLLP listener
    Send {
        input: PathBuf,
        #[arg(long)]
        host: Option<String>,
        #[arg(long)]
        port: Option<u16>,
        #[arg(long)]
        tls: bool,
        #[arg(long)]
        ignore_cert_error: bool,
        #[arg(long)]
        timeout_ms: Option<u64>,
        #[arg(long)]
        encoding: Option<CharacterEncoding>,
    },
    /// Receive messages over MLLP until interrupted
    Listen {
        #[arg(long)]
        port: Option<u16>,
        /// Write each received message here instead of printing it
        #[arg(short, long)]
        output_dir: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => Config::from_file(path)?,
        None => Config::default(),
    };
    hl7tools::init_logging(&config.logging)?;

    match cli.cmd {
        Cmd::Find { input, query, next } => {
            let mut session = open_session(&input, &config)?;
            let first = session.find(&query)?;
            println!("{}", format_match(&session, &first));
            for _ in 0..next {
                let (m, step) = session.find_next()?;
                if step == FindStep::WrappedToStart {
                    println!("(wrapped to first match)");
                }
                println!("{}", format_match(&session, &m));
            }
        }
        Cmd::Highlight { input, query, json } => {
            let session = open_session(&input, &config)?;
            let matches = session.locate_all(&query);
            if json {
                println!("{}", serde_json::to_string_pretty(&matches)?);
            } else {
                for m in &matches {
                    println!("{}", format_match(&session, m));
                }
                eprintln!("{} match(es)", matches.len());
            }
        }
        Cmd::Check { input } => {
            let session = open_session(&input, &config)?;
            let violations = session.missing_required_fields();
            for v in &violations {
                println!("line {}: {} {} is required", v.line_number, v.location, v.description);
            }
            if !violations.is_empty() {
                bail!("{} required field(s) missing", violations.len());
            }
            println!("All required fields present (HL7 v{})", session.schema().version);
        }
        Cmd::ExtractSegments { input, line } => {
            let text = read_message(&input)?;
            let extracted = extract_segments(&text, line.saturating_sub(1))?;
            print!("{}", extracted.replace('\r', "\n").replace("\n\n", "\n"));
        }
        Cmd::ExtractField { input, location } => {
            let text = read_message(&input)?;
            let Some(path) = FieldLocation::parse(&location).as_path().cloned() else {
                bail!("'{}' is not a field location such as PID-3 or PID-5.1", location);
            };
            for value in extract_field_values(&text, &path) {
                println!("{}", value);
            }
        }
        Cmd::Split { input, output_dir, yes } => {
            let text = read_message(&input)?;
            let split = config.batch.split(&text, &DelimiterSet::from_text(&text));
            if split.requires_confirmation && !yes {
                bail!(
                    "batch contains {} messages (threshold {}); rerun with --yes to continue",
                    split.count(),
                    config.batch.threshold
                );
            }

            std::fs::create_dir_all(&output_dir)
                .with_context(|| format!("creating {}", output_dir.display()))?;
            for (i, message) in split.messages.iter().enumerate() {
                let path = output_dir.join(format!("message_{:04}.hl7", i + 1));
                std::fs::write(&path, message).with_context(|| format!("writing {}", path.display()))?;
            }
            println!("Wrote {} message(s) to {}", split.count(), output_dir.display());
        }
        Cmd::Describe { input, line } => {
            let session = open_session(&input, &config)?;
            let Some(segment_line) = lines(session.text()).nth(line.saturating_sub(1)) else {
                bail!("line {} is past the end of the message", line);
            };
            let schema = session.schema();
            let tree = describe::describe_segment(
                segment_line.text,
                session.delimiters(),
                &schema.segments,
                &schema.datatypes,
            )?;
            print!("{}", tree);
        }
        Cmd::Fields { input, max_lines } => {
            let session = open_session(&input, &config)?;
            let max_lines = max_lines.unwrap_or(config.schema.max_lines_for_descriptions);
            for field in session.field_descriptions(max_lines) {
                println!(
                    "line {} {} {}: {}",
                    field.line + 1,
                    field.location,
                    field.description,
                    field.span.text(session.text())
                );
            }
        }
        Cmd::AddLinebreaks { input, output } => {
            let session = open_session(&input, &config)?;
            let eol = LineTerminator::detect(session.text());
            let fixed = add_segment_linebreaks(
                session.text(),
                session.delimiters(),
                &session.schema().segments,
                eol,
            );
            match output {
                Some(path) => {
                    std::fs::write(&path, fixed).with_context(|| format!("writing {}", path.display()))?
                }
                None => print!("{}", fixed),
            }
        }
        Cmd::Send {
            input,
            host,
            port,
            tls,
            ignore_cert_error,
            timeout_ms,
            encoding,
        } => {
            let text = read_message(&input)?;
            let mut sender_config = match (config.sender.clone(), host, port) {
                (Some(configured), host, port) => configured.with_address(host, port),
                (None, Some(host), Some(port)) => SenderConfig::new(host, port),
                (None, _, _) => bail!("no remote host: pass --host and --port or add a [sender] section"),
            };
            if tls {
                sender_config = sender_config.with_tls(ignore_cert_error);
            }
            if let Some(timeout_ms) = timeout_ms {
                sender_config = sender_config.with_timeout(timeout_ms);
            }
            if let Some(encoding) = encoding {
                sender_config = sender_config.with_encoding(encoding);
            }
            sender_config.validate()?;

            let sender = MllpSender::new(sender_config);
            let report = sender.send(&text).await?;
            println!(
                "Sent {} bytes to {}",
                report.bytes_written,
                sender.config().address()
            );
            match report.ack {
                Some(ack) => println!("{}", ack.replace('\r', "\n")),
                None => println!("No acknowledgement received"),
            }
        }
        Cmd::Listen { port, output_dir } => {
            let mut listener_config = config.listener.clone();
            if let Some(port) = port {
                listener_config.port = port;
            }
            if let Some(dir) = &output_dir {
                std::fs::create_dir_all(dir).with_context(|| format!("creating {}", dir.display()))?;
            }

            let listener = MllpListener::bind(listener_config).await?;
            let (handle, mut events) = listener.start()?;
            info!("Listening for MLLP connections on {}", handle.local_addr());

            let mut received = 0usize;
            loop {
                tokio::select! {
                    _ = tokio::signal::ctrl_c() => break,
                    event = events.recv() => match event {
                        Some(ListenerEvent::Received { peer, message }) => {
                            received += 1;
                            let text = String::from_utf8_lossy(&message).replace('\r', "\n");
                            match &output_dir {
                                Some(dir) => {
                                    let path = dir.join(format!("received_{:04}.hl7", received));
                                    std::fs::write(&path, &message)
                                        .with_context(|| format!("writing {}", path.display()))?;
                                    info!("Message from {} saved to {}", peer, path.display());
                                }
                                None => println!("--- message {} from {} ---\n{}", received, peer, text),
                            }
                        }
                        Some(ListenerEvent::ConnectionError { peer, error }) => {
                            warn!("Connection from {} dropped: {}", peer, error);
                        }
                        None => break,
                    }
                }
            }

            handle.stop().await;
            info!("Listener stopped after {} message(s)", received);
        }
    }

    Ok(())
}

fn read_message(path: &Path) -> anyhow::Result<String> {
    let text = std::fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    if !looks_like_hl7(&text) {
        bail!("{} does not look like an HL7 v2 message", path.display());
    }
    Ok(text)
}

fn open_session(path: &Path, config: &Config) -> anyhow::Result<Session> {
    let text = read_message(path)?;
    let settings = SchemaSettings::from_config(&config.schema)?;
    Ok(Session::with_settings(text, settings))
}

fn format_match(session: &Session, m: &hl7tools::FieldMatch) -> String {
    format!(
        "line {} {} [{}..{}]: {}",
        m.line + 1,
        m.location,
        m.span.start,
        m.span.end,
        m.span.text(session.text())
    )
}
