use std::io::{self, Write};

use clap::Parser;
use doclabel::{
    DocumentStore,
    Session,
    cli::{Cli, Command, SessionArgs, StatusArgs, ViewArgs},
    error,
    filter,
    mcp,
    render,
    repl,
};
use tracing_subscriber::EnvFilter;

fn init_tracing(verbose: u8, quiet: bool) {
    let filter = if let Ok(env) = std::env::var("DOCLABEL_LOG") {
        EnvFilter::new(env)
    } else if quiet {
        EnvFilter::new("warn")
    } else {
        match verbose {
            0 => EnvFilter::new("info"),
            1 => EnvFilter::new("debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .without_time()
        .init();
}

fn main() -> error::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose, cli.quiet);

    match cli.command {
        Command::Status(args) => cmd_status(&args)?,
        Command::View(args) => cmd_view(&args)?,
        Command::Session(args) => cmd_session(&args)?,
        Command::Mcp(args) => {
            let session = open_session(&args)?;
            mcp::run_mcp(session)?;
        }
        Command::Completions(args) => args.generate(),
    }

    Ok(())
}

fn open_session(args: &SessionArgs) -> error::Result<Session> {
    Session::open(
        &args.input.input,
        args.input.delimiter_byte()?,
        args.output_dir.as_deref(),
    )
}

fn cmd_status(args: &StatusArgs) -> error::Result<()> {
    let store =
        DocumentStore::load(&args.input.input, args.input.delimiter_byte()?)?;
    let status = render::StoreStatus::new(&store);

    let mut out = io::stdout().lock();
    if args.json {
        render::write_json(&mut out, &status)?;
    } else {
        render::write_status(&mut out, &status)?;
    }
    out.flush()?;
    Ok(())
}

fn cmd_view(args: &ViewArgs) -> error::Result<()> {
    let store =
        DocumentStore::load(&args.input.input, args.input.delimiter_byte()?)?;
    let view = filter::compute_view(&store, &args.labels, &args.keywords);

    let mut out = io::stdout().lock();
    if args.json {
        render::write_json(&mut out, &view)?;
    } else {
        render::write_view(&mut out, &view)?;
    }
    out.flush()?;
    Ok(())
}

fn cmd_session(args: &SessionArgs) -> error::Result<()> {
    let mut session = open_session(args)?;
    let stdin = io::stdin().lock();
    let mut out = io::stdout().lock();
    repl::run(&mut session, stdin, &mut out)
}
