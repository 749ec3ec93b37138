use clap::Parser;
use ollama_chat::cli::Cli;
use ollama_chat::config::log_filter;
use ollama_chat::create::create_model;
use ollama_chat::error::ReportStream;
use ollama_chat::{ClientConfig, ClientError, Repl, Transport};
use std::process::ExitCode;
use tokio::io::BufReader;

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    dotenvy::dotenv().ok();

    // Logs go to stderr so they never interleave with a streamed answer.
    tracing_subscriber::fmt()
        .with_env_filter(log_filter())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            report(&err);
            ExitCode::from(err.exit_code())
        }
    }
}

async fn run(cli: Cli) -> Result<(), ClientError> {
    if let Some((name, modelfile)) = cli.creation_request() {
        create_model(&cli.ollama_bin, name, modelfile).await?;
        println!("\nModel created successfully: {}", name);
    }

    let transport = Transport::new(ClientConfig::new(&cli.host));
    let input = BufReader::new(tokio::io::stdin());
    let mut stdout = std::io::stdout();

    Repl::new(&transport, input, &mut stdout).run().await
}

fn report(err: &ClientError) {
    match err.report_stream() {
        ReportStream::Stdout => println!("\n{}", err),
        ReportStream::Stderr => eprintln!("\n{}", err),
    }
}
