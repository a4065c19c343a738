use clap::Parser;
use genedit::{
    logger::{self, LogLevel, LoggerConfig},
    AdjustmentSet, ClientConfig, EditClient, EditSession, ImageSource, SubmitOutcome,
};
use std::path::PathBuf;
use std::process::ExitCode;

/// Edit an image with a natural-language instruction through the edit proxy.
#[derive(Parser, Debug)]
#[command(version, about)]
struct Args {
    /// PNG, JPEG or WEBP image to edit
    image: PathBuf,

    /// What to change
    #[arg(short, long)]
    prompt: String,

    #[arg(long, default_value_t = 0, allow_negative_numbers = true,
          value_parser = clap::value_parser!(i32).range(-50..=50))]
    brightness: i32,

    #[arg(long, default_value_t = 0, allow_negative_numbers = true,
          value_parser = clap::value_parser!(i32).range(-50..=50))]
    contrast: i32,

    #[arg(long, default_value_t = 0, allow_negative_numbers = true,
          value_parser = clap::value_parser!(i32).range(-50..=50))]
    saturation: i32,

    /// Proxy endpoint; defaults to EDIT_ENDPOINT or the local proxy
    #[arg(long)]
    endpoint: Option<String>,

    /// Where to save the result; defaults to edited-image.<ext>
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Print the composed instruction and exit
    #[arg(long)]
    print_prompt: bool,

    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> ExitCode {
    let _ = dotenv::dotenv();
    let args = Args::parse();

    let level = if args.verbose { LogLevel::Debug } else { LogLevel::Warn };
    let log_config = LoggerConfig::new().with_level(level).with_prefix("cli");
    if let Err(e) = logger::init_with_config(log_config) {
        eprintln!("{}", e);
    }

    let mut config = ClientConfig::from_env();
    if let Some(endpoint) = args.endpoint.clone() {
        config = config.with_endpoint(endpoint);
    }

    let client = match EditClient::new(&config) {
        Ok(client) => client,
        Err(e) => {
            eprintln!("{}", e.user_message());
            return ExitCode::FAILURE;
        }
    };

    let session = EditSession::with_config(client, &config);
    session.set_image(ImageSource::from_path(&args.image));
    session.set_instruction(args.prompt.clone());
    match AdjustmentSet::new(args.brightness, args.contrast, args.saturation) {
        Ok(adjustments) => session.set_adjustments(adjustments),
        Err(e) => {
            eprintln!("{}", e.user_message());
            return ExitCode::FAILURE;
        }
    }

    if args.print_prompt {
        println!("{}", session.composed_instruction());
        return ExitCode::SUCCESS;
    }

    let image = match session.submit().await {
        Ok(SubmitOutcome::Succeeded(image)) => image,
        Ok(SubmitOutcome::Ignored) => return ExitCode::FAILURE,
        Err(e) => {
            eprintln!("{}", e.user_message());
            return ExitCode::FAILURE;
        }
    };

    let output = args
        .output
        .unwrap_or_else(|| PathBuf::from(image.default_file_name()));
    match image.save(&output).await {
        Ok(()) => {
            println!("{}", output.display());
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("{}", e.user_message());
            ExitCode::FAILURE
        }
    }
}
