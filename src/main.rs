use anyhow::Result;
use clap::{Parser, ValueEnum};
use std::path::PathBuf;
use tracing::Level;

use customer_extract::{run, OutputFormat, PipelineConfig};

#[derive(Parser)]
#[command(name = "customer-extract")]
#[command(about = "Flatten customer orders into one sorted table", version)]
struct Cli {
    /// Customer records (JSON array)
    #[arg(short, long)]
    customers: PathBuf,

    /// VIP customer ids, one per line
    #[arg(long)]
    vip: PathBuf,

    /// Output file (defaults to cleaned_customer_orders.csv / .db)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "csv")]
    format: FormatArg,

    /// More log output (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

#[derive(Clone, Copy, ValueEnum)]
enum FormatArg {
    Csv,
    Sqlite,
}

impl From<FormatArg> for OutputFormat {
    fn from(arg: FormatArg) -> Self {
        match arg {
            FormatArg::Csv => OutputFormat::Csv,
            FormatArg::Sqlite => OutputFormat::Sqlite,
        }
    }
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => Level::WARN,
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    };

    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let format = OutputFormat::from(cli.format);
    let config = PipelineConfig {
        customers_path: cli.customers,
        vip_path: cli.vip,
        output_path: cli.output.unwrap_or_else(|| format.default_output()),
        format,
    };

    println!("📂 Loading {} + {}", config.customers_path.display(), config.vip_path.display());

    let report = run(&config)?;

    println!("✓ {}", report.summary());
    println!(
        "✅ {} table saved to {}",
        config.format.name(),
        config.output_path.display()
    );

    Ok(())
}
