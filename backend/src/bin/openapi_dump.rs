//! Print the OpenAPI document for client generators and review.

use clap::{Parser, ValueEnum};
use roasted::ApiDoc;
use utoipa::OpenApi;

#[derive(Clone, Copy, Debug, ValueEnum)]
enum Format {
    Json,
    Yaml,
}

#[derive(Debug, Parser)]
#[command(about = "Print the roasted.lol OpenAPI document")]
struct Args {
    #[arg(long, value_enum, default_value_t = Format::Json)]
    format: Format,
}

fn main() -> color_eyre::Result<()> {
    color_eyre::install()?;
    let args = Args::parse();
    let doc = ApiDoc::openapi();
    let rendered = match args.format {
        Format::Json => doc.to_pretty_json()?,
        Format::Yaml => doc.to_yaml()?,
    };
    println!("{rendered}");
    Ok(())
}
