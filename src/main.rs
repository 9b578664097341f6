use std::process::ExitCode;

use anyhow::{bail, Context};

use bestiarium::config::AppConfig;
use bestiarium::core::bestiary::{
    resolve_and_render, InMemoryBestiary, RenderOptions, RenderOutput,
};

#[tokio::main]
async fn main() -> ExitCode {
    bestiarium::core::logging::init();
    log::info!("{} v{} starting", bestiarium::NAME, bestiarium::VERSION);

    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

struct CliArgs {
    file: String,
    name: String,
    source: Option<String>,
    variant: Option<String>,
    proficiency_bonus: Option<String>,
    spell_level: Option<String>,
}

fn usage() -> String {
    format!(
        "Usage: {} <bestiary.json> <creature name> [--source S] [--variant V] [--pb N] [--spell-level N]",
        bestiarium::NAME
    )
}

fn parse_args(mut args: impl Iterator<Item = String>) -> anyhow::Result<CliArgs> {
    let file = args.next().with_context(usage)?;
    let name = args.next().with_context(usage)?;
    let mut parsed = CliArgs {
        file,
        name,
        source: None,
        variant: None,
        proficiency_bonus: None,
        spell_level: None,
    };
    while let Some(flag) = args.next() {
        let mut value = || args.next().with_context(|| format!("{flag} needs a value"));
        match flag.as_str() {
            "--source" => parsed.source = Some(value()?),
            "--variant" => parsed.variant = Some(value()?),
            "--pb" => parsed.proficiency_bonus = Some(value()?),
            "--spell-level" => parsed.spell_level = Some(value()?),
            other => bail!("unknown flag {other}\n{}", usage()),
        }
    }
    Ok(parsed)
}

async fn run() -> anyhow::Result<()> {
    let args = parse_args(std::env::args().skip(1))?;
    let config = AppConfig::load();

    let store = InMemoryBestiary::new();
    store
        .load_file(&args.file)
        .await
        .with_context(|| format!("loading {}", args.file))?;

    let source = args
        .source
        .or_else(|| config.data.default_source.clone());
    let record = store
        .get(&args.name, source.as_deref())
        .await
        .with_context(|| format!("no record named '{}' in {}", args.name, args.file))?;

    let mut options = RenderOptions::new();
    options.variant = args.variant;
    options.proficiency_bonus = args
        .proficiency_bonus
        .or_else(|| config.render.proficiency_bonus.map(|pb| pb.to_string()));
    options.spell_level = args.spell_level;

    match resolve_and_render(&record, &store, &store, &options).await? {
        RenderOutput::StatBlock(doc) => println!("{doc}"),
        RenderOutput::ForkSelection(doc) => println!("{doc}"),
    }
    Ok(())
}
