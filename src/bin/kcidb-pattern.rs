// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use std::io::Write;

use anyhow::{Context, Result};
use clap::Parser;
use kcidb_orm::{Pattern, Schema};

fn pattern_help(out: &mut impl Write) -> Result<()> {
    writeln!(
        out,
        "{}\nNOTE: Specifying object ID lists separately is not supported using\n      \
         command-line tools. Only inline ID lists are supported.",
        Pattern::STRING_DOC
    )?;
    Ok(())
}

fn load_schema(file: &str) -> Result<Schema> {
    Schema::from_file(file).with_context(|| format!("Failed to load schema from {file}"))
}

fn parse_patterns(
    out: &mut impl Write,
    schema: &Schema,
    patterns: &[String],
    json: bool,
) -> Result<()> {
    for string in patterns {
        let pattern_list = Pattern::parse(string, None, schema)
            .with_context(|| format!("Failed to parse pattern '{string}'"))?;
        if json {
            writeln!(out, "{}", serde_json::to_string_pretty(&pattern_list)?)?;
        } else {
            for pattern in &pattern_list {
                writeln!(out, "{}", pattern.format()?)?;
            }
        }
    }
    Ok(())
}

/// Parse object pattern strings into pattern chains over the CI report schema.
#[derive(clap::Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Object pattern strings. See --pattern-help for syntax.
    #[arg(value_name = "PATTERN")]
    patterns: Vec<String>,

    /// Print pattern string syntax documentation and exit.
    #[arg(long)]
    pattern_help: bool,

    /// Schema description file. json or yaml.
    #[arg(long, short, value_name = "schema.json|schema.yaml")]
    schema: Option<String>,

    /// Print the schema's type relations in DOT format.
    #[arg(long)]
    dot: bool,

    /// Print parsed pattern chains as JSON.
    #[arg(long, short)]
    json: bool,
}

fn run(cli: &Cli, out: &mut impl Write) -> Result<()> {
    if cli.pattern_help {
        return pattern_help(out);
    }

    let loaded;
    let schema: &Schema = match &cli.schema {
        Some(file) => {
            loaded = load_schema(file)?;
            &loaded
        }
        None => &*kcidb_orm::SCHEMA,
    };

    if cli.dot {
        write!(out, "{}", schema.format_dot())?;
    }
    parse_patterns(out, schema, &cli.patterns, cli.json)
}

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();
    run(&cli, &mut std::io::stdout().lock())
}
