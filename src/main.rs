use std::{path::Path, sync::Arc};

use anyhow::{bail, Context};
use clap::Parser;
use relgraph::{
    config,
    db_schema::{InMemorySchema, SchemaInspector},
    query_planner::{
        logical_plan::Operator,
        optimizer::{self, Specialization},
    },
    sql_generator,
    vendor::Vendor,
};

/// relgraph - compiles relational operator trees to vendor SQL
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// YAML configuration file (overrides RELGRAPH_* variables)
    #[arg(long)]
    config: Option<String>,

    /// Database product name, as a driver would report it
    #[arg(long)]
    vendor: Option<String>,

    /// YAML schema description
    #[arg(long)]
    schema: Option<String>,

    /// Operator tree to compile, as YAML or JSON
    #[arg(long)]
    plan: Option<String>,

    /// Row cap for every compiled statement
    #[arg(long)]
    limit: Option<u64>,

    /// Print one SELECT per schema table
    #[arg(long)]
    tables: bool,

    /// Compile table statements as SELECT DISTINCT
    #[arg(long)]
    distinct: bool,
}

impl From<&Cli> for config::CliConfig {
    fn from(cli: &Cli) -> Self {
        config::CliConfig {
            vendor: cli.vendor.clone(),
            schema_file: cli.schema.clone(),
            row_limit: cli.limit,
            use_distinct: cli.distinct,
        }
    }
}

fn load_config(cli: &Cli) -> anyhow::Result<config::CompilerConfig> {
    let mut config = config::CompilerConfig::from_env().context("reading RELGRAPH_* variables")?;
    if let Some(path) = &cli.config {
        config
            .merge_yaml_file(path)
            .with_context(|| format!("loading configuration {}", path))?;
    }
    config.apply_cli(cli.into());
    Ok(config)
}

fn load_plan(path: &str) -> anyhow::Result<Arc<Operator>> {
    let content =
        std::fs::read_to_string(path).with_context(|| format!("reading plan {}", path))?;
    let is_json = Path::new(path)
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));
    let plan: Operator = if is_json {
        serde_json::from_str(&content).with_context(|| format!("parsing JSON plan {}", path))?
    } else {
        serde_yaml::from_str(&content).with_context(|| format!("parsing YAML plan {}", path))?
    };
    Ok(Arc::new(plan))
}

fn compile(
    plan: Arc<Operator>,
    config: &config::CompilerConfig,
    distinct: bool,
    vendor: &dyn Vendor,
) -> anyhow::Result<String> {
    let plan = if distinct {
        Operator::distinct(plan)
    } else {
        plan
    };
    let specialization = Specialization {
        limit: config.row_limit,
        alias_prefix: config.alias_prefix.clone(),
        ..Default::default()
    };
    let (plan, _) = optimizer::specialize(plan, &specialization)?;
    Ok(sql_generator::compile(&plan, vendor)?)
}

fn run(cli: Cli) -> anyhow::Result<()> {
    let config = load_config(&cli)?;
    let vendor = config.vendor();
    log::info!("Using {} SQL dialect", vendor.kind());

    if cli.tables {
        let Some(schema_file) = &config.schema_file else {
            bail!("--tables needs a schema (--schema or RELGRAPH_SCHEMA_FILE)");
        };
        let schema = InMemorySchema::from_yaml_file(schema_file, vendor)
            .with_context(|| format!("loading schema {}", schema_file))?;
        for name in schema.table_names() {
            let schema_part = name.schema.as_ref().map(|s| s.name());
            if vendor.is_ignored_table(schema_part, name.table.name()) {
                log::debug!("Skipping system table {}", name);
                continue;
            }
            if let Some(def) = schema.table(&name) {
                let plan = Operator::table_from_def(def);
                println!("{};", compile(plan, &config, config.use_distinct, vendor)?);
            }
        }
    }

    if let Some(path) = &cli.plan {
        let plan = load_plan(path)?;
        println!("{};", compile(plan, &config, false, vendor)?);
    }

    if !cli.tables && cli.plan.is_none() {
        bail!("nothing to compile: pass --plan or --tables");
    }
    Ok(())
}

fn main() {
    dotenvy::dotenv().ok();
    // Defaults to INFO level, can be overridden with RUST_LOG
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    if let Err(e) = run(cli) {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}
