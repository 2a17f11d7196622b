//! bundle-plan CLI
//!
//! Entry point for the `bundle-plan` command-line tool.

use bundle_plan::config::{builtin_descriptor, parse_assignment};
use bundle_plan::{build_plan, logging, LoadOptions, Mode, PlanOutcome, PlanRequest};
use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use std::process;

#[derive(Parser)]
#[command(name = "bundle-plan")]
#[command(about = "Resolve bundler descriptors into validated build plans", version)]
struct Cli {
    /// Enable verbose logging (sets log level to DEBUG)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Resolve the descriptor and print the build plan
    Resolve {
        #[command(flatten)]
        plan: PlanArgs,

        /// Emit RFC 8785 canonical JSON instead of pretty JSON
        #[arg(long)]
        canonical: bool,

        /// Write the plan to a file instead of stdout
        #[arg(long, short = 'o')]
        output: Option<PathBuf>,
    },

    /// Resolve and validate only; prints the plan digest
    Check {
        #[command(flatten)]
        plan: PlanArgs,
    },

    /// Explain layers, environment references and mode branches
    Explain {
        #[command(flatten)]
        plan: PlanArgs,
    },

    /// Print the built-in descriptor
    Defaults {
        #[arg(long, value_enum, default_value = "toml")]
        format: DefaultsFormat,
    },
}

#[derive(Args)]
struct PlanArgs {
    /// Project root
    #[arg(long, short = 'r', default_value = ".")]
    root: PathBuf,

    /// Descriptor file (default: discovered in the project root)
    #[arg(long, short = 'c')]
    config: Option<PathBuf>,

    /// Build mode (development|production); defaults from NODE_ENV
    #[arg(long, short = 'm')]
    mode: Option<String>,

    /// Override a descriptor field, e.g. --set dev_server.port=3000
    #[arg(long = "set", value_name = "PATH=VALUE")]
    set: Vec<String>,

    /// Do not read .env files
    #[arg(long)]
    no_dotenv: bool,

    /// Do not require alias directories to exist
    #[arg(long)]
    no_path_check: bool,

    /// Do not start from the built-in descriptor
    #[arg(long)]
    no_builtin: bool,
}

#[derive(Clone, Copy, ValueEnum)]
enum DefaultsFormat {
    Toml,
    Json,
}

fn main() {
    let cli = Cli::parse();
    logging::init(cli.verbose);

    match cli.command {
        Commands::Resolve {
            plan,
            canonical,
            output,
        } => run_resolve(plan, canonical, output),
        Commands::Check { plan } => run_check(plan),
        Commands::Explain { plan } => run_explain(plan),
        Commands::Defaults { format } => run_defaults(format),
    }
}

fn plan_request(args: PlanArgs) -> Result<PlanRequest, String> {
    let mode = match args.mode {
        Some(raw) => raw.parse::<Mode>().map_err(|e| e.to_string())?,
        None => Mode::from_node_env(std::env::var("NODE_ENV").ok().as_deref()),
    };

    let overrides = args
        .set
        .iter()
        .map(|s| parse_assignment(s))
        .collect::<Result<Vec<_>, _>>()?;

    let mut request = PlanRequest::new(args.root, mode);
    request.load = LoadOptions {
        config_path: args.config,
        use_builtin: !args.no_builtin,
        overrides,
    };
    request.use_dotenv = !args.no_dotenv;
    request.check_paths = !args.no_path_check;
    Ok(request)
}

fn resolve_or_exit(args: PlanArgs) -> PlanOutcome {
    let request = match plan_request(args) {
        Ok(r) => r,
        Err(e) => {
            eprintln!("Error: {}", e);
            process::exit(1);
        }
    };

    match build_plan(&request) {
        Ok(outcome) => outcome,
        Err(e) => {
            eprintln!("Error: {}", e);
            process::exit(1);
        }
    }
}

fn run_resolve(args: PlanArgs, canonical: bool, output: Option<PathBuf>) {
    let outcome = resolve_or_exit(args);
    let plan = &outcome.plan;

    if let Some(path) = output {
        if let Err(e) = plan.write_to_file(&path, canonical) {
            eprintln!("Error writing {}: {}", path.display(), e);
            process::exit(1);
        }
        eprintln!("Wrote: {}", path.display());
        return;
    }

    let rendered = if canonical {
        plan.to_canonical_vec()
            .map(|bytes| String::from_utf8_lossy(&bytes).into_owned())
    } else {
        plan.to_json_pretty()
    };

    match rendered {
        Ok(text) => println!("{}", text),
        Err(e) => {
            eprintln!("Error serializing plan: {}", e);
            process::exit(1);
        }
    }
}

fn run_check(args: PlanArgs) {
    let outcome = resolve_or_exit(args);
    match outcome.plan.digest() {
        Ok(digest) => println!("ok {}", digest),
        Err(e) => {
            eprintln!("Error: {}", e);
            process::exit(1);
        }
    }
}

fn run_explain(args: PlanArgs) {
    let outcome = resolve_or_exit(args);
    println!("{}", outcome.to_human());
}

fn run_defaults(format: DefaultsFormat) {
    let value = builtin_descriptor();
    let rendered = match format {
        DefaultsFormat::Toml => toml::to_string_pretty(&value).map_err(|e| e.to_string()),
        DefaultsFormat::Json => serde_json::to_string_pretty(&value).map_err(|e| e.to_string()),
    };

    match rendered {
        Ok(text) => println!("{}", text),
        Err(e) => {
            eprintln!("Error rendering defaults: {}", e);
            process::exit(1);
        }
    }
}
