use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "doceval",
    version,
    about = "Evaluate document-analysis prompts across models, prompts and documents"
)]
pub struct Cli {
    /// Emit logs as JSON lines on stderr
    #[arg(long, global = true, env = "DOCEVAL_LOG_JSON")]
    pub log_json: bool,

    #[command(subcommand)]
    pub cmd: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Run the {model × prompt × document} evaluation
    Run(RunArgs),
    /// Inspect or clear the response cache
    Cache(CacheArgs),
    /// Inspect prompt and document corpora
    Corpus(CorpusArgs),
}

#[derive(Args, Clone, Debug)]
pub struct ConfigArg {
    #[arg(long, short, default_value = "eval.yaml", env = "DOCEVAL_CONFIG")]
    pub config: PathBuf,
}

#[derive(Args, Clone, Debug)]
pub struct RunArgs {
    #[command(flatten)]
    pub config: ConfigArg,

    /// Max in-flight requests per model (overrides settings.concurrency)
    #[arg(long, env = "DOCEVAL_CONCURRENCY")]
    pub concurrency: Option<usize>,

    /// Bypass the response cache for this run
    #[arg(long)]
    pub no_cache: bool,

    /// Output directory (overrides output_dir)
    #[arg(long)]
    pub output_dir: Option<PathBuf>,

    /// Only run active prompts whose base name contains this text
    #[arg(long)]
    pub prompt_filter: Option<String>,

    /// Only run documents whose id contains this text
    #[arg(long)]
    pub document_filter: Option<String>,

    /// Restrict the run to these models (repeatable)
    #[arg(long = "model")]
    pub models: Vec<String>,

    /// Exit 1 when any case failed
    #[arg(long)]
    pub strict: bool,
}

#[derive(Args, Clone, Debug)]
pub struct CacheArgs {
    #[command(subcommand)]
    pub cmd: CacheSub,
}

#[derive(Subcommand, Clone, Debug)]
pub enum CacheSub {
    /// Delete every cached response
    Clear(ConfigArg),
    /// Show entry count and size
    Stats(ConfigArg),
}

#[derive(Args, Clone, Debug)]
pub struct CorpusArgs {
    #[command(subcommand)]
    pub cmd: CorpusSub,
}

#[derive(Subcommand, Clone, Debug)]
pub enum CorpusSub {
    /// List prompts (with role and family) and documents
    List(ConfigArg),
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_is_well_formed() {
        Cli::command().debug_assert();
    }

    #[test]
    fn run_overrides_parse() {
        let cli = Cli::try_parse_from([
            "doceval",
            "run",
            "--config",
            "x.yaml",
            "--concurrency",
            "5",
            "--no-cache",
            "--model",
            "a",
            "--model",
            "b",
            "--strict",
        ])
        .unwrap();
        let Command::Run(args) = cli.cmd else {
            panic!("expected run");
        };
        assert_eq!(args.config.config, PathBuf::from("x.yaml"));
        assert_eq!(args.concurrency, Some(5));
        assert!(args.no_cache);
        assert_eq!(args.models, vec!["a", "b"]);
        assert!(args.strict);
    }

    #[test]
    fn cache_subcommands_parse() {
        let cli = Cli::try_parse_from(["doceval", "cache", "stats"]).unwrap();
        assert!(matches!(
            cli.cmd,
            Command::Cache(CacheArgs {
                cmd: CacheSub::Stats(_)
            })
        ));
    }
}
