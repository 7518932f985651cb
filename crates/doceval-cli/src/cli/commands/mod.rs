use super::args::*;

pub(crate) mod cache;
pub(crate) mod corpus;
pub(crate) mod run;
pub(crate) mod runner_builder;

pub async fn dispatch(cli: Cli) -> anyhow::Result<i32> {
    match cli.cmd {
        Command::Run(args) => run::run(args).await,
        Command::Cache(args) => match args.cmd {
            CacheSub::Clear(c) => cache::clear(&c).await,
            CacheSub::Stats(c) => cache::stats(&c).await,
        },
        Command::Corpus(args) => match args.cmd {
            CorpusSub::List(c) => corpus::list(&c),
        },
    }
}
