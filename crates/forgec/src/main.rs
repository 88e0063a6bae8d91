mod cli;
mod run;

use anyhow::Result;
use cli::{CacheAction, Command};

fn main() -> Result<()> {
    let cli = cli::parse();
    run::initialise_tracing();

    let config = run::load_config(cli.config.as_deref())?;
    match cli.command {
        Command::Split { file } => run::split(&file),
        Command::Compile { files, pipeline } => run::compile(&files, &pipeline.apply(&config)),
        Command::Reflect {
            file,
            json,
            pipeline,
        } => run::reflect(&file, &pipeline.apply(&config), json),
        Command::Cache(cache) => {
            let root = cache.cache_dir.unwrap_or(config.cache_dir);
            match cache.action {
                CacheAction::List => run::cache_list(&root),
                CacheAction::Clear => run::cache_clear(&root),
            }
        }
    }
}
