use pretend_app::cli;
use pretend_app::config_loader;
use pretend_app::lookup;
use pretend_app::tracing_setup;
use tracing::error;
use tracing::info;
use tracing::warn;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    let args = cli::parse_args(std::env::args().skip(1))?;

    let resolved = config_loader::resolve_config(args.config_path.as_deref())?;
    let config = resolved.config;

    let level = tracing_setup::parse_level(&config.log.level);
    let _guard = match config.log.dir.as_deref() {
        Some(dir) => Some(tracing_setup::init_with_file("pretend_lookup", dir, level)),
        None => {
            tracing_setup::init(level);
            None
        }
    };

    if let Some(err) = &resolved.skipped_file {
        warn!("Skipping default config file: {err}. Using defaults and environment.");
    }

    let client = config_loader::build_client(&config)?;
    info!(capacity = client.gate().capacity(), window = ?client.gate().window(), "Client ready");

    let results = lookup::run_lookups(&client, args.target, &args.identifiers).await;

    let mut failures = 0;
    for (identifier, result) in results {
        match result {
            Ok(object) => println!("{}", serde_json::to_string_pretty(&object)?),
            Err(err) => {
                error!(identifier = %identifier, "Lookup failed: {err}");
                failures += 1;
            }
        }
    }

    if failures > 0 {
        anyhow::bail!("{failures} of {} lookups failed", args.identifiers.len());
    }

    Ok(())
}
