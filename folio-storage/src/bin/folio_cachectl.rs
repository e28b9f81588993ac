/// folio-cachectl - inspect and flush derived values in an LMDB cache
///
/// Usage: folio-cachectl [--config <path>] <command>
///
/// Commands:
///   keys            list stored keys
///   inspect [key]   show an entry (defaults to the configured key)
///   flush [key]     delete an entry (defaults to the configured key)
///   clear           delete every entry
use std::process::ExitCode;

use folio_core::{BackendKind, FolioConfig};
use folio_storage::cache::{CacheBackend, CacheKey, LmdbCacheBackend, Lookup};
use folio_storage::telemetry::init_tracing;

enum Command {
    Keys,
    Inspect(Option<String>),
    Flush(Option<String>),
    Clear,
}

fn usage() {
    eprintln!("Usage: folio-cachectl [--config <path>] <keys | inspect [key] | flush [key] | clear>");
    eprintln!();
    eprintln!("The config path may also be given with FOLIO_CONFIG.");
}

/// Positional arguments with `--config <path>` removed.
fn positional_args() -> Vec<String> {
    let mut positional = Vec::new();
    let mut args = std::env::args().skip(1);
    while let Some(arg) = args.next() {
        if arg == "--config" {
            args.next();
        } else if !arg.starts_with("--config=") {
            positional.push(arg);
        }
    }
    positional
}

fn parse_command(args: &[String]) -> Option<Command> {
    let (name, rest) = args.split_first()?;
    let key = rest.first().cloned();
    match (name.as_str(), rest.len()) {
        ("keys", 0) => Some(Command::Keys),
        ("inspect", 0 | 1) => Some(Command::Inspect(key)),
        ("flush", 0 | 1) => Some(Command::Flush(key)),
        ("clear", 0) => Some(Command::Clear),
        _ => None,
    }
}

fn resolve_key(config: &FolioConfig, key: Option<String>) -> Result<CacheKey, String> {
    match key {
        Some(key) => CacheKey::new(key).map_err(|e| e.to_string()),
        None => CacheKey::from_settings(&config.cache).map_err(|e| e.to_string()),
    }
}

fn run(config: &FolioConfig, command: Command) -> Result<(), String> {
    if config.backend.kind != BackendKind::Lmdb {
        return Err("backend.kind is \"memory\"; there is no persistent cache to manage".to_string());
    }
    let path = config
        .backend
        .path
        .as_ref()
        .ok_or_else(|| "backend.path is required".to_string())?;
    let backend =
        LmdbCacheBackend::new(path, config.backend.max_size_mb).map_err(|e| e.to_string())?;

    match command {
        Command::Keys => {
            for key in backend.keys().map_err(|e| e.to_string())? {
                println!("{}", key);
            }
        }
        Command::Inspect(key) => {
            let key = resolve_key(config, key)?;
            match backend
                .get::<serde_json::Value>(&key)
                .map_err(|e| e.to_string())?
            {
                Lookup::Present(entry) => {
                    println!("key:         {}", key);
                    println!("value:       {}", entry.value);
                    println!("computed_at: {}", entry.computed_at.to_rfc3339());
                    match entry.valid_until {
                        Some(until) => println!("valid_until: {}", until.to_rfc3339()),
                        None => println!("valid_until: never"),
                    }
                }
                Lookup::Absent => println!("{}: absent", key),
            }
        }
        Command::Flush(key) => {
            let key = resolve_key(config, key)?;
            let existed = backend.delete(&key).map_err(|e| e.to_string())?;
            tracing::info!(key = %key, existed, "Flushed cache entry");
            println!("{}: {}", key, if existed { "deleted" } else { "absent" });
        }
        Command::Clear => {
            let removed = backend.clear().map_err(|e| e.to_string())?;
            tracing::info!(removed, path = %backend.path().display(), "Cleared cache");
            println!("removed {} entries", removed);
        }
    }
    Ok(())
}

fn main() -> ExitCode {
    let Some(command) = parse_command(&positional_args()) else {
        usage();
        return ExitCode::from(2);
    };

    let config = match FolioConfig::load() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("folio-cachectl: {}", e);
            return ExitCode::FAILURE;
        }
    };

    if let Err(e) = init_tracing(&config.logging) {
        eprintln!("folio-cachectl: {}", e);
        return ExitCode::FAILURE;
    }

    match run(&config, command) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %e, "Command failed");
            eprintln!("folio-cachectl: {}", e);
            ExitCode::FAILURE
        }
    }
}
