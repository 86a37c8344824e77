use std::path::PathBuf;

use anyhow::{Result, anyhow};

pub const DATA_PATH_ENV: &str = "STATS_DATA_PATH";

/// Best-effort .env preload; absent files are fine.
pub fn load_dotenv() {
    let _ = dotenvy::from_filename(".env.local");
    let _ = dotenvy::from_filename(".env");
}

/// Resolve the CSV folder: `--data <dir>` / `--data=<dir>` wins, then the
/// environment variable.
pub fn resolve_data_dir(args: &[String]) -> Result<PathBuf> {
    let path = parse_data_arg(args).or_else(data_dir_from_env).ok_or_else(|| {
        anyhow!("no data folder configured: pass --data <dir> or set {DATA_PATH_ENV}")
    })?;
    if !path.is_dir() {
        return Err(anyhow!("data folder does not exist: {}", path.display()));
    }
    Ok(path)
}

pub fn parse_data_arg(args: &[String]) -> Option<PathBuf> {
    for (idx, arg) in args.iter().enumerate() {
        if let Some(path) = arg.strip_prefix("--data=") {
            let trimmed = path.trim();
            if !trimmed.is_empty() {
                return Some(PathBuf::from(trimmed));
            }
        }
        if arg == "--data" {
            let Some(next) = args.get(idx + 1) else {
                continue;
            };
            if !next.trim().is_empty() {
                return Some(PathBuf::from(next.trim()));
            }
        }
    }
    None
}

fn data_dir_from_env() -> Option<PathBuf> {
    let raw = std::env::var(DATA_PATH_ENV).ok()?;
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    Some(PathBuf::from(trimmed))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(raw: &[&str]) -> Vec<String> {
        raw.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn data_flag_both_spellings() {
        assert_eq!(
            parse_data_arg(&args(&["--data", "/tmp/csvs"])),
            Some(PathBuf::from("/tmp/csvs"))
        );
        assert_eq!(
            parse_data_arg(&args(&["--data=/tmp/csvs"])),
            Some(PathBuf::from("/tmp/csvs"))
        );
        assert_eq!(parse_data_arg(&args(&["--data="])), None);
        assert_eq!(parse_data_arg(&args(&["top-scorers", "1996"])), None);
    }
}
