use std::path::PathBuf;

use crate::errors::AppError;

pub const DEFAULT_EXPORT_DAYS: i64 = 30;
pub const DEFAULT_LATEST_COUNT: i64 = 10;
pub const DEFAULT_STATS_DAYS: i64 = 30;

pub const USAGE: &str = "\
Usage: gold-tracker [COMMAND]

Commands:
  update                          Fetch, store and evaluate one price (default)
  schedule                        Run now, then every 6 hours until Ctrl+C
  verify-notification [--price P] Exercise the alert path on a scratch copy
  export [-o PATH] [--days N]     CSV of recent prices (stdout without -o)
  latest [N]                      Show the N most recent records
  stats [--days N]                Current price, averages and range
";

#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Update,
    Schedule,
    VerifyNotification { price: Option<f64> },
    Export { out: Option<PathBuf>, days: i64 },
    Latest { count: i64 },
    Stats { days: i64 },
    Help,
}

/// Parse everything after the program name.
pub fn parse_args<I>(args: I) -> Result<Command, AppError>
where
    I: IntoIterator<Item = String>,
{
    let mut args = args.into_iter();
    let Some(command) = args.next() else {
        return Ok(Command::Update);
    };

    let parsed = match command.as_str() {
        "update" => Command::Update,
        "schedule" => Command::Schedule,
        "verify-notification" => {
            let mut price = None;
            while let Some(a) = args.next() {
                match a.as_str() {
                    "--price" | "-p" => {
                        let v = positive(&value_for(&mut args, "--price")?, "--price")?;
                        price = Some(v);
                    }
                    _ => return Err(unknown(&a)),
                }
            }
            Command::VerifyNotification { price }
        }
        "export" => {
            let mut out = None;
            let mut days = DEFAULT_EXPORT_DAYS;
            while let Some(a) = args.next() {
                match a.as_str() {
                    "-o" | "--out" => out = Some(PathBuf::from(value_for(&mut args, "--out")?)),
                    "--days" | "-d" => days = whole_number(&value_for(&mut args, "--days")?, "--days")?,
                    _ => return Err(unknown(&a)),
                }
            }
            Command::Export { out, days }
        }
        "latest" => {
            let count = match args.next() {
                Some(v) => whole_number(&v, "latest")?,
                None => DEFAULT_LATEST_COUNT,
            };
            if let Some(extra) = args.next() {
                return Err(unknown(&extra));
            }
            Command::Latest { count }
        }
        "stats" => {
            let mut days = DEFAULT_STATS_DAYS;
            while let Some(a) = args.next() {
                match a.as_str() {
                    "--days" | "-d" => days = whole_number(&value_for(&mut args, "--days")?, "--days")?,
                    _ => return Err(unknown(&a)),
                }
            }
            Command::Stats { days }
        }
        "-h" | "--help" | "help" => Command::Help,
        other => return Err(AppError::Config(format!("Unknown command: {}", other))),
    };

    Ok(parsed)
}

fn value_for(args: &mut impl Iterator<Item = String>, flag: &str) -> Result<String, AppError> {
    args.next()
        .ok_or_else(|| AppError::Config(format!("Missing value for {}", flag)))
}

fn whole_number(value: &str, flag: &str) -> Result<i64, AppError> {
    match value.parse::<i64>() {
        Ok(n) if n > 0 => Ok(n),
        _ => Err(AppError::Config(format!(
            "{} expects a positive whole number, got {}",
            flag, value
        ))),
    }
}

fn positive(value: &str, flag: &str) -> Result<f64, AppError> {
    match value.parse::<f64>() {
        Ok(v) if v.is_finite() && v > 0.0 => Ok(v),
        _ => Err(AppError::Config(format!(
            "{} expects a positive price, got {}",
            flag, value
        ))),
    }
}

fn unknown(arg: &str) -> AppError {
    AppError::Config(format!("Unknown arg: {}", arg))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Result<Command, AppError> {
        parse_args(args.iter().map(|a| a.to_string()))
    }

    #[test]
    fn test_no_command_means_update() {
        assert_eq!(parse(&[]).unwrap(), Command::Update);
    }

    #[test]
    fn test_verify_with_price() {
        assert_eq!(
            parse(&["verify-notification", "--price", "132000"]).unwrap(),
            Command::VerifyNotification { price: Some(132000.0) }
        );
        assert!(parse(&["verify-notification", "--price", "-5"]).is_err());
    }

    #[test]
    fn test_export_flags() {
        assert_eq!(
            parse(&["export"]).unwrap(),
            Command::Export { out: None, days: DEFAULT_EXPORT_DAYS }
        );
        assert_eq!(
            parse(&["export", "-o", "prices.csv", "--days", "7"]).unwrap(),
            Command::Export { out: Some(PathBuf::from("prices.csv")), days: 7 }
        );
        assert!(parse(&["export", "--days"]).is_err());
    }

    #[test]
    fn test_latest_count() {
        assert_eq!(parse(&["latest"]).unwrap(), Command::Latest { count: 10 });
        assert_eq!(parse(&["latest", "3"]).unwrap(), Command::Latest { count: 3 });
        assert!(parse(&["latest", "zero"]).is_err());
    }

    #[test]
    fn test_unknown_input() {
        assert!(parse(&["refresh"]).is_err());
        assert!(parse(&["stats", "--weeks", "2"]).is_err());
    }
}
