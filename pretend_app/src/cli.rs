use std::path::PathBuf;

use anyhow::Context;
use anyhow::bail;
use pretend_http::LookupArg;
use pretend_http::Platform;

pub const USAGE: &str = "usage: pretend_lookup [--config <path>] <userinfo|tiktok|instagram|twitter|roblox|signed> <identifier>...";

/// Which lookup to run for every identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Target {
    UserInfo,
    Platform(Platform),
}

impl Target {
    /// Turn a raw command-line identifier into a lookup argument
    ///
    /// User ids are passed as integers when they parse as one; anything else
    /// is forwarded as text and rejected by the client.
    pub fn lookup_arg(&self, raw: &str) -> LookupArg {
        match self {
            Target::UserInfo => raw.parse::<i64>().map(LookupArg::from).unwrap_or_else(|_| LookupArg::from(raw)),
            Target::Platform(_) => LookupArg::from(raw),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LookupArgs {
    pub config_path: Option<PathBuf>,
    pub target: Target,
    pub identifiers: Vec<String>,
}

/// Parse arguments (without the program name)
pub fn parse_args<I>(args: I) -> anyhow::Result<LookupArgs>
where
    I: IntoIterator<Item = String>,
{
    let mut args = args.into_iter();
    let mut config_path = None;
    let mut positional = Vec::new();

    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--config" | "-c" => {
                let path = args.next().context("--config needs a path")?;
                config_path = Some(PathBuf::from(path));
            }
            "--help" | "-h" => bail!(USAGE),
            _ => positional.push(arg),
        }
    }

    let mut positional = positional.into_iter();
    let target = match positional.next() {
        Some(target) if target.eq_ignore_ascii_case("userinfo") => Target::UserInfo,
        Some(target) => Target::Platform(target.parse::<Platform>()?),
        None => bail!(USAGE),
    };

    let identifiers: Vec<String> = positional.collect();
    if identifiers.is_empty() {
        bail!("at least one identifier is required\n{USAGE}");
    }

    Ok(LookupArgs { config_path, target, identifiers })
}
