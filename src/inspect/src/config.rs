use clap::Parser;
use serde::{Deserialize, Serialize};

/// Long flags that may be spelled with a single dash, `-db telegraf`.
const SINGLE_DASH_LONG_FLAGS: [&str; 5] = ["db", "rp", "path", "limit", "compress"];

/// Export a TSM file as line protocol to standard output.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Parser)]
#[clap(about, version, author)]
pub struct ExportConfig {
    /// path for tsm file
    #[clap(short = 'p', long, default_value = "a.tsm")]
    pub path: String,

    /// compress the output with gzip
    #[clap(short = 'c', long)]
    pub compress: bool,

    /// database of tsm file
    #[clap(long = "db", default_value = "telegraf")]
    pub database: String,

    /// retention policy of tsm file
    #[clap(long = "rp", default_value = "default")]
    pub retention_policy: String,

    /// highest key index to export, keys 0 through limit are written
    // unsigned, so `-l -1` is a parse error; a signed limit would accept it and export no keys
    #[clap(short = 'l', long, default_value_t = 100)]
    pub limit: usize,
}

impl ExportConfig {
    /// from_args parses a command line that may use single-dash long flags.
    pub fn from_args<I, T>(args: I) -> Result<Self, clap::Error>
    where
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        Self::try_parse_from(normalize_args(args))
    }
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            path: "a.tsm".to_string(),
            compress: false,
            database: "telegraf".to_string(),
            retention_policy: "default".to_string(),
            limit: 100,
        }
    }
}

/// normalize_args rewrites `-db x`, `-rp=y` and the other single-dash long flags into their
/// `--` form. Boolean flags given an explicit value (`-c=false`) are resolved here, since
/// clap switches take no value. The program name and everything after `--` pass through.
pub fn normalize_args<I, T>(args: I) -> Vec<String>
where
    I: IntoIterator<Item = T>,
    T: Into<String>,
{
    let mut out = Vec::new();
    let mut args = args.into_iter().map(Into::into);

    if let Some(program) = args.next() {
        out.push(program);
    }

    while let Some(arg) = args.next() {
        if arg == "--" {
            out.push(arg);
            out.extend(args.by_ref());
            break;
        }

        if !arg.starts_with('-') || arg.starts_with("--") {
            out.push(arg);
            continue;
        }
        let flag = &arg[1..];

        let (name, value) = match flag.split_once('=') {
            Some((name, value)) => (name, Some(value)),
            None => (flag, None),
        };

        let dashes = if SINGLE_DASH_LONG_FLAGS.contains(&name) {
            "--"
        } else {
            "-"
        };

        match (name, value) {
            ("c" | "compress", Some(value)) => match parse_bool(value) {
                Some(true) => out.push(format!("{}{}", dashes, name)),
                Some(false) => {}
                None => out.push(format!("{}{}", dashes, flag)),
            },
            _ => out.push(format!("{}{}", dashes, flag)),
        }
    }

    out
}

fn parse_bool(s: &str) -> Option<bool> {
    match s {
        "1" | "t" | "T" | "true" | "TRUE" | "True" => Some(true),
        "0" | "f" | "F" | "false" | "FALSE" | "False" => Some(false),
        _ => None,
    }
}
