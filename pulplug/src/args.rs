//! Command-line arguments the engine passes to a provider plugin
//!
//! The engine launches plugins as
//! `pulumi-resource-<name> [-logtostderr] [-v=N] [-logflow] [-tracing URL] ENGINE_ADDRESS`
//! using Go-style single-dash flags, and newer engines may add flags this
//! crate does not know about. Arguments are normalized before clap sees them:
//! single-dash long flags become double-dash, and unknown flags are dropped.

use clap::Parser;
use std::ffi::OsString;

const BOOL_FLAGS: &[&str] = &["logtostderr", "logflow"];
const VALUE_FLAGS: &[&str] = &["tracing"];

#[derive(Debug, Clone, Default, PartialEq, Eq, Parser)]
#[command(name = "pulumi-resource-provider", disable_help_flag = true)]
pub struct PluginArgs {
    /// Address of the engine's host services
    pub engine_address: Option<String>,

    /// Log to stderr instead of log files. Accepted and ignored: logs always
    /// go to stderr.
    #[arg(long)]
    pub logtostderr: bool,

    /// Log verbosity level
    #[arg(short = 'v', default_value_t = 0)]
    pub verbosity: u8,

    /// Flow log settings to child processes. Accepted and ignored: providers
    /// spawn no plugins of their own.
    #[arg(long)]
    pub logflow: bool,

    /// Emit tracing to the given endpoint. Accepted and ignored: no trace
    /// exporter is wired up.
    #[arg(long)]
    pub tracing: Option<String>,
}

impl PluginArgs {
    /// Parse the current process arguments.
    pub fn from_env() -> Result<Self, clap::Error> {
        Self::parse_tolerant(std::env::args_os())
    }

    /// Parse `args` (including the program name) after normalization.
    pub fn parse_tolerant<I, T>(args: I) -> Result<Self, clap::Error>
    where
        I: IntoIterator<Item = T>,
        T: Into<OsString>,
    {
        Self::try_parse_from(normalize(args))
    }
}

fn normalize<I, T>(args: I) -> Vec<OsString>
where
    I: IntoIterator<Item = T>,
    T: Into<OsString>,
{
    let mut args = args.into_iter().map(Into::into);
    let mut out: Vec<OsString> = args.next().into_iter().collect();
    let rest: Vec<OsString> = args.collect();

    let mut i = 0;
    while i < rest.len() {
        let raw = &rest[i];
        i += 1;

        let Some(arg) = raw.to_str() else {
            out.push(raw.clone());
            continue;
        };

        if arg == "--" || !arg.starts_with('-') || arg == "-" {
            out.push(raw.clone());
            continue;
        }

        let flag = arg.trim_start_matches('-');
        let (name, value) = match flag.split_once('=') {
            Some((name, value)) => (name, Some(value)),
            None => (flag, None),
        };

        if name == "v" {
            out.push("-v".into());
            match value {
                Some(value) => out.push(value.into()),
                None => {
                    if let Some(next) = rest.get(i) {
                        out.push(next.clone());
                        i += 1;
                    }
                }
            }
        } else if BOOL_FLAGS.contains(&name) {
            if !matches!(value, Some("false") | Some("0")) {
                out.push(format!("--{}", name).into());
            }
        } else if VALUE_FLAGS.contains(&name) {
            out.push(format!("--{}", name).into());
            match value {
                Some(value) => out.push(value.into()),
                None => {
                    if let Some(next) = rest.get(i) {
                        out.push(next.clone());
                        i += 1;
                    }
                }
            }
        }
        // Anything else is an unknown flag and is skipped.
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_engine_invocation() {
        let args = PluginArgs::parse_tolerant([
            "pulumi-resource-xyz",
            "-logtostderr",
            "-v=9",
            "-logflow",
            "-tracing",
            "http://localhost:9411",
            "127.0.0.1:51234",
        ])
        .unwrap();

        assert_eq!(args.engine_address.as_deref(), Some("127.0.0.1:51234"));
        assert!(args.logtostderr);
        assert!(args.logflow);
        assert_eq!(args.verbosity, 9);
        assert_eq!(args.tracing.as_deref(), Some("http://localhost:9411"));
    }

    #[test]
    fn accepts_double_dash_forms() {
        let args = PluginArgs::parse_tolerant([
            "pulumi-resource-xyz",
            "--logtostderr",
            "-v",
            "3",
            "--tracing=http://collector",
            "localhost:4000",
        ])
        .unwrap();

        assert!(args.logtostderr);
        assert_eq!(args.verbosity, 3);
        assert_eq!(args.tracing.as_deref(), Some("http://collector"));
        assert_eq!(args.engine_address.as_deref(), Some("localhost:4000"));
    }

    #[test]
    fn engine_address_is_optional() {
        let args = PluginArgs::parse_tolerant(["pulumi-resource-xyz"]).unwrap();
        assert_eq!(args, PluginArgs::default());
    }

    #[test]
    fn unknown_flags_are_ignored() {
        let args = PluginArgs::parse_tolerant([
            "pulumi-resource-xyz",
            "--root=/tmp/project",
            "-stderrthreshold",
            "127.0.0.1:1",
        ])
        .unwrap();

        assert_eq!(args.engine_address.as_deref(), Some("127.0.0.1:1"));
        assert!(!args.logtostderr);
    }

    #[test]
    fn false_bool_flags_stay_unset() {
        let args =
            PluginArgs::parse_tolerant(["pulumi-resource-xyz", "-logtostderr=false"]).unwrap();
        assert!(!args.logtostderr);
    }

    #[test]
    fn invalid_verbosity_is_an_error() {
        assert!(PluginArgs::parse_tolerant(["pulumi-resource-xyz", "-v=loud"]).is_err());
    }
}
