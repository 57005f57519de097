use clap::Parser;

/// Flags that take a value.
const VALUE_FLAGS: &[&str] = &["pre", "post"];
/// Long flags accepted with a single dash for compatibility (`-pre ...`).
const SINGLE_DASH_FLAGS: &[&str] = &["pre", "post", "version"];

#[derive(Debug, Parser)]
#[command(
    name = "ctx-init",
    about = "Container init: resolves secrets, runs pre/main/post commands, reaps zombies",
    disable_version_flag = true
)]
pub struct Cli {
    /// Pre-start command
    #[arg(long, value_name = "CMD", allow_hyphen_values = true)]
    pub pre: Option<String>,

    /// Post-stop command
    #[arg(long, value_name = "CMD", allow_hyphen_values = true)]
    pub post: Option<String>,

    /// Display ctx-init version
    #[arg(long)]
    pub version: bool,

    /// Main command and its arguments
    #[arg(value_name = "COMMAND", trailing_var_arg = true, allow_hyphen_values = true)]
    pub command: Vec<String>,
}

impl Cli {
    /// Parse process arguments, accepting single-dash long flags.
    pub fn parse_compat() -> Self {
        Self::parse_from(normalize_args(std::env::args()))
    }
}

/// Version string printed by `--version`.
pub fn version() -> &'static str {
    option_env!("CTX_INIT_VERSION").unwrap_or(env!("CARGO_PKG_VERSION"))
}

/// Rewrite `-pre`, `-post` and `-version` (and their `-flag=value` forms)
/// into double-dash flags. Stops at `--` or the first positional argument so
/// the main command's own arguments are never touched.
pub fn normalize_args(args: impl IntoIterator<Item = String>) -> Vec<String> {
    let mut args = args.into_iter();
    let mut out: Vec<String> = args.next().into_iter().collect();
    let mut expect_value = false;

    for arg in args.by_ref() {
        if expect_value {
            out.push(arg);
            expect_value = false;
            continue;
        }
        if arg == "--" || !arg.starts_with('-') {
            out.push(arg);
            break;
        }

        let (flag, inline_value) = match arg.split_once('=') {
            Some((flag, value)) => (flag, Some(value)),
            None => (arg.as_str(), None),
        };
        let name = flag.trim_start_matches('-');
        let single_dash = !flag.starts_with("--");
        expect_value = inline_value.is_none() && VALUE_FLAGS.contains(&name);

        if single_dash && SINGLE_DASH_FLAGS.contains(&name) {
            out.push(match inline_value {
                Some(value) => format!("--{name}={value}"),
                None => format!("--{name}"),
            });
        } else {
            out.push(arg);
        }
    }

    out.extend(args);
    out
}
