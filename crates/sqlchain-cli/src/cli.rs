use std::path::PathBuf;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HelpTopic {
    Root,
    Render,
    Requests,
}

#[derive(Debug, Clone)]
pub enum Command {
    Help(HelpTopic),
    Render(RenderArgs),
    Requests(RequestsArgs),
}

/// Where model definitions come from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Source {
    pub config: PathBuf,
    /// Overrides `models` from the config file.
    pub models: Option<PathBuf>,
}

impl Default for Source {
    fn default() -> Self {
        Self {
            config: PathBuf::from("sqlchain.toml"),
            models: None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct RenderArgs {
    pub source: Source,
    pub request: String,
    pub params: Vec<String>,
    pub json: bool,
}

#[derive(Debug, Clone)]
pub struct RequestsArgs {
    pub source: Source,
}

pub fn parse_args(args: &[String]) -> anyhow::Result<Command> {
    let mut it = args.iter().skip(1);
    let Some(first) = it.next() else {
        return Ok(Command::Help(HelpTopic::Root));
    };

    match first.as_str() {
        "-h" | "--help" | "help" => Ok(Command::Help(HelpTopic::Root)),
        "render" => parse_render(it.map(|s| s.as_str())),
        "requests" => parse_requests(it.map(|s| s.as_str())),
        _ => anyhow::bail!("unknown command: {first}"),
    }
}

/// Consume a source option; `Ok(false)` when `token` is not one.
fn parse_source_option<'a>(
    token: &'a str,
    it: &mut impl Iterator<Item = &'a str>,
    source: &mut Source,
) -> anyhow::Result<bool> {
    match token {
        "--config" => {
            let Some(v) = it.next() else {
                anyhow::bail!("--config requires a value");
            };
            source.config = PathBuf::from(v);
        }
        _ if token.starts_with("--config=") => {
            source.config = PathBuf::from(token.trim_start_matches("--config="));
        }
        "--models" => {
            let Some(v) = it.next() else {
                anyhow::bail!("--models requires a value");
            };
            source.models = Some(PathBuf::from(v));
        }
        _ if token.starts_with("--models=") => {
            source.models = Some(PathBuf::from(token.trim_start_matches("--models=")));
        }
        _ => return Ok(false),
    }
    Ok(true)
}

fn parse_render<'a>(mut it: impl Iterator<Item = &'a str>) -> anyhow::Result<Command> {
    let mut source = Source::default();
    let mut request: Option<String> = None;
    let mut params: Vec<String> = Vec::new();
    let mut json = false;

    while let Some(token) = it.next() {
        if parse_source_option(token, &mut it, &mut source)? {
            continue;
        }
        match token {
            "-h" | "--help" => return Ok(Command::Help(HelpTopic::Render)),
            "--param" | "-p" => {
                let Some(v) = it.next() else {
                    anyhow::bail!("{token} requires a value");
                };
                params.push(v.to_string());
            }
            _ if token.starts_with("--param=") => {
                params.push(token.trim_start_matches("--param=").to_string());
            }
            "--json" => json = true,
            other if other.starts_with('-') => anyhow::bail!("unknown argument: {other}"),
            other if request.is_none() => request = Some(other.to_string()),
            other => anyhow::bail!("unexpected argument: {other}"),
        }
    }

    let Some(request) = request else {
        anyhow::bail!("missing request name: expected `sqlchain render <model.request>`");
    };

    Ok(Command::Render(RenderArgs {
        source,
        request,
        params,
        json,
    }))
}

fn parse_requests<'a>(mut it: impl Iterator<Item = &'a str>) -> anyhow::Result<Command> {
    let mut source = Source::default();

    while let Some(token) = it.next() {
        if parse_source_option(token, &mut it, &mut source)? {
            continue;
        }
        match token {
            "-h" | "--help" => return Ok(Command::Help(HelpTopic::Requests)),
            other => anyhow::bail!("unknown argument: {other}"),
        }
    }

    Ok(Command::Requests(RequestsArgs { source }))
}

pub fn print_help(topic: HelpTopic) {
    match topic {
        HelpTopic::Root => {
            println!(
                "\
sqlchain - render sqlchain model requests without a database

USAGE:
  sqlchain <COMMAND> [OPTIONS]

COMMANDS:
  render        Build a named request and print its SQL and parameters
  requests      List the requests defined by the loaded models
  help          Print this message

Run `sqlchain <command> --help` for more."
            );
        }
        HelpTopic::Render => {
            println!(
                "\
USAGE:
  sqlchain render <MODEL.REQUEST> [OPTIONS]

OPTIONS:
  --config <FILE>       Config file path (default: sqlchain.toml)
  --models <DIR>        Model directory (overrides `models` from config)
  -p, --param <VALUE>   Value bound to the next `?` (repeatable)
  --json                Print statements and comments as JSON
  -h, --help            Print help"
            );
        }
        HelpTopic::Requests => {
            println!(
                "\
USAGE:
  sqlchain requests [OPTIONS]

OPTIONS:
  --config <FILE>       Config file path (default: sqlchain.toml)
  --models <DIR>        Model directory (overrides `models` from config)
  -h, --help            Print help"
            );
        }
    }
}
