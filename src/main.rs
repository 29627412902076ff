use anyhow::{Context, Result};
use argh::FromArgs;
use moon_robot::Interpreter;
use moon_robot::config::Settings;
use moon_robot::session::Session;
use std::path::PathBuf;

#[derive(FromArgs)]
/// Drive a grid robot with F, B, L and R commands.
///
/// Without -c an interactive console is started. Settings are read from
/// START_POSITION, START_DIRECTION and ROBOT_STATE_FILE.
struct Args {
    #[argh(option)]
    /// JSON file to keep robot state in; overrides ROBOT_STATE_FILE
    state_file: Option<PathBuf>,

    #[argh(option, short = 'c')]
    /// run a single console line, e.g. -c "move FFRF", and exit
    command: Option<String>,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args: Args = argh::from_env();
    let mut settings = Settings::from_env().context("invalid robot settings")?;
    if let Some(path) = args.state_file {
        settings.state_file = Some(path);
    }
    log::debug!("settings: {settings:?}");

    let mut console = Interpreter::with_builtins(Session::open(settings));

    match args.command {
        Some(line) => {
            let code = console.run_line(&line, &mut std::io::stdout())?;
            std::process::exit(code);
        }
        None => {
            console
                .repl()
                .map_err(|e| anyhow::anyhow!("console failed: {e}"))
        }
    }
}
