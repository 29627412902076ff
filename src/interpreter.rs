use crate::command::{CommandFactory, ExitCode};
use crate::env::Environment;
use crate::lexer;
use crate::session::Session;
use anyhow::Context;
use log::debug;
use rustyline::error::ReadlineError;
use rustyline::{DefaultEditor, Result};
use std::io::Write;

/// Factory allows creating instances of ExecutableCommand.
///
/// Only supports the builtins defined in this crate.
pub(crate) struct Factory<T> {
    _phantom: std::marker::PhantomData<T>,
}

impl<T> Default for Factory<T> {
    fn default() -> Self {
        Self {
            _phantom: std::marker::PhantomData,
        }
    }
}

/// Console that drives a robot [`Session`] through textual commands.
///
/// The interpreter owns an [`Environment`] and a list of [`CommandFactory`]
/// objects that are queried to create commands by name. See
/// [`Interpreter::with_builtins`] for the commands included out of the box.
///
/// Example
/// ```
/// use moon_robot::Interpreter;
/// use moon_robot::config::Settings;
/// use moon_robot::session::Session;
/// use moon_robot::store::MemoryStore;
///
/// let session = Session::new(Settings::default(), Box::new(MemoryStore::new()));
/// let mut console = Interpreter::with_builtins(session);
/// let mut out = Vec::new();
/// let code = console.run_line("move FFRF", &mut out).unwrap();
/// assert_eq!(code, 0);
/// assert_eq!(String::from_utf8(out).unwrap(), "(1, 2) facing EAST\n");
/// ```
pub struct Interpreter {
    env: Environment,
    commands: Vec<Box<dyn CommandFactory>>,
}

impl Interpreter {
    /// Create a new interpreter with a custom set of command factories.
    pub fn new(session: Session, commands: Vec<Box<dyn CommandFactory>>) -> Self {
        Self {
            env: Environment::new(session),
            commands,
        }
    }

    /// Create an interpreter with the default set of commands:
    /// `move`, `status`, `reset`, `obstacles`, `block`, `unblock`, `history`, `exit`.
    pub fn with_builtins(session: Session) -> Self {
        use crate::builtin::*;
        Self::new(
            session,
            vec![
                Box::new(Factory::<Move>::default()),
                Box::new(Factory::<Status>::default()),
                Box::new(Factory::<Reset>::default()),
                Box::new(Factory::<Obstacles>::default()),
                Box::new(Factory::<Block>::default()),
                Box::new(Factory::<Unblock>::default()),
                Box::new(Factory::<History>::default()),
                Box::new(Factory::<Exit>::default()),
            ],
        )
    }

    pub fn session(&self) -> &Session {
        &self.env.session
    }

    /// Whether a command asked the console to stop.
    pub fn should_exit(&self) -> bool {
        self.env.should_exit
    }

    /// Names of all known commands, in lookup order.
    pub fn command_names(&self) -> Vec<&'static str> {
        self.commands.iter().map(|f| f.name()).collect()
    }

    /// Run a single command invocation by name with arguments.
    ///
    /// Returns the command's exit code or an error if no factory knows `name`.
    pub fn run(&mut self, name: &str, args: &[&str], stdout: &mut dyn Write) -> anyhow::Result<ExitCode> {
        for factory in &self.commands {
            if let Some(cmd) = factory.try_create(name, args) {
                return cmd.execute(stdout, &mut self.env);
            }
        }
        Err(anyhow::anyhow!(
            "command not found: {} (available: {})",
            name,
            self.command_names().join(", ")
        ))
    }

    /// Split `line` into words and run it. Blank lines succeed without doing anything.
    pub fn run_line(&mut self, line: &str, stdout: &mut dyn Write) -> anyhow::Result<ExitCode> {
        let words = lexer::split_into_words(line).with_context(|| format!("can't parse {line:?}"))?;
        debug!("words = {words:?}");
        let Some((name, args)) = words.split_first() else {
            return Ok(0);
        };
        let args: Vec<&str> = args.iter().map(|s| s.as_str()).collect();
        self.run(name, &args, stdout)
    }

    /// Read-Eval-Print Loop over standard input until `exit`, Ctrl-C or Ctrl-D.
    pub fn repl(&mut self) -> Result<()> {
        let mut rl = DefaultEditor::new()?;
        let mut stdout = std::io::stdout();

        while !self.env.should_exit {
            match rl.readline("robot> ") {
                Ok(line) => {
                    if line.trim().is_empty() {
                        continue;
                    }
                    rl.add_history_entry(line.as_str())?;
                    if let Err(e) = self.run_line(&line, &mut stdout) {
                        println!("Error: {e:#}");
                    }
                }
                Err(ReadlineError::Interrupted) => {
                    println!("Interrupted");
                    break;
                }
                Err(ReadlineError::Eof) => break,
                Err(err) => {
                    println!("Error: {err:?}");
                    break;
                }
            }
        }

        Ok(())
    }
}
