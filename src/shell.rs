use std::io::{self, BufRead, Write};

use tracing::debug;

use crate::commands::{CommandFlow, Commands};
use crate::parser::tokenize;
use crate::session::Session;
use crate::utils::write_line;

pub struct Shell {
    session: Session,
    commands: Commands,
}

impl Shell {
    pub fn new(session: Session) -> Self {
        Shell {
            session,
            commands: Commands::new(),
        }
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    /// Reads commands from `input` until `exit` or end of input.
    pub fn run<R: BufRead, W: Write>(&mut self, mut input: R, mut out: W) -> io::Result<()> {
        write_line(&mut out, "Welcome to Simple File Explorer")?;
        write_line(&mut out, "Type 'help' to see available commands.")?;
        write_line(&mut out, "")?;

        loop {
            write!(out, "{} > ", self.session.current_dir().display())?;
            out.flush()?;

            let mut line = Vec::new();
            if input.read_until(b'\n', &mut line)? == 0 {
                write_line(&mut out, "")?;
                debug!("end of input");
                break;
            }

            // Non-UTF-8 bytes become U+FFFD instead of ending the session.
            let parts = tokenize(&String::from_utf8_lossy(&line));
            if parts.is_empty() {
                continue;
            }

            let Some(command) = self.commands.get(&parts[0]) else {
                write_line(&mut out, "Unknown command. Type 'help' for options.")?;
                continue;
            };

            // Too few arguments is not reported, unlike an unknown name.
            if parts.len() - 1 < command.min_args {
                debug!(
                    command = command.name,
                    given = parts.len() - 1,
                    "missing arguments, ignored"
                );
                continue;
            }

            if (command.run)(&mut self.session, &parts, &mut out)? == CommandFlow::Exit {
                break;
            }
        }

        out.flush()
    }
}
