use std::collections::HashMap;
use std::io::{self, Write};

use tracing::debug;

use crate::error::FsError;
use crate::fs_ops::{self, EntryKind};
use crate::session::Session;
use crate::utils::write_line;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandFlow {
    Continue,
    Exit,
}

/// Handlers receive the whole token list, command name included, and report every
/// filesystem failure as text; only a failed write to `out` is returned as an error.
pub type CommandFn = fn(&mut Session, &[String], &mut dyn Write) -> io::Result<CommandFlow>;

pub struct Command {
    pub name: &'static str,
    pub usage: &'static str,
    pub summary: &'static str,
    pub min_args: usize,
    pub run: CommandFn,
}

static COMMANDS: &[Command] = &[
    Command {
        name: "ls",
        usage: "ls",
        summary: "List files and directories",
        min_args: 0,
        run: Commands::command_ls,
    },
    Command {
        name: "cd",
        usage: "cd <dir>",
        summary: "Change directory",
        min_args: 1,
        run: Commands::command_cd,
    },
    Command {
        name: "mkdir",
        usage: "mkdir <name>",
        summary: "Create directory",
        min_args: 1,
        run: Commands::command_mkdir,
    },
    Command {
        name: "touch",
        usage: "touch <file>",
        summary: "Create empty file",
        min_args: 1,
        run: Commands::command_touch,
    },
    Command {
        name: "rm",
        usage: "rm <name>",
        summary: "Delete file or directory",
        min_args: 1,
        run: Commands::command_rm,
    },
    Command {
        name: "cp",
        usage: "cp <src> <dest>",
        summary: "Copy file or directory",
        min_args: 2,
        run: Commands::command_cp,
    },
    Command {
        name: "mv",
        usage: "mv <src> <dest>",
        summary: "Move or rename file/directory",
        min_args: 2,
        run: Commands::command_mv,
    },
    Command {
        name: "info",
        usage: "info <file>",
        summary: "Show file details",
        min_args: 1,
        run: Commands::command_info,
    },
    Command {
        name: "search",
        usage: "search <keyword>",
        summary: "Search for a file or folder",
        min_args: 1,
        run: Commands::command_search,
    },
    Command {
        name: "help",
        usage: "help",
        summary: "Show available commands",
        min_args: 0,
        run: Commands::command_help,
    },
    Command {
        name: "exit",
        usage: "exit",
        summary: "Exit the explorer",
        min_args: 0,
        run: Commands::command_exit,
    },
];

pub struct Commands {
    registry: HashMap<&'static str, &'static Command>,
}

impl Commands {
    pub fn new() -> Self {
        let registry = COMMANDS
            .iter()
            .map(|command| (command.name, command))
            .collect();
        Commands { registry }
    }

    pub fn get(&self, name: &str) -> Option<&'static Command> {
        self.registry.get(name).copied()
    }

    fn command_ls(
        session: &mut Session,
        _parts: &[String],
        out: &mut dyn Write,
    ) -> io::Result<CommandFlow> {
        let dir = session.current_dir();
        match fs_ops::list_dir(dir) {
            Ok(entries) => {
                write_line(out, "")?;
                write_line(out, &format!("Contents of: {}", dir.display()))?;
                for entry in entries {
                    let marker = match entry.kind {
                        EntryKind::Directory => "[DIR]  ",
                        EntryKind::File => "       ",
                    };
                    write_line(out, &format!("{marker}{}", entry.name))?;
                }
            }
            Err(err) => write_line(out, &format!("Error listing directory: {err}"))?,
        }
        Ok(CommandFlow::Continue)
    }

    fn command_cd(
        session: &mut Session,
        parts: &[String],
        out: &mut dyn Write,
    ) -> io::Result<CommandFlow> {
        match session.change_dir(&parts[1]) {
            Ok(dir) => write_line(out, &format!("Changed directory to: {}", dir.display()))?,
            Err(err) => {
                debug!(target_dir = %parts[1], error = %err, "cd rejected");
                write_line(out, &format!("Directory not found: {}", parts[1]))?;
            }
        }
        Ok(CommandFlow::Continue)
    }

    fn command_mkdir(
        session: &mut Session,
        parts: &[String],
        out: &mut dyn Write,
    ) -> io::Result<CommandFlow> {
        match fs_ops::create_dir(&session.resolve(&parts[1])) {
            Ok(()) => write_line(out, &format!("Directory created: {}", parts[1]))?,
            Err(err) => write_line(out, &format!("Error creating directory: {err}"))?,
        }
        Ok(CommandFlow::Continue)
    }

    fn command_touch(
        session: &mut Session,
        parts: &[String],
        out: &mut dyn Write,
    ) -> io::Result<CommandFlow> {
        match fs_ops::create_file(&session.resolve(&parts[1])) {
            Ok(()) => write_line(out, &format!("File created: {}", parts[1]))?,
            Err(err) => write_line(out, &format!("Error creating file: {err}"))?,
        }
        Ok(CommandFlow::Continue)
    }

    fn command_rm(
        session: &mut Session,
        parts: &[String],
        out: &mut dyn Write,
    ) -> io::Result<CommandFlow> {
        match fs_ops::remove(&session.resolve(&parts[1])) {
            Ok(()) => write_line(out, &format!("Deleted: {}", parts[1]))?,
            Err(FsError::NotFound(_)) => write_line(out, "File or directory not found.")?,
            Err(err) => write_line(out, &format!("Error deleting: {err}"))?,
        }
        Ok(CommandFlow::Continue)
    }

    fn command_cp(
        session: &mut Session,
        parts: &[String],
        out: &mut dyn Write,
    ) -> io::Result<CommandFlow> {
        let (src, dest) = (&parts[1], &parts[2]);
        match fs_ops::copy(&session.resolve(src), &session.resolve(dest)) {
            Ok(()) => write_line(out, &format!("Copied {src} to {dest}"))?,
            Err(err) => write_line(out, &format!("Error copying: {err}"))?,
        }
        Ok(CommandFlow::Continue)
    }

    fn command_mv(
        session: &mut Session,
        parts: &[String],
        out: &mut dyn Write,
    ) -> io::Result<CommandFlow> {
        let (src, dest) = (&parts[1], &parts[2]);
        match fs_ops::rename(&session.resolve(src), &session.resolve(dest)) {
            Ok(()) => write_line(out, &format!("Moved {src} to {dest}"))?,
            Err(err) => write_line(out, &format!("Error moving: {err}"))?,
        }
        Ok(CommandFlow::Continue)
    }

    fn command_info(
        session: &mut Session,
        parts: &[String],
        out: &mut dyn Write,
    ) -> io::Result<CommandFlow> {
        let info = match fs_ops::file_info(&session.resolve(&parts[1])) {
            Ok(info) => info,
            Err(FsError::NotFound(_)) => {
                write_line(out, "File not found.")?;
                return Ok(CommandFlow::Continue);
            }
            Err(err) => {
                write_line(out, &format!("Error reading file info: {err}"))?;
                return Ok(CommandFlow::Continue);
            }
        };

        let modified = info
            .modified
            .map(|secs| secs.to_string())
            .unwrap_or_else(|| "unknown".to_string());

        write_line(out, "")?;
        write_line(out, &format!("File Info for: {}", parts[1]))?;
        write_line(out, &format!("Full Path: {}", info.path.display()))?;
        write_line(out, &format!("Type: {}", info.kind))?;
        write_line(out, &format!("Size: {} bytes", info.size))?;
        write_line(out, &format!("Last Modified: {modified}"))?;
        Ok(CommandFlow::Continue)
    }

    fn command_search(
        session: &mut Session,
        parts: &[String],
        out: &mut dyn Write,
    ) -> io::Result<CommandFlow> {
        let keyword = &parts[1];
        write_line(out, &format!("Searching for: {keyword}"))?;
        for hit in fs_ops::search(session.current_dir(), keyword) {
            match hit {
                Ok(path) => write_line(out, &format!("Found: {}", path.display()))?,
                Err(FsError::Io { path, source, .. }) => {
                    write_line(out, &format!("Skipped: {} ({source})", path.display()))?
                }
                Err(err) => write_line(out, &format!("Skipped: {err}"))?,
            }
        }
        Ok(CommandFlow::Continue)
    }

    fn command_help(
        _session: &mut Session,
        _parts: &[String],
        out: &mut dyn Write,
    ) -> io::Result<CommandFlow> {
        write_line(out, "")?;
        write_line(out, "Available Commands:")?;
        for command in COMMANDS {
            write_line(out, &format!("  {:<19}- {}", command.usage, command.summary))?;
        }
        Ok(CommandFlow::Continue)
    }

    fn command_exit(
        _session: &mut Session,
        _parts: &[String],
        _out: &mut dyn Write,
    ) -> io::Result<CommandFlow> {
        Ok(CommandFlow::Exit)
    }
}
