pub mod command;
pub mod parse;

use crate::shell::{
    command::{execute_command, Array, Command},
    parse::parse_command,
};
use colored::*;
use crossterm::{
    cursor, execute,
    style::{Color, Print, ResetColor, SetForegroundColor},
    terminal::{Clear, ClearType},
};
use reedline::{
    DefaultCompleter, DefaultPrompt, DefaultPromptSegment, FileBackedHistory, Reedline, Signal,
};
use std::{io::stdout, path::PathBuf};
use tracing::warn;

const COMMANDS: [&str; 11] = [
    "help", "mount", "unmount", "read", "write", "fill", "zero", "cache", "stats", "clear", "exit",
];

pub fn start_shell(mut array: Array, backend: &str) {
    banner(backend);

    let username = whoami::username();
    let hostname = whoami::hostname();

    println!(
        "{}",
        "Type 'help' for available commands. Use ↑↓ for history, Tab for auto-completion.\n"
            .bright_black()
    );

    // 历史记录放在用户目录下
    let history_path = dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".mdadm_history");

    let mut line_editor = Reedline::create();
    match FileBackedHistory::with_file(100, history_path) {
        Ok(history) => line_editor = line_editor.with_history(Box::new(history)),
        Err(e) => warn!(error = %e, "shell history unavailable"),
    }

    // 命令补全
    let completer =
        DefaultCompleter::new_with_wordlen(COMMANDS.iter().map(|c| c.to_string()).collect(), 2);
    line_editor = line_editor.with_completer(Box::new(completer));

    loop {
        let state = if array.is_mounted() { "mounted" } else { "unmounted" };
        let prompt = DefaultPrompt::new(
            DefaultPromptSegment::Basic(format!("{}@{}:{}", username, hostname, state)),
            DefaultPromptSegment::Basic(backend.to_string()),
        );

        match line_editor.read_line(&prompt) {
            Ok(Signal::Success(buffer)) => {
                let trimmed = buffer.trim();
                if trimmed.is_empty() {
                    continue;
                }

                match parse_command(trimmed) {
                    Some(cmd) => {
                        if let Err(e) = execute_command(&cmd, &mut array) {
                            println!("{} {}", "❌ Error:".red().bold(), e);
                        }
                        if cmd == Command::Exit {
                            break;
                        }
                    }
                    None => println!(
                        "{}",
                        "⚠️  Unknown command or bad arguments. Type 'help' for command list."
                            .yellow()
                    ),
                }
            }
            Ok(Signal::CtrlC) => {
                println!();
                continue;
            }
            Ok(Signal::CtrlD) => {
                println!("{}", "Exiting mdadm...".yellow());
                break;
            }
            Ok(_) => continue,
            Err(e) => {
                println!("Error reading line: {}", e);
                break;
            }
        }
    }

    if array.is_mounted() {
        if let Err(e) = array.unmount() {
            println!("{} {}", "❌ Unmount failed:".red().bold(), e);
        }
    }
    println!("{}", "GoodBye!".bright_yellow());
}

fn banner(backend: &str) {
    let mut stdout = stdout();
    let _ = execute!(
        stdout,
        Clear(ClearType::All),
        cursor::MoveTo(0, 0),
        SetForegroundColor(Color::Cyan),
        Print(format!("mdadm v{} ", env!("CARGO_PKG_VERSION"))),
        ResetColor
    );
    println!("{}", format!("[{} backend]", backend).bright_yellow().bold());
}
