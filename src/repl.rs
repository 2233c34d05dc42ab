//! Line-oriented front end over a [`Session`].
//!
//! Reads one command per line and prints the listing for the
//! current directory after every scan. Rendering is deliberately plain.

use anyhow::Context;
use dirsight_core::export;
use dirsight_core::model::size::format_in_unit;
use dirsight_core::{NavAction, NavOutcome, SizeUnit};
use dirsight_session::Session;
use std::io::{BufRead, Write};
use std::path::{Path, PathBuf};
use std::time::Duration;

#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Enter(usize),
    Nav(NavAction),
    Unit(SizeUnit),
    Refresh,
    Clear,
    ExportCsv(PathBuf),
    ExportJson(PathBuf),
    Help,
    Quit,
}

pub const HELP: &str = "\
  <n>                 enter the n-th directory
  u | up              parent directory
  b | back            previous directory
  h | home            home directory
  r | root            filesystem root
  c <path>            change to <path>
  unit <B|KB|MB|GB>   switch display unit
  refresh             rescan the current directory
  clear               drop the current listing
  export csv <file>   write the listing as CSV
  export json <file>  write the full result as JSON
  q | quit            exit";

/// Parse one input line. `Ok(None)` for a blank line.
pub fn parse_command(line: &str) -> Result<Option<Command>, String> {
    let line = line.trim();
    if line.is_empty() {
        return Ok(None);
    }
    let (word, rest) = match line.split_once(char::is_whitespace) {
        Some((w, r)) => (w, r.trim()),
        None => (line, ""),
    };

    let command = match word.to_ascii_lowercase().as_str() {
        "u" | "up" => Command::Nav(NavAction::Up),
        "b" | "back" => Command::Nav(NavAction::Back),
        "h" | "home" => Command::Nav(NavAction::Home),
        "r" | "root" => Command::Nav(NavAction::Root),
        "c" | "cd" if !rest.is_empty() => Command::Nav(NavAction::ChangeTo(PathBuf::from(rest))),
        "c" | "cd" => return Err("usage: c <path>".into()),
        "unit" => Command::Unit(rest.parse().map_err(|e| format!("{e}"))?),
        "refresh" => Command::Refresh,
        "clear" => Command::Clear,
        "export" => {
            let (format, file) = rest
                .split_once(char::is_whitespace)
                .ok_or("usage: export csv|json <file>")?;
            let file = PathBuf::from(file.trim());
            match format.to_ascii_lowercase().as_str() {
                "csv" => Command::ExportCsv(file),
                "json" => Command::ExportJson(file),
                other => return Err(format!("unknown export format: {other}")),
            }
        }
        "?" | "help" => Command::Help,
        "q" | "quit" | "exit" => Command::Quit,
        _ => match word.parse::<usize>() {
            Ok(n) if n >= 1 => Command::Enter(n - 1),
            _ => return Err(format!("unknown command: {word} (try 'help')")),
        },
    };
    Ok(Some(command))
}

/// Run the loop until `quit` or end of input.
///
/// Only I/O on `input` or `out` ends the loop; command failures are printed
/// and the session carries on.
pub fn run(session: &mut Session, input: impl BufRead, out: &mut impl Write) -> anyhow::Result<()> {
    refresh(session, out)?;

    for line in input.lines() {
        let line = line.context("reading input")?;
        let command = match parse_command(&line) {
            Ok(Some(c)) => c,
            Ok(None) => continue,
            Err(msg) => {
                writeln!(out, "{msg}")?;
                continue;
            }
        };

        match command {
            Command::Quit => break,
            Command::Help => writeln!(out, "{HELP}")?,
            Command::Enter(index) => match session.entry_path(index) {
                Some(path) => navigate(session, NavAction::Enter(path), out)?,
                None => writeln!(out, "no entry {}", index + 1)?,
            },
            Command::Nav(action) => navigate(session, action, out)?,
            Command::Unit(unit) => {
                session.set_unit(unit);
                wait_and_render(session, out)?;
            }
            Command::Refresh => refresh(session, out)?,
            Command::Clear => {
                session.clear_results();
                writeln!(out, "cleared")?;
            }
            Command::ExportCsv(file) => export_to(session, ExportFormat::Csv, &file, out)?,
            Command::ExportJson(file) => export_to(session, ExportFormat::Json, &file, out)?,
        }
    }
    Ok(())
}

#[derive(Debug, Clone, Copy)]
enum ExportFormat {
    Csv,
    Json,
}

fn export_to(
    session: &Session,
    format: ExportFormat,
    file: &Path,
    out: &mut impl Write,
) -> anyhow::Result<()> {
    let Some(result) = session.result() else {
        writeln!(out, "nothing to export")?;
        return Ok(());
    };
    let written = match format {
        ExportFormat::Csv => std::fs::File::create(file)
            .with_context(|| format!("creating {}", file.display()))
            .and_then(|f| export::write_csv(result, f).map_err(Into::into)),
        ExportFormat::Json => export::to_json(result)
            .map_err(anyhow::Error::from)
            .and_then(|json| {
                std::fs::write(file, json).with_context(|| format!("writing {}", file.display()))
            }),
    };
    match written {
        Ok(()) => writeln!(out, "wrote {}", file.display())?,
        Err(e) => writeln!(out, "export failed: {e:#}")?,
    }
    Ok(())
}

fn refresh(session: &mut Session, out: &mut impl Write) -> anyhow::Result<()> {
    if let Err(e) = session.request_refresh() {
        writeln!(out, "refresh failed: {e}")?;
        return Ok(());
    }
    wait_and_render(session, out)
}

fn navigate(session: &mut Session, action: NavAction, out: &mut impl Write) -> anyhow::Result<()> {
    match session.navigate(action) {
        Ok(NavOutcome::Moved(_)) => wait_and_render(session, out),
        Ok(NavOutcome::Stayed(path)) => {
            writeln!(out, "already at {}", path.display())?;
            Ok(())
        }
        Ok(NavOutcome::AtTop(_)) => {
            writeln!(out, "no previous directory")?;
            Ok(())
        }
        Err(e) => {
            writeln!(out, "{e}")?;
            Ok(())
        }
    }
}

fn wait_and_render(session: &mut Session, out: &mut impl Write) -> anyhow::Result<()> {
    while !session.wait_until_idle(Duration::from_millis(500)) {
        writeln!(
            out,
            "  scanning... {} dirs, {} files, {}",
            session.scan_dirs_visited,
            session.scan_files_counted,
            format_in_unit(session.scan_bytes_counted, session.unit())
        )?;
    }
    render(session, out)
}

fn render(session: &Session, out: &mut impl Write) -> anyhow::Result<()> {
    let Some(result) = session.result() else {
        writeln!(out, "(no result)")?;
        return Ok(());
    };
    let unit = result.unit;

    writeln!(out)?;
    writeln!(out, "{}", result.scanned_path.display())?;
    if let Some(volume) = &result.volume {
        writeln!(out, "  volume: {}", volume.summary(unit))?;
    }
    if let Some(failure) = &result.failure {
        writeln!(out, "  cannot open directory: {failure}")?;
    }

    for (i, entry) in result.entries.iter().enumerate() {
        let marker = if entry.accessible { "" } else { "  [restricted]" };
        writeln!(
            out,
            "  {:>3}. {:>12}  {}{}",
            i + 1,
            format_in_unit(entry.size_bytes, unit),
            entry.name,
            marker
        )?;
    }
    if result.entries.is_empty() && result.failure.is_none() {
        if result.hidden_count > 0 {
            writeln!(out, "  (no directories above the display threshold)")?;
        } else {
            writeln!(out, "  (no subdirectories)")?;
        }
    }

    write!(
        out,
        "  {} shown, {} files here, {} hidden, {} errors, {:.2?}",
        format_in_unit(result.visible_bytes(), unit),
        result.file_count,
        result.hidden_count,
        result.error_count,
        result.duration
    )?;
    if result.depth_limit_hits > 0 {
        write!(out, ", {} subtrees beyond depth limit", result.depth_limit_hits)?;
    }
    writeln!(out)?;
    Ok(())
}
