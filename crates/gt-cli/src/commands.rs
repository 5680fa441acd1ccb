use std::io::Write;

use anyhow::Context;
use chrono::{DateTime, Utc};
use colored::Colorize;
use gt_sdk::{parse_fingerprint, CommitRecord, ObjectContent, Repository};

use crate::cli::*;

pub fn run_command(cli: Cli, out: &mut impl Write) -> anyhow::Result<()> {
    match cli.command {
        Command::Init => cmd_init(&cli, out),
        Command::Commit(ref args) => cmd_commit(&cli, args, out),
        Command::Log(ref args) => cmd_log(&cli, args, out),
        Command::Cat(ref args) => cmd_cat(&cli, args, out),
        Command::Checkout(ref args) => cmd_checkout(&cli, args, out),
    }
}

fn open(cli: &Cli) -> anyhow::Result<Repository> {
    Repository::open(&cli.dir)
        .with_context(|| format!("cannot open repository in {}", cli.dir.display()))
}

fn cmd_init(cli: &Cli, out: &mut impl Write) -> anyhow::Result<()> {
    let repo = Repository::init(&cli.dir)?;
    writeln!(
        out,
        "{} Initialized empty repository in {}",
        "✓".green().bold(),
        repo.paths().meta_dir().display().to_string().bold()
    )?;
    Ok(())
}

fn cmd_commit(cli: &Cli, args: &CommitArgs, out: &mut impl Write) -> anyhow::Result<()> {
    let repo = open(cli)?;
    let outcome = repo.commit(&args.message).context("commit failed")?;

    let record = &outcome.record;
    match cli.format {
        OutputFormat::Json => {
            let mut value = serde_json::to_value(record)?;
            let skipped: Vec<String> = outcome
                .skipped
                .iter()
                .map(|p| p.display().to_string())
                .collect();
            if let Some(fields) = value.as_object_mut() {
                fields.insert("skipped".into(), skipped.into());
            }
            writeln!(out, "{value}")?;
        }
        OutputFormat::Text => {
            for path in &outcome.skipped {
                writeln!(out, "  {} {}", "skipped:".yellow(), path.display())?;
            }
            writeln!(
                out,
                "[{}] {}",
                record.id.short_hex().yellow(),
                record.commit.message
            )?;
        }
    }
    Ok(())
}

fn cmd_log(cli: &Cli, args: &LogArgs, out: &mut impl Write) -> anyhow::Result<()> {
    let repo = open(cli)?;
    let mut history = repo.log()?;
    let limit = args.limit.unwrap_or(usize::MAX);

    let mut shown = 0;
    for entry in history.by_ref().take(limit) {
        match cli.format {
            OutputFormat::Json => writeln!(out, "{}", serde_json::to_string(&entry)?)?,
            OutputFormat::Text => {
                if shown > 0 {
                    writeln!(out)?;
                }
                write_log_entry(&entry, out)?;
            }
        }
        shown += 1;
    }

    if shown == 0 && cli.format == OutputFormat::Text {
        writeln!(out, "No commits yet.")?;
    }
    if let Some(truncation) = history.truncation() {
        eprintln!(
            "{} history ends early: cannot read {} ({})",
            "warning:".yellow().bold(),
            truncation.at,
            truncation.reason
        );
    }
    Ok(())
}

fn write_log_entry(entry: &CommitRecord, out: &mut impl Write) -> std::io::Result<()> {
    writeln!(out, "{} {}", "commit".yellow(), entry.id.to_string().yellow())?;
    if let Some(parent) = entry.commit.parent {
        writeln!(out, "Parent: {}", parent.short_hex().dimmed())?;
    }
    writeln!(out, "Date:   {}", format_timestamp(entry.commit.timestamp))?;
    writeln!(out)?;
    writeln!(out, "    {}", entry.commit.message)
}

fn format_timestamp(timestamp: i64) -> String {
    DateTime::<Utc>::from_timestamp(timestamp, 0)
        .map(|dt| dt.format("%Y-%m-%d %H:%M:%S UTC").to_string())
        .unwrap_or_else(|| timestamp.to_string())
}

fn cmd_cat(cli: &Cli, args: &CatArgs, out: &mut impl Write) -> anyhow::Result<()> {
    let repo = open(cli)?;
    let id = parse_fingerprint(&args.fingerprint)?;

    match repo.cat(&id)? {
        ObjectContent::Blob(blob) => out.write_all(&blob.data)?,
        ObjectContent::Tree(tree) => {
            for entry in &tree.entries {
                writeln!(
                    out,
                    "{} {} {}\t{}",
                    entry.mode,
                    entry.kind(),
                    entry.object_id,
                    entry.name
                )?;
            }
        }
        ObjectContent::Commit(commit) => {
            writeln!(out, "tree {}", commit.tree)?;
            if let Some(parent) = commit.parent {
                writeln!(out, "parent {parent}")?;
            }
            writeln!(out, "timestamp {}", commit.timestamp)?;
            writeln!(out, "message {}", commit.message)?;
        }
    }
    Ok(())
}

fn cmd_checkout(cli: &Cli, args: &CheckoutArgs, out: &mut impl Write) -> anyhow::Result<()> {
    let repo = open(cli)?;
    let id = parse_fingerprint(&args.fingerprint)?;
    let outcome = repo
        .checkout(&id)
        .with_context(|| format!("checkout of {} failed", id.short_hex()))?;

    writeln!(
        out,
        "{} Checked out {} ({} files): {}",
        "✓".green().bold(),
        id.short_hex().yellow(),
        outcome.report.files,
        outcome.record.commit.message
    )?;
    Ok(())
}
