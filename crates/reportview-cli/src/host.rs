// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Context, Result, anyhow, bail};
use std::io::Write;
use std::process::{Command, Stdio};

/// A host program fed through stdin, parsed from a whitespace separated
/// command line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostCommand {
    pub program: String,
    pub args: Vec<String>,
}

impl HostCommand {
    pub fn parse(command_line: &str) -> Result<Self> {
        let mut parts = command_line.split_whitespace().map(str::to_owned);
        let program = parts
            .next()
            .ok_or_else(|| anyhow!("host command is empty"))?;
        Ok(Self {
            program,
            args: parts.collect(),
        })
    }

    pub fn display(&self) -> String {
        if self.args.is_empty() {
            return self.program.clone();
        }
        format!("{} {}", self.program, self.args.join(" "))
    }

    pub fn run_with_input(&self, input: &str) -> Result<()> {
        let mut child = Command::new(&self.program)
            .args(&self.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .with_context(|| format!("start `{}`", self.display()))?;

        // stdin must be closed before waiting or the helper never sees EOF.
        let written = match child.stdin.take() {
            Some(mut stdin) => stdin.write_all(input.as_bytes()),
            None => Ok(()),
        };

        let status = child
            .wait()
            .with_context(|| format!("wait for `{}`", self.display()))?;
        if !status.success() {
            bail!("`{}` exited with {status}", self.display());
        }
        written.with_context(|| format!("write to `{}`", self.display()))
    }
}

/// Where copied report text goes. The system clipboard is opened on first
/// use and held for as long as this value lives.
pub enum Clipboard {
    System(Option<arboard::Clipboard>),
    Command(HostCommand),
}

impl Clipboard {
    pub fn from_config(command_line: Option<&str>) -> Result<Self> {
        match command_line {
            Some(command_line) => Ok(Self::Command(
                HostCommand::parse(command_line).context("invalid [host].clipboard_command")?,
            )),
            None => Ok(Self::System(None)),
        }
    }

    pub fn describe(&self) -> String {
        match self {
            Self::System(_) => "system clipboard".to_owned(),
            Self::Command(command) => format!("`{}`", command.display()),
        }
    }

    pub fn set_text(&mut self, text: &str) -> Result<()> {
        match self {
            Self::Command(command) => command.run_with_input(text),
            Self::System(inner) => {
                if inner.is_none() {
                    *inner = Some(arboard::Clipboard::new().map_err(|error| {
                        anyhow!(
                            "open system clipboard: {error} -- set [host].clipboard_command to a helper such as wl-copy"
                        )
                    })?);
                }
                let Some(clipboard) = inner.as_mut() else {
                    return Err(anyhow!("system clipboard unavailable"));
                };
                clipboard
                    .set_text(text)
                    .map_err(|error| anyhow!("write system clipboard: {error}"))
            }
        }
    }
}

pub fn print_document(title: &str, content: &str) -> String {
    format!("{title}\n\n{content}")
}

#[cfg(test)]
mod tests {
    use super::{Clipboard, HostCommand, print_document};
    use anyhow::Result;

    #[test]
    fn parse_splits_program_and_args() -> Result<()> {
        let command = HostCommand::parse("  xclip   -selection clipboard ")?;
        assert_eq!(command.program, "xclip");
        assert_eq!(command.args, vec!["-selection", "clipboard"]);
        assert_eq!(command.display(), "xclip -selection clipboard");
        Ok(())
    }

    #[test]
    fn parse_rejects_blank_command() {
        let error = HostCommand::parse("   ").expect_err("blank command should fail");
        assert!(error.to_string().contains("empty"));
    }

    #[test]
    fn clipboard_prefers_configured_command() -> Result<()> {
        let configured = Clipboard::from_config(Some("xclip -selection clipboard"))?;
        assert!(matches!(&configured, Clipboard::Command(command) if command.program == "xclip"));
        assert_eq!(configured.describe(), "`xclip -selection clipboard`");

        let system = Clipboard::from_config(None)?;
        assert!(matches!(system, Clipboard::System(None)));
        assert_eq!(system.describe(), "system clipboard");
        Ok(())
    }

    #[cfg(unix)]
    #[test]
    fn command_clipboard_reports_helper_failure() -> Result<()> {
        let mut clipboard = Clipboard::from_config(Some("false"))?;
        let error = clipboard
            .set_text("Score: 9/10")
            .expect_err("failing helper should fail the copy");
        assert!(error.to_string().contains("`false` exited"));

        let mut clipboard = Clipboard::from_config(Some("cat"))?;
        clipboard.set_text("Score: 9/10")
    }

    #[test]
    fn print_document_prefixes_title() {
        assert_eq!(
            print_document("Encounter 1", "Score: 9/10"),
            "Encounter 1\n\nScore: 9/10"
        );
    }

    #[cfg(unix)]
    #[test]
    fn run_with_input_succeeds_for_cat() -> Result<()> {
        HostCommand::parse("cat")?.run_with_input("hello")
    }

    #[cfg(unix)]
    #[test]
    fn run_with_input_reports_exit_status() -> Result<()> {
        let error = HostCommand::parse("false")?
            .run_with_input("ignored")
            .expect_err("false should fail");
        assert!(error.to_string().contains("`false` exited"));
        Ok(())
    }

    #[test]
    fn run_with_input_reports_missing_program() -> Result<()> {
        let error = HostCommand::parse("reportview-no-such-helper --flag")?
            .run_with_input("text")
            .expect_err("missing program should fail");
        assert!(
            error
                .to_string()
                .contains("start `reportview-no-such-helper --flag`")
        );
        Ok(())
    }
}
