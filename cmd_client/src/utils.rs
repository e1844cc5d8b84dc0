use std::io::{self, BufRead, Write};

use anyhow::Error;
use clap::Parser;

use crate::cmd_parser::CmdParser;

/// Returns `None` once stdin is closed.
pub fn read_command_line() -> Result<Option<CmdParser>, Error> {
    write_line_begining()?;
    read_command(io::stdin().lock())
}

fn read_command(mut input: impl BufRead) -> Result<Option<CmdParser>, Error> {
    let mut line = String::new();
    if input.read_line(&mut line)? == 0 {
        return Ok(None);
    }
    let argv = shlex::split(line.trim()).ok_or(io::Error::other("Can't split read line!"))?;
    let cmd = CmdParser::try_parse_from(argv.iter())?;
    Ok(Some(cmd))
}

fn write_line_begining() -> Result<(), Error> {
    write!(std::io::stdout(), "$ ")?;
    Ok(std::io::stdout().flush()?)
}
