//! Positional command parsing and per-command output formatting.

use std::io::Write;
use std::path::PathBuf;

use crate::client::RaftStoreClient;
use crate::config::UploadMode;
use crate::error::ClientError;
use crate::models::{Command, GetType, RangeQuery, Reply, Result};
use crate::upload;

pub const USAGE: &str = "\
raftstore usage:
    raft get  key [type]
    raft set  key value
    raft setp key file   (--upload-mode compact)
    raft setp file       (--upload-mode content-addressed)
    raft rm   key
    raft rng  [start] [limit] [end]
    raft se   key [limit]
    raft stat [client]
";

/// Positional argument `index`; empty strings count as missing.
fn arg(args: &[String], index: usize) -> Option<String> {
    args.get(index).filter(|a| !a.is_empty()).cloned()
}

fn required(args: &[String], index: usize, name: &str, cmd: &str) -> Result<String> {
    arg(args, index).ok_or_else(|| ClientError::usage(format!("{}: missing {}", cmd, name)))
}

fn check_arity(args: &[String], max: usize, cmd: &str) -> Result<()> {
    if args.len() > max {
        return Err(ClientError::usage(format!(
            "{}: expected at most {} argument(s), got {}",
            cmd,
            max,
            args.len()
        )));
    }
    Ok(())
}

fn limit(args: &[String], index: usize) -> Result<Option<u64>> {
    match arg(args, index) {
        Some(text) => text
            .trim()
            .parse::<u64>()
            .map(Some)
            .map_err(|_| ClientError::usage(format!("limit must be an integer, got '{}'", text))),
        None => Ok(None),
    }
}

/// Maps `<cmd> [arg1] [arg2] [arg3]` to a `Command`. Nothing is sent when
/// this fails.
pub fn parse_command(name: &str, args: &[String], upload_mode: UploadMode) -> Result<Command> {
    let command = match name {
        "get" => {
            check_arity(args, 2, name)?;
            let key = required(args, 0, "key", name)?;
            let get_type = match arg(args, 1) {
                Some(t) => Some(GetType::parse(&t).ok_or_else(|| {
                    ClientError::usage(format!("get: unknown type '{}'", t))
                })?),
                None => None,
            };
            Command::Get { key, get_type }
        }
        "set" => {
            check_arity(args, 2, name)?;
            Command::Set {
                key: required(args, 0, "key", name)?,
                value: required(args, 1, "value", name)?,
            }
        }
        "setp" => match upload_mode {
            UploadMode::Compact => {
                check_arity(args, 2, name)?;
                Command::SetFile {
                    key: required(args, 0, "key", name)?,
                    path: PathBuf::from(required(args, 1, "file", name)?),
                }
            }
            UploadMode::ContentAddressed => {
                check_arity(args, 1, name)?;
                Command::SetContent {
                    path: PathBuf::from(required(args, 0, "file", name)?),
                }
            }
        },
        "rm" => {
            check_arity(args, 1, name)?;
            Command::Remove {
                key: required(args, 0, "key", name)?,
            }
        }
        "rng" => {
            check_arity(args, 3, name)?;
            Command::Range(RangeQuery {
                start: arg(args, 0),
                limit: limit(args, 1)?,
                end: arg(args, 2),
            })
        }
        "se" => {
            check_arity(args, 2, name)?;
            Command::Search {
                term: required(args, 0, "key", name)?,
                limit: limit(args, 1)?,
            }
        }
        "stat" => {
            check_arity(args, 1, name)?;
            Command::Stat {
                client: arg(args, 0),
            }
        }
        _ => return Err(ClientError::usage(format!("Unknown cmd: {}", name))),
    };
    Ok(command)
}

fn write_envelope(out: &mut dyn Write, reply: &Reply) -> Result<()> {
    writeln!(out, "{}", reply.raw_text())?;
    Ok(())
}

/// Prints the value of a successful reply, or the whole envelope.
fn write_value(out: &mut dyn Write, reply: &Reply) -> Result<()> {
    match reply.value() {
        Some(value) => writeln!(out, "{}", value)?,
        None => write_envelope(out, reply)?,
    }
    Ok(())
}

/// Prints each element of a list reply on its own line, or the whole envelope.
fn write_items(out: &mut dyn Write, reply: &Reply) -> Result<()> {
    match reply.items() {
        Some(items) => {
            for item in items {
                match item {
                    serde_json::Value::String(s) => writeln!(out, "{}", s)?,
                    other => writeln!(out, "{}", other)?,
                }
            }
        }
        None => write_envelope(out, reply)?,
    }
    Ok(())
}

/// Runs one command and writes its result to `out`.
pub fn execute(client: &RaftStoreClient, command: &Command, out: &mut dyn Write) -> Result<()> {
    log::info!("Executing {}", command);

    match command {
        Command::Get { key, get_type: None } => {
            let reply = client.get(key, None)?;
            write_value(out, &reply)?;
        }
        Command::Get { key, get_type: Some(GetType::Compact) } => {
            let reply = client.get(key, Some(GetType::Compact))?;
            match reply.value() {
                Some(value) => {
                    let data = upload::decode_compact(value)?;
                    out.write_all(&data)?;
                    writeln!(out)?;
                }
                None => write_envelope(out, &reply)?,
            }
        }
        Command::Get { key, get_type: Some(get_type) } => {
            let data = client.fetch(key, *get_type)?;
            out.write_all(&data)?;
        }
        Command::Set { key, value } => {
            let reply = client.set(key, value)?;
            write_envelope(out, &reply)?;
        }
        Command::SetFile { key, path } => {
            let payload = upload::compact_upload(key, path)?;
            let reply = client.upload(&payload)?;
            write_envelope(out, &reply)?;
        }
        Command::SetContent { path } => {
            let payload = upload::content_addressed_upload(path)?;
            let reply = client.upload(&payload)?;
            write_envelope(out, &reply)?;
            if reply.is_ok() {
                if let Some(echoed) = reply.envelope.as_ref().and_then(|e| e.md5sum.as_deref()) {
                    log::debug!("Server verified md5sum {}", echoed);
                }
                writeln!(out, "key: {}", payload.key)?;
                writeln!(out, "url: {}", client.retrieval_url(&payload.key)?)?;
            }
        }
        Command::Remove { key } => {
            let reply = client.remove(key)?;
            write_envelope(out, &reply)?;
        }
        Command::Range(range) => {
            let reply = client.range(range)?;
            write_items(out, &reply)?;
        }
        Command::Search { term, limit } => {
            let reply = client.search(term, *limit)?;
            write_items(out, &reply)?;
        }
        Command::Stat { client: name } => {
            let reply = client.stat(name.as_deref())?;
            write_value(out, &reply)?;
        }
    }

    out.flush()?;
    Ok(())
}
