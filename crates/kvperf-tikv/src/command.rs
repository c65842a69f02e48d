//! Command dispatch: `set`, `get`, `delete` and `scan`.
//!
//! Each command runs on either the raw client or a fresh transaction,
//! depending on the `raw` option. Transactions are always rolled back
//! after the operation; once committed, that rollback fails and is ignored.

use std::io::Write;

use tracing::{debug, trace};

use kvperf_core::{KvError, KvResult, Options, RawKvClient, Transaction, TxnKvStore};

use crate::raw::RawClient;

/// Benchmark commands
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    /// `set <key> <value>`
    Set,
    /// `get <key>`
    Get,
    /// `delete <key>`
    Delete,
    /// `scan <start-key>`
    Scan,
}

impl Command {
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "set" => Some(Command::Set),
            "get" => Some(Command::Get),
            "delete" => Some(Command::Delete),
            "scan" => Some(Command::Scan),
            _ => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Command::Set => "set",
            Command::Get => "get",
            Command::Delete => "delete",
            Command::Scan => "scan",
        }
    }

    /// Minimum number of arguments after the command word.
    pub fn arity(self) -> usize {
        match self {
            Command::Set => 2,
            Command::Get | Command::Delete | Command::Scan => 1,
        }
    }
}

/// Open handles to both store paths.
pub struct Connection<R: RawKvClient, T: TxnKvStore> {
    pub raw: RawClient<R>,
    pub txn: T,
}

/// Everything one command invocation needs.
pub struct Context<'a, R: RawKvClient, T: TxnKvStore> {
    pub command: Command,
    pub args: &'a [String],
    pub out: &'a mut dyn Write,
    pub raw: bool,
    pub limit: usize,
    pub conn: &'a Connection<R, T>,
}

/// Validate `args` (command word first) and run the command.
///
/// Usage errors are returned before the store is touched.
pub fn call<R: RawKvClient, T: TxnKvStore>(
    conn: &Connection<R, T>,
    options: &Options,
    out: &mut dyn Write,
    args: &[String],
) -> KvResult<()> {
    let (name, args) = args.split_first().ok_or(KvError::MissingCommand)?;
    let command = Command::from_name(name)
        .ok_or_else(|| KvError::UnknownCommand { name: name.clone() })?;

    if args.len() < command.arity() {
        return Err(KvError::WrongArity {
            command: command.name(),
            expected: command.arity(),
            got: args.len(),
        });
    }

    debug!(command = command.name(), raw = options.raw, "dispatch");

    let mut ctx = Context {
        command,
        args,
        out,
        raw: options.raw,
        limit: options.limit,
        conn,
    };
    run(&mut ctx)
}

fn run<R: RawKvClient, T: TxnKvStore>(ctx: &mut Context<'_, R, T>) -> KvResult<()> {
    match ctx.command {
        Command::Set => set(ctx),
        Command::Get => get(ctx),
        Command::Delete => delete(ctx),
        Command::Scan => scan(ctx),
    }
}

/// Run `op` in a fresh transaction, then roll back unconditionally.
fn with_txn<T: TxnKvStore, V>(
    store: &T,
    op: impl FnOnce(&mut T::Txn) -> KvResult<V>,
) -> KvResult<V> {
    let mut txn = store.begin()?;
    let result = op(&mut txn);
    if let Err(e) = txn.rollback() {
        trace!(error = %e, "rollback skipped");
    }
    result
}

fn write_value(out: &mut dyn Write, value: &[u8]) -> KvResult<()> {
    writeln!(out, "{}", String::from_utf8_lossy(value))?;
    Ok(())
}

fn write_pair(out: &mut dyn Write, key: &[u8], value: &[u8]) -> KvResult<()> {
    writeln!(out, "{} {}", String::from_utf8_lossy(key), String::from_utf8_lossy(value))?;
    Ok(())
}

fn set<R: RawKvClient, T: TxnKvStore>(ctx: &mut Context<'_, R, T>) -> KvResult<()> {
    let key = ctx.args[0].as_bytes();
    let value = ctx.args[1].as_bytes();
    if ctx.raw {
        return ctx.conn.raw.put(key, value);
    }
    with_txn(&ctx.conn.txn, |txn| {
        txn.set(key, value)?;
        txn.commit()
    })
}

fn get<R: RawKvClient, T: TxnKvStore>(ctx: &mut Context<'_, R, T>) -> KvResult<()> {
    let key = ctx.args[0].as_bytes();
    let conn = ctx.conn;
    let out = &mut *ctx.out;
    if ctx.raw {
        // The raw path reports a missing key as an empty line.
        let value = conn.raw.get(key)?.unwrap_or_default();
        return write_value(out, &value);
    }
    with_txn(&conn.txn, |txn| {
        let value = txn.get(key)?;
        write_value(out, &value)
    })
}

fn delete<R: RawKvClient, T: TxnKvStore>(ctx: &mut Context<'_, R, T>) -> KvResult<()> {
    let key = ctx.args[0].as_bytes();
    if ctx.raw {
        return ctx.conn.raw.delete(key);
    }
    with_txn(&ctx.conn.txn, |txn| {
        txn.delete(key)?;
        txn.commit()
    })
}

fn scan<R: RawKvClient, T: TxnKvStore>(ctx: &mut Context<'_, R, T>) -> KvResult<()> {
    let key = ctx.args[0].as_bytes();
    let conn = ctx.conn;
    let out = &mut *ctx.out;
    if ctx.raw {
        for (k, v) in conn.raw.scan(key, ctx.limit)? {
            write_pair(out, &k, &v)?;
        }
        return Ok(());
    }

    let limit = if ctx.limit == 0 { usize::MAX } else { ctx.limit };
    with_txn(&conn.txn, |txn| {
        for pair in txn.iter(key)?.take(limit) {
            let (k, v) = pair?;
            write_pair(out, &k, &v)?;
        }
        Ok(())
    })
}
