//! Line-oriented command shell over a [`Ledger`]
//!
//! Reads one command per line, prompts for the fields it needs, and prints
//! the result. Input and output are generic so the shell runs the same over a
//! terminal or an in-memory script.

use crate::block::Block;
use crate::blockchain::Ledger;
use crate::config::MinerConfig;
use crate::error::{ChainError, Result};
use crate::transaction::Transaction;
use colored::Colorize;
use comfy_table::{presets::UTF8_FULL, ContentArrangement, Table};
use indicatif::{ProgressBar, ProgressStyle};
use std::io::{BufRead, Write};
use std::str::FromStr;
use std::time::{Duration, Instant};
use tracing::debug;

pub const INSTRUCTIONS: &str = "Valid commands:
  mine: discovers the nonce for a given transaction
  append: appends a new block onto the end of the chain
  remove: removes the last block from the end of the chain
  check: checks that the block chain is valid
  users: prints a list of users
  balance: finds a user's balance
  transactions: prints out the chain of transactions
  blocks: prints out the chain of blocks (for debugging only)
  export: prints the chain as JSON
  help: prints this list of commands
  quit: quits the program";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Mine,
    Append,
    Remove,
    Check,
    Users,
    Balance,
    Transactions,
    Blocks,
    Export,
    Help,
    Quit,
}

impl FromStr for Command {
    type Err = ChainError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "mine" => Ok(Command::Mine),
            "append" => Ok(Command::Append),
            "remove" => Ok(Command::Remove),
            "check" => Ok(Command::Check),
            "users" => Ok(Command::Users),
            "balance" => Ok(Command::Balance),
            "transactions" => Ok(Command::Transactions),
            "blocks" => Ok(Command::Blocks),
            "export" => Ok(Command::Export),
            "help" => Ok(Command::Help),
            "quit" => Ok(Command::Quit),
            other => Err(ChainError::Parse(format!("invalid command: '{}'", other))),
        }
    }
}

/// Whether the shell keeps reading after a command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Flow {
    Continue,
    Stop,
}

pub struct Shell<R, W> {
    ledger: Ledger,
    input: R,
    output: W,
    miner: MinerConfig,
    color: bool,
    progress: bool,
}

impl<R: BufRead, W: Write> Shell<R, W> {
    pub fn new(ledger: Ledger, input: R, output: W) -> Self {
        Shell {
            ledger,
            input,
            output,
            miner: MinerConfig::default(),
            color: false,
            progress: false,
        }
    }

    pub fn with_miner(mut self, miner: MinerConfig) -> Self {
        self.miner = miner;
        self
    }

    pub fn with_color(mut self, color: bool) -> Self {
        self.color = color;
        self
    }

    /// Show a spinner on stderr while mining.
    pub fn with_progress(mut self, progress: bool) -> Self {
        self.progress = progress;
        self
    }

    pub fn ledger(&self) -> &Ledger {
        &self.ledger
    }

    pub fn into_ledger(self) -> Ledger {
        self.ledger
    }

    /// Runs until `quit` or end of input.
    pub fn run(&mut self) -> Result<()> {
        writeln!(self.output, "{}", INSTRUCTIONS)?;

        loop {
            write!(self.output, "\nCommand: ")?;
            self.output.flush()?;
            let Some(line) = self.next_line()? else {
                break;
            };

            let flow = match line.parse::<Command>() {
                Ok(Command::Quit) => Flow::Stop,
                Ok(command) => self.dispatch(command)?,
                Err(_) => {
                    writeln!(self.output, "invalid command: '{}'. Try again.", line.trim())?;
                    Flow::Continue
                }
            };
            if flow == Flow::Stop {
                break;
            }
        }

        writeln!(self.output, "\nGoodbye")?;
        Ok(())
    }

    fn dispatch(&mut self, command: Command) -> Result<Flow> {
        debug!(?command, "dispatching");
        match command {
            Command::Mine => self.mine(),
            Command::Append => self.append(),
            Command::Remove => {
                if self.ledger.remove_last() {
                    writeln!(self.output, "Removed last element")?;
                } else {
                    let msg = self.warning("Cannot remove the genesis block");
                    writeln!(self.output, "{}", msg)?;
                }
                Ok(Flow::Continue)
            }
            Command::Check => {
                match self.ledger.check() {
                    Ok(()) => {
                        let msg = self.success("The blockchain checks out.");
                        writeln!(self.output, "{}", msg)?;
                    }
                    Err(e) => {
                        let msg = self.failure(&e.to_string());
                        writeln!(self.output, "{}", msg)?;
                    }
                }
                Ok(Flow::Continue)
            }
            Command::Users => {
                for user in self.ledger.users() {
                    writeln!(self.output, "{}", user)?;
                }
                Ok(Flow::Continue)
            }
            Command::Balance => {
                let Some(user) = self.prompt("User: ")? else {
                    return Ok(Flow::Stop);
                };
                let balance = self.ledger.balance(&user);
                writeln!(self.output, "{}'s balance is {}", user, balance)?;
                Ok(Flow::Continue)
            }
            Command::Transactions => {
                for tx in self.ledger.transactions().skip(1) {
                    writeln!(self.output, "{}", tx)?;
                }
                Ok(Flow::Continue)
            }
            Command::Blocks => {
                let table = self.block_table();
                writeln!(self.output, "{}", table)?;
                Ok(Flow::Continue)
            }
            Command::Export => {
                let json = serde_json::to_string_pretty(&self.ledger.to_blocks())?;
                writeln!(self.output, "{}", json)?;
                Ok(Flow::Continue)
            }
            Command::Help => {
                writeln!(self.output, "{}", INSTRUCTIONS)?;
                Ok(Flow::Continue)
            }
            Command::Quit => Ok(Flow::Stop),
        }
    }

    fn mine(&mut self) -> Result<Flow> {
        let Some(tx) = self.read_transaction()? else {
            return Ok(Flow::Stop);
        };
        let control = self.miner.control()?;

        let spinner = self.spinner(&tx);
        let started = Instant::now();
        let result = self.ledger.mine_with(tx, &control);
        if let Some(spinner) = spinner {
            spinner.finish_and_clear();
        }

        match result {
            Ok(block) => {
                debug!(nonce = block.nonce(), elapsed = ?started.elapsed(), "mined candidate");
                writeln!(self.output, "\nUse nonce: {}", block.nonce())?;
            }
            Err(e @ ChainError::MiningAborted { .. }) => {
                let msg = self.failure(&e.to_string());
                writeln!(self.output, "{}", msg)?;
            }
            Err(e) => return Err(e),
        }
        Ok(Flow::Continue)
    }

    fn append(&mut self) -> Result<Flow> {
        let Some(tx) = self.read_transaction()? else {
            return Ok(Flow::Stop);
        };
        let Some(nonce) = self.prompt_number::<u64>("Nonce: ")? else {
            return Ok(Flow::Stop);
        };

        let block = Block::accept(
            self.ledger.next_index()?,
            tx,
            self.ledger.tail_hash().clone(),
            nonce,
        );
        let rendered = block.to_string();
        match self.ledger.append(block) {
            Ok(()) => writeln!(self.output, "Appended: {}", rendered)?,
            Err(e) => {
                let msg = self.failure(&format!("Could not append: {}", e));
                writeln!(self.output, "{}", msg)?;
            }
        }
        Ok(Flow::Continue)
    }

    fn block_table(&self) -> Table {
        let mut table = Table::new();
        table
            .load_preset(UTF8_FULL)
            .set_content_arrangement(ContentArrangement::Disabled)
            .set_header(vec!["#", "Transaction", "Nonce", "Previous hash", "Hash"]);
        for block in self.ledger.blocks() {
            table.add_row(vec![
                block.index().to_string(),
                block.transaction().to_string(),
                block.nonce().to_string(),
                block.previous_hash().to_hex(),
                block.hash().to_hex(),
            ]);
        }
        table
    }

    fn spinner(&self, tx: &Transaction) -> Option<ProgressBar> {
        if !self.progress {
            return None;
        }
        let spinner = ProgressBar::new_spinner();
        if let Ok(style) = ProgressStyle::with_template("{spinner} {msg} [{elapsed}]") {
            spinner.set_style(style);
        }
        spinner.set_message(format!("Mining {}", tx));
        spinner.enable_steady_tick(Duration::from_millis(120));
        Some(spinner)
    }

    fn read_transaction(&mut self) -> Result<Option<Transaction>> {
        let Some(source) = self.prompt("Source (return for deposit): ")? else {
            return Ok(None);
        };
        let Some(target) = self.prompt("Target: ")? else {
            return Ok(None);
        };
        let Some(amount) = self.prompt_number::<i32>("Amount: ")? else {
            return Ok(None);
        };
        Ok(Some(Transaction::new(source, target, amount)))
    }

    fn prompt(&mut self, label: &str) -> Result<Option<String>> {
        write!(self.output, "{}", label)?;
        self.output.flush()?;
        Ok(self.next_line()?.map(|line| line.trim().to_string()))
    }

    /// Re-prompts until the answer parses. `None` at end of input.
    fn prompt_number<T: FromStr>(&mut self, label: &str) -> Result<Option<T>> {
        loop {
            let Some(answer) = self.prompt(label)? else {
                return Ok(None);
            };
            match answer.parse::<T>() {
                Ok(value) => return Ok(Some(value)),
                Err(_) => writeln!(self.output, "'{}' is not a valid number.", answer)?,
            }
        }
    }

    fn next_line(&mut self) -> Result<Option<String>> {
        let mut line = String::new();
        if self.input.read_line(&mut line)? == 0 {
            return Ok(None);
        }
        Ok(Some(line.trim_end_matches(&['\r', '\n'][..]).to_string()))
    }

    fn success(&self, msg: &str) -> String {
        if self.color {
            msg.green().to_string()
        } else {
            msg.to_string()
        }
    }

    fn warning(&self, msg: &str) -> String {
        if self.color {
            msg.yellow().to_string()
        } else {
            msg.to_string()
        }
    }

    fn failure(&self, msg: &str) -> String {
        if self.color {
            msg.red().to_string()
        } else {
            msg.to_string()
        }
    }
}
