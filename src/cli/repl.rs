//! The plain-stdio prompt loop: `db > `, one line in, one reply out.

use std::io::{self, BufRead, Write};

use tracing::{error, info};

use crate::cli::parser::{self, Command, MetaCommand};
use crate::errors::Error;
use crate::storage::Engine;

const PROMPT: &str = "db > ";

/// `Io`/`Storage` errors are fatal per spec §7 (corrupt file, layout
/// violation, I/O failure): a diagnostic and a non-zero exit, not a
/// recoverable per-command message. `Parse`/`Db` errors are printed and the
/// loop keeps reading commands.
fn fatal_exit_code(e: &Error) -> Option<i32> {
    match e {
        Error::Io(_) | Error::Storage(_) => Some(1),
        Error::Parse(_) | Error::Db(_) => None,
    }
}

/// Runs the REPL against an already-open engine until `.exit` or EOF.
/// Returns the process exit code.
pub fn run(engine: &mut Engine) -> i32 {
    let stdin = io::stdin();
    let mut lines = stdin.lock().lines();

    loop {
        print!("{}", PROMPT);
        if io::stdout().flush().is_err() {
            return 1;
        }

        let line = match lines.next() {
            Some(Ok(line)) => line,
            Some(Err(e)) => {
                error!("failed to read stdin: {}", e);
                return 1;
            }
            None => return 0,
        };
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        match parser::parse(line) {
            Ok(Command::Meta(MetaCommand::Exit)) => {
                return match engine.close() {
                    Ok(()) => 0,
                    Err(e) => {
                        println!("Error: {}", e);
                        1
                    }
                };
            }
            Ok(Command::Meta(MetaCommand::Btree)) => match engine.describe_tree() {
                Ok(lines) => {
                    for l in lines {
                        println!("{}", l);
                    }
                    println!("Executed.");
                }
                Err(e) => {
                    println!("Error: {}", e);
                    if let Some(code) = fatal_exit_code(&e) {
                        error!("fatal error on .btree: {}", e);
                        return code;
                    }
                }
            },
            Ok(Command::Meta(MetaCommand::Constants)) => {
                print_constants(engine);
                println!("Executed.");
            }
            Ok(Command::Meta(MetaCommand::Unrecognized)) => {
                println!("Unrecognized command '{}'", line);
            }
            Ok(Command::Insert(record)) => match engine.execute_insert(&record) {
                Ok(()) => {
                    info!(id = record.id, "inserted row");
                    println!("Executed.");
                }
                Err(e) => {
                    println!("Error: {}", e);
                    if let Some(code) = fatal_exit_code(&e) {
                        error!("fatal error on insert: {}", e);
                        return code;
                    }
                }
            },
            Ok(Command::Select) => match engine.execute_select() {
                Ok(rows) => {
                    for row in rows {
                        println!("({}, {}, {})", row.id, row.username, row.email);
                    }
                    println!("Executed.");
                }
                Err(e) => {
                    println!("Error: {}", e);
                    if let Some(code) = fatal_exit_code(&e) {
                        error!("fatal error on select: {}", e);
                        return code;
                    }
                }
            },
            Err(e) => println!("{}", e),
        }
    }
}

fn print_constants(engine: &Engine) {
    let c = engine.constants();
    println!("Constants:");
    println!("ROW_SIZE: {}", c.row_size);
    println!("COMMON_NODE_HEADER_SIZE: {}", c.common_node_header_size);
    println!("LEAF_NODE_HEADER_SIZE: {}", c.leaf_node_header_size);
    println!("LEAF_NODE_CELL_SIZE: {}", c.leaf_node_cell_size);
    println!(
        "LEAF_NODE_SPACE_FOR_CELLS: {}",
        c.leaf_node_space_for_cells
    );
    println!("LEAF_NODE_MAX_CELLS: {}", c.leaf_node_max_cells);
    println!(
        "INTERNAL_NODE_HEADER_SIZE: {}",
        c.internal_node_header_size
    );
    println!("INTERNAL_NODE_CELL_SIZE: {}", c.internal_node_cell_size);
}
