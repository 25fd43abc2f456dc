use std::io;
use std::process::ExitCode;

use mtplates::display::RULE_WIDTH;
use mtplates::repl::{self, LineReader, PlainReader};
use mtplates::{CountyTable, LoadError, DEFAULT_DATA_FILE};
use rustyline::DefaultEditor;
use tracing::Level;

fn main() -> ExitCode {
    // Logs go to stderr so they stay out of the interactive session.
    tracing_subscriber::fmt()
        .with_writer(io::stderr)
        .with_max_level(Level::WARN)
        .init();

    println!("\n{:=<1$}", "", RULE_WIDTH);
    println!("Montana License Plate County Lookup System");
    println!("{:=<1$}\n", "", RULE_WIDTH);

    let table = match CountyTable::from_path(DEFAULT_DATA_FILE) {
        Ok(table) => table,
        Err(err) => {
            eprintln!("Error: {err}");
            if let LoadError::NotFound { .. } = err {
                eprintln!("Please ensure the {DEFAULT_DATA_FILE} file is in the current directory.");
            }
            return ExitCode::FAILURE;
        }
    };
    println!("Successfully loaded {} counties!", table.len());

    let result = match DefaultEditor::new() {
        Ok(mut editor) => session(&table, &mut editor),
        Err(err) => {
            tracing::warn!("Line editing unavailable, reading plain stdin: {err}");
            let mut reader = PlainReader::new(io::stdin().lock(), io::stdout());
            session(&table, &mut reader)
        }
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("Error: console I/O failed: {err}");
            ExitCode::FAILURE
        }
    }
}

fn session<R: LineReader>(table: &CountyTable, input: &mut R) -> io::Result<()> {
    let mut out = io::stdout();
    let Some(preference) = repl::select_preference(input, &mut out)? else {
        return repl::farewell(&mut out);
    };
    repl::run(table, preference, input, &mut out)?;
    Ok(())
}
