//! Interactive query loop.
//!
//! The loop is a two state machine: [LoopState::Running] carries the active
//! [DisplayPreference], [LoopState::Terminated] ends it. Each input line is
//! parsed into a [Command] and handed to [step], which returns the next state.

use std::io::{self, BufRead, Write};
use std::num::IntErrorKind;

use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;

use crate::display::RULE_WIDTH;
use crate::{CountyTable, DisplayPreference};

const QUERY_PROMPT: &str = "Enter license plate prefix number: ";
const CHOICE_PROMPT: &str = "Enter your choice (1-3) or press Enter for default: ";

/// What a [LineReader] got from the console.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Input {
    /// One line without its line ending
    Line(String),
    /// No more input can arrive
    End,
    /// The user pressed Ctrl-C
    Interrupted,
}

/// Source of console input lines.
pub trait LineReader {
    /// Show `prompt` and read one line.
    fn read_line(&mut self, prompt: &str) -> io::Result<Input>;
}

/// Interactive input with line editing and in-session history.
impl LineReader for DefaultEditor {
    fn read_line(&mut self, prompt: &str) -> io::Result<Input> {
        match self.readline(prompt) {
            Ok(line) => {
                if !line.trim().is_empty() {
                    if let Err(err) = self.add_history_entry(line.as_str()) {
                        tracing::debug!("History entry not recorded: {err}");
                    }
                }
                Ok(Input::Line(line))
            }
            Err(ReadlineError::Interrupted) => Ok(Input::Interrupted),
            Err(ReadlineError::Eof) => Ok(Input::End),
            Err(ReadlineError::Io(err)) => Err(err),
            Err(err) => Err(io::Error::new(io::ErrorKind::Other, err.to_string())),
        }
    }
}

/// Line reader over any buffered input, writing prompts to `prompt_out`.
pub struct PlainReader<R, W> {
    input: R,
    prompt_out: W,
}

impl<R: BufRead, W: Write> PlainReader<R, W> {
    pub fn new(input: R, prompt_out: W) -> Self {
        PlainReader { input, prompt_out }
    }
}

impl<R: BufRead, W: Write> LineReader for PlainReader<R, W> {
    fn read_line(&mut self, prompt: &str) -> io::Result<Input> {
        self.prompt_out.write_all(prompt.as_bytes())?;
        self.prompt_out.flush()?;

        let mut line = String::new();
        if self.input.read_line(&mut line)? == 0 {
            return Ok(Input::End);
        }
        let len = line.trim_end_matches(|c| c == '\r' || c == '\n').len();
        line.truncate(len);
        Ok(Input::Line(line))
    }
}

/// One line of user input, trimmed and lower-cased before matching.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Command {
    Exit,
    /// Pick a new display preference
    Change,
    /// A whole number of any size. `prefix` is `None` when the number
    /// cannot name a table entry.
    Lookup { number: String, prefix: Option<u32> },
    /// Neither a command nor a number
    Invalid(String),
}

impl Command {
    pub fn parse(line: &str) -> Command {
        let input = line.trim().to_lowercase();
        match input.as_str() {
            "exit" => Command::Exit,
            "change" => Command::Change,
            _ => match input.parse::<i64>() {
                Ok(number) => Command::Lookup {
                    number: number.to_string(),
                    prefix: u32::try_from(number).ok(),
                },
                Err(err)
                    if matches!(
                        err.kind(),
                        IntErrorKind::PosOverflow | IntErrorKind::NegOverflow
                    ) =>
                {
                    Command::Lookup {
                        number: input,
                        prefix: None,
                    }
                }
                Err(_) => Command::Invalid(input),
            },
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LoopState {
    Running(DisplayPreference),
    Terminated,
}

/// Ask for a display preference until a valid choice is given.
///
/// End of input counts as choosing the default. Returns `None` when the
/// user interrupts, which ends the session.
pub fn select_preference<R, W>(input: &mut R, out: &mut W) -> io::Result<Option<DisplayPreference>>
where
    R: LineReader,
    W: Write,
{
    writeln!(out, "{}", DisplayPreference::MENU)?;
    loop {
        writeln!(out)?;
        out.flush()?;
        let choice = match input.read_line(CHOICE_PROMPT)? {
            Input::Line(choice) => choice,
            Input::End => return Ok(Some(DisplayPreference::default())),
            Input::Interrupted => return Ok(None),
        };
        if let Some(preference) = DisplayPreference::from_choice(&choice) {
            tracing::debug!(?preference, "Display preference selected.");
            return Ok(Some(preference));
        }
        writeln!(out, "Invalid choice. Please enter 1, 2, 3, or press Enter.")?;
    }
}

pub fn farewell<W: Write>(out: &mut W) -> io::Result<()> {
    writeln!(out, "\nSee ya!")?;
    out.flush()
}

/// Execute one command and return the state the loop moves to.
///
/// `input` is only read by [Command::Change], which runs the preference
/// selector.
pub fn step<R, W>(
    table: &CountyTable,
    preference: DisplayPreference,
    command: Command,
    input: &mut R,
    out: &mut W,
) -> io::Result<LoopState>
where
    R: LineReader,
    W: Write,
{
    match command {
        Command::Exit => {
            farewell(out)?;
            return Ok(LoopState::Terminated);
        }
        Command::Change => {
            let Some(preference) = select_preference(input, out)? else {
                farewell(out)?;
                return Ok(LoopState::Terminated);
            };
            writeln!(out, "\nDisplay preference updated!")?;
            return Ok(LoopState::Running(preference));
        }
        Command::Lookup { number, prefix } => {
            match prefix.and_then(|p| table.lookup(p)) {
                Some(record) => writeln!(out, "\n{}", record.display(preference))?,
                None => {
                    writeln!(out, "\nPrefix {number} not found in database.")?;
                    if let Some(range) = table.prefix_range() {
                        writeln!(
                            out,
                            "   Valid prefixes are {}-{}.",
                            range.start(),
                            range.end()
                        )?;
                    }
                    writeln!(out, "   Please check the license plate number and try again.")?;
                }
            }
        }
        Command::Invalid(text) => {
            writeln!(out, "\nInvalid input: '{text}' is not a valid number.")?;
            writeln!(out, "   Please enter a numeric prefix or 'exit' to quit.")?;
        }
    }
    Ok(LoopState::Running(preference))
}

/// Run queries against `table` until `exit`, end of input or Ctrl-C.
///
/// Returns the preference that was active when the loop ended.
pub fn run<R, W>(
    table: &CountyTable,
    preference: DisplayPreference,
    input: &mut R,
    out: &mut W,
) -> io::Result<DisplayPreference>
where
    R: LineReader,
    W: Write,
{
    write_instructions(table, out)?;

    let mut active = preference;
    let mut state = LoopState::Running(preference);
    while let LoopState::Running(preference) = state {
        active = preference;
        writeln!(out)?;
        out.flush()?;

        let command = match input.read_line(QUERY_PROMPT)? {
            Input::Line(line) => Command::parse(&line),
            Input::End | Input::Interrupted => Command::Exit,
        };
        tracing::debug!(?command, "Dispatching.");
        state = step(table, preference, command, input, out)?;
    }

    Ok(active)
}

fn write_instructions<W: Write>(table: &CountyTable, out: &mut W) -> io::Result<()> {
    let range = match table.prefix_range() {
        Some(range) => format!(" ({}-{})", range.start(), range.end()),
        None => String::new(),
    };

    writeln!(out, "\n{:=<1$}", "", RULE_WIDTH)?;
    writeln!(out, "Montana License Plate County Lookup")?;
    writeln!(out, "{:=<1$}", "", RULE_WIDTH)?;
    writeln!(out, "\nInstructions:")?;
    writeln!(
        out,
        "  • Enter a license plate prefix number{range} to look up county info"
    )?;
    writeln!(out, "  • Type 'exit' to quit the program")?;
    writeln!(out, "  • Type 'change' to modify display preferences")?;
    writeln!(out, "{:=<1$}", "", RULE_WIDTH)
}
