//! Line-oriented operator loop: each input line becomes one [`Event`].

use std::io::{BufRead, Write};

use tracing::debug;

use crate::{
    doc_id::DocumentId,
    error::{Error, Result},
    render,
    session::{Effect, Event, Session},
};

pub const HELP: &str = "\
Commands:
  view                     show the visible documents
  filter [LABEL, ...]      show only these labels (no argument clears)
  keyword TEXT             add a keyword filter
  keywords [KW, ...]       keep only these keyword filters
  label NAME               create a new label
  choose [LABEL]           pick the label to assign (no argument clears)
  select [ID ...]          select points by id, e.g. `select 1 4 #7`
  commit                   assign the chosen label to the selection
  show ID                  toggle the detail view of a document
  close                    close the detail view
  export                   write the labels to a new file
  status                   show the session state
  help                     show this message
  quit                     end the session";

/// A parsed input line.
#[derive(Debug, Clone, PartialEq)]
pub enum Line {
    Event(Event),
    View,
    Status,
    Help,
    Quit,
}

pub fn parse_line(line: &str) -> Result<Line> {
    let line = line.trim();
    let (command, rest) = match line.split_once(char::is_whitespace) {
        Some((command, rest)) => (command, rest.trim()),
        None => (line, ""),
    };

    let parsed = match command {
        "view" => Line::View,
        "status" => Line::Status,
        "help" => Line::Help,
        "quit" | "exit" => Line::Quit,
        "filter" => Line::Event(Event::LabelFilterChanged(split_list(rest))),
        "keyword" => Line::Event(Event::KeywordSubmitted(rest.to_string())),
        "keywords" => {
            Line::Event(Event::KeywordChecklistChanged(split_list(rest)))
        }
        "label" => Line::Event(Event::LabelCreated(rest.to_string())),
        "choose" => Line::Event(Event::AssignLabelChosen(
            (!rest.is_empty()).then(|| rest.to_string()),
        )),
        "select" => Line::Event(Event::PointsSelected(parse_ids(rest)?)),
        "commit" => Line::Event(Event::CommitRequested),
        "show" => {
            if rest.is_empty() {
                return Err(Error::Config("show needs a document id".into()));
            }
            Line::Event(Event::PointClicked(rest.parse()?))
        }
        "close" => Line::Event(Event::InspectorClosed),
        "export" => Line::Event(Event::ExportRequested),
        other => {
            return Err(Error::Config(format!("unknown command: {other}")));
        }
    };
    Ok(parsed)
}

/// Comma-separated values, so labels and keywords may contain spaces.
fn split_list(rest: &str) -> Vec<String> {
    rest.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

fn parse_ids(rest: &str) -> Result<Vec<DocumentId>> {
    rest.split(|c: char| c == ',' || c.is_whitespace())
        .filter(|s| !s.is_empty())
        .map(str::parse)
        .collect()
}

/// Read commands from `input` until EOF or `quit`.
pub fn run<R: BufRead, W: Write>(
    session: &mut Session,
    input: R,
    out: &mut W,
) -> Result<()> {
    writeln!(
        out,
        "{} documents loaded. Type 'help' for commands.",
        session.store().len()
    )?;

    for line in input.lines() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        debug!(line = line.trim(), "command");

        match parse_line(&line) {
            Ok(Line::Quit) => break,
            Ok(Line::Help) => writeln!(out, "{HELP}")?,
            Ok(Line::View) => render::write_view(out, &session.view())?,
            Ok(Line::Status) => render::write_summary(out, &session.summary())?,
            Ok(Line::Event(event)) => {
                let effects = session.dispatch(event);
                write_effects(out, session, &effects)?;
            }
            Err(e) => writeln!(out, "error: {e}")?,
        }
        out.flush()?;
    }

    Ok(())
}

fn write_effects<W: Write>(
    out: &mut W,
    session: &Session,
    effects: &[Effect],
) -> Result<()> {
    for effect in effects {
        match effect {
            Effect::Banner(banner) => render::write_banner(out, banner)?,
            Effect::Inspector(state) => render::write_inspector(out, state)?,
            Effect::Redraw => {
                writeln!(
                    out,
                    "{} of {} documents visible",
                    session.view().len(),
                    session.store().len()
                )?;
            }
            Effect::ClearInput(_)
            | Effect::RegistriesChanged
            | Effect::Exported(_) => {}
        }
    }
    Ok(())
}
