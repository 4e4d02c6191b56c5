use review_sheet::config::AppConfig;
use review_sheet::downloader::ExportFormat;
use review_sheet::loader::load_file;
use review_sheet::reviewer::{Download, Reviewer};
use review_sheet::saving::save_session;
use review_sheet::session::{Action, FlagKind, Outcome, SessionMode, TableSession};
use review_sheet::{CellValue, WorkingTable};

use std::env;
use std::io::{self, BufRead, Write};
use std::ops::Range;

const HELP: &str = "\
commands:
  select <row>...          tick rows of the grid
  unselect <row>...        untick rows of the grid
  edit <row> <column> <value>
  append                   add an empty row at the end
  remove                   remove selected rows
  final                    mark selected rows final
  engine                   run the reconciliation engine
  fraud-select <row>...    tick rows of the engine result
  fraud                    mark selected result rows as fraud
  next | prev              change page
  show                     print the grid
  export <csv|xlsx> <path> write flagged rows to a file
  save <path>              write a session snapshot
  quit";

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let args: Vec<String> = env::args().collect();
    if args.len() < 2 || args.len() > 3 {
        eprintln!("Usage: {} <file.csv|file.xlsx> [finalize|reconcile]", args[0]);
        return Ok(());
    }

    let config = AppConfig::from_env()?;
    let mode: SessionMode = match args.get(2) {
        Some(mode) => mode.parse()?,
        None => config.mode,
    };

    let reviewer = Reviewer::default();
    let mut session = TableSession::new(mode).with_rerun_policy(config.rerun_policy);
    session.load(load_file(&args[1])?);

    print_session(&session);
    println!("{}", HELP);

    let stdin = io::stdin();
    let mut status = String::from("ok");
    loop {
        print!("({}) > ", status);
        io::stdout().flush()?;

        let mut line = String::new();
        if stdin.lock().read_line(&mut line)? == 0 {
            break;
        }
        let words: Vec<&str> = line.split_whitespace().collect();
        let Some((&command, rest)) = words.split_first() else {
            continue;
        };

        status = match command {
            "quit" | "q" => break,
            "help" => {
                println!("{}", HELP);
                "ok".to_string()
            }
            "show" => {
                print_session(&session);
                "ok".to_string()
            }
            "export" => match export(&reviewer, &session, rest) {
                Ok(msg) | Err(msg) => msg,
            },
            "save" => match rest.first() {
                Some(path) => match save_session(&session, path) {
                    Ok(()) => format!("saved {}", path),
                    Err(e) => e.to_string(),
                },
                None => "usage: save <path>".to_string(),
            },
            _ => match parse_actions(command, rest) {
                Ok(actions) => {
                    let mut status = "ok".to_string();
                    for action in actions {
                        status = match reviewer.act(&mut session, action) {
                            Ok(Outcome::Notice(notice)) => notice.to_string(),
                            Ok(Outcome::Unchanged) => "unchanged".to_string(),
                            Ok(Outcome::Applied) => "ok".to_string(),
                            Err(e) => e.to_string(),
                        };
                    }
                    print_session(&session);
                    status
                }
                Err(msg) => msg,
            },
        };
    }

    Ok(())
}

fn parse_rows(rest: &[&str]) -> Result<Vec<usize>, String> {
    if rest.is_empty() {
        return Err("expected at least one row number".to_string());
    }
    rest.iter()
        .map(|r| r.parse().map_err(|_| format!("invalid row number: {}", r)))
        .collect()
}

fn parse_actions(command: &str, rest: &[&str]) -> Result<Vec<Action>, String> {
    let actions = match command {
        "select" | "unselect" => {
            let value = command == "select";
            parse_rows(rest)?
                .into_iter()
                .map(|row| Action::Select { row, value })
                .collect()
        }
        "fraud-select" => parse_rows(rest)?
            .into_iter()
            .map(|row| Action::SelectResult { row, value: true })
            .collect(),
        "edit" => {
            let [row, column, value @ ..] = rest else {
                return Err("usage: edit <row> <column> <value>".to_string());
            };
            let row = row
                .parse()
                .map_err(|_| format!("invalid row number: {}", row))?;
            vec![Action::Edit {
                row,
                column: column.to_string(),
                value: CellValue::parse_text(&value.join(" ")),
            }]
        }
        "append" => vec![Action::AppendRow],
        "remove" => vec![Action::BulkRemove],
        "final" => vec![Action::BulkMarkFinal],
        "fraud" => vec![Action::BulkMarkFraud],
        "engine" => vec![Action::RunEngine],
        "next" => vec![Action::NextPage],
        "prev" => vec![Action::PrevPage],
        other => return Err(format!("unknown command: {} (try 'help')", other)),
    };
    Ok(actions)
}

fn export(reviewer: &Reviewer, session: &TableSession, rest: &[&str]) -> Result<String, String> {
    let [format, path] = rest else {
        return Err("usage: export <csv|xlsx> <path>".to_string());
    };
    let format: ExportFormat = format.parse()?;
    let flag = match session.mode() {
        SessionMode::Finalize => FlagKind::Final,
        SessionMode::Reconcile => FlagKind::Fraud,
    };

    match reviewer
        .download(session, flag, format)
        .map_err(|e| e.to_string())?
    {
        Download::File(file) => {
            std::fs::write(path, &file.bytes).map_err(|e| e.to_string())?;
            Ok(format!("wrote {} ({} bytes)", path, file.bytes.len()))
        }
        Download::Notice(notice) => Ok(notice.to_string()),
    }
}

fn print_session(session: &TableSession) {
    let Some((range, _)) = session.visible_rows() else {
        return;
    };
    if let Some(working) = session.working() {
        print_grid(working, range);
    }
    if session.mode().is_paginated() {
        if let Some(working) = session.working() {
            let page = session.page();
            println!(
                "page {} of {}",
                page.page_number + 1,
                page.page_count(working.len())
            );
        }
    }
    if let Some(result) = session.engine_result() {
        println!("engine result:");
        print_grid(result, 0..result.len());
    }
}

fn print_grid(table: &WorkingTable, range: Range<usize>) {
    let mut header = vec!["#".to_string(), "select".to_string()];
    header.extend(table.columns().iter().cloned());
    header.push(table.flag().column_name().to_string());
    println!("{}", header.join("\t"));

    for index in range {
        let mut line = vec![
            index.to_string(),
            if table.is_selected(index) { "[x]" } else { "[ ]" }.to_string(),
        ];
        line.extend(table.rows()[index].values.iter().map(|v| v.to_string()));
        line.push(table.is_flagged(index).to_string());
        println!("{}", line.join("\t"));
    }
}
