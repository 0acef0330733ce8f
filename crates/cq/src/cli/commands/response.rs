//! Implementation of `cq response`.

use std::{
    fs,
    io::{self, Read},
    process::ExitCode,
};

use cq_search::ResponseMapper;
use serde_json::Value;

use crate::cli::{
    args::ResponseCommand,
    output::{print_json, print_response},
};

/// Normalizes a raw engine response read from a file or stdin.
pub fn run(cmd: &ResponseCommand) -> ExitCode {
    let content = match read_input(&cmd.file) {
        Ok(content) => content,
        Err(e) => {
            eprintln!("error: failed to read {}: {e}", cmd.file);
            return ExitCode::FAILURE;
        }
    };
    let raw: Value = match serde_json::from_str(&content) {
        Ok(raw) => raw,
        Err(e) => {
            eprintln!("error: invalid JSON: {e}");
            return ExitCode::FAILURE;
        }
    };
    let response = match ResponseMapper::new().map(&raw) {
        Ok(response) => response,
        Err(e) => {
            eprintln!("error: {e}");
            return ExitCode::FAILURE;
        }
    };

    if cmd.json {
        return match serde_json::to_value(&response) {
            Ok(value) => print_json(&value, false),
            Err(e) => {
                eprintln!("error: failed to serialize response: {e}");
                ExitCode::FAILURE
            }
        };
    }
    print_response(&response);
    ExitCode::SUCCESS
}

/// Reads a file, or stdin for `-`.
fn read_input(file: &str) -> io::Result<String> {
    if file == "-" {
        let mut content = String::new();
        io::stdin().read_to_string(&mut content)?;
        Ok(content)
    } else {
        fs::read_to_string(file)
    }
}
