//! Packs a token list into a trie table and prints it as a Rust constant.
//!
//! ```text
//! trie-build [--request-line] [NAME] < tokens.txt
//! ```
//!
//! Each input line is `token [code]`; a missing code continues the running
//! count starting at 1. A line holding only `--` starts a new root.

use minute_http::trie::{CharClass, TrieBuilder};
use std::io::{self, Read};
use std::process::ExitCode;

fn main() -> ExitCode {
    let mut class = CharClass::Token;
    let mut name = String::from("TABLE_ENTRIES");
    for arg in std::env::args().skip(1) {
        match arg.as_str() {
            "--request-line" => class = CharClass::RequestLine,
            _ => name = arg,
        }
    }

    let mut input = String::new();
    if let Err(e) = io::stdin().read_to_string(&mut input) {
        eprintln!("can't read token list: {e}");
        return ExitCode::FAILURE;
    }

    let mut builder = TrieBuilder::new(class);
    let mut next_code: u8 = 1;
    for (line_no, line) in input.lines().enumerate() {
        let mut fields = line.split_whitespace();
        let Some(token) = fields.next() else { continue };
        if token == "--" {
            builder.push_root();
            continue;
        }

        let code = match fields.next().map(str::parse::<u8>) {
            None => next_code,
            Some(Ok(code)) => code,
            Some(Err(e)) => {
                eprintln!("line {}: invalid code: {e}", line_no + 1);
                return ExitCode::FAILURE;
            }
        };
        next_code = code.saturating_add(1);

        let token = if class == CharClass::Token { token.to_ascii_lowercase() } else { token.to_string() };
        builder.push_token(token, code);
    }

    match builder.build() {
        Ok(packed) => {
            print!("{}", packed.render(&name));
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("can't build table: {e}");
            ExitCode::FAILURE
        }
    }
}
