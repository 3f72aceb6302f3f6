//! Generate a bcrypt hash for ADMIN_PASSWORD_HASH, or check a password
//! against an existing hash.
//!
//!     hash-password <PASSWORD>
//!     hash-password <PASSWORD> --verify <HASH>

use bcrypt::{hash, verify, DEFAULT_COST};
use std::{env, process::ExitCode};

fn usage() -> ExitCode {
    eprintln!("Usage: hash-password <PASSWORD> [--verify <HASH>]");
    ExitCode::FAILURE
}

fn main() -> ExitCode {
    let args: Vec<String> = env::args().skip(1).collect();

    match args.as_slice() {
        [password] => match hash(password, DEFAULT_COST) {
            Ok(hashed) => {
                println!("\nCost     : {}", DEFAULT_COST);
                println!("Hash     : {}\n", hashed);
                println!("# Paste this into your .env:");
                println!("ADMIN_PASSWORD_HASH={}", hashed);
                ExitCode::SUCCESS
            }
            Err(e) => {
                eprintln!("Error hashing password: {}", e);
                ExitCode::FAILURE
            }
        },
        [password, flag, stored] if flag == "--verify" => match verify(password, stored) {
            Ok(true) => {
                println!("Password matches hash");
                ExitCode::SUCCESS
            }
            Ok(false) => {
                eprintln!("Password does NOT match hash");
                ExitCode::FAILURE
            }
            Err(e) => {
                eprintln!("Invalid hash: {}", e);
                ExitCode::FAILURE
            }
        },
        _ => usage(),
    }
}
