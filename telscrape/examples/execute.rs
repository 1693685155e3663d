//! Basic example: log in over Telnet and run one command
//!
//! # Prerequisites
//!
//! - Telnet server reachable from this machine
//! - Valid credentials, or a server that does not ask for them
//!
//! # Usage
//!
//! ```bash
//! cargo run --example execute -- --host 192.168.1.1 --user admin --password secret -- uname -a
//! ```
//!
//! Set `RUST_LOG=debug` (or pass `--verbose`) to follow the login.

use std::env;
use std::time::Duration;

use telscrape::{Driver, DriverBuilder};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging (set RUST_LOG=debug for verbose output)
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();

    println!("Connecting to {}:{}...", args.host, args.port);

    let mut builder = DriverBuilder::new(&args.host)
        .port(args.port)
        .username(&args.user)
        .verbose(args.verbose)
        .timeout(Duration::from_secs(args.timeout));

    if let Some(password) = &args.password {
        builder = builder.password(password);
    }
    if let Some(banner) = &args.banner {
        builder = builder.prompt_banner(banner);
    }

    let mut driver = builder.build()?;

    driver.open().await?;
    println!("Logged in!");

    let (command, rest) = args
        .command
        .split_first()
        .map(|(c, rest)| (c.as_str(), rest))
        .unwrap_or(("uname", &[]));
    let rest: Vec<&str> = rest.iter().map(String::as_str).collect();

    println!("\nExecuting: {} {}", command, rest.join(" "));
    println!("{}", "-".repeat(50));

    let response = driver.execute(command, &rest).await?;
    println!("{}", response);

    println!("{}", "-".repeat(50));
    println!("Command completed in {:?}", response.elapsed);

    driver.close().await?;

    Ok(())
}

/// Simple argument parser (avoiding external dependencies)
struct Args {
    host: String,
    port: u16,
    user: String,
    password: Option<String>,
    banner: Option<String>,
    timeout: u64,
    verbose: bool,
    command: Vec<String>,
}

impl Args {
    fn parse() -> Self {
        let args: Vec<String> = env::args().collect();
        let mut host = "localhost".to_string();
        let mut port = 23u16;
        let mut user = env::var("USER").unwrap_or_else(|_| "root".to_string());
        let mut password = None;
        let mut banner = None;
        let mut timeout = 10u64;
        let mut verbose = false;
        let mut command = Vec::new();

        let mut i = 1;
        while i < args.len() {
            match args[i].as_str() {
                "--host" | "-h" => {
                    i += 1;
                    if i < args.len() {
                        host = args[i].clone();
                    }
                }
                "--port" | "-p" => {
                    i += 1;
                    if i < args.len() {
                        port = args[i].parse().unwrap_or(23);
                    }
                }
                "--user" | "-u" => {
                    i += 1;
                    if i < args.len() {
                        user = args[i].clone();
                    }
                }
                "--password" | "-P" => {
                    i += 1;
                    if i < args.len() {
                        password = Some(args[i].clone());
                    }
                }
                "--banner" | "-b" => {
                    i += 1;
                    if i < args.len() {
                        banner = Some(args[i].clone());
                    }
                }
                "--timeout" | "-t" => {
                    i += 1;
                    if i < args.len() {
                        timeout = args[i].parse().unwrap_or(10);
                    }
                }
                "--verbose" | "-v" => verbose = true,
                "--help" => {
                    Self::print_help();
                    std::process::exit(0);
                }
                "--" => {
                    command = args[i + 1..].to_vec();
                    break;
                }
                _ => {
                    eprintln!("Unknown argument: {}", args[i]);
                }
            }
            i += 1;
        }

        Self {
            host,
            port,
            user,
            password,
            banner,
            timeout,
            verbose,
            command,
        }
    }

    fn print_help() {
        println!(
            r#"telscrape execute example

USAGE:
    cargo run --example execute -- [OPTIONS] [-- COMMAND [ARGS...]]

OPTIONS:
    -h, --host <HOST>        Target host [default: localhost]
    -p, --port <PORT>        Telnet port [default: 23]
    -u, --user <USER>        Username [default: $USER]
    -P, --password <PASS>    Password, omit to skip the password prompt
    -b, --banner <REGEX>     Shell prompt regex
    -t, --timeout <SECS>     Connect timeout and read deadline [default: 10]
    -v, --verbose            Log login progress at info level
    --help                   Print this help message

EXAMPLES:
    # Log in and print the kernel version
    cargo run --example execute -- --host 10.0.0.5 --user admin --password secret -- uname -a

    # Device with a custom prompt
    cargo run --example execute -- --host 10.0.0.6 --user admin --banner 'Shell>' -- show version
"#
        );
    }
}
