//! vpkfs CLI - browse Source engine game content
//!
//! Reads a mod's `gameinfo.txt`, resolves its search paths through the local
//! Steam libraries and answers directory, file and stat queries against the
//! composed view.

mod commands;
mod error;
mod logging;

use clap::Parser;

use commands::{Command, GlobalArgs};

#[derive(Debug, Parser)]
#[command(name = "vpkfs", version, about = "Browse Source engine game content through its search paths")]
struct Cli {
    #[command(flatten)]
    global: GlobalArgs,

    #[command(subcommand)]
    command: Command,
}

fn main() {
    let cli = Cli::parse();
    logging::init(cli.global.verbose);

    let runtime = match tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            eprintln!("Error: failed to start runtime: {}", e);
            std::process::exit(2);
        }
    };

    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    if let Err(e) = runtime.block_on(commands::run(cli.command, &cli.global, &mut out)) {
        eprintln!("Error: {}", e);
        std::process::exit(e.exit_code());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from([
            "vpkfs",
            "cat",
            "/scripts/a.txt",
            "--mod-root",
            "/games/demo",
            "-q",
            "game",
            "-vv",
        ])
        .unwrap();
        assert_eq!(cli.global.qualifier.as_deref(), Some("game"));
        assert_eq!(cli.global.verbose, 2);
        assert!(matches!(cli.command, Command::Cat { ref path } if path == "/scripts/a.txt"));
    }

    #[test]
    fn test_ls_defaults_to_root() {
        let cli = Cli::try_parse_from(["vpkfs", "ls"]).unwrap();
        assert!(matches!(cli.command, Command::Ls { ref path } if path == "/"));
    }

    #[test]
    fn test_vpk_ls_verify_flag() {
        let cli = Cli::try_parse_from(["vpkfs", "vpk-ls", "pak01_dir.vpk", "--verify"]).unwrap();
        match cli.command {
            Command::VpkLs { archive, verify } => {
                assert_eq!(archive.to_string_lossy(), "pak01_dir.vpk");
                assert!(verify);
            }
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn test_missing_subcommand_is_rejected() {
        assert!(Cli::try_parse_from(["vpkfs"]).is_err());
    }
}
