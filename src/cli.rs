use clap::{Parser, Subcommand};

/// Parses a heap address or klass word, in hex (`0x...`) or decimal.
fn parse_word(s: &str) -> Result<u64, std::num::ParseIntError> {
    match s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        Some(hex) => u64::from_str_radix(hex, 16),
        None => s.parse(),
    }
}

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about,
    long_about = None,
    subcommand_precedence_over_arg = true
)]
pub struct Args {
    /// Heap dumps to analyze. The command runs on each in turn.
    #[arg(required = true)]
    pub paths: Vec<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug, Clone, Copy)]
pub enum Commands {
    /// Count the objects and bytes reachable from the roots
    Reachable,
    /// Bytes retained by a single object
    Retained {
        #[arg(short, long, value_parser = parse_word)]
        object: u64,
    },
    /// Bytes retained by all instances of a class
    RetainedClass {
        #[arg(short, long, value_parser = parse_word)]
        class: u64,
    },
    /// Classes with the largest shallow size, with their retained sizes
    Top {
        #[arg(short = 'n', long, default_value_t = 10)]
        count: usize,
    },
    /// A path from the roots that keeps an object alive
    Path {
        #[arg(short, long, value_parser = parse_word)]
        object: u64,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_word() {
        assert_eq!(parse_word("0x10"), Ok(16));
        assert_eq!(parse_word("0XfF"), Ok(255));
        assert_eq!(parse_word("42"), Ok(42));
        assert!(parse_word("0xzz").is_err());
    }

    #[test]
    fn test_parse_args() {
        let args = Args::parse_from(["objgraph", "a.binpb.zst", "reachable"]);
        assert_eq!(args.paths, vec!["a.binpb.zst".to_string()]);
        assert!(matches!(args.command, Commands::Reachable));

        let args = Args::parse_from(["objgraph", "a.binpb.zst", "retained", "-o", "0x2000"]);
        assert_eq!(args.paths, vec!["a.binpb.zst".to_string()]);
        assert!(matches!(args.command, Commands::Retained { object: 0x2000 }));

        let args = Args::parse_from(["objgraph", "a", "retained-class", "--class", "4096"]);
        assert_eq!(args.paths, vec!["a".to_string()]);
        assert!(matches!(
            args.command,
            Commands::RetainedClass { class: 0x1000 }
        ));

        let args = Args::parse_from(["objgraph", "a", "b", "top", "-n", "3"]);
        assert_eq!(args.paths, vec!["a".to_string(), "b".to_string()]);
        assert!(matches!(args.command, Commands::Top { count: 3 }));

        let args = Args::parse_from(["objgraph", "a", "b", "c", "top"]);
        assert_eq!(args.paths.len(), 3);
        assert!(matches!(args.command, Commands::Top { count: 10 }));

        let args = Args::parse_from(["objgraph", "a", "path", "--object", "16"]);
        assert_eq!(args.paths, vec!["a".to_string()]);
        assert!(matches!(args.command, Commands::Path { object: 16 }));
    }

    #[test]
    fn test_parse_args_errors() {
        // A path is required before the command
        assert!(Args::try_parse_from(["objgraph", "reachable"]).is_err());
        // And a command after the paths
        assert!(Args::try_parse_from(["objgraph", "a.binpb.zst"]).is_err());
        assert!(Args::try_parse_from(["objgraph", "a", "retained", "-o", "zz"]).is_err());
    }
}
