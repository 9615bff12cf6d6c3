use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use oxidize_cos::{
    parse_content, parse_indirect_object, parse_objects, Comparison, Node, ParseOptions,
    StreamLoading,
};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::rc::Rc;
use tracing::{debug, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(
    name = "oxidizecos",
    about = "Parse, rewrite and compare PDF COS objects",
    version,
    author
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

/// What the input file holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Mode {
    /// One or more bare objects
    Object,
    /// A single `<num> <gen> obj ... endobj`
    Indirect,
    /// A content stream
    Content,
}

#[derive(Subcommand)]
enum Commands {
    /// Parse a file and write it back out in canonical form
    Parse {
        /// Input file
        input: PathBuf,

        /// How to read the input
        #[arg(short, long, value_enum, default_value = "object")]
        mode: Mode,

        /// Leave stream payloads in the source until they are written
        #[arg(short, long)]
        deferred: bool,

        /// Fail on invalid content operators instead of logging them
        #[arg(short, long)]
        strict: bool,
    },

    /// Compare two files structurally
    Compare {
        a: PathBuf,
        b: PathBuf,

        #[arg(short, long, value_enum, default_value = "object")]
        mode: Mode,
    },

    /// Show the estimated and actual written size
    Estimate {
        input: PathBuf,

        #[arg(short, long, value_enum, default_value = "object")]
        mode: Mode,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "oxidizecos=info,oxidize_cos=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Parse {
            input,
            mode,
            deferred,
            strict,
        } => {
            let mut options = if strict {
                ParseOptions::strict()
            } else {
                ParseOptions::lenient()
            };
            if deferred {
                options.stream_loading = StreamLoading::Deferred;
            }

            let source = read_input(&input)?;
            let nodes = load_nodes(&source, mode, options)?;
            let mut stdout = std::io::stdout().lock();
            for node in &nodes {
                stdout.write_all(&node.to_bytes()?)?;
                stdout.write_all(b"\n")?;
            }
            info!("Wrote {} object(s) from {}", nodes.len(), input.display());
        }

        Commands::Compare { a, b, mode } => {
            let left = load_nodes(&read_input(&a)?, mode, ParseOptions::default())?;
            let right = load_nodes(&read_input(&b)?, mode, ParseOptions::default())?;
            println!("{:?}", compare_all(&left, &right));
        }

        Commands::Estimate { input, mode } => {
            let nodes = load_nodes(&read_input(&input)?, mode, ParseOptions::default())?;
            let (estimated, written) = sizes(&nodes)?;
            println!("Estimated size: {estimated} bytes");
            println!("Written size:   {written} bytes");
        }
    }

    Ok(())
}

fn read_input(path: &Path) -> Result<Vec<u8>> {
    std::fs::read(path).with_context(|| format!("Failed to read {}", path.display()))
}

/// Parses `source` according to `mode`. Deferred stream payloads are pulled
/// in from `source` afterwards, so every returned node can be written.
fn load_nodes(source: &[u8], mode: Mode, options: ParseOptions) -> Result<Vec<Node>> {
    let nodes = match mode {
        Mode::Object => parse_objects(source)?,
        Mode::Content => vec![Node::Content(parse_content(source, options)?)],
        Mode::Indirect => {
            let mut obj = parse_indirect_object(source, options)?;
            if let Node::Stream(stream) = Rc::make_mut(&mut obj.value) {
                if let Some(offset) = stream.source_offset() {
                    debug!("Loading deferred payload at offset {}", offset);
                    stream.load(source, &options)?;
                }
            }
            vec![Node::IndirectObject(obj)]
        }
    };

    if nodes.is_empty() {
        bail!("No objects found");
    }
    Ok(nodes)
}

/// Pairs up the objects of both sides and keeps the furthest result.
fn compare_all(left: &[Node], right: &[Node]) -> Comparison {
    if left.len() != right.len() {
        return Comparison::Different;
    }
    left.iter()
        .zip(right)
        .map(|(a, b)| a.compare(b))
        .max()
        .unwrap_or(Comparison::Equal)
}

fn sizes(nodes: &[Node]) -> Result<(usize, usize)> {
    let mut estimated = 0;
    let mut written = 0;
    for node in nodes {
        estimated += node.estimate_write_size(0);
        written += node.to_bytes()?.len();
    }
    Ok((estimated, written))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_load_objects() {
        let nodes = load_nodes(b"1 /Two (three)", Mode::Object, ParseOptions::default()).unwrap();
        assert_eq!(nodes.len(), 3);
        assert_eq!(nodes[0].as_integer(), Some(1));
    }

    #[test]
    fn test_load_deferred_indirect_stream() {
        let source = b"5 0 obj\n<< /Length 3 >>\nstream\nabc\nendstream\nendobj\n";
        let nodes = load_nodes(source, Mode::Indirect, ParseOptions::deferred()).unwrap();
        let obj = nodes[0].as_indirect().unwrap();
        assert_eq!(obj.value.as_stream().unwrap().data(), Some(&b"abc"[..]));
    }

    #[test]
    fn test_load_content() {
        let nodes = load_nodes(b"q 1 w Q", Mode::Content, ParseOptions::strict()).unwrap();
        assert_eq!(nodes[0].as_content().map(|c| c.len()), Some(3));
    }

    #[test]
    fn test_load_empty_input_fails() {
        assert!(load_nodes(b"  ", Mode::Object, ParseOptions::default()).is_err());
    }

    #[test]
    fn test_compare_all() {
        let a = load_nodes(b"1 << /A 1 /B 2 >>", Mode::Object, ParseOptions::default()).unwrap();
        let b = load_nodes(b"1.0 << /B 2 /A 1 >>", Mode::Object, ParseOptions::default()).unwrap();
        assert_eq!(compare_all(&a, &a), Comparison::Equal);
        assert_eq!(compare_all(&a, &b), Comparison::Similar);
        assert_eq!(compare_all(&a, &b[..1]), Comparison::Different);
    }

    #[test]
    fn test_sizes() {
        let nodes = load_nodes(b"[1 2 3] /Name", Mode::Object, ParseOptions::default()).unwrap();
        let (estimated, written) = sizes(&nodes).unwrap();
        assert_eq!(written, "[1 2 3]".len() + "/Name".len());
        assert!(estimated >= written);
    }
}
