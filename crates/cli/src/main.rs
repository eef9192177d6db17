// ABOUTME: pagesift command line: detect, parse, resolve metadata, sanitize, split and read sitemaps.
// ABOUTME: Reads a file or stdin and prints JSON or HTML for inspection.

use std::fs;
use std::io::{self, Read};
use std::path::PathBuf;

use anyhow::{anyhow, bail, Context, Result};
use clap::{Parser as ClapParser, Subcommand};
use pagesift_core::clean::{ContentCleaner, DefaultContentCleaner};
use pagesift_core::dom::{parse_body_fragment, render::outer_html, Element};
use pagesift_core::{detect, resolve_html, ContentSplitter, Options, SafelistKind};
use pagesift_feed::{parse_sitemap, Parser, ParserBuilder};
use serde::Serialize;
use tracing_subscriber::EnvFilter;

/// Normalize web content (feeds, pages, embeds) into a common model.
#[derive(ClapParser, Debug)]
#[command(name = "pagesift")]
#[command(about = "Detect, parse, sanitize and split web content", long_about = None)]
struct Cli {
    /// More logging on stderr (-v debug, -vv trace). RUST_LOG wins when set.
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the detected format of the input.
    Detect {
        /// Input file, or "-" for stdin.
        input: String,
        #[arg(long, default_value = "")]
        content_type: String,
    },
    /// Parse the input into a resource and print the result as JSON.
    Parse {
        input: String,
        /// Where the content came from; used to resolve relative links.
        #[arg(long, default_value = "")]
        source_link: String,
        #[arg(long)]
        content_type: Option<String>,
        /// Driver name (rss, atom, amp, html, twitter, oembed). Detected when omitted.
        #[arg(long)]
        parser: Option<Parser>,
        /// Keep images in cleaned content.
        #[arg(long)]
        images: bool,
        /// Safelist preset used to clean content.
        #[arg(long, default_value = "content")]
        safelist: String,
        /// Skip content cleaning.
        #[arg(long)]
        raw: bool,
        #[arg(long)]
        compact: bool,
    },
    /// Resolve page metadata and print it as JSON.
    Metadata {
        input: String,
        /// The page URL, for relative links and host rules.
        #[arg(long)]
        url: Option<String>,
    },
    /// Sanitize an HTML fragment and print the cleaned markup.
    Sanitize {
        input: String,
        #[arg(long)]
        images: bool,
        #[arg(long)]
        base_uri: Option<String>,
        #[arg(long, default_value = "content")]
        safelist: String,
    },
    /// Split an HTML fragment into blocks, one per line.
    Split { input: String },
    /// Read an XML or plain sitemap and print its links as JSON.
    Sitemap { input: String },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Command::Detect {
            input,
            content_type,
        } => {
            let content = load(&input)?;
            println!("{}", detect(&content, &content_type));
        }
        Command::Parse {
            input,
            source_link,
            content_type,
            parser,
            images,
            safelist,
            raw,
            compact,
        } => {
            let content = load(&input)?;
            let mut options = Options::builder()
                .allow_images(images)
                .clean_content(!raw)
                .safelist(SafelistKind::from(safelist.as_str()));
            if let Some(content_type) = content_type {
                options = options.content_type(content_type);
            }
            let mut builder = ParserBuilder::new().options(options.build());
            if let Some(parser) = parser {
                builder = builder.parser(parser);
            }
            let result = builder.build().parse(&content, &source_link);
            print_json(&result, compact)?;
            if let Some(err) = result.first_error() {
                bail!("{}", err);
            }
        }
        Command::Metadata { input, url } => {
            let content = load(&input)?;
            print_json(&resolve_html(&content, url.as_deref()), false)?;
        }
        Command::Sanitize {
            input,
            images,
            base_uri,
            safelist,
        } => {
            let content = load(&input)?;
            let kind = SafelistKind::from(safelist.as_str());
            let kind = if images { kind.with_images() } else { kind };
            let cleaner = DefaultContentCleaner::from_options(
                &Options::builder().allow_images(images).safelist(kind).build(),
            );
            let mut root = parse_body_fragment(&content);
            cleaner.transform(&mut root, base_uri.as_deref());
            println!("{}", cleaner.to_clean_content(&root));
        }
        Command::Split { input } => {
            let content = load(&input)?;
            let body = body_of(&parse_body_fragment(&content));
            for block in ContentSplitter::default().split(&body) {
                println!("{}", outer_html(&block));
            }
        }
        Command::Sitemap { input } => {
            let content = load(&input)?;
            let links = parse_sitemap(&content).context("reading sitemap")?;
            print_json(&links, false)?;
        }
    }

    Ok(())
}

fn init_tracing(verbose: u8) {
    let default_level = match verbose {
        0 => "warn",
        1 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

fn print_json<T: Serialize>(value: &T, compact: bool) -> Result<()> {
    if compact {
        println!("{}", serde_json::to_string(value)?);
    } else {
        println!("{}", serde_json::to_string_pretty(value)?);
    }
    Ok(())
}

/// Reads a file, or stdin for "-". Invalid UTF-8 is replaced.
fn load(target: &str) -> Result<String> {
    let bytes = if target == "-" {
        let mut buf = Vec::new();
        io::stdin().read_to_end(&mut buf)?;
        buf
    } else {
        let path = PathBuf::from(target);
        if !path.exists() {
            return Err(anyhow!("file not found: {}", target));
        }
        fs::read(&path).with_context(|| format!("reading {}", path.display()))?
    };
    tracing::debug!(input = target, bytes = bytes.len(), "loaded input");
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

fn body_of(root: &Element) -> Element {
    root.child_named("body").cloned().unwrap_or_default()
}
