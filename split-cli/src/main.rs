use anyhow::Context;
use clap::Parser;
use std::io::Read;
use std::num::NonZeroUsize;
use std::path::PathBuf;

use menukit::session::DEFAULT_SPLIT_AFTER;
use menukit::{split_long_menu_list_into_hierarchy, HierarchyNode};

/// Fold a list of menu labels (one per line) into sub-menus the way long menus are split.
#[derive(Parser)]
#[command(name = "menukit-split")]
struct Cli {
    /// Maximum number of entries (or sub-menus) on the top level.
    #[arg(long, default_value_t = NonZeroUsize::new(DEFAULT_SPLIT_AFTER).unwrap_or(NonZeroUsize::MIN))]
    split_after: NonZeroUsize,

    /// Print the hierarchy as JSON instead of an indented tree.
    #[arg(long)]
    json: bool,

    /// Input file; reads stdin when omitted.
    file: Option<PathBuf>,
}

fn read_labels(file: Option<&PathBuf>) -> anyhow::Result<Vec<String>> {
    let mut text = String::new();
    match file {
        Some(path) => {
            text = std::fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
        }
        None => {
            std::io::stdin().read_to_string(&mut text).context("read stdin")?;
        }
    }
    Ok(parse_labels(&text))
}

/// One label per line; blank lines are skipped, surrounding whitespace is kept.
fn parse_labels(text: &str) -> Vec<String> {
    text.lines()
        .map(|l| l.strip_suffix('\r').unwrap_or(l))
        .filter(|l| !l.trim().is_empty())
        .map(str::to_string)
        .collect()
}

fn render_tree(nodes: &[HierarchyNode]) -> String {
    let mut out = String::new();
    for node in nodes {
        match node {
            HierarchyNode::Entry(e) => {
                out.push_str(e);
                out.push('\n');
            }
            HierarchyNode::Group { label, entries } => {
                out.push_str(&format!("{label} ({})\n", entries.len()));
                for e in entries {
                    out.push_str("    ");
                    out.push_str(e);
                    out.push('\n');
                }
            }
        }
    }
    out
}

fn main() -> anyhow::Result<()> {
    let _ = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).try_init();

    let cli = Cli::parse();
    let mut labels = read_labels(cli.file.as_ref())?;
    log::debug!("splitting {} labels after {}", labels.len(), cli.split_after);

    let nodes = split_long_menu_list_into_hierarchy(&mut labels, cli.split_after);

    if cli.json {
        println!("{}", serde_json::to_string_pretty(&nodes).context("encode json")?);
    } else {
        print!("{}", render_tree(&nodes));
    }
    Ok(())
}
