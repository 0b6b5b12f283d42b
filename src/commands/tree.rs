//! # Tree Command Implementation
//!
//! This module implements the `tree` subcommand, which displays the parents of
//! a preset, their parents, and so on, in a hierarchical format.
//!
//! ## Functionality
//!
//! - **Inheritance Visualization**: Parents are listed in precedence order
//! - **Depth Control**: Supports `--depth` flag to limit tree depth
//! - **Broken Graphs**: Missing parents and cycles are marked instead of
//!   failing, so the tree can be used to track them down
//!
//! This command is a safe, read-only operation that does not modify any files.

use anyhow::Result;
use clap::Args;
use ptree::{print_tree, TreeItem};

use cmpreset::output::{dim, OutputConfig};
use cmpreset::preset::PresetKind;
use cmpreset::resolve::{Ancestry, AncestryStatus};

use crate::cli::GlobalArgs;
use crate::commands::require_preset;

/// Display the inheritance tree above a preset
#[derive(Args, Debug)]
pub struct TreeArgs {
    /// Name of the preset.
    pub name: String,

    /// Kind of the preset (configure, build, test, package, workflow).
    #[arg(short, long, value_name = "KIND", default_value = "configure")]
    pub kind: PresetKind,

    /// Maximum depth to display in the tree.
    ///
    /// Use 0 to show only the preset itself, 1 to show its direct parents, etc.
    #[arg(long, value_name = "NUM")]
    pub depth: Option<usize>,
}

/// Execute the `tree` command.
pub fn execute(args: TreeArgs, globals: &GlobalArgs) -> Result<()> {
    let out = OutputConfig::from_env_and_flag(&globals.color);
    let catalog = globals.open_catalog()?;
    require_preset(&catalog, args.kind, &args.name)?;

    let ancestry = catalog.ancestry(args.kind, &args.name)?;
    let tree_root = build_tree_node(&out, &ancestry, args.depth.unwrap_or(usize::MAX), 0);
    print_tree(&tree_root).map_err(|e| anyhow::anyhow!("Failed to display tree: {}", e))?;
    Ok(())
}

/// Build a tree node from an ancestry node
fn build_tree_node(out: &OutputConfig, node: &Ancestry, max_depth: usize, current_depth: usize) -> TreeNode {
    let label = label(out, node);
    let children = if current_depth >= max_depth {
        Vec::new()
    } else {
        node.parents
            .iter()
            .map(|parent| build_tree_node(out, parent, max_depth, current_depth + 1))
            .collect()
    };
    TreeNode { label, children }
}

fn label(out: &OutputConfig, node: &Ancestry) -> String {
    let mut label = node.name.clone();
    match node.status {
        AncestryStatus::Defined => {
            if node.hidden {
                label.push_str(" (hidden)");
            }
        }
        AncestryStatus::Missing => label.push_str(" [missing]"),
        AncestryStatus::Cycle => label.push_str(" [cycle]"),
    }
    if let Some(location) = &node.location {
        label.push(' ');
        label.push_str(&dim(out, &location.to_string()));
    }
    label
}

/// Tree node structure for ptree visualization
#[derive(Clone)]
struct TreeNode {
    label: String,
    children: Vec<TreeNode>,
}

impl TreeItem for TreeNode {
    type Child = TreeNode;

    fn write_self<W: std::io::Write>(&self, f: &mut W, _style: &ptree::Style) -> std::io::Result<()> {
        write!(f, "{}", self.label)
    }

    fn children(&self) -> std::borrow::Cow<'_, [Self::Child]> {
        std::borrow::Cow::Borrowed(&self.children)
    }
}
