//! Normalized content model: entries, databases and block trees.

mod block;
pub mod blocks;
mod entry;

pub use block::{find_block, walk_blocks, Block, BlockKind, ChildField, ContainerRule, CONTAINER_RULES};
pub use blocks::*;
pub use entry::{parse_notion_date, Database, Entry, Tag};

use serde::{Deserialize, Serialize};

/// A page's block tree together with the links found in it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageContent {
    pub blocks: Vec<Block>,
    pub references: Vec<crate::references::ReferencesInPage>,
}
