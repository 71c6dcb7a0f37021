//! Builder operations as values, so a session can log and replay them.

use crate::domain::builder::{RuleEdit, TreeBuilder};
use crate::domain::condition::{ConditionTree, Mode, Rule};
use crate::domain::error::ConditionError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Edit {
    AddRule { path: Vec<usize>, rule: Rule },
    AddDefaultRule { path: Vec<usize> },
    RemoveRule { path: Vec<usize>, index: usize },
    AddGroup { path: Vec<usize> },
    RemoveGroup { path: Vec<usize>, index: usize },
    SetMode { path: Vec<usize>, mode: Mode },
    UpdateRule {
        path: Vec<usize>,
        index: usize,
        edit: RuleEdit,
    },
    MoveRule {
        path: Vec<usize>,
        from: usize,
        to: usize,
    },
    Reset,
}

impl Edit {
    pub fn name(&self) -> &'static str {
        match self {
            Edit::AddRule { .. } => "add_rule",
            Edit::AddDefaultRule { .. } => "add_default_rule",
            Edit::RemoveRule { .. } => "remove_rule",
            Edit::AddGroup { .. } => "add_group",
            Edit::RemoveGroup { .. } => "remove_group",
            Edit::SetMode { .. } => "set_mode",
            Edit::UpdateRule { .. } => "update_rule",
            Edit::MoveRule { .. } => "move_rule",
            Edit::Reset => "reset",
        }
    }

    pub fn apply(
        self,
        builder: &TreeBuilder,
        tree: &ConditionTree,
    ) -> Result<ConditionTree, ConditionError> {
        match self {
            Edit::AddRule { path, rule } => builder.add_rule(tree, &path, rule),
            Edit::AddDefaultRule { path } => builder.add_default_rule(tree, &path),
            Edit::RemoveRule { path, index } => builder.remove_rule(tree, &path, index),
            Edit::AddGroup { path } => builder.add_group(tree, &path),
            Edit::RemoveGroup { path, index } => builder.remove_group(tree, &path, index),
            Edit::SetMode { path, mode } => builder.set_mode(tree, &path, mode),
            Edit::UpdateRule { path, index, edit } => {
                builder.update_rule_field(tree, &path, index, edit)
            }
            Edit::MoveRule { path, from, to } => builder.move_rule(tree, &path, from, to),
            Edit::Reset => Ok(builder.reset()),
        }
    }
}
