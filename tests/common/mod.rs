#![allow(dead_code)]

use condtree::domain::condition::{ConditionTree, Group, Operator, Rule, ValueType};

pub fn rsi_below(value: &str) -> Rule {
    Rule::new("IND.RSI_14", Operator::Lt, value, ValueType::Number)
}

pub fn close_above(value: &str) -> Rule {
    Rule::new("BAR.CLOSE", Operator::Gt, value, ValueType::Number)
}

pub fn direction_is(value: &str) -> Rule {
    Rule::new("SIGNAL.DIRECTION", Operator::Eq, value, ValueType::String)
}

/// Paths of every group in the tree, root first, depth-first.
pub fn group_paths(tree: &ConditionTree) -> Vec<Vec<usize>> {
    fn walk(group: &Group, prefix: &mut Vec<usize>, out: &mut Vec<Vec<usize>>) {
        out.push(prefix.clone());
        for (i, child) in group.groups.iter().enumerate() {
            prefix.push(i);
            walk(child, prefix, out);
            prefix.pop();
        }
    }
    let mut out = Vec::new();
    walk(&tree.root, &mut Vec::new(), &mut out);
    out
}
