//! Path-addressed mutations of a condition tree.
//!
//! Every operation takes the current tree by reference and returns a new
//! tree. Paths and indices are validated against a private copy before
//! anything changes, so an `Err` never implies a partial edit.

use crate::domain::catalog::{FactorCatalog, RuleDefaults, load_catalog, load_rule_defaults};
use crate::domain::condition::{ConditionTree, Group, Mode, Operator, Rule, ValueType};
use crate::domain::error::ConditionError;
use crate::ports::config_port::ConfigPort;

/// A change to a single rule field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RuleEdit {
    Factor(String),
    Operator(Operator),
    /// Stored verbatim; never coerced to the rule's type.
    Value(String),
    Type(ValueType),
    Nullable(bool),
}

impl RuleEdit {
    /// Build an edit from a wire field name and its textual value.
    pub fn parse(field: &str, text: &str) -> Result<Self, ConditionError> {
        match field {
            "factor" => Ok(RuleEdit::Factor(text.to_string())),
            "operator" => Ok(RuleEdit::Operator(text.parse()?)),
            "value" => Ok(RuleEdit::Value(text.to_string())),
            "type" => Ok(RuleEdit::Type(text.parse()?)),
            "nullable" => match text.trim().to_ascii_lowercase().as_str() {
                "true" => Ok(RuleEdit::Nullable(true)),
                "false" => Ok(RuleEdit::Nullable(false)),
                _ => Err(ConditionError::InvalidField {
                    field: field.to_string(),
                    reason: format!("expected true or false, found '{text}'"),
                }),
            },
            _ => Err(ConditionError::InvalidField {
                field: field.to_string(),
                reason: "unknown field".to_string(),
            }),
        }
    }

    fn apply(self, rule: &mut Rule) {
        match self {
            RuleEdit::Factor(factor) => rule.factor = factor,
            RuleEdit::Operator(operator) => rule.operator = operator,
            RuleEdit::Value(value) => rule.value = value,
            RuleEdit::Type(value_type) => rule.value_type = value_type,
            RuleEdit::Nullable(nullable) => rule.nullable = nullable,
        }
    }
}

/// Stateless mutation API. Holds only the template used for new rules.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TreeBuilder {
    default_factor: String,
    defaults: RuleDefaults,
}

impl Default for TreeBuilder {
    fn default() -> Self {
        Self::new(&FactorCatalog::reference(), RuleDefaults::default())
    }
}

impl TreeBuilder {
    pub fn new(catalog: &FactorCatalog, defaults: RuleDefaults) -> Self {
        Self {
            default_factor: catalog.default_factor().to_string(),
            defaults,
        }
    }

    pub fn from_config(config: &dyn ConfigPort) -> Result<Self, ConditionError> {
        let catalog = load_catalog(config)?;
        let defaults = load_rule_defaults(config)?;
        Ok(Self::new(&catalog, defaults))
    }

    /// The rule appended by [`TreeBuilder::add_default_rule`].
    pub fn default_rule(&self) -> Rule {
        Rule::new(
            self.default_factor.clone(),
            self.defaults.operator,
            "",
            self.defaults.value_type,
        )
        .with_nullable(self.defaults.nullable)
    }

    pub fn add_rule(
        &self,
        tree: &ConditionTree,
        path: &[usize],
        rule: Rule,
    ) -> Result<ConditionTree, ConditionError> {
        edit_group(tree, path, |group| {
            group.rules.push(rule);
            Ok(())
        })
    }

    pub fn add_default_rule(
        &self,
        tree: &ConditionTree,
        path: &[usize],
    ) -> Result<ConditionTree, ConditionError> {
        self.add_rule(tree, path, self.default_rule())
    }

    pub fn remove_rule(
        &self,
        tree: &ConditionTree,
        path: &[usize],
        rule_index: usize,
    ) -> Result<ConditionTree, ConditionError> {
        edit_group(tree, path, |group| {
            check_index(rule_index, group.rules.len())?;
            group.rules.remove(rule_index);
            Ok(())
        })
    }

    /// Append an empty `ALL` group under the group at `path`. Depth is not
    /// limited here.
    pub fn add_group(
        &self,
        tree: &ConditionTree,
        path: &[usize],
    ) -> Result<ConditionTree, ConditionError> {
        edit_group(tree, path, |group| {
            group.groups.push(Group::default());
            Ok(())
        })
    }

    /// Remove child `group_index` of the group at `path`, along with
    /// everything it contains.
    pub fn remove_group(
        &self,
        tree: &ConditionTree,
        path: &[usize],
        group_index: usize,
    ) -> Result<ConditionTree, ConditionError> {
        edit_group(tree, path, |group| {
            check_index(group_index, group.groups.len())?;
            group.groups.remove(group_index);
            Ok(())
        })
    }

    /// Remove the group whose own path is `target`. The root cannot be
    /// removed; an empty target resets the tree instead.
    pub fn remove_group_at(
        &self,
        tree: &ConditionTree,
        target: &[usize],
    ) -> Result<ConditionTree, ConditionError> {
        match target.split_last() {
            Some((&index, parent)) => self.remove_group(tree, parent, index),
            None => Ok(self.reset()),
        }
    }

    pub fn reset(&self) -> ConditionTree {
        ConditionTree::default()
    }

    pub fn set_mode(
        &self,
        tree: &ConditionTree,
        path: &[usize],
        mode: Mode,
    ) -> Result<ConditionTree, ConditionError> {
        edit_group(tree, path, |group| {
            group.mode = mode;
            Ok(())
        })
    }

    /// Like [`TreeBuilder::set_mode`] for untyped input; anything other than
    /// `ALL`/`ANY` fails with `InvalidMode`.
    pub fn set_mode_str(
        &self,
        tree: &ConditionTree,
        path: &[usize],
        mode: &str,
    ) -> Result<ConditionTree, ConditionError> {
        let mode = mode.parse::<Mode>()?;
        self.set_mode(tree, path, mode)
    }

    pub fn update_rule_field(
        &self,
        tree: &ConditionTree,
        path: &[usize],
        rule_index: usize,
        edit: RuleEdit,
    ) -> Result<ConditionTree, ConditionError> {
        edit_group(tree, path, |group| {
            check_index(rule_index, group.rules.len())?;
            edit.apply(&mut group.rules[rule_index]);
            Ok(())
        })
    }

    /// Reorder a rule within its group. Only display order changes.
    pub fn move_rule(
        &self,
        tree: &ConditionTree,
        path: &[usize],
        from: usize,
        to: usize,
    ) -> Result<ConditionTree, ConditionError> {
        edit_group(tree, path, |group| {
            let len = group.rules.len();
            check_index(from, len)?;
            check_index(to, len)?;
            let rule = group.rules.remove(from);
            group.rules.insert(to, rule);
            Ok(())
        })
    }
}

fn check_index(index: usize, len: usize) -> Result<(), ConditionError> {
    if index < len {
        Ok(())
    } else {
        Err(ConditionError::IndexOutOfRange { index, len })
    }
}

fn edit_group<F>(tree: &ConditionTree, path: &[usize], f: F) -> Result<ConditionTree, ConditionError>
where
    F: FnOnce(&mut Group) -> Result<(), ConditionError>,
{
    tracing::trace!(?path, "editing group");
    let mut next = tree.clone();
    f(next.group_mut(path)?)?;
    Ok(next)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::file_config_adapter::FileConfigAdapter;

    fn rsi(value: &str) -> Rule {
        Rule::new("IND.RSI_14", Operator::Lt, value, ValueType::Number)
    }

    fn builder() -> TreeBuilder {
        TreeBuilder::default()
    }

    fn two_rule_tree() -> ConditionTree {
        let b = builder();
        let tree = b.add_rule(&ConditionTree::default(), &[], rsi("30")).unwrap();
        b.add_rule(&tree, &[], rsi("40")).unwrap()
    }

    #[test]
    fn default_rule_uses_first_catalog_factor() {
        let rule = builder().default_rule();
        assert_eq!(rule.factor, "SIGNAL.DIRECTION");
        assert_eq!(rule.operator, Operator::Lt);
        assert_eq!(rule.value, "");
        assert_eq!(rule.value_type, ValueType::Number);
        assert!(!rule.nullable);
    }

    #[test]
    fn add_rule_appends_and_remove_restores() {
        let b = builder();
        let empty = ConditionTree::default();
        let one = b.add_rule(&empty, &[], rsi("30")).unwrap();
        assert_eq!(one.root.rules, vec![rsi("30")]);
        let two = b.add_rule(&one, &[], rsi("50")).unwrap();
        assert_eq!(two.root.rules.last(), Some(&rsi("50")));

        let back = b.remove_rule(&one, &[], 0).unwrap();
        assert_eq!(back, empty);
    }

    #[test]
    fn add_rule_leaves_input_untouched() {
        let b = builder();
        let empty = ConditionTree::default();
        let _ = b.add_rule(&empty, &[], rsi("30")).unwrap();
        assert!(empty.root.rules.is_empty());
    }

    #[test]
    fn add_rule_to_missing_path_fails() {
        let err = builder()
            .add_rule(&ConditionTree::default(), &[0], rsi("30"))
            .unwrap_err();
        assert!(matches!(err, ConditionError::PathNotFound { .. }));
    }

    #[test]
    fn add_default_rule_to_nested_group() {
        let b = builder();
        let tree = b.add_group(&ConditionTree::default(), &[]).unwrap();
        let tree = b.add_default_rule(&tree, &[0]).unwrap();
        assert!(tree.root.rules.is_empty());
        assert_eq!(tree.root.groups[0].rules, vec![b.default_rule()]);
    }

    #[test]
    fn remove_rule_out_of_range() {
        let tree = two_rule_tree();
        let err = builder().remove_rule(&tree, &[], 5).unwrap_err();
        assert!(matches!(
            err,
            ConditionError::IndexOutOfRange { index: 5, len: 2 }
        ));
        assert_eq!(tree.root.rules.len(), 2);
    }

    #[test]
    fn remove_rule_keeps_order_of_the_rest() {
        let b = builder();
        let tree = b.add_rule(&two_rule_tree(), &[], rsi("50")).unwrap();
        let tree = b.remove_rule(&tree, &[], 1).unwrap();
        let values: Vec<&str> = tree.root.rules.iter().map(|r| r.value.as_str()).collect();
        assert_eq!(values, vec!["30", "50"]);
    }

    #[test]
    fn nested_group_holds_its_rule_and_is_removed_with_it() {
        let b = builder();
        let tree = b.add_group(&ConditionTree::default(), &[]).unwrap();
        let tree = b.add_rule(&tree, &[0], rsi("30")).unwrap();
        assert!(tree.root.rules.is_empty());
        assert_eq!(tree.root.groups[0].rules, vec![rsi("30")]);
        assert_eq!(tree.root.groups[0].mode, Mode::All);

        let tree = b.remove_group(&tree, &[], 0).unwrap();
        assert_eq!(tree, ConditionTree::default());
    }

    #[test]
    fn groups_nest_without_limit() {
        let b = builder();
        let mut tree = ConditionTree::default();
        let mut path = Vec::new();
        for _ in 0..10 {
            tree = b.add_group(&tree, &path).unwrap();
            path.push(0);
        }
        tree = b.add_rule(&tree, &path, rsi("1")).unwrap();
        assert_eq!(tree.depth(), 11);
        assert_eq!(tree.group(&path).unwrap().rules.len(), 1);
    }

    #[test]
    fn remove_group_out_of_range() {
        let b = builder();
        let tree = b.add_group(&ConditionTree::default(), &[]).unwrap();
        assert!(matches!(
            b.remove_group(&tree, &[], 1),
            Err(ConditionError::IndexOutOfRange { index: 1, len: 1 })
        ));
        assert!(matches!(
            b.remove_group(&tree, &[3], 0),
            Err(ConditionError::PathNotFound { .. })
        ));
    }

    #[test]
    fn remove_group_at_root_resets() {
        let b = builder();
        let tree = b.set_mode(&two_rule_tree(), &[], Mode::Any).unwrap();
        let tree = b.add_group(&tree, &[]).unwrap();
        assert_eq!(b.remove_group_at(&tree, &[]).unwrap(), ConditionTree::default());
    }

    #[test]
    fn remove_group_at_nested_target() {
        let b = builder();
        let tree = b.add_group(&ConditionTree::default(), &[]).unwrap();
        let tree = b.add_group(&tree, &[0]).unwrap();
        let tree = b.add_group(&tree, &[0]).unwrap();
        let tree = b.set_mode(&tree, &[0, 1], Mode::Any).unwrap();
        let tree = b.remove_group_at(&tree, &[0, 0]).unwrap();
        assert_eq!(tree.root.groups[0].groups, vec![Group::with_mode(Mode::Any)]);
    }

    #[test]
    fn set_mode_only_changes_mode() {
        let b = builder();
        let tree = b.add_group(&two_rule_tree(), &[]).unwrap();
        let any = b.set_mode(&tree, &[], Mode::Any).unwrap();
        assert_eq!(any.root.mode, Mode::Any);
        assert_eq!(any.root.rules, tree.root.rules);
        assert_eq!(any.root.groups, tree.root.groups);
    }

    #[test]
    fn set_mode_str_rejects_unknown_mode() {
        let b = builder();
        let tree = two_rule_tree();
        let err = b.set_mode_str(&tree, &[], "BAD").unwrap_err();
        assert!(matches!(err, ConditionError::InvalidMode { .. }));
        assert_eq!(tree.root.mode, Mode::All);
        assert_eq!(b.set_mode_str(&tree, &[], "any").unwrap().root.mode, Mode::Any);
    }

    #[test]
    fn set_mode_on_nested_group() {
        let b = builder();
        let tree = b.add_group(&ConditionTree::default(), &[]).unwrap();
        let tree = b.set_mode(&tree, &[0], Mode::Any).unwrap();
        assert_eq!(tree.root.mode, Mode::All);
        assert_eq!(tree.root.groups[0].mode, Mode::Any);
    }

    #[test]
    fn update_rule_fields() {
        let b = builder();
        let tree = two_rule_tree();
        let tree = b
            .update_rule_field(&tree, &[], 1, RuleEdit::Factor("BAR.CLOSE".into()))
            .unwrap();
        let tree = b
            .update_rule_field(&tree, &[], 1, RuleEdit::Operator(Operator::Gte))
            .unwrap();
        let tree = b
            .update_rule_field(&tree, &[], 1, RuleEdit::Type(ValueType::String))
            .unwrap();
        let tree = b
            .update_rule_field(&tree, &[], 1, RuleEdit::Nullable(true))
            .unwrap();
        let tree = b
            .update_rule_field(&tree, &[], 1, RuleEdit::Value(" 1e3 ".into()))
            .unwrap();
        let rule = &tree.root.rules[1];
        assert_eq!(rule.factor, "BAR.CLOSE");
        assert_eq!(rule.operator, Operator::Gte);
        assert_eq!(rule.value_type, ValueType::String);
        assert!(rule.nullable);
        assert_eq!(rule.value, " 1e3 ");
        assert_eq!(tree.root.rules[0], rsi("30"));
    }

    #[test]
    fn update_rule_field_value_not_coerced() {
        let b = builder();
        let tree = two_rule_tree();
        let tree = b
            .update_rule_field(&tree, &[], 0, RuleEdit::Value("abc".into()))
            .unwrap();
        assert_eq!(tree.root.rules[0].value, "abc");
        assert_eq!(tree.root.rules[0].value_type, ValueType::Number);
    }

    #[test]
    fn update_rule_field_errors() {
        let b = builder();
        let tree = two_rule_tree();
        assert!(matches!(
            b.update_rule_field(&tree, &[], 2, RuleEdit::Nullable(true)),
            Err(ConditionError::IndexOutOfRange { .. })
        ));
        assert!(matches!(
            b.update_rule_field(&tree, &[0], 0, RuleEdit::Nullable(true)),
            Err(ConditionError::PathNotFound { .. })
        ));
    }

    #[test]
    fn rule_edit_parse() {
        assert_eq!(
            RuleEdit::parse("operator", "neq").unwrap(),
            RuleEdit::Operator(Operator::Neq)
        );
        assert_eq!(
            RuleEdit::parse("type", "BOOLEAN").unwrap(),
            RuleEdit::Type(ValueType::Boolean)
        );
        assert_eq!(
            RuleEdit::parse("nullable", "TRUE").unwrap(),
            RuleEdit::Nullable(true)
        );
        assert_eq!(
            RuleEdit::parse("value", "  7 ").unwrap(),
            RuleEdit::Value("  7 ".into())
        );
        assert!(matches!(
            RuleEdit::parse("nullable", "maybe"),
            Err(ConditionError::InvalidField { .. })
        ));
        assert!(matches!(
            RuleEdit::parse("weight", "1"),
            Err(ConditionError::InvalidField { .. })
        ));
        assert!(matches!(
            RuleEdit::parse("operator", "BETWEEN"),
            Err(ConditionError::InvalidOperator { .. })
        ));
    }

    #[test]
    fn move_rule_reorders() {
        let b = builder();
        let tree = b.add_rule(&two_rule_tree(), &[], rsi("50")).unwrap();
        let tree = b.move_rule(&tree, &[], 2, 0).unwrap();
        let values: Vec<&str> = tree.root.rules.iter().map(|r| r.value.as_str()).collect();
        assert_eq!(values, vec!["50", "30", "40"]);
        assert!(matches!(
            b.move_rule(&tree, &[], 0, 3),
            Err(ConditionError::IndexOutOfRange { index: 3, len: 3 })
        ));
    }

    #[test]
    fn from_config_uses_catalog_and_defaults() {
        let cfg = FileConfigAdapter::from_string(
            "[catalog]\nfactors = PRICE.LAST, BAR.CLOSE\n\n[builder]\ndefault_operator = GT\ndefault_nullable = true\n",
        )
        .unwrap();
        let b = TreeBuilder::from_config(&cfg).unwrap();
        let rule = b.default_rule();
        assert_eq!(rule.factor, "PRICE.LAST");
        assert_eq!(rule.operator, Operator::Gt);
        assert!(rule.nullable);
    }
}
