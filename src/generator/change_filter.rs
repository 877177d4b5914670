use crate::config::{ChangeRules, Selection};
use crate::remote::Changeable;

/// Keeps the changes selected by the label rules of their kind.
///
/// With `all`, unlabeled changes always pass. With `labeled`, they never do.
pub fn select<T: Changeable>(items: Vec<T>, rules: &ChangeRules) -> Vec<T> {
    let passes_labels = |item: &T| {
        let labels = &item.change().labels;
        (rules.include_labels.is_empty() || labels.any(&rules.include_labels))
            && !labels.any(&rules.exclude_labels)
    };

    match rules.selection {
        Selection::None => Vec::new(),
        Selection::All => items
            .into_iter()
            .filter(|i| i.change().labels.is_empty() || passes_labels(i))
            .collect(),
        Selection::Labeled => items
            .into_iter()
            .filter(|i| !i.change().labels.is_empty() && passes_labels(i))
            .collect(),
    }
}
