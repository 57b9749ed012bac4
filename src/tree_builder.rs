use serde_json::{Value, json};

use crate::parser::Item;

pub struct SerializeOptions {
    pub include_text: bool,
}

impl Default for SerializeOptions {
    fn default() -> Self {
        SerializeOptions {
            include_text: false,
        }
    }
}

/// Serialize parsed items as a JSON document
pub fn serialize_tree(items: &[Item]) -> serde_json::Result<String> {
    serialize_tree_with_options(items, &SerializeOptions::default())
}

/// Serialize parsed items with options
pub fn serialize_tree_with_options(
    items: &[Item],
    options: &SerializeOptions,
) -> serde_json::Result<String> {
    let value = build_tree(items, options)?;
    serde_json::to_string_pretty(&value)
}

pub fn build_tree(items: &[Item], options: &SerializeOptions) -> serde_json::Result<Value> {
    let items = items
        .iter()
        .filter(|item| options.include_text || matches!(item, Item::Table { .. }))
        .map(serde_json::to_value)
        .collect::<serde_json::Result<Vec<Value>>>()?;

    Ok(json!({ "items": items }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse;

    #[test]
    fn text_items_are_optional() {
        let items = parse("just prose\n").unwrap();
        let tree = build_tree(&items, &SerializeOptions::default()).unwrap();
        assert_eq!(json!({ "items": [] }), tree);

        let options = SerializeOptions { include_text: true };
        let tree = build_tree(&items, &options).unwrap();
        assert_eq!(
            json!({ "items": [{ "type": "text", "text": "just prose\n" }] }),
            tree
        );
    }
}
