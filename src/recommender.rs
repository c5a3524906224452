use serde::Serialize;

use crate::error::{Result, TryOnError};
use crate::keywords::KeywordTable;
use crate::models::{Category, WardrobeItem};
use crate::scoring::score;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Recommendation {
    pub top_id: String,
    pub bottom_id: String,
    pub keywords: Vec<String>,
}

/// First item with the highest score; earlier items win ties.
fn best_match<'a>(
    candidates: impl Iterator<Item = &'a WardrobeItem>,
    keywords: &[String],
) -> Option<&'a WardrobeItem> {
    let mut best: Option<(&WardrobeItem, i64)> = None;
    for item in candidates {
        let points = score(item, keywords);
        match best {
            Some((_, top_score)) if points <= top_score => {}
            _ => best = Some((item, points)),
        }
    }
    best.map(|(item, _)| item)
}

/// Pick a top and a bottom for `theme` from `wardrobe`, which must be in
/// insertion order.
pub fn recommend(
    table: &KeywordTable,
    wardrobe: &[WardrobeItem],
    theme: &str,
) -> Result<Recommendation> {
    let tops = || wardrobe.iter().filter(|item| item.category == Category::Top);
    let bottoms = || wardrobe.iter().filter(|item| item.category == Category::Bottom);
    if tops().next().is_none() || bottoms().next().is_none() {
        return Err(TryOnError::InsufficientWardrobe);
    }

    let keywords = table.expand_text(theme);
    let top = best_match(tops(), &keywords).ok_or(TryOnError::InsufficientWardrobe)?;
    let bottom = best_match(bottoms(), &keywords).ok_or(TryOnError::InsufficientWardrobe)?;
    tracing::debug!(
        theme,
        top = %top.id,
        bottom = %bottom.id,
        keywords = keywords.len(),
        "recommended outfit"
    );

    Ok(Recommendation {
        top_id: top.id.clone(),
        bottom_id: bottom.id.clone(),
        keywords,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn item(id: &str, category: Category, tags: &[&str]) -> WardrobeItem {
        WardrobeItem {
            id: id.to_string(),
            category,
            filename: format!("{id}.png"),
            tags: tags.iter().map(|t| t.to_string()).collect(),
            url: String::new(),
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_formal_theme_picks_formal_top() {
        let wardrobe = vec![
            item("a", Category::Top, &["casual"]),
            item("b", Category::Top, &["formal"]),
            item("c", Category::Bottom, &["jeans"]),
        ];
        let rec = recommend(&KeywordTable::builtin(), &wardrobe, "formal business").unwrap();
        assert_eq!(rec.top_id, "b");
        assert_eq!(rec.bottom_id, "c");
        for word in [
            "formal",
            "business",
            "office",
            "work",
            "professional",
            "dressy",
            "smart",
            "suit",
            "blazer",
        ] {
            assert!(rec.keywords.iter().any(|k| k == word), "missing {word}");
        }
    }

    #[test]
    fn test_ties_go_to_earliest_item() {
        let wardrobe = vec![
            item("b1", Category::Bottom, &[]),
            item("t1", Category::Top, &["casual"]),
            item("b2", Category::Bottom, &[]),
            item("t2", Category::Top, &["casual"]),
        ];
        let rec = recommend(&KeywordTable::builtin(), &wardrobe, "casual").unwrap();
        assert_eq!(rec.top_id, "t1");
        assert_eq!(rec.bottom_id, "b1");
    }

    #[test]
    fn test_empty_theme_returns_first_of_each() {
        let wardrobe = vec![
            item("t1", Category::Top, &["formal"]),
            item("t2", Category::Top, &[]),
            item("b1", Category::Bottom, &[]),
        ];
        let rec = recommend(&KeywordTable::builtin(), &wardrobe, "").unwrap();
        assert_eq!(rec.top_id, "t1");
        assert!(rec.keywords.is_empty());
    }

    #[test]
    fn test_missing_bottoms_fails() {
        let wardrobe = vec![item("t1", Category::Top, &[])];
        let err = recommend(&KeywordTable::builtin(), &wardrobe, "formal").unwrap_err();
        assert!(matches!(err, TryOnError::InsufficientWardrobe));
    }
}
