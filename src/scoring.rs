use crate::models::WardrobeItem;

pub const TAG_MATCH_SCORE: i64 = 3;
pub const FILENAME_MATCH_SCORE: i64 = 1;

/// Score an item against expanded keywords: an exact tag match is worth 3, a
/// keyword found inside the filename is worth 1. Both compare case-insensitively.
pub fn score(item: &WardrobeItem, keywords: &[String]) -> i64 {
    let tags: Vec<String> = item.tags.iter().map(|tag| tag.to_lowercase()).collect();
    let filename = item.filename.to_lowercase();
    keywords
        .iter()
        .map(|keyword| {
            let keyword = keyword.to_lowercase();
            let mut points = 0;
            if tags.iter().any(|tag| *tag == keyword) {
                points += TAG_MATCH_SCORE;
            }
            if !keyword.is_empty() && filename.contains(&keyword) {
                points += FILENAME_MATCH_SCORE;
            }
            points
        })
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Category;
    use chrono::Utc;

    fn item(filename: &str, tags: &[&str]) -> WardrobeItem {
        WardrobeItem {
            id: filename.to_string(),
            category: Category::Top,
            filename: filename.to_string(),
            tags: tags.iter().map(|t| t.to_string()).collect(),
            url: String::new(),
            created_at: Utc::now(),
        }
    }

    fn keywords(words: &[&str]) -> Vec<String> {
        words.iter().map(|w| w.to_string()).collect()
    }

    #[test]
    fn test_tag_match_is_case_insensitive() {
        let shirt = item("0001.png", &["Formal"]);
        assert_eq!(score(&shirt, &keywords(&["formal"])), 3);
    }

    #[test]
    fn test_tag_and_filename_match_add_up() {
        let shirt = item("blazer-navy.jpg", &["blazer"]);
        assert_eq!(score(&shirt, &keywords(&["blazer", "navy", "suit"])), 3 + 1 + 1);
    }

    #[test]
    fn test_partial_tag_does_not_count() {
        let shirt = item("0001.png", &["business-casual"]);
        assert_eq!(score(&shirt, &keywords(&["business"])), 0);
    }

    #[test]
    fn test_empty_keyword_scores_nothing() {
        let shirt = item("0001.png", &[]);
        assert_eq!(score(&shirt, &keywords(&[""])), 0);
    }
}
