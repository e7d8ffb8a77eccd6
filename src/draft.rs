//! Draft assembly: the text handed to the article writer.
//!
//! The draft is a titled Markdown document. When there is summary text it
//! carries a summary section whose body is wrapped in `<news_summary>` tags,
//! which the writer instructions refer to. An empty summary yields a draft
//! with the title only.

use crate::models::{Draft, NewsSummary};

/// Build the draft for `topic` under `use_case`. Pure.
///
/// # Arguments
///
/// * `use_case` - Label used in the title, e.g. `"Business News"`
/// * `topic` - The researched topic
/// * `news_summary` - Summary blocks; when empty the draft is the title only
pub fn assemble(use_case: &str, topic: &str, news_summary: &NewsSummary) -> Draft {
    let mut text = format!("# {use_case}: {topic}\n\n");

    if !news_summary.is_empty() {
        let summary = news_summary.as_str();
        text.push_str(&format!("## Summary of Articles on {topic}\n\n"));
        text.push_str(&format!(
            "This section provides a comprehensive {} summary about {topic}.\n\n",
            use_case.to_lowercase()
        ));
        text.push_str(&format!(
            "<news_summary>\n\n{summary}\n\n</news_summary>\n\n"
        ));
    }

    Draft::new(text)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::SummaryBlock;
    use crate::testing::collected;

    fn summary_of(count: usize) -> NewsSummary {
        let mut summary = NewsSummary::default();
        for article in collected(count) {
            summary.push(SummaryBlock::from_article(&article, "Brief.".to_string()));
        }
        summary
    }

    #[test]
    fn test_draft_wraps_summary_in_tags() {
        let summary = summary_of(2);
        let draft = assemble("Business News", "Acme Merger", &summary);
        let text = draft.as_str();

        assert!(text.starts_with("# Business News: Acme Merger\n\n## Summary of Articles on Acme Merger\n\n"));
        assert!(text.contains(
            "This section provides a comprehensive business news summary about Acme Merger.\n\n"
        ));
        let open = text.find("<news_summary>").unwrap();
        let close = text.find("</news_summary>").unwrap();
        assert!(open < close);
        assert_eq!(&text[open + "<news_summary>\n\n".len()..close - 2], summary.as_str());
        assert!(text.ends_with("</news_summary>\n\n"));
    }

    #[test]
    fn test_empty_summary_drafts_title_only() {
        let draft = assemble("Travel Guides", "Lisbon", &NewsSummary::default());
        assert_eq!(draft.as_str(), "# Travel Guides: Lisbon\n\n");
    }

    #[test]
    fn test_assemble_is_pure() {
        let summary = summary_of(3);
        assert_eq!(
            assemble("Research Papers", "Graph Neural Networks", &summary),
            assemble("Research Papers", "Graph Neural Networks", &summary)
        );
    }
}
