//! Markdown export of the final article.
//!
//! The article is written as generated, followed by a sources section that
//! lists every collected article, so the document stays traceable even when
//! the writer omits its own references.

use crate::models::RunReport;
use crate::utils::slugify_title;
use std::error::Error;
use tokio::fs;
use tracing::{info, instrument};

/// Render the Markdown document for a run.
pub fn render_article(report: &RunReport) -> String {
    let mut md = report.article.as_str().trim_end().to_string();
    md.push_str("\n\n---\n\n## Sources\n\n");
    for article in &report.articles {
        let result = article.result();
        match &result.source {
            Some(source) => md.push_str(&format!("- [{}]({}) ({source})\n", result.title, result.url)),
            None => md.push_str(&format!("- [{}]({})\n", result.title, result.url)),
        }
    }
    md.push_str(&format!(
        "\n*{} on {} {}. Summaries by `{}`, article by `{}`.*\n",
        report.use_case, report.local_date, report.local_time, report.summary_model, report.writer_model
    ));
    md
}

/// Write the article to `{output_dir}/{local_date}_{topic-slug}.md`.
///
/// Returns the written path.
///
/// # Errors
///
/// Fails if the directory cannot be created or the file cannot be written.
#[instrument(level = "info", skip_all, fields(output_dir = %output_dir))]
pub async fn write_article(report: &RunReport, output_dir: &str) -> Result<String, Box<dyn Error>> {
    fs::create_dir_all(output_dir).await?;
    let path = format!(
        "{}/{}_{}.md",
        output_dir.trim_end_matches('/'),
        report.local_date,
        slugify_title(&report.topic)
    );
    let md = render_article(report);
    fs::write(&path, &md).await?;
    info!(%path, bytes = md.len(), "Wrote Markdown article");
    Ok(path)
}
