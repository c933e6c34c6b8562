//! Export rendering for completed analysis records

use serde::Serialize;

use crate::models::{AnalysisRecord, AnalysisResult};

/// Export format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExportFormat {
    #[default]
    Json,
    Markdown,
    Txt,
}

impl ExportFormat {
    pub fn content_type(&self) -> &'static str {
        match self {
            Self::Json => "application/json",
            Self::Markdown => "text/markdown; charset=utf-8",
            Self::Txt => "text/plain; charset=utf-8",
        }
    }

    pub fn extension(&self) -> &'static str {
        match self {
            Self::Json => "json",
            Self::Markdown => "md",
            Self::Txt => "txt",
        }
    }
}

impl std::fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Json => write!(f, "json"),
            Self::Markdown => write!(f, "markdown"),
            Self::Txt => write!(f, "txt"),
        }
    }
}

impl std::str::FromStr for ExportFormat {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "json" => Ok(Self::Json),
            "markdown" => Ok(Self::Markdown),
            "txt" => Ok(Self::Txt),
            _ => Err(anyhow::anyhow!("Invalid export format: {}", s)),
        }
    }
}

/// A rendered export ready to be sent as an attachment
#[derive(Debug, Clone)]
pub struct ExportDocument {
    pub filename: String,
    pub content_type: &'static str,
    pub body: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct JsonExport<'a> {
    request_id: String,
    session_id: String,
    prompt: &'a str,
    image_ids: Vec<String>,
    created_at: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    tokens_used: Option<u64>,
    result: &'a AnalysisResult,
}

/// Render a completed record; `None` when the record has no result
pub fn render(record: &AnalysisRecord, format: ExportFormat) -> anyhow::Result<Option<ExportDocument>> {
    let result = match (&record.result, record.is_completed()) {
        (Some(result), true) => result,
        _ => return Ok(None),
    };

    let body = match format {
        ExportFormat::Json => {
            let export = JsonExport {
                request_id: record.request_id.to_string(),
                session_id: record.session_id.to_string(),
                prompt: &record.prompt,
                image_ids: record.image_ids.iter().map(|id| id.to_string()).collect(),
                created_at: record.created_at.to_rfc3339(),
                tokens_used: record.tokens_used,
                result,
            };
            serde_json::to_string_pretty(&export)?
        }
        ExportFormat::Markdown => render_markdown(record, result),
        ExportFormat::Txt => render_text(record, result),
    };

    Ok(Some(ExportDocument {
        filename: format!("analysis-{}.{}", record.request_id, format.extension()),
        content_type: format.content_type(),
        body,
    }))
}

fn render_markdown(record: &AnalysisRecord, result: &AnalysisResult) -> String {
    let mut out = String::new();
    out.push_str("# Image Analysis\n\n");
    out.push_str(&format!("- **Request ID:** {}\n", record.request_id));
    out.push_str(&format!("- **Created:** {}\n", record.created_at.to_rfc3339()));
    out.push_str(&format!("- **Images:** {}\n", record.image_ids.len()));
    if let Some(tokens) = record.tokens_used {
        out.push_str(&format!("- **Tokens used:** {}\n", tokens));
    }
    out.push_str("\n## Prompt\n\n");
    out.push_str(&record.prompt);
    out.push_str("\n\n## Result\n\n");
    out.push_str(&result.content);
    out.push('\n');
    if let Some(images) = &result.generated_images {
        out.push_str(&format!("\n_{} generated image(s) omitted._\n", images.len()));
    }
    out
}

fn render_text(record: &AnalysisRecord, result: &AnalysisResult) -> String {
    let mut out = String::new();
    out.push_str("IMAGE ANALYSIS\n");
    out.push_str(&format!("Request ID: {}\n", record.request_id));
    out.push_str(&format!("Created: {}\n", record.created_at.to_rfc3339()));
    out.push_str(&format!("Images: {}\n", record.image_ids.len()));
    out.push_str("\nPROMPT\n");
    out.push_str(&record.prompt);
    out.push_str("\n\nRESULT\n");
    out.push_str(&result.content);
    out.push('\n');
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{AnalysisKind, AnalysisStatus};
    use uuid::Uuid;

    fn completed() -> AnalysisRecord {
        AnalysisRecord::completed(
            Uuid::new_v4(),
            vec![Uuid::new_v4()],
            "What is in the picture?".to_string(),
            AnalysisKind::Analysis,
            AnalysisResult {
                content: "A red bicycle".to_string(),
                format: "markdown".to_string(),
                generated_images: None,
            },
            Some(42),
        )
    }

    #[test]
    fn test_format_parse_is_case_insensitive() {
        assert_eq!("JSON".parse::<ExportFormat>().unwrap(), ExportFormat::Json);
        assert_eq!("Markdown".parse::<ExportFormat>().unwrap(), ExportFormat::Markdown);
        assert_eq!("txt".parse::<ExportFormat>().unwrap(), ExportFormat::Txt);
        assert!("pdf".parse::<ExportFormat>().is_err());
        assert!("".parse::<ExportFormat>().is_err());
    }

    #[test]
    fn test_json_export_contains_result() {
        let record = completed();
        let doc = render(&record, ExportFormat::Json).unwrap().unwrap();

        assert_eq!(doc.content_type, "application/json");
        assert_eq!(doc.filename, format!("analysis-{}.json", record.request_id));
        let value: serde_json::Value = serde_json::from_str(&doc.body).unwrap();
        assert_eq!(value["requestId"], record.request_id.to_string());
        assert_eq!(value["result"]["content"], "A red bicycle");
        assert_eq!(value["tokensUsed"], 42);
    }

    #[test]
    fn test_markdown_and_text_exports() {
        let record = completed();

        let md = render(&record, ExportFormat::Markdown).unwrap().unwrap();
        assert!(md.filename.ends_with(".md"));
        assert!(md.body.contains("## Prompt\n\nWhat is in the picture?"));
        assert!(md.body.contains("## Result\n\nA red bicycle"));

        let txt = render(&record, ExportFormat::Txt).unwrap().unwrap();
        assert!(txt.content_type.starts_with("text/plain"));
        assert!(txt.body.contains("RESULT\nA red bicycle"));
    }

    #[test]
    fn test_non_completed_record_renders_nothing() {
        let record = AnalysisRecord::without_result(
            Uuid::new_v4(),
            vec![],
            "p".to_string(),
            AnalysisKind::Analysis,
            AnalysisStatus::Processing,
        );
        for format in [ExportFormat::Json, ExportFormat::Markdown, ExportFormat::Txt] {
            assert!(render(&record, format).unwrap().is_none());
        }
    }
}
