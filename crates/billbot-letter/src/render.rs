//! The composed letter and its text, HTML, and PDF-payload renderings.

use serde::{Deserialize, Serialize};

use crate::settlement::Settlement;

const HTML_HEAD: &str = r#"<!DOCTYPE html>
<html>
<head>
    <meta charset="utf-8">
    <style>
        body {
            font-family: Arial, sans-serif;
            line-height: 1.6;
            max-width: 800px;
            margin: 0 auto;
            padding: 40px;
            color: #333;
        }
        .header {
            margin-bottom: 30px;
            white-space: pre-line;
        }
        .section {
            margin-bottom: 20px;
        }
        .disputes {
            background: #f5f5f5;
            padding: 20px;
            border-radius: 8px;
            margin: 20px 0;
        }
        .signature {
            margin-top: 60px;
        }
        @media print {
            body { padding: 0; }
        }
    </style>
</head>
<body>
"#;

const HTML_TAIL: &str = "</body></html>";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SectionKind {
    Header,
    Opening,
    Disputes,
    Offer,
    Closing,
}

impl SectionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Header => "header",
            Self::Opening => "opening",
            Self::Disputes => "disputes",
            Self::Offer => "offer",
            Self::Closing => "closing",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Section {
    #[serde(rename = "type")]
    pub kind: SectionKind,
    pub content: String,
}

/// Summary numbers carried alongside every rendering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LetterMetadata {
    pub original_bill: u64,
    pub offer_amount: u64,
    pub savings: u64,
    pub savings_percent: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PdfMetadata {
    pub title: String,
    pub subject: String,
    pub author: String,
}

/// Text plus document properties, ready for a PDF writer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PdfPayload {
    pub content: String,
    pub metadata: PdfMetadata,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Letter {
    pub sections: Vec<Section>,
    pub account_number: String,
    /// Patient name, or the name placeholder.
    pub author: String,
    pub settlement: Settlement,
}

impl Letter {
    pub fn section(&self, kind: SectionKind) -> Option<&Section> {
        self.sections.iter().find(|s| s.kind == kind)
    }

    pub fn offer_amount(&self) -> u64 {
        self.settlement.offer
    }

    pub fn savings(&self) -> u64 {
        self.settlement.savings
    }

    pub fn savings_percent(&self) -> u64 {
        self.settlement.savings_percent
    }

    pub fn metadata(&self) -> LetterMetadata {
        LetterMetadata {
            original_bill: self.settlement.original,
            offer_amount: self.settlement.offer,
            savings: self.settlement.savings,
            savings_percent: self.settlement.savings_percent,
        }
    }

    /// Non-empty sections joined by blank lines.
    pub fn text(&self) -> String {
        self.sections
            .iter()
            .map(|s| s.content.as_str())
            .filter(|c| !c.trim().is_empty())
            .collect::<Vec<_>>()
            .join("\n\n")
    }

    /// Standalone HTML document, one `<div>` per non-empty section.
    pub fn html(&self) -> String {
        let mut html = String::from(HTML_HEAD);
        for section in self.sections.iter().filter(|s| !s.content.trim().is_empty()) {
            html.push_str(&format!(
                "<div class=\"section {}\">{}</div>\n",
                section.kind.as_str(),
                escape_html(&section.content).replace('\n', "<br>")
            ));
        }
        html.push_str(HTML_TAIL);
        html
    }

    pub fn pdf(&self) -> PdfPayload {
        PdfPayload {
            content: self.text(),
            metadata: PdfMetadata {
                title: format!("Medical Bill Negotiation - Account {}", self.account_number),
                subject: "Settlement Offer".to_string(),
                author: self.author.clone(),
            },
        }
    }
}

fn escape_html(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}
