use serde::{Deserialize, Serialize};

use crate::models::{IndustryClassification, PricePoint, RatioTable};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AskAITemplate {
    pub id: String,
    pub title: String,
    /// Prompt text with a `{ticker}` placeholder
    pub prompt: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Language {
    English,
    Vietnamese,
}

impl Language {
    /// `vn`, `vi` and `vietnamese` select Vietnamese, anything else English
    pub fn parse(value: &str) -> Self {
        match value.trim().to_lowercase().as_str() {
            "vn" | "vi" | "vietnamese" => Language::Vietnamese,
            _ => Language::English,
        }
    }

    pub fn system_instruction(&self) -> &'static str {
        match self {
            Language::Vietnamese => "Bạn là một chuyên gia phân tích tài chính chuyên về cổ phiếu.",
            Language::English => "You are a financial analyst specialising in equities.",
        }
    }
}

/// Market data appended below a prompt
#[derive(Debug, Clone, Default)]
pub struct NarrativeContext {
    pub classification: Option<IndustryClassification>,
    pub prices: Vec<PricePoint>,
    pub ratios: Option<RatioTable>,
}

#[derive(Debug, Clone)]
pub struct ContextConfig {
    /// Trailing trading days of prices to include; 0 leaves prices out
    pub price_context_days: usize,
    pub include_company: bool,
    pub include_ratios: bool,
}

impl Default for ContextConfig {
    fn default() -> Self {
        Self {
            price_context_days: 0,
            include_company: false,
            include_ratios: false,
        }
    }
}

#[derive(Debug, Clone)]
pub struct AskAIRequest {
    pub ticker: String,
    pub template_id: String,
    pub language: Language,
    pub config: ContextConfig,
}
