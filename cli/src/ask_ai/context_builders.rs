use super::formatters::{format_company_context, format_price_context, format_ratio_context};
use super::types::{AskAITemplate, ContextConfig, NarrativeContext};
use super::utils::render_ticker;

/// Prompt for one ticker followed by whichever context blocks are enabled
pub fn build_prompt(
    template: &AskAITemplate,
    ticker: &str,
    context: &NarrativeContext,
    config: &ContextConfig,
) -> String {
    let mut sections = vec![render_ticker(&template.prompt, ticker)];

    if config.include_company {
        if let Some(classification) = &context.classification {
            sections.push(format!("# Company Context\n{}", format_company_context(classification)));
        }
    }

    let price_context = format_price_context(ticker, &context.prices, config.price_context_days);
    if !price_context.is_empty() {
        sections.push(format!("# Price Context\n{}", price_context));
    }

    if config.include_ratios {
        if let Some(ratio_context) = context.ratios.as_ref().and_then(format_ratio_context) {
            sections.push(format!("# Financial Ratios\n{}", ratio_context));
        }
    }

    sections.join("\n\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ask_ai::templates::{get_template_by_id, INTRODUCTION_TEMPLATE_ID, MACRO_NEWS_TEMPLATE_ID};
    use crate::ask_ai::types::Language;

    #[test]
    fn test_default_config_yields_bare_prompt() {
        let template = get_template_by_id(INTRODUCTION_TEMPLATE_ID, &Language::Vietnamese).unwrap();
        let prompt = build_prompt(&template, "gex", &NarrativeContext::default(), &ContextConfig::default());
        assert_eq!(prompt, "Hãy giới thiệu về mã cổ phiếu GEX, giới hạn 100 từ.");
    }

    #[test]
    fn test_macro_prompt_matches_report_wording() {
        let template = get_template_by_id(MACRO_NEWS_TEMPLATE_ID, &Language::Vietnamese).unwrap();
        let prompt = build_prompt(&template, "GEX", &NarrativeContext::default(), &ContextConfig::default());
        assert!(prompt.starts_with("Hiện tại đang có những tin tức vĩ mô gì ảnh hưởng đến GEX?"));
        assert!(prompt.ends_with("giới hạn 600 chữ."));
    }

    #[test]
    fn test_context_blocks_are_appended() {
        let template = get_template_by_id("technical-review", &Language::English).unwrap();
        let context = NarrativeContext {
            classification: Some(crate::models::IndustryClassification {
                ticker: "GEX".into(),
                company_name: "GELEX".into(),
                exchange: "HOSE".into(),
                icb_level1: "Industrials".into(),
                icb_level2: "Industrial Goods".into(),
                icb_level3: String::new(),
                icb_level4: String::new(),
            }),
            ..Default::default()
        };
        let config = ContextConfig {
            price_context_days: 5,
            include_company: true,
            include_ratios: true,
        };
        let prompt = build_prompt(&template, "GEX", &context, &config);
        assert!(prompt.contains("# Company Context\nCompany: GELEX"));
        assert!(prompt.contains("GEX: No price data available"));
        assert!(!prompt.contains("# Financial Ratios"));
    }
}
