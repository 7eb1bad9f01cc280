use crate::ask_ai::types::AskAITemplate;

pub fn get_report_templates_en() -> Vec<AskAITemplate> {
    vec![
        AskAITemplate {
            id: "introduction".to_string(),
            title: "🏢 Introduction".to_string(),
            prompt: "Introduce the stock {ticker} in at most 100 words.".to_string(),
        },
        AskAITemplate {
            id: "macro-news".to_string(),
            title: "🌏 Macro news affecting the stock".to_string(),
            prompt: "What current macroeconomic news affects {ticker}? Answer with 5 bullet points in the format 'Topic: Content', with the topic in bold, at most 600 words.".to_string(),
        },
        AskAITemplate {
            id: "valuation-review".to_string(),
            title: "💰 P/E and P/B valuation review".to_string(),
            prompt: "Using the attached financial ratios, comment on the current valuation of {ticker} by P/E and P/B relative to its industry, at most 200 words.".to_string(),
        },
        AskAITemplate {
            id: "technical-review".to_string(),
            title: "📊 Technical outlook".to_string(),
            prompt: "Using the attached price data, describe the short-term trend of {ticker} with its key support and resistance levels, at most 200 words.".to_string(),
        },
    ]
}
