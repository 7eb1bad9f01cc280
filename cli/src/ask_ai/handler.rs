use crate::ask_ai::{
    context_builders::build_prompt,
    templates::{get_report_templates, get_template_by_id},
    types::{AskAIRequest, ContextConfig, Language, NarrativeContext},
};
use crate::services::TextGenerator;
use crate::utils::{strip_markdown, Logger};

/// Print the rendered prompt for a ticker so it can be pasted into any assistant
pub fn handle_prompt_request(request: &AskAIRequest, context: &NarrativeContext) -> anyhow::Result<()> {
    println!("🤖 Generating AI analysis prompt...");

    let template = match get_template_by_id(&request.template_id, &request.language) {
        Some(template) => template,
        None => {
            eprintln!(
                "❌ Template '{}' not found for language {:?}",
                request.template_id, request.language
            );
            println!("💡 Available templates:");
            for template in get_report_templates(&request.language) {
                println!("  {} - {}", template.id, template.title);
            }
            anyhow::bail!("unknown template '{}'", request.template_id);
        }
    };

    let prompt = build_prompt(&template, &request.ticker, context, &request.config);

    println!("📊 Ticker: {}", request.ticker);
    println!("🎯 Template: {}", template.title);
    println!("🌐 Language: {:?}", request.language);

    println!("\n{}", "=".repeat(80));
    println!("🤖 AI ANALYSIS PROMPT");
    println!("{}", "=".repeat(80));
    println!("\n{}", request.language.system_instruction());
    println!("\n{}", prompt);
    println!("\n{}", "=".repeat(80));

    Ok(())
}

/// Narrative text for one report section; empty when generation fails
pub async fn generate_section(
    generator: &dyn TextGenerator,
    template_id: &str,
    ticker: &str,
    language: &Language,
    context: &NarrativeContext,
) -> String {
    let logger = Logger::new("NARRATIVE");
    let Some(template) = get_template_by_id(template_id, language) else {
        logger.warn(&format!("⚠️ Template '{}' not found", template_id));
        return String::new();
    };
    let prompt = build_prompt(&template, ticker, context, &ContextConfig::default());
    match generator.generate(&prompt).await {
        Ok(text) => {
            logger.info(&format!("✅ {} narrative for {} ({} chars)", template_id, ticker, text.len()));
            strip_markdown(&text)
        }
        Err(e) => {
            logger.warn(&format!("⚠️ {} narrative for {} failed: {}", template_id, ticker, e));
            String::new()
        }
    }
}
