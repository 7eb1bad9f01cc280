pub mod report_en;
pub mod report_vn;

use super::types::{AskAITemplate, Language};

pub const INTRODUCTION_TEMPLATE_ID: &str = "introduction";
pub const MACRO_NEWS_TEMPLATE_ID: &str = "macro-news";

pub fn get_report_templates(language: &Language) -> Vec<AskAITemplate> {
    match language {
        Language::English => report_en::get_report_templates_en(),
        Language::Vietnamese => report_vn::get_report_templates_vn(),
    }
}

pub fn get_template_by_id(id: &str, language: &Language) -> Option<AskAITemplate> {
    get_report_templates(language)
        .into_iter()
        .find(|template| template.id == id)
}
