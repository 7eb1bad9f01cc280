use crate::ask_ai::types::AskAITemplate;

pub fn get_report_templates_vn() -> Vec<AskAITemplate> {
    vec![
        AskAITemplate {
            id: "introduction".to_string(),
            title: "🏢 Giới thiệu".to_string(),
            prompt: "Hãy giới thiệu về mã cổ phiếu {ticker}, giới hạn 100 từ.".to_string(),
        },
        AskAITemplate {
            id: "macro-news".to_string(),
            title: "🌏 Phân tích tin tức vĩ mô ảnh hưởng đến cổ phiếu".to_string(),
            prompt: "Hiện tại đang có những tin tức vĩ mô gì ảnh hưởng đến {ticker}? Trả lời bằng 5 gạch đầu dòng theo format 'Chủ đề: Nội dung', với chủ đề in đậm và giới hạn 600 chữ.".to_string(),
        },
        AskAITemplate {
            id: "valuation-review".to_string(),
            title: "💰 Đánh giá định giá P/E và P/B".to_string(),
            prompt: "Dựa trên các chỉ số tài chính kèm theo, hãy nhận xét mức định giá hiện tại của {ticker} theo P/E và P/B so với ngành, giới hạn 200 từ.".to_string(),
        },
        AskAITemplate {
            id: "technical-review".to_string(),
            title: "📊 Nhận định kỹ thuật".to_string(),
            prompt: "Dựa trên dữ liệu giá kèm theo, hãy nhận định xu hướng ngắn hạn của {ticker}, các mức hỗ trợ và kháng cự chính, giới hạn 200 từ.".to_string(),
        },
    ]
}
