use serde::{Deserialize, Serialize};

/// Row of the industry classification sheet
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndustryClassification {
    pub ticker: String,
    pub company_name: String,
    pub exchange: String,
    pub icb_level1: String,
    pub icb_level2: String,
    pub icb_level3: String,
    pub icb_level4: String,
}

impl IndustryClassification {
    /// Benchmark index of the listing exchange
    pub fn exchange_index(&self) -> Option<&'static str> {
        exchange_index(&self.exchange)
    }
}

pub fn exchange_index(exchange: &str) -> Option<&'static str> {
    match exchange.trim().to_uppercase().as_str() {
        "HOSE" | "HSX" => Some("VNINDEX"),
        "HNX" => Some("HNXINDEX"),
        "UPCOM" => Some("UPCOMINDEX"),
        _ => None,
    }
}

/// Industry-wide valuation multiples
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct IndustryMultiples {
    pub pe: f64,
    pub pb: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CompanyOverview {
    pub exchange: Option<String>,
    pub industry: Option<String>,
    pub short_name: Option<String>,
    pub website: Option<String>,
    pub no_shareholders: Option<u32>,
    pub no_employees: Option<u32>,
    pub established_year: Option<u32>,
    pub outstanding_share: Option<f64>,
    pub foreign_percent: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CompanyProfile {
    pub company_profile: Option<String>,
    pub history: Option<String>,
    pub key_developments: Option<String>,
    pub business_risk: Option<String>,
    pub business_strategy: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Shareholder {
    pub name: String,
    /// Ownership as a fraction of outstanding shares
    pub own_percent: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Officer {
    pub name: String,
    pub position: String,
    pub own_percent: Option<f64>,
    pub quantity: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Subsidiary {
    pub name: String,
    pub own_percent: f64,
}

/// Everything the report shows about the company itself
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CompanySnapshot {
    pub overview: Option<CompanyOverview>,
    pub profile: Option<CompanyProfile>,
    pub shareholders: Vec<Shareholder>,
    pub officers: Vec<Officer>,
    pub subsidiaries: Vec<Subsidiary>,
}

impl CompanySnapshot {
    /// Largest holders first
    pub fn top_shareholders(&self, n: usize) -> Vec<Shareholder> {
        let mut holders = self.shareholders.clone();
        holders.sort_by(|a, b| b.own_percent.total_cmp(&a.own_percent));
        holders.truncate(n);
        holders
    }

    pub fn top_subsidiaries(&self, n: usize) -> Vec<Subsidiary> {
        let mut subs = self.subsidiaries.clone();
        subs.sort_by(|a, b| b.own_percent.total_cmp(&a.own_percent));
        subs.truncate(n);
        subs
    }

    pub fn top_officers(&self, n: usize) -> Vec<Officer> {
        self.officers.iter().take(n).cloned().collect()
    }
}
