use tabled::{settings::Style, Table, Tabled};

use crate::company::Company;

#[derive(Tabled)]
pub struct TableRow {
    #[tabled(rename = "Metric")]
    pub metric: String,
    #[tabled(rename = "Value")]
    pub value: String,
}

#[derive(Tabled)]
pub struct CompanyRow {
    #[tabled(rename = "Name")]
    pub name: String,
    #[tabled(rename = "CIN")]
    pub cin: String,
    #[tabled(rename = "Status")]
    pub status: String,
    #[tabled(rename = "State")]
    pub state: String,
}

impl From<&Company> for CompanyRow {
    fn from(company: &Company) -> Self {
        let or_dash = |v: &Option<String>| v.clone().unwrap_or_else(|| "-".to_string());
        Self {
            name: company.company_name.clone(),
            cin: company.cin.clone(),
            status: or_dash(&company.status),
            state: or_dash(&company.state),
        }
    }
}

/// Two-column metric table; empty input renders nothing
pub fn stats_table(stats: &[(&str, &str)]) -> String {
    if stats.is_empty() {
        return String::new();
    }
    let rows: Vec<TableRow> = stats
        .iter()
        .map(|(metric, value)| TableRow {
            metric: metric.to_string(),
            value: value.to_string(),
        })
        .collect();
    Table::new(rows).with(Style::rounded()).to_string()
}

pub fn companies_table(companies: &[Company]) -> String {
    let rows: Vec<CompanyRow> = companies.iter().map(CompanyRow::from).collect();
    Table::new(rows).with(Style::rounded()).to_string()
}
