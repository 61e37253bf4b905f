use crate::company::Company;
use crate::ui::{theme, Icons};
use owo_colors::OwoColorize;

pub fn header(text: &str) {
    println!("{} {}", Icons::SERVE, text.style(theme().heading.clone()));
}

pub fn status(icon: &str, label: &str, value: &str) {
    println!("{} {}: {}", icon, label.style(theme().label.clone()), value);
}

pub fn success(label: &str) {
    println!("{} {}", Icons::OK, label.style(theme().success.clone()));
}

pub fn error(label: &str) {
    eprintln!("{} {}", Icons::FAIL, label.style(theme().error.clone()));
}

pub fn warn(label: &str) {
    eprintln!("{} {}", Icons::WARN, label.style(theme().warn.clone()));
}

pub fn info(label: &str, value: &str) {
    println!(
        "{} {}: {}",
        Icons::NOTE.style(theme().accent.clone()),
        label.style(theme().label.clone()),
        value
    );
}

pub fn timing(elapsed: &str) {
    println!("{} {}", Icons::ELAPSED.style(theme().label.clone()), elapsed);
}

/// Every field of a company, one per line
pub fn company_detail(company: &Company) {
    println!();
    println!("━{}━", company.company_name.style(theme().heading.clone()));
    let fields = [
        ("CIN", Some(&company.cin)),
        ("Status", company.status.as_ref()),
        ("Registered", company.registration_date.as_ref()),
        ("Class", company.company_class.as_ref()),
        ("RoC", company.roc.as_ref()),
        ("Email", company.email.as_ref()),
        ("State", company.state.as_ref()),
        ("Created", Some(&company.created_at)),
        ("Updated", Some(&company.updated_at)),
    ];
    for (label, value) in fields {
        println!(
            "  {} {}",
            format!("{:<11}", label).style(theme().label.clone()),
            value.map(String::as_str).unwrap_or("-")
        );
    }
}
