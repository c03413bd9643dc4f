use crate::people::Person;

/// Digits-only form of a phone number, cut to the trailing ten digits.
pub fn normalize_phone_number(raw: &str) -> String {
    let digits: Vec<char> = raw.chars().filter(|c| c.is_ascii_digit()).collect();
    let start = digits.len().saturating_sub(10);
    digits[start..].iter().collect()
}

/// All of a contact's numbers, normalized and joined with `|`.
pub fn joined_phone_numbers(person: &Person) -> String {
    person
        .phone_numbers
        .iter()
        .map(|phone| normalize_phone_number(&phone.value))
        .collect::<Vec<_>>()
        .join("|")
}

/// Format timestamp in human-readable format
pub fn format_timestamp(timestamp: &chrono::DateTime<chrono::Utc>) -> String {
    timestamp.format("%Y-%m-%d %H:%M:%S UTC").to_string()
}

/// Prompt user for yes/no confirmation
pub fn confirm_action(prompt: &str) -> std::io::Result<bool> {
    use std::io::{self, Write};

    print!("{} (y/N): ", prompt);
    io::stdout().flush()?;

    let mut input = String::new();
    io::stdin().read_line(&mut input)?;

    Ok(matches!(input.trim().to_lowercase().as_str(), "y" | "yes"))
}

/// Print a formatted table border
pub fn print_table_border(width: usize) {
    println!("{}", "=".repeat(width));
}

/// Print a table row with columns
pub fn print_table_row(columns: &[&str], widths: &[usize]) {
    let mut row = String::new();
    for (col, width) in columns.iter().zip(widths) {
        row.push_str(&format!("{:<width$}  ", col, width = width));
    }
    println!("{}", row.trim_end());
}
