use chrono::NaiveDate;

/// Format a float as an amount with space-separated thousands: 1 234.56
pub fn money(val: f64) -> String {
    let negative = val < 0.0;
    let cents = format!("{:.2}", val.abs());
    let (int_part, dec_part) = cents.split_once('.').unwrap_or((cents.as_str(), "00"));

    let mut grouped = String::new();
    for (i, c) in int_part.chars().rev().enumerate() {
        if i > 0 && i % 3 == 0 {
            grouped.push(' ');
        }
        grouped.push(c);
    }
    let grouped: String = grouped.chars().rev().collect();

    if negative && cents != "0.00" {
        format!("-{grouped}.{dec_part}")
    } else {
        format!("{grouped}.{dec_part}")
    }
}

/// Day-first date as written in the bank export: 20.05.2023
pub fn dmy(date: NaiveDate) -> String {
    date.format("%d.%m.%Y").to_string()
}
