//! Display formatting: field labels and date normalization for the
//! presentation layer.

use chrono::NaiveDate;

/// Maps an internal field identifier to its display label. Unknown fields
/// fall back to the identifier with underscores turned into spaces.
pub fn field_label(field: &str) -> String {
    let label = match field {
        // Entity fields
        "first_name" => "First name",
        "middle_name" => "Middle name",
        "last_name" => "Last name",
        "bio" => "Biography",
        "name" => "Name",
        "type" => "Type",
        "description" => "Description",
        "title" => "Title",
        "creation_year" => "Year written",
        "year" => "Year",
        "disc_count" => "Discs",
        "current_year_sales" => "Sales this year",
        "remaining_stock" => "Remaining stock",
        "wholesale_price" => "Wholesale price",
        "retail_price" => "Retail price",
        "role" => "Role",
        "arrangement" => "Arrangement",
        "track_number" => "Track no.",

        // Relation and report columns
        "ensemble_name" => "Ensemble",
        "musician_name" => "Musician",
        "composition_title" => "Composition",
        "record_title" => "Record",
        "compositions_count" => "Compositions",
        "musicians_count" => "Musicians",
        "ensembles_count" => "Ensembles",
        "records_count" => "Records",
        "total_duration" => "Duration",
        "total_revenue" => "Revenue",
        "total_profit" => "Profit",
        "sales_percentage" => "Sell-through %",
        "ensemble_names" => "Ensembles",
        "performing_ensembles" => "Performing ensembles",

        // Identifier columns
        "ensemble_id" => "Ensemble id",
        "musician_id" => "Musician id",
        "composition_id" => "Composition id",
        "record_id" => "Record id",

        _ => return field.replace('_', " "),
    };
    label.to_string()
}

const DATE_PATTERNS: [&str; 4] = ["%Y-%m-%d", "%d/%m/%Y", "%m/%d/%Y", "%Y.%m.%d"];

/// Normalizes a raw year-or-date value for display. A bare 4-digit year
/// passes through unchanged; recognized date shapes are reformatted to
/// day.month.year; anything unparseable is returned as-is. Empty input
/// (and the literal "NULL" some drivers leak) yields an empty string.
pub fn format_year_or_date(raw: &str) -> String {
    let cleaned = raw.replace('\'', "");
    let cleaned = cleaned.trim();
    if cleaned.is_empty() || cleaned.eq_ignore_ascii_case("null") {
        return String::new();
    }

    if cleaned.len() == 4 && cleaned.chars().all(|c| c.is_ascii_digit()) {
        return cleaned.to_string();
    }

    for pattern in DATE_PATTERNS {
        if let Ok(date) = NaiveDate::parse_from_str(cleaned, pattern) {
            return date.format("%d.%m.%Y").to_string();
        }
    }
    cleaned.to_string()
}

/// "first [middle] last"; an absent or empty middle name is skipped.
pub fn musician_display_name(first: &str, middle: Option<&str>, last: &str) -> String {
    match middle {
        Some(middle) if !middle.is_empty() => format!("{first} {middle} {last}"),
        _ => format!("{first} {last}"),
    }
}
