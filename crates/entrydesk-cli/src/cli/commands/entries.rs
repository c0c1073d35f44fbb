//! Entry command handlers.

use anyhow::{Context, Result, bail};
use comfy_table::{ContentArrangement, Table};
use entrydesk_core::api::{ApiClient, Entry, EntryPage, EntryQuery, EntryStatus};
use serde_json::{Map, Value};

use super::print_data;

pub async fn list(
    api: &ApiClient,
    page: u32,
    status: Option<EntryStatus>,
    from: Option<String>,
    to: Option<String>,
) -> Result<()> {
    let query = EntryQuery {
        page,
        status,
        from,
        to,
    };
    let response = api.get_entries(&query).await.context("list entries")?;
    let page = EntryPage::from_response(&response)?;

    if page.data.is_empty() {
        println!("No entries found.");
        return Ok(());
    }

    println!("{}", entries_table(&page.data));
    println!(
        "Page {} of {} ({} total)",
        page.current_page, page.last_page, page.total
    );
    Ok(())
}

pub async fn categories(api: &ApiClient) -> Result<()> {
    let response = api.get_categories().await.context("list categories")?;
    match response.data.as_array() {
        Some(items) => {
            for item in items {
                println!("{}", cell(item));
            }
        }
        None => print_data(&response),
    }
    Ok(())
}

pub async fn stats(api: &ApiClient) -> Result<()> {
    let response = api
        .get_entry_statistics()
        .await
        .context("fetch statistics")?;
    print_data(&response);
    Ok(())
}

pub async fn create(api: &ApiClient, category: String, fields: &[String]) -> Result<()> {
    let mut draft = parse_fields(fields)?;
    draft.insert("category".to_string(), Value::String(category));

    let response = api
        .create_entry(&Value::Object(draft))
        .await
        .context("create entry")?;
    match response.data.get("id") {
        Some(id) => println!("Created entry {}", cell(id)),
        None => print_data(&response),
    }
    Ok(())
}

pub async fn set_status(api: &ApiClient, id: u64, status: EntryStatus) -> Result<()> {
    api.update_entry_status(id, status)
        .await
        .with_context(|| format!("update entry {id}"))?;
    println!("Entry {id} is now {status}");
    Ok(())
}

pub async fn delete(api: &ApiClient, id: u64) -> Result<()> {
    api.delete_entry(id)
        .await
        .with_context(|| format!("delete entry {id}"))?;
    println!("Deleted entry {id}");
    Ok(())
}

fn entries_table(entries: &[Entry]) -> Table {
    let mut table = Table::new();
    table
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(vec![
            "ID",
            "Category",
            "Status",
            "Calculated",
            "Approved by",
            "Approved at",
        ]);
    for entry in entries {
        table.add_row(vec![
            entry.id.map(|id| id.to_string()).unwrap_or_default(),
            cell(&entry.category),
            entry.status.clone().unwrap_or_default(),
            cell(&entry.calculated_field),
            cell(&entry.approved_by),
            entry.approved_at.clone().unwrap_or_default(),
        ]);
    }
    table
}

/// Renders a JSON value for a table cell. Objects show their `name` when
/// they have one.
fn cell(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        Value::Object(map) => map
            .get("name")
            .and_then(Value::as_str)
            .map_or_else(|| value.to_string(), str::to_string),
        other => other.to_string(),
    }
}

/// Parses `key=value` pairs. Values that are valid JSON keep their type;
/// anything else is a string.
fn parse_fields(fields: &[String]) -> Result<Map<String, Value>> {
    let mut map = Map::new();
    for field in fields {
        let Some((key, raw)) = field.split_once('=') else {
            bail!("Invalid field '{field}' (expected KEY=VALUE)");
        };
        let key = key.trim();
        if key.is_empty() {
            bail!("Invalid field '{field}' (empty key)");
        }
        let value =
            serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.to_string()));
        map.insert(key.to_string(), value);
    }
    Ok(map)
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_parse_fields_keeps_json_types() {
        let fields = vec![
            "amount=12.5".to_string(),
            "note=lunch with client".to_string(),
            "date=2024-05-01".to_string(),
        ];
        let map = parse_fields(&fields).unwrap();
        assert_eq!(map["amount"], json!(12.5));
        assert_eq!(map["note"], json!("lunch with client"));
        assert_eq!(map["date"], json!("2024-05-01"));
    }

    #[test]
    fn test_parse_fields_rejects_missing_equals() {
        assert!(parse_fields(&["amount".to_string()]).is_err());
        assert!(parse_fields(&["=3".to_string()]).is_err());
    }

    #[test]
    fn test_cell_rendering() {
        assert_eq!(cell(&Value::Null), "");
        assert_eq!(cell(&json!("Travel")), "Travel");
        assert_eq!(cell(&json!({"id": 1, "name": "Admin"})), "Admin");
        assert_eq!(cell(&json!(3)), "3");
    }
}
